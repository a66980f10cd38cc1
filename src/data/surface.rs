//! 2-D topography with coordinate planes and a pure rotation transform.
//!
//! `x`, `y` and `z` share one shape. `NaN` in `z` marks invalid samples.
//! Rotation never mutates a surface: [`Surface::rotated`] resamples the
//! heights onto the same lattice and returns a new value, so sweeps can
//! rotate private copies concurrently.

use super::Grid;
use crate::error::{MorphError, Result};
use serde::{Deserialize, Serialize};

const EDGE_EPS: f64 = 1e-9;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawSurface")]
pub struct Surface {
    x: Grid,
    y: Grid,
    z: Grid,
    angle_deg: f64,
}

#[derive(Deserialize)]
struct RawSurface {
    x: Grid,
    y: Grid,
    z: Grid,
    #[serde(default)]
    angle_deg: f64,
}

impl TryFrom<RawSurface> for Surface {
    type Error = MorphError;

    fn try_from(raw: RawSurface) -> Result<Self> {
        let mut s = Surface::new(raw.x, raw.y, raw.z)?;
        s.angle_deg = raw.angle_deg;
        Ok(s)
    }
}

impl Surface {
    /// Creates a surface from coordinate and height grids of equal shape.
    pub fn new(x: Grid, y: Grid, z: Grid) -> Result<Self> {
        for g in [&x, &y, &z] {
            if g.data.len() != g.w * g.h {
                return Err(MorphError::LengthMismatch {
                    x: g.w * g.h,
                    z: g.data.len(),
                });
            }
        }
        if y.shape() != z.shape() || x.shape() != z.shape() {
            let found = if x.shape() != z.shape() {
                x.shape()
            } else {
                y.shape()
            };
            return Err(MorphError::ShapeMismatch {
                expected: z.shape(),
                found,
            });
        }
        if z.w < 2 || z.h < 2 {
            return Err(MorphError::TooShort {
                found: z.w.min(z.h),
                minimum: 2,
            });
        }
        Ok(Self {
            x,
            y,
            z,
            angle_deg: 0.0,
        })
    }

    /// Builds the coordinate planes of a regular lattice starting at the
    /// origin with spacings `dx` (columns) and `dy` (rows).
    pub fn from_spacing(w: usize, h: usize, dx: f64, dy: f64, z: Vec<f64>) -> Result<Self> {
        if !(dx > 0.0) || !(dy > 0.0) {
            return Err(MorphError::invalid("spacing", "must be positive"));
        }
        let z = Grid::from_vec(w, h, z)?;
        let x = Grid::from_fn(w, h, |c, _| c as f64 * dx);
        let y = Grid::from_fn(w, h, |_, r| r as f64 * dy);
        Self::new(x, y, z)
    }

    #[inline]
    pub fn x(&self) -> &Grid {
        &self.x
    }

    #[inline]
    pub fn y(&self) -> &Grid {
        &self.y
    }

    #[inline]
    pub fn z(&self) -> &Grid {
        &self.z
    }

    /// Total rotation applied to this surface, in degrees.
    #[inline]
    pub fn angle_deg(&self) -> f64 {
        self.angle_deg
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.z.w
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.z.h
    }

    /// Lattice spacing along columns and rows, taken from the first row and
    /// column of the coordinate planes.
    pub fn spacing(&self) -> (f64, f64) {
        let w = self.width();
        let h = self.height();
        let dx = (self.x.get(w - 1, 0) - self.x.get(0, 0)) / (w - 1) as f64;
        let dy = (self.y.get(0, h - 1) - self.y.get(0, 0)) / (h - 1) as f64;
        let sane = |d: f64| if d.is_finite() && d.abs() > 0.0 { d.abs() } else { 1.0 };
        (sane(dx), sane(dy))
    }

    /// Iterates `(x, y, z)` over the non-sentinel samples.
    pub fn valid_points(&self) -> impl Iterator<Item = (f64, f64, f64)> + '_ {
        self.x
            .data
            .iter()
            .zip(self.y.data.iter())
            .zip(self.z.data.iter())
            .filter(|((x, y), z)| x.is_finite() && y.is_finite() && z.is_finite())
            .map(|((&x, &y), &z)| (x, y, z))
    }

    /// Returns a copy whose heights are rotated by `angle_deg` (counter
    /// clockwise) about the lattice centre.
    ///
    /// Heights are resampled bilinearly on the unchanged coordinate lattice.
    /// Nodes whose source position leaves the grid, or whose interpolation
    /// touches a sentinel, become `NaN`.
    pub fn rotated(&self, angle_deg: f64) -> Surface {
        let total = self.angle_deg + angle_deg;
        if angle_deg.rem_euclid(360.0) == 0.0 {
            let mut out = self.clone();
            out.angle_deg = total;
            return out;
        }

        let (dx, dy) = self.spacing();
        let (sin, cos) = angle_deg.to_radians().sin_cos();
        let w = self.width();
        let h = self.height();
        let cx = (w - 1) as f64 * 0.5;
        let cy = (h - 1) as f64 * 0.5;

        let z = Grid::from_fn(w, h, |c, r| {
            // Physical offset of the destination node from the centre,
            // rotated back onto the source lattice.
            let px = (c as f64 - cx) * dx;
            let py = (r as f64 - cy) * dy;
            let sx = cos * px + sin * py;
            let sy = -sin * px + cos * py;
            bilinear(&self.z, cx + sx / dx, cy + sy / dy)
        });

        Surface {
            x: self.x.clone(),
            y: self.y.clone(),
            z,
            angle_deg: total,
        }
    }
}

/// Bilinear sample of `g` at fractional (col, row); `NaN` outside the grid
/// or when a contributing node is a sentinel.
fn bilinear(g: &Grid, x: f64, y: f64) -> f64 {
    if !x.is_finite() || !y.is_finite() {
        return f64::NAN;
    }
    let max_x = (g.w - 1) as f64;
    let max_y = (g.h - 1) as f64;
    if x < -EDGE_EPS || y < -EDGE_EPS || x > max_x + EDGE_EPS || y > max_y + EDGE_EPS {
        return f64::NAN;
    }
    let x = x.clamp(0.0, max_x);
    let y = y.clamp(0.0, max_y);
    let x0 = x.floor() as usize;
    let y0 = y.floor() as usize;
    let x1 = (x0 + 1).min(g.w - 1);
    let y1 = (y0 + 1).min(g.h - 1);
    let fx = x - x0 as f64;
    let fy = y - y0 as f64;

    let taps = [
        ((1.0 - fx) * (1.0 - fy), x0, y0),
        (fx * (1.0 - fy), x1, y0),
        ((1.0 - fx) * fy, x0, y1),
        (fx * fy, x1, y1),
    ];
    let mut acc = 0.0;
    for (wgt, c, r) in taps {
        if wgt <= EDGE_EPS {
            continue;
        }
        let v = g.get(c, r);
        if !v.is_finite() {
            return f64::NAN;
        }
        acc += wgt * v;
    }
    acc
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(w: usize, h: usize) -> Surface {
        let z = (0..w * h).map(|i| (i % w) as f64).collect();
        Surface::from_spacing(w, h, 1.0, 1.0, z).unwrap()
    }

    #[test]
    fn rejects_shape_mismatch() {
        let x = Grid::new(3, 3);
        let y = Grid::new(3, 3);
        let z = Grid::new(3, 2);
        assert!(matches!(
            Surface::new(x, y, z),
            Err(MorphError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn zero_rotation_is_identity() {
        let s = ramp(5, 5);
        let r = s.rotated(0.0);
        assert_eq!(r.z(), s.z());
        assert_eq!(r.angle_deg(), 0.0);
    }

    #[test]
    fn rotation_is_pure_and_tracks_angle() {
        let s = ramp(5, 5);
        let r = s.rotated(90.0);
        assert_eq!(s.angle_deg(), 0.0);
        assert_eq!(r.angle_deg(), 90.0);
        // Counter-clockwise quarter turn: the column ramp becomes a row ramp.
        let centre = r.z().get(2, 2);
        assert!((centre - 2.0).abs() < 1e-9);
        assert!((r.z().get(2, 0) - s.z().get(0, 2)).abs() < 1e-9);
        assert!((r.z().get(2, 4) - s.z().get(4, 2)).abs() < 1e-9);
    }

    #[test]
    fn corners_leave_the_grid_at_45_degrees() {
        let s = ramp(9, 9);
        let r = s.rotated(45.0);
        assert!(r.z().get(0, 0).is_nan());
        assert!(r.z().get(4, 4).is_finite());
    }

    #[test]
    fn valid_points_skip_sentinels() {
        let mut z = vec![1.0; 4];
        z[3] = f64::NAN;
        let s = Surface::from_spacing(2, 2, 1.0, 1.0, z).unwrap();
        assert_eq!(s.valid_points().count(), 3);
    }
}
