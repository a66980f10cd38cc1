//! Horizontal cylinder fit on a surface.
//!
//! Model parameters `p = [r, yc, zc, αz, αy]`: radius, centre of the axis in
//! the `x = 0` plane, and the axis rotations about `z` and `y`. The axis
//! direction is `(l, m, n) = (cos αz cos αy, sin αz, cos αz sin αy)` and each
//! valid sample contributes the implicit residual
//!
//! `x² + (y-yc)² + (z-zc)² - (l·x + m(y-yc) + n(z-zc))² - r²`.
//!
//! After the fit the cylinder height is reconstructed on every grid node by
//! solving the quadratic in `z`; nodes with a negative discriminant get `NaN`.

use super::solver::{LeastSquaresProblem, LevenbergMarquardt, SolverOptions};
use crate::data::{Grid, Surface};
use crate::error::{MorphError, Result};
use log::debug;
use nalgebra::DVector;
use serde::{Deserialize, Serialize};

const MIN_POINTS: usize = 5;

/// Which half of the cylinder the measured surface lies on.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Concavity {
    /// Outer surface seen from above (`+` root).
    #[default]
    Convex,
    /// Inner surface seen from above (`-` root).
    Concave,
}

#[derive(Clone, Debug, Serialize)]
pub struct CylinderFit {
    pub radius: f64,
    pub y_center: f64,
    pub z_center: f64,
    /// Axis rotation about `z` (radians).
    pub alpha_z: f64,
    /// Axis rotation about `y` (radians).
    pub alpha_y: f64,
    /// Fitted heights on the surface lattice.
    pub fitted: Grid,
    /// RMS of measured minus fitted height over nodes where both exist.
    pub height_rms: f64,
    pub iterations: usize,
}

struct CylinderProblem {
    points: Vec<[f64; 3]>,
}

impl LeastSquaresProblem for CylinderProblem {
    fn residuals(&self, p: &DVector<f64>) -> DVector<f64> {
        let (l, m, n) = axis(p[3], p[4]);
        DVector::from_iterator(
            self.points.len(),
            self.points.iter().map(|&[x, y, z]| {
                let dy = y - p[1];
                let dz = z - p[2];
                let proj = l * x + m * dy + n * dz;
                x * x + dy * dy + dz * dz - proj * proj - p[0] * p[0]
            }),
        )
    }
}

#[inline]
fn axis(alpha_z: f64, alpha_y: f64) -> (f64, f64, f64) {
    let (sz, cz) = alpha_z.sin_cos();
    let (sy, cy) = alpha_y.sin_cos();
    (cz * cy, sz, cz * sy)
}

/// Fits a horizontal cylinder starting from `nominal_radius` with zero
/// offsets and angles.
pub fn fit_cylinder(
    surface: &Surface,
    nominal_radius: f64,
    concavity: Concavity,
) -> Result<CylinderFit> {
    fit_cylinder_with(surface, nominal_radius, concavity, &SolverOptions::default())
}

pub fn fit_cylinder_with(
    surface: &Surface,
    nominal_radius: f64,
    concavity: Concavity,
    options: &SolverOptions,
) -> Result<CylinderFit> {
    if !(nominal_radius > 0.0) || !nominal_radius.is_finite() {
        return Err(MorphError::invalid("nominal_radius", "must be positive"));
    }
    let points: Vec<[f64; 3]> = surface.valid_points().map(|(x, y, z)| [x, y, z]).collect();
    if points.is_empty() {
        return Err(MorphError::AllSentinel);
    }
    if points.len() < MIN_POINTS {
        return Err(MorphError::TooShort {
            found: points.len(),
            minimum: MIN_POINTS,
        });
    }

    let problem = CylinderProblem { points };
    let init = DVector::from_vec(vec![nominal_radius, 0.0, 0.0, 0.0, 0.0]);
    let sol = LevenbergMarquardt::new(options.clone()).minimize(&problem, init)?;
    let p = &sol.params;
    debug!(
        "cylinder fit: r={:.6} yc={:.6} zc={:.6} az={:.3e} ay={:.3e} ({} iterations)",
        p[0], p[1], p[2], p[3], p[4], sol.iterations
    );

    let fitted = reconstruct(surface, p, concavity);
    let mut ss = 0.0;
    let mut count = 0usize;
    for (&zm, &zf) in surface.z().data.iter().zip(&fitted.data) {
        if zm.is_finite() && zf.is_finite() {
            ss += (zm - zf) * (zm - zf);
            count += 1;
        }
    }
    let height_rms = if count > 0 {
        (ss / count as f64).sqrt()
    } else {
        f64::NAN
    };

    Ok(CylinderFit {
        radius: p[0].abs(),
        y_center: p[1],
        z_center: p[2],
        alpha_z: p[3],
        alpha_y: p[4],
        fitted,
        height_rms,
        iterations: sol.iterations,
    })
}

fn reconstruct(surface: &Surface, p: &DVector<f64>, concavity: Concavity) -> Grid {
    let (l, m, n) = axis(p[3], p[4]);
    let (r, yc, zc) = (p[0], p[1], p[2]);
    let a = 1.0 - n * n;
    let xs = surface.x();
    let ys = surface.y();
    Grid::from_fn(surface.width(), surface.height(), |c, row| {
        let x = xs.get(c, row);
        let dy = ys.get(c, row) - yc;
        let b = -2.0 * n * (l * x + m * dy);
        let cc = (1.0 - l * l) * x * x + (1.0 - m * m) * dy * dy - 2.0 * x * l * m * dy - r * r;
        let disc = b * b - 4.0 * a * cc;
        if !(disc >= 0.0) {
            return f64::NAN;
        }
        let delta = match concavity {
            Concavity::Convex => disc.sqrt(),
            Concavity::Concave => -disc.sqrt(),
        };
        (-b + delta) / (2.0 * a) + zc
    })
}
