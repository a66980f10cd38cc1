//! Per-angle analyses of radial cuts through a spherical cap.

use crate::data::Profile;
use crate::error::{MorphError, Result};
use crate::stats;
use serde::{Deserialize, Serialize};

/// Analysis run on the profile extracted at each sweep angle.
pub trait AngleAnalysis: Sync {
    type Output: Send;

    fn analyze(&self, profile: &Profile) -> Result<Self::Output>;
}

impl<F, T> AngleAnalysis for F
where
    F: Fn(&Profile) -> Result<T> + Sync,
    T: Send,
{
    type Output = T;

    fn analyze(&self, profile: &Profile) -> Result<T> {
        self(profile)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ArcOptions {
    /// Nominal radius of the cap, in x units.
    pub nominal_radius: f64,
    /// Depths at or below this are skipped when deriving radii.
    pub skip: f64,
}

impl Default for ArcOptions {
    fn default() -> Self {
        Self {
            nominal_radius: 350.0,
            skip: 0.05,
        }
    }
}

/// Largest measurable slopes of a radial cut, in radians.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct ArcSlope {
    /// Slope one sample inside the last valid sample before the first
    /// sentinel, or at the last sample when there is none.
    pub edge: f64,
    /// Slope at the deepest valid sample.
    pub deepest: f64,
    pub edge_offset: f64,
    pub deepest_offset: f64,
}

/// Radius of the circle through the start point and each deeper sample.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct ArcRadius {
    pub radius: Vec<f64>,
    pub depth: Vec<f64>,
}

pub fn arc_slope(profile: &Profile, nominal_radius: f64) -> Result<ArcSlope> {
    if !(nominal_radius > 0.0) {
        return Err(MorphError::invalid("nominal_radius", "must be positive"));
    }
    let x = profile.x();
    let z = profile.z();
    let edge_idx = match profile.first_sentinel() {
        Some(0) => return Err(MorphError::AllSentinel),
        Some(i) if i < 2 => {
            return Err(MorphError::TooShort {
                found: i,
                minimum: 2,
            })
        }
        Some(i) => i - 2,
        None => z.len() - 1,
    };
    let deepest_idx = stats::argmin(z).ok_or(MorphError::AllSentinel)?;
    let edge_offset = x[edge_idx] - x[0];
    let deepest_offset = x[deepest_idx] - x[0];
    Ok(ArcSlope {
        edge: offset_angle(edge_offset, nominal_radius)?,
        deepest: offset_angle(deepest_offset, nominal_radius)?,
        edge_offset,
        deepest_offset,
    })
}

fn offset_angle(offset: f64, radius: f64) -> Result<f64> {
    if offset.abs() > radius {
        return Err(MorphError::invalid(
            "nominal_radius",
            format!("lateral offset {offset} exceeds the nominal radius {radius}"),
        ));
    }
    Ok((offset / radius).asin())
}

/// Samples before the last one are visited until the first sentinel.
pub fn arc_radius(profile: &Profile, skip: f64) -> ArcRadius {
    let x = profile.x();
    let z = profile.z();
    let mut out = ArcRadius::default();
    for i in 0..z.len().saturating_sub(1) {
        if !z[i].is_finite() {
            break;
        }
        let lateral = x[i] - x[0];
        let depth = (z[0] - z[i]).abs();
        if depth > skip {
            out.radius.push((lateral * lateral + depth * depth) / (2.0 * depth));
            out.depth.push(depth);
        }
    }
    out
}

/// [`arc_slope`] as a sweep analysis.
#[derive(Clone, Copy, Debug)]
pub struct ArcSlopeAnalysis {
    pub nominal_radius: f64,
}

impl AngleAnalysis for ArcSlopeAnalysis {
    type Output = ArcSlope;

    fn analyze(&self, profile: &Profile) -> Result<ArcSlope> {
        arc_slope(profile, self.nominal_radius)
    }
}

/// [`arc_radius`] as a sweep analysis.
#[derive(Clone, Copy, Debug)]
pub struct ArcRadiusAnalysis {
    pub skip: f64,
}

impl AngleAnalysis for ArcRadiusAnalysis {
    type Output = ArcRadius;

    fn analyze(&self, profile: &Profile) -> Result<ArcRadius> {
        Ok(arc_radius(profile, self.skip))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cap(radius: f64, n: usize, dx: f64) -> Profile {
        let z = (0..n)
            .map(|i| {
                let x = i as f64 * dx;
                let inside = radius * radius - x * x;
                if inside > 0.0 {
                    inside.sqrt() - radius
                } else {
                    f64::NAN
                }
            })
            .collect();
        Profile::from_spacing(dx, z).unwrap()
    }

    #[test]
    fn radius_of_an_exact_arc() {
        let p = cap(10.0, 200, 0.01);
        let res = arc_radius(&p, 0.05);
        assert!(!res.radius.is_empty());
        assert_eq!(res.radius.len(), res.depth.len());
        for (r, d) in res.radius.iter().zip(&res.depth) {
            assert!((r - 10.0).abs() < 1e-9, "r={r} at depth {d}");
            assert!(*d > 0.05);
        }
    }

    #[test]
    fn radius_stops_at_first_sentinel() {
        let mut z: Vec<f64> = (0..10).map(|i| -(i as f64)).collect();
        z[5] = f64::NAN;
        let p = Profile::from_spacing(1.0, z).unwrap();
        let res = arc_radius(&p, 0.5);
        assert_eq!(res.depth, vec![1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn slope_at_the_edge_of_the_measurable_range() {
        // Valid up to x = 5.0, first sentinel at x = 5.5.
        let mut z: Vec<f64> = (0..20).map(|i| -0.01 * (i * i) as f64).collect();
        for v in z.iter_mut().skip(11) {
            *v = f64::NAN;
        }
        let p = Profile::from_spacing(0.5, z).unwrap();
        let s = arc_slope(&p, 9.0).unwrap();
        assert_eq!(s.edge_offset, 4.5);
        assert_eq!(s.deepest_offset, 5.0);
        assert!((s.edge - (0.5f64).asin()).abs() < 1e-12);
    }

    #[test]
    fn edge_sits_two_samples_before_the_first_sentinel() {
        let z = vec![0.0, -0.1, -0.2, -0.3, -0.4, f64::NAN, f64::NAN, f64::NAN];
        let p = Profile::from_spacing(1.0, z).unwrap();
        let s = arc_slope(&p, 100.0).unwrap();
        assert_eq!(s.edge_offset, 3.0);
        assert_eq!(s.deepest_offset, 4.0);
    }

    #[test]
    fn edge_without_sentinels_is_the_last_sample() {
        let p = Profile::from_spacing(1.0, vec![0.0, -0.1, -0.2, -0.1]).unwrap();
        let s = arc_slope(&p, 100.0).unwrap();
        assert_eq!(s.edge_offset, 3.0);
        assert_eq!(s.deepest_offset, 2.0);
    }

    #[test]
    fn leading_sentinels_have_no_edge() {
        let p = Profile::from_spacing(1.0, vec![f64::NAN, -0.1, -0.2]).unwrap();
        assert!(matches!(arc_slope(&p, 10.0), Err(MorphError::AllSentinel)));
        let p = Profile::from_spacing(1.0, vec![0.0, f64::NAN, -0.2]).unwrap();
        assert!(matches!(
            arc_slope(&p, 10.0),
            Err(MorphError::TooShort { found: 1, minimum: 2 })
        ));
    }

    #[test]
    fn offset_beyond_radius_is_rejected() {
        let p = Profile::from_spacing(1.0, vec![0.0, -1.0, -2.0, -3.0]).unwrap();
        assert!(matches!(
            arc_slope(&p, 2.0),
            Err(MorphError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn closures_are_analyses() {
        let p = Profile::from_spacing(1.0, vec![0.0, 1.0, 2.0]).unwrap();
        let len = |p: &Profile| -> Result<usize> { Ok(p.len()) };
        assert_eq!(len.analyze(&p).unwrap(), 3);
    }
}
