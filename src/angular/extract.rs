//! Profile extraction from a surface.

use crate::data::{Profile, Surface};
use crate::error::{MorphError, Result};
use crate::fit::fit_sphere;
use crate::stats;
use log::debug;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How the start node of a radial cut is chosen.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StartPolicy {
    /// Global height maximum.
    Max,
    /// Node nearest the centre of the best-fit sphere.
    Fit,
    /// Grid centre.
    Center,
    /// Local maximum nearest the grid centre.
    #[default]
    Local,
}

impl FromStr for StartPolicy {
    type Err = MorphError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "max" => Ok(Self::Max),
            "fit" => Ok(Self::Fit),
            "center" => Ok(Self::Center),
            "local" => Ok(Self::Local),
            other => Err(MorphError::invalid(
                "start",
                format!("unknown start policy `{other}` (expected max, fit, center or local)"),
            )),
        }
    }
}

impl fmt::Display for StartPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Max => "max",
            Self::Fit => "fit",
            Self::Center => "center",
            Self::Local => "local",
        };
        f.write_str(name)
    }
}

/// Produces the profile analysed at one sweep angle.
///
/// Implementations must be `Sync`; parallel sweeps share one extractor
/// across workers.
pub trait ProfileExtractor: Sync {
    fn extract(&self, surface: &Surface, start: StartPolicy) -> Result<Profile>;
}

/// Cut along the row through the start node, from the start column towards
/// increasing x. Sentinels are kept so analyses can find the end of the
/// measurable range.
#[derive(Clone, Copy, Debug, Default)]
pub struct RadialExtractor;

impl RadialExtractor {
    /// Start node `(col, row)` of `surface` under `policy`.
    pub fn start_node(&self, surface: &Surface, policy: StartPolicy) -> Result<(usize, usize)> {
        let z = surface.z();
        let node = match policy {
            StartPolicy::Max => {
                let i = stats::argmax(&z.data).ok_or(MorphError::AllSentinel)?;
                (i % z.w, i / z.w)
            }
            StartPolicy::Fit => {
                let sphere = fit_sphere(surface)?;
                nearest_node(surface, sphere.center.x, sphere.center.y)
            }
            StartPolicy::Center => (z.w / 2, z.h / 2),
            StartPolicy::Local => local_max_near_center(surface).unwrap_or((z.w / 2, z.h / 2)),
        };
        debug!("radial extractor: policy={policy} start node={node:?}");
        Ok(node)
    }
}

impl ProfileExtractor for RadialExtractor {
    fn extract(&self, surface: &Surface, start: StartPolicy) -> Result<Profile> {
        let (c0, r0) = self.start_node(surface, start)?;
        if c0 + 1 >= surface.width() {
            return Err(MorphError::TooShort {
                found: surface.width() - c0,
                minimum: 2,
            });
        }
        let x = surface.x().row(r0)[c0..].to_vec();
        let z = surface.z().row(r0)[c0..].to_vec();
        Profile::new(x, z)
    }
}

fn nearest_node(surface: &Surface, px: f64, py: f64) -> (usize, usize) {
    let (xs, ys) = (surface.x(), surface.y());
    let mut best = (0usize, f64::INFINITY);
    for (i, (&x, &y)) in xs.data.iter().zip(&ys.data).enumerate() {
        let d = (x - px).powi(2) + (y - py).powi(2);
        if d < best.1 {
            best = (i, d);
        }
    }
    (best.0 % xs.w, best.0 / xs.w)
}

/// Interior node not lower than any valid 8-neighbour, nearest the centre.
fn local_max_near_center(surface: &Surface) -> Option<(usize, usize)> {
    let z = surface.z();
    let (dx, dy) = surface.spacing();
    let cx = (z.w - 1) as f64 * 0.5;
    let cy = (z.h - 1) as f64 * 0.5;
    let mut best: Option<((usize, usize), f64)> = None;
    for r in 1..z.h.saturating_sub(1) {
        for c in 1..z.w.saturating_sub(1) {
            let v = z.get(c, r);
            if !v.is_finite() {
                continue;
            }
            let is_max = (r - 1..=r + 1)
                .flat_map(|rr| (c - 1..=c + 1).map(move |cc| (cc, rr)))
                .filter(|&n| n != (c, r))
                .map(|(cc, rr)| z.get(cc, rr))
                .all(|n| !n.is_finite() || v >= n);
            if !is_max {
                continue;
            }
            let d = ((c as f64 - cx) * dx).powi(2) + ((r as f64 - cy) * dy).powi(2);
            if best.map_or(true, |(_, bd)| d < bd) {
                best = Some(((c, r), d));
            }
        }
    }
    best.map(|(node, _)| node)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bumps() -> Surface {
        // Tall bump far from the centre, lower bump one node off centre.
        let (w, h) = (21, 21);
        let z = (0..w * h)
            .map(|i| {
                let (c, r) = ((i % w) as f64, (i / w) as f64);
                let tall = 5.0 * (-((c - 3.0).powi(2) + (r - 3.0).powi(2)) / 4.0).exp();
                let low = 2.0 * (-((c - 11.0).powi(2) + (r - 10.0).powi(2)) / 4.0).exp();
                tall + low
            })
            .collect();
        Surface::from_spacing(w, h, 0.1, 0.1, z).unwrap()
    }

    #[test]
    fn policies_pick_different_nodes() {
        let s = bumps();
        let ex = RadialExtractor;
        assert_eq!(ex.start_node(&s, StartPolicy::Max).unwrap(), (3, 3));
        assert_eq!(ex.start_node(&s, StartPolicy::Center).unwrap(), (10, 10));
        assert_eq!(ex.start_node(&s, StartPolicy::Local).unwrap(), (11, 10));
    }

    #[test]
    fn extracts_row_outward() {
        let s = bumps();
        let p = RadialExtractor.extract(&s, StartPolicy::Center).unwrap();
        assert_eq!(p.len(), 11);
        assert!((p.x()[0] - 1.0).abs() < 1e-12);
        assert_eq!(p.z()[0], s.z().get(10, 10));
    }

    #[test]
    fn parses_policy_names() {
        assert_eq!("LOCAL".parse::<StartPolicy>().unwrap(), StartPolicy::Local);
        assert_eq!("fit".parse::<StartPolicy>().unwrap(), StartPolicy::Fit);
        assert!("apex".parse::<StartPolicy>().is_err());
        assert_eq!(StartPolicy::Center.to_string(), "center");
    }
}
