//! Angular sweeps around a rotation axis.
//!
//! A sweep rotates the surface to `start + k·step` for every `k·step < 360`,
//! extracts a profile at each angle and runs one analysis on it. Every angle
//! works on its own rotated copy, so the angles are independent and can run
//! on the rayon pool. Results are returned in angle order regardless of
//! completion order.

pub mod arc;
pub mod extract;
pub mod tolerant;

pub use arc::{
    arc_radius, arc_slope, AngleAnalysis, ArcOptions, ArcRadius, ArcRadiusAnalysis, ArcSlope,
    ArcSlopeAnalysis,
};
pub use extract::{ProfileExtractor, RadialExtractor, StartPolicy};
pub use tolerant::{tolerant_mean, TolerantMean};

use crate::data::Surface;
use crate::error::{MorphError, Result};
use log::debug;
#[cfg(feature = "parallel")]
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SweepOptions {
    pub start_angle_deg: f64,
    pub step_deg: f64,
    pub start: StartPolicy,
    /// Run angles on the rayon pool (needs the `parallel` feature).
    pub parallel: bool,
}

impl Default for SweepOptions {
    fn default() -> Self {
        Self {
            start_angle_deg: 0.0,
            step_deg: 10.0,
            start: StartPolicy::Local,
            parallel: true,
        }
    }
}

impl SweepOptions {
    /// Angles visited by the sweep, in degrees.
    pub fn angles(&self) -> Result<Vec<f64>> {
        if !(self.step_deg > 0.0) || !self.step_deg.is_finite() {
            return Err(MorphError::invalid("step_deg", "must be positive"));
        }
        if !self.start_angle_deg.is_finite() {
            return Err(MorphError::invalid("start_angle_deg", "must be finite"));
        }
        Ok((0..)
            .map(|k| k as f64 * self.step_deg)
            .take_while(|&a| a < 360.0)
            .map(|a| self.start_angle_deg + a)
            .collect())
    }
}

/// Reported after each completed angle.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SweepProgress {
    pub completed: usize,
    pub total: usize,
    pub angle_deg: f64,
}

pub type ProgressFn<'a> = &'a (dyn Fn(SweepProgress) + Sync);

#[derive(Clone, Debug, Serialize)]
pub struct Sweep<T> {
    pub angles_deg: Vec<f64>,
    pub results: Vec<T>,
}

/// Runs `analysis` on the profile extracted at every sweep angle.
///
/// Fails with the error of the first failing angle (in angle order).
pub fn sweep_angles<E, A>(
    surface: &Surface,
    extractor: &E,
    analysis: &A,
    options: &SweepOptions,
    progress: Option<ProgressFn<'_>>,
) -> Result<Sweep<A::Output>>
where
    E: ProfileExtractor + ?Sized,
    A: AngleAnalysis + ?Sized,
{
    let angles = options.angles()?;
    let total = angles.len();
    let completed = AtomicUsize::new(0);
    let run = |angle: f64| -> Result<A::Output> {
        let rotated = surface.rotated(angle);
        let profile = extractor.extract(&rotated, options.start)?;
        let out = analysis.analyze(&profile)?;
        let done = completed.fetch_add(1, Ordering::Relaxed) + 1;
        debug!("sweep: angle {angle:.2} deg done ({done}/{total})");
        if let Some(cb) = progress {
            cb(SweepProgress {
                completed: done,
                total,
                angle_deg: angle,
            });
        }
        Ok(out)
    };

    let outcomes: Vec<Result<A::Output>> = if options.parallel {
        run_parallel(&angles, &run)
    } else {
        angles.iter().map(|&a| run(a)).collect()
    };
    let results = outcomes.into_iter().collect::<Result<Vec<_>>>()?;
    Ok(Sweep {
        angles_deg: angles,
        results,
    })
}

#[cfg(feature = "parallel")]
fn run_parallel<T, F>(angles: &[f64], run: &F) -> Vec<Result<T>>
where
    T: Send,
    F: Fn(f64) -> Result<T> + Sync,
{
    angles.par_iter().map(|&a| run(a)).collect()
}

#[cfg(not(feature = "parallel"))]
fn run_parallel<T, F>(angles: &[f64], run: &F) -> Vec<Result<T>>
where
    F: Fn(f64) -> Result<T>,
{
    angles.iter().map(|&a| run(a)).collect()
}

/// Edge and deepest-point slopes per angle, in degrees.
#[derive(Clone, Debug, Serialize)]
pub struct SlopeMap {
    pub angles_deg: Vec<f64>,
    pub edge_deg: Vec<f64>,
    pub deepest_deg: Vec<f64>,
}

/// Arc radii per angle and their ragged mean over angles.
#[derive(Clone, Debug, Serialize)]
pub struct RadiusMap {
    pub angles_deg: Vec<f64>,
    pub per_angle: Vec<ArcRadius>,
    pub radius: TolerantMean,
    pub depth: TolerantMean,
}

/// Largest measurable slope of a spherical cap in every sweep direction.
pub fn sphere_slope<E: ProfileExtractor + ?Sized>(
    surface: &Surface,
    extractor: &E,
    arc: &ArcOptions,
    options: &SweepOptions,
    progress: Option<ProgressFn<'_>>,
) -> Result<SlopeMap> {
    let analysis = ArcSlopeAnalysis {
        nominal_radius: arc.nominal_radius,
    };
    let sweep = sweep_angles(surface, extractor, &analysis, options, progress)?;
    Ok(SlopeMap {
        edge_deg: sweep.results.iter().map(|s| s.edge.to_degrees()).collect(),
        deepest_deg: sweep.results.iter().map(|s| s.deepest.to_degrees()).collect(),
        angles_deg: sweep.angles_deg,
    })
}

/// Radius-versus-depth of a spherical cap, averaged over sweep directions.
pub fn sphere_radius<E: ProfileExtractor + ?Sized>(
    surface: &Surface,
    extractor: &E,
    arc: &ArcOptions,
    options: &SweepOptions,
    progress: Option<ProgressFn<'_>>,
) -> Result<RadiusMap> {
    let analysis = ArcRadiusAnalysis { skip: arc.skip };
    let sweep = sweep_angles(surface, extractor, &analysis, options, progress)?;
    let radius = tolerant_mean(
        &sweep
            .results
            .iter()
            .map(|r| r.radius.as_slice())
            .collect::<Vec<_>>(),
    );
    let depth = tolerant_mean(
        &sweep
            .results
            .iter()
            .map(|r| r.depth.as_slice())
            .collect::<Vec<_>>(),
    );
    debug!(
        "sphere radius: {} angles, {} depth levels",
        sweep.angles_deg.len(),
        radius.len()
    );
    Ok(RadiusMap {
        angles_deg: sweep.angles_deg,
        per_angle: sweep.results,
        radius,
        depth,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Profile;

    #[test]
    fn angles_stop_before_full_turn() {
        let opts = SweepOptions {
            step_deg: 90.0,
            start_angle_deg: 5.0,
            ..SweepOptions::default()
        };
        assert_eq!(opts.angles().unwrap(), vec![5.0, 95.0, 185.0, 275.0]);
        let opts = SweepOptions {
            step_deg: 7.0,
            ..SweepOptions::default()
        };
        assert_eq!(opts.angles().unwrap().len(), 52);
    }

    #[test]
    fn zero_step_is_invalid() {
        let opts = SweepOptions {
            step_deg: 0.0,
            ..SweepOptions::default()
        };
        assert!(opts.angles().is_err());
    }

    #[test]
    fn results_follow_angle_order() {
        let s = Surface::from_spacing(5, 5, 1.0, 1.0, vec![0.0; 25]).unwrap();
        let constant = |_: &Profile| -> Result<usize> { Ok(0) };
        let opts = SweepOptions {
            step_deg: 45.0,
            start: StartPolicy::Center,
            ..SweepOptions::default()
        };
        let sweep = sweep_angles(&s, &RadialExtractor, &constant, &opts, None).unwrap();
        assert_eq!(sweep.results.len(), 8);
        assert_eq!(sweep.angles_deg[3], 135.0);
    }

    #[test]
    fn failing_angle_fails_the_sweep() {
        let s = Surface::from_spacing(5, 5, 1.0, 1.0, vec![0.0; 25]).unwrap();
        let fail = |_: &Profile| -> Result<()> { Err(MorphError::AllSentinel) };
        let opts = SweepOptions {
            step_deg: 120.0,
            start: StartPolicy::Center,
            ..SweepOptions::default()
        };
        assert_eq!(
            sweep_angles(&s, &RadialExtractor, &fail, &opts, None).unwrap_err(),
            MorphError::AllSentinel
        );
    }
}
