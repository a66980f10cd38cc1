//! Step-height detection on profiles.
//!
//! Edges between flat regions are located as peaks of the first derivative
//! (rising edges) and of its negation (falling edges). The middle third of
//! every interval between consecutive edges is kept as a region of interest,
//! and each run of three regions yields one step height:
//! `mean(Z₁) - (mean(Z₀) + mean(Z₂)) / 2`.
//!
//! Thresholds are derived from the data with the calibrated constants below.

pub mod derivative;
pub mod peaks;

use crate::data::{Profile, Roi};
use crate::error::{MorphError, Result};
use crate::stats;
use log::{debug, warn};
use serde::Serialize;

/// Samples excluded at each end when taking the derivative maximum.
pub const BORDER_EXCLUSION: usize = 30;
/// Peak amplitude threshold is the interior derivative maximum over this.
pub const THRESHOLD_DIVISOR: f64 = 1.5;
/// Minimum edge separation is the first zero-crossing spacing over this.
pub const SPACING_DIVISOR: f64 = 1.5;
/// Fraction of each inter-edge interval discarded on either side.
pub const ROI_FRACTION: f64 = 1.0 / 3.0;
/// A region is flat enough when its std does not exceed `|step| / FLATNESS_RATIO`.
pub const FLATNESS_RATIO: f64 = 200.0;
/// Boundaries needed to form one region triple.
pub const MIN_BOUNDARIES: usize = 4;

/// Result of [`detect_steps`], including the intermediate arrays.
#[derive(Clone, Debug, Serialize)]
pub struct StepReport {
    /// One step height per consecutive region triple.
    pub steps: Vec<f64>,
    /// False when some region is not flat relative to its step.
    pub well_defined: bool,
    /// First derivative of the heights (per sample).
    pub derivative: Vec<f64>,
    /// Sorted edge indices (rising and falling).
    pub boundaries: Vec<usize>,
    /// Middle-third windows between consecutive boundaries.
    pub rois: Vec<Roi>,
    /// Derivative amplitude used for peak picking.
    pub threshold: f64,
    /// Minimum edge separation in samples.
    pub min_distance: f64,
}

impl StepReport {
    /// Mean absolute step height.
    pub fn mean_abs_step(&self) -> Option<f64> {
        if self.steps.is_empty() {
            return None;
        }
        Some(self.steps.iter().map(|s| s.abs()).sum::<f64>() / self.steps.len() as f64)
    }
}

/// Detects the step heights of a leveled profile.
pub fn detect_steps(profile: &Profile) -> Result<StepReport> {
    let z = profile.z();
    let n = z.len();
    if n <= 2 * BORDER_EXCLUSION {
        return Err(MorphError::TooShort {
            found: n,
            minimum: 2 * BORDER_EXCLUSION + 1,
        });
    }
    if profile.first_sentinel().is_some() {
        return Err(MorphError::MalformedInput(
            "step detection needs a profile without sentinel samples".into(),
        ));
    }

    let derivative = derivative::gradient(z);
    let threshold = derivative[BORDER_EXCLUSION..n - BORDER_EXCLUSION]
        .iter()
        .copied()
        .fold(f64::NEG_INFINITY, f64::max)
        / THRESHOLD_DIVISOR;
    if !(threshold > 0.0) {
        return Err(MorphError::MalformedInput(
            "no rising edge in the profile interior".into(),
        ));
    }

    let crossings = derivative::sign_changes(z, stats::mean(z)?);
    if crossings.len() < 2 {
        return Err(MorphError::MalformedInput(format!(
            "need two mean crossings to derive edge spacing, found {}",
            crossings.len()
        )));
    }
    let min_distance = ((crossings[1] - crossings[0]) as f64 / SPACING_DIVISOR).max(1.0);
    debug!("step detection: threshold={threshold:.4e} min_distance={min_distance:.1}");

    let negated: Vec<f64> = derivative.iter().map(|v| -v).collect();
    let mut boundaries = peaks::find_peaks(&derivative, threshold, min_distance);
    boundaries.extend(peaks::find_peaks(&negated, threshold, min_distance));
    boundaries.sort_unstable();
    if boundaries.len() < MIN_BOUNDARIES {
        return Err(MorphError::TooFewBoundaries {
            found: boundaries.len(),
            minimum: MIN_BOUNDARIES,
        });
    }

    let rois = boundaries
        .windows(2)
        .enumerate()
        .map(|(i, pair)| {
            let trim = stats::round_half_even((pair[1] - pair[0]) as f64 * ROI_FRACTION) as usize;
            let start = pair[0] + trim;
            let end = pair[1].saturating_sub(trim);
            if start >= end {
                return Err(MorphError::EmptyRegion { index: i });
            }
            Ok(Roi::from_profile(profile, start, end))
        })
        .collect::<Result<Vec<_>>>()?;

    let (steps, well_defined) = compute_steps(&rois)?;
    if !well_defined {
        warn!("step heights may be inaccurate: flat regions are poorly defined");
    }
    Ok(StepReport {
        steps,
        well_defined,
        derivative,
        boundaries,
        rois,
        threshold,
        min_distance,
    })
}

fn compute_steps(rois: &[Roi]) -> Result<(Vec<f64>, bool)> {
    let means = rois.iter().map(Roi::mean).collect::<Result<Vec<_>>>()?;
    let stds = rois.iter().map(Roi::std_dev).collect::<Result<Vec<_>>>()?;
    let mut steps = Vec::with_capacity(rois.len().saturating_sub(2));
    let mut defined = true;
    for j in 0..rois.len().saturating_sub(2) {
        let step = means[j + 1] - (means[j] + means[j + 2]) * 0.5;
        let tol = step.abs() / FLATNESS_RATIO;
        if stds[j..j + 3].iter().any(|&s| s > tol) {
            defined = false;
        }
        steps.push(step);
    }
    Ok((steps, defined))
}
