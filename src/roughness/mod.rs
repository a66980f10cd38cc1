//! ISO-style roughness evaluation of a leveled profile.
//!
//! The profile is split into waviness (Gaussian low-pass envelope) and
//! roughness (residual). Only the central `n_cutoffs` cutoff lengths are
//! evaluated; the filter transients at both ends are discarded.

pub mod gaussian;
pub mod params;

pub use gaussian::{GaussianFilter, ISO_SIGMA_PER_CUTOFF};
pub use params::{amplitude_params, roughness_from_residual, AmplitudeParams, RoughnessParams};

use crate::data::Profile;
use crate::error::{MorphError, Result};
use crate::stats;
use log::debug;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct RoughnessOptions {
    /// Cutoff wavelength in x units.
    pub cutoff: f64,
    /// Number of cutoff lengths in the evaluation region.
    pub n_cutoffs: usize,
}

impl Default for RoughnessOptions {
    fn default() -> Self {
        Self {
            cutoff: 0.8,
            n_cutoffs: 5,
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct RoughnessReport {
    pub params: RoughnessParams,
    /// Low-pass envelope over the whole profile.
    pub envelope: Vec<f64>,
    /// `z - envelope` over the evaluation region.
    pub residual: Vec<f64>,
    /// Samples skipped at each end.
    pub border: usize,
    /// Filter standard deviation in samples.
    pub sigma: f64,
    pub samples_per_cutoff: f64,
}

/// Roughness parameters over the central `n_cutoffs · cutoff` of `profile`.
pub fn roughness_params(profile: &Profile, cutoff: f64, n_cutoffs: usize) -> Result<RoughnessReport> {
    if !(cutoff > 0.0) || !cutoff.is_finite() {
        return Err(MorphError::invalid("cutoff", "must be positive and finite"));
    }
    if n_cutoffs == 0 {
        return Err(MorphError::invalid("n_cutoffs", "must be at least 1"));
    }
    if let Some(i) = profile.first_sentinel() {
        return Err(MorphError::MalformedInput(format!(
            "roughness needs a profile without sentinel samples (first at {i})"
        )));
    }

    let z = profile.z();
    let n = z.len();
    let samples_per_cutoff = cutoff / profile.spacing();
    let region = samples_per_cutoff * n_cutoffs as f64;
    if region > n as f64 {
        return Err(MorphError::TooShort {
            found: n,
            minimum: region.ceil() as usize,
        });
    }
    let border = stats::round_half_even((n as f64 - region) / 2.0) as usize;
    if 2 * border >= n {
        return Err(MorphError::TooShort {
            found: n,
            minimum: 2 * border + 1,
        });
    }

    let filter = GaussianFilter::from_cutoff(samples_per_cutoff)?;
    let envelope = filter.apply(z);
    let residual: Vec<f64> = z[border..n - border]
        .iter()
        .zip(&envelope[border..n - border])
        .map(|(z, e)| z - e)
        .collect();
    debug!(
        "roughness: {:.1} samples/cutoff, sigma={:.2}, radius={}, border={}, {} residual samples",
        samples_per_cutoff,
        filter.sigma(),
        filter.radius(),
        border,
        residual.len()
    );

    let scale = z.iter().fold(0.0f64, |acc, v| acc.max(v.abs()));
    let params = roughness_from_residual(&residual, scale)?;
    Ok(RoughnessReport {
        params,
        envelope,
        residual,
        border,
        sigma: filter.sigma(),
        samples_per_cutoff,
    })
}

impl Profile {
    pub fn roughness(&self, options: &RoughnessOptions) -> Result<RoughnessReport> {
        roughness_params(self, options.cutoff, options.n_cutoffs)
    }
}
