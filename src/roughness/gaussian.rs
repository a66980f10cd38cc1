//! Gaussian low-pass filter with mirror boundary handling.
//!
//! The kernel is truncated at `floor(4σ + 0.5)` samples and normalized to
//! unit sum. Samples past either end are mirrored about the outer edge of
//! the boundary sample (`d c b a | a b c d | d c b a`).

use crate::error::{MorphError, Result};

/// `sqrt(ln 2 / (2π²))`: ratio between the Gaussian standard deviation and
/// the cutoff length of the ISO 16610-21 profile filter (50 % transmission
/// at the cutoff wavelength).
pub const ISO_SIGMA_PER_CUTOFF: f64 = 0.187_390_625_129_277_6;

const TRUNCATE: f64 = 4.0;

#[derive(Clone, Debug)]
pub struct GaussianFilter {
    sigma: f64,
    taps: Vec<f64>,
}

impl GaussianFilter {
    /// Filter with standard deviation `sigma` in samples.
    pub fn new(sigma: f64) -> Result<Self> {
        if !(sigma > 0.0) || !sigma.is_finite() {
            return Err(MorphError::invalid("sigma", "must be positive and finite"));
        }
        let radius = (TRUNCATE * sigma + 0.5) as isize;
        let k = -0.5 / (sigma * sigma);
        let mut taps: Vec<f64> = (-radius..=radius)
            .map(|x| (k * (x * x) as f64).exp())
            .collect();
        let sum: f64 = taps.iter().sum();
        taps.iter_mut().for_each(|t| *t /= sum);
        Ok(Self { sigma, taps })
    }

    /// ISO 16610-21 filter for a cutoff spanning `samples_per_cutoff` samples.
    pub fn from_cutoff(samples_per_cutoff: f64) -> Result<Self> {
        Self::new(samples_per_cutoff * ISO_SIGMA_PER_CUTOFF)
    }

    pub fn sigma(&self) -> f64 {
        self.sigma
    }

    pub fn radius(&self) -> usize {
        self.taps.len() / 2
    }

    pub fn taps(&self) -> &[f64] {
        &self.taps
    }

    /// Low-pass envelope of `data`, same length as the input.
    pub fn apply(&self, data: &[f64]) -> Vec<f64> {
        let n = data.len();
        if n == 0 {
            return Vec::new();
        }
        let radius = self.radius() as isize;
        (0..n as isize)
            .map(|i| {
                self.taps
                    .iter()
                    .enumerate()
                    .map(|(k, &w)| w * data[reflect(i + k as isize - radius, n)])
                    .sum()
            })
            .collect()
    }
}

#[inline]
fn reflect(i: isize, n: usize) -> usize {
    let period = 2 * n as isize;
    let m = i.rem_euclid(period);
    if m < n as isize {
        m as usize
    } else {
        (period - 1 - m) as usize
    }
}
