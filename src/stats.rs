//! Sentinel-aware reductions.
//!
//! Heights use `NaN` as the invalid-sample sentinel. Every reduction here
//! skips sentinels and reports an all-sentinel input as
//! [`MorphError::AllSentinel`] instead of returning a NaN.

use crate::error::{MorphError, Result};

/// Iterates over the finite samples of `values`.
#[inline]
pub fn valid(values: &[f64]) -> impl Iterator<Item = f64> + '_ {
    values.iter().copied().filter(|v| v.is_finite())
}

/// Mean over the valid samples.
pub fn mean(values: &[f64]) -> Result<f64> {
    let (sum, n) = valid(values).fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    if n == 0 {
        return Err(MorphError::AllSentinel);
    }
    Ok(sum / n as f64)
}

/// Population standard deviation (divides by `N`) over the valid samples.
pub fn std_dev(values: &[f64]) -> Result<f64> {
    let mu = mean(values)?;
    let (ss, n) = valid(values).fold((0.0, 0usize), |(s, n), v| {
        let d = v - mu;
        (s + d * d, n + 1)
    });
    Ok((ss / n as f64).sqrt())
}

/// Index of the smallest valid sample.
pub fn argmin(values: &[f64]) -> Option<usize> {
    extreme(values, |a, b| a < b)
}

/// Index of the largest valid sample.
pub fn argmax(values: &[f64]) -> Option<usize> {
    extreme(values, |a, b| a > b)
}

fn extreme(values: &[f64], better: impl Fn(f64, f64) -> bool) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, &v) in values.iter().enumerate() {
        if !v.is_finite() {
            continue;
        }
        match best {
            Some((_, b)) if !better(v, b) => {}
            _ => best = Some((i, v)),
        }
    }
    best.map(|(i, _)| i)
}

/// Minimum and maximum of the valid samples.
pub fn min_max(values: &[f64]) -> Result<(f64, f64)> {
    let mut lo = f64::INFINITY;
    let mut hi = f64::NEG_INFINITY;
    for v in valid(values) {
        lo = lo.min(v);
        hi = hi.max(v);
    }
    if lo > hi {
        return Err(MorphError::AllSentinel);
    }
    Ok((lo, hi))
}

/// Rounds half-way cases to the nearest even integer, the rounding used
/// when partitioning sample windows.
#[inline]
pub fn round_half_even(v: f64) -> f64 {
    v.round_ties_even()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reductions_skip_sentinels() {
        let v = [1.0, f64::NAN, 3.0];
        assert_eq!(mean(&v).unwrap(), 2.0);
        assert_eq!(std_dev(&v).unwrap(), 1.0);
        assert_eq!(argmin(&v), Some(0));
        assert_eq!(argmax(&v), Some(2));
        assert_eq!(min_max(&v).unwrap(), (1.0, 3.0));
    }

    #[test]
    fn all_sentinel_is_an_error() {
        let v = [f64::NAN, f64::NAN];
        assert_eq!(mean(&v), Err(MorphError::AllSentinel));
        assert_eq!(min_max(&v), Err(MorphError::AllSentinel));
        assert_eq!(argmax(&v), None);
    }

    #[test]
    fn ties_round_to_even() {
        assert_eq!(round_half_even(0.5), 0.0);
        assert_eq!(round_half_even(1.5), 2.0);
        assert_eq!(round_half_even(2.4), 2.0);
    }
}
