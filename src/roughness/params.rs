use crate::error::{MorphError, Result};
use serde::Serialize;

/// Residuals with `Rq` below this fraction of the height scale are treated
/// as flat.
const ZERO_VARIANCE_RATIO: f64 = 1e-12;

/// Amplitude parameters that stay defined for a flat residual.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct AmplitudeParams {
    pub ra: f64,
    pub rq: f64,
    pub rp: f64,
    pub rv: f64,
    pub rz: f64,
}

/// Full amplitude parameter set. Moments are population moments (divide
/// by `N`).
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct RoughnessParams {
    pub ra: f64,
    pub rq: f64,
    pub rp: f64,
    pub rv: f64,
    pub rz: f64,
    pub rsk: f64,
    pub rku: f64,
}

/// Ra, Rq, Rp, Rv and Rz of a roughness residual.
pub fn amplitude_params(residual: &[f64]) -> Result<AmplitudeParams> {
    if residual.is_empty() {
        return Err(MorphError::TooShort {
            found: 0,
            minimum: 1,
        });
    }
    let n = residual.len() as f64;
    let ra = residual.iter().map(|r| r.abs()).sum::<f64>() / n;
    let rq = (residual.iter().map(|r| r * r).sum::<f64>() / n).sqrt();
    let max = residual.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let min = residual.iter().copied().fold(f64::INFINITY, f64::min);
    let rp = max.abs();
    let rv = min.abs();
    Ok(AmplitudeParams {
        ra,
        rq,
        rp,
        rv,
        rz: rp + rv,
    })
}

/// All parameters of `residual`; `scale` is the magnitude of the heights the
/// residual was derived from and sets the zero-variance tolerance.
pub fn roughness_from_residual(residual: &[f64], scale: f64) -> Result<RoughnessParams> {
    let amp = amplitude_params(residual)?;
    if amp.rq <= ZERO_VARIANCE_RATIO * scale.abs() || amp.rq == 0.0 {
        return Err(MorphError::ZeroVariance { amplitude: amp });
    }
    let n = residual.len() as f64;
    let m3 = residual.iter().map(|r| r.powi(3)).sum::<f64>() / n;
    let m4 = residual.iter().map(|r| r.powi(4)).sum::<f64>() / n;
    Ok(RoughnessParams {
        ra: amp.ra,
        rq: amp.rq,
        rp: amp.rp,
        rv: amp.rv,
        rz: amp.rz,
        rsk: m3 / amp.rq.powi(3),
        rku: m4 / amp.rq.powi(4),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn square_wave_moments() {
        let r: Vec<f64> = (0..100).map(|i| if i % 2 == 0 { 1.0 } else { -1.0 }).collect();
        let p = roughness_from_residual(&r, 1.0).unwrap();
        assert_eq!(p.ra, 1.0);
        assert_eq!(p.rq, 1.0);
        assert_eq!(p.rz, p.rp + p.rv);
        assert!(p.rsk.abs() < 1e-12);
        assert!((p.rku - 1.0).abs() < 1e-12);
    }

    #[test]
    fn flat_residual_has_zero_amplitude_and_no_moments() {
        let r = vec![0.0; 10];
        let amp = amplitude_params(&r).unwrap();
        assert_eq!(amp.ra, 0.0);
        assert_eq!(amp.rz, 0.0);
        assert_eq!(
            roughness_from_residual(&r, 1.0).unwrap_err(),
            MorphError::ZeroVariance { amplitude: amp }
        );
    }

    #[test]
    fn rounding_level_residual_keeps_its_amplitudes() {
        let r = [1e-15, -1e-15, 1e-15, -1e-15];
        match roughness_from_residual(&r, 100.0) {
            Err(MorphError::ZeroVariance { amplitude }) => {
                assert_eq!(amplitude.ra, 1e-15);
                assert_eq!(amplitude.rq, 1e-15);
                assert_eq!(amplitude.rz, 2e-15);
            }
            other => panic!("expected zero variance, got {other:?}"),
        }
    }

    #[test]
    fn rms_bounds_mean_absolute() {
        let r = [0.3, -1.2, 2.5, 0.0, -0.7];
        let amp = amplitude_params(&r).unwrap();
        assert!(amp.ra >= 0.0);
        assert!(amp.rq >= amp.ra);
        assert_eq!(amp.rp, 2.5);
        assert_eq!(amp.rv, 1.2);
    }
}
