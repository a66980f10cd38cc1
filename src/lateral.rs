//! Lateral pitch of periodic structures.
//!
//! A cosine with linear drift, `0.5·A·cos(π(x - x0)/P) + offset + drift·x`,
//! is fitted to the whole profile; its period `2P` is the pitch estimate.
//! Edge sharpness is then measured per edge: around every zero crossing of
//! the fitted cosine a logistic step `base + height / (1 + exp(-(x - xe)/w))`
//! is fitted to the samples within half a period. The 10–90 % transition
//! width of a logistic is `2·ln 9·|w|`.

use crate::data::Profile;
use crate::error::{MorphError, Result};
use crate::fit::{LeastSquaresProblem, LevenbergMarquardt, SolverOptions};
use crate::stats;
use log::{debug, warn};
use nalgebra::DVector;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct LateralOptions {
    /// Nominal pitch (full period) used to seed the cosine fit.
    pub nominal_pitch: f64,
    /// Edge windows with fewer valid samples are skipped.
    pub min_edge_samples: usize,
    pub solver: SolverOptions,
}

impl Default for LateralOptions {
    fn default() -> Self {
        Self {
            nominal_pitch: 10.0,
            min_edge_samples: 8,
            solver: SolverOptions::default(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct CosineParams {
    pub amplitude: f64,
    pub x0: f64,
    /// Half period `P`; may come out negative.
    pub half_period: f64,
    pub offset: f64,
    pub drift: f64,
}

impl CosineParams {
    fn from_slice(p: &[f64]) -> Self {
        Self {
            amplitude: p[0],
            x0: p[1],
            half_period: p[2],
            offset: p[3],
            drift: p[4],
        }
    }

    pub fn evaluate(&self, x: f64) -> f64 {
        cosine(&[self.amplitude, self.x0, self.half_period, self.offset, self.drift], x)
    }

    pub fn pitch(&self) -> f64 {
        2.0 * self.half_period.abs()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct EdgeFit {
    /// Fitted centre of the transition.
    pub position: f64,
    /// Logistic scale `w`.
    pub width: f64,
    /// Distance between the 10 % and 90 % levels, `2·ln 9·|w|`.
    pub transition_10_90: f64,
    /// Step height from the low to the high level, signed as fitted.
    pub height: f64,
    pub rising: bool,
}

#[derive(Clone, Debug, Serialize)]
pub struct LateralReport {
    pub pitch: f64,
    pub cosine: CosineParams,
    /// Fitted cosine at every sample.
    pub fitted: Vec<f64>,
    pub rms: f64,
    pub iterations: usize,
    pub edges: Vec<EdgeFit>,
    /// Edge windows whose logistic fit did not converge.
    pub rejected_edges: usize,
}

#[inline]
fn cosine(p: &[f64], x: f64) -> f64 {
    0.5 * p[0] * (std::f64::consts::PI * (x - p[1]) / p[2]).cos() + p[3] + p[4] * x
}

#[inline]
fn logistic(p: &[f64], x: f64) -> f64 {
    p[0] + p[1] / (1.0 + (-(x - p[2]) / p[3]).exp())
}

/// Residuals of `model` over paired samples.
struct CurveProblem<'a> {
    x: &'a [f64],
    z: &'a [f64],
    model: fn(&[f64], f64) -> f64,
}

impl LeastSquaresProblem for CurveProblem<'_> {
    fn residuals(&self, params: &DVector<f64>) -> DVector<f64> {
        let p = params.as_slice();
        DVector::from_iterator(
            self.x.len(),
            self.x
                .iter()
                .zip(self.z)
                .map(|(&x, &z)| (self.model)(p, x) - z),
        )
    }
}

/// Fits the pitch of `profile` and the sharpness of every complete edge.
pub fn estimate_pitch(profile: &Profile, options: &LateralOptions) -> Result<LateralReport> {
    let nominal_pitch = options.nominal_pitch;
    if !(nominal_pitch > 0.0) || !nominal_pitch.is_finite() {
        return Err(MorphError::invalid("nominal_pitch", "must be positive"));
    }
    let (x, z): (Vec<f64>, Vec<f64>) = profile
        .x()
        .iter()
        .zip(profile.z())
        .filter(|(_, z)| z.is_finite())
        .map(|(&x, &z)| (x, z))
        .unzip();
    if x.len() < 5 {
        return Err(MorphError::TooShort {
            found: x.len(),
            minimum: 5,
        });
    }

    let (zmin, zmax) = stats::min_max(&z)?;
    let initial = DVector::from_vec(vec![zmax - zmin, 0.0, 0.5 * nominal_pitch, 0.5 * (zmax + zmin), 0.0]);
    let solver = LevenbergMarquardt::new(options.solver.clone());
    let problem = CurveProblem {
        x: &x,
        z: &z,
        model: cosine,
    };
    let sol = solver.minimize(&problem, initial)?;
    let cos = CosineParams::from_slice(sol.params.as_slice());
    let pitch = cos.pitch();
    debug!(
        "lateral: pitch={pitch:.4} (nominal {nominal_pitch}) after {} iterations",
        sol.iterations
    );

    let (edges, rejected_edges) = fit_edges(&x, &z, &cos, options, &solver);
    if rejected_edges > 0 {
        warn!("lateral: {rejected_edges} edge fits did not converge");
    }
    Ok(LateralReport {
        pitch,
        fitted: profile.x().iter().map(|&x| cos.evaluate(x)).collect(),
        rms: sol.rms(x.len()),
        iterations: sol.iterations,
        cosine: cos,
        edges,
        rejected_edges,
    })
}

fn fit_edges(
    x: &[f64],
    z: &[f64],
    cos: &CosineParams,
    options: &LateralOptions,
    solver: &LevenbergMarquardt,
) -> (Vec<EdgeFit>, usize) {
    let half = cos.half_period.abs();
    let (first, last) = (x[0], x[x.len() - 1]);
    let mut edges = Vec::new();
    let mut rejected = 0usize;
    if !(half > 0.0) || !half.is_finite() {
        return (edges, rejected);
    }

    let k_first = ((first - cos.x0) / half - 0.5).ceil() as i64;
    let k_last = ((last - cos.x0) / half - 0.5).floor() as i64;
    for k in k_first..=k_last {
        let xe = cos.x0 + half * (k as f64 + 0.5);
        let (lo, hi) = (xe - 0.5 * half, xe + 0.5 * half);
        if lo < first || hi > last {
            continue;
        }
        let start = x.partition_point(|&v| v < lo);
        let end = x.partition_point(|&v| v <= hi);
        if end - start < options.min_edge_samples.max(4) {
            debug!("lateral: edge at {xe:.4} has {} samples, skipped", end - start);
            continue;
        }
        let (wx, wz) = (&x[start..end], &z[start..end]);
        let initial = DVector::from_vec(vec![wz[0], wz[wz.len() - 1] - wz[0], xe, half / 20.0]);
        let problem = CurveProblem {
            x: wx,
            z: wz,
            model: logistic,
        };
        match solver.minimize(&problem, initial) {
            Ok(sol) => {
                let p = sol.params.as_slice();
                let (height, position, width) = (p[1], p[2], p[3]);
                edges.push(EdgeFit {
                    position,
                    width,
                    transition_10_90: 2.0 * 9f64.ln() * width.abs(),
                    height,
                    rising: height * width > 0.0,
                });
            }
            Err(err) => {
                warn!("lateral: edge at {xe:.4} rejected: {err}");
                rejected += 1;
            }
        }
    }
    (edges, rejected)
}

impl Profile {
    pub fn lateral(&self, options: &LateralOptions) -> Result<LateralReport> {
        estimate_pitch(self, options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f64, b: f64, tol: f64) -> bool {
        (a - b).abs() <= tol
    }

    fn nominal(pitch: f64) -> LateralOptions {
        LateralOptions {
            nominal_pitch: pitch,
            ..LateralOptions::default()
        }
    }

    #[test]
    fn recovers_pitch_of_a_cosine_grating() {
        let dx = 0.05;
        let z: Vec<f64> = (0..800)
            .map(|i| {
                let x = i as f64 * dx;
                1.5 * (std::f64::consts::PI * x / 5.0).cos() + 0.2 + 0.01 * x
            })
            .collect();
        let p = Profile::from_spacing(dx, z).unwrap();
        let report = estimate_pitch(&p, &nominal(9.8)).unwrap();
        assert!(approx_eq(report.pitch, 10.0, 1e-6), "pitch={}", report.pitch);
        assert!(approx_eq(report.cosine.amplitude.abs(), 3.0, 1e-6));
        assert!(report.rms < 1e-6);
    }

    #[test]
    fn logistic_edges_of_a_square_grating() {
        let dx = 0.02;
        let z: Vec<f64> = (0..2500)
            .map(|i| {
                let x = i as f64 * dx;
                2.0 * (4.0 * (std::f64::consts::PI * x / 5.0).cos()).tanh()
            })
            .collect();
        let p = Profile::from_spacing(dx, z).unwrap();
        let report = estimate_pitch(&p, &nominal(9.8)).unwrap();
        assert!(approx_eq(report.pitch, 10.0, 0.05), "pitch={}", report.pitch);
        assert!(report.edges.len() >= 7, "edges={:?}", report.edges);
        for edge in &report.edges {
            let k = ((edge.position - 2.5) / 5.0).round();
            assert!(approx_eq(edge.position, 2.5 + 5.0 * k, 0.05), "{edge:?}");
            assert!(approx_eq(edge.height.abs(), 4.0, 0.5), "{edge:?}");
            assert!(approx_eq(
                edge.transition_10_90,
                2.0 * 9f64.ln() * edge.width.abs(),
                1e-12
            ));
            // Falling edges sit at odd multiples of the half period.
            assert_eq!(edge.rising, k as i64 % 2 != 0, "{edge:?}");
        }
    }

    #[test]
    fn rejects_non_positive_nominal_pitch() {
        let p = Profile::from_spacing(1.0, vec![0.0; 10]).unwrap();
        assert!(matches!(
            estimate_pitch(&p, &nominal(0.0)),
            Err(MorphError::InvalidParameter { .. })
        ));
        assert!(matches!(
            p.lateral(&nominal(f64::NAN)),
            Err(MorphError::InvalidParameter { .. })
        ));
    }
}
