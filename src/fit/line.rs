//! Least-squares line fit on a profile.
//!
//! The line is stored as `c·z = m·x + q` with `c = -1`, so the fitted height
//! at `x` is `(-m·x - q) / c`.

use crate::data::Profile;
use crate::error::{MorphError, Result};
use log::debug;
use nalgebra::{Matrix2, Vector2};
use serde::{Deserialize, Serialize};

const EPS: f64 = 1e-12;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LineFit {
    pub m: f64,
    pub q: f64,
    pub c: f64,
}

impl LineFit {
    /// Height of the line at `x`.
    #[inline]
    pub fn evaluate(&self, x: f64) -> f64 {
        (-self.m * x - self.q) / self.c
    }
}

/// Ordinary least-squares fit of `z = m·x + q` over the valid samples,
/// solved through the normal equations of the `[x, 1]` design matrix.
pub fn fit_line_ls(profile: &Profile) -> Result<LineFit> {
    let mut ata = Matrix2::<f64>::zeros();
    let mut atb = Vector2::<f64>::zeros();
    let mut n = 0usize;
    for (&x, &z) in profile.x().iter().zip(profile.z()) {
        if !z.is_finite() {
            continue;
        }
        ata[(0, 0)] += x * x;
        ata[(0, 1)] += x;
        ata[(1, 1)] += 1.0;
        atb[0] += x * z;
        atb[1] += z;
        n += 1;
    }
    if n < 2 {
        return Err(MorphError::TooShort {
            found: n,
            minimum: 2,
        });
    }
    ata[(1, 0)] = ata[(0, 1)];
    if ata.determinant().abs() <= EPS {
        return Err(MorphError::SingularSystem("line fit"));
    }
    let sol = ata
        .lu()
        .solve(&atb)
        .ok_or(MorphError::SingularSystem("line fit"))?;
    let fit = LineFit {
        m: sol[0],
        q: sol[1],
        c: -1.0,
    };
    debug!("line fit: m={:.6e} q={:.6e}", fit.m, fit.q);
    Ok(fit)
}

/// Subtracts `fit` from the heights of `profile`, recording the line on the
/// returned copy. Sentinels stay sentinels.
pub fn remove_line(profile: &Profile, fit: &LineFit) -> Result<Profile> {
    let z = profile
        .x()
        .iter()
        .zip(profile.z())
        .map(|(&x, &z)| z - fit.evaluate(x))
        .collect();
    Ok(profile.with_heights(z)?.with_line(*fit))
}

impl Profile {
    /// Fits a line and returns the leveled profile.
    pub fn level_line(&self) -> Result<Profile> {
        let fit = fit_line_ls(self)?;
        remove_line(self, &fit)
    }
}
