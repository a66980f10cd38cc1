//! Error type shared by every analysis component.

use crate::roughness::AmplitudeParams;

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, MorphError>;

/// Structured failures returned by the analysis components.
///
/// Quality warnings (poorly defined steps, one-sided histograms, rejected
/// edge fits) are not errors; they are reported on the result records.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MorphError {
    /// Coordinate and height arrays differ in length.
    #[error("length mismatch: {x} coordinates vs {z} heights")]
    LengthMismatch { x: usize, z: usize },

    /// Coordinates are not strictly increasing.
    #[error("coordinates must be strictly increasing (violated at index {index})")]
    NonIncreasing { index: usize },

    /// Surface grids do not share the same shape.
    #[error("grid shape mismatch: expected {expected:?}, got {found:?}")]
    ShapeMismatch {
        expected: (usize, usize),
        found: (usize, usize),
    },

    /// Input holds fewer samples than the operation needs.
    #[error("input too short: {found} samples, need at least {minimum}")]
    TooShort { found: usize, minimum: usize },

    /// Input violates a precondition that has no dedicated variant.
    #[error("malformed input: {0}")]
    MalformedInput(String),

    /// Step detection found too few edges to form a region triple.
    #[error("too few step boundaries ({found} < {minimum})")]
    TooFewBoundaries { found: usize, minimum: usize },

    /// A region between two boundaries holds no valid samples.
    #[error("region {index} between boundaries is empty")]
    EmptyRegion { index: usize },

    /// Every sample of the input is the NaN sentinel.
    #[error("no valid samples: all values are sentinel")]
    AllSentinel,

    /// A caller-supplied parameter is out of range.
    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    /// A linear system could not be solved.
    #[error("singular system in {0}")]
    SingularSystem(&'static str),

    /// Residual has zero variance; skewness and kurtosis are undefined. The
    /// amplitude parameters are still defined and travel with the error.
    #[error("residual has zero variance (Rq = {rq:e}); Rsk and Rku are undefined", rq = .amplitude.rq)]
    ZeroVariance { amplitude: AmplitudeParams },

    /// Nonlinear fit stopped without meeting its convergence criteria.
    #[error("fit did not converge after {iterations} iterations (last iterate {last:?})")]
    FitDidNotConverge { iterations: usize, last: Vec<f64> },
}

impl MorphError {
    pub(crate) fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        MorphError::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}
