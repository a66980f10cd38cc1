use super::Profile;
use crate::error::Result;
use crate::stats;
use serde::Serialize;

/// Contiguous `(x, z)` window cut from a profile.
///
/// Produced by step detection and returned with its report; it owns a copy
/// of the samples and is never stored back on the profile.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Roi {
    pub x: Vec<f64>,
    pub z: Vec<f64>,
}

impl Roi {
    /// Copies samples `[start, end)` of `profile`.
    pub fn from_profile(profile: &Profile, start: usize, end: usize) -> Self {
        let end = end.max(start);
        Self {
            x: profile.x()[start..end].to_vec(),
            z: profile.z()[start..end].to_vec(),
        }
    }

    pub fn len(&self) -> usize {
        self.z.len()
    }

    pub fn is_empty(&self) -> bool {
        self.z.is_empty()
    }

    pub fn mean(&self) -> Result<f64> {
        stats::mean(&self.z)
    }

    pub fn std_dev(&self) -> Result<f64> {
        stats::std_dev(&self.z)
    }
}
