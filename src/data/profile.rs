use crate::error::{MorphError, Result};
use crate::fit::LineFit;
use serde::{Deserialize, Serialize};

/// Ordered 1-D height measurement.
///
/// `x` is strictly increasing and matches `z` in length. `z0` keeps the
/// heights the profile was created with, so later leveling can be compared
/// against the raw data. `NaN` heights mark samples outside the measurable
/// range.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawProfile")]
pub struct Profile {
    x: Vec<f64>,
    z: Vec<f64>,
    z0: Vec<f64>,
    line: Option<LineFit>,
}

#[derive(Deserialize)]
struct RawProfile {
    x: Vec<f64>,
    z: Vec<f64>,
}

impl TryFrom<RawProfile> for Profile {
    type Error = MorphError;

    fn try_from(raw: RawProfile) -> Result<Self> {
        Profile::new(raw.x, raw.z)
    }
}

impl Profile {
    /// Creates a profile, validating lengths and coordinate ordering.
    pub fn new(x: Vec<f64>, z: Vec<f64>) -> Result<Self> {
        if x.len() != z.len() {
            return Err(MorphError::LengthMismatch {
                x: x.len(),
                z: z.len(),
            });
        }
        if x.len() < 2 {
            return Err(MorphError::TooShort {
                found: x.len(),
                minimum: 2,
            });
        }
        for (i, pair) in x.windows(2).enumerate() {
            if !(pair[1] > pair[0]) {
                return Err(MorphError::NonIncreasing { index: i + 1 });
            }
        }
        let z0 = z.clone();
        Ok(Self {
            x,
            z,
            z0,
            line: None,
        })
    }

    /// Creates a uniformly sampled profile starting at `x = 0`.
    pub fn from_spacing(spacing: f64, z: Vec<f64>) -> Result<Self> {
        if !(spacing > 0.0) {
            return Err(MorphError::invalid("spacing", "must be positive"));
        }
        let x = (0..z.len()).map(|i| i as f64 * spacing).collect();
        Self::new(x, z)
    }

    #[inline]
    pub fn x(&self) -> &[f64] {
        &self.x
    }

    #[inline]
    pub fn z(&self) -> &[f64] {
        &self.z
    }

    /// Heights as captured when the profile was created.
    #[inline]
    pub fn z0(&self) -> &[f64] {
        &self.z0
    }

    /// Line removed by [`crate::fit::remove_line`], if any.
    #[inline]
    pub fn line(&self) -> Option<&LineFit> {
        self.line.as_ref()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.z.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.z.is_empty()
    }

    /// Mean sample spacing over the whole profile.
    pub fn spacing(&self) -> f64 {
        let n = self.x.len();
        (self.x[n - 1] - self.x[0]) / (n - 1) as f64
    }

    /// Index of the first sentinel sample, if any.
    pub fn first_sentinel(&self) -> Option<usize> {
        self.z.iter().position(|v| !v.is_finite())
    }

    /// Returns a copy carrying new heights on the same coordinates. `z0` is
    /// preserved.
    pub fn with_heights(&self, z: Vec<f64>) -> Result<Self> {
        if z.len() != self.x.len() {
            return Err(MorphError::LengthMismatch {
                x: self.x.len(),
                z: z.len(),
            });
        }
        Ok(Self {
            x: self.x.clone(),
            z,
            z0: self.z0.clone(),
            line: self.line,
        })
    }

    pub(crate) fn with_line(mut self, line: LineFit) -> Self {
        self.line = Some(line);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_mismatched_lengths() {
        let err = Profile::new(vec![0.0, 1.0], vec![0.0]).unwrap_err();
        assert_eq!(err, MorphError::LengthMismatch { x: 2, z: 1 });
    }

    #[test]
    fn rejects_non_increasing_coordinates() {
        let err = Profile::new(vec![0.0, 1.0, 1.0], vec![0.0; 3]).unwrap_err();
        assert_eq!(err, MorphError::NonIncreasing { index: 2 });
    }

    #[test]
    fn keeps_original_heights() {
        let p = Profile::from_spacing(0.5, vec![1.0, 2.0, 3.0]).unwrap();
        let q = p.with_heights(vec![0.0; 3]).unwrap();
        assert_eq!(q.z0(), &[1.0, 2.0, 3.0]);
        assert_eq!(q.x(), &[0.0, 0.5, 1.0]);
        assert!((p.spacing() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn deserialization_validates() {
        let ok: Profile = serde_json::from_str(r#"{"x":[0,1,2],"z":[1,2,3]}"#).unwrap();
        assert_eq!(ok.len(), 3);
        let bad = serde_json::from_str::<Profile>(r#"{"x":[0,2,1],"z":[1,2,3]}"#);
        assert!(bad.is_err());
    }
}
