//! Element-wise statistics over sequences of unequal length.

use serde::Serialize;

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct TolerantMean {
    pub mean: Vec<f64>,
    /// Population standard deviation at each index.
    pub std: Vec<f64>,
    /// Number of sequences contributing at each index.
    pub count: Vec<usize>,
}

impl TolerantMean {
    pub fn len(&self) -> usize {
        self.mean.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mean.is_empty()
    }
}

/// Index `i` of the result averages every sequence with more than `i`
/// entries. The result is as long as the longest sequence.
pub fn tolerant_mean<S: AsRef<[f64]>>(sequences: &[S]) -> TolerantMean {
    let len = sequences.iter().map(|s| s.as_ref().len()).max().unwrap_or(0);
    let mut sum = vec![0.0; len];
    let mut count = vec![0usize; len];
    for s in sequences {
        for (i, &v) in s.as_ref().iter().enumerate() {
            sum[i] += v;
            count[i] += 1;
        }
    }
    let mean: Vec<f64> = sum.iter().zip(&count).map(|(s, &c)| s / c as f64).collect();
    let mut ss = vec![0.0; len];
    for s in sequences {
        for (i, &v) in s.as_ref().iter().enumerate() {
            ss[i] += (v - mean[i]).powi(2);
        }
    }
    let std = ss
        .iter()
        .zip(&count)
        .map(|(s, &c)| (s / c as f64).sqrt())
        .collect();
    TolerantMean { mean, std, count }
}
