//! Histogram height estimation and Abbott–Firestone bearing curve.
//!
//! A leveled two-level artifact has a bimodal height distribution with one
//! mode on each side of zero. The height estimate is the distance between
//! the left edges of the most populated negative bin and the most populated
//! non-negative bin. Single-mode data gives a meaningless estimate; check
//! [`HistHeight::is_bimodal`].

use crate::data::{Profile, Surface};
use crate::error::{MorphError, Result};
use crate::stats;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct HistogramOptions {
    pub bins: usize,
}

impl Default for HistogramOptions {
    fn default() -> Self {
        Self { bins: 100 }
    }
}

/// Equal-width histogram over `[min, max]`; the last bin is closed.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Histogram {
    pub counts: Vec<usize>,
    /// `counts.len() + 1` bin edges.
    pub edges: Vec<f64>,
}

impl Histogram {
    /// Bins the valid samples of `samples`.
    pub fn build(samples: &[f64], bins: usize) -> Result<Self> {
        if bins == 0 {
            return Err(MorphError::invalid("bins", "must be at least 1"));
        }
        let (mut lo, mut hi) = stats::min_max(samples)?;
        if lo == hi {
            lo -= 0.5;
            hi += 0.5;
        }
        let edges: Vec<f64> = (0..=bins)
            .map(|i| lo + (hi - lo) * i as f64 / bins as f64)
            .collect();
        let norm = bins as f64 / (hi - lo);
        let mut counts = vec![0usize; bins];
        for v in stats::valid(samples) {
            let mut idx = (((v - lo) * norm) as usize).min(bins - 1);
            // Guard against rounding putting a sample on the wrong side of
            // an edge.
            if idx > 0 && v < edges[idx] {
                idx -= 1;
            } else if idx + 1 < bins && v >= edges[idx + 1] {
                idx += 1;
            }
            counts[idx] += 1;
        }
        Ok(Self { counts, edges })
    }

    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }
}

/// Most populated bin on one side of zero.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct ModeBin {
    /// Left edge of the bin.
    pub edge: f64,
    pub count: usize,
}

/// Cumulative material ratio accumulated from the highest bin downward.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BearingCurve {
    /// Lower edge of the `k`-th bin counted from the top.
    pub heights: Vec<f64>,
    /// Percentage of samples at or above `heights[k]`.
    pub material_ratio: Vec<f64>,
}

impl BearingCurve {
    pub fn from_histogram(hist: &Histogram) -> Self {
        let total = hist.total().max(1) as f64;
        let bins = hist.counts.len();
        let mut heights = Vec::with_capacity(bins);
        let mut material_ratio = Vec::with_capacity(bins);
        let mut acc = 0.0;
        for i in (0..bins).rev() {
            acc += hist.counts[i] as f64 / total * 100.0;
            heights.push(hist.edges[i]);
            material_ratio.push(acc);
        }
        Self {
            heights,
            material_ratio,
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct HistHeight {
    /// `high.edge - low.edge`; a missing side counts as edge `0`.
    pub height: f64,
    /// Mode among bins with negative left edge.
    pub low: Option<ModeBin>,
    /// Mode among bins with non-negative left edge.
    pub high: Option<ModeBin>,
    pub histogram: Histogram,
    pub bearing: BearingCurve,
}

impl HistHeight {
    /// True when both sides of zero hold a populated mode.
    pub fn is_bimodal(&self) -> bool {
        self.low.is_some() && self.high.is_some()
    }
}

/// Estimates the height separation of a bimodal height distribution.
pub fn hist_height(samples: &[f64], bins: usize) -> Result<HistHeight> {
    let histogram = Histogram::build(samples, bins)?;
    let mut low: Option<ModeBin> = None;
    let mut high: Option<ModeBin> = None;
    for (&edge, &count) in histogram.edges.iter().zip(&histogram.counts) {
        let side = if edge < 0.0 { &mut low } else { &mut high };
        let best = side.map_or(0, |m| m.count);
        if count > best {
            *side = Some(ModeBin { edge, count });
        }
    }
    let height = high.map_or(0.0, |m| m.edge) - low.map_or(0.0, |m| m.edge);
    debug!(
        "histogram modes: low={:?} high={:?} height={:.4e}",
        low, high, height
    );
    if low.is_none() || high.is_none() {
        warn!("histogram height: distribution is not bimodal around zero");
    }
    let bearing = BearingCurve::from_histogram(&histogram);
    Ok(HistHeight {
        height,
        low,
        high,
        histogram,
        bearing,
    })
}

impl Profile {
    pub fn hist_height(&self, bins: usize) -> Result<HistHeight> {
        hist_height(self.z(), bins)
    }
}

impl Surface {
    pub fn hist_height(&self, bins: usize) -> Result<HistHeight> {
        hist_height(&self.z().data, bins)
    }
}
