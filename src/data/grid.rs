//! Owned `f64` grid in row-major layout.
//!
//! Backing storage for every plane of a [`Surface`](super::Surface)
//! (coordinates and heights). Rows are contiguous; `NaN` marks invalid
//! height samples.
use crate::error::{MorphError, Result};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Grid {
    /// Number of columns
    pub w: usize,
    /// Number of rows
    pub h: usize,
    /// Row-major samples, `w * h` long
    pub data: Vec<f64>,
}

impl Grid {
    /// Zero-initialized grid of size `w × h`.
    pub fn new(w: usize, h: usize) -> Self {
        Self::filled(w, h, 0.0)
    }

    /// Grid of size `w × h` with every sample set to `value`.
    pub fn filled(w: usize, h: usize, value: f64) -> Self {
        Self {
            w,
            h,
            data: vec![value; w * h],
        }
    }

    /// Wraps `data` as a `w × h` grid, checking its length.
    pub fn from_vec(w: usize, h: usize, data: Vec<f64>) -> Result<Self> {
        if data.len() != w * h {
            return Err(MorphError::LengthMismatch {
                x: w * h,
                z: data.len(),
            });
        }
        Ok(Self { w, h, data })
    }

    /// Builds a grid by evaluating `f(col, row)` at every node.
    pub fn from_fn(w: usize, h: usize, mut f: impl FnMut(usize, usize) -> f64) -> Self {
        let mut data = Vec::with_capacity(w * h);
        for r in 0..h {
            for c in 0..w {
                data.push(f(c, r));
            }
        }
        Self { w, h, data }
    }

    #[inline]
    pub fn shape(&self) -> (usize, usize) {
        (self.w, self.h)
    }

    #[inline]
    /// Convert (col, row) to a linear index into `data`.
    pub fn idx(&self, c: usize, r: usize) -> usize {
        r * self.w + c
    }

    #[inline]
    pub fn get(&self, c: usize, r: usize) -> f64 {
        self.data[self.idx(c, r)]
    }

    #[inline]
    pub fn set(&mut self, c: usize, r: usize, v: f64) {
        let i = self.idx(c, r);
        self.data[i] = v;
    }

    #[inline]
    pub fn row(&self, r: usize) -> &[f64] {
        let start = r * self.w;
        &self.data[start..start + self.w]
    }

    /// Number of non-sentinel samples.
    pub fn valid_count(&self) -> usize {
        self.data.iter().filter(|v| v.is_finite()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indexing_is_row_major() {
        let g = Grid::from_fn(3, 2, |c, r| (r * 10 + c) as f64);
        assert_eq!(g.get(2, 1), 12.0);
        assert_eq!(g.row(1), &[10.0, 11.0, 12.0]);
    }

    #[test]
    fn from_vec_checks_length() {
        assert!(Grid::from_vec(2, 2, vec![0.0; 3]).is_err());
        assert!(Grid::from_vec(2, 2, vec![0.0; 4]).is_ok());
    }
}
