//! Symmetric banded matrices with Cholesky factorization.
//!
//! The least-squares B-spline fitters assemble normal equations whose matrix
//! is symmetric, positive definite, and banded with bandwidth `degree`;
//! solving through a banded Cholesky factor keeps the fit linear in the
//! number of controls.

use gmk_core::{GmkError, Result};
use gmk_math::Tuple;

/// Symmetric banded matrix stored as the diagonal plus `num_bands` lower
/// bands, row-major: entry `(r, c)` with `r >= c` and `r - c <= num_bands`
/// lives at `r * (num_bands + 1) + (r - c)`.
#[derive(Debug, Clone)]
pub struct SymmetricBandedMatrix {
    size: usize,
    num_bands: usize,
    elem: Vec<f64>,
}

impl SymmetricBandedMatrix {
    pub fn new(size: usize, num_bands: usize) -> Self {
        debug_assert!(size > 0 && num_bands < size);
        Self {
            size,
            num_bands,
            elem: vec![0.0; size * (num_bands + 1)],
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn num_bands(&self) -> usize {
        self.num_bands
    }

    /// Entry `(r, c)`; zero outside the band.
    pub fn get(&self, r: usize, c: usize) -> f64 {
        let (lo, hi) = if r >= c { (c, r) } else { (r, c) };
        if hi - lo <= self.num_bands {
            self.elem[hi * (self.num_bands + 1) + (hi - lo)]
        } else {
            0.0
        }
    }

    /// Sets entry `(r, c)` and its symmetric mirror. Panics outside the band.
    pub fn set(&mut self, r: usize, c: usize, value: f64) {
        let (lo, hi) = if r >= c { (c, r) } else { (r, c) };
        assert!(hi - lo <= self.num_bands, "entry outside the band");
        self.elem[hi * (self.num_bands + 1) + (hi - lo)] = value;
    }

    /// Adds `value` to entry `(r, c)` (and implicitly its mirror).
    pub fn add(&mut self, r: usize, c: usize, value: f64) {
        let current = self.get(r, c);
        self.set(r, c, current + value);
    }

    /// Cholesky factorization `A = L L^T`, consuming the matrix.
    ///
    /// Fails with `GmkError::Numerical` when a pivot is not positive, i.e.
    /// the matrix is not positive definite.
    pub fn cholesky(mut self) -> Result<BandedCholesky> {
        let m = self.num_bands;
        for j in 0..self.size {
            let k_min = j.saturating_sub(m);
            let mut sum = self.get(j, j);
            for k in k_min..j {
                let ljk = self.get(j, k);
                sum -= ljk * ljk;
            }
            if sum <= 0.0 {
                return Err(GmkError::Numerical(format!(
                    "banded Cholesky pivot {} is not positive ({})",
                    j, sum
                )));
            }
            let ljj = sum.sqrt();
            self.set(j, j, ljj);

            let i_max = (j + m).min(self.size - 1);
            for i in j + 1..=i_max {
                let k_min = i.saturating_sub(m).max(k_min);
                let mut sum = self.get(i, j);
                for k in k_min..j {
                    sum -= self.get(i, k) * self.get(j, k);
                }
                self.set(i, j, sum / ljj);
            }
        }
        Ok(BandedCholesky { factor: self })
    }
}

/// Lower-triangular banded Cholesky factor.
#[derive(Debug, Clone)]
pub struct BandedCholesky {
    factor: SymmetricBandedMatrix,
}

impl BandedCholesky {
    /// Solves `A x = b` where `A = L L^T`, for tuple-valued right-hand sides
    /// (each spatial dimension is an independent system).
    pub fn solve<V: Tuple>(&self, b: &[V]) -> Vec<V> {
        let n = self.factor.size;
        let m = self.factor.num_bands;
        debug_assert_eq!(b.len(), n);
        let mut x = b.to_vec();

        // Forward substitution, L y = b.
        for r in 0..n {
            let mut value = x[r];
            for c in r.saturating_sub(m)..r {
                value = value - x[c] * self.factor.get(r, c);
            }
            x[r] = value * (1.0 / self.factor.get(r, r));
        }

        // Back substitution, L^T x = y.
        for r in (0..n).rev() {
            let mut value = x[r];
            for c in r + 1..(r + m + 1).min(n) {
                value = value - x[c] * self.factor.get(c, r);
            }
            x[r] = value * (1.0 / self.factor.get(r, r));
        }

        x
    }
}
