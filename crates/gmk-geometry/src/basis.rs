//! B-spline basis functions with derivatives through order 3.

use gmk_core::{GmkError, Result};
use serde::{Deserialize, Serialize};

/// Highest derivative order the evaluators produce.
pub const MAX_ORDER: usize = 3;

/// A B-spline basis: degree, full knot vector (multiplicities expanded),
/// and open/periodic topology.
///
/// For an open basis the knot count is `num_controls + degree + 1`. A
/// periodic basis stores an extended knot vector of
/// `num_controls + 2 * degree + 1` knots and wraps control indices modulo
/// `num_controls`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BasisFunction {
    degree: usize,
    num_controls: usize,
    knots: Vec<f64>,
    periodic: bool,
    uniform: bool,
}

/// Values and derivatives of the `degree + 1` basis functions that are
/// nonzero at the query parameter.
#[derive(Debug, Clone)]
pub struct BasisEval {
    /// Index of the first contributing control point (before any periodic
    /// wrapping).
    pub min_index: usize,
    /// `ders[k][j]` is the k-th derivative of basis function
    /// `min_index + j`, for `k <= max_order` and `j <= degree`.
    pub ders: Vec<Vec<f64>>,
}

impl BasisEval {
    /// Index of the last contributing control point.
    pub fn max_index(&self, degree: usize) -> usize {
        self.min_index + degree
    }

    pub fn values(&self) -> &[f64] {
        &self.ders[0]
    }
}

impl BasisFunction {
    /// Open basis with uniformly spaced knots on `[0, 1]` and the end knots
    /// repeated `degree + 1` times (the clamped spline).
    pub fn open_uniform(num_controls: usize, degree: usize) -> Result<Self> {
        Self::check_counts(num_controls, degree)?;
        let n = num_controls + degree + 1;
        let denom = (num_controls - degree) as f64;
        let mut knots = Vec::with_capacity(n);
        for i in 0..n {
            if i <= degree {
                knots.push(0.0);
            } else if i >= num_controls {
                knots.push(1.0);
            } else {
                knots.push((i - degree) as f64 / denom);
            }
        }
        Ok(Self {
            degree,
            num_controls,
            knots,
            periodic: false,
            uniform: true,
        })
    }

    /// Open basis with an explicit full knot vector
    /// (`num_controls + degree + 1` nondecreasing knots).
    pub fn open_nonuniform(num_controls: usize, degree: usize, knots: Vec<f64>) -> Result<Self> {
        Self::check_counts(num_controls, degree)?;
        if knots.len() != num_controls + degree + 1 {
            return Err(GmkError::Construction(format!(
                "knot vector must have {} elements, got {}",
                num_controls + degree + 1,
                knots.len()
            )));
        }
        Self::check_knots(&knots, degree, knots.len() - degree - 1)?;
        Ok(Self {
            degree,
            num_controls,
            knots,
            periodic: false,
            uniform: false,
        })
    }

    /// Open basis from `(value, multiplicity)` pairs. The multiplicities must
    /// sum to `num_controls + degree + 1`; end multiplicities of `degree + 1`
    /// give the standard clamped spline.
    pub fn from_multiplicities(
        num_controls: usize,
        degree: usize,
        unique_knots: &[(f64, usize)],
    ) -> Result<Self> {
        let total: usize = unique_knots.iter().map(|&(_, m)| m).sum();
        if total != num_controls + degree + 1 {
            return Err(GmkError::Construction(format!(
                "knot multiplicities sum to {}, expected {}",
                total,
                num_controls + degree + 1
            )));
        }
        if unique_knots.iter().any(|&(_, m)| m == 0 || m > degree + 1) {
            return Err(GmkError::Construction(
                "knot multiplicity must be in 1..=degree+1".into(),
            ));
        }
        let mut knots = Vec::with_capacity(total);
        for &(value, mult) in unique_knots {
            knots.extend(std::iter::repeat(value).take(mult));
        }
        Self::open_nonuniform(num_controls, degree, knots)
    }

    /// Periodic basis with uniformly spaced knots; the resulting curve is
    /// closed, with control indices wrapping modulo `num_controls`.
    pub fn periodic_uniform(num_controls: usize, degree: usize) -> Result<Self> {
        Self::check_counts(num_controls, degree)?;
        let n = num_controls + 2 * degree + 1;
        let denom = num_controls as f64;
        let knots = (0..n)
            .map(|i| (i as f64 - degree as f64) / denom)
            .collect();
        Ok(Self {
            degree,
            num_controls,
            knots,
            periodic: true,
            uniform: true,
        })
    }

    fn check_counts(num_controls: usize, degree: usize) -> Result<()> {
        if degree < 1 || num_controls <= degree {
            return Err(GmkError::Construction(format!(
                "require 1 <= degree ({}) < num_controls ({})",
                degree, num_controls
            )));
        }
        Ok(())
    }

    fn check_knots(knots: &[f64], degree: usize, last_span: usize) -> Result<()> {
        if knots.windows(2).any(|w| w[1] < w[0]) {
            return Err(GmkError::Construction(
                "knot vector must be nondecreasing".into(),
            ));
        }
        if knots[degree] >= knots[last_span] {
            return Err(GmkError::Construction("empty basis domain".into()));
        }
        Ok(())
    }

    pub fn degree(&self) -> usize {
        self.degree
    }

    pub fn num_controls(&self) -> usize {
        self.num_controls
    }

    pub fn knots(&self) -> &[f64] {
        &self.knots
    }

    pub fn is_periodic(&self) -> bool {
        self.periodic
    }

    pub fn is_uniform(&self) -> bool {
        self.uniform
    }

    /// Parameter domain `(tmin, tmax)`.
    pub fn domain(&self) -> (f64, f64) {
        (
            self.knots[self.degree],
            self.knots[self.knots.len() - self.degree - 1],
        )
    }

    /// Distinct knot values inside the domain, including both endpoints.
    /// These are the parameters where the spline is only C^(degree - mult)
    /// smooth.
    pub fn breakpoints(&self) -> Vec<f64> {
        let lo = self.degree;
        let hi = self.knots.len() - self.degree - 1;
        let mut out = Vec::new();
        for &k in &self.knots[lo..=hi] {
            if out.last().map_or(true, |&last: &f64| k > last) {
                out.push(k);
            }
        }
        out
    }

    /// Maps a contributing index from [`BasisEval`] onto a control index,
    /// wrapping for periodic bases.
    pub fn control_index(&self, i: usize) -> usize {
        if self.periodic {
            i % self.num_controls
        } else {
            debug_assert!(i < self.num_controls);
            i
        }
    }

    /// Evaluate basis values and derivatives at `t`, clamped to the domain.
    ///
    /// `max_order <= 3`; derivatives of order above the degree are zero.
    pub fn evaluate(&self, t: f64, max_order: usize) -> BasisEval {
        debug_assert!(max_order <= MAX_ORDER);
        let (tmin, tmax) = self.domain();
        let t = t.clamp(tmin, tmax);
        let span = self.find_span(t);
        let ders = ders_basis_functions(self.degree, &self.knots, span, t, max_order);
        BasisEval {
            min_index: span - self.degree,
            ders,
        }
    }

    /// Knot span index `i` with `knots[i] <= t < knots[i+1]`, clamped into
    /// the valid span range.
    fn find_span(&self, t: f64) -> usize {
        let d = self.degree;
        let hi = self.knots.len() - d - 1;
        if t >= self.knots[hi] {
            // Upper boundary: the last nonempty span.
            let mut s = hi - 1;
            while self.knots[s + 1] <= self.knots[s] {
                s -= 1;
            }
            return s;
        }
        if t <= self.knots[d] {
            return d;
        }
        let mut low = d;
        let mut high = hi;
        let mut mid = (low + high) / 2;
        while t < self.knots[mid] || t >= self.knots[mid + 1] {
            if t < self.knots[mid] {
                high = mid;
            } else {
                low = mid;
            }
            mid = (low + high) / 2;
        }
        mid
    }
}

/// Values and derivatives (orders `0..=max_order`) of the nonzero basis
/// functions at `t` in the given span — the triangular Cox-de Boor table
/// with the derivative recurrence applied to its inner columns.
pub fn ders_basis_functions(
    degree: usize,
    knots: &[f64],
    span: usize,
    t: f64,
    max_order: usize,
) -> Vec<Vec<f64>> {
    let p = degree;
    let n = max_order.min(p);

    let mut ndu = vec![vec![0.0f64; p + 1]; p + 1];
    let mut left = vec![0.0f64; p + 1];
    let mut right = vec![0.0f64; p + 1];
    ndu[0][0] = 1.0;

    for j in 1..=p {
        left[j] = t - knots[span + 1 - j];
        right[j] = knots[span + j] - t;
        let mut saved = 0.0;
        for r in 0..j {
            // Lower triangle: knot differences.
            ndu[j][r] = right[r + 1] + left[j - r];
            let temp = ndu[r][j - 1] / ndu[j][r];
            // Upper triangle: basis values.
            ndu[r][j] = saved + right[r + 1] * temp;
            saved = left[j - r] * temp;
        }
        ndu[j][j] = saved;
    }

    let mut ders = vec![vec![0.0f64; p + 1]; max_order + 1];
    for j in 0..=p {
        ders[0][j] = ndu[j][p];
    }

    // Derivative recurrence over the inner columns of the triangular table.
    let mut a = vec![vec![0.0f64; p + 1]; 2];
    for r in 0..=p {
        let mut s1 = 0usize;
        let mut s2 = 1usize;
        a[0].iter_mut().for_each(|v| *v = 0.0);
        a[1].iter_mut().for_each(|v| *v = 0.0);
        a[0][0] = 1.0;

        for k in 1..=n {
            let mut d = 0.0;
            let rk = r as isize - k as isize;
            let pk = p as isize - k as isize;
            if r >= k {
                a[s2][0] = a[s1][0] / ndu[(pk + 1) as usize][rk as usize];
                d = a[s2][0] * ndu[rk as usize][pk as usize];
            }
            let j1 = if rk >= -1 { 1 } else { (-rk) as usize };
            let j2 = if r as isize - 1 <= pk {
                k - 1
            } else {
                p - r
            };
            for j in j1..=j2 {
                a[s2][j] =
                    (a[s1][j] - a[s1][j - 1]) / ndu[(pk + 1) as usize][(rk + j as isize) as usize];
                d += a[s2][j] * ndu[(rk + j as isize) as usize][pk as usize];
            }
            if r as isize <= pk {
                a[s2][k] = -a[s1][k - 1] / ndu[(pk + 1) as usize][r];
                d += a[s2][k] * ndu[r][pk as usize];
            }
            ders[k][r] = d;
            std::mem::swap(&mut s1, &mut s2);
        }
    }

    // Scale by p!/(p-k)!.
    let mut factor = p as f64;
    for k in 1..=n {
        for value in ders[k].iter_mut() {
            *value *= factor;
        }
        factor *= (p - k) as f64;
    }

    ders
}
