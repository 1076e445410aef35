//! Least-squares B-spline fitting of sampled curves and surface grids.
//!
//! Samples are assumed uniformly spaced in parameter. The normal
//! equations `(A^T A) X = A^T S` are symmetric banded with bandwidth
//! equal to the degree, so a banded Cholesky solve handles each spatial
//! dimension at once through the [`Tuple`] abstraction.

use gmk_core::{GmkError, Result};
use gmk_math::Tuple;
use gmk_numeric::banded::SymmetricBandedMatrix;

use crate::basis::BasisFunction;
use crate::curve::BSplineCurve;

/// Fits an open uniform B-spline curve on `[0, 1]` to ordered samples.
pub struct BSplineCurveFit<V: Tuple> {
    basis: BasisFunction,
    controls: Vec<V>,
}

impl<V: Tuple> BSplineCurveFit<V> {
    pub fn new(degree: usize, num_controls: usize, samples: &[V]) -> Result<Self> {
        if degree < 1 || degree >= num_controls || num_controls > samples.len() {
            return Err(GmkError::Construction(format!(
                "fit requires 1 <= degree < num_controls <= num_samples, \
                 got degree {degree}, {num_controls} controls, {} samples",
                samples.len()
            )));
        }
        let basis = BasisFunction::open_uniform(num_controls, degree)?;
        let controls = solve_normal_equations(&basis, samples)?;
        Ok(Self { basis, controls })
    }

    pub fn control_points(&self) -> &[V] {
        &self.controls
    }

    /// Fitted position at `t`, clamped to `[0, 1]`.
    pub fn position(&self, t: f64) -> V {
        let eval = self.basis.evaluate(t, 0);
        let mut p = V::zero();
        for (j, &b) in eval.values().iter().enumerate() {
            p = p + self.controls[eval.min_index + j] * b;
        }
        p
    }

    pub fn into_curve(self) -> BSplineCurve<V> {
        // Sizes already agree, so the constructor cannot fail.
        BSplineCurve::new(self.basis, self.controls)
            .unwrap_or_else(|_| unreachable!("fit produced a consistent control set"))
    }
}

/// Fits an open uniform tensor-product B-spline surface on the unit
/// square to a row-major sample grid.
///
/// The tensor structure makes the problem separable: first each sample
/// row is fit in u, then each resulting control column is fit in v.
pub struct BSplineSurfaceFit<V: Tuple> {
    basis_u: BasisFunction,
    basis_v: BasisFunction,
    controls: Vec<V>,
}

impl<V: Tuple> BSplineSurfaceFit<V> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        degree_u: usize,
        num_controls_u: usize,
        degree_v: usize,
        num_controls_v: usize,
        num_samples_u: usize,
        num_samples_v: usize,
        samples: &[V],
    ) -> Result<Self> {
        if degree_u < 1
            || degree_u >= num_controls_u
            || num_controls_u > num_samples_u
            || degree_v < 1
            || degree_v >= num_controls_v
            || num_controls_v > num_samples_v
        {
            return Err(GmkError::Construction(
                "fit requires 1 <= degree < num_controls <= num_samples per axis".to_string(),
            ));
        }
        if samples.len() != num_samples_u * num_samples_v {
            return Err(GmkError::Construction(format!(
                "grid expects {} samples, got {}",
                num_samples_u * num_samples_v,
                samples.len()
            )));
        }
        let basis_u = BasisFunction::open_uniform(num_controls_u, degree_u)?;
        let basis_v = BasisFunction::open_uniform(num_controls_v, degree_v)?;

        // Pass 1: fit every sample row in u.
        let mut row_controls = Vec::with_capacity(num_controls_u * num_samples_v);
        for row in 0..num_samples_v {
            let start = row * num_samples_u;
            let fitted =
                solve_normal_equations(&basis_u, &samples[start..start + num_samples_u])?;
            row_controls.extend(fitted);
        }

        // Pass 2: fit every control column in v.
        let mut controls = vec![V::zero(); num_controls_u * num_controls_v];
        let mut column = Vec::with_capacity(num_samples_v);
        for col in 0..num_controls_u {
            column.clear();
            column.extend((0..num_samples_v).map(|row| row_controls[col + num_controls_u * row]));
            let fitted = solve_normal_equations(&basis_v, &column)?;
            for (row, &c) in fitted.iter().enumerate() {
                controls[col + num_controls_u * row] = c;
            }
        }

        Ok(Self {
            basis_u,
            basis_v,
            controls,
        })
    }

    pub fn control_points(&self) -> &[V] {
        &self.controls
    }

    /// Fitted position at `(u, v)`, clamped to the unit square.
    pub fn position(&self, u: f64, v: f64) -> V {
        let eu = self.basis_u.evaluate(u, 0);
        let ev = self.basis_v.evaluate(v, 0);
        let num_u = self.basis_u.num_controls();
        let mut p = V::zero();
        for (jv, &bv) in ev.values().iter().enumerate() {
            for (ju, &bu) in eu.values().iter().enumerate() {
                let c = self.controls[(eu.min_index + ju) + num_u * (ev.min_index + jv)];
                p = p + c * (bu * bv);
            }
        }
        p
    }
}

/// Assembles and solves `(A^T A) X = A^T S` for samples uniformly spaced
/// on the basis domain. The product matrix is symmetric positive definite
/// with bandwidth `degree` whenever `num_controls <= num_samples`.
fn solve_normal_equations<V: Tuple>(basis: &BasisFunction, samples: &[V]) -> Result<Vec<V>> {
    let num_samples = samples.len();
    let num_controls = basis.num_controls();
    let degree = basis.degree();
    let (tmin, tmax) = basis.domain();

    let mut ata = SymmetricBandedMatrix::new(num_controls, degree);
    let mut atb = vec![V::zero(); num_controls];
    for (i, &sample) in samples.iter().enumerate() {
        let t = tmin + (tmax - tmin) * i as f64 / (num_samples - 1) as f64;
        let eval = basis.evaluate(t, 0);
        let values = eval.values();
        for (j, &bj) in values.iter().enumerate() {
            let cj = eval.min_index + j;
            atb[cj] = atb[cj] + sample * bj;
            for (k, &bk) in values.iter().enumerate().skip(j) {
                ata.add(cj, eval.min_index + k, bj * bk);
            }
        }
    }

    let cholesky = ata.cholesky().map_err(|_| {
        GmkError::Numerical("fit normal equations are not positive definite".to_string())
    })?;
    Ok(cholesky.solve(&atb))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curve::ParametricCurve;
    use approx::assert_relative_eq;
    use gmk_math::{DVec2, DVec3};

    fn helix_samples(n: usize) -> Vec<DVec3> {
        (0..n)
            .map(|i| {
                let t = 3.0 * std::f64::consts::TAU * i as f64 / (n - 1) as f64;
                DVec3::new(2.0 * t.cos(), 2.0 * t.sin(), 0.5 * t)
            })
            .collect()
    }

    fn fit_error(fit: &BSplineCurveFit<DVec3>, samples: &[DVec3]) -> f64 {
        let n = samples.len();
        samples
            .iter()
            .enumerate()
            .map(|(i, &s)| fit.position(i as f64 / (n - 1) as f64).distance(s))
            .fold(0.0, f64::max)
    }

    #[test]
    fn test_helix_fit_error_decreases_with_controls() {
        let samples = helix_samples(200);
        let mut previous = f64::INFINITY;
        for num_controls in [8, 16, 32] {
            let fit = BSplineCurveFit::new(3, num_controls, &samples).unwrap();
            let error = fit_error(&fit, &samples);
            assert!(
                error < previous,
                "error {error} did not improve on {previous} with {num_controls} controls"
            );
            previous = error;
        }
    }

    #[test]
    fn test_degenerate_fit_interpolates() {
        // num_controls == num_samples: least squares reduces to interpolation.
        let samples: Vec<DVec2> = (0..6)
            .map(|i| DVec2::new(i as f64, ((i * i) as f64).sin()))
            .collect();
        let fit = BSplineCurveFit::new(3, 6, &samples).unwrap();
        for (i, &s) in samples.iter().enumerate() {
            let t = i as f64 / 5.0;
            assert_relative_eq!(fit.position(t).distance(s), 0.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_line_samples_fit_exactly() {
        let samples: Vec<DVec2> = (0..50)
            .map(|i| DVec2::new(i as f64 * 0.1, i as f64 * 0.25 + 1.0))
            .collect();
        let fit = BSplineCurveFit::new(2, 5, &samples).unwrap();
        for i in 0..=20 {
            let t = i as f64 / 20.0;
            let expected = DVec2::new(4.9 * t, 4.9 * t * 2.5 + 1.0);
            assert_relative_eq!(fit.position(t).distance(expected), 0.0, epsilon = 1e-8);
        }
    }

    #[test]
    fn test_into_curve_matches_fit() {
        let samples = helix_samples(100);
        let fit = BSplineCurveFit::new(3, 12, &samples).unwrap();
        let at_half = fit.position(0.5);
        let curve = fit.into_curve();
        assert_relative_eq!(curve.position(0.5).distance(at_half), 0.0, epsilon = 1e-14);
    }

    #[test]
    fn test_surface_fit_reproduces_bilinear_grid() {
        let (nu, nv) = (20, 15);
        let mut samples = Vec::new();
        for row in 0..nv {
            for col in 0..nu {
                let u = col as f64 / (nu - 1) as f64;
                let v = row as f64 / (nv - 1) as f64;
                samples.push(DVec3::new(u, v, 1.0 + u * v));
            }
        }
        let fit = BSplineSurfaceFit::new(2, 5, 2, 4, nu, nv, &samples).unwrap();
        for i in 0..=8 {
            for j in 0..=8 {
                let (u, v) = (i as f64 / 8.0, j as f64 / 8.0);
                let expected = DVec3::new(u, v, 1.0 + u * v);
                assert_relative_eq!(
                    fit.position(u, v).distance(expected),
                    0.0,
                    epsilon = 1e-8
                );
            }
        }
    }

    #[test]
    fn test_invalid_arguments_rejected() {
        let samples = vec![DVec2::ZERO; 10];
        assert!(BSplineCurveFit::new(0, 4, &samples).is_err());
        assert!(BSplineCurveFit::new(4, 4, &samples).is_err());
        assert!(BSplineCurveFit::new(3, 11, &samples).is_err());
    }
}
