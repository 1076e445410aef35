//! B-spline and NURBS curves evaluated through [`BasisFunction`].

use gmk_core::{GmkError, Result};
use gmk_math::Tuple;

use super::ParametricCurve;
use crate::basis::BasisFunction;

/// A nonrational B-spline curve. The knot layout (open uniform, open
/// nonuniform, or periodic) lives entirely in the basis.
pub struct BSplineCurve<V: Tuple> {
    basis: BasisFunction,
    controls: Vec<V>,
}

impl<V: Tuple> BSplineCurve<V> {
    pub fn new(basis: BasisFunction, controls: Vec<V>) -> Result<Self> {
        if controls.len() != basis.num_controls() {
            return Err(GmkError::Construction(format!(
                "basis expects {} control points, got {}",
                basis.num_controls(),
                controls.len()
            )));
        }
        Ok(Self { basis, controls })
    }

    pub fn basis(&self) -> &BasisFunction {
        &self.basis
    }

    pub fn controls(&self) -> &[V] {
        &self.controls
    }

    pub fn set_control(&mut self, i: usize, point: V) -> Result<()> {
        match self.controls.get_mut(i) {
            Some(slot) => {
                *slot = point;
                Ok(())
            }
            None => Err(GmkError::NotFound(format!("control point {i}"))),
        }
    }
}

impl<V: Tuple> ParametricCurve<V> for BSplineCurve<V> {
    fn domain(&self) -> (f64, f64) {
        self.basis.domain()
    }

    fn evaluate(&self, t: f64, max_order: usize) -> [V; 4] {
        let max_order = max_order.min(3);
        let eval = self.basis.evaluate(t, max_order);
        let mut jet = [V::zero(); 4];
        for (j, _) in eval.ders[0].iter().enumerate() {
            let c = self.controls[self.basis.control_index(eval.min_index + j)];
            for (k, row) in eval.ders.iter().enumerate() {
                jet[k] = jet[k] + c * row[j];
            }
        }
        jet
    }

    fn segment_times(&self) -> Vec<f64> {
        self.basis.breakpoints()
    }
}

/// A rational B-spline curve. Derivatives are obtained from the
/// homogeneous jet by repeated application of the quotient rule.
pub struct NurbsCurve<V: Tuple> {
    basis: BasisFunction,
    controls: Vec<V>,
    weights: Vec<f64>,
}

impl<V: Tuple> NurbsCurve<V> {
    pub fn new(basis: BasisFunction, controls: Vec<V>, weights: Vec<f64>) -> Result<Self> {
        if controls.len() != basis.num_controls() || weights.len() != controls.len() {
            return Err(GmkError::Construction(format!(
                "basis expects {} control points and as many weights, got {} and {}",
                basis.num_controls(),
                controls.len(),
                weights.len()
            )));
        }
        if weights.iter().any(|&w| w <= 0.0) {
            return Err(GmkError::Construction(
                "NURBS weights must be positive".to_string(),
            ));
        }
        Ok(Self {
            basis,
            controls,
            weights,
        })
    }

    pub fn basis(&self) -> &BasisFunction {
        &self.basis
    }

    pub fn controls(&self) -> &[V] {
        &self.controls
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    pub fn set_control(&mut self, i: usize, point: V) -> Result<()> {
        match self.controls.get_mut(i) {
            Some(slot) => {
                *slot = point;
                Ok(())
            }
            None => Err(GmkError::NotFound(format!("control point {i}"))),
        }
    }

    pub fn set_weight(&mut self, i: usize, weight: f64) -> Result<()> {
        if weight <= 0.0 {
            return Err(GmkError::InvalidOperation(
                "NURBS weights must be positive".to_string(),
            ));
        }
        match self.weights.get_mut(i) {
            Some(slot) => {
                *slot = weight;
                Ok(())
            }
            None => Err(GmkError::NotFound(format!("weight {i}"))),
        }
    }
}

impl<V: Tuple> ParametricCurve<V> for NurbsCurve<V> {
    fn domain(&self) -> (f64, f64) {
        self.basis.domain()
    }

    fn evaluate(&self, t: f64, max_order: usize) -> [V; 4] {
        let max_order = max_order.min(3);
        let eval = self.basis.evaluate(t, max_order);

        // Homogeneous numerator A^(k) and weight w^(k).
        let mut a = [V::zero(); 4];
        let mut w = [0.0_f64; 4];
        for (j, _) in eval.ders[0].iter().enumerate() {
            let ci = self.basis.control_index(eval.min_index + j);
            let cw = self.weights[ci];
            let c = self.controls[ci] * cw;
            for (k, row) in eval.ders.iter().enumerate() {
                a[k] = a[k] + c * row[j];
                w[k] += cw * row[j];
            }
        }

        let inv_w = 1.0 / w[0];
        let mut jet = [V::zero(); 4];
        jet[0] = a[0] * inv_w;
        if max_order >= 1 {
            jet[1] = (a[1] - jet[0] * w[1]) * inv_w;
        }
        if max_order >= 2 {
            jet[2] = (a[2] - jet[1] * (2.0 * w[1]) - jet[0] * w[2]) * inv_w;
        }
        if max_order >= 3 {
            jet[3] = (a[3] - jet[2] * (3.0 * w[1]) - jet[1] * (3.0 * w[2]) - jet[0] * w[3])
                * inv_w;
        }
        jet
    }

    fn segment_times(&self) -> Vec<f64> {
        self.basis.breakpoints()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use gmk_math::{DVec2, DVec3};

    #[test]
    fn test_clamped_curve_interpolates_endpoints() {
        let basis = BasisFunction::open_uniform(5, 3).unwrap();
        let controls: Vec<DVec3> = (0..5)
            .map(|i| DVec3::new(i as f64, (i * i) as f64, -(i as f64)))
            .collect();
        let curve = BSplineCurve::new(basis, controls.clone()).unwrap();
        let (tmin, tmax) = curve.domain();
        let p0 = curve.position(tmin);
        let p1 = curve.position(tmax);
        assert_relative_eq!(p0.distance(controls[0]), 0.0, epsilon = 1e-12);
        assert_relative_eq!(p1.distance(controls[4]), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_curve_lies_in_convex_hull() {
        let basis = BasisFunction::open_uniform(6, 2).unwrap();
        let controls: Vec<DVec2> = vec![
            DVec2::new(0.0, 0.0),
            DVec2::new(1.0, 2.0),
            DVec2::new(2.0, -1.0),
            DVec2::new(3.0, 1.5),
            DVec2::new(4.0, 0.0),
            DVec2::new(5.0, 1.0),
        ];
        let curve = BSplineCurve::new(basis, controls).unwrap();
        for i in 0..=50 {
            let p = curve.position(i as f64 / 50.0);
            assert!(p.x >= 0.0 && p.x <= 5.0);
            assert!(p.y >= -1.0 && p.y <= 2.0);
        }
    }

    #[test]
    fn test_periodic_curve_is_continuous_at_seam() {
        let basis = BasisFunction::periodic_uniform(5, 2).unwrap();
        let controls: Vec<DVec2> = (0..5)
            .map(|i| {
                let a = std::f64::consts::TAU * i as f64 / 5.0;
                DVec2::new(a.cos(), a.sin())
            })
            .collect();
        let curve = BSplineCurve::new(basis, controls).unwrap();
        let (tmin, tmax) = curve.domain();
        let p0 = curve.position(tmin);
        let p1 = curve.position(tmax);
        assert_relative_eq!(p0.distance(p1), 0.0, epsilon = 1e-12);
        let d0 = curve.evaluate(tmin, 1)[1];
        let d1 = curve.evaluate(tmax, 1)[1];
        assert_relative_eq!(d0.distance(d1), 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_nurbs_quarter_circle_is_exact() {
        // Quadratic rational Bezier arc: weights (1, cos45, 1).
        let basis = BasisFunction::open_uniform(3, 2).unwrap();
        let controls = vec![
            DVec2::new(1.0, 0.0),
            DVec2::new(1.0, 1.0),
            DVec2::new(0.0, 1.0),
        ];
        let w = std::f64::consts::FRAC_1_SQRT_2;
        let curve = NurbsCurve::new(basis, controls, vec![1.0, w, 1.0]).unwrap();
        for i in 0..=20 {
            let p = curve.position(i as f64 / 20.0);
            assert_relative_eq!(p.length(), 1.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_nurbs_derivative_vs_central_difference() {
        let basis = BasisFunction::open_uniform(4, 3).unwrap();
        let controls = vec![
            DVec2::new(0.0, 0.0),
            DVec2::new(1.0, 2.0),
            DVec2::new(3.0, 2.0),
            DVec2::new(4.0, 0.0),
        ];
        let curve =
            NurbsCurve::new(basis, controls, vec![1.0, 2.0, 0.5, 1.0]).unwrap();
        let t = 0.37;
        let h = 1e-6;
        let jet = curve.evaluate(t, 2);
        let dp = (curve.position(t + h) - curve.position(t - h)) * (0.5 / h);
        assert_relative_eq!(jet[1].x, dp.x, epsilon = 1e-6);
        assert_relative_eq!(jet[1].y, dp.y, epsilon = 1e-6);
        let d1 = |t: f64| curve.evaluate(t, 1)[1];
        let ddp = (d1(t + h) - d1(t - h)) * (0.5 / h);
        assert_relative_eq!(jet[2].x, ddp.x, epsilon = 1e-4);
        assert_relative_eq!(jet[2].y, ddp.y, epsilon = 1e-4);
    }

    #[test]
    fn test_nurbs_rejects_nonpositive_weight() {
        let basis = BasisFunction::open_uniform(3, 2).unwrap();
        let controls = vec![DVec2::ZERO; 3];
        assert!(NurbsCurve::new(basis, controls, vec![1.0, 0.0, 1.0]).is_err());
    }

    #[test]
    fn test_mismatched_controls_rejected() {
        let basis = BasisFunction::open_uniform(5, 2).unwrap();
        assert!(BSplineCurve::new(basis, vec![DVec2::ZERO; 4]).is_err());
    }
}
