//! Tensor-product B-spline and NURBS surfaces.

use gmk_core::{GmkError, Result};
use gmk_math::Tuple;

use super::{ParametricSurface, JET_X, JET_XU, JET_XUU, JET_XUV, JET_XV, JET_XVV};
use crate::basis::BasisFunction;

/// A nonrational tensor-product B-spline surface. Control points are
/// stored row-major: `controls[col + num_u * row]` with `col` indexing
/// the u direction.
pub struct BSplineSurface<V: Tuple> {
    basis_u: BasisFunction,
    basis_v: BasisFunction,
    controls: Vec<V>,
}

impl<V: Tuple> BSplineSurface<V> {
    pub fn new(basis_u: BasisFunction, basis_v: BasisFunction, controls: Vec<V>) -> Result<Self> {
        let expected = basis_u.num_controls() * basis_v.num_controls();
        if controls.len() != expected {
            return Err(GmkError::Construction(format!(
                "grid expects {} control points, got {}",
                expected,
                controls.len()
            )));
        }
        Ok(Self {
            basis_u,
            basis_v,
            controls,
        })
    }

    pub fn basis_u(&self) -> &BasisFunction {
        &self.basis_u
    }

    pub fn basis_v(&self) -> &BasisFunction {
        &self.basis_v
    }

    pub fn controls(&self) -> &[V] {
        &self.controls
    }

    pub fn control(&self, col: usize, row: usize) -> V {
        self.controls[col + self.basis_u.num_controls() * row]
    }

    pub fn set_control(&mut self, col: usize, row: usize, point: V) -> Result<()> {
        let num_u = self.basis_u.num_controls();
        if col >= num_u || row >= self.basis_v.num_controls() {
            return Err(GmkError::NotFound(format!("control point ({col}, {row})")));
        }
        self.controls[col + num_u * row] = point;
        Ok(())
    }
}

impl<V: Tuple> ParametricSurface<V> for BSplineSurface<V> {
    fn domain(&self) -> ((f64, f64), (f64, f64)) {
        (self.basis_u.domain(), self.basis_v.domain())
    }

    fn evaluate(&self, u: f64, v: f64, max_order: usize) -> [V; 6] {
        let max_order = max_order.min(2);
        let eu = self.basis_u.evaluate(u, max_order);
        let ev = self.basis_v.evaluate(v, max_order);
        let num_u = self.basis_u.num_controls();

        let mut jet = [V::zero(); 6];
        for (jv, _) in ev.ders[0].iter().enumerate() {
            let row = self.basis_v.control_index(ev.min_index + jv);
            // Sum over the u direction once per row, then combine with the
            // v basis values outside.
            let mut s = [V::zero(); 3];
            for (ju, _) in eu.ders[0].iter().enumerate() {
                let col = self.basis_u.control_index(eu.min_index + ju);
                let c = self.controls[col + num_u * row];
                for (k, su) in s.iter_mut().enumerate().take(max_order + 1) {
                    *su = *su + c * eu.ders[k][ju];
                }
            }
            jet[JET_X] = jet[JET_X] + s[0] * ev.ders[0][jv];
            if max_order >= 1 {
                jet[JET_XU] = jet[JET_XU] + s[1] * ev.ders[0][jv];
                jet[JET_XV] = jet[JET_XV] + s[0] * ev.ders[1][jv];
            }
            if max_order >= 2 {
                jet[JET_XUU] = jet[JET_XUU] + s[2] * ev.ders[0][jv];
                jet[JET_XUV] = jet[JET_XUV] + s[1] * ev.ders[1][jv];
                jet[JET_XVV] = jet[JET_XVV] + s[0] * ev.ders[2][jv];
            }
        }
        jet
    }
}

/// A rational tensor-product surface. Second-order rational derivatives
/// follow from the quotient rule applied to the homogeneous jet.
pub struct NurbsSurface<V: Tuple> {
    basis_u: BasisFunction,
    basis_v: BasisFunction,
    controls: Vec<V>,
    weights: Vec<f64>,
}

impl<V: Tuple> NurbsSurface<V> {
    pub fn new(
        basis_u: BasisFunction,
        basis_v: BasisFunction,
        controls: Vec<V>,
        weights: Vec<f64>,
    ) -> Result<Self> {
        let expected = basis_u.num_controls() * basis_v.num_controls();
        if controls.len() != expected || weights.len() != expected {
            return Err(GmkError::Construction(format!(
                "grid expects {} control points and as many weights, got {} and {}",
                expected,
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
            basis_u,
            basis_v,
            controls,
            weights,
        })
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }
}

impl<V: Tuple> ParametricSurface<V> for NurbsSurface<V> {
    fn domain(&self) -> ((f64, f64), (f64, f64)) {
        (self.basis_u.domain(), self.basis_v.domain())
    }

    fn evaluate(&self, u: f64, v: f64, max_order: usize) -> [V; 6] {
        let max_order = max_order.min(2);
        let eu = self.basis_u.evaluate(u, max_order);
        let ev = self.basis_v.evaluate(v, max_order);
        let num_u = self.basis_u.num_controls();

        // Homogeneous jet: numerator A and weight w per slot.
        let mut a = [V::zero(); 6];
        let mut w = [0.0_f64; 6];
        for (jv, _) in ev.ders[0].iter().enumerate() {
            let row = self.basis_v.control_index(ev.min_index + jv);
            for (ju, _) in eu.ders[0].iter().enumerate() {
                let col = self.basis_u.control_index(eu.min_index + ju);
                let ci = col + num_u * row;
                let cw = self.weights[ci];
                let c = self.controls[ci] * cw;
                let mut put = |slot: usize, bu: f64, bv: f64| {
                    a[slot] = a[slot] + c * (bu * bv);
                    w[slot] += cw * bu * bv;
                };
                put(JET_X, eu.ders[0][ju], ev.ders[0][jv]);
                if max_order >= 1 {
                    put(JET_XU, eu.ders[1][ju], ev.ders[0][jv]);
                    put(JET_XV, eu.ders[0][ju], ev.ders[1][jv]);
                }
                if max_order >= 2 {
                    put(JET_XUU, eu.ders[2][ju], ev.ders[0][jv]);
                    put(JET_XUV, eu.ders[1][ju], ev.ders[1][jv]);
                    put(JET_XVV, eu.ders[0][ju], ev.ders[2][jv]);
                }
            }
        }

        let inv_w = 1.0 / w[JET_X];
        let mut jet = [V::zero(); 6];
        jet[JET_X] = a[JET_X] * inv_w;
        if max_order >= 1 {
            jet[JET_XU] = (a[JET_XU] - jet[JET_X] * w[JET_XU]) * inv_w;
            jet[JET_XV] = (a[JET_XV] - jet[JET_X] * w[JET_XV]) * inv_w;
        }
        if max_order >= 2 {
            jet[JET_XUU] =
                (a[JET_XUU] - jet[JET_XU] * (2.0 * w[JET_XU]) - jet[JET_X] * w[JET_XUU]) * inv_w;
            jet[JET_XUV] = (a[JET_XUV]
                - jet[JET_XU] * w[JET_XV]
                - jet[JET_XV] * w[JET_XU]
                - jet[JET_X] * w[JET_XUV])
                * inv_w;
            jet[JET_XVV] =
                (a[JET_XVV] - jet[JET_XV] * (2.0 * w[JET_XV]) - jet[JET_X] * w[JET_XVV]) * inv_w;
        }
        jet
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::ParametricSurface;
    use approx::assert_relative_eq;
    use gmk_math::DVec3;

    fn bilinear_patch() -> BSplineSurface<DVec3> {
        let basis_u = BasisFunction::open_uniform(2, 1).unwrap();
        let basis_v = BasisFunction::open_uniform(2, 1).unwrap();
        let controls = vec![
            DVec3::new(0.0, 0.0, 0.0),
            DVec3::new(2.0, 0.0, 0.0),
            DVec3::new(0.0, 3.0, 0.0),
            DVec3::new(2.0, 3.0, 1.0),
        ];
        BSplineSurface::new(basis_u, basis_v, controls).unwrap()
    }

    #[test]
    fn test_bilinear_patch_corners_and_center() {
        let surf = bilinear_patch();
        assert_relative_eq!(
            surf.position(0.0, 0.0).distance(DVec3::new(0.0, 0.0, 0.0)),
            0.0,
            epsilon = 1e-14
        );
        assert_relative_eq!(
            surf.position(1.0, 1.0).distance(DVec3::new(2.0, 3.0, 1.0)),
            0.0,
            epsilon = 1e-14
        );
        assert_relative_eq!(
            surf.position(0.5, 0.5)
                .distance(DVec3::new(1.0, 1.5, 0.25)),
            0.0,
            epsilon = 1e-14
        );
    }

    #[test]
    fn test_bilinear_mixed_partial() {
        // X(u,v) contains the term u*v in z, so Xuv = (0, 0, 1).
        let surf = bilinear_patch();
        let jet = surf.evaluate(0.3, 0.7, 2);
        assert_relative_eq!(jet[JET_XUV].z, 1.0, epsilon = 1e-12);
        assert_relative_eq!(jet[JET_XUU].length(), 0.0, epsilon = 1e-12);
        assert_relative_eq!(jet[JET_XVV].length(), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_partials_vs_central_difference() {
        let basis_u = BasisFunction::open_uniform(4, 3).unwrap();
        let basis_v = BasisFunction::open_uniform(4, 2).unwrap();
        let mut controls = Vec::new();
        for row in 0..4 {
            for col in 0..4 {
                controls.push(DVec3::new(
                    col as f64,
                    row as f64,
                    ((col * row) as f64).sin(),
                ));
            }
        }
        let surf = BSplineSurface::new(basis_u, basis_v, controls).unwrap();
        let (u, v) = (0.43, 0.61);
        let h = 1e-6;
        let jet = surf.evaluate(u, v, 1);
        let du = (surf.position(u + h, v) - surf.position(u - h, v)) * (0.5 / h);
        let dv = (surf.position(u, v + h) - surf.position(u, v - h)) * (0.5 / h);
        assert_relative_eq!(jet[JET_XU].distance(du), 0.0, epsilon = 1e-6);
        assert_relative_eq!(jet[JET_XV].distance(dv), 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_nurbs_cylinder_patch_radius() {
        // Quarter-cylinder: rational quadratic in u, linear in v.
        let basis_u = BasisFunction::open_uniform(3, 2).unwrap();
        let basis_v = BasisFunction::open_uniform(2, 1).unwrap();
        let w = std::f64::consts::FRAC_1_SQRT_2;
        let controls = vec![
            DVec3::new(1.0, 0.0, 0.0),
            DVec3::new(1.0, 1.0, 0.0),
            DVec3::new(0.0, 1.0, 0.0),
            DVec3::new(1.0, 0.0, 2.0),
            DVec3::new(1.0, 1.0, 2.0),
            DVec3::new(0.0, 1.0, 2.0),
        ];
        let weights = vec![1.0, w, 1.0, 1.0, w, 1.0];
        let surf = NurbsSurface::new(basis_u, basis_v, controls, weights).unwrap();
        for i in 0..=10 {
            for j in 0..=4 {
                let p = surf.position(i as f64 / 10.0, j as f64 / 4.0);
                let r = (p.x * p.x + p.y * p.y).sqrt();
                assert_relative_eq!(r, 1.0, epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn test_nurbs_mixed_partial_vs_difference() {
        let basis_u = BasisFunction::open_uniform(3, 2).unwrap();
        let basis_v = BasisFunction::open_uniform(3, 2).unwrap();
        let mut controls = Vec::new();
        let mut weights = Vec::new();
        for row in 0..3 {
            for col in 0..3 {
                controls.push(DVec3::new(col as f64, row as f64, (col + row) as f64 * 0.5));
                weights.push(1.0 + 0.3 * (col as f64) + 0.1 * (row as f64));
            }
        }
        let surf = NurbsSurface::new(basis_u, basis_v, controls, weights).unwrap();
        let (u, v) = (0.37, 0.52);
        let h = 1e-5;
        let jet = surf.evaluate(u, v, 2);
        let xu = |u: f64, v: f64| surf.evaluate(u, v, 1)[JET_XU];
        let xuv = (xu(u, v + h) - xu(u, v - h)) * (0.5 / h);
        assert_relative_eq!(jet[JET_XUV].distance(xuv), 0.0, epsilon = 1e-5);
    }

    #[test]
    fn test_grid_size_mismatch_rejected() {
        let basis_u = BasisFunction::open_uniform(3, 2).unwrap();
        let basis_v = BasisFunction::open_uniform(2, 1).unwrap();
        assert!(BSplineSurface::new(basis_u, basis_v, vec![DVec3::ZERO; 5]).is_err());
    }
}
