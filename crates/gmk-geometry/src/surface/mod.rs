//! Parametric surface evaluation.

pub mod bspline;

pub use bspline::{BSplineSurface, NurbsSurface};

use gmk_math::Tuple;

/// Jet slot layout returned by [`ParametricSurface::evaluate`].
pub const JET_X: usize = 0;
pub const JET_XU: usize = 1;
pub const JET_XV: usize = 2;
pub const JET_XUU: usize = 3;
pub const JET_XUV: usize = 4;
pub const JET_XVV: usize = 5;

/// A surface `X(u, v)` over a rectangular parameter domain, evaluable
/// together with first and second partial derivatives.
pub trait ParametricSurface<V: Tuple> {
    /// Parameter rectangle `((umin, umax), (vmin, vmax))`.
    fn domain(&self) -> ((f64, f64), (f64, f64));

    /// `[X, Xu, Xv, Xuu, Xuv, Xvv]` at `(u, v)`. Orders above `max_order`
    /// are zero. Parameters are clamped to the domain.
    fn evaluate(&self, u: f64, v: f64, max_order: usize) -> [V; 6];

    fn position(&self, u: f64, v: f64) -> V {
        self.evaluate(u, v, 0)[JET_X]
    }

    fn u_tangent(&self, u: f64, v: f64) -> V {
        self.evaluate(u, v, 1)[JET_XU].normalize_or_zero()
    }

    fn v_tangent(&self, u: f64, v: f64) -> V {
        self.evaluate(u, v, 1)[JET_XV].normalize_or_zero()
    }
}
