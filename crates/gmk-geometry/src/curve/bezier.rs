//! Bezier curves of arbitrary degree over `[0, 1]`.

use gmk_core::{GmkError, Result};
use gmk_math::Tuple;

use super::ParametricCurve;

/// A degree-`n` Bezier curve with `n + 1` control points, parameterized
/// over `[0, 1]`. Derivative control nets (iterated forward differences
/// scaled by `n!/(n-k)!`) are built once at construction.
pub struct BezierCurve<V: Tuple> {
    degree: usize,
    controls: Vec<V>,
    /// `der[k]` holds the control net of the (k+1)-th derivative curve.
    der: [Vec<V>; 3],
}

impl<V: Tuple> BezierCurve<V> {
    pub fn new(controls: Vec<V>) -> Result<Self> {
        if controls.len() < 2 {
            return Err(GmkError::Construction(
                "a Bezier curve requires at least two control points".to_string(),
            ));
        }
        let degree = controls.len() - 1;
        let diff = |points: &[V], scale: f64| -> Vec<V> {
            points.windows(2).map(|w| (w[1] - w[0]) * scale).collect()
        };
        let mut der: [Vec<V>; 3] = [Vec::new(), Vec::new(), Vec::new()];
        der[0] = diff(&controls, degree as f64);
        if degree >= 2 {
            der[1] = diff(&der[0], (degree - 1) as f64);
        }
        if degree >= 3 {
            der[2] = diff(&der[1], (degree - 2) as f64);
        }
        Ok(Self {
            degree,
            controls,
            der,
        })
    }

    pub fn degree(&self) -> usize {
        self.degree
    }

    pub fn controls(&self) -> &[V] {
        &self.controls
    }

    /// De Casteljau evaluation of a Bernstein combination of `points`.
    fn decasteljau(points: &[V], t: f64) -> V {
        let mut work: Vec<V> = points.to_vec();
        let omt = 1.0 - t;
        for level in (1..work.len()).rev() {
            for i in 0..level {
                work[i] = work[i] * omt + work[i + 1] * t;
            }
        }
        work[0]
    }
}

impl<V: Tuple> ParametricCurve<V> for BezierCurve<V> {
    fn domain(&self) -> (f64, f64) {
        (0.0, 1.0)
    }

    fn evaluate(&self, t: f64, max_order: usize) -> [V; 4] {
        let t = t.clamp(0.0, 1.0);
        let mut jet = [V::zero(); 4];
        jet[0] = Self::decasteljau(&self.controls, t);
        for k in 0..max_order.min(3) {
            if !self.der[k].is_empty() {
                jet[k + 1] = Self::decasteljau(&self.der[k], t);
            }
        }
        jet
    }
}
