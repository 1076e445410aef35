//! Classic fourth-order Runge-Kutta integration.

use gmk_core::{GmkError, Result};
use gmk_math::Tuple;

/// Fixed-step RK4 solver for `dx/dt = F(t, x)`.
pub struct RungeKutta4<V: Tuple> {
    step: f64,
    _marker: std::marker::PhantomData<V>,
}

impl<V: Tuple> RungeKutta4<V> {
    pub fn new(step: f64) -> Result<Self> {
        if step <= 0.0 {
            return Err(GmkError::Construction(
                "integration step must be positive".to_string(),
            ));
        }
        Ok(Self {
            step,
            _marker: std::marker::PhantomData,
        })
    }

    pub fn step_size(&self) -> f64 {
        self.step
    }

    /// One step from `(t, x)`, returning the state at `t + step`.
    pub fn step<F>(&self, t: f64, x: V, f: F) -> V
    where
        F: Fn(f64, V) -> V,
    {
        let h = self.step;
        let half = 0.5 * h;
        let k1 = f(t, x);
        let k2 = f(t + half, x + k1 * half);
        let k3 = f(t + half, x + k2 * half);
        let k4 = f(t + h, x + k3 * h);
        x + (k1 + k2 * 2.0 + k3 * 2.0 + k4) * (h / 6.0)
    }
}
