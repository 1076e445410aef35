//! Parametric curve evaluation and arc-length reparameterization.

pub mod bezier;
pub mod bspline;

pub use bezier::BezierCurve;
pub use bspline::{BSplineCurve, NurbsCurve};

use gmk_core::{GmkError, Result};
use gmk_math::Tuple;
use gmk_numeric::integrate::romberg;
use gmk_numeric::roots::bisect_with;

/// Default Romberg order used by [`ParametricCurve::length`].
pub const DEFAULT_ROMBERG_ORDER: usize = 8;

/// Default bisection budget used by [`ArcLength::time_at_length`].
pub const DEFAULT_MAX_BISECTIONS: u32 = 1024;

/// A curve `X(t)` over a closed parameter interval, evaluable together
/// with derivatives up to order three.
pub trait ParametricCurve<V: Tuple> {
    /// Parameter interval `[tmin, tmax]`.
    fn domain(&self) -> (f64, f64);

    /// Position and derivatives `[X, X', X'', X''']` at `t`. Orders above
    /// `max_order` are zero. `t` is clamped to the domain.
    fn evaluate(&self, t: f64, max_order: usize) -> [V; 4];

    /// Parameter values of the piecewise-smooth segment boundaries,
    /// including both domain endpoints. Single-segment curves return
    /// just the endpoints.
    fn segment_times(&self) -> Vec<f64> {
        let (tmin, tmax) = self.domain();
        vec![tmin, tmax]
    }

    fn position(&self, t: f64) -> V {
        self.evaluate(t, 0)[0]
    }

    fn tangent(&self, t: f64) -> V {
        self.evaluate(t, 1)[1].normalize_or_zero()
    }

    /// Magnitude of the first derivative at `t`.
    fn speed(&self, t: f64) -> f64 {
        self.evaluate(t, 1)[1].length()
    }

    /// Arc length of the restriction to `[t0, t1]`, by Romberg
    /// integration of the speed.
    fn length(&self, t0: f64, t1: f64) -> f64 {
        let (tmin, tmax) = self.domain();
        let t0 = t0.clamp(tmin, tmax);
        let t1 = t1.clamp(tmin, tmax);
        if t1 <= t0 {
            return 0.0;
        }
        romberg(DEFAULT_ROMBERG_ORDER, t0, t1, |t| self.speed(t))
    }

    /// Total arc length over the full domain.
    fn total_length(&self) -> f64 {
        let (tmin, tmax) = self.domain();
        self.length(tmin, tmax)
    }
}

/// Arc-length reparameterization of a curve.
///
/// All segment lengths are integrated at construction time, so queries
/// take `&self` and never race. `time_at_length` inverts the accumulated
/// length function by bisection on a single segment.
pub struct ArcLength<'a, V: Tuple> {
    curve: &'a dyn ParametricCurve<V>,
    segment_times: Vec<f64>,
    /// `accumulated[i]` is the length from `tmin` to `segment_times[i]`.
    accumulated: Vec<f64>,
    max_bisections: u32,
}

impl<'a, V: Tuple> ArcLength<'a, V> {
    pub fn new(curve: &'a dyn ParametricCurve<V>) -> Result<Self> {
        Self::with_max_bisections(curve, DEFAULT_MAX_BISECTIONS)
    }

    pub fn with_max_bisections(
        curve: &'a dyn ParametricCurve<V>,
        max_bisections: u32,
    ) -> Result<Self> {
        let segment_times = curve.segment_times();
        if segment_times.len() < 2 {
            return Err(GmkError::Construction(
                "curve must expose at least one segment".to_string(),
            ));
        }
        let mut accumulated = Vec::with_capacity(segment_times.len());
        accumulated.push(0.0);
        for w in segment_times.windows(2) {
            let seg = curve.length(w[0], w[1]);
            if !seg.is_finite() || seg < 0.0 {
                return Err(GmkError::Numerical(
                    "segment length integration failed".to_string(),
                ));
            }
            let last = *accumulated.last().unwrap();
            accumulated.push(last + seg);
        }
        Ok(Self {
            curve,
            segment_times,
            accumulated,
            max_bisections,
        })
    }

    pub fn total_length(&self) -> f64 {
        *self.accumulated.last().unwrap()
    }

    /// Length from the domain start to `t`.
    pub fn length_at_time(&self, t: f64) -> f64 {
        let n = self.segment_times.len();
        let tmin = self.segment_times[0];
        let tmax = self.segment_times[n - 1];
        let t = t.clamp(tmin, tmax);
        // Last boundary <= t.
        let i = match self
            .segment_times
            .binary_search_by(|b| b.total_cmp(&t))
        {
            Ok(i) => i,
            Err(i) => i - 1,
        };
        if i >= n - 1 {
            return self.total_length();
        }
        self.accumulated[i] + self.curve.length(self.segment_times[i], t)
    }

    /// Parameter `t` with `length_at_time(t) == s`, for `s` clamped to
    /// `[0, total_length()]`. When the bisection budget is exhausted the
    /// best bracketing estimate is returned rather than an error.
    pub fn time_at_length(&self, s: f64) -> f64 {
        let total = self.total_length();
        let n = self.segment_times.len();
        if s <= 0.0 || total == 0.0 {
            return self.segment_times[0];
        }
        if s >= total {
            return self.segment_times[n - 1];
        }
        // Segment containing s.
        let i = match self
            .accumulated
            .binary_search_by(|a| a.total_cmp(&s))
        {
            Ok(i) => return self.segment_times[i],
            Err(i) => i - 1,
        };
        let t0 = self.segment_times[i];
        let t1 = self.segment_times[i + 1];
        let local = s - self.accumulated[i];
        let seg = self.accumulated[i + 1] - self.accumulated[i];
        let f = |t: f64| self.curve.length(t0, t) - local;
        match bisect_with(f, t0, t1, -local, seg - local, self.max_bisections) {
            Some(result) => result.root,
            None => t0 + (t1 - t0) * (local / seg),
        }
    }

    /// `n >= 2` parameter values, uniformly spaced in time.
    pub fn subdivide_by_time(&self, n: usize) -> Result<Vec<f64>> {
        if n < 2 {
            return Err(GmkError::InvalidOperation(
                "subdivision requires at least two samples".to_string(),
            ));
        }
        let tmin = self.segment_times[0];
        let tmax = *self.segment_times.last().unwrap();
        let dt = (tmax - tmin) / (n - 1) as f64;
        Ok((0..n).map(|i| tmin + dt * i as f64).collect())
    }

    /// `n >= 2` parameter values, uniformly spaced in arc length.
    pub fn subdivide_by_length(&self, n: usize) -> Result<Vec<f64>> {
        if n < 2 {
            return Err(GmkError::InvalidOperation(
                "subdivision requires at least two samples".to_string(),
            ));
        }
        let ds = self.total_length() / (n - 1) as f64;
        Ok((0..n).map(|i| self.time_at_length(ds * i as f64)).collect())
    }
}
