//! Bisection root finding.

/// Result of a bisection search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bisection {
    pub root: f64,
    /// Iterations actually used; 1 when an endpoint was already a root.
    pub iterations: u32,
}

/// Locate a root of `f` on `[t0, t1]` by bisection.
///
/// Requires `t0 < t1` and `f(t0) * f(t1) <= 0`; returns `None` otherwise
/// (the interval may still contain a root, but that cannot be guaranteed
/// from the endpoint signs).
///
/// Exhausting `max_iterations` is not a failure: the best estimate reached
/// is returned. With a large budget the search terminates when `f` evaluates
/// exactly to zero or the midpoint rounds to an endpoint.
pub fn bisect<F>(f: F, t0: f64, t1: f64, max_iterations: u32) -> Option<Bisection>
where
    F: Fn(f64) -> f64,
{
    if t0 >= t1 {
        return None;
    }
    let f0 = f(t0);
    let f1 = f(t1);
    bisect_with(f, t0, t1, f0, f1, max_iterations)
}

/// Bisection when the endpoint values are already known.
///
/// Only the signs of `f0` and `f1` matter, so callers may pass `+/-1.0` in
/// place of overflowing values.
pub fn bisect_with<F>(
    f: F,
    mut t0: f64,
    mut t1: f64,
    f0: f64,
    f1: f64,
    max_iterations: u32,
) -> Option<Bisection>
where
    F: Fn(f64) -> f64,
{
    if t0 >= t1 {
        return None;
    }
    if f0 == 0.0 {
        return Some(Bisection {
            root: t0,
            iterations: 1,
        });
    }
    if f1 == 0.0 {
        return Some(Bisection {
            root: t1,
            iterations: 1,
        });
    }
    if f0 * f1 > 0.0 {
        return None;
    }

    let mut sign0 = f0.signum();
    let mut root = 0.5 * (t0 + t1);
    for i in 2..=max_iterations.max(2) {
        root = 0.5 * (t0 + t1);
        // Midpoint rounded to an endpoint: f64 cannot separate further.
        if root == t0 || root == t1 {
            return Some(Bisection {
                root,
                iterations: i,
            });
        }
        let fm = f(root);
        if fm == 0.0 {
            return Some(Bisection {
                root,
                iterations: i,
            });
        }
        if fm.signum() == sign0 {
            t0 = root;
            sign0 = fm.signum();
        } else {
            t1 = root;
        }
    }

    Some(Bisection {
        root,
        iterations: max_iterations.max(2),
    })
}
