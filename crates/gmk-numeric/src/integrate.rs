//! Numerical integration: trapezoid rule, Romberg extrapolation, and
//! Gauss-Legendre quadrature.

/// Trapezoid rule with `num_samples >= 2` uniformly spaced samples.
///
/// Simple but slow to converge; prefer [`romberg`].
pub fn trapezoid<F>(num_samples: usize, a: f64, b: f64, f: F) -> f64
where
    F: Fn(f64) -> f64,
{
    debug_assert!(num_samples >= 2);
    let h = (b - a) / (num_samples - 1) as f64;
    let mut result = 0.5 * (f(a) + f(b));
    for i in 1..num_samples - 1 {
        result += f(a + i as f64 * h);
    }
    result * h
}

/// Romberg integration of order `order >= 1`.
///
/// Trapezoid estimates refined by Richardson extrapolation. Order 8 gives
/// roughly machine precision for smooth integrands.
pub fn romberg<F>(order: usize, a: f64, b: f64, f: F) -> f64
where
    F: Fn(f64) -> f64,
{
    debug_assert!(order >= 1);
    let mut rom = vec![[0.0f64; 2]; order];

    let mut h = b - a;
    rom[0][0] = 0.5 * h * (f(a) + f(b));
    let mut p0 = 1usize;
    for i in 1..order {
        // Refined trapezoid estimate with 2^(i-1) new interior samples.
        let mut sum = 0.0;
        for j in 1..=p0 {
            sum += f(a + h * (j as f64 - 0.5));
        }
        rom[0][1] = 0.5 * (rom[0][0] + h * sum);

        let mut p2 = 4.0;
        for k in 1..=i {
            rom[k][1] = (p2 * rom[k - 1][1] - rom[k - 1][0]) / (p2 - 1.0);
            p2 *= 4.0;
        }

        for k in 0..=i {
            rom[k][0] = rom[k][1];
        }

        p0 *= 2;
        h *= 0.5;
    }

    rom[order - 1][0]
}

/// Nodes and weights for Gauss-Legendre quadrature of the given degree
/// (`degree >= 2`) on `[-1, 1]`.
///
/// The roots of the Legendre polynomial are found by Newton iteration on
/// the three-term recurrence, seeded with the Chebyshev estimates.
pub fn gauss_legendre_rule(degree: usize) -> (Vec<f64>, Vec<f64>) {
    debug_assert!(degree >= 2);
    let n = degree;
    let mut roots = vec![0.0; n];
    let mut weights = vec![0.0; n];

    for i in 0..n {
        // Chebyshev estimate of the i-th root.
        let mut x = (std::f64::consts::PI * (i as f64 + 0.75) / (n as f64 + 0.5)).cos();
        let mut dp = 0.0;
        for _ in 0..100 {
            // Legendre recurrence: evaluates P_n(x) and P_n'(x).
            let mut p0 = 1.0;
            let mut p1 = x;
            for k in 2..=n {
                let kf = k as f64;
                let p2 = ((2.0 * kf - 1.0) * x * p1 - (kf - 1.0) * p0) / kf;
                p0 = p1;
                p1 = p2;
            }
            dp = n as f64 * (x * p1 - p0) / (x * x - 1.0);
            let dx = p1 / dp;
            x -= dx;
            if dx.abs() <= f64::EPSILON * (1.0 + x.abs()) {
                break;
            }
        }
        roots[i] = x;
        weights[i] = 2.0 / ((1.0 - x * x) * dp * dp);
    }

    // Newton converges from the largest root down; store ascending.
    roots.reverse();
    weights.reverse();
    (roots, weights)
}

/// Gauss-Legendre quadrature of `f` over `[a, b]` using a precomputed rule.
pub fn gauss_quadrature<F>(roots: &[f64], weights: &[f64], a: f64, b: f64, f: F) -> f64
where
    F: Fn(f64) -> f64,
{
    debug_assert_eq!(roots.len(), weights.len());
    let radius = 0.5 * (b - a);
    let center = 0.5 * (b + a);
    let mut result = 0.0;
    for (&r, &w) in roots.iter().zip(weights) {
        result += w * f(radius * r + center);
    }
    radius * result
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_trapezoid_linear_exact() {
        // Trapezoid is exact for affine integrands.
        let v = trapezoid(2, 0.0, 2.0, |x| 3.0 * x + 1.0);
        assert_relative_eq!(v, 8.0, epsilon = 1e-14);
    }

    #[test]
    fn test_romberg_sin() {
        let v = romberg(8, 0.0, std::f64::consts::PI, f64::sin);
        assert_relative_eq!(v, 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_romberg_polynomial() {
        let v = romberg(8, 0.0, 1.0, |x| x * x * x);
        assert_relative_eq!(v, 0.25, epsilon = 1e-13);
    }

    #[test]
    fn test_gauss_legendre_rule_symmetry() {
        let (roots, weights) = gauss_legendre_rule(5);
        assert_eq!(roots.len(), 5);
        let wsum: f64 = weights.iter().sum();
        assert_relative_eq!(wsum, 2.0, epsilon = 1e-13);
        for i in 0..5 {
            assert_relative_eq!(roots[i], -roots[4 - i], epsilon = 1e-13);
        }
        // Ascending order.
        assert!(roots.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_gauss_quadrature_exact_for_low_degree() {
        // Degree-n Gauss-Legendre integrates polynomials of degree 2n-1 exactly.
        let (roots, weights) = gauss_legendre_rule(3);
        let v = gauss_quadrature(&roots, &weights, -1.0, 2.0, |x| {
            x.powi(5) - 2.0 * x.powi(3) + x
        });
        // Antiderivative: x^6/6 - x^4/2 + x^2/2.
        let exact = |x: f64| x.powi(6) / 6.0 - x.powi(4) / 2.0 + x.powi(2) / 2.0;
        assert_relative_eq!(v, exact(2.0) - exact(-1.0), epsilon = 1e-12);
    }

    #[test]
    fn test_gauss_matches_romberg_on_speed_like_integrand() {
        let (roots, weights) = gauss_legendre_rule(8);
        let f = |t: f64| (1.0 + t * t).sqrt();
        let g = gauss_quadrature(&roots, &weights, 0.0, 1.0, f);
        let r = romberg(8, 0.0, 1.0, f);
        assert_relative_eq!(g, r, epsilon = 1e-10);
    }
}
