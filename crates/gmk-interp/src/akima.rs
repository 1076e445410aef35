//! Akima interpolation of uniformly spaced 1D samples.

use gmk_core::{GmkError, Result};

/// One cubic polynomial per sample interval, coefficients in the local
/// variable `x - x_i`.
#[derive(Debug, Clone, Copy)]
struct Cubic {
    c: [f64; 4],
}

impl Cubic {
    fn evaluate(&self, dx: f64, order: usize) -> f64 {
        match order {
            0 => ((self.c[3] * dx + self.c[2]) * dx + self.c[1]) * dx + self.c[0],
            1 => (3.0 * self.c[3] * dx + 2.0 * self.c[2]) * dx + self.c[1],
            2 => 6.0 * self.c[3] * dx + 2.0 * self.c[2],
            _ => 0.0,
        }
    }
}

/// Akima cubic interpolation on the uniform grid
/// `x_i = xmin + i * spacing`. The scheme weighs neighboring secant
/// slopes by how much the farther slopes disagree, which keeps the
/// interpolant from overshooting near sharp changes.
pub struct AkimaUniform1 {
    xmin: f64,
    spacing: f64,
    polynomials: Vec<Cubic>,
}

impl AkimaUniform1 {
    pub fn new(xmin: f64, spacing: f64, samples: &[f64]) -> Result<Self> {
        if samples.len() < 3 {
            return Err(GmkError::Construction(
                "Akima interpolation requires at least three samples".to_string(),
            ));
        }
        if spacing <= 0.0 {
            return Err(GmkError::Construction(
                "sample spacing must be positive".to_string(),
            ));
        }
        let n = samples.len();

        // Secant slopes with two quadratic-extrapolation entries at each
        // end, so every interior slope sees two neighbors per side.
        let mut secants = Vec::with_capacity(n + 3);
        secants.extend(std::iter::repeat(0.0).take(2));
        for w in samples.windows(2) {
            secants.push((w[1] - w[0]) / spacing);
        }
        secants[1] = 2.0 * secants[2] - secants[3];
        secants[0] = 2.0 * secants[1] - secants[2];
        let last = secants[secants.len() - 1];
        let prev = secants[secants.len() - 2];
        secants.push(2.0 * last - prev);
        let len = secants.len();
        secants.push(2.0 * secants[len - 1] - secants[len - 2]);

        // Akima vertex slopes: secants[i + 2] is the slope of interval i.
        let slope_at = |i: usize| -> f64 {
            let m_m2 = secants[i];
            let m_m1 = secants[i + 1];
            let m_0 = secants[i + 2];
            let m_1 = secants[i + 3];
            let w_left = (m_1 - m_0).abs();
            let w_right = (m_m1 - m_m2).abs();
            if w_left + w_right > 0.0 {
                (w_left * m_m1 + w_right * m_0) / (w_left + w_right)
            } else {
                0.5 * (m_m1 + m_0)
            }
        };

        let mut polynomials = Vec::with_capacity(n - 1);
        for i in 0..n - 1 {
            let s0 = slope_at(i);
            let s1 = slope_at(i + 1);
            let m = secants[i + 2];
            polynomials.push(Cubic {
                c: [
                    samples[i],
                    s0,
                    (3.0 * m - 2.0 * s0 - s1) / spacing,
                    (s0 + s1 - 2.0 * m) / (spacing * spacing),
                ],
            });
        }
        Ok(Self {
            xmin,
            spacing,
            polynomials,
        })
    }

    pub fn domain(&self) -> (f64, f64) {
        (
            self.xmin,
            self.xmin + self.spacing * self.polynomials.len() as f64,
        )
    }

    /// Derivative of order `0..=2` at `x`, clamped to the grid; higher
    /// orders are zero almost everywhere and reported as zero.
    pub fn evaluate(&self, x: f64, order: usize) -> f64 {
        let (xmin, xmax) = self.domain();
        let x = x.clamp(xmin, xmax);
        let index = (((x - xmin) / self.spacing) as usize).min(self.polynomials.len() - 1);
        let local = x - (xmin + self.spacing * index as f64);
        self.polynomials[index].evaluate(local, order)
    }

    pub fn position(&self, x: f64) -> f64 {
        self.evaluate(x, 0)
    }
}
