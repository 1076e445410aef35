//! Cubic interpolation of uniformly spaced 3D grids.

use gmk_core::{GmkError, Result};

use crate::bicubic::{blend_weights, cell_of, clamp_index, CubicBlend};

/// Cubic interpolation on a uniform 3D grid, one 4x4x4 neighborhood per
/// query, with the neighborhood clamped at the grid border. Samples are
/// stored x-fastest: `samples[ix + num_x * (iy + num_y * iz)]`.
pub struct Tricubic3 {
    mins: [f64; 3],
    spacings: [f64; 3],
    counts: [usize; 3],
    samples: Vec<f64>,
    blend: CubicBlend,
}

impl Tricubic3 {
    pub fn new(
        counts: [usize; 3],
        mins: [f64; 3],
        spacings: [f64; 3],
        samples: Vec<f64>,
        blend: CubicBlend,
    ) -> Result<Self> {
        if counts.iter().any(|&c| c < 2) {
            return Err(GmkError::Construction(
                "grid interpolation requires at least two samples per axis".to_string(),
            ));
        }
        if spacings.iter().any(|&s| s <= 0.0) {
            return Err(GmkError::Construction(
                "sample spacing must be positive".to_string(),
            ));
        }
        let expected = counts[0] * counts[1] * counts[2];
        if samples.len() != expected {
            return Err(GmkError::Construction(format!(
                "grid expects {expected} samples, got {}",
                samples.len()
            )));
        }
        Ok(Self {
            mins,
            spacings,
            counts,
            samples,
            blend,
        })
    }

    pub fn domain(&self) -> [(f64, f64); 3] {
        let mut out = [(0.0, 0.0); 3];
        for axis in 0..3 {
            out[axis] = (
                self.mins[axis],
                self.mins[axis] + self.spacings[axis] * (self.counts[axis] - 1) as f64,
            );
        }
        out
    }

    /// Mixed partial derivative of order `orders[axis] <= 2` per axis at
    /// the clamped point.
    pub fn evaluate(&self, point: [f64; 3], orders: [usize; 3]) -> f64 {
        let domain = self.domain();
        let mut weights = [[0.0; 4]; 3];
        let mut cells = [0usize; 3];
        let mut scale = 1.0;
        for axis in 0..3 {
            let v = point[axis].clamp(domain[axis].0, domain[axis].1);
            let (index, t) = cell_of(v, self.mins[axis], self.spacings[axis], self.counts[axis]);
            cells[axis] = index;
            weights[axis] = blend_weights(self.blend, t, orders[axis]);
            scale *= self.spacings[axis].powi(-(orders[axis] as i32));
        }

        let mut sum = 0.0;
        for (dz, &wz) in weights[2].iter().enumerate() {
            let iz = clamp_index(cells[2] as isize + dz as isize - 1, self.counts[2]);
            for (dy, &wy) in weights[1].iter().enumerate() {
                let iy = clamp_index(cells[1] as isize + dy as isize - 1, self.counts[1]);
                let wzy = wz * wy;
                for (dx, &wx) in weights[0].iter().enumerate() {
                    let ix = clamp_index(cells[0] as isize + dx as isize - 1, self.counts[0]);
                    sum += wzy
                        * wx
                        * self.samples[ix + self.counts[0] * (iy + self.counts[1] * iz)];
                }
            }
        }
        sum * scale
    }

    pub fn position(&self, point: [f64; 3]) -> f64 {
        self.evaluate(point, [0, 0, 0])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn grid(f: impl Fn(f64, f64, f64) -> f64, n: usize) -> Vec<f64> {
        let mut samples = Vec::with_capacity(n * n * n);
        for iz in 0..n {
            for iy in 0..n {
                for ix in 0..n {
                    samples.push(f(ix as f64, iy as f64, iz as f64));
                }
            }
        }
        samples
    }

    #[test]
    fn test_catmull_rom_interpolates_nodes() {
        let f = |x: f64, y: f64, z: f64| (x * 0.9).sin() + y * z * 0.1;
        let samples = grid(f, 5);
        let interp = Tricubic3::new(
            [5, 5, 5],
            [0.0, 0.0, 0.0],
            [1.0, 1.0, 1.0],
            samples,
            CubicBlend::CatmullRom,
        )
        .unwrap();
        for iz in 0..5 {
            for iy in 0..5 {
                for ix in 0..5 {
                    let p = [ix as f64, iy as f64, iz as f64];
                    assert_relative_eq!(interp.position(p), f(p[0], p[1], p[2]), epsilon = 1e-12);
                }
            }
        }
    }

    #[test]
    fn test_reproduces_trilinear_function() {
        let f = |x: f64, y: f64, z: f64| 1.0 + x - 2.0 * y + 0.5 * z + 0.25 * x * y * z;
        let samples = grid(f, 6);
        for blend in [CubicBlend::CatmullRom, CubicBlend::BSpline] {
            let interp = Tricubic3::new(
                [6, 6, 6],
                [0.0, 0.0, 0.0],
                [1.0, 1.0, 1.0],
                samples.clone(),
                blend,
            )
            .unwrap();
            let p = [2.3, 3.1, 2.7];
            assert_relative_eq!(interp.position(p), f(p[0], p[1], p[2]), epsilon = 1e-10);
            // d/dy = -2 + 0.25 x z
            assert_relative_eq!(
                interp.evaluate(p, [0, 1, 0]),
                -2.0 + 0.25 * p[0] * p[2],
                epsilon = 1e-10
            );
            // mixed d3/dxdydz = 0.25
            assert_relative_eq!(interp.evaluate(p, [1, 1, 1]), 0.25, epsilon = 1e-10);
        }
    }

    #[test]
    fn test_derivative_matches_finite_difference() {
        let f = |x: f64, y: f64, z: f64| (0.7 * x).cos() * (0.4 * y).sin() + 0.2 * z * z;
        let samples = grid(f, 8);
        let interp = Tricubic3::new(
            [8, 8, 8],
            [0.0, 0.0, 0.0],
            [1.0, 1.0, 1.0],
            samples,
            CubicBlend::CatmullRom,
        )
        .unwrap();
        let p = [3.4, 4.1, 2.8];
        let h = 1e-6;
        let dz = (interp.position([p[0], p[1], p[2] + h])
            - interp.position([p[0], p[1], p[2] - h]))
            / (2.0 * h);
        assert_relative_eq!(interp.evaluate(p, [0, 0, 1]), dz, epsilon = 1e-6);
    }

    #[test]
    fn test_clamps_outside_domain() {
        let samples = grid(|x, y, z| x + y + z, 4);
        let interp = Tricubic3::new(
            [4, 4, 4],
            [0.0, 0.0, 0.0],
            [1.0, 1.0, 1.0],
            samples,
            CubicBlend::CatmullRom,
        )
        .unwrap();
        assert_relative_eq!(interp.position([-2.0, -2.0, -2.0]), 0.0, epsilon = 1e-10);
        assert_relative_eq!(interp.position([8.0, 8.0, 8.0]), 9.0, epsilon = 1e-10);
    }

    #[test]
    fn test_rejects_sample_mismatch() {
        assert!(Tricubic3::new(
            [3, 3, 3],
            [0.0; 3],
            [1.0; 3],
            vec![0.0; 10],
            CubicBlend::CatmullRom
        )
        .is_err());
    }
}
