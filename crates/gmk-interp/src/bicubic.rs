//! Cubic interpolation of uniformly spaced 2D grids.

use gmk_core::{GmkError, Result};

/// Per-axis blend for the grid-cubic interpolators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CubicBlend {
    /// Catmull-Rom: interpolates the samples.
    CatmullRom,
    /// Uniform cubic B-spline: smooths the samples.
    BSpline,
}

/// Weights of the four blend polynomials and their derivatives at `t`,
/// `t` in `[0, 1]` within a cell.
pub(crate) fn blend_weights(blend: CubicBlend, t: f64, order: usize) -> [f64; 4] {
    // Polynomial coefficients [c0, c1, c2, c3] per weight.
    let coeffs: [[f64; 4]; 4] = match blend {
        CubicBlend::CatmullRom => [
            [0.0, -0.5, 1.0, -0.5],
            [1.0, 0.0, -2.5, 1.5],
            [0.0, 0.5, 2.0, -1.5],
            [0.0, 0.0, -0.5, 0.5],
        ],
        CubicBlend::BSpline => [
            [1.0 / 6.0, -0.5, 0.5, -1.0 / 6.0],
            [4.0 / 6.0, 0.0, -1.0, 0.5],
            [1.0 / 6.0, 0.5, 0.5, -0.5],
            [0.0, 0.0, 0.0, 1.0 / 6.0],
        ],
    };
    let mut w = [0.0; 4];
    for (wi, c) in w.iter_mut().zip(&coeffs) {
        *wi = match order {
            0 => ((c[3] * t + c[2]) * t + c[1]) * t + c[0],
            1 => (3.0 * c[3] * t + 2.0 * c[2]) * t + c[1],
            2 => 6.0 * c[3] * t + 2.0 * c[2],
            _ => 0.0,
        };
    }
    w
}

/// Cubic interpolation on the uniform grid
/// `(x_i, y_j) = (xmin + i sx, ymin + j sy)`, one 4x4 neighborhood per
/// query, with the neighborhood clamped at the grid border.
pub struct Bicubic2 {
    xmin: f64,
    ymin: f64,
    x_spacing: f64,
    y_spacing: f64,
    num_x: usize,
    num_y: usize,
    samples: Vec<f64>,
    blend: CubicBlend,
}

impl Bicubic2 {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        num_x: usize,
        num_y: usize,
        xmin: f64,
        x_spacing: f64,
        ymin: f64,
        y_spacing: f64,
        samples: Vec<f64>,
        blend: CubicBlend,
    ) -> Result<Self> {
        if num_x < 2 || num_y < 2 {
            return Err(GmkError::Construction(
                "grid interpolation requires at least two samples per axis".to_string(),
            ));
        }
        if x_spacing <= 0.0 || y_spacing <= 0.0 {
            return Err(GmkError::Construction(
                "sample spacing must be positive".to_string(),
            ));
        }
        if samples.len() != num_x * num_y {
            return Err(GmkError::Construction(format!(
                "grid expects {} samples, got {}",
                num_x * num_y,
                samples.len()
            )));
        }
        Ok(Self {
            xmin,
            ymin,
            x_spacing,
            y_spacing,
            num_x,
            num_y,
            samples,
            blend,
        })
    }

    pub fn domain(&self) -> ((f64, f64), (f64, f64)) {
        (
            (self.xmin, self.xmin + self.x_spacing * (self.num_x - 1) as f64),
            (self.ymin, self.ymin + self.y_spacing * (self.num_y - 1) as f64),
        )
    }

    /// Mixed partial derivative of order `(x_order, y_order)`, each
    /// `0..=2`, at the clamped point `(x, y)`.
    pub fn evaluate(&self, x: f64, y: f64, x_order: usize, y_order: usize) -> f64 {
        let ((xmin, xmax), (ymin, ymax)) = self.domain();
        let x = x.clamp(xmin, xmax);
        let y = y.clamp(ymin, ymax);
        let (ix, tx) = cell_of(x, xmin, self.x_spacing, self.num_x);
        let (iy, ty) = cell_of(y, ymin, self.y_spacing, self.num_y);

        let wx = blend_weights(self.blend, tx, x_order);
        let wy = blend_weights(self.blend, ty, y_order);
        let x_scale = self.x_spacing.powi(-(x_order as i32));
        let y_scale = self.y_spacing.powi(-(y_order as i32));

        let mut sum = 0.0;
        for (dy, &wyv) in wy.iter().enumerate() {
            let row = clamp_index(iy as isize + dy as isize - 1, self.num_y);
            for (dx, &wxv) in wx.iter().enumerate() {
                let col = clamp_index(ix as isize + dx as isize - 1, self.num_x);
                sum += wxv * wyv * self.samples[col + self.num_x * row];
            }
        }
        sum * x_scale * y_scale
    }

    pub fn position(&self, x: f64, y: f64) -> f64 {
        self.evaluate(x, y, 0, 0)
    }
}

/// Cell index and local coordinate of `v` on a uniform axis.
pub(crate) fn cell_of(v: f64, min: f64, spacing: f64, count: usize) -> (usize, f64) {
    let s = (v - min) / spacing;
    let index = (s as usize).min(count - 2);
    (index, s - index as f64)
}

pub(crate) fn clamp_index(i: isize, count: usize) -> usize {
    i.clamp(0, count as isize - 1) as usize
}
