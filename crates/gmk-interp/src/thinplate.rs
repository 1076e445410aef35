//! Thin-plate spline interpolation of scattered 2D/3D samples.
//!
//! The spline is a weighted sum of Green's-function kernels centered at
//! the sample points plus an affine polynomial, solved as one dense
//! linear system. A singular system does not fail construction: the
//! object reports `is_initialized() == false` and evaluation returns
//! the `f64::MAX` sentinel.

use gmk_core::{GmkError, Result};
use gmk_math::{Aabb2, Aabb3, DVec2, DVec3};
use nalgebra::{DMatrix, DVector};

/// 2D biharmonic kernel `t^2 log(t^2)`.
fn kernel2(t: f64) -> f64 {
    if t > 0.0 {
        let t2 = t * t;
        t2 * t2.ln()
    } else {
        0.0
    }
}

/// 3D biharmonic kernel `|t|`.
fn kernel3(t: f64) -> f64 {
    t.abs()
}

/// Solves the bordered kernel system
/// `[A + smooth I, B; B^T, 0] [w; b] = [f; 0]`.
/// `None` when the system is singular.
fn solve_system(
    kernel_matrix: DMatrix<f64>,
    poly: DMatrix<f64>,
    values: &[f64],
    smooth: f64,
) -> Option<(Vec<f64>, Vec<f64>)> {
    let n = values.len();
    let p = poly.ncols();
    let size = n + p;
    let mut system = DMatrix::zeros(size, size);
    for r in 0..n {
        for c in 0..n {
            system[(r, c)] = kernel_matrix[(r, c)] + if r == c { smooth } else { 0.0 };
        }
        for c in 0..p {
            system[(r, n + c)] = poly[(r, c)];
            system[(n + c, r)] = poly[(r, c)];
        }
    }
    let mut rhs = DVector::zeros(size);
    for (i, &f) in values.iter().enumerate() {
        rhs[i] = f;
    }
    let solution = system.lu().solve(&rhs)?;
    let weights = solution.iter().take(n).copied().collect();
    let coeffs = solution.iter().skip(n).copied().collect();
    Some((weights, coeffs))
}

pub struct ThinPlateSpline2 {
    points: Vec<DVec2>,
    values: Vec<f64>,
    /// Kernel weights, empty when the solve failed.
    weights: Vec<f64>,
    /// Affine coefficients `(c0, cx, cy)`.
    poly: [f64; 3],
    /// `(offset, scale)` per axis when normalizing to the unit square.
    transform: Option<(DVec2, DVec2)>,
    smooth: f64,
}

impl ThinPlateSpline2 {
    /// `smooth >= 0`; `smooth == 0` interpolates the samples exactly.
    /// `normalize` maps the sample cloud into the unit square before
    /// solving, which conditions the kernel matrix for skewed data.
    pub fn new(
        points: Vec<DVec2>,
        values: Vec<f64>,
        smooth: f64,
        normalize: bool,
    ) -> Result<Self> {
        if points.len() != values.len() || points.len() < 3 {
            return Err(GmkError::Construction(format!(
                "thin-plate spline requires matching samples (at least 3), got {} points and {} values",
                points.len(),
                values.len()
            )));
        }
        if smooth < 0.0 {
            return Err(GmkError::Construction(
                "smoothing parameter must be nonnegative".to_string(),
            ));
        }

        let transform = if normalize {
            let aabb = Aabb2::from_points(&points)
                .unwrap_or_else(|| Aabb2::new(DVec2::ZERO, DVec2::ONE));
            let extents = aabb.extents();
            let scale = DVec2::new(
                if extents.x > 0.0 { 1.0 / extents.x } else { 1.0 },
                if extents.y > 0.0 { 1.0 / extents.y } else { 1.0 },
            );
            Some((aabb.min, scale))
        } else {
            None
        };
        let mapped: Vec<DVec2> = points
            .iter()
            .map(|&p| apply_transform2(transform, p))
            .collect();

        let n = points.len();
        let kernel_matrix =
            DMatrix::from_fn(n, n, |r, c| kernel2(mapped[r].distance(mapped[c])));
        let poly = DMatrix::from_fn(n, 3, |r, c| match c {
            0 => 1.0,
            1 => mapped[r].x,
            _ => mapped[r].y,
        });

        let (weights, coeffs) = match solve_system(kernel_matrix, poly, &values, smooth) {
            Some(solution) => solution,
            None => (Vec::new(), vec![0.0; 3]),
        };
        Ok(Self {
            points: mapped,
            values,
            weights,
            poly: [coeffs[0], coeffs[1], coeffs[2]],
            transform,
            smooth,
        })
    }

    pub fn is_initialized(&self) -> bool {
        !self.weights.is_empty()
    }

    pub fn smooth(&self) -> f64 {
        self.smooth
    }

    /// Spline value at `p`, or `f64::MAX` when the solve failed.
    pub fn evaluate(&self, p: DVec2) -> f64 {
        if !self.is_initialized() {
            return f64::MAX;
        }
        let q = apply_transform2(self.transform, p);
        let mut sum = self.poly[0] + self.poly[1] * q.x + self.poly[2] * q.y;
        for (point, &w) in self.points.iter().zip(&self.weights) {
            sum += w * kernel2(point.distance(q));
        }
        sum
    }

    /// The minimized quadratic functional (bending energy plus the
    /// smoothing term), `f64::MAX` when uninitialized.
    pub fn functional(&self) -> f64 {
        if !self.is_initialized() {
            return f64::MAX;
        }
        self.weights
            .iter()
            .zip(&self.values)
            .map(|(&w, &f)| w * f)
            .sum()
    }
}

fn apply_transform2(transform: Option<(DVec2, DVec2)>, p: DVec2) -> DVec2 {
    match transform {
        Some((offset, scale)) => DVec2::new((p.x - offset.x) * scale.x, (p.y - offset.y) * scale.y),
        None => p,
    }
}

pub struct ThinPlateSpline3 {
    points: Vec<DVec3>,
    values: Vec<f64>,
    weights: Vec<f64>,
    /// Affine coefficients `(c0, cx, cy, cz)`.
    poly: [f64; 4],
    transform: Option<(DVec3, DVec3)>,
    smooth: f64,
}

impl ThinPlateSpline3 {
    pub fn new(
        points: Vec<DVec3>,
        values: Vec<f64>,
        smooth: f64,
        normalize: bool,
    ) -> Result<Self> {
        if points.len() != values.len() || points.len() < 4 {
            return Err(GmkError::Construction(format!(
                "thin-plate spline requires matching samples (at least 4), got {} points and {} values",
                points.len(),
                values.len()
            )));
        }
        if smooth < 0.0 {
            return Err(GmkError::Construction(
                "smoothing parameter must be nonnegative".to_string(),
            ));
        }

        let transform = if normalize {
            let aabb = Aabb3::from_points(&points)
                .unwrap_or_else(|| Aabb3::new(DVec3::ZERO, DVec3::ONE));
            let extents = aabb.extents();
            let scale = DVec3::new(
                if extents.x > 0.0 { 1.0 / extents.x } else { 1.0 },
                if extents.y > 0.0 { 1.0 / extents.y } else { 1.0 },
                if extents.z > 0.0 { 1.0 / extents.z } else { 1.0 },
            );
            Some((aabb.min, scale))
        } else {
            None
        };
        let mapped: Vec<DVec3> = points
            .iter()
            .map(|&p| apply_transform3(transform, p))
            .collect();

        let n = points.len();
        let kernel_matrix =
            DMatrix::from_fn(n, n, |r, c| kernel3(mapped[r].distance(mapped[c])));
        let poly = DMatrix::from_fn(n, 4, |r, c| match c {
            0 => 1.0,
            1 => mapped[r].x,
            2 => mapped[r].y,
            _ => mapped[r].z,
        });

        let (weights, coeffs) = match solve_system(kernel_matrix, poly, &values, smooth) {
            Some(solution) => solution,
            None => (Vec::new(), vec![0.0; 4]),
        };
        Ok(Self {
            points: mapped,
            values,
            weights,
            poly: [coeffs[0], coeffs[1], coeffs[2], coeffs[3]],
            transform,
            smooth,
        })
    }

    pub fn is_initialized(&self) -> bool {
        !self.weights.is_empty()
    }

    pub fn smooth(&self) -> f64 {
        self.smooth
    }

    pub fn evaluate(&self, p: DVec3) -> f64 {
        if !self.is_initialized() {
            return f64::MAX;
        }
        let q = apply_transform3(self.transform, p);
        let mut sum = self.poly[0] + self.poly[1] * q.x + self.poly[2] * q.y + self.poly[3] * q.z;
        for (point, &w) in self.points.iter().zip(&self.weights) {
            sum += w * kernel3(point.distance(q));
        }
        sum
    }

    pub fn functional(&self) -> f64 {
        if !self.is_initialized() {
            return f64::MAX;
        }
        self.weights
            .iter()
            .zip(&self.values)
            .map(|(&w, &f)| w * f)
            .sum()
    }
}

fn apply_transform3(transform: Option<(DVec3, DVec3)>, p: DVec3) -> DVec3 {
    match transform {
        Some((offset, scale)) => DVec3::new(
            (p.x - offset.x) * scale.x,
            (p.y - offset.y) * scale.y,
            (p.z - offset.z) * scale.z,
        ),
        None => p,
    }
}
