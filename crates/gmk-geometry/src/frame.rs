//! Moving frames and curvature queries for curves and surfaces.

use gmk_math::{perp, DVec2, DVec3};

use crate::curve::ParametricCurve;
use crate::surface::{
    ParametricSurface, JET_X, JET_XU, JET_XUU, JET_XUV, JET_XV, JET_XVV,
};

/// Frenet frame of a planar curve at a parameter value.
#[derive(Debug, Clone, Copy)]
pub struct FrenetFrame2 {
    pub position: DVec2,
    pub tangent: DVec2,
    /// Tangent rotated clockwise by a quarter turn.
    pub normal: DVec2,
}

impl FrenetFrame2 {
    pub fn at(curve: &dyn ParametricCurve<DVec2>, t: f64) -> Self {
        let jet = curve.evaluate(t, 1);
        let tangent = jet[1].normalize_or_zero();
        Self {
            position: jet[0],
            tangent,
            normal: perp(tangent),
        }
    }

    /// Signed curvature `(x'y'' - y'x'') / |X'|^3`.
    pub fn curvature(curve: &dyn ParametricCurve<DVec2>, t: f64) -> f64 {
        let jet = curve.evaluate(t, 2);
        let speed_sq = jet[1].dot(jet[1]);
        if speed_sq == 0.0 {
            return 0.0;
        }
        let numer = jet[1].x * jet[2].y - jet[1].y * jet[2].x;
        numer / (speed_sq * speed_sq.sqrt())
    }
}

/// Frenet frame of a space curve at a parameter value. The normal is the
/// Gram-Schmidt complement of the second derivative against the tangent.
#[derive(Debug, Clone, Copy)]
pub struct FrenetFrame3 {
    pub position: DVec3,
    pub tangent: DVec3,
    pub normal: DVec3,
    pub binormal: DVec3,
}

impl FrenetFrame3 {
    pub fn at(curve: &dyn ParametricCurve<DVec3>, t: f64) -> Self {
        let jet = curve.evaluate(t, 2);
        let tangent = jet[1].normalize_or_zero();
        let normal = (jet[2] - tangent * jet[2].dot(tangent)).normalize_or_zero();
        Self {
            position: jet[0],
            tangent,
            normal,
            binormal: tangent.cross(normal),
        }
    }

    /// `|X' x X''| / |X'|^3`.
    pub fn curvature(curve: &dyn ParametricCurve<DVec3>, t: f64) -> f64 {
        let jet = curve.evaluate(t, 2);
        let speed_sq = jet[1].dot(jet[1]);
        if speed_sq == 0.0 {
            return 0.0;
        }
        jet[1].cross(jet[2]).length() / (speed_sq * speed_sq.sqrt())
    }

    /// `det(X', X'', X''') / |X' x X''|^2`.
    pub fn torsion(curve: &dyn ParametricCurve<DVec3>, t: f64) -> f64 {
        let jet = curve.evaluate(t, 3);
        let cross = jet[1].cross(jet[2]);
        let cross_sq = cross.dot(cross);
        if cross_sq == 0.0 {
            return 0.0;
        }
        cross.dot(jet[3]) / cross_sq
    }
}

/// Darboux frame of a surface: two tangents and the unit normal forming
/// a right-handed orthonormal triple.
#[derive(Debug, Clone, Copy)]
pub struct DarbouxFrame3 {
    pub position: DVec3,
    pub tangent0: DVec3,
    pub tangent1: DVec3,
    pub normal: DVec3,
}

/// Principal curvatures with their unit directions in the surface
/// tangent plane.
#[derive(Debug, Clone, Copy)]
pub struct PrincipalCurvatures {
    pub min_curvature: f64,
    pub max_curvature: f64,
    pub min_direction: DVec3,
    pub max_direction: DVec3,
}

impl DarbouxFrame3 {
    pub fn at(surface: &dyn ParametricSurface<DVec3>, u: f64, v: f64) -> Self {
        let jet = surface.evaluate(u, v, 1);
        let tangent0 = jet[JET_XU].normalize_or_zero();
        let normal = jet[JET_XU].cross(jet[JET_XV]).normalize_or_zero();
        Self {
            position: jet[JET_X],
            tangent0,
            tangent1: normal.cross(tangent0),
            normal,
        }
    }

    /// Eigen-decomposition of the 2x2 shape operator built from the first
    /// and second fundamental forms.
    pub fn principal_curvatures(
        surface: &dyn ParametricSurface<DVec3>,
        u: f64,
        v: f64,
    ) -> PrincipalCurvatures {
        let jet = surface.evaluate(u, v, 2);
        let (xu, xv) = (jet[JET_XU], jet[JET_XV]);
        let normal = xu.cross(xv).normalize_or_zero();

        // First fundamental form (E, F, G), second (L, M, N).
        let e = xu.dot(xu);
        let f = xu.dot(xv);
        let g = xv.dot(xv);
        let l = normal.dot(jet[JET_XUU]);
        let m = normal.dot(jet[JET_XUV]);
        let n = normal.dot(jet[JET_XVV]);

        let det1 = e * g - f * f;
        if det1 <= 0.0 {
            return PrincipalCurvatures {
                min_curvature: 0.0,
                max_curvature: 0.0,
                min_direction: xu.normalize_or_zero(),
                max_direction: xv.normalize_or_zero(),
            };
        }

        // Shape operator S = I^{-1} II.
        let inv = 1.0 / det1;
        let s00 = (g * l - f * m) * inv;
        let s01 = (g * m - f * n) * inv;
        let s10 = (e * m - f * l) * inv;
        let s11 = (e * n - f * m) * inv;

        let mean = 0.5 * (s00 + s11);
        let det_s = s00 * s11 - s01 * s10;
        let disc = (mean * mean - det_s).max(0.0).sqrt();
        let k_min = mean - disc;
        let k_max = mean + disc;

        // Eigenvector of S for eigenvalue k: (s01, k - s00) or
        // (k - s11, s10), whichever is better conditioned.
        let direction = |k: f64| -> DVec3 {
            let (a, b) = if s01.abs() >= s10.abs() {
                (s01, k - s00)
            } else {
                (k - s11, s10)
            };
            if a.abs() < 1e-300 && b.abs() < 1e-300 {
                xu.normalize_or_zero()
            } else {
                (xu * a + xv * b).normalize_or_zero()
            }
        };

        PrincipalCurvatures {
            min_curvature: k_min,
            max_curvature: k_max,
            min_direction: direction(k_min),
            max_direction: direction(k_max),
        }
    }
}
