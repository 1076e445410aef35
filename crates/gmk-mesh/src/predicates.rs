//! Robust orientation predicates.
//!
//! Each predicate first evaluates the determinant in plain f64 and accepts
//! the sign when the magnitude clears a forward error bound. Inside the
//! uncertainty band it falls back to exact floating-point expansion
//! arithmetic (error-free transformations), so the returned sign is always
//! the sign of the true real-arithmetic determinant.

use gmk_math::{DVec2, DVec3};

/// Sign of a robust determinant evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Negative,
    Zero,
    Positive,
}

impl Orientation {
    fn from_sign(value: f64) -> Self {
        if value > 0.0 {
            Orientation::Positive
        } else if value < 0.0 {
            Orientation::Negative
        } else {
            Orientation::Zero
        }
    }
}

// Half the f64 machine epsilon, the unit used by the filter bounds.
const EPS: f64 = 1.110_223_024_625_156_5e-16;
const CCW_ERRBOUND: f64 = (3.0 + 16.0 * EPS) * EPS;
const O3D_ERRBOUND: f64 = (7.0 + 56.0 * EPS) * EPS;

/// Orientation of `c` relative to the directed line `a -> b`.
/// `Positive` means the triangle `(a, b, c)` is counterclockwise.
pub fn orient2d(a: DVec2, b: DVec2, c: DVec2) -> Orientation {
    let detleft = (a.x - c.x) * (b.y - c.y);
    let detright = (a.y - c.y) * (b.x - c.x);
    let det = detleft - detright;
    let detsum = detleft.abs() + detright.abs();
    if det.abs() >= CCW_ERRBOUND * detsum {
        return Orientation::from_sign(det);
    }
    orient2d_exact(a, b, c)
}

/// Orientation of `d` relative to the plane through `a`, `b`, `c`.
/// `Positive` means `d` lies below the plane with `(a, b, c)`
/// counterclockwise seen from above.
pub fn orient3d(a: DVec3, b: DVec3, c: DVec3, d: DVec3) -> Orientation {
    let adx = a.x - d.x;
    let ady = a.y - d.y;
    let adz = a.z - d.z;
    let bdx = b.x - d.x;
    let bdy = b.y - d.y;
    let bdz = b.z - d.z;
    let cdx = c.x - d.x;
    let cdy = c.y - d.y;
    let cdz = c.z - d.z;

    let bdxcdy = bdx * cdy;
    let cdxbdy = cdx * bdy;
    let cdxady = cdx * ady;
    let adxcdy = adx * cdy;
    let adxbdy = adx * bdy;
    let bdxady = bdx * ady;

    let det = adz * (bdxcdy - cdxbdy) + bdz * (cdxady - adxcdy) + cdz * (adxbdy - bdxady);
    let permanent = (bdxcdy.abs() + cdxbdy.abs()) * adz.abs()
        + (cdxady.abs() + adxcdy.abs()) * bdz.abs()
        + (adxbdy.abs() + bdxady.abs()) * cdz.abs();
    if det.abs() >= O3D_ERRBOUND * permanent {
        return Orientation::from_sign(det);
    }
    orient3d_exact(a, b, c, d)
}

// --- Error-free transformations ---

#[inline]
fn two_sum(a: f64, b: f64) -> (f64, f64) {
    let x = a + b;
    let bv = x - a;
    let av = x - bv;
    let err = (a - av) + (b - bv);
    (x, err)
}

#[inline]
fn two_diff(a: f64, b: f64) -> (f64, f64) {
    let x = a - b;
    let bv = a - x;
    let av = x + bv;
    let err = (a - av) + (bv - b);
    (x, err)
}

// Veltkamp splitter for 53-bit significands: 2^27 + 1.
const SPLITTER: f64 = 134_217_729.0;

#[inline]
fn split(a: f64) -> (f64, f64) {
    let c = SPLITTER * a;
    let hi = c - (c - a);
    (hi, a - hi)
}

#[inline]
fn two_product(a: f64, b: f64) -> (f64, f64) {
    let x = a * b;
    let (ahi, alo) = split(a);
    let (bhi, blo) = split(b);
    let err = ((ahi * bhi - x) + ahi * blo + alo * bhi) + alo * blo;
    (x, err)
}

// --- Expansion arithmetic ---
//
// An expansion is a slice of nonoverlapping components in increasing
// magnitude order whose exact sum is the represented value.

/// Adds two expansions by repeated grow-expansion, dropping zeros.
fn expansion_sum(e: &[f64], f: &[f64]) -> Vec<f64> {
    let mut h: Vec<f64> = Vec::with_capacity(e.len() + f.len());
    h.extend_from_slice(e);
    for &b in f {
        let mut q = b;
        let mut out = Vec::with_capacity(h.len() + 1);
        for &a in &h {
            let (sum, err) = two_sum(q, a);
            if err != 0.0 {
                out.push(err);
            }
            q = sum;
        }
        out.push(q);
        h = out;
    }
    h.retain(|&x| x != 0.0);
    h
}

/// Multiplies an expansion by a scalar exactly.
fn scale_expansion(e: &[f64], b: f64) -> Vec<f64> {
    let mut h = Vec::with_capacity(2 * e.len());
    let mut q = 0.0;
    let mut first = true;
    for &a in e {
        let (prod, perr) = two_product(a, b);
        if first {
            if perr != 0.0 {
                h.push(perr);
            }
            q = prod;
            first = false;
            continue;
        }
        let (sum1, err1) = two_sum(q, perr);
        if err1 != 0.0 {
            h.push(err1);
        }
        let (sum2, err2) = two_sum(sum1, prod);
        if err2 != 0.0 {
            h.push(err2);
        }
        q = sum2;
    }
    if q != 0.0 || h.is_empty() {
        h.push(q);
    }
    h
}

/// Exact product of two expansions.
fn expansion_product(e: &[f64], f: &[f64]) -> Vec<f64> {
    let mut acc: Vec<f64> = vec![0.0];
    for &b in f {
        let partial = scale_expansion(e, b);
        acc = expansion_sum(&acc, &partial);
    }
    acc
}

fn negate(e: &[f64]) -> Vec<f64> {
    e.iter().map(|&x| -x).collect()
}

/// Sign of the exact sum of an expansion: the largest-magnitude
/// component carries the sign, which is the last nonzero entry.
fn expansion_sign(e: &[f64]) -> Orientation {
    for &x in e.iter().rev() {
        if x != 0.0 {
            return Orientation::from_sign(x);
        }
    }
    Orientation::Zero
}

fn diff_expansion(a: f64, b: f64) -> [f64; 2] {
    let (x, err) = two_diff(a, b);
    [err, x]
}

fn orient2d_exact(a: DVec2, b: DVec2, c: DVec2) -> Orientation {
    let acx = diff_expansion(a.x, c.x);
    let acy = diff_expansion(a.y, c.y);
    let bcx = diff_expansion(b.x, c.x);
    let bcy = diff_expansion(b.y, c.y);

    let left = expansion_product(&acx, &bcy);
    let right = expansion_product(&acy, &bcx);
    let det = expansion_sum(&left, &negate(&right));
    expansion_sign(&det)
}

fn orient3d_exact(a: DVec3, b: DVec3, c: DVec3, d: DVec3) -> Orientation {
    let adx = diff_expansion(a.x, d.x);
    let ady = diff_expansion(a.y, d.y);
    let adz = diff_expansion(a.z, d.z);
    let bdx = diff_expansion(b.x, d.x);
    let bdy = diff_expansion(b.y, d.y);
    let bdz = diff_expansion(b.z, d.z);
    let cdx = diff_expansion(c.x, d.x);
    let cdy = diff_expansion(c.y, d.y);
    let cdz = diff_expansion(c.z, d.z);

    // Cofactor expansion along the third column.
    let minor = |px: &[f64], py: &[f64], qx: &[f64], qy: &[f64]| -> Vec<f64> {
        let pq = expansion_product(px, qy);
        let qp = expansion_product(qx, py);
        expansion_sum(&pq, &negate(&qp))
    };
    let m_a = minor(&bdx, &bdy, &cdx, &cdy);
    let m_b = minor(&cdx, &cdy, &adx, &ady);
    let m_c = minor(&adx, &ady, &bdx, &bdy);

    let t_a = expansion_product(&m_a, &adz);
    let t_b = expansion_product(&m_b, &bdz);
    let t_c = expansion_product(&m_c, &cdz);

    let det = expansion_sum(&expansion_sum(&t_a, &t_b), &t_c);
    expansion_sign(&det)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_orient2d_clear_cases() {
        let a = DVec2::new(0.0, 0.0);
        let b = DVec2::new(1.0, 0.0);
        assert_eq!(orient2d(a, b, DVec2::new(0.5, 1.0)), Orientation::Positive);
        assert_eq!(orient2d(a, b, DVec2::new(0.5, -1.0)), Orientation::Negative);
        assert_eq!(orient2d(a, b, DVec2::new(2.0, 0.0)), Orientation::Zero);
    }

    #[test]
    fn test_orient2d_near_collinear_is_consistent() {
        // Points on the line y = x perturbed by one ulp: the f64 filter
        // cannot decide, the exact path must.
        let a = DVec2::new(12.0, 12.0);
        let b = DVec2::new(24.0, 24.0);
        let on = DVec2::new(0.5, 0.5);
        assert_eq!(orient2d(a, b, on), Orientation::Zero);
        let above = DVec2::new(0.5, 0.5 + f64::EPSILON * 0.25);
        assert_eq!(orient2d(a, b, above), Orientation::Positive);
    }

    #[test]
    fn test_orient2d_exact_matches_fast_path() {
        let pts = [
            DVec2::new(0.1, 0.7),
            DVec2::new(-2.3, 4.1),
            DVec2::new(3.9, -0.2),
        ];
        assert_eq!(
            orient2d(pts[0], pts[1], pts[2]),
            orient2d_exact(pts[0], pts[1], pts[2])
        );
    }

    #[test]
    fn test_orient2d_antisymmetry() {
        let a = DVec2::new(0.3, 0.9);
        let b = DVec2::new(1.7, 0.2);
        let c = DVec2::new(0.8, 1.4);
        let forward = orient2d(a, b, c);
        let swapped = orient2d(b, a, c);
        assert_eq!(forward, Orientation::Positive);
        assert_eq!(swapped, Orientation::Negative);
    }

    #[test]
    fn test_orient3d_clear_cases() {
        let a = DVec3::new(0.0, 0.0, 0.0);
        let b = DVec3::new(1.0, 0.0, 0.0);
        let c = DVec3::new(0.0, 1.0, 0.0);
        assert_eq!(
            orient3d(a, b, c, DVec3::new(0.2, 0.2, -1.0)),
            Orientation::Positive
        );
        assert_eq!(
            orient3d(a, b, c, DVec3::new(0.2, 0.2, 1.0)),
            Orientation::Negative
        );
        assert_eq!(
            orient3d(a, b, c, DVec3::new(0.2, 0.2, 0.0)),
            Orientation::Zero
        );
    }

    #[test]
    fn test_orient3d_near_coplanar() {
        let a = DVec3::new(1.0, 0.0, 0.0);
        let b = DVec3::new(0.0, 1.0, 0.0);
        let c = DVec3::new(0.0, 0.0, 1.0);
        // On the plane x + y + z = 1.
        let on = DVec3::new(1.0 / 3.0, 1.0 / 3.0, 1.0 - 2.0 / 3.0);
        let result = orient3d(a, b, c, on);
        // 1/3 is not representable, so the point is an ulp off the plane;
        // the exact path must return a definite and reproducible answer.
        assert_eq!(result, orient3d(a, b, c, on));
        assert_eq!(
            orient3d(a, b, c, DVec3::new(0.5, 0.5, 0.0)),
            Orientation::Zero
        );
    }

    #[test]
    fn test_expansion_sum_exactness() {
        // 1 + 2^-80 is not representable in one f64; the expansion keeps it.
        let tiny = (2.0_f64).powi(-80);
        let e = expansion_sum(&[1.0], &[tiny]);
        let total: f64 = e.iter().sum();
        assert_eq!(total, 1.0);
        assert!(e.contains(&tiny));
    }
}
