//! Dimension-generic vector abstraction used by the curve/surface evaluators.

use std::ops::{Add, Mul, Neg, Sub};

use glam::{DVec2, DVec3, DVec4};

/// A fixed-size algebraic tuple of reals.
///
/// Implemented for `DVec2`, `DVec3`, and `DVec4` so that curves, surfaces,
/// fitters, and integrators can be written once over the tuple dimension.
pub trait Tuple:
    Copy
    + Default
    + PartialEq
    + std::fmt::Debug
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<f64, Output = Self>
    + Neg<Output = Self>
    + Send
    + Sync
    + 'static
{
    const DIM: usize;

    fn zero() -> Self;
    fn dot(self, other: Self) -> f64;
    fn component(self, i: usize) -> f64;
    fn set_component(&mut self, i: usize, value: f64);

    fn length(self) -> f64 {
        self.dot(self).sqrt()
    }

    fn distance(self, other: Self) -> f64 {
        (self - other).length()
    }

    /// Normalized copy, or the zero tuple when the length underflows.
    fn normalize_or_zero(self) -> Self {
        let len = self.length();
        if len > 0.0 {
            self * (1.0 / len)
        } else {
            Self::zero()
        }
    }
}

macro_rules! impl_tuple {
    ($ty:ty, $dim:expr) => {
        impl Tuple for $ty {
            const DIM: usize = $dim;

            fn zero() -> Self {
                Self::ZERO
            }

            fn dot(self, other: Self) -> f64 {
                <$ty>::dot(self, other)
            }

            fn component(self, i: usize) -> f64 {
                self[i]
            }

            fn set_component(&mut self, i: usize, value: f64) {
                self[i] = value;
            }
        }
    };
}

impl_tuple!(DVec2, 2);
impl_tuple!(DVec3, 3);
impl_tuple!(DVec4, 4);

impl Tuple for f64 {
    const DIM: usize = 1;

    fn zero() -> Self {
        0.0
    }

    fn dot(self, other: Self) -> f64 {
        self * other
    }

    fn component(self, i: usize) -> f64 {
        debug_assert_eq!(i, 0);
        self
    }

    fn set_component(&mut self, i: usize, value: f64) {
        debug_assert_eq!(i, 0);
        *self = value;
    }
}

/// Counterclockwise-to-clockwise perpendicular: `(y, -x)`.
///
/// For a unit tangent this is the Frenet normal convention used by the
/// 2D frame code.
pub fn perp(v: DVec2) -> DVec2 {
    DVec2::new(v.y, -v.x)
}

/// Lift a 2-tuple into 3-space with the extra coordinate appended last.
pub fn hlift(v: DVec2, last: f64) -> DVec3 {
    DVec3::new(v.x, v.y, last)
}

/// Project a 3-tuple back to 2-space by dropping the last coordinate.
pub fn hproject(v: DVec3) -> DVec2 {
    DVec2::new(v.x, v.y)
}

/// Gram-Schmidt orthonormalization in place.
///
/// Returns the smallest diagonal term of the factorization; a value near
/// zero indicates (near-)linear dependence of the inputs.
pub fn orthonormalize(vectors: &mut [DVec3]) -> f64 {
    debug_assert!((1..=3).contains(&vectors.len()));
    let mut min_length = f64::MAX;
    for i in 0..vectors.len() {
        for j in 0..i {
            let dot = vectors[i].dot(vectors[j]);
            vectors[i] -= vectors[j] * dot;
        }
        let len = vectors[i].length();
        min_length = min_length.min(len);
        if len > 0.0 {
            vectors[i] /= len;
        }
    }
    min_length
}

/// A unit vector orthogonal to `v` (which need not be unit length).
pub fn orthogonal(v: DVec3) -> DVec3 {
    // Cross against the axis most orthogonal to v.
    let axis = if v.x.abs() <= v.y.abs() && v.x.abs() <= v.z.abs() {
        DVec3::X
    } else if v.y.abs() <= v.z.abs() {
        DVec3::Y
    } else {
        DVec3::Z
    };
    v.cross(axis).normalize_or_zero()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_tuple_length() {
        let v = DVec3::new(3.0, 4.0, 0.0);
        assert_relative_eq!(Tuple::length(v), 5.0);
        assert_eq!(v.component(1), 4.0);
    }

    #[test]
    fn test_normalize_or_zero_on_zero() {
        assert_eq!(DVec2::ZERO.normalize_or_zero(), DVec2::ZERO);
    }

    #[test]
    fn test_perp_is_clockwise() {
        let p = perp(DVec2::X);
        assert_eq!(p, DVec2::new(0.0, -1.0));
        assert_relative_eq!(p.dot(DVec2::X), 0.0);
    }

    #[test]
    fn test_lift_project_round_trip() {
        let v = DVec2::new(1.5, -2.5);
        assert_eq!(hproject(hlift(v, 7.0)), v);
    }

    #[test]
    fn test_orthonormalize() {
        let mut vs = [
            DVec3::new(1.0, 1.0, 0.0),
            DVec3::new(0.0, 1.0, 1.0),
            DVec3::new(1.0, 0.0, 1.0),
        ];
        let min_len = orthonormalize(&mut vs);
        assert!(min_len > 0.0);
        for i in 0..3 {
            assert_relative_eq!(vs[i].length(), 1.0, epsilon = 1e-12);
            for j in 0..i {
                assert_relative_eq!(vs[i].dot(vs[j]), 0.0, epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn test_orthogonal() {
        for v in [DVec3::X, DVec3::new(0.3, -2.0, 5.0), DVec3::ONE] {
            let o = orthogonal(v);
            assert_relative_eq!(o.length(), 1.0, epsilon = 1e-12);
            assert_relative_eq!(o.dot(v), 0.0, epsilon = 1e-12);
        }
    }
}
