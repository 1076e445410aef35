/// Tolerance bundle for geometric and numerical comparisons.
#[derive(Debug, Clone, Copy, serde::Serialize, serde::Deserialize)]
pub struct Tolerance {
    /// Distance comparisons, in model units
    pub linear: f64,
    /// Angle comparisons, in radians
    pub angular: f64,
    /// Parameter-space comparisons (curve/surface domains)
    pub parametric: f64,
}

impl Tolerance {
    pub const DEFAULT_LINEAR: f64 = 1e-8;
    pub const DEFAULT_ANGULAR: f64 = 1e-10;
    pub const DEFAULT_PARAMETRIC: f64 = 1e-12;

    pub fn new(linear: f64, angular: f64, parametric: f64) -> Self {
        Self {
            linear,
            angular,
            parametric,
        }
    }

    pub fn default_precision() -> Self {
        Self {
            linear: Self::DEFAULT_LINEAR,
            angular: Self::DEFAULT_ANGULAR,
            parametric: Self::DEFAULT_PARAMETRIC,
        }
    }

    pub fn loose() -> Self {
        Self {
            linear: 1e-5,
            angular: 1e-7,
            parametric: 1e-9,
        }
    }

    pub fn tight() -> Self {
        Self {
            linear: 1e-12,
            angular: 1e-14,
            parametric: 1e-15,
        }
    }

    pub fn is_zero(self, v: f64) -> bool {
        v.abs() < self.linear
    }

    pub fn linear_eq(self, a: f64, b: f64) -> bool {
        (a - b).abs() < self.linear
    }

    pub fn angular_eq(self, a: f64, b: f64) -> bool {
        (a - b).abs() < self.angular
    }

    pub fn parametric_eq(self, a: f64, b: f64) -> bool {
        (a - b).abs() < self.parametric
    }
}

impl Default for Tolerance {
    fn default() -> Self {
        Self::default_precision()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_tighter_than_loose() {
        let d = Tolerance::default();
        let l = Tolerance::loose();
        assert!(d.linear < l.linear);
        assert!(d.angular < l.angular);
    }

    #[test]
    fn test_is_zero() {
        let tol = Tolerance::default();
        assert!(tol.is_zero(1e-12));
        assert!(!tol.is_zero(1e-3));
    }
}
