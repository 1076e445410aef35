//! GMK geometry: B-spline basis functions, parametric curves and surfaces,
//! least-squares fitting, and differential-geometry frames.

pub mod basis;
pub mod curve;
pub mod fit;
pub mod frame;
pub mod surface;

pub use basis::{BasisEval, BasisFunction};
pub use curve::{ArcLength, ParametricCurve};
pub use fit::{BSplineCurveFit, BSplineSurfaceFit};
pub use frame::{DarbouxFrame3, FrenetFrame2, FrenetFrame3, PrincipalCurvatures};
pub use surface::ParametricSurface;
