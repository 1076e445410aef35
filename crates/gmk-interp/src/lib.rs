//! GMK interpolation: scattered-data simplex schemes over query meshes,
//! Akima and cubic grid interpolation, and thin-plate splines.

pub mod akima;
pub mod bicubic;
pub mod linear;
pub mod quadratic;
pub mod thinplate;
pub mod tricubic;

pub use akima::AkimaUniform1;
pub use bicubic::{Bicubic2, CubicBlend};
pub use linear::{LinearNonuniform2, LinearNonuniform3};
pub use quadratic::{Jet2, QuadraticNonuniform2};
pub use thinplate::{ThinPlateSpline2, ThinPlateSpline3};
pub use tricubic::Tricubic3;
