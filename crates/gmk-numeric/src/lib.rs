//! Numerical utilities shared by the geometry and interpolation crates.

pub mod banded;
pub mod integrate;
pub mod roots;

pub use banded::SymmetricBandedMatrix;
