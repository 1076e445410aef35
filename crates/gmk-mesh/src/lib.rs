//! GMK meshes: robust predicates, manifold connectivity, planar and
//! volumetric point-location meshes, and UV unwrapping.

pub mod manifold;
pub mod planar;
pub mod predicates;
pub mod uv;
pub mod volumetric;

pub use manifold::{Edge, EdgeId, ManifoldGraph};
pub use planar::PlanarMesh;
pub use predicates::{orient2d, orient3d, Orientation};
pub use uv::{BoundaryShape, UvUnwrapOptions, UvUnwrapper};
pub use volumetric::VolumeMesh;
