pub mod aabb;
pub mod tuple;

pub use glam::{DMat2, DMat3, DMat4, DQuat, DVec2, DVec3, DVec4};

pub use aabb::{Aabb2, Aabb3};
pub use tuple::{perp, Tuple};

pub type Point2 = DVec2;
pub type Point3 = DVec3;
pub type Vector2 = DVec2;
pub type Vector3 = DVec3;
