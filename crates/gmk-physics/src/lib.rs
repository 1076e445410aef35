//! Numerical simulation of particles, mass-spring networks, and rigid
//! bodies, all built on a shared fourth-order Runge-Kutta stepper.

pub mod mass_spring;
pub mod ode;
pub mod particle;
pub mod rigid;

pub use mass_spring::{MassSpringCurve, MassSpringSurface};
pub use ode::RungeKutta4;
pub use particle::ParticleSystem;
pub use rigid::{RigidBody, RigidBodyState};
