//! Rigid body dynamics with quaternion orientation.

use gmk_core::{GmkError, Result};
use gmk_math::{DMat3, DQuat, DVec3};

/// Kinematic state of a rigid body, including the derived quantities
/// force and torque closures may want.
#[derive(Debug, Clone, Copy)]
pub struct RigidBodyState {
    pub position: DVec3,
    pub orientation: DQuat,
    pub linear_momentum: DVec3,
    pub angular_momentum: DVec3,
    pub linear_velocity: DVec3,
    pub angular_velocity: DVec3,
}

type VectorFn = Box<dyn Fn(f64, &RigidBodyState) -> DVec3>;

/// A rigid body advanced by a manual RK4 step over the coupled
/// position/orientation/momentum state. The orientation quaternion is
/// renormalized after every step.
pub struct RigidBody {
    mass: f64,
    inv_mass: f64,
    body_inertia_inv: DMat3,
    state: RigidBodyState,
    force: VectorFn,
    torque: VectorFn,
}

impl RigidBody {
    pub fn new(mass: f64, body_inertia: DMat3) -> Result<Self> {
        if !(mass > 0.0 && mass.is_finite()) {
            return Err(GmkError::Construction(
                "rigid body mass must be positive and finite".to_string(),
            ));
        }
        if body_inertia.determinant() == 0.0 {
            return Err(GmkError::Construction(
                "body inertia tensor must be invertible".to_string(),
            ));
        }
        let mut body = Self {
            mass,
            inv_mass: 1.0 / mass,
            body_inertia_inv: body_inertia.inverse(),
            state: RigidBodyState {
                position: DVec3::ZERO,
                orientation: DQuat::IDENTITY,
                linear_momentum: DVec3::ZERO,
                angular_momentum: DVec3::ZERO,
                linear_velocity: DVec3::ZERO,
                angular_velocity: DVec3::ZERO,
            },
            force: Box::new(|_, _| DVec3::ZERO),
            torque: Box::new(|_, _| DVec3::ZERO),
        };
        body.refresh_derived();
        Ok(body)
    }

    pub fn mass(&self) -> f64 {
        self.mass
    }

    pub fn state(&self) -> &RigidBodyState {
        &self.state
    }

    pub fn set_position(&mut self, position: DVec3) {
        self.state.position = position;
    }

    pub fn set_orientation(&mut self, orientation: DQuat) {
        self.state.orientation = orientation.normalize();
        self.refresh_derived();
    }

    pub fn set_linear_momentum(&mut self, momentum: DVec3) {
        self.state.linear_momentum = momentum;
        self.refresh_derived();
    }

    pub fn set_angular_momentum(&mut self, momentum: DVec3) {
        self.state.angular_momentum = momentum;
        self.refresh_derived();
    }

    pub fn set_force<F>(&mut self, force: F)
    where
        F: Fn(f64, &RigidBodyState) -> DVec3 + 'static,
    {
        self.force = Box::new(force);
    }

    pub fn set_torque<F>(&mut self, torque: F)
    where
        F: Fn(f64, &RigidBodyState) -> DVec3 + 'static,
    {
        self.torque = Box::new(torque);
    }

    /// World-space inverse inertia for an orientation.
    fn world_inertia_inv(&self, orientation: DQuat) -> DMat3 {
        let rot = DMat3::from_quat(orientation);
        rot * self.body_inertia_inv * rot.transpose()
    }

    fn refresh_derived(&mut self) {
        self.state.linear_velocity = self.state.linear_momentum * self.inv_mass;
        self.state.angular_velocity =
            self.world_inertia_inv(self.state.orientation) * self.state.angular_momentum;
    }

    /// Derivative of the state under the current force/torque closures.
    fn derivative(&self, t: f64, s: &RigidBodyState) -> (DVec3, DQuat, DVec3, DVec3) {
        let dq = DQuat::from_xyzw(
            s.angular_velocity.x,
            s.angular_velocity.y,
            s.angular_velocity.z,
            0.0,
        ) * s.orientation
            * 0.5;
        (
            s.linear_velocity,
            dq,
            (self.force)(t, s),
            (self.torque)(t, s),
        )
    }

    /// State advanced by `h` along a derivative, with the orientation
    /// renormalized and derived velocities refreshed.
    fn advanced(&self, s: &RigidBodyState, d: &(DVec3, DQuat, DVec3, DVec3), h: f64) -> RigidBodyState {
        let orientation = (s.orientation + d.1 * h).normalize();
        let linear_momentum = s.linear_momentum + d.2 * h;
        let angular_momentum = s.angular_momentum + d.3 * h;
        RigidBodyState {
            position: s.position + d.0 * h,
            orientation,
            linear_momentum,
            angular_momentum,
            linear_velocity: linear_momentum * self.inv_mass,
            angular_velocity: self.world_inertia_inv(orientation) * angular_momentum,
        }
    }

    /// One RK4 step of size `dt` starting at time `t`.
    pub fn update(&mut self, t: f64, dt: f64) {
        let half = 0.5 * dt;
        let s0 = self.state;
        let k1 = self.derivative(t, &s0);
        let s1 = self.advanced(&s0, &k1, half);
        let k2 = self.derivative(t + half, &s1);
        let s2 = self.advanced(&s0, &k2, half);
        let k3 = self.derivative(t + half, &s2);
        let s3 = self.advanced(&s0, &k3, dt);
        let k4 = self.derivative(t + dt, &s3);

        let sixth = dt / 6.0;
        self.state.position = s0.position + (k1.0 + (k2.0 + k3.0) * 2.0 + k4.0) * sixth;
        self.state.orientation =
            (s0.orientation + (k1.1 + (k2.1 + k3.1) * 2.0 + k4.1) * sixth).normalize();
        self.state.linear_momentum =
            s0.linear_momentum + (k1.2 + (k2.2 + k3.2) * 2.0 + k4.2) * sixth;
        self.state.angular_momentum =
            s0.angular_momentum + (k1.3 + (k2.3 + k3.3) * 2.0 + k4.3) * sixth;
        self.refresh_derived();
    }
}
