//! Particle systems advanced by RK4 over coupled position/velocity state.

use gmk_core::{GmkError, Result};
use gmk_math::Tuple;

/// A collection of point masses under a caller-supplied acceleration.
/// A particle with infinite mass is pinned: it never moves.
pub struct ParticleSystem<V: Tuple> {
    masses: Vec<f64>,
    inv_masses: Vec<f64>,
    positions: Vec<V>,
    velocities: Vec<V>,
    step: f64,
    half_step: f64,
    sixth_step: f64,
}

impl<V: Tuple> ParticleSystem<V> {
    pub fn new(masses: Vec<f64>, positions: Vec<V>, step: f64) -> Result<Self> {
        if masses.is_empty() || masses.len() != positions.len() {
            return Err(GmkError::Construction(format!(
                "expected matching nonempty masses and positions, got {} and {}",
                masses.len(),
                positions.len()
            )));
        }
        if masses.iter().any(|&m| m <= 0.0) {
            return Err(GmkError::Construction(
                "particle masses must be positive (infinite pins a particle)".to_string(),
            ));
        }
        if step <= 0.0 {
            return Err(GmkError::Construction(
                "integration step must be positive".to_string(),
            ));
        }
        let inv_masses = masses
            .iter()
            .map(|&m| if m.is_finite() { 1.0 / m } else { 0.0 })
            .collect();
        let n = masses.len();
        Ok(Self {
            masses,
            inv_masses,
            positions,
            velocities: vec![V::zero(); n],
            step,
            half_step: 0.5 * step,
            sixth_step: step / 6.0,
        })
    }

    pub fn len(&self) -> usize {
        self.masses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.masses.is_empty()
    }

    pub fn mass(&self, i: usize) -> f64 {
        self.masses[i]
    }

    pub fn is_pinned(&self, i: usize) -> bool {
        self.inv_masses[i] == 0.0
    }

    pub fn positions(&self) -> &[V] {
        &self.positions
    }

    pub fn velocities(&self) -> &[V] {
        &self.velocities
    }

    pub fn set_position(&mut self, i: usize, p: V) {
        self.positions[i] = p;
    }

    pub fn set_velocity(&mut self, i: usize, v: V) {
        self.velocities[i] = v;
    }

    pub fn step_size(&self) -> f64 {
        self.step
    }

    /// Advances all particles one RK4 step. `accel` is evaluated at the
    /// intermediate states: `accel(i, time, positions, velocities)` must
    /// return the acceleration of particle `i`.
    pub fn update<F>(&mut self, time: f64, accel: F)
    where
        F: Fn(usize, f64, &[V], &[V]) -> V,
    {
        let n = self.len();
        let evaluate = |t: f64, pos: &[V], vel: &[V]| -> (Vec<V>, Vec<V>) {
            let dp: Vec<V> = (0..n)
                .map(|i| if self.is_pinned(i) { V::zero() } else { vel[i] })
                .collect();
            let dv: Vec<V> = (0..n)
                .map(|i| {
                    if self.is_pinned(i) {
                        V::zero()
                    } else {
                        accel(i, t, pos, vel)
                    }
                })
                .collect();
            (dp, dv)
        };
        let advance = |pos: &[V], vel: &[V], dp: &[V], dv: &[V], h: f64| -> (Vec<V>, Vec<V>) {
            (
                (0..n).map(|i| pos[i] + dp[i] * h).collect(),
                (0..n).map(|i| vel[i] + dv[i] * h).collect(),
            )
        };

        let (dp1, dv1) = evaluate(time, &self.positions, &self.velocities);
        let (p2, v2) = advance(&self.positions, &self.velocities, &dp1, &dv1, self.half_step);
        let (dp2, dv2) = evaluate(time + self.half_step, &p2, &v2);
        let (p3, v3) = advance(&self.positions, &self.velocities, &dp2, &dv2, self.half_step);
        let (dp3, dv3) = evaluate(time + self.half_step, &p3, &v3);
        let (p4, v4) = advance(&self.positions, &self.velocities, &dp3, &dv3, self.step);
        let (dp4, dv4) = evaluate(time + self.step, &p4, &v4);

        for i in 0..n {
            if self.is_pinned(i) {
                continue;
            }
            self.positions[i] = self.positions[i]
                + (dp1[i] + dp2[i] * 2.0 + dp3[i] * 2.0 + dp4[i]) * self.sixth_step;
            self.velocities[i] = self.velocities[i]
                + (dv1[i] + dv2[i] * 2.0 + dv3[i] * 2.0 + dv4[i]) * self.sixth_step;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use gmk_math::DVec3;

    #[test]
    fn test_free_fall_matches_closed_form() {
        let gravity = DVec3::new(0.0, -9.81, 0.0);
        let mut system =
            ParticleSystem::new(vec![2.0], vec![DVec3::new(0.0, 100.0, 0.0)], 0.01).unwrap();
        let mut t = 0.0;
        for _ in 0..100 {
            system.update(t, |_, _, _, _| gravity);
            t += system.step_size();
        }
        // y(1) = 100 - g/2.
        assert_relative_eq!(
            system.positions()[0].y,
            100.0 - 0.5 * 9.81,
            epsilon = 1e-9
        );
        assert_relative_eq!(system.velocities()[0].y, -9.81, epsilon = 1e-9);
    }

    #[test]
    fn test_pinned_particle_never_moves() {
        let start = DVec3::new(1.0, 2.0, 3.0);
        let mut system = ParticleSystem::new(
            vec![f64::INFINITY, 1.0],
            vec![start, DVec3::ZERO],
            0.05,
        )
        .unwrap();
        for k in 0..20 {
            system.update(k as f64 * 0.05, |_, _, _, _| DVec3::new(0.0, -9.81, 0.0));
        }
        assert_eq!(system.positions()[0], start);
        assert!(system.is_pinned(0));
        assert!(!system.is_pinned(1));
    }

    #[test]
    fn test_harmonic_oscillator_energy() {
        // Unit mass on a unit spring: period 2*pi, energy conserved.
        let mut system =
            ParticleSystem::new(vec![1.0], vec![DVec3::new(1.0, 0.0, 0.0)], 0.001).unwrap();
        let energy = |s: &ParticleSystem<DVec3>| {
            0.5 * s.velocities()[0].dot(s.velocities()[0])
                + 0.5 * s.positions()[0].dot(s.positions()[0])
        };
        let initial = energy(&system);
        let mut t = 0.0;
        for _ in 0..1000 {
            system.update(t, |i, _, pos, _| -pos[i]);
            t += system.step_size();
        }
        assert_relative_eq!(energy(&system), initial, epsilon = 1e-9);
    }

    #[test]
    fn test_rejects_invalid_construction() {
        assert!(ParticleSystem::<DVec3>::new(vec![], vec![], 0.1).is_err());
        assert!(ParticleSystem::new(vec![-1.0], vec![DVec3::ZERO], 0.1).is_err());
        assert!(ParticleSystem::new(vec![1.0], vec![DVec3::ZERO], 0.0).is_err());
    }
}
