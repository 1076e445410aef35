//! Mass-spring models: particle chains (rope) and grids (cloth).

use gmk_core::{GmkError, Result};
use gmk_math::Tuple;

use crate::particle::ParticleSystem;

/// Hooke spring acceleration contribution on the particle at `p` from a
/// neighbor at `q`.
fn spring_accel<V: Tuple>(p: V, q: V, constant: f64, rest_length: f64, inv_mass: f64) -> V {
    let d = q - p;
    let len = d.length();
    if len == 0.0 {
        return V::zero();
    }
    d * (constant * (len - rest_length) / len * inv_mass)
}

/// A chain of particles joined by springs, pinned wherever the caller
/// supplies infinite mass.
pub struct MassSpringCurve<V: Tuple> {
    system: ParticleSystem<V>,
    /// Spring `i` joins particles `i` and `i + 1`.
    constants: Vec<f64>,
    lengths: Vec<f64>,
}

impl<V: Tuple> MassSpringCurve<V> {
    pub fn new(
        masses: Vec<f64>,
        positions: Vec<V>,
        constants: Vec<f64>,
        lengths: Vec<f64>,
        step: f64,
    ) -> Result<Self> {
        let n = masses.len();
        if n < 2 || constants.len() != n - 1 || lengths.len() != n - 1 {
            return Err(GmkError::Construction(format!(
                "a chain of {n} particles requires {} springs, got {} constants and {} lengths",
                n.saturating_sub(1),
                constants.len(),
                lengths.len()
            )));
        }
        if constants.iter().any(|&c| c < 0.0) || lengths.iter().any(|&l| l < 0.0) {
            return Err(GmkError::Construction(
                "spring constants and rest lengths must be nonnegative".to_string(),
            ));
        }
        Ok(Self {
            system: ParticleSystem::new(masses, positions, step)?,
            constants,
            lengths,
        })
    }

    pub fn system(&self) -> &ParticleSystem<V> {
        &self.system
    }

    pub fn system_mut(&mut self) -> &mut ParticleSystem<V> {
        &mut self.system
    }

    /// Advances one step under spring forces plus `external`
    /// acceleration.
    pub fn update<F>(&mut self, time: f64, external: F)
    where
        F: Fn(usize, f64, &[V], &[V]) -> V,
    {
        let constants = &self.constants;
        let lengths = &self.lengths;
        let n = self.system.len();
        let inv_masses: Vec<f64> = (0..n)
            .map(|i| {
                let m = self.system.mass(i);
                if m.is_finite() {
                    1.0 / m
                } else {
                    0.0
                }
            })
            .collect();
        self.system.update(time, |i, t, pos, vel| {
            let mut a = external(i, t, pos, vel);
            if i > 0 {
                a = a + spring_accel(pos[i], pos[i - 1], constants[i - 1], lengths[i - 1], inv_masses[i]);
            }
            if i + 1 < n {
                a = a + spring_accel(pos[i], pos[i + 1], constants[i], lengths[i], inv_masses[i]);
            }
            a
        });
    }
}

/// A rows x cols particle grid with springs along both grid directions.
pub struct MassSpringSurface<V: Tuple> {
    system: ParticleSystem<V>,
    rows: usize,
    cols: usize,
    /// Springs joining `(r, c)` to `(r + 1, c)`, row-major.
    row_constants: Vec<f64>,
    row_lengths: Vec<f64>,
    /// Springs joining `(r, c)` to `(r, c + 1)`, row-major.
    col_constants: Vec<f64>,
    col_lengths: Vec<f64>,
}

impl<V: Tuple> MassSpringSurface<V> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        rows: usize,
        cols: usize,
        masses: Vec<f64>,
        positions: Vec<V>,
        row_constants: Vec<f64>,
        row_lengths: Vec<f64>,
        col_constants: Vec<f64>,
        col_lengths: Vec<f64>,
        step: f64,
    ) -> Result<Self> {
        if rows < 2 || cols < 2 || masses.len() != rows * cols {
            return Err(GmkError::Construction(format!(
                "expected a grid of at least 2x2 particles, got {rows}x{cols} with {} masses",
                masses.len()
            )));
        }
        let num_row_springs = (rows - 1) * cols;
        let num_col_springs = rows * (cols - 1);
        if row_constants.len() != num_row_springs
            || row_lengths.len() != num_row_springs
            || col_constants.len() != num_col_springs
            || col_lengths.len() != num_col_springs
        {
            return Err(GmkError::Construction(
                "spring arrays do not match the grid dimensions".to_string(),
            ));
        }
        Ok(Self {
            system: ParticleSystem::new(masses, positions, step)?,
            rows,
            cols,
            row_constants,
            row_lengths,
            col_constants,
            col_lengths,
        })
    }

    pub fn system(&self) -> &ParticleSystem<V> {
        &self.system
    }

    pub fn system_mut(&mut self) -> &mut ParticleSystem<V> {
        &mut self.system
    }

    pub fn index(&self, row: usize, col: usize) -> usize {
        col + self.cols * row
    }

    pub fn update<F>(&mut self, time: f64, external: F)
    where
        F: Fn(usize, f64, &[V], &[V]) -> V,
    {
        let (rows, cols) = (self.rows, self.cols);
        let row_constants = &self.row_constants;
        let row_lengths = &self.row_lengths;
        let col_constants = &self.col_constants;
        let col_lengths = &self.col_lengths;
        let n = self.system.len();
        let inv_masses: Vec<f64> = (0..n)
            .map(|i| {
                let m = self.system.mass(i);
                if m.is_finite() {
                    1.0 / m
                } else {
                    0.0
                }
            })
            .collect();
        self.system.update(time, |i, t, pos, vel| {
            let (row, col) = (i / cols, i % cols);
            let mut a = external(i, t, pos, vel);
            // Row springs join (r, c) with (r +/- 1, c).
            if row > 0 {
                let s = col + cols * (row - 1);
                a = a + spring_accel(pos[i], pos[i - cols], row_constants[s], row_lengths[s], inv_masses[i]);
            }
            if row + 1 < rows {
                let s = col + cols * row;
                a = a + spring_accel(pos[i], pos[i + cols], row_constants[s], row_lengths[s], inv_masses[i]);
            }
            // Column springs join (r, c) with (r, c +/- 1).
            if col > 0 {
                let s = (col - 1) + (cols - 1) * row;
                a = a + spring_accel(pos[i], pos[i - 1], col_constants[s], col_lengths[s], inv_masses[i]);
            }
            if col + 1 < cols {
                let s = col + (cols - 1) * row;
                a = a + spring_accel(pos[i], pos[i + 1], col_constants[s], col_lengths[s], inv_masses[i]);
            }
            a
        });
    }
}
