//! Mesh parameterization onto the unit square or inscribed disk.
//!
//! Boundary vertices are pinned to the target outline with
//! arclength-proportional spacing; interior vertices relax under
//! mean-value weights, processed in topological-distance order from the
//! boundary inward.

use std::collections::VecDeque;

use gmk_core::{GmkError, Result};
use gmk_math::{DVec2, DVec3};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::manifold::ManifoldGraph;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BoundaryShape {
    Square,
    Disk,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct UvUnwrapOptions {
    /// Relaxation sweeps over the interior vertices.
    pub iterations: usize,
    pub shape: BoundaryShape,
    /// Process each distance layer with rayon, Jacobi-style within the
    /// layer so no sweep mutates a vertex another thread is reading.
    pub parallel: bool,
}

impl Default for UvUnwrapOptions {
    fn default() -> Self {
        Self {
            iterations: 128,
            shape: BoundaryShape::Square,
            parallel: false,
        }
    }
}

pub struct UvUnwrapper {
    options: UvUnwrapOptions,
}

impl UvUnwrapper {
    pub fn new(options: UvUnwrapOptions) -> Self {
        Self { options }
    }

    /// Computes texture coordinates for a mesh that is topologically a
    /// disk (exactly one closed boundary loop); anything else is
    /// `Err(Topology)`.
    pub fn unwrap(&self, positions: &[DVec3], indices: &[[usize; 3]]) -> Result<Vec<DVec2>> {
        let graph = ManifoldGraph::new(positions.len(), indices)?;
        let boundary = graph.single_boundary_loop()?;

        let distance = distance_transform(&graph, &boundary);
        if distance.iter().any(|d| d.is_none()) {
            return Err(GmkError::Topology(
                "mesh has vertices not connected to the boundary".to_string(),
            ));
        }
        let distance: Vec<usize> = distance.into_iter().map(|d| d.unwrap_or(0)).collect();

        let mut uvs = vec![DVec2::new(0.5, 0.5); positions.len()];
        self.assign_boundary(positions, &boundary, &mut uvs);

        let weights = mean_value_weights(positions, indices);
        let layers = distance_layers(&distance);

        for _ in 0..self.options.iterations {
            for layer in &layers {
                if self.options.parallel {
                    let updates: Vec<(usize, DVec2)> = layer
                        .par_iter()
                        .map(|&v| (v, weighted_average(&weights[v], &uvs)))
                        .collect();
                    for (v, uv) in updates {
                        uvs[v] = uv;
                    }
                } else {
                    for &v in layer {
                        uvs[v] = weighted_average(&weights[v], &uvs);
                    }
                }
            }
        }
        Ok(uvs)
    }

    /// Pins the boundary loop to the outline of the target shape,
    /// spacing vertices proportionally to 3D boundary arclength.
    fn assign_boundary(&self, positions: &[DVec3], boundary: &[usize], uvs: &mut [DVec2]) {
        let n = boundary.len();
        let mut cumulative = vec![0.0; n];
        let mut total = 0.0;
        for i in 0..n {
            cumulative[i] = total;
            let a = positions[boundary[i]];
            let b = positions[boundary[(i + 1) % n]];
            total += a.distance(b);
        }
        for i in 0..n {
            let s = if total > 0.0 {
                cumulative[i] / total
            } else {
                i as f64 / n as f64
            };
            uvs[boundary[i]] = match self.options.shape {
                BoundaryShape::Square => square_outline(s),
                BoundaryShape::Disk => {
                    let angle = std::f64::consts::TAU * s;
                    DVec2::new(0.5 + 0.5 * angle.cos(), 0.5 + 0.5 * angle.sin())
                }
            };
        }
    }
}

/// Point at fraction `s` of the unit-square perimeter, counterclockwise
/// from the origin.
fn square_outline(s: f64) -> DVec2 {
    let p = 4.0 * s.clamp(0.0, 1.0);
    if p < 1.0 {
        DVec2::new(p, 0.0)
    } else if p < 2.0 {
        DVec2::new(1.0, p - 1.0)
    } else if p < 3.0 {
        DVec2::new(3.0 - p, 1.0)
    } else {
        DVec2::new(0.0, 4.0 - p)
    }
}

/// BFS hop count from the boundary; boundary vertices are distance 0.
/// `None` marks vertices the search never reached.
fn distance_transform(graph: &ManifoldGraph, boundary: &[usize]) -> Vec<Option<usize>> {
    let mut distance = vec![None; graph.num_vertices()];
    let mut queue = VecDeque::new();
    for &v in boundary {
        distance[v] = Some(0);
        queue.push_back(v);
    }
    while let Some(v) = queue.pop_front() {
        let next = distance[v].unwrap_or(0) + 1;
        for u in graph.vertex_neighbors(v) {
            if distance[u].is_none() {
                distance[u] = Some(next);
                queue.push_back(u);
            }
        }
    }
    distance
}

/// Interior vertices grouped by increasing distance layer.
fn distance_layers(distance: &[usize]) -> Vec<Vec<usize>> {
    let max = distance.iter().copied().max().unwrap_or(0);
    let mut layers = vec![Vec::new(); max];
    for (v, &d) in distance.iter().enumerate() {
        if d > 0 {
            layers[d - 1].push(v);
        }
    }
    layers.retain(|l| !l.is_empty());
    layers
}

/// Mean-value weights: for each triangle corner with angle `theta`, the
/// two edges spanning the corner each receive `tan(theta / 2) / length`.
fn mean_value_weights(positions: &[DVec3], indices: &[[usize; 3]]) -> Vec<Vec<(usize, f64)>> {
    let mut weights: Vec<Vec<(usize, f64)>> = vec![Vec::new(); positions.len()];
    let mut push = |v: usize, u: usize, w: f64| {
        let list = &mut weights[v];
        match list.iter_mut().find(|(n, _)| *n == u) {
            Some((_, acc)) => *acc += w,
            None => list.push((u, w)),
        }
    };
    for tri in indices {
        for corner in 0..3 {
            let v = tri[corner];
            let a = tri[(corner + 1) % 3];
            let b = tri[(corner + 2) % 3];
            let ea = positions[a] - positions[v];
            let eb = positions[b] - positions[v];
            let la = ea.length();
            let lb = eb.length();
            if la == 0.0 || lb == 0.0 {
                continue;
            }
            let cos = (ea.dot(eb) / (la * lb)).clamp(-1.0, 1.0);
            let sin = (1.0 - cos * cos).sqrt();
            if sin == 0.0 {
                continue;
            }
            let tan_half = (1.0 - cos) / sin;
            push(v, a, tan_half / la);
            push(v, b, tan_half / lb);
        }
    }
    weights
}

fn weighted_average(weights: &[(usize, f64)], uvs: &[DVec2]) -> DVec2 {
    let mut sum = DVec2::ZERO;
    let mut total = 0.0;
    for &(u, w) in weights {
        sum += uvs[u] * w;
        total += w;
    }
    if total > 0.0 {
        sum * (1.0 / total)
    } else {
        DVec2::new(0.5, 0.5)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// `n x n` vertex grid over the xy unit square with a gentle bump in z.
    fn grid_mesh(n: usize) -> (Vec<DVec3>, Vec<[usize; 3]>) {
        let mut positions = Vec::new();
        for row in 0..n {
            for col in 0..n {
                let x = col as f64 / (n - 1) as f64;
                let y = row as f64 / (n - 1) as f64;
                let z = (std::f64::consts::PI * x).sin() * (std::f64::consts::PI * y).sin() * 0.2;
                positions.push(DVec3::new(x, y, z));
            }
        }
        let mut indices = Vec::new();
        for row in 0..n - 1 {
            for col in 0..n - 1 {
                let i = col + n * row;
                indices.push([i, i + 1, i + n + 1]);
                indices.push([i, i + n + 1, i + n]);
            }
        }
        (positions, indices)
    }

    fn on_square_outline(p: DVec2) -> bool {
        let eps = 1e-12;
        (p.x.abs() < eps || (p.x - 1.0).abs() < eps || p.y.abs() < eps || (p.y - 1.0).abs() < eps)
            && (-eps..=1.0 + eps).contains(&p.x)
            && (-eps..=1.0 + eps).contains(&p.y)
    }

    #[test]
    fn test_square_unwrap_pins_boundary_and_fills_interior() {
        let (positions, indices) = grid_mesh(6);
        let unwrapper = UvUnwrapper::new(UvUnwrapOptions::default());
        let uvs = unwrapper.unwrap(&positions, &indices).unwrap();
        let graph = ManifoldGraph::new(positions.len(), &indices).unwrap();
        for (v, &uv) in uvs.iter().enumerate() {
            assert!(uv.x.is_finite() && uv.y.is_finite());
            if graph.is_boundary_vertex(v) {
                assert!(on_square_outline(uv), "boundary vertex {v} off outline: {uv:?}");
            } else {
                assert!(uv.x > 0.0 && uv.x < 1.0 && uv.y > 0.0 && uv.y < 1.0);
            }
        }
    }

    #[test]
    fn test_disk_unwrap_boundary_on_circle() {
        let (positions, indices) = grid_mesh(5);
        let unwrapper = UvUnwrapper::new(UvUnwrapOptions {
            shape: BoundaryShape::Disk,
            ..Default::default()
        });
        let uvs = unwrapper.unwrap(&positions, &indices).unwrap();
        let graph = ManifoldGraph::new(positions.len(), &indices).unwrap();
        for (v, &uv) in uvs.iter().enumerate() {
            let r = uv.distance(DVec2::new(0.5, 0.5));
            if graph.is_boundary_vertex(v) {
                assert_relative_eq!(r, 0.5, epsilon = 1e-12);
            } else {
                assert!(r < 0.5);
            }
        }
    }

    #[test]
    fn test_parallel_unwrap_agrees_on_fixed_point_properties() {
        let (positions, indices) = grid_mesh(6);
        let serial = UvUnwrapper::new(UvUnwrapOptions {
            iterations: 400,
            ..Default::default()
        });
        let parallel = UvUnwrapper::new(UvUnwrapOptions {
            iterations: 400,
            parallel: true,
            ..Default::default()
        });
        let a = serial.unwrap(&positions, &indices).unwrap();
        let b = parallel.unwrap(&positions, &indices).unwrap();
        // Both schedules converge to the same harmonic-like fixed point.
        for (ua, ub) in a.iter().zip(&b) {
            assert_relative_eq!(ua.distance(*ub), 0.0, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_closed_mesh_rejected() {
        let positions = vec![
            DVec3::new(0.0, 0.0, 0.0),
            DVec3::new(1.0, 0.0, 0.0),
            DVec3::new(0.0, 1.0, 0.0),
            DVec3::new(0.0, 0.0, 1.0),
        ];
        let indices = vec![[0, 1, 2], [0, 3, 1], [1, 3, 2], [2, 3, 0]];
        let unwrapper = UvUnwrapper::new(UvUnwrapOptions::default());
        assert!(matches!(
            unwrapper.unwrap(&positions, &indices),
            Err(GmkError::Topology(_))
        ));
    }

    #[test]
    fn test_symmetric_grid_center_maps_to_center() {
        let (positions, indices) = grid_mesh(5);
        let unwrapper = UvUnwrapper::new(UvUnwrapOptions {
            iterations: 300,
            ..Default::default()
        });
        let uvs = unwrapper.unwrap(&positions, &indices).unwrap();
        // Vertex 12 is the center of the 5x5 grid.
        assert_relative_eq!(uvs[12].x, 0.5, epsilon = 1e-3);
        assert_relative_eq!(uvs[12].y, 0.5, epsilon = 1e-3);
    }
}
