//! Planar triangle mesh with point-location and barycentric queries.

use gmk_core::{GmkError, Result, Validate};
use gmk_math::DVec2;
use serde::{Deserialize, Serialize};

use crate::manifold::ManifoldGraph;
use crate::predicates::{orient2d, Orientation};

/// A planar triangle mesh wrapping an externally-produced triangulation.
/// The mesh makes no Delaunay claim; it answers containment and
/// barycentric queries against the triangles it was given.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanarMesh {
    vertices: Vec<DVec2>,
    triangles: Vec<[usize; 3]>,
    /// `adjacencies[t][i]` is the neighbor across the edge opposite
    /// vertex `i` of triangle `t`, `None` at a boundary.
    adjacencies: Vec<[Option<usize>; 3]>,
}

impl PlanarMesh {
    /// Requires counterclockwise triangles over in-range vertex indices;
    /// a non-manifold edge is `Err(Topology)`.
    pub fn new(vertices: Vec<DVec2>, triangles: Vec<[usize; 3]>) -> Result<Self> {
        let graph = ManifoldGraph::new(vertices.len(), &triangles)?;
        for (t, tri) in triangles.iter().enumerate() {
            let orientation = orient2d(
                vertices[tri[0]],
                vertices[tri[1]],
                vertices[tri[2]],
            );
            if orientation != Orientation::Positive {
                return Err(GmkError::Geometry(format!(
                    "triangle {t} is not counterclockwise"
                )));
            }
        }
        let adjacencies = triangles
            .iter()
            .enumerate()
            .map(|(t, tri)| {
                [
                    graph.neighbor_across(t, tri[1], tri[2]),
                    graph.neighbor_across(t, tri[2], tri[0]),
                    graph.neighbor_across(t, tri[0], tri[1]),
                ]
            })
            .collect();
        Ok(Self {
            vertices,
            triangles,
            adjacencies,
        })
    }

    pub fn vertices(&self) -> &[DVec2] {
        &self.vertices
    }

    pub fn triangles(&self) -> &[[usize; 3]] {
        &self.triangles
    }

    pub fn num_triangles(&self) -> usize {
        self.triangles.len()
    }

    pub fn adjacencies(&self) -> &[[Option<usize>; 3]] {
        &self.adjacencies
    }

    /// Barycentric coordinates of `p` in triangle `t`, `None` when the
    /// triangle is numerically degenerate.
    pub fn barycentrics(&self, t: usize, p: DVec2) -> Option<[f64; 3]> {
        let tri = self.triangles[t];
        let v0 = self.vertices[tri[0]];
        let v1 = self.vertices[tri[1]];
        let v2 = self.vertices[tri[2]];
        barycentrics_2d(v0, v1, v2, p)
    }

    /// Exactly-decided containment of `p` in triangle `t`: `p` is inside
    /// or on the border iff it is not strictly right of any directed edge.
    pub fn triangle_contains(&self, t: usize, p: DVec2) -> bool {
        let tri = self.triangles[t];
        (0..3).all(|i| {
            let a = self.vertices[tri[i]];
            let b = self.vertices[tri[(i + 1) % 3]];
            orient2d(a, b, p) != Orientation::Negative
        })
    }

    /// Walks from triangle `start` toward `p`, stepping through the edge
    /// whose barycentric coordinate is most negative. The walk visits at
    /// most `num_triangles` triangles. Returns `None` when the walk
    /// leaves the mesh, which can also happen for points inside a
    /// non-convex mesh whose walk path crosses a concavity.
    pub fn containing_triangle(&self, p: DVec2, start: usize) -> Option<usize> {
        debug_assert!(start < self.triangles.len());
        let mut t = start;
        for _ in 0..self.triangles.len() {
            let bary = self.barycentrics(t, p)?;
            let mut most_negative = 0usize;
            for i in 1..3 {
                if bary[i] < bary[most_negative] {
                    most_negative = i;
                }
            }
            if bary[most_negative] >= 0.0 || self.triangle_contains(t, p) {
                return Some(t);
            }
            t = self.adjacencies[t][most_negative]?;
        }
        None
    }

    /// Containment plus the barycentric coordinates of the hit.
    pub fn locate(&self, p: DVec2, start: usize) -> Option<(usize, [f64; 3])> {
        let t = self.containing_triangle(p, start)?;
        Some((t, self.barycentrics(t, p)?))
    }
}

impl Validate for PlanarMesh {
    fn validate(&self) -> Result<()> {
        if self.adjacencies.len() != self.triangles.len() {
            return Err(GmkError::Topology(
                "adjacency table does not match the triangle count".to_string(),
            ));
        }
        for (t, tri) in self.triangles.iter().enumerate() {
            if tri.iter().any(|&v| v >= self.vertices.len()) {
                return Err(GmkError::Topology(format!(
                    "triangle {t} references a vertex out of range"
                )));
            }
            let orientation = orient2d(
                self.vertices[tri[0]],
                self.vertices[tri[1]],
                self.vertices[tri[2]],
            );
            if orientation != Orientation::Positive {
                return Err(GmkError::Geometry(format!(
                    "triangle {t} is not counterclockwise"
                )));
            }
            // Adjacency must be reciprocal.
            for neighbor in self.adjacencies[t].iter().flatten() {
                if !self.adjacencies[*neighbor].contains(&Some(t)) {
                    return Err(GmkError::Topology(format!(
                        "triangles {t} and {neighbor} disagree on adjacency"
                    )));
                }
            }
        }
        Ok(())
    }
}

/// 2x2 linear solve for barycentric coordinates `(b0, b1, b2)` with
/// `p = b0 v0 + b1 v1 + b2 v2` and `b0 + b1 + b2 = 1`.
pub fn barycentrics_2d(v0: DVec2, v1: DVec2, v2: DVec2, p: DVec2) -> Option<[f64; 3]> {
    let e1 = v1 - v0;
    let e2 = v2 - v0;
    let det = e1.x * e2.y - e1.y * e2.x;
    if det == 0.0 {
        return None;
    }
    let d = p - v0;
    let b1 = (d.x * e2.y - d.y * e2.x) / det;
    let b2 = (e1.x * d.y - e1.y * d.x) / det;
    Some([1.0 - b1 - b2, b1, b2])
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    // Unit-square-like mesh: four CCW triangles fanned around the center.
    fn fan_mesh() -> PlanarMesh {
        let vertices = vec![
            DVec2::new(1.0, 1.0),
            DVec2::new(0.0, 0.0),
            DVec2::new(2.0, 0.0),
            DVec2::new(2.0, 2.0),
            DVec2::new(0.0, 2.0),
        ];
        let triangles = vec![[0, 1, 2], [0, 2, 3], [0, 3, 4], [0, 4, 1]];
        PlanarMesh::new(vertices, triangles).unwrap()
    }

    #[test]
    fn test_fan_mesh_validates() {
        fan_mesh().validate().unwrap();
    }

    #[test]
    fn test_vertex_barycentric_identity() {
        let mesh = fan_mesh();
        let bary = mesh.barycentrics(0, mesh.vertices()[1]).unwrap();
        assert_relative_eq!(bary[0], 0.0, epsilon = 1e-14);
        assert_relative_eq!(bary[1], 1.0, epsilon = 1e-14);
        assert_relative_eq!(bary[2], 0.0, epsilon = 1e-14);
    }

    #[test]
    fn test_centroid_is_contained() {
        let mesh = fan_mesh();
        for t in 0..mesh.num_triangles() {
            let tri = mesh.triangles()[t];
            let centroid = (mesh.vertices()[tri[0]]
                + mesh.vertices()[tri[1]]
                + mesh.vertices()[tri[2]])
                * (1.0 / 3.0);
            // The walk must find the centroid from any starting triangle.
            for start in 0..mesh.num_triangles() {
                assert_eq!(mesh.containing_triangle(centroid, start), Some(t));
            }
        }
    }

    #[test]
    fn test_barycentrics_reconstruct_point() {
        let mesh = fan_mesh();
        let p = DVec2::new(1.2, 0.4);
        let (t, bary) = mesh.locate(p, 2).unwrap();
        let tri = mesh.triangles()[t];
        let q = mesh.vertices()[tri[0]] * bary[0]
            + mesh.vertices()[tri[1]] * bary[1]
            + mesh.vertices()[tri[2]] * bary[2];
        assert_relative_eq!(p.distance(q), 0.0, epsilon = 1e-13);
        assert_relative_eq!(bary[0] + bary[1] + bary[2], 1.0, epsilon = 1e-13);
    }

    #[test]
    fn test_point_outside_returns_none() {
        let mesh = fan_mesh();
        assert_eq!(mesh.containing_triangle(DVec2::new(10.0, 10.0), 0), None);
        assert_eq!(mesh.containing_triangle(DVec2::new(0.0, -5.0), 1), None);
    }

    #[test]
    fn test_shared_edge_point_found_from_either_side() {
        let mesh = fan_mesh();
        // Midpoint of the edge shared by triangles 0 and 1.
        let p = DVec2::new(1.5, 0.5);
        assert!(mesh.containing_triangle(p, 3).is_some());
    }

    #[test]
    fn test_clockwise_triangle_rejected() {
        let vertices = vec![
            DVec2::new(0.0, 0.0),
            DVec2::new(1.0, 0.0),
            DVec2::new(0.0, 1.0),
        ];
        assert!(PlanarMesh::new(vertices, vec![[0, 2, 1]]).is_err());
    }

    #[test]
    fn test_degenerate_barycentrics_none() {
        let v = DVec2::new(1.0, 1.0);
        assert!(barycentrics_2d(v, v, v, DVec2::ZERO).is_none());
    }
}
