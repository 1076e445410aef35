//! Tetrahedral mesh with point-location and barycentric queries.

use std::collections::HashMap;

use gmk_core::{GmkError, Result};
use gmk_math::DVec3;
use serde::{Deserialize, Serialize};

use crate::predicates::{orient3d, Orientation};

/// A tetrahedral mesh wrapping an externally-produced tetrahedralization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VolumeMesh {
    vertices: Vec<DVec3>,
    tetrahedra: Vec<[usize; 4]>,
    /// `adjacencies[t][i]` is the neighbor across the face opposite
    /// vertex `i` of tetrahedron `t`, `None` at a boundary.
    adjacencies: Vec<[Option<usize>; 4]>,
}

/// Face of tetrahedron `t` opposite local vertex `i` (used as unordered
/// adjacency keys).
const OPPOSITE_FACES: [[usize; 3]; 4] = [[1, 2, 3], [0, 2, 3], [0, 1, 3], [0, 1, 2]];

/// Sign of six times the signed volume of `(a, b, c, d)`.
fn tet_volume_sign(a: DVec3, b: DVec3, c: DVec3, d: DVec3) -> Orientation {
    // det[b - a, c - a, d - a]
    orient3d(b, c, d, a)
}

impl VolumeMesh {
    /// Requires positive-volume tetrahedra over in-range indices; a face
    /// shared by more than two tetrahedra is `Err(Topology)`.
    pub fn new(vertices: Vec<DVec3>, tetrahedra: Vec<[usize; 4]>) -> Result<Self> {
        let mut face_lookup: HashMap<[usize; 3], [Option<usize>; 2]> = HashMap::new();
        for (t, tet) in tetrahedra.iter().enumerate() {
            if tet.iter().any(|&v| v >= vertices.len()) {
                return Err(GmkError::Topology(format!(
                    "tetrahedron {t} references a vertex out of range"
                )));
            }
            let orientation = tet_volume_sign(
                vertices[tet[0]],
                vertices[tet[1]],
                vertices[tet[2]],
                vertices[tet[3]],
            );
            if orientation != Orientation::Positive {
                return Err(GmkError::Geometry(format!(
                    "tetrahedron {t} is degenerate or negatively oriented"
                )));
            }
            for face in OPPOSITE_FACES {
                let mut key = [tet[face[0]], tet[face[1]], tet[face[2]]];
                key.sort_unstable();
                let slots = face_lookup.entry(key).or_insert([None, None]);
                if slots[0].is_none() {
                    slots[0] = Some(t);
                } else if slots[1].is_none() {
                    slots[1] = Some(t);
                } else {
                    return Err(GmkError::Topology(format!(
                        "face ({}, {}, {}) is shared by more than two tetrahedra",
                        key[0], key[1], key[2]
                    )));
                }
            }
        }

        let adjacencies = tetrahedra
            .iter()
            .enumerate()
            .map(|(t, tet)| {
                let mut adj = [None; 4];
                for (i, face) in OPPOSITE_FACES.iter().enumerate() {
                    let mut key = [tet[face[0]], tet[face[1]], tet[face[2]]];
                    key.sort_unstable();
                    let slots = face_lookup[&key];
                    adj[i] = match slots {
                        [Some(a), other] if a == t => other,
                        [first, Some(b)] if b == t => first,
                        _ => None,
                    };
                }
                adj
            })
            .collect();

        Ok(Self {
            vertices,
            tetrahedra,
            adjacencies,
        })
    }

    pub fn vertices(&self) -> &[DVec3] {
        &self.vertices
    }

    pub fn tetrahedra(&self) -> &[[usize; 4]] {
        &self.tetrahedra
    }

    pub fn num_tetrahedra(&self) -> usize {
        self.tetrahedra.len()
    }

    pub fn adjacencies(&self) -> &[[Option<usize>; 4]] {
        &self.adjacencies
    }

    /// Barycentric coordinates of `p` in tetrahedron `t`, `None` when
    /// the tetrahedron is numerically degenerate.
    pub fn barycentrics(&self, t: usize, p: DVec3) -> Option<[f64; 4]> {
        let tet = self.tetrahedra[t];
        barycentrics_3d(
            self.vertices[tet[0]],
            self.vertices[tet[1]],
            self.vertices[tet[2]],
            self.vertices[tet[3]],
            p,
        )
    }

    /// Exactly-decided containment of `p` in tetrahedron `t`: each of the
    /// four sub-tetrahedra obtained by replacing a vertex with `p` must
    /// keep nonnegative volume.
    pub fn tetrahedron_contains(&self, t: usize, p: DVec3) -> bool {
        let tet = self.tetrahedra[t];
        let v = |i: usize| self.vertices[tet[i]];
        tet_volume_sign(p, v(1), v(2), v(3)) != Orientation::Negative
            && tet_volume_sign(v(0), p, v(2), v(3)) != Orientation::Negative
            && tet_volume_sign(v(0), v(1), p, v(3)) != Orientation::Negative
            && tet_volume_sign(v(0), v(1), v(2), p) != Orientation::Negative
    }

    /// Walks from tetrahedron `start` toward `p` through the face whose
    /// barycentric coordinate is most negative, visiting at most
    /// `num_tetrahedra` cells. `None` when the walk leaves the mesh.
    pub fn containing_tetrahedron(&self, p: DVec3, start: usize) -> Option<usize> {
        debug_assert!(start < self.tetrahedra.len());
        let mut t = start;
        for _ in 0..self.tetrahedra.len() {
            let bary = self.barycentrics(t, p)?;
            let mut most_negative = 0usize;
            for i in 1..4 {
                if bary[i] < bary[most_negative] {
                    most_negative = i;
                }
            }
            if bary[most_negative] >= 0.0 || self.tetrahedron_contains(t, p) {
                return Some(t);
            }
            t = self.adjacencies[t][most_negative]?;
        }
        None
    }

    pub fn locate(&self, p: DVec3, start: usize) -> Option<(usize, [f64; 4])> {
        let t = self.containing_tetrahedron(p, start)?;
        Some((t, self.barycentrics(t, p)?))
    }
}

/// 3x3 linear solve (Cramer) for barycentric coordinates of `p` in the
/// tetrahedron `(v0, v1, v2, v3)`.
pub fn barycentrics_3d(
    v0: DVec3,
    v1: DVec3,
    v2: DVec3,
    v3: DVec3,
    p: DVec3,
) -> Option<[f64; 4]> {
    let e1 = v1 - v0;
    let e2 = v2 - v0;
    let e3 = v3 - v0;
    let det = e1.dot(e2.cross(e3));
    if det == 0.0 {
        return None;
    }
    let d = p - v0;
    let b1 = d.dot(e2.cross(e3)) / det;
    let b2 = e1.dot(d.cross(e3)) / det;
    let b3 = e1.dot(e2.cross(d)) / det;
    Some([1.0 - b1 - b2 - b3, b1, b2, b3])
}
