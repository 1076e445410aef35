//! Edge-triangle manifold graph over an indexed triangle set.

use std::collections::HashMap;

use gmk_core::{GmkError, Result, Validate};
use slotmap::{new_key_type, SlotMap};

new_key_type! {
    pub struct EdgeId;
}

/// An undirected edge record. At most two incident triangles per edge
/// (manifold condition, enforced at construction).
#[derive(Debug, Clone, Copy)]
pub struct Edge {
    /// Endpoints with `v[0] < v[1]`.
    pub v: [usize; 2],
    pub triangles: [Option<usize>; 2],
}

impl Edge {
    pub fn is_boundary(&self) -> bool {
        self.triangles[1].is_none()
    }
}

/// Edge-triangle connectivity of an indexed triangle mesh.
///
/// Construction rejects out-of-range indices, degenerate triangles, and
/// edges shared by more than two triangles.
#[derive(Debug, Clone)]
pub struct ManifoldGraph {
    num_vertices: usize,
    triangles: Vec<[usize; 3]>,
    edges: SlotMap<EdgeId, Edge>,
    edge_lookup: HashMap<(usize, usize), EdgeId>,
    /// Edges incident to each vertex.
    vertex_edges: Vec<Vec<EdgeId>>,
}

impl ManifoldGraph {
    pub fn new(num_vertices: usize, triangles: &[[usize; 3]]) -> Result<Self> {
        let mut graph = Self {
            num_vertices,
            triangles: triangles.to_vec(),
            edges: SlotMap::with_key(),
            edge_lookup: HashMap::new(),
            vertex_edges: vec![Vec::new(); num_vertices],
        };
        for (t, tri) in triangles.iter().enumerate() {
            if tri.iter().any(|&v| v >= num_vertices) {
                return Err(GmkError::Topology(format!(
                    "triangle {t} references a vertex out of range"
                )));
            }
            if tri[0] == tri[1] || tri[1] == tri[2] || tri[2] == tri[0] {
                return Err(GmkError::Topology(format!("triangle {t} is degenerate")));
            }
            for i in 0..3 {
                graph.attach_edge(tri[i], tri[(i + 1) % 3], t)?;
            }
        }
        Ok(graph)
    }

    fn attach_edge(&mut self, v0: usize, v1: usize, triangle: usize) -> Result<()> {
        let key = (v0.min(v1), v0.max(v1));
        if let Some(&id) = self.edge_lookup.get(&key) {
            let edge = &mut self.edges[id];
            if edge.triangles[1].is_some() {
                return Err(GmkError::Topology(format!(
                    "edge ({}, {}) is shared by more than two triangles",
                    key.0, key.1
                )));
            }
            edge.triangles[1] = Some(triangle);
        } else {
            let id = self.edges.insert(Edge {
                v: [key.0, key.1],
                triangles: [Some(triangle), None],
            });
            self.edge_lookup.insert(key, id);
            self.vertex_edges[v0].push(id);
            self.vertex_edges[v1].push(id);
        }
        Ok(())
    }

    pub fn num_vertices(&self) -> usize {
        self.num_vertices
    }

    pub fn triangles(&self) -> &[[usize; 3]] {
        &self.triangles
    }

    pub fn edge(&self, id: EdgeId) -> &Edge {
        &self.edges[id]
    }

    pub fn edges(&self) -> impl Iterator<Item = (EdgeId, &Edge)> {
        self.edges.iter()
    }

    pub fn find_edge(&self, v0: usize, v1: usize) -> Option<EdgeId> {
        self.edge_lookup.get(&(v0.min(v1), v0.max(v1))).copied()
    }

    /// Triangle adjacent to `triangle` across the edge `(v0, v1)`.
    pub fn neighbor_across(&self, triangle: usize, v0: usize, v1: usize) -> Option<usize> {
        let edge = &self.edges[self.find_edge(v0, v1)?];
        match edge.triangles {
            [Some(t), other] if t == triangle => other,
            [first, Some(t)] if t == triangle => first,
            _ => None,
        }
    }

    /// Vertices connected to `v` by an edge.
    pub fn vertex_neighbors(&self, v: usize) -> impl Iterator<Item = usize> + '_ {
        self.vertex_edges[v].iter().map(move |&id| {
            let e = &self.edges[id];
            if e.v[0] == v {
                e.v[1]
            } else {
                e.v[0]
            }
        })
    }

    pub fn is_boundary_vertex(&self, v: usize) -> bool {
        self.vertex_edges[v]
            .iter()
            .any(|&id| self.edges[id].is_boundary())
    }

    pub fn boundary_edges(&self) -> impl Iterator<Item = (EdgeId, &Edge)> {
        self.edges.iter().filter(|(_, e)| e.is_boundary())
    }

    /// The boundary as one closed vertex loop, in order. `Err(Topology)`
    /// when the boundary is empty, disconnected, or self-touching.
    pub fn single_boundary_loop(&self) -> Result<Vec<usize>> {
        let mut next: HashMap<usize, Vec<usize>> = HashMap::new();
        let mut boundary_count = 0usize;
        for (_, e) in self.boundary_edges() {
            boundary_count += 1;
            next.entry(e.v[0]).or_default().push(e.v[1]);
            next.entry(e.v[1]).or_default().push(e.v[0]);
        }
        if boundary_count == 0 {
            return Err(GmkError::Topology("mesh has no boundary".to_string()));
        }
        if next.values().any(|n| n.len() != 2) {
            return Err(GmkError::Topology(
                "boundary touches itself at a vertex".to_string(),
            ));
        }

        let start = *next.keys().min().unwrap();
        let mut loop_vertices = vec![start];
        let mut prev = start;
        let mut current = next[&start][0];
        while current != start {
            loop_vertices.push(current);
            let candidates = &next[&current];
            let following = if candidates[0] == prev {
                candidates[1]
            } else {
                candidates[0]
            };
            prev = current;
            current = following;
        }
        if loop_vertices.len() != boundary_count {
            return Err(GmkError::Topology(
                "mesh boundary has more than one loop".to_string(),
            ));
        }
        Ok(loop_vertices)
    }
}

impl Validate for ManifoldGraph {
    fn validate(&self) -> Result<()> {
        for (id, edge) in self.edges.iter() {
            if edge.v[0] >= edge.v[1] || edge.v[1] >= self.num_vertices {
                return Err(GmkError::Topology(format!(
                    "edge ({}, {}) has malformed endpoints",
                    edge.v[0], edge.v[1]
                )));
            }
            if self.edge_lookup.get(&(edge.v[0], edge.v[1])) != Some(&id) {
                return Err(GmkError::Topology(format!(
                    "edge ({}, {}) missing from the lookup table",
                    edge.v[0], edge.v[1]
                )));
            }
            // Every incident triangle must actually use both endpoints.
            for t in edge.triangles.iter().flatten() {
                let tri = self.triangles[*t];
                if !tri.contains(&edge.v[0]) || !tri.contains(&edge.v[1]) {
                    return Err(GmkError::Topology(format!(
                        "triangle {t} does not use edge ({}, {})",
                        edge.v[0], edge.v[1]
                    )));
                }
            }
        }
        for (t, tri) in self.triangles.iter().enumerate() {
            for i in 0..3 {
                if self.find_edge(tri[i], tri[(i + 1) % 3]).is_none() {
                    return Err(GmkError::Topology(format!(
                        "triangle {t} has an unregistered edge"
                    )));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // 2x2 vertex grid split into two triangles.
    //   2 --- 3
    //   |  /  |
    //   0 --- 1
    fn quad() -> Vec<[usize; 3]> {
        vec![[0, 1, 3], [0, 3, 2]]
    }

    #[test]
    fn test_quad_validates() {
        ManifoldGraph::new(4, &quad()).unwrap().validate().unwrap();
    }

    #[test]
    fn test_quad_connectivity() {
        let graph = ManifoldGraph::new(4, &quad()).unwrap();
        assert_eq!(graph.edges().count(), 5);
        assert_eq!(graph.boundary_edges().count(), 4);
        assert_eq!(graph.neighbor_across(0, 0, 3), Some(1));
        assert_eq!(graph.neighbor_across(0, 0, 1), None);
        let mut neighbors: Vec<usize> = graph.vertex_neighbors(0).collect();
        neighbors.sort_unstable();
        assert_eq!(neighbors, vec![1, 2, 3]);
    }

    #[test]
    fn test_boundary_loop_of_quad() {
        let graph = ManifoldGraph::new(4, &quad()).unwrap();
        let boundary = graph.single_boundary_loop().unwrap();
        assert_eq!(boundary.len(), 4);
        assert!(boundary.contains(&0) && boundary.contains(&3));
    }

    #[test]
    fn test_nonmanifold_edge_rejected() {
        // Three triangles share edge (0, 1).
        let triangles = vec![[0, 1, 2], [1, 0, 3], [0, 1, 4]];
        assert!(matches!(
            ManifoldGraph::new(5, &triangles),
            Err(GmkError::Topology(_))
        ));
    }

    #[test]
    fn test_out_of_range_index_rejected() {
        assert!(ManifoldGraph::new(3, &[[0, 1, 5]]).is_err());
    }

    #[test]
    fn test_degenerate_triangle_rejected() {
        assert!(ManifoldGraph::new(3, &[[0, 1, 1]]).is_err());
    }

    #[test]
    fn test_closed_mesh_has_no_boundary() {
        // Tetrahedron surface.
        let triangles = vec![[0, 1, 2], [0, 3, 1], [1, 3, 2], [2, 3, 0]];
        let graph = ManifoldGraph::new(4, &triangles).unwrap();
        assert_eq!(graph.boundary_edges().count(), 0);
        assert!(graph.single_boundary_loop().is_err());
    }

    #[test]
    fn test_boundary_vertex_detection() {
        let graph = ManifoldGraph::new(4, &quad()).unwrap();
        for v in 0..4 {
            assert!(graph.is_boundary_vertex(v));
        }
    }
}
