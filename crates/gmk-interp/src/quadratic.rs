//! C1 quadratic interpolation over a planar triangulation
//! (Cendes-Wong, via a six-way Powell-Sabin split of each triangle).
//!
//! Each triangle is split about its centroid and about one point per
//! edge (the crossing of the centroid-to-neighbor-centroid segment, or
//! the edge midpoint at a boundary). The 19 Bezier ordinates of the six
//! quadratic subpatches are derived from the vertex values and
//! gradients so that adjacent patches join with continuous value and
//! gradient.

use gmk_core::{GmkError, Result};
use gmk_math::{DVec2, DVec3};
use gmk_mesh::planar::barycentrics_2d;
use gmk_mesh::PlanarMesh;

/// Value and first derivatives at a query point.
#[derive(Debug, Clone, Copy)]
pub struct Jet2 {
    pub f: f64,
    pub fx: f64,
    pub fy: f64,
}

/// Per-triangle split geometry and Bezier ordinates.
///
/// Ordinate layout: `f[3]` corner values, `e0/e1[3]` outer-edge
/// midpoint ordinates adjacent to `V_j` / `V_{j+1}`, `c[3]` ordinates
/// midway to the centroid, `m[3]` at the edge split points, `d[3]`
/// midway from a split point to the centroid, `bc` at the centroid.
#[derive(Debug, Clone)]
struct TriangleData {
    center: DVec2,
    intersect: [DVec2; 3],
    f: [f64; 3],
    e0: [f64; 3],
    e1: [f64; 3],
    c: [f64; 3],
    m: [f64; 3],
    d: [f64; 3],
    bc: f64,
}

pub struct QuadraticNonuniform2 {
    mesh: PlanarMesh,
    data: Vec<TriangleData>,
}

impl QuadraticNonuniform2 {
    /// Builds the interpolator from vertex samples and caller-supplied
    /// gradients.
    pub fn with_gradients(
        mesh: PlanarMesh,
        samples: Vec<f64>,
        gradients: Vec<DVec2>,
    ) -> Result<Self> {
        let n = mesh.vertices().len();
        if samples.len() != n || gradients.len() != n {
            return Err(GmkError::Construction(format!(
                "expected {n} samples and gradients, got {} and {}",
                samples.len(),
                gradients.len()
            )));
        }
        let data = build_triangle_data(&mesh, &samples, &gradients);
        Ok(Self { mesh, data })
    }

    /// Builds the interpolator with gradients estimated from the mesh:
    /// the normals of the lifted graph triangles `(x, y, f)` are
    /// averaged per vertex, with `spatial_delta` damping the slope of
    /// near-vertical accumulations.
    pub fn from_samples(mesh: PlanarMesh, samples: Vec<f64>, spatial_delta: f64) -> Result<Self> {
        let n = mesh.vertices().len();
        if samples.len() != n {
            return Err(GmkError::Construction(format!(
                "expected {n} samples, got {}",
                samples.len()
            )));
        }
        if spatial_delta < 0.0 {
            return Err(GmkError::Construction(
                "spatial_delta must be nonnegative".to_string(),
            ));
        }
        let gradients = estimate_gradients(&mesh, &samples, spatial_delta);
        let data = build_triangle_data(&mesh, &samples, &gradients);
        Ok(Self { mesh, data })
    }

    pub fn mesh(&self) -> &PlanarMesh {
        &self.mesh
    }

    /// Value and gradient at `p`, `None` outside the mesh.
    pub fn interpolate(&self, p: DVec2) -> Option<Jet2> {
        let t = self.mesh.containing_triangle(p, 0)?;
        let data = &self.data[t];
        let tri = self.mesh.triangles()[t];
        let v = [
            self.mesh.vertices()[tri[0]],
            self.mesh.vertices()[tri[1]],
            self.mesh.vertices()[tri[2]],
        ];

        // Pick the subtriangle whose barycentric minimum is largest; ties
        // on shared internal edges are harmless since adjacent patches
        // agree there.
        let mut best: Option<(f64, [DVec2; 3], [f64; 6], [f64; 3])> = None;
        for j in 0..3 {
            let jp = (j + 1) % 3;
            let candidates = [
                // (V_j, M_j, C)
                (
                    [v[j], data.intersect[j], data.center],
                    [data.f[j], data.m[j], data.bc, data.e0[j], data.d[j], data.c[j]],
                ),
                // (M_j, V_{j+1}, C)
                (
                    [data.intersect[j], v[jp], data.center],
                    [data.m[j], data.f[jp], data.bc, data.e1[j], data.c[jp], data.d[j]],
                ),
            ];
            for (corners, ords) in candidates {
                if let Some(bary) = barycentrics_2d(corners[0], corners[1], corners[2], p) {
                    let min = bary[0].min(bary[1]).min(bary[2]);
                    if best.as_ref().map_or(true, |(m, ..)| min > *m) {
                        best = Some((min, corners, ords, bary));
                    }
                }
            }
        }
        let (_, corners, ords, bary) = best?;
        Some(evaluate_patch(&corners, &ords, &bary))
    }
}

/// Quadratic Bezier patch evaluation. `ords` is
/// `[b200, b020, b002, b110, b011, b101]` over corners `q`.
fn evaluate_patch(q: &[DVec2; 3], ords: &[f64; 6], bary: &[f64; 3]) -> Jet2 {
    let [b200, b020, b002, b110, b011, b101] = *ords;
    let [l0, l1, l2] = *bary;
    let f = l0 * l0 * b200
        + l1 * l1 * b020
        + l2 * l2 * b002
        + 2.0 * (l0 * l1 * b110 + l1 * l2 * b011 + l0 * l2 * b101);

    // dF/dlambda_i, then chain through the constant barycentric
    // gradients of the affine map.
    let df0 = 2.0 * (l0 * b200 + l1 * b110 + l2 * b101);
    let df1 = 2.0 * (l1 * b020 + l0 * b110 + l2 * b011);
    let df2 = 2.0 * (l2 * b002 + l1 * b011 + l0 * b101);

    let e1 = q[1] - q[0];
    let e2 = q[2] - q[0];
    let det = e1.x * e2.y - e1.y * e2.x;
    let grad1 = DVec2::new(e2.y, -e2.x) * (1.0 / det);
    let grad2 = DVec2::new(-e1.y, e1.x) * (1.0 / det);
    let grad0 = -grad1 - grad2;
    let grad = grad0 * df0 + grad1 * df1 + grad2 * df2;
    Jet2 {
        f,
        fx: grad.x,
        fy: grad.y,
    }
}

fn build_triangle_data(
    mesh: &PlanarMesh,
    samples: &[f64],
    gradients: &[DVec2],
) -> Vec<TriangleData> {
    let centers: Vec<DVec2> = mesh
        .triangles()
        .iter()
        .map(|tri| {
            (mesh.vertices()[tri[0]] + mesh.vertices()[tri[1]] + mesh.vertices()[tri[2]])
                * (1.0 / 3.0)
        })
        .collect();

    mesh.triangles()
        .iter()
        .enumerate()
        .map(|(t, tri)| {
            let v = [
                mesh.vertices()[tri[0]],
                mesh.vertices()[tri[1]],
                mesh.vertices()[tri[2]],
            ];
            let fv = [samples[tri[0]], samples[tri[1]], samples[tri[2]]];
            let gv = [gradients[tri[0]], gradients[tri[1]], gradients[tri[2]]];
            let center = centers[t];

            let mut intersect = [DVec2::ZERO; 3];
            for j in 0..3 {
                let jp = (j + 1) % 3;
                // Adjacency slot for the edge (V_j, V_{j+1}) is the one
                // opposite the remaining vertex.
                let opposite = (j + 2) % 3;
                intersect[j] = match mesh.adjacencies()[t][opposite] {
                    Some(neighbor) => {
                        edge_crossing(v[j], v[jp], center, centers[neighbor])
                            .unwrap_or_else(|| (v[j] + v[jp]) * 0.5)
                    }
                    None => (v[j] + v[jp]) * 0.5,
                };
            }

            let mut e0 = [0.0; 3];
            let mut e1 = [0.0; 3];
            let mut c = [0.0; 3];
            let mut m = [0.0; 3];
            for j in 0..3 {
                let jp = (j + 1) % 3;
                e0[j] = fv[j] + 0.5 * gv[j].dot(intersect[j] - v[j]);
                e1[j] = fv[jp] + 0.5 * gv[jp].dot(intersect[j] - v[jp]);
                c[j] = fv[j] + 0.5 * gv[j].dot(center - v[j]);
                // M_j = (1 - theta) V_j + theta V_{j+1}.
                let edge = v[jp] - v[j];
                let theta = (intersect[j] - v[j]).dot(edge) / edge.dot(edge);
                m[j] = (1.0 - theta) * e0[j] + theta * e1[j];
            }

            // Ordinates at and around the centroid come from the affine
            // interpolant of the midway ordinates c_j; the centroid is the
            // centroid of their support points, so bc is their average.
            let bc = (c[0] + c[1] + c[2]) / 3.0;
            let support = [
                (v[0] + center) * 0.5,
                (v[1] + center) * 0.5,
                (v[2] + center) * 0.5,
            ];
            let mut d = [0.0; 3];
            for j in 0..3 {
                let q = (intersect[j] + center) * 0.5;
                let mu = barycentrics_2d(support[0], support[1], support[2], q)
                    .unwrap_or([1.0 / 3.0; 3]);
                d[j] = mu[0] * c[0] + mu[1] * c[1] + mu[2] * c[2];
            }

            TriangleData {
                center,
                intersect,
                f: fv,
                e0,
                e1,
                c,
                m,
                d,
                bc,
            }
        })
        .collect()
}

/// Crossing of the segment `c0 -> c1` with the edge `a -> b`, `None`
/// when the segments are parallel or the crossing misses the edge.
fn edge_crossing(a: DVec2, b: DVec2, c0: DVec2, c1: DVec2) -> Option<DVec2> {
    let e = b - a;
    let s = c1 - c0;
    let det = e.x * s.y - e.y * s.x;
    if det == 0.0 {
        return None;
    }
    let d = c0 - a;
    let theta = (d.x * s.y - d.y * s.x) / det;
    if (0.0..=1.0).contains(&theta) {
        Some(a + e * theta)
    } else {
        None
    }
}

/// Per-vertex gradients from accumulated lifted-graph normals.
fn estimate_gradients(mesh: &PlanarMesh, samples: &[f64], spatial_delta: f64) -> Vec<DVec2> {
    let mut normals = vec![DVec3::ZERO; samples.len()];
    for tri in mesh.triangles() {
        let p = |i: usize| {
            let v = mesh.vertices()[tri[i]];
            DVec3::new(v.x, v.y, samples[tri[i]])
        };
        let mut n = (p(1) - p(0)).cross(p(2) - p(0));
        if n.z < 0.0 {
            n = -n;
        }
        for &i in tri {
            normals[i] += n;
        }
    }
    normals
        .into_iter()
        .map(|n| {
            let denom = n.z + spatial_delta;
            if denom > 0.0 {
                DVec2::new(-n.x / denom, -n.y / denom)
            } else {
                DVec2::ZERO
            }
        })
        .collect()
}
