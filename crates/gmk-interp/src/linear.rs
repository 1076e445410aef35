//! Piecewise-linear interpolation of scattered samples over a query mesh.

use gmk_core::{GmkError, Result};
use gmk_math::{DVec2, DVec3};
use gmk_mesh::{PlanarMesh, VolumeMesh};

/// Linear interpolation over a planar triangulation: the value at a
/// query point is the barycentric blend of its triangle's vertex
/// samples.
pub struct LinearNonuniform2 {
    mesh: PlanarMesh,
    samples: Vec<f64>,
}

impl LinearNonuniform2 {
    pub fn new(mesh: PlanarMesh, samples: Vec<f64>) -> Result<Self> {
        if samples.len() != mesh.vertices().len() {
            return Err(GmkError::Construction(format!(
                "expected {} samples, got {}",
                mesh.vertices().len(),
                samples.len()
            )));
        }
        Ok(Self { mesh, samples })
    }

    pub fn mesh(&self) -> &PlanarMesh {
        &self.mesh
    }

    /// `None` when `p` lies outside the mesh.
    pub fn interpolate(&self, p: DVec2) -> Option<f64> {
        let (t, bary) = self.mesh.locate(p, 0)?;
        let tri = self.mesh.triangles()[t];
        Some(
            bary[0] * self.samples[tri[0]]
                + bary[1] * self.samples[tri[1]]
                + bary[2] * self.samples[tri[2]],
        )
    }
}

/// Linear interpolation over a tetrahedralization.
pub struct LinearNonuniform3 {
    mesh: VolumeMesh,
    samples: Vec<f64>,
}

impl LinearNonuniform3 {
    pub fn new(mesh: VolumeMesh, samples: Vec<f64>) -> Result<Self> {
        if samples.len() != mesh.vertices().len() {
            return Err(GmkError::Construction(format!(
                "expected {} samples, got {}",
                mesh.vertices().len(),
                samples.len()
            )));
        }
        Ok(Self { mesh, samples })
    }

    pub fn mesh(&self) -> &VolumeMesh {
        &self.mesh
    }

    pub fn interpolate(&self, p: DVec3) -> Option<f64> {
        let (t, bary) = self.mesh.locate(p, 0)?;
        let tet = self.mesh.tetrahedra()[t];
        Some(
            bary[0] * self.samples[tet[0]]
                + bary[1] * self.samples[tet[1]]
                + bary[2] * self.samples[tet[2]]
                + bary[3] * self.samples[tet[3]],
        )
    }
}
