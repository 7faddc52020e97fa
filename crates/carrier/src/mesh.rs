//! Boundary-patch geometry.
//!
//! A patch is a named set of boundary faces, each carrying its area,
//! outward normal, centroid and the interior cell that owns it. Injection
//! models snapshot these queries once at setup and never walk the mesh
//! per timestep.

use glam::DVec3;
use std::collections::HashMap;

/// One boundary face of a patch.
#[derive(Clone, Copy, Debug)]
pub struct PatchFace {
    /// Face area in world units squared
    pub area: f64,
    /// Outward unit normal (points out of the domain)
    pub normal: DVec3,
    /// Face centroid
    pub centroid: DVec3,
    /// Interior cell adjacent to this face
    pub owner_cell: usize,
    /// Centre of the owner cell
    pub owner_centroid: DVec3,
}

/// Opaque face-location token.
///
/// Identifies a face within its patch under the mesh's own point-location
/// convention. Callers store and hand it back untouched; only the mesh
/// side interprets it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FaceLocator(usize);

impl FaceLocator {
    /// Patch-local face index.
    #[inline]
    pub fn index(&self) -> usize {
        self.0
    }
}

/// A named set of boundary faces with derived geometry queries.
#[derive(Clone, Debug)]
pub struct BoundaryPatch {
    name: String,
    faces: Vec<PatchFace>,
}

impl BoundaryPatch {
    /// Create a patch from explicit faces. Normals are re-normalized.
    pub fn from_faces(name: impl Into<String>, faces: Vec<PatchFace>) -> Self {
        let name = name.into();
        for (i, face) in faces.iter().enumerate() {
            assert!(
                face.area > 0.0,
                "face {} of patch `{}` has non-positive area {}",
                i,
                name,
                face.area
            );
            assert!(
                face.normal.length_squared() > 0.0,
                "face {} of patch `{}` has a zero-length normal",
                i,
                name
            );
        }
        let faces = faces
            .into_iter()
            .map(|mut face| {
                face.normal = face.normal.normalize();
                face
            })
            .collect();
        Self { name, faces }
    }

    /// Create a planar rectangular patch split into `nu` x `nv` equal faces.
    ///
    /// `origin` is one corner; `edge_u` and `edge_v` span the rectangle.
    /// The outward normal is `edge_u x edge_v` normalized. Owner cells are
    /// numbered consecutively from `first_cell` in `u`-major order, with
    /// centres half a `cell_depth` inward of each face centroid.
    pub fn rectangle(
        name: impl Into<String>,
        origin: DVec3,
        edge_u: DVec3,
        edge_v: DVec3,
        nu: usize,
        nv: usize,
        first_cell: usize,
        cell_depth: f64,
    ) -> Self {
        assert!(nu > 0 && nv > 0, "rectangle needs at least one face per edge");
        assert!(cell_depth > 0.0, "cell_depth must be positive, got {}", cell_depth);
        let cross = edge_u.cross(edge_v);
        assert!(
            cross.length() > 0.0,
            "rectangle edges must span a plane, got {:?} x {:?}",
            edge_u,
            edge_v
        );
        let normal = cross.normalize();
        let face_area = cross.length() / (nu * nv) as f64;

        let mut faces = Vec::with_capacity(nu * nv);
        for iv in 0..nv {
            for iu in 0..nu {
                let centroid = origin
                    + edge_u * ((iu as f64 + 0.5) / nu as f64)
                    + edge_v * ((iv as f64 + 0.5) / nv as f64);
                faces.push(PatchFace {
                    area: face_area,
                    normal,
                    centroid,
                    owner_cell: first_cell + iv * nu + iu,
                    owner_centroid: centroid - normal * (cell_depth * 0.5),
                });
            }
        }
        Self { name: name.into(), faces }
    }

    /// Patch name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Faces in patch order.
    pub fn faces(&self) -> &[PatchFace] {
        &self.faces
    }

    /// Number of faces on this patch.
    #[inline]
    pub fn n_faces(&self) -> usize {
        self.faces.len()
    }

    /// True when the patch has no faces (legal on a subdomain that does
    /// not touch it).
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }

    /// Sum of face areas.
    pub fn total_area(&self) -> f64 {
        self.faces.iter().map(|face| face.area).sum()
    }

    /// Area-weighted mean outward normal, unit length. Zero for an empty
    /// patch.
    pub fn mean_normal(&self) -> DVec3 {
        let weighted: DVec3 = self
            .faces
            .iter()
            .map(|face| face.normal * face.area)
            .sum();
        if weighted.length() > 0.0 {
            weighted.normalize()
        } else {
            DVec3::ZERO
        }
    }

    /// Owner cells in face order. May repeat a cell when several faces
    /// share it.
    pub fn owner_cells(&self) -> Vec<usize> {
        self.faces.iter().map(|face| face.owner_cell).collect()
    }

    /// Location token for the face at `face` (patch-local index).
    pub fn locator(&self, face: usize) -> FaceLocator {
        assert!(
            face < self.faces.len(),
            "face index {} out of range for patch `{}` with {} faces",
            face,
            self.name,
            self.faces.len()
        );
        FaceLocator(face)
    }
}

/// Resolves patch names to geometry.
///
/// The mesh side owns this; a `None` answer means the mesh has no patch
/// by that name anywhere (an empty local view of a real patch still
/// resolves, with zero faces).
pub trait PatchGeometry {
    fn patch(&self, name: &str) -> Option<&BoundaryPatch>;
}

/// A single patch acts as its own one-entry provider.
impl PatchGeometry for BoundaryPatch {
    fn patch(&self, name: &str) -> Option<&BoundaryPatch> {
        (self.name == name).then_some(self)
    }
}

/// Named patch collection, the usual mesh-side provider.
#[derive(Clone, Debug, Default)]
pub struct PatchSet {
    patches: HashMap<String, BoundaryPatch>,
}

impl PatchSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a patch, replacing any existing patch with the same name.
    pub fn insert(&mut self, patch: BoundaryPatch) {
        self.patches.insert(patch.name().to_string(), patch);
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with_patch(mut self, patch: BoundaryPatch) -> Self {
        self.insert(patch);
        self
    }
}

impl PatchGeometry for PatchSet {
    fn patch(&self, name: &str) -> Option<&BoundaryPatch> {
        self.patches.get(name)
    }
}
