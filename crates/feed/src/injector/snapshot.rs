//! Resolved patch geometry cached by the injection models.

use glam::DVec3;
use tracing::debug;

use carrier::comm::Reduce;
use carrier::mesh::{FaceLocator, PatchGeometry};

use crate::error::{FeedError, FeedResult};

use super::Placement;

/// One candidate seeding site: a local patch face and its owner cell.
#[derive(Clone, Copy, Debug)]
pub(crate) struct FaceRecord {
    /// Cumulative patch area up to and including this face
    pub cum_area: f64,
    /// Owner cell of the face
    pub cell: usize,
    /// Centre of the owner cell
    pub cell_centre: DVec3,
    /// Mesh point-location token for the face
    pub locator: FaceLocator,
}

/// The subdomain's view of the injection patch, captured once at
/// geometry resolution and never recomputed per window.
#[derive(Clone, Debug)]
pub(crate) struct PatchSnapshot {
    /// Patch area owned by this subdomain
    pub local_area: f64,
    /// Area-weighted mean outward normal of the local faces
    pub normal: DVec3,
    /// `local_area / global_area`
    pub fraction: f64,
    /// Candidate sites in patch-face order
    pub faces: Vec<FaceRecord>,
}

impl PatchSnapshot {
    /// Resolve `patch_name` against the mesh and run the collective area
    /// sum. Every rank calls this during setup; a rank with no local
    /// faces still contributes zero to the reduction.
    pub fn resolve(
        patch_name: &str,
        mesh: &dyn PatchGeometry,
        comm: &dyn Reduce,
    ) -> FeedResult<Self> {
        let patch = mesh
            .patch(patch_name)
            .ok_or_else(|| FeedError::unknown_patch(patch_name))?;

        let local_area = patch.total_area();
        let global_area = comm.global_sum(local_area);
        if !(global_area > 0.0) {
            return Err(FeedError::EmptyPatch {
                patch: patch_name.to_string(),
            });
        }
        let fraction = local_area / global_area;

        let mut faces = Vec::with_capacity(patch.n_faces());
        let mut cum_area = 0.0;
        for (i, face) in patch.faces().iter().enumerate() {
            cum_area += face.area;
            faces.push(FaceRecord {
                cum_area,
                cell: face.owner_cell,
                cell_centre: face.owner_centroid,
                locator: patch.locator(i),
            });
        }

        debug!(
            patch = patch_name,
            local_area,
            global_area,
            fraction,
            faces = faces.len(),
            "resolved injection patch"
        );

        Ok(Self {
            local_area,
            normal: patch.mean_normal(),
            fraction,
            faces,
        })
    }

    /// True when this subdomain has sites to seed into.
    pub fn can_place(&self) -> bool {
        !self.faces.is_empty()
    }

    /// Deterministic area-weighted site for event `parcel_i` of a batch
    /// of `n_parcels`: stratified coordinate `u = (i + 0.5) / n` looked
    /// up in the cumulative-area table. Same `(i, n, faces)` always
    /// yields the same site.
    pub fn place(&self, parcel_i: usize, n_parcels: usize) -> Placement {
        debug_assert!(
            parcel_i < n_parcels,
            "parcel index {} outside batch of {}",
            parcel_i,
            n_parcels
        );
        debug_assert!(self.can_place());

        let u = (parcel_i as f64 + 0.5) / n_parcels.max(1) as f64;
        let target = u * self.local_area;
        let k = self.faces.partition_point(|f| f.cum_area < target);
        let site = &self.faces[k.min(self.faces.len() - 1)];
        Placement {
            position: site.cell_centre,
            cell: site.cell,
            face: site.locator,
        }
    }
}
