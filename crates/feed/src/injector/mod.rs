//! Injection-model family.
//!
//! Every model answers the same capability interface: how much parcel
//! volume enters over a time window, how many parcels represent it, and
//! where each one appears. [`build_injection_model`] dispatches on the
//! configuration's `model` tag. The variants are independent
//! implementations; the only shared piece is the resolved-geometry
//! snapshot value they each own.

mod none;
mod patch;
mod patch_flow_rate;
mod snapshot;

pub use none::NoInjection;
pub use patch::PatchInjection;
pub use patch_flow_rate::PatchFlowRateInjection;

use glam::DVec3;

use carrier::comm::Reduce;
use carrier::fields::CarrierFields;
use carrier::mesh::{FaceLocator, PatchGeometry};

use crate::config::InjectionConfig;
use crate::error::FeedResult;
use crate::parcel::Parcel;

/// Where a new parcel enters the mesh.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Placement {
    /// Seed position (an owner-cell centre)
    pub position: DVec3,
    /// Cell receiving the parcel
    pub cell: usize,
    /// Location token of the seeding face
    pub face: FaceLocator,
}

/// One injection model, bound to its parameters at construction and to
/// mesh geometry by [`resolve_geometry`](Self::resolve_geometry).
///
/// Per window the injection loop asks `parcels_to_inject` once (this
/// advances quota state), then for each index in `0..n` asks
/// `set_position_and_cell` and `set_properties`. Windows entirely
/// outside `[start, start + duration]` answer zero and leave all state
/// untouched.
pub trait InjectionModel: Send {
    /// Resolve the configured patch against the mesh and run the
    /// one-time collective area sum. Per-window queries fail until this
    /// has succeeded.
    fn resolve_geometry(&mut self, mesh: &dyn PatchGeometry, comm: &dyn Reduce) -> FeedResult<()>;

    /// Last instant at which this model can create parcels; the
    /// injection loop stops querying after it.
    fn time_end(&self) -> f64;

    /// Parcel volume to inject over `[time0, time1]`, already scaled by
    /// this subdomain's share of the patch area.
    fn volume_to_inject(
        &self,
        carrier: &dyn CarrierFields,
        time0: f64,
        time1: f64,
    ) -> FeedResult<f64>;

    /// Number of parcels to create over `[time0, time1]`. Advances quota
    /// state; call once per window.
    fn parcels_to_inject(
        &mut self,
        carrier: &dyn CarrierFields,
        time0: f64,
        time1: f64,
    ) -> FeedResult<usize>;

    /// Deterministic placement for event `parcel_i` of a batch of
    /// `n_parcels` injected at `time`. Independent of call order.
    fn set_position_and_cell(
        &self,
        parcel_i: usize,
        n_parcels: usize,
        time: f64,
    ) -> FeedResult<Placement>;

    /// Assign diameter and initial velocity. Advances the model's RNG.
    fn set_properties(&mut self, parcel_i: usize, n_parcels: usize, time: f64, parcel: &mut Parcel);

    /// True when `set_properties` fixes every parcel field and the
    /// injection loop must skip its own secondary defaults (sub-cell
    /// position refinement stays with the loop when false).
    fn fully_described(&self) -> bool;

    /// Per-parcel acceptance check after placement.
    fn valid_injection(&self, parcel_i: usize) -> bool;

    /// Deep copy, RNG and quota state included.
    fn boxed_clone(&self) -> Box<dyn InjectionModel>;
}

impl Clone for Box<dyn InjectionModel> {
    fn clone(&self) -> Self {
        self.boxed_clone()
    }
}

/// Build the model a configuration names.
pub fn build_injection_model(config: &InjectionConfig) -> FeedResult<Box<dyn InjectionModel>> {
    match config {
        InjectionConfig::None => Ok(Box::new(NoInjection::new())),
        InjectionConfig::Patch(cfg) => Ok(Box::new(PatchInjection::new(cfg)?)),
        InjectionConfig::PatchFlowRate(cfg) => Ok(Box::new(PatchFlowRateInjection::new(cfg)?)),
    }
}
