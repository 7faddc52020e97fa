//! Disabled injection.

use carrier::comm::Reduce;
use carrier::fields::CarrierFields;
use carrier::mesh::PatchGeometry;

use crate::error::{FeedError, FeedResult};
use crate::parcel::Parcel;

use super::{InjectionModel, Placement};

/// Inert model for runs with injection switched off. Quotas are zero,
/// placement refuses, and `valid_injection` is false so the injection
/// loop discards anything it tries anyway.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoInjection;

impl NoInjection {
    pub fn new() -> Self {
        Self
    }
}

impl InjectionModel for NoInjection {
    fn resolve_geometry(
        &mut self,
        _mesh: &dyn PatchGeometry,
        _comm: &dyn Reduce,
    ) -> FeedResult<()> {
        Ok(())
    }

    fn time_end(&self) -> f64 {
        0.0
    }

    fn volume_to_inject(
        &self,
        _carrier: &dyn CarrierFields,
        _time0: f64,
        _time1: f64,
    ) -> FeedResult<f64> {
        Ok(0.0)
    }

    fn parcels_to_inject(
        &mut self,
        _carrier: &dyn CarrierFields,
        _time0: f64,
        _time1: f64,
    ) -> FeedResult<usize> {
        Ok(0)
    }

    fn set_position_and_cell(
        &self,
        _parcel_i: usize,
        _n_parcels: usize,
        _time: f64,
    ) -> FeedResult<Placement> {
        Err(FeedError::NonPlacing { model: "none" })
    }

    fn set_properties(
        &mut self,
        _parcel_i: usize,
        _n_parcels: usize,
        _time: f64,
        _parcel: &mut Parcel,
    ) {
    }

    fn fully_described(&self) -> bool {
        false
    }

    fn valid_injection(&self, _parcel_i: usize) -> bool {
        false
    }

    fn boxed_clone(&self) -> Box<dyn InjectionModel> {
        Box::new(*self)
    }
}
