//! Fixed-rate patch injection.
//!
//! A prescribed total volume spread uniformly over the duration at a
//! prescribed parcel rate. Placement and property assignment match the
//! flow-rate model; the carrier fields are never consulted.

use glam::DVec3;
use rand::SeedableRng;
use rand::rngs::StdRng;

use carrier::comm::Reduce;
use carrier::fields::CarrierFields;
use carrier::mesh::PatchGeometry;

use crate::config::PatchInjectionConfig;
use crate::distribution::SizeDistribution;
use crate::error::{FeedError, FeedResult};
use crate::parcel::Parcel;

use super::snapshot::PatchSnapshot;
use super::{InjectionModel, Placement};

#[derive(Clone)]
pub struct PatchInjection {
    patch_name: String,
    start: f64,
    duration: f64,
    volume_total: f64,
    parcels_per_second: f64,
    u0: DVec3,
    size: Box<dyn SizeDistribution>,
    rng: StdRng,
    snapshot: Option<PatchSnapshot>,
}

impl PatchInjection {
    pub fn new(config: &PatchInjectionConfig) -> FeedResult<Self> {
        if !(config.duration > 0.0 && config.duration.is_finite()) {
            return Err(FeedError::config(format!(
                "duration must be positive, got {}",
                config.duration
            )));
        }
        if !(config.volume_total >= 0.0 && config.volume_total.is_finite()) {
            return Err(FeedError::config(format!(
                "volumeTotal must be non-negative, got {}",
                config.volume_total
            )));
        }
        if !(config.parcels_per_second >= 0.0 && config.parcels_per_second.is_finite()) {
            return Err(FeedError::config(format!(
                "parcelsPerSecond must be non-negative, got {}",
                config.parcels_per_second
            )));
        }

        Ok(Self {
            patch_name: config.patch_name.clone(),
            start: config.start,
            duration: config.duration,
            volume_total: config.volume_total,
            parcels_per_second: config.parcels_per_second,
            u0: config.u0,
            size: config.size_distribution.build()?,
            rng: StdRng::seed_from_u64(config.seed),
            snapshot: None,
        })
    }

    fn snapshot(&self) -> FeedResult<&PatchSnapshot> {
        self.snapshot
            .as_ref()
            .ok_or_else(|| FeedError::unresolved(&self.patch_name))
    }

    /// Clamped overlap length of `[time0, time1]` with the active
    /// interval.
    fn clamped_dt(&self, time0: f64, time1: f64) -> f64 {
        let c0 = time0.max(self.start);
        let c1 = time1.min(self.start + self.duration);
        (c1 - c0).max(0.0)
    }
}

impl InjectionModel for PatchInjection {
    fn resolve_geometry(&mut self, mesh: &dyn PatchGeometry, comm: &dyn Reduce) -> FeedResult<()> {
        self.snapshot = Some(PatchSnapshot::resolve(&self.patch_name, mesh, comm)?);
        Ok(())
    }

    fn time_end(&self) -> f64 {
        self.start + self.duration
    }

    fn volume_to_inject(
        &self,
        _carrier: &dyn CarrierFields,
        time0: f64,
        time1: f64,
    ) -> FeedResult<f64> {
        let fraction = self.snapshot()?.fraction;
        let dt = self.clamped_dt(time0, time1);
        Ok(fraction * self.volume_total * (dt / self.duration))
    }

    fn parcels_to_inject(
        &mut self,
        _carrier: &dyn CarrierFields,
        time0: f64,
        time1: f64,
    ) -> FeedResult<usize> {
        let fraction = self.snapshot()?.fraction;
        let dt = self.clamped_dt(time0, time1);
        Ok((self.parcels_per_second * dt * fraction).round() as usize)
    }

    fn set_position_and_cell(
        &self,
        parcel_i: usize,
        n_parcels: usize,
        _time: f64,
    ) -> FeedResult<Placement> {
        let snap = self.snapshot()?;
        if !snap.can_place() {
            return Err(FeedError::NoCandidateCells {
                patch: self.patch_name.clone(),
                area: snap.local_area,
            });
        }
        Ok(snap.place(parcel_i, n_parcels))
    }

    fn set_properties(
        &mut self,
        _parcel_i: usize,
        _n_parcels: usize,
        _time: f64,
        parcel: &mut Parcel,
    ) {
        parcel.diameter = self.size.sample(&mut self.rng);
        parcel.velocity = self.u0;
    }

    fn fully_described(&self) -> bool {
        false
    }

    fn valid_injection(&self, _parcel_i: usize) -> bool {
        true
    }

    fn boxed_clone(&self) -> Box<dyn InjectionModel> {
        Box::new(self.clone())
    }
}
