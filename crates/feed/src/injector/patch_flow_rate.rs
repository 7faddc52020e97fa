//! Patch injection metered by the carrier flow rate.
//!
//! The parcel volume entering over a window follows the carrier volume
//! swept through the patch: `|flux| / density` scaled by a target
//! concentration, the clamped window length and the subdomain's share of
//! patch area. The size distribution's mean volume converts volume into
//! a parcel count; the fractional part is carried into the next window
//! so long-run totals do not drift.

use std::cell::OnceCell;

use glam::DVec3;
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::warn;

use carrier::comm::Reduce;
use carrier::fields::CarrierFields;
use carrier::mesh::PatchGeometry;

use crate::config::PatchFlowRateConfig;
use crate::distribution::SizeDistribution;
use crate::error::{FeedError, FeedResult};
use crate::parcel::Parcel;

use super::snapshot::PatchSnapshot;
use super::{InjectionModel, Placement};

/// How parcel quotas derive from a window.
#[derive(Clone, Copy, Debug)]
enum RateMode {
    /// Injected particle volume per unit carrier volume
    Concentration(f64),
    /// Parcels per second, independent of the carrier
    ParcelsPerSecond(f64),
}

/// Quota bookkeeping carried between windows.
#[derive(Clone, Debug, Default)]
struct QuotaState {
    /// Mean parcel volume, filled from the sampler on first use
    mean_volume: OnceCell<f64>,
    /// Fractional parcel owed to the next window
    remainder: f64,
}

/// Flow-rate-coupled injection at a boundary patch.
#[derive(Clone)]
pub struct PatchFlowRateInjection {
    patch_name: String,
    start: f64,
    duration: f64,
    mode: RateMode,
    u0: DVec3,
    phi_name: String,
    rho_name: String,
    size: Box<dyn SizeDistribution>,
    rng: StdRng,
    quota: QuotaState,
    snapshot: Option<PatchSnapshot>,
}

impl PatchFlowRateInjection {
    /// Build from configuration. Geometry stays unresolved until
    /// [`resolve_geometry`](InjectionModel::resolve_geometry) runs.
    pub fn new(config: &PatchFlowRateConfig) -> FeedResult<Self> {
        let mode = match (config.concentration, config.parcels_per_second) {
            (Some(_), Some(_)) => {
                return Err(FeedError::RateConflict {
                    patch: config.patch_name.clone(),
                });
            }
            (None, None) => {
                return Err(FeedError::MissingRate {
                    patch: config.patch_name.clone(),
                });
            }
            (Some(c), None) => {
                if !(c >= 0.0 && c.is_finite()) {
                    return Err(FeedError::config(format!(
                        "concentration must be non-negative, got {}",
                        c
                    )));
                }
                RateMode::Concentration(c)
            }
            (None, Some(p)) => {
                if !(p >= 0.0 && p.is_finite()) {
                    return Err(FeedError::config(format!(
                        "parcelsPerSecond must be non-negative, got {}",
                        p
                    )));
                }
                RateMode::ParcelsPerSecond(p)
            }
        };
        if !(config.duration > 0.0 && config.duration.is_finite()) {
            return Err(FeedError::config(format!(
                "duration must be positive, got {}",
                config.duration
            )));
        }

        Ok(Self {
            patch_name: config.patch_name.clone(),
            start: config.start,
            duration: config.duration,
            mode,
            u0: config.u0,
            phi_name: config.phi.clone(),
            rho_name: config.rho.clone(),
            size: config.size_distribution.build()?,
            rng: StdRng::seed_from_u64(config.seed),
            quota: QuotaState::default(),
            snapshot: None,
        })
    }

    fn snapshot(&self) -> FeedResult<&PatchSnapshot> {
        self.snapshot
            .as_ref()
            .ok_or_else(|| FeedError::unresolved(&self.patch_name))
    }

    /// Overlap of `[time0, time1]` with the active interval: the clamped
    /// start instant and the clamped length (zero when disjoint).
    fn clamp_window(&self, time0: f64, time1: f64) -> (f64, f64) {
        let c0 = time0.max(self.start);
        let c1 = time1.min(self.start + self.duration);
        (c0, (c1 - c0).max(0.0))
    }

    fn mean_parcel_volume(&self) -> f64 {
        *self.quota.mean_volume.get_or_init(|| self.size.mean_volume())
    }
}

impl InjectionModel for PatchFlowRateInjection {
    fn resolve_geometry(&mut self, mesh: &dyn PatchGeometry, comm: &dyn Reduce) -> FeedResult<()> {
        self.snapshot = Some(PatchSnapshot::resolve(&self.patch_name, mesh, comm)?);
        Ok(())
    }

    fn time_end(&self) -> f64 {
        self.start + self.duration
    }

    fn volume_to_inject(
        &self,
        carrier: &dyn CarrierFields,
        time0: f64,
        time1: f64,
    ) -> FeedResult<f64> {
        let snap = self.snapshot()?;
        let fraction = snap.fraction;
        let (window_start, dt) = self.clamp_window(time0, time1);
        if dt <= 0.0 || fraction <= 0.0 {
            return Ok(0.0);
        }
        match self.mode {
            RateMode::Concentration(concentration) => {
                let phi = carrier
                    .field_at_patch(&self.phi_name, &self.patch_name, window_start)
                    .ok_or_else(|| FeedError::unknown_field(&self.phi_name, &self.patch_name))?;
                let rho = carrier
                    .field_at_patch(&self.rho_name, &self.patch_name, window_start)
                    .ok_or_else(|| FeedError::unknown_field(&self.rho_name, &self.patch_name))?;
                if !(rho > 0.0) {
                    return Err(FeedError::config(format!(
                        "carrier density `{}` must be positive, got {}",
                        self.rho_name, rho
                    )));
                }
                if phi < 0.0 {
                    // signed relative to the outward patch normal
                    warn!(
                        patch = %self.patch_name,
                        flux = phi,
                        outward = ?snap.normal,
                        "carrier flux points into the domain; metering on its magnitude"
                    );
                }
                let flow_rate = phi.abs() / rho;
                Ok(fraction * concentration * flow_rate * dt)
            }
            RateMode::ParcelsPerSecond(pps) => {
                let count = (pps * dt * fraction).round();
                Ok(count * self.mean_parcel_volume())
            }
        }
    }

    fn parcels_to_inject(
        &mut self,
        carrier: &dyn CarrierFields,
        time0: f64,
        time1: f64,
    ) -> FeedResult<usize> {
        let fraction = self.snapshot()?.fraction;
        let (_, dt) = self.clamp_window(time0, time1);
        if dt <= 0.0 || fraction <= 0.0 {
            return Ok(0);
        }
        let mode = self.mode;
        match mode {
            RateMode::Concentration(_) => {
                let volume = self.volume_to_inject(carrier, time0, time1)?;
                // distributions guarantee a positive mean volume
                let raw = volume / self.mean_parcel_volume() + self.quota.remainder;
                let count = raw.floor();
                self.quota.remainder = raw - count;
                Ok(count as usize)
            }
            RateMode::ParcelsPerSecond(pps) => Ok((pps * dt * fraction).round() as usize),
        }
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DistributionConfig;
    use carrier::comm::SerialComm;
    use carrier::fields::UniformCarrier;
    use carrier::mesh::BoundaryPatch;

    struct RemoteArea(f64);

    impl Reduce for RemoteArea {
        fn global_sum(&self, local: f64) -> f64 {
            self.0 + local
        }
    }

    fn unit_patch() -> BoundaryPatch {
        BoundaryPatch::rectangle(
            "inlet",
            DVec3::ZERO,
            DVec3::X,
            DVec3::Y,
            2,
            2,
            0,
            0.1,
        )
    }

    fn concentration_config(concentration: f64) -> PatchFlowRateConfig {
        PatchFlowRateConfig {
            patch_name: "inlet".to_string(),
            start: 0.0,
            duration: 10.0,
            concentration: Some(concentration),
            parcels_per_second: None,
            u0: DVec3::new(0.0, 0.0, -1.0),
            phi: "phi".to_string(),
            rho: "rho".to_string(),
            size_distribution: DistributionConfig::FixedValue { value: 1e-3 },
            seed: 42,
        }
    }

    fn resolved(config: &PatchFlowRateConfig) -> PatchFlowRateInjection {
        let mut model = PatchFlowRateInjection::new(config).unwrap();
        model.resolve_geometry(&unit_patch(), &SerialComm).unwrap();
        model
    }

    fn carrier(phi: f64, rho: f64) -> UniformCarrier {
        UniformCarrier::new().with_field("phi", phi).with_field("rho", rho)
    }

    #[test]
    fn test_rate_options_are_mutually_exclusive() {
        let mut config = concentration_config(0.01);
        config.parcels_per_second = Some(100.0);
        let Err(err) = PatchFlowRateInjection::new(&config) else {
            panic!("expected error");
        };
        assert!(matches!(err, FeedError::RateConflict { .. }));
    }

    #[test]
    fn test_missing_rate_is_rejected() {
        let mut config = concentration_config(0.01);
        config.concentration = None;
        let Err(err) = PatchFlowRateInjection::new(&config) else {
            panic!("expected error");
        };
        assert!(matches!(err, FeedError::MissingRate { .. }));
    }

    #[test]
    fn test_non_positive_duration_is_rejected() {
        let mut config = concentration_config(0.01);
        config.duration = 0.0;
        assert!(PatchFlowRateInjection::new(&config).is_err());
        config.duration = -1.0;
        assert!(PatchFlowRateInjection::new(&config).is_err());
    }

    #[test]
    fn test_queries_before_resolution_fail() {
        let mut model = PatchFlowRateInjection::new(&concentration_config(0.01)).unwrap();
        let carrier = carrier(1.0, 1000.0);
        assert!(matches!(
            model.volume_to_inject(&carrier, 0.0, 0.1),
            Err(FeedError::Unresolved { .. })
        ));
        assert!(matches!(
            model.parcels_to_inject(&carrier, 0.0, 0.1),
            Err(FeedError::Unresolved { .. })
        ));
        assert!(matches!(
            model.set_position_and_cell(0, 1, 0.0),
            Err(FeedError::Unresolved { .. })
        ));
    }

    #[test]
    fn test_window_outside_active_interval_is_zero() {
        let mut config = concentration_config(0.01);
        config.start = 1.0;
        config.duration = 2.0;
        let mut model = resolved(&config);
        let carrier = carrier(2.0, 1000.0);

        assert_eq!(model.volume_to_inject(&carrier, 0.0, 0.5).unwrap(), 0.0);
        assert_eq!(model.volume_to_inject(&carrier, 3.5, 4.0).unwrap(), 0.0);
        assert_eq!(model.parcels_to_inject(&carrier, 3.5, 4.0).unwrap(), 0);

        // straddling the start clamps to the overlapping half
        let straddle = model.volume_to_inject(&carrier, 0.5, 1.5).unwrap();
        let inside = model.volume_to_inject(&carrier, 1.5, 2.0).unwrap();
        assert!((straddle - inside).abs() < 1e-18);
    }

    #[test]
    fn test_volume_follows_flux_concentration_and_window() {
        let model = resolved(&concentration_config(0.01));
        let carrier = carrier(2.0, 1000.0);
        // fraction 1 * conc 0.01 * (|2| / 1000) * 0.5 s
        let volume = model.volume_to_inject(&carrier, 1.0, 1.5).unwrap();
        assert!((volume - 1e-5).abs() < 1e-18, "got {}", volume);
    }

    #[test]
    fn test_negative_flux_meters_on_magnitude() {
        let model = resolved(&concentration_config(0.01));
        let outward = model.volume_to_inject(&carrier(2.0, 1000.0), 0.0, 1.0).unwrap();
        let inward = model.volume_to_inject(&carrier(-2.0, 1000.0), 0.0, 1.0).unwrap();
        assert_eq!(outward, inward);
        assert!(outward > 0.0);
    }

    #[test]
    fn test_missing_field_surfaces_unknown_field() {
        let model = resolved(&concentration_config(0.01));
        let no_rho = UniformCarrier::new().with_field("phi", 2.0);
        let err = model.volume_to_inject(&no_rho, 0.0, 1.0).unwrap_err();
        match err {
            FeedError::UnknownField { field, patch } => {
                assert_eq!(field, "rho");
                assert_eq!(patch, "inlet");
            }
            other => panic!("unexpected error {:?}", other.to_string()),
        }
    }

    #[test]
    fn test_non_positive_density_is_rejected() {
        let model = resolved(&concentration_config(0.01));
        let err = model.volume_to_inject(&carrier(2.0, 0.0), 0.0, 1.0).unwrap_err();
        assert!(matches!(err, FeedError::Config(_)));
    }

    #[test]
    fn test_fixed_rate_mode_ignores_carrier() {
        let mut config = concentration_config(0.0);
        config.concentration = None;
        config.parcels_per_second = Some(100.0);
        let mut model = resolved(&config);

        // no fields registered at all
        let empty = UniformCarrier::new();
        assert_eq!(model.parcels_to_inject(&empty, 0.0, 0.1).unwrap(), 10);

        let mean = std::f64::consts::FRAC_PI_6 * 1e-9;
        let volume = model.volume_to_inject(&empty, 0.0, 0.1).unwrap();
        assert!((volume - 10.0 * mean).abs() < 1e-18);
    }

    #[test]
    fn test_remainder_carries_between_windows() {
        // each window asks for 0.7 parcels; counts must go 0,1,1,0,1
        let mean = std::f64::consts::FRAC_PI_6 * 1e-9;
        let mut model = resolved(&concentration_config(7.0 * mean));
        let carrier = carrier(1.0, 1.0);

        let counts: Vec<usize> = (0..5)
            .map(|k| {
                let t0 = k as f64 * 0.1;
                model.parcels_to_inject(&carrier, t0, t0 + 0.1).unwrap()
            })
            .collect();
        assert_eq!(counts, vec![0, 1, 1, 0, 1]);
        assert_eq!(counts.iter().sum::<usize>(), 3);
    }

    #[test]
    fn test_placement_requires_local_faces() {
        let mut model = PatchFlowRateInjection::new(&concentration_config(0.01)).unwrap();
        let empty = BoundaryPatch::from_faces("inlet", Vec::new());
        model.resolve_geometry(&empty, &RemoteArea(2.0)).unwrap();

        let err = model.set_position_and_cell(0, 1, 0.0).unwrap_err();
        assert!(matches!(err, FeedError::NoCandidateCells { .. }));
    }

    #[test]
    fn test_set_properties_samples_fresh_diameters() {
        let mut config = concentration_config(0.01);
        config.size_distribution = DistributionConfig::Uniform {
            min_value: 1e-4,
            max_value: 5e-4,
        };
        let mut model = resolved(&config);

        let placement = model.set_position_and_cell(0, 1, 0.0).unwrap();
        let mut diameters = Vec::new();
        for i in 0..8 {
            let mut parcel = Parcel::new(placement.position, placement.cell, placement.face);
            model.set_properties(i, 8, 0.0, &mut parcel);
            assert!(parcel.diameter >= 1e-4 && parcel.diameter <= 5e-4);
            assert_eq!(parcel.velocity, DVec3::new(0.0, 0.0, -1.0));
            diameters.push(parcel.diameter);
        }
        assert!(
            diameters.windows(2).any(|w| w[0] != w[1]),
            "expected fresh samples, got {:?}",
            diameters
        );
    }

    #[test]
    fn test_clone_replays_identical_stream() {
        let mut config = concentration_config(0.01);
        config.size_distribution = DistributionConfig::RosinRammler {
            min_value: 1e-4,
            max_value: 3e-3,
            d: 1e-3,
            n: 3.0,
        };
        let mut model = resolved(&config);
        let mut copy = model.boxed_clone();

        let placement = model.set_position_and_cell(0, 1, 0.0).unwrap();
        for i in 0..10 {
            let mut a = Parcel::new(placement.position, placement.cell, placement.face);
            let mut b = a;
            model.set_properties(i, 10, 0.0, &mut a);
            copy.set_properties(i, 10, 0.0, &mut b);
            assert_eq!(a.diameter, b.diameter);
        }
    }

    #[test]
    fn test_capability_flags() {
        let model = resolved(&concentration_config(0.01));
        assert!(!model.fully_described());
        assert!(model.valid_injection(0));
        assert!(model.valid_injection(1_000_000));
        assert_eq!(model.time_end(), 10.0);
    }
}
