//! Flow-rate-coupled parcel injection for particle-laden flow.
//!
//! Discrete parcels enter the domain at a boundary patch at a rate set by
//! the local carrier flow: a time window and a target concentration fix
//! the injected volume, a size distribution converts volume into parcel
//! counts (fractional parcels carry over between windows), and a
//! deterministic placement rule maps each injection event to a
//! patch-adjacent owner cell. Decomposed runs scale every quota by the
//! subdomain's share of patch area, so global totals match the
//! single-domain answer for any decomposition.
//!
//! Patch geometry, carrier fields and reductions live in the `carrier`
//! crate; this crate only decides when, where and how parcels appear.

pub mod config;
pub mod distribution;
pub mod error;
pub mod injector;
pub mod parcel;

pub use config::{DistributionConfig, InjectionConfig, PatchFlowRateConfig, PatchInjectionConfig};
pub use distribution::{FixedValue, RosinRammler, SizeDistribution, TruncatedNormal, Uniform};
pub use error::{FeedError, FeedResult};
pub use injector::{
    InjectionModel, NoInjection, PatchFlowRateInjection, PatchInjection, Placement,
    build_injection_model,
};
pub use parcel::Parcel;
