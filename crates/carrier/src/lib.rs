//! Continuum-side collaborators for parcel injection.
//!
//! Injection models never own the flow solution. They see the carrier
//! through three narrow seams: boundary-patch geometry ([`mesh`]), named
//! field values at a patch ([`fields`]), and cross-subdomain reductions
//! ([`comm`]). Each seam is a small trait so solvers plug in their own
//! mesh and transport code while tests run against the in-crate stubs.

pub mod comm;
pub mod fields;
pub mod mesh;

pub use comm::{Reduce, SerialComm};
pub use fields::{CarrierFields, UniformCarrier};
pub use mesh::{BoundaryPatch, FaceLocator, PatchFace, PatchGeometry, PatchSet};
