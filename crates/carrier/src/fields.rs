//! Named carrier-field access at boundary patches.
//!
//! The flow solver owns its fields; injection code only asks for a scalar
//! by name at a patch and time. Flux fields answer with the
//! patch-integrated value (signed positive along the outward normal,
//! already summed over the whole patch, not per subdomain); density
//! fields answer with the representative value at the patch.

use std::collections::HashMap;

/// Scalar field lookup at a patch.
///
/// `None` means the carrier has no field by that name; the caller turns
/// that into its own error.
pub trait CarrierFields {
    fn field_at_patch(&self, field: &str, patch: &str, time: f64) -> Option<f64>;
}

/// Steady uniform fields: one value per name, the same at every patch
/// and time. Test and demo stand-in for a real solver.
#[derive(Clone, Debug, Default)]
pub struct UniformCarrier {
    fields: HashMap<String, f64>,
}

impl UniformCarrier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style field registration.
    pub fn with_field(mut self, name: impl Into<String>, value: f64) -> Self {
        self.fields.insert(name.into(), value);
        self
    }

    pub fn set_field(&mut self, name: impl Into<String>, value: f64) {
        self.fields.insert(name.into(), value);
    }
}

impl CarrierFields for UniformCarrier {
    fn field_at_patch(&self, field: &str, _patch: &str, _time: f64) -> Option<f64> {
        self.fields.get(field).copied()
    }
}
