//! Error type for injector construction and per-window queries.

use thiserror::Error;

pub type FeedResult<T> = Result<T, FeedError>;

#[derive(Debug, Error)]
pub enum FeedError {
    /// The mesh has no patch by this name.
    #[error("patch `{patch}` not found in the mesh")]
    UnknownPatch { patch: String },

    /// The patch exists but its global area is zero, so no area fraction
    /// can be derived.
    #[error("patch `{patch}` has zero global area")]
    EmptyPatch { patch: String },

    /// Both rate options were configured; they are mutually exclusive.
    #[error("injector on patch `{patch}`: `concentration` and `parcelsPerSecond` are mutually exclusive")]
    RateConflict { patch: String },

    /// Neither rate option was configured.
    #[error("injector on patch `{patch}`: one of `concentration` or `parcelsPerSecond` is required")]
    MissingRate { patch: String },

    /// Size-distribution parameters do not describe a valid distribution.
    #[error("size distribution `{kind}`: {reason}")]
    InvalidDistribution { kind: &'static str, reason: String },

    /// The carrier cannot answer a configured field name.
    #[error("carrier field `{field}` not available at patch `{patch}`")]
    UnknownField { field: String, patch: String },

    /// A per-window query arrived before geometry resolution.
    #[error("injector on patch `{patch}` queried before geometry resolution")]
    Unresolved { patch: String },

    /// The subdomain owns patch area but has no cells to seed into.
    #[error("patch `{patch}` owns {area} m^2 locally but has no candidate cells")]
    NoCandidateCells { patch: String, area: f64 },

    /// The model does not place parcels (the inert `none` model).
    #[error("injection model `{model}` does not place parcels")]
    NonPlacing { model: &'static str },

    /// Malformed configuration value or unparsable configuration text.
    #[error("configuration error: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl FeedError {
    pub fn unknown_patch(patch: impl Into<String>) -> Self {
        Self::UnknownPatch { patch: patch.into() }
    }

    pub fn unknown_field(field: impl Into<String>, patch: impl Into<String>) -> Self {
        Self::UnknownField {
            field: field.into(),
            patch: patch.into(),
        }
    }

    pub fn unresolved(patch: impl Into<String>) -> Self {
        Self::Unresolved { patch: patch.into() }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }
}

impl From<serde_json::Error> for FeedError {
    fn from(err: serde_json::Error) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<serde_yaml::Error> for FeedError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::Config(err.to_string())
    }
}
