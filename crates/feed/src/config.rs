//! Injector configuration.
//!
//! Typed mirrors of the solver-side dictionaries, camelCase keys included
//! (`patchName`, `parcelsPerSecond`, `U0`). The `model` tag picks the
//! injection model; the nested `sizeDistribution` block is tagged by
//! `type`. Everything a model needs is fixed here at construction time.

use crate::distribution::{FixedValue, RosinRammler, SizeDistribution, TruncatedNormal, Uniform};
use crate::error::FeedResult;
use glam::DVec3;
use serde::{Deserialize, Serialize};

/// Injection model selection plus its parameters.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "model")]
pub enum InjectionConfig {
    /// Injection disabled.
    #[serde(rename = "none")]
    None,
    /// Fixed volume spread uniformly over the duration.
    #[serde(rename = "patchInjection")]
    Patch(PatchInjectionConfig),
    /// Volume metered by the carrier flow through the patch.
    #[serde(rename = "patchFlowRateInjection")]
    PatchFlowRate(PatchFlowRateConfig),
}

/// Parameters for the flow-rate-metered model.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatchFlowRateConfig {
    /// Boundary patch to inject through
    pub patch_name: String,

    /// Injection start time in seconds
    #[serde(default)]
    pub start: f64,

    /// Injection duration in seconds
    pub duration: f64,

    /// Injected particle volume per unit carrier volume. Mutually
    /// exclusive with `parcelsPerSecond`.
    #[serde(default)]
    pub concentration: Option<f64>,

    /// Fixed parcel rate decoupled from the carrier flow. Mutually
    /// exclusive with `concentration`.
    #[serde(default)]
    pub parcels_per_second: Option<f64>,

    /// Initial parcel velocity
    #[serde(rename = "U0", default, with = "dvec3_serde")]
    pub u0: DVec3,

    /// Carrier flux field name
    #[serde(default = "default_phi_name")]
    pub phi: String,

    /// Carrier density field name
    #[serde(default = "default_rho_name")]
    pub rho: String,

    /// Parcel diameter distribution
    pub size_distribution: DistributionConfig,

    /// RNG seed for diameter sampling
    #[serde(default = "default_seed")]
    pub seed: u64,
}

/// Parameters for the fixed-rate model.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatchInjectionConfig {
    /// Boundary patch to inject through
    pub patch_name: String,

    /// Injection start time in seconds
    #[serde(default)]
    pub start: f64,

    /// Injection duration in seconds
    pub duration: f64,

    /// Total particle volume injected over the full duration
    pub volume_total: f64,

    /// Parcel creation rate
    pub parcels_per_second: f64,

    /// Initial parcel velocity
    #[serde(rename = "U0", default, with = "dvec3_serde")]
    pub u0: DVec3,

    /// Parcel diameter distribution
    pub size_distribution: DistributionConfig,

    /// RNG seed for diameter sampling
    #[serde(default = "default_seed")]
    pub seed: u64,
}

fn default_phi_name() -> String {
    "phi".to_string()
}
fn default_rho_name() -> String {
    "rho".to_string()
}
fn default_seed() -> u64 {
    42
}

/// Parcel diameter distribution selection.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum DistributionConfig {
    #[serde(rename = "fixedValue")]
    FixedValue { value: f64 },

    #[serde(rename = "uniform", rename_all = "camelCase")]
    Uniform { min_value: f64, max_value: f64 },

    #[serde(rename = "normal", rename_all = "camelCase")]
    Normal {
        expectation: f64,
        std_dev: f64,
        min_value: f64,
        max_value: f64,
    },

    #[serde(rename = "RosinRammler", rename_all = "camelCase")]
    RosinRammler {
        min_value: f64,
        max_value: f64,
        d: f64,
        n: f64,
    },
}

impl DistributionConfig {
    /// Build the sampler this config describes.
    pub fn build(&self) -> FeedResult<Box<dyn SizeDistribution>> {
        match *self {
            Self::FixedValue { value } => Ok(Box::new(FixedValue::new(value)?)),
            Self::Uniform {
                min_value,
                max_value,
            } => Ok(Box::new(Uniform::new(min_value, max_value)?)),
            Self::Normal {
                expectation,
                std_dev,
                min_value,
                max_value,
            } => Ok(Box::new(TruncatedNormal::new(
                expectation,
                std_dev,
                min_value,
                max_value,
            )?)),
            Self::RosinRammler {
                min_value,
                max_value,
                d,
                n,
            } => Ok(Box::new(RosinRammler::new(min_value, max_value, d, n)?)),
        }
    }
}

impl InjectionConfig {
    /// Parse from a JSON string.
    pub fn from_json(text: &str) -> FeedResult<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Parse from a YAML string.
    pub fn from_yaml(text: &str) -> FeedResult<Self> {
        Ok(serde_yaml::from_str(text)?)
    }

    /// Load configuration from JSON file
    pub fn load_json(path: &std::path::Path) -> FeedResult<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Load configuration from YAML file
    pub fn load_yaml(path: &std::path::Path) -> FeedResult<Self> {
        let yaml = std::fs::read_to_string(path)?;
        Self::from_yaml(&yaml)
    }

    /// Save configuration to JSON file
    pub fn save_json(&self, path: &std::path::Path) -> FeedResult<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Save configuration to YAML file
    pub fn save_yaml(&self, path: &std::path::Path) -> FeedResult<()> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }
}

/// Custom serde module for DVec3 (glam doesn't have serde by default)
mod dvec3_serde {
    use glam::DVec3;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    #[derive(Serialize, Deserialize)]
    struct DVec3Repr {
        x: f64,
        y: f64,
        z: f64,
    }

    pub fn serialize<S>(vec: &DVec3, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        DVec3Repr {
            x: vec.x,
            y: vec.y,
            z: vec.z,
        }
        .serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DVec3, D::Error>
    where
        D: Deserializer<'de>,
    {
        let repr = DVec3Repr::deserialize(deserializer)?;
        Ok(DVec3::new(repr.x, repr.y, repr.z))
    }
}
