//! Bridge configuration
//!
//! Typed settings for the marshalling layer, loadable from YAML or TOML.
//!
//! # Example graphbridge.yaml
//!
//! ```yaml
//! # unchecked (default) or checked
//! narrowing: checked
//!
//! # Device used by NDArray::empty_default
//! default_device: cpu:0
//!
//! # Upper bound on identifier array length
//! max_id_array_len: 1000000
//! ```

use crate::error::{BridgeError, BridgeResult};
use graphbridge_types::DeviceContext;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// How the id-array converter treats values that do not fit in `i64`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NarrowingPolicy {
    /// Plain `as` cast: wraps wide unsigned values, truncates and saturates floats
    #[default]
    Unchecked,
    /// Reject any element whose value changes through the cast
    Checked,
}

/// graphbridge configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Numeric narrowing policy for id-array conversion
    pub narrowing: NarrowingPolicy,

    /// Device for arrays allocated without an explicit device
    pub default_device: DeviceContext,

    /// Maximum accepted length of an id-array conversion input
    pub max_id_array_len: Option<usize>,
}

impl BridgeConfig {
    /// Load configuration from a YAML string
    pub fn from_yaml(content: &str) -> BridgeResult<Self> {
        let config: Self = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML string
    pub fn from_toml(content: &str) -> BridgeResult<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a file, picking the format by extension
    ///
    /// `.toml` is parsed as TOML; anything else as YAML.
    pub fn from_file(path: &Path) -> BridgeResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Self::from_toml(&content)?,
            _ => Self::from_yaml(&content)?,
        };
        log::debug!("loaded bridge config from {}", path.display());
        Ok(config)
    }

    fn validate(&self) -> BridgeResult<()> {
        if self.max_id_array_len == Some(0) {
            return Err(BridgeError::config("max_id_array_len must be positive"));
        }
        if self.default_device.index < 0 {
            return Err(BridgeError::config(format!(
                "default_device index must be non-negative, got {}",
                self.default_device
            )));
        }
        Ok(())
    }
}
