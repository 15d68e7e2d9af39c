//! World configuration

use crate::ecs::{Result, WorldError};
use serde::{Deserialize, Serialize};

/// Default upper bound (exclusive) of the reserved component id range.
pub const HI_COMPONENT_ID: u64 = 256;

/// Settings applied when a world is created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Naming-convention prefix stripped from symbols, e.g. `"Ecs"`.
    pub name_prefix: Option<String>,
    /// Component ids are allocated below this bound, entities above it.
    pub hi_component_id: u64,
    /// Number of execution stages created at startup.
    pub stage_count: usize,
}

impl WorldConfig {
    /// Parse a configuration from JSON text. Missing fields keep their defaults.
    pub fn from_json_str(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(WorldError::Config)
    }

    pub fn with_name_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.name_prefix = Some(prefix.into());
        self
    }

    pub fn with_stage_count(mut self, stage_count: usize) -> Self {
        self.stage_count = stage_count;
        self
    }
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            name_prefix: None,
            hi_component_id: HI_COMPONENT_ID,
            stage_count: 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_fill_missing_fields() {
        let config = WorldConfig::from_json_str(r#"{ "name_prefix": "Ecs" }"#).unwrap();
        assert_eq!(config.name_prefix.as_deref(), Some("Ecs"));
        assert_eq!(config.hi_component_id, HI_COMPONENT_ID);
        assert_eq!(config.stage_count, 1);
    }

    #[test]
    fn test_malformed_config_is_reported() {
        let err = WorldConfig::from_json_str("{ name_prefix: ").unwrap_err();
        assert!(matches!(err, WorldError::Config(_)));
    }
}
