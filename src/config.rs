use std::env;

use tracing::info;

use crate::error::ConfigError;
use crate::types::DEFAULT_MAP_ID;

/// SDK version requested when `MAPS_VERSION` is unset.
pub const DEFAULT_VERSION: &str = "beta";
/// SDK library requested when `MAPS_LIBRARIES` is unset.
pub const DEFAULT_LIBRARY: &str = "marker";

/// Widget configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WidgetConfig {
    /// Key handed to the SDK loader. Never validated or rotated here.
    pub api_key: String,
    /// Map style identifier used at map construction.
    pub map_id: String,
    pub version: String,
    pub libraries: Vec<String>,
}

impl WidgetConfig {
    /// Load configuration from environment variables.
    ///
    /// `MAPS_API_KEY` is required; `MAPS_MAP_ID`, `MAPS_VERSION` and
    /// `MAPS_LIBRARIES` (comma separated) fall back to defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`WidgetConfig::from_env`] over an arbitrary lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let api_key = lookup("MAPS_API_KEY")
            .filter(|v| !v.trim().is_empty())
            .ok_or(ConfigError::Missing("MAPS_API_KEY"))?;

        let map_id = lookup("MAPS_MAP_ID").unwrap_or_else(|| DEFAULT_MAP_ID.to_string());
        let version = lookup("MAPS_VERSION").unwrap_or_else(|| DEFAULT_VERSION.to_string());

        let libraries = match lookup("MAPS_LIBRARIES") {
            Some(raw) => {
                let libraries: Vec<String> = raw
                    .split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(String::from)
                    .collect();
                if libraries.is_empty() {
                    return Err(ConfigError::Invalid {
                        key: "MAPS_LIBRARIES",
                        reason: "no library names".to_string(),
                    });
                }
                libraries
            }
            None => vec![DEFAULT_LIBRARY.to_string()],
        };

        Ok(Self {
            api_key,
            map_id,
            version,
            libraries,
        })
    }

    /// Log the configuration with the API key redacted.
    pub fn log_redacted(&self) {
        info!(
            api_key = %redact(&self.api_key),
            map_id = %self.map_id,
            version = %self.version,
            libraries = ?self.libraries,
            "widget config"
        );
    }
}

fn redact(value: &str) -> String {
    let visible: String = value.chars().take(4).collect();
    if value.chars().count() <= 4 {
        "****".to_string()
    } else {
        format!("{visible}****")
    }
}
