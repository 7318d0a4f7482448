//! Error types.
//!
//! Most adapter failures are silent by design of the widget (a container that
//! is not attached yet, a marker without a title). The errors below cover the
//! edges: configuration, fixture data, SDK loading and page bootstrap.

use thiserror::Error;

/// Configuration could not be read from the environment.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} environment variable is required")]
    Missing(&'static str),

    #[error("{key} is invalid: {reason}")]
    Invalid { key: &'static str, reason: String },
}

/// A marker fixture could not be decoded.
#[derive(Debug, Error)]
pub enum FixtureError {
    #[error("fixture {name} is not valid marker JSON: {source}")]
    Decode {
        name: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

/// The mapping SDK failed to load.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    #[error("mapping SDK rejected the API key")]
    Unauthorized,

    #[error("mapping SDK failed to load: {0}")]
    Failed(String),
}

/// The application could not be mounted into the page.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BootstrapError {
    #[error("mount point #{0} not found in document")]
    MissingMountPoint(String),
}
