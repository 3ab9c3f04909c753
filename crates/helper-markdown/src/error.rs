//! Error types.
//!
//! Rendering never fails; only loading configuration from text does.

/// Configuration loading error.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    /// JSON parsing error.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    /// The document parsed, but its top level is not a table of options.
    #[error("Configuration error: expected a table of options, found {0}")]
    NotATable(&'static str),
    /// A profile name that is neither `standard` nor `classic`.
    #[error("Configuration error: unknown profile `{0}`")]
    UnknownProfile(String),
}
