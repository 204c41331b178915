//! Error types for fatal kernel conditions.
//!
//! Field-level problems are never errors: they are reported as
//! [`ViolationRecord`](crate::ViolationRecord)s. Only conditions that stop a
//! run (unreadable input, an input document of unknown shape, a broken
//! configuration) surface here.

/// Errors that abort a pipeline run.
#[derive(Debug, thiserror::Error)]
pub enum KernelError {
    #[error("failed to read file: {path}: {source}")]
    ReadFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid json at {path}: {source}")]
    ParseJson {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid toml at {path}: {source}")]
    ParseToml {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    /// The input document is not one of the accepted row-collection shapes.
    #[error("unsupported row document: {0}")]
    UnsupportedShape(String),

    /// A configuration value is outside its domain.
    #[error("invalid config: {0}")]
    InvalidConfig(String),
}
