use thiserror::Error;

/// Errors produced while loading or validating a configuration document.
///
/// Every variant is fatal at load time (SPEC_FULL.md §7): the caller is
/// expected to report and exit, not retry.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The document could not be read from disk.
    #[error("failed to read config file {path}: {source}")]
    Io {
        /// Path that could not be read.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The document's YAML could not be parsed into the schema shape.
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),
    /// The document parsed but failed a semantic validation rule.
    #[error("invalid config: {0}")]
    Validation(String),
}
