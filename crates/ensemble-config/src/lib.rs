//! Configuration loading and validation (C3 Rule Store). Grounded on
//! `ensemble/config/config.py` (`EnsembleConfig.parse`, `check_supported`)
//! and `ensemble/config/types.py` (`Rule`, `Action`), reimplemented with
//! `serde_yaml` deserialisation plus the eager validations the original
//! performed with `jsonschema.validate`.
#![deny(unreachable_pub)]
#![deny(missing_docs)]

mod document;
mod error;
mod store;

pub use document::{ConfigDocument, LoggingConfig};
pub use error::ConfigError;
pub use store::{EmptyHandlerCatalog, HandlerCatalog, RuleStore, DEFAULT_HEARTBEAT_SECONDS};

use std::path::Path;

/// Read and load a configuration file from disk.
pub fn load_file(
    path: impl AsRef<Path>,
    supported_triggers: &[&str],
    handlers: &dyn HandlerCatalog,
) -> Result<RuleStore, ConfigError> {
    let path = path.as_ref();
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;
    RuleStore::load(&raw, supported_triggers, handlers)
}
