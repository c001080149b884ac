use serde::Deserialize;

use ensemble_types::{JobGroup, Rule};

/// The raw, schema-validated shape of a configuration document before it is
/// organised into a [`crate::RuleStore`]. Mirrors the top-level keys of
/// `ensemble_config_schema` in the original implementation.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigDocument {
    /// Declared job groups; a name may repeat across multiple entries.
    pub jobs: Vec<JobGroup>,
    /// Declared rules, in file order.
    pub rules: Vec<Rule>,
    /// Ambient logging controls.
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Legacy literal source for `custom` actions. Accepted for schema
    /// compatibility; see [`crate::RuleStore::load`] for how it is resolved
    /// (REDESIGN FLAG #1 in SPEC_FULL.md §9 -- not compiled at runtime).
    #[serde(default)]
    pub custom: Option<String>,
}

/// The `logging` block of a configuration document.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Raise the default log filter to `debug` when set and `RUST_LOG` is
    /// not already overriding it.
    #[serde(default)]
    pub debug: bool,
    /// Heartbeat interval in seconds. `None` lets [`crate::RuleStore`] derive
    /// a default when any rule requires one.
    pub heartbeat: Option<u64>,
}
