use std::collections::HashMap;

use ensemble_metrics::MetricsRegistry;
use ensemble_types::{ActionName, JobGroup, Rule, Trigger};

use crate::document::ConfigDocument;
use crate::error::ConfigError;

/// Default heartbeat interval, in seconds, applied when any rule requires a
/// heartbeat but the document does not declare one explicitly.
pub const DEFAULT_HEARTBEAT_SECONDS: u64 = 60;

/// Tells [`RuleStore::load`] which `custom` action labels the embedding
/// binary has a handler registered for. Implemented by `ensemble-engine`'s
/// `HandlerRegistry`; kept as a trait here so this crate does not need to
/// depend on the engine crate's richer handler types.
pub trait HandlerCatalog {
    /// Whether a handler named `label` is registered.
    fn contains(&self, label: &str) -> bool;
}

/// A `HandlerCatalog` that accepts nothing; useful for loading
/// configurations with no `custom` actions, or in tests.
#[derive(Debug, Default)]
pub struct EmptyHandlerCatalog;

impl HandlerCatalog for EmptyHandlerCatalog {
    fn contains(&self, _label: &str) -> bool {
        false
    }
}

/// Parsed, validated configuration: job groups and rules indexed by trigger,
/// ready for the engine to evaluate against.
#[derive(Debug, Clone)]
pub struct RuleStore {
    groups: HashMap<String, Vec<JobGroup>>,
    rules_by_trigger: HashMap<Trigger, Vec<Rule>>,
    heartbeat_interval: Option<u64>,
    debug_logging: bool,
}

impl RuleStore {
    /// Parse, schema-validate, and organise a configuration document.
    ///
    /// `supported_triggers` is the set of trigger names the active executor
    /// understands (SPEC_FULL.md §4.3); `handlers` resolves `custom` action
    /// labels. Both validations are eager: a bad config never reaches the
    /// engine.
    pub fn load(
        raw: &str,
        supported_triggers: &[&str],
        handlers: &dyn HandlerCatalog,
    ) -> Result<Self, ConfigError> {
        let doc: ConfigDocument = serde_yaml::from_str(raw)?;
        Self::from_document(doc, supported_triggers, handlers)
    }

    /// Build a `RuleStore` from an already-parsed document. Exposed
    /// separately from [`RuleStore::load`] so callers that construct
    /// documents programmatically (tests, alternate formats) can skip the
    /// YAML parse.
    pub fn from_document(
        doc: ConfigDocument,
        supported_triggers: &[&str],
        handlers: &dyn HandlerCatalog,
    ) -> Result<Self, ConfigError> {
        if doc.custom.is_some() {
            return Err(ConfigError::Validation(
                "the 'custom' top-level key (literal source for custom actions) is accepted for \
                 schema compatibility but is not compiled at runtime; register a named handler \
                 instead and reference it by 'action.label' (see SPEC_FULL.md REDESIGN FLAG #1)"
                    .to_string(),
            ));
        }

        let supported: std::collections::HashSet<&str> = supported_triggers.iter().copied().collect();
        let mut rules_by_trigger: HashMap<Trigger, Vec<Rule>> = HashMap::new();
        let mut heartbeat_required = false;

        for rule in doc.rules {
            let trigger_name = rule.trigger.to_string();
            if !supported.contains(trigger_name.as_str()) {
                return Err(ConfigError::Validation(format!(
                    "rule trigger '{trigger_name}' is not supported by this executor"
                )));
            }

            if matches!(rule.trigger, Trigger::Metric) {
                let name = rule.effective_name();
                MetricsRegistry::validate_path_syntax(&name)
                    .map_err(ConfigError::Validation)?;
            }

            if matches!(rule.action.name, ActionName::Grow | ActionName::Shrink) {
                heartbeat_required = true;
            }

            if matches!(rule.action.name, ActionName::Custom) {
                let label = rule.action.label.as_deref().ok_or_else(|| {
                    ConfigError::Validation(
                        "a 'custom' action requires a 'label' naming the handler".to_string(),
                    )
                })?;
                if !handlers.contains(label) {
                    return Err(ConfigError::Validation(format!(
                        "no handler named '{label}' is registered for this 'custom' action"
                    )));
                }
            }

            rules_by_trigger
                .entry(rule.trigger.clone())
                .or_default()
                .push(rule);
        }

        let heartbeat_interval = match (doc.logging.heartbeat, heartbeat_required) {
            (Some(0), _) => None,
            (Some(secs), _) => Some(secs),
            (None, true) => Some(DEFAULT_HEARTBEAT_SECONDS),
            (None, false) => None,
        };

        let mut groups: HashMap<String, Vec<JobGroup>> = HashMap::new();
        for group in doc.jobs {
            if group.count == 0 {
                return Err(ConfigError::Validation(format!(
                    "job group '{}' has count=0, must be >= 1",
                    group.name
                )));
            }
            if group.nodes == 0 {
                return Err(ConfigError::Validation(format!(
                    "job group '{}' has nodes=0, must be >= 1",
                    group.name
                )));
            }
            groups.entry(group.name.clone()).or_default().push(group);
        }

        Ok(RuleStore {
            groups,
            rules_by_trigger,
            heartbeat_interval,
            debug_logging: doc.logging.debug,
        })
    }

    /// Rules registered for a trigger, in declaration order. Empty if none.
    pub fn rules_for(&self, trigger: &Trigger) -> &[Rule] {
        self.rules_by_trigger
            .get(trigger)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Mutable access to a trigger's rules, for the executor to advance
    /// repetition/backoff counters in place.
    pub fn rules_for_mut(&mut self, trigger: &Trigger) -> &mut [Rule] {
        self.rules_by_trigger
            .entry(trigger.clone())
            .or_default()
            .as_mut_slice()
    }

    /// All distinct triggers that have at least one rule.
    pub fn triggers(&self) -> impl Iterator<Item = &Trigger> {
        self.rules_by_trigger.keys()
    }

    /// Every occurrence of job groups with the given name, or every group if
    /// `label` is `None`.
    pub fn jobs(&self, label: Option<&str>) -> Vec<&JobGroup> {
        match label {
            Some(name) => self
                .groups
                .get(name)
                .map(|v| v.iter().collect())
                .unwrap_or_default(),
            None => self.groups.values().flatten().collect(),
        }
    }

    /// The heartbeat interval to run on, if any rule requires one.
    pub fn heartbeat_interval(&self) -> Option<u64> {
        self.heartbeat_interval
    }

    /// Whether the document requested elevated log verbosity.
    pub fn debug_logging(&self) -> bool {
        self.debug_logging
    }
}
