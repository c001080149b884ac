use serde::{Deserialize, Serialize};

use crate::{Action, Trigger, When};

/// A trigger -> action binding, optionally guarded by a metric threshold.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Rule {
    /// The condition that makes this rule eligible to fire.
    pub trigger: Trigger,
    /// Defaults to the trigger's own name; for `metric` triggers this is a
    /// dotted path into the metrics tree (`"mean.grpA-duration"`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Optional value guard, evaluated against the resolved metric reading.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub when: Option<When>,
    /// What to do when this rule fires.
    pub action: Action,
}

impl Rule {
    /// The effective name used for metric-path resolution: `name` if given,
    /// else the trigger's own display form.
    pub fn effective_name(&self) -> String {
        self.name.clone().unwrap_or_else(|| self.trigger.to_string())
    }

    /// A rule is disabled once its action has exhausted its repetitions.
    pub fn is_disabled(&self) -> bool {
        self.action.finished()
    }
}
