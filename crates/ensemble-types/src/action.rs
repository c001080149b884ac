use serde::{Deserialize, Serialize};

/// The effect a fired rule has.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionName {
    /// Submit one or more job instances from a declared group.
    Submit,
    /// Invoke a registered handler.
    Custom,
    /// Stop the controller gracefully.
    Terminate,
    /// Grow the compute pool by a delta.
    Grow,
    /// Shrink the compute pool by a delta.
    Shrink,
}

fn default_repetitions() -> u32 {
    1
}

/// A rule's action: what to do when the rule fires, plus the
/// repetition/backoff state machine that decides whether *this* occurrence
/// of the trigger should fire it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Action {
    /// Which effect to perform.
    pub name: ActionName,
    /// Group name (`submit`) or handler name (`custom`); unused otherwise.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Resize magnitude (`grow`/`shrink`); unused otherwise.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    /// How many times this action may still fire. Defaults to 1.
    #[serde(default = "default_repetitions")]
    pub repetitions: u32,
    /// Number of trigger occurrences to skip between firings, once armed.
    /// Absent means "fire on every occurrence until exhausted".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backoff: Option<u32>,

    /// Remaining countdown before the next backoff-gated firing.
    #[serde(skip)]
    pub(crate) backoff_counter: u32,
}

impl Action {
    /// Whether this action has exhausted its repetitions and will never fire
    /// again.
    pub fn finished(&self) -> bool {
        self.repetitions == 0
    }

    /// Decide whether this trigger occurrence should fire the action,
    /// advancing the repetition/backoff state machine per the occurrence.
    ///
    /// Returns `true` exactly when the caller should dispatch the action.
    pub fn perform(&mut self) -> bool {
        if self.finished() {
            return false;
        }
        match self.backoff {
            None => {
                self.repetitions -= 1;
                true
            }
            Some(backoff) => {
                if self.backoff_counter > 0 {
                    self.backoff_counter -= 1;
                    false
                } else {
                    self.backoff_counter = backoff;
                    self.repetitions -= 1;
                    true
                }
            }
        }
    }
}
