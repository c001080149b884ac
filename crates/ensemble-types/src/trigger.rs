use serde::{Deserialize, Serialize};
use std::fmt;

/// A rule's firing condition: a lifecycle phase, a metric recomputation, the
/// heartbeat timer, or a specific job event.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Trigger {
    /// Fired exactly once, before the first event is processed.
    Start,
    /// Fired once per ingested record, after metrics for that record update.
    Metric,
    /// Fired on every heartbeat tick.
    Heartbeat,
    /// Fired once per occurrence of the named job lifecycle event
    /// (`submit`, `start`, `finish`, ...).
    Job(String),
}

impl Trigger {
    /// Parse the `trigger` field's wire form (`"start"`, `"metric"`,
    /// `"heartbeat"`, or `"job-<event>"`).
    pub fn parse(raw: &str) -> Result<Self, String> {
        match raw {
            "start" => Ok(Trigger::Start),
            "metric" => Ok(Trigger::Metric),
            "heartbeat" => Ok(Trigger::Heartbeat),
            other => other
                .strip_prefix("job-")
                .filter(|e| !e.is_empty())
                .map(|e| Trigger::Job(e.to_string()))
                .ok_or_else(|| format!("unrecognised trigger '{other}'")),
        }
    }
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Trigger::Start => write!(f, "start"),
            Trigger::Metric => write!(f, "metric"),
            Trigger::Heartbeat => write!(f, "heartbeat"),
            Trigger::Job(event) => write!(f, "job-{event}"),
        }
    }
}

impl TryFrom<String> for Trigger {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Trigger::parse(&value)
    }
}

impl From<Trigger> for String {
    fn from(value: Trigger) -> Self {
        value.to_string()
    }
}
