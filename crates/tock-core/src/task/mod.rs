//! Task queue model.
//!
//! Tasks are plain values owned by [`TaskStore`]; everything handed out of
//! the store is a clone.

mod stats;
mod store;

pub use stats::Stats;
pub use store::{TaskStore, KEY_ACTIVE_ID, KEY_STATS, KEY_TASKS};

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

pub const DEFAULT_DURATION_MINUTES: u32 = 25;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    #[serde(default = "new_task_id")]
    pub id: String,
    pub name: String,
    #[serde(
        default = "default_duration",
        alias = "durMins",
        deserialize_with = "lenient_duration"
    )]
    pub duration_minutes: u32,
    #[serde(default, deserialize_with = "truthy")]
    pub done: bool,
    #[serde(default, alias = "repeatCount")]
    pub repeat_count: u32,
    #[serde(default = "Utc::now", alias = "createdAt", deserialize_with = "lenient_timestamp")]
    pub created_at: DateTime<Utc>,
}

impl Task {
    /// A fresh, not-done task. `duration_minutes` of zero takes the default.
    pub fn new(name: &str, duration_minutes: u32) -> Self {
        Self {
            id: new_task_id(),
            name: name.trim().to_string(),
            duration_minutes: if duration_minutes == 0 {
                DEFAULT_DURATION_MINUTES
            } else {
                duration_minutes
            },
            done: false,
            repeat_count: 0,
            created_at: Utc::now(),
        }
    }

    pub fn duration_secs(&self) -> u64 {
        u64::from(self.duration_minutes).saturating_mul(60)
    }
}

/// Which slice of the queue a listing shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskFilter {
    #[default]
    All,
    Active,
    Done,
}

impl TaskFilter {
    pub fn matches(&self, task: &Task) -> bool {
        match self {
            TaskFilter::All => true,
            TaskFilter::Active => !task.done,
            TaskFilter::Done => task.done,
        }
    }
}

impl fmt::Display for TaskFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TaskFilter::All => "all",
            TaskFilter::Active => "active",
            TaskFilter::Done => "done",
        })
    }
}

impl FromStr for TaskFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "all" => Ok(TaskFilter::All),
            "active" => Ok(TaskFilter::Active),
            "done" => Ok(TaskFilter::Done),
            other => Err(format!("unknown filter '{other}' (expected all, active or done)")),
        }
    }
}

fn new_task_id() -> String {
    Uuid::new_v4().to_string()
}

fn default_duration() -> u32 {
    DEFAULT_DURATION_MINUTES
}

/// Anything but a positive whole number becomes the default duration.
fn lenient_duration<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(value
        .as_u64()
        .filter(|&n| n > 0)
        .and_then(|n| u32::try_from(n).ok())
        .unwrap_or(DEFAULT_DURATION_MINUTES))
}

/// RFC 3339 text or epoch milliseconds; anything else is "now".
fn lenient_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    let parsed = match &value {
        serde_json::Value::String(s) => DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|t| t.with_timezone(&Utc)),
        serde_json::Value::Number(n) => n.as_i64().and_then(DateTime::from_timestamp_millis),
        _ => None,
    };
    Ok(parsed.unwrap_or_else(Utc::now))
}

/// JSON truthiness: `false`, `null`, `0` and `""` are false.
fn truthy<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Null => false,
        serde_json::Value::Bool(b) => b,
        serde_json::Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        serde_json::Value::String(s) => !s.is_empty(),
        serde_json::Value::Array(_) | serde_json::Value::Object(_) => true,
    })
}
