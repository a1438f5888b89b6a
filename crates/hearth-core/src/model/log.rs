use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::canon::Canonicalizer;
use crate::model::Task;
use crate::time::TimeContext;

/// An immutable record that a task was completed.
///
/// Field names match the persisted camelCase layout so local stores, backups
/// and the remote feed share one document shape. `points` and `minutes` are
/// snapshots of the task at creation time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionLog {
    /// Empty when the log has not been assigned an id yet (remote inserts).
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub task_id: String,
    #[serde(default)]
    pub task_name: String,
    #[serde(default)]
    pub user_id: String,
    #[serde(rename = "atISO", default)]
    pub at_iso: String,
    pub date_key: String,
    pub week_key: String,
    #[serde(default)]
    pub points: f64,
    #[serde(default)]
    pub minutes: f64,
    /// Creation time in epoch milliseconds, set by the remote store.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_millis"
    )]
    pub created_at: Option<i64>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl CompletionLog {
    /// Build a fresh log for `task` completed by `user_id` at `ctx.now`.
    #[must_use]
    pub fn for_task(task: &Task, user_id: &str, ctx: &TimeContext) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            task_id: task.id.clone(),
            task_name: task.name.clone(),
            user_id: user_id.to_string(),
            at_iso: ctx.now.to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
            date_key: ctx.date_key.clone(),
            week_key: ctx.week_key.clone(),
            points: task.points,
            minutes: task.minutes,
            created_at: None,
            extra: BTreeMap::new(),
        }
    }

    /// Copy of this log without its id, as sent to the remote store.
    #[must_use]
    pub fn without_id(&self) -> Self {
        Self {
            id: String::new(),
            ..self.clone()
        }
    }

    /// Whether this log counts toward `task_id` once variants are merged.
    #[must_use]
    pub fn matches_task(&self, task_id: &str, canon: &Canonicalizer) -> bool {
        canon.same_task(&self.task_id, task_id)
    }
}

#[allow(clippy::cast_possible_truncation)]
fn lenient_millis<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(raw.and_then(|value| match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite())
                .map(|f| f as i64)
        }),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }))
}
