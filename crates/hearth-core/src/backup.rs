//! Whole-household backup documents.
//!
//! ```json
//! {
//!   "exported_at": "2024-03-06T18:00:00.000Z",
//!   "config_snapshot": { ...merged catalog... },
//!   "logs": [ ... ],
//!   "prefs": { "currentUserId": "ana", "route": "today", "expressEnabled": false }
//! }
//! ```
//!
//! Importing replaces the local log list and, when present, the preferences.
//! The catalog snapshot is informational and never restored.

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::catalog::Catalog;
use crate::error::{HearthError, Result};
use crate::model::CompletionLog;
use crate::prefs::Preferences;
use crate::store::kv::{KvStore, keys, write_json};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackupDocument {
    pub exported_at: String,
    #[serde(default)]
    pub config_snapshot: Value,
    pub logs: Vec<CompletionLog>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefs: Option<Preferences>,
}

/// What an import changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RestoreReport {
    pub logs: usize,
    pub prefs_restored: bool,
}

impl BackupDocument {
    pub fn export(
        catalog: &Catalog,
        logs: Vec<CompletionLog>,
        prefs: &Preferences,
        now: DateTime<Utc>,
    ) -> Result<Self> {
        Ok(Self {
            exported_at: now.to_rfc3339_opts(SecondsFormat::Millis, true),
            config_snapshot: serde_json::to_value(catalog)?,
            logs,
            prefs: Some(prefs.clone()),
        })
    }

    /// Parse and validate a backup. `logs` must be an array of logs.
    pub fn parse(raw: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(raw)
            .map_err(|err| HearthError::InvalidBackup(format!("not JSON: {err}")))?;
        let Some(map) = value.as_object() else {
            return Err(HearthError::InvalidBackup("expected a JSON object".to_string()));
        };
        if !map.get("logs").is_some_and(Value::is_array) {
            return Err(HearthError::InvalidBackup("missing `logs` array".to_string()));
        }

        let exported_at = map
            .get("exported_at")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let config_snapshot = map.get("config_snapshot").cloned().unwrap_or(Value::Null);
        let raw_logs = map.get("logs").cloned().unwrap_or_default();
        let logs: Vec<CompletionLog> = serde_json::from_value(raw_logs)
            .map_err(|err| HearthError::InvalidBackup(format!("bad log entry: {err}")))?;
        let prefs = match map.get("prefs") {
            None | Some(Value::Null) => None,
            Some(raw) => Some(
                serde_json::from_value::<Preferences>(raw.clone())
                    .map_err(|err| HearthError::InvalidBackup(format!("bad prefs: {err}")))?,
            ),
        };

        Ok(Self {
            exported_at,
            config_snapshot,
            logs,
            prefs,
        })
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Overwrite the local log list and, if carried, the preferences.
    pub fn restore(&self, kv: &dyn KvStore) -> Result<RestoreReport> {
        write_json(kv, keys::LOGS, &self.logs)?;
        if let Some(prefs) = &self.prefs {
            prefs.save(kv)?;
        }
        tracing::info!(
            logs = self.logs.len(),
            prefs = self.prefs.is_some(),
            "backup restored"
        );
        Ok(RestoreReport {
            logs: self.logs.len(),
            prefs_restored: self.prefs.is_some(),
        })
    }
}

/// Default download name, e.g. `hearth_backup_2024-03-06.json`.
#[must_use]
pub fn file_name(date: NaiveDate) -> String {
    format!("hearth_backup_{}.json", date.format("%Y-%m-%d"))
}
