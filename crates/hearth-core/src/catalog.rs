//! Task catalog: the household's people, tasks, zones and rewards.
//!
//! The catalog is a versioned document built from two layers:
//!
//! 1. the **base** catalog, a JSON file shipped with the household setup;
//! 2. an optional **override** patch persisted in the kv store.
//!
//! When an override is present its `tasks`, `people`, `rewards` and `zones`
//! fully replace the base values. Everything else comes from the base. Task
//! edits produce a new override containing the full merged lists, so the
//! merge is deterministic and the override can be cleared independently to
//! restore the base catalog.

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

use crate::canon::Canonicalizer;
use crate::error::{HearthError, Result};
use crate::model::{Frequency, Person, Task, person_label};
use crate::time::{Weekday, parse_time_zone};

/// Zone whose tasks are shown to everyone on the Today board.
pub const DEFAULT_SHARED_ZONE: &str = "BossFight";

/// Task ids that together make up the "kitchen closed" KPI.
pub const DEFAULT_CLOSED_SET: [&str; 3] =
    ["cocina_zona_agua", "cocina_superficies", "cocina_guardar"];

const MAX_SLUG_LEN: usize = 40;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppSettings {
    #[serde(default = "default_timezone")]
    pub timezone: String,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            timezone: default_timezone(),
            extra: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rewards {
    #[serde(default)]
    pub family_weekly_reward: String,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// Connection settings for the remote log store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CloudConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(rename = "houseId", default)]
    pub house_id: String,
    #[serde(rename = "firebaseConfig", default)]
    pub firebase_config: Option<Value>,
}

impl CloudConfig {
    /// Enabled, with a house id and connection settings.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled
            && !self.house_id.trim().is_empty()
            && self.firebase_config.as_ref().is_some_and(|v| !v.is_null())
    }

    /// Base URL of the log store, read from `firebaseConfig.databaseURL`.
    #[must_use]
    pub fn database_url(&self) -> Option<&str> {
        self.firebase_config
            .as_ref()
            .and_then(|cfg| cfg.get("databaseURL"))
            .and_then(Value::as_str)
            .map(|url| url.trim_end_matches('/'))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub app: AppSettings,
    #[serde(default)]
    pub people: Vec<Person>,
    #[serde(default)]
    pub tasks: Vec<Task>,
    #[serde(default)]
    pub zones: Vec<String>,
    #[serde(default)]
    pub rewards: Rewards,
    #[serde(default)]
    pub cloud: CloudConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub canonical: Option<Canonicalizer>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub closed_set: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shared_zone: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// Persisted catalog edits. Present fields replace the base catalog's.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogOverride {
    #[serde(default)]
    pub version: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tasks: Option<Vec<Task>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub people: Option<Vec<Person>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rewards: Option<Rewards>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zones: Option<Vec<String>>,
}

impl CatalogOverride {
    /// Snapshot the editable sections of `catalog`.
    #[must_use]
    pub fn from_catalog(catalog: &Catalog, version: u64) -> Self {
        Self {
            version,
            tasks: Some(catalog.tasks.clone()),
            people: Some(catalog.people.clone()),
            rewards: Some(catalog.rewards.clone()),
            zones: Some(catalog.zones.clone()),
        }
    }
}

/// Input for creating or editing a task.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskDraft {
    /// `None` creates a new task with a generated id.
    pub id: Option<String>,
    pub name: String,
    pub zone: String,
    pub assigned_to: String,
    pub frequency: Frequency,
    pub days: Vec<Weekday>,
    pub times_per_week: f64,
    pub points: f64,
    pub minutes: f64,
}

impl Default for TaskDraft {
    fn default() -> Self {
        Self {
            id: None,
            name: String::new(),
            zone: "General".to_string(),
            assigned_to: String::new(),
            frequency: Frequency::WeeklyDays,
            days: vec![Weekday::Mon, Weekday::Wed, Weekday::Fri],
            times_per_week: 2.0,
            points: 1.0,
            minutes: 10.0,
        }
    }
}

impl TaskDraft {
    /// Prefill a draft with an existing task's values.
    #[must_use]
    pub fn from_task(task: &Task) -> Self {
        Self {
            id: Some(task.id.clone()),
            name: task.name.clone(),
            zone: task.zone.clone(),
            assigned_to: task.assigned_to.clone(),
            frequency: task.frequency,
            days: task.days.clone().unwrap_or_default(),
            times_per_week: f64::from(task.times_per_week.unwrap_or(0)),
            points: task.points,
            minutes: task.minutes,
        }
    }
}

/// Result of [`Catalog::upsert_task`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskSaved {
    pub id: String,
    pub created: bool,
}

impl Catalog {
    pub fn from_json_str(raw: &str, origin: &Path) -> Result<Self> {
        let catalog: Self = serde_json::from_str(raw).map_err(|err| HearthError::ConfigParse {
            path: origin.to_path_buf(),
            reason: err.to_string(),
        })?;
        catalog.validate(origin)?;
        Ok(catalog)
    }

    /// Read and validate a catalog document from disk.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(HearthError::CatalogMissing(path.to_path_buf()));
        }
        let raw = std::fs::read_to_string(path)?;
        let catalog = Self::from_json_str(&raw, path)?;
        tracing::debug!(
            path = %path.display(),
            tasks = catalog.tasks.len(),
            people = catalog.people.len(),
            "catalog loaded"
        );
        Ok(catalog)
    }

    fn validate(&self, origin: &Path) -> Result<()> {
        let reject = |reason: String| HearthError::ConfigParse {
            path: origin.to_path_buf(),
            reason,
        };

        let mut seen = HashSet::new();
        for task in &self.tasks {
            if !seen.insert(task.id.as_str()) {
                return Err(reject(format!("duplicate task id '{}'", task.id)));
            }
        }

        let mut seen = HashSet::new();
        for person in &self.people {
            if !seen.insert(person.id.as_str()) {
                return Err(reject(format!("duplicate person id '{}'", person.id)));
            }
        }

        self.time_zone().map(|_| ())
    }

    /// Apply an override patch on top of this (base) catalog.
    #[must_use]
    pub fn with_override(&self, patch: &CatalogOverride) -> Self {
        let mut merged = self.clone();
        if let Some(tasks) = &patch.tasks {
            merged.tasks.clone_from(tasks);
        }
        if let Some(people) = &patch.people {
            merged.people.clone_from(people);
        }
        if let Some(rewards) = &patch.rewards {
            merged.rewards = rewards.clone();
        }
        if let Some(zones) = &patch.zones {
            merged.zones.clone_from(zones);
        }
        merged
    }

    pub fn time_zone(&self) -> Result<Tz> {
        parse_time_zone(&self.app.timezone)
    }

    #[must_use]
    pub fn task(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    #[must_use]
    pub fn person(&self, id: &str) -> Option<&Person> {
        self.people.iter().find(|p| p.id == id)
    }

    #[must_use]
    pub fn person_label(&self, id: &str) -> String {
        person_label(&self.people, id)
    }

    #[must_use]
    pub fn canonicalizer(&self) -> Canonicalizer {
        self.canonical
            .clone()
            .unwrap_or_else(Canonicalizer::household_default)
    }

    #[must_use]
    pub fn closed_set(&self) -> Vec<String> {
        self.closed_set.clone().unwrap_or_else(|| {
            DEFAULT_CLOSED_SET
                .iter()
                .map(ToString::to_string)
                .collect()
        })
    }

    #[must_use]
    pub fn shared_zone(&self) -> &str {
        self.shared_zone.as_deref().unwrap_or(DEFAULT_SHARED_ZONE)
    }

    /// Tasks that count toward compliance. Express-only variants are left out
    /// so a task and its variant are never expected twice.
    pub fn base_tasks(&self) -> impl Iterator<Item = &Task> {
        self.tasks.iter().filter(|t| !t.only_on_express)
    }

    /// Create or update a task from `draft`.
    ///
    /// `now_millis` seeds the fallback id when neither zone nor name yields a
    /// usable slug.
    ///
    /// # Errors
    ///
    /// [`HearthError::Validation`] when the name is blank. Nothing is changed.
    pub fn upsert_task(&mut self, draft: TaskDraft, now_millis: i64) -> Result<TaskSaved> {
        let name = draft.name.trim().to_string();
        if name.is_empty() {
            return Err(HearthError::Validation(
                "a task needs a name".to_string(),
            ));
        }

        let zone = if draft.zone.trim().is_empty() {
            "General".to_string()
        } else {
            draft.zone.trim().to_string()
        };

        let (id, created) = match draft.id.filter(|id| !id.trim().is_empty()) {
            Some(id) => {
                let created = self.task(&id).is_none();
                (id, created)
            }
            None => (self.unique_task_id(&zone, &name, now_millis), true),
        };

        let mut task = self.task(&id).cloned().unwrap_or_else(|| Task {
            id: id.clone(),
            name: String::new(),
            zone: String::new(),
            frequency: draft.frequency,
            days: None,
            times_per_week: None,
            assigned_to: String::new(),
            points: 0.0,
            minutes: 0.0,
            notes: None,
            hide_on_express: false,
            only_on_express: false,
            extra: BTreeMap::new(),
        });

        task.name = name;
        task.zone = zone;
        task.assigned_to = draft.assigned_to.trim().to_string();
        task.frequency = draft.frequency;
        task.points = draft.points.max(0.0);
        task.minutes = draft.minutes.max(0.0);

        match draft.frequency {
            Frequency::WeeklyDays => {
                let mut days = draft.days;
                days.sort_by_key(|d| d.index());
                days.dedup();
                if days.is_empty() {
                    days.push(Weekday::Mon);
                }
                task.days = Some(days);
                task.times_per_week = None;
            }
            Frequency::WeeklyTimes => {
                task.times_per_week = Some(clamp_times(draft.times_per_week));
                task.days = None;
            }
            Frequency::Daily | Frequency::Weekly | Frequency::Unknown => {
                task.days = None;
                task.times_per_week = None;
            }
        }

        if let Some(slot) = self.tasks.iter_mut().find(|t| t.id == id) {
            *slot = task;
        } else {
            self.tasks.push(task);
        }

        Ok(TaskSaved { id, created })
    }

    /// Remove a task. Logs referencing it are left untouched.
    pub fn delete_task(&mut self, id: &str) -> Result<Task> {
        let idx = self
            .tasks
            .iter()
            .position(|t| t.id == id)
            .ok_or_else(|| HearthError::TaskNotFound(id.to_string()))?;
        Ok(self.tasks.remove(idx))
    }

    fn unique_task_id(&self, zone: &str, name: &str, now_millis: i64) -> String {
        let parts: Vec<String> = [slug(zone), slug(name)]
            .into_iter()
            .filter(|s| !s.is_empty())
            .collect();
        let base = if parts.is_empty() {
            format!("t_{now_millis}")
        } else {
            parts.join("_")
        };

        let mut candidate = base.clone();
        let mut n = 2_u32;
        while self.task(&candidate).is_some() {
            candidate = format!("{base}_{n}");
            n += 1;
        }
        candidate
    }
}

/// Lowercase ASCII slug: accents stripped, other runs of non-alphanumerics
/// collapsed to `_`, trimmed, at most 40 characters.
#[must_use]
pub fn slug(input: &str) -> String {
    let folded: String = input
        .to_lowercase()
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect();

    let mut out = String::new();
    let mut gap = false;
    for c in folded.chars() {
        if c.is_ascii_alphanumeric() {
            if gap && !out.is_empty() {
                out.push('_');
            }
            gap = false;
            out.push(c);
        } else {
            gap = true;
        }
    }
    let capped: String = out.chars().take(MAX_SLUG_LEN).collect();
    capped.trim_end_matches('_').to_string()
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn clamp_times(raw: f64) -> u32 {
    if raw.is_finite() { raw.max(0.0).floor() as u32 } else { 0 }
}

fn default_timezone() -> String {
    "America/Mexico_City".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    const SAMPLE: &str = r#"{
        "app": {"timezone": "America/Mexico_City"},
        "people": [{"id": "papa", "label": "Papá"}, {"id": "ana", "label": "Ana"}],
        "tasks": [
            {"id": "cocina_guardar", "name": "Guardar", "zone": "Cocina",
             "frequency": "daily", "assigned_to": "ana", "points": 2, "minutes": 10,
             "notes": "platos"},
            {"id": "basura", "name": "Basura", "zone": "General",
             "frequency": "weekly_days", "days": ["mon", "thu"], "assigned_to": "papa"}
        ],
        "zones": ["Cocina", "General"],
        "rewards": {"family_weekly_reward": "Pizza"},
        "cloud": {"enabled": false}
    }"#;

    fn sample() -> Catalog {
        Catalog::from_json_str(SAMPLE, &PathBuf::from("config.json")).expect("sample catalog")
    }

    #[test]
    fn parses_catalog_document() {
        let catalog = sample();
        assert_eq!(catalog.tasks.len(), 2);
        assert_eq!(catalog.person_label("papa"), "Papá");
        assert_eq!(catalog.rewards.family_weekly_reward, "Pizza");
        assert_eq!(catalog.shared_zone(), DEFAULT_SHARED_ZONE);
        assert_eq!(catalog.closed_set().len(), 3);
        assert!(!catalog.cloud.is_enabled());
    }

    #[test]
    fn duplicate_task_ids_are_rejected() {
        let raw = r#"{"tasks":[
            {"id":"a","name":"A","frequency":"daily"},
            {"id":"a","name":"B","frequency":"daily"}]}"#;
        let err = Catalog::from_json_str(raw, &PathBuf::from("c.json")).expect_err("dupes");
        assert!(matches!(err, HearthError::ConfigParse { .. }));
    }

    #[test]
    fn bad_time_zone_is_rejected() {
        let raw = r#"{"app":{"timezone":"Nowhere/Land"}}"#;
        let err = Catalog::from_json_str(raw, &PathBuf::from("c.json")).expect_err("tz");
        assert!(matches!(err, HearthError::InvalidTimeZone(_)));
    }

    #[test]
    fn missing_file_reports_catalog_missing() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = Catalog::load(&dir.path().join("nope.json")).expect_err("missing");
        assert!(matches!(err, HearthError::CatalogMissing(_)));
    }

    #[test]
    fn override_replaces_only_editable_sections() {
        let base = sample();
        let patch = CatalogOverride {
            version: 3,
            tasks: Some(Vec::new()),
            people: None,
            rewards: Some(Rewards {
                family_weekly_reward: "Cine".into(),
                extra: BTreeMap::new(),
            }),
            zones: None,
        };
        let merged = base.with_override(&patch);
        assert!(merged.tasks.is_empty());
        assert_eq!(merged.people, base.people);
        assert_eq!(merged.rewards.family_weekly_reward, "Cine");
        assert_eq!(merged.zones, base.zones);
        assert_eq!(merged.app, base.app);
    }

    #[test]
    fn cloud_requires_house_and_settings() {
        let mut cloud = CloudConfig {
            enabled: true,
            house_id: "casa".into(),
            firebase_config: None,
        };
        assert!(!cloud.is_enabled());
        cloud.firebase_config = Some(serde_json::json!({"databaseURL": "https://db.example/"}));
        assert!(cloud.is_enabled());
        assert_eq!(cloud.database_url(), Some("https://db.example"));
        cloud.house_id = "  ".into();
        assert!(!cloud.is_enabled());
    }

    #[test]
    fn slug_strips_accents_and_punctuation() {
        assert_eq!(slug("Baño principal!"), "bano_principal");
        assert_eq!(slug("  --Sacar   basura-- "), "sacar_basura");
        assert_eq!(slug("¿?"), "");
        assert_eq!(slug(&"x".repeat(60)).len(), 40);
    }

    #[test]
    fn blank_name_is_rejected_without_mutation() {
        let mut catalog = sample();
        let before = catalog.clone();
        let draft = TaskDraft {
            name: "   ".into(),
            ..TaskDraft::default()
        };
        let err = catalog.upsert_task(draft, 0).expect_err("blank");
        assert!(matches!(err, HearthError::Validation(_)));
        assert_eq!(catalog, before);
    }

    #[test]
    fn new_task_ids_are_unique() {
        let mut catalog = sample();
        let draft = TaskDraft {
            name: "Sacar basura".into(),
            zone: "Patio".into(),
            ..TaskDraft::default()
        };
        let first = catalog.upsert_task(draft.clone(), 0).expect("first");
        let second = catalog.upsert_task(draft.clone(), 0).expect("second");
        let third = catalog.upsert_task(draft, 0).expect("third");
        assert_eq!(first.id, "patio_sacar_basura");
        assert_eq!(second.id, "patio_sacar_basura_2");
        assert_eq!(third.id, "patio_sacar_basura_3");
        assert!(first.created && second.created && third.created);
    }

    #[test]
    fn unsluggable_name_falls_back_to_timestamp_id() {
        let mut catalog = sample();
        let draft = TaskDraft {
            name: "¡!".into(),
            zone: "¿?".into(),
            ..TaskDraft::default()
        };
        let saved = catalog.upsert_task(draft, 1234).expect("saved");
        assert_eq!(saved.id, "t_1234");
    }

    #[test]
    fn frequency_fields_are_normalized() {
        let mut catalog = sample();

        let saved = catalog
            .upsert_task(
                TaskDraft {
                    name: "Regar".into(),
                    frequency: Frequency::WeeklyDays,
                    days: Vec::new(),
                    ..TaskDraft::default()
                },
                0,
            )
            .expect("days");
        let task = catalog.task(&saved.id).expect("task");
        assert_eq!(task.days.as_deref(), Some(&[Weekday::Mon][..]));
        assert_eq!(task.times_per_week, None);

        let saved = catalog
            .upsert_task(
                TaskDraft {
                    name: "Barrer".into(),
                    frequency: Frequency::WeeklyTimes,
                    times_per_week: 2.7,
                    ..TaskDraft::default()
                },
                0,
            )
            .expect("times");
        let task = catalog.task(&saved.id).expect("task");
        assert_eq!(task.times_per_week, Some(2));
        assert_eq!(task.days, None);

        let saved = catalog
            .upsert_task(
                TaskDraft {
                    name: "Trapear".into(),
                    frequency: Frequency::WeeklyTimes,
                    times_per_week: -4.0,
                    ..TaskDraft::default()
                },
                0,
            )
            .expect("negative");
        assert_eq!(catalog.task(&saved.id).expect("task").times_per_week, Some(0));
    }

    #[test]
    fn editing_keeps_untouched_fields() {
        let mut catalog = sample();
        let existing = catalog.task("cocina_guardar").expect("task").clone();
        let mut draft = TaskDraft::from_task(&existing);
        draft.name = "Guardar todo".into();
        draft.frequency = Frequency::Weekly;

        let saved = catalog.upsert_task(draft, 0).expect("edit");
        assert!(!saved.created);
        let task = catalog.task("cocina_guardar").expect("task");
        assert_eq!(task.name, "Guardar todo");
        assert_eq!(task.notes.as_deref(), Some("platos"));
        assert_eq!(task.days, None);
        assert_eq!(catalog.tasks.len(), 2);
    }

    #[test]
    fn delete_unknown_task_fails() {
        let mut catalog = sample();
        assert!(catalog.delete_task("basura").is_ok());
        assert!(matches!(
            catalog.delete_task("basura"),
            Err(HearthError::TaskNotFound(_))
        ));
    }
}
