//! Session orchestration: boot once, then run mutations and views.
//!
//! Boot merges the base catalog with the persisted override, loads the
//! preferences and picks exactly one log backend:
//!
//! 1. remote, when the cloud section is enabled and the feed connects;
//! 2. local otherwise, including when the remote connection fails.
//!
//! The choice holds for the whole session. Views are recomputed from the
//! backend's full log list on every call.

use std::cell::Cell;
use std::rc::Rc;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::Serialize;

use crate::aggregate::{DEFAULT_LAGGING_LIMIT, Summary, summary};
use crate::backup::{BackupDocument, RestoreReport};
use crate::catalog::{Catalog, CatalogOverride, TaskDraft, TaskSaved};
use crate::due::{TodayBoard, is_done_today, today_board};
use crate::error::{HearthError, Notice, Result};
use crate::model::{CompletionLog, Task};
use crate::plan::{WeekPlan, week_plan};
use crate::prefs::Preferences;
use crate::remote::{RemoteBackend, RemoteLogFeed, is_enabled};
use crate::store::kv::{KvStore, keys, read_json, write_json};
use crate::store::{Backend, LocalLogStore, LogStore};
use crate::time::TimeContext;
use crate::timer::{Tick, TimerState};

// ---------------------------------------------------------------------------
// Clock
// ---------------------------------------------------------------------------

pub trait Clock {
    fn now(&self) -> DateTime<Utc>;

    fn now_millis(&self) -> i64 {
        self.now().timestamp_millis()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock pinned to an instant, movable by hand.
#[derive(Debug, Clone)]
pub struct FixedClock {
    now: Cell<DateTime<Utc>>,
}

impl FixedClock {
    #[must_use]
    pub const fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: Cell::new(now),
        }
    }

    pub fn set(&self, now: DateTime<Utc>) {
        self.now.set(now);
    }

    pub fn advance(&self, by: chrono::Duration) {
        self.now.set(self.now.get() + by);
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.now.get()
    }
}

impl<C: Clock + ?Sized> Clock for Rc<C> {
    fn now(&self) -> DateTime<Utc> {
        (**self).now()
    }
}

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum MarkDone {
    Recorded(CompletionLog),
    AlreadyDone,
    NoUser,
    /// The backend refused the write. Nothing changed.
    Failed(String),
}

impl MarkDone {
    #[must_use]
    pub fn notice(&self, task: &str) -> Notice {
        match self {
            Self::Recorded(_) => Notice::info(format!("Done: {task}")),
            Self::AlreadyDone => Notice::info(format!(
                "{task} is already done today (use `undo` if that was a mistake)"
            )),
            Self::NoUser => Notice::warn("Pick a user before marking tasks done"),
            Self::Failed(reason) => Notice::error(format!("Could not save {task}: {reason}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Undo {
    Removed(CompletionLog),
    NothingToUndo,
    Failed(String),
}

impl Undo {
    #[must_use]
    pub fn notice(&self, task: &str) -> Notice {
        match self {
            Self::Removed(_) => Notice::info(format!("Undone: {task}")),
            Self::NothingToUndo => Notice::info(format!("No log of {task} to undo")),
            Self::Failed(reason) => Notice::error(format!("Could not undo {task}: {reason}")),
        }
    }
}

/// Timer state after an operation, with the tick computed at that moment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimerReport {
    pub timer: Option<TimerState>,
    pub tick: Tick,
    pub notice: Notice,
}

fn is_remote_failure(err: &HearthError) -> bool {
    matches!(err, HearthError::Remote(_) | HearthError::RemoteUnavailable(_))
}

// ---------------------------------------------------------------------------
// Boot
// ---------------------------------------------------------------------------

pub struct SessionBuilder {
    base: Catalog,
    kv: Rc<dyn KvStore>,
    feed: Option<Box<dyn RemoteLogFeed>>,
    clock: Box<dyn Clock>,
    lagging_limit: usize,
    default_user: Option<String>,
}

impl SessionBuilder {
    pub fn new(base: Catalog, kv: Rc<dyn KvStore>) -> Self {
        Self {
            base,
            kv,
            feed: None,
            clock: Box::new(SystemClock),
            lagging_limit: DEFAULT_LAGGING_LIMIT,
            default_user: None,
        }
    }

    /// Feed to try when the catalog enables the cloud section.
    #[must_use]
    pub fn feed(mut self, feed: Box<dyn RemoteLogFeed>) -> Self {
        self.feed = Some(feed);
        self
    }

    #[must_use]
    pub fn clock(mut self, clock: Box<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    #[must_use]
    pub const fn lagging_limit(mut self, limit: usize) -> Self {
        self.lagging_limit = limit;
        self
    }

    /// Person selected when the stored preferences have none.
    #[must_use]
    pub fn default_user(mut self, user: Option<String>) -> Self {
        self.default_user = user;
        self
    }

    pub fn boot(self) -> Result<Session> {
        let Self {
            base,
            kv,
            feed,
            clock,
            lagging_limit,
            default_user,
        } = self;

        let patch: Option<CatalogOverride> = read_json(kv.as_ref(), keys::CONFIG_OVERRIDE)?;
        let override_version = patch.as_ref().map_or(0, |p| p.version);
        let catalog = patch
            .as_ref()
            .map_or_else(|| base.clone(), |p| base.with_override(p));
        let tz = catalog.time_zone()?;

        let logs = select_backend(&catalog, &kv, feed);

        let mut prefs = Preferences::load(kv.as_ref())?;
        if prefs.current_user().is_none() {
            let fallback = default_user
                .filter(|id| catalog.person(id).is_some())
                .or_else(|| catalog.people.first().map(|p| p.id.clone()));
            if let Some(id) = fallback {
                tracing::debug!(user = %id, "no user selected, using default");
                prefs.current_user_id = Some(id);
                prefs.save(kv.as_ref())?;
            }
        }

        tracing::info!(
            backend = logs.backend().as_str(),
            tasks = catalog.tasks.len(),
            override_version,
            "session booted"
        );

        Ok(Session {
            base,
            catalog,
            override_version,
            tz,
            kv,
            logs,
            prefs,
            clock,
            lagging_limit,
        })
    }
}

fn select_backend(
    catalog: &Catalog,
    kv: &Rc<dyn KvStore>,
    feed: Option<Box<dyn RemoteLogFeed>>,
) -> Box<dyn LogStore> {
    let local = || -> Box<dyn LogStore> { Box::new(LocalLogStore::new(Rc::clone(kv))) };

    if !is_enabled(&catalog.cloud) {
        return local();
    }
    let Some(feed) = feed else {
        tracing::warn!("cloud enabled but no remote feed configured, using local logs");
        return local();
    };
    match RemoteBackend::connect(feed, &catalog.cloud) {
        Ok(remote) => Box::new(remote),
        Err(err) => {
            tracing::error!(error = %err, "remote log feed failed to connect, using local logs");
            local()
        }
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

pub struct Session {
    base: Catalog,
    catalog: Catalog,
    override_version: u64,
    tz: Tz,
    kv: Rc<dyn KvStore>,
    logs: Box<dyn LogStore>,
    prefs: Preferences,
    clock: Box<dyn Clock>,
    lagging_limit: usize,
}

impl Session {
    /// Merged catalog in effect.
    #[must_use]
    pub const fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    #[must_use]
    pub const fn base_catalog(&self) -> &Catalog {
        &self.base
    }

    #[must_use]
    pub const fn override_version(&self) -> u64 {
        self.override_version
    }

    #[must_use]
    pub const fn prefs(&self) -> &Preferences {
        &self.prefs
    }

    #[must_use]
    pub fn backend(&self) -> Backend {
        self.logs.backend()
    }

    #[must_use]
    pub fn context(&self) -> TimeContext {
        TimeContext::resolve(self.clock.now(), self.tz)
    }

    pub fn logs(&self) -> Result<Vec<CompletionLog>> {
        self.logs.get_logs()
    }

    fn task(&self, task_id: &str) -> Result<&Task> {
        self.catalog
            .task(task_id)
            .ok_or_else(|| HearthError::TaskNotFound(task_id.to_string()))
    }

    fn person_or_current(&self, person: Option<&str>) -> Result<String> {
        person
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .or_else(|| self.prefs.current_user())
            .map(ToString::to_string)
            .ok_or(HearthError::PersonRequired)
    }

    fn visit(&mut self, route: &str) -> Result<()> {
        if self.prefs.route != route {
            self.prefs.route = route.to_string();
            self.prefs.save(self.kv.as_ref())?;
        }
        Ok(())
    }

    // -- views --------------------------------------------------------------

    pub fn today(&mut self, person: Option<&str>) -> Result<TodayBoard> {
        let person = self.person_or_current(person)?;
        self.visit("today")?;
        let logs = self.logs()?;
        Ok(today_board(
            &self.catalog,
            &person,
            &self.context(),
            &logs,
            self.prefs.express_enabled,
        ))
    }

    pub fn week(&mut self, person: Option<&str>) -> Result<WeekPlan> {
        let person = self.person_or_current(person)?;
        self.visit("week")?;
        let logs = self.logs()?;
        Ok(week_plan(
            &self.catalog,
            &person,
            &self.context(),
            &logs,
            self.prefs.express_enabled,
        ))
    }

    pub fn summary(&mut self) -> Result<Summary> {
        self.visit("summary")?;
        let logs = self.logs()?;
        Ok(summary(&self.catalog, &self.context(), &logs, self.lagging_limit))
    }

    // -- completion ---------------------------------------------------------

    /// Record that the current user completed `task_id` now.
    pub fn mark_done(&mut self, task_id: &str) -> Result<MarkDone> {
        let task = self.task(task_id)?.clone();
        let Some(user) = self.prefs.current_user().map(ToString::to_string) else {
            return Ok(MarkDone::NoUser);
        };

        let ctx = self.context();
        let canon = self.catalog.canonicalizer();
        if is_done_today(&task, &ctx, &self.logs()?, &canon) {
            return Ok(MarkDone::AlreadyDone);
        }

        let log = CompletionLog::for_task(&task, &user, &ctx);
        match self.logs.add_log(log) {
            Ok(stored) => {
                tracing::info!(task = %task.id, user = %user, date = %ctx.date_key, "task marked done");
                Ok(MarkDone::Recorded(stored))
            }
            Err(err) if is_remote_failure(&err) => {
                tracing::error!(task = %task.id, error = %err, "remote add failed");
                Ok(MarkDone::Failed(err.to_string()))
            }
            Err(err) => Err(err),
        }
    }

    /// Remove the most recent log of `task_id` or any of its variants.
    pub fn undo(&mut self, task_id: &str) -> Result<Undo> {
        let canon = self.catalog.canonicalizer();
        let target = task_id.to_string();
        let predicate = move |log: &CompletionLog| log.matches_task(&target, &canon);

        match self.logs.remove_last_log(&predicate) {
            Ok(Some(removed)) => {
                tracing::info!(task = task_id, id = %removed.id, "completion undone");
                Ok(Undo::Removed(removed))
            }
            Ok(None) => Ok(Undo::NothingToUndo),
            Err(err) if is_remote_failure(&err) => {
                tracing::error!(task = task_id, error = %err, "remote delete failed");
                Ok(Undo::Failed(err.to_string()))
            }
            Err(err) => Err(err),
        }
    }

    // -- preferences --------------------------------------------------------

    pub fn set_user(&mut self, person_id: &str) -> Result<()> {
        if self.catalog.person(person_id).is_none() {
            return Err(HearthError::Validation(format!(
                "unknown person '{person_id}'"
            )));
        }
        self.prefs.current_user_id = Some(person_id.to_string());
        self.prefs.save(self.kv.as_ref())?;
        tracing::info!(user = person_id, "current user changed");
        Ok(())
    }

    /// Set express mode, or flip it when `enabled` is `None`. Returns the new
    /// value.
    pub fn set_express(&mut self, enabled: Option<bool>) -> Result<bool> {
        let next = enabled.unwrap_or(!self.prefs.express_enabled);
        if next != self.prefs.express_enabled {
            self.prefs.express_enabled = next;
            self.prefs.save(self.kv.as_ref())?;
            tracing::info!(express = next, "express mode changed");
        }
        Ok(next)
    }

    // -- catalog editing ----------------------------------------------------

    pub fn save_task(&mut self, draft: TaskDraft) -> Result<TaskSaved> {
        let mut next = self.catalog.clone();
        let saved = next.upsert_task(draft, self.clock.now_millis())?;
        self.persist_catalog(next)?;
        tracing::info!(task = %saved.id, created = saved.created, "task saved");
        Ok(saved)
    }

    pub fn delete_task(&mut self, task_id: &str) -> Result<Task> {
        let mut next = self.catalog.clone();
        let removed = next.delete_task(task_id)?;
        self.persist_catalog(next)?;
        tracing::info!(task = task_id, "task deleted");
        Ok(removed)
    }

    /// Drop the override and go back to the base catalog.
    pub fn reset_catalog(&mut self) -> Result<()> {
        self.kv.clear(keys::CONFIG_OVERRIDE)?;
        self.catalog = self.base.clone();
        self.override_version = 0;
        tracing::info!("catalog override cleared");
        Ok(())
    }

    fn persist_catalog(&mut self, next: Catalog) -> Result<()> {
        let version = self.override_version + 1;
        let patch = CatalogOverride::from_catalog(&next, version);
        write_json(self.kv.as_ref(), keys::CONFIG_OVERRIDE, &patch)?;
        self.catalog = next;
        self.override_version = version;
        Ok(())
    }

    // -- backup -------------------------------------------------------------

    /// Snapshot of the merged catalog, local logs and preferences.
    pub fn export_backup(&self) -> Result<BackupDocument> {
        let local = LocalLogStore::new(Rc::clone(&self.kv)).get_logs()?;
        BackupDocument::export(&self.catalog, local, &self.prefs, self.clock.now())
    }

    /// Replace local logs (and preferences, if present) from a backup.
    pub fn import_backup(&mut self, raw: &str) -> Result<RestoreReport> {
        let doc = BackupDocument::parse(raw)?;
        let report = doc.restore(self.kv.as_ref())?;
        self.prefs = Preferences::load(self.kv.as_ref())?;
        if self.backend() == Backend::Remote {
            tracing::warn!("backup restored to local logs while the remote store is active");
        }
        Ok(report)
    }

    // -- timer --------------------------------------------------------------

    fn timer_report(&self, timer: Option<TimerState>, notice: Notice) -> Result<TimerReport> {
        let mut timer = timer;
        let tick = match timer.as_mut() {
            Some(t) => {
                let tick = t.tick(self.clock.now_millis());
                t.save(self.kv.as_ref())?;
                tick
            }
            None => Tick::Idle,
        };
        Ok(TimerReport {
            timer,
            tick,
            notice,
        })
    }

    pub fn timer_start(&mut self, task_id: &str) -> Result<TimerReport> {
        let task = self.task(task_id)?.clone();
        let current = TimerState::load(self.kv.as_ref())?;

        let canon = self.catalog.canonicalizer();
        if is_done_today(&task, &self.context(), &self.logs()?, &canon) {
            return self.timer_report(
                current,
                Notice::info(format!("{} is already done today", task.name)),
            );
        }

        if let Some(previous) = current.filter(|t| t.running) {
            tracing::info!(task = %previous.task_id, "replacing running timer");
        }
        let timer = TimerState::start(&task, self.clock.now_millis());
        timer.save(self.kv.as_ref())?;
        tracing::info!(task = %task.id, seconds = timer.duration_sec, "timer started");
        self.timer_report(Some(timer), Notice::info(format!("Timer started: {}", task.name)))
    }

    pub fn timer_pause(&mut self) -> Result<TimerReport> {
        self.timer_transition(true)
    }

    pub fn timer_resume(&mut self) -> Result<TimerReport> {
        self.timer_transition(false)
    }

    fn timer_transition(&mut self, pause: bool) -> Result<TimerReport> {
        let Some(mut timer) = TimerState::load(self.kv.as_ref())? else {
            return self.timer_report(None, Notice::info("No active timer"));
        };
        let now = self.clock.now_millis();
        // Settle the countdown first so an expired timer cannot be paused.
        timer.tick(now);
        let changed = if pause {
            timer.pause(now)
        } else {
            timer.resume(now)
        };
        let notice = match (changed, pause) {
            (true, true) => Notice::info("Timer paused"),
            (true, false) => Notice::info("Timer resumed"),
            (false, true) => Notice::info("Timer is not running"),
            (false, false) => Notice::info("Timer is not paused"),
        };
        self.timer_report(Some(timer), notice)
    }

    pub fn timer_stop(&mut self) -> Result<TimerReport> {
        let existed = TimerState::load(self.kv.as_ref())?.is_some();
        TimerState::clear(self.kv.as_ref())?;
        let notice = if existed {
            tracing::info!("timer stopped");
            Notice::info("Timer stopped")
        } else {
            Notice::info("No active timer")
        };
        Ok(TimerReport {
            timer: None,
            tick: Tick::Idle,
            notice,
        })
    }

    pub fn timer_status(&mut self) -> Result<TimerReport> {
        let timer = TimerState::load(self.kv.as_ref())?;
        let notice = if timer.is_some() {
            Notice::info("Timer loaded")
        } else {
            Notice::info("No active timer")
        };
        self.timer_report(timer, notice)
    }
}
