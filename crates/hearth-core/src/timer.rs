//! Countdown timer for the task being worked on.
//!
//! Remaining time is always derived from the absolute `endAt` timestamp,
//! never decremented, so a process that sleeps or exits between ticks still
//! reports the right value. Pausing records `pauseAt`; resuming pushes
//! `endAt` forward by the paused span, which keeps active time intact across
//! any number of pause/resume cycles.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::model::Task;
use crate::store::kv::{KvStore, keys, read_json, write_json};

const MIN_DURATION_SEC: i64 = 10;
const DEFAULT_MINUTES: f64 = 10.0;

/// Persisted timer. Timestamps are epoch milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerState {
    pub running: bool,
    pub paused: bool,
    pub task_id: String,
    pub duration_sec: i64,
    pub start_at: i64,
    pub end_at: i64,
    pub remaining_sec: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pause_at: Option<i64>,
}

/// Outcome of [`TimerState::tick`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Tick {
    Idle,
    Running { remaining_sec: i64 },
    Paused { remaining_sec: i64 },
    Finished { task_id: String },
}

/// Countdown length for a task estimated at `minutes`.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn duration_for(minutes: f64) -> i64 {
    let minutes = if minutes.is_finite() && minutes > 0.0 {
        minutes
    } else {
        DEFAULT_MINUTES
    };
    ((minutes * 60.0).floor() as i64).max(MIN_DURATION_SEC)
}

fn ceil_seconds(ms: i64) -> i64 {
    ms.div_euclid(1000) + i64::from(ms.rem_euclid(1000) > 0)
}

impl TimerState {
    #[must_use]
    pub fn start(task: &Task, now_ms: i64) -> Self {
        let duration_sec = duration_for(task.minutes);
        Self {
            running: true,
            paused: false,
            task_id: task.id.clone(),
            duration_sec,
            start_at: now_ms,
            end_at: now_ms + duration_sec * 1000,
            remaining_sec: duration_sec,
            pause_at: None,
        }
    }

    /// Recompute `remaining_sec`. Reaching zero stops the timer but keeps the
    /// state so the caller can offer to mark the task done.
    pub fn tick(&mut self, now_ms: i64) -> Tick {
        if !self.running {
            return Tick::Idle;
        }
        if self.paused {
            return Tick::Paused {
                remaining_sec: self.remaining_sec,
            };
        }

        self.remaining_sec = ceil_seconds(self.end_at - now_ms);
        if self.remaining_sec <= 0 {
            self.running = false;
            self.paused = false;
            self.remaining_sec = 0;
            tracing::info!(task = %self.task_id, "timer finished");
            return Tick::Finished {
                task_id: self.task_id.clone(),
            };
        }
        Tick::Running {
            remaining_sec: self.remaining_sec,
        }
    }

    /// Returns false when there is nothing to pause.
    pub fn pause(&mut self, now_ms: i64) -> bool {
        if !self.running || self.paused {
            return false;
        }
        self.remaining_sec = ceil_seconds(self.end_at - now_ms).max(0);
        self.paused = true;
        self.pause_at = Some(now_ms);
        true
    }

    /// Returns false unless the timer is paused.
    pub fn resume(&mut self, now_ms: i64) -> bool {
        if !self.running || !self.paused {
            return false;
        }
        let paused_ms = now_ms - self.pause_at.unwrap_or(now_ms);
        self.end_at += paused_ms.max(0);
        self.paused = false;
        self.pause_at = None;
        self.remaining_sec = ceil_seconds(self.end_at - now_ms);
        true
    }

    pub fn toggle_pause(&mut self, now_ms: i64) -> bool {
        if self.paused {
            self.resume(now_ms)
        } else {
            self.pause(now_ms)
        }
    }

    pub fn load(kv: &dyn KvStore) -> Result<Option<Self>> {
        Ok(read_json::<Self>(kv, keys::TIMER)?.filter(|t| !t.task_id.is_empty()))
    }

    pub fn save(&self, kv: &dyn KvStore) -> Result<()> {
        write_json(kv, keys::TIMER, self)
    }

    pub fn clear(kv: &dyn KvStore) -> Result<()> {
        kv.clear(keys::TIMER)
    }
}
