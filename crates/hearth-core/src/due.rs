//! Due-today and done-today decisions.
//!
//! Every function here is pure: it takes the task, the time context and the
//! full log list and recomputes its answer from scratch. Task ids are always
//! compared after [`Canonicalizer::canonicalize`] on both sides, so a log
//! against an express variant satisfies its base task and vice versa.

use serde::Serialize;

use crate::canon::Canonicalizer;
use crate::catalog::Catalog;
use crate::model::{CompletionLog, Frequency, Task};
use crate::time::{TimeContext, Weekday};

/// Logs of `task_id` (canonically) recorded in week `week_key`.
pub fn logs_in_week<'a>(
    logs: &'a [CompletionLog],
    task_id: &'a str,
    week_key: &'a str,
    canon: &'a Canonicalizer,
) -> impl Iterator<Item = &'a CompletionLog> + 'a {
    logs.iter()
        .filter(move |log| log.week_key == week_key && log.matches_task(task_id, canon))
}

/// Logs of `task_id` (canonically) recorded on `date_key`.
pub fn logs_on_date<'a>(
    logs: &'a [CompletionLog],
    task_id: &'a str,
    date_key: &'a str,
    canon: &'a Canonicalizer,
) -> impl Iterator<Item = &'a CompletionLog> + 'a {
    logs.iter()
        .filter(move |log| log.date_key == date_key && log.matches_task(task_id, canon))
}

/// Whether `task` still requires completion today.
#[must_use]
pub fn is_due_today(
    task: &Task,
    ctx: &TimeContext,
    logs: &[CompletionLog],
    canon: &Canonicalizer,
) -> bool {
    match task.frequency {
        Frequency::Daily => true,
        Frequency::WeeklyDays => task.scheduled_days().contains(&ctx.dow),
        Frequency::Weekly => logs_in_week(logs, &task.id, &ctx.week_key, canon)
            .next()
            .is_none(),
        Frequency::WeeklyTimes => {
            let done = logs_in_week(logs, &task.id, &ctx.week_key, canon).count();
            done < task.weekly_target() as usize
        }
        Frequency::Unknown => false,
    }
}

/// Whether `task` is scheduled on `dow` at all. Week-quota frequencies are
/// never tied to a day.
#[must_use]
pub fn is_scheduled_on(task: &Task, dow: Weekday) -> bool {
    match task.frequency {
        Frequency::Daily => true,
        Frequency::WeeklyDays => task.scheduled_days().contains(&dow),
        Frequency::Weekly | Frequency::WeeklyTimes | Frequency::Unknown => false,
    }
}

#[must_use]
pub fn is_done_today(
    task: &Task,
    ctx: &TimeContext,
    logs: &[CompletionLog],
    canon: &Canonicalizer,
) -> bool {
    is_done_on(&task.id, &ctx.date_key, logs, canon)
}

#[must_use]
pub fn is_done_on(
    task_id: &str,
    date_key: &str,
    logs: &[CompletionLog],
    canon: &Canonicalizer,
) -> bool {
    logs_on_date(logs, task_id, date_key, canon).next().is_some()
}

/// The last log recorded today for `task_id`'s canonical task.
#[must_use]
pub fn last_done_today<'a>(
    task_id: &str,
    ctx: &TimeContext,
    logs: &'a [CompletionLog],
    canon: &Canonicalizer,
) -> Option<&'a CompletionLog> {
    logs.iter()
        .rev()
        .find(|log| log.date_key == ctx.date_key && log.matches_task(task_id, canon))
}

/// Completed/target counts for week-quota tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WeeklyProgress {
    pub done: usize,
    pub target: usize,
}

impl std::fmt::Display for WeeklyProgress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.done, self.target)
    }
}

/// Progress this week for `weekly` (done capped at 1) and `weekly_times`
/// tasks. Other frequencies have no weekly progress.
#[must_use]
pub fn weekly_progress(
    task: &Task,
    ctx: &TimeContext,
    logs: &[CompletionLog],
    canon: &Canonicalizer,
) -> Option<WeeklyProgress> {
    let done = || logs_in_week(logs, &task.id, &ctx.week_key, canon).count();
    match task.frequency {
        Frequency::Weekly => Some(WeeklyProgress {
            done: done().min(1),
            target: 1,
        }),
        Frequency::WeeklyTimes => Some(WeeklyProgress {
            done: done(),
            target: task.weekly_target() as usize,
        }),
        _ => None,
    }
}

/// Catalog tasks visible under the current express mode, in catalog order.
pub fn visible_tasks(tasks: &[Task], express_enabled: bool) -> impl Iterator<Item = &Task> {
    tasks.iter().filter(move |t| t.visible_in(express_enabled))
}

// ---------------------------------------------------------------------------
// Today board
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoardItem {
    pub task_id: String,
    pub name: String,
    pub zone: String,
    pub points: f64,
    pub minutes: f64,
    pub assigned_to: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<WeeklyProgress>,
    /// Label of whoever marked the task today.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub done_by: Option<String>,
}

/// The Today view for one person.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TodayBoard {
    pub person_id: String,
    pub person_label: String,
    pub date_key: String,
    pub express_enabled: bool,
    pub pending: Vec<BoardItem>,
    pub done: Vec<BoardItem>,
    pub pending_points: f64,
    pub pending_minutes: f64,
}

/// Build the Today view: visible tasks due today that are assigned to
/// `person_id`, unassigned, or in the shared zone, split into pending and done.
#[must_use]
pub fn today_board(
    catalog: &Catalog,
    person_id: &str,
    ctx: &TimeContext,
    logs: &[CompletionLog],
    express_enabled: bool,
) -> TodayBoard {
    let canon = catalog.canonicalizer();
    let shared_zone = catalog.shared_zone();

    let mut board = TodayBoard {
        person_id: person_id.to_string(),
        person_label: catalog.person_label(person_id),
        date_key: ctx.date_key.clone(),
        express_enabled,
        pending: Vec::new(),
        done: Vec::new(),
        pending_points: 0.0,
        pending_minutes: 0.0,
    };

    let mine = visible_tasks(&catalog.tasks, express_enabled)
        .filter(|t| is_due_today(t, ctx, logs, &canon))
        .filter(|t| t.assigned_to == person_id || t.is_unassigned() || t.zone == shared_zone);

    for task in mine {
        let last = last_done_today(&task.id, ctx, logs, &canon);
        let item = BoardItem {
            task_id: task.id.clone(),
            name: task.name.clone(),
            zone: task.zone.clone(),
            points: task.points,
            minutes: task.minutes,
            assigned_to: task.assigned_to.clone(),
            notes: task.notes.clone(),
            progress: weekly_progress(task, ctx, logs, &canon),
            done_by: last
                .filter(|log| !log.user_id.is_empty())
                .map(|log| catalog.person_label(&log.user_id)),
        };

        if last.is_some() {
            board.done.push(item);
        } else {
            board.pending_points += item.points;
            board.pending_minutes += item.minutes;
            board.pending.push(item);
        }
    }

    tracing::debug!(
        person = person_id,
        pending = board.pending.len(),
        done = board.done.len(),
        "today board computed"
    );
    board
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::parse_time_zone;
    use chrono::NaiveDate;
    use std::collections::BTreeMap;

    fn ctx(y: i32, m: u32, d: u32) -> TimeContext {
        let tz = parse_time_zone("America/Mexico_City").expect("zone");
        TimeContext::at_local_noon(NaiveDate::from_ymd_opt(y, m, d).expect("date"), tz)
    }

    fn task(json: &str) -> Task {
        serde_json::from_str(json).expect("task")
    }

    fn log_for(task_id: &str, ctx: &TimeContext, user: &str) -> CompletionLog {
        CompletionLog {
            id: format!("{task_id}-{}", ctx.date_key),
            task_id: task_id.to_string(),
            task_name: String::new(),
            user_id: user.to_string(),
            at_iso: String::new(),
            date_key: ctx.date_key.clone(),
            week_key: ctx.week_key.clone(),
            points: 1.0,
            minutes: 5.0,
            created_at: None,
            extra: BTreeMap::new(),
        }
    }

    #[test]
    fn daily_is_always_due() {
        let t = task(r#"{"id":"d","name":"D","frequency":"daily"}"#);
        let today = ctx(2024, 3, 6);
        let logs = vec![log_for("d", &today, "ana")];
        assert!(is_due_today(&t, &today, &logs, &Canonicalizer::default()));
        assert!(is_done_today(&t, &today, &logs, &Canonicalizer::default()));
    }

    #[test]
    fn weekly_days_due_only_on_listed_days() {
        let t = task(r#"{"id":"w","name":"W","frequency":"weekly_days","days":["mon","thu"]}"#);
        let canon = Canonicalizer::default();
        assert!(is_due_today(&t, &ctx(2024, 3, 4), &[], &canon));
        assert!(!is_due_today(&t, &ctx(2024, 3, 6), &[], &canon));
        assert!(is_due_today(&t, &ctx(2024, 3, 7), &[], &canon));
    }

    #[test]
    fn weekly_drops_off_once_done_and_returns_next_week() {
        let t = task(r#"{"id":"w","name":"W","frequency":"weekly"}"#);
        let canon = Canonicalizer::default();
        let tuesday = ctx(2024, 3, 5);
        let logs = vec![log_for("w", &tuesday, "ana")];

        assert!(!is_due_today(&t, &ctx(2024, 3, 8), &logs, &canon));
        assert!(is_due_today(&t, &ctx(2024, 3, 11), &logs, &canon));
    }

    #[test]
    fn weekly_times_due_until_quota_met() {
        let t = task(r#"{"id":"x","name":"X","frequency":"weekly_times","times_per_week":2}"#);
        let canon = Canonicalizer::default();
        let mon = ctx(2024, 3, 4);
        let tue = ctx(2024, 3, 5);
        let mut logs = vec![log_for("x", &mon, "ana")];
        assert!(is_due_today(&t, &tue, &logs, &canon));
        logs.push(log_for("x", &tue, "ana"));
        assert!(!is_due_today(&t, &tue, &logs, &canon));
        assert_eq!(
            weekly_progress(&t, &tue, &logs, &canon),
            Some(WeeklyProgress { done: 2, target: 2 })
        );
    }

    #[test]
    fn zero_quota_is_never_due() {
        let t = task(r#"{"id":"x","name":"X","frequency":"weekly_times","times_per_week":0}"#);
        assert!(!is_due_today(&t, &ctx(2024, 3, 4), &[], &Canonicalizer::default()));
    }

    #[test]
    fn unknown_frequency_is_never_due() {
        let t = task(r#"{"id":"m","name":"M","frequency":"monthly"}"#);
        assert!(!is_due_today(&t, &ctx(2024, 3, 4), &[], &Canonicalizer::default()));
    }

    #[test]
    fn express_variant_log_marks_base_done() {
        let base = task(r#"{"id":"cocina_guardar","name":"Guardar","frequency":"daily"}"#);
        let today = ctx(2024, 3, 6);
        let logs = vec![log_for("cocina_guardar_express", &today, "ana")];
        let canon = Canonicalizer::household_default();
        assert!(is_done_today(&base, &today, &logs, &canon));
        assert!(!is_done_today(&base, &today, &logs, &Canonicalizer::default()));
    }

    #[test]
    fn weekly_progress_caps_plain_weekly_at_one() {
        let t = task(r#"{"id":"w","name":"W","frequency":"weekly"}"#);
        let today = ctx(2024, 3, 6);
        let logs = vec![log_for("w", &today, "ana"), log_for("w", &today, "ana")];
        let progress = weekly_progress(&t, &today, &logs, &Canonicalizer::default());
        assert_eq!(progress, Some(WeeklyProgress { done: 1, target: 1 }));
        assert_eq!(progress.map(|p| p.to_string()).as_deref(), Some("1/1"));
    }

    #[test]
    fn board_filters_by_person_and_splits_done() {
        let catalog = Catalog::from_json_str(
            r#"{
                "people": [{"id":"ana","label":"Ana"},{"id":"leo","label":"Leo"}],
                "tasks": [
                    {"id":"a","name":"A","frequency":"daily","assigned_to":"ana","points":2,"minutes":10},
                    {"id":"b","name":"B","frequency":"daily","assigned_to":"leo"},
                    {"id":"c","name":"C","frequency":"daily","points":1,"minutes":5},
                    {"id":"d","name":"D","frequency":"daily","assigned_to":"leo","zone":"BossFight"},
                    {"id":"e","name":"E","frequency":"daily","assigned_to":"ana","only_on_express":true}
                ]
            }"#,
            std::path::Path::new("c.json"),
        )
        .expect("catalog");
        let today = ctx(2024, 3, 6);
        let logs = vec![log_for("c", &today, "leo")];

        let board = today_board(&catalog, "ana", &today, &logs, false);
        let pending: Vec<&str> = board.pending.iter().map(|i| i.task_id.as_str()).collect();
        assert_eq!(pending, vec!["a", "d"]);
        assert_eq!(board.done.len(), 1);
        assert_eq!(board.done[0].done_by.as_deref(), Some("Leo"));
        assert!((board.pending_points - 2.0).abs() < f64::EPSILON);
        assert!((board.pending_minutes - 10.0).abs() < f64::EPSILON);
    }
}
