//! Weekly expected-vs-done accounting.
//!
//! # Counting rules
//!
//! | Frequency | expected per week | expected to date | done counts |
//! |---|---|---|---|
//! | `daily` | 7 | days elapsed | distinct dates |
//! | `weekly_days` | listed days | listed days up to today | distinct dates |
//! | `weekly` | 1 | 1 | every log |
//! | `weekly_times` N | N | `ceil(N * elapsed / 7)` | every log |
//!
//! Compliance caps done at the weekly expectation. Contributions do not:
//! they measure who actually marked tasks, independent of assignment.
//!
//! Compliance and lagging only look at base tasks (not express-only), so a
//! task and its express variant are never expected twice.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::canon::Canonicalizer;
use crate::catalog::Catalog;
use crate::due::{is_done_today, is_due_today};
use crate::model::{CompletionLog, Frequency, Person, Task, person_label};
use crate::time::TimeContext;

pub const DEFAULT_LAGGING_LIMIT: usize = 5;

// ---------------------------------------------------------------------------
// Per-task counts
// ---------------------------------------------------------------------------

#[must_use]
pub fn expected_week(task: &Task) -> u32 {
    match task.frequency {
        Frequency::Daily => 7,
        Frequency::WeeklyDays => count_u32(task.scheduled_days().len()),
        Frequency::Weekly => 1,
        Frequency::WeeklyTimes => task.weekly_target(),
        Frequency::Unknown => 0,
    }
}

/// Occurrences expected from Monday through today.
#[must_use]
pub fn expected_to_date(task: &Task, ctx: &TimeContext) -> u32 {
    let elapsed = ctx.days_elapsed();
    match task.frequency {
        Frequency::Daily => elapsed,
        Frequency::WeeklyDays => count_u32(
            task.scheduled_days()
                .iter()
                .filter(|d| d.index() <= ctx.dow.index())
                .count(),
        ),
        Frequency::Weekly => 1,
        Frequency::WeeklyTimes => {
            let target = task.weekly_target();
            (target.saturating_mul(elapsed).saturating_add(6) / 7).min(target)
        }
        Frequency::Unknown => 0,
    }
}

fn week_logs<'a>(
    task: &'a Task,
    ctx: &'a TimeContext,
    logs: &'a [CompletionLog],
    canon: &'a Canonicalizer,
) -> impl Iterator<Item = &'a CompletionLog> + 'a {
    logs.iter()
        .filter(move |l| l.week_key == ctx.week_key && l.matches_task(&task.id, canon))
}

fn count_done<'a>(task: &Task, logs: impl Iterator<Item = &'a CompletionLog>) -> u32 {
    if task.frequency.is_per_day() {
        let dates: BTreeSet<&str> = logs.map(|l| l.date_key.as_str()).collect();
        count_u32(dates.len())
    } else {
        count_u32(logs.count())
    }
}

/// Uncapped completions this week.
#[must_use]
pub fn done_week_count(
    task: &Task,
    ctx: &TimeContext,
    logs: &[CompletionLog],
    canon: &Canonicalizer,
) -> u32 {
    count_done(task, week_logs(task, ctx, logs, canon))
}

/// Uncapped completions this week dated today or earlier.
#[must_use]
pub fn done_to_date_count(
    task: &Task,
    ctx: &TimeContext,
    logs: &[CompletionLog],
    canon: &Canonicalizer,
) -> u32 {
    count_done(
        task,
        week_logs(task, ctx, logs, canon).filter(|l| l.date_key.as_str() <= ctx.date_key.as_str()),
    )
}

/// `done` limited to the task's weekly expectation.
#[must_use]
pub fn capped(done: u32, task: &Task) -> u32 {
    done.min(expected_week(task))
}

/// `round(100 * done / expected)`, rounding halves up; 100 when nothing is
/// expected.
#[must_use]
pub fn percent(done: u32, expected: u32) -> u32 {
    if expected == 0 {
        return 100;
    }
    let done = u64::from(done);
    let expected = u64::from(expected);
    u32::try_from((200 * done + expected) / (2 * expected)).unwrap_or(u32::MAX)
}

fn count_u32(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}

// ---------------------------------------------------------------------------
// Reports
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComplianceRow {
    pub person_id: String,
    pub label: String,
    pub expected: u32,
    pub done: u32,
    pub percent: u32,
    /// Expected weekly workload in minutes. Week rows only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub planned_minutes: Option<f64>,
}

/// Per person: base tasks assigned to them that are due today, and how many
/// of those are done.
#[must_use]
pub fn compliance_today(
    catalog: &Catalog,
    ctx: &TimeContext,
    logs: &[CompletionLog],
) -> Vec<ComplianceRow> {
    let canon = catalog.canonicalizer();
    catalog
        .people
        .iter()
        .map(|person| {
            let mine: Vec<&Task> = catalog
                .base_tasks()
                .filter(|t| t.is_assigned_to(&person.id))
                .filter(|t| is_due_today(t, ctx, logs, &canon))
                .collect();
            let expected = count_u32(mine.len());
            let done = count_u32(
                mine.iter()
                    .filter(|t| is_done_today(t, ctx, logs, &canon))
                    .count(),
            );
            ComplianceRow {
                person_id: person.id.clone(),
                label: person.label.clone(),
                expected,
                done,
                percent: percent(done, expected),
                planned_minutes: None,
            }
        })
        .collect()
}

/// Per person: full-week expectation against capped completions.
#[must_use]
pub fn compliance_week(
    catalog: &Catalog,
    ctx: &TimeContext,
    logs: &[CompletionLog],
) -> Vec<ComplianceRow> {
    let canon = catalog.canonicalizer();
    catalog
        .people
        .iter()
        .map(|person| {
            let mut expected = 0_u32;
            let mut done = 0_u32;
            let mut planned_minutes = 0.0_f64;
            for task in catalog.base_tasks().filter(|t| t.is_assigned_to(&person.id)) {
                let task_expected = expected_week(task);
                expected += task_expected;
                done += capped(done_week_count(task, ctx, logs, &canon), task);
                planned_minutes += f64::from(task_expected) * task.minutes;
            }
            ComplianceRow {
                person_id: person.id.clone(),
                label: person.label.clone(),
                expected,
                done,
                percent: percent(done, expected),
                planned_minutes: Some(planned_minutes),
            }
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LaggingTask {
    pub task_id: String,
    pub name: String,
    pub zone: String,
    pub expected_to_date: u32,
    /// Capped completions to date.
    pub done: u32,
    pub deficit: u32,
}

/// Base tasks behind schedule so far this week, worst first.
#[must_use]
pub fn lagging_tasks(
    catalog: &Catalog,
    ctx: &TimeContext,
    logs: &[CompletionLog],
    limit: usize,
) -> Vec<LaggingTask> {
    let canon = catalog.canonicalizer();
    let mut rows: Vec<LaggingTask> = catalog
        .base_tasks()
        .map(|task| {
            let expected = expected_to_date(task, ctx);
            let done = capped(done_to_date_count(task, ctx, logs, &canon), task);
            LaggingTask {
                task_id: task.id.clone(),
                name: task.name.clone(),
                zone: task.zone.clone(),
                expected_to_date: expected,
                done,
                deficit: expected.saturating_sub(done),
            }
        })
        .filter(|row| row.expected_to_date > 0 && row.deficit > 0)
        .collect();

    rows.sort_by(|a, b| {
        b.deficit.cmp(&a.deficit).then_with(|| {
            let gap = |r: &LaggingTask| i64::from(r.expected_to_date) - i64::from(r.done);
            gap(b).cmp(&gap(a))
        })
    });
    rows.truncate(limit);
    rows
}

/// Raw effort by whoever marked the logs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Contribution {
    pub user_id: String,
    pub label: String,
    pub points: f64,
    pub minutes: f64,
    pub count: u32,
}

/// Sum points, minutes and log count per `userId`. Every catalog person gets
/// a row; unknown users follow in first-seen order.
pub fn contributions<'a>(
    people: &[Person],
    logs: impl IntoIterator<Item = &'a CompletionLog>,
) -> Vec<Contribution> {
    let mut rows: Vec<Contribution> = people
        .iter()
        .map(|p| Contribution {
            user_id: p.id.clone(),
            label: p.label.clone(),
            points: 0.0,
            minutes: 0.0,
            count: 0,
        })
        .collect();

    for log in logs {
        let idx = if let Some(idx) = rows.iter().position(|r| r.user_id == log.user_id) {
            idx
        } else {
            rows.push(Contribution {
                user_id: log.user_id.clone(),
                label: person_label(people, &log.user_id),
                points: 0.0,
                minutes: 0.0,
                count: 0,
            });
            rows.len() - 1
        };
        let row = &mut rows[idx];
        row.points += log.points;
        row.minutes += log.minutes;
        row.count += 1;
    }
    rows
}

/// True when every id in `required` has a log dated today.
#[must_use]
pub fn closed_set_done(
    required: &[String],
    ctx: &TimeContext,
    logs: &[CompletionLog],
    canon: &Canonicalizer,
) -> bool {
    required.iter().all(|id| {
        logs.iter()
            .any(|l| l.date_key == ctx.date_key && l.matches_task(id, canon))
    })
}

/// Every report for one moment, as shown by the summary view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub date_key: String,
    pub week_key: String,
    pub family_reward: String,
    pub closed_set: Vec<String>,
    pub closed_set_done: bool,
    pub compliance_today: Vec<ComplianceRow>,
    pub compliance_week: Vec<ComplianceRow>,
    pub lagging: Vec<LaggingTask>,
    pub contributions_today: Vec<Contribution>,
    pub contributions_week: Vec<Contribution>,
}

#[must_use]
pub fn summary(
    catalog: &Catalog,
    ctx: &TimeContext,
    logs: &[CompletionLog],
    lagging_limit: usize,
) -> Summary {
    let canon = catalog.canonicalizer();
    let closed_set = catalog.closed_set();
    let today = logs.iter().filter(|l| l.date_key == ctx.date_key);
    let week = logs.iter().filter(|l| l.week_key == ctx.week_key);

    let report = Summary {
        date_key: ctx.date_key.clone(),
        week_key: ctx.week_key.clone(),
        family_reward: catalog.rewards.family_weekly_reward.clone(),
        closed_set_done: closed_set_done(&closed_set, ctx, logs, &canon),
        closed_set,
        compliance_today: compliance_today(catalog, ctx, logs),
        compliance_week: compliance_week(catalog, ctx, logs),
        lagging: lagging_tasks(catalog, ctx, logs, lagging_limit),
        contributions_today: contributions(&catalog.people, today),
        contributions_week: contributions(&catalog.people, week),
    };
    tracing::debug!(
        week = %report.week_key,
        lagging = report.lagging.len(),
        closed = report.closed_set_done,
        "summary computed"
    );
    report
}
