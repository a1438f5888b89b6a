//! Week plan: one person's day-bound tasks laid out Monday through Sunday.

use chrono::Duration;
use serde::Serialize;

use crate::catalog::Catalog;
use crate::due::{is_done_on, is_scheduled_on, visible_tasks};
use crate::model::{CompletionLog, Task};
use crate::time::{TimeContext, Weekday, format_date_key, monday_of};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlanEntry {
    pub task_id: String,
    pub name: String,
    pub zone: String,
    pub points: f64,
    pub minutes: f64,
    pub done: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlanDay {
    pub dow: Weekday,
    pub date_key: String,
    pub entries: Vec<PlanEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeekPlan {
    pub person_id: String,
    pub person_label: String,
    pub week_key: String,
    pub tomorrow: PlanDay,
    pub days: Vec<PlanDay>,
}

/// Plan for `person_id`: visible `daily`/`weekly_days` tasks assigned to
/// them, ordered by zone then name.
#[must_use]
pub fn week_plan(
    catalog: &Catalog,
    person_id: &str,
    ctx: &TimeContext,
    logs: &[CompletionLog],
    express_enabled: bool,
) -> WeekPlan {
    let canon = catalog.canonicalizer();
    let mut tasks: Vec<&Task> = visible_tasks(&catalog.tasks, express_enabled)
        .filter(|t| t.is_assigned_to(person_id) && t.frequency.is_per_day())
        .collect();
    tasks.sort_by(|a, b| a.zone.cmp(&b.zone).then_with(|| a.name.cmp(&b.name)));

    let day = |date: chrono::NaiveDate| {
        let date_key = format_date_key(date);
        let dow = Weekday::from_chrono(chrono::Datelike::weekday(&date));
        let entries = tasks
            .iter()
            .filter(|t| is_scheduled_on(t, dow))
            .map(|t| PlanEntry {
                task_id: t.id.clone(),
                name: t.name.clone(),
                zone: t.zone.clone(),
                points: t.points,
                minutes: t.minutes,
                done: is_done_on(&t.id, &date_key, logs, &canon),
            })
            .collect();
        PlanDay {
            dow,
            date_key,
            entries,
        }
    };

    let today = ctx.date();
    let monday = monday_of(today);
    WeekPlan {
        person_id: person_id.to_string(),
        person_label: catalog.person_label(person_id),
        week_key: ctx.week_key.clone(),
        tomorrow: day(today + Duration::days(1)),
        days: (0..7).map(|offset| day(monday + Duration::days(offset))).collect(),
    }
}
