//! `hearth task`: inspect and edit the task catalog.
//!
//! Edits are stored as an override on top of the base catalog file, which is
//! never rewritten. `hearth task reset` drops the override.

use anyhow::Result;
use clap::{Args, Subcommand};
use hearth_core::catalog::TaskDraft;
use hearth_core::error::HearthError;
use hearth_core::model::{Frequency, Task};
use hearth_core::session::Session;
use hearth_core::time::Weekday;
use serde::Serialize;
use std::io::{self, Write};

use super::RunContext;
use crate::output::{pretty_section, render, render_mode};

#[derive(Subcommand, Debug)]
pub enum TaskCommand {
    #[command(
        about = "List tasks in the merged catalog",
        after_help = "EXAMPLES:\n    hearth task list\n    hearth task list --zone Cocina --json"
    )]
    List(ListArgs),

    #[command(
        about = "Add a task",
        after_help = "EXAMPLES:\n    hearth task add --name \"Regar plantas\" --zone Patio --frequency weekly_days --days mon,thu\n    hearth task add --name Trapear --frequency weekly_times --times 3 --assigned-to mama"
    )]
    Add(AddArgs),

    #[command(
        about = "Edit a task",
        after_help = "EXAMPLES:\n    hearth task edit general_trapear --times 4\n    hearth task edit general_basura --assigned-to \"\""
    )]
    Edit(EditArgs),

    #[command(about = "Delete a task (its logs are kept)")]
    Delete(DeleteArgs),

    #[command(about = "Discard all catalog edits and return to the catalog file")]
    Reset,
}

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Only show tasks in this zone.
    #[arg(long)]
    pub zone: Option<String>,
}

/// Schedule and effort fields shared by `add` and `edit`.
#[derive(Args, Debug, Default)]
pub struct TaskFields {
    /// Zone (area of the house).
    #[arg(long)]
    pub zone: Option<String>,

    /// Person id; pass an empty string for family tasks.
    #[arg(long)]
    pub assigned_to: Option<String>,

    /// daily, weekly, weekly_days or weekly_times.
    #[arg(long)]
    pub frequency: Option<Frequency>,

    /// Weekdays for weekly_days, e.g. `mon,thu`.
    #[arg(long, value_delimiter = ',')]
    pub days: Option<Vec<Weekday>>,

    /// Times per week for weekly_times.
    #[arg(long)]
    pub times: Option<f64>,

    #[arg(long)]
    pub points: Option<f64>,

    /// Estimated minutes.
    #[arg(long)]
    pub minutes: Option<f64>,
}

impl TaskFields {
    fn apply(&self, draft: &mut TaskDraft) {
        if let Some(zone) = &self.zone {
            draft.zone.clone_from(zone);
        }
        if let Some(assigned_to) = &self.assigned_to {
            draft.assigned_to.clone_from(assigned_to);
        }
        if let Some(frequency) = self.frequency {
            draft.frequency = frequency;
        }
        if let Some(days) = &self.days {
            draft.days.clone_from(days);
        }
        if let Some(times) = self.times {
            draft.times_per_week = times;
        }
        if let Some(points) = self.points {
            draft.points = points;
        }
        if let Some(minutes) = self.minutes {
            draft.minutes = minutes;
        }
    }
}

#[derive(Args, Debug)]
pub struct AddArgs {
    #[arg(long)]
    pub name: String,

    #[command(flatten)]
    pub fields: TaskFields,
}

#[derive(Args, Debug)]
pub struct EditArgs {
    /// Task id to edit.
    pub id: String,

    #[arg(long)]
    pub name: Option<String>,

    #[command(flatten)]
    pub fields: TaskFields,
}

#[derive(Args, Debug)]
pub struct DeleteArgs {
    /// Task id to delete.
    pub id: String,
}

#[derive(Debug, Serialize)]
struct SavedReport<'a> {
    id: &'a str,
    created: bool,
    task: Option<&'a Task>,
    override_version: u64,
}

pub fn run_task(command: &TaskCommand, ctx: &RunContext) -> Result<()> {
    match command {
        TaskCommand::List(args) => run_list(args, ctx),
        TaskCommand::Add(args) => {
            let mut draft = TaskDraft {
                name: args.name.clone(),
                ..TaskDraft::default()
            };
            args.fields.apply(&mut draft);
            save(ctx.open_session()?, draft, ctx)
        }
        TaskCommand::Edit(args) => {
            let session = ctx.open_session()?;
            let existing = session
                .catalog()
                .task(&args.id)
                .ok_or_else(|| HearthError::TaskNotFound(args.id.clone()))?;
            let mut draft = TaskDraft::from_task(existing);
            if let Some(name) = &args.name {
                draft.name.clone_from(name);
            }
            args.fields.apply(&mut draft);
            save(session, draft, ctx)
        }
        TaskCommand::Delete(args) => {
            let mut session = ctx.open_session()?;
            let removed = session.delete_task(&args.id)?;
            render(ctx.output, &removed, |t, w| {
                writeln!(w, "✓ Deleted {} ({}). Its logs are kept.", t.name, t.id)
            })
        }
        TaskCommand::Reset => {
            let mut session = ctx.open_session()?;
            session.reset_catalog()?;
            let body = serde_json::json!({ "reset": true, "tasks": session.catalog().tasks.len() });
            render(ctx.output, &body, |_, w| {
                writeln!(w, "✓ Catalog edits discarded.")
            })
        }
    }
}

fn save(mut session: Session, draft: TaskDraft, ctx: &RunContext) -> Result<()> {
    let saved = session.save_task(draft)?;
    let report = SavedReport {
        id: &saved.id,
        created: saved.created,
        task: session.catalog().task(&saved.id),
        override_version: session.override_version(),
    };
    render(ctx.output, &report, |r, w| {
        let verb = if r.created { "Added" } else { "Updated" };
        writeln!(w, "✓ {verb} task {}", r.id)?;
        if let Some(task) = r.task {
            writeln!(w, "  {} · {} · {}", task.name, task.zone, task.frequency_label())?;
        }
        Ok(())
    })
}

fn run_list(args: &ListArgs, ctx: &RunContext) -> Result<()> {
    let session = ctx.open_session()?;
    let tasks: Vec<&Task> = session
        .catalog()
        .tasks
        .iter()
        .filter(|t| args.zone.as_ref().is_none_or(|zone| &t.zone == zone))
        .collect();
    render_mode(ctx.output, &tasks, write_text, write_pretty)
}

fn flags(task: &Task) -> &'static str {
    match (task.only_on_express, task.hide_on_express) {
        (true, _) => "express only",
        (false, true) => "hidden in express",
        (false, false) => "",
    }
}

#[allow(clippy::ptr_arg)]
fn write_pretty(tasks: &Vec<&Task>, w: &mut dyn Write) -> io::Result<()> {
    pretty_section(w, &format!("{} tasks", tasks.len()))?;
    for task in tasks {
        let owner = if task.is_unassigned() {
            "family"
        } else {
            task.assigned_to.as_str()
        };
        writeln!(w, "{:<28} {}", task.id, task.name)?;
        writeln!(
            w,
            "    {} · {} · {owner} · {} pts · {} min {}",
            task.zone,
            task.frequency_label(),
            task.points,
            task.minutes,
            flags(task)
        )?;
    }
    Ok(())
}

#[allow(clippy::ptr_arg)]
fn write_text(tasks: &Vec<&Task>, w: &mut dyn Write) -> io::Result<()> {
    writeln!(w, "id  name  zone  frequency  assigned_to  points  minutes")?;
    for task in tasks {
        writeln!(
            w,
            "{}\t{}\t{}\t{}\t{}\t{}\t{}",
            task.id,
            task.name,
            task.zone,
            task.frequency_label(),
            task.assigned_to,
            task.points,
            task.minutes
        )?;
    }
    Ok(())
}
