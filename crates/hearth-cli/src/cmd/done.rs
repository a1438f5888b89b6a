//! `hearth done` / `hearth undo`: record or retract a completion.

use anyhow::Result;
use clap::Args;
use hearth_core::error::Notice;
use hearth_core::model::CompletionLog;
use hearth_core::session::{MarkDone, Undo};
use serde::Serialize;

use super::RunContext;
use crate::output::{with_notice, write_notice};

#[derive(Args, Debug)]
pub struct DoneArgs {
    /// Task id to mark as done today.
    pub task: String,
}

#[derive(Args, Debug)]
pub struct UndoArgs {
    /// Task id whose most recent completion should be removed.
    pub task: String,
}

#[derive(Debug, Serialize)]
struct CompletionReport<'a> {
    task_id: &'a str,
    outcome: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    log: Option<&'a CompletionLog>,
}

fn emit(ctx: &RunContext, notice: &Notice, report: &CompletionReport<'_>) -> Result<()> {
    if notice.is_error() {
        anyhow::bail!("{}", notice.message);
    }
    if ctx.output.is_json() {
        println!("{}", serde_json::to_string_pretty(&with_notice(notice, report)?)?);
    } else {
        write_notice(notice, ctx.quiet)?;
    }
    Ok(())
}

pub fn run_done(args: &DoneArgs, ctx: &RunContext) -> Result<()> {
    let mut session = ctx.open_session()?;
    let outcome = session.mark_done(&args.task)?;
    let name = session
        .catalog()
        .task(&args.task)
        .map_or(args.task.as_str(), |t| t.name.as_str());
    let notice = outcome.notice(name);

    let report = CompletionReport {
        task_id: &args.task,
        outcome: match &outcome {
            MarkDone::Recorded(_) => "recorded",
            MarkDone::AlreadyDone => "already_done",
            MarkDone::NoUser => "no_user",
            MarkDone::Failed(_) => "failed",
        },
        log: match &outcome {
            MarkDone::Recorded(log) => Some(log),
            _ => None,
        },
    };
    emit(ctx, &notice, &report)
}

pub fn run_undo(args: &UndoArgs, ctx: &RunContext) -> Result<()> {
    let mut session = ctx.open_session()?;
    let outcome = session.undo(&args.task)?;
    let name = session
        .catalog()
        .task(&args.task)
        .map_or(args.task.as_str(), |t| t.name.as_str());
    let notice = outcome.notice(name);

    let report = CompletionReport {
        task_id: &args.task,
        outcome: match &outcome {
            Undo::Removed(_) => "removed",
            Undo::NothingToUndo => "nothing_to_undo",
            Undo::Failed(_) => "failed",
        },
        log: match &outcome {
            Undo::Removed(log) => Some(log),
            _ => None,
        },
    };
    emit(ctx, &notice, &report)
}
