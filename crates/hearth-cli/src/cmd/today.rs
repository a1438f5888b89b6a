use anyhow::Result;
use clap::Args;
use hearth_core::due::{BoardItem, TodayBoard};
use std::io::{self, Write};

use super::RunContext;
use crate::output::{pretty_kv, pretty_section, render_mode};

#[derive(Args, Debug)]
pub struct TodayArgs {
    /// Show the board for this person instead of the current user.
    #[arg(long, short)]
    pub user: Option<String>,
}

pub fn run_today(args: &TodayArgs, ctx: &RunContext) -> Result<()> {
    let mut session = ctx.open_session()?;
    let board = session.today(args.user.as_deref())?;
    render_mode(ctx.output, &board, write_text, write_pretty)
}

fn item_suffix(item: &BoardItem) -> String {
    let mut parts = vec![format!("{} pts", item.points), format!("{} min", item.minutes)];
    if let Some(progress) = item.progress {
        parts.push(format!("week {progress}"));
    }
    parts.join(", ")
}

fn write_pretty(board: &TodayBoard, w: &mut dyn Write) -> io::Result<()> {
    pretty_section(w, &format!("Today for {}", board.person_label))?;
    pretty_kv(w, "Date", &board.date_key)?;
    if board.express_enabled {
        pretty_kv(w, "Mode", "express")?;
    }
    writeln!(w)?;

    if board.pending.is_empty() {
        writeln!(w, "Nothing pending. Nice.")?;
    } else {
        writeln!(w, "Pending:")?;
        for item in &board.pending {
            writeln!(w, "  [ ] {:<28} {:<12} {}", item.name, item.zone, item_suffix(item))?;
            writeln!(w, "      id: {}", item.task_id)?;
            if let Some(notes) = &item.notes {
                writeln!(w, "      {notes}")?;
            }
        }
    }

    if !board.done.is_empty() {
        writeln!(w)?;
        writeln!(w, "Done:")?;
        for item in &board.done {
            let by = item.done_by.as_deref().unwrap_or("?");
            writeln!(w, "  [x] {:<28} {:<12} by {by}", item.name, item.zone)?;
        }
    }

    writeln!(w)?;
    pretty_kv(
        w,
        "Remaining",
        format!("{} pts, {} min", board.pending_points, board.pending_minutes),
    )
}

fn write_text(board: &TodayBoard, w: &mut dyn Write) -> io::Result<()> {
    writeln!(w, "status  id  name  zone  points  minutes  progress  by")?;
    let rows = board
        .pending
        .iter()
        .map(|item| ("pending", item))
        .chain(board.done.iter().map(|item| ("done", item)));
    for (status, item) in rows {
        writeln!(
            w,
            "{status}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
            item.task_id,
            item.name,
            item.zone,
            item.points,
            item.minutes,
            item.progress.map(|p| p.to_string()).unwrap_or_default(),
            item.done_by.as_deref().unwrap_or_default(),
        )?;
    }
    Ok(())
}
