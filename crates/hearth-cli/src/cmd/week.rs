use anyhow::Result;
use clap::Args;
use hearth_core::plan::{PlanDay, WeekPlan};
use std::io::{self, Write};

use super::RunContext;
use crate::output::{pretty_section, render_mode};

#[derive(Args, Debug)]
pub struct WeekArgs {
    /// Show the plan for this person instead of the current user.
    #[arg(long, short)]
    pub user: Option<String>,
}

pub fn run_week(args: &WeekArgs, ctx: &RunContext) -> Result<()> {
    let mut session = ctx.open_session()?;
    let plan = session.week(args.user.as_deref())?;
    render_mode(ctx.output, &plan, write_text, write_pretty)
}

fn write_day(w: &mut dyn Write, heading: &str, day: &PlanDay) -> io::Result<()> {
    writeln!(w, "{heading} {}", day.date_key)?;
    if day.entries.is_empty() {
        writeln!(w, "  -")?;
    }
    for entry in &day.entries {
        let mark = if entry.done { "x" } else { " " };
        writeln!(w, "  [{mark}] {:<12} {}", entry.zone, entry.name)?;
    }
    Ok(())
}

fn write_pretty(plan: &WeekPlan, w: &mut dyn Write) -> io::Result<()> {
    pretty_section(w, &format!("Week {} for {}", plan.week_key, plan.person_label))?;
    write_day(w, "Tomorrow", &plan.tomorrow)?;
    for day in &plan.days {
        writeln!(w)?;
        write_day(w, &day.dow.as_str().to_uppercase(), day)?;
    }
    Ok(())
}

fn write_text(plan: &WeekPlan, w: &mut dyn Write) -> io::Result<()> {
    writeln!(w, "date  dow  id  zone  name  done")?;
    for day in &plan.days {
        for entry in &day.entries {
            writeln!(
                w,
                "{}\t{}\t{}\t{}\t{}\t{}",
                day.date_key, day.dow, entry.task_id, entry.zone, entry.name, entry.done
            )?;
        }
    }
    Ok(())
}
