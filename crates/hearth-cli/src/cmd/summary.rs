use anyhow::Result;
use hearth_core::aggregate::{ComplianceRow, Contribution, Summary};
use std::io::{self, Write};

use super::RunContext;
use crate::output::{pretty_kv, pretty_section, render_mode};

pub fn run_summary(ctx: &RunContext) -> Result<()> {
    let mut session = ctx.open_session()?;
    let report = session.summary()?;
    render_mode(ctx.output, &report, write_text, write_pretty)
}

fn write_compliance(w: &mut dyn Write, rows: &[ComplianceRow]) -> io::Result<()> {
    for row in rows {
        write!(w, "  {:<14} {:>3}/{:<3} {:>3}%", row.label, row.done, row.expected, row.percent)?;
        if let Some(minutes) = row.planned_minutes {
            write!(w, "  ({minutes} min planned)")?;
        }
        writeln!(w)?;
    }
    Ok(())
}

fn write_contributions(w: &mut dyn Write, rows: &[Contribution]) -> io::Result<()> {
    for row in rows {
        writeln!(
            w,
            "  {:<14} {:>3} logs  {:>5} pts  {:>5} min",
            row.label, row.count, row.points, row.minutes
        )?;
    }
    Ok(())
}

fn write_pretty(report: &Summary, w: &mut dyn Write) -> io::Result<()> {
    pretty_section(w, &format!("Summary {}", report.week_key))?;
    pretty_kv(w, "Date", &report.date_key)?;
    if !report.family_reward.is_empty() {
        pretty_kv(w, "Reward", &report.family_reward)?;
    }
    let closed = if report.closed_set_done { "closed ✓" } else { "open" };
    pretty_kv(w, "Kitchen", closed)?;

    writeln!(w)?;
    writeln!(w, "Today:")?;
    write_compliance(w, &report.compliance_today)?;
    writeln!(w)?;
    writeln!(w, "This week:")?;
    write_compliance(w, &report.compliance_week)?;

    writeln!(w)?;
    if report.lagging.is_empty() {
        writeln!(w, "Nothing behind schedule.")?;
    } else {
        writeln!(w, "Behind schedule:")?;
        for row in &report.lagging {
            writeln!(
                w,
                "  {:<24} {:<12} {}/{} (-{})",
                row.name, row.zone, row.done, row.expected_to_date, row.deficit
            )?;
        }
    }

    writeln!(w)?;
    writeln!(w, "Contributions today:")?;
    write_contributions(w, &report.contributions_today)?;
    writeln!(w)?;
    writeln!(w, "Contributions this week:")?;
    write_contributions(w, &report.contributions_week)
}

fn write_text(report: &Summary, w: &mut dyn Write) -> io::Result<()> {
    writeln!(w, "week\t{}", report.week_key)?;
    writeln!(w, "date\t{}", report.date_key)?;
    writeln!(w, "closed_set_done\t{}", report.closed_set_done)?;
    for (scope, rows) in [("today", &report.compliance_today), ("week", &report.compliance_week)] {
        for row in rows {
            writeln!(
                w,
                "compliance\t{scope}\t{}\t{}\t{}\t{}",
                row.person_id, row.done, row.expected, row.percent
            )?;
        }
    }
    for row in &report.lagging {
        writeln!(
            w,
            "lagging\t{}\t{}\t{}\t{}",
            row.task_id, row.done, row.expected_to_date, row.deficit
        )?;
    }
    for (scope, rows) in [
        ("today", &report.contributions_today),
        ("week", &report.contributions_week),
    ] {
        for row in rows {
            writeln!(
                w,
                "contribution\t{scope}\t{}\t{}\t{}\t{}",
                row.user_id, row.count, row.points, row.minutes
            )?;
        }
    }
    Ok(())
}
