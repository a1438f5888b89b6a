//! `hearth timer`: countdown for the task being worked on.
//!
//! The timer is persisted, so `hearth timer status` from a later process
//! reports the same remaining time a long-running one would.

use anyhow::Result;
use clap::{Args, Subcommand};
use hearth_core::session::TimerReport;
use hearth_core::timer::Tick;
use std::io::{self, Write};

use super::RunContext;
use crate::output::{notice_marker, pretty_kv, render_mode};

#[derive(Subcommand, Debug)]
pub enum TimerCommand {
    #[command(
        about = "Start a countdown sized to the task's estimate",
        after_help = "EXAMPLES:\n    hearth timer start general_trapear"
    )]
    Start(StartArgs),

    #[command(about = "Pause the running countdown")]
    Pause,

    #[command(about = "Resume a paused countdown")]
    Resume,

    #[command(about = "Discard the countdown")]
    Stop,

    #[command(about = "Show remaining time")]
    Status,
}

#[derive(Args, Debug)]
pub struct StartArgs {
    /// Task id to time.
    pub task: String,
}

pub fn run_timer(command: &TimerCommand, ctx: &RunContext) -> Result<()> {
    let mut session = ctx.open_session()?;
    let report = match command {
        TimerCommand::Start(args) => session.timer_start(&args.task)?,
        TimerCommand::Pause => session.timer_pause()?,
        TimerCommand::Resume => session.timer_resume()?,
        TimerCommand::Stop => session.timer_stop()?,
        TimerCommand::Status => session.timer_status()?,
    };
    render_mode(ctx.output, &report, write_text, write_pretty)
}

/// `mm:ss`, or `h:mm:ss` past an hour.
fn clock_face(seconds: i64) -> String {
    let seconds = seconds.max(0);
    let (h, m, s) = (seconds / 3600, (seconds % 3600) / 60, seconds % 60);
    if h > 0 {
        format!("{h}:{m:02}:{s:02}")
    } else {
        format!("{m:02}:{s:02}")
    }
}

fn state_line(tick: &Tick) -> String {
    match tick {
        Tick::Idle => "idle".to_string(),
        Tick::Running { remaining_sec } => format!("running, {} left", clock_face(*remaining_sec)),
        Tick::Paused { remaining_sec } => format!("paused, {} left", clock_face(*remaining_sec)),
        Tick::Finished { task_id } => format!("finished ({task_id}), mark it with `hearth done {task_id}`"),
    }
}

fn write_pretty(r: &TimerReport, w: &mut dyn Write) -> io::Result<()> {
    writeln!(w, "{} {}", notice_marker(r.notice.level), r.notice.message)?;
    if let Some(timer) = &r.timer {
        pretty_kv(w, "Task", &timer.task_id)?;
        pretty_kv(w, "Length", clock_face(timer.duration_sec))?;
    }
    pretty_kv(w, "State", state_line(&r.tick))
}

fn write_text(r: &TimerReport, w: &mut dyn Write) -> io::Result<()> {
    let task = r.timer.as_ref().map_or("-", |t| t.task_id.as_str());
    let (state, remaining) = match &r.tick {
        Tick::Idle => ("idle", 0),
        Tick::Running { remaining_sec } => ("running", *remaining_sec),
        Tick::Paused { remaining_sec } => ("paused", *remaining_sec),
        Tick::Finished { .. } => ("finished", 0),
    };
    writeln!(w, "{state}\t{task}\t{remaining}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use hearth_core::error::Notice;

    #[derive(Parser)]
    struct Wrapper {
        #[command(subcommand)]
        command: TimerCommand,
    }

    #[test]
    fn start_requires_task() {
        assert!(Wrapper::try_parse_from(["test", "start"]).is_err());
        let w = Wrapper::parse_from(["test", "start", "lavar"]);
        assert!(matches!(w.command, TimerCommand::Start(ref a) if a.task == "lavar"));
    }

    #[test]
    fn clock_face_formats() {
        assert_eq!(clock_face(0), "00:00");
        assert_eq!(clock_face(599), "09:59");
        assert_eq!(clock_face(3_725), "1:02:05");
        assert_eq!(clock_face(-4), "00:00");
    }

    #[test]
    fn idle_text_row() {
        let report = TimerReport {
            timer: None,
            tick: Tick::Idle,
            notice: Notice::info("No active timer"),
        };
        let mut buf = Vec::new();
        write_text(&report, &mut buf).expect("write");
        assert_eq!(String::from_utf8(buf).expect("utf8"), "idle\t-\t0\n");
    }
}
