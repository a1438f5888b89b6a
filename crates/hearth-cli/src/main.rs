#![forbid(unsafe_code)]

mod cmd;
mod output;

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use cmd::RunContext;
use hearth_core::config::resolve_config;
use output::{CliError, OutputMode, render_error};
use std::env;
use tracing::debug;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "hearth: household chore tracker",
    long_about = None
)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON output instead of human-readable text.
    #[arg(long, global = true)]
    json: bool,

    /// Suppress non-essential output.
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Pretend the current time is this RFC 3339 timestamp.
    #[arg(long, global = true, value_parser = parse_now)]
    now: Option<DateTime<Utc>>,

    #[command(subcommand)]
    command: Commands,
}

fn parse_now(raw: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|err| format!("expected an RFC 3339 timestamp: {err}"))
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        next_help_heading = "Setup",
        about = "Initialize a household in the current directory",
        long_about = "Create .hearth/ with a default config and, if missing, a starter config.json catalog.",
        after_help = "EXAMPLES:\n    # Start a new household\n    hearth init\n\n    # Rewrite .hearth/config.toml\n    hearth init --force"
    )]
    Init(cmd::init::InitArgs),

    #[command(
        next_help_heading = "Setup",
        about = "Show or select the current user",
        after_help = "EXAMPLES:\n    hearth user\n    hearth user mama"
    )]
    User(cmd::user::UserArgs),

    #[command(
        next_help_heading = "Setup",
        about = "Show or switch express mode",
        long_about = "Express mode swaps tasks marked hide_on_express for their only_on_express variants.",
        after_help = "EXAMPLES:\n    hearth express\n    hearth express on\n    hearth express toggle"
    )]
    Express(cmd::express::ExpressArgs),

    #[command(
        next_help_heading = "Views",
        about = "Today's board for a person",
        after_help = "EXAMPLES:\n    hearth today\n    hearth today --user mama --json"
    )]
    Today(cmd::today::TodayArgs),

    #[command(
        next_help_heading = "Views",
        about = "Tomorrow and the rest of the week",
        after_help = "EXAMPLES:\n    hearth week\n    hearth week -u papa"
    )]
    Week(cmd::week::WeekArgs),

    #[command(
        next_help_heading = "Views",
        about = "Weekly compliance, lagging tasks and contributions",
        after_help = "EXAMPLES:\n    hearth summary\n    hearth summary --json"
    )]
    Summary,

    #[command(
        next_help_heading = "Tracking",
        about = "Mark a task done for today",
        after_help = "EXAMPLES:\n    hearth done cocina_zona_agua\n    hearth --now 2024-03-06T18:00:00Z done general_basura"
    )]
    Done(cmd::done::DoneArgs),

    #[command(
        next_help_heading = "Tracking",
        about = "Remove the latest completion of a task",
        after_help = "EXAMPLES:\n    hearth undo cocina_zona_agua"
    )]
    Undo(cmd::done::UndoArgs),

    #[command(
        next_help_heading = "Tracking",
        about = "Countdown timer for a task",
        after_help = "EXAMPLES:\n    hearth timer start general_trapear\n    hearth timer status"
    )]
    Timer {
        #[command(subcommand)]
        command: cmd::timer::TimerCommand,
    },

    #[command(
        next_help_heading = "Catalog",
        about = "List and edit tasks",
        after_help = "EXAMPLES:\n    hearth task list\n    hearth task add --name \"Regar plantas\" --zone Patio\n    hearth task reset"
    )]
    Task {
        #[command(subcommand)]
        command: cmd::task::TaskCommand,
    },

    #[command(
        next_help_heading = "Data",
        about = "Export or restore a backup",
        after_help = "EXAMPLES:\n    hearth backup export\n    hearth backup import hearth_backup_2024-03-06.json"
    )]
    Backup {
        #[command(subcommand)]
        command: cmd::backup::BackupCommand,
    },
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_env("HEARTH_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if verbose || env::var("DEBUG").is_ok() {
            "hearth=debug,info"
        } else {
            "hearth=info,warn"
        })
    });

    let format = env::var("HEARTH_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    // Logs share stderr with error output; stdout stays clean for --json.
    let registry = tracing_subscriber::registry().with(filter);
    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}

fn dispatch(command: &Commands, ctx: &RunContext) -> anyhow::Result<()> {
    match command {
        Commands::Init(args) => cmd::init::run_init(args, ctx.output, &ctx.project_root),
        Commands::User(args) => cmd::user::run_user(args, ctx),
        Commands::Express(args) => cmd::express::run_express(args, ctx),
        Commands::Today(args) => cmd::today::run_today(args, ctx),
        Commands::Week(args) => cmd::week::run_week(args, ctx),
        Commands::Summary => cmd::summary::run_summary(ctx),
        Commands::Done(args) => cmd::done::run_done(args, ctx),
        Commands::Undo(args) => cmd::done::run_undo(args, ctx),
        Commands::Timer { command } => cmd::timer::run_timer(command, ctx),
        Commands::Task { command } => cmd::task::run_task(command, ctx),
        Commands::Backup { command } => cmd::backup::run_backup(command, ctx),
    }
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let project_root = env::current_dir()?;
    let config = resolve_config(&project_root, cli.json)?;
    let output = OutputMode::from_resolved(&config.resolved_output);
    debug!(root = %project_root.display(), output = %config.resolved_output, "config resolved");

    let ctx = RunContext {
        project_root,
        config,
        output,
        quiet: cli.quiet,
        now: cli.now,
    };
    dispatch(&cli.command, &ctx)
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(err) = run(&cli) {
        // Config may not have resolved; only --json is certain here.
        let mode = if cli.json {
            OutputMode::Json
        } else {
            OutputMode::Text
        };
        if render_error(mode, &CliError::from_anyhow(&err)).is_err() {
            eprintln!("error: {err:#}");
        }
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_flag_parses_after_subcommand() {
        let cli = Cli::parse_from(["hearth", "today", "--json"]);
        assert!(cli.json);
        assert!(matches!(cli.command, Commands::Today(_)));
    }

    #[test]
    fn quiet_flag_parsed() {
        let cli = Cli::parse_from(["hearth", "-q", "done", "lavar"]);
        assert!(cli.quiet);
        assert!(matches!(cli.command, Commands::Done(ref a) if a.task == "lavar"));
    }

    #[test]
    fn now_flag_parses_rfc3339() {
        let cli = Cli::parse_from(["hearth", "--now", "2024-03-06T12:00:00-06:00", "summary"]);
        let expected = DateTime::parse_from_rfc3339("2024-03-06T18:00:00Z")
            .expect("ts")
            .with_timezone(&Utc);
        assert_eq!(cli.now, Some(expected));
    }

    #[test]
    fn now_flag_rejects_garbage() {
        assert!(Cli::try_parse_from(["hearth", "--now", "yesterday", "summary"]).is_err());
    }

    #[test]
    fn nested_subcommands_parse() {
        let cli = Cli::parse_from(["hearth", "timer", "start", "lavar"]);
        assert!(matches!(cli.command, Commands::Timer { .. }));
        let cli = Cli::parse_from(["hearth", "task", "delete", "lavar"]);
        assert!(matches!(cli.command, Commands::Task { .. }));
        let cli = Cli::parse_from(["hearth", "backup", "import", "b.json"]);
        assert!(matches!(cli.command, Commands::Backup { .. }));
    }

    #[test]
    fn all_subcommands_listed() {
        let commands = [
            vec!["init"],
            vec!["user"],
            vec!["express"],
            vec!["today"],
            vec!["week"],
            vec!["summary"],
            vec!["done", "x"],
            vec!["undo", "x"],
            vec!["timer", "status"],
            vec!["task", "list"],
            vec!["backup", "export"],
        ];
        for args in commands {
            let mut argv = vec!["hearth"];
            argv.extend(args.iter().copied());
            assert!(
                Cli::try_parse_from(&argv).is_ok(),
                "failed to parse: {argv:?}"
            );
        }
    }
}
