//! `hearth backup`: export and restore the household's logs.

use anyhow::{Context as _, Result};
use clap::{Args, Subcommand};
use hearth_core::backup::{RestoreReport, file_name};
use serde::Serialize;
use std::io::{self, Write};
use std::path::PathBuf;

use super::RunContext;
use crate::output::render;

#[derive(Subcommand, Debug)]
pub enum BackupCommand {
    #[command(
        about = "Write a backup file",
        after_help = "EXAMPLES:\n    hearth backup export\n    hearth backup export --out - > backup.json"
    )]
    Export(ExportArgs),

    #[command(
        about = "Replace local logs and preferences from a backup file",
        after_help = "EXAMPLES:\n    hearth backup import hearth_backup_2024-03-06.json"
    )]
    Import(ImportArgs),
}

#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Destination file, or `-` for stdout. Defaults to
    /// `hearth_backup_<date>.json` in the project root.
    #[arg(long, short)]
    pub out: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct ImportArgs {
    /// Backup file to restore.
    pub file: PathBuf,
}

#[derive(Debug, Serialize)]
struct ExportReport {
    path: String,
    logs: usize,
}

#[derive(Debug, Serialize)]
struct ImportReport<'a> {
    file: String,
    #[serde(flatten)]
    restored: &'a RestoreReport,
}

pub fn run_backup(command: &BackupCommand, ctx: &RunContext) -> Result<()> {
    match command {
        BackupCommand::Export(args) => run_export(args, ctx),
        BackupCommand::Import(args) => run_import(args, ctx),
    }
}

fn run_export(args: &ExportArgs, ctx: &RunContext) -> Result<()> {
    let session = ctx.open_session()?;
    let doc = session.export_backup()?;
    let body = doc.to_json_pretty()?;

    if args.out.as_deref().is_some_and(|p| p.as_os_str() == "-") {
        let stdout = io::stdout();
        let mut out = stdout.lock();
        out.write_all(body.as_bytes())?;
        writeln!(out)?;
        return Ok(());
    }

    let context = session.context();
    let path = args.out.clone().unwrap_or_else(|| {
        let today = context.now.with_timezone(&context.tz).date_naive();
        ctx.project_root.join(file_name(today))
    });
    std::fs::write(&path, body)
        .with_context(|| format!("Failed to write backup: {}", path.display()))?;
    tracing::info!(path = %path.display(), logs = doc.logs.len(), "backup exported");

    let report = ExportReport {
        path: path.display().to_string(),
        logs: doc.logs.len(),
    };
    render(ctx.output, &report, |r, w| {
        writeln!(w, "✓ Backup written to {} ({} logs)", r.path, r.logs)
    })
}

fn run_import(args: &ImportArgs, ctx: &RunContext) -> Result<()> {
    let raw = std::fs::read_to_string(&args.file)
        .with_context(|| format!("Failed to read backup: {}", args.file.display()))?;
    let mut session = ctx.open_session()?;
    let restored = session.import_backup(&raw)?;

    let report = ImportReport {
        file: args.file.display().to_string(),
        restored: &restored,
    };
    render(ctx.output, &report, write_import)
}

fn write_import(r: &ImportReport<'_>, w: &mut dyn Write) -> io::Result<()> {
    writeln!(w, "✓ Restored {} logs from {}", r.restored.logs, r.file)?;
    if r.restored.prefs_restored {
        writeln!(w, "  Preferences restored too.")?;
    }
    Ok(())
}
