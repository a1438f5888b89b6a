//! Shared output layer for pretty/text/JSON parity across all CLI commands.
//!
//! Every command handler receives an [`OutputMode`] and formats its output
//! accordingly: pretty output for people at a terminal, compact text for
//! pipes, or stable JSON.
//!
//! # Output mode resolution
//!
//! Precedence (highest wins):
//! 1. `--json`
//! 2. `FORMAT` env var → `"pretty"` | `"text"` | `"json"`
//! 3. `output` in the user config
//! 4. Default: [`OutputMode::Pretty`] if stdout is a TTY; [`OutputMode::Text`] if piped.
//!
//! The resolution itself lives in `hearth_core::config`; this module only
//! maps the resolved name.

use hearth_core::error::{HearthError, Notice, NoticeLevel};
use serde::Serialize;
use std::io::{self, Write};

/// Shared width for human pretty separators.
pub const PRETTY_RULE_WIDTH: usize = 56;

/// Write a horizontal separator used by pretty human output.
pub fn pretty_rule(w: &mut dyn Write) -> io::Result<()> {
    writeln!(w, "{:-<width$}", "", width = PRETTY_RULE_WIDTH)
}

/// Write a section heading followed by a separator.
pub fn pretty_section(w: &mut dyn Write, heading: &str) -> io::Result<()> {
    writeln!(w, "{heading}")?;
    pretty_rule(w)
}

/// Render a left-aligned key/value line in human output.
pub fn pretty_kv(w: &mut dyn Write, key: &str, value: impl AsRef<str>) -> io::Result<()> {
    writeln!(w, "{:<12} {}", format!("{key}:"), value.as_ref())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Sections, rules and labels.
    Pretty,
    /// One tab-separated row per record.
    Text,
    /// Machine-readable JSON.
    Json,
}

impl OutputMode {
    /// Map a name produced by `hearth_core::config::resolve_config`.
    pub fn from_resolved(name: &str) -> Self {
        match name {
            "json" => Self::Json,
            "text" => Self::Text,
            _ => Self::Pretty,
        }
    }

    pub const fn is_json(self) -> bool {
        matches!(self, Self::Json)
    }

    pub const fn is_pretty(self) -> bool {
        matches!(self, Self::Pretty)
    }
}

/// Render a serializable value with explicit pretty/text renderers.
pub fn render_mode<T: Serialize>(
    mode: OutputMode,
    value: &T,
    text_fn: impl FnOnce(&T, &mut dyn Write) -> io::Result<()>,
    pretty_fn: impl FnOnce(&T, &mut dyn Write) -> io::Result<()>,
) -> anyhow::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    match mode {
        OutputMode::Json => {
            serde_json::to_writer_pretty(&mut out, value)?;
            writeln!(out)?;
        }
        OutputMode::Text => text_fn(value, &mut out)?,
        OutputMode::Pretty => pretty_fn(value, &mut out)?,
    }
    Ok(())
}

/// Render a serializable value to stdout in the requested format.
///
/// In JSON mode, the value is serialized with `serde_json`. In pretty/text mode,
/// the provided `human_fn` closure is called to produce text output.
/// For distinct text/pretty rendering, use [`render_mode`].
pub fn render<T: Serialize>(
    mode: OutputMode,
    value: &T,
    human_fn: impl FnOnce(&T, &mut dyn Write) -> io::Result<()>,
) -> anyhow::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    match mode {
        OutputMode::Json => {
            serde_json::to_writer_pretty(&mut out, value)?;
            writeln!(out)?;
        }
        OutputMode::Pretty | OutputMode::Text => {
            human_fn(value, &mut out)?;
        }
    }
    Ok(())
}

/// A structured error with optional suggestion and error code.
#[derive(Debug, Serialize)]
pub struct CliError {
    /// Human-readable error message.
    pub message: String,
    /// Optional suggestion for how to fix the error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
    /// Machine-readable error code (e.g. "E2002").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
}

impl CliError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            suggestion: None,
            error_code: None,
        }
    }

    /// Best structured form of an arbitrary command failure.
    pub fn from_anyhow(err: &anyhow::Error) -> Self {
        err.downcast_ref::<HearthError>()
            .map_or_else(|| Self::new(format!("{err:#}")), Self::from)
    }
}

impl From<&HearthError> for CliError {
    fn from(err: &HearthError) -> Self {
        Self {
            message: err.to_string(),
            suggestion: Some(err.suggestion()),
            error_code: Some(err.error_code().to_string()),
        }
    }
}

/// Render an error to stderr in the requested format.
pub fn render_error(mode: OutputMode, error: &CliError) -> anyhow::Result<()> {
    let stderr = io::stderr();
    let mut out = stderr.lock();
    match mode {
        OutputMode::Json => {
            let wrapper = serde_json::json!({
                "error": error,
            });
            serde_json::to_writer_pretty(&mut out, &wrapper)?;
            writeln!(out)?;
        }
        OutputMode::Pretty | OutputMode::Text => {
            writeln!(out, "error: {}", error.message)?;
            if let Some(ref suggestion) = error.suggestion {
                writeln!(out, "  suggestion: {suggestion}")?;
            }
        }
    }
    Ok(())
}

/// Prefix used for a notice in human output.
pub const fn notice_marker(level: NoticeLevel) -> &'static str {
    match level {
        NoticeLevel::Info => "✓",
        NoticeLevel::Warn => "!",
        NoticeLevel::Error => "✗",
    }
}

/// Write a notice line. Warnings and errors go to stderr, and `quiet`
/// suppresses informational lines.
pub fn write_notice(notice: &Notice, quiet: bool) -> io::Result<()> {
    match notice.level {
        NoticeLevel::Info if quiet => Ok(()),
        NoticeLevel::Info => {
            let stdout = io::stdout();
            writeln!(stdout.lock(), "{} {}", notice_marker(notice.level), notice.message)
        }
        NoticeLevel::Warn | NoticeLevel::Error => {
            let stderr = io::stderr();
            writeln!(stderr.lock(), "{} {}", notice_marker(notice.level), notice.message)
        }
    }
}

/// Serialize `value` next to its notice: `{"notice": {...}, ...value}`.
pub fn with_notice<T: Serialize>(notice: &Notice, value: &T) -> serde_json::Result<serde_json::Value> {
    let mut body = serde_json::to_value(value)?;
    let notice = serde_json::to_value(notice)?;
    match &mut body {
        serde_json::Value::Object(map) => {
            map.insert("notice".to_string(), notice);
            Ok(body)
        }
        _ => Ok(serde_json::json!({ "notice": notice, "value": body })),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolved_names_map_to_modes() {
        assert_eq!(OutputMode::from_resolved("json"), OutputMode::Json);
        assert_eq!(OutputMode::from_resolved("text"), OutputMode::Text);
        assert_eq!(OutputMode::from_resolved("pretty"), OutputMode::Pretty);
        assert!(OutputMode::Json.is_json());
        assert!(!OutputMode::Text.is_pretty());
    }

    #[test]
    fn hearth_errors_keep_code_and_hint() {
        let err = HearthError::TaskNotFound("lavar".into());
        let cli = CliError::from(&err);
        assert_eq!(cli.message, "task 'lavar' not found");
        assert_eq!(cli.error_code.as_deref(), Some("E2002"));
        assert!(cli.suggestion.as_deref().is_some_and(|s| s.contains("task list")));
    }

    #[test]
    fn anyhow_errors_downcast_when_possible() {
        let wrapped = anyhow::Error::new(HearthError::PersonRequired);
        assert_eq!(
            CliError::from_anyhow(&wrapped).error_code.as_deref(),
            Some("E2003")
        );

        let plain = anyhow::anyhow!("disk on fire");
        let cli = CliError::from_anyhow(&plain);
        assert_eq!(cli.message, "disk on fire");
        assert!(cli.error_code.is_none());
    }

    #[test]
    fn pretty_kv_pads_key() {
        let mut buf = Vec::new();
        pretty_kv(&mut buf, "Week", "2024-W10").expect("write");
        assert_eq!(String::from_utf8(buf).expect("utf8"), "Week:        2024-W10\n");
    }

    #[test]
    fn notice_merges_into_object() {
        let notice = Notice::info("Done");
        let merged = with_notice(&notice, &serde_json::json!({"task": "lavar"})).expect("json");
        assert_eq!(merged["task"], "lavar");
        assert_eq!(merged["notice"]["level"], "info");

        let scalar = with_notice(&notice, &3).expect("json");
        assert_eq!(scalar["value"], 3);
    }
}
