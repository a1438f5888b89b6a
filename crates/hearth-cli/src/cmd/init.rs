use anyhow::{Context as _, Result};
use clap::Args;
use hearth_core::config::{HEARTH_DIR, config_path, render_default_config};
use serde::Serialize;
use std::io::{self, Write};
use std::path::Path;

use crate::output::{OutputMode, render};

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Rewrite `.hearth/config.toml` even if `.hearth/` already exists.
    #[arg(long)]
    pub force: bool,
}

const GITIGNORE: &str = "data/\n";

/// Catalog written when the project has none yet.
const STARTER_CATALOG: &str = r#"{
  "app": { "timezone": "America/Mexico_City" },
  "people": [
    { "id": "papa", "label": "Papá" },
    { "id": "mama", "label": "Mamá" }
  ],
  "zones": ["Cocina", "General", "BossFight"],
  "tasks": [
    { "id": "cocina_zona_agua", "name": "Zona de agua", "zone": "Cocina",
      "frequency": "daily", "assigned_to": "mama", "points": 2, "minutes": 10 },
    { "id": "cocina_superficies", "name": "Superficies", "zone": "Cocina",
      "frequency": "daily", "assigned_to": "papa", "points": 1, "minutes": 5 },
    { "id": "cocina_guardar", "name": "Guardar todo", "zone": "Cocina",
      "frequency": "daily", "assigned_to": "", "points": 1, "minutes": 5,
      "hide_on_express": true },
    { "id": "cocina_guardar_express", "name": "Guardar lo esencial", "zone": "Cocina",
      "frequency": "daily", "assigned_to": "", "points": 1, "minutes": 2,
      "only_on_express": true },
    { "id": "general_basura", "name": "Sacar basura", "zone": "General",
      "frequency": "weekly_days", "days": ["mon", "thu"], "assigned_to": "papa",
      "points": 1, "minutes": 5 },
    { "id": "general_trapear", "name": "Trapear", "zone": "General",
      "frequency": "weekly_times", "times_per_week": 2, "assigned_to": "mama",
      "points": 3, "minutes": 25 },
    { "id": "bossfight_refri", "name": "Limpiar refri", "zone": "BossFight",
      "frequency": "weekly", "assigned_to": "", "points": 5, "minutes": 40 }
  ],
  "rewards": { "family_weekly_reward": "Noche de pizza" },
  "cloud": { "enabled": false, "houseId": "", "firebaseConfig": null }
}
"#;

#[derive(Debug, Serialize)]
struct InitReport {
    config: String,
    catalog: String,
    catalog_created: bool,
}

/// Execute `hearth init`. Creates the household skeleton:
///
/// ```text
/// .hearth/
///   config.toml   (default household config)
///   .gitignore    (data/)
///   data/         (kv store, created on first write)
/// config.json     (starter catalog, only if missing)
/// ```
///
/// # Errors
///
/// Returns an error if `.hearth/` already exists and `--force` is not set,
/// or if any filesystem operation fails.
pub fn run_init(args: &InitArgs, output: OutputMode, project_root: &Path) -> Result<()> {
    let hearth_dir = project_root.join(HEARTH_DIR);
    if hearth_dir.exists() && !args.force {
        anyhow::bail!(".hearth/ already exists. Use `hearth init --force` to reinitialize.");
    }

    std::fs::create_dir_all(&hearth_dir)
        .with_context(|| format!("Failed to create {}", hearth_dir.display()))?;

    let config = config_path(project_root);
    std::fs::write(&config, render_default_config()?)
        .with_context(|| format!("Failed to write config: {}", config.display()))?;

    let gitignore = hearth_dir.join(".gitignore");
    std::fs::write(&gitignore, GITIGNORE)
        .with_context(|| format!("Failed to write {}", gitignore.display()))?;

    let catalog = project_root.join("config.json");
    let catalog_created = !catalog.exists();
    if catalog_created {
        std::fs::write(&catalog, STARTER_CATALOG)
            .with_context(|| format!("Failed to write catalog: {}", catalog.display()))?;
    }
    tracing::info!(root = %project_root.display(), catalog_created, "household initialized");

    let report = InitReport {
        config: ".hearth/config.toml".to_string(),
        catalog: "config.json".to_string(),
        catalog_created,
    };
    render(output, &report, write_human)
}

fn write_human(r: &InitReport, w: &mut dyn Write) -> io::Result<()> {
    writeln!(w, "✓ Initialized .hearth/ household.")?;
    writeln!(w)?;
    writeln!(w, "  Config:  {}", r.config)?;
    if r.catalog_created {
        writeln!(w, "  Catalog: {} (starter template, edit freely)", r.catalog)?;
    } else {
        writeln!(w, "  Catalog: {} (kept)", r.catalog)?;
    }
    writeln!(w)?;
    writeln!(w, "Next steps:")?;
    writeln!(w, "  hearth user          # see who is selected")?;
    writeln!(w, "  hearth today         # today's board")
}

#[cfg(test)]
mod tests {
    use super::*;
    use hearth_core::catalog::Catalog;

    #[test]
    fn init_creates_skeleton_and_starter_catalog() {
        let dir = tempfile::tempdir().expect("tempdir");
        run_init(&InitArgs { force: false }, OutputMode::Json, dir.path()).expect("init");

        assert!(config_path(dir.path()).exists());
        assert!(dir.path().join(".hearth/.gitignore").exists());
        let catalog = Catalog::load(&dir.path().join("config.json")).expect("starter parses");
        assert_eq!(catalog.people.len(), 2);
        assert!(catalog.tasks.iter().any(|t| t.id == "cocina_guardar_express"));
    }

    #[test]
    fn second_init_requires_force() {
        let dir = tempfile::tempdir().expect("tempdir");
        run_init(&InitArgs { force: false }, OutputMode::Json, dir.path()).expect("init");
        assert!(run_init(&InitArgs { force: false }, OutputMode::Json, dir.path()).is_err());
        run_init(&InitArgs { force: true }, OutputMode::Json, dir.path()).expect("force");
    }

    #[test]
    fn existing_catalog_is_kept() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("config.json"), "{\"people\":[]}").expect("write");
        run_init(&InitArgs { force: false }, OutputMode::Json, dir.path()).expect("init");
        let raw = std::fs::read_to_string(dir.path().join("config.json")).expect("read");
        assert_eq!(raw, "{\"people\":[]}");
    }
}
