use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};

use crate::aggregate::DEFAULT_LAGGING_LIMIT;

/// Household state directory under the project root.
pub const HEARTH_DIR: &str = ".hearth";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HouseholdConfig {
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub report: ReportConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Base catalog JSON, relative to the project root.
    #[serde(default = "default_catalog_path")]
    pub path: PathBuf,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            path: default_catalog_path(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Kv store directory, relative to the project root.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportConfig {
    #[serde(default = "default_lagging_limit")]
    pub lagging_limit: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            lagging_limit: default_lagging_limit(),
        }
    }
}

impl HouseholdConfig {
    #[must_use]
    pub fn catalog_path(&self, project_root: &Path) -> PathBuf {
        project_root.join(&self.catalog.path)
    }

    #[must_use]
    pub fn data_dir(&self, project_root: &Path) -> PathBuf {
        project_root.join(&self.storage.data_dir)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UserConfig {
    #[serde(default)]
    pub output: Option<String>,
    /// Person id selected when the preferences have none.
    #[serde(default)]
    pub user: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EffectiveConfig {
    pub household: HouseholdConfig,
    pub user: UserConfig,
    pub resolved_output: String,
}

#[must_use]
pub fn config_path(project_root: &Path) -> PathBuf {
    project_root.join(HEARTH_DIR).join("config.toml")
}

pub fn load_household_config(project_root: &Path) -> Result<HouseholdConfig> {
    let path = config_path(project_root);
    if !path.exists() {
        return Ok(HouseholdConfig::default());
    }

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<HouseholdConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

pub fn load_user_config() -> Result<UserConfig> {
    let Some(config_dir) = dirs::config_dir() else {
        return Ok(UserConfig::default());
    };

    let path = config_dir.join("hearth/config.toml");
    if !path.exists() {
        return Ok(UserConfig::default());
    }

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<UserConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

/// TOML written by `hearth init`.
pub fn render_default_config() -> Result<String> {
    toml::to_string_pretty(&HouseholdConfig::default()).context("Failed to render default config")
}

pub fn resolve_config(project_root: &Path, cli_json: bool) -> Result<EffectiveConfig> {
    let household = load_household_config(project_root)?;
    let user = load_user_config()?;

    let env_format = env::var("FORMAT").ok();
    let resolved_output = resolve_output(cli_json, user.output.clone(), env_format);

    Ok(EffectiveConfig {
        household,
        user,
        resolved_output,
    })
}

fn resolve_output(cli_json: bool, user_output: Option<String>, env_format: Option<String>) -> String {
    fn normalize_output_mode(raw: &str) -> Option<&'static str> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "pretty" | "human" => Some("pretty"),
            "text" | "table" => Some("text"),
            "json" => Some("json"),
            _ => None,
        }
    }

    if cli_json {
        return "json".to_string();
    }

    if let Some(mode) = env_format.as_deref().and_then(normalize_output_mode) {
        return mode.to_string();
    }

    if let Some(mode) = user_output.as_deref().and_then(normalize_output_mode) {
        return mode.to_string();
    }

    if std::io::stdout().is_terminal() {
        "pretty".to_string()
    } else {
        "text".to_string()
    }
}

fn default_catalog_path() -> PathBuf {
    PathBuf::from("config.json")
}

fn default_data_dir() -> PathBuf {
    PathBuf::from(HEARTH_DIR).join("data")
}

const fn default_lagging_limit() -> usize {
    DEFAULT_LAGGING_LIMIT
}
