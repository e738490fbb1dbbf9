use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::policy::CadencePolicy;

/// Directory holding the ledger and project config, relative to the project
/// root.
pub const PROJECT_DIR: &str = ".pulse";

const LEDGER_FILE: &str = "pulse.db";
const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectConfig {
    #[serde(default)]
    pub cadence: CadencePolicy,
}

#[must_use]
pub fn project_dir(root: &Path) -> PathBuf {
    root.join(PROJECT_DIR)
}

#[must_use]
pub fn ledger_path(root: &Path) -> PathBuf {
    project_dir(root).join(LEDGER_FILE)
}

#[must_use]
pub fn config_path(root: &Path) -> PathBuf {
    project_dir(root).join(CONFIG_FILE)
}

/// Load `.pulse/config.toml`, falling back to defaults when the file does
/// not exist. The cadence table is validated on the way in so a bad config
/// fails here rather than in the middle of a report.
pub fn load_project_config(root: &Path) -> Result<ProjectConfig> {
    let path = config_path(root);
    if !path.exists() {
        return Ok(ProjectConfig::default());
    }

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    let config = toml::from_str::<ProjectConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))?;

    config
        .cadence
        .validate()
        .with_context(|| format!("Invalid cadence table in {}", path.display()))?;

    Ok(config)
}
