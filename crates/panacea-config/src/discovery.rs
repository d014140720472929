//! Where config files live and how the layers stack.
//!
//! Two file layers are consulted, later winning over earlier:
//! user (`~/.config/panacea/config.toml`) then project (`./panacea.toml`).
//! CLI flags sit above both and are applied by the binary, not here.

use std::path::{Path, PathBuf};

use crate::{ConfigError, PanaceaConfig, Result};

/// Filename of the project-local layer.
const PROJECT_CONFIG_FILE: &str = "panacea.toml";

/// Filename inside the user config directory.
const USER_CONFIG_FILE: &str = "config.toml";

/// Directory name under the platform config/data roots.
const APP_NAME: &str = "panacea";

/// Environment override for the user config directory, mainly for tests
/// and side-by-side installs.
const CONFIG_DIR_ENV: &str = "PANACEA_CONFIG_DIR";

/// One candidate location that discovery looked at.
#[derive(Debug, Clone)]
pub struct ConfigSource {
    /// Path that was checked.
    pub path: PathBuf,
    /// Whether a file was there and merged in.
    pub loaded: bool,
}

impl ConfigSource {
    fn merged(path: PathBuf) -> Self {
        Self { path, loaded: true }
    }

    fn skipped(path: PathBuf) -> Self {
        Self {
            path,
            loaded: false,
        }
    }
}

/// Outcome of discovery: the merged config plus a record of where it
/// came from, so `status` and `config` can show their work.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    /// Fully merged configuration.
    pub config: PanaceaConfig,
    /// Every candidate checked, lowest precedence first.
    pub sources: Vec<ConfigSource>,
    /// Non-fatal problems, such as a layer that failed to parse.
    pub warnings: Vec<String>,
}

impl LoadedConfig {
    /// Paths of the layers that actually contributed settings.
    pub fn loaded_from(&self) -> Vec<&Path> {
        self.sources
            .iter()
            .filter_map(|s| s.loaded.then_some(s.path.as_path()))
            .collect()
    }
}

/// Discover and merge all config layers from their default locations.
pub fn load_config() -> Result<LoadedConfig> {
    load_config_with_options(None, None)
}

/// Discover and merge config layers with explicit directories.
///
/// `config_dir` replaces both the `PANACEA_CONFIG_DIR` lookup and the
/// platform default; `project_dir` stands in for the working directory.
pub fn load_config_with_options(
    project_dir: Option<&Path>,
    config_dir: Option<&Path>,
) -> Result<LoadedConfig> {
    let user_layer = match config_dir {
        Some(dir) => Some(dir.join(USER_CONFIG_FILE)),
        None => xdg_config_path(),
    };
    let project_layer = match project_dir {
        Some(dir) => dir.join(PROJECT_CONFIG_FILE),
        None => PathBuf::from(PROJECT_CONFIG_FILE),
    };

    let mut config = PanaceaConfig::new();
    let mut sources = Vec::new();
    let mut warnings = Vec::new();

    for path in user_layer.into_iter().chain(Some(project_layer)) {
        if !path.is_file() {
            sources.push(ConfigSource::skipped(path));
            continue;
        }
        match load_config_file(&path) {
            Ok(layer) => {
                config.merge(layer);
                sources.push(ConfigSource::merged(path));
            }
            Err(e) => {
                warnings.push(format!("Failed to load {}: {}", path.display(), e));
                sources.push(ConfigSource::skipped(path));
            }
        }
    }

    Ok(LoadedConfig {
        config,
        sources,
        warnings,
    })
}

/// Parse a single config file, bypassing discovery entirely.
pub fn load_config_file(path: &Path) -> Result<PanaceaConfig> {
    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.display().to_string(),
        source: e,
    })?;
    PanaceaConfig::from_toml(&contents)
}

/// Expected path of the user config file.
pub fn xdg_config_path() -> Option<PathBuf> {
    xdg_config_dir().map(|d| d.join(USER_CONFIG_FILE))
}

/// The user config directory: `PANACEA_CONFIG_DIR` when set and
/// non-empty, otherwise the platform default (`~/.config/panacea` on
/// Linux).
pub fn xdg_config_dir() -> Option<PathBuf> {
    match std::env::var(CONFIG_DIR_ENV) {
        Ok(dir) if !dir.is_empty() => Some(PathBuf::from(dir)),
        _ => dirs::config_dir().map(|d| d.join(APP_NAME)),
    }
}

/// Where the chunk index lives unless config says otherwise.
pub fn default_index_path() -> Option<PathBuf> {
    dirs::data_dir().map(|d| d.join(APP_NAME).join("index.db"))
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
