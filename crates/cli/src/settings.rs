//! Config lookup: `--config`, then the platform config directory, then
//! built-in defaults.

use std::path::{Path, PathBuf};

use log::debug;

use docrecon_recon::ReconConfig;

use crate::CliError;

pub const CONFIG_FILE_NAME: &str = "docrecon.toml";

/// A loaded config plus the directory its relative paths are anchored to.
#[derive(Debug, Clone)]
pub struct Settings {
    pub config: ReconConfig,
    pub base_dir: PathBuf,
}

impl Settings {
    /// `path` as given if absolute, otherwise under [`Settings::base_dir`].
    pub fn resolve(&self, path: &str) -> PathBuf {
        let path = Path::new(path);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }

    pub fn store_path(&self) -> PathBuf {
        self.resolve(&self.config.store.path)
    }

    pub fn report_path(&self) -> PathBuf {
        self.resolve(&self.config.audit.report)
    }

    pub fn link_directories(&self) -> Vec<PathBuf> {
        self.config.link.directories.iter().map(|d| self.resolve(d)).collect()
    }
}

pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("docrecon").join(CONFIG_FILE_NAME))
}

pub fn load_settings(explicit: Option<&Path>) -> Result<Settings, CliError> {
    if let Some(path) = explicit {
        return read_settings(path);
    }
    match default_config_path() {
        Some(path) if path.is_file() => read_settings(&path),
        _ => {
            debug!("no config file; using defaults");
            Ok(Settings {
                config: ReconConfig::default(),
                base_dir: PathBuf::from("."),
            })
        }
    }
}

pub fn read_config(path: &Path) -> Result<ReconConfig, CliError> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| CliError::args(format!("cannot read config {}: {e}", path.display())))?;
    ReconConfig::from_toml(&text)
        .map_err(|e| CliError::args(format!("{}: {e}", path.display())))
}

fn read_settings(path: &Path) -> Result<Settings, CliError> {
    let config = read_config(path)?;
    debug!("loaded config from {}", path.display());
    let base_dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."))
        .to_path_buf();
    Ok(Settings { config, base_dir })
}
