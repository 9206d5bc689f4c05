//! Engine configuration (`twilight.toml`).
//!
//! Names the pack directory, which packs to load, and how strictly to treat validation
//! results. A missing file means defaults.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::info;
use serde::{Deserialize, Serialize};
use twilight_data::pack_file::PACK_EXTENSION;

use crate::data_paths::{PACKS_DIR, data_path};

pub const CONFIG_FILE: &str = "twilight.toml";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Directory holding compiled packs. Relative paths resolve against the config file.
    pub pack_dir: PathBuf,
    /// Pack files to load, relative to `pack_dir`. Empty means every `.pack` in the directory.
    pub packs: Vec<String>,
    /// Refuse to start when merged content has validation errors.
    pub strict_validation: bool,
    /// Print cross-pack overrides along with the other validation entries.
    pub report_overrides: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            pack_dir: PathBuf::from(PACKS_DIR),
            packs: Vec::new(),
            strict_validation: false,
            report_overrides: true,
        }
    }
}

impl EngineConfig {
    /// Load `twilight.toml` from the data directory.
    ///
    /// # Errors
    /// Read or parse failures of an existing file.
    pub fn load_default() -> Result<Self> {
        Self::load(&data_path(CONFIG_FILE))
    }

    /// Load a config file, or defaults (relative to the file's directory) if it doesn't exist.
    ///
    /// # Errors
    /// Read or parse failures of an existing file.
    pub fn load(path: &Path) -> Result<Self> {
        let base = path.parent().unwrap_or_else(|| Path::new("."));
        let mut config = if path.exists() {
            let text = fs::read_to_string(path).with_context(|| format!("reading config '{}'", path.display()))?;
            toml::from_str::<EngineConfig>(&text).with_context(|| format!("parsing config '{}'", path.display()))?
        } else {
            info!("no config at '{}', using defaults", path.display());
            EngineConfig::default()
        };
        if config.pack_dir.is_relative() {
            config.pack_dir = base.join(&config.pack_dir);
        }
        Ok(config)
    }

    /// Pack files to load: the configured list, or every `.pack` in `pack_dir` sorted by name.
    ///
    /// # Errors
    /// If `pack_dir` cannot be listed.
    pub fn pack_paths(&self) -> Result<Vec<PathBuf>> {
        if !self.packs.is_empty() {
            return Ok(self
                .packs
                .iter()
                .map(|name| {
                    let path = self.pack_dir.join(name);
                    if path.extension().is_none() {
                        path.with_extension(PACK_EXTENSION)
                    } else {
                        path
                    }
                })
                .collect());
        }

        let entries = fs::read_dir(&self.pack_dir)
            .with_context(|| format!("listing pack directory '{}'", self.pack_dir.display()))?;
        let mut paths = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.extension().and_then(|ext| ext.to_str()) == Some(PACK_EXTENSION) {
                paths.push(path);
            }
        }
        paths.sort();
        Ok(paths)
    }
}
