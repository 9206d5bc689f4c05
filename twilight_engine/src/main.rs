#![warn(clippy::pedantic)]
#![allow(clippy::must_use_candidate)]
//! ** Twilight Marches **
//! Loads the configured content packs and reports what was merged.
//!
//! Usage: `twilight_engine [CONFIG]` (defaults to `twilight.toml` in the data directory).

use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use chrono::Local;
use colored::Colorize;
use log::info;

use twilight_data::Severity;
use twilight_engine::{ContentRegistry, EngineConfig};

fn main() -> Result<()> {
    env_logger::init();

    let config = match env::args_os().nth(1) {
        Some(path) => EngineConfig::load(&PathBuf::from(path)),
        None => EngineConfig::load_default(),
    }
    .context("while loading engine config")?;

    let paths = config.pack_paths().context("while locating packs")?;
    info!("Start: loading {} pack(s) from {}", paths.len(), config.pack_dir.display());

    let mut registry = ContentRegistry::new();
    registry.load_packs(&paths).context("while loading content packs")?;

    println!("{}", "TWILIGHT MARCHES: CONTENT".bright_yellow().underline());
    for pack_id in registry.loaded_pack_ids() {
        if let Some(pack) = registry.pack(pack_id) {
            println!(
                "  {} v{} ({:?}), loaded {}",
                pack_id.bold(),
                pack.manifest().version,
                pack.manifest().pack_type,
                pack.loaded_at.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S")
            );
        }
    }
    println!("\n{}", registry.merged().counts());

    let entries = registry.validate_all_content();
    let mut errors = 0;
    for entry in &entries {
        match entry.severity() {
            Severity::Error => {
                errors += 1;
                println!("{} {entry}", "error:".red().bold());
            },
            Severity::Warning => println!("{} {entry}", "warning:".yellow().bold()),
            Severity::Info if config.report_overrides => println!("{} {entry}", "info:".cyan()),
            Severity::Info => {},
        }
    }

    if config.strict_validation && errors > 0 {
        bail!("{errors} validation error(s) in merged content");
    }
    if let Err(err) = registry.check_playable() {
        println!("{} {err}", "warning:".yellow().bold());
    }
    Ok(())
}
