//! Locating the engine's data directory: the one holding `twilight.toml` and the `packs/` folder.
//!
//! `TWILIGHT_DATA_DIR` wins when it names a directory. Otherwise the workspace layout, a
//! flattened `data/` and the directories around the executable are searched, preferring a
//! candidate that actually holds a config file or a pack folder over one that merely exists.

use std::env;
use std::iter;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use log::{debug, warn};

use crate::config::CONFIG_FILE;

/// Environment variable that pins the data directory.
pub const DATA_DIR_ENV: &str = "TWILIGHT_DATA_DIR";
/// Default pack folder inside the data directory.
pub const PACKS_DIR: &str = "packs";

const FALLBACK_ROOT: &str = "twilight_engine/data";

static DATA_ROOT: LazyLock<PathBuf> = LazyLock::new(|| {
    let exe_dir = env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf));
    resolve_data_root(
        env::var_os(DATA_DIR_ENV).map(PathBuf::from),
        &candidate_roots(exe_dir.as_deref()),
    )
});

/// The resolved data directory, computed once per process.
pub fn data_root() -> &'static Path {
    &DATA_ROOT
}

/// `relative` inside the data directory.
pub fn data_path(relative: impl AsRef<Path>) -> PathBuf {
    DATA_ROOT.join(relative)
}

/// Search order: working-directory layouts first, then the executable's directory and up to two
/// of its ancestors (covers `target/debug` and installed `bin/` layouts).
fn candidate_roots(exe_dir: Option<&Path>) -> Vec<PathBuf> {
    let mut roots = vec![PathBuf::from(FALLBACK_ROOT), PathBuf::from("data")];
    for base in iter::successors(exe_dir, |dir| dir.parent()).take(3) {
        roots.push(base.join("data"));
        roots.push(base.join(FALLBACK_ROOT));
    }
    roots
}

fn resolve_data_root(pinned: Option<PathBuf>, candidates: &[PathBuf]) -> PathBuf {
    if let Some(dir) = pinned {
        if dir.is_dir() {
            debug!("data directory pinned by {DATA_DIR_ENV}: {}", dir.display());
            return dir;
        }
        warn!("{DATA_DIR_ENV}='{}' is not a directory, searching instead", dir.display());
    }

    let root = candidates
        .iter()
        .find(|dir| holds_engine_data(dir))
        .or_else(|| candidates.iter().find(|dir| dir.is_dir()))
        .cloned()
        .unwrap_or_else(|| PathBuf::from(FALLBACK_ROOT));
    debug!("data directory: {}", root.display());
    root
}

fn holds_engine_data(dir: &Path) -> bool {
    dir.join(CONFIG_FILE).is_file() || dir.join(PACKS_DIR).is_dir()
}
