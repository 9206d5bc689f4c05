//! Reading a pack source directory: `manifest.json` plus the content files it names.
//!
//! A content path may point at a single JSON file holding an array of entries, or at a
//! directory whose `*.json` files (each an array) are read in name order and concatenated.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info};
use serde::de::DeserializeOwned;
use sha2::{Digest, Sha256};
use walkdir::WalkDir;

use twilight_data::manifest::{ContentFile, MANIFEST_FILE};
use twilight_data::{
    AbilityDefinition, BalanceConfiguration, BehaviorDefinition, CardDefinition, EnemyDefinition, FateCard, HeroDefinition,
    Id, PackContent, PackLoadError, PackManifest,
};

use crate::authoring::{RawAnchor, RawEvent, RawQuest, RawRegion};
use crate::error::CompileError;

/// A pack source directory with its parsed manifest.
#[derive(Debug, Clone)]
pub struct PackSource {
    dir: PathBuf,
    manifest: PackManifest,
}

/// Parsed content plus the bytes read to produce it.
#[derive(Debug, Clone)]
pub struct SourceContent {
    pub content: PackContent,
    /// Manifest and content file bytes.
    pub input_bytes: u64,
    pub files: Vec<PathBuf>,
}

impl PackSource {
    /// Read `manifest.json` from `dir`.
    ///
    /// # Errors
    /// `ManifestNotFound` or `InvalidManifest`.
    pub fn open(dir: &Path) -> Result<Self, CompileError> {
        let manifest = PackManifest::load(dir)?;
        Ok(Self {
            dir: dir.to_path_buf(),
            manifest,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn manifest(&self) -> &PackManifest {
        &self.manifest
    }

    /// Check every entry of the manifest's `checksums` table against the SHA-256 of the file.
    ///
    /// # Errors
    /// `FileNotFound` for a listed file that is missing, `ChecksumMismatch` on a differing digest.
    pub fn verify_checksums(&self) -> Result<(), CompileError> {
        for (relative, expected) in &self.manifest.checksums {
            let file = self.dir.join(relative);
            let bytes = fs::read(&file).map_err(|_| PackLoadError::FileNotFound(file.clone()))?;
            let actual = hex::encode(Sha256::digest(&bytes));
            if !actual.eq_ignore_ascii_case(expected.trim()) {
                return Err(PackLoadError::ChecksumMismatch {
                    file,
                    expected: expected.clone(),
                    actual,
                }
                .into());
            }
            debug!("checksum ok: {}", file.display());
        }
        Ok(())
    }

    /// Parse every content path named by the manifest.
    ///
    /// # Errors
    /// `FileNotFound` for missing paths, `ContentLoadFailed` for unreadable or malformed JSON,
    /// `DuplicateId` when two entries of one type share an id.
    pub fn read_content(&self) -> Result<SourceContent, CompileError> {
        let mut content = PackContent::new(self.manifest.clone());
        let mut reader = Reader {
            input_bytes: fs::metadata(self.dir.join(MANIFEST_FILE)).map_or(0, |m| m.len()),
            files: Vec::new(),
        };

        for (file, relative) in self.manifest.content_paths() {
            let path = self.dir.join(relative);
            match file {
                ContentFile::Regions => {
                    for (raw, from) in reader.entries::<RawRegion>(&path)? {
                        insert_unique(&mut content.regions, "region", raw.to_definition(), |d| &d.id, &from)?;
                    }
                },
                ContentFile::Events => {
                    for (raw, from) in reader.entries::<RawEvent>(&path)? {
                        insert_unique(&mut content.events, "event", raw.to_definition(), |d| &d.id, &from)?;
                    }
                },
                ContentFile::Quests => {
                    for (raw, from) in reader.entries::<RawQuest>(&path)? {
                        insert_unique(&mut content.quests, "quest", raw.to_definition(), |d| &d.id, &from)?;
                    }
                },
                ContentFile::Anchors => {
                    for (raw, from) in reader.entries::<RawAnchor>(&path)? {
                        insert_unique(&mut content.anchors, "anchor", raw.to_definition(), |d| &d.id, &from)?;
                    }
                },
                ContentFile::Heroes => {
                    for (hero, from) in reader.entries::<HeroDefinition>(&path)? {
                        insert_unique(&mut content.heroes, "hero", hero, |d| &d.id, &from)?;
                    }
                },
                ContentFile::Cards => {
                    for (card, from) in reader.entries::<CardDefinition>(&path)? {
                        insert_unique(&mut content.cards, "card", card, |d| &d.id, &from)?;
                    }
                },
                ContentFile::Enemies => {
                    for (enemy, from) in reader.entries::<EnemyDefinition>(&path)? {
                        insert_unique(&mut content.enemies, "enemy", enemy, |d| &d.id, &from)?;
                    }
                },
                ContentFile::FateDeck => {
                    for (fate_card, from) in reader.entries::<FateCard>(&path)? {
                        insert_unique(&mut content.fate_cards, "fate card", fate_card, |d| &d.id, &from)?;
                    }
                },
                ContentFile::Abilities => {
                    for (ability, from) in reader.entries::<AbilityDefinition>(&path)? {
                        insert_unique(&mut content.abilities, "ability", ability, |d| &d.id, &from)?;
                    }
                },
                ContentFile::Behaviors => {
                    for (behavior, from) in reader.entries::<BehaviorDefinition>(&path)? {
                        insert_unique(&mut content.behaviors, "behavior", behavior, |d| &d.id, &from)?;
                    }
                },
                ContentFile::Balance => {
                    content.balance_config = Some(reader.object::<BalanceConfiguration>(&path)?);
                },
            }
        }

        info!(
            "read pack source '{}' from {} ({} file(s), {} bytes)",
            content.id(),
            self.dir.display(),
            reader.files.len(),
            reader.input_bytes
        );
        Ok(SourceContent {
            content,
            input_bytes: reader.input_bytes,
            files: reader.files,
        })
    }
}

struct Reader {
    input_bytes: u64,
    files: Vec<PathBuf>,
}

impl Reader {
    /// Entries from a file or directory, each paired with the file it came from.
    fn entries<T: DeserializeOwned>(&mut self, path: &Path) -> Result<Vec<(T, PathBuf)>, CompileError> {
        let mut entries = Vec::new();
        for file in json_files(path)? {
            let parsed: Vec<T> = self.parse(&file)?;
            entries.extend(parsed.into_iter().map(|entry| (entry, file.clone())));
        }
        Ok(entries)
    }

    /// A single JSON object; directories are not accepted.
    fn object<T: DeserializeOwned>(&mut self, path: &Path) -> Result<T, CompileError> {
        if path.is_dir() {
            return Err(PackLoadError::ContentLoadFailed {
                file: path.to_path_buf(),
                reason: "expected a JSON file, found a directory".to_string(),
            }
            .into());
        }
        if !path.is_file() {
            return Err(PackLoadError::FileNotFound(path.to_path_buf()).into());
        }
        self.parse(path)
    }

    fn parse<T: DeserializeOwned>(&mut self, file: &Path) -> Result<T, CompileError> {
        let text = fs::read_to_string(file).map_err(|err| PackLoadError::ContentLoadFailed {
            file: file.to_path_buf(),
            reason: err.to_string(),
        })?;
        self.input_bytes += text.len() as u64;
        self.files.push(file.to_path_buf());
        let parsed = serde_json::from_str(&text).map_err(|err| PackLoadError::ContentLoadFailed {
            file: file.to_path_buf(),
            reason: err.to_string(),
        })?;
        debug!("parsed {}", file.display());
        Ok(parsed)
    }
}

/// The file itself, or the `*.json` files directly inside a directory, sorted by name.
fn json_files(path: &Path) -> Result<Vec<PathBuf>, CompileError> {
    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }
    if !path.is_dir() {
        return Err(PackLoadError::FileNotFound(path.to_path_buf()).into());
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(path).min_depth(1).max_depth(1).sort_by_file_name() {
        let entry = entry.map_err(|err| PackLoadError::ContentLoadFailed {
            file: path.to_path_buf(),
            reason: err.to_string(),
        })?;
        let is_json = entry.path().extension().and_then(|ext| ext.to_str()) == Some("json");
        if entry.file_type().is_file() && is_json {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

fn insert_unique<T>(
    map: &mut BTreeMap<Id, T>,
    kind: &'static str,
    definition: T,
    id_of: impl Fn(&T) -> &Id,
    file: &Path,
) -> Result<(), CompileError> {
    let id = id_of(&definition).clone();
    if map.contains_key(&id) {
        return Err(CompileError::DuplicateId {
            kind,
            id,
            file: file.to_path_buf(),
        });
    }
    map.insert(id, definition);
    Ok(())
}
