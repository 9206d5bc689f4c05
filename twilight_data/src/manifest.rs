//! Pack manifests: identity, compatibility window, dependencies and content file paths.
//!
//! The manifest is authored as `manifest.json` at the root of a pack source directory and is
//! carried verbatim inside every compiled `.pack` file.

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::fs;
use std::path::Path;
use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use log::debug;
use regex::Regex;
use semver::Version;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::defs::{Id, LocalizedString, normalize_key};
use crate::error::PackLoadError;

/// Version of the content core this build implements.
pub const CORE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// File name of the manifest inside a pack source directory.
pub const MANIFEST_FILE: &str = "manifest.json";

static PACK_ID_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("^[a-z0-9][a-z0-9-]*[a-z0-9]$").expect("pack id pattern compiles"));

/// Parsed [`CORE_VERSION`].
pub fn core_version() -> Version {
    parse_lenient_version(CORE_VERSION).unwrap_or_else(|_| Version::new(0, 0, 0))
}

/// What a pack mainly provides. Decides load order when several packs load together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", from = "String")]
pub enum PackType {
    #[default]
    Campaign,
    Character,
    Balance,
    Rules,
    Full,
}

impl From<String> for PackType {
    fn from(key: String) -> Self {
        PackType::from_key(&key)
    }
}

impl PackType {
    /// Case-insensitive lookup; unknown keys degrade to `Campaign`.
    pub fn from_key(key: &str) -> Self {
        match normalize_key(key).as_str() {
            "character" => PackType::Character,
            "balance" => PackType::Balance,
            "rules" => PackType::Rules,
            "full" => PackType::Full,
            _ => PackType::Campaign,
        }
    }

    /// Lower loads first: rule and balance packs, then hero/card providers, then story content.
    pub fn load_priority(self) -> u8 {
        match self {
            PackType::Balance | PackType::Rules => 0,
            PackType::Character => 1,
            PackType::Full => 2,
            PackType::Campaign => 3,
        }
    }
}

/// Reference to another pack that must (or may) be loaded first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackDependency {
    pub pack_id: String,
    #[serde(with = "lenient_version")]
    pub min_version: Version,
    #[serde(default, with = "lenient_version_opt", skip_serializing_if = "Option::is_none")]
    pub max_version: Option<Version>,
    #[serde(default)]
    pub is_optional: bool,
}

impl PackDependency {
    pub fn new(pack_id: impl Into<String>, min_version: Version) -> Self {
        Self {
            pack_id: pack_id.into(),
            min_version,
            max_version: None,
            is_optional: false,
        }
    }

    pub fn accepts(&self, version: &Version) -> bool {
        *version >= self.min_version && self.max_version.as_ref().is_none_or(|max| version <= max)
    }

    /// Human-readable version requirement, e.g. `>=2.0.0, <=2.9.0`.
    pub fn requirement(&self) -> String {
        match &self.max_version {
            Some(max) => format!(">={}, <={}", self.min_version, max),
            None => format!(">={}", self.min_version),
        }
    }
}

/// Content file kinds a manifest can point at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentFile {
    Regions,
    Events,
    Quests,
    Anchors,
    Heroes,
    Cards,
    Enemies,
    FateDeck,
    Balance,
    Behaviors,
    Abilities,
}

impl ContentFile {
    pub const ALL: [ContentFile; 11] = [
        ContentFile::Regions,
        ContentFile::Events,
        ContentFile::Quests,
        ContentFile::Anchors,
        ContentFile::Heroes,
        ContentFile::Cards,
        ContentFile::Enemies,
        ContentFile::FateDeck,
        ContentFile::Balance,
        ContentFile::Behaviors,
        ContentFile::Abilities,
    ];

    pub fn key(self) -> &'static str {
        match self {
            ContentFile::Regions => "regions",
            ContentFile::Events => "events",
            ContentFile::Quests => "quests",
            ContentFile::Anchors => "anchors",
            ContentFile::Heroes => "heroes",
            ContentFile::Cards => "cards",
            ContentFile::Enemies => "enemies",
            ContentFile::FateDeck => "fate_deck",
            ContentFile::Balance => "balance",
            ContentFile::Behaviors => "behaviors",
            ContentFile::Abilities => "abilities",
        }
    }
}

impl fmt::Display for ContentFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Pack metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackManifest {
    pub id: String,
    pub name: LocalizedString,
    #[serde(default)]
    pub description: LocalizedString,
    #[serde(with = "lenient_version")]
    pub version: Version,
    #[serde(rename = "type", alias = "pack_type", default)]
    pub pack_type: PackType,
    #[serde(with = "lenient_version")]
    pub core_version_min: Version,
    #[serde(default, with = "lenient_version_opt", skip_serializing_if = "Option::is_none")]
    pub core_version_max: Option<Version>,
    #[serde(default)]
    pub dependencies: Vec<PackDependency>,
    #[serde(default)]
    pub required_capabilities: Vec<String>,

    #[serde(default)]
    pub entry_region: Option<Id>,
    #[serde(default)]
    pub entry_quest: Option<Id>,
    #[serde(default)]
    pub recommended_heroes: Vec<Id>,
    #[serde(default)]
    pub hero_ids: Vec<Id>,
    #[serde(default = "default_min_heroes")]
    pub min_heroes_required: u32,
    #[serde(default)]
    pub max_heroes_supported: Option<u32>,
    #[serde(default)]
    pub difficulty_rating: Option<u8>,
    #[serde(default)]
    pub estimated_playtime_minutes: Option<u32>,
    #[serde(default)]
    pub mission_type: Option<String>,

    #[serde(default)]
    pub season: Option<String>,
    #[serde(default)]
    pub campaign_id: Option<String>,
    #[serde(default)]
    pub campaign_order: Option<u32>,
    #[serde(default)]
    pub bundle_id: Option<String>,
    #[serde(default)]
    pub requires_packs: Vec<String>,
    #[serde(default)]
    pub season_name: Option<LocalizedString>,
    #[serde(default)]
    pub campaign_name: Option<LocalizedString>,

    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub license: Option<String>,
    #[serde(default, with = "release_date", skip_serializing_if = "Option::is_none")]
    pub release_date: Option<DateTime<Utc>>,
    #[serde(default = "default_locales")]
    pub locales: Vec<String>,
    /// Relative source file path to expected SHA-256 hex digest.
    #[serde(default)]
    pub checksums: BTreeMap<String, String>,

    #[serde(default)]
    pub regions_path: Option<String>,
    #[serde(default)]
    pub events_path: Option<String>,
    #[serde(default)]
    pub quests_path: Option<String>,
    #[serde(default)]
    pub anchors_path: Option<String>,
    #[serde(default)]
    pub heroes_path: Option<String>,
    #[serde(default)]
    pub cards_path: Option<String>,
    #[serde(default)]
    pub enemies_path: Option<String>,
    #[serde(default)]
    pub fate_deck_path: Option<String>,
    #[serde(default)]
    pub balance_path: Option<String>,
    #[serde(default)]
    pub behaviors_path: Option<String>,
    #[serde(default)]
    pub abilities_path: Option<String>,
}

fn default_min_heroes() -> u32 {
    1
}

fn default_locales() -> Vec<String> {
    vec![crate::defs::DEFAULT_LOCALE.to_string()]
}

/// Problems found by [`PackManifest::validate`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ManifestIssue {
    #[error("pack id '{0}' must match ^[a-z0-9][a-z0-9-]*[a-z0-9]$")]
    InvalidPackId(String),
    #[error("pack name is empty")]
    EmptyName,
    #[error("pack declares no supported locales")]
    NoLocales,
    #[error("core_version_min {min} is above core_version_max {max}")]
    InvertedCoreRange { min: Version, max: Version },
    #[error("pack depends on itself")]
    SelfDependency,
    #[error("dependency '{0}' is declared more than once")]
    DuplicateDependency(String),
    #[error("dependency '{pack_id}' has min_version above max_version")]
    InvertedDependencyRange { pack_id: String },
    #[error("min_heroes_required {min} exceeds max_heroes_supported {max}")]
    InvertedHeroRange { min: u32, max: u32 },
    #[error("difficulty_rating {0} is outside 1..=5")]
    DifficultyOutOfRange(u8),
}

impl PackManifest {
    /// Minimal manifest, mostly for tests and code-defined packs.
    pub fn new(id: impl Into<String>, name: impl Into<String>, version: Version) -> Self {
        Self {
            id: id.into(),
            name: LocalizedString::new(name),
            description: LocalizedString::default(),
            version,
            pack_type: PackType::default(),
            core_version_min: Version::new(1, 0, 0),
            core_version_max: None,
            dependencies: Vec::new(),
            required_capabilities: Vec::new(),
            entry_region: None,
            entry_quest: None,
            recommended_heroes: Vec::new(),
            hero_ids: Vec::new(),
            min_heroes_required: default_min_heroes(),
            max_heroes_supported: None,
            difficulty_rating: None,
            estimated_playtime_minutes: None,
            mission_type: None,
            season: None,
            campaign_id: None,
            campaign_order: None,
            bundle_id: None,
            requires_packs: Vec::new(),
            season_name: None,
            campaign_name: None,
            author: String::new(),
            license: None,
            release_date: None,
            locales: default_locales(),
            checksums: BTreeMap::new(),
            regions_path: None,
            events_path: None,
            quests_path: None,
            anchors_path: None,
            heroes_path: None,
            cards_path: None,
            enemies_path: None,
            fate_deck_path: None,
            balance_path: None,
            behaviors_path: None,
            abilities_path: None,
        }
    }

    /// Read `manifest.json` from a pack source directory.
    ///
    /// # Errors
    /// - `ManifestNotFound` if the file is missing.
    /// - `InvalidManifest` if it cannot be read or decoded.
    pub fn load(dir: &Path) -> Result<Self, PackLoadError> {
        let path = dir.join(MANIFEST_FILE);
        if !path.is_file() {
            return Err(PackLoadError::ManifestNotFound(path));
        }
        let text = fs::read_to_string(&path).map_err(|err| PackLoadError::InvalidManifest {
            pack_id: dir.display().to_string(),
            reason: format!("reading {}: {err}", path.display()),
        })?;
        let manifest: PackManifest = serde_json::from_str(&text).map_err(|err| PackLoadError::InvalidManifest {
            pack_id: dir.display().to_string(),
            reason: err.to_string(),
        })?;
        debug!("loaded manifest for pack '{}' v{}", manifest.id, manifest.version);
        Ok(manifest)
    }

    /// Write the manifest as pretty JSON to `dir/manifest.json`.
    ///
    /// # Errors
    /// Returns `ContentLoadFailed` if encoding or writing fails.
    pub fn save(&self, dir: &Path) -> Result<(), PackLoadError> {
        let path = dir.join(MANIFEST_FILE);
        let text = serde_json::to_string_pretty(self).map_err(|err| PackLoadError::ContentLoadFailed {
            file: path.clone(),
            reason: err.to_string(),
        })?;
        fs::write(&path, text).map_err(|err| PackLoadError::ContentLoadFailed {
            file: path,
            reason: err.to_string(),
        })
    }

    /// Every structural problem with the manifest, in one pass.
    pub fn validate(&self) -> Vec<ManifestIssue> {
        let mut issues = Vec::new();

        if !PACK_ID_PATTERN.is_match(&self.id) {
            issues.push(ManifestIssue::InvalidPackId(self.id.clone()));
        }
        if self.name.is_blank() {
            issues.push(ManifestIssue::EmptyName);
        }
        if self.locales.iter().all(|locale| locale.trim().is_empty()) {
            issues.push(ManifestIssue::NoLocales);
        }
        if let Some(max) = &self.core_version_max
            && *max < self.core_version_min
        {
            issues.push(ManifestIssue::InvertedCoreRange {
                min: self.core_version_min.clone(),
                max: max.clone(),
            });
        }

        let mut seen = HashSet::new();
        for dependency in &self.dependencies {
            if dependency.pack_id == self.id {
                issues.push(ManifestIssue::SelfDependency);
            }
            if !seen.insert(dependency.pack_id.as_str()) {
                issues.push(ManifestIssue::DuplicateDependency(dependency.pack_id.clone()));
            }
            if let Some(max) = &dependency.max_version
                && *max < dependency.min_version
            {
                issues.push(ManifestIssue::InvertedDependencyRange {
                    pack_id: dependency.pack_id.clone(),
                });
            }
        }

        if let Some(max) = self.max_heroes_supported
            && self.min_heroes_required > max
        {
            issues.push(ManifestIssue::InvertedHeroRange {
                min: self.min_heroes_required,
                max,
            });
        }
        if let Some(rating) = self.difficulty_rating
            && !(1..=5).contains(&rating)
        {
            issues.push(ManifestIssue::DifficultyOutOfRange(rating));
        }

        issues
    }

    /// Compatibility against the running [`CORE_VERSION`].
    pub fn is_compatible_with_core(&self) -> bool {
        self.is_compatible_with(&core_version())
    }

    /// `current >= core_version_min` and, when present, `current <= core_version_max`.
    pub fn is_compatible_with(&self, current: &Version) -> bool {
        *current >= self.core_version_min && self.core_version_max.as_ref().is_none_or(|max| current <= max)
    }

    /// Human-readable core version requirement.
    pub fn core_requirement(&self) -> String {
        match &self.core_version_max {
            Some(max) => format!(">={}, <={}", self.core_version_min, max),
            None => format!(">={}", self.core_version_min),
        }
    }

    pub fn content_path(&self, file: ContentFile) -> Option<&str> {
        let path = match file {
            ContentFile::Regions => &self.regions_path,
            ContentFile::Events => &self.events_path,
            ContentFile::Quests => &self.quests_path,
            ContentFile::Anchors => &self.anchors_path,
            ContentFile::Heroes => &self.heroes_path,
            ContentFile::Cards => &self.cards_path,
            ContentFile::Enemies => &self.enemies_path,
            ContentFile::FateDeck => &self.fate_deck_path,
            ContentFile::Balance => &self.balance_path,
            ContentFile::Behaviors => &self.behaviors_path,
            ContentFile::Abilities => &self.abilities_path,
        };
        path.as_deref()
    }

    /// Declared content paths in [`ContentFile::ALL`] order.
    pub fn content_paths(&self) -> Vec<(ContentFile, &str)> {
        ContentFile::ALL
            .into_iter()
            .filter_map(|file| self.content_path(file).map(|path| (file, path)))
            .collect()
    }
}

/// Parse a version, padding short forms like `"2"` or `"2.1"` to three components.
///
/// # Errors
/// Returns the semver error when the padded text is still not a version.
pub fn parse_lenient_version(text: &str) -> Result<Version, semver::Error> {
    let trimmed = text.trim().trim_start_matches('v');
    match Version::parse(trimmed) {
        Ok(version) => Ok(version),
        Err(err) => {
            let core = trimmed.split(['-', '+']).next().unwrap_or(trimmed);
            let parts = core.split('.').count();
            if parts >= 3 {
                return Err(err);
            }
            let padding = ".0".repeat(3 - parts);
            let padded = format!("{core}{padding}{}", &trimmed[core.len()..]);
            Version::parse(&padded)
        },
    }
}

mod lenient_version {
    use semver::Version;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(version: &Version, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(version)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Version, D::Error> {
        let text = String::deserialize(deserializer)?;
        super::parse_lenient_version(&text).map_err(serde::de::Error::custom)
    }
}

mod lenient_version_opt {
    use semver::Version;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(version: &Option<Version>, serializer: S) -> Result<S::Ok, S::Error> {
        match version {
            Some(version) => serializer.collect_str(version),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Version>, D::Error> {
        Option::<String>::deserialize(deserializer)?
            .map(|text| super::parse_lenient_version(&text).map_err(serde::de::Error::custom))
            .transpose()
    }
}

/// Release dates accept ISO-8601 timestamps first, then plain `yyyy-MM-dd` dates.
mod release_date {
    use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(date: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error> {
        match date {
            Some(date) => serializer.serialize_str(&date.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error> {
        let Some(text) = Option::<String>::deserialize(deserializer)? else {
            return Ok(None);
        };
        parse(&text).map(Some).ok_or_else(|| {
            serde::de::Error::custom(format!("release_date '{text}' is neither ISO-8601 nor yyyy-MM-dd"))
        })
    }

    pub(super) fn parse(text: &str) -> Option<DateTime<Utc>> {
        if let Ok(date) = DateTime::parse_from_rfc3339(text) {
            return Some(date.with_timezone(&Utc));
        }
        NaiveDate::parse_from_str(text, "%Y-%m-%d")
            .ok()
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .map(|naive| naive.and_utc())
    }
}
