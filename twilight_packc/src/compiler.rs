//! Pack compiler: source directory in, checksummed `.pack` out.
//!
//! Pipeline: manifest, manifest checks, core compatibility, source checksums, content parsing,
//! expression and pack-local validation, container write. Broken references are only warnings
//! here because another pack loaded alongside this one may provide the target.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use log::{info, warn};
use semver::Version;

use twilight_data::{
    ContentCounts, ContentValidationError, ExpressionValidator, PackContent, PackLoadError, core_version, pack_file,
    validate_content,
};

use crate::error::CompileError;
use crate::source::PackSource;

/// Outcome of a successful compile.
#[derive(Debug, Clone)]
pub struct CompilationResult {
    pub pack_id: String,
    pub version: Version,
    pub output_path: PathBuf,
    pub counts: ContentCounts,
    pub input_bytes: u64,
    pub output_bytes: usize,
    pub elapsed: Duration,
    pub warnings: Vec<ContentValidationError>,
}

impl CompilationResult {
    /// Output size over input size; 0 for an empty input.
    #[allow(clippy::cast_precision_loss)]
    pub fn compression_ratio(&self) -> f64 {
        if self.input_bytes == 0 {
            0.0
        } else {
            self.output_bytes as f64 / self.input_bytes as f64
        }
    }
}

/// Outcome of a dry run. Parse failures are still returned as `Err`.
#[derive(Debug, Clone)]
pub struct ValidationResult {
    pub pack_id: String,
    pub counts: ContentCounts,
    pub errors: Vec<ContentValidationError>,
    pub warnings: Vec<ContentValidationError>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Compiles pack sources against a core version and expression whitelist.
#[derive(Debug, Clone)]
pub struct PackCompiler {
    core_version: Version,
    expressions: ExpressionValidator,
}

impl Default for PackCompiler {
    fn default() -> Self {
        Self::new()
    }
}

/// Parsed and checked source, ready to encode.
struct Checked {
    content: PackContent,
    input_bytes: u64,
    errors: Vec<ContentValidationError>,
    warnings: Vec<ContentValidationError>,
}

impl PackCompiler {
    pub fn new() -> Self {
        Self {
            core_version: core_version(),
            expressions: ExpressionValidator::default(),
        }
    }

    /// Check compatibility against another core version.
    #[must_use]
    pub fn with_core_version(mut self, version: Version) -> Self {
        self.core_version = version;
        self
    }

    #[must_use]
    pub fn with_expression_validator(mut self, expressions: ExpressionValidator) -> Self {
        self.expressions = expressions;
        self
    }

    /// Compile `source_dir` into `output`, creating parent directories as needed.
    ///
    /// # Errors
    /// Any manifest, source or container failure, or `ValidationFailed` when the content has
    /// validation errors. Nothing is written in those cases.
    pub fn compile(&self, source_dir: &Path, output: &Path) -> Result<CompilationResult, CompileError> {
        let started = Instant::now();
        let checked = self.check(source_dir)?;
        if !checked.errors.is_empty() {
            return Err(CompileError::ValidationFailed(checked.errors));
        }

        if let Some(parent) = output.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| CompileError::Output {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let output_bytes = pack_file::compile(&checked.content, output)?;

        let manifest = &checked.content.manifest;
        let result = CompilationResult {
            pack_id: manifest.id.clone(),
            version: manifest.version.clone(),
            output_path: output.to_path_buf(),
            counts: checked.content.counts(),
            input_bytes: checked.input_bytes,
            output_bytes,
            elapsed: started.elapsed(),
            warnings: checked.warnings,
        };
        info!(
            "compiled '{}' v{} to {} ({} -> {} bytes, {} definitions, {} warning(s))",
            result.pack_id,
            result.version,
            output.display(),
            result.input_bytes,
            result.output_bytes,
            result.counts.total(),
            result.warnings.len()
        );
        Ok(result)
    }

    /// Run every compile step except writing the container.
    ///
    /// # Errors
    /// Manifest and source failures. Content problems are reported in the result instead.
    pub fn validate(&self, source_dir: &Path) -> Result<ValidationResult, CompileError> {
        let checked = self.check(source_dir)?;
        Ok(ValidationResult {
            pack_id: checked.content.id().to_string(),
            counts: checked.content.counts(),
            errors: checked.errors,
            warnings: checked.warnings,
        })
    }

    fn check(&self, source_dir: &Path) -> Result<Checked, CompileError> {
        let source = PackSource::open(source_dir)?;
        let manifest = source.manifest();

        let issues = manifest.validate();
        if !issues.is_empty() {
            let reason = issues.iter().map(ToString::to_string).collect::<Vec<_>>().join("; ");
            return Err(PackLoadError::InvalidManifest {
                pack_id: manifest.id.clone(),
                reason,
            }
            .into());
        }
        if !manifest.is_compatible_with(&self.core_version) {
            return Err(PackLoadError::IncompatibleCoreVersion {
                pack_id: manifest.id.clone(),
                required: manifest.core_requirement(),
                current: self.core_version.clone(),
            }
            .into());
        }
        source.verify_checksums()?;

        let read = source.read_content()?;
        let (warnings, errors): (Vec<_>, Vec<_>) = validate_content(&read.content.content_set(), &self.expressions)
            .into_iter()
            .partition(is_pack_local_warning);
        for entry in &warnings {
            warn!("{}: {entry}", read.content.id());
        }
        Ok(Checked {
            content: read.content,
            input_bytes: read.input_bytes,
            errors,
            warnings,
        })
    }
}

/// Dangling references may be satisfied by another pack at load time.
fn is_pack_local_warning(entry: &ContentValidationError) -> bool {
    matches!(entry, ContentValidationError::BrokenReference { .. }) || !entry.is_error()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pack_dir(regions: &str, core_min: &str, extra_manifest: &str) -> tempfile::TempDir {
        let dir = tempfile::tempdir().expect("tempdir");
        let manifest = format!(
            r#"{{"id": "act-one", "name": "Act One", "version": "1.2.0", "core_version_min": "{core_min}",
                "regions_path": "regions.json"{extra_manifest}}}"#
        );
        fs::write(dir.path().join("manifest.json"), manifest).expect("manifest");
        fs::write(dir.path().join("regions.json"), regions).expect("regions");
        dir
    }

    #[test]
    fn dangling_neighbors_are_warnings() {
        let dir = pack_dir(r#"[{"id": "village", "title": "Village", "neighbors": ["forest"]}]"#, "1.0.0", "");
        let out = dir.path().join("out/act-one.pack");
        let result = PackCompiler::new().compile(dir.path(), &out).expect("compile");

        assert_eq!(result.pack_id, "act-one");
        assert_eq!(result.counts.regions, 1);
        assert_eq!(result.warnings.len(), 1);
        assert!(result.input_bytes > 0);
        assert_eq!(result.output_bytes as u64, fs::metadata(&out).expect("output").len());
        assert!(result.compression_ratio() > 0.0);
        assert!(pack_file::is_valid_pack_file(&out));
    }

    #[test]
    fn content_errors_fail_the_compile_and_write_nothing() {
        let dir = pack_dir(r#"[{"id": "village"}]"#, "1.0.0", "");
        let out = dir.path().join("act-one.pack");
        let err = PackCompiler::new().compile(dir.path(), &out).unwrap_err();
        match err {
            CompileError::ValidationFailed(errors) => assert!(matches!(
                errors[0],
                ContentValidationError::MissingRequiredField { field: "title", .. }
            )),
            other => panic!("unexpected error: {other}"),
        }
        assert!(!out.exists());

        let report = PackCompiler::new().validate(dir.path()).expect("validate");
        assert!(!report.is_valid());
        assert_eq!(report.pack_id, "act-one");
    }

    #[test]
    fn manifest_problems_stop_before_content() {
        let dir = pack_dir("not json", "9.0.0", "");
        assert!(matches!(
            PackCompiler::new().validate(dir.path()),
            Err(CompileError::Load(PackLoadError::IncompatibleCoreVersion { .. }))
        ));

        let newer = PackCompiler::new().with_core_version(Version::new(9, 1, 0));
        assert!(matches!(
            newer.validate(dir.path()),
            Err(CompileError::Load(PackLoadError::ContentLoadFailed { .. }))
        ));
    }

    #[test]
    fn invalid_manifest_is_rejected() {
        let dir = pack_dir("[]", "1.0.0", r#", "locales": []"#);
        assert!(matches!(
            PackCompiler::new().validate(dir.path()),
            Err(CompileError::Load(PackLoadError::InvalidManifest { .. }))
        ));
    }
}
