//! Drift detection for generated sources.
//!
//! Each generated `Foo.java` gets a sibling `Foo.java.manifest.json` holding
//! a blake3 hash of the file plus the [`GenerationMetadata`] it was produced
//! with. [`verify`] fails once the file no longer matches.

use crate::error::{JavaGenError, Result};
use crate::hir::GenerationMetadata;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Manifest stored next to a generated file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileManifest {
    /// Manifest format version
    pub manifest_version: u32,
    /// Generated file name, relative to the manifest
    pub output_path: String,
    /// Blake3 hash of the generated contents
    pub output_hash: String,
    /// How the file was produced
    pub generation: GenerationMetadata,
}

impl FileManifest {
    /// Current manifest format version.
    pub const VERSION: u32 = 1;

    /// Suffix appended to the generated file name.
    pub const SUFFIX: &'static str = ".manifest.json";

    /// Manifest describing `contents` written at `generated_path`.
    #[must_use]
    pub fn describe(generated_path: &Path, contents: &str, generation: GenerationMetadata) -> Self {
        Self {
            manifest_version: Self::VERSION,
            output_path: generated_path
                .file_name()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default(),
            output_hash: hash_contents(contents),
            generation,
        }
    }

    /// `Foo.java` -> `Foo.java.manifest.json`
    #[must_use]
    pub fn path_for(generated_path: &Path) -> PathBuf {
        let mut name = generated_path
            .file_name()
            .map(|s| s.to_os_string())
            .unwrap_or_default();
        name.push(Self::SUFFIX);
        generated_path.with_file_name(name)
    }

    /// Load a manifest file.
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }

    /// Store this manifest as pretty JSON.
    pub fn store(&self, path: &Path) -> Result<()> {
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}

/// Blake3 hex digest of `contents`.
#[must_use]
pub fn hash_contents(contents: &str) -> String {
    blake3::hash(contents.as_bytes()).to_hex().to_string()
}

/// Check a generated file against its manifest and return the manifest.
///
/// # Errors
///
/// [`JavaGenError::ManifestError`] when the manifest is missing, unreadable
/// or has an unknown version; [`JavaGenError::HashMismatch`] when the file
/// was edited after generation.
pub fn verify(generated_path: &Path) -> Result<FileManifest> {
    let manifest_path = FileManifest::path_for(generated_path);
    let manifest =
        FileManifest::load(&manifest_path).map_err(|err| JavaGenError::ManifestError {
            path: generated_path.display().to_string(),
            reason: format!("cannot load {}: {err}", manifest_path.display()),
        })?;
    if manifest.manifest_version != FileManifest::VERSION {
        return Err(JavaGenError::ManifestError {
            path: generated_path.display().to_string(),
            reason: format!(
                "unsupported manifest version {} (expected {})",
                manifest.manifest_version,
                FileManifest::VERSION
            ),
        });
    }

    let actual = hash_contents(&std::fs::read_to_string(generated_path)?);
    if actual != manifest.output_hash {
        return Err(JavaGenError::HashMismatch {
            path: generated_path.display().to_string(),
            expected: manifest.output_hash,
            actual,
        });
    }
    Ok(manifest)
}

/// Write `contents` to `path` (creating parent directories) plus its manifest.
pub fn write_with_manifest(
    path: &Path,
    contents: &str,
    generation: GenerationMetadata,
) -> Result<FileManifest> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, contents)?;
    let manifest = FileManifest::describe(path, contents, generation);
    manifest.store(&FileManifest::path_for(path))?;
    Ok(manifest)
}
