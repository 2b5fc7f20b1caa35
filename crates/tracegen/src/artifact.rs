//! Versioned JSON artifacts exchanged between instrumentation, analysis and
//! generation.
//!
//! Every artifact is wrapped in an envelope carrying its kind, the format
//! version and a SHA-256 checksum of the payload, so a stale or hand-edited
//! file is rejected instead of silently misread.

use crate::result::{TracegenError, TracegenResult};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};

/// Version of the artifact envelope and payload formats
pub const ARTIFACT_FORMAT_VERSION: u32 = 1;

/// What an artifact file holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ArtifactKind {
    /// [`crate::IdentifierMapping`]
    IdentifierMapping,
    /// [`crate::Trace`]
    Trace,
    /// [`InstrumentationResult`]
    InstrumentationResult,
    /// [`AnalysisResult`]
    AnalysisResult,
    /// [`crate::TestSuite`]
    TestSuite,
}

impl ArtifactKind {
    /// Kebab-case name, as written in the envelope.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::IdentifierMapping => "identifier-mapping",
            Self::Trace => "trace",
            Self::InstrumentationResult => "instrumentation-result",
            Self::AnalysisResult => "analysis-result",
            Self::TestSuite => "test-suite",
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Envelope {
    kind: ArtifactKind,
    version: u32,
    checksum: String,
    payload: serde_json::Value,
}

fn checksum(payload: &serde_json::Value) -> TracegenResult<String> {
    let bytes = serde_json::to_vec(payload)?;
    let digest = Sha256::digest(&bytes);
    Ok(format!("{digest:x}"))
}

/// Write `payload` to `path` as a `kind` artifact, creating parent
/// directories.
pub fn write_artifact<T: Serialize>(
    path: &Path,
    kind: ArtifactKind,
    payload: &T,
) -> TracegenResult<()> {
    let payload = serde_json::to_value(payload)?;
    let envelope = Envelope {
        kind,
        version: ARTIFACT_FORMAT_VERSION,
        checksum: checksum(&payload)?,
        payload,
    };
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(path, serde_json::to_string_pretty(&envelope)?)?;
    tracing::debug!(path = %path.display(), kind = kind.as_str(), "wrote artifact");
    Ok(())
}

fn read_envelope(path: &Path) -> TracegenResult<Envelope> {
    let text = fs::read_to_string(path)?;
    serde_json::from_str(&text)
        .map_err(|e| TracegenError::artifact_format(path, format!("not an artifact: {e}")))
}

/// Kind recorded in an artifact's envelope; the payload is not checked.
pub fn peek_kind(path: &Path) -> TracegenResult<ArtifactKind> {
    Ok(read_envelope(path)?.kind)
}

/// Read a `kind` artifact, checking kind, version and checksum.
pub fn read_artifact<T: DeserializeOwned>(path: &Path, kind: ArtifactKind) -> TracegenResult<T> {
    let envelope = read_envelope(path)?;
    if envelope.kind != kind {
        return Err(TracegenError::artifact_format(
            path,
            format!(
                "expected {} artifact, found {}",
                kind.as_str(),
                envelope.kind.as_str()
            ),
        ));
    }
    if envelope.version != ARTIFACT_FORMAT_VERSION {
        return Err(TracegenError::artifact_format(
            path,
            format!(
                "unsupported version {} (expected {ARTIFACT_FORMAT_VERSION})",
                envelope.version
            ),
        ));
    }
    let actual = checksum(&envelope.payload)?;
    if actual != envelope.checksum {
        return Err(TracegenError::artifact_format(
            path,
            format!("checksum mismatch: recorded {}, computed {actual}", envelope.checksum),
        ));
    }
    serde_json::from_value(envelope.payload)
        .map_err(|e| TracegenError::artifact_format(path, format!("malformed payload: {e}")))
}

/// What the external instrumentor hands to analysis.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstrumentationResult {
    /// Instrumented program to run; required for analysis
    pub primary_artifact: Option<PathBuf>,
    /// Supporting files (agent jars, collector runtime)
    #[serde(default)]
    pub additional_artifacts: Vec<PathBuf>,
    /// Identifier mapping; required when any identifier was requested
    pub identifiers_mapping_path: Option<PathBuf>,
    /// Results list naming the per-invocation capture records
    pub results_list_path: Option<PathBuf>,
}

impl InstrumentationResult {
    /// Result for `primary` with no other paths set.
    #[must_use]
    pub fn new(primary: impl Into<PathBuf>) -> Self {
        Self {
            primary_artifact: Some(primary.into()),
            ..Self::default()
        }
    }

    /// Set the identifier mapping path.
    #[must_use]
    pub fn with_identifiers_mapping(mut self, path: impl Into<PathBuf>) -> Self {
        self.identifiers_mapping_path = Some(path.into());
        self
    }

    /// Set the results list path.
    #[must_use]
    pub fn with_results_list(mut self, path: impl Into<PathBuf>) -> Self {
        self.results_list_path = Some(path.into());
        self
    }

    /// Add a supporting artifact.
    #[must_use]
    pub fn with_additional_artifact(mut self, path: impl Into<PathBuf>) -> Self {
        self.additional_artifacts.push(path.into());
        self
    }

    /// Persist as an artifact.
    pub fn save(&self, path: &Path) -> TracegenResult<()> {
        write_artifact(path, ArtifactKind::InstrumentationResult, self)
    }

    /// Load a persisted result.
    pub fn load(path: &Path) -> TracegenResult<Self> {
        read_artifact(path, ArtifactKind::InstrumentationResult)
    }
}

/// Where analysis left its output. Paths, not objects, so generation can
/// run later or elsewhere.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Serialized trace
    pub trace_path: PathBuf,
    /// Serialized identifier mapping
    pub identifiers_mapping_path: PathBuf,
    /// Analysis output directory
    pub output_directory: PathBuf,
    /// Unique id of this analysis run
    pub run_id: String,
}

impl AnalysisResult {
    /// File name of the analysis result inside the output directory
    pub const FILE_NAME: &'static str = "analysis.json";

    /// Persist as an artifact.
    pub fn save(&self, path: &Path) -> TracegenResult<()> {
        write_artifact(path, ArtifactKind::AnalysisResult, self)
    }

    /// Load a persisted result.
    pub fn load(path: &Path) -> TracegenResult<Self> {
        read_artifact(path, ArtifactKind::AnalysisResult)
    }
}
