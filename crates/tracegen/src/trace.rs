//! Structured, typed record of the captured invocations.

use crate::artifact::{read_artifact, write_artifact, ArtifactKind};
use crate::identifier::InternalId;
use crate::method::MethodIdentifier;
use crate::value::CapturedValue;
use crate::TracegenResult;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

/// One runtime execution of the target method.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invocation {
    /// Sequence index
    pub index: u64,
    /// Receiver identity token
    #[serde(default)]
    pub identity: Option<u64>,
    /// Values read at entry
    #[serde(default)]
    pub entry: BTreeMap<InternalId, CapturedValue>,
    /// Values read at exit; empty when the call did not return normally
    #[serde(default)]
    pub exit: BTreeMap<InternalId, CapturedValue>,
    /// Exception class reported by the collector
    #[serde(default)]
    pub exception: Option<String>,
}

impl Invocation {
    /// Invocation with no bindings.
    #[must_use]
    pub fn new(index: u64) -> Self {
        Self {
            index,
            identity: None,
            entry: BTreeMap::new(),
            exit: BTreeMap::new(),
            exception: None,
        }
    }

    /// Set the identity token.
    #[must_use]
    pub const fn with_identity(mut self, identity: u64) -> Self {
        self.identity = Some(identity);
        self
    }

    /// Bind a value at entry.
    #[must_use]
    pub fn bind_entry(mut self, id: InternalId, value: CapturedValue) -> Self {
        self.entry.insert(id, value);
        self
    }

    /// Bind a value at exit.
    #[must_use]
    pub fn bind_exit(mut self, id: InternalId, value: CapturedValue) -> Self {
        self.exit.insert(id, value);
        self
    }

    /// Record a thrown exception.
    #[must_use]
    pub fn threw(mut self, exception: impl Into<String>) -> Self {
        self.exception = Some(exception.into());
        self
    }
}

/// Captured invocations of one target method, in invocation order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trace {
    target: MethodIdentifier,
    invocations: Vec<Invocation>,
    #[serde(default)]
    metadata: BTreeMap<String, String>,
}

impl Trace {
    /// Empty trace for `target`.
    #[must_use]
    pub fn new(target: MethodIdentifier) -> Self {
        Self {
            target,
            invocations: Vec::new(),
            metadata: BTreeMap::new(),
        }
    }

    /// Trace with the given invocations.
    ///
    /// Callers pass invocations in index order; the analyzer enforces it for
    /// captured data.
    #[must_use]
    pub fn with_invocations(target: MethodIdentifier, invocations: Vec<Invocation>) -> Self {
        Self {
            target,
            invocations,
            metadata: BTreeMap::new(),
        }
    }

    /// Append an invocation.
    pub fn push(&mut self, invocation: Invocation) {
        self.invocations.push(invocation);
    }

    /// Set a metadata entry.
    pub fn set_metadata(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.metadata.insert(key.into(), value.into());
    }

    /// Method the trace was captured from.
    #[must_use]
    pub const fn target(&self) -> &MethodIdentifier {
        &self.target
    }

    /// Invocations in order.
    #[must_use]
    pub fn invocations(&self) -> &[Invocation] {
        &self.invocations
    }

    /// Metadata entries.
    #[must_use]
    pub const fn metadata(&self) -> &BTreeMap<String, String> {
        &self.metadata
    }

    /// Number of invocations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.invocations.len()
    }

    /// No invocations captured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.invocations.is_empty()
    }

    /// Counts for logs and `inspect`.
    #[must_use]
    pub fn summary(&self) -> TraceSummary {
        let identities: BTreeSet<u64> =
            self.invocations.iter().filter_map(|i| i.identity).collect();
        TraceSummary {
            target: self.target.signature(),
            invocations: self.invocations.len(),
            identities: identities.len(),
            first_index: self.invocations.first().map(|i| i.index),
            last_index: self.invocations.last().map(|i| i.index),
            entry_values: self.invocations.iter().map(|i| i.entry.len()).sum(),
            exit_values: self.invocations.iter().map(|i| i.exit.len()).sum(),
            exceptions: self
                .invocations
                .iter()
                .filter(|i| i.exception.is_some())
                .count(),
        }
    }

    /// Persist as an artifact.
    pub fn save(&self, path: &Path) -> TracegenResult<()> {
        write_artifact(path, ArtifactKind::Trace, self)
    }

    /// Load a persisted trace.
    pub fn load(path: &Path) -> TracegenResult<Self> {
        read_artifact(path, ArtifactKind::Trace)
    }
}

/// Aggregate counts over a [`Trace`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TraceSummary {
    /// Target signature
    pub target: String,
    /// Invocation count
    pub invocations: usize,
    /// Distinct identity tokens
    pub identities: usize,
    /// Lowest invocation index
    pub first_index: Option<u64>,
    /// Highest invocation index
    pub last_index: Option<u64>,
    /// Entry-phase values
    pub entry_values: usize,
    /// Exit-phase values
    pub exit_values: usize,
    /// Invocations with a recorded exception
    pub exceptions: usize,
}

impl std::fmt::Display for TraceSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Trace of {}", self.target)?;
        writeln!(f, "  invocations: {}", self.invocations)?;
        writeln!(f, "  identities:  {}", self.identities)?;
        match (self.first_index, self.last_index) {
            (Some(first), Some(last)) => writeln!(f, "  index range: {first}..={last}")?,
            _ => writeln!(f, "  index range: -")?,
        }
        writeln!(f, "  entry values: {}", self.entry_values)?;
        writeln!(f, "  exit values:  {}", self.exit_values)?;
        write!(f, "  exceptions:   {}", self.exceptions)
    }
}
