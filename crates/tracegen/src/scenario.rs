//! Synthesized test cases and the suites that carry them.

use crate::artifact::{read_artifact, write_artifact, ArtifactKind};
use crate::config::{EqualityStrategy, NamingStrategy, TestFramework};
use crate::generator::GenerationStrategy;
use crate::identifier::ValueIdentifier;
use crate::method::MethodIdentifier;
use crate::value::CapturedValue;
use crate::TracegenResult;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Category asserted when the collector did not report an exception class.
pub const UNKNOWN_EXCEPTION_CATEGORY: &str = "error";

/// A captured value together with the identifier it was captured for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueBinding {
    /// Identifier
    pub identifier: ValueIdentifier,
    /// Value
    pub value: CapturedValue,
}

impl ValueBinding {
    /// Bind `value` to `identifier`.
    #[must_use]
    pub const fn new(identifier: ValueIdentifier, value: CapturedValue) -> Self {
        Self { identifier, value }
    }
}

/// Expected outcome classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResultKind {
    /// Returned a value
    Normal,
    /// Returned nothing
    Void,
    /// Did not return normally
    Exception,
}

impl ResultKind {
    /// Lowercase label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Void => "void",
            Self::Exception => "exception",
        }
    }
}

/// Expected outcome of a scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum Outcome {
    /// The call returned the bound value
    Returned {
        /// Return value binding
        binding: ValueBinding,
    },
    /// The call completed without a value to assert
    Void,
    /// The call threw
    Threw {
        /// Exception class, when the collector reported one
        exception: Option<String>,
    },
}

impl Outcome {
    /// Classification.
    #[must_use]
    pub const fn kind(&self) -> ResultKind {
        match self {
            Self::Returned { .. } => ResultKind::Normal,
            Self::Void => ResultKind::Void,
            Self::Threw { .. } => ResultKind::Exception,
        }
    }

    /// Expected return value.
    #[must_use]
    pub const fn expected(&self) -> Option<&CapturedValue> {
        match self {
            Self::Returned { binding } => Some(&binding.value),
            _ => None,
        }
    }

    /// Exception class, or [`UNKNOWN_EXCEPTION_CATEGORY`] when none was
    /// captured. `None` for calls that did not throw.
    #[must_use]
    pub fn exception_category(&self) -> Option<&str> {
        match self {
            Self::Threw { exception } => {
                Some(exception.as_deref().unwrap_or(UNKNOWN_EXCEPTION_CATEGORY))
            }
            _ => None,
        }
    }
}

/// Change of one field between consecutive scenarios of the same receiver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "change", rename_all = "snake_case")]
pub enum FieldDelta {
    /// Field not observed before
    Added {
        /// New binding
        field: ValueBinding,
    },
    /// Field no longer observed
    Removed {
        /// Last binding
        field: ValueBinding,
    },
    /// Field value differs
    Changed {
        /// New binding
        field: ValueBinding,
        /// Previous value
        previous: CapturedValue,
    },
}

impl FieldDelta {
    /// Binding the delta is about (the new one for additions and changes).
    #[must_use]
    pub const fn binding(&self) -> &ValueBinding {
        match self {
            Self::Added { field } | Self::Removed { field } | Self::Changed { field, .. } => field,
        }
    }
}

/// One synthesized test case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestScenario {
    /// Method under test
    pub target: MethodIdentifier,
    /// Argument values, ordered by slot
    pub arguments: Vec<ValueBinding>,
    /// Field values arranged before the call
    pub fields: Vec<ValueBinding>,
    /// Expected outcome
    pub outcome: Outcome,
    /// Invocation the scenario was derived from
    pub provenance: u64,
    /// Receiver identity of that invocation
    #[serde(default)]
    pub identity: Option<u64>,
    /// Field changes since the previous scenario of the same receiver
    #[serde(default)]
    pub state_delta: Vec<FieldDelta>,
    /// Field values observed at exit
    #[serde(default)]
    pub post_state: Vec<ValueBinding>,
}

impl TestScenario {
    /// Outcome classification.
    #[must_use]
    pub const fn result_kind(&self) -> ResultKind {
        self.outcome.kind()
    }

    /// Any argument or arranged field holds an edge value.
    #[must_use]
    pub fn has_edge_inputs(&self) -> bool {
        self.arguments
            .iter()
            .chain(&self.fields)
            .any(|b| b.value.is_edge_value())
    }
}

/// Why a scenario was dropped, merged or rendered approximately.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WarningKind {
    /// A configured limit dropped invocations or scenarios
    LimitReached,
    /// Negative tests disabled; exception scenarios dropped
    NegativeTestsFiltered,
    /// Edge cases disabled; scenarios with edge inputs dropped
    EdgeCasesFiltered,
    /// The same inputs were observed with different outcomes
    ConflictingOutcomes,
    /// A value could not be rendered exactly
    UnrenderableValue,
    /// The equality strategy could not express a comparison
    UnsupportedEquality,
}

impl WarningKind {
    /// Label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::LimitReached => "limit-reached",
            Self::NegativeTestsFiltered => "negative-tests-filtered",
            Self::EdgeCasesFiltered => "edge-cases-filtered",
            Self::ConflictingOutcomes => "conflicting-outcomes",
            Self::UnrenderableValue => "unrenderable-value",
            Self::UnsupportedEquality => "unsupported-equality",
        }
    }
}

/// Non-fatal generation or emission finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationWarning {
    /// Category
    pub kind: WarningKind,
    /// Details
    pub message: String,
    /// Invocation concerned, when there is one
    #[serde(default)]
    pub provenance: Option<u64>,
}

impl GenerationWarning {
    /// Warning not tied to an invocation.
    #[must_use]
    pub fn new(kind: WarningKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            provenance: None,
        }
    }

    /// Tie the warning to an invocation.
    #[must_use]
    pub const fn at(mut self, invocation: u64) -> Self {
        self.provenance = Some(invocation);
        self
    }
}

impl std::fmt::Display for GenerationWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.kind.as_str(), self.message)?;
        if let Some(invocation) = self.provenance {
            write!(f, " (invocation {invocation})")?;
        }
        Ok(())
    }
}

/// Scenarios produced by one generator run. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestSuite {
    target: MethodIdentifier,
    strategy: GenerationStrategy,
    framework: TestFramework,
    naming_strategy: NamingStrategy,
    equality_strategy: EqualityStrategy,
    scenarios: Vec<TestScenario>,
    #[serde(default)]
    warnings: Vec<GenerationWarning>,
}

impl TestSuite {
    /// Suite without warnings.
    #[must_use]
    pub fn new(
        target: MethodIdentifier,
        strategy: GenerationStrategy,
        framework: TestFramework,
        naming_strategy: NamingStrategy,
        equality_strategy: EqualityStrategy,
        scenarios: Vec<TestScenario>,
    ) -> Self {
        Self {
            target,
            strategy,
            framework,
            naming_strategy,
            equality_strategy,
            scenarios,
            warnings: Vec::new(),
        }
    }

    /// Attach warnings.
    #[must_use]
    pub fn with_warnings(mut self, warnings: Vec<GenerationWarning>) -> Self {
        self.warnings = warnings;
        self
    }

    /// Method under test.
    #[must_use]
    pub const fn target(&self) -> &MethodIdentifier {
        &self.target
    }

    /// Strategy that produced the suite.
    #[must_use]
    pub const fn strategy(&self) -> GenerationStrategy {
        self.strategy
    }

    /// Framework idiom.
    #[must_use]
    pub const fn framework(&self) -> TestFramework {
        self.framework
    }

    /// Test method naming.
    #[must_use]
    pub const fn naming_strategy(&self) -> NamingStrategy {
        self.naming_strategy
    }

    /// Composite value comparison.
    #[must_use]
    pub const fn equality_strategy(&self) -> EqualityStrategy {
        self.equality_strategy
    }

    /// Scenarios in emission order.
    #[must_use]
    pub fn scenarios(&self) -> &[TestScenario] {
        &self.scenarios
    }

    /// Warnings collected during generation.
    #[must_use]
    pub fn warnings(&self) -> &[GenerationWarning] {
        &self.warnings
    }

    /// Number of scenarios.
    #[must_use]
    pub fn len(&self) -> usize {
        self.scenarios.len()
    }

    /// No scenarios.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.scenarios.is_empty()
    }

    /// Scenario count per outcome, in `Normal`, `Void`, `Exception` order.
    #[must_use]
    pub fn outcome_counts(&self) -> [(ResultKind, usize); 3] {
        let count = |kind| {
            self.scenarios
                .iter()
                .filter(|s| s.result_kind() == kind)
                .count()
        };
        [
            (ResultKind::Normal, count(ResultKind::Normal)),
            (ResultKind::Void, count(ResultKind::Void)),
            (ResultKind::Exception, count(ResultKind::Exception)),
        ]
    }

    /// Persist as an artifact.
    pub fn save(&self, path: &Path) -> TracegenResult<()> {
        write_artifact(path, ArtifactKind::TestSuite, self)
    }

    /// Load a persisted suite.
    pub fn load(path: &Path) -> TracegenResult<Self> {
        read_artifact(path, ArtifactKind::TestSuite)
    }
}
