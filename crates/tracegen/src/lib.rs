//! Tracegen: trace-based unit test synthesis for JVM methods
//!
//! Values flowing through a method under test are captured while the real
//! application runs, then replayed as framework-idiomatic unit tests.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────────┐
//! │                         TRACEGEN Pipeline                             │
//! ├──────────────────────────────────────────────────────────────────────┤
//! │  ┌────────────┐   ┌────────────┐   ┌────────────┐   ┌────────────┐   │
//! │  │ RunConfig  │   │ Analyzer   │   │ Generator  │   │ Emitter    │   │
//! │  │ identifiers│──►│ run + read │──►│ naive /    │──►│ JUnit /    │   │
//! │  │ probe plan │   │ records    │   │ temporal   │   │ TestNG     │   │
//! │  └────────────┘   └─────┬──────┘   └─────┬──────┘   └────────────┘   │
//! │                         ▼                ▼                           │
//! │                    trace.json       TestSuite                        │
//! └──────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Identifier ids are allocated once while planning, so probes never need
//! to coordinate. Every hand-off between stages is a versioned artifact and
//! each stage can be re-run on its own.

#![warn(missing_docs)]

pub mod analyzer;
pub mod artifact;
pub mod config;
pub mod emit;
pub mod generator;
pub mod identifier;
pub mod mapping;
pub mod method;
pub mod plan;
pub mod protocol;
pub mod result;
pub mod scenario;
pub mod trace;
pub mod value;

pub use analyzer::{
    assemble_trace, Analyzer, AnalyzerOptions, ArtifactExecutor, ExecutionOutcome,
    ExecutionRequest, ProcessExecutor, TraceAnalyzer,
};
pub use artifact::{peek_kind, AnalysisResult, ArtifactKind, InstrumentationResult};
pub use config::{
    EqualityStrategy, GenerationContext, GenerationOptions, Limit, NamingStrategy,
    RunConfiguration, RunConfigurationSpec, RunOptions, RunnerSpec, TestFramework, TraceMode,
};
pub use emit::{render_suite, test_class_name, write_suite, EmitReport, EmittedSuite};
pub use generator::{
    GenerationStrategy, NaiveGenerator, StrategyInfo, StrategyRegistry, TemporalGenerator,
    TestGenerator,
};
pub use identifier::{IdAllocator, InternalId, ValueIdentifier, ValueKind, ValueType};
pub use mapping::IdentifierMapping;
pub use method::MethodIdentifier;
pub use plan::{ExitHook, ProbePlan, ProbeStatement};
pub use protocol::{CapturePhase, CaptureRecord, RawCapture, ResultsList};
pub use result::{TracegenError, TracegenResult};
pub use scenario::{
    FieldDelta, GenerationWarning, Outcome, ResultKind, TestScenario, TestSuite, ValueBinding,
    WarningKind,
};
pub use trace::{Invocation, Trace, TraceSummary};
pub use value::{CapturedValue, ObjectSnapshot, SnapshotField};

/// Convenient glob import.
pub mod prelude {
    pub use crate::analyzer::{Analyzer, TraceAnalyzer};
    pub use crate::config::{GenerationContext, GenerationOptions, Limit, RunConfiguration};
    pub use crate::emit::{render_suite, write_suite};
    pub use crate::generator::{GenerationStrategy, StrategyRegistry, TestGenerator};
    pub use crate::identifier::{IdAllocator, ValueIdentifier};
    pub use crate::mapping::IdentifierMapping;
    pub use crate::method::MethodIdentifier;
    pub use crate::scenario::{TestScenario, TestSuite};
    pub use crate::trace::{Invocation, Trace};
    pub use crate::value::CapturedValue;
    pub use crate::{TracegenError, TracegenResult};
}
