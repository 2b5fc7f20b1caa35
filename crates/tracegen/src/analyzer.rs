//! Runs the instrumented artifact and turns its capture records into a
//! [`Trace`].
//!
//! ```text
//! InstrumentationResult ──► validate ──► execute (timeout) ──► records
//!                                                               │
//!        AnalysisResult ◄── write trace + mapping ◄── assemble ◄┘
//! ```
//!
//! A timed-out run deletes whatever capture files it managed to flush: a
//! truncated stream could pair values that never belonged together.

use crate::artifact::{AnalysisResult, InstrumentationResult};
use crate::config::{RunConfiguration, RunnerBindings};
use crate::identifier::ValueKind;
use crate::mapping::IdentifierMapping;
use crate::method::MethodIdentifier;
use crate::protocol::{CapturePhase, CaptureRecord, ResultsList};
use crate::result::{TracegenError, TracegenResult};
use crate::trace::{Invocation, Trace};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Environment variable naming the capture output directory
pub const OUTPUT_DIR_ENV: &str = "TRACEGEN_OUTPUT_DIR";
/// Environment variable naming the results list the collector appends to
pub const RESULTS_LIST_ENV: &str = "TRACEGEN_RESULTS_LIST";
/// Environment variable naming the identifier mapping
pub const IDENTIFIERS_ENV: &str = "TRACEGEN_IDENTIFIERS";

/// File name of the serialized trace in the output directory
pub const TRACE_FILE: &str = "trace.json";
/// File name of the serialized mapping in the output directory
pub const IDENTIFIERS_FILE: &str = "identifiers.json";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);
const STDERR_TAIL: usize = 2000;

/// Analysis step: instrumentation output in, trace artifacts out.
pub trait Analyzer {
    /// Reject results analysis cannot work with, before running anything.
    fn validate_instrumentation(&self, result: &InstrumentationResult) -> TracegenResult<()>;

    /// Run the primary artifact, collect its records and persist the trace.
    fn execute_analysis(&self, result: &InstrumentationResult) -> TracegenResult<AnalysisResult>;
}

// ============================================================================
// Execution collaborator
// ============================================================================

/// A process launch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionRequest {
    /// Program
    pub program: String,
    /// Arguments
    pub args: Vec<String>,
    /// Working directory
    pub working_dir: PathBuf,
    /// Extra environment
    pub env: Vec<(String, String)>,
    /// Wall-clock bound
    pub timeout: Duration,
}

/// How a launch ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionOutcome {
    /// Process exited on its own
    Completed {
        /// Exit code; `None` when killed by a signal
        exit_code: Option<i32>,
        /// Captured stdout
        stdout: String,
        /// Captured stderr
        stderr: String,
    },
    /// Process was killed at the timeout
    TimedOut,
}

impl ExecutionOutcome {
    /// Completed with exit code 0 and no output.
    #[must_use]
    pub const fn success() -> Self {
        Self::Completed {
            exit_code: Some(0),
            stdout: String::new(),
            stderr: String::new(),
        }
    }
}

/// Runs the instrumented artifact.
pub trait ArtifactExecutor: Send + Sync {
    /// Launch and wait, honoring `request.timeout`.
    fn execute(&self, request: &ExecutionRequest) -> TracegenResult<ExecutionOutcome>;
}

impl<F> ArtifactExecutor for F
where
    F: Fn(&ExecutionRequest) -> TracegenResult<ExecutionOutcome> + Send + Sync,
{
    fn execute(&self, request: &ExecutionRequest) -> TracegenResult<ExecutionOutcome> {
        self(request)
    }
}

/// Launches a real child process; killed when the timeout elapses.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessExecutor;

impl ArtifactExecutor for ProcessExecutor {
    fn execute(&self, request: &ExecutionRequest) -> TracegenResult<ExecutionOutcome> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        runtime.block_on(run_process(request))
    }
}

async fn run_process(request: &ExecutionRequest) -> TracegenResult<ExecutionOutcome> {
    use std::process::Stdio;
    use tokio::process::Command;

    let mut cmd = Command::new(&request.program);
    cmd.args(&request.args)
        .current_dir(&request.working_dir)
        .envs(request.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    tracing::info!(
        program = %request.program,
        args = ?request.args,
        timeout_ms = request.timeout.as_millis() as u64,
        "launching instrumented artifact"
    );
    let child = cmd.spawn().map_err(|e| {
        TracegenError::capture(format!("failed to launch '{}': {e}", request.program))
    })?;

    match tokio::time::timeout(request.timeout, child.wait_with_output()).await {
        Ok(Ok(output)) => Ok(ExecutionOutcome::Completed {
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        }),
        Ok(Err(e)) => Err(TracegenError::capture(format!(
            "waiting for '{}' failed: {e}",
            request.program
        ))),
        Err(_) => Ok(ExecutionOutcome::TimedOut),
    }
}

// ============================================================================
// Trace analyzer
// ============================================================================

/// Analyzer settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalyzerOptions {
    /// Execution timeout
    pub timeout: Duration,
}

impl Default for AnalyzerOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl AnalyzerOptions {
    /// Set the execution timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Analyzer for one run configuration.
#[derive(Debug)]
pub struct TraceAnalyzer<E = ProcessExecutor> {
    config: RunConfiguration,
    executor: E,
    options: AnalyzerOptions,
}

impl TraceAnalyzer<ProcessExecutor> {
    /// Analyzer that launches real processes.
    #[must_use]
    pub fn new(config: RunConfiguration) -> Self {
        Self::with_executor(config, ProcessExecutor)
    }
}

impl<E: ArtifactExecutor> TraceAnalyzer<E> {
    /// Analyzer with a custom execution collaborator.
    #[must_use]
    pub fn with_executor(config: RunConfiguration, executor: E) -> Self {
        Self {
            config,
            executor,
            options: AnalyzerOptions::default(),
        }
    }

    /// Replace the options.
    #[must_use]
    pub const fn with_options(mut self, options: AnalyzerOptions) -> Self {
        self.options = options;
        self
    }

    /// Configuration under analysis.
    #[must_use]
    pub const fn config(&self) -> &RunConfiguration {
        &self.config
    }

    fn output_directory(&self) -> &Path {
        &self.config.options().output_directory
    }

    fn request_for(&self, result: &InstrumentationResult, primary: &Path) -> ExecutionRequest {
        let run = self.config.options();
        let mut args = run.runner.expand(&RunnerBindings {
            artifact: primary,
            additional: &result.additional_artifacts,
            application: run.application_path.as_deref(),
            output: self.output_directory(),
        });
        args.extend(run.runtime_arguments.iter().cloned());

        let mut env = vec![(
            OUTPUT_DIR_ENV.to_string(),
            self.output_directory().display().to_string(),
        )];
        if let Some(list) = &result.results_list_path {
            env.push((RESULTS_LIST_ENV.to_string(), list.display().to_string()));
        }
        if let Some(mapping) = &result.identifiers_mapping_path {
            env.push((IDENTIFIERS_ENV.to_string(), mapping.display().to_string()));
        }

        ExecutionRequest {
            program: run.runner.program.clone(),
            args,
            working_dir: self.output_directory().to_path_buf(),
            env,
            timeout: self.options.timeout,
        }
    }

    fn load_mapping(&self, result: &InstrumentationResult) -> TracegenResult<IdentifierMapping> {
        let mapping = match &result.identifiers_mapping_path {
            Some(path) => IdentifierMapping::load(path)?,
            None => IdentifierMapping::new(),
        };
        for identifier in self.config.identifiers() {
            if !mapping.contains(identifier.internal_id()) {
                return Err(TracegenError::trace_integrity(format!(
                    "identifier {} ({}) from the run configuration is missing from the mapping",
                    identifier.internal_id(),
                    identifier.name()
                )));
            }
        }
        Ok(mapping)
    }
}

/// Delete the results list and every record it names. Best effort: the
/// files are being discarded either way.
fn discard_partial_capture(result: &InstrumentationResult) -> usize {
    let Some(list_path) = &result.results_list_path else {
        return 0;
    };
    let mut removed = 0;
    if let Ok(list) = ResultsList::read(list_path) {
        for record in list.records() {
            if std::fs::remove_file(record).is_ok() {
                removed += 1;
            }
        }
    }
    if std::fs::remove_file(list_path).is_ok() {
        removed += 1;
    }
    removed
}

fn tail(text: &str, max: usize) -> &str {
    if text.len() <= max {
        return text;
    }
    let mut start = text.len() - max;
    while !text.is_char_boundary(start) {
        start += 1;
    }
    &text[start..]
}

impl<E: ArtifactExecutor> Analyzer for TraceAnalyzer<E> {
    fn validate_instrumentation(&self, result: &InstrumentationResult) -> TracegenResult<()> {
        if result.primary_artifact.is_none() {
            return Err(TracegenError::configuration(
                "instrumentation result has no primary artifact",
            ));
        }
        if !self.config.identifiers().is_empty() && result.identifiers_mapping_path.is_none() {
            return Err(TracegenError::configuration(format!(
                "{} identifiers were requested but the instrumentation result has no identifier mapping",
                self.config.identifiers().len()
            )));
        }
        Ok(())
    }

    fn execute_analysis(&self, result: &InstrumentationResult) -> TracegenResult<AnalysisResult> {
        self.validate_instrumentation(result)?;
        let primary = result
            .primary_artifact
            .as_deref()
            .ok_or_else(|| TracegenError::configuration("missing primary artifact"))?;
        if !primary.is_file() {
            return Err(TracegenError::capture(format!(
                "primary artifact {} does not exist or is not a file",
                primary.display()
            )));
        }
        std::fs::create_dir_all(self.output_directory())?;

        let request = self.request_for(result, primary);
        let started = Instant::now();
        match self.executor.execute(&request)? {
            ExecutionOutcome::TimedOut => {
                let removed = discard_partial_capture(result);
                let ms = u64::try_from(self.options.timeout.as_millis()).unwrap_or(u64::MAX);
                tracing::warn!(timeout_ms = ms, removed, "capture timed out; partial data discarded");
                return Err(TracegenError::CaptureTimeout { ms });
            }
            ExecutionOutcome::Completed {
                exit_code,
                stdout,
                stderr,
            } => {
                tracing::info!(
                    ?exit_code,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "instrumented artifact finished"
                );
                tracing::debug!(%stdout, %stderr, "instrumented artifact output");
                if exit_code != Some(0) {
                    return Err(TracegenError::capture(format!(
                        "instrumented run failed with exit code {}: {}",
                        exit_code.map_or_else(|| "none".to_string(), |c| c.to_string()),
                        tail(stderr.trim(), STDERR_TAIL)
                    )));
                }
            }
        }

        let mapping = self.load_mapping(result)?;
        let records = match &result.results_list_path {
            Some(list) if list.exists() => ResultsList::read(list)?.read_records()?,
            Some(list) => {
                tracing::info!(path = %list.display(), "results list not written; trace is empty");
                Vec::new()
            }
            None => {
                tracing::info!("no results list; trace is empty");
                Vec::new()
            }
        };

        let record_count = records.len();
        let mut trace = assemble_trace(self.config.target(), &mapping, records)?;
        let run_id = uuid::Uuid::new_v4().to_string();
        trace.set_metadata("run_id", run_id.clone());
        trace.set_metadata("records", record_count.to_string());
        trace.set_metadata("trace_mode", self.config.options().trace_mode.as_str());
        trace.set_metadata(
            "analyzed_at",
            chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
        );

        let out = self.output_directory();
        let trace_path = out.join(TRACE_FILE);
        let identifiers_mapping_path = out.join(IDENTIFIERS_FILE);
        trace.save(&trace_path)?;
        mapping.save(&identifiers_mapping_path)?;

        let analysis = AnalysisResult {
            trace_path,
            identifiers_mapping_path,
            output_directory: out.to_path_buf(),
            run_id,
        };
        analysis.save(&out.join(AnalysisResult::FILE_NAME))?;
        tracing::info!(
            invocations = trace.len(),
            run_id = %analysis.run_id,
            trace = %analysis.trace_path.display(),
            "analysis complete"
        );
        Ok(analysis)
    }
}

/// Turn decoded records into a trace, checking them against `mapping`.
///
/// Records must arrive in strictly increasing invocation order. Every id must
/// resolve; return values may only appear at exit, arguments and locals only
/// at entry, and every value must fit its declared type. A non-void return
/// value missing at exit is kept as evidence the call threw.
pub fn assemble_trace(
    target: &MethodIdentifier,
    mapping: &IdentifierMapping,
    records: Vec<CaptureRecord>,
) -> TracegenResult<Trace> {
    let mut trace = Trace::new(target.clone());
    let mut previous: Option<u64> = None;

    for record in records {
        if let Some(prev) = previous {
            if record.invocation <= prev {
                return Err(TracegenError::trace_integrity(format!(
                    "invocation {} delivered after invocation {prev}",
                    record.invocation
                )));
            }
        }
        previous = Some(record.invocation);

        let mut invocation = Invocation::new(record.invocation);
        invocation.identity = record.identity;
        let mut returned = false;

        for capture in record.captures {
            let identifier = mapping.resolve(capture.id)?;
            let at = capture.phase;
            match (identifier.kind(), at) {
                (ValueKind::ReturnValue { .. }, CapturePhase::Entry) => {
                    return Err(TracegenError::trace_integrity(format!(
                        "invocation {}: return value id {} captured at entry",
                        record.invocation, capture.id
                    )));
                }
                (ValueKind::ReturnValue { .. }, CapturePhase::Exit)
                    if identifier.is_void_return() =>
                {
                    return Err(TracegenError::trace_integrity(format!(
                        "invocation {}: void return value id {} captured at exit",
                        record.invocation, capture.id
                    )));
                }
                (
                    ValueKind::Argument { .. } | ValueKind::LocalVariable { .. },
                    CapturePhase::Exit,
                ) => {
                    return Err(TracegenError::trace_integrity(format!(
                        "invocation {}: {} id {} captured at exit",
                        record.invocation,
                        identifier.name(),
                        capture.id
                    )));
                }
                _ => {}
            }

            let value = capture.value.conform(identifier.value_type()).ok_or_else(|| {
                TracegenError::trace_integrity(format!(
                    "invocation {}: value {} does not fit type '{}' of id {}",
                    record.invocation,
                    capture.value,
                    identifier.type_name(),
                    capture.id
                ))
            })?;

            returned |= identifier.requires_after_capture();
            let bindings = match at {
                CapturePhase::Entry => &mut invocation.entry,
                CapturePhase::Exit => &mut invocation.exit,
            };
            if bindings.insert(capture.id, value).is_some() {
                return Err(TracegenError::trace_integrity(format!(
                    "invocation {}: id {} captured twice at {at:?}",
                    record.invocation, capture.id
                )));
            }
        }

        if returned && record.exception.is_some() {
            return Err(TracegenError::trace_integrity(format!(
                "invocation {} both returned a value and threw",
                record.invocation
            )));
        }
        invocation.exception = record.exception;
        trace.push(invocation);
    }

    tracing::debug!(invocations = trace.len(), "trace assembled");
    Ok(trace)
}
