//! Run and generation configuration.
//!
//! Both are immutable once built: [`RunConfiguration::from_spec`] and
//! [`GenerationContext::new`] validate everything up front and report every
//! problem in one [`TracegenError::Configuration`].

use crate::generator::GenerationStrategy;
use crate::identifier::{IdAllocator, ValueIdentifier, ValueKind};
use crate::mapping::IdentifierMapping;
use crate::method::MethodIdentifier;
use crate::plan::ProbePlan;
use crate::result::{TracegenError, TracegenResult};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::str::FromStr;

// ============================================================================
// Limits and option enums
// ============================================================================

/// Upper bound on a count. Zero is a real bound; [`Limit::UNBOUNDED`] means
/// no bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Limit(usize);

impl Limit {
    /// No bound
    pub const UNBOUNDED: Self = Self(usize::MAX);

    /// Bound of `n`.
    #[must_use]
    pub const fn new(n: usize) -> Self {
        Self(n)
    }

    /// Raw value; `usize::MAX` when unbounded.
    #[must_use]
    pub const fn get(self) -> usize {
        self.0
    }

    /// No bound.
    #[must_use]
    pub const fn is_unbounded(self) -> bool {
        self.0 == usize::MAX
    }

    /// Whether one more item fits after `count` items.
    #[must_use]
    pub const fn admits(self, count: usize) -> bool {
        count < self.0
    }
}

impl Default for Limit {
    fn default() -> Self {
        Self::UNBOUNDED
    }
}

impl std::fmt::Display for Limit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_unbounded() {
            f.write_str("unbounded")
        } else {
            write!(f, "{}", self.0)
        }
    }
}

impl FromStr for Limit {
    type Err = TracegenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "unbounded" | "none" => Ok(Self::UNBOUNDED),
            n => n
                .parse()
                .map(Self)
                .map_err(|_| TracegenError::configuration(format!("invalid limit '{s}'"))),
        }
    }
}

impl Serialize for Limit {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.is_unbounded() {
            serializer.serialize_str("unbounded")
        } else {
            serializer.serialize_u64(self.0 as u64)
        }
    }
}

impl<'de> Deserialize<'de> for Limit {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Count(u64),
            Text(String),
        }
        match Repr::deserialize(deserializer)? {
            Repr::Count(n) => usize::try_from(n)
                .map(Self)
                .map_err(|_| serde::de::Error::custom(format!("limit {n} too large"))),
            Repr::Text(text) => text.parse().map_err(serde::de::Error::custom),
        }
    }
}

macro_rules! named_enum {
    ($ty:ident, $what:literal, { $($variant:ident => $name:literal),+ $(,)? }) => {
        impl $ty {
            /// Configuration name.
            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $name,)+
                }
            }

            /// Every variant, in declaration order.
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];
        }

        impl std::fmt::Display for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = TracegenError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let wanted = s.trim().to_ascii_lowercase();
                Self::ALL
                    .iter()
                    .copied()
                    .find(|v| v.as_str() == wanted)
                    .ok_or_else(|| {
                        let known: Vec<&str> = Self::ALL.iter().map(|v| v.as_str()).collect();
                        TracegenError::configuration(format!(
                            "unknown {} '{s}' (expected one of: {})",
                            $what,
                            known.join(", ")
                        ))
                    })
            }
        }
    };
}

/// Test framework idiom for emitted sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestFramework {
    /// JUnit Jupiter
    #[default]
    #[serde(rename = "junit5")]
    JUnit5,
    /// JUnit 4
    #[serde(rename = "junit4")]
    JUnit4,
    /// TestNG
    TestNg,
}

named_enum!(TestFramework, "test framework", {
    JUnit5 => "junit5",
    JUnit4 => "junit4",
    TestNg => "testng",
});

/// How test methods are named.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NamingStrategy {
    /// `addReturnsValueInvocation3`
    #[default]
    Descriptive,
    /// `testAdd1`, `testAdd2`, ...
    Sequential,
}

named_enum!(NamingStrategy, "naming strategy", {
    Descriptive => "descriptive",
    Sequential => "sequential",
});

/// Comparison used for composite (object) values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EqualityStrategy {
    /// Rebuild the expected object and rely on its `equals`
    #[default]
    AssertEquals,
    /// Reflectively compare each captured field
    FieldByField,
    /// Compare `toString()` renderings
    ToString,
}

named_enum!(EqualityStrategy, "equality strategy", {
    AssertEquals => "assert-equals",
    FieldByField => "field-by-field",
    ToString => "to-string",
});

/// Shape of the capture the instrumentor is asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TraceMode {
    /// Independent invocations
    #[default]
    Naive,
    /// Invocations grouped by receiver identity
    Temporal,
}

named_enum!(TraceMode, "trace mode", {
    Naive => "naive",
    Temporal => "temporal",
});

// ============================================================================
// Generation context
// ============================================================================

/// Every generation option with its default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationOptions {
    /// Framework idiom
    pub test_framework: TestFramework,
    /// Cap on scenarios per suite
    pub max_test_count: Limit,
    /// Keep scenarios whose inputs contain edge values
    pub generate_edge_cases: bool,
    /// Keep EXCEPTION scenarios
    pub generate_negative_tests: bool,
    /// Test method naming
    pub naming_strategy: NamingStrategy,
    /// Composite value comparison
    pub equality_strategy: EqualityStrategy,
    /// Distinct argument tuples
    pub max_argument_combinations: Limit,
    /// Distinct field-state tuples
    pub max_field_combinations: Limit,
    /// Temporal transitions per identity
    pub max_state_change_samples: Limit,
    /// Distinct values per captured variable
    pub max_values_per_variable: Limit,
    /// Invocations considered at all, in order
    pub max_execution_scenarios: Limit,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            test_framework: TestFramework::JUnit5,
            max_test_count: Limit::new(50),
            generate_edge_cases: true,
            generate_negative_tests: true,
            naming_strategy: NamingStrategy::Descriptive,
            equality_strategy: EqualityStrategy::AssertEquals,
            max_argument_combinations: Limit::UNBOUNDED,
            max_field_combinations: Limit::UNBOUNDED,
            max_state_change_samples: Limit::UNBOUNDED,
            max_values_per_variable: Limit::UNBOUNDED,
            max_execution_scenarios: Limit::UNBOUNDED,
        }
    }
}

impl GenerationOptions {
    /// Load options from a YAML file; missing keys keep their defaults.
    pub fn from_yaml_file(path: &Path) -> TracegenResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_yaml_ng::from_str(&text)?)
    }
}

/// Everything a generator needs besides the trace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationContext {
    target: MethodIdentifier,
    output_directory: PathBuf,
    options: GenerationOptions,
}

impl GenerationContext {
    /// Validated constructor.
    pub fn new(
        target: MethodIdentifier,
        output_directory: impl Into<PathBuf>,
        options: GenerationOptions,
    ) -> TracegenResult<Self> {
        let output_directory = output_directory.into();
        if output_directory.as_os_str().is_empty() {
            return Err(TracegenError::configuration(
                "generation requires an output directory",
            ));
        }
        Ok(Self {
            target,
            output_directory,
            options,
        })
    }

    /// Method under test.
    #[must_use]
    pub const fn target(&self) -> &MethodIdentifier {
        &self.target
    }

    /// Where generated sources go.
    #[must_use]
    pub fn output_directory(&self) -> &Path {
        &self.output_directory
    }

    /// Options.
    #[must_use]
    pub const fn options(&self) -> &GenerationOptions {
        &self.options
    }
}

// ============================================================================
// Run configuration
// ============================================================================

/// Command template for the execution collaborator.
///
/// Placeholders: `{artifact}` (primary artifact), `{application}`,
/// `{output}` (capture output directory). An argument that is exactly
/// `{additional}` expands to the additional artifacts, one per argument.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunnerSpec {
    /// Program to launch
    pub program: String,
    /// Argument templates
    #[serde(default)]
    pub args: Vec<String>,
}

impl Default for RunnerSpec {
    fn default() -> Self {
        Self {
            program: "java".to_string(),
            args: vec!["-jar".to_string(), "{artifact}".to_string()],
        }
    }
}

/// Values substituted into a [`RunnerSpec`].
#[derive(Debug, Clone, Copy)]
pub struct RunnerBindings<'a> {
    /// `{artifact}`
    pub artifact: &'a Path,
    /// `{additional}`
    pub additional: &'a [PathBuf],
    /// `{application}`
    pub application: Option<&'a Path>,
    /// `{output}`
    pub output: &'a Path,
}

impl RunnerSpec {
    /// Expand the templates into concrete arguments.
    #[must_use]
    pub fn expand(&self, bindings: &RunnerBindings<'_>) -> Vec<String> {
        let application = bindings
            .application
            .map(|p| p.display().to_string())
            .unwrap_or_default();
        let mut out = Vec::with_capacity(self.args.len());
        for arg in &self.args {
            if arg == "{additional}" {
                out.extend(bindings.additional.iter().map(|p| p.display().to_string()));
                continue;
            }
            out.push(
                arg.replace("{artifact}", &bindings.artifact.display().to_string())
                    .replace("{application}", &application)
                    .replace("{output}", &bindings.output.display().to_string()),
            );
        }
        out
    }
}

/// Flat, serde-loadable description of a run, before validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunConfigurationSpec {
    /// `pkg.Class.method(T1, T2)`
    pub target_method: String,
    /// Declared return type; void when absent
    #[serde(default)]
    pub return_type: Option<String>,
    /// Target is a static method
    #[serde(default)]
    pub static_method: bool,
    /// `"slot:type"` argument captures
    #[serde(default)]
    pub parameters: Vec<String>,
    /// `"type:name"` or `"static type:name"` field captures
    #[serde(default)]
    pub fields: Vec<String>,
    /// Capture the return value
    #[serde(default = "default_true")]
    pub capture_return: bool,
    /// Target sources
    #[serde(default)]
    pub source_path: Option<PathBuf>,
    /// Application artifact the target lives in
    #[serde(default)]
    pub application_path: Option<PathBuf>,
    /// Analysis output directory
    #[serde(default = "default_output_directory")]
    pub output_directory: PathBuf,
    /// Arguments passed to the application
    #[serde(default)]
    pub runtime_arguments: Vec<String>,
    /// Extra classpath entries
    #[serde(default)]
    pub classpath: Vec<PathBuf>,
    /// `naive` or `temporal`
    #[serde(default = "default_trace_mode")]
    pub trace_mode: String,
    /// Generation strategy name
    #[serde(default = "default_strategy")]
    pub strategy: String,
    /// Execution command template
    #[serde(default)]
    pub runner: RunnerSpec,
}

const fn default_true() -> bool {
    true
}

fn default_output_directory() -> PathBuf {
    PathBuf::from("tracegen-out")
}

fn default_trace_mode() -> String {
    TraceMode::Naive.as_str().to_string()
}

fn default_strategy() -> String {
    GenerationStrategy::TraceBasedBasic.as_str().to_string()
}

impl RunConfigurationSpec {
    /// Spec for `target_method` with every other field at its default.
    #[must_use]
    pub fn new(target_method: impl Into<String>) -> Self {
        Self {
            target_method: target_method.into(),
            return_type: None,
            static_method: false,
            parameters: Vec::new(),
            fields: Vec::new(),
            capture_return: true,
            source_path: None,
            application_path: None,
            output_directory: default_output_directory(),
            runtime_arguments: Vec::new(),
            classpath: Vec::new(),
            trace_mode: default_trace_mode(),
            strategy: default_strategy(),
            runner: RunnerSpec::default(),
        }
    }

    /// Load from a YAML file.
    pub fn from_yaml_file(path: &Path) -> TracegenResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_yaml_ng::from_str(&text)?)
    }
}

/// Locations and execution settings of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunOptions {
    /// Target sources
    pub source_path: Option<PathBuf>,
    /// Application artifact
    pub application_path: Option<PathBuf>,
    /// Analysis output directory
    pub output_directory: PathBuf,
    /// Arguments passed to the application
    pub runtime_arguments: Vec<String>,
    /// Extra classpath entries
    pub classpath: Vec<PathBuf>,
    /// Capture shape
    pub trace_mode: TraceMode,
    /// Generation strategy
    pub strategy: GenerationStrategy,
    /// Execution command template
    pub runner: RunnerSpec,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            source_path: None,
            application_path: None,
            output_directory: default_output_directory(),
            runtime_arguments: Vec::new(),
            classpath: Vec::new(),
            trace_mode: TraceMode::Naive,
            strategy: GenerationStrategy::TraceBasedBasic,
            runner: RunnerSpec::default(),
        }
    }
}

/// Validated description of what to capture, consumed by the instrumentor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunConfiguration {
    target: MethodIdentifier,
    identifiers: Vec<ValueIdentifier>,
    options: RunOptions,
}

impl RunConfiguration {
    /// Validated constructor.
    ///
    /// Identifier ids must be distinct, argument slots must exist in the
    /// target's signature, and at most one return value of the target may be
    /// captured.
    pub fn new(
        target: MethodIdentifier,
        identifiers: Vec<ValueIdentifier>,
        options: RunOptions,
    ) -> TracegenResult<Self> {
        let mut problems = Vec::new();
        let mut seen = BTreeSet::new();
        let mut returns = 0usize;
        for identifier in &identifiers {
            if !seen.insert(identifier.internal_id()) {
                problems.push(format!("duplicate identifier id {}", identifier.internal_id()));
            }
            match identifier.kind() {
                ValueKind::Argument { slot } => {
                    let arity = target.parameter_types().len();
                    if *slot as usize >= arity {
                        problems.push(format!(
                            "argument slot {slot} out of range for {} ({arity} parameters)",
                            target.signature()
                        ));
                    }
                }
                ValueKind::ReturnValue { method } => {
                    returns += 1;
                    if method != &target {
                        problems.push(format!(
                            "return value of {} does not belong to target {}",
                            method.signature(),
                            target.signature()
                        ));
                    }
                }
                ValueKind::Field { .. } | ValueKind::LocalVariable { .. } => {}
            }
        }
        if returns > 1 {
            problems.push(format!("{returns} return value identifiers; at most one allowed"));
        }
        if options.output_directory.as_os_str().is_empty() {
            problems.push("output directory is empty".to_string());
        }
        if !problems.is_empty() {
            return Err(TracegenError::configuration(problems.join("; ")));
        }
        Ok(Self {
            target,
            identifiers,
            options,
        })
    }

    /// Validate a [`RunConfigurationSpec`], allocating identifier ids from
    /// `ids`. All problems are reported together.
    pub fn from_spec(spec: &RunConfigurationSpec, ids: &mut IdAllocator) -> TracegenResult<Self> {
        let mut problems = Vec::new();

        let target = MethodIdentifier::parse(&spec.target_method).and_then(|m| {
            m.returning(spec.return_type.as_deref().unwrap_or("void"))
                .map(|m| m.as_static(spec.static_method))
        });
        let target = match target {
            Ok(target) => Some(target),
            Err(e) => {
                problems.push(message_of(e));
                None
            }
        };

        let trace_mode = spec
            .trace_mode
            .parse::<TraceMode>()
            .map_err(|e| problems.push(message_of(e)))
            .ok();
        let strategy = spec
            .strategy
            .parse::<GenerationStrategy>()
            .map_err(|e| problems.push(message_of(e)))
            .ok();

        let mut identifiers = Vec::new();
        for entry in &spec.parameters {
            match parse_parameter(entry) {
                Ok((slot, ty)) => match ValueIdentifier::argument(ids, slot, ty) {
                    Ok(identifier) => identifiers.push(identifier),
                    Err(e) => problems.push(format!("parameter '{entry}': {}", message_of(e))),
                },
                Err(message) => problems.push(message),
            }
        }
        if let Some(target) = &target {
            for entry in &spec.fields {
                match parse_field(entry) {
                    Ok((ty, name, is_static)) => {
                        match ValueIdentifier::field(ids, target.class_name(), name, ty, is_static)
                        {
                            Ok(identifier) => identifiers.push(identifier),
                            Err(e) => problems.push(format!("field '{entry}': {}", message_of(e))),
                        }
                    }
                    Err(message) => problems.push(message),
                }
            }
            if spec.capture_return {
                match ValueIdentifier::return_value(ids, target) {
                    Ok(identifier) => identifiers.push(identifier),
                    Err(e) => problems.push(message_of(e)),
                }
            }
        }
        if identifiers.is_empty() && target.is_some() {
            problems.push("nothing to capture: no parameters, fields or return value".to_string());
        }

        let (Some(target), Some(trace_mode), Some(strategy)) = (target, trace_mode, strategy)
        else {
            return Err(TracegenError::configuration(problems.join("; ")));
        };
        if !problems.is_empty() {
            return Err(TracegenError::configuration(problems.join("; ")));
        }

        let options = RunOptions {
            source_path: spec.source_path.clone(),
            application_path: spec.application_path.clone(),
            output_directory: spec.output_directory.clone(),
            runtime_arguments: spec.runtime_arguments.clone(),
            classpath: spec.classpath.clone(),
            trace_mode,
            strategy,
            runner: spec.runner.clone(),
        };
        let config = Self::new(target, identifiers, options)?;
        tracing::info!(
            target = %config.target,
            identifiers = config.identifiers.len(),
            trace_mode = %config.options.trace_mode,
            "run configuration validated"
        );
        Ok(config)
    }

    /// Method under analysis.
    #[must_use]
    pub const fn target(&self) -> &MethodIdentifier {
        &self.target
    }

    /// Identifiers to capture, in declaration order.
    #[must_use]
    pub fn identifiers(&self) -> &[ValueIdentifier] {
        &self.identifiers
    }

    /// Locations and execution settings.
    #[must_use]
    pub const fn options(&self) -> &RunOptions {
        &self.options
    }

    /// Mapping artifact contents for the instrumentor to persist.
    pub fn identifier_mapping(&self) -> TracegenResult<IdentifierMapping> {
        IdentifierMapping::from_identifiers(&self.identifiers)
    }

    /// Entry/exit probe layout for the instrumentor.
    #[must_use]
    pub fn probe_plan(&self) -> ProbePlan {
        ProbePlan::build(self)
    }

    /// Persist as YAML.
    pub fn save_yaml(&self, path: &Path) -> TracegenResult<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, serde_yaml_ng::to_string(self)?)?;
        Ok(())
    }

    /// Load a persisted configuration, re-running validation.
    pub fn load_yaml(path: &Path) -> TracegenResult<Self> {
        let text = std::fs::read_to_string(path)?;
        let raw: Self = serde_yaml_ng::from_str(&text)?;
        Self::new(raw.target, raw.identifiers, raw.options)
    }
}

fn message_of(error: TracegenError) -> String {
    match error {
        TracegenError::Configuration { message } => message,
        other => other.to_string(),
    }
}

fn parse_parameter(entry: &str) -> Result<(i32, &str), String> {
    let (slot, ty) = entry
        .split_once(':')
        .ok_or_else(|| format!("parameter '{entry}': expected 'slot:type'"))?;
    let slot = slot
        .trim()
        .parse::<i32>()
        .map_err(|_| format!("parameter '{entry}': slot is not a number"))?;
    Ok((slot, ty.trim()))
}

fn parse_field(entry: &str) -> Result<(&str, &str, bool), String> {
    let trimmed = entry.trim();
    let (is_static, rest) = match trimmed.strip_prefix("static ") {
        Some(rest) => (true, rest.trim()),
        None => (false, trimmed),
    };
    let (ty, name) = rest
        .rsplit_once(':')
        .ok_or_else(|| format!("field '{entry}': expected 'type:name'"))?;
    Ok((ty.trim(), name.trim(), is_static))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn spec() -> RunConfigurationSpec {
        RunConfigurationSpec {
            return_type: Some("int".into()),
            parameters: vec!["0:int".into(), "1:int".into()],
            fields: vec!["int:count".into(), "static long:total".into()],
            ..RunConfigurationSpec::new("com.example.Calculator.add(int, int)")
        }
    }

    mod limits {
        use super::*;

        #[test]
        fn zero_is_a_real_bound() {
            let zero = Limit::new(0);
            assert!(!zero.is_unbounded());
            assert!(!zero.admits(0));
            assert!(Limit::UNBOUNDED.admits(usize::MAX - 1));
        }

        #[test]
        fn parse_and_display() {
            assert_eq!("unbounded".parse::<Limit>().unwrap(), Limit::UNBOUNDED);
            assert_eq!("3".parse::<Limit>().unwrap(), Limit::new(3));
            assert!("-1".parse::<Limit>().is_err());
            assert_eq!(Limit::UNBOUNDED.to_string(), "unbounded");
        }

        #[test]
        fn serde_accepts_number_or_word() {
            let options: GenerationOptions =
                serde_yaml_ng::from_str("max_argument_combinations: 0\nmax_test_count: unbounded\n")
                    .unwrap();
            assert_eq!(options.max_argument_combinations, Limit::new(0));
            assert_eq!(options.max_test_count, Limit::UNBOUNDED);
            let json = serde_json::to_string(&GenerationOptions::default()).unwrap();
            assert!(json.contains("\"max_test_count\":50"));
            assert!(json.contains("\"max_field_combinations\":\"unbounded\""));
        }
    }

    mod options {
        use super::*;

        #[test]
        fn defaults_enumerated_once() {
            let options = GenerationOptions::default();
            assert_eq!(options.test_framework, TestFramework::JUnit5);
            assert_eq!(options.max_test_count, Limit::new(50));
            assert!(options.generate_edge_cases);
            assert!(options.generate_negative_tests);
            assert_eq!(options.naming_strategy, NamingStrategy::Descriptive);
            assert!(options.max_state_change_samples.is_unbounded());
            assert!(options.max_execution_scenarios.is_unbounded());
        }

        #[test]
        fn enum_names() {
            assert_eq!("JUnit4".parse::<TestFramework>().unwrap(), TestFramework::JUnit4);
            assert_eq!(
                "field-by-field".parse::<EqualityStrategy>().unwrap(),
                EqualityStrategy::FieldByField
            );
            let err = "spock".parse::<TestFramework>().unwrap_err();
            assert!(err.to_string().contains("junit5, junit4, testng"));
            let yaml = serde_yaml_ng::to_string(&TestFramework::TestNg).unwrap();
            assert_eq!(yaml.trim(), "testng");
        }

        #[test]
        fn context_requires_output_directory() {
            let target = MethodIdentifier::parse("a.B.c()").unwrap();
            assert!(GenerationContext::new(target.clone(), "", GenerationOptions::default())
                .is_err());
            let ctx = GenerationContext::new(target, "out", GenerationOptions::default()).unwrap();
            assert_eq!(ctx.output_directory(), Path::new("out"));
        }
    }

    mod run_configuration {
        use super::*;

        #[test]
        fn from_spec_builds_identifiers() {
            let mut ids = IdAllocator::new();
            let config = RunConfiguration::from_spec(&spec(), &mut ids).unwrap();
            assert_eq!(config.identifiers().len(), 5);
            assert_eq!(config.target().return_type(), "int");
            let statics: Vec<_> = config
                .identifiers()
                .iter()
                .filter(|i| matches!(i.kind(), ValueKind::Field { is_static: true, .. }))
                .collect();
            assert_eq!(statics.len(), 1);
            assert_eq!(config.options().strategy, GenerationStrategy::TraceBasedBasic);
        }

        #[test]
        fn from_spec_reports_every_problem() {
            let bad = RunConfigurationSpec {
                parameters: vec!["-1:int".into(), "zero:int".into(), "0:".into()],
                trace_mode: "sideways".into(),
                strategy: "magic".into(),
                ..RunConfigurationSpec::new("com.example.Calculator.add(int)")
            };
            let err = RunConfiguration::from_spec(&bad, &mut IdAllocator::new()).unwrap_err();
            let text = err.to_string();
            assert!(text.contains("negative slot -1"), "{text}");
            assert!(text.contains("slot is not a number"), "{text}");
            assert!(text.contains("requires a type name"), "{text}");
            assert!(text.contains("unknown trace mode 'sideways'"), "{text}");
            assert!(text.contains("unknown generation strategy 'magic'"), "{text}");
        }

        #[test]
        fn malformed_method_reference() {
            let bad = RunConfigurationSpec::new("not a method");
            let err = RunConfiguration::from_spec(&bad, &mut IdAllocator::new()).unwrap_err();
            assert!(err.to_string().contains("malformed method reference"));
        }

        #[test]
        fn nothing_to_capture() {
            let empty = RunConfigurationSpec {
                capture_return: false,
                ..RunConfigurationSpec::new("com.example.Calculator.reset()")
            };
            let err = RunConfiguration::from_spec(&empty, &mut IdAllocator::new()).unwrap_err();
            assert!(err.to_string().contains("nothing to capture"));
        }

        #[test]
        fn slot_out_of_range() {
            let bad = RunConfigurationSpec {
                parameters: vec!["2:int".into()],
                ..RunConfigurationSpec::new("com.example.Calculator.add(int, int)")
            };
            let err = RunConfiguration::from_spec(&bad, &mut IdAllocator::new()).unwrap_err();
            assert!(err.to_string().contains("slot 2 out of range"));
        }

        #[test]
        fn duplicate_ids_rejected() {
            let target = MethodIdentifier::parse("a.B.c(int)").unwrap();
            let arg = ValueIdentifier::argument(&mut IdAllocator::new(), 0, "int").unwrap();
            let err = RunConfiguration::new(target, vec![arg.clone(), arg], RunOptions::default())
                .unwrap_err();
            assert!(err.to_string().contains("duplicate identifier id 1"));
        }

        #[test]
        fn foreign_return_value_rejected() {
            let mut ids = IdAllocator::new();
            let target = MethodIdentifier::parse("a.B.c()").unwrap();
            let other = MethodIdentifier::parse("a.B.d()").unwrap();
            let ret = ValueIdentifier::return_value(&mut ids, &other).unwrap();
            assert!(RunConfiguration::new(target, vec![ret], RunOptions::default()).is_err());
        }

        #[test]
        fn yaml_roundtrip_revalidates() {
            let dir = tempfile::TempDir::new().unwrap();
            let path = dir.path().join("run.yaml");
            let config = RunConfiguration::from_spec(&spec(), &mut IdAllocator::new()).unwrap();
            config.save_yaml(&path).unwrap();
            assert_eq!(RunConfiguration::load_yaml(&path).unwrap(), config);
        }

        #[test]
        fn spec_from_yaml() {
            let yaml = "target_method: com.example.Counter.increment()\nreturn_type: int\ntrace_mode: temporal\nfields:\n  - int:count\n";
            let spec: RunConfigurationSpec = serde_yaml_ng::from_str(yaml).unwrap();
            assert!(spec.capture_return);
            let config = RunConfiguration::from_spec(&spec, &mut IdAllocator::new()).unwrap();
            assert_eq!(config.options().trace_mode, TraceMode::Temporal);
            assert_eq!(config.identifiers().len(), 2);
        }
    }

    #[test]
    fn runner_expansion() {
        let runner = RunnerSpec {
            program: "java".into(),
            args: vec![
                "-javaagent:{additional}".into(),
                "{additional}".into(),
                "-Dout={output}".into(),
                "-jar".into(),
                "{artifact}".into(),
                "{application}".into(),
            ],
        };
        let additional = vec![PathBuf::from("a.jar"), PathBuf::from("b.jar")];
        let args = runner.expand(&RunnerBindings {
            artifact: Path::new("inst.jar"),
            additional: &additional,
            application: Some(Path::new("app.jar")),
            output: Path::new("/tmp/out"),
        });
        assert_eq!(
            args,
            vec![
                "-javaagent:{additional}",
                "a.jar",
                "b.jar",
                "-Dout=/tmp/out",
                "-jar",
                "inst.jar",
                "app.jar"
            ]
        );
    }
}
