//! Trace-based scenario generators.
//!
//! ```text
//!                      ┌─────────────────┐
//!                 ┌───►│ NaiveGenerator  │──► one scenario per distinct
//! Trace + Mapping │    └─────────────────┘    observed tuple
//!  + Context ─────┤
//!                 │    ┌─────────────────┐
//!                 └───►│TemporalGenerator│──► per-receiver transitions
//!                      └─────────────────┘    with field deltas
//! ```
//!
//! Both are pure functions of their inputs: they never mutate the trace and
//! may run concurrently against the same one.

pub mod naive;
pub mod strategy;
pub mod temporal;

pub use naive::NaiveGenerator;
pub use strategy::{GenerationStrategy, StrategyInfo, StrategyRegistry};
pub use temporal::{sample_evenly, TemporalGenerator};

use crate::config::{GenerationContext, GenerationOptions, Limit};
use crate::identifier::{InternalId, ValueKind};
use crate::mapping::IdentifierMapping;
use crate::method::MethodIdentifier;
use crate::result::{TracegenError, TracegenResult};
use crate::scenario::{
    GenerationWarning, Outcome, ResultKind, TestScenario, TestSuite, ValueBinding, WarningKind,
};
use crate::trace::{Invocation, Trace};
use crate::value::CapturedValue;
use serde::Serialize;
use std::collections::HashSet;

/// Turns a trace into a test suite.
///
/// Implemented by the built-in generators and by externally supplied ones
/// (the AI-assisted strategy is never built in).
pub trait TestGenerator: Send + Sync {
    /// Strategy this generator implements.
    fn strategy(&self) -> GenerationStrategy;

    /// Generate scenarios for `trace`, interpreting ids through `mapping`.
    fn generate(
        &self,
        trace: &Trace,
        mapping: &IdentifierMapping,
        context: &GenerationContext,
    ) -> TracegenResult<TestSuite>;
}

/// The trace must have been captured from the method being generated for.
pub(crate) fn check_target(trace: &Trace, context: &GenerationContext) -> TracegenResult<()> {
    if trace.target().signature() != context.target().signature() {
        return Err(TracegenError::configuration(format!(
            "trace was captured from {} but generation targets {}",
            trace.target().signature(),
            context.target().signature()
        )));
    }
    Ok(())
}

/// Invocations kept by `max_execution_scenarios`, in order.
pub(crate) fn considered_invocations<'a>(
    trace: &'a Trace,
    options: &GenerationOptions,
    warnings: &mut Vec<GenerationWarning>,
) -> &'a [Invocation] {
    let all = trace.invocations();
    let limit = options.max_execution_scenarios;
    if limit.admits(all.len().saturating_sub(1)) || all.is_empty() {
        return all;
    }
    let kept = limit.get();
    warnings.push(GenerationWarning::new(
        WarningKind::LimitReached,
        format!(
            "max_execution_scenarios={limit}: considered {kept} of {} invocations",
            all.len()
        ),
    ));
    &all[..kept]
}

/// Build the scenario for one invocation. Deltas are left empty.
pub(crate) fn scenario_for(
    invocation: &Invocation,
    mapping: &IdentifierMapping,
    target: &MethodIdentifier,
) -> TracegenResult<TestScenario> {
    let mut arguments = Vec::new();
    let mut fields = Vec::new();
    for (id, value) in &invocation.entry {
        let identifier = mapping.resolve(*id)?;
        match identifier.kind() {
            ValueKind::Argument { .. } => {
                arguments.push(ValueBinding::new(identifier.clone(), value.clone()));
            }
            ValueKind::Field { .. } => {
                fields.push(ValueBinding::new(identifier.clone(), value.clone()));
            }
            ValueKind::LocalVariable { .. } => {}
            ValueKind::ReturnValue { .. } => {
                return Err(misplaced(invocation.index, *id, "return value at entry"));
            }
        }
    }
    arguments.sort_by_key(|b| b.identifier.argument_slot());

    let mut post_state = Vec::new();
    let mut returned = None;
    for (id, value) in &invocation.exit {
        let identifier = mapping.resolve(*id)?;
        match identifier.kind() {
            ValueKind::Field { .. } => {
                post_state.push(ValueBinding::new(identifier.clone(), value.clone()));
            }
            ValueKind::ReturnValue { .. } if !identifier.is_void_return() => {
                returned = Some(ValueBinding::new(identifier.clone(), value.clone()));
            }
            _ => return Err(misplaced(invocation.index, *id, "value at exit")),
        }
    }

    let declares_return = mapping.return_values().iter().any(|r| !r.is_void_return());
    let outcome = match (returned, &invocation.exception) {
        (Some(_), Some(_)) => {
            return Err(TracegenError::trace_integrity(format!(
                "invocation {} both returned a value and threw",
                invocation.index
            )));
        }
        (Some(binding), None) => Outcome::Returned { binding },
        (None, Some(exception)) => Outcome::Threw {
            exception: Some(exception.clone()),
        },
        (None, None) if declares_return => Outcome::Threw { exception: None },
        (None, None) => Outcome::Void,
    };

    Ok(TestScenario {
        target: target.clone(),
        arguments,
        fields,
        outcome,
        provenance: invocation.index,
        identity: invocation.identity,
        state_delta: Vec::new(),
        post_state,
    })
}

fn misplaced(index: u64, id: InternalId, what: &str) -> TracegenError {
    TracegenError::trace_integrity(format!("invocation {index}: id {id} is an unexpected {what}"))
}

/// Scenarios removed by the negative-test and edge-case switches.
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct FilterCounts {
    pub negative: usize,
    pub edge: usize,
}

impl FilterCounts {
    /// Whether `scenario` survives the switches in `options`.
    pub fn keep(&mut self, scenario: &TestScenario, options: &GenerationOptions) -> bool {
        if !options.generate_negative_tests && scenario.result_kind() == ResultKind::Exception {
            self.negative += 1;
            return false;
        }
        if !options.generate_edge_cases && scenario.has_edge_inputs() {
            self.edge += 1;
            return false;
        }
        true
    }

    pub fn report(self, warnings: &mut Vec<GenerationWarning>) {
        if self.negative > 0 {
            warnings.push(GenerationWarning::new(
                WarningKind::NegativeTestsFiltered,
                format!("dropped {} exception scenarios", self.negative),
            ));
        }
        if self.edge > 0 {
            warnings.push(GenerationWarning::new(
                WarningKind::EdgeCasesFiltered,
                format!("dropped {} scenarios with edge-value inputs", self.edge),
            ));
        }
    }
}

/// Record `dropped` items lost to `limit`.
pub(crate) fn report_limit(
    warnings: &mut Vec<GenerationWarning>,
    dropped: usize,
    name: &str,
    limit: Limit,
) {
    if dropped > 0 {
        warnings.push(GenerationWarning::new(
            WarningKind::LimitReached,
            format!("{name}={limit}: dropped {dropped} scenarios"),
        ));
    }
}

/// Stable byte key for values that are not `Hash` (floats).
pub(crate) fn key_of<T: Serialize + ?Sized>(value: &T) -> TracegenResult<Vec<u8>> {
    Ok(bincode::serialize(value)?)
}

/// Key over bound values, by id.
pub(crate) fn bindings_key(bindings: &[ValueBinding]) -> TracegenResult<Vec<u8>> {
    let pairs: Vec<(InternalId, &CapturedValue)> = bindings
        .iter()
        .map(|b| (b.identifier.internal_id(), &b.value))
        .collect();
    key_of(&pairs)
}

/// Key over the expected outcome.
pub(crate) fn outcome_key(outcome: &Outcome) -> TracegenResult<Vec<u8>> {
    key_of(&(
        outcome.kind() as u8,
        outcome.expected(),
        outcome.exception_category(),
    ))
}

/// Distinct keys, capped at a [`Limit`].
#[derive(Debug)]
pub(crate) struct DistinctSet {
    seen: HashSet<Vec<u8>>,
    limit: Limit,
}

impl DistinctSet {
    pub fn new(limit: Limit) -> Self {
        Self {
            seen: HashSet::new(),
            limit,
        }
    }

    /// Already seen, or room for one more.
    pub fn admits(&self, key: &[u8]) -> bool {
        self.seen.contains(key) || self.limit.admits(self.seen.len())
    }

    pub fn insert(&mut self, key: Vec<u8>) {
        self.seen.insert(key);
    }
}

/// Assemble the suite from `context`'s presentation options.
pub(crate) fn suite(
    context: &GenerationContext,
    strategy: GenerationStrategy,
    scenarios: Vec<TestScenario>,
    warnings: Vec<GenerationWarning>,
) -> TestSuite {
    let options = context.options();
    TestSuite::new(
        context.target().clone(),
        strategy,
        options.test_framework,
        options.naming_strategy,
        options.equality_strategy,
        scenarios,
    )
    .with_warnings(warnings)
}
