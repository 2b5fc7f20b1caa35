//! Replay generator: one scenario per distinct observed invocation.
//!
//! Values are only ever combined the way they were observed together; no
//! cross-product is formed across invocations. Every cap keeps the earliest
//! invocations, so the result is a deterministic function of the trace.

use super::{
    bindings_key, check_target, considered_invocations, key_of, outcome_key, report_limit,
    scenario_for, suite, DistinctSet, FilterCounts, GenerationStrategy, TestGenerator,
};
use crate::config::{GenerationContext, Limit};
use crate::identifier::InternalId;
use crate::mapping::IdentifierMapping;
use crate::result::TracegenResult;
use crate::scenario::{GenerationWarning, TestScenario, TestSuite, WarningKind};
use crate::trace::Trace;
use std::collections::{HashMap, HashSet};

/// Built-in `trace-based-basic` generator.
#[derive(Debug, Clone, Copy, Default)]
pub struct NaiveGenerator;

#[derive(Debug, Default)]
struct LimitDrops {
    arguments: usize,
    fields: usize,
    values: usize,
    duplicates: usize,
}

/// Distinct values per variable, each capped at the same limit.
#[derive(Debug)]
struct VariableValues {
    limit: Limit,
    seen: HashMap<InternalId, DistinctSet>,
}

impl VariableValues {
    fn new(limit: Limit) -> Self {
        Self {
            limit,
            seen: HashMap::new(),
        }
    }

    fn admits(&self, keys: &[(InternalId, Vec<u8>)]) -> bool {
        keys.iter().all(|(id, key)| {
            self.seen
                .get(id)
                .map_or_else(|| self.limit.admits(0), |set| set.admits(key))
        })
    }

    fn insert(&mut self, keys: Vec<(InternalId, Vec<u8>)>) {
        for (id, key) in keys {
            self.seen
                .entry(id)
                .or_insert_with(|| DistinctSet::new(self.limit))
                .insert(key);
        }
    }
}

fn variable_keys(scenario: &TestScenario) -> TracegenResult<Vec<(InternalId, Vec<u8>)>> {
    scenario
        .arguments
        .iter()
        .chain(&scenario.fields)
        .map(|b| Ok((b.identifier.internal_id(), key_of(&b.value)?)))
        .collect()
}

impl TestGenerator for NaiveGenerator {
    fn strategy(&self) -> GenerationStrategy {
        GenerationStrategy::TraceBasedBasic
    }

    fn generate(
        &self,
        trace: &Trace,
        mapping: &IdentifierMapping,
        context: &GenerationContext,
    ) -> TracegenResult<TestSuite> {
        check_target(trace, context)?;
        let options = context.options();
        let mut warnings = Vec::new();
        let invocations = considered_invocations(trace, options, &mut warnings);

        let mut filters = FilterCounts::default();
        let mut drops = LimitDrops::default();
        let mut argument_tuples = DistinctSet::new(options.max_argument_combinations);
        let mut field_tuples = DistinctSet::new(options.max_field_combinations);
        let mut values = VariableValues::new(options.max_values_per_variable);
        let mut emitted: HashSet<Vec<u8>> = HashSet::new();
        let mut first_outcome: HashMap<Vec<u8>, (u64, Vec<u8>)> = HashMap::new();
        let mut scenarios = Vec::new();

        for invocation in invocations {
            let scenario = scenario_for(invocation, mapping, context.target())?;
            if !filters.keep(&scenario, options) {
                continue;
            }

            let args = bindings_key(&scenario.arguments)?;
            let fields = bindings_key(&scenario.fields)?;
            let outcome = outcome_key(&scenario.outcome)?;
            let identity = key_of(&(&args, &fields, &outcome))?;
            if emitted.contains(&identity) {
                drops.duplicates += 1;
                continue;
            }

            if !argument_tuples.admits(&args) {
                drops.arguments += 1;
                continue;
            }
            if !field_tuples.admits(&fields) {
                drops.fields += 1;
                continue;
            }
            let variables = variable_keys(&scenario)?;
            if !values.admits(&variables) {
                drops.values += 1;
                continue;
            }
            argument_tuples.insert(args.clone());
            field_tuples.insert(fields.clone());
            values.insert(variables);
            emitted.insert(identity);

            let inputs = key_of(&(&args, &fields))?;
            match first_outcome.get(&inputs) {
                Some((earlier, seen)) if *seen != outcome => {
                    warnings.push(
                        GenerationWarning::new(
                            WarningKind::ConflictingOutcomes,
                            format!(
                                "same inputs as invocation {earlier} but a different outcome ({})",
                                scenario.result_kind().as_str()
                            ),
                        )
                        .at(scenario.provenance),
                    );
                }
                Some(_) => {}
                None => {
                    first_outcome.insert(inputs, (scenario.provenance, outcome));
                }
            }
            scenarios.push(scenario);
        }

        filters.report(&mut warnings);
        report_limit(
            &mut warnings,
            drops.arguments,
            "max_argument_combinations",
            options.max_argument_combinations,
        );
        report_limit(
            &mut warnings,
            drops.fields,
            "max_field_combinations",
            options.max_field_combinations,
        );
        report_limit(
            &mut warnings,
            drops.values,
            "max_values_per_variable",
            options.max_values_per_variable,
        );

        let distinct = scenarios.len();
        if !options.max_test_count.admits(distinct.saturating_sub(1)) && distinct > 0 {
            scenarios.truncate(options.max_test_count.get());
            report_limit(
                &mut warnings,
                distinct - scenarios.len(),
                "max_test_count",
                options.max_test_count,
            );
        }

        tracing::info!(
            invocations = invocations.len(),
            scenarios = scenarios.len(),
            duplicates = drops.duplicates,
            warnings = warnings.len(),
            "naive generation complete"
        );
        Ok(suite(context, self.strategy(), scenarios, warnings))
    }
}
