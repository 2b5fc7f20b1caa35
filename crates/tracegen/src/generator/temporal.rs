//! State-tracking generator: per-receiver transitions with field deltas.
//!
//! Invocations are grouped by receiver identity; groups are ordered by their
//! first invocation index and each group is ordered by invocation index.
//! Sampling always keeps the first and last transition of a group, so the
//! terminal state of every receiver survives any budget of two or more.

use super::{
    check_target, considered_invocations, key_of, report_limit, scenario_for, suite,
    FilterCounts, GenerationStrategy, TestGenerator,
};
use crate::config::{GenerationContext, Limit};
use crate::identifier::InternalId;
use crate::mapping::IdentifierMapping;
use crate::result::TracegenResult;
use crate::scenario::{FieldDelta, TestScenario, TestSuite, ValueBinding};
use crate::trace::Trace;
use std::collections::{BTreeMap, HashMap};

/// Built-in `trace-based-advanced` generator.
#[derive(Debug, Clone, Copy, Default)]
pub struct TemporalGenerator;

/// Positions to keep when sampling `budget` of `n` ordered transitions.
///
/// Keeps everything when the budget covers it, nothing for a zero budget and
/// only the first transition for a budget of one. Otherwise keeps the first
/// and the last, and spreads the rest evenly over the interior. The result is
/// strictly increasing.
#[must_use]
pub fn sample_evenly(n: usize, budget: usize) -> Vec<usize> {
    if budget >= n {
        return (0..n).collect();
    }
    match budget {
        0 => Vec::new(),
        1 => vec![0],
        _ => {
            let span = (n - 1) as u128;
            let steps = (budget - 1) as u128;
            (0..budget)
                .map(|k| {
                    // round(k * span / steps), half up
                    let scaled = 2 * k as u128 * span + steps;
                    (scaled / (2 * steps)) as usize
                })
                .collect()
        }
    }
}

/// Split `total` over groups wanting `needs`, earlier groups first.
fn distribute(needs: &[usize], total: Limit) -> Vec<usize> {
    let wanted: usize = needs.iter().sum();
    if total.is_unbounded() || wanted <= total.get() {
        return needs.to_vec();
    }
    let mut budgets = vec![0usize; needs.len()];
    let mut remaining = total.get();
    while remaining > 0 {
        let hungry: Vec<usize> = (0..needs.len()).filter(|&g| budgets[g] < needs[g]).collect();
        if hungry.is_empty() {
            break;
        }
        let share = (remaining / hungry.len()).max(1);
        for g in hungry {
            let give = share.min(needs[g] - budgets[g]).min(remaining);
            budgets[g] += give;
            remaining -= give;
            if remaining == 0 {
                break;
            }
        }
    }
    budgets
}

/// Field state a scenario leaves behind: exit values when captured, else
/// entry values.
fn observed_state(scenario: &TestScenario) -> &[ValueBinding] {
    if scenario.post_state.is_empty() {
        &scenario.fields
    } else {
        &scenario.post_state
    }
}

fn state_delta(
    previous: &[ValueBinding],
    current: &[ValueBinding],
) -> TracegenResult<Vec<FieldDelta>> {
    let before: HashMap<InternalId, &ValueBinding> = previous
        .iter()
        .map(|b| (b.identifier.internal_id(), b))
        .collect();
    let mut delta = Vec::new();
    for binding in current {
        match before.get(&binding.identifier.internal_id()) {
            None => delta.push(FieldDelta::Added {
                field: binding.clone(),
            }),
            Some(old) if key_of(&old.value)? != key_of(&binding.value)? => {
                delta.push(FieldDelta::Changed {
                    field: binding.clone(),
                    previous: old.value.clone(),
                });
            }
            Some(_) => {}
        }
    }
    for old in previous {
        let id = old.identifier.internal_id();
        if !current.iter().any(|b| b.identifier.internal_id() == id) {
            delta.push(FieldDelta::Removed { field: old.clone() });
        }
    }
    Ok(delta)
}

impl TestGenerator for TemporalGenerator {
    fn strategy(&self) -> GenerationStrategy {
        GenerationStrategy::TraceBasedAdvanced
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
        let mut invocations: Vec<_> = considered_invocations(trace, options, &mut warnings)
            .iter()
            .collect();
        invocations.sort_by_key(|i| i.index);

        let mut filters = FilterCounts::default();
        let mut order: Vec<Option<u64>> = Vec::new();
        let mut groups: BTreeMap<Option<u64>, Vec<TestScenario>> = BTreeMap::new();
        for invocation in invocations.iter().copied() {
            let scenario = scenario_for(invocation, mapping, context.target())?;
            if !filters.keep(&scenario, options) {
                continue;
            }
            let group = groups.entry(invocation.identity).or_insert_with(|| {
                order.push(invocation.identity);
                Vec::new()
            });
            group.push(scenario);
        }
        filters.report(&mut warnings);

        let needs: Vec<usize> = order
            .iter()
            .map(|identity| {
                let len = groups.get(identity).map_or(0, Vec::len);
                len.min(options.max_state_change_samples.get())
            })
            .collect();
        let budgets = distribute(&needs, options.max_test_count);

        let mut scenarios = Vec::new();
        let mut sampled_out = 0usize;
        let mut budget_out = 0usize;
        for (identity, budget) in order.iter().zip(budgets) {
            let Some(group) = groups.remove(identity) else {
                continue;
            };
            let need = group.len().min(options.max_state_change_samples.get());
            sampled_out += group.len() - need;
            budget_out += need - budget;

            let keep = sample_evenly(group.len(), budget);
            let mut previous: Vec<ValueBinding> = Vec::new();
            let mut slots: Vec<Option<TestScenario>> = group.into_iter().map(Some).collect();
            for position in keep {
                let Some(mut scenario) = slots[position].take() else {
                    continue;
                };
                let state = observed_state(&scenario).to_vec();
                scenario.state_delta = state_delta(&previous, &state)?;
                previous = state;
                scenarios.push(scenario);
            }
            tracing::debug!(
                identity = ?identity,
                kept = budget,
                "receiver transitions sampled"
            );
        }
        report_limit(
            &mut warnings,
            sampled_out,
            "max_state_change_samples",
            options.max_state_change_samples,
        );
        report_limit(
            &mut warnings,
            budget_out,
            "max_test_count",
            options.max_test_count,
        );

        tracing::info!(
            invocations = invocations.len(),
            receivers = order.len(),
            scenarios = scenarios.len(),
            warnings = warnings.len(),
            "temporal generation complete"
        );
        Ok(suite(context, self.strategy(), scenarios, warnings))
    }
}
