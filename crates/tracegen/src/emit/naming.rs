//! Test method names.

use crate::config::NamingStrategy;
use crate::scenario::{Outcome, TestScenario};
use std::collections::HashSet;
use tracegen_javagen::Identifier;

/// Hands out unique test method names for one class.
#[derive(Debug)]
pub(crate) struct MethodNamer {
    strategy: NamingStrategy,
    used: HashSet<String>,
}

impl MethodNamer {
    pub fn new(strategy: NamingStrategy) -> Self {
        Self {
            strategy,
            used: HashSet::new(),
        }
    }

    /// Name for the `ordinal`-th (1-based) scenario of the class.
    pub fn name(&mut self, scenario: &TestScenario, ordinal: usize) -> String {
        let base = match self.strategy {
            NamingStrategy::Descriptive => descriptive(scenario),
            NamingStrategy::Sequential => {
                format!("test{}{ordinal}", capitalize(scenario.target.method_name()))
            }
        };
        let base = Identifier::sanitize(&base).to_string();
        let mut name = base.clone();
        let mut suffix = 2;
        while !self.used.insert(name.clone()) {
            name = format!("{base}_{suffix}");
            suffix += 1;
        }
        name
    }
}

/// `addReturnsValueInvocation3`, `pushThrowsIllegalStateExceptionReceiver7Invocation4`
fn descriptive(scenario: &TestScenario) -> String {
    let outcome = match &scenario.outcome {
        Outcome::Returned { .. } => "ReturnsValue".to_string(),
        Outcome::Void => "Completes".to_string(),
        Outcome::Threw {
            exception: Some(class),
        } => {
            let simple = class.rsplit(['.', '$']).next().unwrap_or(class);
            format!("Throws{}", capitalize(simple))
        }
        Outcome::Threw { exception: None } => "Throws".to_string(),
    };
    let receiver = scenario
        .identity
        .map(|id| format!("Receiver{id}"))
        .unwrap_or_default();
    format!(
        "{}{outcome}{receiver}Invocation{}",
        scenario.target.method_name(),
        scenario.provenance
    )
}

pub(crate) fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}
