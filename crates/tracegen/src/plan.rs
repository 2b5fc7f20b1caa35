//! Entry/exit probe layout handed to the instrumentor.

use crate::config::RunConfiguration;
use crate::identifier::{InternalId, ValueIdentifier};
use crate::method::MethodIdentifier;
use serde::{Deserialize, Serialize};

/// Where the exit probe is placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExitHook {
    /// Normal returns only; the return value is on the stack
    AfterReturning,
    /// Every exit, normal or exceptional
    After,
}

/// One value read inside a probe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeStatement {
    /// Identifier id
    pub id: InternalId,
    /// Statement reading the value into a local
    pub accessor: String,
    /// Statement handing the local to the collector
    pub collector_call: String,
}

impl ProbeStatement {
    fn new(identifier: &ValueIdentifier, accessor: String) -> Self {
        Self {
            id: identifier.internal_id(),
            accessor,
            collector_call: identifier.emit_collector_call(),
        }
    }
}

/// Probe layout for one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbePlan {
    /// Instrumented method
    pub target: MethodIdentifier,
    /// Statements in the entry probe
    pub entry: Vec<ProbeStatement>,
    /// Statements in the exit probe
    pub exit: Vec<ProbeStatement>,
    /// Exit probe placement
    pub exit_hook: ExitHook,
    /// Identifiers left out of every probe, with the reason
    pub skipped: Vec<(InternalId, String)>,
}

impl ProbePlan {
    /// Split the configuration's identifiers into entry and exit probes.
    ///
    /// Arguments, locals and fields are read at entry; return values and
    /// fields again at exit. Void return identifiers have nothing to read and
    /// are skipped.
    #[must_use]
    pub fn build(config: &RunConfiguration) -> Self {
        let mut entry = Vec::new();
        let mut exit = Vec::new();
        let mut skipped = Vec::new();
        let mut captures_return = false;

        for identifier in config.identifiers() {
            if identifier.is_void_return() {
                tracing::warn!(
                    id = %identifier.internal_id(),
                    target = %config.target(),
                    "return value of void method skipped"
                );
                skipped.push((
                    identifier.internal_id(),
                    "void return has no value".to_string(),
                ));
                continue;
            }
            if !identifier.requires_after_capture() {
                entry.push(ProbeStatement::new(identifier, identifier.emit_code()));
            }
            if let Some(code) = identifier.emit_exit_code() {
                captures_return |= identifier.requires_after_capture();
                exit.push(ProbeStatement::new(identifier, code));
            }
        }

        let exit_hook = if captures_return {
            ExitHook::AfterReturning
        } else {
            ExitHook::After
        };
        tracing::debug!(
            entry = entry.len(),
            exit = exit.len(),
            skipped = skipped.len(),
            ?exit_hook,
            "probe plan built"
        );
        Self {
            target: config.target().clone(),
            entry,
            exit,
            exit_hook,
            skipped,
        }
    }

    /// Human-readable listing, one statement per line.
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = format!("// probes for {}\n", self.target);
        out.push_str("// @Before\n");
        for stmt in &self.entry {
            out.push_str(&stmt.accessor);
            out.push('\n');
            out.push_str(&stmt.collector_call);
            out.push('\n');
        }
        let hook = match self.exit_hook {
            ExitHook::AfterReturning => "@AfterReturning",
            ExitHook::After => "@After",
        };
        out.push_str(&format!("// {hook}\n"));
        for stmt in &self.exit {
            out.push_str(&stmt.accessor);
            out.push('\n');
            out.push_str(&stmt.collector_call);
            out.push('\n');
        }
        for (id, reason) in &self.skipped {
            out.push_str(&format!("// skipped {id}: {reason}\n"));
        }
        out
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::config::{RunConfigurationSpec, RunConfiguration};
    use crate::identifier::IdAllocator;

    fn plan(spec: RunConfigurationSpec) -> ProbePlan {
        RunConfiguration::from_spec(&spec, &mut IdAllocator::new())
            .unwrap()
            .probe_plan()
    }

    #[test]
    fn test_return_goes_to_exit_probe() {
        let plan = plan(RunConfigurationSpec {
            return_type: Some("int".into()),
            parameters: vec!["0:int".into(), "1:int".into()],
            ..RunConfigurationSpec::new("com.example.Calculator.add(int, int)")
        });
        assert_eq!(plan.entry.len(), 2);
        assert_eq!(plan.exit.len(), 1);
        assert_eq!(plan.exit_hook, ExitHook::AfterReturning);
        assert!(plan.exit[0].accessor.contains("getStackValue(0, int.class)"));
        assert_eq!(plan.exit[0].collector_call, "CollectorRE.collectInt(3, return_add_3);");
    }

    #[test]
    fn test_fields_probed_at_entry_and_exit() {
        let plan = plan(RunConfigurationSpec {
            fields: vec!["int:count".into()],
            ..RunConfigurationSpec::new("com.example.Counter.reset()")
        });
        assert_eq!(plan.entry.len(), 1);
        assert_eq!(plan.exit.len(), 1);
        assert_eq!(plan.entry[0].accessor, plan.exit[0].accessor);
        assert_eq!(plan.exit_hook, ExitHook::After);
        assert_eq!(plan.skipped.len(), 1);
        assert!(plan.render().contains("// skipped 2: void return has no value"));
    }
}
