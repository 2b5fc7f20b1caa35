//! Plan command handler

use crate::commands::PlanArgs;
use crate::config::CliConfig;
use crate::error::CliResult;
use crate::output::Reporter;
use std::path::PathBuf;
use tracegen::{IdAllocator, ProbePlan, RunConfiguration, RunConfigurationSpec};

/// Resolved configuration, read back by `analyze`
pub const RESOLVED_CONFIG_FILE: &str = "run.yaml";

/// Identifier mapping handed to the instrumentor
pub const PLANNED_IDENTIFIERS_FILE: &str = "planned-identifiers.json";

/// What `plan` wrote.
#[derive(Debug)]
pub struct PlanOutput {
    /// Resolved run configuration
    pub config_path: PathBuf,
    /// Identifier mapping
    pub identifiers_path: PathBuf,
    /// Probe layout
    pub plan: ProbePlan,
}

/// Validate the spec, allocate identifiers and persist both.
pub fn plan(args: &PlanArgs) -> CliResult<PlanOutput> {
    let spec = RunConfigurationSpec::from_yaml_file(&args.spec)?;
    let config = RunConfiguration::from_spec(&spec, &mut IdAllocator::new())?;

    let config_path = args.output.join(RESOLVED_CONFIG_FILE);
    let identifiers_path = args.output.join(PLANNED_IDENTIFIERS_FILE);
    config.save_yaml(&config_path)?;
    config.identifier_mapping()?.save(&identifiers_path)?;
    tracing::info!(
        target_method = %config.target(),
        identifiers = config.identifiers().len(),
        config = %config_path.display(),
        "run planned"
    );

    Ok(PlanOutput {
        config_path,
        identifiers_path,
        plan: config.probe_plan(),
    })
}

/// Execute the plan command
pub fn execute_plan(config: &CliConfig, args: &PlanArgs) -> CliResult<()> {
    let reporter = Reporter::new(config.color.should_color(), config.verbosity.is_quiet());
    let output = plan(args)?;
    print!("{}", output.plan.render());
    for (id, reason) in &output.plan.skipped {
        reporter.warning(&format!("identifier {id} skipped: {reason}"));
    }
    reporter.success(&format!(
        "wrote {} and {}",
        output.config_path.display(),
        output.identifiers_path.display()
    ));
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use tracegen::{ExitHook, IdentifierMapping};

    fn write_spec(dir: &TempDir, body: &str) -> PathBuf {
        let path = dir.path().join("spec.yaml");
        std::fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn test_plan_persists_config_and_mapping() {
        let dir = TempDir::new().unwrap();
        let spec = write_spec(
            &dir,
            "target_method: com.example.Counter.add(int)\n\
             return_type: int\n\
             parameters: [\"0:int\"]\n\
             fields: [\"int:count\"]\n",
        );
        let args = PlanArgs {
            spec,
            output: dir.path().join("plan"),
        };
        let output = plan(&args).unwrap();

        let reloaded = RunConfiguration::load_yaml(&output.config_path).unwrap();
        assert_eq!(reloaded.identifiers().len(), 3);
        let mapping = IdentifierMapping::load(&output.identifiers_path).unwrap();
        assert_eq!(mapping.len(), 3);
        assert_eq!(output.plan.exit_hook, ExitHook::AfterReturning);
        assert_eq!(output.plan.entry.len(), 2);
    }

    #[test]
    fn test_invalid_spec_reports_every_problem() {
        let dir = TempDir::new().unwrap();
        let spec = write_spec(
            &dir,
            "target_method: not a method\nparameters: [\"-1:int\"]\ntrace_mode: sideways\n",
        );
        let args = PlanArgs {
            spec,
            output: dir.path().join("plan"),
        };
        let message = plan(&args).unwrap_err().to_string();
        assert!(message.contains("sideways"));
        assert!(!dir.path().join("plan").join(RESOLVED_CONFIG_FILE).exists());
    }
}
