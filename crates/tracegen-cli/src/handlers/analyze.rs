//! Analyze command handler

use crate::commands::AnalyzeArgs;
use crate::config::CliConfig;
use crate::error::{CliError, CliResult};
use crate::output::Reporter;
use std::time::Duration;
use tracegen::{
    AnalysisResult, Analyzer, AnalyzerOptions, InstrumentationResult, RunConfiguration,
    TraceAnalyzer,
};

/// Analyzer options from the command line. A zero timeout is rejected.
pub fn analyzer_options(args: &AnalyzeArgs) -> CliResult<AnalyzerOptions> {
    if args.timeout == 0 {
        return Err(CliError::invalid_argument("--timeout must be at least 1 second"));
    }
    Ok(AnalyzerOptions::default().with_timeout(Duration::from_secs(args.timeout)))
}

/// Execute the analyze command
pub fn execute_analyze(config: &CliConfig, args: &AnalyzeArgs) -> CliResult<()> {
    let reporter = Reporter::new(config.color.should_color(), config.verbosity.is_quiet());
    let run = RunConfiguration::load_yaml(&args.config)?;
    let instrumentation = InstrumentationResult::load(&args.instrumentation)?;
    let analyzer = TraceAnalyzer::new(run).with_options(analyzer_options(args)?);

    reporter.info(&format!("analyzing {}", analyzer.config().target()));
    let analysis = match analyzer.execute_analysis(&instrumentation) {
        Ok(analysis) => analysis,
        Err(e) => {
            if e.is_recoverable() {
                reporter.warning("capture failed; re-running instrumentation may help");
            }
            return Err(e.into());
        }
    };
    print_analysis(&analysis);
    reporter.success(&format!("run {} analyzed", analysis.run_id));
    Ok(())
}

fn print_analysis(analysis: &AnalysisResult) {
    println!("trace:       {}", analysis.trace_path.display());
    println!("identifiers: {}", analysis.identifiers_mapping_path.display());
    println!("run id:      {}", analysis.run_id);
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn args(timeout: u64) -> AnalyzeArgs {
        AnalyzeArgs {
            config: PathBuf::from("run.yaml"),
            instrumentation: PathBuf::from("instrumentation.json"),
            timeout,
        }
    }

    #[test]
    fn test_timeout_applied() {
        let options = analyzer_options(&args(12)).unwrap();
        assert_eq!(options.timeout, Duration::from_secs(12));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let err = analyzer_options(&args(0)).unwrap_err();
        assert!(matches!(err, CliError::InvalidArgument { .. }));
    }

    #[test]
    fn test_missing_config_is_error() {
        let err = execute_analyze(&CliConfig::new(), &args(5)).unwrap_err();
        assert!(matches!(err, CliError::Tracegen(_)));
    }
}
