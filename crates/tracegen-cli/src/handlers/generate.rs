//! Generate command handler

use crate::commands::GenerateArgs;
use crate::config::CliConfig;
use crate::error::CliResult;
use crate::output::{suite_counts, Reporter};
use tracegen::{
    write_suite, GenerationContext, GenerationOptions, GenerationStrategy, IdentifierMapping,
    StrategyRegistry, TestSuite, Trace, TraceMode,
};

/// Default test source root when the suite is emitted right away
pub const DEFAULT_TEST_ROOT: &str = "src/test/java";

/// Options file, then command-line overrides.
pub fn resolve_options(args: &GenerateArgs) -> CliResult<GenerationOptions> {
    let mut options = match &args.options {
        Some(path) => GenerationOptions::from_yaml_file(path)?,
        None => GenerationOptions::default(),
    };
    if let Some(framework) = args.framework {
        options.test_framework = framework.into();
    }
    if let Some(limit) = args.max_tests {
        options.max_test_count = limit;
    }
    Ok(options)
}

/// Explicit strategy, else the one matching the trace's recorded mode.
pub fn resolve_strategy(args: &GenerateArgs, trace: &Trace) -> CliResult<GenerationStrategy> {
    if let Some(strategy) = args.strategy {
        return Ok(strategy);
    }
    let strategy = match trace.metadata().get("trace_mode") {
        Some(mode) => GenerationStrategy::for_trace_mode(mode.parse::<TraceMode>()?),
        None => GenerationStrategy::default(),
    };
    Ok(strategy)
}

/// Load the inputs, run the generator and persist the suite.
pub fn generate(args: &GenerateArgs) -> CliResult<TestSuite> {
    let trace = Trace::load(&args.trace)?;
    let mapping = IdentifierMapping::load(&args.identifiers)?;
    let options = resolve_options(args)?;
    let strategy = resolve_strategy(args, &trace)?;

    let test_root = args
        .emit
        .clone()
        .unwrap_or_else(|| DEFAULT_TEST_ROOT.into());
    let context = GenerationContext::new(trace.target().clone(), test_root, options)?;
    let registry = StrategyRegistry::new();
    let suite = registry
        .generator(strategy)?
        .generate(&trace, &mapping, &context)?;
    suite.save(&args.output)?;
    tracing::info!(
        %strategy,
        scenarios = suite.len(),
        suite = %args.output.display(),
        "suite written"
    );
    Ok(suite)
}

/// Execute the generate command
pub fn execute_generate(config: &CliConfig, args: &GenerateArgs) -> CliResult<()> {
    let reporter = Reporter::new(config.color.should_color(), config.verbosity.is_quiet());
    let suite = generate(args)?;
    reporter.warnings(suite.warnings());
    println!("{}: {}", args.output.display(), suite_counts(&suite));

    if let Some(root) = &args.emit {
        let command = format!("tracegen emit {} -o {}", args.output.display(), root.display());
        let report = write_suite(&suite, root, &command)?;
        reporter.warnings(&report.warnings);
        println!("{}", report.path.display());
    }
    reporter.success(&format!("{} strategy finished", suite.strategy()));
    Ok(())
}
