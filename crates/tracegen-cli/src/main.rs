//! Tracegen CLI: trace-based unit test synthesis for JVM methods
//!
//! ## Usage
//!
//! ```bash
//! tracegen plan run.yaml -o target/tracegen          # allocate identifiers, print probes
//! tracegen analyze -c target/tracegen/run.yaml -i instrumentation.json
//! tracegen generate -t out/trace.json -m out/identifiers.json -o suite.json
//! tracegen emit suite.json -o src/test/java
//! tracegen inspect out/trace.json
//! ```

use clap::Parser;
use std::process::ExitCode;
use tracegen_cli::{handlers, logging, Cli, CliConfig, CliResult, Commands, Reporter, Verbosity};

fn main() -> ExitCode {
    let cli = Cli::parse();
    let config = build_config(&cli);
    logging::init(&config);

    match run(&config, cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            Reporter::new(config.color.should_color(), config.verbosity.is_quiet())
                .failure(&e.to_string());
            ExitCode::FAILURE
        }
    }
}

fn run(config: &CliConfig, command: Commands) -> CliResult<()> {
    match command {
        Commands::Plan(args) => handlers::execute_plan(config, &args),
        Commands::Analyze(args) => handlers::execute_analyze(config, &args),
        Commands::Generate(args) => handlers::execute_generate(config, &args),
        Commands::Emit(args) => handlers::execute_emit(config, &args),
        Commands::Inspect(args) => handlers::execute_inspect(config, &args),
        Commands::Strategies => {
            handlers::execute_strategies(config);
            Ok(())
        }
    }
}

fn build_config(cli: &Cli) -> CliConfig {
    CliConfig::new()
        .with_verbosity(Verbosity::from_flags(cli.quiet, cli.verbose))
        .with_color(cli.color.into())
        .with_log_format(cli.log_format.into())
}
