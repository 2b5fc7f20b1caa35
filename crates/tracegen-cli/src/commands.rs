//! CLI command definitions using clap

use crate::config::{ColorChoice, LogFormat};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracegen::{GenerationStrategy, Limit, TestFramework};

/// Tracegen: turn captured JVM method invocations into unit tests
#[derive(Parser, Debug)]
#[command(name = "tracegen")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (suppress non-error output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Color output (auto, always, never)
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorArg,

    /// Log line format on stderr
    #[arg(long, default_value = "text", global = true, env = "TRACEGEN_LOG_FORMAT")]
    pub log_format: LogFormatArg,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Validate a run configuration, allocate identifiers and print the probe plan
    Plan(PlanArgs),

    /// Run the instrumented application and assemble its trace
    Analyze(AnalyzeArgs),

    /// Generate test scenarios from a trace
    Generate(GenerateArgs),

    /// Write a test suite as a Java test class
    Emit(EmitArgs),

    /// Summarize any tracegen artifact
    Inspect(InspectArgs),

    /// List generation strategies
    Strategies,
}

/// Arguments for the plan command
#[derive(Parser, Debug)]
pub struct PlanArgs {
    /// Run configuration spec (YAML)
    pub spec: PathBuf,

    /// Directory for the resolved configuration and identifier mapping
    #[arg(short, long, default_value = "target/tracegen")]
    pub output: PathBuf,
}

/// Arguments for the analyze command
#[derive(Parser, Debug)]
pub struct AnalyzeArgs {
    /// Resolved run configuration written by `plan`
    #[arg(short, long)]
    pub config: PathBuf,

    /// Instrumentation result artifact
    #[arg(short, long)]
    pub instrumentation: PathBuf,

    /// Execution timeout in seconds
    #[arg(long, default_value = "300")]
    pub timeout: u64,
}

/// Arguments for the generate command
#[derive(Parser, Debug)]
pub struct GenerateArgs {
    /// Trace artifact
    #[arg(short, long)]
    pub trace: PathBuf,

    /// Identifier mapping artifact
    #[arg(short = 'm', long)]
    pub identifiers: PathBuf,

    /// Strategy (defaults to the one matching the trace mode)
    #[arg(short, long)]
    pub strategy: Option<GenerationStrategy>,

    /// Generation options (YAML); missing keys keep their defaults
    #[arg(long)]
    pub options: Option<PathBuf>,

    /// Test framework, overriding the options file
    #[arg(short, long)]
    pub framework: Option<FrameworkArg>,

    /// Cap on generated scenarios, overriding the options file
    #[arg(long)]
    pub max_tests: Option<Limit>,

    /// Where to write the test suite artifact
    #[arg(short, long, default_value = "target/tracegen/suite.json")]
    pub output: PathBuf,

    /// Also write the Java test class below this source root
    #[arg(long)]
    pub emit: Option<PathBuf>,
}

/// Arguments for the emit command
#[derive(Parser, Debug)]
pub struct EmitArgs {
    /// Test suite artifact
    pub suite: PathBuf,

    /// Test source root
    #[arg(short, long, default_value = "src/test/java")]
    pub output: PathBuf,

    /// Print the source to stdout instead of writing it
    #[arg(long)]
    pub stdout: bool,
}

/// Arguments for the inspect command
#[derive(Parser, Debug)]
pub struct InspectArgs {
    /// Artifact to summarize
    pub artifact: PathBuf,

    /// Print the payload as JSON
    #[arg(long)]
    pub json: bool,
}

/// Color choice argument
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum ColorArg {
    /// Auto-detect terminal
    #[default]
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

impl From<ColorArg> for ColorChoice {
    fn from(arg: ColorArg) -> Self {
        match arg {
            ColorArg::Auto => Self::Auto,
            ColorArg::Always => Self::Always,
            ColorArg::Never => Self::Never,
        }
    }
}

/// Log format argument
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum LogFormatArg {
    /// Human-readable lines
    #[default]
    Text,
    /// One JSON object per event
    Json,
}

impl From<LogFormatArg> for LogFormat {
    fn from(arg: LogFormatArg) -> Self {
        match arg {
            LogFormatArg::Text => Self::Text,
            LogFormatArg::Json => Self::Json,
        }
    }
}

/// Test framework argument
#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum FrameworkArg {
    /// `JUnit` 5 (Jupiter)
    Junit5,
    /// `JUnit` 4
    Junit4,
    /// `TestNG`
    Testng,
}

impl From<FrameworkArg> for TestFramework {
    fn from(arg: FrameworkArg) -> Self {
        match arg {
            FrameworkArg::Junit5 => Self::JUnit5,
            FrameworkArg::Junit4 => Self::JUnit4,
            FrameworkArg::Testng => Self::TestNg,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    mod parsing_tests {
        use super::*;

        #[test]
        fn test_parse_plan() {
            let cli = Cli::try_parse_from(["tracegen", "plan", "run.yaml", "-o", "out"]).unwrap();
            match cli.command {
                Commands::Plan(args) => {
                    assert_eq!(args.spec, PathBuf::from("run.yaml"));
                    assert_eq!(args.output, PathBuf::from("out"));
                }
                other => panic!("unexpected command: {other:?}"),
            }
        }

        #[test]
        fn test_parse_generate_overrides() {
            let cli = Cli::try_parse_from([
                "tracegen",
                "generate",
                "--trace",
                "t.json",
                "-m",
                "ids.json",
                "--framework",
                "testng",
                "--max-tests",
                "5",
            ])
            .unwrap();
            let Commands::Generate(args) = cli.command else {
                panic!("expected generate");
            };
            assert!(matches!(args.framework, Some(FrameworkArg::Testng)));
            assert_eq!(args.max_tests, Some(Limit::new(5)));
            assert!(args.strategy.is_none());
        }

        #[test]
        fn test_global_flags() {
            let cli = Cli::try_parse_from(["tracegen", "-vv", "--log-format", "json", "strategies"])
                .unwrap();
            assert_eq!(cli.verbose, 2);
            assert!(matches!(cli.log_format, LogFormatArg::Json));
            assert!(matches!(cli.command, Commands::Strategies));
        }

        #[test]
        fn test_strategy_parsed_by_name() {
            let cli = Cli::try_parse_from([
                "tracegen",
                "generate",
                "-t",
                "t.json",
                "-m",
                "ids.json",
                "-s",
                "trace-based-advanced",
            ])
            .unwrap();
            let Commands::Generate(args) = cli.command else {
                panic!("expected generate");
            };
            assert_eq!(args.strategy, Some(GenerationStrategy::TraceBasedAdvanced));
            assert!(Cli::try_parse_from([
                "tracegen", "generate", "-t", "t", "-m", "m", "-s", "random"
            ])
            .is_err());
        }

        #[test]
        fn test_analyze_requires_config() {
            assert!(Cli::try_parse_from(["tracegen", "analyze", "-i", "r.json"]).is_err());
        }
    }

    mod conversion_tests {
        use super::*;

        #[test]
        fn test_framework_conversion() {
            assert_eq!(TestFramework::from(FrameworkArg::Junit4), TestFramework::JUnit4);
            assert_eq!(TestFramework::from(FrameworkArg::Testng), TestFramework::TestNg);
        }

        #[test]
        fn test_color_conversion() {
            assert_eq!(ColorChoice::from(ColorArg::Never), ColorChoice::Never);
            assert_eq!(LogFormat::from(LogFormatArg::Json), LogFormat::Json);
        }
    }
}
