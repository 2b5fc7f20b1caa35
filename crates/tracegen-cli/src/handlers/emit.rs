//! Emit command handler

use crate::commands::EmitArgs;
use crate::config::CliConfig;
use crate::error::CliResult;
use crate::output::{suite_counts, Reporter};
use tracegen::{render_suite, write_suite, TestSuite};

/// Execute the emit command
pub fn execute_emit(config: &CliConfig, args: &EmitArgs) -> CliResult<()> {
    let reporter = Reporter::new(config.color.should_color(), config.verbosity.is_quiet());
    let suite = TestSuite::load(&args.suite)?;
    reporter.info(&suite_counts(&suite));

    if args.stdout {
        let emitted = render_suite(&suite)?;
        reporter.warnings(&emitted.warnings);
        print!("{}", emitted.source);
        return Ok(());
    }

    let command = format!("tracegen emit {} -o {}", args.suite.display(), args.output.display());
    let report = write_suite(&suite, &args.output, &command)?;
    reporter.warnings(&report.warnings);
    println!("{}", report.path.display());
    reporter.success(&format!(
        "{} test methods, manifest {}",
        report.test_count,
        report.manifest_path.display()
    ));
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::error::CliError;
    use std::path::PathBuf;
    use tempfile::TempDir;
    use tracegen::{
        EqualityStrategy, GenerationStrategy, MethodIdentifier, NamingStrategy, TestFramework,
    };

    #[test]
    fn test_emit_writes_class_below_root() {
        let dir = TempDir::new().unwrap();
        let suite_path = dir.path().join("suite.json");
        TestSuite::new(
            MethodIdentifier::parse("com.example.Counter.reset()").unwrap(),
            GenerationStrategy::TraceBasedBasic,
            TestFramework::JUnit5,
            NamingStrategy::Descriptive,
            EqualityStrategy::AssertEquals,
            Vec::new(),
        )
        .save(&suite_path)
        .unwrap();

        let args = EmitArgs {
            suite: suite_path,
            output: dir.path().join("java"),
            stdout: false,
        };
        execute_emit(&CliConfig::new(), &args).unwrap();
        let written = dir.path().join("java/com/example/CounterResetGeneratedTest.java");
        let source = std::fs::read_to_string(&written).unwrap();
        assert!(source.contains("class CounterResetGeneratedTest"));
        assert!(dir
            .path()
            .join("java/com/example/CounterResetGeneratedTest.java.manifest.json")
            .exists());
    }

    #[test]
    fn test_wrong_artifact_kind_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("mapping.json");
        tracegen::IdentifierMapping::new().save(&path).unwrap();
        let args = EmitArgs {
            suite: path,
            output: PathBuf::from("unused"),
            stdout: true,
        };
        let err = execute_emit(&CliConfig::new(), &args).unwrap_err();
        assert!(matches!(err, CliError::Tracegen(_)));
        assert!(err.to_string().contains("expected test-suite"));
    }
}
