//! Inspect command handler

use crate::commands::InspectArgs;
use crate::config::CliConfig;
use crate::error::CliResult;
use crate::output::suite_counts;
use std::fmt::Write as _;
use std::path::Path;
use tracegen::{
    peek_kind, AnalysisResult, ArtifactKind, IdentifierMapping, InstrumentationResult, TestSuite,
    Trace,
};

/// Human-readable (or JSON) description of the artifact at `path`.
pub fn describe(path: &Path, json: bool) -> CliResult<String> {
    let kind = peek_kind(path)?;
    tracing::debug!(path = %path.display(), kind = kind.as_str(), "inspecting artifact");
    let text = match kind {
        ArtifactKind::Trace => {
            let trace = Trace::load(path)?;
            if json {
                serde_json::to_string_pretty(&trace.summary())?
            } else {
                describe_trace(&trace)
            }
        }
        ArtifactKind::IdentifierMapping => {
            let mapping = IdentifierMapping::load(path)?;
            if json {
                serde_json::to_string_pretty(&mapping)?
            } else {
                describe_mapping(&mapping)
            }
        }
        ArtifactKind::TestSuite => {
            let suite = TestSuite::load(path)?;
            if json {
                serde_json::to_string_pretty(&suite)?
            } else {
                describe_suite(&suite)
            }
        }
        ArtifactKind::InstrumentationResult => {
            serde_json::to_string_pretty(&InstrumentationResult::load(path)?)?
        }
        ArtifactKind::AnalysisResult => serde_json::to_string_pretty(&AnalysisResult::load(path)?)?,
    };
    Ok(text)
}

fn describe_trace(trace: &Trace) -> String {
    let mut out = trace.summary().to_string();
    for (key, value) in trace.metadata() {
        let _ = write!(out, "\n  {key}: {value}");
    }
    out
}

fn describe_mapping(mapping: &IdentifierMapping) -> String {
    let mut out = format!("{} identifiers", mapping.len());
    for identifier in mapping.iter() {
        let _ = write!(
            out,
            "\n  {:>4}  {:<16} {}",
            identifier.internal_id().to_string(),
            identifier.name(),
            identifier.type_name()
        );
    }
    out
}

fn describe_suite(suite: &TestSuite) -> String {
    let mut out = format!(
        "Suite for {}\n  strategy:  {}\n  framework: {}\n  {}",
        suite.target(),
        suite.strategy(),
        suite.framework(),
        suite_counts(suite)
    );
    for warning in suite.warnings() {
        let _ = write!(out, "\n  warning: {warning}");
    }
    out
}

/// Execute the inspect command
pub fn execute_inspect(_config: &CliConfig, args: &InspectArgs) -> CliResult<()> {
    println!("{}", describe(&args.artifact, args.json)?);
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use tracegen::{CapturedValue, IdAllocator, Invocation, MethodIdentifier, ValueIdentifier};

    fn target() -> MethodIdentifier {
        MethodIdentifier::parse("com.example.Counter.add(int)")
            .unwrap()
            .returning("int")
            .unwrap()
    }

    #[test]
    fn test_describe_trace() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("trace.json");
        let mut ids = IdAllocator::new();
        let arg = ValueIdentifier::argument(&mut ids, 0, "int").unwrap();
        let mut trace = Trace::with_invocations(
            target(),
            vec![
                Invocation::new(0).bind_entry(arg.internal_id(), CapturedValue::Int(1)),
                Invocation::new(1).threw("java.lang.IllegalStateException"),
            ],
        );
        trace.set_metadata("run_id", "abc");
        trace.save(&path).unwrap();

        let text = describe(&path, false).unwrap();
        assert!(text.contains("invocations: 2"));
        assert!(text.contains("exceptions:   1"));
        assert!(text.contains("run_id: abc"));

        let json = describe(&path, true).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["invocations"], 2);
    }

    #[test]
    fn test_describe_mapping() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ids.json");
        let mut ids = IdAllocator::new();
        let field =
            ValueIdentifier::field(&mut ids, "com.example.Counter", "count", "int", false).unwrap();
        IdentifierMapping::from_identifiers([&field])
            .unwrap()
            .save(&path)
            .unwrap();
        let text = describe(&path, false).unwrap();
        assert!(text.starts_with("1 identifiers"));
        assert!(text.contains("count"));
    }

    #[test]
    fn test_non_artifact_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("plain.json");
        std::fs::write(&path, "{\"hello\": 1}").unwrap();
        assert!(describe(&path, false)
            .unwrap_err()
            .to_string()
            .contains("not an artifact"));
    }
}
