//! End-to-end: configuration, analysis with a scripted executor, generation
//! and emission.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use pretty_assertions::assert_eq;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracegen::analyzer::RESULTS_LIST_ENV;
use tracegen::prelude::*;
use tracegen::{
    AnalysisResult, CaptureRecord, ExecutionOutcome, ExecutionRequest, InstrumentationResult,
    InternalId, ResultKind, RunConfigurationSpec, TestFramework, WarningKind,
};

struct Ids {
    arg: InternalId,
    field: InternalId,
    ret: InternalId,
}

fn ids_of(config: &RunConfiguration) -> Ids {
    let find = |pred: &dyn Fn(&ValueIdentifier) -> bool| {
        config
            .identifiers()
            .iter()
            .find(|i| pred(i))
            .map(ValueIdentifier::internal_id)
            .expect("identifier")
    };
    Ids {
        arg: find(&|i| i.argument_slot() == Some(0)),
        field: find(&|i| i.is_field()),
        ret: find(&|i| i.requires_after_capture()),
    }
}

fn configure(dir: &Path, trace_mode: &str, strategy: &str) -> RunConfiguration {
    let spec = RunConfigurationSpec {
        return_type: Some("int".into()),
        parameters: vec!["0:int".into()],
        fields: vec!["int:count".into()],
        output_directory: dir.join("analysis"),
        trace_mode: trace_mode.into(),
        strategy: strategy.into(),
        ..RunConfigurationSpec::new("com.example.Counter.add(int)")
    };
    RunConfiguration::from_spec(&spec, &mut IdAllocator::new()).unwrap()
}

fn instrument(dir: &Path, config: &RunConfiguration) -> InstrumentationResult {
    let primary = dir.join("instrumented.jar");
    std::fs::write(&primary, b"jar").unwrap();
    let mapping = dir.join("identifiers-in.json");
    config.identifier_mapping().unwrap().save(&mapping).unwrap();
    InstrumentationResult::new(primary)
        .with_identifiers_mapping(mapping)
        .with_results_list(dir.join("results.txt"))
}

/// Stands in for the instrumented application: writes the given records
/// where the analyzer says the results list lives.
fn scripted(
    records: Vec<CaptureRecord>,
) -> impl Fn(&ExecutionRequest) -> TracegenResult<ExecutionOutcome> + Send + Sync {
    move |req: &ExecutionRequest| -> TracegenResult<ExecutionOutcome> {
        let list = req
            .env
            .iter()
            .find(|(k, _)| k == RESULTS_LIST_ENV)
            .map(|(_, v)| PathBuf::from(v))
            .expect("results list env");
        let dir = list.parent().expect("list dir").to_path_buf();
        let mut lines = String::from("# records\n");
        for record in &records {
            let name = format!("inv-{}.bin", record.invocation);
            record.write_to(&dir.join(&name))?;
            lines.push_str(&name);
            lines.push('\n');
        }
        std::fs::write(&list, lines)?;
        Ok(ExecutionOutcome::success())
    }
}

fn load(analysis: &AnalysisResult) -> (Trace, IdentifierMapping) {
    (
        Trace::load(&analysis.trace_path).unwrap(),
        IdentifierMapping::load(&analysis.identifiers_mapping_path).unwrap(),
    )
}

#[test]
fn naive_pipeline_writes_junit5_class() {
    let dir = TempDir::new().unwrap();
    let config = configure(dir.path(), "naive", "trace-based-basic");
    let ids = ids_of(&config);
    let records = vec![
        CaptureRecord::new(0)
            .entry(ids.arg, CapturedValue::Int(1))
            .entry(ids.field, CapturedValue::Int(0))
            .exit(ids.ret, CapturedValue::Int(1)),
        CaptureRecord::new(1)
            .entry(ids.arg, CapturedValue::Int(1))
            .entry(ids.field, CapturedValue::Int(0))
            .exit(ids.ret, CapturedValue::Int(1)),
        CaptureRecord::new(2)
            .entry(ids.arg, CapturedValue::Int(-4))
            .entry(ids.field, CapturedValue::Int(1))
            .threw("java.lang.IllegalArgumentException"),
    ];

    let result = instrument(dir.path(), &config);
    let analyzer = TraceAnalyzer::with_executor(config.clone(), scripted(records));
    let analysis = analyzer.execute_analysis(&result).unwrap();
    let (trace, mapping) = load(&analysis);
    assert_eq!(trace.len(), 3);

    let registry = StrategyRegistry::new();
    let generator = registry.generator(config.options().strategy).unwrap();
    let context = GenerationContext::new(
        config.target().clone(),
        dir.path().join("src/test/java"),
        GenerationOptions::default(),
    )
    .unwrap();
    let suite = generator.generate(&trace, &mapping, &context).unwrap();
    assert_eq!(suite.len(), 2);
    assert_eq!(
        suite.outcome_counts(),
        [
            (ResultKind::Normal, 1),
            (ResultKind::Void, 0),
            (ResultKind::Exception, 1)
        ]
    );

    let report = write_suite(&suite, context.output_directory(), "tracegen emit").unwrap();
    assert_eq!(report.test_count, 2);
    assert!(report.warnings.is_empty());
    let source = std::fs::read_to_string(&report.path).unwrap();
    assert!(source.contains("package com.example;"));
    assert!(source.contains("class CounterAddGeneratedTest {"));
    assert!(source.contains("setField(receiver, \"count\", 0);"));
    assert!(source.contains("Assertions.assertEquals(1, actual);"));
    assert!(source.contains("Assertions.assertThrows(IllegalArgumentException.class, () -> receiver.add(arg0_"));
}

#[test]
fn temporal_pipeline_asserts_state_changes() {
    let dir = TempDir::new().unwrap();
    let config = configure(dir.path(), "temporal", "trace-based-advanced");
    let ids = ids_of(&config);
    let records = (0..4u64)
        .map(|i| {
            let before = i32::try_from(i).unwrap();
            CaptureRecord::new(i)
                .with_identity(42)
                .entry(ids.arg, CapturedValue::Int(1))
                .entry(ids.field, CapturedValue::Int(before))
                .exit(ids.field, CapturedValue::Int(before + 1))
                .exit(ids.ret, CapturedValue::Int(before + 1))
        })
        .collect();

    let result = instrument(dir.path(), &config);
    let analysis = TraceAnalyzer::with_executor(config.clone(), scripted(records))
        .execute_analysis(&result)
        .unwrap();
    let (trace, mapping) = load(&analysis);

    let options = GenerationOptions {
        test_framework: TestFramework::JUnit4,
        max_state_change_samples: Limit::new(2),
        ..GenerationOptions::default()
    };
    let context = GenerationContext::new(config.target().clone(), "unused", options).unwrap();
    let suite = StrategyRegistry::new()
        .generator(config.options().strategy)
        .unwrap()
        .generate(&trace, &mapping, &context)
        .unwrap();
    let kept: Vec<u64> = suite.scenarios().iter().map(|s| s.provenance).collect();
    assert_eq!(kept, [0, 3]);
    assert!(suite
        .warnings()
        .iter()
        .any(|w| w.kind == WarningKind::LimitReached));

    let emitted = render_suite(&suite).unwrap();
    assert!(emitted.source.contains("// invocation 3 on receiver #42"));
    assert!(emitted.source.contains("// count: 1 -> 4"));
    assert!(emitted
        .source
        .contains("Assert.assertEquals(4, readField(receiver, \"count\"));"));
}

#[test]
fn suite_survives_persistence() {
    let dir = TempDir::new().unwrap();
    let config = configure(dir.path(), "naive", "trace-based-basic");
    let ids = ids_of(&config);
    let trace = Trace::with_invocations(
        config.target().clone(),
        vec![Invocation::new(0)
            .bind_entry(ids.arg, CapturedValue::Int(2))
            .bind_exit(ids.ret, CapturedValue::Int(2))],
    );
    let mapping = config.identifier_mapping().unwrap();
    let context = GenerationContext::new(
        config.target().clone(),
        "out",
        GenerationOptions::default(),
    )
    .unwrap();
    let suite = tracegen::NaiveGenerator
        .generate(&trace, &mapping, &context)
        .unwrap();

    let path = dir.path().join("suite.json");
    suite.save(&path).unwrap();
    let loaded = TestSuite::load(&path).unwrap();
    assert_eq!(loaded, suite);
    assert_eq!(
        render_suite(&loaded).unwrap().source,
        render_suite(&suite).unwrap().source
    );
}
