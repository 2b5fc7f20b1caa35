//! Java test classes from a [`TestSuite`].
//!
//! One class per suite, named `<SimpleClass><Method>GeneratedTest` and placed
//! in the target's package. Each scenario becomes one test method that
//! arranges the receiver and the captured fields, calls the target with the
//! captured arguments and asserts the observed outcome.
//!
//! Values the emitter cannot rebuild still produce a test: the assertion is
//! weakened and a [`GenerationWarning`] is reported alongside the source.

mod framework;
mod literal;
mod naming;
mod support;

use crate::config::EqualityStrategy;
use crate::identifier::{source_class, ValueKind};
use crate::method::MethodIdentifier;
use crate::result::TracegenResult;
use crate::scenario::{
    FieldDelta, GenerationWarning, Outcome, TestScenario, TestSuite, ValueBinding, WarningKind,
};
use crate::value::{CapturedValue, ObjectSnapshot};
use framework::Idiom;
use naming::MethodNamer;
use std::path::{Path, PathBuf};
use support::Helpers;
use tracegen_javagen::{
    render, write_with_manifest, Annotation, ClassBuilder, CompilationUnitBuilder, Expr,
    FileManifest, GenerationMetadata, Identifier, JavaMethod, MethodBuilder, Stmt, TypeRef,
};

/// Suffix of every generated test class.
pub const TEST_CLASS_SUFFIX: &str = "GeneratedTest";

const TOOL: &str = "tracegen";
const RECEIVER: &str = "receiver";
const ACTUAL: &str = "actual";

/// Simple names the generated class imports; same-package types with these
/// names stay qualified.
const IMPORTED_NAMES: &[&str] = &["Test", "Assertions", "Assert", "Constructor", "Field"];

/// `CounterAddGeneratedTest` for `com.example.Counter.add(int)`.
#[must_use]
pub fn test_class_name(target: &MethodIdentifier) -> String {
    let simple = target.simple_class_name();
    let simple = simple.rsplit('$').next().unwrap_or(simple);
    let name = format!(
        "{simple}{}{TEST_CLASS_SUFFIX}",
        naming::capitalize(target.method_name())
    );
    Identifier::sanitize(&name).to_string()
}

/// A rendered, not yet written, test class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmittedSuite {
    /// Class name
    pub class_name: String,
    /// Path below the test source root, e.g. `com/example/FooBarGeneratedTest.java`
    pub relative_path: PathBuf,
    /// Java source
    pub source: String,
    /// Number of test methods
    pub test_count: usize,
    /// Values that could only be emitted approximately
    pub warnings: Vec<GenerationWarning>,
}

/// Outcome of [`write_suite`].
#[derive(Debug, Clone)]
pub struct EmitReport {
    /// Written source file
    pub path: PathBuf,
    /// Manifest stored next to it
    pub manifest: FileManifest,
    /// Where the manifest was written
    pub manifest_path: PathBuf,
    /// Number of test methods
    pub test_count: usize,
    /// Values that could only be emitted approximately
    pub warnings: Vec<GenerationWarning>,
}

/// Render a suite without a generation header. Deterministic.
pub fn render_suite(suite: &TestSuite) -> TracegenResult<EmittedSuite> {
    emit(suite, None)
}

/// Render a suite with a generation header and write it below
/// `source_root`, together with its manifest.
pub fn write_suite(
    suite: &TestSuite,
    source_root: &Path,
    regenerate_cmd: &str,
) -> TracegenResult<EmitReport> {
    let input = serde_json::to_vec(suite)?;
    let metadata = GenerationMetadata::now(TOOL, env!("CARGO_PKG_VERSION"), &input, regenerate_cmd);
    let emitted = emit(suite, Some(metadata.clone()))?;
    let path = source_root.join(&emitted.relative_path);
    let manifest = write_with_manifest(&path, &emitted.source, metadata)?;
    tracing::info!(
        path = %path.display(),
        tests = emitted.test_count,
        warnings = emitted.warnings.len(),
        "test class written"
    );
    let manifest_path = FileManifest::path_for(&path);
    Ok(EmitReport {
        path,
        manifest,
        manifest_path,
        test_count: emitted.test_count,
        warnings: emitted.warnings,
    })
}

fn emit(suite: &TestSuite, metadata: Option<GenerationMetadata>) -> TracegenResult<EmittedSuite> {
    let target = suite.target();
    let idiom = Idiom::new(suite.framework());
    let mut emitter = ClassEmitter {
        target,
        package: target.package_name(),
        idiom,
        equality: suite.equality_strategy(),
        helpers: Helpers::default(),
        warnings: Vec::new(),
    };
    let mut namer = MethodNamer::new(suite.naming_strategy());

    let mut methods = Vec::with_capacity(suite.len());
    for (i, scenario) in suite.scenarios().iter().enumerate() {
        let name = namer.name(scenario, i + 1);
        methods.push(emitter.test_method(&name, scenario)?);
    }
    let test_count = methods.len();
    let helpers = emitter.helpers;
    methods.extend(helpers.methods()?);

    let class_name = test_class_name(target);
    let class = ClassBuilder::new(class_name.as_str())?
        .visibility(idiom.visibility())
        .javadoc(format!(
            "Generated from captured invocations of {{@code {}}}.\nStrategy: {}, scenarios: {test_count}.",
            target.signature(),
            suite.strategy()
        ))
        .methods(methods)
        .build();

    let mut unit = CompilationUnitBuilder::new();
    if let Some(package) = target.package_name() {
        unit = unit.package(package)?;
    }
    unit = unit
        .import(idiom.test_annotation())?
        .import(idiom.assertions())?;
    for import in helpers.imports() {
        unit = unit.import(import)?;
    }
    if let Some(metadata) = metadata {
        unit = unit.metadata(metadata);
    }
    let unit = unit.class(class).build();

    tracing::debug!(
        class = %class_name,
        tests = test_count,
        warnings = emitter.warnings.len(),
        "suite rendered"
    );
    Ok(EmittedSuite {
        relative_path: unit.relative_path()?,
        source: render(&unit),
        class_name,
        test_count,
        warnings: emitter.warnings,
    })
}

/// Statements of one test method under construction.
struct Body {
    stmts: Vec<Stmt>,
    objects: usize,
    provenance: u64,
}

impl Body {
    fn push(&mut self, stmt: Stmt) {
        self.stmts.push(stmt);
    }

    fn next_object_local(&mut self) -> String {
        self.objects += 1;
        format!("object{}", self.objects)
    }
}

struct ClassEmitter<'s> {
    target: &'s MethodIdentifier,
    package: Option<&'s str>,
    idiom: Idiom,
    equality: EqualityStrategy,
    helpers: Helpers,
    warnings: Vec<GenerationWarning>,
}

impl ClassEmitter<'_> {
    fn test_method(&mut self, name: &str, scenario: &TestScenario) -> TracegenResult<JavaMethod> {
        let target = self.target;
        let mut body = Body {
            stmts: Vec::new(),
            objects: 0,
            provenance: scenario.provenance,
        };
        body.push(Stmt::comment(origin(scenario)));
        for delta in &scenario.state_delta {
            body.push(Stmt::comment(describe_delta(delta)));
        }

        let owner = self.source_type(target.class_name());
        let callee = if target.is_static() {
            Expr::type_name(owner.as_str())?
        } else {
            self.helpers.instantiate = true;
            body.push(Stmt::local(
                owner.as_str(),
                RECEIVER,
                Expr::invoke(
                    support::INSTANTIATE,
                    vec![Expr::class_literal(owner.as_str())?],
                )?,
            )?);
            Expr::ident(RECEIVER)?
        };
        for binding in &scenario.fields {
            self.arrange_field(&mut body, binding)?;
        }
        let args = self.arguments(&mut body, scenario)?;
        let call = callee.call(target.method_name(), args)?;

        match &scenario.outcome {
            Outcome::Returned { binding } => {
                let declared = declared_return(binding, target);
                body.push(Stmt::local(self.source_type(declared), ACTUAL, call)?);
                self.assert_value(
                    &mut body,
                    &binding.value,
                    Expr::ident(ACTUAL)?,
                    literal::is_floating(declared),
                    "return value",
                )?;
            }
            Outcome::Void => body.push(Stmt::expr(call)),
            Outcome::Threw { exception } => {
                let class = self.exception_type(&body, exception.as_deref());
                let assertion = self
                    .idiom
                    .assert_throws(Expr::class_literal(class)?, call)?;
                body.push(Stmt::expr(assertion));
            }
        }
        self.assert_post_state(&mut body, scenario)?;

        Ok(MethodBuilder::new(name)?
            .visibility(self.idiom.visibility())
            .annotate(Annotation::marker("Test")?)
            .throws("Exception")?
            .stmts(body.stmts)
            .build())
    }

    fn arrange_field(&mut self, body: &mut Body, binding: &ValueBinding) -> TracegenResult<()> {
        let ValueKind::Field {
            owner,
            field_name,
            is_static,
        } = binding.identifier.kind()
        else {
            return Ok(());
        };
        if !is_static && self.target.is_static() {
            self.warn(
                body,
                WarningKind::UnrenderableValue,
                format!("instance field {field_name} has no receiver in a static call; not arranged"),
            );
            return Ok(());
        }
        let value = self.value_expr(body, &binding.value, field_name)?;
        let call = if *is_static {
            self.helpers.set_static_field = true;
            Expr::invoke(
                support::SET_STATIC_FIELD,
                vec![
                    Expr::class_literal(self.source_type(owner))?,
                    Expr::str(field_name.as_str()),
                    value,
                ],
            )?
        } else {
            self.helpers.set_field = true;
            Expr::invoke(
                support::SET_FIELD,
                vec![Expr::ident(RECEIVER)?, Expr::str(field_name.as_str()), value],
            )?
        };
        body.push(Stmt::expr(call));
        Ok(())
    }

    /// One expression per declared parameter. Slots without a captured value
    /// get the zero value of their type.
    fn arguments(&mut self, body: &mut Body, scenario: &TestScenario) -> TracegenResult<Vec<Expr>> {
        let target = self.target;
        let mut args = Vec::with_capacity(target.parameter_types().len());
        for (slot, declared) in target.parameter_types().iter().enumerate() {
            let bound = scenario.arguments.iter().find(|b| {
                b.identifier
                    .argument_slot()
                    .and_then(|s| usize::try_from(s).ok())
                    == Some(slot)
            });
            let Some(binding) = bound else {
                self.warn(
                    body,
                    WarningKind::UnrenderableValue,
                    format!("argument {slot} was not captured; passing the zero value of {declared}"),
                );
                let zero = literal::default_for(declared)?;
                args.push(if matches!(zero, Expr::Null) {
                    zero.cast(self.source_type(declared))?
                } else {
                    zero
                });
                continue;
            };
            let ty = match binding.identifier.type_name() {
                "" => declared.as_str(),
                ty => ty,
            };
            let value = self.value_expr(body, &binding.value, &binding.identifier.name())?;
            let local = binding.identifier.local_name();
            body.push(Stmt::local(self.source_type(ty), local.as_str(), value)?);
            args.push(Expr::ident(local)?);
        }
        Ok(args)
    }

    /// Field values observed at exit, for fields the scenario's delta
    /// reports as added or changed.
    fn assert_post_state(
        &mut self,
        body: &mut Body,
        scenario: &TestScenario,
    ) -> TracegenResult<()> {
        for delta in &scenario.state_delta {
            if matches!(delta, FieldDelta::Removed { .. }) {
                continue;
            }
            let id = delta.binding().identifier.internal_id();
            let Some(after) = scenario
                .post_state
                .iter()
                .find(|b| b.identifier.internal_id() == id)
            else {
                continue;
            };
            let ValueKind::Field {
                owner,
                field_name,
                is_static,
            } = after.identifier.kind()
            else {
                continue;
            };
            let read = if *is_static {
                self.helpers.read_static_field = true;
                Expr::invoke(
                    support::READ_STATIC_FIELD,
                    vec![
                        Expr::class_literal(self.source_type(owner))?,
                        Expr::str(field_name.as_str()),
                    ],
                )?
            } else if self.target.is_static() {
                continue;
            } else {
                self.helpers.read_field = true;
                Expr::invoke(
                    support::READ_FIELD,
                    vec![Expr::ident(RECEIVER)?, Expr::str(field_name.as_str())],
                )?
            };
            self.assert_value(body, &after.value, read, false, field_name)?;
        }
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Values
    // ------------------------------------------------------------------------

    fn value_expr(
        &mut self,
        body: &mut Body,
        value: &CapturedValue,
        context: &str,
    ) -> TracegenResult<Expr> {
        if let Some(lit) = literal::scalar(value)? {
            return Ok(lit);
        }
        if let CapturedValue::Object(snapshot) = value {
            if let Some(object) = self.build_object(body, snapshot, context)? {
                return Ok(object);
            }
        }
        self.warn(
            body,
            WarningKind::UnrenderableValue,
            format!("{context}: cannot rebuild {value}; passing null"),
        );
        Ok(Expr::null())
    }

    /// Instantiate the snapshot's class and set each captured field.
    /// `None` when the class cannot be named in source.
    fn build_object(
        &mut self,
        body: &mut Body,
        snapshot: &ObjectSnapshot,
        context: &str,
    ) -> TracegenResult<Option<Expr>> {
        let Some(class) = self.nameable(&snapshot.class_name) else {
            return Ok(None);
        };
        let local = body.next_object_local();
        self.helpers.instantiate = true;
        body.push(Stmt::local(
            class.as_str(),
            local.as_str(),
            Expr::invoke(
                support::INSTANTIATE,
                vec![Expr::class_literal(class.as_str())?],
            )?,
        )?);
        for field in &snapshot.fields {
            let value =
                self.value_expr(body, &field.value, &format!("{context}.{}", field.name))?;
            self.helpers.set_field = true;
            body.push(Stmt::expr(Expr::invoke(
                support::SET_FIELD,
                vec![Expr::ident(local.as_str())?, Expr::str(field.name.as_str()), value],
            )?));
        }
        Ok(Some(Expr::ident(local)?))
    }

    /// `exact_float` selects the delta overload; it only resolves when the
    /// actual expression has a floating-point static type.
    fn assert_value(
        &mut self,
        body: &mut Body,
        expected: &CapturedValue,
        actual: Expr,
        exact_float: bool,
        context: &str,
    ) -> TracegenResult<()> {
        let assertion = match (literal::scalar(expected)?, expected) {
            (Some(_), CapturedValue::Null) => self.idiom.assert_null(actual)?,
            (Some(lit), CapturedValue::Float(_) | CapturedValue::Double(_)) if exact_float => {
                self.idiom.assert_equals_exact(lit, actual)?
            }
            (Some(lit), _) => self.idiom.assert_equals(lit, actual)?,
            (None, CapturedValue::Object(snapshot)) => {
                return self.assert_object(body, snapshot, actual, context);
            }
            (None, _) => {
                self.warn(
                    body,
                    WarningKind::UnsupportedEquality,
                    format!("{context}: {expected} cannot be compared; asserting non-null only"),
                );
                self.idiom.assert_not_null(actual)?
            }
        };
        body.push(Stmt::expr(assertion));
        Ok(())
    }

    fn assert_object(
        &mut self,
        body: &mut Body,
        snapshot: &ObjectSnapshot,
        actual: Expr,
        context: &str,
    ) -> TracegenResult<()> {
        let strategy = if self.nameable(&snapshot.class_name).is_some() {
            self.equality
        } else {
            self.warn(
                body,
                WarningKind::UnsupportedEquality,
                format!(
                    "{context}: {} cannot be named in source; comparing field by field",
                    snapshot.class_name
                ),
            );
            EqualityStrategy::FieldByField
        };
        match strategy {
            EqualityStrategy::AssertEquals | EqualityStrategy::ToString => {
                let Some(expected) = self.build_object(body, snapshot, context)? else {
                    return Ok(());
                };
                let assertion = if strategy == EqualityStrategy::ToString {
                    self.idiom.assert_equals(string_value_of(expected)?, string_value_of(actual)?)?
                } else {
                    self.idiom.assert_equals(expected, actual)?
                };
                body.push(Stmt::expr(assertion));
            }
            EqualityStrategy::FieldByField => {
                body.push(Stmt::expr(self.idiom.assert_not_null(actual.clone())?));
                for field in &snapshot.fields {
                    self.helpers.read_field = true;
                    let read = Expr::invoke(
                        support::READ_FIELD,
                        vec![actual.clone(), Expr::str(field.name.as_str())],
                    )?;
                    let context = format!("{context}.{}", field.name);
                    self.assert_value(body, &field.value, read, false, &context)?;
                }
            }
        }
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Types
    // ------------------------------------------------------------------------

    /// Source spelling of a binary class name. Types from the target's
    /// package and top-level `java.lang` types are written unqualified.
    fn source_type(&self, binary: &str) -> String {
        let source = source_class(binary.trim());
        let short = self
            .package
            .and_then(|p| source.strip_prefix(p))
            .and_then(|rest| rest.strip_prefix('.'))
            .or_else(|| source.strip_prefix("java.lang."))
            .filter(|rest| rest.starts_with(|c: char| c.is_ascii_uppercase()))
            .filter(|rest| {
                let simple = rest.split(['.', '<', '[']).next().unwrap_or_default();
                !IMPORTED_NAMES.contains(&simple)
            });
        short.map_or_else(|| source.clone(), str::to_string)
    }

    /// Source type for a class the tests instantiate, if it can be written.
    fn nameable(&self, binary: &str) -> Option<String> {
        let ty = self.source_type(binary);
        let valid = TypeRef::new(ty.as_str()).is_ok_and(|t| !t.is_primitive());
        (valid && !ty.ends_with(']')).then_some(ty)
    }

    fn exception_type(&mut self, body: &Body, exception: Option<&str>) -> String {
        let Some(class) = exception else {
            return "Throwable".to_string();
        };
        if let Some(ty) = self.nameable(class) {
            return ty;
        }
        self.warn(
            body,
            WarningKind::UnrenderableValue,
            format!("exception {class} cannot be named in source; expecting Throwable"),
        );
        "Throwable".to_string()
    }

    fn warn(&mut self, body: &Body, kind: WarningKind, message: String) {
        let warning = GenerationWarning::new(kind, message).at(body.provenance);
        tracing::debug!(%warning, "approximate emission");
        self.warnings.push(warning);
    }
}

fn declared_return<'a>(binding: &'a ValueBinding, target: &'a MethodIdentifier) -> &'a str {
    match (binding.identifier.type_name(), target.return_type()) {
        ("", "") => "Object",
        ("", declared) | (declared, _) => declared,
    }
}

fn string_value_of(expr: Expr) -> TracegenResult<Expr> {
    Ok(Expr::type_name("String")?.call("valueOf", vec![expr])?)
}

fn origin(scenario: &TestScenario) -> String {
    match scenario.identity {
        Some(identity) => format!(
            "invocation {} on receiver #{identity}",
            scenario.provenance
        ),
        None => format!("invocation {}", scenario.provenance),
    }
}

fn describe_delta(delta: &FieldDelta) -> String {
    match delta {
        FieldDelta::Added { field } => {
            format!("{} observed as {}", field.identifier.name(), field.value)
        }
        FieldDelta::Removed { field } => format!(
            "{} no longer observed (was {})",
            field.identifier.name(),
            field.value
        ),
        FieldDelta::Changed { field, previous } => format!(
            "{}: {previous} -> {}",
            field.identifier.name(),
            field.value
        ),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::config::{NamingStrategy, TestFramework};
    use crate::generator::GenerationStrategy;
    use crate::identifier::{IdAllocator, ValueIdentifier};
    use crate::value::SnapshotField;

    struct Fixture {
        target: MethodIdentifier,
        arg: ValueIdentifier,
        field: ValueIdentifier,
        ret: ValueIdentifier,
    }

    /// `int com.example.Counter.add(int)` with instance field `count`.
    fn counter() -> Fixture {
        counter_returning("int")
    }

    fn counter_returning(ty: &str) -> Fixture {
        let mut ids = IdAllocator::new();
        let target = MethodIdentifier::parse("com.example.Counter.add(int)")
            .unwrap()
            .returning(ty)
            .unwrap();
        Fixture {
            arg: ValueIdentifier::argument(&mut ids, 0, "int").unwrap(),
            field: ValueIdentifier::field(&mut ids, "com.example.Counter", "count", "int", false)
                .unwrap(),
            ret: ValueIdentifier::return_value(&mut ids, &target).unwrap(),
            target,
        }
    }

    impl Fixture {
        fn scenario(&self, provenance: u64, arg: i32, outcome: Outcome) -> TestScenario {
            TestScenario {
                target: self.target.clone(),
                arguments: vec![ValueBinding::new(self.arg.clone(), CapturedValue::Int(arg))],
                fields: Vec::new(),
                outcome,
                provenance,
                identity: None,
                state_delta: Vec::new(),
                post_state: Vec::new(),
            }
        }

        fn returned(&self, value: CapturedValue) -> Outcome {
            Outcome::Returned {
                binding: ValueBinding::new(self.ret.clone(), value),
            }
        }

        fn suite(
            &self,
            framework: TestFramework,
            equality: EqualityStrategy,
            scenarios: Vec<TestScenario>,
        ) -> TestSuite {
            TestSuite::new(
                self.target.clone(),
                GenerationStrategy::TraceBasedBasic,
                framework,
                NamingStrategy::Descriptive,
                equality,
                scenarios,
            )
        }
    }

    fn point(x: i32, y: i32) -> CapturedValue {
        CapturedValue::Object(ObjectSnapshot {
            class_name: "com.example.Point".into(),
            fields: vec![
                SnapshotField {
                    name: "x".into(),
                    value: CapturedValue::Int(x),
                },
                SnapshotField {
                    name: "y".into(),
                    value: CapturedValue::Int(y),
                },
            ],
        })
    }

    // ========================================================================
    // Class layout
    // ========================================================================

    mod layout {
        use super::*;
        use pretty_assertions::assert_eq;

        #[test]
        fn test_class_name_layout() {
            let target = MethodIdentifier::parse("com.example.Outer$Inner.run()").unwrap();
            assert_eq!(test_class_name(&target), "InnerRunGeneratedTest");
            assert_eq!(test_class_name(&counter().target), "CounterAddGeneratedTest");
        }

        #[test]
        fn test_static_target_full_source() {
            let mut ids = IdAllocator::new();
            let target = MethodIdentifier::parse("com.example.MathUtil.twice(int)")
                .unwrap()
                .returning("int")
                .unwrap()
                .as_static(true);
            let arg = ValueIdentifier::argument(&mut ids, 0, "int").unwrap();
            let ret = ValueIdentifier::return_value(&mut ids, &target).unwrap();
            let scenario = TestScenario {
                target: target.clone(),
                arguments: vec![ValueBinding::new(arg, CapturedValue::Int(21))],
                fields: Vec::new(),
                outcome: Outcome::Returned {
                    binding: ValueBinding::new(ret, CapturedValue::Int(42)),
                },
                provenance: 0,
                identity: None,
                state_delta: Vec::new(),
                post_state: Vec::new(),
            };
            let suite = TestSuite::new(
                target,
                GenerationStrategy::TraceBasedBasic,
                TestFramework::JUnit5,
                NamingStrategy::Descriptive,
                EqualityStrategy::AssertEquals,
                vec![scenario],
            );

            let emitted = render_suite(&suite).unwrap();
            let expected = "\
package com.example;

import org.junit.jupiter.api.Assertions;
import org.junit.jupiter.api.Test;

/**
 * Generated from captured invocations of {@code com.example.MathUtil.twice(int)}.
 * Strategy: trace-based-basic, scenarios: 1.
 */
class MathUtilTwiceGeneratedTest {
    @Test
    void twiceReturnsValueInvocation0() throws Exception {
        // invocation 0
        int arg0_1 = 21;
        int actual = MathUtil.twice(arg0_1);
        Assertions.assertEquals(42, actual);
    }
}
";
            assert_eq!(emitted.source, expected);
            assert_eq!(
                emitted.relative_path,
                PathBuf::from("com/example/MathUtilTwiceGeneratedTest.java")
            );
            assert_eq!(emitted.test_count, 1);
            assert!(emitted.warnings.is_empty());
        }

        #[test]
        fn test_instance_target_arranges_receiver_and_fields() {
            let fx = counter();
            let mut scenario = fx.scenario(2, 1, fx.returned(CapturedValue::Int(4)));
            scenario.fields = vec![ValueBinding::new(fx.field.clone(), CapturedValue::Int(3))];
            let suite = fx.suite(
                TestFramework::JUnit4,
                EqualityStrategy::AssertEquals,
                vec![scenario],
            );

            let source = render_suite(&suite).unwrap().source;
            assert!(source.contains("public class CounterAddGeneratedTest {"));
            assert!(source.contains("    @Test\n    public void addReturnsValueInvocation2() throws Exception {"));
            assert!(source.contains("Counter receiver = instantiate(Counter.class);"));
            assert!(source.contains("setField(receiver, \"count\", 3);"));
            assert!(source.contains("int actual = receiver.add(arg0_1);"));
            assert!(source.contains("Assert.assertEquals(4, actual);"));
            assert!(source.contains("import java.lang.reflect.Constructor;"));
            assert!(source.contains("import java.lang.reflect.Field;"));
            assert!(source.contains("private static void setField(Object target, String name, Object value)"));
            assert!(!source.contains("readField"));
        }

        #[test]
        fn test_sequential_naming() {
            let fx = counter();
            let scenarios = vec![
                fx.scenario(0, 1, fx.returned(CapturedValue::Int(1))),
                fx.scenario(1, 2, fx.returned(CapturedValue::Int(3))),
            ];
            let suite = TestSuite::new(
                fx.target.clone(),
                GenerationStrategy::TraceBasedBasic,
                TestFramework::JUnit5,
                NamingStrategy::Sequential,
                EqualityStrategy::AssertEquals,
                scenarios,
            );
            let source = render_suite(&suite).unwrap().source;
            assert!(source.contains("void testAdd1() throws Exception"));
            assert!(source.contains("void testAdd2() throws Exception"));
        }
    }

    // ========================================================================
    // Outcomes
    // ========================================================================

    mod outcomes {
        use super::*;

        #[test]
        fn test_void_has_no_assertion() {
            let fx = counter_returning("void");
            let suite = fx.suite(
                TestFramework::JUnit5,
                EqualityStrategy::AssertEquals,
                vec![fx.scenario(0, 1, Outcome::Void)],
            );
            let source = render_suite(&suite).unwrap().source;
            assert!(source.contains("        receiver.add(arg0_1);\n"));
            assert!(!source.contains("Assertions.assert"));
        }

        #[test]
        fn test_known_exception_is_asserted() {
            let fx = counter();
            let threw = Outcome::Threw {
                exception: Some("java.lang.ArithmeticException".into()),
            };
            let suite = fx.suite(
                TestFramework::TestNg,
                EqualityStrategy::AssertEquals,
                vec![fx.scenario(5, 0, threw)],
            );
            let source = render_suite(&suite).unwrap().source;
            assert!(source.contains(
                "Assert.assertThrows(ArithmeticException.class, () -> receiver.add(arg0_1));"
            ));
            assert!(source.contains("import org.testng.annotations.Test;"));
            assert!(source.contains("public void addThrowsArithmeticExceptionInvocation5()"));
        }

        #[test]
        fn test_unknown_exception_expects_throwable() {
            let fx = counter();
            let suite = fx.suite(
                TestFramework::JUnit5,
                EqualityStrategy::AssertEquals,
                vec![fx.scenario(1, 0, Outcome::Threw { exception: None })],
            );
            let source = render_suite(&suite).unwrap().source;
            assert!(source.contains(
                "Assertions.assertThrows(Throwable.class, () -> receiver.add(arg0_1));"
            ));
        }

        #[test]
        fn test_testng_reverses_expected_and_actual() {
            let fx = counter();
            let suite = fx.suite(
                TestFramework::TestNg,
                EqualityStrategy::AssertEquals,
                vec![fx.scenario(0, 1, fx.returned(CapturedValue::Int(9)))],
            );
            let source = render_suite(&suite).unwrap().source;
            assert!(source.contains("Assert.assertEquals(actual, 9);"));
        }

        #[test]
        fn test_floating_return_uses_exact_delta() {
            let fx = counter_returning("double");
            let suite = fx.suite(
                TestFramework::JUnit5,
                EqualityStrategy::AssertEquals,
                vec![fx.scenario(0, 1, fx.returned(CapturedValue::Double(f64::NAN)))],
            );
            let source = render_suite(&suite).unwrap().source;
            assert!(source.contains("double actual = receiver.add(arg0_1);"));
            assert!(source.contains("Assertions.assertEquals(Double.NaN, actual, 0.0);"));
        }

        #[test]
        fn test_null_return_uses_assert_null() {
            let fx = counter_returning("java.lang.String");
            let suite = fx.suite(
                TestFramework::JUnit5,
                EqualityStrategy::AssertEquals,
                vec![fx.scenario(0, 1, fx.returned(CapturedValue::Null))],
            );
            let source = render_suite(&suite).unwrap().source;
            assert!(source.contains("String actual = receiver.add(arg0_1);"));
            assert!(source.contains("Assertions.assertNull(actual);"));
        }
    }

    // ========================================================================
    // Composite values
    // ========================================================================

    mod composites {
        use super::*;

        fn point_suite(equality: EqualityStrategy) -> EmittedSuite {
            let fx = counter_returning("com.example.Point");
            let suite = fx.suite(
                TestFramework::JUnit5,
                equality,
                vec![fx.scenario(0, 1, fx.returned(point(1, 2)))],
            );
            render_suite(&suite).unwrap()
        }

        #[test]
        fn test_assert_equals_rebuilds_expected() {
            let emitted = point_suite(EqualityStrategy::AssertEquals);
            let source = &emitted.source;
            assert!(source.contains("Point object1 = instantiate(Point.class);"));
            assert!(source.contains("setField(object1, \"x\", 1);"));
            assert!(source.contains("setField(object1, \"y\", 2);"));
            assert!(source.contains("Assertions.assertEquals(object1, actual);"));
            assert!(emitted.warnings.is_empty());
        }

        #[test]
        fn test_field_by_field_reads_each_field() {
            let source = point_suite(EqualityStrategy::FieldByField).source;
            assert!(source.contains("Assertions.assertNotNull(actual);"));
            assert!(source.contains("Assertions.assertEquals(1, readField(actual, \"x\"));"));
            assert!(source.contains("Assertions.assertEquals(2, readField(actual, \"y\"));"));
            assert!(!source.contains("object1"));
        }

        #[test]
        fn test_to_string_compares_renderings() {
            let source = point_suite(EqualityStrategy::ToString).source;
            assert!(source.contains(
                "Assertions.assertEquals(String.valueOf(object1), String.valueOf(actual));"
            ));
        }

        #[test]
        fn test_object_argument_built_reflectively() {
            let mut ids = IdAllocator::new();
            let target = MethodIdentifier::parse("com.example.Geometry.norm(com.example.Point)")
                .unwrap()
                .returning("int")
                .unwrap()
                .as_static(true);
            let arg = ValueIdentifier::argument(&mut ids, 0, "com.example.Point").unwrap();
            let ret = ValueIdentifier::return_value(&mut ids, &target).unwrap();
            let scenario = TestScenario {
                target: target.clone(),
                arguments: vec![ValueBinding::new(arg, point(3, 4))],
                fields: Vec::new(),
                outcome: Outcome::Returned {
                    binding: ValueBinding::new(ret, CapturedValue::Int(5)),
                },
                provenance: 0,
                identity: None,
                state_delta: Vec::new(),
                post_state: Vec::new(),
            };
            let suite = TestSuite::new(
                target,
                GenerationStrategy::TraceBasedBasic,
                TestFramework::JUnit5,
                NamingStrategy::Descriptive,
                EqualityStrategy::AssertEquals,
                vec![scenario],
            );
            let source = render_suite(&suite).unwrap().source;
            assert!(source.contains("Point object1 = instantiate(Point.class);"));
            assert!(source.contains("Point arg0_1 = object1;"));
            assert!(source.contains("int actual = Geometry.norm(arg0_1);"));
        }

        #[test]
        fn test_opaque_return_warns_and_asserts_non_null() {
            let fx = counter_returning("java.lang.Object");
            let reference = CapturedValue::Reference {
                class_name: "java.lang.Object[]".into(),
            };
            let suite = fx.suite(
                TestFramework::JUnit5,
                EqualityStrategy::AssertEquals,
                vec![fx.scenario(6, 1, fx.returned(reference))],
            );
            let emitted = render_suite(&suite).unwrap();
            assert!(emitted.source.contains("Object actual = receiver.add(arg0_1);"));
            assert!(emitted.source.contains("Assertions.assertNotNull(actual);"));
            assert_eq!(emitted.warnings.len(), 1);
            assert_eq!(emitted.warnings[0].kind, WarningKind::UnsupportedEquality);
            assert_eq!(emitted.warnings[0].provenance, Some(6));
        }

        #[test]
        fn test_anonymous_class_falls_back_to_fields() {
            let fx = counter_returning("java.lang.Runnable");
            let anonymous = CapturedValue::Object(ObjectSnapshot {
                class_name: "com.example.Counter$1".into(),
                fields: vec![SnapshotField {
                    name: "armed".into(),
                    value: CapturedValue::Boolean(true),
                }],
            });
            let suite = fx.suite(
                TestFramework::JUnit5,
                EqualityStrategy::AssertEquals,
                vec![fx.scenario(0, 1, fx.returned(anonymous))],
            );
            let emitted = render_suite(&suite).unwrap();
            assert!(emitted
                .source
                .contains("Assertions.assertEquals(true, readField(actual, \"armed\"));"));
            assert_eq!(emitted.warnings[0].kind, WarningKind::UnsupportedEquality);
        }
    }

    // ========================================================================
    // State
    // ========================================================================

    mod state {
        use super::*;

        #[test]
        fn test_delta_comment_and_post_state_assertion() {
            let fx = counter();
            let mut scenario = fx.scenario(4, 1, fx.returned(CapturedValue::Int(2)));
            scenario.identity = Some(7);
            scenario.fields = vec![ValueBinding::new(fx.field.clone(), CapturedValue::Int(1))];
            scenario.post_state = vec![ValueBinding::new(fx.field.clone(), CapturedValue::Int(2))];
            scenario.state_delta = vec![FieldDelta::Changed {
                field: ValueBinding::new(fx.field.clone(), CapturedValue::Int(2)),
                previous: CapturedValue::Int(1),
            }];
            let suite = fx.suite(TestFramework::JUnit5, EqualityStrategy::AssertEquals, vec![scenario]);

            let source = render_suite(&suite).unwrap().source;
            assert!(source.contains("// invocation 4 on receiver #7"));
            assert!(source.contains("// count: 1 -> 2"));
            assert!(source.contains("addReturnsValueReceiver7Invocation4"));
            assert!(source.contains("Assertions.assertEquals(2, readField(receiver, \"count\"));"));
        }

        #[test]
        fn test_static_field_arranged_through_owner() {
            let mut ids = IdAllocator::new();
            let target = MethodIdentifier::parse("com.example.Registry.size()")
                .unwrap()
                .returning("int")
                .unwrap()
                .as_static(true);
            let total =
                ValueIdentifier::field(&mut ids, "com.example.Registry", "total", "int", true).unwrap();
            let ret = ValueIdentifier::return_value(&mut ids, &target).unwrap();
            let scenario = TestScenario {
                target: target.clone(),
                arguments: Vec::new(),
                fields: vec![ValueBinding::new(total, CapturedValue::Int(8))],
                outcome: Outcome::Returned {
                    binding: ValueBinding::new(ret, CapturedValue::Int(8)),
                },
                provenance: 0,
                identity: None,
                state_delta: Vec::new(),
                post_state: Vec::new(),
            };
            let suite = TestSuite::new(
                target,
                GenerationStrategy::TraceBasedBasic,
                TestFramework::JUnit5,
                NamingStrategy::Descriptive,
                EqualityStrategy::AssertEquals,
                vec![scenario],
            );
            let source = render_suite(&suite).unwrap().source;
            assert!(source.contains("setStaticField(Registry.class, \"total\", 8);"));
            assert!(source.contains("int actual = Registry.size();"));
            assert!(!source.contains("instantiate"));
        }

        #[test]
        fn test_missing_argument_gets_zero_value() {
            let fx = counter();
            let mut scenario = fx.scenario(3, 1, fx.returned(CapturedValue::Int(1)));
            scenario.arguments.clear();
            let suite = fx.suite(TestFramework::JUnit5, EqualityStrategy::AssertEquals, vec![scenario]);
            let emitted = render_suite(&suite).unwrap();
            assert!(emitted.source.contains("int actual = receiver.add(0);"));
            assert_eq!(emitted.warnings[0].kind, WarningKind::UnrenderableValue);
        }
    }

    // ========================================================================
    // Writing
    // ========================================================================

    mod writing {
        use super::*;
        use tempfile::TempDir;

        #[test]
        fn test_write_suite_with_manifest() {
            let dir = TempDir::new().unwrap();
            let fx = counter();
            let suite = fx.suite(
                TestFramework::JUnit5,
                EqualityStrategy::AssertEquals,
                vec![fx.scenario(0, 1, fx.returned(CapturedValue::Int(1)))],
            );
            let report = write_suite(&suite, dir.path(), "tracegen emit suite.json").unwrap();

            assert_eq!(
                report.path,
                dir.path().join("com/example/CounterAddGeneratedTest.java")
            );
            let written = std::fs::read_to_string(&report.path).unwrap();
            assert!(written.starts_with("// Generated by tracegen"));
            assert!(written.contains("// Regenerate with: tracegen emit suite.json"));
            assert_eq!(report.test_count, 1);
            assert_eq!(
                report.manifest_path,
                dir.path()
                    .join("com/example/CounterAddGeneratedTest.java.manifest.json")
            );
            assert!(report.manifest_path.exists());
            assert_eq!(report.manifest.output_path, "CounterAddGeneratedTest.java");
            tracegen_javagen::verify(&report.path).unwrap();
        }
    }
}
