//! Per-framework imports, visibility and assertion shapes.

use crate::config::TestFramework;
use tracegen_javagen::{Expr, Result, Visibility};

/// How one test framework spells the constructs the emitter needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Idiom {
    framework: TestFramework,
}

impl Idiom {
    pub const fn new(framework: TestFramework) -> Self {
        Self { framework }
    }

    /// Fully qualified `@Test` annotation.
    pub const fn test_annotation(self) -> &'static str {
        match self.framework {
            TestFramework::JUnit5 => "org.junit.jupiter.api.Test",
            TestFramework::JUnit4 => "org.junit.Test",
            TestFramework::TestNg => "org.testng.annotations.Test",
        }
    }

    /// Fully qualified assertions class.
    pub const fn assertions(self) -> &'static str {
        match self.framework {
            TestFramework::JUnit5 => "org.junit.jupiter.api.Assertions",
            TestFramework::JUnit4 => "org.junit.Assert",
            TestFramework::TestNg => "org.testng.Assert",
        }
    }

    fn assertions_simple(self) -> &'static str {
        match self.framework {
            TestFramework::JUnit5 => "Assertions",
            TestFramework::JUnit4 | TestFramework::TestNg => "Assert",
        }
    }

    /// Jupiter discovers package-private classes and methods; the others
    /// need them public.
    pub const fn visibility(self) -> Visibility {
        match self.framework {
            TestFramework::JUnit5 => Visibility::PackagePrivate,
            TestFramework::JUnit4 | TestFramework::TestNg => Visibility::Public,
        }
    }

    fn assert(self, method: &str, args: Vec<Expr>) -> Result<Expr> {
        Expr::type_name(self.assertions_simple())?.call(method, args)
    }

    /// `assertEquals`; TestNG takes `(actual, expected)`.
    pub fn assert_equals(self, expected: Expr, actual: Expr) -> Result<Expr> {
        match self.framework {
            TestFramework::TestNg => self.assert("assertEquals", vec![actual, expected]),
            _ => self.assert("assertEquals", vec![expected, actual]),
        }
    }

    /// Floating-point `assertEquals` with an exact delta.
    pub fn assert_equals_exact(self, expected: Expr, actual: Expr) -> Result<Expr> {
        let delta = Expr::double(0.0);
        match self.framework {
            TestFramework::TestNg => self.assert("assertEquals", vec![actual, expected, delta]),
            _ => self.assert("assertEquals", vec![expected, actual, delta]),
        }
    }

    pub fn assert_null(self, actual: Expr) -> Result<Expr> {
        self.assert("assertNull", vec![actual])
    }

    pub fn assert_not_null(self, actual: Expr) -> Result<Expr> {
        self.assert("assertNotNull", vec![actual])
    }

    /// `assertThrows(type, () -> call)`; all three frameworks share the shape.
    pub fn assert_throws(self, exception: Expr, call: Expr) -> Result<Expr> {
        self.assert("assertThrows", vec![exception, Expr::lambda(&[], call)?])
    }
}
