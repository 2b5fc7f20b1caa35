//! Method references: `com.example.Calculator.add(int, int)`.

use crate::result::{TracegenError, TracegenResult};
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracegen_javagen::{Identifier, QualifiedName, TypeRef};

const REFERENCE_PATTERN: &str =
    r"^\s*(?P<class>[A-Za-z_$][\w$]*(?:\.[A-Za-z_$][\w$]*)*)\.(?P<method>[A-Za-z_$][\w$]*)\s*\((?P<params>[^()]*)\)\s*$";

/// Fully-qualified class, method name, parameter signature and return type
/// of the method under analysis.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MethodIdentifier {
    class_name: String,
    method_name: String,
    parameter_types: Vec<String>,
    return_type: String,
    is_static: bool,
}

impl MethodIdentifier {
    /// Validated constructor.
    ///
    /// `return_type` may be empty or `void`.
    pub fn new(
        class_name: impl Into<String>,
        method_name: impl Into<String>,
        parameter_types: Vec<String>,
        return_type: impl Into<String>,
        is_static: bool,
    ) -> TracegenResult<Self> {
        let class_name = class_name.into();
        let method_name = method_name.into();
        let return_type = return_type.into().trim().to_string();

        QualifiedName::new(class_name.as_str()).map_err(|e| {
            TracegenError::configuration(format!("malformed class name '{class_name}': {e}"))
        })?;
        Identifier::new(method_name.as_str()).map_err(|e| {
            TracegenError::configuration(format!("malformed method name '{method_name}': {e}"))
        })?;
        let parameter_types = parameter_types
            .into_iter()
            .map(|ty| {
                let ty = ty.trim().to_string();
                validate_type(&ty).map(|()| ty)
            })
            .collect::<TracegenResult<Vec<_>>>()?;
        if !return_type.is_empty() {
            validate_type(&return_type)?;
        }

        Ok(Self {
            class_name,
            method_name,
            parameter_types,
            return_type,
            is_static,
        })
    }

    /// Parse `pkg.Class.method(T1, T2)`. The result returns `void` and is an
    /// instance method until [`Self::returning`] / [`Self::as_static`] say otherwise.
    pub fn parse(reference: &str) -> TracegenResult<Self> {
        let pattern = Regex::new(REFERENCE_PATTERN)
            .map_err(|e| TracegenError::configuration(format!("reference pattern: {e}")))?;
        let caps = pattern.captures(reference).ok_or_else(|| {
            TracegenError::configuration(format!(
                "malformed method reference '{reference}': expected 'package.Class.method(Type, ...)'"
            ))
        })?;
        let params = caps["params"].trim();
        let parameter_types = if params.is_empty() {
            Vec::new()
        } else {
            split_parameters(params)
        };
        Self::new(&caps["class"], &caps["method"], parameter_types, "void", false)
    }

    /// Same method with a declared return type.
    pub fn returning(self, return_type: impl Into<String>) -> TracegenResult<Self> {
        Self::new(
            self.class_name,
            self.method_name,
            self.parameter_types,
            return_type,
            self.is_static,
        )
    }

    /// Same method, marked static.
    #[must_use]
    pub fn as_static(mut self, is_static: bool) -> Self {
        self.is_static = is_static;
        self
    }

    /// Fully-qualified (binary) class name.
    #[must_use]
    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    /// Class name without package.
    #[must_use]
    pub fn simple_class_name(&self) -> &str {
        self.class_name
            .rsplit('.')
            .next()
            .unwrap_or(&self.class_name)
    }

    /// Package, `None` for the default package.
    #[must_use]
    pub fn package_name(&self) -> Option<&str> {
        self.class_name.rsplit_once('.').map(|(pkg, _)| pkg)
    }

    /// Method name.
    #[must_use]
    pub fn method_name(&self) -> &str {
        &self.method_name
    }

    /// Declared parameter types in slot order.
    #[must_use]
    pub fn parameter_types(&self) -> &[String] {
        &self.parameter_types
    }

    /// Declared return type; empty when unknown.
    #[must_use]
    pub fn return_type(&self) -> &str {
        &self.return_type
    }

    /// Static method.
    #[must_use]
    pub const fn is_static(&self) -> bool {
        self.is_static
    }

    /// Declared return type is `void` or absent.
    #[must_use]
    pub fn is_void(&self) -> bool {
        is_void_type(&self.return_type)
    }

    /// `pkg.Class.method(T1, T2)`
    #[must_use]
    pub fn signature(&self) -> String {
        format!(
            "{}.{}({})",
            self.class_name,
            self.method_name,
            self.parameter_types.join(", ")
        )
    }
}

impl std::fmt::Display for MethodIdentifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.signature())
    }
}

/// `void` or blank.
pub(crate) fn is_void_type(type_name: &str) -> bool {
    let t = type_name.trim();
    t.is_empty() || t == "void"
}

pub(crate) fn validate_type(type_name: &str) -> TracegenResult<()> {
    TypeRef::new(type_name)
        .map(|_| ())
        .map_err(|e| TracegenError::configuration(format!("malformed type '{type_name}': {e}")))
}

/// Split on commas that are not nested inside generic brackets.
fn split_parameters(params: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut depth = 0i32;
    let mut current = String::new();
    for c in params.chars() {
        match c {
            '<' => depth += 1,
            '>' => depth -= 1,
            ',' if depth == 0 => {
                out.push(current.trim().to_string());
                current.clear();
                continue;
            }
            _ => {}
        }
        current.push(c);
    }
    out.push(current.trim().to_string());
    out
}
