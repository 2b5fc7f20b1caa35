//! Typed intermediate representation for Java test sources.
//!
//! Every name that ends up in rendered source is validated when the IR node
//! is built, so a [`CompilationUnit`] that exists is one the renderer can
//! print without further checks. The same IR always renders to the same text.

use crate::error::{JavaGenError, Result};
use serde::{Deserialize, Serialize};

/// One `.java` file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompilationUnit {
    /// `package` declaration; `None` for the default package
    pub package: Option<QualifiedName>,
    /// Import declarations
    pub imports: Vec<Import>,
    /// Top-level classes
    pub classes: Vec<JavaClass>,
    /// Generation metadata rendered as a header comment
    pub metadata: Option<GenerationMetadata>,
}

impl Default for CompilationUnit {
    fn default() -> Self {
        Self::new()
    }
}

impl CompilationUnit {
    /// Create an empty unit in the default package.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            package: None,
            imports: Vec::new(),
            classes: Vec::new(),
            metadata: None,
        }
    }

    /// Source-relative path of this unit, e.g. `com/example/FooTest.java`.
    ///
    /// Derived from the package and the first class name.
    pub fn relative_path(&self) -> Result<std::path::PathBuf> {
        let class = self.classes.first().ok_or_else(|| {
            JavaGenError::GenerationError("compilation unit has no classes".to_string())
        })?;
        let mut path = std::path::PathBuf::new();
        if let Some(package) = &self.package {
            for segment in package.segments() {
                path.push(segment);
            }
        }
        path.push(format!("{}.java", class.name));
        Ok(path)
    }
}

/// Metadata about code generation, used for regeneration and drift checks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationMetadata {
    /// Tool that generated this code
    pub tool: String,
    /// Tool version
    pub version: String,
    /// Blake3 hash of the generator input
    pub input_hash: String,
    /// RFC 3339 timestamp
    pub timestamp: String,
    /// Command to regenerate
    pub regenerate_cmd: String,
}

impl GenerationMetadata {
    /// Metadata stamped with the current UTC time.
    #[must_use]
    pub fn now(
        tool: impl Into<String>,
        version: impl Into<String>,
        input: &[u8],
        regenerate_cmd: impl Into<String>,
    ) -> Self {
        Self {
            tool: tool.into(),
            version: version.into(),
            input_hash: blake3::hash(input).to_hex().to_string(),
            timestamp: chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
            regenerate_cmd: regenerate_cmd.into(),
        }
    }
}

/// `import a.b.C;` or `import static a.b.C.m;`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Import {
    /// Static import
    pub is_static: bool,
    /// Imported name
    pub path: QualifiedName,
    /// Trailing `.*`
    pub wildcard: bool,
}

/// Member visibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Visibility {
    /// `public`
    Public,
    /// `protected`
    Protected,
    /// no modifier
    #[default]
    PackagePrivate,
    /// `private`
    Private,
}

impl Visibility {
    /// Keyword, empty for package-private.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::Protected => "protected",
            Self::PackagePrivate => "",
            Self::Private => "private",
        }
    }
}

/// Declaration modifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Modifiers {
    /// Visibility keyword
    pub visibility: Visibility,
    /// `static`
    pub is_static: bool,
    /// `final`
    pub is_final: bool,
}

/// `@Name` or `@Name(value)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    /// Annotation type
    pub name: QualifiedName,
    /// Single `value` element
    pub value: Option<Expr>,
}

/// A top-level class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JavaClass {
    /// Class name
    pub name: Identifier,
    /// Modifiers
    pub modifiers: Modifiers,
    /// Annotations
    pub annotations: Vec<Annotation>,
    /// Javadoc text (without comment delimiters)
    pub javadoc: Option<String>,
    /// Methods, rendered in order
    pub methods: Vec<JavaMethod>,
}

/// Method parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Param {
    /// Parameter type
    pub ty: TypeRef,
    /// Parameter name
    pub name: Identifier,
}

/// A method declaration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JavaMethod {
    /// Method name
    pub name: Identifier,
    /// Modifiers
    pub modifiers: Modifiers,
    /// Annotations
    pub annotations: Vec<Annotation>,
    /// Javadoc text
    pub javadoc: Option<String>,
    /// Generic type parameters (`<T>`)
    pub type_params: Vec<Identifier>,
    /// Return type
    pub return_type: TypeRef,
    /// Parameters
    pub params: Vec<Param>,
    /// `throws` clause
    pub throws: Vec<TypeRef>,
    /// Body
    pub body: Vec<Stmt>,
}

/// Catch clause of a try statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatchClause {
    /// Caught exception type
    pub exception: TypeRef,
    /// Bound variable
    pub var: Identifier,
    /// Handler body
    pub body: Vec<Stmt>,
}

/// Java statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Stmt {
    /// Local variable: `T name = value;`
    Local {
        /// Declared type
        ty: TypeRef,
        /// Variable name
        name: Identifier,
        /// Initializer
        value: Expr,
    },
    /// Assignment: `target = value;`
    Assign {
        /// Assigned place
        target: Expr,
        /// New value
        value: Expr,
    },
    /// Expression statement: `expr;`
    Expr(Expr),
    /// `return expr;` or `return;`
    Return(Option<Expr>),
    /// `if (cond) { .. } else { .. }`
    If {
        /// Condition
        condition: Expr,
        /// Then branch
        then_branch: Vec<Stmt>,
        /// Optional else branch
        else_branch: Option<Vec<Stmt>>,
    },
    /// `while (cond) { .. }`
    While {
        /// Condition
        condition: Expr,
        /// Loop body
        body: Vec<Stmt>,
    },
    /// `try { .. } catch (E e) { .. }`
    TryCatch {
        /// Try body
        body: Vec<Stmt>,
        /// Catch clauses, at least one
        catches: Vec<CatchClause>,
    },
    /// `throw expr;`
    Throw(Expr),
    /// `// text`
    Comment(String),
    /// Empty line
    Blank,
}

/// Java expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    /// `null`
    Null,
    /// `true` / `false`
    Bool(bool),
    /// `int` literal
    Int(i32),
    /// `long` literal (`L` suffix)
    Long(i64),
    /// `float` literal (`f` suffix, `Float.NaN` etc. for non-finite values)
    Float(f32),
    /// `double` literal
    Double(f64),
    /// `char` literal
    Char(char),
    /// String literal, escaped on render
    Str(String),
    /// Variable or parameter reference
    Ident(Identifier),
    /// `this`
    This,
    /// Type used as an expression receiver: `Assertions`, `java.util.Map`
    Type(TypeRef),
    /// `T.class`
    ClassLiteral(TypeRef),
    /// Field access: `target.name`
    Field {
        /// Receiver
        target: Box<Expr>,
        /// Field name
        name: Identifier,
    },
    /// Method call: `target.<T>name(args)` or `name(args)`
    Call {
        /// Receiver, `None` for an unqualified call
        target: Option<Box<Expr>>,
        /// Explicit type arguments
        type_args: Vec<TypeRef>,
        /// Method name
        method: Identifier,
        /// Arguments
        args: Vec<Expr>,
    },
    /// `new T(args)`
    New {
        /// Constructed type
        ty: TypeRef,
        /// Constructor arguments
        args: Vec<Expr>,
    },
    /// `new T[] { items }`
    NewArray {
        /// Element type
        element: TypeRef,
        /// Initializer items
        items: Vec<Expr>,
    },
    /// `(T) expr`
    Cast {
        /// Target type
        ty: TypeRef,
        /// Operand
        expr: Box<Expr>,
    },
    /// `left op right`
    Binary {
        /// Left operand
        left: Box<Expr>,
        /// Operator
        op: BinOp,
        /// Right operand
        right: Box<Expr>,
    },
    /// `op operand`
    Unary {
        /// Operator
        op: UnaryOp,
        /// Operand
        operand: Box<Expr>,
    },
    /// `(params) -> expr`
    Lambda {
        /// Parameters
        params: Vec<Identifier>,
        /// Body expression
        body: Box<Expr>,
    },
    /// `(params) -> { stmts }`
    LambdaBlock {
        /// Parameters
        params: Vec<Identifier>,
        /// Body statements
        body: Vec<Stmt>,
    },
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinOp {
    /// `+`
    Add,
    /// `-`
    Sub,
    /// `==`
    Eq,
    /// `!=`
    Ne,
    /// `<`
    Lt,
    /// `>`
    Gt,
    /// `&&`
    And,
    /// `||`
    Or,
}

impl BinOp {
    /// Java operator text.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Eq => "==",
            Self::Ne => "!=",
            Self::Lt => "<",
            Self::Gt => ">",
            Self::And => "&&",
            Self::Or => "||",
        }
    }
}

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnaryOp {
    /// `!`
    Not,
    /// `-`
    Neg,
}

impl UnaryOp {
    /// Java operator text.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Not => "!",
            Self::Neg => "-",
        }
    }
}

/// A validated Java identifier.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Identifier(String);

impl Identifier {
    /// Keywords and literals that cannot be used as identifiers.
    pub const RESERVED_WORDS: &'static [&'static str] = &[
        "abstract",
        "assert",
        "boolean",
        "break",
        "byte",
        "case",
        "catch",
        "char",
        "class",
        "const",
        "continue",
        "default",
        "do",
        "double",
        "else",
        "enum",
        "extends",
        "final",
        "finally",
        "float",
        "for",
        "goto",
        "if",
        "implements",
        "import",
        "instanceof",
        "int",
        "interface",
        "long",
        "native",
        "new",
        "package",
        "private",
        "protected",
        "public",
        "return",
        "short",
        "static",
        "strictfp",
        "super",
        "switch",
        "synchronized",
        "this",
        "throw",
        "throws",
        "transient",
        "try",
        "void",
        "volatile",
        "while",
        "true",
        "false",
        "null",
        "_",
    ];

    /// Create a new identifier, validating it.
    ///
    /// # Errors
    ///
    /// Returns an error if the identifier is empty, starts with a digit,
    /// contains characters outside `[A-Za-z0-9_$]`, or is a reserved word.
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();

        if name.is_empty() {
            return Err(JavaGenError::identifier(name, "identifier cannot be empty"));
        }
        if name.starts_with(|c: char| c.is_ascii_digit()) {
            return Err(JavaGenError::identifier(
                name,
                "identifier cannot start with a digit",
            ));
        }
        if let Some(c) = name
            .chars()
            .find(|c| !c.is_ascii_alphanumeric() && *c != '_' && *c != '$')
        {
            return Err(JavaGenError::identifier(
                name,
                format!("invalid character '{c}'"),
            ));
        }
        if Self::RESERVED_WORDS.contains(&name.as_str()) {
            return Err(JavaGenError::identifier(name, "reserved word"));
        }

        Ok(Self(name))
    }

    /// Turn arbitrary text into a valid identifier.
    ///
    /// Invalid characters become `_`, a leading digit gets a `_` prefix and
    /// reserved words get a `_` suffix.
    #[must_use]
    pub fn sanitize(raw: &str) -> Self {
        let mut name: String = raw
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '_' || c == '$' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        if name.is_empty() || name.starts_with(|c: char| c.is_ascii_digit()) {
            name.insert(0, '_');
        }
        if Self::RESERVED_WORDS.contains(&name.as_str()) {
            name.push('_');
        }
        Self(name)
    }

    /// Get the identifier string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Identifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Dotted name such as a package or fully-qualified class.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct QualifiedName(String);

impl QualifiedName {
    /// Validate every dot-separated segment as an [`Identifier`].
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(JavaGenError::identifier(name, "qualified name cannot be empty"));
        }
        for segment in name.split('.') {
            Identifier::new(segment).map_err(|err| match err {
                JavaGenError::InvalidIdentifier { reason, .. } => {
                    JavaGenError::identifier(name.clone(), format!("segment '{segment}': {reason}"))
                }
                other => other,
            })?;
        }
        Ok(Self(name))
    }

    /// Dot-separated segments.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('.')
    }

    /// Last segment.
    #[must_use]
    pub fn simple_name(&self) -> &str {
        self.0.rsplit('.').next().unwrap_or(&self.0)
    }

    /// Get the name string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A type as written in source: primitive, (qualified) class, generic
/// instantiation or array.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TypeRef(String);

impl TypeRef {
    /// Primitive type keywords, plus `void`.
    pub const PRIMITIVES: &'static [&'static str] = &[
        "boolean", "byte", "char", "short", "int", "long", "float", "double", "void",
    ];

    /// Parse and validate a type reference.
    pub fn new(text: impl Into<String>) -> Result<Self> {
        let text = text.into();
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(JavaGenError::invalid_type(text, "type cannot be empty"));
        }
        validate_type(trimmed, trimmed, false)?;
        Ok(Self(trimmed.to_string()))
    }

    /// `void`
    #[must_use]
    pub fn void() -> Self {
        Self("void".to_string())
    }

    /// `Object`
    #[must_use]
    pub fn object() -> Self {
        Self("Object".to_string())
    }

    /// True for primitive keywords (not arrays of them).
    #[must_use]
    pub fn is_primitive(&self) -> bool {
        Self::PRIMITIVES.contains(&self.0.as_str()) && self.0 != "void"
    }

    /// True for `void`.
    #[must_use]
    pub fn is_void(&self) -> bool {
        self.0 == "void"
    }

    /// Class name without package, generics or array brackets.
    #[must_use]
    pub fn simple_name(&self) -> &str {
        let base = self.0.split('<').next().unwrap_or(&self.0);
        let base = base.trim_end_matches("[]");
        base.rsplit('.').next().unwrap_or(base)
    }

    /// Wrapper class name for primitives; other types are returned unchanged.
    #[must_use]
    pub fn boxed(&self) -> Self {
        let boxed = match self.0.as_str() {
            "boolean" => "Boolean",
            "byte" => "Byte",
            "char" => "Character",
            "short" => "Short",
            "int" => "Integer",
            "long" => "Long",
            "float" => "Float",
            "double" => "Double",
            "void" => "Void",
            other => other,
        };
        Self(boxed.to_string())
    }

    /// Get the type text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TypeRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

fn validate_type(text: &str, whole: &str, in_args: bool) -> Result<()> {
    let mut base = text.trim();
    while let Some(stripped) = base.strip_suffix("[]") {
        base = stripped.trim_end();
    }

    if in_args {
        if base == "?" {
            return Ok(());
        }
        for bound in ["? extends ", "? super "] {
            if let Some(rest) = base.strip_prefix(bound) {
                return validate_type(rest, whole, true);
            }
        }
    }

    if let Some(open) = base.find('<') {
        let Some(inner) = base[open + 1..].strip_suffix('>') else {
            return Err(JavaGenError::invalid_type(whole, "unbalanced '<'"));
        };
        if inner.trim().is_empty() {
            return Err(JavaGenError::invalid_type(whole, "empty type arguments"));
        }
        validate_class_name(&base[..open], whole)?;
        for arg in split_top_level(inner)? {
            validate_type(arg, whole, true)?;
        }
        Ok(())
    } else if base.contains('>') {
        Err(JavaGenError::invalid_type(whole, "unbalanced '>'"))
    } else {
        validate_class_name(base, whole)
    }
}

fn validate_class_name(name: &str, whole: &str) -> Result<()> {
    let name = name.trim();
    if TypeRef::PRIMITIVES.contains(&name) {
        return Ok(());
    }
    for segment in name.split('.') {
        Identifier::new(segment).map_err(|err| match err {
            JavaGenError::InvalidIdentifier { reason, .. } => {
                JavaGenError::invalid_type(whole, format!("segment '{segment}': {reason}"))
            }
            other => other,
        })?;
    }
    Ok(())
}

fn split_top_level(inner: &str) -> Result<Vec<&str>> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, c) in inner.char_indices() {
        match c {
            '<' => depth += 1,
            '>' => {
                depth = depth
                    .checked_sub(1)
                    .ok_or_else(|| JavaGenError::invalid_type(inner, "unbalanced '>'"))?;
            }
            ',' if depth == 0 => {
                parts.push(&inner[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    if depth != 0 {
        return Err(JavaGenError::invalid_type(inner, "unbalanced '<'"));
    }
    parts.push(&inner[start..]);
    Ok(parts)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn identifier_valid() {
        assert!(Identifier::new("foo").is_ok());
        assert!(Identifier::new("_bar").is_ok());
        assert!(Identifier::new("$baz").is_ok());
        assert!(Identifier::new("arg0_17").is_ok());
        assert!(Identifier::new("camelCase").is_ok());
    }

    #[test]
    fn identifier_invalid_reserved() {
        let err = Identifier::new("class").unwrap_err();
        assert!(err.to_string().contains("reserved word"));
        assert!(Identifier::new("_").is_err());
    }

    #[test]
    fn identifier_invalid_starts_digit() {
        let err = Identifier::new("1st").unwrap_err();
        assert!(err.to_string().contains("cannot start with a digit"));
    }

    #[test]
    fn identifier_invalid_empty() {
        let err = Identifier::new("").unwrap_err();
        assert!(err.to_string().contains("cannot be empty"));
    }

    #[test]
    fn identifier_invalid_chars() {
        let err = Identifier::new("foo-bar").unwrap_err();
        assert!(err.to_string().contains("invalid character"));
    }

    #[test]
    fn identifier_sanitize() {
        assert_eq!(Identifier::sanitize("a-b c").as_str(), "a_b_c");
        assert_eq!(Identifier::sanitize("9lives").as_str(), "_9lives");
        assert_eq!(Identifier::sanitize("int").as_str(), "int_");
        // `_` alone is reserved, so it gets the keyword suffix too
        assert_eq!(Identifier::sanitize("").as_str(), "__");
        assert_eq!(Identifier::sanitize("_").as_str(), "__");
        assert!(Identifier::new(Identifier::sanitize("").as_str()).is_ok());
    }

    #[test]
    fn qualified_name_segments() {
        let name = QualifiedName::new("org.junit.jupiter.api.Test").unwrap();
        assert_eq!(name.simple_name(), "Test");
        assert_eq!(name.segments().count(), 5);
        assert!(QualifiedName::new("org..junit").is_err());
        assert!(QualifiedName::new("com.example.class").is_err());
    }

    #[test]
    fn type_ref_accepts_common_forms() {
        for ty in [
            "int",
            "void",
            "java.lang.String",
            "int[]",
            "String[][]",
            "java.util.Map<String, java.util.List<Integer>>",
            "java.util.List<? extends Number>",
            "Class<?>",
        ] {
            assert!(TypeRef::new(ty).is_ok(), "{ty} should be accepted");
        }
    }

    #[test]
    fn type_ref_rejects_malformed() {
        for ty in ["", "List<", "List<>", "Map<String>>", "a..b", "java.lang.class", "?"] {
            assert!(TypeRef::new(ty).is_err(), "{ty} should be rejected");
        }
    }

    #[test]
    fn type_ref_helpers() {
        let ty = TypeRef::new("java.util.List<String>").unwrap();
        assert_eq!(ty.simple_name(), "List");
        assert!(TypeRef::new("int").unwrap().is_primitive());
        assert!(!TypeRef::new("int[]").unwrap().is_primitive());
        assert!(TypeRef::void().is_void());
        assert_eq!(TypeRef::new("char").unwrap().boxed().as_str(), "Character");
        assert_eq!(TypeRef::new("String").unwrap().boxed().as_str(), "String");
    }

    #[test]
    fn relative_path_follows_package() {
        let mut unit = CompilationUnit::new();
        unit.package = Some(QualifiedName::new("com.example").unwrap());
        unit.classes.push(JavaClass {
            name: Identifier::new("CalcTest").unwrap(),
            modifiers: Modifiers::default(),
            annotations: Vec::new(),
            javadoc: None,
            methods: Vec::new(),
        });
        assert_eq!(
            unit.relative_path().unwrap(),
            std::path::PathBuf::from("com/example/CalcTest.java")
        );
        assert!(CompilationUnit::new().relative_path().is_err());
    }

    #[test]
    fn binop_as_str() {
        assert_eq!(BinOp::Eq.as_str(), "==");
        assert_eq!(BinOp::And.as_str(), "&&");
        assert_eq!(UnaryOp::Not.as_str(), "!");
    }
}
