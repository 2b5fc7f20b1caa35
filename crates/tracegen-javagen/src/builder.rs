//! Fluent builder API for Java compilation units.
//!
//! ```rust,no_run
//! use tracegen_javagen::prelude::*;
//!
//! # fn main() -> tracegen_javagen::Result<()> {
//! let test = MethodBuilder::new("addsTwoNumbers")?
//!     .annotate(Annotation::marker("Test")?)
//!     .stmt(Stmt::local("int", "result", Expr::int(3))?)
//!     .build();
//! let class = ClassBuilder::new("CalculatorTest")?.method(test).build();
//! let unit = CompilationUnitBuilder::new()
//!     .package("com.example")?
//!     .import("org.junit.jupiter.api.Test")?
//!     .class(class)
//!     .build();
//! let source = render(&unit);
//! # Ok(())
//! # }
//! ```

use crate::hir::*;
use crate::Result;

/// Builder for `.java` compilation units.
#[derive(Debug, Default)]
pub struct CompilationUnitBuilder {
    package: Option<QualifiedName>,
    imports: Vec<Import>,
    classes: Vec<JavaClass>,
    metadata: Option<GenerationMetadata>,
}

impl CompilationUnitBuilder {
    /// Create an empty builder (default package).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the package.
    pub fn package(mut self, name: impl Into<String>) -> Result<Self> {
        self.package = Some(QualifiedName::new(name)?);
        Ok(self)
    }

    /// Add `import name;`. Duplicates are ignored.
    pub fn import(self, name: impl Into<String>) -> Result<Self> {
        let import = Import {
            is_static: false,
            path: QualifiedName::new(name)?,
            wildcard: false,
        };
        Ok(self.push_import(import))
    }

    /// Add `import static name;`. Duplicates are ignored.
    pub fn static_import(self, name: impl Into<String>) -> Result<Self> {
        let import = Import {
            is_static: true,
            path: QualifiedName::new(name)?,
            wildcard: false,
        };
        Ok(self.push_import(import))
    }

    fn push_import(mut self, import: Import) -> Self {
        if !self.imports.contains(&import) {
            self.imports.push(import);
        }
        self
    }

    /// Attach generation metadata.
    #[must_use]
    pub fn metadata(mut self, metadata: GenerationMetadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Add a top-level class.
    #[must_use]
    pub fn class(mut self, class: JavaClass) -> Self {
        self.classes.push(class);
        self
    }

    /// Build the unit.
    #[must_use]
    pub fn build(self) -> CompilationUnit {
        CompilationUnit {
            package: self.package,
            imports: self.imports,
            classes: self.classes,
            metadata: self.metadata,
        }
    }
}

/// Builder for classes.
#[derive(Debug)]
pub struct ClassBuilder {
    class: JavaClass,
}

impl ClassBuilder {
    /// Start a class with the given name.
    pub fn new(name: impl Into<String>) -> Result<Self> {
        Ok(Self {
            class: JavaClass {
                name: Identifier::new(name)?,
                modifiers: Modifiers::default(),
                annotations: Vec::new(),
                javadoc: None,
                methods: Vec::new(),
            },
        })
    }

    /// Set visibility.
    #[must_use]
    pub const fn visibility(mut self, visibility: Visibility) -> Self {
        self.class.modifiers.visibility = visibility;
        self
    }

    /// Mark `final`.
    #[must_use]
    pub const fn final_(mut self) -> Self {
        self.class.modifiers.is_final = true;
        self
    }

    /// Add an annotation.
    #[must_use]
    pub fn annotate(mut self, annotation: Annotation) -> Self {
        self.class.annotations.push(annotation);
        self
    }

    /// Set the javadoc text.
    #[must_use]
    pub fn javadoc(mut self, text: impl Into<String>) -> Self {
        self.class.javadoc = Some(text.into());
        self
    }

    /// Append a method.
    #[must_use]
    pub fn method(mut self, method: JavaMethod) -> Self {
        self.class.methods.push(method);
        self
    }

    /// Append methods.
    #[must_use]
    pub fn methods(mut self, methods: impl IntoIterator<Item = JavaMethod>) -> Self {
        self.class.methods.extend(methods);
        self
    }

    /// Build the class.
    #[must_use]
    pub fn build(self) -> JavaClass {
        self.class
    }
}

/// Builder for methods. Defaults to a package-private `void` method.
#[derive(Debug)]
pub struct MethodBuilder {
    method: JavaMethod,
}

impl MethodBuilder {
    /// Start a method with the given name.
    pub fn new(name: impl Into<String>) -> Result<Self> {
        Ok(Self {
            method: JavaMethod {
                name: Identifier::new(name)?,
                modifiers: Modifiers::default(),
                annotations: Vec::new(),
                javadoc: None,
                type_params: Vec::new(),
                return_type: TypeRef::void(),
                params: Vec::new(),
                throws: Vec::new(),
                body: Vec::new(),
            },
        })
    }

    /// Set visibility.
    #[must_use]
    pub const fn visibility(mut self, visibility: Visibility) -> Self {
        self.method.modifiers.visibility = visibility;
        self
    }

    /// Mark `static`.
    #[must_use]
    pub const fn static_(mut self) -> Self {
        self.method.modifiers.is_static = true;
        self
    }

    /// Add an annotation.
    #[must_use]
    pub fn annotate(mut self, annotation: Annotation) -> Self {
        self.method.annotations.push(annotation);
        self
    }

    /// Set the javadoc text.
    #[must_use]
    pub fn javadoc(mut self, text: impl Into<String>) -> Self {
        self.method.javadoc = Some(text.into());
        self
    }

    /// Add a generic type parameter.
    pub fn type_param(mut self, name: impl Into<String>) -> Result<Self> {
        self.method.type_params.push(Identifier::new(name)?);
        Ok(self)
    }

    /// Set the return type.
    pub fn returns(mut self, ty: impl Into<String>) -> Result<Self> {
        self.method.return_type = TypeRef::new(ty)?;
        Ok(self)
    }

    /// Add a parameter.
    pub fn param(mut self, ty: impl Into<String>, name: impl Into<String>) -> Result<Self> {
        self.method.params.push(Param {
            ty: TypeRef::new(ty)?,
            name: Identifier::new(name)?,
        });
        Ok(self)
    }

    /// Add a `throws` entry.
    pub fn throws(mut self, ty: impl Into<String>) -> Result<Self> {
        self.method.throws.push(TypeRef::new(ty)?);
        Ok(self)
    }

    /// Append a statement.
    #[must_use]
    pub fn stmt(mut self, stmt: Stmt) -> Self {
        self.method.body.push(stmt);
        self
    }

    /// Append statements.
    #[must_use]
    pub fn stmts(mut self, stmts: impl IntoIterator<Item = Stmt>) -> Self {
        self.method.body.extend(stmts);
        self
    }

    /// Build the method.
    #[must_use]
    pub fn build(self) -> JavaMethod {
        self.method
    }
}

impl Annotation {
    /// `@Name`
    pub fn marker(name: impl Into<String>) -> Result<Self> {
        Ok(Self {
            name: QualifiedName::new(name)?,
            value: None,
        })
    }

    /// `@Name(value)`
    pub fn with_value(name: impl Into<String>, value: Expr) -> Result<Self> {
        Ok(Self {
            name: QualifiedName::new(name)?,
            value: Some(value),
        })
    }
}

/// Expression builder helpers.
impl Expr {
    /// `null`
    #[must_use]
    pub const fn null() -> Self {
        Self::Null
    }

    /// Boolean literal.
    #[must_use]
    pub const fn bool(v: bool) -> Self {
        Self::Bool(v)
    }

    /// `int` literal.
    #[must_use]
    pub const fn int(v: i32) -> Self {
        Self::Int(v)
    }

    /// `long` literal.
    #[must_use]
    pub const fn long(v: i64) -> Self {
        Self::Long(v)
    }

    /// `float` literal.
    #[must_use]
    pub const fn float(v: f32) -> Self {
        Self::Float(v)
    }

    /// `double` literal.
    #[must_use]
    pub const fn double(v: f64) -> Self {
        Self::Double(v)
    }

    /// `char` literal.
    #[must_use]
    pub const fn char(v: char) -> Self {
        Self::Char(v)
    }

    /// String literal.
    #[must_use]
    pub fn str(s: impl Into<String>) -> Self {
        Self::Str(s.into())
    }

    /// Variable reference.
    pub fn ident(name: impl Into<String>) -> Result<Self> {
        Ok(Self::Ident(Identifier::new(name)?))
    }

    /// Type used as a receiver, e.g. `Assertions`.
    pub fn type_name(ty: impl Into<String>) -> Result<Self> {
        Ok(Self::Type(TypeRef::new(ty)?))
    }

    /// `T.class`
    pub fn class_literal(ty: impl Into<String>) -> Result<Self> {
        Ok(Self::ClassLiteral(TypeRef::new(ty)?))
    }

    /// `self.name`
    pub fn dot(self, name: impl Into<String>) -> Result<Self> {
        Ok(Self::Field {
            target: Box::new(self),
            name: Identifier::new(name)?,
        })
    }

    /// `self.method(args)`
    pub fn call(self, method: impl Into<String>, args: Vec<Expr>) -> Result<Self> {
        Ok(Self::Call {
            target: Some(Box::new(self)),
            type_args: Vec::new(),
            method: Identifier::new(method)?,
            args,
        })
    }

    /// Unqualified `method(args)`.
    pub fn invoke(method: impl Into<String>, args: Vec<Expr>) -> Result<Self> {
        Ok(Self::Call {
            target: None,
            type_args: Vec::new(),
            method: Identifier::new(method)?,
            args,
        })
    }

    /// `new T(args)`
    pub fn new_object(ty: impl Into<String>, args: Vec<Expr>) -> Result<Self> {
        Ok(Self::New {
            ty: TypeRef::new(ty)?,
            args,
        })
    }

    /// `new T[] { items }`
    pub fn new_array(element: impl Into<String>, items: Vec<Expr>) -> Result<Self> {
        Ok(Self::NewArray {
            element: TypeRef::new(element)?,
            items,
        })
    }

    /// `(T) self`
    pub fn cast(self, ty: impl Into<String>) -> Result<Self> {
        Ok(Self::Cast {
            ty: TypeRef::new(ty)?,
            expr: Box::new(self),
        })
    }

    fn binary(self, op: BinOp, other: Expr) -> Self {
        Self::Binary {
            left: Box::new(self),
            op,
            right: Box::new(other),
        }
    }

    /// `self + other`
    #[must_use]
    pub fn add(self, other: Expr) -> Self {
        self.binary(BinOp::Add, other)
    }

    /// `self == other`
    #[must_use]
    pub fn eq(self, other: Expr) -> Self {
        self.binary(BinOp::Eq, other)
    }

    /// `self != other`
    #[must_use]
    pub fn ne(self, other: Expr) -> Self {
        self.binary(BinOp::Ne, other)
    }

    /// `self && other`
    #[must_use]
    pub fn and(self, other: Expr) -> Self {
        self.binary(BinOp::And, other)
    }

    /// `self || other`
    #[must_use]
    pub fn or(self, other: Expr) -> Self {
        self.binary(BinOp::Or, other)
    }

    /// `!self`
    #[must_use]
    pub fn not(self) -> Self {
        Self::Unary {
            op: UnaryOp::Not,
            operand: Box::new(self),
        }
    }

    /// `(params) -> body`
    pub fn lambda(params: &[&str], body: Expr) -> Result<Self> {
        let params = params
            .iter()
            .map(|p| Identifier::new(*p))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::Lambda {
            params,
            body: Box::new(body),
        })
    }

    /// `(params) -> { body }`
    pub fn lambda_block(params: &[&str], body: Vec<Stmt>) -> Result<Self> {
        let params = params
            .iter()
            .map(|p| Identifier::new(*p))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::LambdaBlock { params, body })
    }
}

/// Statement builder helpers.
impl Stmt {
    /// `T name = value;`
    pub fn local(ty: impl Into<String>, name: impl Into<String>, value: Expr) -> Result<Self> {
        Ok(Self::Local {
            ty: TypeRef::new(ty)?,
            name: Identifier::new(name)?,
            value,
        })
    }

    /// `target = value;`
    #[must_use]
    pub fn assign(target: Expr, value: Expr) -> Self {
        Self::Assign { target, value }
    }

    /// `expr;`
    #[must_use]
    pub fn expr(e: Expr) -> Self {
        Self::Expr(e)
    }

    /// `return;`
    #[must_use]
    pub fn ret() -> Self {
        Self::Return(None)
    }

    /// `return expr;`
    #[must_use]
    pub fn ret_val(e: Expr) -> Self {
        Self::Return(Some(e))
    }

    /// `if (cond) { .. }`
    #[must_use]
    pub fn if_then(cond: Expr, then_body: Vec<Stmt>) -> Self {
        Self::If {
            condition: cond,
            then_branch: then_body,
            else_branch: None,
        }
    }

    /// `if (cond) { .. } else { .. }`
    #[must_use]
    pub fn if_else(cond: Expr, then_body: Vec<Stmt>, else_body: Vec<Stmt>) -> Self {
        Self::If {
            condition: cond,
            then_branch: then_body,
            else_branch: Some(else_body),
        }
    }

    /// `while (cond) { .. }`
    #[must_use]
    pub fn while_loop(cond: Expr, body: Vec<Stmt>) -> Self {
        Self::While {
            condition: cond,
            body,
        }
    }

    /// `try { body } catch (E var) { handler }`
    pub fn try_catch(
        body: Vec<Stmt>,
        exception: impl Into<String>,
        var: impl Into<String>,
        handler: Vec<Stmt>,
    ) -> Result<Self> {
        Ok(Self::TryCatch {
            body,
            catches: vec![CatchClause {
                exception: TypeRef::new(exception)?,
                var: Identifier::new(var)?,
                body: handler,
            }],
        })
    }

    /// `throw expr;`
    #[must_use]
    pub fn throw(e: Expr) -> Self {
        Self::Throw(e)
    }

    /// `// text`
    #[must_use]
    pub fn comment(text: impl Into<String>) -> Self {
        Self::Comment(text.into())
    }
}
