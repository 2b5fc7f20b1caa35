//! Typed Rust DSL for generating Java test sources.
//!
//! ```text
//! ┌──────────────┐    ┌──────────────┐    ┌──────────────┐    ┌──────────────┐
//! │   builder    │───►│     hir      │───►│   codegen    │───►│   manifest   │
//! │   fluent     │    │ validated IR │    │ render(unit) │    │ blake3 drift │
//! └──────────────┘    └──────────────┘    └──────────────┘    └──────────────┘
//! ```
//!
//! Names are validated when IR nodes are built ([`Identifier`],
//! [`QualifiedName`], [`TypeRef`]), so rendering is infallible and
//! deterministic.

#![warn(missing_docs)]

pub mod builder;
pub mod codegen;
pub mod error;
pub mod hir;
pub mod manifest;

pub use builder::{ClassBuilder, CompilationUnitBuilder, MethodBuilder};
pub use codegen::{expr_to_string, render};
pub use error::{JavaGenError, Result};
pub use hir::{
    Annotation, BinOp, CatchClause, CompilationUnit, Expr, GenerationMetadata, Identifier,
    Import, JavaClass, JavaMethod, Modifiers, Param, QualifiedName, Stmt, TypeRef, UnaryOp,
    Visibility,
};
pub use manifest::{hash_contents, verify, write_with_manifest, FileManifest};

/// Convenient glob import.
pub mod prelude {
    pub use crate::builder::{ClassBuilder, CompilationUnitBuilder, MethodBuilder};
    pub use crate::codegen::{expr_to_string, render};
    pub use crate::hir::{
        Annotation, CompilationUnit, Expr, GenerationMetadata, Identifier, JavaClass, JavaMethod,
        QualifiedName, Stmt, TypeRef, Visibility,
    };
    pub use crate::manifest::{verify, write_with_manifest, FileManifest};
    pub use crate::{JavaGenError, Result};
}
