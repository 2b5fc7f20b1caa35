//! Reflective helpers appended to a generated test class.
//!
//! Tests arrange receivers and fields without touching production
//! visibility, so the class carries a handful of private static helpers.
//! Only the helpers a class actually calls are emitted.

use tracegen_javagen::{Expr, JavaMethod, MethodBuilder, Result, Stmt, Visibility};

pub(crate) const INSTANTIATE: &str = "instantiate";
pub(crate) const SET_FIELD: &str = "setField";
pub(crate) const SET_STATIC_FIELD: &str = "setStaticField";
pub(crate) const READ_FIELD: &str = "readField";
pub(crate) const READ_STATIC_FIELD: &str = "readStaticField";
const FIND_FIELD: &str = "findField";

/// Helpers referenced so far by one class.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct Helpers {
    pub instantiate: bool,
    pub set_field: bool,
    pub set_static_field: bool,
    pub read_field: bool,
    pub read_static_field: bool,
}

impl Helpers {
    fn needs_find_field(self) -> bool {
        self.set_field || self.set_static_field || self.read_field || self.read_static_field
    }

    /// Imports the emitted helpers rely on.
    pub fn imports(self) -> Vec<&'static str> {
        let mut imports = Vec::new();
        if self.instantiate {
            imports.push("java.lang.reflect.Constructor");
        }
        if self.needs_find_field() {
            imports.push("java.lang.reflect.Field");
        }
        imports
    }

    /// Helper methods, in a fixed order.
    pub fn methods(self) -> Result<Vec<JavaMethod>> {
        let mut methods = Vec::new();
        if self.instantiate {
            methods.push(instantiate()?);
        }
        if self.set_field {
            methods.push(accessor(SET_FIELD, false, true)?);
        }
        if self.set_static_field {
            methods.push(accessor(SET_STATIC_FIELD, true, true)?);
        }
        if self.read_field {
            methods.push(accessor(READ_FIELD, false, false)?);
        }
        if self.read_static_field {
            methods.push(accessor(READ_STATIC_FIELD, true, false)?);
        }
        if self.needs_find_field() {
            methods.push(find_field()?);
        }
        Ok(methods)
    }
}

fn helper(name: &str) -> Result<MethodBuilder> {
    Ok(MethodBuilder::new(name)?
        .visibility(Visibility::Private)
        .static_())
}

/// `<T> T instantiate(Class<T> type)` through the no-arg constructor.
fn instantiate() -> Result<JavaMethod> {
    let constructor = Expr::ident("constructor")?;
    Ok(helper(INSTANTIATE)?
        .type_param("T")?
        .returns("T")?
        .param("Class<T>", "type")?
        .throws("Exception")?
        .stmt(Stmt::local(
            "Constructor<T>",
            "constructor",
            Expr::ident("type")?.call("getDeclaredConstructor", Vec::new())?,
        )?)
        .stmt(Stmt::expr(
            constructor
                .clone()
                .call("setAccessible", vec![Expr::bool(true)])?,
        ))
        .stmt(Stmt::ret_val(constructor.call("newInstance", Vec::new())?))
        .build())
}

/// `setField`/`setStaticField`/`readField`/`readStaticField`.
fn accessor(name: &str, is_static: bool, writes: bool) -> Result<JavaMethod> {
    let (owner_ty, owner_name, class_expr, target) = if is_static {
        ("Class<?>", "owner", Expr::ident("owner")?, Expr::null())
    } else {
        (
            "Object",
            "target",
            Expr::ident("target")?.call("getClass", Vec::new())?,
            Expr::ident("target")?,
        )
    };
    let field = Expr::invoke(FIND_FIELD, vec![class_expr, Expr::ident("name")?])?;
    let builder = helper(name)?
        .param(owner_ty, owner_name)?
        .param("String", "name")?;
    let builder = if writes {
        builder
            .param("Object", "value")?
            .throws("Exception")?
            .stmt(Stmt::expr(
                field.call("set", vec![target, Expr::ident("value")?])?,
            ))
    } else {
        builder
            .returns("Object")?
            .throws("Exception")?
            .stmt(Stmt::ret_val(field.call("get", vec![target])?))
    };
    Ok(builder.build())
}

/// Walks the superclass chain so inherited fields resolve.
fn find_field() -> Result<JavaMethod> {
    let current = || Expr::ident("current");
    let field = || Expr::ident("field");
    let lookup = vec![
        Stmt::local(
            "Field",
            "field",
            current()?.call("getDeclaredField", vec![Expr::ident("name")?])?,
        )?,
        Stmt::expr(field()?.call("setAccessible", vec![Expr::bool(true)])?),
        Stmt::ret_val(field()?),
    ];
    let next = vec![Stmt::assign(
        current()?,
        current()?.call("getSuperclass", Vec::new())?,
    )];
    Ok(helper(FIND_FIELD)?
        .returns("Field")?
        .param("Class<?>", "type")?
        .param("String", "name")?
        .throws("NoSuchFieldException")?
        .stmt(Stmt::local("Class<?>", "current", Expr::ident("type")?)?)
        .stmt(Stmt::while_loop(
            current()?.ne(Expr::null()),
            vec![Stmt::try_catch(lookup, "NoSuchFieldException", "e", next)?],
        ))
        .stmt(Stmt::throw(Expr::new_object(
            "NoSuchFieldException",
            vec![Expr::ident("name")?],
        )?))
        .build())
}
