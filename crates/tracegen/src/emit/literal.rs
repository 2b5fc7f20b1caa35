//! Java literals for captured scalar values.

use crate::value::CapturedValue;
use tracegen_javagen::{Expr, Result};

/// Literal for a scalar value; `None` for objects and opaque values.
///
/// `byte` and `short` are cast so overload resolution sees the captured
/// type. Unpaired UTF-16 surrogates cannot be written as `char` literals and
/// are cast from their code unit.
pub(crate) fn scalar(value: &CapturedValue) -> Result<Option<Expr>> {
    let expr = match value {
        CapturedValue::Null => Expr::null(),
        CapturedValue::Boolean(b) => Expr::bool(*b),
        CapturedValue::Byte(v) => Expr::int(i32::from(*v)).cast("byte")?,
        CapturedValue::Short(v) => Expr::int(i32::from(*v)).cast("short")?,
        CapturedValue::Char(unit) => match char::from_u32(u32::from(*unit)) {
            Some(c) => Expr::char(c),
            None => Expr::int(i32::from(*unit)).cast("char")?,
        },
        CapturedValue::Int(v) => Expr::int(*v),
        CapturedValue::Long(v) => Expr::long(*v),
        CapturedValue::Float(v) => Expr::float(*v),
        CapturedValue::Double(v) => Expr::double(*v),
        CapturedValue::String(s) => Expr::str(s.clone()),
        CapturedValue::Object(_) | CapturedValue::Reference { .. } | CapturedValue::Cycle => {
            return Ok(None)
        }
    };
    Ok(Some(expr))
}

/// Zero value for a declared type, for argument slots nothing was captured for.
pub(crate) fn default_for(type_name: &str) -> Result<Expr> {
    Ok(match type_name.trim() {
        "boolean" => Expr::bool(false),
        "byte" => Expr::int(0).cast("byte")?,
        "short" => Expr::int(0).cast("short")?,
        "char" => Expr::char('\0'),
        "int" => Expr::int(0),
        "long" => Expr::long(0),
        "float" => Expr::float(0.0),
        "double" => Expr::double(0.0),
        _ => Expr::null(),
    })
}

/// Declared type for which an exact-delta `assertEquals` overload applies.
pub(crate) fn is_floating(type_name: &str) -> bool {
    matches!(
        type_name.trim(),
        "float" | "double" | "Float" | "Double" | "java.lang.Float" | "java.lang.Double"
    )
}
