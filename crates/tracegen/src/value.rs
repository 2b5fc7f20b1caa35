//! Runtime values as recorded by the collector.

use crate::identifier::ValueType;
use crate::result::{TracegenError, TracegenResult};
use serde::{Deserialize, Serialize};

/// A captured runtime value.
///
/// Externally tagged so the same type travels through bincode capture
/// records and JSON trace artifacts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CapturedValue {
    /// `null`
    Null,
    /// `boolean`
    Boolean(bool),
    /// `byte`
    Byte(i8),
    /// `char` as a UTF-16 code unit
    Char(u16),
    /// `short`
    Short(i16),
    /// `int`
    Int(i32),
    /// `long`
    Long(i64),
    /// `float`
    Float(#[serde(with = "float_repr::single")] f32),
    /// `double`
    Double(#[serde(with = "float_repr::double")] f64),
    /// `java.lang.String`
    String(String),
    /// Object snapshot
    Object(ObjectSnapshot),
    /// Object the collector did not expand (depth limit, array, opaque type)
    Reference {
        /// Runtime class name
        class_name: String,
    },
    /// Back-reference to an object already on the snapshot path
    Cycle,
}

/// Field-by-field snapshot of an object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectSnapshot {
    /// Runtime (binary) class name
    pub class_name: String,
    /// Fields in collector order
    pub fields: Vec<SnapshotField>,
}

/// One field of an [`ObjectSnapshot`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotField {
    /// Field name
    pub name: String,
    /// Field value
    pub value: CapturedValue,
}

const CLASS_KEY: &str = "$class";
const VALUE_KEY: &str = "$value";
const REF_PREFIX: &str = "$ref:";
const CYCLE_MARKER: &str = "$cycle";

impl CapturedValue {
    /// Parse the collector's JSON form.
    ///
    /// Numbers become `Int`/`Long`/`Double` and are narrowed later by
    /// [`Self::conform`]. Objects carry their class under `$class`; boxed
    /// values put the payload under `$value`.
    pub fn from_json(json: &serde_json::Value) -> TracegenResult<Self> {
        use serde_json::Value;
        Ok(match json {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Boolean(*b),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    i32::try_from(i).map_or(Self::Long(i), Self::Int)
                } else if let Some(f) = n.as_f64() {
                    Self::Double(f)
                } else {
                    return Err(TracegenError::capture(format!(
                        "numeric value {n} out of range"
                    )));
                }
            }
            Value::String(s) if s == CYCLE_MARKER => Self::Cycle,
            Value::String(s) => match s.strip_prefix(REF_PREFIX) {
                Some(class_name) => Self::Reference {
                    class_name: class_name.to_string(),
                },
                None => Self::String(s.clone()),
            },
            Value::Array(_) => Self::Reference {
                class_name: "java.lang.Object[]".to_string(),
            },
            Value::Object(map) => {
                let class_name = map
                    .get(CLASS_KEY)
                    .and_then(Value::as_str)
                    .unwrap_or("java.lang.Object")
                    .to_string();
                if let Some(inner) = map.get(VALUE_KEY) {
                    let inner = Self::from_json(inner)?;
                    return Ok(boxed_value_type(&class_name)
                        .and_then(|ty| inner.conform(ty))
                        .unwrap_or(inner));
                }
                let fields = map
                    .iter()
                    .filter(|(key, _)| key.as_str() != CLASS_KEY)
                    .map(|(name, value)| {
                        Ok(SnapshotField {
                            name: name.clone(),
                            value: Self::from_json(value)?,
                        })
                    })
                    .collect::<TracegenResult<Vec<_>>>()?;
                Self::Object(ObjectSnapshot { class_name, fields })
            }
        })
    }

    /// Coerce to the declared type, or `None` when the value cannot inhabit
    /// it (wrong kind, out of range, null for a primitive).
    #[must_use]
    pub fn conform(&self, ty: ValueType) -> Option<Self> {
        let integral = self.as_i64();
        match ty {
            ValueType::Void => None,
            ValueType::Boolean => match self {
                Self::Boolean(b) => Some(Self::Boolean(*b)),
                _ => None,
            },
            ValueType::Byte => integral
                .and_then(|v| i8::try_from(v).ok())
                .map(Self::Byte),
            ValueType::Short => integral
                .and_then(|v| i16::try_from(v).ok())
                .map(Self::Short),
            ValueType::Char => match self {
                Self::String(s) => {
                    let mut units = s.encode_utf16();
                    match (units.next(), units.next()) {
                        (Some(unit), None) => Some(Self::Char(unit)),
                        _ => None,
                    }
                }
                _ => integral
                    .and_then(|v| u16::try_from(v).ok())
                    .map(Self::Char),
            },
            ValueType::Int => integral
                .and_then(|v| i32::try_from(v).ok())
                .map(Self::Int),
            ValueType::Long => integral.map(Self::Long),
            #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
            ValueType::Float => match self {
                Self::Float(f) => Some(Self::Float(*f)),
                Self::Double(d) => Some(Self::Float(*d as f32)),
                _ => integral.map(|v| Self::Float(v as f32)),
            },
            #[allow(clippy::cast_precision_loss)]
            ValueType::Double => match self {
                Self::Float(f) => Some(Self::Double(f64::from(*f))),
                Self::Double(d) => Some(Self::Double(*d)),
                _ => integral.map(|v| Self::Double(v as f64)),
            },
            ValueType::String => match self {
                Self::String(_) | Self::Null => Some(self.clone()),
                _ => None,
            },
            ValueType::Object => Some(self.clone()),
        }
    }

    fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Byte(v) => Some(i64::from(*v)),
            Self::Char(v) => Some(i64::from(*v)),
            Self::Short(v) => Some(i64::from(*v)),
            Self::Int(v) => Some(i64::from(*v)),
            Self::Long(v) => Some(*v),
            _ => None,
        }
    }

    /// Boundary values worth a dedicated test: null, empty string, integral
    /// MIN/MAX, NaN and infinities. Zero is an ordinary value.
    #[must_use]
    pub fn is_edge_value(&self) -> bool {
        match self {
            Self::Null => true,
            Self::String(s) => s.is_empty(),
            Self::Byte(v) => *v == i8::MIN || *v == i8::MAX,
            Self::Char(v) => *v == u16::MIN || *v == u16::MAX,
            Self::Short(v) => *v == i16::MIN || *v == i16::MAX,
            Self::Int(v) => *v == i32::MIN || *v == i32::MAX,
            Self::Long(v) => *v == i64::MIN || *v == i64::MAX,
            Self::Float(v) => !v.is_finite(),
            Self::Double(v) => !v.is_finite(),
            Self::Boolean(_) | Self::Object(_) | Self::Reference { .. } | Self::Cycle => false,
        }
    }

    /// Value the emitter cannot rebuild as a literal.
    #[must_use]
    pub const fn is_opaque(&self) -> bool {
        matches!(self, Self::Reference { .. } | Self::Cycle)
    }

    /// Short kind label for summaries and log fields.
    #[must_use]
    pub const fn kind_label(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Boolean(_) => "boolean",
            Self::Byte(_) => "byte",
            Self::Char(_) => "char",
            Self::Short(_) => "short",
            Self::Int(_) => "int",
            Self::Long(_) => "long",
            Self::Float(_) => "float",
            Self::Double(_) => "double",
            Self::String(_) => "string",
            Self::Object(_) => "object",
            Self::Reference { .. } => "reference",
            Self::Cycle => "cycle",
        }
    }
}

impl std::fmt::Display for CapturedValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Boolean(v) => write!(f, "{v}"),
            Self::Byte(v) => write!(f, "{v}"),
            Self::Char(v) => match char::from_u32(u32::from(*v)) {
                Some(c) => write!(f, "{c:?}"),
                None => write!(f, "\\u{v:04x}"),
            },
            Self::Short(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Long(v) => write!(f, "{v}L"),
            Self::Float(v) => write!(f, "{v}f"),
            Self::Double(v) => write!(f, "{v}"),
            Self::String(v) => write!(f, "{v:?}"),
            Self::Object(snapshot) => {
                write!(f, "{}{{", snapshot.class_name)?;
                for (i, field) in snapshot.fields.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}={}", field.name, field.value)?;
                }
                f.write_str("}")
            }
            Self::Reference { class_name } => write!(f, "<{class_name}>"),
            Self::Cycle => f.write_str("<cycle>"),
        }
    }
}

fn boxed_value_type(class_name: &str) -> Option<ValueType> {
    Some(match class_name {
        "java.lang.Boolean" => ValueType::Boolean,
        "java.lang.Byte" => ValueType::Byte,
        "java.lang.Character" => ValueType::Char,
        "java.lang.Short" => ValueType::Short,
        "java.lang.Integer" => ValueType::Int,
        "java.lang.Long" => ValueType::Long,
        "java.lang.Float" => ValueType::Float,
        "java.lang.Double" => ValueType::Double,
        "java.lang.String" => ValueType::String,
        _ => return None,
    })
}

/// JSON has no NaN or infinity: human-readable formats get those as strings,
/// binary formats get the raw float.
mod float_repr {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    #[derive(Serialize, Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Number(f64),
        Text(String),
    }

    fn to_repr(v: f64) -> Repr {
        if v.is_nan() {
            Repr::Text("NaN".to_string())
        } else if v.is_infinite() {
            Repr::Text(if v > 0.0 { "Infinity" } else { "-Infinity" }.to_string())
        } else {
            Repr::Number(v)
        }
    }

    fn from_repr<E: serde::de::Error>(repr: Repr) -> Result<f64, E> {
        match repr {
            Repr::Number(v) => Ok(v),
            Repr::Text(text) => match text.as_str() {
                "NaN" => Ok(f64::NAN),
                "Infinity" => Ok(f64::INFINITY),
                "-Infinity" => Ok(f64::NEG_INFINITY),
                other => Err(E::custom(format!("invalid float '{other}'"))),
            },
        }
    }

    pub mod double {
        use super::*;

        pub fn serialize<S: Serializer>(v: &f64, s: S) -> Result<S::Ok, S::Error> {
            if s.is_human_readable() {
                to_repr(*v).serialize(s)
            } else {
                s.serialize_f64(*v)
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
            if d.is_human_readable() {
                from_repr(Repr::deserialize(d)?)
            } else {
                f64::deserialize(d)
            }
        }
    }

    pub mod single {
        use super::*;

        pub fn serialize<S: Serializer>(v: &f32, s: S) -> Result<S::Ok, S::Error> {
            if s.is_human_readable() {
                to_repr(f64::from(*v)).serialize(s)
            } else {
                s.serialize_f32(*v)
            }
        }

        #[allow(clippy::cast_possible_truncation)]
        pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<f32, D::Error> {
            if d.is_human_readable() {
                from_repr(Repr::deserialize(d)?).map(|v| v as f32)
            } else {
                f32::deserialize(d)
            }
        }
    }
}
