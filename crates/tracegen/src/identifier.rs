//! What gets captured, and how each captured value is named and read at its
//! probe point.
//!
//! Identifiers get their [`InternalId`] from an [`IdAllocator`] owned by the
//! planning session. Allocation happens before any probe fires, so capture
//! needs no synchronization.

use crate::method::{is_void_type, validate_type, MethodIdentifier};
use crate::result::{TracegenError, TracegenResult};
use serde::{Deserialize, Serialize};
use tracegen_javagen::{Identifier, QualifiedName};

/// Numeric id that probes emit instead of the identifier itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InternalId(u32);

impl InternalId {
    /// Wrap a raw id, e.g. one read back from a capture record.
    #[must_use]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Raw value.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for InternalId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Monotonic id source for one planning session.
///
/// Deliberately not `Clone`: two copies would hand out the same ids.
#[derive(Debug)]
pub struct IdAllocator {
    next: u32,
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self::new()
    }
}

impl IdAllocator {
    /// Allocator whose first id is 1.
    #[must_use]
    pub const fn new() -> Self {
        Self { next: 1 }
    }

    /// Allocator starting at `first`.
    #[must_use]
    pub const fn starting_at(first: u32) -> Self {
        Self { next: first }
    }

    /// Hand out the next id.
    pub fn allocate(&mut self) -> TracegenResult<InternalId> {
        let id = InternalId(self.next);
        self.next = self
            .next
            .checked_add(1)
            .ok_or_else(|| TracegenError::configuration("identifier id space exhausted"))?;
        Ok(id)
    }

    /// Id the next call to [`Self::allocate`] returns.
    #[must_use]
    pub const fn peek(&self) -> InternalId {
        InternalId(self.next)
    }
}

/// Category of a declared type, used to pick collectors and comparisons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueType {
    /// `boolean`
    Boolean,
    /// `byte`
    Byte,
    /// `char`
    Char,
    /// `short`
    Short,
    /// `int`
    Int,
    /// `long`
    Long,
    /// `float`
    Float,
    /// `double`
    Double,
    /// `java.lang.String`
    String,
    /// Any other reference type
    Object,
    /// `void` / absent
    Void,
}

impl ValueType {
    /// Classify a declared type name.
    #[must_use]
    pub fn of(type_name: &str) -> Self {
        match type_name.trim() {
            "boolean" => Self::Boolean,
            "byte" => Self::Byte,
            "char" => Self::Char,
            "short" => Self::Short,
            "int" => Self::Int,
            "long" => Self::Long,
            "float" => Self::Float,
            "double" => Self::Double,
            "java.lang.String" | "String" => Self::String,
            t if is_void_type(t) => Self::Void,
            _ => Self::Object,
        }
    }

    /// Primitive (non-reference, non-void) type.
    #[must_use]
    pub const fn is_primitive(self) -> bool {
        !matches!(self, Self::String | Self::Object | Self::Void)
    }

    /// Collector entry point the probe calls for this type.
    #[must_use]
    pub const fn collector_method(self) -> &'static str {
        match self {
            Self::Boolean => "collectBoolean",
            Self::Byte => "collectByte",
            Self::Char => "collectChar",
            Self::Short => "collectShort",
            Self::Int => "collectInt",
            Self::Long => "collectLong",
            Self::Float => "collectFloat",
            Self::Double => "collectDouble",
            Self::String => "collectString",
            Self::Object | Self::Void => "collectObject",
        }
    }
}

/// Variant-specific part of a [`ValueIdentifier`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValueKind {
    /// Method argument at a 0-based slot
    Argument {
        /// Argument slot
        slot: u32,
    },
    /// Static or instance field
    Field {
        /// Declaring class
        owner: String,
        /// Field name
        field_name: String,
        /// Static field
        is_static: bool,
    },
    /// Return value of a method; captured at exit only
    ReturnValue {
        /// Owning method
        method: MethodIdentifier,
    },
    /// Local variable slot
    LocalVariable {
        /// Local variable slot
        slot: u32,
        /// Source-level name
        variable_name: String,
    },
}

/// A capturable value: id, declared type and where it comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueIdentifier {
    internal_id: InternalId,
    type_name: String,
    #[serde(flatten)]
    kind: ValueKind,
}

fn checked_slot(slot: i32) -> TracegenResult<u32> {
    u32::try_from(slot)
        .map_err(|_| TracegenError::configuration(format!("negative slot {slot}")))
}

fn checked_type(type_name: String, what: &str) -> TracegenResult<String> {
    let type_name = type_name.trim().to_string();
    if type_name.is_empty() {
        return Err(TracegenError::configuration(format!(
            "{what} requires a type name"
        )));
    }
    validate_type(&type_name)?;
    Ok(type_name)
}

impl ValueIdentifier {
    /// Argument at `slot` (0-based, receiver excluded).
    pub fn argument(
        ids: &mut IdAllocator,
        slot: i32,
        type_name: impl Into<String>,
    ) -> TracegenResult<Self> {
        let slot = checked_slot(slot)?;
        let type_name = checked_type(type_name.into(), "argument")?;
        Ok(Self {
            internal_id: ids.allocate()?,
            type_name,
            kind: ValueKind::Argument { slot },
        })
    }

    /// Field `owner.field_name`.
    pub fn field(
        ids: &mut IdAllocator,
        owner: impl Into<String>,
        field_name: impl Into<String>,
        type_name: impl Into<String>,
        is_static: bool,
    ) -> TracegenResult<Self> {
        let owner = owner.into();
        let field_name = field_name.into();
        QualifiedName::new(owner.as_str()).map_err(|e| {
            TracegenError::configuration(format!("malformed field owner '{owner}': {e}"))
        })?;
        Identifier::new(field_name.as_str()).map_err(|e| {
            TracegenError::configuration(format!("malformed field name '{field_name}': {e}"))
        })?;
        let type_name = checked_type(type_name.into(), "field")?;
        Ok(Self {
            internal_id: ids.allocate()?,
            type_name,
            kind: ValueKind::Field {
                owner,
                field_name,
                is_static,
            },
        })
    }

    /// Return value of `method`; its type is the method's declared return type
    /// and may be void.
    pub fn return_value(ids: &mut IdAllocator, method: &MethodIdentifier) -> TracegenResult<Self> {
        Ok(Self {
            internal_id: ids.allocate()?,
            type_name: method.return_type().to_string(),
            kind: ValueKind::ReturnValue {
                method: method.clone(),
            },
        })
    }

    /// Local variable `variable_name` at `slot`.
    pub fn local_variable(
        ids: &mut IdAllocator,
        slot: i32,
        variable_name: impl Into<String>,
        type_name: impl Into<String>,
    ) -> TracegenResult<Self> {
        let slot = checked_slot(slot)?;
        let variable_name = variable_name.into();
        Identifier::new(variable_name.as_str()).map_err(|e| {
            TracegenError::configuration(format!("malformed variable name '{variable_name}': {e}"))
        })?;
        let type_name = checked_type(type_name.into(), "local variable")?;
        Ok(Self {
            internal_id: ids.allocate()?,
            type_name,
            kind: ValueKind::LocalVariable {
                slot,
                variable_name,
            },
        })
    }

    /// Id assigned at construction.
    #[must_use]
    pub const fn internal_id(&self) -> InternalId {
        self.internal_id
    }

    /// Declared type name; may be empty for return values.
    #[must_use]
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Category of the declared type.
    #[must_use]
    pub fn value_type(&self) -> ValueType {
        ValueType::of(&self.type_name)
    }

    /// Variant data.
    #[must_use]
    pub const fn kind(&self) -> &ValueKind {
        &self.kind
    }

    /// Human-facing name: `arg0`, the field name, `return_add`, or the
    /// variable name.
    #[must_use]
    pub fn name(&self) -> String {
        match &self.kind {
            ValueKind::Argument { slot } => format!("arg{slot}"),
            ValueKind::Field { field_name, .. } => field_name.clone(),
            ValueKind::ReturnValue { method } => format!("return_{}", method.method_name()),
            ValueKind::LocalVariable { variable_name, .. } => variable_name.clone(),
        }
    }

    /// Source-level local name, unique per identifier: `<name>_<id>`.
    #[must_use]
    pub fn local_name(&self) -> String {
        format!("{}_{}", self.name(), self.internal_id)
    }

    /// Argument slot, if this is an argument.
    #[must_use]
    pub const fn argument_slot(&self) -> Option<u32> {
        match self.kind {
            ValueKind::Argument { slot } => Some(slot),
            _ => None,
        }
    }

    /// Field identifier.
    #[must_use]
    pub const fn is_field(&self) -> bool {
        matches!(self.kind, ValueKind::Field { .. })
    }

    /// Only return values are read at method exit.
    #[must_use]
    pub const fn requires_after_capture(&self) -> bool {
        matches!(self.kind, ValueKind::ReturnValue { .. })
    }

    /// Return value whose declared type is void or absent.
    #[must_use]
    pub fn is_void_return(&self) -> bool {
        self.requires_after_capture() && is_void_type(&self.type_name)
    }

    /// Statement reading the value at the entry probe. Empty for return
    /// values, which are read by [`Self::emit_exit_code`].
    #[must_use]
    pub fn emit_code(&self) -> String {
        let ty = &self.type_name;
        let class = erased(ty);
        let local = self.local_name();
        match &self.kind {
            ValueKind::Argument { slot } => {
                format!("{ty} {local} = di.getMethodArgumentValue({slot}, {class}.class);")
            }
            ValueKind::LocalVariable { slot, .. } => {
                format!("{ty} {local} = di.getLocalVariableValue({slot}, {class}.class);")
            }
            ValueKind::Field {
                owner,
                field_name,
                is_static: true,
            } => format!(
                "{ty} {local} = di.getStaticFieldValue({}.class, \"{field_name}\", {class}.class);",
                source_class(owner)
            ),
            ValueKind::Field {
                owner,
                field_name,
                is_static: false,
            } => format!(
                "{ty} {local} = di.getInstanceFieldValue(di.getThis(), {}.class, \"{field_name}\", {class}.class);",
                source_class(owner)
            ),
            ValueKind::ReturnValue { .. } => String::new(),
        }
    }

    /// Statement reading the value at the exit probe: the operand stack top
    /// for non-void return values, the field again for fields.
    #[must_use]
    pub fn emit_exit_code(&self) -> Option<String> {
        match &self.kind {
            ValueKind::ReturnValue { .. } if self.is_void_return() => None,
            ValueKind::ReturnValue { .. } => Some(format!(
                "{} {} = di.getStackValue(0, {}.class);",
                self.type_name,
                self.local_name(),
                erased(&self.type_name)
            )),
            ValueKind::Field { .. } => Some(self.emit_code()),
            ValueKind::Argument { .. } | ValueKind::LocalVariable { .. } => None,
        }
    }

    /// Call handing the local to the runtime collector.
    #[must_use]
    pub fn emit_collector_call(&self) -> String {
        format!(
            "CollectorRE.{}({}, {});",
            self.value_type().collector_method(),
            self.internal_id,
            self.local_name()
        )
    }
}

/// `java.util.List<String>` -> `java.util.List`, for class literals.
fn erased(type_name: &str) -> &str {
    type_name.split('<').next().unwrap_or(type_name).trim()
}

/// Binary nested-class names use `$`; source uses `.`.
pub(crate) fn source_class(binary_name: &str) -> String {
    binary_name.replace('$', ".")
}
