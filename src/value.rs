//! The descriptor-free logical value carried between the codec and the
//! type-descriptor engine.

/// A parsed or about-to-be-rendered extprot value, shaped by its
/// descriptor but not tied to one.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// A boolean, wire type VINT (0 or 1).
    Bool(bool),
    /// An unsigned byte, wire type VINT, held as `u32` in 0..=255.
    Byte(u32),
    /// A signed 32-bit-range integer, wire type VINT.
    Int(i64),
    /// A signed 64-bit integer, wire type BITS64_LONG.
    Long(i64),
    /// A 64-bit float, wire type BITS64_FLOAT.
    Float(f64),
    /// Raw bytes (also used for UTF-8 text), wire type BYTES.
    String(Vec<u8>),
    /// An ordered, heterogeneous fixed-arity sequence, wire type TUPLE.
    Tuple(Vec<Value>),
    /// An ordered, homogeneous sequence, wire type HTUPLE.
    List(Vec<Value>),
    /// An ordered sequence of key/value pairs, wire type ASSOC.
    Assoc(Vec<(Value, Value)>),
    /// The empty value, wire type ENUM with no payload.
    Unit,
    /// A sum-type constructor selection: the constructor's tag plus its
    /// field values (empty for a nullary constructor). Wire type is ENUM
    /// when `fields` is empty, TUPLE otherwise; the constructor identity
    /// rides on the prefix tag rather than in the payload, the same way
    /// it does for a plain `Tuple`/`List`.
    Variant(u64, Vec<Value>),
}

impl Value {
    /// True if this value is one of the scalar (non-container) kinds.
    pub fn is_scalar(&self) -> bool {
        matches!(
            self,
            Value::Bool(_)
                | Value::Byte(_)
                | Value::Int(_)
                | Value::Long(_)
                | Value::Float(_)
                | Value::String(_)
                | Value::Unit
        )
    }

    /// The tuple's or variant's fields, if this value carries a positional
    /// sequence of them; `None` for scalars, lists, and assocs.
    pub fn positional_fields(&self) -> Option<&[Value]> {
        match self {
            Value::Tuple(fields) => Some(fields),
            Value::Variant(_, fields) => Some(fields),
            _ => None,
        }
    }
}
