//! The type-descriptor engine: a closed set of descriptor kinds, dispatched
//! by `match` rather than `dyn Trait`, that drives parsing, rendering,
//! defaulting and skip-compatibility for every value the codec handles.
//!
//! Descriptors are built once (by a schema loader outside this crate's
//! scope) and never mutated afterward, so recursive and self-referential
//! shapes are modeled with `Rc` sharing rather than an arena or unsafe
//! self-reference.

use std::rc::Rc;

use crate::error::{Error, Result};
use crate::value::Value;
use crate::wire::WireType;

/// One constructor of a sum type: a name (for schema tooling, unused by
/// the wire format itself), the tag it dispatches on, and its field
/// descriptors in order. An empty `fields` constructor is nullary and
/// reads/writes as `ENUM`; a non-empty one reads/writes as `TUPLE`.
#[derive(Debug, Clone)]
pub struct Constructor {
    pub name: String,
    pub tag: u64,
    pub fields: Vec<Rc<Descriptor>>,
}

impl Constructor {
    /// Convenience constructor.
    pub fn new(name: impl Into<String>, tag: u64, fields: Vec<Rc<Descriptor>>) -> Self {
        Self {
            name: name.into(),
            tag,
            fields,
        }
    }

    /// The wire type this constructor's payload uses.
    pub fn wire_type(&self) -> WireType {
        if self.fields.is_empty() {
            WireType::Enum
        } else {
            WireType::Tuple
        }
    }
}

/// A type descriptor: the closed set of shapes a value on the wire can
/// take. See the module docs for why this is a `match`-dispatched enum
/// rather than a trait object.
#[derive(Debug)]
pub enum Descriptor {
    Bool,
    Byte,
    Int,
    Long,
    Float,
    String,
    /// A fixed-arity, ordered, heterogeneous sequence. Also the on-wire
    /// shape of a `Message`: record field names are schema metadata, not
    /// wire content, so both read back as [`Value::Tuple`].
    Tuple(Vec<Rc<Descriptor>>),
    /// A record. Field names are carried only for schema tooling; on the
    /// wire this is indistinguishable from a same-arity `Tuple`.
    Message { fields: Vec<(String, Rc<Descriptor>)> },
    /// A homogeneous sequence. Ordinarily has one item descriptor; more
    /// than one models the legacy multi-subtype `HTUPLE` some older
    /// producers wrote, where the item's type cycles by position modulo
    /// the subtype count. New values always write with exactly one.
    List(Vec<Rc<Descriptor>>),
    Assoc {
        key: Rc<Descriptor>,
        value: Rc<Descriptor>,
    },
    /// A disjoint union, dispatched by the constructor's tag.
    Sum(Vec<Constructor>),
}

impl Descriptor {
    /// Wraps a fixed-arity tuple descriptor.
    pub fn tuple(fields: Vec<Rc<Descriptor>>) -> Rc<Descriptor> {
        Rc::new(Descriptor::Tuple(fields))
    }

    /// Wraps a record descriptor.
    pub fn message(fields: Vec<(String, Rc<Descriptor>)>) -> Rc<Descriptor> {
        Rc::new(Descriptor::Message { fields })
    }

    /// Wraps a homogeneous list descriptor with a single item type.
    pub fn list(item: Rc<Descriptor>) -> Rc<Descriptor> {
        Rc::new(Descriptor::List(vec![item]))
    }

    /// Wraps a legacy multi-subtype list descriptor. Only meaningful on
    /// the read path; `write_value` always emits a single-subtype HTUPLE.
    pub fn list_cycling(items: Vec<Rc<Descriptor>>) -> Rc<Descriptor> {
        Rc::new(Descriptor::List(items))
    }

    /// Wraps an association-list descriptor.
    pub fn assoc(key: Rc<Descriptor>, value: Rc<Descriptor>) -> Rc<Descriptor> {
        Rc::new(Descriptor::Assoc { key, value })
    }

    /// Wraps a sum-type descriptor.
    pub fn sum(constructors: Vec<Constructor>) -> Rc<Descriptor> {
        Rc::new(Descriptor::Sum(constructors))
    }

    /// The `(wire type, tag)` pairs this descriptor accepts when reading.
    /// Every kind but `Sum` accepts exactly one pair at tag 0; `Sum`
    /// accepts one pair per constructor.
    pub fn wire_types(&self) -> Vec<(WireType, u64)> {
        match self {
            Descriptor::Bool | Descriptor::Byte | Descriptor::Int => vec![(WireType::Vint, 0)],
            Descriptor::Long => vec![(WireType::Bits64Long, 0)],
            Descriptor::Float => vec![(WireType::Bits64Float, 0)],
            Descriptor::String => vec![(WireType::Bytes, 0)],
            Descriptor::Tuple(_) | Descriptor::Message { .. } => vec![(WireType::Tuple, 0)],
            Descriptor::List(_) => vec![(WireType::Htuple, 0)],
            Descriptor::Assoc { .. } => vec![(WireType::Assoc, 0)],
            Descriptor::Sum(ctors) => ctors.iter().map(|c| (c.wire_type(), c.tag)).collect(),
        }
    }

    /// The positional field descriptors of a `Tuple` or `Message`.
    pub fn tuple_fields(&self) -> Option<&[Rc<Descriptor>]> {
        match self {
            Descriptor::Tuple(fields) => Some(fields),
            // Message fields are stored as (name, descriptor) pairs; callers
            // needing just the descriptors go through `message_fields`.
            _ => None,
        }
    }

    /// The `(name, descriptor)` pairs of a `Message`.
    pub fn message_fields(&self) -> Option<&[(String, Rc<Descriptor>)]> {
        match self {
            Descriptor::Message { fields } => Some(fields),
            _ => None,
        }
    }

    /// True if this descriptor reads/writes as a positional sequence
    /// (`Tuple` or `Message`), and the field descriptors in that case.
    pub fn positional_fields(&self) -> Option<Vec<Rc<Descriptor>>> {
        match self {
            Descriptor::Tuple(fields) => Some(fields.clone()),
            Descriptor::Message { fields } => {
                Some(fields.iter().map(|(_, d)| d.clone()).collect())
            }
            _ => None,
        }
    }

    /// The cycling item descriptors of a `List`.
    pub fn list_subtypes(&self) -> Option<&[Rc<Descriptor>]> {
        match self {
            Descriptor::List(items) => Some(items),
            _ => None,
        }
    }

    /// The key/value descriptors of an `Assoc`.
    pub fn assoc_kv(&self) -> Option<(&Descriptor, &Descriptor)> {
        match self {
            Descriptor::Assoc { key, value } => Some((key, value)),
            _ => None,
        }
    }

    /// The constructors of a `Sum`.
    pub fn constructors(&self) -> Option<&[Constructor]> {
        match self {
            Descriptor::Sum(ctors) => Some(ctors),
            _ => None,
        }
    }

    /// Looks up a `Sum`'s constructor by its wire tag.
    pub fn constructor_by_tag(&self, tag: u64) -> Option<&Constructor> {
        self.constructors()?.iter().find(|c| c.tag == tag)
    }

    /// The canonical default value for this descriptor, or
    /// `Err(Error::UndefinedDefault)` if none can be constructed.
    ///
    /// Scalars default to their zero value; containers default to empty;
    /// tuples and messages default to the tuple of their fields'
    /// defaults; sums default to their first nullary constructor, or
    /// `UndefinedDefault` if none exists.
    pub fn default_value(&self) -> Result<Value> {
        match self {
            Descriptor::Bool => Ok(Value::Bool(false)),
            Descriptor::Byte => Ok(Value::Byte(0)),
            Descriptor::Int => Ok(Value::Int(0)),
            Descriptor::Long => Ok(Value::Long(0)),
            Descriptor::Float => Ok(Value::Float(0.0)),
            Descriptor::String => Ok(Value::String(Vec::new())),
            Descriptor::Tuple(fields) => {
                let defaults = fields
                    .iter()
                    .map(|f| f.default_value())
                    .collect::<Result<Vec<_>>>()?;
                Ok(Value::Tuple(defaults))
            }
            Descriptor::Message { fields } => {
                let defaults = fields
                    .iter()
                    .map(|(_, f)| f.default_value())
                    .collect::<Result<Vec<_>>>()?;
                Ok(Value::Tuple(defaults))
            }
            Descriptor::List(_) => Ok(Value::List(Vec::new())),
            Descriptor::Assoc { .. } => Ok(Value::Assoc(Vec::new())),
            Descriptor::Sum(ctors) => ctors
                .iter()
                .find(|ctor| ctor.fields.is_empty())
                .map(|ctor| Value::Variant(ctor.tag, Vec::new()))
                .ok_or(Error::UndefinedDefault),
        }
    }
}
