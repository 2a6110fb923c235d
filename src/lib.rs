//! A compact, self-delimiting, extensible binary serialization codec.
//!
//! Every value on the wire carries its own wire type and tag in a single
//! prefix varint, and every composite value is length-prefixed, so a
//! reader can always skip a value it doesn't understand without parsing
//! its contents. A [`Descriptor`] describes the shape a [`Value`] should
//! take; [`from_bytes`]/[`to_bytes`] (and their streaming counterparts
//! [`from_source`]/[`to_sink`]) convert between the two.
//!
//! ```
//! use std::rc::Rc;
//! use extprot::{Descriptor, Value, to_bytes, from_bytes};
//!
//! let desc = Descriptor::tuple(vec![Rc::new(Descriptor::Int), Rc::new(Descriptor::Bool)]);
//! let value = Value::Tuple(vec![Value::Int(7), Value::Bool(true)]);
//! let bytes = to_bytes(&value, &desc).unwrap();
//! assert_eq!(from_bytes(&bytes, &desc).unwrap(), value);
//! ```

mod codec;
mod descriptor;
mod error;
mod value;
mod varint;
mod wire;

#[cfg(test)]
mod tests;

pub use codec::{from_bytes, from_source, read_next, read_value, skip_value, to_bytes, to_sink, write_value};
pub use descriptor::{Constructor, Descriptor};
pub use error::{Error, Result};
pub use value::Value;
pub use wire::{Reader, SourceStream, WireRead, WireType, Writer};
