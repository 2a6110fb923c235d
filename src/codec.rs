//! Read/write dispatch: the primitive tag layer and composite framing
//! driven by a [`Descriptor`], plus the public `from_bytes`/`from_source`/
//! `to_bytes`/`to_sink` entry points.

use std::rc::Rc;

use crate::descriptor::Descriptor;
use crate::error::{Error, Result};
use crate::value::Value;
use crate::varint::{decode_signed, decode_unsigned, decode_unsigned_prefix};
use crate::wire::{compose_prefix, decompose_prefix, Reader, SourceStream, WireRead, WireType, Writer};

/// Reads one prefixed value according to `desc`. A stream with nothing
/// left at all yields the clean `Eof`; one that ends partway through the
/// value's prefix or body yields `UnexpectedEof`.
pub fn read_value<R: WireRead>(stream: &mut R, desc: &Descriptor) -> Result<Value> {
    let prefix = decode_unsigned_prefix(stream)?;
    let (wire_type, tag) = decompose_prefix(prefix)?;
    read_body(stream, desc, wire_type, tag)
}

/// Reads one prefixed value from a [`Reader`]. Kept as a thin alias of
/// [`read_value`] for callers that want the `Reader`-specific signature;
/// the `Eof`-versus-`UnexpectedEof` distinction lives in `read_value`
/// itself now, for every stream kind, not just `Reader`.
pub fn read_next(stream: &mut Reader<'_>, desc: &Descriptor) -> Result<Value> {
    read_value(stream, desc)
}

fn read_body<R: WireRead>(
    stream: &mut R,
    desc: &Descriptor,
    wire_type: WireType,
    tag: u64,
) -> Result<Value> {
    match desc {
        Descriptor::Bool => {
            expect(wire_type, tag, WireType::Vint)?;
            Ok(Value::Bool(decode_unsigned(stream)? != 0))
        }
        Descriptor::Byte => {
            expect(wire_type, tag, WireType::Vint)?;
            let n = decode_unsigned(stream)?;
            if n > 255 {
                return Err(Error::ParseError(format!("byte value {n} out of range")));
            }
            Ok(Value::Byte(n as u32))
        }
        Descriptor::Int => {
            expect(wire_type, tag, WireType::Vint)?;
            Ok(Value::Int(decode_signed(stream)?))
        }
        Descriptor::Long => {
            expect(wire_type, tag, WireType::Bits64Long)?;
            let mut buf = Vec::with_capacity(8);
            stream.read_into(8, &mut buf)?;
            Ok(Value::Long(i64::from_le_bytes(buf.try_into().unwrap())))
        }
        Descriptor::Float => {
            expect(wire_type, tag, WireType::Bits64Float)?;
            let mut buf = Vec::with_capacity(8);
            stream.read_into(8, &mut buf)?;
            Ok(Value::Float(f64::from_le_bytes(buf.try_into().unwrap())))
        }
        Descriptor::String => {
            expect(wire_type, tag, WireType::Bytes)?;
            let len = decode_unsigned(stream)? as usize;
            let mut buf = Vec::with_capacity(len);
            stream.read_into(len, &mut buf)?;
            Ok(Value::String(buf))
        }
        Descriptor::Tuple(_) | Descriptor::Message { .. } => {
            read_tuple_or_promoted(stream, desc, wire_type, tag)
        }
        Descriptor::List(items) => {
            if wire_type != WireType::Htuple {
                return Err(Error::UnexpectedWireType {
                    found: wire_type,
                    tag,
                });
            }
            if items.is_empty() {
                return Err(Error::ParseError("list descriptor has no item type".into()));
            }
            let (mut sub, count) = read_composite(stream)?;
            let mut out = Vec::with_capacity(count as usize);
            for i in 0..count {
                let item_desc = &items[(i as usize) % items.len()];
                out.push(read_value(&mut sub, item_desc)?);
            }
            Ok(Value::List(out))
        }
        Descriptor::Assoc { key, value } => {
            if wire_type != WireType::Assoc {
                return Err(Error::UnexpectedWireType {
                    found: wire_type,
                    tag,
                });
            }
            let (mut sub, count) = read_composite(stream)?;
            let mut out = Vec::with_capacity(count as usize);
            for _ in 0..count {
                let k = read_value(&mut sub, key)?;
                let v = read_value(&mut sub, value)?;
                out.push((k, v));
            }
            Ok(Value::Assoc(out))
        }
        Descriptor::Sum(ctors) => read_sum(stream, ctors, wire_type, tag),
    }
}

fn read_tuple_or_promoted<R: WireRead>(
    stream: &mut R,
    desc: &Descriptor,
    wire_type: WireType,
    tag: u64,
) -> Result<Value> {
    let fields = desc.positional_fields().expect("caller checked kind");
    if wire_type == WireType::Tuple {
        let (mut sub, count) = read_composite(stream)?;
        return Ok(Value::Tuple(read_positional_body(&mut sub, &fields, count)?));
    }
    // Promotion: a bare primitive on the wire where a tuple or record is
    // expected becomes the first field; any remaining fields take their
    // defaults.
    if fields.is_empty() {
        return Err(Error::ParseError(
            "could not promote primitive to Tuple type".into(),
        ));
    }
    if fields[0]
        .wire_types()
        .iter()
        .any(|&(w, t)| w == wire_type && t == tag)
    {
        let first = read_body(stream, &fields[0], wire_type, tag)?;
        let mut out = Vec::with_capacity(fields.len());
        out.push(first);
        for fd in fields.iter().skip(1) {
            out.push(fd.default_value()?);
        }
        return Ok(Value::Tuple(out));
    }
    Err(Error::UnexpectedWireType {
        found: wire_type,
        tag,
    })
}

fn read_sum<R: WireRead>(
    stream: &mut R,
    ctors: &[crate::descriptor::Constructor],
    wire_type: WireType,
    tag: u64,
) -> Result<Value> {
    if let Some(ctor) = ctors.iter().find(|c| c.tag == tag) {
        if ctor.wire_type() != wire_type {
            return Err(Error::UnexpectedWireType {
                found: wire_type,
                tag,
            });
        }
        if ctor.fields.is_empty() {
            return Ok(Value::Variant(tag, Vec::new()));
        }
        let (mut sub, count) = read_composite(stream)?;
        let fields = read_positional_body(&mut sub, &ctor.fields, count)?;
        return Ok(Value::Variant(tag, fields));
    }
    // Promotion: a single-constructor sum written as the bare value of its
    // first field; any remaining fields take their defaults.
    if let [ctor] = ctors {
        if let [first, rest @ ..] = ctor.fields.as_slice() {
            if first
                .wire_types()
                .iter()
                .any(|&(w, t)| w == wire_type && t == tag)
            {
                let v = read_body(stream, first, wire_type, tag)?;
                let mut out = Vec::with_capacity(ctor.fields.len());
                out.push(v);
                for fd in rest {
                    out.push(fd.default_value()?);
                }
                return Ok(Value::Variant(ctor.tag, out));
            }
        }
    }
    Err(Error::UnexpectedWireType {
        found: wire_type,
        tag,
    })
}

/// Reads a length-delimited composite's header: the byte length, a
/// substream bounded to it, and the element count varint inside.
fn read_composite<'r, R: WireRead>(stream: &'r mut R) -> Result<(R::Sub<'r>, u64)> {
    let byte_len = decode_unsigned(stream)? as usize;
    let mut sub = stream.get_substream(byte_len)?;
    let count = decode_unsigned(&mut sub)?;
    Ok((sub, count))
}

/// Reads up to `field_descs.len()` positional values from `count` items on
/// the wire, filling missing trailing fields from their defaults
/// (backward compatibility) and skipping any fields beyond what the
/// descriptor declares (forward compatibility).
fn read_positional_body<R: WireRead>(
    sub: &mut R,
    field_descs: &[Rc<Descriptor>],
    count: u64,
) -> Result<Vec<Value>> {
    let present = count.min(field_descs.len() as u64) as usize;
    let mut out = Vec::with_capacity(field_descs.len());
    for fd in field_descs.iter().take(present) {
        out.push(read_value(sub, fd)?);
    }
    for fd in field_descs.iter().skip(present) {
        out.push(fd.default_value()?);
    }
    for _ in present..(count as usize) {
        skip_value(sub)?;
    }
    Ok(out)
}

fn expect(found: WireType, tag: u64, wanted: WireType) -> Result<()> {
    if found == wanted {
        Ok(())
    } else {
        Err(Error::UnexpectedWireType { found, tag })
    }
}

/// Skips one prefixed value without consulting any descriptor. Composite
/// values are length-prefixed, so skipping never needs to understand
/// their contents.
pub fn skip_value<R: WireRead>(stream: &mut R) -> Result<()> {
    let prefix = decode_unsigned(stream)?;
    let (wire_type, _tag) = decompose_prefix(prefix)?;
    skip_body(stream, wire_type)
}

fn skip_body<R: WireRead>(stream: &mut R, wire_type: WireType) -> Result<()> {
    match wire_type {
        WireType::Vint => {
            decode_unsigned(stream)?;
            Ok(())
        }
        WireType::Bits8 => stream.skip(1),
        WireType::Bits32 => stream.skip(4),
        WireType::Bits64Long | WireType::Bits64Float => stream.skip(8),
        WireType::Enum => Ok(()),
        WireType::Bytes => {
            let len = decode_unsigned(stream)? as usize;
            stream.skip(len)
        }
        WireType::Tuple | WireType::Htuple | WireType::Assoc => {
            let len = decode_unsigned(stream)? as usize;
            stream.skip(len)
        }
    }
}

/// Writes `value` according to `desc`.
pub fn write_value(out: &mut Writer, value: &Value, desc: &Descriptor) -> Result<()> {
    match (desc, value) {
        (Descriptor::Bool, Value::Bool(b)) => {
            write_prefix(out, WireType::Vint, 0);
            out.write_varint(u64::from(*b));
        }
        (Descriptor::Byte, Value::Byte(b)) => {
            if *b > 255 {
                return Err(Error::ParseError(format!("byte value {b} out of range")));
            }
            write_prefix(out, WireType::Vint, 0);
            out.write_varint(u64::from(*b));
        }
        (Descriptor::Int, Value::Int(n)) => {
            write_prefix(out, WireType::Vint, 0);
            out.write_svarint(*n);
        }
        (Descriptor::Long, Value::Long(n)) => {
            write_prefix(out, WireType::Bits64Long, 0);
            out.write(&n.to_le_bytes());
        }
        (Descriptor::Float, Value::Float(f)) => {
            write_prefix(out, WireType::Bits64Float, 0);
            out.write(&f.to_le_bytes());
        }
        (Descriptor::String, Value::String(bytes)) => {
            write_prefix(out, WireType::Bytes, 0);
            out.write_varint(bytes.len() as u64);
            out.write(bytes);
        }
        (Descriptor::Tuple(_), Value::Tuple(items)) | (Descriptor::Message { .. }, Value::Tuple(items)) => {
            let fields = desc.positional_fields().expect("checked above");
            write_prefix(out, WireType::Tuple, 0);
            write_positional_body(out, items, &fields)?;
        }
        (Descriptor::List(items), Value::List(values)) => {
            // The descriptor may carry more than one cycling subtype for
            // reading legacy data, but every value this crate writes uses
            // a single canonical item type.
            let item_desc = items.first().ok_or_else(|| {
                Error::ParseError("list descriptor has no item type".into())
            })?;
            write_prefix(out, WireType::Htuple, 0);
            let mut scratch = Writer::new();
            scratch.write_varint(values.len() as u64);
            for v in values {
                write_value(&mut scratch, v, item_desc)?;
            }
            out.write_varint(scratch.snapshot().len() as u64);
            out.write(scratch.snapshot());
        }
        (Descriptor::Assoc { key, value: vdesc }, Value::Assoc(pairs)) => {
            write_prefix(out, WireType::Assoc, 0);
            let mut scratch = Writer::new();
            scratch.write_varint(pairs.len() as u64);
            for (k, v) in pairs {
                write_value(&mut scratch, k, key)?;
                write_value(&mut scratch, v, vdesc)?;
            }
            out.write_varint(scratch.snapshot().len() as u64);
            out.write(scratch.snapshot());
        }
        (Descriptor::Sum(_), Value::Variant(tag, fields)) => {
            let ctor = desc
                .constructor_by_tag(*tag)
                .ok_or_else(|| Error::ParseError(format!("no constructor with tag {tag}")))?;
            if ctor.fields.len() != fields.len() {
                return Err(Error::ParseError(format!(
                    "constructor {} expects {} fields, got {}",
                    ctor.name,
                    ctor.fields.len(),
                    fields.len()
                )));
            }
            if fields.is_empty() {
                write_prefix(out, WireType::Enum, *tag);
            } else {
                write_prefix(out, WireType::Tuple, *tag);
                write_positional_body(out, fields, &ctor.fields)?;
            }
        }
        _ => {
            return Err(Error::ParseError(
                "value does not match the shape of its descriptor".into(),
            ))
        }
    }
    Ok(())
}

fn write_prefix(out: &mut Writer, wire_type: WireType, tag: u64) {
    out.write_varint(compose_prefix(wire_type, tag));
}

fn write_positional_body(
    out: &mut Writer,
    values: &[Value],
    field_descs: &[Rc<Descriptor>],
) -> Result<()> {
    if values.len() != field_descs.len() {
        return Err(Error::ParseError(format!(
            "expected {} fields, got {}",
            field_descs.len(),
            values.len()
        )));
    }
    let mut scratch = Writer::new();
    scratch.write_varint(values.len() as u64);
    for (v, fd) in values.iter().zip(field_descs) {
        write_value(&mut scratch, v, fd)?;
    }
    out.write_varint(scratch.snapshot().len() as u64);
    out.write(scratch.snapshot());
    Ok(())
}

/// Decodes a single value from an in-memory byte slice.
pub fn from_bytes(bytes: &[u8], desc: &Descriptor) -> Result<Value> {
    let mut reader = Reader::new(bytes);
    read_value(&mut reader, desc)
}

/// Decodes a single value from any [`std::io::Read`] source. Raises
/// `Eof` if the source is already exhausted before any byte is read.
pub fn from_source<R: std::io::Read>(source: R, desc: &Descriptor) -> Result<Value> {
    let mut stream = SourceStream::new(source);
    read_value(&mut stream, desc)
}

/// Encodes a single value to a freshly allocated byte vector.
pub fn to_bytes(value: &Value, desc: &Descriptor) -> Result<Vec<u8>> {
    let mut writer = Writer::new();
    write_value(&mut writer, value, desc)?;
    Ok(writer.into_bytes())
}

/// Encodes a single value and writes it to any [`std::io::Write`] sink in
/// one call.
pub fn to_sink<W: std::io::Write>(sink: &mut W, value: &Value, desc: &Descriptor) -> Result<()> {
    let mut writer = Writer::new();
    write_value(&mut writer, value, desc)?;
    writer.write_to(sink)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::Constructor;

    #[test]
    fn bool_roundtrip() {
        let desc = Descriptor::Bool;
        let bytes = to_bytes(&Value::Bool(true), &desc).unwrap();
        assert_eq!(from_bytes(&bytes, &desc).unwrap(), Value::Bool(true));
    }

    #[test]
    fn tuple_roundtrip() {
        let desc = Descriptor::tuple(vec![Rc::new(Descriptor::Int), Rc::new(Descriptor::String)]);
        let value = Value::Tuple(vec![Value::Int(-7), Value::String(b"hi".to_vec())]);
        let bytes = to_bytes(&value, &desc).unwrap();
        assert_eq!(from_bytes(&bytes, &desc).unwrap(), value);
    }

    #[test]
    fn missing_trailing_field_defaults() {
        let writer_desc = Descriptor::tuple(vec![Rc::new(Descriptor::Int)]);
        let reader_desc =
            Descriptor::tuple(vec![Rc::new(Descriptor::Int), Rc::new(Descriptor::Bool)]);
        let bytes = to_bytes(&Value::Tuple(vec![Value::Int(5)]), &writer_desc).unwrap();
        assert_eq!(
            from_bytes(&bytes, &reader_desc).unwrap(),
            Value::Tuple(vec![Value::Int(5), Value::Bool(false)])
        );
    }

    #[test]
    fn extra_trailing_field_is_skipped() {
        let writer_desc =
            Descriptor::tuple(vec![Rc::new(Descriptor::Int), Rc::new(Descriptor::Bool)]);
        let reader_desc = Descriptor::tuple(vec![Rc::new(Descriptor::Int)]);
        let bytes = to_bytes(
            &Value::Tuple(vec![Value::Int(5), Value::Bool(true)]),
            &writer_desc,
        )
        .unwrap();
        assert_eq!(
            from_bytes(&bytes, &reader_desc).unwrap(),
            Value::Tuple(vec![Value::Int(5)])
        );
    }

    #[test]
    fn sum_dispatch_roundtrip() {
        let desc = Descriptor::sum(vec![
            Constructor::new("none", 0, vec![]),
            Constructor::new("some", 1, vec![Rc::new(Descriptor::Int)]),
        ]);
        let none_bytes = to_bytes(&Value::Variant(0, vec![]), &desc).unwrap();
        let some_bytes = to_bytes(&Value::Variant(1, vec![Value::Int(9)]), &desc).unwrap();
        assert_eq!(from_bytes(&none_bytes, &desc).unwrap(), Value::Variant(0, vec![]));
        assert_eq!(
            from_bytes(&some_bytes, &desc).unwrap(),
            Value::Variant(1, vec![Value::Int(9)])
        );
    }

    #[test]
    fn primitive_promotes_into_single_field_tuple() {
        let int_desc = Descriptor::Int;
        let raw = to_bytes(&Value::Int(42), &int_desc).unwrap();
        let wrapper_desc = Descriptor::tuple(vec![Rc::new(Descriptor::Int)]);
        assert_eq!(
            from_bytes(&raw, &wrapper_desc).unwrap(),
            Value::Tuple(vec![Value::Int(42)])
        );
    }

    #[test]
    fn primitive_promotes_into_first_slot_defaulting_the_rest() {
        // Backward compatibility: a field was added after the original
        // scalar type, and old data written as that bare scalar must still
        // decode against the newer, wider tuple descriptor.
        let raw = to_bytes(&Value::Int(42), &Descriptor::Int).unwrap();
        let wrapper_desc = Descriptor::tuple(vec![
            Rc::new(Descriptor::Int),
            Rc::new(Descriptor::Bool),
            Rc::new(Descriptor::String),
        ]);
        assert_eq!(
            from_bytes(&raw, &wrapper_desc).unwrap(),
            Value::Tuple(vec![Value::Int(42), Value::Bool(false), Value::String(vec![])])
        );
    }

    #[test]
    fn promotion_into_tuple_with_no_fields_is_a_parse_error() {
        let raw = to_bytes(&Value::Int(1), &Descriptor::Int).unwrap();
        let empty_tuple = Descriptor::tuple(vec![]);
        assert!(matches!(
            from_bytes(&raw, &empty_tuple),
            Err(Error::ParseError(_))
        ));
    }

    #[test]
    fn list_descriptor_with_no_item_type_is_a_parse_error_not_a_panic() {
        let malformed = Descriptor::List(Vec::new());
        let bytes = to_bytes(
            &Value::List(vec![Value::Int(1)]),
            &Descriptor::list(Rc::new(Descriptor::Int)),
        )
        .unwrap();
        assert!(matches!(
            from_bytes(&bytes, &malformed),
            Err(Error::ParseError(_))
        ));
    }

    #[test]
    fn exhausted_stream_is_clean_eof() {
        let desc = Descriptor::Int;
        assert!(matches!(from_bytes(&[], &desc), Err(Error::Eof)));
        assert!(matches!(
            from_source(std::io::Cursor::new(Vec::new()), &desc),
            Err(Error::Eof)
        ));
    }

    #[test]
    fn truncated_prefix_is_unexpected_eof_not_eof() {
        // A continuation-bit-set byte with nothing after it is partway
        // through a value, not a clean boundary.
        let desc = Descriptor::Int;
        assert!(matches!(from_bytes(&[0x80], &desc), Err(Error::UnexpectedEof)));
    }

    #[test]
    fn skip_value_consumes_whole_composite() {
        let desc = Descriptor::list(Rc::new(Descriptor::Int));
        let bytes = to_bytes(
            &Value::List(vec![Value::Int(1), Value::Int(2), Value::Int(3)]),
            &desc,
        )
        .unwrap();
        let mut reader = Reader::new(&bytes);
        skip_value(&mut reader).unwrap();
        assert_eq!(reader.remaining(), 0);
    }

    #[test]
    fn from_source_matches_from_bytes() {
        let desc = Descriptor::String;
        let bytes = to_bytes(&Value::String(b"round trip".to_vec()), &desc).unwrap();
        let value = from_source(std::io::Cursor::new(bytes.clone()), &desc).unwrap();
        assert_eq!(value, from_bytes(&bytes, &desc).unwrap());
    }

    #[test]
    fn to_sink_matches_to_bytes() {
        let desc = Descriptor::Long;
        let value = Value::Long(-12345);
        let bytes = to_bytes(&value, &desc).unwrap();
        let mut sink = Vec::new();
        to_sink(&mut sink, &value, &desc).unwrap();
        assert_eq!(sink, bytes);
    }
}
