//! Round-trip laws and concrete wire scenarios, exercised end to end
//! through the public entry points rather than any one module's internals.

use std::rc::Rc;

use crate::{from_bytes, from_source, skip_value, to_bytes, to_sink, Constructor, Descriptor, Reader, Value};

fn rc(d: Descriptor) -> Rc<Descriptor> {
    Rc::new(d)
}

#[test]
fn scenario_bool_true() {
    let bytes = to_bytes(&Value::Bool(true), &Descriptor::Bool).unwrap();
    assert_eq!(bytes, vec![0x00, 0x01]);
}

#[test]
fn scenario_negative_int() {
    let bytes = to_bytes(&Value::Int(-1), &Descriptor::Int).unwrap();
    assert_eq!(bytes, vec![0x00, 0x01]);
}

#[test]
fn scenario_byte_max_value() {
    let bytes = to_bytes(&Value::Byte(255), &Descriptor::Byte).unwrap();
    assert_eq!(bytes, vec![0x00, 0xFF, 0x01]);
}

#[test]
fn scenario_short_string() {
    let bytes = to_bytes(&Value::String(b"hi".to_vec()), &Descriptor::String).unwrap();
    assert_eq!(bytes, vec![0x03, 0x02, b'h', b'i']);
}

#[test]
fn scenario_two_field_tuple() {
    let desc = Descriptor::tuple(vec![rc(Descriptor::Int), rc(Descriptor::Bool)]);
    let value = Value::Tuple(vec![Value::Int(1), Value::Bool(true)]);
    let bytes = to_bytes(&value, &desc).unwrap();
    assert_eq!(
        bytes,
        vec![0x01, 0x05, 0x02, 0x00, 0x02, 0x00, 0x01]
    );
}

#[test]
fn scenario_homogeneous_list() {
    let desc = Descriptor::list(rc(Descriptor::Int));
    let value = Value::List(vec![Value::Int(1), Value::Int(2), Value::Int(3)]);
    let bytes = to_bytes(&value, &desc).unwrap();
    assert_eq!(
        bytes,
        vec![0x05, 0x07, 0x03, 0x00, 0x02, 0x00, 0x04, 0x00, 0x06]
    );
}

#[test]
fn round_trip_every_scalar_kind() {
    let cases: Vec<(Descriptor, Value)> = vec![
        (Descriptor::Bool, Value::Bool(false)),
        (Descriptor::Byte, Value::Byte(200)),
        (Descriptor::Int, Value::Int(-123456)),
        (Descriptor::Long, Value::Long(i64::MIN)),
        (Descriptor::Float, Value::Float(std::f64::consts::PI)),
        (Descriptor::String, Value::String(b"extprot".to_vec())),
    ];
    for (desc, value) in cases {
        let bytes = to_bytes(&value, &desc).unwrap();
        assert_eq!(from_bytes(&bytes, &desc).unwrap(), value);
    }
}

#[test]
fn round_trip_assoc() {
    let desc = Descriptor::assoc(rc(Descriptor::String), rc(Descriptor::Int));
    let value = Value::Assoc(vec![
        (Value::String(b"a".to_vec()), Value::Int(1)),
        (Value::String(b"b".to_vec()), Value::Int(2)),
    ]);
    let bytes = to_bytes(&value, &desc).unwrap();
    assert_eq!(from_bytes(&bytes, &desc).unwrap(), value);
}

#[test]
fn round_trip_message_as_tuple() {
    let desc = Descriptor::message(vec![
        ("id".to_string(), rc(Descriptor::Int)),
        ("name".to_string(), rc(Descriptor::String)),
    ]);
    let value = Value::Tuple(vec![Value::Int(42), Value::String(b"alice".to_vec())]);
    let bytes = to_bytes(&value, &desc).unwrap();
    assert_eq!(from_bytes(&bytes, &desc).unwrap(), value);
}

#[test]
fn forward_compatible_reader_sees_fewer_fields() {
    // A message gains a field over time; an old reader built against the
    // narrower descriptor must still parse new wire data.
    let writer_desc = Descriptor::message(vec![
        ("id".to_string(), rc(Descriptor::Int)),
        ("name".to_string(), rc(Descriptor::String)),
        ("age".to_string(), rc(Descriptor::Byte)),
    ]);
    let reader_desc = Descriptor::message(vec![
        ("id".to_string(), rc(Descriptor::Int)),
        ("name".to_string(), rc(Descriptor::String)),
    ]);
    let on_wire = Value::Tuple(vec![
        Value::Int(1),
        Value::String(b"bob".to_vec()),
        Value::Byte(30),
    ]);
    let bytes = to_bytes(&on_wire, &writer_desc).unwrap();
    assert_eq!(
        from_bytes(&bytes, &reader_desc).unwrap(),
        Value::Tuple(vec![Value::Int(1), Value::String(b"bob".to_vec())])
    );
}

#[test]
fn backward_compatible_reader_sees_more_fields_than_written() {
    // An old message is read by a newer descriptor expecting a field that
    // didn't exist yet; the reader fills it from the field's default.
    let writer_desc = Descriptor::message(vec![("id".to_string(), rc(Descriptor::Int))]);
    let reader_desc = Descriptor::message(vec![
        ("id".to_string(), rc(Descriptor::Int)),
        ("active".to_string(), rc(Descriptor::Bool)),
    ]);
    let bytes = to_bytes(&Value::Tuple(vec![Value::Int(9)]), &writer_desc).unwrap();
    assert_eq!(
        from_bytes(&bytes, &reader_desc).unwrap(),
        Value::Tuple(vec![Value::Int(9), Value::Bool(false)])
    );
}

#[test]
fn primitive_promotes_to_single_field_record() {
    let bare = to_bytes(&Value::Int(5), &Descriptor::Int).unwrap();
    let wrapped_desc = Descriptor::message(vec![("value".to_string(), rc(Descriptor::Int))]);
    assert_eq!(
        from_bytes(&bare, &wrapped_desc).unwrap(),
        Value::Tuple(vec![Value::Int(5)])
    );
}

#[test]
fn disjoint_union_dispatches_on_tag() {
    let desc = Descriptor::sum(vec![
        Constructor::new("red", 0, vec![]),
        Constructor::new("rgb", 1, vec![rc(Descriptor::Byte), rc(Descriptor::Byte), rc(Descriptor::Byte)]),
    ]);
    let red = to_bytes(&Value::Variant(0, vec![]), &desc).unwrap();
    let rgb = to_bytes(
        &Value::Variant(1, vec![Value::Byte(10), Value::Byte(20), Value::Byte(30)]),
        &desc,
    )
    .unwrap();
    assert_eq!(from_bytes(&red, &desc).unwrap(), Value::Variant(0, vec![]));
    assert_eq!(
        from_bytes(&rgb, &desc).unwrap(),
        Value::Variant(1, vec![Value::Byte(10), Value::Byte(20), Value::Byte(30)])
    );
}

#[test]
fn skip_preserves_cursor_for_every_composite_kind() {
    let tuple_desc = Descriptor::tuple(vec![rc(Descriptor::Int), rc(Descriptor::Bool)]);
    let list_desc = Descriptor::list(rc(Descriptor::String));
    let assoc_desc = Descriptor::assoc(rc(Descriptor::Int), rc(Descriptor::Int));

    let cases = vec![
        to_bytes(&Value::Tuple(vec![Value::Int(1), Value::Bool(true)]), &tuple_desc).unwrap(),
        to_bytes(
            &Value::List(vec![Value::String(b"a".to_vec()), Value::String(b"bb".to_vec())]),
            &list_desc,
        )
        .unwrap(),
        to_bytes(
            &Value::Assoc(vec![(Value::Int(1), Value::Int(2))]),
            &assoc_desc,
        )
        .unwrap(),
    ];

    for bytes in cases {
        let mut r = Reader::new(&bytes);
        skip_value(&mut r).unwrap();
        assert_eq!(r.remaining(), 0);
    }
}

#[test]
fn from_source_and_to_sink_agree_with_in_memory_path() {
    let desc = Descriptor::list(rc(Descriptor::Int));
    let value = Value::List(vec![Value::Int(10), Value::Int(-20), Value::Int(30)]);

    let mut sink = Vec::new();
    to_sink(&mut sink, &value, &desc).unwrap();
    assert_eq!(sink, to_bytes(&value, &desc).unwrap());

    let from_reader = from_bytes(&sink, &desc).unwrap();
    let from_stream = from_source(std::io::Cursor::new(sink.clone()), &desc).unwrap();
    assert_eq!(from_reader, value);
    assert_eq!(from_stream, value);
}
