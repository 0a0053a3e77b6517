use std::rc::Rc;
use transit::{
    encoding::{DataEmitter, Encoder, Kind, ValueEncoder},
    errors::Error,
    Value,
};

struct UpcaseKeywords;

impl ValueEncoder for UpcaseKeywords {
    fn is_stringable(&self, _: &Value) -> bool { true }

    fn encode(&self, e: &mut Encoder<'_>, v: &Value, _as_key: bool) -> Result<(), Error> {
        match v {
            Value::Keyword(name) => e
                .emitter()
                .emit_string(format!("~:{}", name.to_uppercase()), true),
            other => Err(Error::UnknownType(format!("{other:?}"))),
        }
    }
}

#[test]
fn kind_encoders_can_be_replaced() {
    let mut out = Vec::new();
    {
        let mut e = Encoder::json(&mut out);
        e.add_encoder(Kind::Keyword, Rc::new(UpcaseKeywords));
        e.encode(&Value::keyword("hello")).unwrap();
    }
    assert_eq!(String::from_utf8(out).unwrap(), r#"["~#'","~:HELLO"]"#);
}

struct Unwrapped;

impl ValueEncoder for Unwrapped {
    fn is_stringable(&self, _: &Value) -> bool { false }

    fn encode(&self, e: &mut Encoder<'_>, v: &Value, as_key: bool) -> Result<(), Error> {
        match v {
            Value::Tagged(tv) => e.encode_value(&tv.value, as_key),
            other => Err(Error::UnknownType(format!("{other:?}"))),
        }
    }
}

#[test]
fn tag_encoders_beat_the_kind_entry() {
    let mut out = Vec::new();
    {
        let mut e = Encoder::json(&mut out);
        e.add_tag_encoder("ephemeral", Rc::new(Unwrapped));
        // "ephemeral" loses its wrapper, other tags keep the default form
        e.encode(&Value::from(vec![
            Value::tagged("ephemeral", Value::from(vec![1])),
            Value::tagged("point", Value::from(vec![2])),
        ]))
        .unwrap();
    }
    assert_eq!(
        String::from_utf8(out).unwrap(),
        r#"[[1],["~#point",[2]]]"#
    );
}

#[test]
fn decode_handlers_can_be_registered() {
    let mut d = transit::encoding::Decoder::new();
    d.add_handler("point", |tv| {
        match *tv.value {
            Value::Array(coords) => Ok(Value::List(coords)),
            other => Err(Error::tag("point", format!("expected coordinates, found {other:?}"))),
        }
    });

    let v = d.decode_json(r#"{"~#point": [1, 2]}"#).unwrap();
    assert_eq!(v, Value::List(vec![Value::from(1), Value::from(2)]));

    assert!(d.decode_json(r#"{"~#point": 7}"#).is_err());
}

#[test]
fn the_unknown_handler_is_replaceable() {
    let mut d = transit::encoding::Decoder::new();
    d.add_handler("unknown", |tv| {
        Err(Error::tag(tv.tag.clone(), "unrecognized tag"))
    });

    assert!(d.decode_json(r#"{"~#mystery": 1}"#).is_err());
}
