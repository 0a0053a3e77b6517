use super::{
    emit::{DataEmitter, JsonEmitter, MsgPackEmitter},
    MAP_AS_ARRAY, MAX_DEPTH, QUOTE_TAG,
};
use crate::{errors::Error, vecmap::VecMap, Value};
use hashbrown::HashMap;
use std::{io::Write, rc::Rc};
use tracing::trace;

/// The broad kinds a value can have, used as registry keys for the
/// per-kind encoders.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Kind {
    Null,
    Bool,
    Int,
    Float,
    BigInt,
    BigDec,
    Ratio,
    String,
    Keyword,
    Symbol,
    Char,
    Bytes,
    Uuid,
    Uri,
    Time,
    Array,
    List,
    Set,
    Map,
    CMap,
    Tagged,
    Link,
    TagId,
}

/// The kind of `v`.
pub fn kind_of(v: &Value) -> Kind {
    match v {
        Value::Null => Kind::Null,
        Value::Bool(_) => Kind::Bool,
        Value::Int(_) => Kind::Int,
        Value::Float(_) => Kind::Float,
        Value::BigInt(_) => Kind::BigInt,
        Value::BigDec(_) => Kind::BigDec,
        Value::Ratio(_) => Kind::Ratio,
        Value::String(_) => Kind::String,
        Value::Keyword(_) => Kind::Keyword,
        Value::Symbol(_) => Kind::Symbol,
        Value::Char(_) => Kind::Char,
        Value::Byt(_) => Kind::Bytes,
        Value::Uuid(_) => Kind::Uuid,
        Value::Uri(_) => Kind::Uri,
        Value::Time(_) => Kind::Time,
        Value::Array(_) => Kind::Array,
        Value::List(_) => Kind::List,
        Value::Set(_) => Kind::Set,
        Value::Map(_) => Kind::Map,
        Value::CMap(_) => Kind::CMap,
        Value::Tagged(_) => Kind::Tagged,
        Value::Link(_) => Kind::Link,
        Value::TagId(_) => Kind::TagId,
    }
}

/// An object that knows how to emit one kind of value.
pub trait ValueEncoder {
    /// True iff this encoder renders `v` as a single string, which is what
    /// qualifies a value to be a map key.
    fn is_stringable(&self, v: &Value) -> bool;

    /// Emits `v` through the encoder's sink. `as_key` marks key position,
    /// which changes the wire form of several scalars.
    fn encode(&self, e: &mut Encoder<'_>, v: &Value, as_key: bool) -> Result<(), Error>;
}

/// Walks a value tree and drives the emitter.
///
/// The encoder dispatches on value kind through a registry installed by the
/// constructor. A tag-specific encoder, if registered, beats the kind entry
/// for tagged values; a value with no encoder at all is a structured error,
/// never silent fallback.
pub struct Encoder<'w> {
    emitter: Box<dyn DataEmitter + 'w>,
    encoders: HashMap<Kind, Rc<dyn ValueEncoder>>,
    tag_encoders: HashMap<String, Rc<dyn ValueEncoder>>,
    error_encoder: Rc<dyn ValueEncoder>,
    depth: usize,
}

impl<'w> Encoder<'w> {
    /// Creates an encoder that writes cached Transit JSON to `writer`.
    pub fn json<W: Write + 'w>(writer: W) -> Encoder<'w> {
        Encoder::with_emitter(Box::new(JsonEmitter::new(writer)))
    }

    /// Creates an encoder that writes verbose Transit JSON: no cache codes,
    /// every string in full.
    pub fn json_verbose<W: Write + 'w>(writer: W) -> Encoder<'w> {
        Encoder::with_emitter(Box::new(JsonEmitter::verbose(writer)))
    }

    /// Creates an encoder that writes cached Transit MessagePack.
    pub fn msgpack<W: Write + 'w>(writer: W) -> Encoder<'w> {
        Encoder::with_emitter(Box::new(MsgPackEmitter::new(writer)))
    }

    /// Creates an encoder over an arbitrary emitter with all built-in
    /// value encoders installed.
    pub fn with_emitter(emitter: Box<dyn DataEmitter + 'w>) -> Encoder<'w> {
        let mut e = Encoder {
            emitter,
            encoders: HashMap::new(),
            tag_encoders: HashMap::new(),
            error_encoder: Rc::new(ErrorEncoder),
            depth: 0,
        };

        e.add_encoder(Kind::Null, Rc::new(NilEncoder));
        e.add_encoder(Kind::Bool, Rc::new(BoolEncoder));
        e.add_encoder(Kind::Int, Rc::new(IntEncoder));
        e.add_encoder(Kind::Float, Rc::new(FloatEncoder));
        e.add_encoder(Kind::BigInt, Rc::new(BigIntEncoder));
        e.add_encoder(Kind::BigDec, Rc::new(BigDecEncoder));
        e.add_encoder(Kind::Ratio, Rc::new(RatioEncoder));
        e.add_encoder(Kind::String, Rc::new(StringEncoder));
        e.add_encoder(Kind::Keyword, Rc::new(KeywordEncoder));
        e.add_encoder(Kind::Symbol, Rc::new(SymbolEncoder));
        e.add_encoder(Kind::Char, Rc::new(CharEncoder));
        e.add_encoder(Kind::Bytes, Rc::new(BytesEncoder));
        e.add_encoder(Kind::Uuid, Rc::new(UuidEncoder));
        e.add_encoder(Kind::Uri, Rc::new(UriEncoder));
        e.add_encoder(Kind::Time, Rc::new(TimeEncoder));
        e.add_encoder(Kind::Array, Rc::new(ArrayEncoder));
        e.add_encoder(Kind::List, Rc::new(ListEncoder));
        e.add_encoder(Kind::Set, Rc::new(SetEncoder));
        e.add_encoder(Kind::Map, Rc::new(MapEncoder));
        e.add_encoder(Kind::CMap, Rc::new(CMapEncoder));
        e.add_encoder(Kind::Tagged, Rc::new(TaggedValueEncoder));
        e.add_encoder(Kind::Link, Rc::new(LinkEncoder));
        // Kind::TagId stays unregistered: a dangling tag marker routes to
        // the error encoder.

        e
    }

    /// Registers (or replaces) the encoder for a kind.
    pub fn add_encoder(&mut self, kind: Kind, enc: Rc<dyn ValueEncoder>) {
        self.encoders.insert(kind, enc);
    }

    /// Registers an encoder for tagged values carrying a specific tag.
    /// Consulted before the [`Kind::Tagged`] entry.
    pub fn add_tag_encoder(&mut self, tag: impl Into<String>, enc: Rc<dyn ValueEncoder>) {
        self.tag_encoders.insert(tag.into(), enc);
    }

    /// Finds the encoder responsible for `v`.
    pub fn encoder_for(&self, v: &Value) -> Rc<dyn ValueEncoder> {
        if let Value::Tagged(tv) = v {
            if let Some(enc) = self.tag_encoders.get(tv.tag.as_str()) {
                return enc.clone();
            }
        }

        match self.encoders.get(&kind_of(v)) {
            Some(enc) => enc.clone(),
            None => {
                trace!(kind = ?kind_of(v), "no encoder registered");
                self.error_encoder.clone()
            }
        }
    }

    /// True iff `v` renders as a single string under the current registry.
    pub fn is_stringable(&self, v: &Value) -> bool { self.encoder_for(v).is_stringable(v) }

    /// The emitter this encoder writes through, for use by [`ValueEncoder`]
    /// implementations.
    pub fn emitter(&mut self) -> &mut dyn DataEmitter { &mut *self.emitter }

    /// Encodes a value somewhere inside a document.
    pub fn encode_value(&mut self, v: &Value, as_key: bool) -> Result<(), Error> {
        if self.depth >= MAX_DEPTH {
            return Err(Error::Shape(format!("value tree deeper than {MAX_DEPTH}")));
        }
        self.depth += 1;
        let result = self.encoder_for(v).encode(self, v, as_key);
        self.depth -= 1;
        result
    }

    /// Encodes a value at the top level of a document.
    ///
    /// A stringable root is wrapped in a `~#'` quote first, so every emitted
    /// document is an array or a map.
    pub fn encode(&mut self, v: &Value) -> Result<(), Error> {
        if self.is_stringable(v) {
            let quoted = Value::tagged(QUOTE_TAG, v.clone());
            self.encode_value(&quoted, false)
        } else {
            self.encode_value(v, false)
        }
    }
}

struct NilEncoder;

impl ValueEncoder for NilEncoder {
    fn is_stringable(&self, _: &Value) -> bool { true }

    fn encode(&self, e: &mut Encoder<'_>, _: &Value, as_key: bool) -> Result<(), Error> {
        e.emitter().emit_nil(as_key)
    }
}

struct BoolEncoder;

impl ValueEncoder for BoolEncoder {
    fn is_stringable(&self, _: &Value) -> bool { true }

    fn encode(&self, e: &mut Encoder<'_>, v: &Value, as_key: bool) -> Result<(), Error> {
        match v {
            Value::Bool(b) => e.emitter().emit_bool(*b, as_key),
            _ => Err(Error::UnknownType(format!("{v:?}"))),
        }
    }
}

struct IntEncoder;

impl ValueEncoder for IntEncoder {
    fn is_stringable(&self, _: &Value) -> bool { true }

    fn encode(&self, e: &mut Encoder<'_>, v: &Value, as_key: bool) -> Result<(), Error> {
        match v {
            Value::Int(i) => e.emitter().emit_int(*i, as_key),
            _ => Err(Error::UnknownType(format!("{v:?}"))),
        }
    }
}

struct FloatEncoder;

impl ValueEncoder for FloatEncoder {
    fn is_stringable(&self, _: &Value) -> bool { true }

    fn encode(&self, e: &mut Encoder<'_>, v: &Value, as_key: bool) -> Result<(), Error> {
        let f = match v {
            Value::Float(d) => d.to_f64(),
            _ => return Err(Error::UnknownType(format!("{v:?}"))),
        };

        if f.is_nan() {
            e.emitter().emit_string("~zNaN".to_owned(), as_key)
        } else if f.is_infinite() {
            let text = if f > 0.0 { "~zINF" } else { "~z-INF" };
            e.emitter().emit_string(text.to_owned(), as_key)
        } else {
            e.emitter().emit_float(f, as_key)
        }
    }
}

struct BigIntEncoder;

impl ValueEncoder for BigIntEncoder {
    fn is_stringable(&self, _: &Value) -> bool { true }

    fn encode(&self, e: &mut Encoder<'_>, v: &Value, as_key: bool) -> Result<(), Error> {
        match v {
            Value::BigInt(i) => e.emitter().emit_string(format!("~n{i}"), as_key),
            _ => Err(Error::UnknownType(format!("{v:?}"))),
        }
    }
}

struct BigDecEncoder;

impl ValueEncoder for BigDecEncoder {
    fn is_stringable(&self, _: &Value) -> bool { true }

    fn encode(&self, e: &mut Encoder<'_>, v: &Value, as_key: bool) -> Result<(), Error> {
        match v {
            Value::BigDec(d) => e.emitter().emit_string(format!("~f{d}"), as_key),
            _ => Err(Error::UnknownType(format!("{v:?}"))),
        }
    }
}

struct RatioEncoder;

impl ValueEncoder for RatioEncoder {
    fn is_stringable(&self, _: &Value) -> bool { false }

    fn encode(&self, e: &mut Encoder<'_>, v: &Value, _as_key: bool) -> Result<(), Error> {
        let r = match v {
            Value::Ratio(r) => r,
            _ => return Err(Error::UnknownType(format!("{v:?}"))),
        };

        let (numer, denom) = (r.numer().clone(), r.denom().clone());
        let em = e.emitter();
        em.start_array(2)?;
        em.emit_tag("ratio")?;
        em.array_sep()?;
        em.start_array(2)?;
        em.emit_string(format!("~n{numer}"), false)?;
        em.array_sep()?;
        em.emit_string(format!("~n{denom}"), false)?;
        em.end_array()?;
        em.end_array()
    }
}

struct StringEncoder;

impl ValueEncoder for StringEncoder {
    fn is_stringable(&self, _: &Value) -> bool { true }

    fn encode(&self, e: &mut Encoder<'_>, v: &Value, as_key: bool) -> Result<(), Error> {
        let s = match v {
            Value::String(s) => s,
            _ => return Err(Error::UnknownType(format!("{v:?}"))),
        };

        // strings opening with a reserved byte are escaped with a tilde
        let out = if s.starts_with(['~', '^', '`']) {
            format!("~{s}")
        } else {
            s.clone()
        };
        e.emitter().emit_string(out, as_key)
    }
}

struct KeywordEncoder;

impl ValueEncoder for KeywordEncoder {
    fn is_stringable(&self, _: &Value) -> bool { true }

    fn encode(&self, e: &mut Encoder<'_>, v: &Value, _as_key: bool) -> Result<(), Error> {
        match v {
            Value::Keyword(name) => e.emitter().emit_string(format!("~:{name}"), true),
            _ => Err(Error::UnknownType(format!("{v:?}"))),
        }
    }
}

struct SymbolEncoder;

impl ValueEncoder for SymbolEncoder {
    fn is_stringable(&self, _: &Value) -> bool { true }

    fn encode(&self, e: &mut Encoder<'_>, v: &Value, _as_key: bool) -> Result<(), Error> {
        match v {
            Value::Symbol(name) => e.emitter().emit_string(format!("~${name}"), true),
            _ => Err(Error::UnknownType(format!("{v:?}"))),
        }
    }
}

struct CharEncoder;

impl ValueEncoder for CharEncoder {
    fn is_stringable(&self, _: &Value) -> bool { true }

    fn encode(&self, e: &mut Encoder<'_>, v: &Value, as_key: bool) -> Result<(), Error> {
        match v {
            Value::Char(c) => e.emitter().emit_string(format!("~c{c}"), as_key),
            _ => Err(Error::UnknownType(format!("{v:?}"))),
        }
    }
}

struct BytesEncoder;

impl ValueEncoder for BytesEncoder {
    fn is_stringable(&self, _: &Value) -> bool { true }

    fn encode(&self, e: &mut Encoder<'_>, v: &Value, as_key: bool) -> Result<(), Error> {
        match v {
            Value::Byt(b) => e.emitter().emit_bytes(b, as_key),
            _ => Err(Error::UnknownType(format!("{v:?}"))),
        }
    }
}

struct UuidEncoder;

impl ValueEncoder for UuidEncoder {
    fn is_stringable(&self, _: &Value) -> bool { true }

    fn encode(&self, e: &mut Encoder<'_>, v: &Value, as_key: bool) -> Result<(), Error> {
        match v {
            Value::Uuid(u) => e.emitter().emit_string(format!("~u{u}"), as_key),
            _ => Err(Error::UnknownType(format!("{v:?}"))),
        }
    }
}

struct UriEncoder;

impl ValueEncoder for UriEncoder {
    fn is_stringable(&self, _: &Value) -> bool { true }

    fn encode(&self, e: &mut Encoder<'_>, v: &Value, as_key: bool) -> Result<(), Error> {
        match v {
            // URIs are carried by their canonical text, untouched
            Value::Uri(u) => e.emitter().emit_string(format!("~r{u}"), as_key),
            _ => Err(Error::UnknownType(format!("{v:?}"))),
        }
    }
}

struct TimeEncoder;

impl ValueEncoder for TimeEncoder {
    fn is_stringable(&self, _: &Value) -> bool { true }

    fn encode(&self, e: &mut Encoder<'_>, v: &Value, as_key: bool) -> Result<(), Error> {
        match v {
            Value::Time(t) => {
                e.emitter()
                    .emit_string(format!("~m{}", t.timestamp_millis()), as_key)
            }
            _ => Err(Error::UnknownType(format!("{v:?}"))),
        }
    }
}

struct ArrayEncoder;

impl ValueEncoder for ArrayEncoder {
    fn is_stringable(&self, _: &Value) -> bool { false }

    fn encode(&self, e: &mut Encoder<'_>, v: &Value, _as_key: bool) -> Result<(), Error> {
        let elements = match v {
            Value::Array(a) => a,
            _ => return Err(Error::UnknownType(format!("{v:?}"))),
        };

        e.emitter().start_array(elements.len())?;
        for (ix, element) in elements.iter().enumerate() {
            if ix > 0 {
                e.emitter().array_sep()?;
            }
            e.encode_value(element, false)?;
        }
        e.emitter().end_array()
    }
}

struct ListEncoder;

impl ValueEncoder for ListEncoder {
    fn is_stringable(&self, _: &Value) -> bool { false }

    fn encode(&self, e: &mut Encoder<'_>, v: &Value, _as_key: bool) -> Result<(), Error> {
        let elements = match v {
            Value::List(l) => l,
            _ => return Err(Error::UnknownType(format!("{v:?}"))),
        };

        // list elements ride inline after the tag, unlike sets
        e.emitter().start_array(elements.len() + 1)?;
        e.emitter().emit_tag("list")?;
        for element in elements {
            e.emitter().array_sep()?;
            e.encode_value(element, false)?;
        }
        e.emitter().end_array()
    }
}

struct SetEncoder;

impl ValueEncoder for SetEncoder {
    fn is_stringable(&self, _: &Value) -> bool { false }

    fn encode(&self, e: &mut Encoder<'_>, v: &Value, _as_key: bool) -> Result<(), Error> {
        let set = match v {
            Value::Set(s) => s,
            _ => return Err(Error::UnknownType(format!("{v:?}"))),
        };

        e.emitter().start_array(2)?;
        e.emitter().emit_tag("set")?;
        e.emitter().array_sep()?;

        e.emitter().start_array(set.len())?;
        for (ix, member) in set.iter().enumerate() {
            if ix > 0 {
                e.emitter().array_sep()?;
            }
            e.encode_value(member, false)?;
        }
        e.emitter().end_array()?;

        e.emitter().end_array()
    }
}

/// Emits the alternating key/value tail shared by both map forms.
fn encode_entries<'a>(
    e: &mut Encoder<'_>,
    entries: impl Iterator<Item = &'a (Value, Value)>,
) -> Result<(), Error> {
    for (key, value) in entries {
        e.emitter().array_sep()?;
        e.encode_value(key, true)?;
        e.emitter().array_sep()?;
        e.encode_value(value, false)?;
    }
    e.emitter().end_array()
}

struct MapEncoder;

impl ValueEncoder for MapEncoder {
    fn is_stringable(&self, _: &Value) -> bool { false }

    fn encode(&self, e: &mut Encoder<'_>, v: &Value, _as_key: bool) -> Result<(), Error> {
        let m = match v {
            Value::Map(m) => m,
            _ => return Err(Error::UnknownType(format!("{v:?}"))),
        };

        if m.iter().all(|(k, _)| e.is_stringable(k)) {
            // stringable keys: an array opened by the `^ ` marker, which is
            // a JSON-level sentinel, not a map frame
            e.emitter().start_array(2 * m.len() + 1)?;
            e.emitter().emit_string(MAP_AS_ARRAY.to_owned(), false)?;
        } else {
            e.emitter().start_array(2 * m.len() + 1)?;
            e.emitter().emit_tag("cmap")?;
        }
        encode_entries(e, m.iter())
    }
}

struct CMapEncoder;

impl ValueEncoder for CMapEncoder {
    fn is_stringable(&self, _: &Value) -> bool { false }

    fn encode(&self, e: &mut Encoder<'_>, v: &Value, _as_key: bool) -> Result<(), Error> {
        let entries = match v {
            Value::CMap(entries) => entries,
            _ => return Err(Error::UnknownType(format!("{v:?}"))),
        };

        e.emitter().start_array(2 * entries.len() + 1)?;
        e.emitter().emit_tag("cmap")?;
        encode_entries(e, entries.iter())
    }
}

struct TaggedValueEncoder;

impl ValueEncoder for TaggedValueEncoder {
    fn is_stringable(&self, _: &Value) -> bool { false }

    fn encode(&self, e: &mut Encoder<'_>, v: &Value, _as_key: bool) -> Result<(), Error> {
        let tv = match v {
            Value::Tagged(tv) => tv,
            _ => return Err(Error::UnknownType(format!("{v:?}"))),
        };

        e.emitter().start_array(2)?;
        e.emitter().emit_tag(&tv.tag)?;
        e.emitter().array_sep()?;
        e.encode_value(&tv.value, false)?;
        e.emitter().end_array()
    }
}

struct LinkEncoder;

impl ValueEncoder for LinkEncoder {
    fn is_stringable(&self, _: &Value) -> bool { false }

    fn encode(&self, e: &mut Encoder<'_>, v: &Value, _as_key: bool) -> Result<(), Error> {
        let link = match v {
            Value::Link(l) => l,
            _ => return Err(Error::UnknownType(format!("{v:?}"))),
        };

        let fields: VecMap<Value, Value> = vec![
            (Value::from("href"), Value::uri(link.href.clone())),
            (Value::from("rel"), Value::from(link.rel.clone())),
            (Value::from("name"), Value::from(link.name.clone())),
            (Value::from("render"), Value::from(link.render.clone())),
            (Value::from("prompt"), Value::from(link.prompt.clone())),
        ]
        .into();

        e.emitter().start_array(2)?;
        e.emitter().emit_tag("link")?;
        e.emitter().array_sep()?;
        e.encode_value(&Value::Map(fields), false)?;
        e.emitter().end_array()
    }
}

struct ErrorEncoder;

impl ValueEncoder for ErrorEncoder {
    fn is_stringable(&self, _: &Value) -> bool { true }

    fn encode(&self, _: &mut Encoder<'_>, v: &Value, _as_key: bool) -> Result<(), Error> {
        Err(Error::UnknownType(format!("{v:?}")))
    }
}
