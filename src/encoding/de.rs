use super::{MAP_AS_ARRAY, MAX_DEPTH};
use crate::{
    cache::{Cache, RollingCache},
    errors::Error,
    link::Link,
    set::Set,
    util::float_text,
    vecmap::VecMap,
    Bytes, TaggedValue, Value,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use bigdecimal::BigDecimal;
use chrono::{DateTime, TimeZone, Utc};
use hashbrown::HashMap;
use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::Zero;
use std::{convert::TryFrom, str::FromStr};
use tracing::trace;
use uuid::Uuid;

/// The generic event tree the decoder is driven by.
///
/// The carrier parsers are external collaborators; whatever produced the
/// bytes, the decoder only ever sees these shapes. Numbers arrive as their
/// lossless decimal token, and the integer/float split is made here: a token
/// containing any of `.`, `e`, `E` is a float.
#[derive(Clone, Debug, PartialEq)]
pub enum Parsed {
    Null,
    Bool(bool),
    /// A numeric token, e.g. `"42"` or `"1.5"`.
    Number(String),
    Str(String),
    /// Raw bytes, produced only by the binary carrier.
    Bytes(Bytes),
    Array(Vec<Parsed>),
    Map(Vec<(String, Parsed)>),
}

impl From<serde_json::Value> for Parsed {
    fn from(v: serde_json::Value) -> Parsed {
        match v {
            serde_json::Value::Null => Parsed::Null,
            serde_json::Value::Bool(b) => Parsed::Bool(b),
            serde_json::Value::Number(n) => Parsed::Number(n.to_string()),
            serde_json::Value::String(s) => Parsed::Str(s),
            serde_json::Value::Array(a) => {
                Parsed::Array(a.into_iter().map(Parsed::from).collect())
            }
            serde_json::Value::Object(m) => {
                Parsed::Map(m.into_iter().map(|(k, v)| (k, Parsed::from(v))).collect())
            }
        }
    }
}

impl TryFrom<rmpv::Value> for Parsed {
    type Error = Error;

    fn try_from(v: rmpv::Value) -> Result<Parsed, Error> {
        match v {
            rmpv::Value::Nil => Ok(Parsed::Null),
            rmpv::Value::Boolean(b) => Ok(Parsed::Bool(b)),
            rmpv::Value::Integer(i) => Ok(Parsed::Number(i.to_string())),
            rmpv::Value::F32(f) => Ok(Parsed::Number(float_text(f as f64))),
            rmpv::Value::F64(f) => Ok(Parsed::Number(float_text(f))),
            rmpv::Value::String(s) => match s.into_str() {
                Some(s) => Ok(Parsed::Str(s)),
                None => Err(Error::Carrier("string is not UTF-8".to_owned())),
            },
            rmpv::Value::Binary(b) => Ok(Parsed::Bytes(Bytes::from(b))),
            rmpv::Value::Array(a) => Ok(Parsed::Array(
                a.into_iter()
                    .map(Parsed::try_from)
                    .collect::<Result<_, _>>()?,
            )),
            rmpv::Value::Map(m) => {
                let mut out = Vec::with_capacity(m.len());
                for (k, v) in m {
                    let key = match k {
                        rmpv::Value::String(s) => s
                            .into_str()
                            .ok_or_else(|| Error::Carrier("map key is not UTF-8".to_owned()))?,
                        other => {
                            return Err(Error::Shape(format!(
                                "map key must be a string, found {other}"
                            )))
                        }
                    };
                    out.push((key, Parsed::try_from(v)?));
                }
                Ok(Parsed::Map(out))
            }
            rmpv::Value::Ext(t, _) => {
                Err(Error::Carrier(format!("unexpected extension type {t}")))
            }
        }
    }
}

/// A per-tag decode function. Scalar tag payloads arrive as
/// [`Value::String`]; composite tag payloads as whatever the wire carried.
pub type Handler = Box<dyn Fn(TaggedValue) -> Result<Value, Error>>;

/// Interprets parsed carrier events as Transit values.
///
/// A decoder owns the rolling cache for one stream; decoding several
/// documents through the same instance keeps the cache rolling across them.
pub struct Decoder {
    handlers: HashMap<String, Handler>,
    cache: RollingCache,
    depth: usize,
}

impl Default for Decoder {
    fn default() -> Decoder { Decoder::new() }
}

impl Decoder {
    /// Creates a decoder with all built-in tag handlers installed.
    pub fn new() -> Decoder {
        let mut d = Decoder {
            handlers: HashMap::new(),
            cache: RollingCache::new(),
            depth: 0,
        };

        d.add_handler("_", decode_nil);
        d.add_handler(":", decode_keyword);
        d.add_handler("?", decode_boolean);
        d.add_handler("b", decode_bytes);
        d.add_handler("d", decode_decimal);
        d.add_handler("i", decode_integer);
        d.add_handler("n", decode_big_integer);
        d.add_handler("f", decode_big_decimal);
        d.add_handler("c", decode_char);
        d.add_handler("$", decode_symbol);
        d.add_handler("t", decode_rfc3339);
        d.add_handler("m", decode_millis);
        d.add_handler("u", decode_uuid);
        d.add_handler("r", decode_uri);
        d.add_handler("'", decode_quote);
        d.add_handler("z", decode_special_number);

        d.add_handler("set", decode_set);
        d.add_handler("list", decode_list);
        d.add_handler("cmap", decode_cmap);
        d.add_handler("ratio", decode_ratio);
        d.add_handler("link", decode_link);

        d.add_handler("unknown", decode_unknown);

        d
    }

    /// Registers (or replaces) the handler for a tag.
    pub fn add_handler<H>(&mut self, tag: impl Into<String>, handler: H)
    where
        H: Fn(TaggedValue) -> Result<Value, Error> + 'static,
    {
        self.handlers.insert(tag.into(), Box::new(handler));
    }

    /// The decoder's rolling cache.
    pub fn cache(&self) -> &RollingCache { &self.cache }

    /// Decodes one Transit document from JSON text.
    pub fn decode_json(&mut self, s: &str) -> Result<Value, Error> {
        let tree: serde_json::Value = serde_json::from_str(s)?;
        self.decode(Parsed::from(tree))
    }

    /// Decodes one Transit document from MessagePack bytes.
    pub fn decode_msgpack(&mut self, bytes: &[u8]) -> Result<Value, Error> {
        let tree = rmpv::decode::read_value(&mut &bytes[..])
            .map_err(|e| Error::Carrier(e.to_string()))?;
        self.decode(Parsed::try_from(tree)?)
    }

    /// Decodes one document from an already-parsed event tree.
    pub fn decode(&mut self, tree: Parsed) -> Result<Value, Error> {
        match self.parse(tree, false)? {
            Value::TagId(tag) => Err(Error::Shape(format!("dangling tag ~#{tag}"))),
            v => Ok(v),
        }
    }

    /// Parses one node of the event tree. `as_key` marks key position,
    /// which makes any long-enough string cacheable.
    pub fn parse(&mut self, tree: Parsed, as_key: bool) -> Result<Value, Error> {
        if self.depth >= MAX_DEPTH {
            return Err(Error::Shape(format!("input nested deeper than {MAX_DEPTH}")));
        }
        self.depth += 1;
        let result = self.parse_inner(tree, as_key);
        self.depth -= 1;
        result
    }

    fn parse_inner(&mut self, tree: Parsed, as_key: bool) -> Result<Value, Error> {
        match tree {
            Parsed::Null => Ok(Value::Null),
            Parsed::Bool(b) => Ok(Value::Bool(b)),
            Parsed::Number(token) => parse_number(&token),
            Parsed::Bytes(b) => Ok(Value::Byt(b)),
            Parsed::Str(s) => {
                let result = self.parse_string(&s)?;
                if self.cache.is_cacheable(&s, as_key) {
                    self.cache.write(s);
                }
                Ok(result)
            }
            Parsed::Array(elements) => self.parse_array(elements),
            Parsed::Map(entries) => self.parse_map(entries),
        }
    }

    fn parse_string(&mut self, s: &str) -> Result<Value, Error> {
        if self.cache.is_cache_key(s) {
            let expansion = self.cache.read(s)?.to_owned();
            return self.parse(Parsed::Str(expansion), false);
        }

        if !s.starts_with('~') {
            return Ok(Value::String(s.to_owned()));
        }

        if let Some(tag) = s.strip_prefix("~#") {
            return Ok(Value::TagId(tag.to_owned()));
        }

        // single-character tag dispatch on the byte after the tilde
        let tag = match s[1..].chars().next() {
            Some(c) => c,
            None => return Err(Error::Shape("bare ~ is not a value".to_owned())),
        };
        let payload = &s[1 + tag.len_utf8()..];

        if self.handlers.contains_key(tag.to_string().as_str()) {
            let tv = TaggedValue::new(tag.to_string(), Value::String(payload.to_owned()));
            return self.dispatch(tv);
        }

        if let Some(rest) = s.strip_prefix("~~") {
            return Ok(Value::String(format!("~{rest}")));
        }
        if let Some(rest) = s.strip_prefix("~^") {
            return Ok(Value::String(format!("^{rest}")));
        }
        if let Some(rest) = s.strip_prefix("~`") {
            return Ok(Value::String(format!("`{rest}")));
        }

        let tv = TaggedValue::new(tag.to_string(), Value::String(payload.to_owned()));
        self.dispatch_unknown(tv)
    }

    fn parse_array(&mut self, elements: Vec<Parsed>) -> Result<Value, Error> {
        let mut iter = elements.into_iter();

        let first = match iter.next() {
            None => return Ok(Value::Array(Vec::new())),
            Some(p) => self.parse(p, false)?,
        };

        if matches!(&first, Value::String(s) if s == MAP_AS_ARRAY) {
            return self.parse_array_map(iter.collect());
        }

        match first {
            Value::TagId(tag) => {
                let rest: Vec<Parsed> = iter.collect();

                let payload = if tag == "cmap" && rest.len() != 1 {
                    // inline entry pairs; keys advance the cache as keys
                    let mut flat = Vec::with_capacity(rest.len());
                    for (ix, p) in rest.into_iter().enumerate() {
                        flat.push(self.parse(p, ix % 2 == 0)?);
                    }
                    Value::Array(flat)
                } else if tag != "list" && rest.len() == 1 {
                    // nested single-payload form, e.g. ["~#set",[...]];
                    // lists always use the inline form, so one trailing
                    // element is a one-element list, not a payload
                    let mut rest = rest;
                    self.parse(rest.remove(0), false)?
                } else {
                    let mut flat = Vec::with_capacity(rest.len());
                    for p in rest {
                        flat.push(self.parse(p, false)?);
                    }
                    Value::Array(flat)
                };

                self.dispatch(TaggedValue::new(tag, payload))
            }
            first => {
                let mut out = vec![first];
                for p in iter {
                    out.push(self.parse(p, false)?);
                }
                Ok(Value::Array(out))
            }
        }
    }

    /// The tail of a `^ `-opened array: alternating keys and values.
    fn parse_array_map(&mut self, rest: Vec<Parsed>) -> Result<Value, Error> {
        if rest.len() % 2 != 0 {
            return Err(Error::Shape(
                "map-as-array has a key with no value".to_owned(),
            ));
        }

        let mut m = VecMap::with_capacity(rest.len() / 2);
        let mut iter = rest.into_iter();
        while let (Some(k), Some(v)) = (iter.next(), iter.next()) {
            let key = self.parse(k, true)?;
            let value = self.parse(v, false)?;
            m.insert(key, value);
        }
        Ok(Value::Map(m))
    }

    fn parse_map(&mut self, entries: Vec<(String, Parsed)>) -> Result<Value, Error> {
        if entries.len() == 1 {
            let mut entries = entries;
            let (k, v) = entries.remove(0);

            let key = self.parse(Parsed::Str(k), true)?;
            let value = self.parse(v, false)?;

            return match key {
                Value::TagId(tag) => self.dispatch(TaggedValue::new(tag, value)),
                key => {
                    let mut m = VecMap::with_capacity(1);
                    m.insert(key, value);
                    Ok(Value::Map(m))
                }
            };
        }

        let mut m = VecMap::with_capacity(entries.len());
        for (k, v) in entries {
            let key = self.parse(Parsed::Str(k), true)?;
            let value = self.parse(v, false)?;
            m.insert(key, value);
        }
        Ok(Value::Map(m))
    }

    fn dispatch(&mut self, tv: TaggedValue) -> Result<Value, Error> {
        match self.handlers.get(tv.tag.as_str()) {
            Some(handler) => handler(tv),
            None => self.dispatch_unknown(tv),
        }
    }

    fn dispatch_unknown(&mut self, tv: TaggedValue) -> Result<Value, Error> {
        trace!(tag = %tv.tag, "no handler for tag");
        match self.handlers.get("unknown") {
            Some(handler) => handler(tv),
            None => Err(Error::Shape(format!("no handler for tag ~#{}", tv.tag))),
        }
    }
}

fn parse_number(token: &str) -> Result<Value, Error> {
    if token.contains(['.', 'e', 'E']) {
        let f: f64 = token
            .parse()
            .map_err(|_| Error::Carrier(format!("bad float token {token:?}")))?;
        Ok(Value::from(f))
    } else {
        let i: i64 = token
            .parse()
            .map_err(|_| Error::Carrier(format!("integer token {token:?} out of range")))?;
        Ok(Value::Int(i))
    }
}

fn string_payload(tv: &TaggedValue) -> Result<&str, Error> {
    match tv.value.as_ref() {
        Value::String(s) => Ok(s),
        other => Err(Error::tag(
            tv.tag.clone(),
            format!("expected string payload, found {other:?}"),
        )),
    }
}

fn array_payload(tv: TaggedValue) -> Result<Vec<Value>, Error> {
    let tag = tv.tag;
    match *tv.value {
        Value::Array(a) => Ok(a),
        other => Err(Error::tag(tag, format!("expected array payload, found {other:?}"))),
    }
}

fn decode_nil(_: TaggedValue) -> Result<Value, Error> { Ok(Value::Null) }

fn decode_keyword(tv: TaggedValue) -> Result<Value, Error> {
    Ok(Value::Keyword(string_payload(&tv)?.to_owned()))
}

fn decode_symbol(tv: TaggedValue) -> Result<Value, Error> {
    Ok(Value::Symbol(string_payload(&tv)?.to_owned()))
}

fn decode_boolean(tv: TaggedValue) -> Result<Value, Error> {
    match string_payload(&tv)? {
        "t" => Ok(Value::Bool(true)),
        "f" => Ok(Value::Bool(false)),
        other => Err(Error::tag("?", format!("unknown boolean value {other:?}"))),
    }
}

fn decode_integer(tv: TaggedValue) -> Result<Value, Error> {
    let s = string_payload(&tv)?;
    s.parse::<i64>()
        .map(Value::Int)
        .map_err(|e| Error::tag("i", format!("{s:?}: {e}")))
}

fn decode_big_integer(tv: TaggedValue) -> Result<Value, Error> {
    let s = string_payload(&tv)?;
    BigInt::from_str(s)
        .map(Value::BigInt)
        .map_err(|e| Error::tag("n", format!("{s:?}: {e}")))
}

fn decode_decimal(tv: TaggedValue) -> Result<Value, Error> {
    let s = string_payload(&tv)?;
    s.parse::<f64>()
        .map(Value::from)
        .map_err(|e| Error::tag("d", format!("{s:?}: {e}")))
}

fn decode_big_decimal(tv: TaggedValue) -> Result<Value, Error> {
    let s = string_payload(&tv)?;
    BigDecimal::from_str(s)
        .map(Value::BigDec)
        .map_err(|e| Error::tag("f", format!("{s:?}: {e}")))
}

fn decode_special_number(tv: TaggedValue) -> Result<Value, Error> {
    match string_payload(&tv)? {
        "NaN" => Ok(Value::from(f64::NAN)),
        "INF" => Ok(Value::from(f64::INFINITY)),
        "-INF" => Ok(Value::from(f64::NEG_INFINITY)),
        other => Err(Error::tag("z", format!("bad special number {other:?}"))),
    }
}

fn decode_bytes(tv: TaggedValue) -> Result<Value, Error> {
    let s = string_payload(&tv)?;
    BASE64
        .decode(s)
        .map(|b| Value::Byt(Bytes::from(b)))
        .map_err(|e| Error::tag("b", e.to_string()))
}

fn decode_char(tv: TaggedValue) -> Result<Value, Error> {
    let s = string_payload(&tv)?;
    let mut chars = s.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok(Value::Char(c)),
        _ => Err(Error::tag("c", format!("expected one character, found {s:?}"))),
    }
}

fn decode_rfc3339(tv: TaggedValue) -> Result<Value, Error> {
    let s = string_payload(&tv)?;
    DateTime::parse_from_rfc3339(s)
        .map(|t| Value::Time(t.with_timezone(&Utc)))
        .map_err(|e| Error::tag("t", format!("{s:?}: {e}")))
}

fn decode_millis(tv: TaggedValue) -> Result<Value, Error> {
    let s = string_payload(&tv)?;
    let millis: i64 = s
        .parse()
        .map_err(|e| Error::tag("m", format!("{s:?}: {e}")))?;
    Utc.timestamp_millis_opt(millis)
        .single()
        .map(Value::Time)
        .ok_or_else(|| Error::tag("m", format!("{millis} is out of range")))
}

fn decode_uuid(tv: TaggedValue) -> Result<Value, Error> {
    let s = string_payload(&tv)?;
    Uuid::parse_str(s)
        .map(Value::Uuid)
        .map_err(|e| Error::tag("u", format!("{s:?}: {e}")))
}

fn decode_uri(tv: TaggedValue) -> Result<Value, Error> {
    Ok(Value::Uri(string_payload(&tv)?.to_owned()))
}

fn decode_quote(tv: TaggedValue) -> Result<Value, Error> { Ok(*tv.value) }

fn decode_set(tv: TaggedValue) -> Result<Value, Error> {
    Ok(Value::Set(Set::from(array_payload(tv)?)))
}

fn decode_list(tv: TaggedValue) -> Result<Value, Error> {
    Ok(Value::List(array_payload(tv)?))
}

fn decode_cmap(tv: TaggedValue) -> Result<Value, Error> {
    let flat = array_payload(tv)?;
    if flat.len() % 2 != 0 {
        return Err(Error::tag("cmap", "odd number of entry elements"));
    }

    let mut entries = Vec::with_capacity(flat.len() / 2);
    let mut iter = flat.into_iter();
    while let (Some(k), Some(v)) = (iter.next(), iter.next()) {
        entries.push((k, v));
    }
    Ok(Value::CMap(entries))
}

fn to_bigint(v: &Value) -> Option<BigInt> {
    match v {
        Value::Int(i) => Some(BigInt::from(*i)),
        Value::BigInt(i) => Some(i.clone()),
        _ => None,
    }
}

fn decode_ratio(tv: TaggedValue) -> Result<Value, Error> {
    let parts = array_payload(tv)?;

    let (numer, denom) = match parts.as_slice() {
        [n, d] => match (to_bigint(n), to_bigint(d)) {
            (Some(n), Some(d)) => (n, d),
            _ => {
                return Err(Error::tag(
                    "ratio",
                    format!("expected two integers, found {parts:?}"),
                ))
            }
        },
        _ => {
            return Err(Error::tag(
                "ratio",
                format!("expected two elements, found {}", parts.len()),
            ))
        }
    };

    if denom.is_zero() {
        return Err(Error::tag("ratio", "zero denominator"));
    }
    Ok(Value::Ratio(BigRational::new(numer, denom)))
}

fn field_text(v: &Value) -> Option<String> {
    match v {
        Value::String(s) | Value::Uri(s) => Some(s.clone()),
        _ => None,
    }
}

fn decode_link(tv: TaggedValue) -> Result<Value, Error> {
    let tag = tv.tag;
    let m = match *tv.value {
        Value::Map(m) => m,
        other => {
            return Err(Error::tag(
                tag,
                format!("expected map payload, found {other:?}"),
            ))
        }
    };

    let field = |name: &str| m.get(&Value::from(name)).and_then(field_text);

    let href = field("href").ok_or_else(|| Error::tag("link", "missing href"))?;
    Ok(Value::Link(Link {
        href,
        rel: field("rel").unwrap_or_default(),
        name: field("name").unwrap_or_default(),
        render: field("render").unwrap_or_default(),
        prompt: field("prompt").unwrap_or_default(),
    }))
}

fn decode_unknown(tv: TaggedValue) -> Result<Value, Error> { Ok(Value::Tagged(tv)) }
