//! # Transit
//!
//! An encoder and decoder for the Transit data-interchange format: a
//! self-describing layer of rich types (keywords, symbols, sets, big
//! numbers, timestamps, UUIDs, …) on top of a JSON or MessagePack carrier,
//! with a rolling cache that shortens repeated strings on the wire.
//!
//! # Example
//!
//! ```
//! use transit::prelude::*;
//!
//! let v = Value::from(vec![Value::from(1), Value::keyword("hello")]);
//!
//! let json = encode_json(&v).unwrap();
//! assert_eq!(json, r#"[1,"~:hello"]"#);
//!
//! assert_eq!(decode_json(&json).unwrap(), v);
//! ```

/// Rolling cache for repeated strings.
pub mod cache;
/// Transit encoder and decoder.
pub mod encoding;
/// Error type.
pub mod errors;
/// Double-precision floats with bitwise equality.
pub mod float;
/// Hypermedia links.
pub mod link;
/// Prelude
pub mod prelude;
/// Sets of values.
pub mod set;
/// Helper functions.
pub mod util;
/// A map wrapper around a sorted vector of pairs.
pub mod vecmap;

pub use bytes::Bytes;
pub use hashbrown::HashMap;

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use float::Double;
use link::Link;
use num_bigint::BigInt;
use num_rational::BigRational;
use set::Set;
use std::convert::{TryFrom, TryInto};
use uuid::Uuid;
use vecmap::VecMap;

#[derive(Eq, PartialEq, Ord, PartialOrd, Clone, Debug)]
/// A tag together with the value it wraps, for tags the core does not
/// handle itself.
pub struct TaggedValue {
    /// The tag, without its `~#` prefix.
    pub tag: String,
    /// The wrapped value.
    pub value: Box<Value>,
}

impl TaggedValue {
    /// Creates a tagged value.
    pub fn new(tag: impl Into<String>, value: Value) -> TaggedValue {
        TaggedValue {
            tag: tag.into(),
            value: Box::new(value),
        }
    }
}

#[derive(Eq, PartialEq, Ord, PartialOrd, Clone, Debug)]
/// Transit values.
///
/// The derived ordering is a canonical total order used by [`VecMap`] and
/// [`Set`] to make equality independent of insertion order; it has no wire
/// meaning.
pub enum Value {
    /// Null type. Equivalent to `None`.
    Null,
    /// Boolean type.
    Bool(bool),
    /// 64-bit signed integer.
    Int(i64),
    /// Double-precision float. NaN and the infinities are legal values.
    Float(Double),
    /// Arbitrary-precision integer.
    BigInt(BigInt),
    /// Arbitrary-precision decimal.
    BigDec(BigDecimal),
    /// Ratio of two arbitrary-precision integers.
    Ratio(BigRational),
    /// UTF-8 text.
    String(String),
    /// Keyword: a name, distinct from strings and symbols.
    Keyword(String),
    /// Symbol: an identifier, distinct from strings and keywords.
    Symbol(String),
    /// One Unicode scalar.
    Char(char),
    /// Bytestring type.
    Byt(Bytes),
    /// 128-bit identifier.
    Uuid(Uuid),
    /// IRI text. Not structurally validated.
    Uri(String),
    /// Instant in time.
    Time(DateTime<Utc>),
    /// Ordered sequence.
    Array(Vec<Value>),
    /// Ordered sequence, preserved as distinct from [`Value::Array`].
    List(Vec<Value>),
    /// Unordered collection with structural equality.
    Set(Set),
    /// Map whose keys are all stringable.
    Map(VecMap<Value, Value>),
    /// Map with at least one composite key; entry order is significant.
    CMap(Vec<(Value, Value)>),
    /// A value under a tag with no dedicated decoder.
    Tagged(TaggedValue),
    /// Hypermedia link.
    Link(Link),
    /// A `~#tag` marker. Appears transiently while decoding and is never
    /// part of a finished value.
    TagId(String),
}

impl Value {
    /// Creates a keyword.
    ///
    /// # Example
    ///
    /// ```
    /// use transit::Value;
    ///
    /// let kw = Value::keyword("hello");
    /// assert_eq!(kw, Value::Keyword("hello".to_owned()));
    /// ```
    pub fn keyword(name: impl Into<String>) -> Value { Value::Keyword(name.into()) }

    /// Creates a symbol.
    pub fn symbol(name: impl Into<String>) -> Value { Value::Symbol(name.into()) }

    /// Creates a URI value from its text form.
    pub fn uri(text: impl Into<String>) -> Value { Value::Uri(text.into()) }

    /// Wraps `value` under `tag`.
    pub fn tagged(tag: impl Into<String>, value: Value) -> Value {
        Value::Tagged(TaggedValue::new(tag, value))
    }

    /// Indicates whether a value is `Null`.
    ///
    /// # Example
    ///
    /// ```
    /// use transit::Value;
    ///
    /// assert!(Value::Null.is_null());
    /// ```
    pub fn is_null(&self) -> bool { matches!(self, Value::Null) }

    /// Tries to convert the value to a `bool`.
    /// This will return `None` if the value is not a boolean.
    pub fn to_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Tries to convert the value to an `i64`.
    /// This will return `None` if the value is not an integer.
    ///
    /// # Example
    ///
    /// ```
    /// use transit::Value;
    ///
    /// assert_eq!(Value::from(5).to_i64(), Some(5));
    /// ```
    pub fn to_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Tries to convert the value to an `f64`.
    /// This will return `None` if the value is not a float.
    pub fn to_f64(&self) -> Option<f64> {
        match self {
            Value::Float(d) => Some(d.to_f64()),
            _ => None,
        }
    }

    /// Borrows the text of a string value.
    /// This will return `None` if the value is not a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Borrows the elements of an array value.
    /// This will return `None` if the value is not an array.
    ///
    /// # Example
    ///
    /// ```
    /// use transit::Value;
    ///
    /// let ks = Value::from(vec![1, 2, 3]);
    /// assert_eq!(ks.to_vec().unwrap().len(), 3);
    /// ```
    pub fn to_vec(&self) -> Option<&Vec<Value>> {
        match self {
            Value::Array(a) => Some(a),
            _ => None,
        }
    }

    /// Consumes the value, converting it into a vector of values.
    /// This will return `None` if the value is not an array.
    pub fn into_vec(self) -> Option<Vec<Value>> { self.try_into().ok() }

    /// Borrows the entries of a map value.
    /// This will return `None` if the value is not a map.
    pub fn to_vecmap(&self) -> Option<&VecMap<Value, Value>> {
        match self {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }

    /// Consumes the value, converting it into a [`VecMap`].
    /// This will return `None` if the value is not a map.
    pub fn into_vecmap(self) -> Option<VecMap<Value, Value>> { self.try_into().ok() }

    /// Borrows the members of a set value.
    /// This will return `None` if the value is not a set.
    pub fn to_set(&self) -> Option<&Set> {
        match self {
            Value::Set(s) => Some(s),
            _ => None,
        }
    }

    /// Borrows the bytes of a bytestring value.
    /// This will return `None` if the value is not a bytestring.
    pub fn to_bytes(&self) -> Option<&Bytes> {
        match self {
            Value::Byt(b) => Some(b),
            _ => None,
        }
    }

    /// Converts a bytestring literal to a value.
    pub fn from_static(bytes: &'static [u8]) -> Value { Value::Byt(Bytes::from_static(bytes)) }
}

macro_rules! try_from_ctor {
    ($from:ty, $to:ty, $ctor:path) => {
        impl TryFrom<$from> for $to {
            type Error = $from;

            fn try_from(from: $from) -> Result<$to, $from> {
                match from {
                    $ctor(a) => Ok(a),
                    f => Err(f),
                }
            }
        }
    };
}

from_fn!(Value, bool, Value::Bool);
try_from_ctor!(Value, bool, Value::Bool);
from_fn!(Value, i64, Value::Int);
try_from_ctor!(Value, i64, Value::Int);
from_fn!(Value, Double, Value::Float);
try_from_ctor!(Value, Double, Value::Float);
from_fn!(Value, BigInt, Value::BigInt);
from_fn!(Value, BigDecimal, Value::BigDec);
from_fn!(Value, BigRational, Value::Ratio);
from_fn!(Value, String, Value::String);
try_from_ctor!(Value, String, Value::String);
from_fn!(Value, char, Value::Char);
from_fn!(Value, Bytes, Value::Byt);
try_from_ctor!(Value, Bytes, Value::Byt);
from_fn!(Value, Uuid, Value::Uuid);
from_fn!(Value, DateTime<Utc>, Value::Time);
from_fn!(Value, Set, Value::Set);
from_fn!(Value, Link, Value::Link);
from_fn!(Value, TaggedValue, Value::Tagged);

try_from_ctor!(Value, Vec<Value>, Value::Array);
try_from_ctor!(Value, VecMap<Value, Value>, Value::Map);

from_fn!(Value, &str, |s: &str| Value::String(s.to_owned()));
from_fn!(Value, (), |_| Value::Null);

compose_from!(Value, Double, f64);
compose_from!(Value, Double, f32);

// Unsigned integers widen to signed; values past the signed range become
// big integers.
from_fn!(Value, u64, |u: u64| {
    if u <= i64::MAX as u64 {
        Value::Int(u as i64)
    } else {
        Value::BigInt(BigInt::from(u))
    }
});

from_fn!(Value, i128, |i: i128| {
    if i64::try_from(i).is_ok() {
        Value::Int(i as i64)
    } else {
        Value::BigInt(BigInt::from(i))
    }
});

from_fn!(Value, u128, |i: u128| {
    if i <= i64::MAX as u128 {
        Value::Int(i as i64)
    } else {
        Value::BigInt(BigInt::from(i))
    }
});

from_fn!(Value, usize, |i: usize| Value::from(i as u64));
from_fn!(Value, isize, |i: isize| Value::from(i as i64));

from_prims!(Value);

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Value { Value::Array(v.into_iter().map(T::into).collect()) }
}

impl<T: Into<Value>> From<VecMap<Value, T>> for Value {
    fn from(v: VecMap<Value, T>) -> Value {
        Value::Map(v.into_iter().map(|(k, v)| (k, v.into())).collect())
    }
}

// Optional values unwrap at the ingest boundary: absence is `Null`.
impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Value {
        match v {
            None => Value::Null,
            Some(t) => t.into(),
        }
    }
}

#[macro_export]
/// Helper macro.
macro_rules! from_prims {
    ($to:tt) => {
        from_as!($to, i32, i64);
        from_as!($to, i16, i64);
        from_as!($to, i8, i64);

        from_as!($to, u32, i64);
        from_as!($to, u16, i64);
        from_as!($to, u8, i64);
    };
}
