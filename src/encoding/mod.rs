//! # Transit encoder and decoder
//!
//! Encode and decode functions for Transit over both carriers.
//!
//! # Example
//!
//! ```
//! use transit::prelude::*;
//!
//! // a value with some repetition in it
//! let v = Value::from(vec![
//!     Value::keyword("aquamarine"),
//!     Value::keyword("aquamarine"),
//! ]);
//!
//! // the second occurrence travels as a cache code
//! let json = encode_json(&v).unwrap();
//! assert_eq!(json, r#"["~:aquamarine","^0"]"#);
//!
//! // and both carriers decode to the value we started with
//! let mp = encode_msgpack(&v).unwrap();
//! assert_eq!(decode_json(&json).unwrap(), v);
//! assert_eq!(decode_msgpack(&mp).unwrap(), v);
//! ```

use crate::{errors::Error, Value};

pub mod de;
pub mod emit;
pub mod ser;

pub use de::{Decoder, Handler, Parsed};
pub use emit::{DataEmitter, JsonEmitter, MsgPackEmitter};
pub use ser::{kind_of, Encoder, Kind, ValueEncoder};

/// Prefix of a composite tag key, as in `~#cmap`.
pub const START_TAG: &str = "~#";
/// Prefix of a keyword, as in `~:foo`.
pub const START_KW: &str = "~:";
/// Prefix of a symbol, as in `~$foo`.
pub const START_SYM: &str = "~$";
/// The cache-code marker.
pub const SUB_STR: &str = "^";
/// The sentinel opening an in-array map with stringable keys.
pub const MAP_AS_ARRAY: &str = "^ ";
/// The tag wrapping a stringable value at the top level.
pub const QUOTE_TAG: &str = "'";
/// Largest integer magnitude a JSON number can carry exactly.
pub const MAX_JSON_INT: i64 = (1 << 53) - 1;

/// Recursion limit shared by the encoder and the decoder. Cyclic or
/// absurdly deep inputs surface as shape errors instead of blowing the
/// stack.
pub(crate) const MAX_DEPTH: usize = 512;

/// Encodes a value as cached Transit JSON.
///
/// # Example
///
/// ```
/// use transit::prelude::*;
///
/// assert_eq!(encode_json(&Value::from(1)).unwrap(), r#"["~#'",1]"#);
/// ```
pub fn encode_json(v: &Value) -> Result<String, Error> {
    let mut out = Vec::new();
    Encoder::json(&mut out).encode(v)?;
    String::from_utf8(out).map_err(|e| Error::Carrier(e.to_string()))
}

/// Encodes a value as verbose Transit JSON: no cache codes, every string
/// written in full. Decodes to the same value as the cached form.
pub fn encode_json_verbose(v: &Value) -> Result<String, Error> {
    let mut out = Vec::new();
    Encoder::json_verbose(&mut out).encode(v)?;
    String::from_utf8(out).map_err(|e| Error::Carrier(e.to_string()))
}

/// Encodes a value as cached Transit MessagePack.
pub fn encode_msgpack(v: &Value) -> Result<Vec<u8>, Error> {
    let mut out = Vec::new();
    Encoder::msgpack(&mut out).encode(v)?;
    Ok(out)
}

/// Decodes one Transit document from JSON text.
///
/// # Example
///
/// ```
/// use transit::prelude::*;
///
/// let v = decode_json(r#"["~#'","~:hello"]"#).unwrap();
/// assert_eq!(v, Value::keyword("hello"));
/// ```
pub fn decode_json(s: &str) -> Result<Value, Error> { Decoder::new().decode_json(s) }

/// Decodes one Transit document from MessagePack bytes.
pub fn decode_msgpack(bytes: &[u8]) -> Result<Value, Error> {
    Decoder::new().decode_msgpack(bytes)
}
