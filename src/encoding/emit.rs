use super::MAX_JSON_INT;
use crate::{
    cache::{Cache, NoopCache, RollingCache},
    errors::Error,
    util::float_text,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use std::io::Write;

/// The lowest level of output: scalar emission plus structural events.
///
/// The two implementations share the cache protocol and the tag grammar;
/// only the framing differs. Emission of one complete value is a pre-order,
/// left-to-right walk, so the emitter's cache advances exactly as a decoder
/// reading the output will.
pub trait DataEmitter {
    /// Writes `s` through to the output unaltered.
    fn emit_raw(&mut self, s: &str) -> Result<(), Error>;

    /// Emits a string scalar. The cache is consulted first: when `cacheable`
    /// holds (or the string carries a tag, keyword, or symbol prefix) a
    /// repeated string is replaced by its cache code.
    fn emit_string(&mut self, s: String, cacheable: bool) -> Result<(), Error>;

    /// Emits the composite tag `~#name`. The `~#` prefix is added here.
    fn emit_tag(&mut self, name: &str) -> Result<(), Error> {
        self.emit_string(format!("~#{name}"), true)
    }

    /// Emits null, or `~_` in key position on the JSON carrier.
    fn emit_nil(&mut self, as_key: bool) -> Result<(), Error>;

    /// Emits a boolean, or `~?t` / `~?f` in key position on the JSON
    /// carrier.
    fn emit_bool(&mut self, b: bool, as_key: bool) -> Result<(), Error>;

    /// Emits an integer. The JSON carrier switches to the stringified
    /// `~i` form in key position and beyond the 2^53 − 1 safe range.
    fn emit_int(&mut self, i: i64, as_key: bool) -> Result<(), Error>;

    /// Emits a finite float. Special values are the caller's problem; they
    /// travel as `~z` strings.
    fn emit_float(&mut self, f: f64, as_key: bool) -> Result<(), Error>;

    /// Emits a bytestring: base64 text under `~b` on the JSON carrier,
    /// a native bin frame on MessagePack.
    fn emit_bytes(&mut self, b: &[u8], as_key: bool) -> Result<(), Error>;

    /// Opens an array of `size` elements.
    fn start_array(&mut self, size: usize) -> Result<(), Error>;
    /// Separates two array elements.
    fn array_sep(&mut self) -> Result<(), Error>;
    /// Closes an array.
    fn end_array(&mut self) -> Result<(), Error>;

    /// Opens a map of `size` entries.
    fn start_map(&mut self, size: usize) -> Result<(), Error>;
    /// Separates two map entries.
    fn map_sep(&mut self) -> Result<(), Error>;
    /// Separates a key from its value.
    fn key_sep(&mut self) -> Result<(), Error>;
    /// Closes a map.
    fn end_map(&mut self) -> Result<(), Error>;
}

/// Emits Transit as JSON text.
pub struct JsonEmitter<W, C> {
    writer: W,
    cache: C,
}

impl<W: Write> JsonEmitter<W, RollingCache> {
    /// Creates a caching JSON emitter over `writer`.
    pub fn new(writer: W) -> Self {
        JsonEmitter {
            writer,
            cache: RollingCache::new(),
        }
    }
}

impl<W: Write> JsonEmitter<W, NoopCache> {
    /// Creates a verbose JSON emitter: every string travels in full.
    pub fn verbose(writer: W) -> Self {
        JsonEmitter {
            writer,
            cache: NoopCache,
        }
    }
}

impl<W: Write, C: Cache> DataEmitter for JsonEmitter<W, C> {
    fn emit_raw(&mut self, s: &str) -> Result<(), Error> {
        self.writer.write_all(s.as_bytes())?;
        Ok(())
    }

    fn emit_string(&mut self, s: String, cacheable: bool) -> Result<(), Error> {
        let s = if self.cache.is_cacheable(&s, cacheable) {
            self.cache.write(s)
        } else {
            s
        };
        serde_json::to_writer(&mut self.writer, &s)?;
        Ok(())
    }

    fn emit_nil(&mut self, as_key: bool) -> Result<(), Error> {
        if as_key {
            self.emit_string("~_".to_owned(), false)
        } else {
            self.emit_raw("null")
        }
    }

    fn emit_bool(&mut self, b: bool, as_key: bool) -> Result<(), Error> {
        if as_key {
            self.emit_string(if b { "~?t" } else { "~?f" }.to_owned(), false)
        } else {
            self.emit_raw(if b { "true" } else { "false" })
        }
    }

    fn emit_int(&mut self, i: i64, as_key: bool) -> Result<(), Error> {
        if as_key || i.unsigned_abs() > MAX_JSON_INT as u64 {
            self.emit_string(format!("~i{i}"), as_key)
        } else {
            self.emit_raw(&i.to_string())
        }
    }

    fn emit_float(&mut self, f: f64, as_key: bool) -> Result<(), Error> {
        if as_key {
            self.emit_string(format!("~d{f}"), as_key)
        } else {
            // a bare JSON number must reparse as a float, not an integer
            self.emit_raw(&float_text(f))
        }
    }

    fn emit_bytes(&mut self, b: &[u8], as_key: bool) -> Result<(), Error> {
        self.emit_string(format!("~b{}", BASE64.encode(b)), as_key)
    }

    fn start_array(&mut self, _size: usize) -> Result<(), Error> { self.emit_raw("[") }

    fn array_sep(&mut self) -> Result<(), Error> { self.emit_raw(",") }

    fn end_array(&mut self) -> Result<(), Error> { self.emit_raw("]") }

    fn start_map(&mut self, _size: usize) -> Result<(), Error> { self.emit_raw("{") }

    fn map_sep(&mut self) -> Result<(), Error> { self.emit_raw(",") }

    fn key_sep(&mut self) -> Result<(), Error> { self.emit_raw(":") }

    fn end_map(&mut self) -> Result<(), Error> { self.emit_raw("}") }
}

/// Emits Transit as MessagePack frames.
///
/// Tag strings, escapes, and cache codes are byte-for-byte the same as on
/// the JSON carrier; arrays and maps are length-prefixed frames, so the
/// separator events are no-ops.
pub struct MsgPackEmitter<W, C> {
    writer: W,
    cache: C,
}

impl<W: Write> MsgPackEmitter<W, RollingCache> {
    /// Creates a caching MessagePack emitter over `writer`.
    pub fn new(writer: W) -> Self {
        MsgPackEmitter {
            writer,
            cache: RollingCache::new(),
        }
    }
}

fn mp<T, E: std::fmt::Display>(r: Result<T, E>) -> Result<T, Error> {
    r.map_err(|e| Error::Carrier(e.to_string()))
}

impl<W: Write, C: Cache> DataEmitter for MsgPackEmitter<W, C> {
    fn emit_raw(&mut self, s: &str) -> Result<(), Error> {
        self.writer.write_all(s.as_bytes())?;
        Ok(())
    }

    fn emit_string(&mut self, s: String, cacheable: bool) -> Result<(), Error> {
        let s = if self.cache.is_cacheable(&s, cacheable) {
            self.cache.write(s)
        } else {
            s
        };
        mp(rmp::encode::write_str(&mut self.writer, &s))
    }

    fn emit_nil(&mut self, _as_key: bool) -> Result<(), Error> {
        mp(rmp::encode::write_nil(&mut self.writer))
    }

    fn emit_bool(&mut self, b: bool, _as_key: bool) -> Result<(), Error> {
        mp(rmp::encode::write_bool(&mut self.writer, b))
    }

    fn emit_int(&mut self, i: i64, _as_key: bool) -> Result<(), Error> {
        mp(rmp::encode::write_sint(&mut self.writer, i)).map(|_| ())
    }

    fn emit_float(&mut self, f: f64, _as_key: bool) -> Result<(), Error> {
        mp(rmp::encode::write_f64(&mut self.writer, f))
    }

    fn emit_bytes(&mut self, b: &[u8], _as_key: bool) -> Result<(), Error> {
        mp(rmp::encode::write_bin(&mut self.writer, b))
    }

    fn start_array(&mut self, size: usize) -> Result<(), Error> {
        mp(rmp::encode::write_array_len(&mut self.writer, size as u32)).map(|_| ())
    }

    fn array_sep(&mut self) -> Result<(), Error> { Ok(()) }

    fn end_array(&mut self) -> Result<(), Error> { Ok(()) }

    fn start_map(&mut self, size: usize) -> Result<(), Error> {
        mp(rmp::encode::write_map_len(&mut self.writer, size as u32)).map(|_| ())
    }

    fn map_sep(&mut self) -> Result<(), Error> { Ok(()) }

    fn key_sep(&mut self) -> Result<(), Error> { Ok(()) }

    fn end_map(&mut self) -> Result<(), Error> { Ok(()) }
}
