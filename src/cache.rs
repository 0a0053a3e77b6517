//! # Rolling cache
//!
//! Within a single stream, repeated cacheable strings are replaced by short
//! `^`-prefixed codes. The encoder and the decoder each own an independent
//! cache; fed the same value sequence they assign identical codes, which is
//! the correctness contract of the protocol. The only eviction policy is a
//! full clear once the table reaches capacity.

use crate::{
    encoding::{MAP_AS_ARRAY, START_KW, START_SYM, START_TAG, SUB_STR},
    errors::Error,
};
use hashbrown::HashMap;
use tracing::trace;

/// Number of digits in the code alphabet.
pub const CACHE_CODE_DIGITS: usize = 44;
/// First character of the code alphabet, `'0'`.
pub const BASE_CHAR_INDEX: u8 = 48;
/// Hard capacity: every code is at most two base-44 digits.
pub const CACHE_SIZE: usize = CACHE_CODE_DIGITS * CACHE_CODE_DIGITS;
/// Strings shorter than this are never cached.
pub const MIN_SIZE_CACHEABLE: usize = 4;

/// The cache operations the emitters need.
///
/// [`RollingCache`] implements the real protocol; [`NoopCache`] never caches
/// anything and backs verbose output, where every occurrence of a string is
/// written in full.
pub trait Cache {
    /// True iff `s` is long enough to cache and either sits in key position
    /// or starts with a tag, keyword, or symbol prefix.
    fn is_cacheable(&self, s: &str, as_key: bool) -> bool;

    /// Enters `s` into the cache if it is not already present. Returns the
    /// previously assigned code for a repeated string, and `s` itself on
    /// first occurrence (the first occurrence travels in full).
    fn write(&mut self, s: String) -> String;
}

/// A bidirectional string-to-code table, bounded by [`CACHE_SIZE`].
#[derive(Debug, Default)]
pub struct RollingCache {
    key_to_value: HashMap<String, String>,
    value_to_key: HashMap<String, String>,
}

impl RollingCache {
    /// Creates an empty cache.
    pub fn new() -> RollingCache { RollingCache::default() }

    /// True iff `code` has been assigned in this stream.
    pub fn has_key(&self, code: &str) -> bool { self.key_to_value.contains_key(code) }

    /// True iff `s` has the shape of a cache code: it starts with `^` and is
    /// not the map-as-array marker `^ `.
    pub fn is_cache_key(&self, s: &str) -> bool {
        !s.is_empty() && s.starts_with(SUB_STR) && s != MAP_AS_ARRAY
    }

    /// Looks up the string previously written under `code`.
    ///
    /// A code that was never assigned earlier in the stream is a cache
    /// error.
    pub fn read(&self, code: &str) -> Result<&str, Error> {
        self.key_to_value
            .get(code)
            .map(String::as_str)
            .ok_or_else(|| Error::Cache(format!("cache code {code:?} was never written")))
    }

    /// Number of entries currently installed.
    pub fn len(&self) -> usize { self.key_to_value.len() }

    /// Indicates whether the cache holds no entries.
    pub fn is_empty(&self) -> bool { self.key_to_value.is_empty() }

    /// Drops every entry. Code numbering restarts at zero.
    pub fn clear(&mut self) {
        self.key_to_value.clear();
        self.value_to_key.clear();
    }

    fn encode_key(&self, index: usize) -> String {
        let hi = index / CACHE_CODE_DIGITS;
        let lo = index % CACHE_CODE_DIGITS;
        if hi == 0 {
            format!("{}{}", SUB_STR, (lo as u8 + BASE_CHAR_INDEX) as char)
        } else {
            format!(
                "{}{}{}",
                SUB_STR,
                (hi as u8 + BASE_CHAR_INDEX) as char,
                (lo as u8 + BASE_CHAR_INDEX) as char
            )
        }
    }

    fn is_full(&self) -> bool { self.key_to_value.len() >= CACHE_SIZE }
}

impl Cache for RollingCache {
    fn is_cacheable(&self, s: &str, as_key: bool) -> bool {
        s.len() >= MIN_SIZE_CACHEABLE
            && (as_key
                || s.starts_with(START_TAG)
                || s.starts_with(START_KW)
                || s.starts_with(START_SYM))
    }

    fn write(&mut self, s: String) -> String {
        if let Some(existing) = self.value_to_key.get(&s) {
            return existing.clone();
        }

        if self.is_full() {
            trace!("cache full, clearing");
            self.clear();
        }

        let key = self.encode_key(self.key_to_value.len());
        self.key_to_value.insert(key.clone(), s.clone());
        self.value_to_key.insert(s.clone(), key);

        s
    }
}

/// A cache that never caches. Backs verbose emission.
#[derive(Debug, Default)]
pub struct NoopCache;

impl Cache for NoopCache {
    fn is_cacheable(&self, _s: &str, _as_key: bool) -> bool { false }

    fn write(&mut self, s: String) -> String { s }
}
