use thiserror::Error;

/// Everything that can go wrong while encoding or decoding Transit data.
///
/// A single error terminates the operation: the encoder does not emit
/// partial output after a failure and the decoder discards any partially
/// built value tree. Offending values are rendered into the message.
#[derive(Debug, Error)]
pub enum Error {
    /// Propagated from the underlying carrier: I/O, JSON text, or
    /// MessagePack framing.
    #[error("carrier error: {0}")]
    Carrier(String),

    /// A known tag whose payload does not parse.
    #[error("bad payload for tag ~{tag}: {message}")]
    Tag { tag: String, message: String },

    /// A violation of the rolling-cache protocol, such as a cache code that
    /// was never installed earlier in the stream.
    #[error("cache error: {0}")]
    Cache(String),

    /// The encoder found a value with no registered encoder.
    #[error("don't know how to encode value: {0}")]
    UnknownType(String),

    /// Input whose shape does not match the Transit grammar.
    #[error("unexpected shape: {0}")]
    Shape(String),
}

impl Error {
    /// Builds a [`Error::Tag`] for `tag` with the supplied message.
    pub fn tag(tag: impl Into<String>, message: impl Into<String>) -> Error {
        Error::Tag {
            tag: tag.into(),
            message: message.into(),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Error { Error::Carrier(e.to_string()) }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Error { Error::Carrier(e.to_string()) }
}
