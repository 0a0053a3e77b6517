pub use crate::{
    cache::{Cache, NoopCache, RollingCache},
    encoding::{
        decode_json, decode_msgpack, encode_json, encode_json_verbose, encode_msgpack,
        Decoder, Encoder,
    },
    errors::Error,
    float::Double,
    link::Link,
    set::Set,
    vecmap::VecMap,
    Bytes, TaggedValue, Value,
};
