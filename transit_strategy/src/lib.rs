use bigdecimal::BigDecimal;
use bytes::Bytes;
use chrono::{TimeZone, Utc};
use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::Num;
use proptest::prelude::*;
use std::str::FromStr;
use transit::{link::Link, set::Set, vecmap::VecMap, TaggedValue, Value};
use uuid::Uuid;

/// arbitrary BigInt for use with proptest
pub fn arb_bigint() -> impl Strategy<Value = BigInt> {
    "-?1[0-1]{63,90}".prop_map(|n| -> BigInt { BigInt::from_str_radix(&n, 2).unwrap() })
}

/// arbitrary BigDecimal for use with proptest
pub fn arb_bigdec() -> impl Strategy<Value = BigDecimal> {
    "-?[0-9]{1,24}\\.[0-9]{1,12}".prop_map(|n| BigDecimal::from_str(&n).unwrap())
}

/// arbitrary Ratio for use with proptest
pub fn arb_ratio() -> impl Strategy<Value = BigRational> {
    (arb_bigint(), arb_bigint())
        .prop_filter("denominator must be nonzero", |(_, d)| *d != BigInt::from(0))
        .prop_map(|(n, d)| BigRational::new(n, d))
}

/// arbitrary Bytes for use with proptest
pub fn arb_bytes() -> impl Strategy<Value = Bytes> {
    prop::collection::vec(any::<u8>(), 0..64).prop_map(Bytes::from)
}

/// arbitrary timestamp with millisecond resolution, staying well inside the
/// range the calendar types accept
pub fn arb_time() -> impl Strategy<Value = Value> {
    (-30_610_224_000_000i64..32_503_680_000_000).prop_map(|millis| {
        Value::Time(Utc.timestamp_millis_opt(millis).single().unwrap())
    })
}

/// keyword and symbol names
fn arb_name() -> impl Strategy<Value = String> {
    "[a-zA-Z][a-zA-Z0-9_-]{0,12}"
}

/// user tags, long enough to avoid every built-in tag name
fn arb_tag() -> impl Strategy<Value = String> {
    "[a-z]{9,12}"
}

fn arb_link() -> impl Strategy<Value = Link> {
    (
        "https?://[a-z]{2,10}\\.com(/[a-z0-9]{1,6}){0,2}",
        arb_name(),
        arb_name(),
        prop_oneof![Just("link".to_owned()), Just("image".to_owned())],
        arb_name(),
    )
        .prop_map(|(href, rel, name, render, prompt)| Link {
            href,
            rel,
            name,
            render,
            prompt,
        })
}

/// stringable values, the ones allowed as plain map keys
pub fn arb_key() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::from),
        any::<i64>().prop_map(Value::from),
        any::<f64>().prop_map(Value::from),
        any::<char>().prop_map(Value::from),
        any::<String>().prop_map(Value::from),
        arb_name().prop_map(Value::Keyword),
        arb_name().prop_map(Value::Symbol),
        arb_bigint().prop_map(Value::from),
        any::<u128>().prop_map(|u| Value::from(Uuid::from_u128(u))),
        arb_time(),
    ]
}

/// arbitrary Transit value for use with proptest
pub fn arb_value() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        // misc
        any::<bool>().prop_map(Value::from),
        any::<char>().prop_map(Value::from),
        any::<String>().prop_map(Value::from),
        // integers
        any::<i8>().prop_map(Value::from),
        any::<u16>().prop_map(Value::from),
        any::<i32>().prop_map(Value::from),
        any::<u64>().prop_map(Value::from),
        any::<i64>().prop_map(Value::from),
        // floats, including the specials the wire spells with ~z
        any::<f64>().prop_map(Value::from),
        Just(Value::from(f64::NAN)),
        Just(Value::from(f64::INFINITY)),
        Just(Value::from(f64::NEG_INFINITY)),
        // big numbers
        arb_bigint().prop_map(Value::from),
        arb_bigdec().prop_map(Value::from),
        arb_ratio().prop_map(Value::from),
        // names
        arb_name().prop_map(Value::Keyword),
        arb_name().prop_map(Value::Symbol),
        // bytestrings
        arb_bytes().prop_map(Value::from),
        // identifiers and instants
        any::<u128>().prop_map(|u| Value::from(Uuid::from_u128(u))),
        "https?://[a-z]{2,10}\\.(com|org)(/[a-z0-9]{1,6}){0,2}".prop_map(Value::Uri),
        arb_time(),
        arb_link().prop_map(Value::from),
    ];

    leaf.prop_recursive(
        4,  // max depth
        64, // max nodes
        8,  // max items per collection
        |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..8).prop_map(Value::from),
                prop::collection::vec(inner.clone(), 0..8).prop_map(Value::List),
                prop::collection::vec(inner.clone(), 0..8)
                    .prop_map(|v| Value::Set(Set::from(v))),
                prop::collection::vec((arb_key(), inner.clone()), 0..8)
                    .prop_map(|pairs| Value::Map(VecMap::from(pairs))),
                prop::collection::vec((inner.clone(), inner.clone()), 0..4)
                    .prop_map(Value::CMap),
                (arb_tag(), inner).prop_map(|(tag, v)| Value::Tagged(TaggedValue::new(tag, v))),
            ]
        },
    )
}
