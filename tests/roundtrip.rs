use bigdecimal::BigDecimal;
use chrono::{TimeZone, Utc};
use num_bigint::BigInt;
use num_rational::BigRational;
use proptest::prelude::*;
use std::str::FromStr;
use transit::prelude::*;
use transit_strategy::arb_value;

/// Encodes and re-decodes `value` through every carrier and cache mode,
/// checking that each path reproduces it.
fn verify_round_trip(value: &Value) {
    let json = encode_json(value).unwrap_or_else(|e| panic!("encoding {value:?}: {e}"));
    let back = decode_json(&json).unwrap_or_else(|e| panic!("decoding {json}: {e}"));
    assert_eq!(&back, value, "cached JSON round trip through {json}");

    let verbose = encode_json_verbose(value).unwrap();
    let back = decode_json(&verbose).unwrap_or_else(|e| panic!("decoding {verbose}: {e}"));
    assert_eq!(&back, value, "verbose JSON round trip through {verbose}");

    let mp = encode_msgpack(value).unwrap();
    let back = decode_msgpack(&mp).unwrap_or_else(|e| panic!("decoding {mp:x?}: {e}"));
    assert_eq!(&back, value, "MessagePack round trip");
}

#[test]
fn scalars() {
    verify_round_trip(&Value::Null);
    verify_round_trip(&Value::from(false));
    verify_round_trip(&Value::from(true));
    verify_round_trip(&Value::from(0));
    verify_round_trip(&Value::from(1));
    verify_round_trip(&Value::from("hello"));
    verify_round_trip(&Value::from("~eight"));
    verify_round_trip(&Value::symbol("hello"));
    verify_round_trip(&Value::keyword("hello"));
    verify_round_trip(&Value::Char('q'));
    verify_round_trip(&Value::from(f64::NAN));
    verify_round_trip(&Value::from(f64::INFINITY));
    verify_round_trip(&Value::from(f64::NEG_INFINITY));
}

#[test]
fn interesting_numbers() {
    let max_safe = (1i64 << 53) - 1;
    for i in [
        0,
        1,
        -1,
        max_safe,
        max_safe + 1,
        -(max_safe + 1),
        i64::MAX,
        i64::MIN,
    ] {
        verify_round_trip(&Value::from(vec![i]));
        verify_round_trip(&Value::from(i));
    }

    for f in [-3.14159, 3.14159, 4.0e11, 2.998e8, 6.626e-34, -0.0] {
        verify_round_trip(&Value::from(f));
    }

    verify_round_trip(&Value::BigInt(
        BigInt::from_str("-170141183460469231731687303715884105728123").unwrap(),
    ));
    verify_round_trip(&Value::BigDec(BigDecimal::from_str("3.14159265358979323846").unwrap()));
    verify_round_trip(&Value::Ratio(BigRational::new(
        BigInt::from(-10),
        BigInt::from(4),
    )));
}

#[test]
fn small_strings() {
    for s in ["", "a", "ab", "abc", "abcd", "abcde", "abcdef"] {
        verify_round_trip(&Value::from(s));
    }
}

#[test]
fn reserved_prefix_strings() {
    for s in ["~foo", "^foo", "`foo", "~", "^", "`", "~~", "^ ", "~#tag"] {
        verify_round_trip(&Value::from(s));
        let m: VecMap<Value, Value> = vec![(Value::from(s), Value::from(1))].into();
        verify_round_trip(&Value::Map(m));
    }
}

#[test]
fn uuids() {
    let v = Value::from(
        [
            "5a2cbea3-e8c6-428b-b525-21239370dd55",
            "d1dc64fa-da79-444b-9fa4-d4412f427289",
            "501a978e-3a3e-4060-b3be-1cf2bd4b1a38",
            "b3ba141a-a776-48e4-9fae-a28ea8571f58",
        ]
        .iter()
        .map(|s| Value::from(uuid::Uuid::parse_str(s).unwrap()))
        .collect::<Vec<_>>(),
    );
    verify_round_trip(&v);
}

#[test]
fn uris() {
    let v = Value::from(vec![
        Value::uri("http://example.com"),
        Value::uri("ftp://example.com"),
        Value::uri("file:///path/to/file.txt"),
        Value::uri("http://www.詹姆斯.com/"),
    ]);
    verify_round_trip(&v);
}

#[test]
fn timestamps() {
    for millis in [0i64, 1_456_019_134_534, -86_400_000] {
        verify_round_trip(&Value::Time(Utc.timestamp_millis_opt(millis).unwrap()));
    }
}

#[test]
fn rfc3339_reads_decode_to_the_same_instant() {
    let a = decode_json(r#"["~#'","~t2016-02-21T02:25:34.534Z"]"#).unwrap();
    let b = decode_json(r#"["~#'","~m1456019134534"]"#).unwrap();
    assert_eq!(a, b);
}

#[test]
fn bytes() {
    verify_round_trip(&Value::Byt(Bytes::from_static(b"foobarbaz")));
    verify_round_trip(&Value::Byt(Bytes::from_static(&[0, 1, 2, 255, 254])));
    verify_round_trip(&Value::Byt(Bytes::new()));
}

#[test]
fn empty_collections_keep_their_variant() {
    verify_round_trip(&Value::Array(vec![]));
    verify_round_trip(&Value::List(vec![]));
    verify_round_trip(&Value::Set(Set::new()));
    verify_round_trip(&Value::Map(VecMap::new()));
    verify_round_trip(&Value::CMap(vec![]));
}

#[test]
fn single_element_lists() {
    verify_round_trip(&Value::List(vec![Value::from(1)]));
    // a lone array element must stay an element, not become the payload
    verify_round_trip(&Value::List(vec![Value::from(vec![1, 2])]));
    verify_round_trip(&Value::List(vec![Value::keyword("only")]));
}

#[test]
fn nested_vectors() {
    let mixed = Value::from(vec![
        Value::from(0),
        Value::from(1),
        Value::from(2.0),
        Value::from(true),
        Value::from(false),
        Value::from("five"),
        Value::keyword("six"),
        Value::symbol("seven"),
        Value::from("~eight"),
        Value::Null,
    ]);
    let v = Value::from(vec![Value::from(vec![1, 2, 3]), mixed]);
    verify_round_trip(&v);
}

#[test]
fn nested_sets() {
    let inner1: Set = vec![Value::from(1), Value::from(3), Value::from(2)].into();
    let inner2: Set = vec![
        Value::Null,
        Value::from(0),
        Value::from(2.0),
        Value::from("~eight"),
        Value::from(1),
        Value::from(true),
        Value::from("five"),
        Value::from(false),
        Value::symbol("seven"),
        Value::keyword("six"),
    ]
    .into();
    let v: Set = vec![Value::Set(inner1), Value::Set(inner2)].into();
    verify_round_trip(&Value::Set(v));
}

#[test]
fn maps_with_keyword_keys() {
    let m = |a: i64, b: i64| {
        let m: VecMap<Value, Value> = vec![
            (Value::keyword("bbbb"), Value::from(b)),
            (Value::keyword("aaaa"), Value::from(a)),
        ]
        .into();
        Value::Map(m)
    };
    verify_round_trip(&Value::from(vec![m(1, 2), m(3, 4), m(5, 6)]));
}

#[test]
fn maps_with_numeric_keys() {
    let m: VecMap<Value, Value> = vec![
        (Value::from(1), Value::from("one")),
        (Value::from(2), Value::from("two")),
    ]
    .into();
    verify_round_trip(&Value::Map(m));
}

#[test]
fn map_and_cmap_stay_distinct() {
    // all-stringable keys stay a Map
    let m: VecMap<Value, Value> = vec![(Value::from("k"), Value::from(1))].into();
    let json = encode_json(&Value::Map(m.clone())).unwrap();
    assert!(json.starts_with(r#"["^ ""#));
    assert_eq!(decode_json(&json).unwrap(), Value::Map(m));

    // one composite key flips the whole map to a CMap on the wire, so it
    // comes back as a CMap
    let m: VecMap<Value, Value> = vec![
        (Value::from("k"), Value::from(1)),
        (Value::from(vec![1]), Value::from(2)),
    ]
    .into();
    let json = encode_json(&Value::Map(m)).unwrap();
    assert!(json.starts_with(r#"["~#cmap""#));
    match decode_json(&json).unwrap() {
        Value::CMap(entries) => assert_eq!(entries.len(), 2),
        other => panic!("expected a cmap, got {other:?}"),
    }
}

#[test]
fn links() {
    verify_round_trip(&Value::from(Link {
        href: "http://example.com/x".to_owned(),
        rel: "self".to_owned(),
        name: "x".to_owned(),
        render: "link".to_owned(),
        prompt: "".to_owned(),
    }));
    verify_round_trip(&Value::from(Link::new("http://example.com")));
}

#[test]
fn tagged_values_survive() {
    verify_round_trip(&Value::tagged("point", Value::from(vec![1, 2])));
    verify_round_trip(&Value::tagged("widget", Value::from("payload")));
    verify_round_trip(&Value::tagged("widget", Value::Null));
}

fn big_keyword_array(size: usize) -> Value {
    let mut out = Vec::with_capacity(2 * size);
    for i in 0..2 * size {
        let j = if i >= size { i - size } else { i };
        out.push(Value::keyword(format!("key{j:04}")));
    }
    Value::Array(out)
}

#[test]
fn cache_boundaries() {
    // fills the cache exactly, forces one clear, and lands one past the
    // reset, each repeated so every entry is read back through a code
    for size in [1935, 1936, 1937] {
        let v = big_keyword_array(size);
        let json = encode_json(&v).unwrap();
        assert_eq!(decode_json(&json).unwrap(), v, "size {size}");
        let mp = encode_msgpack(&v).unwrap();
        assert_eq!(decode_msgpack(&mp).unwrap(), v, "size {size}");
    }
}

#[test]
fn cache_codes_restart_after_clear() {
    let v = big_keyword_array(1937);
    let json = encode_json(&v).unwrap();

    // "key0000" is entry 0; after 1937 distinct writes the cache cleared,
    // so the second pass reinstalls it and "^0" must appear for the
    // repetition that follows the clear, not a three-digit code
    assert!(!json.contains("^[["), "no code past the two-digit range");
    assert_eq!(decode_json(&json).unwrap(), v);
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 256, ..ProptestConfig::default() })]

    #[test]
    fn encode_decode_json(v in arb_value()) {
        let json = encode_json(&v).unwrap();
        let dec = decode_json(&json);
        prop_assert_eq!(dec.as_ref().ok(), Some(&v), "wire: {}", json);
    }

    #[test]
    fn encode_decode_json_verbose(v in arb_value()) {
        // the cache is strictly a wire-level compression: with it disabled
        // the decoder must produce the identical value
        let cached = encode_json(&v).unwrap();
        let verbose = encode_json_verbose(&v).unwrap();
        let a = decode_json(&cached).ok();
        let b = decode_json(&verbose).ok();
        prop_assert_eq!(a.as_ref(), Some(&v));
        prop_assert_eq!(b.as_ref(), Some(&v));
    }

    #[test]
    fn encode_decode_msgpack(v in arb_value()) {
        let mp = encode_msgpack(&v).unwrap();
        let dec = decode_msgpack(&mp);
        prop_assert_eq!(dec.as_ref().ok(), Some(&v), "wire: {:x?}", mp);
    }

    #[test]
    fn carriers_agree(v in arb_value()) {
        let from_json = decode_json(&encode_json(&v).unwrap()).unwrap();
        let from_mp = decode_msgpack(&encode_msgpack(&v).unwrap()).unwrap();
        prop_assert_eq!(from_json, from_mp);
    }
}
