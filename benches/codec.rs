#[macro_use]
extern crate criterion;

use criterion::{black_box, Criterion};
use transit::prelude::*;

const N_BIG_ARR: usize = 2000;

fn big_arr() -> Value {
    let v: Vec<Value> = (0..N_BIG_ARR).map(|i| Value::from(i as i64)).collect();
    Value::from(v)
}

const N_KEYS: usize = 500;

fn keyword_map() -> Value {
    let m: VecMap<Value, Value> = (0..N_KEYS)
        .map(|i| (Value::keyword(format!("key{i:04}")), Value::from(i as i64)))
        .collect();
    // two copies so the second round of keys rides the cache
    Value::from(vec![Value::Map(m.clone()), Value::Map(m)])
}

fn bench_encode_json(c: &mut Criterion) {
    let arr = big_arr();
    let map = keyword_map();

    c.bench_function("encode ints to json", |b| {
        b.iter(|| black_box(encode_json(&arr).unwrap()))
    });

    c.bench_function("encode keyword maps to json", |b| {
        b.iter(|| black_box(encode_json(&map).unwrap()))
    });
}

fn bench_decode_json(c: &mut Criterion) {
    let arr = encode_json(&big_arr()).unwrap();
    let map = encode_json(&keyword_map()).unwrap();

    c.bench_function("decode ints from json", |b| {
        b.iter(|| black_box(decode_json(&arr).unwrap()))
    });

    c.bench_function("decode keyword maps from json", |b| {
        b.iter(|| black_box(decode_json(&map).unwrap()))
    });
}

fn bench_msgpack(c: &mut Criterion) {
    let map = keyword_map();
    let bytes = encode_msgpack(&map).unwrap();

    c.bench_function("encode keyword maps to msgpack", |b| {
        b.iter(|| black_box(encode_msgpack(&map).unwrap()))
    });

    c.bench_function("decode keyword maps from msgpack", |b| {
        b.iter(|| black_box(decode_msgpack(&bytes).unwrap()))
    });
}

criterion_group!(benches, bench_encode_json, bench_decode_json, bench_msgpack);
criterion_main!(benches);
