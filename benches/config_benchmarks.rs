use criterion::{criterion_group, criterion_main, Criterion};
use gatehouse::Config;
use std::hint::black_box;

fn bench_config_creation(c: &mut Criterion) {
    c.bench_function("config_default", |b| b.iter(|| Config::default()));
}

fn bench_config_serialization(c: &mut Criterion) {
    let config = Config::default();

    c.bench_function("config_to_toml", |b| {
        b.iter(|| toml::to_string(&black_box(&config)))
    });

    let toml_str = toml::to_string(&config).unwrap();
    c.bench_function("config_from_toml", |b| {
        b.iter(|| toml::from_str::<Config>(black_box(&toml_str)))
    });
}

fn bench_config_validate(c: &mut Criterion) {
    let mut config = Config::default();
    config.session.secret = "bench-secret".to_string();

    c.bench_function("config_validate", |b| b.iter(|| black_box(&config).validate()));
}

criterion_group!(
    benches,
    bench_config_creation,
    bench_config_serialization,
    bench_config_validate
);
criterion_main!(benches);
