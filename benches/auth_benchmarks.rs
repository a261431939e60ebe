use criterion::{criterion_group, criterion_main, Criterion};
use gatehouse::auth::{SessionManager, SessionSigner, SessionUser};
use gatehouse::store::MemoryStore;
use gatehouse::AuthService;
use std::hint::black_box;
use std::sync::Arc;

fn bench_login(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let auth = AuthService::new(Arc::new(MemoryStore::new()), 10);
    rt.block_on(auth.register("alice", "pw1")).unwrap();

    let mut group = c.benchmark_group("login");
    group.sample_size(10);
    group.bench_function("login_cost_10", |b| {
        b.iter(|| rt.block_on(auth.login(black_box("alice"), black_box("pw1"))))
    });
    group.finish();
}

fn bench_session_lookup(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let manager = SessionManager::default();
    let session = rt
        .block_on(manager.create_session(SessionUser::new("alice")))
        .unwrap();

    c.bench_function("session_lookup", |b| {
        b.iter(|| rt.block_on(manager.get_session(black_box(&session.id))))
    });
}

fn bench_token(c: &mut Criterion) {
    let signer = SessionSigner::new("bench-secret");
    let expires = chrono::Utc::now() + chrono::Duration::hours(1);
    let token = signer.sign("session-id", expires).unwrap();

    c.bench_function("token_sign", |b| {
        b.iter(|| signer.sign(black_box("session-id"), expires))
    });
    c.bench_function("token_verify", |b| b.iter(|| signer.verify(black_box(&token))));
}

criterion_group!(benches, bench_login, bench_session_lookup, bench_token);
criterion_main!(benches);
