use admin_provisioner::models::{Profile, Role, SubscriptionTier};
use admin_provisioner::services::credentials::{generate_email, generate_password};
use criterion::{criterion_group, criterion_main, Criterion};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::hint::black_box;

fn benchmark_credentials(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(7);

    let mut group = c.benchmark_group("credentials");

    group.bench_function("generate_email", |b| {
        b.iter(|| generate_email(&mut rng, black_box("example.com")))
    });

    group.bench_function("generate_password_default", |b| {
        b.iter(|| generate_password(&mut rng, black_box(12)))
    });

    group.bench_function("generate_password_long", |b| {
        b.iter(|| generate_password(&mut rng, black_box(64)))
    });

    group.finish();
}

fn benchmark_drift(c: &mut Criterion) {
    let profile = Profile::new(
        "uid-1",
        "admin@example.com",
        "Admin",
        Role::User,
        SubscriptionTier::Free,
        "2026-01-01T00:00:00Z",
    );

    c.bench_function("profile_drift", |b| {
        b.iter(|| {
            black_box(&profile).drift(black_box(Role::Admin), black_box(SubscriptionTier::Vip))
        })
    });
}

criterion_group!(benches, benchmark_credentials, benchmark_drift);
criterion_main!(benches);
