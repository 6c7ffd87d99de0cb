use criterion::{Criterion, Throughput, black_box, criterion_group, criterion_main};
use lithos_perf::Payload;
use lithos_slot::{MutexSlot, RingSlot, SharedSlot};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

fn bench_read(c: &mut Criterion) {
    let mutex = MutexSlot::from_value(Payload::initial());
    let ring = RingSlot::<Payload>::from_value(Payload::initial());

    let mut group = c.benchmark_group("slot");
    group.throughput(Throughput::Elements(1));

    group.bench_function("mutex_read", |b| {
        b.iter(|| black_box(mutex.read()));
    });
    group.bench_function("ring_read", |b| {
        b.iter(|| black_box(ring.read()));
    });

    group.finish();
}

fn bench_write(c: &mut Criterion) {
    let mutex = MutexSlot::from_value(Payload::initial());
    let ring = RingSlot::<Payload>::from_value(Payload::initial());
    let value = Arc::new(Payload::new(1));

    let mut group = c.benchmark_group("slot");
    group.throughput(Throughput::Elements(1));

    group.bench_function("mutex_write", |b| {
        b.iter(|| mutex.write(black_box(Arc::clone(&value))));
    });
    group.bench_function("ring_write", |b| {
        b.iter(|| ring.write(black_box(Arc::clone(&value))));
    });

    group.finish();
}

fn ring_write_sized<const N: usize>(c: &mut Criterion) {
    let ring = RingSlot::<Payload, N>::from_value(Payload::initial());
    let value = Arc::new(Payload::new(1));

    let mut group = c.benchmark_group("ring_capacity");
    group.throughput(Throughput::Elements(1));
    group.bench_function(format!("write_cap_{N}"), |b| {
        b.iter(|| ring.write(black_box(Arc::clone(&value))));
    });
    group.finish();
}

fn bench_ring_capacities(c: &mut Criterion) {
    ring_write_sized::<2>(c);
    ring_write_sized::<4>(c);
    ring_write_sized::<8>(c);
    ring_write_sized::<16>(c);
}

/// Measures `op` on the calling thread while `writers` background threads
/// keep writing into the same slot.
fn with_background_writers<S, F>(slot: &S, writers: u64, mut op: F)
where
    S: SharedSlot<Payload>,
    F: FnMut(),
{
    let running = AtomicBool::new(true);
    thread::scope(|scope| {
        for w in 1..=writers {
            let running = &running;
            scope.spawn(move || {
                let value = Arc::new(Payload::new(w + 1));
                while running.load(Ordering::Relaxed) {
                    slot.write(Arc::clone(&value));
                    std::hint::spin_loop();
                }
            });
        }
        op();
        running.store(false, Ordering::Relaxed);
    });
}

fn bench_read_under_writer(c: &mut Criterion) {
    let mutex = MutexSlot::from_value(Payload::initial());
    let ring = RingSlot::<Payload>::from_value(Payload::initial());

    let mut group = c.benchmark_group("slot_contended");
    group.throughput(Throughput::Elements(1));

    with_background_writers(&mutex, 1, || {
        group.bench_function("mutex_read_1_writer", |b| {
            b.iter(|| black_box(mutex.read()));
        });
    });
    with_background_writers(&ring, 1, || {
        group.bench_function("ring_read_1_writer", |b| {
            b.iter(|| black_box(ring.read()));
        });
    });

    group.finish();
}

/// Writer-vs-writer cost on the ring; compare capacities to see how often
/// the published-slot skip and failed claims force a retry.
fn bench_ring_write_contended(c: &mut Criterion) {
    let mut group = c.benchmark_group("slot_contended");
    group.throughput(Throughput::Elements(1));

    let ring4 = RingSlot::<Payload, 4>::from_value(Payload::initial());
    let ring16 = RingSlot::<Payload, 16>::from_value(Payload::initial());
    let value = Arc::new(Payload::new(1));

    with_background_writers(&ring4, 2, || {
        group.bench_function("ring_write_contended_cap_4", |b| {
            b.iter(|| ring4.write(black_box(Arc::clone(&value))));
        });
    });
    with_background_writers(&ring16, 2, || {
        group.bench_function("ring_write_contended_cap_16", |b| {
            b.iter(|| ring16.write(black_box(Arc::clone(&value))));
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_read,
    bench_write,
    bench_ring_capacities,
    bench_read_under_writer,
    bench_ring_write_contended,
);
criterion_main!(benches);
