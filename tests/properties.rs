//! End-to-end scenarios for the bus's broadcast/ordering/backpressure/
//! error-isolation contract (spec.md §8: P1-P6, S1-S6).

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use ringcast::{BusError, Consumer, Dispatcher, DispatcherConfig, Result};

struct Collector {
    seen: Arc<Mutex<Vec<u64>>>,
    closed: Arc<AtomicUsize>,
}

impl Consumer<u64> for Collector {
    fn consume(&mut self, batch: &[u64]) -> Result<()> {
        self.seen.lock().unwrap().extend_from_slice(batch);
        Ok(())
    }

    fn close(&mut self) {
        self.closed.fetch_add(1, Ordering::SeqCst);
    }
}

/// Sleeps for a fixed duration per batch, to make backpressure
/// observable (spec.md S3/S4).
struct SlowCollector {
    seen: Arc<Mutex<Vec<u64>>>,
    per_batch_delay: Duration,
}

impl Consumer<u64> for SlowCollector {
    fn consume(&mut self, batch: &[u64]) -> Result<()> {
        std::thread::sleep(self.per_batch_delay);
        self.seen.lock().unwrap().extend_from_slice(batch);
        Ok(())
    }
}

/// Records every non-multiple-of-7 item as it walks the batch, then
/// fails the whole batch if it contained a nonzero multiple of 7
/// (spec.md S5).
///
/// Recording survivors *before* returning the error, rather than only
/// on an all-or-nothing success path, keeps `seen` deterministic no
/// matter how the worker coalesces items into batches: the worker
/// drains the whole backlog on each wake-up (spec.md §4.4), so two
/// produced items can land in the same batch or in separate ones
/// depending on timing, and a batch that happens to combine a
/// survivor with a multiple of 7 must not silently drop the survivor
/// too — only the documented "skip past the failing batch" semantics
/// (no redelivery) should determine what's missing from `seen`, and
/// here nothing the consumer already recorded is ever un-recorded.
struct FlakyCollector {
    seen: Arc<Mutex<Vec<u64>>>,
}

impl Consumer<u64> for FlakyCollector {
    fn consume(&mut self, batch: &[u64]) -> Result<()> {
        let mut failing = None;
        for &item in batch {
            if item != 0 && item % 7 == 0 {
                failing = Some(item);
            } else {
                self.seen.lock().unwrap().push(item);
            }
        }
        match failing {
            Some(item) => Err(BusError::unexpected(format!("multiple of 7: {item}"))),
            None => Ok(()),
        }
    }
}

// S1: capacity 8, one consumer, produce 0..99 one item per call.
#[test]
fn s1_single_consumer_sees_full_ordered_sequence() {
    let bus: Dispatcher<u64> = Dispatcher::new(DispatcherConfig::new(8).unwrap()).unwrap();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let closed = Arc::new(AtomicUsize::new(0));

    bus.register_consumer(
        "c",
        Box::new(Collector {
            seen: seen.clone(),
            closed: closed.clone(),
        }),
    )
    .unwrap();

    for i in 0..100u64 {
        bus.produce(vec![i]).unwrap();
    }
    bus.close();

    let expected: Vec<u64> = (0..100).collect();
    assert_eq!(*seen.lock().unwrap(), expected);
}

// S2 / P1 / P5: capacity 1024, two consumers, produce 0..9_999;
// both finish with the identical ordered history and exactly-once close.
#[test]
fn s2_two_consumers_receive_identical_ordered_histories() {
    let bus: Dispatcher<u64> = Dispatcher::new(DispatcherConfig::new(1024).unwrap()).unwrap();

    let seen_a = Arc::new(Mutex::new(Vec::new()));
    let closed_a = Arc::new(AtomicUsize::new(0));
    let seen_b = Arc::new(Mutex::new(Vec::new()));
    let closed_b = Arc::new(AtomicUsize::new(0));

    bus.register_consumer(
        "a",
        Box::new(Collector {
            seen: seen_a.clone(),
            closed: closed_a.clone(),
        }),
    )
    .unwrap();
    bus.register_consumer(
        "b",
        Box::new(Collector {
            seen: seen_b.clone(),
            closed: closed_b.clone(),
        }),
    )
    .unwrap();

    let items: Vec<u64> = (0..10_000).collect();
    for chunk in items.chunks(37) {
        bus.produce(chunk.to_vec()).unwrap();
    }
    bus.close();

    assert_eq!(seen_a.lock().unwrap().len(), 10_000);
    assert_eq!(seen_b.lock().unwrap().len(), 10_000);
    assert_eq!(*seen_a.lock().unwrap(), *seen_b.lock().unwrap());
    assert_eq!(*seen_a.lock().unwrap(), items);
    assert_eq!(closed_a.load(Ordering::SeqCst), 1);
    assert_eq!(closed_b.load(Ordering::SeqCst), 1);
}

// S3 / P4: capacity 4, one slow consumer, fast producer; the gap
// between producer and consumer cursor never exceeds the capacity.
//
// We can't observe internal cursors from outside the crate, so this
// is verified indirectly: `produce` must never let more than
// `capacity` unconsumed items build up, which we confirm by timing —
// a producer publishing 1,000 items against a consumer that sleeps
// 10ms per (naturally batched) call cannot finish in much less than
// the time implied by the backpressure bound.
#[test]
fn s3_backpressure_bounds_producer_lead() {
    let capacity = 4;
    let bus: Dispatcher<u64> = Dispatcher::new(DispatcherConfig::new(capacity).unwrap()).unwrap();
    let seen = Arc::new(Mutex::new(Vec::new()));

    bus.register_consumer(
        "slow",
        Box::new(SlowCollector {
            seen: seen.clone(),
            per_batch_delay: Duration::from_millis(10),
        }),
    )
    .unwrap();

    let start = Instant::now();
    for i in 0..1_000u64 {
        bus.produce(vec![i]).unwrap();
    }
    bus.close();
    let elapsed = start.elapsed();

    assert_eq!(seen.lock().unwrap().len(), 1_000);
    // With a capacity-4 ring and a 10ms sink, the producer cannot run
    // meaningfully ahead of the consumer; completion is bounded below
    // by roughly (1000 / capacity) batches worth of sink delay.
    assert!(
        elapsed >= Duration::from_millis(500),
        "producer finished suspiciously fast ({elapsed:?}) for a capacity-{capacity} ring \
         behind a 10ms-per-batch consumer — backpressure may not be applied"
    );
}

// S4: capacity 16, two consumers (A fast, B slow); the producer only
// completes once the slowest consumer (B) has caught up, i.e. total
// wall time is dominated by B.
#[test]
fn s4_producer_gated_by_slowest_consumer() {
    let bus: Dispatcher<u64> = Dispatcher::new(DispatcherConfig::new(16).unwrap()).unwrap();

    let seen_a = Arc::new(Mutex::new(Vec::new()));
    let seen_b = Arc::new(Mutex::new(Vec::new()));

    bus.register_consumer(
        "fast",
        Box::new(SlowCollector {
            seen: seen_a.clone(),
            per_batch_delay: Duration::from_millis(1),
        }),
    )
    .unwrap();
    bus.register_consumer(
        "slow",
        Box::new(SlowCollector {
            seen: seen_b.clone(),
            per_batch_delay: Duration::from_millis(100),
        }),
    )
    .unwrap();

    let start = Instant::now();
    for i in 0..500u64 {
        bus.produce(vec![i]).unwrap();
    }
    bus.close();
    let elapsed = start.elapsed();

    assert_eq!(seen_a.lock().unwrap().len(), 500);
    assert_eq!(seen_b.lock().unwrap().len(), 500);
    // B alone, batching adaptively, needs at minimum a handful of
    // 100ms sink calls; this is a loose lower bound confirming B (not
    // A) set the pace.
    assert!(elapsed >= Duration::from_millis(100));
}

// S5 / P6: capacity 16, one consumer failing on every batch that
// contains a nonzero multiple of 7 out of 0..99 (14 such values: 7,
// 14, ..., 98). The bus drains its whole backlog per wake-up
// (spec.md §4.4), so how many of those 14 values land in the same
// batch — and therefore how many times the error handler actually
// fires — is timing-dependent; this test asserts only what spec.md
// §4.4/§9's documented "skip past the failing batch" policy
// guarantees: every non-failing item still arrives, in order, and the
// handler fires at least once (some batch had to contain a multiple
// of 7) and at most 14 times (there are only 14 of them to trigger
// it).
#[test]
fn s5_failing_batches_are_skipped_and_non_failures_still_arrive_in_order() {
    let error_count = Arc::new(AtomicUsize::new(0));
    let error_count_handler = error_count.clone();

    let bus: Dispatcher<u64> = Dispatcher::with_error_handler(
        DispatcherConfig::new(16).unwrap(),
        Box::new(move |_consumer, _batch, _err| {
            error_count_handler.fetch_add(1, Ordering::SeqCst);
        }),
    )
    .unwrap();

    let seen = Arc::new(Mutex::new(Vec::new()));
    bus.register_consumer("flaky", Box::new(FlakyCollector { seen: seen.clone() }))
        .unwrap();

    for i in 0..100u64 {
        bus.produce(vec![i]).unwrap();
    }
    bus.close();

    let invocations = error_count.load(Ordering::SeqCst);
    assert!(
        (1..=14).contains(&invocations),
        "expected between 1 and 14 error-handler invocations, got {invocations}"
    );

    let expected: Vec<u64> = (0..100).filter(|i| *i == 0 || i % 7 != 0).collect();
    assert_eq!(*seen.lock().unwrap(), expected);
}

// S6: register, produce 10 items, close; close() observed exactly
// once, after the tenth item.
#[test]
fn s6_close_called_once_after_last_item() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let closed = Arc::new(AtomicUsize::new(0));

    let bus: Dispatcher<u64> = Dispatcher::new(DispatcherConfig::new(16).unwrap()).unwrap();
    bus.register_consumer(
        "c",
        Box::new(Collector {
            seen: seen.clone(),
            closed: closed.clone(),
        }),
    )
    .unwrap();

    for i in 0..10u64 {
        bus.produce(vec![i]).unwrap();
    }
    bus.close();

    assert_eq!(*seen.lock().unwrap(), (0..10).collect::<Vec<_>>());
    assert_eq!(closed.load(Ordering::SeqCst), 1);
}

// P6: consumer A's callback raising on a batch does not stop consumer
// B from receiving that batch and every subsequent one, in order.
#[test]
fn p6_failing_consumer_does_not_block_sibling() {
    let bus: Dispatcher<u64> = Dispatcher::new(DispatcherConfig::new(16).unwrap()).unwrap();

    let seen_flaky = Arc::new(Mutex::new(Vec::new()));
    let seen_healthy = Arc::new(Mutex::new(Vec::new()));
    let closed_healthy = Arc::new(AtomicUsize::new(0));

    bus.register_consumer(
        "flaky",
        Box::new(FlakyCollector {
            seen: seen_flaky.clone(),
        }),
    )
    .unwrap();
    bus.register_consumer(
        "healthy",
        Box::new(Collector {
            seen: seen_healthy.clone(),
            closed: closed_healthy.clone(),
        }),
    )
    .unwrap();

    for i in 0..50u64 {
        bus.produce(vec![i]).unwrap();
    }
    bus.close();

    let expected: Vec<u64> = (0..50).collect();
    assert_eq!(*seen_healthy.lock().unwrap(), expected);
    assert_eq!(closed_healthy.load(Ordering::SeqCst), 1);
}

// P2: no overwrite — every sequence delivered is exactly the item
// produced at that sequence, even with a ring small enough that wrap
// happens many times over the run.
#[test]
fn p2_no_overwrite_even_with_many_wraps() {
    let bus: Dispatcher<u64> = Dispatcher::new(DispatcherConfig::new(8).unwrap()).unwrap();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let closed = Arc::new(AtomicUsize::new(0));

    bus.register_consumer(
        "c",
        Box::new(Collector {
            seen: seen.clone(),
            closed: closed.clone(),
        }),
    )
    .unwrap();

    let items: Vec<u64> = (0..5_000).collect();
    for chunk in items.chunks(3) {
        bus.produce(chunk.to_vec()).unwrap();
    }
    bus.close();

    assert_eq!(*seen.lock().unwrap(), items);
}

// Misuse: non-positive / non-power-of-two capacity rejected at
// construction; late registration and produce-after-close rejected.
#[test]
fn misuse_is_rejected_without_disturbing_state() {
    assert!(DispatcherConfig::new(0).is_err());
    assert!(DispatcherConfig::new(5).is_err());

    let bus: Dispatcher<u64> = Dispatcher::new(DispatcherConfig::new(8).unwrap()).unwrap();
    bus.produce(vec![1]).unwrap();

    let err = bus
        .register_consumer("late", Box::new(NoOpConsumer))
        .unwrap_err();
    assert!(matches!(err, BusError::Closed));

    bus.close();
    assert!(matches!(bus.produce(vec![2]), Err(BusError::Closed)));

    // Idempotent.
    bus.close();
}

struct NoOpConsumer;
impl Consumer<u64> for NoOpConsumer {
    fn consume(&mut self, _batch: &[u64]) -> Result<()> {
        Ok(())
    }
}

// Rust-specific: the bus is not limited to POD/Copy payloads.
#[test]
fn broadcasts_non_copy_items() {
    struct StringCollector {
        seen: Arc<Mutex<Vec<String>>>,
    }
    impl Consumer<String> for StringCollector {
        fn consume(&mut self, batch: &[String]) -> Result<()> {
            self.seen.lock().unwrap().extend_from_slice(batch);
            Ok(())
        }
    }

    let bus: Dispatcher<String> = Dispatcher::new(DispatcherConfig::new(8).unwrap()).unwrap();
    let seen = Arc::new(Mutex::new(Vec::new()));
    bus.register_consumer("c", Box::new(StringCollector { seen: seen.clone() }))
        .unwrap();

    bus.produce(vec!["hello".to_string(), "world".to_string()])
        .unwrap();
    bus.close();

    assert_eq!(*seen.lock().unwrap(), vec!["hello".to_string(), "world".to_string()]);
}
