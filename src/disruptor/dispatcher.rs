//! Lifecycle owner: the ring buffer, the cursor set, one worker thread
//! per registered consumer, and the error handler (spec §4.5).
//!
//! Grounded in the teacher's `RingBufferConfig`/builder pattern
//! (`disruptor/mod.rs`) for [`crate::config::DispatcherConfig`], and in
//! `original_source/main.py`/`fault_tolerant_example.py` for the
//! `register_consumer`/`produce`/`close` call shape and the
//! `consumer_error_handler` constructor argument.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use parking_lot::Mutex;

use crate::config::{DispatcherConfig, WaitStrategyKind};
use crate::disruptor::consumer::{default_error_handler, Consumer, ErrorHandler};
use crate::disruptor::cursor::CursorSet;
use crate::disruptor::ring_buffer::RingBuffer;
use crate::disruptor::wait_strategy::{BlockingWaitStrategy, BusySpinWaitStrategy, WaitStrategy};
use crate::disruptor::worker;
use crate::error::{BusError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    New,
    Running,
    Draining,
    Closed,
}

/// A bounded, multi-consumer broadcast bus.
///
/// `register_consumer` must be called before the first `produce`
/// (spec §3 invariant 5); after that the dispatcher moves `NEW ->
/// RUNNING -> DRAINING -> CLOSED` as described in spec §4.5.
pub struct Dispatcher<T> {
    name: String,
    ring: Arc<RingBuffer<T>>,
    cursors: Arc<CursorSet>,
    wait_strategy: Arc<dyn WaitStrategy>,
    running: Arc<AtomicBool>,
    error_handler: Arc<ErrorHandler<T>>,
    state: Mutex<State>,
    /// Producers currently between their state check and their
    /// publish, so `close` can wait for them to finish before it reads
    /// a final producer cursor to drain consumers to. Incremented
    /// under the same `state` lock critical section as the state
    /// check in `produce`, so a `close` that observes `Draining`/
    /// `Closed` also observes every increment made before that
    /// transition (spec §7 error kind 4: shutdown race).
    inflight_producers: AtomicUsize,
    workers: Mutex<Vec<JoinHandle<()>>>,
}

/// Decrements `inflight_producers` on every exit path out of
/// `produce`'s claim/publish section, including the early returns on a
/// closed-while-waiting backpressure wait.
struct InflightGuard<'a>(&'a AtomicUsize);

impl Drop for InflightGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::AcqRel);
    }
}

impl<T> Dispatcher<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Build a dispatcher from `config`, with the default error
    /// handler (log and skip — spec §7/§9).
    pub fn new(config: DispatcherConfig) -> Result<Self> {
        Self::with_error_handler(config, default_error_handler())
    }

    /// Build a dispatcher with an explicit consumer error handler.
    pub fn with_error_handler(
        config: DispatcherConfig,
        error_handler: Box<ErrorHandler<T>>,
    ) -> Result<Self> {
        let wait_strategy: Arc<dyn WaitStrategy> = match config.wait_strategy {
            WaitStrategyKind::BusySpin => Arc::new(BusySpinWaitStrategy::new()),
            WaitStrategyKind::Blocking => Arc::new(BlockingWaitStrategy::new()),
        };

        Ok(Self {
            name: config.name,
            ring: Arc::new(RingBuffer::new(config.size)?),
            cursors: Arc::new(CursorSet::new(config.size)),
            wait_strategy,
            running: Arc::new(AtomicBool::new(true)),
            error_handler: Arc::from(error_handler),
            state: Mutex::new(State::New),
            inflight_producers: AtomicUsize::new(0),
            workers: Mutex::new(Vec::new()),
        })
    }

    /// Attach a consumer and spawn its dedicated worker thread.
    ///
    /// Fails with [`BusError::Closed`] once the first publication has
    /// occurred (spec §4.5, §3 invariant 5).
    pub fn register_consumer(
        &self,
        consumer_name: impl Into<String>,
        consumer: Box<dyn Consumer<T>>,
    ) -> Result<()> {
        let state = self.state.lock();
        if *state != State::New {
            return Err(BusError::Closed);
        }
        drop(state);

        let consumer_name = consumer_name.into();
        let index = self.cursors.add_consumer();
        tracing::info!(bus = %self.name, consumer = %consumer_name, "consumer registered");

        let handle = worker::spawn(
            consumer_name,
            index,
            self.ring.clone(),
            self.cursors.clone(),
            self.wait_strategy.clone(),
            self.running.clone(),
            self.error_handler.clone(),
            consumer,
        );
        self.workers.lock().push(handle);
        Ok(())
    }

    /// Publish an ordered, non-empty batch of items, blocking while
    /// the ring is full (spec §4.5).
    ///
    /// Fails with [`BusError::Closed`] once `close` has begun.
    pub fn produce(&self, items: Vec<T>) -> Result<()> {
        if items.is_empty() {
            return Ok(());
        }

        {
            let mut state = self.state.lock();
            match *state {
                State::New => *state = State::Running,
                State::Running => {}
                State::Draining | State::Closed => return Err(BusError::Closed),
            }
            // Incremented inside the same critical section as the
            // state check: a `close` that later takes the lock and
            // observes `Draining` is guaranteed to observe this
            // increment too, so it never snapshots a producer cursor
            // while this claim/publish is still in flight.
            self.inflight_producers.fetch_add(1, Ordering::AcqRel);
        }
        let _inflight = InflightGuard(&self.inflight_producers);

        let n = items.len();
        let (lo, hi) = loop {
            if let Some(range) = self.cursors.try_claim(n) {
                break range;
            }
            // Blocked by the gating sequence: wait for the slowest
            // consumer to advance at least once, then retry the claim
            // (spec §4.3 liveness — no false wake-ups required, only
            // eventual retry).
            let gating_before = self.cursors.gating();
            self.wait_strategy
                .wait_for(gating_before + 1, &self.running, &|| self.cursors.gating())
                .map_err(|_| BusError::Closed)?;
        };

        for (offset, item) in items.into_iter().enumerate() {
            let seq = lo + offset as i64;
            // SAFETY: `seq` was just exclusively claimed above and has
            // not yet been published, so no consumer can read it.
            unsafe { self.ring.write(seq, item) };
        }

        self.cursors.publish(lo, hi);
        self.wait_strategy.signal_all_when_blocking();
        tracing::debug!(bus = %self.name, lo, hi, "published batch");
        Ok(())
    }

    /// Signal shutdown: stop accepting publications, wait for every
    /// consumer to drain to the current producer cursor, invoke each
    /// consumer's `close()` exactly once, then release worker threads.
    /// Idempotent.
    pub fn close(&self) {
        {
            let mut state = self.state.lock();
            match *state {
                State::Closed => return,
                _ => *state = State::Draining,
            }
        }

        // Wait for every producer that passed the state check before
        // this `close` took the lock above to finish its claim and
        // publish, so the snapshot below reflects every publication
        // that was ever going to happen (spec §7 error kind 4).
        while self.inflight_producers.load(Ordering::Acquire) != 0 {
            std::thread::yield_now();
        }

        let target = self.cursors.producer_cursor();
        while (0..self.cursors.num_consumers()).any(|i| self.cursors.consumer_cursor(i) < target) {
            std::thread::yield_now();
        }

        self.running.store(false, Ordering::Release);
        self.wait_strategy.signal_all_when_blocking();

        let mut workers = self.workers.lock();
        for handle in workers.drain(..) {
            let _ = handle.join();
        }

        *self.state.lock() = State::Closed;
        tracing::info!(bus = %self.name, "dispatcher closed");
    }
}

impl<T> Drop for Dispatcher<T> {
    fn drop(&mut self) {
        self.running.store(false, Ordering::Release);
        self.wait_strategy.signal_all_when_blocking();
        for handle in self.workers.lock().drain(..) {
            let _ = handle.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DispatcherConfig;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Mutex as StdMutex;

    struct Collecting {
        seen: Arc<StdMutex<Vec<u64>>>,
        closed: Arc<AtomicUsize>,
    }

    impl Consumer<u64> for Collecting {
        fn consume(&mut self, batch: &[u64]) -> Result<()> {
            self.seen.lock().unwrap().extend_from_slice(batch);
            Ok(())
        }

        fn close(&mut self) {
            self.closed.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn broadcasts_to_every_consumer_in_order_and_closes_once() {
        let dispatcher: Dispatcher<u64> =
            Dispatcher::new(DispatcherConfig::new(8).unwrap()).unwrap();

        let seen_a = Arc::new(StdMutex::new(Vec::new()));
        let closed_a = Arc::new(AtomicUsize::new(0));
        let seen_b = Arc::new(StdMutex::new(Vec::new()));
        let closed_b = Arc::new(AtomicUsize::new(0));

        dispatcher
            .register_consumer(
                "a",
                Box::new(Collecting {
                    seen: seen_a.clone(),
                    closed: closed_a.clone(),
                }),
            )
            .unwrap();
        dispatcher
            .register_consumer(
                "b",
                Box::new(Collecting {
                    seen: seen_b.clone(),
                    closed: closed_b.clone(),
                }),
            )
            .unwrap();

        let items: Vec<u64> = (0..100).collect();
        dispatcher.produce(items.clone()).unwrap();
        dispatcher.close();

        assert_eq!(*seen_a.lock().unwrap(), items);
        assert_eq!(*seen_b.lock().unwrap(), items);
        assert_eq!(closed_a.load(Ordering::SeqCst), 1);
        assert_eq!(closed_b.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn register_after_first_publication_fails() {
        let dispatcher: Dispatcher<u64> =
            Dispatcher::new(DispatcherConfig::new(8).unwrap()).unwrap();
        dispatcher.produce(vec![1]).unwrap();
        let err = dispatcher
            .register_consumer("late", Box::new(NoOp))
            .unwrap_err();
        assert!(matches!(err, BusError::Closed));
        dispatcher.close();
    }

    #[test]
    fn produce_after_close_fails() {
        let dispatcher: Dispatcher<u64> =
            Dispatcher::new(DispatcherConfig::new(8).unwrap()).unwrap();
        dispatcher.register_consumer("a", Box::new(NoOp)).unwrap();
        dispatcher.close();
        assert!(matches!(dispatcher.produce(vec![1]), Err(BusError::Closed)));
    }

    #[test]
    fn close_is_idempotent() {
        let dispatcher: Dispatcher<u64> =
            Dispatcher::new(DispatcherConfig::new(8).unwrap()).unwrap();
        dispatcher.register_consumer("a", Box::new(NoOp)).unwrap();
        dispatcher.close();
        dispatcher.close();
    }

    struct NoOp;
    impl Consumer<u64> for NoOp {
        fn consume(&mut self, _batch: &[u64]) -> Result<()> {
            Ok(())
        }
    }
}
