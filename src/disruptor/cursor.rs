//! The producer cursor plus one cursor per registered consumer — the
//! entire synchronization contract of the bus (spec §4.2).
//!
//! Grounded on the teacher's `disruptor/common.rs`
//! (`PaddedProducerSequence`/`PaddedConsumerSequence`: cache-line
//! aligned `AtomicU64` cells to prevent false sharing between
//! independently-advancing cursors) and `disruptor/ring_buffer_core.rs`
//! (`MpscClaim`'s `compare_exchange_weak` retry loop for racing
//! producers). This module generalizes the single consumer cursor the
//! teacher carries to a `Vec` of per-consumer cursors, and adds the
//! sequential-publish wait so that concurrent producers never expose
//! a gap below the shared producer cursor.

use std::sync::atomic::{AtomicI64, Ordering};

use crate::constants::CACHE_LINE_SIZE;

/// Sequence number naming a logical publication slot. Starts at `-1`
/// (nothing published / nothing processed yet).
pub type Sequence = i64;

/// `-1`, the initial value of every cursor in the set.
pub const INITIAL_SEQUENCE: Sequence = -1;

#[repr(align(64))]
struct PaddedCursor {
    value: AtomicI64,
    _pad: [u8; CACHE_LINE_SIZE - std::mem::size_of::<AtomicI64>()],
}

impl PaddedCursor {
    fn new(initial: Sequence) -> Self {
        Self {
            value: AtomicI64::new(initial),
            _pad: [0; CACHE_LINE_SIZE - std::mem::size_of::<AtomicI64>()],
        }
    }
}

/// Producer cursor, the per-claim high-water mark, and one cursor per
/// registered consumer.
pub struct CursorSet {
    capacity: i64,
    /// Highest sequence claimed by any producer (may run ahead of
    /// `published` while a claimed range is still being written).
    claimed: PaddedCursor,
    /// Highest sequence made visible to consumers.
    published: PaddedCursor,
    /// One padded cursor per registered consumer. Registration only
    /// happens before the first publication (spec §3 invariant 5), so
    /// the `RwLock` is write-locked only during that setup window;
    /// every hot-path access (`consumer_cursor`/`gating`/
    /// `consumer_advance`) takes an uncontended read lock.
    consumers: parking_lot::RwLock<Vec<PaddedCursor>>,
}

impl CursorSet {
    /// Build a cursor set for a ring of the given capacity with no
    /// consumers registered yet.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity as i64,
            claimed: PaddedCursor::new(INITIAL_SEQUENCE),
            published: PaddedCursor::new(INITIAL_SEQUENCE),
            consumers: parking_lot::RwLock::new(Vec::new()),
        }
    }

    /// Register a new consumer cursor, initialized to `-1`. Returns
    /// its index, used by `consumer_advance`/`consumer_cursor`.
    pub fn add_consumer(&self) -> usize {
        let mut consumers = self.consumers.write();
        consumers.push(PaddedCursor::new(INITIAL_SEQUENCE));
        consumers.len() - 1
    }

    /// Number of registered consumers.
    pub fn num_consumers(&self) -> usize {
        self.consumers.read().len()
    }

    /// Highest sequence published so far (acquire load: a reader that
    /// observes this value is guaranteed to see every slot write made
    /// at or below it).
    #[inline(always)]
    pub fn producer_cursor(&self) -> Sequence {
        self.published.value.load(Ordering::Acquire)
    }

    /// This consumer's highest processed sequence (acquire load).
    #[inline(always)]
    pub fn consumer_cursor(&self, consumer: usize) -> Sequence {
        self.consumers.read()[consumer].value.load(Ordering::Acquire)
    }

    /// `min` over every registered consumer cursor — the sequence a
    /// producer may not overtake by more than `capacity`. `i64::MAX`
    /// if no consumers are registered (nothing gates the producer).
    pub fn gating(&self) -> Sequence {
        self.consumers
            .read()
            .iter()
            .map(|c| c.value.load(Ordering::Acquire))
            .min()
            .unwrap_or(Sequence::MAX)
    }

    /// Attempt to atomically reserve `n` contiguous sequences.
    ///
    /// Returns `Some((lo, hi))` (inclusive) if doing so would not run
    /// the producer more than `capacity` ahead of the slowest
    /// consumer; `None` if the caller should back off and retry
    /// (spec §4.3: the barrier, not this method, decides how to wait).
    pub fn try_claim(&self, n: usize) -> Option<(Sequence, Sequence)> {
        let n = n as i64;
        loop {
            let current = self.claimed.value.load(Ordering::Relaxed);
            let lo = current + 1;
            let hi = current + n;

            if hi - self.capacity >= self.gating() {
                return None;
            }

            match self.claimed.value.compare_exchange_weak(
                current,
                hi,
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => return Some((lo, hi)),
                Err(_) => std::hint::spin_loop(),
            }
        }
    }

    /// Make the claimed range `[lo, hi]` visible to consumers.
    ///
    /// If another producer's claim of a lower range hasn't published
    /// yet, this spins until it has, so the producer cursor never
    /// exposes a gap (spec §4.2).
    pub fn publish(&self, lo: Sequence, hi: Sequence) {
        while self.published.value.load(Ordering::Acquire) != lo - 1 {
            std::hint::spin_loop();
        }
        // Release: every slot write in [lo, hi] happens-before this store.
        self.published.value.store(hi, Ordering::Release);
    }

    /// Record that a consumer has finished processing through `k`.
    #[inline(always)]
    pub fn consumer_advance(&self, consumer: usize, k: Sequence) {
        self.consumers.read()[consumer].value.store(k, Ordering::Release);
    }
}
