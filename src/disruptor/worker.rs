//! The per-consumer thread loop: wait for new publications, deliver
//! them as a batch, advance that consumer's cursor (spec §4.4).
//!
//! Generalizes the teacher's `RingConsumer::process_events` (single
//! consumer, single cursor, caller-driven polling) into an
//! independently running thread per registered consumer, each reading
//! the same shared ring at its own pace. Batch size is naturally
//! adaptive — a wake-up drains everything published so far, with no
//! artificial cap beyond the ring's capacity (spec §4.4 point 3). A
//! failing `consume` call is routed to the error handler and the
//! cursor still advances past the failing batch — the bus has no
//! retry of its own (spec §9).

use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::thread::JoinHandle;

use crate::disruptor::consumer::{Consumer, ErrorHandler};
use crate::disruptor::cursor::{CursorSet, Sequence, INITIAL_SEQUENCE};
use crate::disruptor::ring_buffer::RingBuffer;
use crate::disruptor::wait_strategy::WaitStrategy;

/// Spawn the dedicated thread for one registered consumer.
///
/// `index` is this consumer's slot in `cursors`, as returned by
/// `CursorSet::add_consumer`. The thread runs until the wait strategy
/// reports the bus has shut down (`running` cleared and no further
/// published sequence to catch up to), at which point it calls
/// `consumer.close()` once and exits.
pub fn spawn<T>(
    name: String,
    index: usize,
    ring: Arc<RingBuffer<T>>,
    cursors: Arc<CursorSet>,
    wait_strategy: Arc<dyn WaitStrategy>,
    running: Arc<AtomicBool>,
    error_handler: Arc<ErrorHandler<T>>,
    mut consumer: Box<dyn Consumer<T>>,
) -> JoinHandle<()>
where
    T: Clone + Send + Sync + 'static,
{
    std::thread::Builder::new()
        .name(name.clone())
        .spawn(move || {
            let mut cursor: Sequence = INITIAL_SEQUENCE;
            loop {
                let desired = cursor + 1;
                let available =
                    match wait_strategy.wait_for(desired, &running, &|| cursors.producer_cursor())
                    {
                        Ok(seq) => seq,
                        Err(_) => break,
                    };

                // SAFETY: every sequence up to `available` has already
                // been observed published via `wait_for`'s acquire
                // load of the producer cursor.
                let batch: Vec<T> = (cursor + 1..=available)
                    .map(|seq| unsafe { ring.read(seq) })
                    .collect();

                if let Err(err) = consumer.consume(&batch) {
                    error_handler(&name, &batch, &err);
                }

                cursor = available;
                cursors.consumer_advance(index, cursor);
            }
            consumer.close();
        })
        .expect("failed to spawn consumer worker thread")
}
