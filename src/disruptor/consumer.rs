//! The consumer-facing API: what a registered handler implements, and
//! how the bus reports failures back to it (spec §6).

use crate::error::BusError;

/// A registered handler for one broadcast stream.
///
/// Every `Dispatcher` consumer implements this; `consume` is invoked
/// with each batch the worker loop drains from the ring, in
/// publication order. Consumers run one per dedicated worker thread
/// (see `disruptor::worker`), so `consume` may block freely without
/// stalling other consumers or the producer.
pub trait Consumer<T>: Send {
    /// Process a batch of items, in the order they were published.
    ///
    /// An `Err` return does not stop the worker: the batch is
    /// reported to the bus's error handler and the worker advances
    /// past it, so one failing consumer never blocks the others or
    /// the producer (spec §9, open question 1).
    fn consume(&mut self, batch: &[T]) -> Result<(), BusError>;

    /// Called once when the dispatcher is closing, after the last
    /// batch this consumer will ever see has been delivered.
    fn close(&mut self) {}
}

/// Invoked whenever a consumer's `consume` returns `Err`.
///
/// Arguments are the consumer's name, the batch that failed, and the
/// error it returned. The default handler (installed when none is
/// configured) logs at `error` level via `tracing` and otherwise
/// ignores the failure — matching the bus having no built-in
/// retry/DLQ policy of its own (spec §9).
pub type ErrorHandler<T> = dyn Fn(&str, &[T], &BusError) + Send + Sync;

/// The error handler installed when a dispatcher is built without one.
pub fn default_error_handler<T>() -> Box<ErrorHandler<T>> {
    Box::new(|consumer_name, batch, err| {
        tracing::error!(
            consumer = consumer_name,
            batch_len = batch.len(),
            error = %err,
            "consumer failed on batch; skipping"
        );
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct Counting(Arc<AtomicUsize>);

    impl Consumer<u64> for Counting {
        fn consume(&mut self, batch: &[u64]) -> Result<(), BusError> {
            self.0.fetch_add(batch.len(), Ordering::Relaxed);
            Ok(())
        }
    }

    #[test]
    fn consume_runs_and_default_close_is_a_no_op() {
        let count = Arc::new(AtomicUsize::new(0));
        let mut consumer = Counting(count.clone());
        consumer.consume(&[1, 2, 3]).unwrap();
        consumer.close();
        assert_eq!(count.load(Ordering::Relaxed), 3);
    }

    #[test]
    fn default_error_handler_does_not_panic() {
        let handler = default_error_handler::<u64>();
        handler("orders", &[1, 2], &BusError::unexpected("boom"));
    }
}
