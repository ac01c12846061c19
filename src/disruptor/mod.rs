//! The bounded broadcast bus: ring buffer, cursor set, wait strategy,
//! per-consumer worker, and the dispatcher that owns all of them.
//!
//! Grounded in the teacher's `flux/src/disruptor/mod.rs` module
//! layout (a thin `mod.rs` that wires the submodules together and
//! re-exports the types callers need), generalized from the teacher's
//! SPSC/MPSC/SPMC/MPMC family of ring buffers down to the single
//! broadcast shape this crate specifies.

pub mod consumer;
pub mod cursor;
pub mod dispatcher;
pub mod ring_buffer;
pub mod wait_strategy;
pub mod worker;

pub use consumer::{default_error_handler, Consumer, ErrorHandler};
pub use cursor::{Sequence, INITIAL_SEQUENCE};
pub use dispatcher::Dispatcher;
pub use ring_buffer::RingBuffer;
pub use wait_strategy::{BlockingWaitStrategy, BusySpinWaitStrategy, WaitStrategy};
