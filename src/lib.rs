//! ringcast — a bounded, multi-consumer broadcast message bus built on
//! the LMAX Disruptor pattern.
//!
//! A preallocated ring buffer is shared by one or more producers and
//! every registered consumer; each publication is delivered, in
//! order, to *all* consumers (fan-out), and a slow consumer applies
//! backpressure to producers rather than letting the ring overrun.
//!
//! ```no_run
//! use ringcast::{Consumer, Dispatcher, DispatcherConfig, Result};
//!
//! struct Printer(&'static str);
//!
//! impl Consumer<u64> for Printer {
//!     fn consume(&mut self, batch: &[u64]) -> Result<()> {
//!         println!("{} saw {:?}", self.0, batch);
//!         Ok(())
//!     }
//! }
//!
//! fn main() -> Result<()> {
//!     let bus: Dispatcher<u64> = Dispatcher::new(DispatcherConfig::new(1024)?)?;
//!     bus.register_consumer("printer", Box::new(Printer("printer")))?;
//!     bus.produce((0..100).collect())?;
//!     bus.close();
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod constants;
pub mod disruptor;
pub mod error;

pub use config::{DispatcherConfig, WaitStrategyKind};
pub use disruptor::{default_error_handler, Consumer, Dispatcher, ErrorHandler};
pub use error::{BusError, Result};

/// Crate version, exposed for diagnostics the way the teacher exposes
/// `flux::VERSION`.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
