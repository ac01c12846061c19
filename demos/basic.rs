//! Two broadcast consumers over 10,000 published integers, timed.
//!
//! Grounded on `original_source/main.py`: `MyConsumer` sleeps a random
//! fraction of a second per batch and prints what it saw; `main` is
//! wrapped in a timing decorator and produces integers `0..10_000` one
//! at a time before closing the bus.

#[path = "support/mod.rs"]
mod support;

use rand::Rng;
use std::time::Duration;

use ringcast::{Consumer, Dispatcher, DispatcherConfig, Result};

struct PrintingConsumer {
    name: &'static str,
}

impl Consumer<u64> for PrintingConsumer {
    fn consume(&mut self, batch: &[u64]) -> Result<()> {
        let delay = rand::thread_rng().gen_range(0.0..0.1);
        std::thread::sleep(Duration::from_secs_f64(delay));
        tracing::info!(consumer = self.name, ?batch, "consumed");
        Ok(())
    }
}

fn main() -> Result<()> {
    support::logging::init();

    support::timing::measure("demo_basic::main", || -> Result<()> {
        let bus: Dispatcher<u64> =
            Dispatcher::new(DispatcherConfig::new(1024 * 8)?.with_name("Example"))?;

        bus.register_consumer("Consumer One", Box::new(PrintingConsumer { name: "Consumer One" }))?;
        bus.register_consumer("Consumer Two", Box::new(PrintingConsumer { name: "Consumer Two" }))?;

        for i in 0..10_000u64 {
            tracing::debug!(i, "producing");
            bus.produce(vec![i])?;
        }

        std::thread::sleep(Duration::from_secs(2));
        bus.close();
        Ok(())
    })
}
