//! Dispatcher configuration.

use crate::error::{BusError, Result};

/// Wait strategy selection for a [`crate::disruptor::Dispatcher`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitStrategyKind {
    /// Spin continuously. Lowest latency, pins a core.
    BusySpin,
    /// Spin briefly, then park on a condition variable.
    Blocking,
}

/// Configuration accepted when constructing a [`crate::disruptor::Dispatcher`].
///
/// Mirrors the teacher library's `RingBufferConfig` builder: validated
/// `with_*` setters over a `Default` base, rather than a derive-heavy
/// builder crate.
#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    /// Human-readable label, used only in diagnostics (log fields).
    pub name: String,
    /// Capacity of the ring buffer. Must be a power of two.
    pub size: usize,
    /// Wait strategy used by producers waiting on backpressure and by
    /// consumers waiting for new publications.
    pub wait_strategy: WaitStrategyKind,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            name: "dispatcher".to_string(),
            size: crate::constants::DEFAULT_RING_BUFFER_SIZE,
            wait_strategy: WaitStrategyKind::Blocking,
        }
    }
}

impl DispatcherConfig {
    /// Start from the default config with the given ring capacity.
    pub fn new(size: usize) -> Result<Self> {
        Self::default().with_size(size)
    }

    /// Set the human-readable name used in diagnostics.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set the ring buffer capacity. Must be a power of two and at
    /// most [`crate::constants::MAX_RING_BUFFER_SIZE`].
    pub fn with_size(mut self, size: usize) -> Result<Self> {
        if size == 0 {
            return Err(BusError::config("ring buffer size must be greater than 0"));
        }
        if !size.is_power_of_two() {
            return Err(BusError::config("ring buffer size must be a power of 2"));
        }
        if size > crate::constants::MAX_RING_BUFFER_SIZE {
            return Err(BusError::config("ring buffer size exceeds MAX_RING_BUFFER_SIZE"));
        }
        self.size = size;
        Ok(self)
    }

    /// Select the wait strategy.
    pub fn with_wait_strategy(mut self, strategy: WaitStrategyKind) -> Self {
        self.wait_strategy = strategy;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_zero_and_non_power_of_two() {
        assert!(DispatcherConfig::new(0).is_err());
        assert!(DispatcherConfig::new(3).is_err());
        assert!(DispatcherConfig::new(1024).is_ok());
    }

    #[test]
    fn builder_chains() {
        let cfg = DispatcherConfig::new(64)
            .unwrap()
            .with_name("orders")
            .with_wait_strategy(WaitStrategyKind::BusySpin);
        assert_eq!(cfg.size, 64);
        assert_eq!(cfg.name, "orders");
        assert_eq!(cfg.wait_strategy, WaitStrategyKind::BusySpin);
    }
}
