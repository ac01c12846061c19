//! Crate-wide constants.

/// Default ring buffer capacity (must be a power of two).
pub const DEFAULT_RING_BUFFER_SIZE: usize = 1024;

/// Largest capacity this crate will allocate without explicit opt-in.
pub const MAX_RING_BUFFER_SIZE: usize = 1 << 24;

/// Cache line size used to pad cursors against false sharing.
pub const CACHE_LINE_SIZE: usize = 64;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_powers_of_two() {
        assert!(DEFAULT_RING_BUFFER_SIZE.is_power_of_two());
        assert!(MAX_RING_BUFFER_SIZE.is_power_of_two());
    }
}
