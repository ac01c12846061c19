//! Fixed-capacity slot storage addressed by `sequence & mask`.
//!
//! Grounded on the teacher's `disruptor/spsc/ring_buffer.rs`: heap
//! allocation, masked indexing, `unsafe impl Send/Sync`. Diverges from
//! the teacher by storing `Option<T>` behind `UnsafeCell` instead of
//! raw volatile writes of a `RingBufferEntry: Default` slot type,
//! since broadcast items are arbitrary `Clone` payloads rather than
//! fixed-size POD market-data slots.

use std::cell::UnsafeCell;

use crate::disruptor::Sequence;
use crate::error::{BusError, Result};

struct Cell<T>(UnsafeCell<Option<T>>);

// SAFETY: access to a `Cell` is only ever performed by the holder of a
// claimed-but-not-yet-published sequence (writer) or by a consumer
// whose cursor has not yet passed that sequence (reader), and the
// cursor set's release/acquire fences establish happens-before edges
// between the two. See `disruptor::cursor`.
unsafe impl<T: Send> Send for Cell<T> {}
unsafe impl<T: Send> Sync for Cell<T> {}

/// Preallocated circular buffer of opaque items.
///
/// The buffer performs no synchronization of its own — ordering and
/// visibility are entirely the responsibility of the cursor set
/// (`disruptor::cursor::CursorSet`) that gates `write`/`read` calls.
pub struct RingBuffer<T> {
    slots: Box<[Cell<T>]>,
    mask: usize,
}

impl<T: Clone> RingBuffer<T> {
    /// Allocate a ring buffer with the given capacity.
    ///
    /// `capacity` must be a power of two, matching the teacher's
    /// `RingBufferConfig::new` policy so that `sequence mod capacity`
    /// reduces to a mask.
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(BusError::config("ring buffer capacity must be greater than 0"));
        }
        if !capacity.is_power_of_two() {
            return Err(BusError::config("ring buffer capacity must be a power of 2"));
        }

        let slots = (0..capacity)
            .map(|_| Cell(UnsafeCell::new(None)))
            .collect::<Vec<_>>()
            .into_boxed_slice();

        Ok(Self {
            slots,
            mask: capacity - 1,
        })
    }

    /// Ring capacity.
    #[inline(always)]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    #[inline(always)]
    fn index(&self, sequence: Sequence) -> usize {
        (sequence as u64 as usize) & self.mask
    }

    /// Store `item` at the slot for `sequence`.
    ///
    /// # Safety
    /// The caller must have claimed `sequence` (via
    /// `CursorSet::claim`) and must not call this again for the same
    /// sequence until the slot has been read by every consumer that
    /// will ever observe it. Ordering with readers is provided by the
    /// cursor set's publish/claim fences, not by this method.
    #[inline(always)]
    pub unsafe fn write(&self, sequence: Sequence, item: T) {
        let idx = self.index(sequence);
        *self.slots[idx].0.get() = Some(item);
    }

    /// Read (by clone) the item stored at `sequence`.
    ///
    /// # Safety
    /// The caller must only call this for a `sequence` that has
    /// already been published (producer cursor >= sequence) and must
    /// have synchronized with that publication (acquire fence/load),
    /// so that the write above is visible.
    #[inline(always)]
    pub unsafe fn read(&self, sequence: Sequence) -> T {
        let idx = self.index(sequence);
        (*self.slots[idx].0.get())
            .clone()
            .expect("read of unpublished slot — caller violated the claim/publish contract")
    }
}
