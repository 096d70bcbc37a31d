//! Receive ring buffer shared by every bus instance of a registry.
//!
//! Single producer (the edge interrupt writes at `tail`), single consumer
//! (the foreground reads at `head`). Each side only ever stores its own
//! index, and stores it after the data access it publishes.

use core::cell::UnsafeCell;

use portable_atomic::{AtomicUsize, Ordering};

use crate::error::RxError;

/// Default buffer size: address + 75 value characters + CRC + CR + LF.
pub const DEFAULT_BUFFER_SIZE: usize = sdi12_proto::MAX_RESPONSE_LEN;

/// Fixed-capacity circular byte buffer.
///
/// Holds at most `N - 1` bytes; one slot stays free to tell full from empty.
pub struct RxBuffer<const N: usize> {
    data: UnsafeCell<[u8; N]>,
    head: AtomicUsize,
    tail: AtomicUsize,
}

// SAFETY: `push` only writes the slot at `tail` before publishing it, and the
// reader only touches slots in `head..tail`, so the two sides never access
// the same byte concurrently. Callers uphold one producer and one consumer.
unsafe impl<const N: usize> Sync for RxBuffer<N> {}

impl<const N: usize> RxBuffer<N> {
    /// Create an empty buffer.
    ///
    /// # Panics
    ///
    /// If `N < 2`. In a `static` this is a compile error.
    pub const fn new() -> Self {
        assert!(N >= 2, "receive buffer needs at least two slots");
        Self {
            data: UnsafeCell::new([0; N]),
            head: AtomicUsize::new(0),
            tail: AtomicUsize::new(0),
        }
    }

    /// Number of bytes the buffer can hold.
    #[inline]
    #[must_use]
    pub const fn capacity(&self) -> usize {
        N - 1
    }

    /// Number of unread bytes.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        let tail = self.tail.load(Ordering::Acquire);
        let head = self.head.load(Ordering::Acquire);
        (tail + N - head) % N
    }

    /// Whether there is nothing to read.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Append a byte. Producer side.
    ///
    /// A byte that would make `tail` catch up with `head` is dropped; unread
    /// data is never overwritten.
    pub fn push(&self, byte: u8) -> Result<(), RxError> {
        let tail = self.tail.load(Ordering::Relaxed);
        let next = (tail + 1) % N;
        if next == self.head.load(Ordering::Acquire) {
            return Err(RxError::BufferOverflow);
        }
        // SAFETY: `tail < N`, and the slot is outside `head..tail`.
        unsafe { self.data.get().cast::<u8>().add(tail).write_volatile(byte) };
        self.tail.store(next, Ordering::Release);
        Ok(())
    }

    /// Next byte without consuming it. Consumer side.
    #[must_use]
    pub fn peek(&self) -> Option<u8> {
        let head = self.head.load(Ordering::Relaxed);
        if head == self.tail.load(Ordering::Acquire) {
            return None;
        }
        // SAFETY: `head < N`, and the slot was published by `push`.
        Some(unsafe { self.data.get().cast::<u8>().add(head).read_volatile() })
    }

    /// Take the next byte. Consumer side.
    pub fn pop(&self) -> Option<u8> {
        let byte = self.peek()?;
        let head = self.head.load(Ordering::Relaxed);
        self.head.store((head + 1) % N, Ordering::Release);
        Some(byte)
    }

    /// Discard everything received so far. Consumer side.
    pub fn clear(&self) {
        let tail = self.tail.load(Ordering::Acquire);
        self.head.store(tail, Ordering::Release);
    }
}

impl<const N: usize> Default for RxBuffer<N> {
    fn default() -> Self {
        Self::new()
    }
}
