//! Fixed-capacity byte rings for the console

use super::{SerialError, SerialResult};

/// What the caller must do with a byte accepted by [`TxRing::submit`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Submit {
    /// The UART was idle: write the byte to the transmit register now
    TransmitNow(u8),
    /// The byte was queued behind the one in flight
    Queued,
}

/// Transmit ring with an in-flight flag
///
/// One byte may be shifting out of the UART while up to `N` more wait here.
/// The byte in flight is not counted in [`TxRing::len`].
#[derive(Clone, Debug)]
pub struct TxRing<const N: usize> {
    buffer: [u8; N],
    start: usize,
    len: usize,
    busy: bool,
}

impl<const N: usize> TxRing<N> {
    /// Create an empty, idle ring
    #[must_use]
    pub const fn new() -> Self {
        Self {
            buffer: [0; N],
            start: 0,
            len: 0,
            busy: false,
        }
    }

    /// Maximum number of queued bytes
    #[must_use]
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Number of queued bytes
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// True if nothing is queued
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// True if no more bytes can be queued
    #[must_use]
    pub const fn is_full(&self) -> bool {
        self.len == N
    }

    /// True while a byte is in flight
    #[must_use]
    pub const fn is_busy(&self) -> bool {
        self.busy
    }

    /// Offer a byte for transmission
    ///
    /// A full ring rejects the byte and is left untouched. Otherwise an
    /// idle ring goes busy and hands the byte straight back, and a busy ring
    /// queues it.
    pub fn submit(&mut self, byte: u8) -> SerialResult<Submit> {
        if self.is_full() {
            return Err(SerialError::NoSpace);
        }

        if self.busy {
            self.buffer[(self.start + self.len) % N] = byte;
            self.len += 1;
            Ok(Submit::Queued)
        } else {
            self.busy = true;
            Ok(Submit::TransmitNow(byte))
        }
    }

    /// The byte in flight has gone out
    ///
    /// Returns the next byte to transmit and stays busy, or goes idle when
    /// the queue is empty.
    pub fn complete(&mut self) -> Option<u8> {
        if self.len == 0 {
            self.busy = false;
            return None;
        }

        let byte = self.buffer[self.start];
        self.start = (self.start + 1) % N;
        self.len -= 1;
        self.busy = true;
        Some(byte)
    }

    /// Queued bytes, oldest first
    pub fn iter(&self) -> impl Iterator<Item = u8> + '_ {
        (0..self.len).map(move |i| self.buffer[(self.start + i) % N])
    }
}

impl<const N: usize> Default for TxRing<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Receive ring
///
/// Bytes arriving while the ring is full are dropped and counted.
#[derive(Clone, Debug)]
pub struct RxRing<const N: usize> {
    buffer: [u8; N],
    start: usize,
    len: usize,
    overruns: u32,
}

impl<const N: usize> RxRing<N> {
    /// Create an empty ring
    #[must_use]
    pub const fn new() -> Self {
        Self {
            buffer: [0; N],
            start: 0,
            len: 0,
            overruns: 0,
        }
    }

    /// Maximum number of stored bytes
    #[must_use]
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Number of stored bytes
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// True if nothing is stored
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// True if the next byte would be dropped
    #[must_use]
    pub const fn is_full(&self) -> bool {
        self.len == N
    }

    /// Bytes dropped because the ring was full
    #[must_use]
    pub const fn overruns(&self) -> u32 {
        self.overruns
    }

    /// Store a byte, returns false if it was dropped
    pub fn push(&mut self, byte: u8) -> bool {
        if self.is_full() {
            self.overruns = self.overruns.saturating_add(1);
            return false;
        }

        self.buffer[(self.start + self.len) % N] = byte;
        self.len += 1;
        true
    }

    /// Take the oldest byte
    pub fn pop(&mut self) -> Option<u8> {
        if self.len == 0 {
            return None;
        }

        let byte = self.buffer[self.start];
        self.start = (self.start + 1) % N;
        self.len -= 1;
        Some(byte)
    }

    /// Take the newest byte
    pub fn pop_back(&mut self) -> Option<u8> {
        if self.len == 0 {
            return None;
        }

        self.len -= 1;
        Some(self.buffer[(self.start + self.len) % N])
    }

    /// Drop everything stored
    pub fn clear(&mut self) {
        self.start = 0;
        self.len = 0;
    }
}

impl<const N: usize> Default for RxRing<N> {
    fn default() -> Self {
        Self::new()
    }
}
