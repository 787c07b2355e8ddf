//! Bounded register write queue.
//!
//! Commands and ticks enqueue writes; the render loop drains the whole queue
//! into the chip core before producing each output sample.

use std::collections::VecDeque;

/// Maximum number of writes pending between two renders.
pub const WRITE_QUEUE_CAPACITY: usize = 2048;

/// One register write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RegWrite {
    /// Register address.
    pub addr: u16,
    /// Register value.
    pub value: u8,
}

impl RegWrite {
    /// Create a write.
    pub fn new(addr: u16, value: u8) -> Self {
        Self { addr, value }
    }
}

/// FIFO of pending writes with a fixed capacity.
#[derive(Debug, Clone)]
pub struct WriteQueue {
    writes: VecDeque<RegWrite>,
}

impl Default for WriteQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl WriteQueue {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self {
            writes: VecDeque::with_capacity(WRITE_QUEUE_CAPACITY),
        }
    }

    /// Append a write.
    ///
    /// # Panics
    ///
    /// Panics when the queue already holds [`WRITE_QUEUE_CAPACITY`] writes,
    /// which means ticks are being issued without rendering in between.
    pub fn push(&mut self, write: RegWrite) {
        assert!(
            self.writes.len() < WRITE_QUEUE_CAPACITY,
            "register write queue overflow ({WRITE_QUEUE_CAPACITY} pending writes); render between ticks"
        );
        self.writes.push_back(write);
    }

    /// Remove the oldest write.
    pub fn pop(&mut self) -> Option<RegWrite> {
        self.writes.pop_front()
    }

    /// Iterate pending writes, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &RegWrite> {
        self.writes.iter()
    }

    /// Number of pending writes.
    pub fn len(&self) -> usize {
        self.writes.len()
    }

    /// True when nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }

    /// Drop every pending write.
    pub fn clear(&mut self) {
        self.writes.clear();
    }
}
