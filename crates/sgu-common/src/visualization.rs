//! Per-channel oscilloscope taps.
//!
//! The render loop pushes each channel's raw output into an [`OscBuffer`]
//! once per produced sample. Frontends read the most recent window back for
//! display.

use std::collections::VecDeque;

// ============================================================================
// Constants
// ============================================================================

/// Number of samples retained per channel.
pub const OSC_BUFFER_SIZE: usize = 2048;

// ============================================================================
// Oscilloscope Buffer
// ============================================================================

/// Ring buffer holding the most recent output samples of one channel.
#[derive(Debug, Clone)]
pub struct OscBuffer {
    samples: VecDeque<i16>,
    capacity: usize,
    rate: u32,
}

impl Default for OscBuffer {
    fn default() -> Self {
        Self::new(OSC_BUFFER_SIZE)
    }
}

impl OscBuffer {
    /// Create an empty buffer retaining at most `capacity` samples.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
            rate: 0,
        }
    }

    /// Set the rate at which samples are produced.
    pub fn set_rate(&mut self, rate: u32) {
        self.rate = rate;
    }

    /// Sample rate of the buffered data.
    pub fn rate(&self) -> u32 {
        self.rate
    }

    /// Append one sample, discarding the oldest when full.
    pub fn push(&mut self, sample: i16) {
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
    }

    /// Buffered samples, oldest first.
    pub fn samples(&self) -> impl ExactSizeIterator<Item = i16> + '_ {
        self.samples.iter().copied()
    }

    /// Most recent sample, if any.
    pub fn last(&self) -> Option<i16> {
        self.samples.back().copied()
    }

    /// Number of buffered samples.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// True when nothing has been pushed since the last clear.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Drop all buffered samples.
    pub fn clear(&mut self) {
        self.samples.clear();
    }
}
