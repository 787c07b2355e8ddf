//! Sample data and the chip's PCM RAM layout.
//!
//! [`SampleMemory::render`] packs every renderable sample back to back into
//! the fixed-size RAM image, starting at offset 0. Samples that do not fit are
//! truncated (the first one) or left out (everything after it).

use std::ops::Range;

use log::{debug, warn};
use sgu_common::PCM_RAM_SIZE;

use crate::host::SampleStore;

/// Highest number of sample slots tracked.
pub const MAX_SAMPLES: usize = 32_768;

/// Center rate assumed for samples that do not declare one.
pub const DEFAULT_SAMPLE_RATE: u32 = 8363;

/// 8-bit PCM sample.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sample {
    /// Display name.
    pub name: String,
    /// Signed 8-bit data.
    pub data: Vec<i8>,
    /// Loop enabled.
    pub looped: bool,
    /// Loop start, in samples.
    pub loop_start: usize,
    /// Loop end (exclusive), in samples.
    pub loop_end: usize,
    /// Rate at which the sample plays at its reference note; 0 if unknown.
    pub center_rate: u32,
    /// Include this sample when laying out PCM RAM.
    pub render_on: bool,
}

impl Sample {
    /// Non-looping sample at the default rate.
    pub fn new(name: impl Into<String>, data: Vec<i8>) -> Self {
        Self {
            name: name.into(),
            data,
            looped: false,
            loop_start: 0,
            loop_end: 0,
            center_rate: DEFAULT_SAMPLE_RATE,
            render_on: true,
        }
    }

    /// Enable looping over `range`.
    pub fn with_loop(mut self, range: Range<usize>) -> Self {
        self.looped = true;
        self.loop_start = range.start;
        self.loop_end = range.end;
        self
    }

    /// Set the center rate.
    pub fn with_center_rate(mut self, rate: u32) -> Self {
        self.center_rate = rate;
        self
    }

    /// Include or exclude from PCM RAM.
    pub fn with_render(mut self, render_on: bool) -> Self {
        self.render_on = render_on;
        self
    }

    /// Length in samples.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// True for an empty sample.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// True when the loop range is usable.
    pub fn is_loopable(&self) -> bool {
        self.looped && self.loop_start < self.loop_end && self.loop_end <= self.data.len()
    }

    /// Position playback stops (or wraps) at.
    pub fn loop_end_position(&self) -> usize {
        if self.is_loopable() {
            self.loop_end
        } else {
            self.data.len()
        }
    }

    /// Position playback wraps to.
    pub fn loop_start_position(&self) -> usize {
        if self.is_loopable() { self.loop_start } else { 0 }
    }
}

/// One placed sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryEntry {
    /// Sample index.
    pub sample: usize,
    /// First byte.
    pub start: usize,
    /// One past the last byte.
    pub end: usize,
}

/// PCM RAM usage, for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryComposition {
    /// Region name.
    pub name: &'static str,
    /// Placed samples, in address order.
    pub entries: Vec<MemoryEntry>,
    /// Bytes in use.
    pub used: usize,
    /// Total bytes.
    pub capacity: usize,
}

impl Default for MemoryComposition {
    fn default() -> Self {
        Self {
            name: "Sample RAM",
            entries: Vec::new(),
            used: 0,
            capacity: PCM_RAM_SIZE,
        }
    }
}

/// PCM RAM image and the sample offset table.
#[derive(Debug, Clone)]
pub struct SampleMemory {
    data: Vec<i8>,
    offsets: Vec<Option<u32>>,
    loaded: Vec<bool>,
    used: usize,
    out_of_memory: bool,
    composition: MemoryComposition,
}

impl Default for SampleMemory {
    fn default() -> Self {
        Self::new()
    }
}

impl SampleMemory {
    /// Empty RAM image.
    pub fn new() -> Self {
        Self {
            data: vec![0; PCM_RAM_SIZE],
            offsets: vec![None; MAX_SAMPLES],
            loaded: vec![false; MAX_SAMPLES],
            used: 0,
            out_of_memory: false,
            composition: MemoryComposition::default(),
        }
    }

    /// Rebuild the RAM image and offset table from scratch.
    pub fn render(&mut self, samples: &dyn SampleStore) {
        self.data.fill(0);
        self.offsets.fill(None);
        self.loaded.fill(false);
        self.out_of_memory = false;
        self.composition = MemoryComposition::default();

        let capacity = self.data.len();
        let mut pos = 0usize;

        for index in 0..samples.len().min(MAX_SAMPLES) {
            let Some(sample) = samples.sample(index) else {
                continue;
            };
            if sample.is_empty() || !sample.render_on {
                continue;
            }

            if pos >= capacity {
                warn!("out of PCM memory for sample {index}");
                self.out_of_memory = true;
                break;
            }

            let len = sample.len();
            let fits = pos + len <= capacity;
            let copy = if fits { len } else { capacity - pos };
            self.data[pos..pos + copy].copy_from_slice(&sample.data[..copy]);
            self.offsets[index] = Some(pos as u32);
            self.loaded[index] = fits;
            self.composition.entries.push(MemoryEntry {
                sample: index,
                start: pos,
                end: pos + copy,
            });
            pos += copy;

            if !fits {
                warn!("out of PCM memory for sample {index}; truncated to {copy} of {len} bytes");
                self.out_of_memory = true;
                break;
            }
        }

        self.used = pos;
        self.composition.used = pos;
        self.composition.capacity = capacity;
        debug!(
            "sample RAM rendered: {} samples, {pos}/{capacity} bytes",
            self.composition.entries.len()
        );
    }

    /// RAM offset of a sample, or `None` if none of its bytes were placed.
    ///
    /// A truncated sample has an offset but is not loaded.
    pub fn offset(&self, sample: i32) -> Option<usize> {
        let idx = usize::try_from(sample).ok()?;
        self.offsets.get(idx).copied().flatten().map(|off| off as usize)
    }

    /// True if the sample was copied in full.
    pub fn is_loaded(&self, sample: i32) -> bool {
        usize::try_from(sample)
            .ok()
            .and_then(|idx| self.loaded.get(idx).copied())
            .unwrap_or(false)
    }

    /// RAM image.
    pub fn data(&self) -> &[i8] {
        &self.data
    }

    /// Capacity in bytes.
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// Bytes in use.
    pub fn usage(&self) -> usize {
        self.used
    }

    /// True if the last render ran out of space.
    pub fn out_of_memory(&self) -> bool {
        self.out_of_memory
    }

    /// Placement summary of the last render.
    pub fn composition(&self) -> &MemoryComposition {
        &self.composition
    }

    /// Copy the image into a chip's RAM.
    pub fn copy_to(&self, ram: &mut [i8]) {
        let len = ram.len().min(self.data.len());
        ram[..len].copy_from_slice(&self.data[..len]);
    }
}
