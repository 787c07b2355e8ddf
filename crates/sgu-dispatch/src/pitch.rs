//! Note to frequency-register conversion.
//!
//! The frequency register counts in units of `clock / 524288` Hz. With
//! linear pitch, base frequencies are kept in 1/128 semitone steps and only
//! converted at the end; otherwise they are already register units and pitch
//! offsets are added directly.

use sgu_common::FREQUENCY_BASE;

use crate::config::CompatFlags;

/// Note index of A-4.
pub const REFERENCE_NOTE: i32 = 57;

/// Linear pitch steps per semitone.
pub const LINEAR_STEPS: i32 = 128;

/// Highest frequency register value.
pub const MAX_FREQUENCY: i32 = 0xFFFF;

/// Pitch conversion for one clock and tuning.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PitchTable {
    clock: f64,
    tuning: f64,
    linear: bool,
}

impl PitchTable {
    /// Build a table for `clock` Hz.
    pub fn new(clock: u32, compat: &CompatFlags) -> Self {
        Self {
            clock: f64::from(clock.max(1)),
            tuning: compat.tuning,
            linear: compat.linear_pitch,
        }
    }

    /// Register value for a frequency in Hz.
    pub fn hz_to_register(&self, hz: f64) -> i32 {
        (hz * FREQUENCY_BASE / self.clock).round() as i32
    }

    /// Base frequency of a note, in the table's working unit.
    pub fn note_frequency(&self, note: i32) -> i32 {
        if self.linear {
            note.saturating_mul(LINEAR_STEPS)
        } else {
            let semis = f64::from(note.saturating_sub(REFERENCE_NOTE)) / 12.0;
            self.hz_to_register(self.tuning * semis.exp2())
        }
    }

    /// Final register frequency from a base and the two pitch offsets.
    ///
    /// Not clamped; the caller clamps to the register range.
    pub fn calc_freq(&self, base: i32, pitch: i32, pitch2: i32) -> i32 {
        if self.linear {
            let steps = i64::from(base) + i64::from(pitch) + i64::from(pitch2)
                - i64::from(REFERENCE_NOTE * LINEAR_STEPS);
            let semis = steps as f64 / f64::from(LINEAR_STEPS);
            self.hz_to_register(self.tuning * (semis / 12.0).exp2())
        } else {
            let freq = i64::from(base) + i64::from(pitch) * 4 + i64::from(pitch2);
            freq.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
        }
    }

    /// Portamento step for `speed` at the current base frequency.
    pub fn porta_step(&self, base: i32, speed: i32) -> i32 {
        if self.linear {
            speed
        } else {
            speed.saturating_mul(1 + (base >> 9))
        }
    }
}

/// Clamp to the 16-bit frequency register.
pub fn clamp_frequency(freq: i32) -> u16 {
    freq.clamp(0, MAX_FREQUENCY) as u16
}
