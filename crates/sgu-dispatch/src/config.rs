//! Chip and compatibility configuration.
//!
//! Both halves are plain values passed into [`SguDispatch::init`] and
//! [`SguDispatch::set_flags`]. Nothing here is read through shared state; the
//! dispatcher hands the relevant pieces down to the translation, pitch and
//! volume code explicitly.
//!
//! [`SguDispatch::init`]: crate::SguDispatch::init
//! [`SguDispatch::set_flags`]: crate::SguDispatch::set_flags

use serde::{Deserialize, Serialize};
use sgu_common::DEFAULT_CHIP_CLOCK;

use crate::error::{DispatchError, Result};

/// Highest accepted custom clock.
pub const MAX_CHIP_CLOCK: u32 = 100_000_000;

/// Per-chip settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ChipFlags {
    /// Overrides the 1 MHz reference clock used for frequency conversion.
    pub custom_clock: Option<u32>,
}

impl ChipFlags {
    /// Set or clear the custom clock.
    pub fn custom_clock(mut self, clock: Option<u32>) -> Self {
        self.custom_clock = clock;
        self
    }

    /// Effective chip clock.
    pub fn clock(&self) -> u32 {
        self.custom_clock.unwrap_or(DEFAULT_CHIP_CLOCK)
    }

    fn validate(&self) -> Result<()> {
        match self.custom_clock {
            Some(clock) if clock == 0 || clock > MAX_CHIP_CLOCK => {
                Err(DispatchError::InvalidClock(clock))
            }
            _ => Ok(()),
        }
    }
}

/// Song-wide compatibility toggles.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompatFlags {
    /// Pitch works in 1/128 semitone steps instead of raw frequency units.
    pub linear_pitch: bool,
    /// Combine channel and macro volume logarithmically (additive) instead
    /// of linearly (multiplicative).
    pub new_volume_scaling: bool,
    /// Round linear volume products up instead of down.
    pub ceil_volume_scaling: bool,
    /// Reference pitch of A-4 in Hz.
    pub tuning: f64,
}

impl Default for CompatFlags {
    fn default() -> Self {
        Self {
            linear_pitch: true,
            new_volume_scaling: true,
            ceil_volume_scaling: false,
            tuning: 440.0,
        }
    }
}

impl CompatFlags {
    /// Enable or disable linear pitch.
    pub fn linear_pitch(mut self, enabled: bool) -> Self {
        self.linear_pitch = enabled;
        self
    }

    /// Enable or disable logarithmic volume combination.
    pub fn new_volume_scaling(mut self, enabled: bool) -> Self {
        self.new_volume_scaling = enabled;
        self
    }

    /// Enable or disable rounding-up linear volume scaling.
    pub fn ceil_volume_scaling(mut self, enabled: bool) -> Self {
        self.ceil_volume_scaling = enabled;
        self
    }

    /// Set the A-4 reference pitch.
    pub fn tuning(mut self, hz: f64) -> Self {
        self.tuning = hz;
        self
    }

    fn validate(&self) -> Result<()> {
        if self.tuning.is_finite() && self.tuning > 0.0 {
            Ok(())
        } else {
            Err(DispatchError::InvalidTuning(self.tuning.to_string()))
        }
    }
}

/// Complete dispatcher configuration.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Chip settings.
    pub chip: ChipFlags,
    /// Compatibility toggles.
    pub compat: CompatFlags,
}

impl DispatchConfig {
    /// Replace the chip settings.
    pub fn chip(mut self, chip: ChipFlags) -> Self {
        self.chip = chip;
        self
    }

    /// Replace the compatibility toggles.
    pub fn compat(mut self, compat: CompatFlags) -> Self {
        self.compat = compat;
        self
    }

    /// Check that every value is usable.
    pub fn validate(&self) -> Result<()> {
        self.chip.validate()?;
        self.compat.validate()
    }
}
