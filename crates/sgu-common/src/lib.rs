//! Shared vocabulary for the SGU-1 sound chip.
//!
//! The SGU-1 is a multi-channel synthesizer with four operators per channel,
//! a resonant filter, hardware sweeps and a PCM sample path. This crate holds
//! everything that describes the chip itself rather than any particular way
//! of driving it:
//!
//! - [`registers`] - register map, address helpers and the register sheet
//! - [`backend`] - the [`SguBackend`] trait implemented by chip cores
//! - [`visualization`] - per-channel oscilloscope buffers
//!
//! # Example
//!
//! ```
//! use sgu_common::registers::{ChannelRegister, OperatorRegister, channel_addr, operator_addr};
//!
//! // Channel 1, operator 2, register R6 (modulation input / ring / sync)
//! assert_eq!(operator_addr(1, 2, OperatorRegister::R6), 0x56);
//! assert_eq!(channel_addr(1, ChannelRegister::FreqLo), 0x60);
//! ```

#![warn(missing_docs)]

pub mod backend;
pub mod registers;
pub mod visualization;

pub use backend::SguBackend;
pub use registers::{ChannelRegister, Flags0, Flags1, OperatorRegister, Waveform};
pub use visualization::OscBuffer;

// ============================================================================
// Chip layout
// ============================================================================

/// Number of hardware voices.
pub const CHANNEL_COUNT: usize = 9;

/// Operators per channel.
pub const OPERATORS_PER_CHANNEL: usize = 4;

/// Registers per operator.
pub const OPERATOR_REGISTERS: usize = 8;

/// Address stride between two channels.
pub const REGISTERS_PER_CHANNEL: usize = 0x40;

/// Offset of the first channel-level register inside a channel block.
pub const CHANNEL_REGISTER_BASE: usize = OPERATORS_PER_CHANNEL * OPERATOR_REGISTERS;

/// Size of the addressable register space mirrored by drivers.
pub const REGISTER_POOL_SIZE: usize = REGISTERS_PER_CHANNEL * CHANNEL_COUNT;

/// Size of the PCM sample RAM in bytes (16-bit PCM pointers).
pub const PCM_RAM_SIZE: usize = 65_536;

// ============================================================================
// Timing
// ============================================================================

/// Default chip clock used for frequency register conversion (1 MHz).
pub const DEFAULT_CHIP_CLOCK: u32 = 1_000_000;

/// Rate at which the chip core produces output samples.
pub const CHIP_OUTPUT_RATE: u32 = 48_000;

/// Divider relating hertz to the 16-bit frequency register at the chip clock.
pub const FREQUENCY_BASE: f64 = 524_288.0;
