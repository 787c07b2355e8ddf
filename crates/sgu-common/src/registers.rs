//! SGU-1 Register Definitions
//!
//! Every channel owns a 64-byte block. The first 32 bytes hold four operators
//! of eight registers each; the remaining 32 bytes are channel-level controls
//! (frequency, volume, filter, PCM pointers, sweeps).

use std::fmt;

use bitflags::bitflags;

use crate::{CHANNEL_REGISTER_BASE, OPERATOR_REGISTERS, REGISTERS_PER_CHANNEL};

/// Operator register (offset inside an operator's 8-byte block)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperatorRegister {
    /// `[7 TRM][6 VIB][5 FIX][3:0 MUL]`
    R0 = 0x00,
    /// `[7:6 KSL][5:0 TL]`
    R1 = 0x01,
    /// `[7:4 AR][3:0 DR]`
    R2 = 0x02,
    /// `[7:4 SL][3:0 RR]`
    R3 = 0x03,
    /// `[7:5 DT][4:0 SR]`
    R4 = 0x04,
    /// `[7:5 DELAY][4:3 KSR][2:0 WPAR]`
    R5 = 0x05,
    /// `[7 TRMD][6 VIBD][5 SYNC][4 RING][3:1 MOD][0 TLmsb]`
    R6 = 0x06,
    /// `[7:5 OUT][4 ARmsb][3 DRmsb][2:0 WAVE]`
    R7 = 0x07,
}

impl OperatorRegister {
    /// All operator registers in address order.
    pub const ALL: [OperatorRegister; OPERATOR_REGISTERS] = [
        OperatorRegister::R0,
        OperatorRegister::R1,
        OperatorRegister::R2,
        OperatorRegister::R3,
        OperatorRegister::R4,
        OperatorRegister::R5,
        OperatorRegister::R6,
        OperatorRegister::R7,
    ];

    /// Offset inside the operator block
    pub fn offset(self) -> u8 {
        self as u8
    }
}

/// Channel-level register (offset relative to the channel register base)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelRegister {
    /// Frequency, low byte
    FreqLo = 0x00,
    /// Frequency, high byte
    FreqHi = 0x01,
    /// Output volume (0-127)
    Volume = 0x02,
    /// Signed pan (-127..127)
    Pan = 0x03,
    /// Key-on, PCM select and filter mode (see [`Flags0`])
    Flags0 = 0x04,
    /// Phase resets, PCM loop, timer sync and sweep enables (see [`Flags1`])
    Flags1 = 0x05,
    /// Filter cutoff, low byte
    CutoffLo = 0x06,
    /// Filter cutoff, high byte
    CutoffHi = 0x07,
    /// Pulse width
    Duty = 0x08,
    /// Filter resonance
    Resonance = 0x09,
    /// PCM start position, low byte
    PcmPosLo = 0x0A,
    /// PCM start position, high byte
    PcmPosHi = 0x0B,
    /// PCM end position, low byte
    PcmEndLo = 0x0C,
    /// PCM end position, high byte
    PcmEndHi = 0x0D,
    /// PCM loop restart position, low byte
    PcmRestartLo = 0x0E,
    /// PCM loop restart position, high byte
    PcmRestartHi = 0x0F,
    /// Frequency sweep period, low byte
    FreqSweepPeriodLo = 0x10,
    /// Frequency sweep period, high byte
    FreqSweepPeriodHi = 0x11,
    /// Frequency sweep amount
    FreqSweepAmount = 0x12,
    /// Frequency sweep bound
    FreqSweepBound = 0x13,
    /// Volume sweep period, low byte
    VolSweepPeriodLo = 0x14,
    /// Volume sweep period, high byte
    VolSweepPeriodHi = 0x15,
    /// Volume sweep amount
    VolSweepAmount = 0x16,
    /// Volume sweep bound
    VolSweepBound = 0x17,
    /// Cutoff sweep period, low byte
    CutSweepPeriodLo = 0x18,
    /// Cutoff sweep period, high byte
    CutSweepPeriodHi = 0x19,
    /// Cutoff sweep amount
    CutSweepAmount = 0x1A,
    /// Cutoff sweep bound
    CutSweepBound = 0x1B,
    /// Sync timer period, low byte
    SyncTimerLo = 0x1C,
    /// Sync timer period, high byte
    SyncTimerHi = 0x1D,
    /// Reserved
    Special1 = 0x1E,
    /// Reserved
    Special2 = 0x1F,
}

impl ChannelRegister {
    /// Offset inside the channel block (including the operator area)
    pub fn offset(self) -> u8 {
        CHANNEL_REGISTER_BASE as u8 + self as u8
    }
}

impl fmt::Display for ChannelRegister {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ChannelRegister::FreqLo => "FREQ_L",
            ChannelRegister::FreqHi => "FREQ_H",
            ChannelRegister::Volume => "VOL",
            ChannelRegister::Pan => "PAN",
            ChannelRegister::Flags0 => "FLAGS0",
            ChannelRegister::Flags1 => "FLAGS1",
            ChannelRegister::CutoffLo => "CUTOFF_L",
            ChannelRegister::CutoffHi => "CUTOFF_H",
            ChannelRegister::Duty => "DUTY",
            ChannelRegister::Resonance => "RESON",
            ChannelRegister::PcmPosLo => "PCM_POS_L",
            ChannelRegister::PcmPosHi => "PCM_POS_H",
            ChannelRegister::PcmEndLo => "PCM_END_L",
            ChannelRegister::PcmEndHi => "PCM_END_H",
            ChannelRegister::PcmRestartLo => "PCM_RST_L",
            ChannelRegister::PcmRestartHi => "PCM_RST_H",
            ChannelRegister::FreqSweepPeriodLo => "SWFREQ_SPD_L",
            ChannelRegister::FreqSweepPeriodHi => "SWFREQ_SPD_H",
            ChannelRegister::FreqSweepAmount => "SWFREQ_AMT",
            ChannelRegister::FreqSweepBound => "SWFREQ_BND",
            ChannelRegister::VolSweepPeriodLo => "SWVOL_SPD_L",
            ChannelRegister::VolSweepPeriodHi => "SWVOL_SPD_H",
            ChannelRegister::VolSweepAmount => "SWVOL_AMT",
            ChannelRegister::VolSweepBound => "SWVOL_BND",
            ChannelRegister::CutSweepPeriodLo => "SWCUT_SPD_L",
            ChannelRegister::CutSweepPeriodHi => "SWCUT_SPD_H",
            ChannelRegister::CutSweepAmount => "SWCUT_AMT",
            ChannelRegister::CutSweepBound => "SWCUT_BND",
            ChannelRegister::SyncTimerLo => "RESTIMER_L",
            ChannelRegister::SyncTimerHi => "RESTIMER_H",
            ChannelRegister::Special1 => "SPECIAL1",
            ChannelRegister::Special2 => "SPECIAL2",
        };
        write!(f, "CHx_{name}")
    }
}

/// Absolute address of an operator register
#[inline]
pub fn operator_addr(channel: usize, operator: usize, reg: OperatorRegister) -> u16 {
    (channel * REGISTERS_PER_CHANNEL + operator * OPERATOR_REGISTERS + reg.offset() as usize) as u16
}

/// Absolute address of a channel register
#[inline]
pub fn channel_addr(channel: usize, reg: ChannelRegister) -> u16 {
    (channel * REGISTERS_PER_CHANNEL + reg.offset() as usize) as u16
}

bitflags! {
    /// Lower channel control register.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Flags0: u8 {
        /// Gate; a rising edge restarts the envelopes
        const KEY_ON = 0x01;
        /// Channel plays PCM instead of the operators
        const PCM = 0x08;
        /// Filter mode, bit 0
        const FILTER_MODE_0 = 0x10;
        /// Low-pass filter
        const LOW_PASS = 0x20;
        /// High-pass filter
        const HIGH_PASS = 0x40;
        /// Band-pass filter
        const BAND_PASS = 0x80;
    }
}

impl Flags0 {
    /// Build the register value from gate, PCM flag and the 4-bit filter mode
    pub fn compose(key: bool, pcm: bool, filter_mode: u8) -> Self {
        let mut flags = Flags0::from_bits_retain((filter_mode & 0x0F) << 4);
        flags.set(Flags0::KEY_ON, key);
        flags.set(Flags0::PCM, pcm);
        flags
    }
}

bitflags! {
    /// Upper channel control register.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Flags1: u8 {
        /// One-shot oscillator phase reset
        const PHASE_RESET = 0x01;
        /// One-shot filter state reset
        const FILTER_PHASE_RESET = 0x02;
        /// PCM playback loops from the restart position
        const PCM_LOOP = 0x04;
        /// Sync timer resets the oscillator phase
        const TIMER_SYNC = 0x08;
        /// Frequency sweep enabled
        const FREQ_SWEEP = 0x10;
        /// Volume sweep enabled
        const VOL_SWEEP = 0x20;
        /// Cutoff sweep enabled
        const CUT_SWEEP = 0x40;
    }
}

/// Native operator waveforms (3-bit WAVE field)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Waveform {
    /// Sine
    #[default]
    Sine = 0,
    /// Triangle
    Triangle = 1,
    /// Sawtooth
    Sawtooth = 2,
    /// Pulse, width taken from the channel duty register
    Pulse = 3,
    /// White noise
    Noise = 4,
    /// Short-period (tonal) noise
    PeriodicNoise = 5,
}

impl Waveform {
    /// Register encoding
    pub fn bits(self) -> u8 {
        self as u8
    }
}

/// Register sheet: (name with bit fields, address formula), for diagnostics.
pub const REGISTER_SHEET: &[(&str, &str)] = &[
    ("CHx_OPy_R0 [7 TRM][6 VIB][5 FIX][3:0 MUL]", "00+x*40+y*08"),
    ("CHx_OPy_R1 [7:6 KSL][5:0 TL]", "01+x*40+y*08"),
    ("CHx_OPy_R2 [7:4 AR][3:0 DR]", "02+x*40+y*08"),
    ("CHx_OPy_R3 [7:4 SL][3:0 RR]", "03+x*40+y*08"),
    ("CHx_OPy_R4 [7:5 DT][4:0 SR]", "04+x*40+y*08"),
    ("CHx_OPy_R5 [7:5 DELAY][4:3 KSR][2:0 WPAR]", "05+x*40+y*08"),
    ("CHx_OPy_R6 [7 TRMD][6 VIBD][5 SYNC][4 RING][3:1 MOD][0 TLmsb]", "06+x*40+y*08"),
    ("CHx_OPy_R7 [7:5 OUT][4 ARmsb][3 DRmsb][2:0 WAVE]", "07+x*40+y*08"),
    ("CHx_FREQ_L", "20+x*40"),
    ("CHx_FREQ_H", "21+x*40"),
    ("CHx_VOL", "22+x*40"),
    ("CHx_PAN", "23+x*40"),
    ("CHx_FLAGS0", "24+x*40"),
    ("CHx_FLAGS1", "25+x*40"),
    ("CHx_CUTOFF_L", "26+x*40"),
    ("CHx_CUTOFF_H", "27+x*40"),
    ("CHx_DUTY", "28+x*40"),
    ("CHx_RESON", "29+x*40"),
    ("CHx_PCM_POS_L", "2A+x*40"),
    ("CHx_PCM_POS_H", "2B+x*40"),
    ("CHx_PCM_END_L", "2C+x*40"),
    ("CHx_PCM_END_H", "2D+x*40"),
    ("CHx_PCM_RST_L", "2E+x*40"),
    ("CHx_PCM_RST_H", "2F+x*40"),
    ("CHx_SWFREQ_SPD_L", "30+x*40"),
    ("CHx_SWFREQ_SPD_H", "31+x*40"),
    ("CHx_SWFREQ_AMT", "32+x*40"),
    ("CHx_SWFREQ_BND", "33+x*40"),
    ("CHx_SWVOL_SPD_L", "34+x*40"),
    ("CHx_SWVOL_SPD_H", "35+x*40"),
    ("CHx_SWVOL_AMT", "36+x*40"),
    ("CHx_SWVOL_BND", "37+x*40"),
    ("CHx_SWCUT_SPD_L", "38+x*40"),
    ("CHx_SWCUT_SPD_H", "39+x*40"),
    ("CHx_SWCUT_AMT", "3A+x*40"),
    ("CHx_SWCUT_BND", "3B+x*40"),
    ("CHx_RESTIMER_L", "3C+x*40"),
    ("CHx_RESTIMER_H", "3D+x*40"),
    ("CHx_SPECIAL1", "3E+x*40"),
    ("CHx_SPECIAL2", "3F+x*40"),
];
