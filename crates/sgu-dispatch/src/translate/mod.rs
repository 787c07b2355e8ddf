//! Parameter translation from legacy synthesis models to native operators.
//!
//! Each model is one [`SynthModel`] strategy. [`translate`] picks the
//! strategy from the instrument's [`Patch`] and returns everything the
//! dispatcher needs to commit: the operator bank (or the PCM switch), and
//! optional duty and filter updates for models that drive them.
//!
//! All translation is pure: the only channel state consulted is passed in
//! through [`TranslateContext`].
//!
//! # Width conversions
//!
//! | Legacy field        | Native field | Conversion                    |
//! |---------------------|--------------|-------------------------------|
//! | 4-bit AR/DR         | 5-bit        | [`widen_rate`]                |
//! | 6-bit TL            | 7-bit        | [`widen_level`]               |
//! | 4-bit carrier TL    | 7-bit        | [`opll_carrier_level`]        |
//! | 4-bit sustain level | attenuation  | [`invert_sustain`]            |
//! | 12-bit pulse width  | 7-bit duty   | [`duty_from_legacy`]          |
//! | 11-bit cutoff       | 16-bit       | [`cutoff_from_legacy`]        |

pub mod fm;
pub mod routing;
pub mod simple;
pub mod subtractive;

use sgu_common::Waveform;

use crate::instrument::{Instrument, Patch};
use crate::operator::OperatorBank;

pub use fm::{FourOpFm, NativeFm, TwoOpFm};
pub use simple::{SamplePlayback, SimpleEnvelope};
pub use subtractive::Subtractive;

/// Channel state a translation may depend on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TranslateContext {
    /// The channel's instrument changed since the last commit.
    pub ins_changed: bool,
    /// Current filter mode bits.
    pub control: u8,
}

/// What the channel plays after a commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Voice {
    /// Operators, with their new parameters.
    Operators(OperatorBank),
    /// PCM; operator state is left as it was.
    Pcm,
}

/// Filter update requested by a translation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FilterChange {
    /// Leave the filter alone.
    #[default]
    Keep,
    /// Clear the filter mode; cutoff and resonance are re-sent unchanged.
    Disable,
    /// Load new filter settings.
    Load {
        /// 16-bit cutoff.
        cutoff: u16,
        /// Resonance register value.
        resonance: u8,
        /// Filter mode bits.
        control: u8,
    },
}

/// Result of translating one instrument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Translation {
    /// Operator bank or PCM.
    pub voice: Voice,
    /// New duty register value.
    pub duty: Option<u8>,
    /// Filter update.
    pub filter: FilterChange,
    /// Reset the ring and sync masks.
    pub clear_ring_sync: bool,
}

impl Translation {
    /// Translation that only replaces the operator bank.
    pub fn operators(bank: OperatorBank) -> Self {
        Self {
            voice: Voice::Operators(bank),
            duty: None,
            filter: FilterChange::Keep,
            clear_ring_sync: false,
        }
    }

    /// Translation that switches the channel to PCM.
    pub fn pcm() -> Self {
        Self {
            voice: Voice::Pcm,
            duty: None,
            filter: FilterChange::Keep,
            clear_ring_sync: false,
        }
    }

    /// Operator bank, if this is not a PCM translation.
    pub fn bank(&self) -> Option<&OperatorBank> {
        match &self.voice {
            Voice::Operators(bank) => Some(bank),
            Voice::Pcm => None,
        }
    }
}

/// One synthesis model's translation strategy.
pub trait SynthModel {
    /// Instrument parameters this model reads.
    type Params;

    /// Produce the native configuration for `params`.
    fn translate(&self, params: &Self::Params, ctx: &TranslateContext) -> Translation;
}

/// Translate an instrument with the strategy matching its model.
pub fn translate(instrument: &Instrument, ctx: &TranslateContext) -> Translation {
    match &instrument.patch {
        Patch::Native(p) => NativeFm.translate(p, ctx),
        Patch::Opn(p) => FourOpFm::OPN.translate(p, ctx),
        Patch::Opm(p) => FourOpFm::OPM.translate(p, ctx),
        Patch::Opz(p) => FourOpFm::OPZ.translate(p, ctx),
        Patch::Opl(p) if p.four_op => FourOpFm::OPL.translate(p, ctx),
        Patch::Opl(p) => TwoOpFm::OPL.translate(p, ctx),
        Patch::Opll(p) => TwoOpFm::OPLL.translate(p, ctx),
        Patch::C64(p) => Subtractive::C64.translate(p, ctx),
        Patch::Sid2(p) => Subtractive::SID2.translate(p, ctx),
        Patch::SoundUnit => SimpleEnvelope::SOUND_UNIT.translate(&(), ctx),
        Patch::Pokey => SimpleEnvelope::POKEY.translate(&(), ctx),
        Patch::Sample(p) => SamplePlayback.translate(p, ctx),
    }
}

// ============================================================================
// Width conversions
// ============================================================================

/// 4-bit envelope rate to 5 bits; 15 maps to 31.
#[inline]
pub fn widen_rate(rate: u8) -> u8 {
    ((rate & 0x0F) << 1) | 1
}

/// 6-bit total level to 7 bits; 63 maps to 127.
#[inline]
pub fn widen_level(tl: u8) -> u8 {
    ((tl & 0x3F) << 1) | 1
}

/// 4-bit OPLL carrier level to 7 bits.
#[inline]
pub fn opll_carrier_level(tl: u8) -> u8 {
    ((tl & 0x0F) << 3) | 0x04
}

/// Legacy sustain volume to native sustain attenuation.
#[inline]
pub fn invert_sustain(sustain: u8) -> u8 {
    15 - (sustain & 0x0F)
}

/// 12-bit pulse width to the 7-bit duty register.
#[inline]
pub fn duty_from_legacy(duty: u16) -> u8 {
    (duty.min(4095) >> 5) as u8
}

/// 11-bit cutoff to 16 bits, rounding; 2047 maps to 65535.
#[inline]
pub fn cutoff_from_legacy(cutoff: u16) -> u16 {
    let c = u32::from(cutoff.min(2047));
    ((c * 65_535 + 1023) / 2047) as u16
}

/// 4-bit resonance replicated into both nibbles.
#[inline]
pub fn resonance_both_nibbles(resonance: u8) -> u8 {
    let r = resonance & 0x0F;
    (r << 4) | r
}

/// OPL-family waveform select to the closest native waveform.
pub fn opl_waveform(ws: u8) -> Waveform {
    match ws & 7 {
        0 | 2 => Waveform::Sine,
        3 => Waveform::Triangle,
        7 => Waveform::Sawtooth,
        _ => Waveform::Pulse,
    }
}
