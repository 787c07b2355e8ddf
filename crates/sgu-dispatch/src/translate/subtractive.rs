//! Filtered subtractive voices (SID and SID2).
//!
//! A single carrier on operator 3 plays the oscillator; operators 0-2 are
//! silenced. Pulse width and the resonant filter map onto the channel's duty
//! and filter registers.

use sgu_common::{OPERATORS_PER_CHANNEL, Waveform};

use super::{
    FilterChange, SynthModel, TranslateContext, Translation, cutoff_from_legacy,
    duty_from_legacy, invert_sustain, resonance_both_nibbles, widen_rate,
};
use crate::instrument::{SidFilter, SidPatch, SidWaves};
use crate::operator::{Operator, OperatorBank};
use crate::translate::routing::CARRIER;

/// Operator carrying a single-oscillator voice.
pub const CARRIER_OPERATOR: usize = OPERATORS_PER_CHANNEL - 1;

/// Filter mode bits.
pub const FILTER_LOW_PASS: u8 = 2;
/// High-pass.
pub const FILTER_HIGH_PASS: u8 = 4;
/// Band-pass.
pub const FILTER_BAND_PASS: u8 = 8;

/// SID-style voice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Subtractive {
    /// Noise mode can select periodic noise.
    pub periodic_noise: bool,
}

impl Subtractive {
    /// SID.
    pub const C64: Subtractive = Subtractive {
        periodic_noise: false,
    };
    /// SID2.
    pub const SID2: Subtractive = Subtractive {
        periodic_noise: true,
    };

    fn waveform(&self, waves: &SidWaves, noise_mode: u8) -> Waveform {
        if waves.noise {
            if self.periodic_noise && noise_mode != 0 {
                Waveform::PeriodicNoise
            } else {
                Waveform::Noise
            }
        } else if waves.pulse {
            Waveform::Pulse
        } else if waves.saw {
            Waveform::Sawtooth
        } else if waves.triangle {
            Waveform::Triangle
        } else {
            Waveform::Sawtooth
        }
    }
}

/// Filter mode bits for a SID filter.
pub fn filter_mode(filter: &SidFilter) -> u8 {
    (if filter.low_pass { FILTER_LOW_PASS } else { 0 })
        | (if filter.high_pass { FILTER_HIGH_PASS } else { 0 })
        | (if filter.band_pass { FILTER_BAND_PASS } else { 0 })
}

/// Carrier operator for a single-oscillator voice.
pub(crate) fn carrier(ar: u8, dr: u8, sl: u8, rr: u8, ws: Waveform) -> Operator {
    let mut op = Operator {
        ar,
        dr,
        sl,
        rr,
        d2r: 0,
        tl: 0,
        mult: 1,
        ws: ws.bits(),
        ..Operator::DEFAULT
    };
    op.set_routing(0, CARRIER);
    op
}

/// Operator bank with only the carrier audible.
pub(crate) fn single_carrier_bank(carrier: Operator) -> OperatorBank {
    let mut bank = OperatorBank::default();
    for op in &mut bank.ops[..CARRIER_OPERATOR] {
        *op = Operator::DEFAULT.silenced();
    }
    bank.ops[CARRIER_OPERATOR] = carrier;
    bank
}

impl SynthModel for Subtractive {
    type Params = SidPatch;

    fn translate(&self, params: &SidPatch, ctx: &TranslateContext) -> Translation {
        let env = &params.envelope;
        let sustain = env.sustain & 0x0F;
        // Full sustain never decays.
        let dr = if sustain == 15 {
            0
        } else {
            widen_rate(env.decay)
        };
        let op = carrier(
            widen_rate(env.attack),
            dr,
            invert_sustain(sustain),
            env.release & 0x0F,
            self.waveform(&params.waves, params.noise_mode),
        );

        let duty = (params.reset_duty || ctx.ins_changed).then(|| duty_from_legacy(params.duty));

        let filter = if !params.filter.enabled {
            if ctx.control != 0 {
                FilterChange::Disable
            } else {
                FilterChange::Keep
            }
        } else if params.filter.init {
            FilterChange::Load {
                cutoff: cutoff_from_legacy(params.filter.cutoff),
                resonance: resonance_both_nibbles(params.filter.resonance),
                control: filter_mode(&params.filter),
            }
        } else {
            FilterChange::Keep
        };

        Translation {
            duty,
            filter,
            clear_ring_sync: true,
            ..Translation::operators(single_carrier_bank(op))
        }
    }
}
