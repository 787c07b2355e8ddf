//! Single-oscillator instant-envelope voices and sample playback.

use sgu_common::Waveform;

use super::subtractive::{carrier, single_carrier_bank};
use super::{SynthModel, TranslateContext, Translation};
use crate::instrument::SamplePatch;

/// Fixed waveform on the carrier with full attack and fast release.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimpleEnvelope {
    /// Carrier waveform.
    pub waveform: Waveform,
}

impl SimpleEnvelope {
    /// Sound Unit.
    pub const SOUND_UNIT: SimpleEnvelope = SimpleEnvelope {
        waveform: Waveform::Sawtooth,
    };
    /// POKEY.
    pub const POKEY: SimpleEnvelope = SimpleEnvelope {
        waveform: Waveform::Pulse,
    };
}

impl SynthModel for SimpleEnvelope {
    type Params = ();

    fn translate(&self, _params: &(), _ctx: &TranslateContext) -> Translation {
        Translation::operators(single_carrier_bank(carrier(31, 0, 0, 15, self.waveform)))
    }
}

/// Raw sample playback.
#[derive(Debug, Clone, Copy, Default)]
pub struct SamplePlayback;

impl SynthModel for SamplePlayback {
    type Params = SamplePatch;

    fn translate(&self, _params: &SamplePatch, _ctx: &TranslateContext) -> Translation {
        Translation::pcm()
    }
}
