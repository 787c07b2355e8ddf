//! Interfaces to the engine that embeds the dispatcher.
//!
//! The dispatcher does not own instruments, samples or macro state. Each call
//! that needs them receives a [`Host`] bundling read access to the stores and
//! the macro interpreter for that call only.

use sgu_common::OPERATORS_PER_CHANNEL;

use crate::instrument::Instrument;
use crate::samples::Sample;

/// Engine reference rate that sample center rates are measured against.
pub const DEFAULT_CENTER_RATE: f64 = 8372.0;

// ============================================================================
// Stores
// ============================================================================

/// Instrument lookup.
pub trait InstrumentStore {
    /// Instrument at `index`, if any.
    fn instrument(&self, index: usize) -> Option<&Instrument>;
}

impl InstrumentStore for [Instrument] {
    fn instrument(&self, index: usize) -> Option<&Instrument> {
        self.get(index)
    }
}

impl InstrumentStore for Vec<Instrument> {
    fn instrument(&self, index: usize) -> Option<&Instrument> {
        self.get(index)
    }
}

/// Sample lookup.
pub trait SampleStore {
    /// Sample at `index`, if any.
    fn sample(&self, index: usize) -> Option<&Sample>;

    /// Number of declared samples.
    fn len(&self) -> usize;

    /// True when no samples are declared.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Reference rate for sample pitch.
    fn center_rate(&self) -> f64 {
        DEFAULT_CENTER_RATE
    }
}

impl SampleStore for [Sample] {
    fn sample(&self, index: usize) -> Option<&Sample> {
        self.get(index)
    }

    fn len(&self) -> usize {
        <[Sample]>::len(self)
    }
}

impl SampleStore for Vec<Sample> {
    fn sample(&self, index: usize) -> Option<&Sample> {
        self.get(index)
    }

    fn len(&self) -> usize {
        Vec::len(self)
    }
}

// ============================================================================
// Macros
// ============================================================================

/// Macro channels the dispatcher asks about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MacroKind {
    /// Volume.
    Volume,
    /// Arpeggio.
    Arp,
    /// Duty / noise.
    Duty,
    /// Waveform.
    Wave,
    /// Pitch.
    Pitch,
    /// Filter cutoff, relative to the base cutoff.
    Ex1,
    /// Resonance.
    Ex2,
    /// Filter mode.
    Ex3,
    /// Sync timer period.
    Ex4,
    /// Feedback.
    Feedback,
}

/// Arpeggio macro value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arp {
    /// Semitones added to the channel note.
    Relative(i32),
    /// Absolute note.
    Fixed(i32),
}

impl Arp {
    /// Note produced for `note`.
    pub fn apply(self, note: i32) -> i32 {
        match self {
            Arp::Relative(offset) => note.saturating_add(offset),
            Arp::Fixed(fixed) => fixed,
        }
    }
}

/// Pitch macro value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PitchMacro {
    /// Offset.
    pub value: i32,
    /// Accumulate instead of replacing.
    pub relative: bool,
}

/// Per-operator macro values for one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OperatorMacros {
    /// Tremolo enable.
    pub am: Option<i32>,
    /// Vibrato enable.
    pub vib: Option<i32>,
    /// Multiplier.
    pub mult: Option<i32>,
    /// Total level.
    pub tl: Option<i32>,
    /// Attack rate.
    pub ar: Option<i32>,
    /// Decay rate.
    pub dr: Option<i32>,
    /// Sustain level.
    pub sl: Option<i32>,
    /// Release rate.
    pub rr: Option<i32>,
    /// Second decay rate.
    pub d2r: Option<i32>,
    /// Detune.
    pub dt: Option<i32>,
    /// Rate scaling.
    pub rs: Option<i32>,
    /// 1-bit key-scale rate.
    pub ksr: Option<i32>,
    /// Key-scale level.
    pub ksl: Option<i32>,
    /// Tremolo depth.
    pub dam: Option<i32>,
    /// Vibrato depth.
    pub dvb: Option<i32>,
    /// Waveform.
    pub ws: Option<i32>,
    /// Envelope delay.
    pub delay: Option<i32>,
    /// Envelope type; output level for non-OPLL models.
    pub egt: Option<i32>,
    /// Modulation input.
    pub mod_in: Option<i32>,
}

impl OperatorMacros {
    /// True if any value is present.
    pub fn any(&self) -> bool {
        *self != OperatorMacros::default()
    }
}

/// Macro values produced for one channel on one tick.
///
/// `None` means the macro did not step this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MacroTick {
    /// Volume.
    pub vol: Option<i32>,
    /// Arpeggio.
    pub arp: Option<Arp>,
    /// Duty.
    pub duty: Option<i32>,
    /// Carrier waveform.
    pub wave: Option<i32>,
    /// Phase reset; bit 1 also resets the filter.
    pub phase_reset: Option<i32>,
    /// Pan.
    pub pan: Option<i32>,
    /// Pitch.
    pub pitch: Option<PitchMacro>,
    /// Filter cutoff.
    pub ex1: Option<i32>,
    /// Resonance.
    pub ex2: Option<i32>,
    /// Filter mode.
    pub ex3: Option<i32>,
    /// Sync timer period.
    pub ex4: Option<i32>,
    /// Feedback.
    pub fb: Option<i32>,
    /// Shared vibrato depth.
    pub fms: Option<i32>,
    /// Shared tremolo depth.
    pub ams: Option<i32>,
    /// Operator macros.
    pub ops: [OperatorMacros; OPERATORS_PER_CHANNEL],
}

/// Per-tick automation source.
pub trait MacroSource {
    /// Load the macros of `instrument` on a note-on.
    fn init(&mut self, channel: usize, instrument: &Instrument);

    /// Step the channel's macros.
    fn next(&mut self, channel: usize) -> MacroTick;

    /// True if the channel's instrument defines this macro.
    fn has(&self, channel: usize, kind: MacroKind) -> bool;

    /// Enter the release phase.
    fn release(&mut self, _channel: usize) {}

    /// Mask or unmask one macro.
    fn set_masked(&mut self, _channel: usize, _id: u32, _masked: bool) {}

    /// Restart one macro.
    fn restart(&mut self, _channel: usize, _id: u32) {}

    /// Forget any state tied to a deleted instrument.
    fn notify_instrument_deletion(&mut self, _instrument: usize) {}
}

/// Source that never produces macro values.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoMacros;

impl MacroSource for NoMacros {
    fn init(&mut self, _channel: usize, _instrument: &Instrument) {}

    fn next(&mut self, _channel: usize) -> MacroTick {
        MacroTick::default()
    }

    fn has(&self, _channel: usize, _kind: MacroKind) -> bool {
        false
    }
}

// ============================================================================
// Host bundle
// ============================================================================

/// Collaborators borrowed for one dispatcher call.
pub struct Host<'a> {
    /// Instrument lookup.
    pub instruments: &'a dyn InstrumentStore,
    /// Sample lookup.
    pub samples: &'a dyn SampleStore,
    /// Macro interpreter.
    pub macros: &'a mut dyn MacroSource,
}

impl<'a> Host<'a> {
    /// Bundle the collaborators.
    pub fn new(
        instruments: &'a dyn InstrumentStore,
        samples: &'a dyn SampleStore,
        macros: &'a mut dyn MacroSource,
    ) -> Self {
        Self {
            instruments,
            samples,
            macros,
        }
    }

    /// Instrument at a channel's instrument index, or the fallback.
    pub fn instrument(&self, index: i32) -> &'a Instrument {
        let store = self.instruments;
        match usize::try_from(index).ok().and_then(|idx| store.instrument(idx)) {
            Some(ins) => ins,
            None => {
                log::debug!("instrument {index} not found, using the default patch");
                &crate::instrument::FALLBACK_INSTRUMENT
            }
        }
    }

    /// Sample at `index`, if any.
    pub fn sample(&self, index: i32) -> Option<&'a Sample> {
        let store = self.samples;
        usize::try_from(index).ok().and_then(|idx| store.sample(idx))
    }
}
