//! Instrument definitions, tagged by synthesis model.

use sgu_common::OPERATORS_PER_CHANNEL;

use crate::operator::Operator;

/// Number of entries in a sample note map.
pub const NOTE_MAP_SIZE: usize = 120;

/// Instrument as supplied by the song.
#[derive(Debug, Clone, PartialEq)]
pub struct Instrument {
    /// Display name.
    pub name: String,
    /// Model-specific parameters.
    pub patch: Patch,
}

/// Used when a channel references a missing instrument.
pub static FALLBACK_INSTRUMENT: Instrument = Instrument {
    name: String::new(),
    patch: Patch::Native(FmPatch::DEFAULT),
};

impl Instrument {
    /// Create a named instrument.
    pub fn new(name: impl Into<String>, patch: Patch) -> Self {
        Self {
            name: name.into(),
            patch,
        }
    }

    /// Synthesis model of this instrument.
    pub fn kind(&self) -> ModelKind {
        self.patch.kind()
    }

    /// True when the instrument plays samples rather than operators.
    pub fn is_sample(&self) -> bool {
        matches!(self.patch, Patch::Sample(_))
    }
}

impl Default for Instrument {
    fn default() -> Self {
        FALLBACK_INSTRUMENT.clone()
    }
}

/// Synthesis model discriminant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelKind {
    /// Already in the chip's own routing vocabulary.
    Native,
    /// 4-op FM, 5-bit rates (OPN family).
    Opn,
    /// 4-op FM, 5-bit rates (OPM).
    Opm,
    /// 4-op FM with fixed-frequency operators (OPZ).
    Opz,
    /// 2-op (or 4-op) FM with 4-bit rates (OPL family).
    Opl,
    /// 2-op FM with 4-bit carrier level and shared LFO (OPLL).
    Opll,
    /// Filtered subtractive voice (SID).
    C64,
    /// Filtered subtractive voice with periodic noise (SID2).
    Sid2,
    /// Sawtooth voice with instant envelope.
    SoundUnit,
    /// Pulse voice with instant envelope.
    Pokey,
    /// Raw sample playback.
    Sample,
}

/// Model-specific instrument parameters.
#[derive(Debug, Clone, PartialEq)]
pub enum Patch {
    /// Native routing: operators carry modulation input and output level.
    Native(FmPatch),
    /// OPN-style 4-op FM.
    Opn(FmPatch),
    /// OPM-style 4-op FM.
    Opm(FmPatch),
    /// OPZ-style 4-op FM; `egt` marks fixed-frequency operators.
    Opz(FmPatch),
    /// OPL-style FM.
    Opl(FmPatch),
    /// OPLL-style FM.
    Opll(FmPatch),
    /// SID voice.
    C64(SidPatch),
    /// SID2 voice.
    Sid2(SidPatch),
    /// Sound Unit voice.
    SoundUnit,
    /// POKEY voice.
    Pokey,
    /// Sample playback.
    Sample(SamplePatch),
}

impl Patch {
    /// Discriminant of this patch.
    pub fn kind(&self) -> ModelKind {
        match self {
            Patch::Native(_) => ModelKind::Native,
            Patch::Opn(_) => ModelKind::Opn,
            Patch::Opm(_) => ModelKind::Opm,
            Patch::Opz(_) => ModelKind::Opz,
            Patch::Opl(_) => ModelKind::Opl,
            Patch::Opll(_) => ModelKind::Opll,
            Patch::C64(_) => ModelKind::C64,
            Patch::Sid2(_) => ModelKind::Sid2,
            Patch::SoundUnit => ModelKind::SoundUnit,
            Patch::Pokey => ModelKind::Pokey,
            Patch::Sample(_) => ModelKind::Sample,
        }
    }
}

/// FM parameters shared by every operator-based model.
///
/// Operator fields are in the source model's own units; translation widens
/// them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FmPatch {
    /// Algorithm selector.
    pub alg: u8,
    /// Operator 0 feedback.
    pub fb: u8,
    /// Shared vibrato depth (OPLL).
    pub fms: u8,
    /// Shared tremolo depth (OPLL).
    pub ams: u8,
    /// OPL 4-op mode; ignored by other models.
    pub four_op: bool,
    /// Operator parameters.
    pub ops: [Operator; OPERATORS_PER_CHANNEL],
}

impl FmPatch {
    /// All-zero patch.
    pub const DEFAULT: FmPatch = FmPatch {
        alg: 0,
        fb: 0,
        fms: 0,
        ams: 0,
        four_op: false,
        ops: [Operator::DEFAULT; OPERATORS_PER_CHANNEL],
    };
}

impl Default for FmPatch {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// 4-bit ADSR.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Adsr {
    /// Attack.
    pub attack: u8,
    /// Decay.
    pub decay: u8,
    /// Sustain level.
    pub sustain: u8,
    /// Release.
    pub release: u8,
}

/// SID oscillator waveform selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SidWaves {
    /// Triangle.
    pub triangle: bool,
    /// Sawtooth.
    pub saw: bool,
    /// Pulse.
    pub pulse: bool,
    /// Noise.
    pub noise: bool,
}

/// SID filter settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SidFilter {
    /// Route the voice through the filter.
    pub enabled: bool,
    /// Load cutoff, resonance and mode on note-on.
    pub init: bool,
    /// 11-bit cutoff.
    pub cutoff: u16,
    /// 4-bit resonance.
    pub resonance: u8,
    /// Low-pass.
    pub low_pass: bool,
    /// High-pass.
    pub high_pass: bool,
    /// Band-pass.
    pub band_pass: bool,
}

/// Subtractive voice parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SidPatch {
    /// Amplitude envelope.
    pub envelope: Adsr,
    /// Waveform selection.
    pub waves: SidWaves,
    /// 12-bit pulse width.
    pub duty: u16,
    /// Reload the pulse width on every note.
    pub reset_duty: bool,
    /// Filter.
    pub filter: SidFilter,
    /// SID2 noise mode; non-zero selects periodic noise.
    pub noise_mode: u8,
}

/// One note map slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoteMapEntry {
    /// Note to play the sample at.
    pub note: i32,
    /// Sample index.
    pub sample: i32,
}

/// Sample playback parameters.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SamplePatch {
    /// Sample used when no note map applies.
    pub sample: i32,
    /// Optional per-note sample and pitch mapping.
    pub note_map: Option<Vec<NoteMapEntry>>,
}

impl SamplePatch {
    /// Sample played for `note`.
    pub fn sample_for(&self, note: i32) -> i32 {
        self.map_entry(note)
            .map(|entry| entry.sample)
            .unwrap_or(self.sample)
    }

    /// Pitch the sample plays at for `note`.
    pub fn note_for(&self, note: i32) -> i32 {
        self.map_entry(note).map(|entry| entry.note).unwrap_or(note)
    }

    fn map_entry(&self, note: i32) -> Option<&NoteMapEntry> {
        let map = self.note_map.as_ref()?;
        let idx = usize::try_from(note).ok()?;
        if idx >= NOTE_MAP_SIZE {
            return None;
        }
        map.get(idx)
    }
}
