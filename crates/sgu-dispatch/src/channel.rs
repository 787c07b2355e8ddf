//! Per-channel state.
//!
//! A [`Channel`] owns every value the dispatcher writes for one voice. It is
//! created at reset and only ever replaced wholesale by the next reset.

use sgu_common::registers::{ChannelRegister, Flags0, Flags1};
use sgu_common::{OPERATOR_REGISTERS, OPERATORS_PER_CHANNEL};

use crate::operator::{OperatorBank, RING_PARTNER};

/// Power-on duty register value.
pub const DEFAULT_DUTY: u8 = 63;

/// Power-on cutoff (filter fully open).
pub const DEFAULT_CUTOFF: i32 = 0xFFFF;

/// Hardware sweep unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SweepTarget {
    /// Frequency sweep.
    Frequency,
    /// Volume sweep.
    Volume,
    /// Cutoff sweep.
    Cutoff,
}

impl SweepTarget {
    /// All sweep units, in command index order.
    pub const ALL: [SweepTarget; 3] = [SweepTarget::Frequency, SweepTarget::Volume, SweepTarget::Cutoff];

    /// Sweep unit for a command index (0 frequency, 1 volume, 2 cutoff).
    pub fn from_index(index: i32) -> Option<Self> {
        match index {
            0 => Some(SweepTarget::Frequency),
            1 => Some(SweepTarget::Volume),
            2 => Some(SweepTarget::Cutoff),
            _ => None,
        }
    }

    fn slot(self) -> usize {
        self as usize
    }

    /// Period registers (low, high).
    pub fn period_registers(self) -> (ChannelRegister, ChannelRegister) {
        match self {
            SweepTarget::Frequency => (
                ChannelRegister::FreqSweepPeriodLo,
                ChannelRegister::FreqSweepPeriodHi,
            ),
            SweepTarget::Volume => (
                ChannelRegister::VolSweepPeriodLo,
                ChannelRegister::VolSweepPeriodHi,
            ),
            SweepTarget::Cutoff => (
                ChannelRegister::CutSweepPeriodLo,
                ChannelRegister::CutSweepPeriodHi,
            ),
        }
    }

    /// Amount register.
    pub fn amount_register(self) -> ChannelRegister {
        match self {
            SweepTarget::Frequency => ChannelRegister::FreqSweepAmount,
            SweepTarget::Volume => ChannelRegister::VolSweepAmount,
            SweepTarget::Cutoff => ChannelRegister::CutSweepAmount,
        }
    }

    /// Bound register.
    pub fn bound_register(self) -> ChannelRegister {
        match self {
            SweepTarget::Frequency => ChannelRegister::FreqSweepBound,
            SweepTarget::Volume => ChannelRegister::VolSweepBound,
            SweepTarget::Cutoff => ChannelRegister::CutSweepBound,
        }
    }

    /// Enable bit in the upper control register.
    pub fn enable_flag(self) -> Flags1 {
        match self {
            SweepTarget::Frequency => Flags1::FREQ_SWEEP,
            SweepTarget::Volume => Flags1::VOL_SWEEP,
            SweepTarget::Cutoff => Flags1::CUT_SWEEP,
        }
    }
}

/// One sweep unit's settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Sweep {
    /// Running.
    pub enabled: bool,
    /// Ticks between steps.
    pub period: u16,
    /// Step amount and direction bits.
    pub amount: u8,
    /// Stop value.
    pub bound: u8,
}

/// State of one hardware voice.
#[derive(Debug, Clone, PartialEq)]
pub struct Channel {
    /// Instrument index; negative when unset.
    pub ins: i32,
    /// A note is playing.
    pub active: bool,
    /// Gate state as last written.
    pub key: bool,
    /// Key-on edge pending.
    pub key_on: bool,
    /// Key-off edge pending.
    pub key_off: bool,
    /// Envelope release requested.
    pub released: bool,
    /// Instrument changed since the last commit.
    pub ins_changed: bool,
    /// Portamento in progress; arpeggio leaves the base frequency alone.
    pub in_porta: bool,
    /// Portamento paused by the sequencer.
    pub porta_pause: bool,

    /// Current note.
    pub note: i32,
    /// Base frequency (register units, or linear steps).
    pub base_freq: i32,
    /// Coarse pitch offset.
    pub pitch: i32,
    /// Fine pitch offset from the pitch macro.
    pub pitch2: i32,
    /// Last computed register frequency.
    pub freq: i32,
    /// Frequency needs recomputing.
    pub freq_changed: bool,

    /// Channel volume (0-127).
    pub vol: i32,
    /// Volume as written to the chip.
    pub out_vol: i32,
    /// Signed pan.
    pub pan: i8,

    /// Operator parameters.
    pub bank: OperatorBank,
    /// Operators ring-modulated by their partner.
    pub ring_mask: u8,
    /// Operators hard-synced to their partner.
    pub sync_mask: u8,

    /// Filter cutoff (16 bits).
    pub cutoff: i32,
    /// Cutoff the filter macro scales from.
    pub base_cutoff: i32,
    /// Resonance register value.
    pub res: u8,
    /// Filter mode bits.
    pub control: u8,
    /// Duty register value.
    pub duty: u8,
    /// Pulse width at 12-bit precision.
    pub virtual_duty: i32,
    /// Per-tick pulse width change (subtracted).
    pub pw_slide: i32,
    /// Per-tick cutoff change, in 1/16 cutoff units.
    pub cutoff_slide: i32,

    /// Channel plays PCM.
    pub pcm: bool,
    /// PCM loops.
    pub pcm_loop: bool,
    /// Sample index; negative when unset.
    pub sample: i32,
    /// Pending start offset within the sample.
    pub has_offset: i32,
    /// Note the sample was triggered with.
    pub sample_note: Option<i32>,
    /// Difference between the mapped and the played note.
    pub sample_note_delta: i32,

    /// One-shot oscillator phase reset.
    pub phase_reset: bool,
    /// One-shot filter reset.
    pub filter_phase_reset: bool,
    /// Sync timer drives phase resets.
    pub timer_sync: bool,
    /// Sync timer period.
    pub sync_timer: u16,
    sweeps: [Sweep; 3],
}

impl Default for Channel {
    fn default() -> Self {
        Self {
            ins: -1,
            active: false,
            key: false,
            key_on: false,
            key_off: false,
            released: false,
            ins_changed: true,
            in_porta: false,
            porta_pause: false,
            note: 0,
            base_freq: 0,
            pitch: 0,
            pitch2: 0,
            freq: 0,
            freq_changed: false,
            vol: 127,
            out_vol: 127,
            pan: 0,
            bank: OperatorBank::default(),
            ring_mask: 0,
            sync_mask: 0,
            cutoff: DEFAULT_CUTOFF,
            base_cutoff: DEFAULT_CUTOFF,
            res: 0,
            control: 0,
            duty: DEFAULT_DUTY,
            virtual_duty: 0,
            pw_slide: 0,
            cutoff_slide: 0,
            pcm: false,
            pcm_loop: false,
            sample: -1,
            has_offset: 0,
            sample_note: None,
            sample_note_delta: 0,
            phase_reset: false,
            filter_phase_reset: false,
            timer_sync: false,
            sync_timer: 0,
            sweeps: [Sweep::default(); 3],
        }
    }
}

impl Channel {
    /// Sweep unit state.
    pub fn sweep(&self, target: SweepTarget) -> &Sweep {
        &self.sweeps[target.slot()]
    }

    /// Mutable sweep unit state.
    pub fn sweep_mut(&mut self, target: SweepTarget) -> &mut Sweep {
        &mut self.sweeps[target.slot()]
    }

    /// Lower control register value.
    pub fn flags0(&self) -> Flags0 {
        Flags0::compose(self.key, self.pcm, self.control)
    }

    /// Upper control register value.
    pub fn flags1(&self) -> Flags1 {
        let mut flags = Flags1::empty();
        flags.set(Flags1::PHASE_RESET, self.phase_reset);
        flags.set(Flags1::FILTER_PHASE_RESET, self.filter_phase_reset);
        flags.set(Flags1::PCM_LOOP, self.pcm_loop);
        flags.set(Flags1::TIMER_SYNC, self.timer_sync);
        for target in SweepTarget::ALL {
            flags.set(target.enable_flag(), self.sweep(target).enabled);
        }
        flags
    }

    /// Encoded registers of operator `op`.
    pub fn operator_registers(&self, op: usize) -> [u8; OPERATOR_REGISTERS] {
        let ring = (self.ring_mask >> op) & 1 != 0;
        let sync = (self.sync_mask >> op) & 1 != 0;
        self.bank.ops[op].registers(ring, sync)
    }

    /// Operators with ring or sync enabled, with the partner they follow.
    pub fn ring_sync_links(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        (0..OPERATORS_PER_CHANNEL)
            .filter(|&o| ((self.ring_mask | self.sync_mask) >> o) & 1 != 0)
            .map(|o| (o, RING_PARTNER[o]))
    }

    /// Cutoff as a register value.
    pub fn cutoff_register(&self) -> u16 {
        self.cutoff.clamp(0, 0xFFFF) as u16
    }
}
