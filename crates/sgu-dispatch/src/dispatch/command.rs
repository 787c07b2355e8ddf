//! Sequencer command handling.

use std::ops::Range;

use sgu_common::{CHANNEL_COUNT, OPERATORS_PER_CHANNEL, SguBackend};

use super::SguDispatch;
use crate::channel::SweepTarget;
use crate::host::{Host, MacroKind};
use crate::instrument::Patch;
use crate::operator::Operator;
use crate::pan;
use crate::volume::VolumeModel;

/// Operators a command applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatorTarget {
    /// Every operator.
    All,
    /// One operator; indices past the last operator do nothing.
    One(usize),
}

impl OperatorTarget {
    /// Target from a sequencer operand: negative means all operators.
    pub fn from_index(index: i32) -> Self {
        usize::try_from(index).map_or(OperatorTarget::All, OperatorTarget::One)
    }

    fn range(self) -> Range<usize> {
        match self {
            OperatorTarget::All => 0..OPERATORS_PER_CHANNEL,
            OperatorTarget::One(op) if op < OPERATORS_PER_CHANNEL => op..op + 1,
            OperatorTarget::One(_) => 0..0,
        }
    }
}

/// Per-operator parameter set by [`Command::Fm`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FmParam {
    /// Tremolo enable (1 bit).
    Am,
    /// Vibrato enable (1 bit).
    Vib,
    /// Attack rate (5 bits).
    Ar,
    /// Decay rate (5 bits).
    Dr,
    /// Sustain level (4 bits).
    Sl,
    /// Second decay rate (5 bits).
    D2r,
    /// Release rate (4 bits).
    Rr,
    /// Detune (3 bits).
    Dt,
    /// Envelope delay (3 bits).
    Delay,
    /// Rate scaling (2 bits).
    Rs,
    /// 1-bit key-scale rate, stored as rate scaling.
    Ksr,
    /// Legacy sustain flag; kept in state, not sent.
    Sus,
    /// Waveform (3 bits).
    Ws,
    /// Modulation input level (3 bits).
    ModInput,
    /// Total level (7 bits).
    Tl,
    /// Multiplier (4 bits).
    Mult,
    /// Deep tremolo.
    AmDepth,
    /// Deep vibrato.
    PmDepth,
    /// Fixed-frequency mode.
    FixedFreq,
    /// Output level (3 bits).
    OutLevel,
}

impl FmParam {
    fn apply(self, op: &mut Operator, value: i32) {
        let v = value as u8;
        match self {
            FmParam::Am => op.am = v & 1 != 0,
            FmParam::Vib => op.vib = v & 1 != 0,
            FmParam::Ar => op.ar = v & 31,
            FmParam::Dr => op.dr = v & 31,
            FmParam::Sl => op.sl = v & 15,
            FmParam::D2r => op.d2r = v & 31,
            FmParam::Rr => op.rr = v & 15,
            FmParam::Dt => op.dt = v & 7,
            FmParam::Delay => op.delay = v & 7,
            FmParam::Rs => op.rs = v & 3,
            FmParam::Ksr => {
                op.rs = v & 1;
                op.ksr = v & 1 != 0;
            }
            FmParam::Sus => op.sus = v & 1 != 0,
            FmParam::Ws => op.ws = v & 7,
            FmParam::ModInput => op.mod_in = v & 7,
            FmParam::Tl => op.tl = v & 127,
            FmParam::Mult => op.mult = v & 15,
            FmParam::AmDepth => op.dam = v & 1 != 0,
            FmParam::PmDepth => op.dvb = v & 1 != 0,
            FmParam::FixedFreq => op.fixed = value > 0,
            FmParam::OutLevel => op.out_lvl = v & 7,
        }
    }

    /// Parameters that live only in dispatcher state.
    fn is_register_backed(self) -> bool {
        self != FmParam::Sus
    }
}

/// Command issued by the sequencer to one channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Start a note; `None` retriggers without changing pitch.
    NoteOn {
        /// Note index (57 is A-4).
        note: Option<i32>,
    },
    /// Gate off.
    NoteOff,
    /// Gate off and release the macros.
    NoteOffEnv,
    /// Release the macros without gating off.
    EnvRelease,
    /// Select an instrument.
    Instrument {
        /// Instrument index.
        index: i32,
        /// Re-commit even if the index did not change.
        force: bool,
    },
    /// Channel volume (0-127).
    Volume(i32),
    /// Query the current volume.
    GetVolume,
    /// Coarse pitch offset.
    Pitch(i32),
    /// Carrier waveform.
    Wave(i32),
    /// Duty (noise mode for noise waveforms).
    Duty(i32),
    /// Filter resonance.
    Resonance(i32),
    /// Filter mode bits.
    FilterMode(i32),
    /// Sweep period, low byte.
    SweepPeriodLow {
        /// Sweep unit (0 frequency, 1 volume, 2 cutoff).
        target: i32,
        /// Byte value.
        value: i32,
    },
    /// Sweep period, high byte.
    SweepPeriodHigh {
        /// Sweep unit.
        target: i32,
        /// Byte value.
        value: i32,
    },
    /// Sweep bound.
    SweepBound {
        /// Sweep unit.
        target: i32,
        /// Bound.
        value: i32,
    },
    /// Sweep amount; non-zero enables the unit.
    SweepEnable {
        /// Sweep unit.
        target: i32,
        /// Amount.
        value: i32,
    },
    /// Sync timer period, low byte.
    SyncPeriodLow(i32),
    /// Sync timer period, high byte.
    SyncPeriodHigh(i32),
    /// 12-bit base cutoff.
    FineCutoff(i32),
    /// Slide toward a note.
    NotePorta {
        /// Step per tick.
        speed: i32,
        /// Destination note.
        target: i32,
    },
    /// Pan from split levels.
    Panning {
        /// Left level.
        left: u8,
        /// Right level.
        right: u8,
    },
    /// Start the next sample at this offset.
    SamplePos(i32),
    /// Change note without retriggering.
    Legato(i32),
    /// Portamento about to start or stop.
    PrePorta {
        /// Portamento active.
        active: bool,
        /// Portamento paused.
        pause: bool,
    },
    /// Per-tick pulse width change.
    PulseWidthSlide(i32),
    /// Per-tick cutoff change.
    CutoffSlide(i32),
    /// Set an operator parameter.
    Fm {
        /// Parameter.
        param: FmParam,
        /// Operators affected.
        target: OperatorTarget,
        /// Value, masked to the parameter width.
        value: i32,
    },
    /// Operator 0 feedback.
    Feedback(i32),
    /// Ring (high nibble 4) or sync (high nibble 5) operator mask.
    Extended(i32),
    /// Mask a macro.
    MacroOff(u32),
    /// Unmask a macro.
    MacroOn(u32),
    /// Restart a macro.
    MacroRestart(u32),
}

/// Result of a dispatched command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Command applied.
    Handled,
    /// Portamento reached its target.
    PortaReached,
    /// Answer to [`Command::GetVolume`].
    Volume(i32),
    /// Channel out of range; nothing happened.
    Ignored,
}

impl<B: SguBackend> SguDispatch<B> {
    /// Apply a sequencer command to channel `ch`.
    pub fn dispatch(&mut self, ch: usize, cmd: Command, host: &mut Host<'_>) -> DispatchOutcome {
        if ch >= CHANNEL_COUNT {
            return DispatchOutcome::Ignored;
        }

        match cmd {
            Command::NoteOn { note } => self.note_on(ch, note, host),
            Command::NoteOff => {
                let chan = &mut self.channels[ch];
                chan.key = false;
                chan.key_off = true;
                chan.key_on = false;
            }
            Command::NoteOffEnv => {
                let chan = &mut self.channels[ch];
                chan.key = false;
                chan.key_off = true;
                chan.key_on = false;
                host.macros.release(ch);
            }
            Command::EnvRelease => {
                host.macros.release(ch);
                self.channels[ch].released = true;
            }
            Command::Instrument { index, force } => {
                let chan = &mut self.channels[ch];
                if chan.ins != index || force {
                    chan.ins_changed = true;
                }
                chan.ins = index;
            }
            Command::Volume(vol) => {
                if self.channels[ch].vol != vol {
                    self.channels[ch].vol = vol;
                    if !host.macros.has(ch, MacroKind::Volume) {
                        let kind = host.instrument(self.channels[ch].ins).kind();
                        let model = VolumeModel::for_kind(kind);
                        self.channels[ch].out_vol = model.unscaled(vol, &self.config.compat);
                        self.write_volume(ch);
                    }
                }
            }
            Command::GetVolume => {
                let chan = &self.channels[ch];
                let vol = if host.macros.has(ch, MacroKind::Volume) {
                    chan.vol
                } else {
                    chan.out_vol
                };
                return DispatchOutcome::Volume(vol);
            }
            Command::Pitch(pitch) => {
                let chan = &mut self.channels[ch];
                chan.pitch = pitch;
                chan.freq_changed = true;
            }
            Command::Wave(wave) => {
                self.channels[ch].bank.ops[OPERATORS_PER_CHANNEL - 1].ws = (wave & 7) as u8;
                self.apply_op_regs(ch, OPERATORS_PER_CHANNEL - 1);
            }
            Command::Duty(duty) => {
                let chan = &mut self.channels[ch];
                chan.duty = (duty & 127) as u8;
                chan.virtual_duty = i32::from(chan.duty) << 5;
                self.write_duty(ch);
            }
            Command::Resonance(res) => {
                self.channels[ch].res = res as u8;
                self.write_resonance(ch);
            }
            Command::FilterMode(mode) => {
                self.channels[ch].control = (mode & 15) as u8;
                self.write_control(ch);
            }
            Command::SweepPeriodLow { target, value } => {
                if let Some(target) = SweepTarget::from_index(target) {
                    let sweep = self.channels[ch].sweep_mut(target);
                    sweep.period = (sweep.period & 0xFF00) | (value & 0xFF) as u16;
                    self.ch_write(ch, target.period_registers().0, value as u8);
                }
            }
            Command::SweepPeriodHigh { target, value } => {
                if let Some(target) = SweepTarget::from_index(target) {
                    let sweep = self.channels[ch].sweep_mut(target);
                    sweep.period = (sweep.period & 0x00FF) | (((value & 0xFF) as u16) << 8);
                    self.ch_write(ch, target.period_registers().1, value as u8);
                }
            }
            Command::SweepBound { target, value } => {
                if let Some(target) = SweepTarget::from_index(target) {
                    self.channels[ch].sweep_mut(target).bound = value as u8;
                    self.ch_write(ch, target.bound_register(), value as u8);
                }
            }
            Command::SweepEnable { target, value } => {
                if let Some(target) = SweepTarget::from_index(target) {
                    let sweep = self.channels[ch].sweep_mut(target);
                    sweep.amount = value as u8;
                    sweep.enabled = value > 0;
                    self.ch_write(ch, target.amount_register(), value as u8);
                }
                self.write_control_upper(ch);
            }
            Command::SyncPeriodLow(value) => {
                let chan = &mut self.channels[ch];
                chan.sync_timer = (chan.sync_timer & 0xFF00) | (value & 0xFF) as u16;
                self.write_sync_timer(ch);
            }
            Command::SyncPeriodHigh(value) => {
                let chan = &mut self.channels[ch];
                chan.sync_timer = (chan.sync_timer & 0x00FF) | (((value & 0xFF) as u16) << 8);
                self.write_sync_timer(ch);
            }
            Command::FineCutoff(value) => {
                let chan = &mut self.channels[ch];
                chan.base_cutoff = (value & 0xFFF) << 4;
                if !host.macros.has(ch, MacroKind::Ex1) {
                    chan.cutoff = chan.base_cutoff;
                    self.write_cutoff(ch);
                }
            }
            Command::NotePorta { speed, target } => {
                let chan = &self.channels[ch];
                let dest = self.pitch.note_frequency(target.saturating_add(chan.sample_note_delta));
                let step = self.pitch.porta_step(chan.base_freq, speed);
                let chan = &mut self.channels[ch];
                let reached = if dest > chan.base_freq {
                    chan.base_freq = chan.base_freq.saturating_add(step);
                    chan.base_freq >= dest
                } else {
                    chan.base_freq = chan.base_freq.saturating_sub(step);
                    chan.base_freq <= dest
                };
                chan.freq_changed = true;
                if reached {
                    chan.base_freq = dest;
                    chan.in_porta = false;
                    return DispatchOutcome::PortaReached;
                }
            }
            Command::Panning { left, right } => {
                self.channels[ch].pan = (pan::split_to_linear(left, right, 254) - 127) as i8;
                self.write_pan(ch);
            }
            Command::SamplePos(pos) => {
                let chan = &mut self.channels[ch];
                chan.has_offset = pos;
                chan.key_on = true;
            }
            Command::Legato(note) => {
                let base = self
                    .pitch
                    .note_frequency(note.saturating_add(self.channels[ch].sample_note_delta));
                let chan = &mut self.channels[ch];
                chan.base_freq = base;
                chan.freq_changed = true;
                chan.note = note;
            }
            Command::PrePorta { active, pause } => {
                let chan = &mut self.channels[ch];
                chan.in_porta = chan.active && !chan.key_off && active;
                chan.porta_pause = pause;
            }
            Command::PulseWidthSlide(slide) => self.channels[ch].pw_slide = slide,
            Command::CutoffSlide(slide) => self.channels[ch].cutoff_slide = slide,
            Command::Fm {
                param,
                target,
                value,
            } => {
                for op in target.range() {
                    param.apply(&mut self.channels[ch].bank.ops[op], value);
                    if param.is_register_backed() {
                        self.apply_op_regs(ch, op);
                    }
                }
            }
            Command::Feedback(fb) => {
                self.channels[ch].bank.ops[0].mod_in = (fb & 7) as u8;
                self.apply_op_regs(ch, 0);
            }
            Command::Extended(value) => {
                let mask = (value & 15) as u8;
                match value >> 4 {
                    4 => self.channels[ch].ring_mask = mask,
                    5 => self.channels[ch].sync_mask = mask,
                    _ => return DispatchOutcome::Handled,
                }
                for op in 0..OPERATORS_PER_CHANNEL {
                    self.apply_op_regs(ch, op);
                }
            }
            Command::MacroOff(id) => host.macros.set_masked(ch, id, true),
            Command::MacroOn(id) => host.macros.set_masked(ch, id, false),
            Command::MacroRestart(id) => host.macros.restart(ch, id),
        }

        DispatchOutcome::Handled
    }

    /// Forward an instrument deletion to the macro source.
    pub fn notify_ins_deletion(&mut self, ins: usize, host: &mut Host<'_>) {
        host.macros.notify_instrument_deletion(ins);
    }

    fn note_on(&mut self, ch: usize, note: Option<i32>, host: &mut Host<'_>) {
        let ins = host.instrument(self.channels[ch].ins);
        self.channels[ch].key = true;
        host.macros.init(ch, ins);
        if !host.macros.has(ch, MacroKind::Volume) {
            let chan = &mut self.channels[ch];
            chan.out_vol = VolumeModel::for_kind(ins.kind()).unscaled(chan.vol, &self.config.compat);
        }

        self.commit_state(ch, ins);
        self.channels[ch].ins_changed = false;
        self.write_volume(ch);

        let chan = &mut self.channels[ch];
        chan.pcm = ins.is_sample();

        let mut value = note;
        match (&ins.patch, note) {
            (Patch::Sample(patch), Some(n)) => {
                let mapped = patch.note_for(n);
                chan.sample = patch.sample_for(n);
                chan.sample_note = Some(n);
                chan.sample_note_delta = mapped.saturating_sub(n);
                value = Some(mapped);
            }
            _ => {
                chan.sample_note = None;
                chan.sample_note_delta = 0;
            }
        }

        if let Some(n) = value {
            chan.base_freq = self.pitch.note_frequency(n);
            chan.note = n;
            chan.freq_changed = true;
        }

        chan.active = true;
        chan.key_on = true;
        chan.key_off = false;
        chan.released = false;
        chan.ins_changed = false;
    }
}
