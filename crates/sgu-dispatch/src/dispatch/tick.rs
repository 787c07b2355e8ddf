//! Per-tick channel update.
//!
//! Each tick steps the macros of every channel, writes whatever they changed,
//! then resolves gate edges and frequency. Key-off lands before the new
//! frequency, key-on after it.

use sgu_common::registers::ChannelRegister;
use sgu_common::{CHANNEL_COUNT, OPERATORS_PER_CHANNEL, SguBackend};

use super::SguDispatch;
use crate::host::{Host, MacroTick, OperatorMacros};
use crate::instrument::ModelKind;
use crate::operator::Operator;
use crate::pitch::clamp_frequency;
use crate::translate::{opll_carrier_level, widen_level, widen_rate};
use crate::volume::VolumeModel;

const MAX_VIRTUAL_DUTY: i32 = 0xFFF;
const MAX_CUTOFF: i32 = 0xFFFF;
const EX1_RANGE: i64 = 0x3FFF;
const OPLL_SUSTAINED: u8 = 0x08;

impl<B: SguBackend> SguDispatch<B> {
    /// Advance every channel by one sequencer tick.
    ///
    /// `sys_tick` marks engine ticks (as opposed to extra sub-ticks) and
    /// gates the pulse width and cutoff slides.
    pub fn tick(&mut self, host: &mut Host<'_>, sys_tick: bool) {
        for ch in 0..CHANNEL_COUNT {
            let macros = host.macros.next(ch);
            let ins = host.instrument(self.channels[ch].ins);
            let kind = ins.kind();

            if sys_tick {
                self.apply_slides(ch);
            }
            self.apply_channel_macros(ch, kind, &macros);
            self.apply_operator_macros(ch, kind, &macros);

            let chan = &self.channels[ch];
            if chan.freq_changed || chan.key_on || chan.key_off {
                self.update_frequency(ch, host);
            }
        }
    }

    fn apply_slides(&mut self, ch: usize) {
        let chan = &mut self.channels[ch];
        if chan.pw_slide != 0 {
            chan.virtual_duty = chan
                .virtual_duty
                .saturating_sub(chan.pw_slide)
                .clamp(0, MAX_VIRTUAL_DUTY);
            chan.duty = (chan.virtual_duty >> 5) as u8;
            self.write_duty(ch);
        }

        let chan = &mut self.channels[ch];
        if chan.cutoff_slide != 0 {
            chan.cutoff = chan
                .cutoff
                .saturating_add(chan.cutoff_slide.saturating_mul(16))
                .clamp(0, MAX_CUTOFF);
            self.write_cutoff(ch);
        }
    }

    fn apply_channel_macros(&mut self, ch: usize, kind: ModelKind, m: &MacroTick) {
        let compat = self.config.compat;

        if let Some(v) = m.vol {
            let chan = &mut self.channels[ch];
            chan.out_vol = VolumeModel::for_kind(kind).scale(chan.vol, v, &compat);
            self.write_volume(ch);
        }

        if let Some(arp) = m.arp {
            let chan = &self.channels[ch];
            if !chan.in_porta {
                let base = self.pitch.note_frequency(arp.apply(chan.note));
                self.channels[ch].base_freq = base;
            }
            self.channels[ch].freq_changed = true;
        }

        if let Some(v) = m.duty {
            let chan = &mut self.channels[ch];
            chan.duty = (v & 127) as u8;
            chan.virtual_duty = i32::from(chan.duty) << 5;
            self.write_duty(ch);
        }

        if let Some(v) = m.wave {
            self.channels[ch].bank.ops[OPERATORS_PER_CHANNEL - 1].ws = (v & 7) as u8;
            self.apply_op_regs(ch, OPERATORS_PER_CHANNEL - 1);
        }

        if let Some(v) = m.phase_reset {
            let chan = &mut self.channels[ch];
            chan.phase_reset = v != 0;
            chan.filter_phase_reset = v & 2 != 0;
            self.write_control_upper(ch);
        }

        if let Some(v) = m.pan {
            self.channels[ch].pan = v.clamp(-128, 127) as i8;
            self.write_pan(ch);
        }

        if let Some(p) = m.pitch {
            let chan = &mut self.channels[ch];
            chan.pitch2 = if p.relative {
                chan.pitch2
                    .saturating_add(p.value)
                    .clamp(i32::from(i16::MIN), i32::from(i16::MAX))
            } else {
                p.value
            };
            chan.freq_changed = true;
        }

        if let Some(v) = m.ex1 {
            let chan = &mut self.channels[ch];
            let scaled = i64::from(v & 0x3FFF) * i64::from(chan.base_cutoff) / EX1_RANGE;
            chan.cutoff = scaled.clamp(0, i64::from(MAX_CUTOFF)) as i32;
            self.write_cutoff(ch);
        }

        if let Some(v) = m.ex2 {
            self.channels[ch].res = v as u8;
            self.write_resonance(ch);
        }

        if let Some(v) = m.ex3 {
            self.channels[ch].control = (v & 15) as u8;
            self.write_control(ch);
        }

        if let Some(v) = m.ex4 {
            self.channels[ch].sync_timer = (v & 0xFFFF) as u16;
            self.write_sync_timer(ch);
        }

        if let Some(v) = m.fb {
            self.channels[ch].bank.ops[0].mod_in = (v & 7) as u8;
            self.apply_op_regs(ch, 0);
        }

        if kind == ModelKind::Opll && (m.fms.is_some() || m.ams.is_some()) {
            let bank = &mut self.channels[ch].bank;
            if let Some(v) = m.fms {
                bank.fms = (v & 1) as u8;
                for op in &mut bank.ops[..2] {
                    op.dvb = v & 1 != 0;
                }
            }
            if let Some(v) = m.ams {
                bank.ams = (v & 1) as u8;
                for op in &mut bank.ops[..2] {
                    op.dam = v & 1 != 0;
                }
            }
            self.apply_op_regs(ch, 0);
            self.apply_op_regs(ch, 1);
        }
    }

    fn apply_operator_macros(&mut self, ch: usize, kind: ModelKind, m: &MacroTick) {
        let opll = kind == ModelKind::Opll;
        for (o, om) in m.ops.iter().enumerate() {
            if !om.any() {
                continue;
            }
            let op = &mut self.channels[ch].bank.ops[o];
            if step_operator(op, o, om, opll) {
                self.apply_op_regs(ch, o);
            }
        }
    }

    /// Resolve gate edges and write the frequency.
    fn update_frequency(&mut self, ch: usize, host: &Host<'_>) {
        let chan = &mut self.channels[ch];
        if chan.key_on || chan.key_off {
            chan.key = false;
            let silence = chan.key_off && chan.pcm;
            chan.key_off = false;
            self.write_control(ch);
            if silence {
                self.ch_write(ch, ChannelRegister::Volume, 0);
            }
        }

        let chan = &self.channels[ch];
        let mut freq = self.pitch.calc_freq(chan.base_freq, chan.pitch, chan.pitch2);
        if chan.pcm {
            if let Some(sample) = host.sample(chan.sample) {
                let factor = if sample.center_rate < 1 {
                    0.25
                } else {
                    f64::from(sample.center_rate) / (host.samples.center_rate() * 4.0)
                };
                freq = (f64::from(freq) * factor) as i32;
            }
        }
        let freq = clamp_frequency(freq);
        self.channels[ch].freq = i32::from(freq);
        self.ch_write16(
            ch,
            ChannelRegister::FreqLo,
            ChannelRegister::FreqHi,
            u32::from(freq),
        );

        if self.channels[ch].key_on {
            let playable = !self.channels[ch].pcm || self.start_pcm(ch, host);
            if playable {
                self.channels[ch].key = true;
                self.write_control(ch);
            } else {
                self.ch_write(ch, ChannelRegister::Volume, 0);
            }
        }

        let chan = &mut self.channels[ch];
        chan.key_on = false;
        chan.freq_changed = false;
    }

    /// Point the PCM reader at the channel's sample.
    ///
    /// Returns false, writing nothing, if the sample has no bytes in RAM.
    fn start_pcm(&mut self, ch: usize, host: &Host<'_>) -> bool {
        let index = self.channels[ch].sample;
        let (Some(sample), Some(table)) = (host.sample(index), self.memory.offset(index)) else {
            self.channels[ch].has_offset = 0;
            return false;
        };
        let last = self.memory.capacity().saturating_sub(1);

        let chan = &mut self.channels[ch];
        let offset = usize::try_from(chan.has_offset).unwrap_or(0);
        chan.has_offset = 0;
        let start = (table + offset).min(last);
        let end = (table + sample.loop_end_position()).min(last);

        self.ch_write16(ch, ChannelRegister::PcmPosLo, ChannelRegister::PcmPosHi, start as u32);
        self.ch_write16(ch, ChannelRegister::PcmEndLo, ChannelRegister::PcmEndHi, end as u32);

        if sample.is_loopable() {
            let restart = (table + sample.loop_start_position()).min(last);
            self.ch_write16(
                ch,
                ChannelRegister::PcmRestartLo,
                ChannelRegister::PcmRestartHi,
                restart as u32,
            );
            self.channels[ch].pcm_loop = true;
        } else {
            self.channels[ch].pcm_loop = false;
        }
        self.write_control_upper(ch);
        true
    }
}

/// Apply one operator's macro values. Returns true if anything changed.
fn step_operator(op: &mut Operator, index: usize, m: &OperatorMacros, opll: bool) -> bool {
    let mut dirty = false;
    let byte = |v: i32| v as u8;

    if let Some(v) = m.am {
        op.am = v != 0;
        dirty = true;
    }
    if let Some(v) = m.vib {
        op.vib = v != 0;
        dirty = true;
    }
    if let Some(v) = m.mult {
        op.mult = byte(v) & 15;
        dirty = true;
    }
    if let Some(v) = m.tl {
        op.tl = match (opll, index) {
            (true, 0) => widen_level(byte(v)),
            (true, _) => opll_carrier_level(byte(v)),
            (false, _) => byte(v) & 127,
        };
        dirty = true;
    }
    if let Some(v) = m.ar {
        op.ar = if opll { widen_rate(byte(v)) } else { byte(v) & 31 };
        dirty = true;
    }
    if let Some(v) = m.dr {
        op.dr = if opll { widen_rate(byte(v)) } else { byte(v) & 31 };
        dirty = true;
    }
    if let Some(v) = m.sl {
        op.sl = byte(v) & 15;
        dirty = true;
    }
    if let Some(v) = m.rr {
        op.rr = byte(v) & 15;
        if opll {
            op.d2r = opll_sustain_rate(op);
        }
        dirty = true;
    }
    if !opll {
        if let Some(v) = m.d2r {
            op.d2r = byte(v) & 31;
            dirty = true;
        }
        if let Some(v) = m.dt {
            op.dt = byte(v) & 7;
            dirty = true;
        }
    }
    if let Some(v) = m.rs {
        op.rs = byte(v) & 3;
        dirty = true;
    } else if let Some(v) = m.ksr {
        op.rs = byte(v) & 1;
        op.ksr = v & 1 != 0;
        dirty = true;
    }
    if let Some(v) = m.ksl {
        op.ksl = byte(v) & 3;
        dirty = true;
    }
    if let Some(v) = m.dam {
        op.dam = v != 0;
        dirty = true;
    }
    if let Some(v) = m.dvb {
        op.dvb = v != 0;
        dirty = true;
    }
    if !opll {
        if let Some(v) = m.ws {
            op.ws = byte(v) & 7;
            dirty = true;
        }
        if let Some(v) = m.delay {
            op.delay = byte(v) & 7;
            dirty = true;
        }
    }
    if let Some(v) = m.egt {
        if opll {
            op.egt = v != 0;
            if op.egt {
                op.ssg_env |= OPLL_SUSTAINED;
            } else {
                op.ssg_env &= !OPLL_SUSTAINED;
            }
            op.d2r = opll_sustain_rate(op);
        } else {
            op.out_lvl = byte(v) & 7;
        }
        dirty = true;
    }
    if !opll {
        if let Some(v) = m.mod_in {
            op.mod_in = byte(v) & 7;
            dirty = true;
        }
    }

    dirty
}

/// Sustained OPLL envelopes hold; percussive ones decay at the release rate.
fn opll_sustain_rate(op: &Operator) -> u8 {
    if op.ssg_env & OPLL_SUSTAINED != 0 {
        0
    } else {
        widen_rate(op.rr)
    }
}
