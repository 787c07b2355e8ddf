use std::collections::HashMap;

use sgu_common::registers::{ChannelRegister as CR, Flags0, Flags1, OperatorRegister as OR};
use sgu_common::{CHANNEL_COUNT, REGISTER_POOL_SIZE};

use super::*;
use crate::channel::Channel;
use crate::config::CompatFlags;
use crate::host::{Arp, Host, MacroKind, MacroTick};
use crate::instrument::{Adsr, FmPatch, Instrument, Patch, SamplePatch, SidPatch, SidWaves};
use crate::samples::Sample;
use crate::testing::{RecordingBackend, ScriptedMacros, creg, last_position, oreg, position};

struct Fixture {
    instruments: Vec<Instrument>,
    samples: Vec<Sample>,
    macros: ScriptedMacros,
}

impl Fixture {
    fn new(instruments: Vec<Instrument>, samples: Vec<Sample>) -> Self {
        Self {
            instruments,
            samples,
            macros: ScriptedMacros::default(),
        }
    }

    fn host(&mut self) -> Host<'_> {
        Host::new(&self.instruments, &self.samples, &mut self.macros)
    }
}

fn dispatcher(fx: &Fixture, compat: CompatFlags) -> SguDispatch<RecordingBackend> {
    let mut d = SguDispatch::new(RecordingBackend::default());
    let config = DispatchConfig::default().compat(compat);
    assert_eq!(d.init(config, &fx.samples), Ok(CHANNEL_COUNT));
    settle(&mut d);
    d
}

/// Apply queued writes and forget them.
fn settle(d: &mut SguDispatch<RecordingBackend>) {
    d.flush();
    d.chip_mut().writes.clear();
}

fn writes(d: &mut SguDispatch<RecordingBackend>) -> Vec<RegWrite> {
    d.flush();
    std::mem::take(&mut d.chip_mut().writes)
}

fn note_on(d: &mut SguDispatch<RecordingBackend>, fx: &mut Fixture, ch: usize, ins: i32, note: i32) {
    d.dispatch(ch, Command::Instrument { index: ins, force: false }, &mut fx.host());
    d.dispatch(ch, Command::NoteOn { note: Some(note) }, &mut fx.host());
}

fn fm_instrument(alg: u8, fb: u8) -> Instrument {
    Instrument::new(
        "fm",
        Patch::Opn(FmPatch {
            alg,
            fb,
            ..FmPatch::DEFAULT
        }),
    )
}

fn sample_instrument(sample: i32) -> Instrument {
    Instrument::new(
        "pcm",
        Patch::Sample(SamplePatch {
            sample,
            note_map: None,
        }),
    )
}

fn data(len: usize) -> Vec<i8> {
    (0..len).map(|i| (i % 64) as i8).collect()
}

// ============================================================================
// End-to-end scenarios
// ============================================================================

#[test]
fn test_fm_note_on_writes_routing_and_frequency() {
    let mut fx = Fixture::new(vec![fm_instrument(0, 3)], Vec::new());
    let mut d = dispatcher(&fx, CompatFlags::default());

    note_on(&mut d, &mut fx, 0, 0, 57);
    d.tick(&mut fx.host(), true);
    d.flush();

    let chip = d.chip();
    let r6 = chip.last(oreg(0, 0, OR::R6)).unwrap_or(0);
    assert_eq!((r6 >> 1) & 7, 3);
    let r7 = chip.last(oreg(0, 3, OR::R7)).unwrap_or(0);
    assert_eq!(r7 >> 5, 7);
    assert_eq!(chip.last(creg(0, CR::FreqLo)), Some(231));
    assert_eq!(chip.last(creg(0, CR::FreqHi)), Some(0));
    assert_eq!(d.channel(0).map(|c| c.freq), Some(231));
}

#[test]
fn test_non_looping_sample_sets_pointers_without_restart() {
    let samples = vec![Sample::new("a", data(1000)), Sample::new("b", data(500))];
    let mut fx = Fixture::new(vec![sample_instrument(1)], samples);
    let mut d = dispatcher(&fx, CompatFlags::default());

    note_on(&mut d, &mut fx, 0, 0, 57);
    d.tick(&mut fx.host(), true);
    let w = writes(&mut d);

    let find = |reg| w.iter().rev().find(|x| x.addr == creg(0, reg)).map(|x| x.value);
    assert_eq!(find(CR::PcmPosLo), Some(0xE8));
    assert_eq!(find(CR::PcmPosHi), Some(0x03));
    assert_eq!(find(CR::PcmEndLo), Some(0xDC));
    assert_eq!(find(CR::PcmEndHi), Some(0x05));
    assert_eq!(position(&w, creg(0, CR::PcmRestartLo)), None);
    assert_eq!(position(&w, creg(0, CR::PcmRestartHi)), None);

    let flags0 = find(CR::Flags0).unwrap_or(0);
    assert_eq!(flags0, (Flags0::KEY_ON | Flags0::PCM).bits());
    let flags1 = find(CR::Flags1).unwrap_or(0xFF);
    assert_eq!(flags1 & Flags1::PCM_LOOP.bits(), 0);

    // 231 * 8363 / (8372 * 4)
    assert_eq!(find(CR::FreqLo), Some(57));
}

#[test]
fn test_looping_sample_sets_restart_and_loop_flag() {
    let samples = vec![Sample::new("loop", data(400)).with_loop(100..300)];
    let mut fx = Fixture::new(vec![sample_instrument(0)], samples);
    let mut d = dispatcher(&fx, CompatFlags::default());

    note_on(&mut d, &mut fx, 2, 0, 60);
    d.dispatch(2, Command::SamplePos(10), &mut fx.host());
    d.tick(&mut fx.host(), true);
    let w = writes(&mut d);

    let find = |reg| w.iter().rev().find(|x| x.addr == creg(2, reg)).map(|x| x.value);
    assert_eq!(find(CR::PcmPosLo), Some(10));
    assert_eq!(find(CR::PcmEndLo), Some(44));
    assert_eq!(find(CR::PcmEndHi), Some(1));
    assert_eq!(find(CR::PcmRestartLo), Some(100));
    assert_eq!(find(CR::PcmRestartHi), Some(0));
    assert!(d.channel(2).is_some_and(|c| c.pcm_loop && c.has_offset == 0));
    let flags1 = find(CR::Flags1).unwrap_or(0);
    assert_ne!(flags1 & Flags1::PCM_LOOP.bits(), 0);
}

#[test]
fn test_sample_left_out_of_ram_is_not_keyed_on() {
    let samples = vec![Sample::new("big", data(70_000)), Sample::new("dropped", data(500))];
    let mut fx = Fixture::new(vec![sample_instrument(1)], samples);
    let mut d = dispatcher(&fx, CompatFlags::default());
    assert!(d.sample_mem_out_of_memory());
    assert!(!d.is_sample_loaded(1));

    note_on(&mut d, &mut fx, 0, 0, 57);
    d.tick(&mut fx.host(), true);
    let w = writes(&mut d);

    for reg in [CR::PcmPosLo, CR::PcmPosHi, CR::PcmEndLo, CR::PcmEndHi] {
        assert_eq!(position(&w, creg(0, reg)), None, "{reg} written");
    }
    let find = |reg| w.iter().rev().find(|x| x.addr == creg(0, reg)).map(|x| x.value);
    assert_eq!(find(CR::Flags0).unwrap_or(0) & Flags0::KEY_ON.bits(), 0);
    assert_eq!(find(CR::Volume), Some(0));
    assert!(d.channel(0).is_some_and(|c| !c.key));
}

#[test]
fn test_sample_offset_past_ram_is_clamped() {
    let samples = vec![Sample::new("a", data(1000)), Sample::new("b", data(500))];
    let mut fx = Fixture::new(vec![sample_instrument(1)], samples);
    let mut d = dispatcher(&fx, CompatFlags::default());

    note_on(&mut d, &mut fx, 0, 0, 57);
    d.dispatch(0, Command::SamplePos(70_000), &mut fx.host());
    d.tick(&mut fx.host(), true);
    let w = writes(&mut d);

    let find = |reg| w.iter().rev().find(|x| x.addr == creg(0, reg)).map(|x| x.value);
    assert_eq!(find(CR::PcmPosLo), Some(0xFF));
    assert_eq!(find(CR::PcmPosHi), Some(0xFF));
}

#[test]
fn test_full_sid_sustain_never_decays() {
    let sid = SidPatch {
        envelope: Adsr {
            attack: 2,
            decay: 9,
            sustain: 15,
            release: 4,
        },
        waves: SidWaves {
            pulse: true,
            ..SidWaves::default()
        },
        duty: 2048,
        ..SidPatch::default()
    };
    let mut fx = Fixture::new(vec![Instrument::new("sid", Patch::C64(sid))], Vec::new());
    let mut d = dispatcher(&fx, CompatFlags::default());

    note_on(&mut d, &mut fx, 1, 0, 48);
    let w = writes(&mut d);

    let carrier = d.channel(1).map(|c| c.bank.ops[3]).unwrap_or_default();
    assert_eq!(carrier.dr, 0);
    let r2 = w.iter().rev().find(|x| x.addr == oreg(1, 3, OR::R2)).map(|x| x.value);
    assert_eq!(r2.map(|v| v & 0x0F), Some(0));
    assert_eq!(position(&w, creg(1, CR::Duty)).map(|i| w[i].value), Some(64));
}

// ============================================================================
// Gate ordering and frequency
// ============================================================================

#[test]
fn test_key_off_precedes_frequency() {
    let mut fx = Fixture::new(vec![fm_instrument(4, 0)], Vec::new());
    let mut d = dispatcher(&fx, CompatFlags::default());
    note_on(&mut d, &mut fx, 0, 0, 57);
    d.tick(&mut fx.host(), true);
    settle(&mut d);

    d.dispatch(0, Command::NoteOff, &mut fx.host());
    d.dispatch(0, Command::Pitch(12), &mut fx.host());
    d.tick(&mut fx.host(), true);
    let w = writes(&mut d);

    let off = position(&w, creg(0, CR::Flags0));
    let freq = position(&w, creg(0, CR::FreqLo));
    assert!(off.is_some() && freq.is_some());
    assert!(off < freq);
    assert_eq!(w[off.unwrap_or(0)].value & Flags0::KEY_ON.bits(), 0);
    assert_eq!(last_position(&w, creg(0, CR::Flags0)), off);
}

#[test]
fn test_key_on_follows_frequency() {
    let mut fx = Fixture::new(vec![fm_instrument(4, 0)], Vec::new());
    let mut d = dispatcher(&fx, CompatFlags::default());
    note_on(&mut d, &mut fx, 0, 0, 57);
    settle(&mut d);

    d.tick(&mut fx.host(), true);
    let w = writes(&mut d);

    let first_ctl = position(&w, creg(0, CR::Flags0));
    let last_ctl = last_position(&w, creg(0, CR::Flags0));
    let freq_lo = position(&w, creg(0, CR::FreqLo));
    let freq_hi = last_position(&w, creg(0, CR::FreqHi));
    assert!(first_ctl < freq_lo);
    assert!(last_ctl > freq_hi);
    assert_eq!(w[last_ctl.unwrap_or(0)].value & Flags0::KEY_ON.bits(), 1);
    assert!(d.channel(0).is_some_and(|c| c.key && !c.key_on));
}

#[test]
fn test_frequency_is_clamped() {
    let mut fx = Fixture::new(vec![fm_instrument(0, 0)], Vec::new());
    let mut d = dispatcher(&fx, CompatFlags::default().linear_pitch(false));

    note_on(&mut d, &mut fx, 0, 0, 57);
    d.dispatch(0, Command::Pitch(i32::MAX), &mut fx.host());
    d.tick(&mut fx.host(), true);
    settle(&mut d);
    assert_eq!(d.channel(0).map(|c| c.freq), Some(0xFFFF));

    d.dispatch(0, Command::Pitch(i32::MIN), &mut fx.host());
    d.tick(&mut fx.host(), true);
    let w = writes(&mut d);
    let lo = w.iter().rev().find(|x| x.addr == creg(0, CR::FreqLo));
    assert_eq!(lo.map(|x| x.value), Some(0));
    assert_eq!(d.channel(0).map(|c| c.freq), Some(0));
}

#[test]
fn test_extreme_arp_macro_is_clamped() {
    let mut fx = Fixture::new(vec![fm_instrument(0, 0)], Vec::new());
    let mut d = dispatcher(&fx, CompatFlags::default());
    note_on(&mut d, &mut fx, 0, 0, 57);
    fx.macros.ticks.insert(
        0,
        vec![MacroTick {
            arp: Some(Arp::Fixed(i32::MAX / 2)),
            ..MacroTick::default()
        }],
    );
    d.tick(&mut fx.host(), true);
    assert_eq!(d.channel(0).map(|c| c.freq), Some(0xFFFF));
}

// ============================================================================
// Commands
// ============================================================================

#[test]
fn test_porta_reaches_target() {
    let mut fx = Fixture::new(vec![fm_instrument(0, 0)], Vec::new());
    let mut d = dispatcher(&fx, CompatFlags::default());
    note_on(&mut d, &mut fx, 0, 0, 57);

    let porta = Command::NotePorta {
        speed: 64,
        target: 58,
    };
    assert_eq!(d.dispatch(0, porta, &mut fx.host()), DispatchOutcome::Handled);
    assert_eq!(d.channel(0).map(|c| c.base_freq), Some(57 * 128 + 64));
    assert_eq!(d.dispatch(0, porta, &mut fx.host()), DispatchOutcome::PortaReached);
    assert!(d.channel(0).is_some_and(|c| c.base_freq == 58 * 128 && !c.in_porta));
}

#[test]
fn test_volume_and_get_volume() {
    let mut fx = Fixture::new(vec![fm_instrument(0, 0)], Vec::new());
    let mut d = dispatcher(&fx, CompatFlags::default());
    d.dispatch(3, Command::Instrument { index: 0, force: false }, &mut fx.host());

    d.dispatch(3, Command::Volume(100), &mut fx.host());
    assert_eq!(writes(&mut d), vec![RegWrite::new(creg(3, CR::Volume), 100)]);
    assert_eq!(
        d.dispatch(3, Command::GetVolume, &mut fx.host()),
        DispatchOutcome::Volume(100)
    );

    // Unchanged volume writes nothing.
    d.dispatch(3, Command::Volume(100), &mut fx.host());
    assert!(writes(&mut d).is_empty());

    fx.macros.defined.push((3, MacroKind::Volume));
    d.dispatch(3, Command::Volume(90), &mut fx.host());
    assert!(writes(&mut d).is_empty());
    assert_eq!(
        d.dispatch(3, Command::GetVolume, &mut fx.host()),
        DispatchOutcome::Volume(90)
    );
}

#[test]
fn test_volume_macro_scales_output() {
    let mut fx = Fixture::new(vec![fm_instrument(0, 0)], Vec::new());
    let mut d = dispatcher(&fx, CompatFlags::default());
    note_on(&mut d, &mut fx, 0, 0, 57);
    settle(&mut d);
    fx.macros.ticks.insert(
        0,
        vec![MacroTick {
            vol: Some(64),
            ..MacroTick::default()
        }],
    );
    d.tick(&mut fx.host(), true);
    assert_eq!(d.chip_mut().last(creg(0, CR::Volume)), None);
    d.flush();
    assert_eq!(d.chip().last(creg(0, CR::Volume)), Some(63));
}

#[test]
fn test_fm_command_targets() {
    let mut fx = Fixture::new(vec![fm_instrument(0, 0)], Vec::new());
    let mut d = dispatcher(&fx, CompatFlags::default());

    let tl = Command::Fm {
        param: FmParam::Tl,
        target: OperatorTarget::One(2),
        value: 200,
    };
    d.dispatch(0, tl, &mut fx.host());
    assert_eq!(d.channel(0).map(|c| c.bank.ops[2].tl), Some(72));
    assert_eq!(writes(&mut d).len(), 8);

    let out_of_range = Command::Fm {
        param: FmParam::Tl,
        target: OperatorTarget::One(4),
        value: 1,
    };
    d.dispatch(0, out_of_range, &mut fx.host());
    assert!(writes(&mut d).is_empty());

    let all = Command::Fm {
        param: FmParam::Mult,
        target: OperatorTarget::from_index(-1),
        value: 0x13,
    };
    d.dispatch(0, all, &mut fx.host());
    assert!(d.channel(0).is_some_and(|c| c.bank.ops.iter().all(|op| op.mult == 3)));
    assert_eq!(writes(&mut d).len(), 32);

    let sus = Command::Fm {
        param: FmParam::Sus,
        target: OperatorTarget::All,
        value: 1,
    };
    d.dispatch(0, sus, &mut fx.host());
    assert!(writes(&mut d).is_empty());
}

#[test]
fn test_ring_and_sync_masks() {
    let mut fx = Fixture::new(Vec::new(), Vec::new());
    let mut d = dispatcher(&fx, CompatFlags::default());

    d.dispatch(4, Command::Extended(0x41), &mut fx.host());
    d.dispatch(4, Command::Extended(0x54), &mut fx.host());
    d.flush();
    assert_eq!(d.chip().last(oreg(4, 0, OR::R6)).map(|v| v & 0x30), Some(0x10));
    assert_eq!(d.chip().last(oreg(4, 2, OR::R6)).map(|v| v & 0x30), Some(0x20));
    let links: Vec<_> = d.channel(4).map(|c| c.ring_sync_links().collect()).unwrap_or_default();
    assert_eq!(links, vec![(0, 3), (2, 1)]);
}

#[test]
fn test_sweep_and_sync_timer() {
    let mut fx = Fixture::new(Vec::new(), Vec::new());
    let mut d = dispatcher(&fx, CompatFlags::default());

    let host = &mut fx.host();
    d.dispatch(0, Command::SweepPeriodLow { target: 1, value: 0x34 }, host);
    d.dispatch(0, Command::SweepPeriodHigh { target: 1, value: 0x12 }, host);
    d.dispatch(0, Command::SweepEnable { target: 1, value: 5 }, host);
    d.dispatch(0, Command::SyncPeriodLow(0x20), host);
    let w = writes(&mut d);

    let chan = d.channel(0).cloned().unwrap_or_default();
    assert_eq!(chan.sweep(crate::channel::SweepTarget::Volume).period, 0x1234);
    assert!(chan.timer_sync);
    assert_eq!(position(&w, creg(0, CR::VolSweepAmount)).map(|i| w[i].value), Some(5));
    let flags1 = w.iter().rev().find(|x| x.addr == creg(0, CR::Flags1)).map(|x| x.value);
    assert_eq!(flags1, Some((Flags1::VOL_SWEEP | Flags1::TIMER_SYNC).bits()));
}

#[test]
fn test_panning_round_trip() {
    let mut fx = Fixture::new(Vec::new(), Vec::new());
    let mut d = dispatcher(&fx, CompatFlags::default());

    d.dispatch(0, Command::Panning { left: 255, right: 255 }, &mut fx.host());
    assert_eq!(d.channel(0).map(|c| c.pan), Some(0));
    assert_eq!(d.pan_split(0), Some(0xFFFE));

    d.dispatch(0, Command::Panning { left: 255, right: 0 }, &mut fx.host());
    assert_eq!(d.channel(0).map(|c| c.pan), Some(-127));
    assert_eq!(d.pan_split(0), Some(0xFF00));
}

#[test]
fn test_phase_reset_macro_is_one_shot() {
    let mut fx = Fixture::new(Vec::new(), Vec::new());
    let mut d = dispatcher(&fx, CompatFlags::default());
    fx.macros.ticks.insert(
        5,
        vec![MacroTick {
            phase_reset: Some(3),
            ..MacroTick::default()
        }],
    );
    d.tick(&mut fx.host(), true);
    let w = writes(&mut d);
    let flags1 = w.iter().find(|x| x.addr == creg(5, CR::Flags1)).map(|x| x.value);
    assert_eq!(flags1, Some((Flags1::PHASE_RESET | Flags1::FILTER_PHASE_RESET).bits()));
    assert!(d.channel(5).is_some_and(|c| !c.phase_reset && !c.filter_phase_reset));
}

#[test]
fn test_pcm_key_off_silences() {
    let mut fx = Fixture::new(vec![sample_instrument(0)], vec![Sample::new("s", data(64))]);
    let mut d = dispatcher(&fx, CompatFlags::default());
    note_on(&mut d, &mut fx, 0, 0, 57);
    d.tick(&mut fx.host(), true);
    settle(&mut d);
    assert!(d.key_off_affects_arp(0));
    assert!(d.key_off_affects_porta(0));

    d.dispatch(0, Command::NoteOffEnv, &mut fx.host());
    d.tick(&mut fx.host(), true);
    let w = writes(&mut d);
    let vol = position(&w, creg(0, CR::Volume));
    assert_eq!(vol.map(|i| w[i].value), Some(0));
    assert!(vol < position(&w, creg(0, CR::FreqLo)));
    assert_eq!(fx.macros.releases, vec![0]);
}

#[test]
fn test_macro_commands_forwarded() {
    let mut fx = Fixture::new(Vec::new(), Vec::new());
    let mut d = dispatcher(&fx, CompatFlags::default());
    d.dispatch(1, Command::MacroOff(3), &mut fx.host());
    d.dispatch(1, Command::MacroOn(3), &mut fx.host());
    assert_eq!(fx.macros.masked, vec![(1, 3, true), (1, 3, false)]);
}

#[test]
fn test_out_of_range_channel_ignored() {
    let mut fx = Fixture::new(Vec::new(), Vec::new());
    let mut d = dispatcher(&fx, CompatFlags::default());
    assert_eq!(
        d.dispatch(CHANNEL_COUNT, Command::Volume(1), &mut fx.host()),
        DispatchOutcome::Ignored
    );
    assert!(d.pending_writes().next().is_none());
    assert!(d.channel(CHANNEL_COUNT).is_none());
    assert!(d.pan_split(CHANNEL_COUNT).is_none());
}

// ============================================================================
// Lifecycle
// ============================================================================

#[test]
fn test_reset_restores_power_on_state() {
    let mut fx = Fixture::new(vec![fm_instrument(2, 5)], Vec::new());
    let mut d = dispatcher(&fx, CompatFlags::default());
    note_on(&mut d, &mut fx, 0, 0, 70);
    d.dispatch(0, Command::Panning { left: 0, right: 255 }, &mut fx.host());
    d.tick(&mut fx.host(), true);
    d.mute_channel(2, true).ok();

    d.reset();

    for ch in 0..CHANNEL_COUNT {
        assert_eq!(d.channel(ch), Some(&Channel::default()));
        assert!(!d.is_muted(ch));
    }

    let mut expected: HashMap<u16, u8> = HashMap::new();
    for w in d.pending_writes() {
        expected.insert(w.addr, w.value);
    }
    let pool = d.register_pool();
    assert_eq!(pool.len(), REGISTER_POOL_SIZE);
    for (addr, &value) in pool.iter().enumerate() {
        let want = expected.get(&(addr as u16)).copied().unwrap_or(0);
        assert_eq!(value, want, "register {addr:#05x}");
    }
    assert_eq!(pool[creg(0, CR::Volume) as usize], 127);
    assert_eq!(pool[creg(0, CR::Duty) as usize], 63);
    assert_eq!(pool[creg(0, CR::CutoffHi) as usize], 0xFF);
    assert_eq!(d.chip().resets, 2);
}

#[test]
fn test_sample_memory_rebuild_is_idempotent() {
    let samples = vec![
        Sample::new("a", data(3000)),
        Sample::new("b", data(70_000)),
        Sample::new("c", data(10)),
    ];
    let fx = Fixture::new(Vec::new(), samples);
    let mut d = dispatcher(&fx, CompatFlags::default());

    let first_mem = d.sample_mem().to_vec();
    let first_comp = d.memory_composition().clone();
    let first_usage = d.sample_mem_usage();
    d.render_samples(&fx.samples);

    assert_eq!(d.sample_mem(), &first_mem[..]);
    assert_eq!(d.memory_composition(), &first_comp);
    assert_eq!(d.sample_mem_usage(), first_usage);
    assert_eq!(d.sample_mem_usage(), d.sample_mem_capacity());
    assert!(d.is_sample_loaded(0));
    assert!(!d.is_sample_loaded(1));
    assert!(!d.is_sample_loaded(2));
    assert_eq!(&d.chip().pcm[..], d.sample_mem());
}

#[test]
fn test_set_flags_rejects_bad_clock() {
    let fx = Fixture::new(Vec::new(), Vec::new());
    let mut d = dispatcher(&fx, CompatFlags::default());
    let bad = DispatchConfig::default().chip(crate::config::ChipFlags::default().custom_clock(Some(0)));
    assert_eq!(d.set_flags(bad, &fx.samples), Err(DispatchError::InvalidClock(0)));
}

#[test]
fn test_mute_channel() {
    let fx = Fixture::new(Vec::new(), Vec::new());
    let mut d = dispatcher(&fx, CompatFlags::default());

    assert_eq!(
        d.mute_channel(CHANNEL_COUNT, true),
        Err(DispatchError::InvalidChannel {
            index: CHANNEL_COUNT,
            available: CHANNEL_COUNT,
        })
    );
    assert!(d.mute_channel(2, true).is_ok());
    assert!(d.is_muted(2));
    assert!(d.chip().muted[2]);
}

#[test]
fn test_dump_and_skip_writes() {
    let fx = Fixture::new(Vec::new(), Vec::new());
    let mut d = dispatcher(&fx, CompatFlags::default());

    d.set_dump_writes(true);
    d.poke(0x10, 5);
    d.poke_all(&[RegWrite::new(0x11, 6)]);
    assert_eq!(
        d.take_register_dump(),
        vec![RegWrite::new(0x10, 5), RegWrite::new(0x11, 6)]
    );
    assert!(d.take_register_dump().is_empty());

    d.set_skip_register_writes(true);
    d.poke(0x12, 7);
    assert!(d.take_register_dump().is_empty());
    assert_eq!(d.register_pool()[0x12], 0);
    assert_eq!(d.pending_writes().count(), 2);
}

#[test]
fn test_force_ins_marks_channels() {
    let fx = Fixture::new(Vec::new(), Vec::new());
    let mut d = dispatcher(&fx, CompatFlags::default());
    d.force_ins();
    for ch in 0..CHANNEL_COUNT {
        assert!(d.channel(ch).is_some_and(|c| c.ins_changed && c.freq_changed));
    }
    // Pan, two control registers, duty, cutoff pair, resonance, 32 operator registers.
    assert_eq!(d.pending_writes().count(), CHANNEL_COUNT * (7 + 32));
}

#[test]
fn test_acquire_drains_queue_and_fills_scopes() {
    let fx = Fixture::new(Vec::new(), Vec::new());
    let mut d = dispatcher(&fx, CompatFlags::default());
    d.poke(0x20, 1);
    d.chip_mut().output = (40_000, -5);
    d.chip_mut().channel_out[3] = 77;

    let mut left = [0i16; 4];
    let mut right = [0i16; 4];
    d.acquire(&mut left, &mut right);

    assert_eq!(left, [i16::MAX; 4]);
    assert_eq!(right, [-5; 4]);
    assert_eq!(d.pending_writes().count(), 0);
    assert_eq!(d.chip().writes, vec![RegWrite::new(0x20, 1)]);
    let scope = d.osc_buffer(3);
    assert_eq!(scope.map(|o| o.len()), Some(4));
    assert_eq!(scope.and_then(|o| o.last()), Some(77));
    assert_eq!(scope.map(|o| o.rate()), Some(48_000));
}

#[test]
fn test_introspection() {
    let fx = Fixture::new(Vec::new(), Vec::new());
    let d = dispatcher(&fx, CompatFlags::default());
    assert_eq!(d.channel_count(), CHANNEL_COUNT);
    assert_eq!(d.output_count(), 2);
    assert!(d.has_soft_pan(0));
    assert_eq!(d.register_pool_size(), REGISTER_POOL_SIZE);
    assert!(!d.register_sheet().is_empty());
    assert_eq!(d.rate(), 48_000);
    assert!(!d.key_off_affects_arp(0));
    assert!(!d.sample_mem_out_of_memory());
}
