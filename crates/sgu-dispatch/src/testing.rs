//! Test doubles: a recording chip core and a scripted macro source.

use std::collections::HashMap;

use sgu_common::registers::{ChannelRegister, OperatorRegister, channel_addr, operator_addr};
use sgu_common::{CHANNEL_COUNT, PCM_RAM_SIZE, SguBackend};

use crate::host::{MacroKind, MacroSource, MacroTick};
use crate::instrument::Instrument;
use crate::queue::RegWrite;

/// Chip core that records every write in order.
pub struct RecordingBackend {
    pub writes: Vec<RegWrite>,
    pub resets: usize,
    pub output: (i32, i32),
    pub channel_out: [i16; CHANNEL_COUNT],
    pub muted: [bool; CHANNEL_COUNT],
    pub pcm: Vec<i8>,
}

impl Default for RecordingBackend {
    fn default() -> Self {
        Self {
            writes: Vec::new(),
            resets: 0,
            output: (0, 0),
            channel_out: [0; CHANNEL_COUNT],
            muted: [false; CHANNEL_COUNT],
            pcm: vec![0; PCM_RAM_SIZE],
        }
    }
}

impl RecordingBackend {
    /// Last value written to `addr`.
    pub fn last(&self, addr: u16) -> Option<u8> {
        self.writes.iter().rev().find(|w| w.addr == addr).map(|w| w.value)
    }
}

impl SguBackend for RecordingBackend {
    fn reset(&mut self) {
        self.resets += 1;
    }

    fn write(&mut self, addr: u16, value: u8) {
        self.writes.push(RegWrite::new(addr, value));
    }

    fn next_sample(&mut self) -> (i32, i32) {
        self.output
    }

    fn channel_sample(&self, channel: usize) -> i16 {
        self.channel_out.get(channel).copied().unwrap_or(0)
    }

    fn pcm_mut(&mut self) -> &mut [i8] {
        &mut self.pcm
    }

    fn set_channel_mute(&mut self, channel: usize, mute: bool) {
        if let Some(m) = self.muted.get_mut(channel) {
            *m = mute;
        }
    }
}

/// Macro source fed from a per-channel script.
#[derive(Default)]
pub struct ScriptedMacros {
    pub ticks: HashMap<usize, Vec<MacroTick>>,
    pub defined: Vec<(usize, MacroKind)>,
    pub inits: Vec<usize>,
    pub releases: Vec<usize>,
    pub masked: Vec<(usize, u32, bool)>,
}

impl MacroSource for ScriptedMacros {
    fn init(&mut self, channel: usize, _instrument: &Instrument) {
        self.inits.push(channel);
    }

    fn next(&mut self, channel: usize) -> MacroTick {
        match self.ticks.get_mut(&channel) {
            Some(script) if !script.is_empty() => script.remove(0),
            _ => MacroTick::default(),
        }
    }

    fn has(&self, channel: usize, kind: MacroKind) -> bool {
        self.defined.contains(&(channel, kind))
    }

    fn release(&mut self, channel: usize) {
        self.releases.push(channel);
    }

    fn set_masked(&mut self, channel: usize, id: u32, masked: bool) {
        self.masked.push((channel, id, masked));
    }
}

/// Position of the first write to `addr` in `writes`.
pub fn position(writes: &[RegWrite], addr: u16) -> Option<usize> {
    writes.iter().position(|w| w.addr == addr)
}

/// Position of the last write to `addr` in `writes`.
pub fn last_position(writes: &[RegWrite], addr: u16) -> Option<usize> {
    writes.iter().rposition(|w| w.addr == addr)
}

/// Shorthand for a channel register address.
pub fn creg(channel: usize, reg: ChannelRegister) -> u16 {
    channel_addr(channel, reg)
}

/// Shorthand for an operator register address.
pub fn oreg(channel: usize, op: usize, reg: OperatorRegister) -> u16 {
    operator_addr(channel, op, reg)
}
