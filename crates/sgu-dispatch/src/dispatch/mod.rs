//! The SGU-1 dispatcher.
//!
//! [`SguDispatch`] owns the chip core, the per-channel state, the write queue
//! and the sample RAM image. The embedding engine drives it with three calls:
//!
//! - [`SguDispatch::dispatch`] for sequencer commands,
//! - [`SguDispatch::tick`] once per sequencer tick,
//! - [`SguDispatch::acquire`] whenever it needs audio.
//!
//! All writes for a tick must be rendered before the next tick is issued;
//! the write queue is bounded and panics on overflow.

mod command;
mod render;
mod tick;

#[cfg(test)]
mod tests;

use log::{debug, trace};
use sgu_common::registers::{ChannelRegister, REGISTER_SHEET, channel_addr, operator_addr};
use sgu_common::{
    CHANNEL_COUNT, CHIP_OUTPUT_RATE, OPERATORS_PER_CHANNEL, OperatorRegister, OscBuffer,
    SguBackend,
};

use crate::channel::Channel;
use crate::config::DispatchConfig;
use crate::error::{DispatchError, Result};
use crate::host::SampleStore;
use crate::instrument::Instrument;
use crate::pan;
use crate::pitch::PitchTable;
use crate::queue::{RegWrite, WriteQueue};
use crate::register_pool::RegisterPool;
use crate::samples::{MemoryComposition, SampleMemory};
use crate::translate::{FilterChange, TranslateContext, Voice, translate};
use crate::volume::MAX_VOLUME;

pub use command::{Command, DispatchOutcome, FmParam, OperatorTarget};

/// Translation and register dispatch for one SGU-1 chip.
pub struct SguDispatch<B: SguBackend> {
    chip: B,
    channels: [Channel; CHANNEL_COUNT],
    muted: [bool; CHANNEL_COUNT],
    osc: [OscBuffer; CHANNEL_COUNT],
    queue: WriteQueue,
    pool: RegisterPool,
    dump: Option<Vec<RegWrite>>,
    skip_writes: bool,
    memory: SampleMemory,
    config: DispatchConfig,
    pitch: PitchTable,
    rate: u32,
}

impl<B: SguBackend> SguDispatch<B> {
    /// Wrap a chip core. Call [`init`](Self::init) before use.
    pub fn new(chip: B) -> Self {
        let config = DispatchConfig::default();
        Self {
            chip,
            channels: std::array::from_fn(|_| Channel::default()),
            muted: [false; CHANNEL_COUNT],
            osc: std::array::from_fn(|_| OscBuffer::default()),
            queue: WriteQueue::new(),
            pool: RegisterPool::default(),
            dump: None,
            skip_writes: false,
            memory: SampleMemory::new(),
            pitch: PitchTable::new(config.chip.clock(), &config.compat),
            config,
            rate: CHIP_OUTPUT_RATE,
        }
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Apply `config`, lay out the samples and reset the chip.
    ///
    /// # Returns
    ///
    /// The number of channels.
    pub fn init(&mut self, config: DispatchConfig, samples: &dyn SampleStore) -> Result<usize> {
        self.dump = None;
        self.skip_writes = false;
        self.muted = [false; CHANNEL_COUNT];
        self.set_flags(config, samples)?;
        self.reset();
        debug!("SGU-1 initialized: {CHANNEL_COUNT} channels at {} Hz", self.rate);
        Ok(CHANNEL_COUNT)
    }

    /// Apply a new configuration and re-render sample RAM.
    pub fn set_flags(&mut self, config: DispatchConfig, samples: &dyn SampleStore) -> Result<()> {
        config.validate()?;
        self.config = config;
        self.pitch = PitchTable::new(config.chip.clock(), &config.compat);
        self.rate = CHIP_OUTPUT_RATE;
        for osc in &mut self.osc {
            osc.set_rate(self.rate);
        }
        debug!(
            "SGU-1 flags: clock {} Hz, linear pitch {}",
            config.chip.clock(),
            config.compat.linear_pitch
        );
        self.render_samples(samples);
        Ok(())
    }

    /// Return every channel, the queue and the register pool to power-on
    /// state, then re-send the defaults and sample RAM.
    pub fn reset(&mut self) {
        self.queue.clear();
        self.chip.reset();
        self.pool.clear();

        for ch in 0..CHANNEL_COUNT {
            self.channels[ch] = Channel::default();
            self.chip.set_channel_mute(ch, false);
            self.muted[ch] = false;

            self.write_volume(ch);
            self.write_pan(ch);
            self.write_duty(ch);
            self.write_cutoff(ch);
            self.write_resonance(ch);
            self.write_control(ch);
            self.write_control_upper(ch);
            for op in 0..OPERATORS_PER_CHANNEL {
                self.apply_op_regs(ch, op);
            }
        }

        self.memory.copy_to(self.chip.pcm_mut());
        debug!("SGU-1 reset; {} writes queued", self.queue.len());
    }

    /// Release the dispatcher and hand back the chip core.
    pub fn quit(self) -> B {
        debug!("SGU-1 shut down");
        self.chip
    }

    /// Mute or unmute a channel at the chip output.
    pub fn mute_channel(&mut self, channel: usize, mute: bool) -> Result<()> {
        if channel >= CHANNEL_COUNT {
            return Err(DispatchError::InvalidChannel {
                index: channel,
                available: CHANNEL_COUNT,
            });
        }
        self.muted[channel] = mute;
        self.chip.set_channel_mute(channel, mute);
        Ok(())
    }

    /// Rebuild sample RAM and copy it into the chip.
    pub fn render_samples(&mut self, samples: &dyn SampleStore) {
        self.memory.render(samples);
        self.memory.copy_to(self.chip.pcm_mut());
    }

    // ========================================================================
    // Tooling
    // ========================================================================

    /// Write one register directly, bypassing channel state.
    pub fn poke(&mut self, addr: u16, value: u8) {
        trace!("poke {addr:#06x} = {value:#04x}");
        self.write(addr, value);
    }

    /// Write a list of registers in order.
    pub fn poke_all(&mut self, writes: &[RegWrite]) {
        trace!("poke {} registers", writes.len());
        for w in writes {
            self.write(w.addr, w.value);
        }
    }

    /// Record every register write for export.
    pub fn set_dump_writes(&mut self, enabled: bool) {
        match (enabled, self.dump.is_some()) {
            (true, false) => self.dump = Some(Vec::new()),
            (false, true) => self.dump = None,
            _ => {}
        }
    }

    /// Take the writes recorded since the last call.
    pub fn take_register_dump(&mut self) -> Vec<RegWrite> {
        self.dump.as_mut().map(std::mem::take).unwrap_or_default()
    }

    /// Suppress all register writes (queue, pool and dump).
    pub fn set_skip_register_writes(&mut self, skip: bool) {
        self.skip_writes = skip;
    }

    /// Re-send every channel's registers and mark instruments dirty.
    pub fn force_ins(&mut self) {
        for ch in 0..CHANNEL_COUNT {
            let chan = &mut self.channels[ch];
            chan.ins_changed = true;
            chan.freq_changed = true;

            self.write_pan(ch);
            self.write_control(ch);
            self.write_control_upper(ch);
            self.write_duty(ch);
            self.write_cutoff(ch);
            self.write_resonance(ch);
            for op in 0..OPERATORS_PER_CHANNEL {
                self.apply_op_regs(ch, op);
            }
        }
    }

    /// Mark channels using instrument `ins` for re-commit.
    pub fn notify_ins_change(&mut self, ins: i32) {
        for chan in self.channels.iter_mut().filter(|c| c.ins == ins) {
            chan.ins_changed = true;
        }
    }

    // ========================================================================
    // Introspection
    // ========================================================================

    /// Channel state.
    pub fn channel(&self, channel: usize) -> Option<&Channel> {
        self.channels.get(channel)
    }

    /// Number of channels.
    pub fn channel_count(&self) -> usize {
        CHANNEL_COUNT
    }

    /// True if the channel is muted.
    pub fn is_muted(&self, channel: usize) -> bool {
        self.muted.get(channel).copied().unwrap_or(false)
    }

    /// Pan as split 8-bit levels (`left << 8 | right`).
    pub fn pan_split(&self, channel: usize) -> Option<u16> {
        self.channels
            .get(channel)
            .map(|c| pan::linear_to_split(i32::from(c.pan) + 127, 8, 255))
    }

    /// Key-off stops the arpeggio on this channel.
    pub fn key_off_affects_arp(&self, channel: usize) -> bool {
        self.channels.get(channel).is_some_and(|c| c.pcm)
    }

    /// Key-off stops portamento on this channel.
    pub fn key_off_affects_porta(&self, channel: usize) -> bool {
        self.channels.get(channel).is_some_and(|c| c.pcm)
    }

    /// Stereo output.
    pub fn output_count(&self) -> usize {
        2
    }

    /// Every channel pans in software.
    pub fn has_soft_pan(&self, _channel: usize) -> bool {
        true
    }

    /// Register shadow.
    pub fn register_pool(&self) -> &[u8] {
        self.pool.as_slice()
    }

    /// Register shadow size in bytes.
    pub fn register_pool_size(&self) -> usize {
        self.pool.len()
    }

    /// Register names and address formulas.
    pub fn register_sheet(&self) -> &'static [(&'static str, &'static str)] {
        REGISTER_SHEET
    }

    /// Writes waiting for the next render.
    pub fn pending_writes(&self) -> impl Iterator<Item = &RegWrite> {
        self.queue.iter()
    }

    /// Oscilloscope buffer of a channel.
    pub fn osc_buffer(&self, channel: usize) -> Option<&OscBuffer> {
        self.osc.get(channel)
    }

    /// Sample RAM image.
    pub fn sample_mem(&self) -> &[i8] {
        self.memory.data()
    }

    /// Sample RAM capacity.
    pub fn sample_mem_capacity(&self) -> usize {
        self.memory.capacity()
    }

    /// Sample RAM in use.
    pub fn sample_mem_usage(&self) -> usize {
        self.memory.usage()
    }

    /// True if the last sample layout ran out of RAM.
    pub fn sample_mem_out_of_memory(&self) -> bool {
        self.memory.out_of_memory()
    }

    /// True if the sample is fully present in RAM.
    pub fn is_sample_loaded(&self, sample: i32) -> bool {
        self.memory.is_loaded(sample)
    }

    /// Sample RAM layout.
    pub fn memory_composition(&self) -> &MemoryComposition {
        self.memory.composition()
    }

    /// Active configuration.
    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    /// Output sample rate.
    pub fn rate(&self) -> u32 {
        self.rate
    }

    /// Chip core.
    pub fn chip(&self) -> &B {
        &self.chip
    }

    /// Mutable chip core.
    pub fn chip_mut(&mut self) -> &mut B {
        &mut self.chip
    }

    // ========================================================================
    // Register writes
    // ========================================================================

    fn write(&mut self, addr: u16, value: u8) {
        if self.skip_writes {
            return;
        }
        let w = RegWrite::new(addr, value);
        self.queue.push(w);
        if let Some(dump) = self.dump.as_mut() {
            dump.push(w);
        }
        self.pool.store(addr, value);
    }

    fn ch_write(&mut self, ch: usize, reg: ChannelRegister, value: u8) {
        self.write(channel_addr(ch, reg), value);
    }

    fn ch_write16(&mut self, ch: usize, lo: ChannelRegister, hi: ChannelRegister, value: u32) {
        self.ch_write(ch, lo, (value & 0xFF) as u8);
        self.ch_write(ch, hi, ((value >> 8) & 0xFF) as u8);
    }

    fn write_control(&mut self, ch: usize) {
        let flags = self.channels[ch].flags0();
        self.ch_write(ch, ChannelRegister::Flags0, flags.bits());
    }

    /// Phase resets are one-shot: cleared once sent.
    fn write_control_upper(&mut self, ch: usize) {
        let flags = self.channels[ch].flags1();
        self.ch_write(ch, ChannelRegister::Flags1, flags.bits());
        let chan = &mut self.channels[ch];
        chan.phase_reset = false;
        chan.filter_phase_reset = false;
    }

    fn write_pan(&mut self, ch: usize) {
        let pan = self.channels[ch].pan as u8;
        self.ch_write(ch, ChannelRegister::Pan, pan);
    }

    fn write_duty(&mut self, ch: usize) {
        let duty = self.channels[ch].duty;
        self.ch_write(ch, ChannelRegister::Duty, duty);
    }

    fn write_resonance(&mut self, ch: usize) {
        let res = self.channels[ch].res;
        self.ch_write(ch, ChannelRegister::Resonance, res);
    }

    fn write_cutoff(&mut self, ch: usize) {
        let cutoff = self.channels[ch].cutoff_register();
        self.ch_write16(
            ch,
            ChannelRegister::CutoffLo,
            ChannelRegister::CutoffHi,
            u32::from(cutoff),
        );
    }

    fn write_volume(&mut self, ch: usize) {
        let vol = self.channels[ch].out_vol.clamp(0, MAX_VOLUME) as u8;
        self.ch_write(ch, ChannelRegister::Volume, vol);
    }

    fn write_sync_timer(&mut self, ch: usize) {
        let chan = &mut self.channels[ch];
        chan.timer_sync = chan.sync_timer > 0;
        let timer = u32::from(chan.sync_timer);
        self.ch_write16(
            ch,
            ChannelRegister::SyncTimerLo,
            ChannelRegister::SyncTimerHi,
            timer,
        );
        self.write_control_upper(ch);
    }

    fn apply_op_regs(&mut self, ch: usize, op: usize) {
        let regs = self.channels[ch].operator_registers(op);
        for (reg, value) in OperatorRegister::ALL.into_iter().zip(regs) {
            self.write(operator_addr(ch, op, reg), value);
        }
    }

    // ========================================================================
    // Instrument commit
    // ========================================================================

    /// Translate `ins` onto channel `ch` and send the result.
    fn commit_state(&mut self, ch: usize, ins: &Instrument) {
        let ctx = TranslateContext {
            ins_changed: self.channels[ch].ins_changed,
            control: self.channels[ch].control,
        };
        let t = translate(ins, &ctx);

        let bank = match t.voice {
            Voice::Pcm => {
                self.channels[ch].pcm = true;
                self.write_control(ch);
                self.write_control_upper(ch);
                return;
            }
            Voice::Operators(bank) => bank,
        };
        self.channels[ch].pcm = false;

        if let Some(duty) = t.duty {
            let chan = &mut self.channels[ch];
            chan.duty = duty;
            chan.virtual_duty = i32::from(duty) << 5;
            self.write_duty(ch);
        }

        let update_filter = match t.filter {
            FilterChange::Keep => false,
            FilterChange::Disable => {
                self.channels[ch].control = 0;
                true
            }
            FilterChange::Load {
                cutoff,
                resonance,
                control,
            } => {
                let chan = &mut self.channels[ch];
                chan.cutoff = i32::from(cutoff);
                chan.base_cutoff = chan.cutoff;
                chan.res = resonance;
                chan.control = control;
                true
            }
        };
        if update_filter {
            self.write_cutoff(ch);
            self.write_resonance(ch);
            self.write_control(ch);
        }

        let chan = &mut self.channels[ch];
        if t.clear_ring_sync {
            chan.ring_mask = 0;
            chan.sync_mask = 0;
        }
        chan.bank = bank;
        for op in 0..OPERATORS_PER_CHANNEL {
            self.apply_op_regs(ch, op);
        }
    }
}
