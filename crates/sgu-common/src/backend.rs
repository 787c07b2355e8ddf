//! Backend trait abstraction for SGU-1 chip cores
//!
//! Drivers never synthesize audio themselves. They translate musical commands
//! into register writes and hand them to a chip core through this trait, one
//! output sample at a time.

/// Common interface for SGU-1 chip execution cores
///
/// Implementations may be cycle-accurate emulations, FPGA bridges or
/// recording stubs used by tests. The driver guarantees that all writes for a
/// given output sample are applied before [`SguBackend::next_sample`] is
/// called for it.
///
/// # Example
///
/// ```
/// use sgu_common::SguBackend;
/// use sgu_common::registers::{ChannelRegister, Flags0, channel_addr};
///
/// fn key_on<B: SguBackend>(chip: &mut B, channel: usize) -> (i32, i32) {
///     chip.write(channel_addr(channel, ChannelRegister::Flags0), Flags0::KEY_ON.bits());
///     chip.next_sample()
/// }
/// ```
pub trait SguBackend {
    /// Reset the core to its power-on state
    ///
    /// Clears every register and internal generator. Sample RAM contents are
    /// left to the caller, which re-copies them after a reset.
    fn reset(&mut self);

    /// Write one register
    ///
    /// # Arguments
    ///
    /// * `addr` - Register address (channel * 0x40 + offset)
    /// * `value` - Register value
    ///
    /// Addresses outside the chip's register space are ignored.
    fn write(&mut self, addr: u16, value: u8);

    /// Advance the core by one output sample
    ///
    /// # Returns
    ///
    /// The (left, right) output pair. Values may exceed the 16-bit range; the
    /// caller clamps.
    fn next_sample(&mut self) -> (i32, i32);

    /// Most recent output of a single channel, for oscilloscope display
    ///
    /// Returns 0 for channels outside the chip.
    fn channel_sample(&self, channel: usize) -> i16;

    /// Direct access to the core's PCM sample RAM
    fn pcm_mut(&mut self) -> &mut [i8];

    /// Mute or unmute a channel at the output stage
    ///
    /// # Arguments
    ///
    /// * `channel` - Channel index
    /// * `mute` - true to mute, false to unmute
    fn set_channel_mute(&mut self, channel: usize, mute: bool);
}
