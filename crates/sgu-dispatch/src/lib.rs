//! Synthesis-model translation and register dispatch for the SGU-1
//!
//! Songs written for other chips (OPN, OPM, OPZ, OPL, OPLL FM, SID-style
//! subtractive voices, simple single-oscillator voices and raw samples) are
//! played on the SGU-1 by translating each instrument into the chip's native
//! four-operator description and streaming the resulting register writes to a
//! chip core.
//!
//! # Features
//! - One translation strategy per synthesis model, all producing the same
//!   native operator record
//! - Per-tick macro application with correct gate ordering
//! - Bounded register write queue drained once per output sample
//! - Sample RAM layout with truncation on exhaustion
//! - Register shadow, dump capture and oscilloscope buffers for tooling
//!
//! # Quick start
//! ```
//! use sgu_dispatch::{Command, DispatchConfig, Host, Instrument, NoMacros, Patch, Sample};
//! use sgu_dispatch::{FmPatch, SguDispatch};
//! # use sgu_common::SguBackend;
//! # struct Null(Vec<i8>);
//! # impl SguBackend for Null {
//! #     fn reset(&mut self) {}
//! #     fn write(&mut self, _addr: u16, _value: u8) {}
//! #     fn next_sample(&mut self) -> (i32, i32) { (0, 0) }
//! #     fn channel_sample(&self, _channel: usize) -> i16 { 0 }
//! #     fn pcm_mut(&mut self) -> &mut [i8] { &mut self.0 }
//! #     fn set_channel_mute(&mut self, _channel: usize, _mute: bool) {}
//! # }
//!
//! let instruments = vec![Instrument::new("bass", Patch::Opn(FmPatch::default()))];
//! let samples: Vec<Sample> = Vec::new();
//! let mut macros = NoMacros;
//!
//! let mut sgu = SguDispatch::new(Null(vec![0; 65536]));
//! sgu.init(DispatchConfig::default(), &samples)?;
//!
//! let mut host = Host::new(&instruments, &samples, &mut macros);
//! sgu.dispatch(0, Command::Instrument { index: 0, force: false }, &mut host);
//! sgu.dispatch(0, Command::NoteOn { note: Some(57) }, &mut host);
//! sgu.tick(&mut host, true);
//!
//! let mut left = [0i16; 256];
//! let mut right = [0i16; 256];
//! sgu.acquire(&mut left, &mut right);
//! # Ok::<(), sgu_dispatch::DispatchError>(())
//! ```

#![warn(missing_docs)]

pub mod channel;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod host;
pub mod instrument;
pub mod operator;
pub mod pan;
pub mod pitch;
pub mod queue;
pub mod register_pool;
pub mod samples;
pub mod translate;
pub mod volume;

#[cfg(test)]
mod testing;

pub use channel::{Channel, Sweep, SweepTarget};
pub use config::{ChipFlags, CompatFlags, DispatchConfig};
pub use dispatch::{Command, DispatchOutcome, FmParam, OperatorTarget, SguDispatch};
pub use error::{DispatchError, Result};
pub use host::{
    Arp, Host, InstrumentStore, MacroKind, MacroSource, MacroTick, NoMacros, OperatorMacros,
    PitchMacro, SampleStore,
};
pub use instrument::{
    Adsr, FmPatch, Instrument, ModelKind, NoteMapEntry, Patch, SamplePatch, SidFilter, SidPatch,
    SidWaves,
};
pub use operator::{Operator, OperatorBank};
pub use queue::RegWrite;
pub use samples::{MemoryComposition, MemoryEntry, Sample, SampleMemory};
pub use translate::{Translation, translate};
