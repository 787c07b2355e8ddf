//! Canonical operator record and its register encoding.
//!
//! Every synthesis model is translated into this one record. The routing view
//! (modulation input, output level, delay, fixed frequency) is a projection of
//! the same fields the envelope and level registers are encoded from.

use sgu_common::{OPERATORS_PER_CHANNEL, OPERATOR_REGISTERS};

/// Ring/sync partner of each operator: the previous operator in the cycle.
pub const RING_PARTNER: [usize; OPERATORS_PER_CHANNEL] = [3, 0, 1, 2];

/// Highest total level (full attenuation).
pub const MAX_TOTAL_LEVEL: u8 = 127;

/// One operator, in native units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Operator {
    /// Operator contributes output when set.
    pub enable: bool,
    /// Tremolo enable.
    pub am: bool,
    /// Vibrato enable.
    pub vib: bool,
    /// Frequency multiplier (4 bits).
    pub mult: u8,
    /// Total level / attenuation (7 bits).
    pub tl: u8,
    /// Key-scale level (2 bits).
    pub ksl: u8,
    /// Attack rate (5 bits).
    pub ar: u8,
    /// Decay rate (5 bits).
    pub dr: u8,
    /// Sustain level (4 bits).
    pub sl: u8,
    /// Release rate (4 bits).
    pub rr: u8,
    /// Second decay (sustain) rate (5 bits).
    pub d2r: u8,
    /// Detune (3 bits).
    pub dt: u8,
    /// Rate scaling (2 bits).
    pub rs: u8,
    /// Legacy 1-bit key-scale rate.
    pub ksr: bool,
    /// Legacy envelope type (sustained) flag.
    pub egt: bool,
    /// Legacy sustain flag.
    pub sus: bool,
    /// Legacy SSG-EG bits; bit 3 holds the sustained-envelope flag for
    /// models that automate it.
    pub ssg_env: u8,
    /// Waveform (3 bits).
    pub ws: u8,
    /// Deep tremolo.
    pub dam: bool,
    /// Deep vibrato.
    pub dvb: bool,
    /// Modulation input level from the previous operator (3 bits).
    pub mod_in: u8,
    /// Output level (3 bits).
    pub out_lvl: u8,
    /// Envelope delay (3 bits).
    pub delay: u8,
    /// Fixed-frequency mode.
    pub fixed: bool,
}

impl Operator {
    /// Power-on state: enabled, everything else zero.
    pub const DEFAULT: Operator = Operator {
        enable: true,
        am: false,
        vib: false,
        mult: 0,
        tl: 0,
        ksl: 0,
        ar: 0,
        dr: 0,
        sl: 0,
        rr: 0,
        d2r: 0,
        dt: 0,
        rs: 0,
        ksr: false,
        egt: false,
        sus: false,
        ssg_env: 0,
        ws: 0,
        dam: false,
        dvb: false,
        mod_in: 0,
        out_lvl: 0,
        delay: 0,
        fixed: false,
    };

    /// Fully attenuated, disabled operator.
    pub fn silenced(mut self) -> Self {
        self.enable = false;
        self.tl = MAX_TOTAL_LEVEL;
        self.mod_in = 0;
        self.out_lvl = 0;
        self
    }

    /// Routing projection.
    pub fn routing(&self) -> Routing {
        Routing {
            mod_in: self.mod_in,
            out_lvl: if self.enable { self.out_lvl } else { 0 },
            delay: self.delay,
            fixed: self.fixed,
        }
    }

    /// Apply a routing to this operator.
    pub fn set_routing(&mut self, mod_in: u8, out_lvl: u8) {
        self.mod_in = mod_in & 7;
        self.out_lvl = out_lvl & 7;
    }

    /// Encode R0..R7.
    ///
    /// `ring` and `sync` apply against [`RING_PARTNER`].
    pub fn registers(&self, ring: bool, sync: bool) -> [u8; OPERATOR_REGISTERS] {
        let tl = self.tl & 0x7F;
        let ar = self.ar & 0x1F;
        let dr = self.dr & 0x1F;
        let out_lvl = if self.enable { self.out_lvl & 7 } else { 0 };

        [
            (u8::from(self.am) << 7)
                | (u8::from(self.vib) << 6)
                | (u8::from(self.fixed) << 5)
                | (self.mult & 0x0F),
            ((self.ksl & 3) << 6) | (tl & 0x3F),
            ((ar & 0x0F) << 4) | (dr & 0x0F),
            ((self.sl & 0x0F) << 4) | (self.rr & 0x0F),
            ((self.dt & 7) << 5) | (self.d2r & 0x1F),
            ((self.delay & 7) << 5) | ((self.rs & 3) << 3),
            (u8::from(self.dam) << 7)
                | (u8::from(self.dvb) << 6)
                | if sync { 0x20 } else { 0 }
                | if ring { 0x10 } else { 0 }
                | ((self.mod_in & 7) << 1)
                | ((tl >> 6) & 1),
            (out_lvl << 5)
                | if ar & 0x10 != 0 { 0x10 } else { 0 }
                | if dr & 0x10 != 0 { 0x08 } else { 0 }
                | (self.ws & 7),
        ]
    }
}

impl Default for Operator {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Routing fields of one operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Routing {
    /// Modulation input level.
    pub mod_in: u8,
    /// Effective output level (0 when disabled).
    pub out_lvl: u8,
    /// Envelope delay.
    pub delay: u8,
    /// Fixed frequency.
    pub fixed: bool,
}

/// Four operators plus the channel-wide LFO depth bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperatorBank {
    /// Operators 0..3.
    pub ops: [Operator; OPERATORS_PER_CHANNEL],
    /// Global vibrato depth (2-op models with shared LFO).
    pub fms: u8,
    /// Global tremolo depth (2-op models with shared LFO).
    pub ams: u8,
}

impl Default for OperatorBank {
    fn default() -> Self {
        Self {
            ops: [Operator::DEFAULT; OPERATORS_PER_CHANNEL],
            fms: 0,
            ams: 0,
        }
    }
}
