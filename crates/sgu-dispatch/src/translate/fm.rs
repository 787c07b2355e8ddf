//! Operator-based models: native routing, 4-op and 2-op FM.

use super::routing;
use super::{
    SynthModel, TranslateContext, Translation, opl_waveform, opll_carrier_level, widen_level,
    widen_rate,
};
use crate::instrument::FmPatch;
use crate::operator::{Operator, OperatorBank};

/// Release rate used when a legacy envelope is not sustained.
const FAST_SECOND_DECAY: u8 = 31;

fn map_waveform(op: &mut Operator) {
    op.ws = opl_waveform(op.ws).bits();
}

/// 4-bit rate and 6-bit level widening shared by the OPL family.
fn widen_envelope(op: &mut Operator) {
    op.ar = widen_rate(op.ar);
    op.dr = widen_rate(op.dr);
    op.tl = widen_level(op.tl);
}

fn clear_routing(op: &mut Operator) {
    op.mod_in = 0;
    op.out_lvl = 0;
    op.delay = 0;
    op.fixed = false;
}

// ============================================================================
// Native
// ============================================================================

/// Instruments already expressed in the chip's routing vocabulary.
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeFm;

impl SynthModel for NativeFm {
    type Params = FmPatch;

    fn translate(&self, params: &FmPatch, _ctx: &TranslateContext) -> Translation {
        let mut bank = OperatorBank {
            ops: params.ops,
            fms: params.fms,
            ams: params.ams,
        };
        for op in &mut bank.ops {
            map_waveform(op);
            op.mult &= 0x0F;
            op.tl &= 0x7F;
            op.ksl &= 3;
            op.ar &= 0x1F;
            op.dr &= 0x1F;
            op.sl &= 0x0F;
            op.rr &= 0x0F;
            op.d2r &= 0x1F;
            op.dt &= 7;
            op.rs &= 3;
            op.mod_in &= 7;
            op.out_lvl &= 7;
            op.delay &= 7;
        }
        Translation::operators(bank)
    }
}

// ============================================================================
// 4-operator FM
// ============================================================================

/// 4-op FM mapped through the algorithm table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FourOpFm {
    /// Source rates are 4 bits and levels 6 bits.
    pub narrow: bool,
    /// The envelope-type flag marks fixed-frequency operators.
    pub fixed_from_egt: bool,
}

impl FourOpFm {
    /// OPN family.
    pub const OPN: FourOpFm = FourOpFm {
        narrow: false,
        fixed_from_egt: false,
    };
    /// OPM.
    pub const OPM: FourOpFm = FourOpFm {
        narrow: false,
        fixed_from_egt: false,
    };
    /// OPZ.
    pub const OPZ: FourOpFm = FourOpFm {
        narrow: false,
        fixed_from_egt: true,
    };
    /// OPL in 4-op mode.
    pub const OPL: FourOpFm = FourOpFm {
        narrow: true,
        fixed_from_egt: false,
    };
}

impl SynthModel for FourOpFm {
    type Params = FmPatch;

    fn translate(&self, params: &FmPatch, _ctx: &TranslateContext) -> Translation {
        let routes = routing::four_op(params.alg, params.fb);
        let mut bank = OperatorBank {
            ops: params.ops,
            fms: params.fms,
            ams: params.ams,
        };

        for (op, (mod_in, out_lvl)) in bank.ops.iter_mut().zip(routes) {
            map_waveform(op);
            if self.narrow {
                widen_envelope(op);
                op.d2r = if op.egt { 0 } else { FAST_SECOND_DECAY };
            }
            let fixed = self.fixed_from_egt && op.egt;
            clear_routing(op);
            op.fixed = fixed;
            op.set_routing(mod_in, out_lvl);
        }

        Translation::operators(bank)
    }
}

// ============================================================================
// 2-operator FM
// ============================================================================

/// 2-op FM on operators 0 and 1; operators 2 and 3 are silenced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TwoOpFm {
    /// OPLL: 4-bit carrier level, sustain flag, shared LFO depth.
    pub opll: bool,
}

impl TwoOpFm {
    /// OPL family.
    pub const OPL: TwoOpFm = TwoOpFm { opll: false };
    /// OPLL.
    pub const OPLL: TwoOpFm = TwoOpFm { opll: true };
}

impl SynthModel for TwoOpFm {
    type Params = FmPatch;

    fn translate(&self, params: &FmPatch, _ctx: &TranslateContext) -> Translation {
        let routes = routing::two_op(params.alg, params.fb);
        let mut bank = OperatorBank {
            ops: params.ops,
            fms: params.fms,
            ams: params.ams,
        };

        for (o, op) in bank.ops.iter_mut().enumerate() {
            if o >= routes.len() {
                *op = op.silenced();
                clear_routing(op);
                continue;
            }

            map_waveform(op);
            op.ar = widen_rate(op.ar);
            op.dr = widen_rate(op.dr);
            if self.opll {
                op.tl = if o == 0 {
                    widen_level(op.tl)
                } else {
                    opll_carrier_level(op.tl)
                };
                op.d2r = if op.sus { 0 } else { FAST_SECOND_DECAY };
                op.rs = if op.ksr { 3 } else { 0 };
                op.dam = params.ams & 1 != 0;
                op.dvb = params.fms & 1 != 0;
            } else {
                op.tl = widen_level(op.tl);
                op.d2r = if op.egt { 0 } else { FAST_SECOND_DECAY };
            }

            clear_routing(op);
            let (mod_in, out_lvl) = routes[o];
            op.set_routing(mod_in, out_lvl);
        }

        Translation::operators(bank)
    }
}
