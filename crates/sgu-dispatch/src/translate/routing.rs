//! Algorithm to operator routing.
//!
//! The chip chains its operators: each one is modulated by the previous one
//! at its `mod_in` depth (operator 0 by itself, as feedback) and mixed into
//! the output at its `out_lvl`. Legacy algorithms are mapped onto that chain.
//!
//! Algorithms that feed two modulators into one operator cannot be expressed
//! exactly. The upstream modulator is chained into its neighbour at reduced
//! depth so it still shapes the sound.

use sgu_common::OPERATORS_PER_CHANNEL;

use crate::operator::Operator;

/// Modulation input depth meaning "fully driven by the previous operator".
pub const FULL_DEPTH: u8 = 7;

/// Reduced depth used for parallel modulators folded into the chain.
pub const PARALLEL_DEPTH: u8 = 4;

/// Output level of a carrier.
pub const CARRIER: u8 = 7;

/// `(mod_in, out_lvl)` per operator for the eight 4-op algorithms.
///
/// Operator 0's `mod_in` is replaced by the patch feedback.
pub const FOUR_OP_ROUTING: [[(u8, u8); OPERATORS_PER_CHANNEL]; 8] = [
    // 1 > 2 > 3 > 4
    [(0, 0), (FULL_DEPTH, 0), (FULL_DEPTH, 0), (FULL_DEPTH, CARRIER)],
    // (1 + 2) > 3 > 4
    [(0, 0), (PARALLEL_DEPTH, 0), (FULL_DEPTH, 0), (FULL_DEPTH, CARRIER)],
    // 1 + (2 > 3) > 4
    [(0, 0), (PARALLEL_DEPTH, 0), (FULL_DEPTH, 0), (FULL_DEPTH, CARRIER)],
    // (1 > 2) + 3 > 4
    [(0, 0), (FULL_DEPTH, 0), (PARALLEL_DEPTH, 0), (FULL_DEPTH, CARRIER)],
    // (1 > 2) + (3 > 4)
    [(0, 0), (FULL_DEPTH, CARRIER), (0, 0), (FULL_DEPTH, CARRIER)],
    // 1 > (2 + 3 + 4)
    [
        (0, 0),
        (FULL_DEPTH, CARRIER),
        (FULL_DEPTH, CARRIER),
        (FULL_DEPTH, CARRIER),
    ],
    // (1 > 2) + 3 + 4
    [(0, 0), (FULL_DEPTH, CARRIER), (0, CARRIER), (0, CARRIER)],
    // 1 + 2 + 3 + 4
    [(0, CARRIER), (0, CARRIER), (0, CARRIER), (0, CARRIER)],
];

/// Routing for a 4-op algorithm with feedback on operator 0.
pub fn four_op(alg: u8, fb: u8) -> [(u8, u8); OPERATORS_PER_CHANNEL] {
    let mut row = FOUR_OP_ROUTING[(alg & 7) as usize];
    row[0].0 = fb & 7;
    row
}

/// Routing for a 2-op algorithm: bit 0 selects additive over serial.
pub fn two_op(alg: u8, fb: u8) -> [(u8, u8); 2] {
    if alg & 1 != 0 {
        [(fb & 7, CARRIER), (0, CARRIER)]
    } else {
        [(fb & 7, 0), (FULL_DEPTH, CARRIER)]
    }
}

/// Enabled operators that neither reach the output nor modulate the next
/// operator in the chain.
pub fn stranded_operators(ops: &[Operator; OPERATORS_PER_CHANNEL]) -> Vec<usize> {
    (0..OPERATORS_PER_CHANNEL)
        .filter(|&o| {
            let op = &ops[o];
            let outputs = op.out_lvl & 7 != 0;
            let modulates = o + 1 < OPERATORS_PER_CHANNEL && ops[o + 1].mod_in & 7 != 0;
            op.enable && !outputs && !modulates
        })
        .collect()
}
