use sgu_dispatch::pitch::{PitchTable, clamp_frequency};
use sgu_dispatch::translate::routing::stranded_operators;
use sgu_dispatch::translate::{
    TranslateContext, cutoff_from_legacy, duty_from_legacy, opll_carrier_level, widen_level,
    widen_rate,
};
use sgu_dispatch::{CompatFlags, FmPatch, Instrument, Patch, SidPatch, translate};

fn assert_non_decreasing(name: &str, values: impl IntoIterator<Item = u32>) {
    let values: Vec<u32> = values.into_iter().collect();
    for pair in values.windows(2) {
        assert!(pair[0] <= pair[1], "{name} decreases: {} > {}", pair[0], pair[1]);
    }
}

#[test]
fn width_conversions_are_monotonic() {
    assert_non_decreasing("rate", (0..=15u8).map(|v| u32::from(widen_rate(v))));
    assert_non_decreasing("level", (0..=63u8).map(|v| u32::from(widen_level(v))));
    assert_non_decreasing(
        "carrier level",
        (0..=15u8).map(|v| u32::from(opll_carrier_level(v))),
    );
    assert_non_decreasing("duty", (0..=4095u16).map(|v| u32::from(duty_from_legacy(v))));
    assert_non_decreasing(
        "cutoff",
        (0..=2047u16).map(|v| u32::from(cutoff_from_legacy(v))),
    );
}

#[test]
fn legacy_maximum_maps_to_native_maximum() {
    assert_eq!(widen_rate(15), 31);
    assert_eq!(widen_level(63), 127);
    assert_eq!(duty_from_legacy(4095), 127);
    assert_eq!(cutoff_from_legacy(2047), 0xFFFF);
    assert_eq!(widen_rate(0), 1);
    assert_eq!(cutoff_from_legacy(0), 0);
}

fn fm_patches(alg: u8, fb: u8) -> Vec<Patch> {
    let fm = FmPatch {
        alg,
        fb,
        ..FmPatch::DEFAULT
    };
    let four_op = FmPatch {
        four_op: true,
        ..fm
    };
    vec![
        Patch::Opn(fm),
        Patch::Opm(fm),
        Patch::Opz(fm),
        Patch::Opl(fm),
        Patch::Opl(four_op),
        Patch::Opll(fm),
    ]
}

#[test]
fn every_algorithm_routes_every_enabled_operator() {
    let ctx = TranslateContext::default();
    for alg in 0..8 {
        for fb in [0, 3, 7] {
            for patch in fm_patches(alg, fb) {
                let instrument = Instrument::new("fm", patch);
                let t = translate(&instrument, &ctx);
                let bank = t.bank().copied().unwrap_or_default();
                assert!(
                    stranded_operators(&bank.ops).is_empty(),
                    "{:?} alg {alg} fb {fb} strands operators {:?}",
                    instrument.kind(),
                    stranded_operators(&bank.ops)
                );
            }
        }
    }
}

#[test]
fn single_oscillator_models_route_the_carrier_only() {
    let ctx = TranslateContext::default();
    for patch in [
        Patch::C64(SidPatch::default()),
        Patch::Sid2(SidPatch::default()),
        Patch::SoundUnit,
        Patch::Pokey,
    ] {
        let instrument = Instrument::new("voice", patch);
        let t = translate(&instrument, &ctx);
        let bank = t.bank().copied().unwrap_or_default();
        assert!(stranded_operators(&bank.ops).is_empty());
        assert_eq!(bank.ops.iter().filter(|op| op.enable).count(), 1);
    }
}

#[test]
fn computed_frequencies_fit_the_register() {
    for linear in [false, true] {
        let compat = CompatFlags::default().linear_pitch(linear);
        for clock in [1, 1_000_000, 100_000_000] {
            let table = PitchTable::new(clock, &compat);
            for note in [i32::MIN, -1000, 0, 57, 119, 1000, i32::MAX] {
                for pitch in [i32::MIN, -4096, 0, 4096, i32::MAX] {
                    let base = table.note_frequency(note);
                    let freq = i32::from(clamp_frequency(table.calc_freq(base, pitch, pitch)));
                    assert!((0..=0xFFFF).contains(&freq));
                }
            }
        }
    }
}
