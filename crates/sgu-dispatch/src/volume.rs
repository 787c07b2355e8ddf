//! Channel volume scaling.
//!
//! Channel volume (0-127) is combined with the volume macro differently per
//! model. OPLL voices are squeezed through the source chip's 16-step volume
//! so automation sounds as coarse as it did there.

use crate::config::CompatFlags;
use crate::instrument::ModelKind;

/// Highest channel volume.
pub const MAX_VOLUME: i32 = 127;

/// How a model combines channel volume and the volume macro.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VolumeModel {
    /// Sample playback: 64-step macro.
    Sample,
    /// OPLL: 16-step volume.
    Opll,
    /// Everything else: 128-step macro.
    Direct,
}

impl VolumeModel {
    /// Volume model for an instrument kind.
    pub fn for_kind(kind: ModelKind) -> Self {
        match kind {
            ModelKind::Sample => VolumeModel::Sample,
            ModelKind::Opll => VolumeModel::Opll,
            _ => VolumeModel::Direct,
        }
    }

    /// Output volume for channel volume `vol` under macro value `value`.
    pub fn scale(self, vol: i32, value: i32, compat: &CompatFlags) -> i32 {
        match self {
            VolumeModel::Sample => ((vol & 127) * value.clamp(0, 64)) >> 6,
            VolumeModel::Opll => opll_volume(vol, value, compat),
            VolumeModel::Direct => ((vol & 127) * value.clamp(0, 127)) >> 7,
        }
    }

    /// Output volume when no volume macro is running.
    pub fn unscaled(self, vol: i32, compat: &CompatFlags) -> i32 {
        match self {
            VolumeModel::Opll => opll_volume(vol, 15, compat),
            _ => vol,
        }
    }
}

/// Two-stage OPLL volume: 127 to 15 steps, combine, back to 127.
pub fn opll_volume(vol: i32, value: i32, compat: &CompatFlags) -> i32 {
    let base15 = (vol.clamp(0, MAX_VOLUME) * 15 + 63) / 127;
    let macro15 = value.clamp(0, 15);
    let vol15 = if compat.new_volume_scaling {
        scale_log(base15, macro15, 15)
    } else {
        scale_linear(base15, macro15, 15, compat.ceil_volume_scaling)
    };
    (vol15 * 127 + 7) / 15
}

/// Additive combination in attenuation space.
pub fn scale_log(x: i32, y: i32, range: i32) -> i32 {
    (x + y - range).clamp(0, range)
}

/// Multiplicative combination.
pub fn scale_linear(x: i32, y: i32, range: i32, ceil: bool) -> i32 {
    if ceil {
        (x * y + (range - 1)) / range
    } else {
        (x * y) / range
    }
}
