//! Conversions between split (left/right) and linear panning.

/// Linear pan from split levels, in `0..=range`; equal levels give the middle.
pub fn split_to_linear(left: u8, right: u8, range: i32) -> i32 {
    let (l, r) = (f32::from(left), f32::from(right));
    let pan = if left == right {
        0.5
    } else if left > right {
        0.5 * (r / l)
    } else {
        1.0 - 0.5 * (l / r)
    };
    (pan * range as f32) as i32
}

/// Split levels from a linear pan in `0..=range`, packed as `left << bits | right`.
pub fn linear_to_split(value: i32, bits: u8, range: i32) -> u16 {
    let range = range.max(1);
    let value = value.clamp(0, range);
    let max = (1i32 << bits) - 1;
    let left = (((range - value) * max * 2) / range).min(max);
    let right = ((value * max * 2) / range).min(max);
    ((left << bits) | right) as u16
}
