//! Audio rendering.

use sgu_common::{CHANNEL_COUNT, SguBackend};

use super::SguDispatch;

impl<B: SguBackend> SguDispatch<B> {
    /// Render `left.len().min(right.len())` stereo frames.
    ///
    /// Pending register writes are applied before each frame, so writes
    /// queued by a tick take effect on the first frame rendered after it.
    pub fn acquire(&mut self, left: &mut [i16], right: &mut [i16]) {
        for (l, r) in left.iter_mut().zip(right.iter_mut()) {
            self.flush();

            let (out_l, out_r) = self.chip.next_sample();
            *l = clamp_sample(out_l);
            *r = clamp_sample(out_r);

            for ch in 0..CHANNEL_COUNT {
                let sample = self.chip.channel_sample(ch);
                self.osc[ch].push(sample);
            }
        }
    }

    /// Apply pending writes without rendering.
    pub fn flush(&mut self) {
        while let Some(w) = self.queue.pop() {
            self.chip.write(w.addr, w.value);
        }
    }
}

#[inline]
fn clamp_sample(value: i32) -> i16 {
    value.clamp(i32::from(i16::MIN), i32::from(i16::MAX)) as i16
}
