//! Exponential-average activity detector on raw samples.
//!
//! Independent of the loudness path: different filter, different threshold,
//! different purpose. `acc = acc * decay + |sample|`; a position is active
//! once the accumulator reaches `threshold_percent / (100 * (1 - decay))`.
//!
//! Accumulator state persists across buffers within one scanning pass.
//! Forward and backward passes never share state; build a fresh detector
//! for each independent pass.

#[derive(Debug, Clone)]
pub(crate) struct SilenceDetector {
    decay: f32,
    threshold: f32,
    accumulator: f32,
}

impl SilenceDetector {
    pub(crate) fn new(threshold_percent: f32, decay: f32) -> Self {
        Self {
            decay,
            threshold: threshold_percent / (100.0 * (1.0 - decay)),
            accumulator: 0.0,
        }
    }

    pub(crate) fn reset(&mut self) {
        self.accumulator = 0.0;
    }

    /// Forward scan: index of the first sample at which the accumulator
    /// reaches the threshold, or `None` if the whole buffer is silent.
    pub(crate) fn find_activity(&mut self, samples: &[f32]) -> Option<usize> {
        for (i, &s) in samples.iter().enumerate() {
            self.accumulator = self.accumulator * self.decay + s.abs();
            if self.accumulator >= self.threshold {
                return Some(i);
            }
        }
        None
    }

    /// Forward scan consuming the whole buffer: index of the *last* active
    /// sample, for tracking where an open sound segment trails off.
    pub(crate) fn track_activity(&mut self, samples: &[f32]) -> Option<usize> {
        let mut last = None;
        for (i, &s) in samples.iter().enumerate() {
            self.accumulator = self.accumulator * self.decay + s.abs();
            if self.accumulator >= self.threshold {
                last = Some(i);
            }
        }
        last
    }

    /// Backward scan over `samples[..end]`: index of the sample at which
    /// the accumulator reaches the threshold, or `None`.
    pub(crate) fn find_activity_rev(&mut self, samples: &[f32], end: usize) -> Option<usize> {
        let end = end.min(samples.len());
        for i in (0..end).rev() {
            self.accumulator = self.accumulator * self.decay + samples[i].abs();
            if self.accumulator >= self.threshold {
                return Some(i);
            }
        }
        None
    }
}
