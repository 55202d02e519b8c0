//! Bounded retention window of sample buffers.
//!
//! A FIFO of retained buffers with an exactly maintained total sample
//! count. The trim state machine uses it for pre-silence lookback, for the
//! bounded forwarding lag during sound, and for the end-of-stream backward
//! scan.

use std::collections::VecDeque;

use crate::buffering::SampleBuffer;
use crate::error::Result;
use crate::sink::BufferSink;

#[derive(Debug, Default)]
pub(crate) struct BufferWindow {
    buffers: VecDeque<SampleBuffer>,
    retained_samples: u64,
}

impl BufferWindow {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, buf: SampleBuffer) {
        self.retained_samples += buf.len() as u64;
        self.buffers.push_back(buf);
    }

    pub(crate) fn evict_oldest(&mut self) -> Option<SampleBuffer> {
        let buf = self.buffers.pop_front()?;
        self.retained_samples -= buf.len() as u64;
        Some(buf)
    }

    pub(crate) fn retained_samples(&self) -> u64 {
        self.retained_samples
    }

    /// Stream position of the oldest retained sample.
    pub(crate) fn oldest_offset(&self) -> Option<u64> {
        self.buffers.front().map(|b| b.offset())
    }

    /// Stream position one past the newest retained sample.
    pub(crate) fn end_offset(&self) -> Option<u64> {
        self.buffers.back().map(|b| b.end_offset())
    }

    /// Newest-to-oldest iteration, for the end-of-stream backward scan.
    pub(crate) fn iter_rev(&self) -> impl Iterator<Item = &SampleBuffer> {
        self.buffers.iter().rev()
    }

    /// Forward every retained sample at or after `cutoff` to the sink,
    /// splitting a straddling buffer exactly at `cutoff`; discard the rest.
    /// Leaves the window empty.
    pub(crate) fn flush_after(&mut self, cutoff: i64, sink: &mut dyn BufferSink) -> Result<()> {
        while let Some(buf) = self.evict_oldest() {
            if (buf.end_offset() as i64) <= cutoff {
                continue;
            }
            let out = match buf.tail(cutoff) {
                Some(tail) => tail,
                None => continue,
            };
            sink.push(out)?;
        }
        Ok(())
    }

    /// Forward every retained sample before `cutoff` to the sink, splitting
    /// a straddling buffer exactly at `cutoff`; discard the rest. Leaves
    /// the window empty.
    pub(crate) fn flush_before(&mut self, cutoff: i64, sink: &mut dyn BufferSink) -> Result<()> {
        while let Some(buf) = self.evict_oldest() {
            if buf.offset() as i64 >= cutoff {
                continue;
            }
            let out = match buf.head(cutoff) {
                Some(head) => head,
                None => continue,
            };
            sink.push(out)?;
        }
        Ok(())
    }

    pub(crate) fn clear(&mut self) {
        self.buffers.clear();
        self.retained_samples = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    const RATE: u32 = 48_000;

    fn buf(offset: u64, len: usize) -> SampleBuffer {
        SampleBuffer::new(vec![0.25; len], offset, RATE)
    }

    #[test]
    fn retained_total_tracks_append_and_evict() {
        let mut w = BufferWindow::new();
        w.push(buf(0, 100));
        w.push(buf(100, 50));
        assert_eq!(w.retained_samples(), 150);
        assert_eq!(w.evict_oldest().map(|b| b.len()), Some(100));
        assert_eq!(w.retained_samples(), 50);
        w.clear();
        assert_eq!(w.retained_samples(), 0);
        assert!(w.buffers.is_empty());
    }

    #[test]
    fn retained_total_matches_contents_over_random_operations() {
        let mut rng = StdRng::seed_from_u64(0x5eed);
        let mut w = BufferWindow::new();
        let mut offset = 0u64;
        for _ in 0..1_000 {
            if rng.gen_bool(0.6) || w.buffers.is_empty() {
                let len = rng.gen_range(1..256);
                w.push(buf(offset, len));
                offset += len as u64;
            } else {
                w.evict_oldest();
            }
            let actual: u64 = w.buffers.iter().map(|b| b.len() as u64).sum();
            assert_eq!(w.retained_samples(), actual);
        }
    }

    #[test]
    fn flush_after_splits_at_the_cutoff() {
        let mut w = BufferWindow::new();
        w.push(buf(0, 100));
        w.push(buf(100, 100));
        w.push(buf(200, 100));

        let mut sink: Vec<SampleBuffer> = Vec::new();
        w.flush_after(150, &mut sink).expect("flush");

        assert!(w.buffers.is_empty());
        assert_eq!(w.retained_samples(), 0);
        assert_eq!(sink.len(), 2);
        assert_eq!(sink[0].offset(), 150);
        assert_eq!(sink[0].end_offset(), 200);
        assert_eq!(sink[1].offset(), 200);
    }

    #[test]
    fn flush_before_splits_at_the_cutoff() {
        let mut w = BufferWindow::new();
        w.push(buf(0, 100));
        w.push(buf(100, 100));
        w.push(buf(200, 100));

        let mut sink: Vec<SampleBuffer> = Vec::new();
        w.flush_before(150, &mut sink).expect("flush");

        assert!(w.buffers.is_empty());
        assert_eq!(sink.len(), 2);
        assert_eq!(sink[0].offset(), 0);
        assert_eq!(sink[1].offset(), 100);
        assert_eq!(sink[1].end_offset(), 150);
    }

    #[test]
    fn negative_cutoff_forwards_everything() {
        let mut w = BufferWindow::new();
        w.push(buf(0, 100));
        let mut sink: Vec<SampleBuffer> = Vec::new();
        w.flush_after(-480, &mut sink).expect("flush");
        assert_eq!(sink.len(), 1);
        assert_eq!(sink[0].len(), 100);
    }

    #[test]
    fn flush_preserves_arrival_order() {
        let mut w = BufferWindow::new();
        for i in 0..10u64 {
            w.push(buf(i * 64, 64));
        }
        let mut sink: Vec<SampleBuffer> = Vec::new();
        w.flush_after(0, &mut sink).expect("flush");
        let offsets: Vec<u64> = sink.iter().map(|b| b.offset()).collect();
        let mut sorted = offsets.clone();
        sorted.sort_unstable();
        assert_eq!(offsets, sorted);
    }
}
