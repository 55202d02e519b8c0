//! Positioned sample buffers and stream time arithmetic.
//!
//! A [`SampleBuffer`] is a view into a reference-counted payload. Splitting a
//! buffer never copies samples: head and tail share the source payload and
//! carry independently recomputed offsets. The trim state machine relies on
//! this to slice at exact sample positions without reallocating.

use std::ops::Range;
use std::sync::Arc;
use std::time::Duration;

pub(crate) const NANOS_PER_SEC: u64 = 1_000_000_000;

/// Convert a duration to a sample count at `sample_rate` (truncating).
pub(crate) fn duration_to_samples(d: Duration, sample_rate: u32) -> u64 {
    (d.as_nanos() * sample_rate as u128 / NANOS_PER_SEC as u128) as u64
}

/// Convert a sample count to stream time in nanoseconds.
pub(crate) fn samples_to_ns(samples: u64, sample_rate: u32) -> u64 {
    (samples as u128 * NANOS_PER_SEC as u128 / sample_rate as u128) as u64
}

/// Convert a sample count to a `Duration`.
pub(crate) fn samples_to_duration(samples: u64, sample_rate: u32) -> Duration {
    Duration::from_nanos(samples_to_ns(samples, sample_rate))
}

/// A contiguous block of mono f32 samples with a stream position.
///
/// `offset` is the absolute position of the first sample in the stream.
/// Buffers are moved between the producer, the retention window and the sink;
/// they are sliced but never duplicated.
#[derive(Debug, Clone)]
pub struct SampleBuffer {
    payload: Arc<[f32]>,
    range: Range<usize>,
    offset: u64,
    sample_rate: u32,
}

impl SampleBuffer {
    pub fn new(samples: Vec<f32>, offset: u64, sample_rate: u32) -> Self {
        let len = samples.len();
        Self {
            payload: Arc::from(samples),
            range: 0..len,
            offset,
            sample_rate,
        }
    }

    /// A zero-duration marker buffer at the given stream position.
    ///
    /// Forwarded at stream start so downstream elements see the original
    /// start timestamp even when leading audio is trimmed away.
    pub fn marker(offset: u64, sample_rate: u32) -> Self {
        Self {
            payload: Arc::from(Vec::new()),
            range: 0..0,
            offset,
            sample_rate,
        }
    }

    pub fn samples(&self) -> &[f32] {
        &self.payload[self.range.clone()]
    }

    pub fn len(&self) -> usize {
        self.range.len()
    }

    pub fn is_empty(&self) -> bool {
        self.range.is_empty()
    }

    /// Stream position of the first sample.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Stream position one past the last sample.
    pub fn end_offset(&self) -> u64 {
        self.offset + self.len() as u64
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn timestamp(&self) -> Duration {
        samples_to_duration(self.offset, self.sample_rate)
    }

    pub fn duration(&self) -> Duration {
        samples_to_duration(self.len() as u64, self.sample_rate)
    }

    /// All samples before stream position `pos`.
    ///
    /// `None` if the buffer lies entirely at or after `pos`; the whole buffer
    /// if it lies entirely before.
    pub fn head(&self, pos: i64) -> Option<SampleBuffer> {
        if pos <= self.offset as i64 {
            return None;
        }
        if pos >= self.end_offset() as i64 {
            return Some(self.clone());
        }
        let cut = (pos - self.offset as i64) as usize;
        Some(SampleBuffer {
            payload: Arc::clone(&self.payload),
            range: self.range.start..self.range.start + cut,
            offset: self.offset,
            sample_rate: self.sample_rate,
        })
    }

    /// All samples at or after stream position `pos`.
    pub fn tail(&self, pos: i64) -> Option<SampleBuffer> {
        if pos >= self.end_offset() as i64 {
            return None;
        }
        if pos <= self.offset as i64 {
            return Some(self.clone());
        }
        let cut = (pos - self.offset as i64) as usize;
        Some(SampleBuffer {
            payload: Arc::clone(&self.payload),
            range: self.range.start + cut..self.range.end,
            offset: self.offset + cut as u64,
            sample_rate: self.sample_rate,
        })
    }

    /// The intersection of this buffer with `[start, end)`.
    ///
    /// `None` when the intersection is empty. The whole buffer is returned
    /// (no new view) when it is fully contained in the range.
    pub fn slice(&self, start: i64, end: i64) -> Option<SampleBuffer> {
        if start >= end
            || start >= self.end_offset() as i64
            || end <= self.offset as i64
        {
            return None;
        }
        if start <= self.offset as i64 && end >= self.end_offset() as i64 {
            return Some(self.clone());
        }
        let start = start.max(self.offset as i64);
        let end = end.min(self.end_offset() as i64);
        let from = (start - self.offset as i64) as usize;
        let to = (end - self.offset as i64) as usize;
        Some(SampleBuffer {
            payload: Arc::clone(&self.payload),
            range: self.range.start + from..self.range.start + to,
            offset: self.offset + from as u64,
            sample_rate: self.sample_rate,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buffer(offset: u64, samples: Vec<f32>) -> SampleBuffer {
        SampleBuffer::new(samples, offset, 48_000)
    }

    #[test]
    fn duration_and_timestamp_derive_from_offset() {
        let buf = buffer(48_000, vec![0.0; 24_000]);
        assert_eq!(buf.timestamp(), Duration::from_secs(1));
        assert_eq!(buf.duration(), Duration::from_millis(500));
        assert_eq!(buf.end_offset(), 72_000);
    }

    #[test]
    fn split_is_lossless_for_any_cut() {
        let samples: Vec<f32> = (0..100).map(|i| i as f32).collect();
        let buf = buffer(1_000, samples.clone());

        for k in 1_000..=1_100i64 {
            let head = buf.head(k);
            let tail = buf.tail(k);
            let mut joined = Vec::new();
            let mut pos = 1_000u64;
            if let Some(h) = &head {
                assert_eq!(h.offset(), 1_000);
                joined.extend_from_slice(h.samples());
                pos = h.end_offset();
            }
            if let Some(t) = &tail {
                assert_eq!(t.offset(), pos);
                joined.extend_from_slice(t.samples());
                pos = t.end_offset();
            }
            assert_eq!(joined, samples, "cut at {k}");
            assert_eq!(pos, 1_100);
        }
    }

    #[test]
    fn head_and_tail_outside_bounds() {
        let buf = buffer(10, vec![1.0; 5]);
        assert!(buf.head(10).is_none());
        assert!(buf.head(5).is_none());
        assert_eq!(buf.head(15).map(|b| b.len()), Some(5));
        assert!(buf.tail(15).is_none());
        assert_eq!(buf.tail(3).map(|b| b.len()), Some(5));
    }

    #[test]
    fn slice_clamps_to_buffer_extent() {
        let buf = buffer(100, vec![1.0; 50]);
        let sub = buf.slice(90, 120).expect("overlap");
        assert_eq!(sub.offset(), 100);
        assert_eq!(sub.end_offset(), 120);

        assert!(buf.slice(150, 200).is_none());
        assert!(buf.slice(50, 100).is_none());
        assert!(buf.slice(120, 120).is_none());
    }

    #[test]
    fn slices_share_the_source_payload() {
        let buf = buffer(0, vec![1.0; 64]);
        let head = buf.head(32).expect("head");
        assert!(Arc::ptr_eq(&buf.payload, &head.payload));
    }

    #[test]
    fn marker_has_zero_duration() {
        let m = SampleBuffer::marker(48_000, 48_000);
        assert!(m.is_empty());
        assert_eq!(m.duration(), Duration::ZERO);
        assert_eq!(m.timestamp(), Duration::from_secs(1));
    }
}
