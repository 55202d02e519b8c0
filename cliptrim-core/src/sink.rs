//! Destination for forwarded sample buffers.
//!
//! The `BufferSink` trait is the seam between the trim state machine and
//! whatever consumes the trimmed stream (an encoder feed, a channel to
//! another thread, a plain `Vec` in tests). A sink failure aborts the
//! current processing call and propagates to the caller; the state machine
//! itself stays intact.

use crate::buffering::SampleBuffer;
use crate::error::{CliptrimError, Result};

/// Receives forwarded (possibly split) buffers in arrival order.
pub trait BufferSink {
    fn push(&mut self, buf: SampleBuffer) -> Result<()>;
}

impl BufferSink for crossbeam_channel::Sender<SampleBuffer> {
    fn push(&mut self, buf: SampleBuffer) -> Result<()> {
        self.send(buf)
            .map_err(|_| CliptrimError::Downstream("channel disconnected".into()))
    }
}

/// Collecting sink, mainly useful in tests and offline runs.
impl BufferSink for Vec<SampleBuffer> {
    fn push(&mut self, buf: SampleBuffer) -> Result<()> {
        Vec::push(self, buf);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_sink_reports_disconnect() {
        let (mut tx, rx) = crossbeam_channel::unbounded::<SampleBuffer>();
        tx.push(SampleBuffer::new(vec![0.0; 4], 0, 48_000))
            .expect("receiver alive");
        drop(rx);
        let err = tx.push(SampleBuffer::marker(4, 48_000));
        assert!(matches!(err, Err(CliptrimError::Downstream(_))));
    }

    #[test]
    fn vec_sink_collects_in_order() {
        let mut sink: Vec<SampleBuffer> = Vec::new();
        BufferSink::push(&mut sink, SampleBuffer::new(vec![0.0; 4], 0, 48_000))
            .expect("push");
        BufferSink::push(&mut sink, SampleBuffer::new(vec![0.0; 4], 4, 48_000))
            .expect("push");
        assert_eq!(sink.len(), 2);
        assert_eq!(sink[1].offset(), 4);
    }
}
