//! Append-only chunked log of sub-block power values.
//!
//! The store accumulates for one recording pass, is read (twice, by the
//! gating passes and the boundary scans) at end-of-stream, and is then
//! released as one unit. Only the newest chunk is partially filled.

use crate::error::{CliptrimError, Result};

/// Power values per chunk.
pub(crate) const CHUNK_CAPACITY: usize = 32;

/// One fixed-capacity run of consecutive power values.
#[derive(Debug)]
pub(crate) struct PowerChunk {
    /// Stream time of the first value's sub-block start, in nanoseconds.
    timestamp_ns: u64,
    /// Sub-block index of the first value.
    start_index: u64,
    values: Vec<f32>,
}

impl PowerChunk {
    fn with_first(power: f32, timestamp_ns: u64, start_index: u64) -> Result<Self> {
        let mut values = Vec::new();
        values
            .try_reserve_exact(CHUNK_CAPACITY)
            .map_err(|e| CliptrimError::Allocation(format!("power chunk: {e}")))?;
        values.push(power);
        Ok(Self {
            timestamp_ns,
            start_index,
            values,
        })
    }

    pub(crate) fn timestamp_ns(&self) -> u64 {
        self.timestamp_ns
    }

    pub(crate) fn values(&self) -> &[f32] {
        &self.values
    }

    fn is_full(&self) -> bool {
        self.values.len() == CHUNK_CAPACITY
    }

    fn end_index(&self) -> u64 {
        self.start_index + self.values.len() as u64
    }
}

#[derive(Debug, Default)]
pub(crate) struct PowerSeriesStore {
    chunks: Vec<PowerChunk>,
}

impl PowerSeriesStore {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Append one power value with the stream time of its sub-block start.
    /// Values must be appended in stream order.
    pub(crate) fn push(&mut self, power: f32, timestamp_ns: u64) -> Result<()> {
        match self.chunks.last_mut() {
            Some(chunk) if !chunk.is_full() => {
                chunk.values.push(power);
            }
            last => {
                let start_index = last.map_or(0, |c| c.end_index());
                self.chunks
                    .push(PowerChunk::with_first(power, timestamp_ns, start_index)?);
            }
        }
        Ok(())
    }

    /// Total sub-blocks recorded.
    pub(crate) fn len(&self) -> u64 {
        self.chunks.last().map_or(0, |c| c.end_index())
    }

    pub(crate) fn chunks(&self) -> &[PowerChunk] {
        &self.chunks
    }

    pub(crate) fn cursor(&self) -> SeriesCursor<'_> {
        SeriesCursor {
            chunks: &self.chunks,
            chunk: 0,
            pos: 0,
        }
    }
}

/// Forward cursor over the whole series. Two cursors over the same store
/// give the O(N) sliding-window scans their add/subtract ends.
pub(crate) struct SeriesCursor<'a> {
    chunks: &'a [PowerChunk],
    chunk: usize,
    pos: usize,
}

impl SeriesCursor<'_> {
    pub(crate) fn has_next(&self) -> bool {
        self.chunk < self.chunks.len()
    }

    pub(crate) fn next(&mut self) -> Option<f32> {
        let chunk = self.chunks.get(self.chunk)?;
        let v = chunk.values[self.pos];
        self.pos += 1;
        if self.pos == chunk.values.len() {
            self.chunk += 1;
            self.pos = 0;
        }
        Some(v)
    }
}
