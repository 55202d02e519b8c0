//! Locate the useful-audio span of a power series.
//!
//! Forward scan for the first sub-block strictly above the trim level,
//! backward scan for the last. The start gets a one-sub-block lookback and
//! the end a two-sub-block lookahead; the asymmetry is kept for behavioral
//! compatibility with earlier releases.

use crate::analysis::series::PowerSeriesStore;
use crate::buffering::NANOS_PER_SEC;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct TrimBoundaries {
    pub(crate) start_ns: u64,
    pub(crate) end_ns: u64,
}

/// Span of the series above `trim_level`, or the full span when nothing
/// exceeds it. `None` only for an empty series.
pub(crate) fn locate(
    store: &PowerSeriesStore,
    trim_level: f32,
    sub_block_ns: u64,
    sub_block_sample_count: u64,
    sample_rate: u32,
) -> Option<TrimBoundaries> {
    let chunks = store.chunks();
    let first_chunk = chunks.first()?;
    let last_chunk = chunks.last()?;

    let first_ns = first_chunk.timestamp_ns();
    let last_ns = last_chunk.timestamp_ns()
        + (last_chunk.values().len() as u128 * sub_block_sample_count as u128
            * NANOS_PER_SEC as u128
            / sample_rate as u128) as u64;

    // First sub-block above the trim level, with a one-sub-block lookback.
    let mut start_ns = first_ns as i64;
    'forward: for chunk in chunks {
        for (i, &power) in chunk.values().iter().enumerate() {
            if power > trim_level {
                start_ns = chunk.timestamp_ns() as i64 + sub_block_ns as i64 * (i as i64 - 1);
                break 'forward;
            }
        }
    }
    let start_ns = start_ns.max(first_ns as i64) as u64;

    // Last sub-block above the trim level, with a two-sub-block lookahead.
    let mut end_ns = last_ns;
    'backward: for chunk in chunks.iter().rev() {
        for (i, &power) in chunk.values().iter().enumerate().rev() {
            if power > trim_level {
                end_ns = chunk.timestamp_ns() + sub_block_ns * (i as u64 + 2);
                break 'backward;
            }
        }
    }
    let end_ns = end_ns.min(last_ns);

    Some(TrimBoundaries { start_ns, end_ns })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SUB_BLOCK_NS: u64 = 100_000_000;
    const RATE: u32 = 48_000;
    const SUB_BLOCK_SAMPLES: u64 = 4_800;

    fn store_of(values: &[f32]) -> PowerSeriesStore {
        let mut store = PowerSeriesStore::new();
        for (i, &v) in values.iter().enumerate() {
            store.push(v, i as u64 * SUB_BLOCK_NS).expect("push");
        }
        store
    }

    fn locate_in(values: &[f32], trim_level: f32) -> TrimBoundaries {
        locate(
            &store_of(values),
            trim_level,
            SUB_BLOCK_NS,
            SUB_BLOCK_SAMPLES,
            RATE,
        )
        .expect("non-empty series")
    }

    #[test]
    fn empty_series_has_no_boundaries() {
        assert!(locate(&PowerSeriesStore::new(), 0.1, SUB_BLOCK_NS, SUB_BLOCK_SAMPLES, RATE)
            .is_none());
    }

    #[test]
    fn nothing_above_level_returns_full_span() {
        let b = locate_in(&[0.01; 40], 0.1);
        assert_eq!(b.start_ns, 0);
        assert_eq!(b.end_ns, 40 * SUB_BLOCK_NS);
    }

    #[test]
    fn loud_middle_gets_lookback_and_lookahead() {
        // 40 sub-blocks, loud in [10, 30).
        let mut values = vec![0.0f32; 40];
        for v in &mut values[10..30] {
            *v = 0.5;
        }
        let b = locate_in(&values, 0.1);
        assert_eq!(b.start_ns, 9 * SUB_BLOCK_NS);
        assert_eq!(b.end_ns, 31 * SUB_BLOCK_NS);
    }

    #[test]
    fn boundaries_clamp_to_the_series_span() {
        // Loud from the very first and very last sub-block: the lookback
        // would precede the series and the lookahead would pass its end.
        let b = locate_in(&[0.5; 40], 0.1);
        assert_eq!(b.start_ns, 0);
        assert_eq!(b.end_ns, 40 * SUB_BLOCK_NS);
    }

    #[test]
    fn single_sub_block_series_spans_one_sub_block()  {
        let b = locate_in(&[0.5], 0.1);
        assert_eq!(b.start_ns, 0);
        assert_eq!(b.end_ns, SUB_BLOCK_NS);
    }

    #[test]
    fn offsets_respect_chunk_local_indices() {
        // Put the loud sub-block just past a chunk boundary so the index
        // arithmetic uses the chunk's own timestamp.
        let n = crate::analysis::series::CHUNK_CAPACITY + 3;
        let mut values = vec![0.0f32; n];
        values[crate::analysis::series::CHUNK_CAPACITY + 1] = 0.9;
        let b = locate_in(&values, 0.1);
        let loud = (crate::analysis::series::CHUNK_CAPACITY + 1) as u64;
        assert_eq!(b.start_ns, (loud - 1) * SUB_BLOCK_NS);
        assert_eq!(b.end_ns, (loud + 2) * SUB_BLOCK_NS);
    }
}
