//! Gated integrated loudness over a power series.
//!
//! Two passes of the same sliding-window scan: pass one gates against an
//! absolute floor and its result sets the relative threshold for pass two.
//! Both passes share window length, step and the strict `>` comparison.

use crate::analysis::series::PowerSeriesStore;

/// Scale from the gated mean to the reported loudness figure (-0.691 dB).
const LKFS_SCALE: f32 = 0.852_903_703_071;

/// Absolute gate floor: 10^((-70 + 0.691) / 10).
fn absolute_threshold() -> f32 {
    10f32.powf((-70.0 + 0.691) / 10.0)
}

/// Integrated loudness of the whole series.
pub(crate) fn gated_loudness(
    store: &PowerSeriesStore,
    block_length: u32,
    block_overlap: u32,
) -> f32 {
    let step = block_length - block_overlap;
    let relative_threshold =
        gated_pass(store, block_length, step, absolute_threshold()) * 0.1;
    LKFS_SCALE * gated_pass(store, block_length, step, relative_threshold)
}

/// One sliding-window gating pass.
///
/// Returns the mean power of all windows whose sum strictly exceeds
/// `threshold`. A series shorter than one window falls back to the plain
/// average of whatever sub-blocks exist; an empty series gives 0.0. The
/// window formed by the advance that exhausts the series is not evaluated.
fn gated_pass(store: &PowerSeriesStore, block_length: u32, step: u32, threshold: f32) -> f32 {
    let mut head = store.cursor();
    let mut tail = store.cursor();

    // Prime the first window.
    let mut block_power = 0.0f32;
    let mut primed = 0u32;
    while primed < block_length {
        match head.next() {
            Some(v) => {
                block_power += v;
                primed += 1;
            }
            None => break,
        }
    }
    if primed == 0 {
        return 0.0;
    }
    if primed != block_length {
        return block_power / primed as f32;
    }

    let mut total_power = 0.0f32;
    let mut count = 0u32;
    loop {
        if block_power > threshold {
            total_power += block_power;
            count += 1;
        }
        let mut advanced = 0u32;
        while advanced < step && head.has_next() {
            if let Some(v) = head.next() {
                block_power += v;
            }
            if let Some(v) = tail.next() {
                block_power -= v;
            }
            advanced += 1;
        }
        if !head.has_next() {
            break;
        }
    }
    if count == 0 {
        return 0.0;
    }
    total_power / (count * block_length) as f32
}
