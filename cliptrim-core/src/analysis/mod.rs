//! Loudness path: weighting prefilter, sub-block power accumulation, and the
//! end-of-stream gated loudness + trim boundary analysis.
//!
//! ## Data flow (per recording pass)
//!
//! ```text
//! samples ─► WeightingFilter ─► square ─► sub-block accumulator
//!                                              │ one power value per sub-block
//!                                              ├─► PowerSeriesStore (kept)
//!                                              └─► PowerEvent (optional metering)
//! finish() ─► gated loudness + trim boundaries ─► AnalysisSummary
//! ```
//!
//! The accumulator state persists across `process()` calls, so sub-blocks
//! may straddle input buffer boundaries.

pub(crate) mod boundary;
pub(crate) mod loudness;
pub(crate) mod prefilter;
pub(crate) mod series;

use std::time::Duration;

use crossbeam_channel::Sender;
use tracing::{debug, info};

use crate::buffering::samples_to_ns;
use crate::config::{sub_block_sample_count, validate_sub_block_length, AnalysisConfig};
use crate::error::Result;
use crate::events::{AnalysisSummary, PowerEvent};

/// Block-wise power and loudness analyzer for one live mono stream.
///
/// Feed samples with [`process`](Self::process); call
/// [`finish`](Self::finish) exactly once at end-of-stream to obtain the
/// summary. `finish` also resets the analyzer for the next pass.
pub struct PowerAnalyzer {
    config: AnalysisConfig,
    sample_rate: u32,
    filter: prefilter::WeightingFilter,
    /// Samples per sub-block under the current configuration.
    sub_block_samples: u64,
    /// Samples still missing from the in-flight sub-block.
    samples_left: u64,
    /// Running sum of squared filtered samples.
    square_acc: f32,
    /// Absolute stream position of the next incoming sample.
    stream_offset: u64,
    store: series::PowerSeriesStore,
    power_tx: Option<Sender<PowerEvent>>,
}

impl PowerAnalyzer {
    pub fn new(config: AnalysisConfig, sample_rate: u32) -> Result<Self> {
        config.validate(sample_rate)?;
        let sub_block_samples = sub_block_sample_count(config.sub_block_length, sample_rate);
        Ok(Self {
            config,
            sample_rate,
            filter: prefilter::WeightingFilter::new(),
            sub_block_samples,
            samples_left: sub_block_samples,
            square_acc: 0.0,
            stream_offset: 0,
            store: series::PowerSeriesStore::new(),
            power_tx: None,
        })
    }

    /// Attach a live metering channel. One event per completed sub-block;
    /// sends are lossy if the receiver has gone away.
    pub fn with_power_events(mut self, tx: Sender<PowerEvent>) -> Self {
        self.power_tx = Some(tx);
        self
    }

    pub fn sub_block_samples(&self) -> u64 {
        self.sub_block_samples
    }

    /// Reconfigure the sub-block length.
    ///
    /// Takes effect from the next completed sub-block; the in-flight
    /// partial sub-block keeps its remaining-sample count.
    pub fn set_sub_block_length(&mut self, length: Duration) -> Result<()> {
        validate_sub_block_length(length, self.sample_rate)?;
        self.config.sub_block_length = length;
        self.sub_block_samples = sub_block_sample_count(length, self.sample_rate);
        debug!(
            sub_block_samples = self.sub_block_samples,
            "sub-block length changed"
        );
        Ok(())
    }

    /// Analyze one buffer of mono samples.
    pub fn process(&mut self, samples: &[f32]) -> Result<()> {
        for (i, &x) in samples.iter().enumerate() {
            let y = self.filter.process(x);
            self.square_acc += y * y;
            self.samples_left -= 1;
            if self.samples_left == 0 {
                let power = self.square_acc / self.sub_block_samples as f32;
                let block_start = (self.stream_offset + i as u64 + 1)
                    .saturating_sub(self.sub_block_samples);
                let timestamp_ns = samples_to_ns(block_start, self.sample_rate);
                self.store.push(power, timestamp_ns)?;
                if let Some(tx) = &self.power_tx {
                    let _ = tx.send(PowerEvent {
                        power,
                        timestamp_ns,
                    });
                }
                self.square_acc = 0.0;
                self.samples_left = self.sub_block_samples;
            }
        }
        self.stream_offset += samples.len() as u64;
        Ok(())
    }

    /// End-of-stream: compute the gated loudness and trim boundaries over
    /// everything recorded, release the series, and reset for a new pass.
    ///
    /// A partial in-flight sub-block is discarded. Emitted exactly once per
    /// pass, after all power events of that pass.
    pub fn finish(&mut self) -> Result<AnalysisSummary> {
        let loudness = loudness::gated_loudness(
            &self.store,
            self.config.block_length,
            self.config.block_overlap,
        );
        let boundaries = boundary::locate(
            &self.store,
            self.config.trim_level,
            self.config.sub_block_length.as_nanos() as u64,
            self.sub_block_samples,
            self.sample_rate,
        );
        let (trim_start_ns, trim_end_ns) =
            boundaries.map_or((0, 0), |b| (b.start_ns, b.end_ns));
        info!(
            loudness,
            sub_blocks = self.store.len(),
            trim_start_ns,
            trim_end_ns,
            "stream analysis complete"
        );
        self.reset();
        Ok(AnalysisSummary {
            loudness,
            trim_start_ns,
            trim_end_ns,
        })
    }

    /// Discard all state, ready for a new recording pass.
    pub fn reset(&mut self) {
        self.filter.reset();
        self.samples_left = self.sub_block_samples;
        self.square_acc = 0.0;
        self.stream_offset = 0;
        self.store = series::PowerSeriesStore::new();
    }
}
