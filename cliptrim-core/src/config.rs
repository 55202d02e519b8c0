//! Configuration for the analysis and trim paths.
//!
//! Both structs validate themselves when handed to an engine constructor.
//! Invalid parameter combinations are rejected with
//! [`CliptrimError::Configuration`] rather than silently clamped.

use std::time::Duration;

use crate::buffering::NANOS_PER_SEC;
use crate::error::{CliptrimError, Result};

/// Upper bound on retention windows. Anything above this would let the
/// buffer window grow without a practical bound.
pub const MAX_RETENTION: Duration = Duration::from_secs(600);

/// Configuration for [`PowerAnalyzer`](crate::PowerAnalyzer).
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    /// Smallest duration used for power measurement. Default: 100 ms.
    pub sub_block_length: Duration,
    /// Gating window length in sub-blocks. Default: 4 (400 ms).
    pub block_length: u32,
    /// Gating window overlap in sub-blocks. Must be less than
    /// `block_length`. Default: 3 (75 % overlap).
    pub block_overlap: u32,
    /// Power level (fraction, not dB) separating useful audio from leading
    /// and trailing silence. Default: 0.1.
    pub trim_level: f32,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            sub_block_length: Duration::from_millis(100),
            block_length: 4,
            block_overlap: 3,
            trim_level: 0.1,
        }
    }
}

impl AnalysisConfig {
    pub(crate) fn validate(&self, sample_rate: u32) -> Result<()> {
        if sample_rate == 0 {
            return Err(CliptrimError::Configuration(
                "sample rate must be positive".into(),
            ));
        }
        if self.block_length == 0 {
            return Err(CliptrimError::Configuration(
                "block_length must be at least one sub-block".into(),
            ));
        }
        if self.block_overlap >= self.block_length {
            return Err(CliptrimError::Configuration(format!(
                "block_overlap ({}) must be less than block_length ({})",
                self.block_overlap, self.block_length
            )));
        }
        if !(0.0..=1.0).contains(&self.trim_level) {
            return Err(CliptrimError::Configuration(format!(
                "trim_level must be within [0, 1], got {}",
                self.trim_level
            )));
        }
        validate_sub_block_length(self.sub_block_length, sample_rate)?;
        Ok(())
    }
}

/// Samples per sub-block, rounded. Must come out positive.
pub(crate) fn sub_block_sample_count(length: Duration, sample_rate: u32) -> u64 {
    let ns = length.as_nanos();
    ((sample_rate as u128 * ns + NANOS_PER_SEC as u128 / 2) / NANOS_PER_SEC as u128) as u64
}

pub(crate) fn validate_sub_block_length(length: Duration, sample_rate: u32) -> Result<()> {
    if length > Duration::from_secs(1) {
        return Err(CliptrimError::Configuration(format!(
            "sub_block_length must not exceed 1 s, got {length:?}"
        )));
    }
    if sub_block_sample_count(length, sample_rate) == 0 {
        return Err(CliptrimError::Configuration(format!(
            "sub_block_length {length:?} is shorter than one sample at {sample_rate} Hz"
        )));
    }
    Ok(())
}

/// Configuration for [`SilenceTrimmer`](crate::SilenceTrimmer).
#[derive(Debug, Clone)]
pub struct TrimConfig {
    /// Detector threshold for the clip start and interior silence, in
    /// percent of full scale. Default: 3.
    pub start_threshold_percent: f32,
    /// Detector threshold for the end-of-stream backward pass, in percent
    /// of full scale. Default: 3.
    pub end_threshold_percent: f32,
    /// Single-pole decay factor of the activity detector, in (0, 1).
    /// Default: 0.99.
    pub decay: f32,
    /// Audio to ignore at the start of the stream. Default: 0.
    pub start_skip: Duration,
    /// Audio to ignore at the end of the stream. Default: 0.
    pub end_skip: Duration,
    /// Silence retained immediately before detected sound. Default: 100 ms.
    pub pre_silence: Duration,
    /// Silence retained immediately after detected sound. Default: 100 ms.
    pub post_silence: Duration,
    /// Longest interior silence run tolerated before the current sound
    /// segment is closed. Default: 5 s.
    pub max_silence_duration: Duration,
    /// Forward a zero-duration marker at the original stream start so
    /// downstream consumers keep the untrimmed start timestamp.
    /// Default: true.
    pub emit_start_marker: bool,
}

impl Default for TrimConfig {
    fn default() -> Self {
        Self {
            start_threshold_percent: 3.0,
            end_threshold_percent: 3.0,
            decay: 0.99,
            start_skip: Duration::ZERO,
            end_skip: Duration::ZERO,
            pre_silence: Duration::from_millis(100),
            post_silence: Duration::from_millis(100),
            max_silence_duration: Duration::from_secs(5),
            emit_start_marker: true,
        }
    }
}

impl TrimConfig {
    /// Set both the start and end detector thresholds at once.
    pub fn with_threshold_percent(mut self, percent: f32) -> Self {
        self.start_threshold_percent = percent;
        self.end_threshold_percent = percent;
        self
    }

    pub(crate) fn validate(&self) -> Result<()> {
        for (name, percent) in [
            ("start_threshold_percent", self.start_threshold_percent),
            ("end_threshold_percent", self.end_threshold_percent),
        ] {
            if !(0.0..=100.0).contains(&percent) {
                return Err(CliptrimError::Configuration(format!(
                    "{name} must be within [0, 100], got {percent}"
                )));
            }
        }
        if !(self.decay > 0.0 && self.decay < 1.0) {
            return Err(CliptrimError::Configuration(format!(
                "decay must be within (0, 1), got {}",
                self.decay
            )));
        }
        for (name, d) in [
            ("pre_silence", self.pre_silence),
            ("post_silence", self.post_silence),
            ("max_silence_duration", self.max_silence_duration),
        ] {
            if d > MAX_RETENTION {
                return Err(CliptrimError::Configuration(format!(
                    "{name} ({d:?}) exceeds the retention cap ({MAX_RETENTION:?})"
                )));
            }
        }
        Ok(())
    }
}
