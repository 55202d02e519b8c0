//! Silence trimming state machine.
//!
//! ## States
//!
//! ```text
//! NotStarted ──first buffer──► StartSkip ──reference reached──► StartSilence
//!                                                                    │ activity
//!                      ┌──── max interior silence exceeded ────┐     ▼
//!                   Silence ◄──────────────────────────────── NotSilence
//!                      └───────────── activity ────────────────────►─┘
//! ```
//!
//! Buffers are processed one at a time on the delivering thread. Decisions
//! are sample-accurate: buffers are split at exact positions, never
//! reordered or duplicated, and memory is bounded by the configured
//! retention windows. The detected-sound clock (`sound_duration`) counts
//! each forwarded segment from its pre-silence lookback to its post-silence
//! lookahead.

pub(crate) mod detector;
pub(crate) mod window;

use std::time::Duration;

use tracing::{debug, info};

use crate::buffering::{duration_to_samples, samples_to_duration, samples_to_ns, SampleBuffer};
use crate::config::TrimConfig;
use crate::error::{CliptrimError, Result};
use crate::events::TrimSummary;
use crate::sink::BufferSink;

use detector::SilenceDetector;
use window::BufferWindow;

/// Where the machine currently is in the stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrimState {
    /// No buffer received yet.
    NotStarted,
    /// Discarding samples up to the configured start skip.
    StartSkip,
    /// Leading silence; retaining a pre-silence lookback window.
    StartSilence,
    /// Inside a sound segment; forwarding with a bounded lag.
    NotSilence,
    /// Interior silence after a closed segment; retaining lookback in case
    /// sound resumes.
    Silence,
}

/// Sample-accurate silence trimmer for one live mono stream.
///
/// Feed buffers with [`process`](Self::process); call
/// [`finish`](Self::finish) exactly once at end-of-stream. Forwarded
/// buffers go to the owned [`BufferSink`].
pub struct SilenceTrimmer<S: BufferSink> {
    config: TrimConfig,
    sample_rate: u32,
    sink: S,
    state: TrimState,
    /// Forward-pass detector; persists from the first buffer to EOS.
    detector: SilenceDetector,
    window: BufferWindow,
    /// State-dependent sample position: the skip end in StartSkip, the
    /// current segment start in StartSilence/NotSilence, the beginning of
    /// the silence run in Silence.
    reference_time: i64,
    /// Start of the currently open (or most recently opened) segment.
    segment_start: i64,
    /// Last sample position the forward detector reported active.
    last_active: u64,
    /// End of processed audio while a segment is open.
    open_end: u64,
    /// Sound samples across closed segments.
    closed_samples: u64,
    /// Next expected buffer offset; `None` before the first buffer.
    expected_offset: Option<u64>,
    start_skip_samples: u64,
    end_skip_samples: u64,
    pre_silence_samples: u64,
    post_silence_samples: u64,
    max_silence_samples: u64,
}

impl<S: BufferSink> SilenceTrimmer<S> {
    pub fn new(config: TrimConfig, sample_rate: u32, sink: S) -> Result<Self> {
        config.validate()?;
        if sample_rate == 0 {
            return Err(CliptrimError::Configuration(
                "sample rate must be positive".into(),
            ));
        }
        let detector = SilenceDetector::new(config.start_threshold_percent, config.decay);
        Ok(Self {
            start_skip_samples: duration_to_samples(config.start_skip, sample_rate),
            end_skip_samples: duration_to_samples(config.end_skip, sample_rate),
            pre_silence_samples: duration_to_samples(config.pre_silence, sample_rate),
            post_silence_samples: duration_to_samples(config.post_silence, sample_rate),
            max_silence_samples: duration_to_samples(config.max_silence_duration, sample_rate),
            config,
            sample_rate,
            sink,
            state: TrimState::NotStarted,
            detector,
            window: BufferWindow::new(),
            reference_time: 0,
            segment_start: 0,
            last_active: 0,
            open_end: 0,
            closed_samples: 0,
            expected_offset: None,
        })
    }

    pub fn state(&self) -> TrimState {
        self.state
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Detected sound so far: closed segments plus the open one.
    pub fn sound_duration(&self) -> Duration {
        let mut samples = self.closed_samples;
        if self.state == TrimState::NotSilence {
            samples += (self.open_end as i64 - self.segment_start).max(0) as u64;
        }
        samples_to_duration(samples, self.sample_rate)
    }

    /// Process one buffer.
    ///
    /// Buffers must arrive in stream order with no gaps or overlaps; a
    /// discontinuity is a fatal input-contract violation. A sink error
    /// aborts the call and propagates; the machine stays usable.
    pub fn process(&mut self, buf: SampleBuffer) -> Result<()> {
        if buf.sample_rate() != self.sample_rate {
            return Err(CliptrimError::Invariant(format!(
                "buffer sample rate {} does not match stream rate {}",
                buf.sample_rate(),
                self.sample_rate
            )));
        }
        if let Some(expected) = self.expected_offset {
            if buf.offset() != expected {
                return Err(CliptrimError::StreamPosition {
                    expected,
                    got: buf.offset(),
                });
            }
        }
        self.expected_offset = Some(buf.end_offset());

        let mut current = Some(buf);
        while let Some(buf) = current.take() {
            match self.state {
                TrimState::NotStarted => {
                    self.reference_time = buf.offset() as i64 + self.start_skip_samples as i64;
                    if self.config.emit_start_marker {
                        self.sink
                            .push(SampleBuffer::marker(buf.offset(), self.sample_rate))?;
                    }
                    debug!(
                        start_offset = buf.offset(),
                        reference_time = self.reference_time,
                        "stream started"
                    );
                    self.state = TrimState::StartSkip;
                    current = Some(buf);
                }
                TrimState::StartSkip => {
                    if (buf.end_offset() as i64) <= self.reference_time {
                        // Entirely inside the skip region.
                        continue;
                    }
                    current = buf.tail(self.reference_time);
                    self.state = TrimState::StartSilence;
                }
                TrimState::StartSilence | TrimState::Silence => {
                    current = self.process_silent(buf)?;
                }
                TrimState::NotSilence => {
                    self.process_sound(buf)?;
                }
            }
        }
        Ok(())
    }

    /// StartSilence / Silence: wait for activity, keeping a pre-silence
    /// lookback window. Returns the unprocessed tail when a segment opens.
    fn process_silent(&mut self, buf: SampleBuffer) -> Result<Option<SampleBuffer>> {
        match self.detector.find_activity(buf.samples()) {
            None => {
                while self.window.retained_samples() > self.pre_silence_samples {
                    self.window.evict_oldest();
                }
                self.window.push(buf);
                Ok(None)
            }
            Some(i) => {
                let activity = buf.offset() + i as u64;
                // Lookback cannot reach before the oldest sample still
                // available.
                let floor = self.window.oldest_offset().unwrap_or(buf.offset()) as i64;
                let clip_start = (activity as i64 - self.pre_silence_samples as i64).max(floor);
                debug!(activity, clip_start, "sound detected");

                self.window.flush_after(clip_start, &mut self.sink)?;
                // The detector has consumed through `activity`; forward up
                // to and including that sample and resume the scan after
                // it, so the accumulator charges each sample exactly once.
                if let Some(lead_in) = buf.slice(clip_start, activity as i64 + 1) {
                    self.sink.push(lead_in)?;
                }
                let tail = buf.tail(activity as i64 + 1);

                self.segment_start = clip_start;
                self.reference_time = clip_start;
                self.last_active = activity;
                self.open_end = activity + 1;
                self.state = TrimState::NotSilence;
                Ok(tail)
            }
        }
    }

    /// NotSilence: retain with a bounded forwarding lag, watch for an
    /// interior silence run longer than `max_silence_duration`.
    fn process_sound(&mut self, buf: SampleBuffer) -> Result<()> {
        if let Some(i) = self.detector.track_activity(buf.samples()) {
            self.last_active = buf.offset() + i as u64;
        }
        self.open_end = buf.end_offset();

        let silence_run = self.open_end.saturating_sub(self.last_active);
        if silence_run > self.max_silence_samples {
            let cutoff = self.last_active as i64 + self.post_silence_samples as i64;
            self.window.push(buf);
            self.window.flush_before(cutoff, &mut self.sink)?;
            self.close_segment(cutoff)?;
            self.reference_time = self.last_active as i64;
            self.state = TrimState::Silence;
            debug!(
                silence_start = self.reference_time,
                "max interior silence exceeded, segment closed"
            );
            return Ok(());
        }

        while self.window.retained_samples() > self.max_silence_samples {
            if let Some(oldest) = self.window.evict_oldest() {
                self.sink.push(oldest)?;
            }
        }
        self.window.push(buf);
        Ok(())
    }

    fn close_segment(&mut self, cutoff: i64) -> Result<()> {
        let closed = cutoff - self.segment_start;
        if closed < 0 {
            return Err(CliptrimError::Invariant(format!(
                "negative segment duration: cutoff {cutoff} precedes segment start {}",
                self.segment_start
            )));
        }
        self.closed_samples += closed as u64;
        Ok(())
    }

    /// End-of-stream: trim trailing silence from the retained window and
    /// emit the summary. Resets the machine for the next pass.
    pub fn finish(&mut self) -> Result<TrimSummary> {
        match self.state {
            TrimState::NotStarted | TrimState::StartSkip => {}
            TrimState::StartSilence | TrimState::Silence => {
                // The retained lookback never belonged to a segment.
                self.window.clear();
            }
            TrimState::NotSilence => self.finish_open_segment()?,
        }
        let summary = TrimSummary {
            sound_duration_ns: samples_to_ns(self.closed_samples, self.sample_rate),
        };
        info!(
            sound_duration_ns = summary.sound_duration_ns,
            "end of stream"
        );
        self.reset();
        Ok(summary)
    }

    fn finish_open_segment(&mut self) -> Result<()> {
        let Some(retained_end) = self.window.end_offset() else {
            // Activity ran to the exact end of the last buffer; nothing is
            // retained and nothing needs trimming.
            return self.close_segment(self.open_end as i64);
        };
        let limit = retained_end.saturating_sub(self.end_skip_samples);

        // Fresh detector for the backward pass; it never shares state with
        // the forward one.
        let mut backward =
            SilenceDetector::new(self.config.end_threshold_percent, self.config.decay);
        let mut found = None;
        for buf in self.window.iter_rev() {
            if limit <= buf.offset() {
                continue;
            }
            let end = (limit.min(buf.end_offset()) - buf.offset()) as usize;
            if let Some(i) = backward.find_activity_rev(buf.samples(), end) {
                found = Some(buf.offset() + i as u64);
                break;
            }
        }

        match found {
            Some(pos) => {
                let cutoff = pos as i64 + self.post_silence_samples as i64;
                debug!(activity = pos, cutoff, "trailing sound located");
                self.window.flush_before(cutoff, &mut self.sink)?;
                self.close_segment(cutoff)
            }
            None => {
                // No trailing activity in the retained window: forward it
                // unmodified rather than guessing a cut.
                debug!("no trailing activity in retained window, not trimming");
                let end = retained_end as i64;
                self.window.flush_before(i64::MAX, &mut self.sink)?;
                self.close_segment(end)
            }
        }
    }

    /// Discard all state, ready for a new stream.
    pub fn reset(&mut self) {
        self.state = TrimState::NotStarted;
        self.detector.reset();
        self.window.clear();
        self.reference_time = 0;
        self.segment_start = 0;
        self.last_active = 0;
        self.open_end = 0;
        self.closed_samples = 0;
        self.expected_offset = None;
    }
}
