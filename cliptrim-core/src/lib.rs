//! # cliptrim-core
//!
//! Real-time loudness analysis and silence trimming for live mono audio.
//!
//! ## Architecture
//!
//! ```text
//! capture thread ─► SampleBuffer ─┬─► PowerAnalyzer ─► PowerEvent stream
//!                                 │        finish() ─► AnalysisSummary
//!                                 │
//!                                 └─► SilenceTrimmer ─► BufferSink
//!                                          finish() ─► TrimSummary
//! ```
//!
//! Both paths are single-threaded push pipelines: feed buffers in stream
//! order, call `finish()` once at end-of-stream, reuse the object for the
//! next pass. The loudness path never retains samples, only per-sub-block
//! power values; the trim path retains at most the configured lookback and
//! lag windows.

#![forbid(unsafe_code)]
#![warn(clippy::all)]

pub mod analysis;
pub mod buffering;
pub mod config;
pub mod error;
pub mod events;
pub mod sink;
pub mod trim;

// Convenience re-exports for downstream crates
pub use analysis::PowerAnalyzer;
pub use buffering::SampleBuffer;
pub use config::{AnalysisConfig, TrimConfig, MAX_RETENTION};
pub use error::{CliptrimError, Result};
pub use events::{AnalysisSummary, PowerEvent, TrimSummary};
pub use sink::BufferSink;
pub use trim::{SilenceTrimmer, TrimState};
