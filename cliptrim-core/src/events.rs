//! Event and summary types produced by the two analysis paths.
//!
//! [`PowerEvent`] is streamed live (one per completed sub-block) for level
//! metering. The summaries are produced exactly once per recording pass, at
//! end-of-stream, after every power event of that pass.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Power of one completed sub-block, for live metering.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PowerEvent {
    /// Mean squared filtered amplitude (a fraction, not dB).
    pub power: f32,
    /// Stream time of the sub-block start, in nanoseconds.
    pub timestamp_ns: u64,
}

impl PowerEvent {
    pub fn timestamp(&self) -> Duration {
        Duration::from_nanos(self.timestamp_ns)
    }
}

/// End-of-stream result of the loudness path.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisSummary {
    /// Gated integrated loudness (a fraction, not dB).
    pub loudness: f32,
    /// Earliest stream time where power exceeds the trim level, ns.
    pub trim_start_ns: u64,
    /// Latest stream time where power exceeds the trim level, ns.
    pub trim_end_ns: u64,
}

impl AnalysisSummary {
    pub fn trim_start(&self) -> Duration {
        Duration::from_nanos(self.trim_start_ns)
    }

    pub fn trim_end(&self) -> Duration {
        Duration::from_nanos(self.trim_end_ns)
    }
}

/// End-of-stream result of the trim path.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrimSummary {
    /// Total span of detected sound across all forwarded segments, ns.
    pub sound_duration_ns: u64,
}

impl TrimSummary {
    pub fn sound_duration(&self) -> Duration {
        Duration::from_nanos(self.sound_duration_ns)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn power_event_serializes_with_camel_case_fields() {
        let event = PowerEvent {
            power: 0.42,
            timestamp_ns: 1_300_000_000,
        };

        let json = serde_json::to_value(event).expect("serialize power event");
        let power = json["power"].as_f64().expect("power should be a number");
        assert!((power - 0.42).abs() < 1e-5);
        assert_eq!(json["timestampNs"], 1_300_000_000u64);

        let round_trip: PowerEvent =
            serde_json::from_value(json).expect("deserialize power event");
        assert_eq!(round_trip.timestamp(), Duration::from_millis(1_300));
    }

    #[test]
    fn analysis_summary_round_trips() {
        let summary = AnalysisSummary {
            loudness: 0.015,
            trim_start_ns: 900_000_000,
            trim_end_ns: 3_100_000_000,
        };

        let json = serde_json::to_value(summary).expect("serialize summary");
        assert_eq!(json["trimStartNs"], 900_000_000u64);
        assert_eq!(json["trimEndNs"], 3_100_000_000u64);

        let round_trip: AnalysisSummary =
            serde_json::from_value(json).expect("deserialize summary");
        assert_eq!(round_trip.trim_start(), Duration::from_millis(900));
        assert_eq!(round_trip.trim_end(), Duration::from_millis(3_100));
    }

    #[test]
    fn trim_summary_round_trips() {
        let summary = TrimSummary {
            sound_duration_ns: 2_200_000_000,
        };
        let json = serde_json::to_value(summary).expect("serialize");
        assert_eq!(json["soundDurationNs"], 2_200_000_000u64);
        let round_trip: TrimSummary = serde_json::from_value(json).expect("deserialize");
        assert_eq!(round_trip.sound_duration(), Duration::from_millis(2_200));
    }
}
