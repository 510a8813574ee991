//! Typed records decoded from validated frames.
//!
//! The device emits two frame types: `"D"` data frames carrying live
//! measurement values and `"P"` processed-result frames sent when a press
//! analysis completes. Every field except the `t` tag is optional.
//!
//! Optional fields decode leniently, one field at a time: numbers and numeric
//! strings are accepted, anything else (wrong type, `null`, non-finite) leaves
//! that field absent without rejecting the record.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::ValidatedFrame;
use crate::{LinkError, Result};

/// Frame type tag of live data frames
pub const DATA_FRAME_TAG: &str = "D";
/// Frame type tag of processed-result frames
pub const PROCESSED_FRAME_TAG: &str = "P";

const EVENT_EPSILON: f64 = 1e-6;

/// Measurement state reported in the `s` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MeasurementState {
    Idle,
    Stable,
    Tremor,
    Press,
    PressDone,
    Contraction,
    Unknown,
}

impl MeasurementState {
    pub fn from_code(code: i32) -> Self {
        match code {
            0 => MeasurementState::Idle,
            1 => MeasurementState::Stable,
            2 => MeasurementState::Tremor,
            3 => MeasurementState::Press,
            4 => MeasurementState::PressDone,
            5 => MeasurementState::Contraction,
            _ => MeasurementState::Unknown,
        }
    }

    /// Device label for this state.
    pub fn label(self) -> &'static str {
        match self {
            MeasurementState::Idle => "IDLE",
            MeasurementState::Stable => "STABLE",
            MeasurementState::Tremor => "TREMOR",
            MeasurementState::Press => "PRESS",
            MeasurementState::PressDone => "PRESS_DONE",
            MeasurementState::Contraction => "CONTRACTION",
            MeasurementState::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for MeasurementState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A decoded telemetry record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryFrame {
    /// Frame type tag
    #[serde(deserialize_with = "lenient::tag")]
    pub t: String,

    /// Device timestamp (ms)
    #[serde(default, deserialize_with = "lenient::integer", skip_serializing_if = "Option::is_none")]
    pub ts: Option<i64>,

    /// State code, see [`MeasurementState`]
    #[serde(default, deserialize_with = "lenient::small_integer", skip_serializing_if = "Option::is_none")]
    pub s: Option<i32>,

    /// Force (N)
    #[serde(rename = "F", default, deserialize_with = "lenient::float", skip_serializing_if = "Option::is_none")]
    pub force: Option<f64>,

    /// Displacement (mm)
    #[serde(rename = "x", default, deserialize_with = "lenient::float", skip_serializing_if = "Option::is_none")]
    pub displacement: Option<f64>,

    /// Tremor flag
    #[serde(rename = "TF", default, deserialize_with = "lenient::small_integer", skip_serializing_if = "Option::is_none")]
    pub tremor_flag: Option<i32>,

    /// Tremor intensity
    #[serde(rename = "TI", default, deserialize_with = "lenient::float", skip_serializing_if = "Option::is_none")]
    pub tremor_intensity: Option<f64>,

    /// Lift velocity (mm/s)
    #[serde(rename = "LV", default, deserialize_with = "lenient::float", skip_serializing_if = "Option::is_none")]
    pub lift_velocity: Option<f64>,

    /// Lift displacement (mm)
    #[serde(rename = "LD", default, deserialize_with = "lenient::float", skip_serializing_if = "Option::is_none")]
    pub lift_displacement: Option<f64>,

    #[serde(default, deserialize_with = "lenient::float", skip_serializing_if = "Option::is_none")]
    pub px: Option<f64>,

    #[serde(default, deserialize_with = "lenient::float", skip_serializing_if = "Option::is_none")]
    pub py: Option<f64>,

    /// Rotation (degrees)
    #[serde(rename = "r", default, deserialize_with = "lenient::float", skip_serializing_if = "Option::is_none")]
    pub rotation: Option<f64>,

    /// Sequence number of the frame this record was decoded from
    #[serde(skip)]
    pub seq: u64,
}

impl TelemetryFrame {
    /// Decode a validated frame. Frames without a non-blank `t` are rejected.
    pub fn from_frame(frame: &ValidatedFrame) -> Result<Self> {
        let mut record: TelemetryFrame = serde_json::from_str(frame.as_str()).map_err(|err| {
            if err.to_string().starts_with("missing field `t`") {
                LinkError::missing_field("t")
            } else {
                LinkError::from(err)
            }
        })?;

        if record.t.trim().is_empty() {
            return Err(LinkError::missing_field("t"));
        }

        record.seq = frame.seq;
        Ok(record)
    }

    pub fn is_data(&self) -> bool {
        self.t == DATA_FRAME_TAG
    }

    pub fn is_processed(&self) -> bool {
        self.t == PROCESSED_FRAME_TAG
    }

    pub fn state(&self) -> MeasurementState {
        self.s.map(MeasurementState::from_code).unwrap_or(MeasurementState::Unknown)
    }

    /// True when any positional channel (`px`, `py`, `LD`) is non-zero.
    pub fn is_event(&self) -> bool {
        [self.px, self.py, self.lift_displacement]
            .into_iter()
            .any(|value| value.unwrap_or(0.0).abs() > EVENT_EPSILON)
    }
}

/// Result of a completed press analysis (`t = "P"`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProcessedResult {
    /// Elastic energy (J)
    #[serde(rename = "e", default, deserialize_with = "lenient::float")]
    pub elastic_energy: Option<f64>,

    /// Peak response slope (N/mm)
    #[serde(rename = "fmax", default, deserialize_with = "lenient::float")]
    pub peak_slope: Option<f64>,

    /// Maximum displacement (mm)
    #[serde(rename = "xmax", default, deserialize_with = "lenient::float")]
    pub max_displacement: Option<f64>,

    /// Curve fit quality (R²)
    #[serde(rename = "r2", default, deserialize_with = "lenient::float")]
    pub fit_quality: Option<f64>,

    #[serde(rename = "dur", default, deserialize_with = "lenient::integer")]
    pub duration: Option<i64>,
}

impl ProcessedResult {
    /// Decode a `"P"` frame.
    pub fn from_frame(frame: &ValidatedFrame) -> Result<Self> {
        let record = TelemetryFrame::from_frame(frame)?;
        if !record.is_processed() {
            return Err(LinkError::parse(
                "Processed result",
                format!("expected frame type '{}', found '{}'", PROCESSED_FRAME_TAG, record.t),
            ));
        }

        frame.parse()
    }
}

/// Per-field decoders that never fail on a present value.
mod lenient {
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    /// Strings as is, numbers and booleans rendered; anything else is blank.
    pub fn tag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
        Ok(match Value::deserialize(deserializer)? {
            Value::String(tag) => tag,
            Value::Number(number) => number.to_string(),
            Value::Bool(flag) => flag.to_string(),
            _ => String::new(),
        })
    }

    pub fn float<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
        let value = match Value::deserialize(deserializer)? {
            Value::Number(number) => number.as_f64(),
            Value::String(text) => text.trim().parse::<f64>().ok(),
            _ => None,
        };
        Ok(value.filter(|v| v.is_finite()))
    }

    /// Integers, truncating fractional numbers toward zero.
    pub fn integer<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<i64>, D::Error> {
        Ok(match Value::deserialize(deserializer)? {
            Value::Number(number) => number.as_i64().or_else(|| number.as_f64().and_then(truncate)),
            Value::String(text) => {
                let text = text.trim();
                text.parse::<i64>().ok().or_else(|| text.parse::<f64>().ok().and_then(truncate))
            }
            _ => None,
        })
    }

    pub fn small_integer<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<i32>, D::Error> {
        Ok(integer(deserializer)?.and_then(|value| i32::try_from(value).ok()))
    }

    fn truncate(value: f64) -> Option<i64> {
        let truncated = value.trunc();
        (truncated.is_finite() && truncated.abs() < i64::MAX as f64).then_some(truncated as i64)
    }
}
