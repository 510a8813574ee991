//! Frame adapter trait for typed decoding of validated frames

use serde::de::DeserializeOwned;

use crate::Result;
use crate::types::{ProcessedResult, TelemetryFrame, ValidatedFrame};

/// Decodes a [`ValidatedFrame`] into a consumer type.
///
/// `adapt()` runs once per delivered frame. Frames an adapter cannot decode
/// are skipped by subscriptions, so an adapter may reject frame types it does
/// not handle.
pub trait FrameAdapter: Sized {
    fn adapt(frame: &ValidatedFrame) -> Result<Self>;
}

impl FrameAdapter for ValidatedFrame {
    fn adapt(frame: &ValidatedFrame) -> Result<Self> {
        Ok(frame.clone())
    }
}

impl FrameAdapter for TelemetryFrame {
    fn adapt(frame: &ValidatedFrame) -> Result<Self> {
        TelemetryFrame::from_frame(frame)
    }
}

impl FrameAdapter for ProcessedResult {
    fn adapt(frame: &ValidatedFrame) -> Result<Self> {
        ProcessedResult::from_frame(frame)
    }
}

/// Adapter for any serde type.
///
/// ```rust
/// use perilink::{FrameAdapter, Json, ValidatedFrame};
/// use serde::Deserialize;
///
/// #[derive(Deserialize)]
/// struct Force {
///     #[serde(rename = "F")]
///     newtons: f64,
/// }
///
/// let frame = ValidatedFrame::new(0, r#"{"t":"D","F":3.5}"#);
/// let Json(force) = Json::<Force>::adapt(&frame).unwrap();
/// assert_eq!(force.newtons, 3.5);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Json<T>(pub T);

impl<T: DeserializeOwned> FrameAdapter for Json<T> {
    fn adapt(frame: &ValidatedFrame) -> Result<Self> {
        frame.parse().map(Json)
    }
}
