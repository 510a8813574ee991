//! Transport trait for the external BLE link

use bytes::Bytes;

/// Outbound half of the device link.
///
/// The transport owns scanning, GATT connection and notification
/// subscription. The session only asks it to write command packets; inbound
/// notifications reach the session through [`crate::InboundHandle`].
#[async_trait::async_trait]
pub trait Transport: Send + Sync + 'static {
    /// Write one packet to the device.
    ///
    /// Returns `false` when the write was not accepted (not connected, no
    /// writable characteristic, write rejected). Failures are reported to the
    /// consumer as log lines, never as errors.
    async fn send_bytes(&self, payload: Bytes) -> bool;
}

#[async_trait::async_trait]
impl<T: Transport> Transport for std::sync::Arc<T> {
    async fn send_bytes(&self, payload: Bytes) -> bool {
        (**self).send_bytes(payload).await
    }
}
