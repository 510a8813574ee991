//! Link session: the public face of the parsing worker.
//!
//! A session pairs an outbound [`Transport`] with the worker task that owns
//! all parser state. The transport pushes notifications and connection
//! changes through an [`InboundHandle`]; the consumer reads one ordered
//! [`LinkEvents`] stream.

mod events;
#[cfg(test)]
mod tests;

pub use events::LinkEvents;

use bytes::Bytes;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::codec::{CommandPacket, McuCommand};
use crate::config::LinkConfig;
use crate::driver::{Driver, Inbound};
use crate::transport::Transport;
use crate::{LinkError, Result};

/// Inbound half of the link, handed to the transport.
///
/// Cheap to clone and usable from any thread. Every call is a non-blocking
/// enqueue onto the worker inbox.
#[derive(Debug, Clone)]
pub struct InboundHandle {
    inbox: mpsc::UnboundedSender<Inbound>,
    cancel: CancellationToken,
}

impl InboundHandle {
    /// Forward one notification payload. Empty chunks are accepted and ignored.
    pub fn on_bytes_received(&self, chunk: impl Into<Bytes>) -> Result<()> {
        let chunk = chunk.into();
        self.ensure_open()?;
        if chunk.is_empty() {
            return Ok(());
        }
        self.send(Inbound::Bytes(chunk))
    }

    /// Report a connection state change. Either edge resets the parser so
    /// nothing buffered survives into the next connection.
    pub fn on_connection_state_changed(&self, connected: bool) -> Result<()> {
        self.ensure_open()?;
        self.send(Inbound::Connection(connected))
    }

    /// Queue a diagnostic line for the consumer, e.g. GATT status changes.
    pub fn log(&self, line: impl Into<String>) -> Result<()> {
        self.ensure_open()?;
        self.send(Inbound::Log(line.into()))
    }

    pub fn is_closed(&self) -> bool {
        self.cancel.is_cancelled() || self.inbox.is_closed()
    }

    fn ensure_open(&self) -> Result<()> {
        if self.cancel.is_cancelled() { Err(LinkError::SessionClosed) } else { Ok(()) }
    }

    fn send(&self, message: Inbound) -> Result<()> {
        self.inbox.send(message).map_err(|_| LinkError::SessionClosed)
    }
}

/// An open link to one device.
///
/// Dropping the session stops the worker.
pub struct LinkSession<T: Transport> {
    transport: T,
    inbound: InboundHandle,
}

impl<T: Transport> LinkSession<T> {
    /// Validate `config` and spawn the worker.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn open(transport: T, config: LinkConfig) -> Result<(Self, LinkEvents)> {
        config.validate()?;
        info!(
            max_frame_len = config.parser.max_frame_len,
            policy = ?config.delivery.policy,
            "Opening link session"
        );

        let channels = Driver::spawn(config);
        let inbound = InboundHandle { inbox: channels.inbox, cancel: channels.cancel };

        Ok((Self { transport, inbound }, LinkEvents::new(channels.events)))
    }

    /// A handle for the transport's notification and connection callbacks.
    pub fn inbound(&self) -> InboundHandle {
        self.inbound.clone()
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Encode and write a command.
    ///
    /// Returns whether the transport accepted the write. The attempt and any
    /// refusal are reported as log lines.
    pub async fn send_command(&self, command: McuCommand) -> bool {
        self.send_packet(command.packet()).await
    }

    pub async fn send_packet(&self, packet: CommandPacket) -> bool {
        if self.is_stopped() {
            debug!("Session stopped, not sending {}", packet);
            return false;
        }

        let line = format!("MCU TX: {}", packet);
        info!("{}", line);
        self.diagnostic(line);

        let accepted = self.transport.send_bytes(packet.to_bytes()).await;
        if !accepted {
            warn!("Transport refused command packet {}", packet);
            self.diagnostic(format!("WRITE failed: '{}' not accepted", packet));
        }
        accepted
    }

    pub async fn start_measurement(&self) -> bool {
        self.send_command(McuCommand::StartMeasurement).await
    }

    pub async fn stop_measurement(&self) -> bool {
        self.send_command(McuCommand::StopMeasurement).await
    }

    pub async fn reset_system(&self) -> bool {
        self.send_command(McuCommand::ResetSystem).await
    }

    pub async fn get_status(&self) -> bool {
        self.send_command(McuCommand::GetStatus).await
    }

    pub async fn set_mode(&self, state: i32, param1: i32, param2: i32) -> bool {
        self.send_command(McuCommand::SetMode { state, param1, param2 }).await
    }

    pub async fn calibrate(&self) -> bool {
        self.send_command(McuCommand::Calibrate).await
    }

    pub async fn get_state(&self, state: i32) -> bool {
        self.send_command(McuCommand::GetState { state }).await
    }

    /// Stop the worker. Buffered data is discarded; later inbound calls fail
    /// with [`LinkError::SessionClosed`].
    pub fn stop(&self) {
        if !self.inbound.cancel.is_cancelled() {
            info!("Stopping link session");
            self.inbound.cancel.cancel();
        }
    }

    pub fn is_stopped(&self) -> bool {
        self.inbound.cancel.is_cancelled()
    }

    fn diagnostic(&self, line: String) {
        if self.inbound.log(line).is_err() {
            debug!("Worker gone, diagnostic line dropped");
        }
    }
}

impl<T: Transport> Drop for LinkSession<T> {
    fn drop(&mut self) {
        debug!("Dropping link session");
        self.inbound.cancel.cancel();
    }
}
