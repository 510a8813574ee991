//! Driver spawns and runs the link worker task

use bytes::Bytes;
use std::collections::VecDeque;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::time::{MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace};

use crate::config::LinkConfig;
use crate::pipeline::FramePipeline;
use crate::types::LinkEvent;

/// Messages accepted by the worker inbox.
#[derive(Debug)]
pub(crate) enum Inbound {
    /// One notification payload from the transport
    Bytes(Bytes),

    /// Transport connection state (`true` = connected)
    Connection(bool),

    /// Diagnostic line from outside the worker
    Log(String),
}

/// Result of spawning the worker
pub(crate) struct DriverChannels {
    /// Inbox feeding the worker
    pub inbox: mpsc::UnboundedSender<Inbound>,
    /// Receiver for consumer events
    pub events: mpsc::Receiver<LinkEvent>,
    /// Cancellation token for shutdown
    pub cancel: CancellationToken,
}

/// Driver spawns the single worker that owns all parser state.
///
/// Inbound bytes, connection changes and log lines arrive in one ordered
/// inbox. The flush tick runs in the same loop, so ingestion and delivery
/// never overlap.
pub(crate) struct Driver;

impl Driver {
    pub fn spawn(config: LinkConfig) -> DriverChannels {
        let (inbox_tx, inbox_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::channel(config.delivery.event_channel_capacity);
        let cancel = CancellationToken::new();

        let cancel_worker = cancel.clone();
        tokio::spawn(async move {
            Self::worker_task(config, inbox_rx, event_tx, cancel_worker).await;
        });

        DriverChannels { inbox: inbox_tx, events: event_rx, cancel }
    }

    async fn worker_task(
        config: LinkConfig,
        mut inbox: mpsc::UnboundedReceiver<Inbound>,
        events: mpsc::Sender<LinkEvent>,
        cancel: CancellationToken,
    ) {
        let flush_interval = config.delivery.flush_interval();
        info!("Link worker started (flush every {:?})", flush_interval);

        let mut pipeline = FramePipeline::new(&config);
        let mut connections = VecDeque::new();
        let mut ticker = interval(flush_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("Link worker cancelled");
                    break;
                }
                message = inbox.recv() => match message {
                    Some(Inbound::Bytes(chunk)) => {
                        trace!(len = chunk.len(), "Chunk received");
                        pipeline.ingest(&chunk);
                    }
                    Some(Inbound::Log(line)) => pipeline.log(line),
                    Some(Inbound::Connection(connected)) => {
                        pipeline.reset();
                        info!(connected, "Connection state changed, parser state reset");
                        pipeline.log(if connected { "Link connected" } else { "Link disconnected" });

                        connections.push_back(connected);
                        if send_connections(&events, &mut connections) == Delivery::Closed {
                            break;
                        }
                    }
                    None => {
                        debug!("Inbox closed, shutting down");
                        break;
                    }
                },
                _ = ticker.tick() => {
                    if pipeline.has_backlog() {
                        pipeline.pump();
                    }

                    let delivery = match send_connections(&events, &mut connections) {
                        Delivery::Sent => send_batch(&events, &mut pipeline),
                        other => other,
                    };
                    match delivery {
                        Delivery::Sent => {}
                        Delivery::Lagging => {
                            let stats = pipeline.stats().delivery;
                            debug!(
                                frames_queued = stats.frames_queued,
                                frames_dropped = stats.frames_dropped,
                                "Consumer lagging, delivery deferred"
                            );
                        }
                        Delivery::Closed => break,
                    }
                }
            }
        }

        let stats = pipeline.stats();
        info!(
            chunks = stats.chunks,
            rejected = stats.frames_rejected,
            zombies = stats.zombies_dropped,
            frames_dropped = stats.delivery.frames_dropped,
            "Link worker ended (validated {} frames)",
            stats.frames_validated
        );
    }
}

/// Outcome of handing events to the consumer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Delivery {
    /// Everything pending was sent
    Sent,

    /// The channel is full; pending data stays queued
    Lagging,

    /// The consumer is gone
    Closed,
}

/// Send pending connection changes in order. Unsent ones stay pending until
/// the consumer makes room; they are never dropped.
fn send_connections(events: &mpsc::Sender<LinkEvent>, pending: &mut VecDeque<bool>) -> Delivery {
    while let Some(&connected) = pending.front() {
        match events.try_reserve() {
            Ok(permit) => {
                permit.send(LinkEvent::Connection(connected));
                pending.pop_front();
            }
            Err(TrySendError::Full(())) => return Delivery::Lagging,
            Err(TrySendError::Closed(())) => return Delivery::Closed,
        }
    }
    Delivery::Sent
}

/// Flush the delivery queues only when the channel has room for the whole
/// batch. Otherwise nothing is drained, so overflow is handled by the
/// drop-oldest queues.
fn send_batch(events: &mpsc::Sender<LinkEvent>, pipeline: &mut FramePipeline) -> Delivery {
    let needed = pipeline.pending_events();
    if needed == 0 {
        return Delivery::Sent;
    }

    match events.try_reserve_many(needed) {
        Ok(permits) => {
            if let Some(batch) = pipeline.flush() {
                for (permit, event) in permits.zip(batch.into_events()) {
                    permit.send(event);
                }
            }
            Delivery::Sent
        }
        Err(TrySendError::Full(())) => Delivery::Lagging,
        Err(TrySendError::Closed(())) => Delivery::Closed,
    }
}
