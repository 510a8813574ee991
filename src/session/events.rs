//! Consumer event stream

use futures::stream::{self, BoxStream};
use futures::{Stream, StreamExt};
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::trace;

use crate::adapters::FrameAdapter;
use crate::stream::ThrottleExt;
use crate::types::{LinkEvent, UpdateRate, ValidatedFrame};

/// The ordered stream of [`LinkEvent`]s from one session.
///
/// Ends when the session stops.
pub struct LinkEvents {
    inner: ReceiverStream<LinkEvent>,
}

impl LinkEvents {
    pub(crate) fn new(events: mpsc::Receiver<LinkEvent>) -> Self {
        Self { inner: ReceiverStream::new(events) }
    }

    /// Validated frames only, flattened out of their batches.
    pub fn frames(self) -> impl Stream<Item = ValidatedFrame> + Send + 'static {
        self.flat_map(|event| {
            let frames = match event {
                LinkEvent::Frames(frames) => frames,
                _ => Vec::new(),
            };
            stream::iter(frames)
        })
    }

    /// Decoded frames of type `A`.
    ///
    /// Frames the adapter rejects are skipped. At [`UpdateRate::Max`] only the
    /// newest frame per interval is yielded.
    pub fn subscribe<A>(self, rate: UpdateRate) -> BoxStream<'static, A>
    where
        A: FrameAdapter + Send + 'static,
    {
        let decoded = self.frames().filter_map(|frame| async move {
            match A::adapt(&frame) {
                Ok(value) => Some(value),
                Err(err) => {
                    trace!(seq = frame.seq, "Frame skipped by adapter: {}", err);
                    None
                }
            }
        });

        match rate.throttle_interval() {
            None => decoded.boxed(),
            Some(period) => decoded.throttle(period).boxed(),
        }
    }
}

impl Stream for LinkEvents {
    type Item = LinkEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<LinkEvent>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}
