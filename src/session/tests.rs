//! Session tests over a mock transport on a paused clock

use super::*;
use crate::test_utils::{
    MockTransport, NOTIFICATION_SIZE, corrupted_stream, data_frame, notification_chunks,
    processed_frame,
};
use crate::types::{
    DeliveryPolicy, LinkEvent, LogLine, MeasurementState, TelemetryFrame, UpdateRate,
    ValidatedFrame,
};
use futures::StreamExt;
use std::sync::Arc;
use std::time::Duration;

/// Next batch of frames, skipping other events. Empty on timeout or end.
async fn next_frames(events: &mut LinkEvents) -> Vec<ValidatedFrame> {
    loop {
        match tokio::time::timeout(Duration::from_secs(1), events.next()).await {
            Ok(Some(LinkEvent::Frames(frames))) => return frames,
            Ok(Some(_)) => continue,
            Ok(None) | Err(_) => return Vec::new(),
        }
    }
}

async fn collect_frames(events: &mut LinkEvents, count: usize) -> Vec<ValidatedFrame> {
    let mut frames = Vec::new();
    while frames.len() < count {
        let batch = next_frames(events).await;
        if batch.is_empty() {
            break;
        }
        frames.extend(batch);
    }
    frames
}

async fn collect_logs(events: &mut LinkEvents, count: usize) -> Vec<LogLine> {
    let mut logs = Vec::new();
    while logs.len() < count {
        match tokio::time::timeout(Duration::from_secs(1), events.next()).await {
            Ok(Some(LinkEvent::Logs(lines))) => logs.extend(lines),
            Ok(Some(_)) => continue,
            Ok(None) | Err(_) => break,
        }
    }
    logs
}

#[tokio::test(start_paused = true)]
async fn chunked_frames_arrive_in_order() {
    let _ = tracing_subscriber::fmt::try_init();
    let (session, mut events) =
        LinkSession::open(MockTransport::new(), LinkConfig::default()).unwrap();
    let inbound = session.inbound();

    let frames: Vec<String> = (0..5).map(|index| data_frame(index * 10, 1)).collect();
    for chunk in notification_chunks(&frames.concat(), 20) {
        inbound.on_bytes_received(chunk).unwrap();
    }

    let delivered = collect_frames(&mut events, 5).await;
    assert_eq!(delivered.len(), 5);
    for (index, frame) in delivered.iter().enumerate() {
        assert_eq!(frame.seq, index as u64);
        assert_eq!(frame.as_str(), frames[index]);
    }
}

#[tokio::test(start_paused = true)]
async fn reconnect_starts_with_empty_buffer() {
    let (session, mut events) =
        LinkSession::open(MockTransport::new(), LinkConfig::default()).unwrap();
    let inbound = session.inbound();

    inbound.on_connection_state_changed(true).unwrap();
    inbound.on_bytes_received(Bytes::from_static(br#"{"t":"D","#)).unwrap();
    inbound.on_connection_state_changed(false).unwrap();
    inbound.on_connection_state_changed(true).unwrap();
    inbound.on_bytes_received(Bytes::from_static(br#""s":1}"#)).unwrap();
    inbound.on_bytes_received(Bytes::from_static(br#"{"t":"D","s":2}"#)).unwrap();

    let mut connections = Vec::new();
    let frames = loop {
        match tokio::time::timeout(Duration::from_secs(1), events.next()).await {
            Ok(Some(LinkEvent::Connection(connected))) => connections.push(connected),
            Ok(Some(LinkEvent::Frames(frames))) => break frames,
            Ok(Some(_)) => continue,
            other => panic!("Expected frames, got {:?}", other),
        }
    };

    assert_eq!(connections, vec![true, false, true]);
    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0].as_str(), r#"{"t":"D","s":2}"#);
}

#[tokio::test(start_paused = true)]
async fn commands_are_written_and_logged() {
    let transport = Arc::new(MockTransport::new());
    let (session, mut events) =
        LinkSession::open(Arc::clone(&transport), LinkConfig::default()).unwrap();

    assert!(session.start_measurement().await);
    assert!(session.calibrate().await);
    assert_eq!(transport.sent_text(), vec!["$0,0,0,0*2C\r\n", "$5,3,0,0*2A\r\n"]);

    let logs = collect_logs(&mut events, 2).await;
    assert_eq!(logs[0].as_str(), "MCU TX: $0,0,0,0*2C\\r\\n");
    assert_eq!(logs[1].as_str(), "MCU TX: $5,3,0,0*2A\\r\\n");
}

#[tokio::test(start_paused = true)]
async fn refused_write_is_reported_not_raised() {
    let (session, mut events) =
        LinkSession::open(MockTransport::refusing(), LinkConfig::default()).unwrap();

    assert!(!session.get_status().await);
    assert_eq!(session.transport().sent().len(), 1);

    let logs = collect_logs(&mut events, 2).await;
    assert!(logs[0].as_str().starts_with("MCU TX:"));
    assert!(logs[1].as_str().starts_with("WRITE failed"));
}

#[tokio::test(start_paused = true)]
async fn stop_closes_inbound_and_ends_stream() {
    let (session, mut events) =
        LinkSession::open(MockTransport::new(), LinkConfig::default()).unwrap();
    let inbound = session.inbound();

    session.stop();
    assert!(session.is_stopped());
    assert!(inbound.is_closed());
    assert!(matches!(
        inbound.on_bytes_received(Bytes::from_static(b"{}")),
        Err(LinkError::SessionClosed)
    ));
    assert!(matches!(inbound.on_connection_state_changed(true), Err(LinkError::SessionClosed)));

    assert!(!session.start_measurement().await);
    assert!(session.transport().sent().is_empty());

    let end = tokio::time::timeout(Duration::from_secs(1), events.next()).await.unwrap();
    assert!(end.is_none());
}

#[tokio::test(start_paused = true)]
async fn dropping_session_ends_stream() {
    let (session, mut events) =
        LinkSession::open(MockTransport::new(), LinkConfig::default()).unwrap();
    let inbound = session.inbound();
    drop(session);

    assert!(inbound.on_bytes_received(Bytes::from_static(b"{}")).is_err());
    let end = tokio::time::timeout(Duration::from_secs(1), events.next()).await.unwrap();
    assert!(end.is_none());
}

#[tokio::test(start_paused = true)]
async fn empty_chunks_are_accepted() {
    let (session, mut events) =
        LinkSession::open(MockTransport::new(), LinkConfig::default()).unwrap();
    let inbound = session.inbound();

    inbound.on_bytes_received(Bytes::new()).unwrap();
    inbound.on_bytes_received(Bytes::from_static(br#"{"t":"D"}"#)).unwrap();

    let frames = next_frames(&mut events).await;
    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0].seq, 0);
}

#[tokio::test(start_paused = true)]
async fn invalid_config_is_rejected() {
    let mut config = LinkConfig::default();
    config.parser.max_frame_len = 0;

    let result = LinkSession::open(MockTransport::new(), config);
    assert!(matches!(result, Err(LinkError::Config { .. })));
}

#[tokio::test(start_paused = true)]
async fn typed_subscription_skips_untagged_frames() {
    let (session, events) =
        LinkSession::open(MockTransport::new(), LinkConfig::default()).unwrap();
    let inbound = session.inbound();
    let mut records = events.subscribe::<TelemetryFrame>(UpdateRate::Native);

    let stream = format!(r#"{{"ts":5}}{}{}"#, data_frame(10, 3), processed_frame(1500));
    inbound.on_bytes_received(stream).unwrap();

    let first = tokio::time::timeout(Duration::from_secs(1), records.next()).await.unwrap().unwrap();
    assert_eq!(first.ts, Some(10));
    assert_eq!(first.state(), MeasurementState::Press);
    assert_eq!(first.seq, 1);

    let second = tokio::time::timeout(Duration::from_secs(1), records.next()).await.unwrap().unwrap();
    assert!(second.is_processed());
}

#[tokio::test(start_paused = true)]
async fn latest_policy_delivers_newest_frame() {
    let mut config = LinkConfig::default();
    config.delivery.policy = DeliveryPolicy::Latest;
    let (session, mut events) = LinkSession::open(MockTransport::new(), config).unwrap();

    let stream: String = (0..5).map(|index| format!(r#"{{"t":"D","s":{}}}"#, index)).collect();
    session.inbound().on_bytes_received(stream).unwrap();

    let frames = next_frames(&mut events).await;
    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0].seq, 4);
}

#[tokio::test(start_paused = true)]
async fn corrupted_stream_yields_only_intact_frames() {
    let _ = tracing_subscriber::fmt::try_init();
    let (session, events) =
        LinkSession::open(MockTransport::new(), LinkConfig::default()).unwrap();
    let inbound = session.inbound();

    // Trailing filler outlasts the frame cap so the last truncated frame is
    // dropped as a zombie
    let stream = corrupted_stream(40) + &" ".repeat(5000);
    for chunk in notification_chunks(&stream, NOTIFICATION_SIZE) {
        inbound.on_bytes_received(chunk).unwrap();
    }

    let mut records = events.subscribe::<TelemetryFrame>(UpdateRate::Native);
    let mut delivered = Vec::new();
    while delivered.len() < 10 {
        match tokio::time::timeout(Duration::from_secs(1), records.next()).await {
            Ok(Some(record)) => delivered.push(record),
            _ => break,
        }
    }

    assert_eq!(delivered.len(), 10);
    assert!(delivered.iter().all(|record| record.state() == MeasurementState::Stable));
    assert!(delivered.windows(2).all(|pair| pair[0].seq < pair[1].seq));
    assert_eq!(
        delivered.iter().map(|record| record.ts).collect::<Vec<_>>(),
        (0..10).map(|index| Some(index * 4)).collect::<Vec<_>>()
    );
}
