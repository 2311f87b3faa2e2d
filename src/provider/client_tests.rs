use super::*;
use crate::provider::testing::ScriptedTransport;
use parking_lot::Mutex;
use std::sync::Arc;

struct Harness {
    client: ColorSourceClient,
    transport: ScriptedTransport,
    events: Arc<Mutex<Vec<LinkEvent>>>,
}

fn harness(policy: ReconnectPolicy) -> Harness {
    let transport = ScriptedTransport::new();
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = events.clone();
    let callback: LinkCallback = Arc::new(move |ev| sink.lock().push(ev));
    let client = ColorSourceClient::new(Box::new(transport.clone()), policy, callback);
    Harness {
        client,
        transport,
        events,
    }
}

#[test]
fn test_request_while_disconnected_fails_immediately() {
    let mut h = harness(ReconnectPolicy::default());
    let now = Instant::now();

    assert!(matches!(h.client.request_palette(now), Err(SyncError::NotConnected)));
    assert_eq!(h.transport.sent_count(), 0);
    assert_eq!(h.transport.open_count(), 0);
}

#[test]
fn test_connect_is_idempotent() {
    let mut h = harness(ReconnectPolicy::default());
    let now = Instant::now();

    h.client.connect(now).unwrap();
    h.client.connect(now).unwrap();

    assert_eq!(h.client.state(), ConnectionState::Connected);
    assert_eq!(h.transport.open_count(), 1);
    assert_eq!(h.client.generation(), Some(1));
}

#[test]
fn test_request_sends_exactly_one_message() {
    let mut h = harness(ReconnectPolicy::default());
    let now = Instant::now();
    h.client.connect(now).unwrap();

    h.client.request_palette(now).unwrap();
    assert_eq!(h.transport.sent_count(), 1);
}

#[test]
fn test_failed_connect_schedules_reconnect() {
    let mut h = harness(ReconnectPolicy::default());
    let t0 = Instant::now();
    h.transport.fail_next_opens(1, "provider binary missing");

    match h.client.connect(t0) {
        Err(SyncError::ConnectionFailed(msg)) => assert_eq!(msg, "provider binary missing"),
        other => panic!("Expected ConnectionFailed, got {:?}", other),
    }
    assert_eq!(h.client.state(), ConnectionState::Disconnected);
    assert_eq!(h.client.next_deadline(), Some(t0 + DEFAULT_RECONNECT_DELAY));
}

#[test]
fn test_disconnect_reconnects_after_delay() {
    let mut h = harness(ReconnectPolicy::default());
    let t0 = Instant::now();
    h.client.connect(t0).unwrap();

    h.transport.close(None);
    let event = h.events.lock().pop().unwrap();
    assert_eq!(h.client.handle_link_event(event, t0), ClientNotice::Disconnected);
    assert_eq!(h.client.state(), ConnectionState::Disconnected);

    // Not yet due
    assert!(h.client.poll(t0 + Duration::from_millis(4999)).is_none());
    assert_eq!(h.transport.open_count(), 1);

    // Due at exactly five seconds
    let result = h.client.poll(t0 + Duration::from_secs(5));
    assert!(matches!(result, Some(Ok(()))));
    assert_eq!(h.client.state(), ConnectionState::Connected);
    assert_eq!(h.transport.open_count(), 2);
    assert_eq!(h.client.generation(), Some(2));
    assert!(h.client.next_deadline().is_none());
}

#[test]
fn test_failed_reconnect_schedules_next_attempt() {
    let mut h = harness(ReconnectPolicy::default());
    let t0 = Instant::now();
    h.transport.fail_next_opens(2, "spawn failed");

    assert!(h.client.connect(t0).is_err());
    let t1 = t0 + DEFAULT_RECONNECT_DELAY;
    assert!(matches!(h.client.poll(t1), Some(Err(_))));
    assert_eq!(h.client.next_deadline(), Some(t1 + DEFAULT_RECONNECT_DELAY));

    let t2 = t1 + DEFAULT_RECONNECT_DELAY;
    assert!(matches!(h.client.poll(t2), Some(Ok(()))));
    assert_eq!(h.transport.open_count(), 3);
    assert_eq!(h.client.failures(), 0);
}

#[test]
fn test_stale_close_does_not_tear_down_new_link() {
    let mut h = harness(ReconnectPolicy::default());
    let t0 = Instant::now();
    h.client.connect(t0).unwrap();
    h.transport.close(Some("pipe closed"));
    let first_close = h.events.lock().pop().unwrap();
    h.client.handle_link_event(first_close.clone(), t0);
    h.client.poll(t0 + DEFAULT_RECONNECT_DELAY).unwrap().unwrap();

    // The old link's close arrives again, late
    assert_eq!(
        h.client.handle_link_event(first_close, t0 + DEFAULT_RECONNECT_DELAY),
        ClientNotice::Ignored
    );
    assert!(h.client.is_connected());
}

#[test]
fn test_response_on_live_link_is_forwarded() {
    let mut h = harness(ReconnectPolicy::default());
    let now = Instant::now();
    h.client.connect(now).unwrap();
    h.transport.respond(ProviderResponse::failure("no colors yet"));

    let event = h.events.lock().pop().unwrap();
    match h.client.handle_link_event(event, now) {
        ClientNotice::Response(resp) => assert_eq!(resp.error.as_deref(), Some("no colors yet")),
        other => panic!("Expected response, got {:?}", other),
    }
}

#[test]
fn test_write_failure_drops_link() {
    let mut h = harness(ReconnectPolicy::default());
    let now = Instant::now();
    h.client.connect(now).unwrap();
    h.transport.fail_writes(true);

    assert!(matches!(
        h.client.request_palette(now),
        Err(SyncError::ConnectionUnavailable(_))
    ));
    assert_eq!(h.client.state(), ConnectionState::Disconnected);
    assert_eq!(h.client.next_deadline(), Some(now + DEFAULT_RECONNECT_DELAY));
}

#[test]
fn test_explicit_disconnect_cancels_reconnect() {
    let mut h = harness(ReconnectPolicy::default());
    let now = Instant::now();
    h.transport.fail_next_opens(1, "nope");
    let _ = h.client.connect(now);
    assert!(h.client.next_deadline().is_some());

    h.client.disconnect();
    assert!(h.client.next_deadline().is_none());
    assert!(h.client.poll(now + Duration::from_secs(3600)).is_none());
}

#[test]
fn test_max_attempts_stops_scheduling() {
    let policy = ReconnectPolicy {
        max_attempts: Some(2),
        ..ReconnectPolicy::default()
    };
    let mut h = harness(policy);
    let t0 = Instant::now();
    h.transport.fail_next_opens(3, "gone");

    assert!(h.client.connect(t0).is_err());
    let t1 = t0 + DEFAULT_RECONNECT_DELAY;
    assert!(matches!(h.client.poll(t1), Some(Err(_))));
    assert!(h.client.poll(t1 + DEFAULT_RECONNECT_DELAY).is_some());
    // Third failure exceeds the budget
    assert!(h.client.next_deadline().is_none());
}

#[test]
fn test_backoff_policy_grows_and_caps() {
    let policy = ReconnectPolicy {
        delay: Duration::from_secs(1),
        max_attempts: None,
        backoff_factor: 2.0,
        max_delay: Duration::from_secs(5),
    };
    assert_eq!(policy.delay_for(1), Duration::from_secs(1));
    assert_eq!(policy.delay_for(2), Duration::from_secs(2));
    assert_eq!(policy.delay_for(3), Duration::from_secs(4));
    assert_eq!(policy.delay_for(4), Duration::from_secs(5));
    assert_eq!(policy.delay_for(1000), Duration::from_secs(5));
}

#[test]
fn test_default_policy_is_fixed_delay() {
    let policy = ReconnectPolicy::default();
    for attempt in 1..10 {
        assert_eq!(policy.delay_for(attempt), Duration::from_secs(5));
    }
}

#[test]
fn test_zero_delay_config_does_not_reconnect_in_place() {
    let reconnect: crate::config::ReconnectConfig =
        serde_json::from_str(r#"{"delayMs":0}"#).unwrap();
    let mut h = harness(reconnect.policy());
    let t0 = Instant::now();
    h.transport.fail_next_opens(100, "provider exited");

    assert!(h.client.connect(t0).is_err());
    for _ in 0..10 {
        assert!(h.client.poll(t0).is_none());
    }
    assert_eq!(h.transport.open_count(), 1);
    assert!(h.client.next_deadline().unwrap() > t0);
}
