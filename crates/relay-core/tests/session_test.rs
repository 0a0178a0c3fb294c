// Integration tests for `DeviceSession` against a wiremock device.
//
// Polling is disabled (poll_interval = 0) so every request in these tests
// is driven explicitly -- request counts are deterministic.

use std::time::Duration;

use pretty_assertions::assert_eq;
use secrecy::SecretString;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use relay_core::{ConnectionState, CoreError, DeviceSession, RelayMode, SessionConfig, TimeSlot};

// ── Helpers ─────────────────────────────────────────────────────────

fn manual_session() -> DeviceSession {
    DeviceSession::new(SessionConfig {
        timeout: Duration::from_secs(5),
        poll_interval: Duration::ZERO,
    })
}

fn status_body(time: &str, relay: bool, mode: &str) -> serde_json::Value {
    json!({ "time": time, "relay": relay, "mode": mode })
}

async fn connect(session: &DeviceSession, server: &MockServer) {
    session
        .connect(&server.uri(), "admin", SecretString::from("admin123"))
        .await
        .expect("connect");
}

// ── Login ───────────────────────────────────────────────────────────

#[tokio::test]
async fn blank_address_fails_validation_without_network_io() {
    let server = MockServer::start().await;
    let session = manual_session();

    let result = session
        .connect("   ", "admin", SecretString::from("admin123"))
        .await;

    assert!(matches!(result, Err(CoreError::Validation { .. })));
    assert_eq!(session.current_state(), ConnectionState::Disconnected);
    assert!(server.received_requests().await.expect("requests").is_empty());
}

#[tokio::test]
async fn rejected_credentials_leave_session_unauthenticated() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/status"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let session = manual_session();
    let result = session
        .connect(&server.uri(), "admin", SecretString::from("wrong"))
        .await;

    assert!(
        matches!(result, Err(CoreError::AuthenticationFailed { .. })),
        "expected AuthenticationFailed, got: {result:?}"
    );
    assert_eq!(session.current_state(), ConnectionState::Disconnected);
    assert!(session.current_status().is_none());
}

#[tokio::test]
async fn unreachable_device_fails_with_connection_error() {
    let session = manual_session();

    // Nothing listens on this address.
    let result = session
        .connect("127.0.0.1:1", "admin", SecretString::from("admin123"))
        .await;

    assert!(
        matches!(result, Err(CoreError::ConnectionFailed { .. })),
        "expected ConnectionFailed, got: {result:?}"
    );
    assert_eq!(session.current_state(), ConnectionState::Disconnected);
}

#[tokio::test]
async fn successful_connect_probes_status_exactly_once() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/status"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(status_body("12:00:00", false, "AUTO")),
        )
        .expect(1)
        .mount(&server)
        .await;

    let session = manual_session();
    connect(&session, &server).await;

    assert_eq!(session.current_state(), ConnectionState::Connected);
    let status = session.current_status().expect("probe populates status");
    assert_eq!(status.time, "12:00:00");
    assert!(!status.relay);
    assert_eq!(status.mode, RelayMode::Auto);
}

#[tokio::test]
async fn snapshots_stay_current_without_any_subscriber() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/status"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(status_body("12:00:00", true, "MANUAL")),
        )
        .mount(&server)
        .await;

    let session = manual_session();

    // No receiver exists during connect; the state and status snapshots
    // must still reflect the probe afterwards.
    connect(&session, &server).await;
    assert_eq!(session.current_state(), ConnectionState::Connected);
    assert!(session.current_status().is_some());

    // A receiver taken after the fact starts from the live values.
    let state_rx = session.connection_state();
    assert_eq!(*state_rx.borrow(), ConnectionState::Connected);
    let status_rx = session.status();
    assert_eq!(
        status_rx.borrow().as_ref().expect("status").time,
        "12:00:00"
    );
}

// ── Logout ──────────────────────────────────────────────────────────

#[tokio::test]
async fn disconnect_resets_state_without_network_io() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/status"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(status_body("12:00:00", true, "MANUAL")),
        )
        .expect(1) // only the connect probe, nothing from disconnect
        .mount(&server)
        .await;

    let session = manual_session();
    connect(&session, &server).await;
    session.disconnect().await;

    assert_eq!(session.current_state(), ConnectionState::Disconnected);
    assert!(session.current_status().is_none());

    // Refresh after logout is a silent no-op.
    session.refresh_status().await.expect("no-op refresh");
}

// ── Status refresh ──────────────────────────────────────────────────

#[tokio::test]
async fn refresh_replaces_status_wholesale() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/status"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(status_body("08:00:00", false, "AUTO")),
        )
        .up_to_n_times(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/status"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(status_body("08:00:02", true, "MANUAL")),
        )
        .mount(&server)
        .await;

    let session = manual_session();
    connect(&session, &server).await;

    session.refresh_status().await.expect("refresh");

    let status = session.current_status().expect("status");
    assert_eq!(status.time, "08:00:02");
    assert!(status.relay);
    assert_eq!(status.mode, RelayMode::Manual);
}

#[tokio::test]
async fn failed_refresh_keeps_previous_status() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/status"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(status_body("09:30:00", true, "MANUAL")),
        )
        .up_to_n_times(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/status"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let session = manual_session();
    connect(&session, &server).await;

    let result = session.refresh_status().await;
    assert!(result.is_err(), "refresh against a 500 must fail");

    // Stale-but-present beats blank: the last good snapshot survives.
    let status = session.current_status().expect("previous status retained");
    assert_eq!(status.time, "09:30:00");
    assert!(status.relay);
}

#[tokio::test]
async fn network_loss_flips_state_to_offline_and_recovers() {
    // A builder-started server is exclusive (not pooled), so dropping it
    // actually shuts down the listener -- which is what "kill the device"
    // below relies on. A pooled `MockServer::start()` server would keep
    // listening after the drop.
    let server = MockServer::builder().start().await;

    Mock::given(method("GET"))
        .and(path("/api/status"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(status_body("10:00:00", false, "AUTO")),
        )
        .mount(&server)
        .await;

    let session = manual_session();
    connect(&session, &server).await;
    let uri = server.uri();

    // Kill the device mid-session.
    drop(server);
    let result = session.refresh_status().await;
    assert!(result.is_err());
    assert_eq!(session.current_state(), ConnectionState::Offline);
    assert!(session.current_state().is_authenticated());
    assert!(
        session.current_status().is_some(),
        "offline must not blank the display"
    );

    // Bring a device back on the same address and the next poll recovers.
    let revived = MockServer::builder()
        .listener(
            std::net::TcpListener::bind(
                uri.trim_start_matches("http://").to_string(),
            )
            .expect("rebind mock listener"),
        )
        .start()
        .await;

    Mock::given(method("GET"))
        .and(path("/api/status"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(status_body("10:00:08", false, "AUTO")),
        )
        .mount(&revived)
        .await;

    session.refresh_status().await.expect("recovered refresh");
    assert_eq!(session.current_state(), ConnectionState::Connected);
    assert_eq!(session.current_status().expect("status").time, "10:00:08");
}

// ── Toggle ──────────────────────────────────────────────────────────

#[tokio::test]
async fn toggle_always_resynchronizes_via_refresh() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/status"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(status_body("11:00:00", false, "AUTO")),
        )
        .up_to_n_times(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/toggle"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ON"))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/status"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(status_body("11:00:01", true, "MANUAL")),
        )
        .expect(1)
        .mount(&server)
        .await;

    let session = manual_session();
    connect(&session, &server).await;

    session.toggle_relay().await.expect("toggle");

    // Displayed state comes from the follow-up refresh, not the toggle body.
    let status = session.current_status().expect("status");
    assert!(status.relay);
    assert_eq!(status.mode, RelayMode::Manual);
}

#[tokio::test]
async fn toggle_failure_still_triggers_refresh() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/status"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(status_body("11:30:00", false, "AUTO")),
        )
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/toggle"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let session = manual_session();
    connect(&session, &server).await;

    // Toggle 500s, but the resync refresh still runs and succeeds.
    session.toggle_relay().await.expect("resync refresh");

    let requests = server.received_requests().await.expect("requests");
    let status_calls = requests
        .iter()
        .filter(|r| r.url.path() == "/api/status")
        .count();
    assert_eq!(status_calls, 2, "connect probe + post-toggle resync");
}

#[tokio::test]
async fn toggle_while_disconnected_is_rejected() {
    let session = manual_session();
    let result = session.toggle_relay().await;
    assert!(matches!(result, Err(CoreError::Disconnected)));
}

// ── Time slots ──────────────────────────────────────────────────────

#[tokio::test]
async fn slot_load_degrades_to_empty_list() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/status"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(status_body("12:00:00", false, "AUTO")),
        )
        .mount(&server)
        .await;

    let session = manual_session();
    connect(&session, &server).await;

    let slots = session.load_time_slots().await.expect("slot load");
    assert!(slots.is_empty(), "missing firmware endpoint means empty list");
}

#[tokio::test]
async fn slot_save_is_validated_and_kept_locally() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/status"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(status_body("12:00:00", false, "AUTO")),
        )
        .mount(&server)
        .await;

    let session = manual_session();
    connect(&session, &server).await;

    let slots = vec![
        TimeSlot::new("06:30", "08:00"),
        TimeSlot::new("18:00", "22:30"),
    ];
    session
        .save_time_slots(slots.clone())
        .await
        .expect("local-only save");

    assert_eq!(*session.current_slots(), slots);
}

#[tokio::test]
async fn slot_save_rejects_oversized_set() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/status"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(status_body("12:00:00", false, "AUTO")),
        )
        .mount(&server)
        .await;

    let session = manual_session();
    connect(&session, &server).await;

    let slots: Vec<_> = (0..15).map(|_| TimeSlot::new("06:00", "07:00")).collect();
    let result = session.save_time_slots(slots).await;

    assert!(matches!(result, Err(CoreError::Validation { .. })));
    assert!(session.current_slots().is_empty(), "rejected save changes nothing");
}

// ── Background polling ──────────────────────────────────────────────

#[tokio::test]
async fn poll_task_refreshes_on_interval_and_stops_on_disconnect() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/status"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(status_body("13:00:00", true, "MANUAL")),
        )
        .mount(&server)
        .await;

    let session = DeviceSession::new(SessionConfig {
        timeout: Duration::from_secs(5),
        poll_interval: Duration::from_millis(50),
    });
    connect(&session, &server).await;

    // Let a few poll ticks land.
    tokio::time::sleep(Duration::from_millis(200)).await;

    let polled = server.received_requests().await.expect("requests").len();
    assert!(polled >= 2, "expected probe + at least one poll, got {polled}");

    session.disconnect().await;
    let after_disconnect = server.received_requests().await.expect("requests").len();

    tokio::time::sleep(Duration::from_millis(200)).await;
    let later = server.received_requests().await.expect("requests").len();
    assert_eq!(
        after_disconnect, later,
        "no polls may be issued after disconnect"
    );
}

#[tokio::test]
async fn reconnect_replaces_the_poll_task() {
    let first = MockServer::start().await;
    let second = MockServer::start().await;

    for server in [&first, &second] {
        Mock::given(method("GET"))
            .and(path("/api/status"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(status_body("14:00:00", false, "AUTO")),
            )
            .mount(server)
            .await;
    }

    let session = DeviceSession::new(SessionConfig {
        timeout: Duration::from_secs(5),
        poll_interval: Duration::from_millis(25),
    });

    connect(&session, &first).await;
    // Connecting elsewhere cancels the first device's poll task and waits
    // for it before the new one starts.
    connect(&session, &second).await;

    let settled = first.received_requests().await.expect("requests").len();
    tokio::time::sleep(Duration::from_millis(200)).await;

    let later = first.received_requests().await.expect("requests").len();
    assert_eq!(settled, later, "old poll task must not outlive the reconnect");

    let polled = second.received_requests().await.expect("requests").len();
    assert!(polled >= 2, "new poll task must be running, got {polled}");

    session.disconnect().await;
}
