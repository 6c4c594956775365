//! End-to-end monitor flows against mock sessions.
//!
//! Every test runs on a paused clock; the shutdown future doubles as the
//! driver that feeds events and advances time.

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use floodgate::application::connection::ConnectionState;
use floodgate::application::monitor::Monitor;
use floodgate::application::stats::LATENCY_WINDOW;
use floodgate::domain::ResourceUpdate;
use floodgate::error::Error;
use floodgate::port::SessionEvent;
use floodgate::testkit::config::monitor_settings;
use floodgate::testkit::session::{channel_session, RecordingClient, ScriptedSession};
use tokio::time::sleep;

const TARGET: &str = "target@g.us";

fn opened() -> SessionEvent {
    SessionEvent::ResourceUpdates(vec![ResourceUpdate::restricted(TARGET, false)])
}

fn locked() -> SessionEvent {
    SessionEvent::ResourceUpdates(vec![ResourceUpdate::restricted(TARGET, true)])
}

#[tokio::test(start_paused = true)]
async fn open_group_at_startup_fires_one_full_burst() {
    let client = Arc::new(RecordingClient::new().with_snapshot(false));
    let session = ScriptedSession::new(client.clone()).with_connection(vec![SessionEvent::Open]);

    let report = Monitor::new(session, monitor_settings(TARGET, 5))
        .run(sleep(Duration::from_secs(2)))
        .await
        .into_result()
        .unwrap();

    assert_eq!(report.stats.bursts_fired, 1);
    assert_eq!(report.stats.messages_sent, 5);
    let sent = client.sent();
    assert_eq!(sent.len(), 5);
    assert!(sent.iter().all(|(id, text)| id.as_str() == TARGET && text == "🔥"));
}

#[tokio::test(start_paused = true)]
async fn repeated_open_updates_fire_once() {
    let client = Arc::new(RecordingClient::new().with_snapshot(true));
    let session = ScriptedSession::new(client.clone())
        .with_connection(vec![SessionEvent::Open, opened(), opened()]);

    let report = Monitor::new(session, monitor_settings(TARGET, 3))
        .run(sleep(Duration::from_secs(2)))
        .await
        .into_result()
        .unwrap();

    assert_eq!(report.stats.bursts_fired, 1);
    assert_eq!(report.stats.triggers_coalesced, 0);
    assert_eq!(client.sent().len(), 3);
}

#[tokio::test(start_paused = true)]
async fn staggered_burst_latency_spans_the_last_send() {
    let client = Arc::new(
        RecordingClient::new()
            .with_snapshot(true)
            .with_latency(Duration::from_millis(30)),
    );
    let session =
        ScriptedSession::new(client.clone()).with_connection(vec![SessionEvent::Open, opened()]);
    let mut settings = monitor_settings(TARGET, 5);
    settings.burst.per_action_delay = Duration::from_millis(20);

    let report = Monitor::new(session, settings)
        .run(sleep(Duration::from_secs(2)))
        .await
        .into_result()
        .unwrap();

    assert_eq!(report.stats.bursts_fired, 1);
    let latency = report.stats.recent_latencies_ms[0];
    // Last send starts at 4 * 20ms and takes 30ms.
    assert!((110.0..150.0).contains(&latency), "latency {latency}");
}

#[tokio::test(start_paused = true)]
async fn logged_out_session_stops_without_reconnecting() {
    let client = Arc::new(RecordingClient::new().with_snapshot(true));
    let session = ScriptedSession::new(client.clone()).with_connection(vec![
        SessionEvent::Connecting,
        SessionEvent::Closed {
            reason: "closed with status 401".into(),
            logged_out: true,
        },
    ]);
    let connects = session.connect_counter();

    let err = Monitor::new(session, monitor_settings(TARGET, 3))
        .run(sleep(Duration::from_secs(30)))
        .await
        .into_result()
        .unwrap_err();

    assert!(matches!(err, Error::LoggedOut { .. }));
    assert!(err.is_fatal());
    assert_eq!(connects.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn logged_out_session_still_reports_final_stats() {
    let client = Arc::new(RecordingClient::new().with_snapshot(false));
    let (session, handle) = channel_session(client.clone(), 4);
    let driver = async move {
        handle.send(SessionEvent::Open).await;
        sleep(Duration::from_secs(1)).await;
        handle
            .send(SessionEvent::Closed {
                reason: "closed with status 401".into(),
                logged_out: true,
            })
            .await;
        std::future::pending::<()>().await;
    };

    let report = Monitor::new(session, monitor_settings(TARGET, 4))
        .run(driver)
        .await;

    assert_eq!(report.state, ConnectionState::ClosedTerminal);
    assert_eq!(report.stats.bursts_fired, 1);
    assert_eq!(report.stats.messages_sent, 4);
    assert_eq!(report.stats.recent_latencies_ms.len(), 1);
    let err = report.into_result().unwrap_err();
    assert!(matches!(err, Error::LoggedOut { .. }));
}

#[tokio::test(start_paused = true)]
async fn dropped_connection_reconnects_after_fixed_delay() {
    let client = Arc::new(RecordingClient::new().with_snapshot(true));
    let session = ScriptedSession::new(client.clone())
        .with_connection(vec![
            SessionEvent::Open,
            SessionEvent::dropped("connection reset"),
        ])
        .with_connection(vec![SessionEvent::Open]);
    let connects = session.connect_counter();
    let times = session.connect_times();

    let report = Monitor::new(session, monitor_settings(TARGET, 3))
        .run(sleep(Duration::from_secs(10)))
        .await
        .into_result()
        .unwrap();

    assert_eq!(connects.load(Ordering::SeqCst), 2);
    assert_eq!(report.reconnects, 1);
    assert_eq!(report.state, ConnectionState::Open);

    let times = times.lock();
    let gap = times[1] - times[0];
    assert!(gap >= Duration::from_millis(2000), "gap {gap:?}");
    assert!(gap < Duration::from_millis(2100), "gap {gap:?}");
}

#[tokio::test(start_paused = true)]
async fn unreadable_target_is_fatal() {
    let client = Arc::new(RecordingClient::new().failing_fetch("item-not-found"));
    let session = ScriptedSession::new(client.clone()).with_connection(vec![SessionEvent::Open]);

    let err = Monitor::new(session, monitor_settings(TARGET, 3))
        .run(sleep(Duration::from_secs(5)))
        .await
        .into_result()
        .unwrap_err();

    match err {
        Error::ResourceUnavailable { identifier, reason } => {
            assert_eq!(identifier, TARGET);
            assert!(reason.contains("item-not-found"));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(client.sent().is_empty());
}

#[tokio::test(start_paused = true)]
async fn reconnecting_to_an_open_group_fires_again() {
    let client = Arc::new(RecordingClient::new().with_snapshot(false));
    let session = ScriptedSession::new(client.clone())
        .with_connection(vec![SessionEvent::Open, SessionEvent::dropped("timeout")])
        .with_connection(vec![SessionEvent::Open]);

    let report = Monitor::new(session, monitor_settings(TARGET, 2))
        .run(sleep(Duration::from_secs(10)))
        .await
        .into_result()
        .unwrap();

    assert_eq!(client.fetch_count(), 2);
    assert_eq!(report.stats.bursts_fired, 2);
    assert_eq!(client.sent().len(), 4);
}

#[tokio::test(start_paused = true)]
async fn opening_missed_while_disconnected_fires_on_reconnect() {
    let client = Arc::new(RecordingClient::new().with_snapshot(true));
    let session = ScriptedSession::new(client.clone())
        .with_connection(vec![SessionEvent::Open, SessionEvent::dropped("timeout")])
        .with_connection(vec![SessionEvent::Open]);

    let driver = {
        let client = client.clone();
        async move {
            sleep(Duration::from_secs(1)).await;
            client.set_restricted(false);
            sleep(Duration::from_secs(9)).await;
        }
    };
    let report = Monitor::new(session, monitor_settings(TARGET, 2))
        .run(driver)
        .await
        .into_result()
        .unwrap();

    assert_eq!(report.stats.bursts_fired, 1);
    assert_eq!(client.sent().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn updates_for_other_groups_are_ignored() {
    let client = Arc::new(RecordingClient::new().with_snapshot(true));
    let session = ScriptedSession::new(client.clone()).with_connection(vec![
        SessionEvent::Open,
        SessionEvent::ResourceUpdates(vec![
            ResourceUpdate::restricted("other@g.us", true),
            ResourceUpdate::restricted("other@g.us", false),
        ]),
    ]);

    let report = Monitor::new(session, monitor_settings(TARGET, 3))
        .run(sleep(Duration::from_secs(2)))
        .await
        .into_result()
        .unwrap();

    assert_eq!(report.stats.bursts_fired, 0);
    assert!(client.sent().is_empty());
}

#[tokio::test(start_paused = true)]
async fn latency_window_keeps_the_most_recent_bursts() {
    let client = Arc::new(RecordingClient::new().with_snapshot(true));
    let (session, handle) = channel_session(client.clone(), 8);

    let driver = async move {
        handle.send(SessionEvent::Open).await;
        for _ in 0..11 {
            sleep(Duration::from_secs(1)).await;
            handle.send(opened()).await;
            sleep(Duration::from_secs(1)).await;
            handle.send(locked()).await;
        }
        sleep(Duration::from_secs(1)).await;
        assert_eq!(handle.connect_count(), 1);
    };
    let report = Monitor::new(session, monitor_settings(TARGET, 1))
        .run(driver)
        .await
        .into_result()
        .unwrap();

    assert_eq!(report.stats.bursts_fired, 11);
    assert_eq!(report.stats.messages_sent, 11);
    assert_eq!(report.stats.recent_latencies_ms.len(), LATENCY_WINDOW);
    assert_eq!(client.sent().len(), 11);
}
