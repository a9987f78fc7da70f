#![allow(clippy::unwrap_used)]
// End-to-end: Monitor with two mock cameras and an in-memory sink.

mod common;

use std::time::Duration;

use headcount_core::{
    Direction, MemorySink, Monitor, MonitorConfig, SCHEDULED_RESET, SinkRecord,
};
use pretty_assertions::assert_eq;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::{CGI, MULTIPART, device, multipart, number_stat, transport};

async fn camera(blocks: &[&str]) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(CGI))
        .and(query_param("action", "attach"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(multipart(blocks), MULTIPART))
        .mount(&server)
        .await;
    server
}

fn config(devices: Vec<headcount_core::DeviceSource>) -> MonitorConfig {
    MonitorConfig {
        devices,
        transport: transport(),
        heartbeat_secs: 5,
        poll_interval: Duration::ZERO,
        backoff_floor: Duration::from_millis(50),
        backoff_ceiling: Duration::from_millis(200),
        reset: None,
    }
}

#[tokio::test]
async fn monitor_reconciles_two_cameras() {
    let d4 = camera(&[
        &number_stat(10, 4),
        "summary.RuleName=ManNumDetection\r\nsummary.InsideSubtotal.Total=2",
    ])
    .await;
    let d6 = camera(&[&number_stat(5, 1)]).await;

    let mut d6_source = device(&d6, "D6", 5);
    d6_source.gauge_weight = 0;
    let sink = MemorySink::new();
    let monitor = Monitor::start(
        config(vec![device(&d4, "D4", 3), d6_source]),
        sink.clone(),
    )
    .unwrap();
    assert_eq!(monitor.devices().len(), 2);

    // D4: 10 - 4 + 2 = 8, D6: 5 - 1 = 4
    let mut snapshots = monitor.engine().subscribe_snapshots();
    let settled = tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            if snapshots.latest().total == 12 {
                break;
            }
            snapshots.changed().await.unwrap();
        }
    })
    .await;
    assert!(settled.is_ok(), "occupancy never reached 12");

    let debug = monitor.engine().get_debug_state();
    assert_eq!(
        debug
            .iter()
            .map(|r| (r.camera.as_str(), r.last_entered, r.last_exited, r.inside_total))
            .collect::<Vec<_>>(),
        vec![("D4", 10, 4, 2), ("D6", 5, 1, 0)]
    );

    let log = monitor
        .engine()
        .reset_occupancy(SCHEDULED_RESET)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(log.reason, "SCHEDULED_RESET: 0");
    assert_eq!(log.offset_after, -12);
    assert_eq!(monitor.engine().get_snapshot().total, 0);

    assert!(monitor.shutdown_within(Duration::from_secs(5)).await);

    // Reconnects replay the same counters; each flow is recorded once.
    let events = sink.events().await;
    let mut flows: Vec<_> = events
        .iter()
        .map(|e| (e.camera.as_str(), e.direction, e.delta))
        .collect();
    flows.sort_by_key(|&(camera, direction, _)| (camera.to_owned(), direction.to_string()));
    assert_eq!(
        flows,
        vec![
            ("D4", Direction::Entry, 10),
            ("D4", Direction::Exit, 4),
            ("D6", Direction::Entry, 5),
            ("D6", Direction::Exit, 1),
        ]
    );

    let audits: Vec<_> = sink
        .records()
        .await
        .into_iter()
        .filter(|r| matches!(r, SinkRecord::Audit(_)))
        .collect();
    assert_eq!(audits.len(), 1);
}

#[tokio::test]
async fn shutdown_is_prompt_with_unreachable_camera() {
    let unreachable = {
        let server = MockServer::start().await;
        device(&server, "D4", 3)
    };
    let mut cfg = config(vec![unreachable]);
    cfg.backoff_floor = Duration::from_secs(30);
    cfg.backoff_ceiling = Duration::from_secs(60);
    cfg.poll_interval = Duration::from_secs(60);
    cfg.reset = headcount_core::ResetSchedule::daily(3, 0);

    let monitor = Monitor::start(cfg, MemorySink::new()).unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert!(monitor.shutdown_within(Duration::from_secs(2)).await);
    assert!(
        monitor
            .engine()
            .set_occupancy(3, "MANUAL")
            .await
            .is_err()
    );
}

#[tokio::test]
async fn failing_camera_does_not_hold_up_healthy_one() {
    // no mocks mounted: every attach is answered with 404
    let rejecting = MockServer::start().await;
    let healthy = camera(&[&number_stat(7, 2)]).await;

    let mut cfg = config(vec![device(&healthy, "D4", 3), device(&rejecting, "D6", 5)]);
    cfg.backoff_floor = Duration::from_secs(30);
    cfg.backoff_ceiling = Duration::from_secs(60);
    let monitor = Monitor::start(cfg, MemorySink::new()).unwrap();

    let mut snapshots = monitor.engine().subscribe_snapshots();
    let settled = tokio::time::timeout(Duration::from_secs(5), async {
        while snapshots.latest().total != 5 {
            snapshots.changed().await.unwrap();
        }
    })
    .await;
    assert!(settled.is_ok(), "healthy camera never reached the snapshot");

    let failing = &monitor.devices()[1];
    assert_eq!(failing.name, "D6");
    assert!(matches!(
        *failing.state.borrow(),
        headcount_core::SupervisorState::Connecting | headcount_core::SupervisorState::Backoff { .. }
    ));

    assert!(monitor.shutdown_within(Duration::from_secs(2)).await);
}
