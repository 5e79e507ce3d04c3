//! Single-server worker and domain lookup tests against the in-memory CloudControl

use orbit_common::ResourceKind;
use orbit_teardown::teardown::server::ServerWorker;
use orbit_teardown::teardown::{ChannelSink, NullSink, Transition};
use orbit_teardown::wait::WaitConfig;
use orbit_teardown::{TeardownError, TeardownEvent, resolve_network_domain};
use orbit_test_utils::{Call, FakeCloud, TEST_DATACENTER, fixtures, init_test_tracing};
use std::sync::Arc;
use std::time::Duration;

fn wait_config() -> WaitConfig {
    WaitConfig {
        initial_delay: Duration::from_millis(10),
        max_delay: Duration::from_millis(50),
        timeout: Duration::from_secs(300),
    }
}

fn worker(cloud: &Arc<FakeCloud>) -> ServerWorker<FakeCloud> {
    init_test_tracing();
    ServerWorker::new(Arc::clone(cloud), Arc::new(NullSink), wait_config())
}

#[tokio::test(start_paused = true)]
async fn test_running_server_full_path() {
    let cloud = Arc::new(FakeCloud::new());
    let server = fixtures::server("nd-1", 1, true);
    cloud.add_server(server.clone());
    let (sink, mut rx) = ChannelSink::channel();
    let worker = ServerWorker::new(Arc::clone(&cloud), Arc::new(sink), wait_config());

    worker.run(&server).await.unwrap();

    assert_eq!(cloud.remaining(ResourceKind::Server), 0);
    let calls: Vec<Call> = cloud
        .calls()
        .into_iter()
        .filter(|c| !matches!(c, Call::Poll { .. }))
        .collect();
    assert_eq!(
        calls,
        vec![
            Call::PowerOff { id: "srv-1".into() },
            Call::Delete {
                kind: ResourceKind::Server,
                id: "srv-1".into()
            },
        ]
    );

    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    assert!(matches!(events[0], TeardownEvent::Stopping { .. }));
    assert!(matches!(events[1], TeardownEvent::Stopped { .. }));
    assert!(matches!(events[2], TeardownEvent::Deleting { .. }));
    assert!(matches!(events[3], TeardownEvent::Deleted { .. }));
    assert_eq!(events.len(), 4);
}

#[tokio::test(start_paused = true)]
async fn test_stopped_server_skips_power_off() {
    let cloud = Arc::new(FakeCloud::new());
    let server = fixtures::server("nd-1", 1, false);
    cloud.add_server(server.clone());

    worker(&cloud).run(&server).await.unwrap();

    assert!(cloud.power_offs().is_empty());
    assert_eq!(cloud.deletes().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_rejected_power_off_fails_without_delete() {
    let cloud = Arc::new(FakeCloud::new());
    let server = fixtures::server("nd-1", 1, true);
    cloud.add_server(server.clone());
    cloud.reject_power_off("srv-1");

    let err = worker(&cloud).run(&server).await.unwrap_err();

    assert!(matches!(err, TeardownError::PowerOffRejected { ref id, .. } if id == "srv-1"));
    assert!(cloud.deletes().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_power_off_timeout_after_five_minutes() {
    let cloud = Arc::new(FakeCloud::new());
    let server = fixtures::server("nd-1", 1, true);
    cloud.add_server(server.clone());
    cloud.stick("srv-1");

    let started = tokio::time::Instant::now();
    let err = worker(&cloud).run(&server).await.unwrap_err();

    assert!(matches!(
        err,
        TeardownError::TransitionTimeout {
            transition: Transition::PoweredOff,
            ..
        }
    ));
    assert!(started.elapsed() >= Duration::from_secs(300));
    assert!(cloud.deletes().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_removal_failure_state() {
    let cloud = Arc::new(FakeCloud::new());
    let server = fixtures::server("nd-1", 1, false);
    cloud.add_server(server.clone());
    cloud.fail_state("srv-1", "FAILED_DELETE");

    let err = worker(&cloud).run(&server).await.unwrap_err();

    assert!(matches!(
        err,
        TeardownError::TransitionFailed {
            transition: Transition::Deleted,
            ref state,
            ..
        } if state == "FAILED_DELETE"
    ));
}

#[tokio::test(start_paused = true)]
async fn test_resolve_network_domain() {
    init_test_tracing();
    let cloud = FakeCloud::new();
    cloud.add_network_domain(fixtures::network_domain("nd-1"));

    let domain = resolve_network_domain(&cloud, "nd-1-name", TEST_DATACENTER)
        .await
        .unwrap();
    assert_eq!(domain.id, "nd-1");

    let err = resolve_network_domain(&cloud, "nd-1-name", "EU6")
        .await
        .unwrap_err();
    assert!(matches!(err, TeardownError::DomainNotFound { .. }));
    assert_eq!(
        err.to_string(),
        "Unable to find network domain 'nd-1-name' in datacenter 'EU6'"
    );
}

#[tokio::test(start_paused = true)]
async fn test_resolve_lookup_failure() {
    let cloud = FakeCloud::new();
    cloud.fail_lookup();

    let err = resolve_network_domain(&cloud, "anything", TEST_DATACENTER)
        .await
        .unwrap_err();
    assert!(matches!(err, TeardownError::Resolve { .. }));
    assert!(err.is_transport());
}
