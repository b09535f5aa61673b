//! Connection lifecycle and reconnection behavior of a single manager.

pub mod common;

use common::harness::{init_tracing, ScriptedConnector};
use rabbit_warden::{
    config::{Config, ReconnectConfig},
    ConnectionManager, ConnectionState, Error, ManagerRegistry,
};
use std::{sync::Arc, time::Duration};
use tokio::time::{sleep, Instant};

fn manager_with(connector: &Arc<ScriptedConnector>, max_reconnections: u32) -> ConnectionManager {
    init_tracing();
    let config = Config {
        reconnect: ReconnectConfig {
            max_reconnections,
            ..ReconnectConfig::default()
        },
        ..Config::default()
    };
    ConnectionManager::new(config, connector.clone()).unwrap()
}

#[tokio::test]
async fn test_state_before_initialize_is_not_initialized() {
    let connector = ScriptedConnector::manual();
    let manager = manager_with(&connector, 5);

    let result = manager.current_state().await;
    assert!(matches!(result, Err(Error::NotInitialized)));
    assert_eq!(connector.connects(), 0);
}

#[tokio::test]
async fn test_initialize_reaches_open_with_channel() {
    let connector = ScriptedConnector::manual();
    let manager = manager_with(&connector, 5);

    manager.initialize().await.unwrap();
    connector.wait_for_connects(1).await;
    assert_eq!(manager.current_state().await.unwrap(), ConnectionState::Init);
    assert!(matches!(manager.channel_info().await, Err(Error::NoChannel)));

    connector.last().open();
    assert_eq!(manager.current_state().await.unwrap(), ConnectionState::Open);
    let info = manager.channel_info().await.unwrap();
    assert_eq!(info.channel_number, 1);
    assert!(info.flow_active);
}

#[tokio::test(start_paused = true)]
async fn test_channel_is_dropped_on_close() {
    let connector = ScriptedConnector::auto_open();
    let manager = manager_with(&connector, 5);

    manager.initialize().await.unwrap();
    connector.wait_for_connects(1).await;
    assert!(manager.channel_info().await.is_ok());

    connector.last().drop_connection("connection reset");
    assert_eq!(manager.current_state().await.unwrap(), ConnectionState::Closed);
    assert!(matches!(manager.channel_info().await, Err(Error::NoChannel)));
}

#[tokio::test]
async fn test_unknown_native_phase_is_unsupported() {
    let connector = ScriptedConnector::manual();
    let manager = manager_with(&connector, 5);

    manager.initialize().await.unwrap();
    connector.wait_for_connects(1).await;
    connector.last().set_phase(7);

    let result = manager.current_state().await;
    assert!(matches!(result, Err(Error::UnsupportedState(7))));
}

#[tokio::test(start_paused = true)]
async fn test_reconnect_waits_grow_by_two() {
    let connector = ScriptedConnector::auto_open();
    let manager = manager_with(&connector, 0);

    manager.initialize().await.unwrap();
    connector.wait_for_connects(1).await;

    for (attempt, expected) in [1u64, 3, 5, 7].into_iter().enumerate() {
        let closed_at = Instant::now();
        connector.last().drop_connection("heartbeat timeout");
        connector.wait_for_connects(attempt + 2).await;

        let waited = connector.connected_at(attempt + 1) - closed_at;
        assert_eq!(waited, Duration::from_secs(expected), "attempt {attempt}");
        assert_eq!(manager.current_state().await.unwrap(), ConnectionState::Open);
    }

    let status = manager.reconnect_status().await.unwrap();
    assert_eq!(status.scheduled, 4);
    assert_eq!(status.stored_units, 8);
    assert!(!status.pending);
}

#[tokio::test(start_paused = true)]
async fn test_budget_exhaustion_leaves_manager_closed() {
    let connector = ScriptedConnector::auto_open();
    let manager = manager_with(&connector, 5);

    manager.initialize().await.unwrap();
    connector.wait_for_connects(1).await;

    for attempt in 0..5 {
        connector.last().drop_connection("broker restart");
        connector.wait_for_connects(attempt + 2).await;
    }

    connector.last().drop_connection("broker restart");
    let status = manager.reconnect_status().await.unwrap();
    assert_eq!(status.scheduled, 5);
    assert!(!status.pending);

    sleep(Duration::from_secs(120)).await;
    assert_eq!(connector.connects(), 6);
    assert_eq!(manager.current_state().await.unwrap(), ConnectionState::Closed);
}

#[tokio::test(start_paused = true)]
async fn test_only_one_reconnection_pending() {
    let connector = ScriptedConnector::auto_open();
    let manager = manager_with(&connector, 5);

    manager.initialize().await.unwrap();
    connector.wait_for_connects(1).await;

    let handle = connector.last();
    handle.drop_connection("reset");
    handle.drop_connection("reset again");

    let status = manager.reconnect_status().await.unwrap();
    assert_eq!(status.scheduled, 1);
    assert!(status.pending);

    connector.wait_for_connects(2).await;
    sleep(Duration::from_secs(60)).await;
    assert_eq!(connector.connects(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_interrupts_pending_reconnection() {
    let connector = ScriptedConnector::auto_open();
    let manager = manager_with(&connector, 5);

    manager.initialize().await.unwrap();
    connector.wait_for_connects(1).await;
    connector.last().drop_connection("reset");
    assert!(manager.reconnect_status().await.unwrap().pending);

    manager.shutdown();
    assert!(manager.is_shut_down());
    sleep(Duration::from_secs(60)).await;

    assert_eq!(connector.connects(), 1);
    assert!(connector.handle(0).was_closed());
    assert!(matches!(
        manager.current_state().await,
        Err(Error::ManagerClosed)
    ));
    assert!(matches!(manager.initialize().await, Err(Error::ManagerClosed)));
}

#[tokio::test(start_paused = true)]
async fn test_explicit_initialize_supersedes_transport() {
    let connector = ScriptedConnector::auto_open();
    let manager = manager_with(&connector, 5);

    manager.initialize().await.unwrap();
    connector.wait_for_connects(1).await;
    let first = connector.last();
    first.drop_connection("reset");
    assert!(manager.reconnect_status().await.unwrap().pending);

    manager.initialize().await.unwrap();
    connector.wait_for_connects(2).await;
    assert!(first.was_closed());
    assert!(!manager.reconnect_status().await.unwrap().pending);

    // Late callbacks from the replaced transport are ignored.
    first.drop_connection("late close");
    let status = manager.reconnect_status().await.unwrap();
    assert_eq!(status.scheduled, 1);
    assert!(!status.pending);

    sleep(Duration::from_secs(60)).await;
    assert_eq!(connector.connects(), 2);
    assert_eq!(manager.current_state().await.unwrap(), ConnectionState::Open);
}

#[tokio::test(start_paused = true)]
async fn test_open_failure_does_not_schedule_reconnection() {
    let connector = ScriptedConnector::manual();
    let manager = manager_with(&connector, 5);

    manager.initialize().await.unwrap();
    connector.wait_for_connects(1).await;
    connector.last().fail_open("ACCESS_REFUSED");

    assert_eq!(manager.current_state().await.unwrap(), ConnectionState::Closed);
    assert!(!manager.reconnect_status().await.unwrap().pending);
    sleep(Duration::from_secs(60)).await;
    assert_eq!(connector.connects(), 1);
}

#[tokio::test]
async fn test_connector_error_leaves_manager_closed() {
    let connector = ScriptedConnector::auto_open();
    connector.fail_next();
    let manager = manager_with(&connector, 5);

    manager.initialize().await.unwrap();
    connector.wait_for_connects(1).await;

    assert_eq!(manager.current_state().await.unwrap(), ConnectionState::Closed);
    assert!(!manager.reconnect_status().await.unwrap().pending);

    manager.initialize().await.unwrap();
    connector.wait_for_connects(2).await;
    assert_eq!(manager.current_state().await.unwrap(), ConnectionState::Open);
}

#[tokio::test]
async fn test_registry_lookup() {
    let connector = ScriptedConnector::manual();
    let registry = ManagerRegistry::new();
    let first = manager_with(&connector, 5);
    let second = manager_with(&connector, 5);
    assert_ne!(first.id(), second.id());

    let id = registry.insert(first.clone());
    registry.insert(second);
    assert_eq!(registry.len(), 2);

    let found = registry.get(&id.to_string()).unwrap();
    assert_eq!(found.id(), first.id());

    let missing = registry.get("3f1c2d9e-0000-4000-8000-000000000000");
    assert!(matches!(missing, Err(Error::UnknownManager(_))));
    assert!(matches!(registry.get("garbage"), Err(Error::UnknownManager(_))));

    registry.shutdown_all();
    assert!(registry.is_empty());
    assert!(first.is_shut_down());
}

#[tokio::test]
async fn test_channel_hidden_once_transport_leaves_open() {
    let connector = ScriptedConnector::auto_open();
    let manager = manager_with(&connector, 5);

    manager.initialize().await.unwrap();
    connector.wait_for_connects(1).await;
    assert!(manager.channel_info().await.is_ok());

    // Closing handshake started, close callback not delivered yet.
    connector.last().set_phase(6);
    assert_eq!(manager.current_state().await.unwrap(), ConnectionState::Closing);
    assert!(matches!(manager.channel_info().await, Err(Error::NoChannel)));
}
