//! Unit tests for `WsManager`.
//!
//! These exercise the connection manager directly, without performing any
//! HTTP upgrades: add/remove, per-channel delivery, and shutdown.

use axum::extract::ws::Message;
use intake_api::ws::WsManager;
use intake_core::realtime::ADMIN_CHANNEL;

#[tokio::test]
async fn new_manager_has_zero_connections() {
    let manager = WsManager::new();

    assert_eq!(manager.connection_count().await, 0);
    assert_eq!(manager.subscriber_count(ADMIN_CHANNEL).await, 0);
}

#[tokio::test]
async fn add_and_remove_track_connection_count() {
    let manager = WsManager::new();

    let _rx1 = manager.add("sock-1".to_string()).await;
    let _rx2 = manager.add("sock-2".to_string()).await;
    assert_eq!(manager.connection_count().await, 2);

    manager.remove("sock-1").await;
    assert_eq!(manager.connection_count().await, 1);

    manager.remove("nonexistent").await;
    assert_eq!(manager.connection_count().await, 1);
}

#[tokio::test]
async fn subscribe_requires_a_known_socket() {
    let manager = WsManager::new();
    let _rx = manager.add("sock-1".to_string()).await;

    assert!(manager.subscribe("sock-1", ADMIN_CHANNEL).await);
    assert!(!manager.subscribe("ghost", ADMIN_CHANNEL).await);
    assert_eq!(manager.subscriber_count(ADMIN_CHANNEL).await, 1);
}

#[tokio::test]
async fn channel_broadcast_reaches_only_subscribers() {
    let manager = WsManager::new();

    let mut subscribed = manager.add("sock-1".to_string()).await;
    let mut idle = manager.add("sock-2".to_string()).await;
    manager.subscribe("sock-1", ADMIN_CHANNEL).await;

    let delivered = manager
        .broadcast_to_channel(ADMIN_CHANNEL, Message::Text("new-submission".into()))
        .await;
    assert_eq!(delivered, 1);

    let msg = subscribed.recv().await.expect("subscriber should receive");
    assert!(matches!(&msg, Message::Text(t) if *t == "new-submission"));
    assert!(idle.try_recv().is_err(), "unsubscribed socket must not receive");
}

#[tokio::test]
async fn channel_broadcast_skips_closed_receivers() {
    let manager = WsManager::new();

    let dropped = manager.add("sock-1".to_string()).await;
    let mut alive = manager.add("sock-2".to_string()).await;
    manager.subscribe("sock-1", ADMIN_CHANNEL).await;
    manager.subscribe("sock-2", ADMIN_CHANNEL).await;
    drop(dropped);

    let delivered = manager
        .broadcast_to_channel(ADMIN_CHANNEL, Message::Text("still alive".into()))
        .await;

    assert_eq!(delivered, 1);
    let msg = alive.recv().await.expect("live socket should receive");
    assert!(matches!(&msg, Message::Text(t) if *t == "still alive"));
}

#[tokio::test]
async fn send_to_targets_one_socket() {
    let manager = WsManager::new();

    let mut rx1 = manager.add("sock-1".to_string()).await;
    let mut rx2 = manager.add("sock-2".to_string()).await;

    assert!(manager.send_to("sock-2", Message::Text("hi".into())).await);
    assert!(!manager.send_to("ghost", Message::Text("hi".into())).await);

    assert!(rx1.try_recv().is_err());
    let msg = rx2.recv().await.expect("target should receive");
    assert!(matches!(&msg, Message::Text(t) if *t == "hi"));
}

#[tokio::test]
async fn shutdown_all_sends_close_and_clears() {
    let manager = WsManager::new();

    let mut rx1 = manager.add("sock-1".to_string()).await;
    let mut rx2 = manager.add("sock-2".to_string()).await;
    manager.subscribe("sock-1", ADMIN_CHANNEL).await;

    manager.shutdown_all().await;

    assert_eq!(manager.connection_count().await, 0);
    assert_eq!(manager.subscriber_count(ADMIN_CHANNEL).await, 0);

    let msg1 = rx1.recv().await.expect("rx1 should receive Close");
    assert!(matches!(msg1, Message::Close(None)), "Expected Close(None), got: {msg1:?}");
    let msg2 = rx2.recv().await.expect("rx2 should receive Close");
    assert!(matches!(msg2, Message::Close(None)), "Expected Close(None), got: {msg2:?}");

    assert!(rx1.recv().await.is_none(), "Channel should be closed after shutdown");
}

#[tokio::test]
async fn ping_all_prunes_dead_sockets() {
    let manager = WsManager::new();

    let dropped = manager.add("sock-1".to_string()).await;
    let mut alive = manager.add("sock-2".to_string()).await;
    manager.subscribe("sock-1", ADMIN_CHANNEL).await;
    manager.subscribe("sock-2", ADMIN_CHANNEL).await;
    drop(dropped);

    assert_eq!(manager.ping_all().await, 1);
    assert_eq!(manager.connection_count().await, 1);
    assert_eq!(manager.subscriber_count(ADMIN_CHANNEL).await, 1);
    assert!(matches!(alive.recv().await, Some(Message::Ping(_))));
}
