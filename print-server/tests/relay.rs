mod common;

use std::time::Duration;

use serde_json::json;
use shared::ErrorCode;
use shared::message::{
    BusMessage, FrameKind, MAX_FRAME_LEN, OrderItemsPrintNotification, SubscribeAck,
    SubscribeRequest,
};
use uuid::Uuid;

use print_server::message::{
    Frame, MessageBus, PublishError, RelayServer, TcpTransport, Transport,
};

async fn start_relay(bus: &MessageBus, handshake_timeout: Duration) -> String {
    let relay = RelayServer::bind(bus.clone(), "127.0.0.1:0", handshake_timeout)
        .await
        .unwrap();
    let addr = relay.local_addr().unwrap().to_string();
    tokio::spawn(relay.run());
    addr
}

async fn subscribe(addr: &str, channel: &str) -> (TcpTransport, SubscribeAck) {
    let client = TcpTransport::connect(addr).await.unwrap();
    let request_id = Uuid::new_v4();
    let request = SubscribeRequest::new(channel).with_client_name("kitchen-relay-1");
    client
        .write_frame(&Frame::encode(FrameKind::Subscribe, request_id, &request).unwrap())
        .await
        .unwrap();

    let frame = client.read_frame().await.unwrap();
    assert_eq!(frame.kind, FrameKind::SubscribeAck);
    assert_eq!(frame.request_id, request_id);
    let ack: SubscribeAck = frame.decode().unwrap();
    (client, ack)
}

async fn wait_for_clients(bus: &MessageBus, n: usize) {
    for _ in 0..100 {
        if bus.get_connected_clients().len() == n {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("expected {n} relay clients");
}

#[tokio::test]
async fn relay_forwards_only_subscribed_channel() {
    let bus = MessageBus::new();
    let addr = start_relay(&bus, Duration::from_secs(2)).await;

    let (client, ack) = subscribe(&addr, "print-orders-abc-uuid").await;
    assert_eq!(ack.channel, "print-orders-abc-uuid");
    wait_for_clients(&bus, 1).await;

    bus.publish(BusMessage::new("print-orders-other", "print.order", json!({"skip": true})))
        .unwrap();
    bus.publish(BusMessage::new("print-orders-abc-uuid", "print.order", json!({"keep": true})))
        .unwrap();

    let msg = tokio::time::timeout(Duration::from_secs(2), client.read_message())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(msg.channel, "print-orders-abc-uuid");
    assert_eq!(msg.payload["keep"], true);

    let clients = bus.get_connected_clients();
    assert_eq!(clients[0].id, ack.subscriber_id);
    assert_eq!(clients[0].client_name.as_deref(), Some("kitchen-relay-1"));
}

#[tokio::test]
async fn relay_delivers_dispatched_items_payload() {
    let state = common::seeded_state().await;
    let addr = start_relay(state.message_bus(), Duration::from_secs(2)).await;
    let (client, _) = subscribe(&addr, "print-orders-abc-uuid").await;

    let report = state
        .dispatcher()
        .print_order_items(Some(1042), &[5001, 5002], 3)
        .await
        .unwrap();
    assert!(report.delivered);

    let msg = tokio::time::timeout(Duration::from_secs(2), client.read_message())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(msg.event, "print.order.items");
    let notification: OrderItemsPrintNotification = msg.parse_payload().unwrap();
    assert_eq!(notification.order_number(), Some(1042));
    assert_eq!(notification.order_items().len(), 2);
    assert_eq!(notification.printer().store.uuid, "abc-uuid");
}

#[tokio::test]
async fn disconnect_removes_subscriber() {
    let bus = MessageBus::new();
    let addr = start_relay(&bus, Duration::from_secs(2)).await;

    let (client, _) = subscribe(&addr, "print-orders-x").await;
    wait_for_clients(&bus, 1).await;

    client.close().await.unwrap();
    drop(client);
    wait_for_clients(&bus, 0).await;
}

#[tokio::test]
async fn silent_client_is_dropped_after_handshake_timeout() {
    let bus = MessageBus::new();
    let addr = start_relay(&bus, Duration::from_millis(50)).await;

    let client = TcpTransport::connect(&addr).await.unwrap();
    let result = tokio::time::timeout(Duration::from_secs(2), client.read_frame())
        .await
        .unwrap();
    assert!(result.is_err());
    assert!(bus.get_connected_clients().is_empty());
}

#[tokio::test]
async fn message_before_subscribe_is_rejected() {
    let bus = MessageBus::new();
    let addr = start_relay(&bus, Duration::from_secs(2)).await;

    let client = TcpTransport::connect(&addr).await.unwrap();
    client
        .write_message(&BusMessage::new("print-orders-x", "print.order", json!({})))
        .await
        .unwrap();

    let result = tokio::time::timeout(Duration::from_secs(2), client.read_frame())
        .await
        .unwrap();
    assert!(result.is_err());
}

#[tokio::test]
async fn shutdown_closes_subscribers() {
    let bus = MessageBus::new();
    let addr = start_relay(&bus, Duration::from_secs(2)).await;
    let (client, _) = subscribe(&addr, "print-orders-x").await;
    wait_for_clients(&bus, 1).await;

    bus.shutdown();

    let result = tokio::time::timeout(Duration::from_secs(2), client.read_frame())
        .await
        .unwrap();
    assert!(result.is_err());
    wait_for_clients(&bus, 0).await;
}

#[tokio::test]
async fn oversize_message_leaves_subscriber_connected() {
    let bus = MessageBus::new();
    let addr = start_relay(&bus, Duration::from_secs(2)).await;
    let (client, _) = subscribe(&addr, "print-orders-abc-uuid").await;
    wait_for_clients(&bus, 1).await;

    let big = "x".repeat(MAX_FRAME_LEN + 10);
    let result = bus.publish(BusMessage::new(
        "print-orders-abc-uuid",
        "print.order",
        json!({ "note": big }),
    ));
    assert!(matches!(result, Err(PublishError::TooLarge { .. })));

    bus.publish(BusMessage::new("print-orders-abc-uuid", "print.order", json!({"n": 2})))
        .unwrap();

    let msg = tokio::time::timeout(Duration::from_secs(2), client.read_message())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(msg.payload["n"], 2);
    assert_eq!(bus.get_connected_clients().len(), 1);
}

async fn rejected_handshake(request: SubscribeRequest) {
    let bus = MessageBus::new();
    let addr = start_relay(&bus, Duration::from_secs(2)).await;

    let client = TcpTransport::connect(&addr).await.unwrap();
    client
        .write_frame(&Frame::encode(FrameKind::Subscribe, Uuid::new_v4(), &request).unwrap())
        .await
        .unwrap();

    let result = tokio::time::timeout(Duration::from_secs(2), client.read_frame())
        .await
        .unwrap();
    assert_eq!(result.unwrap_err().code, ErrorCode::ClientDisconnected);
    assert!(bus.get_connected_clients().is_empty());
}

#[tokio::test]
async fn protocol_version_mismatch_closes_connection() {
    let mut request = SubscribeRequest::new("print-orders-x");
    request.protocol_version = 99;
    rejected_handshake(request).await;
}

#[tokio::test]
async fn empty_channel_closes_connection() {
    rejected_handshake(SubscribeRequest::new("")).await;
}
