//! Integration tests for the network listener and client

use smish_guard::config::{Config, ListenerConfig};
use smish_guard::error::GuardError;
use smish_guard::listener::{Envelope, MessageClient, MessageListener};
use smish_guard::message::{Message, Source};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::timeout;

fn test_config(listen_addr: &str) -> ListenerConfig {
    ListenerConfig {
        listen_addr: listen_addr.to_string(),
        read_timeout_secs: 2,
        ..Config::default().listener
    }
}

async fn recv(rx: &mut mpsc::Receiver<Message>) -> Message {
    timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("timed out waiting for message")
        .expect("channel closed")
}

#[tokio::test]
async fn test_receive_message() {
    let (tx, mut rx) = mpsc::channel(8);
    let mut listener = MessageListener::new(test_config("127.0.0.1:0"), tx);

    let addr = listener.start().await.unwrap();
    assert!(listener.is_listening());

    MessageClient::new(addr.to_string())
        .send(Some("+15550100"), "Your parcel is held, pay at http://bit.ly/x")
        .await
        .unwrap();

    let message = recv(&mut rx).await;
    assert_eq!(message.source(), Source::Network);
    assert_eq!(message.sender(), Some("+15550100"));
    assert_eq!(message.text(), "Your parcel is held, pay at http://bit.ly/x");

    listener.stop().await;
}

#[tokio::test]
async fn test_missing_sender_defaults_to_network() {
    let (tx, mut rx) = mpsc::channel(8);
    let mut listener = MessageListener::new(test_config("127.0.0.1:0"), tx);
    let addr = listener.start().await.unwrap();

    MessageClient::new(addr.to_string())
        .send(None, "hello")
        .await
        .unwrap();

    let message = recv(&mut rx).await;
    assert_eq!(message.sender(), None);
    assert_eq!(message.origin(), "Network");

    listener.stop().await;
}

#[tokio::test]
async fn test_double_start_is_noop() {
    let (tx, _rx) = mpsc::channel(8);
    let mut listener = MessageListener::new(test_config("127.0.0.1:0"), tx);

    let first = listener.start().await.unwrap();
    let second = listener.start().await.unwrap();
    assert_eq!(first, second);

    listener.stop().await;
}

#[tokio::test]
async fn test_double_stop() {
    let (tx, _rx) = mpsc::channel(8);
    let mut listener = MessageListener::new(test_config("127.0.0.1:0"), tx);

    listener.stop().await;
    listener.start().await.unwrap();
    listener.stop().await;
    listener.stop().await;

    assert!(!listener.is_listening());
    assert!(listener.local_addr().is_none());
}

#[tokio::test]
async fn test_malformed_payload_dropped() {
    let (tx, mut rx) = mpsc::channel(8);
    let mut listener = MessageListener::new(test_config("127.0.0.1:0"), tx);
    let addr = listener.start().await.unwrap();
    let client = MessageClient::new(addr.to_string());

    // oversized length prefix
    client.send_raw(b"garbage").await.unwrap();

    // valid frame, invalid JSON
    let mut frame = 8u32.to_be_bytes().to_vec();
    frame.extend_from_slice(b"not json");
    client.send_raw(&frame).await.unwrap();

    // valid JSON, empty message
    let empty = Envelope::new(None, "").encode_frame().unwrap();
    client.send_raw(&empty).await.unwrap();

    client.send(Some("bob"), "still listening").await.unwrap();

    let message = recv(&mut rx).await;
    assert_eq!(message.text(), "still listening");
    assert!(rx.try_recv().is_err());

    listener.stop().await;
}

#[tokio::test]
async fn test_bind_error_when_port_taken() {
    let held = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = held.local_addr().unwrap();

    let (tx, _rx) = mpsc::channel(8);
    let mut listener = MessageListener::new(test_config(&addr.to_string()), tx);

    let result = listener.start().await;
    assert!(matches!(result, Err(GuardError::Bind { .. })));
    assert!(!listener.is_listening());
}

#[tokio::test]
async fn test_rebind_after_stop() {
    let (tx, mut rx) = mpsc::channel(8);
    let mut first = MessageListener::new(test_config("127.0.0.1:0"), tx.clone());
    let addr = first.start().await.unwrap();
    first.stop().await;

    let mut second = MessageListener::new(test_config(&addr.to_string()), tx);
    assert_eq!(second.start().await.unwrap(), addr);

    MessageClient::new(addr.to_string())
        .send(None, "after restart")
        .await
        .unwrap();
    assert_eq!(recv(&mut rx).await.text(), "after restart");

    second.stop().await;
}

#[tokio::test]
async fn test_concurrent_clients() {
    let (tx, mut rx) = mpsc::channel(8);
    let mut listener = MessageListener::new(test_config("127.0.0.1:0"), tx);
    let addr = listener.start().await.unwrap().to_string();

    let a = tokio::spawn({
        let addr = addr.clone();
        async move { MessageClient::new(addr).send(Some("a"), "first").await }
    });
    let b = tokio::spawn({
        let addr = addr.clone();
        async move { MessageClient::new(addr).send(Some("b"), "second").await }
    });
    a.await.unwrap().unwrap();
    b.await.unwrap().unwrap();

    let mut texts = vec![
        recv(&mut rx).await.text().to_string(),
        recv(&mut rx).await.text().to_string(),
    ];
    texts.sort();
    assert_eq!(texts, vec!["first", "second"]);

    listener.stop().await;
}

#[tokio::test]
async fn test_send_without_listener_fails() {
    let held = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = held.local_addr().unwrap();
    drop(held);

    let result = MessageClient::new(addr.to_string()).send(None, "hello").await;
    assert!(matches!(result, Err(GuardError::Send { .. })));
}
