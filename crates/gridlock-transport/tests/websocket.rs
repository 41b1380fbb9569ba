//! Integration tests for the WebSocket transport.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use gridlock_transport::{Connection, Transport, WebSocketTransport};
use tokio_tungstenite::tungstenite::Message;

type ClientWs = tokio_tungstenite::WebSocketStream<
    tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
>;

async fn bind() -> (WebSocketTransport, String) {
    let transport = WebSocketTransport::bind("127.0.0.1:0")
        .await
        .expect("bind");
    let addr = transport.local_addr().expect("local addr").to_string();
    (transport, addr)
}

async fn connect(addr: &str) -> ClientWs {
    let (ws, _) = tokio_tungstenite::connect_async(format!("ws://{addr}"))
        .await
        .expect("connect");
    ws
}

#[tokio::test]
async fn test_accept_assigns_distinct_ids() {
    let (mut transport, addr) = bind().await;

    let _c1 = connect(&addr).await;
    let conn1 = transport.accept().await.expect("accept 1");
    let _c2 = connect(&addr).await;
    let conn2 = transport.accept().await.expect("accept 2");

    assert_ne!(conn1.id(), conn2.id());
}

#[tokio::test]
async fn test_binary_and_text_frames_both_arrive_as_bytes() {
    let (mut transport, addr) = bind().await;
    let mut client = connect(&addr).await;
    let conn = transport.accept().await.expect("accept");

    client
        .send(Message::Binary(b"raw".to_vec().into()))
        .await
        .expect("send binary");
    assert_eq!(conn.recv().await.expect("recv"), Some(b"raw".to_vec()));

    client
        .send(Message::Text("hello".into()))
        .await
        .expect("send text");
    assert_eq!(conn.recv().await.expect("recv"), Some(b"hello".to_vec()));
}

#[tokio::test]
async fn test_send_reaches_the_client() {
    let (mut transport, addr) = bind().await;
    let mut client = connect(&addr).await;
    let conn = transport.accept().await.expect("accept");

    conn.send(b"state").await.expect("send");
    let msg = client.next().await.expect("frame").expect("ok");
    assert_eq!(msg.into_data().as_ref(), b"state");
}

#[tokio::test]
async fn test_send_does_not_wait_behind_a_parked_recv() {
    let (mut transport, addr) = bind().await;
    let mut client = connect(&addr).await;
    let conn = std::sync::Arc::new(transport.accept().await.expect("accept"));

    // Park a read on an idle peer, then write while it waits.
    let reader = std::sync::Arc::clone(&conn);
    let parked = tokio::spawn(async move { reader.recv().await });
    tokio::time::sleep(Duration::from_millis(20)).await;

    tokio::time::timeout(Duration::from_secs(1), conn.send(b"ping"))
        .await
        .expect("send must not block on the parked read")
        .expect("send");

    let msg = client.next().await.expect("frame").expect("ok");
    assert_eq!(msg.into_data().as_ref(), b"ping");

    client
        .send(Message::Binary(b"pong".to_vec().into()))
        .await
        .expect("send");
    let received = parked.await.expect("join").expect("recv");
    assert_eq!(received, Some(b"pong".to_vec()));
}

#[tokio::test]
async fn test_client_close_yields_none() {
    let (mut transport, addr) = bind().await;
    let mut client = connect(&addr).await;
    let conn = transport.accept().await.expect("accept");

    client.close(None).await.expect("close");
    assert_eq!(conn.recv().await.expect("recv"), None);
}
