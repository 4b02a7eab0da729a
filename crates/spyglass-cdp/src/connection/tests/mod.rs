use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::Message;

use crate::connection::{CdpConnection, CdpConnectionOptions};
use crate::error::CdpError;

/// Spawn a scripted WebSocket server and return its ws:// URL.
///
/// The handler receives every parsed inbound command and a sender for
/// outbound frames, and runs until the client disconnects.
async fn scripted_server<F>(handler: F) -> String
where
    F: Fn(Value, tokio::sync::mpsc::UnboundedSender<String>) + Send + Sync + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let ws = accept_async(stream).await.unwrap();
        let (mut write, mut read) = ws.split();
        let (out_tx, mut out_rx) = tokio::sync::mpsc::unbounded_channel::<String>();

        let writer = tokio::spawn(async move {
            while let Some(frame) = out_rx.recv().await {
                if write.send(Message::Text(frame.into())).await.is_err() {
                    break;
                }
            }
        });

        while let Some(Ok(msg)) = read.next().await {
            if let Message::Text(text) = msg {
                let value: Value = serde_json::from_str(&text).unwrap();
                handler(value, out_tx.clone());
            }
        }
        writer.abort();
    });

    format!("ws://{addr}")
}

#[tokio::test]
async fn test_send_command_resolves_result() {
    let url = scripted_server(|req, out| {
        let id = req["id"].as_u64().unwrap();
        out.send(json!({"id": id, "result": {"frameId": "F1"}}).to_string())
            .unwrap();
    })
    .await;

    let conn = CdpConnection::connect(&url).await.unwrap();
    let result: Value = conn
        .send_command("Page.navigate", Some(json!({"url": "about:blank"})))
        .await
        .unwrap();
    assert_eq!(result["frameId"], "F1");
}

#[tokio::test]
async fn test_out_of_order_responses_route_by_id() {
    // Answer the first command only after the second arrived, in reverse order.
    let url = scripted_server(move |req, out| {
        let id = req["id"].as_u64().unwrap();
        let method = req["method"].as_str().unwrap().to_string();
        if method == "Second.call" {
            // Reply to the second command first, then to the first.
            out.send(json!({"id": id, "result": {"which": "second"}}).to_string())
                .unwrap();
            out.send(json!({"id": id - 1, "result": {"which": "first"}}).to_string())
                .unwrap();
        }
    })
    .await;

    let conn = CdpConnection::connect(&url).await.unwrap();
    let (first, second) = tokio::join!(
        conn.send_command::<Value, Value>("First.call", None),
        conn.send_command::<Value, Value>("Second.call", None),
    );
    assert_eq!(first.unwrap()["which"], "first");
    assert_eq!(second.unwrap()["which"], "second");
}

#[tokio::test]
async fn test_protocol_error_maps_to_cdp_error() {
    let url = scripted_server(|req, out| {
        let id = req["id"].as_u64().unwrap();
        out.send(
            json!({"id": id, "error": {"code": -32601, "message": "Method not found"}})
                .to_string(),
        )
        .unwrap();
    })
    .await;

    let conn = CdpConnection::connect(&url).await.unwrap();
    let err = conn
        .send_command::<Value, Value>("Nope.nothing", None)
        .await
        .unwrap_err();
    match err {
        CdpError::Protocol { code, message } => {
            assert_eq!(code, -32601);
            assert_eq!(message, "Method not found");
        }
        other => panic!("expected protocol error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_timeout_when_no_response() {
    let url = scripted_server(|_req, _out| {}).await;

    let conn = CdpConnection::connect(&url).await.unwrap();
    let err = conn
        .send_command_with_timeout::<Value, Value>(
            "Slow.call",
            None,
            Duration::from_millis(50),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, CdpError::Timeout(_)));
}

#[tokio::test]
async fn test_unknown_response_id_is_ignored() {
    let url = scripted_server(|req, out| {
        let id = req["id"].as_u64().unwrap();
        // A stray response first, then the real one.
        out.send(json!({"id": 9999, "result": {}}).to_string()).unwrap();
        out.send(json!({"id": id, "result": {"ok": true}}).to_string())
            .unwrap();
    })
    .await;

    let conn = CdpConnection::connect(&url).await.unwrap();
    let result: Value = conn.send_command("Any.call", None::<Value>).await.unwrap();
    assert_eq!(result["ok"], true);
}

#[tokio::test]
async fn test_events_fan_out_to_subscribers() {
    let url = scripted_server(|req, out| {
        let id = req["id"].as_u64().unwrap();
        out.send(
            json!({"method": "Page.loadEventFired", "params": {"timestamp": 1.0}}).to_string(),
        )
        .unwrap();
        out.send(json!({"id": id, "result": {}}).to_string()).unwrap();
    })
    .await;

    let conn = CdpConnection::connect(&url).await.unwrap();
    let mut events = conn.subscribe_events();
    let _: Value = conn.send_command("Page.enable", None::<Value>).await.unwrap();

    let event = tokio::time::timeout(Duration::from_secs(1), events.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(event.method, "Page.loadEventFired");
}

#[tokio::test]
async fn test_connection_loss_fails_pending_and_subsequent_sends() {
    // The server drops the socket as soon as the first command arrives.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let ws = accept_async(stream).await.unwrap();
        let (_write, mut read) = ws.split();
        let _ = read.next().await;
        // Dropping both halves closes the connection.
    });

    let conn = CdpConnection::connect(&format!("ws://{addr}")).await.unwrap();
    let err = conn
        .send_command::<Value, Value>("Doomed.call", None)
        .await
        .unwrap_err();
    assert!(matches!(err, CdpError::ConnectionLost | CdpError::Timeout(_)));

    // The pump has marked the connection closed; later sends fail fast.
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(conn.is_closed());
    let err = conn.send_command::<Value, Value>("After.close", None).await.unwrap_err();
    assert!(matches!(err, CdpError::ConnectionLost));
}

#[tokio::test]
async fn test_close_is_idempotent() {
    let url = scripted_server(|_req, _out| {}).await;
    let conn = CdpConnection::connect(&url).await.unwrap();
    conn.close().await;
    conn.close().await;
    assert!(conn.is_closed());

    let err = conn.send_command::<Value, Value>("Any.call", None).await.unwrap_err();
    assert!(matches!(err, CdpError::ConnectionLost));
}

#[tokio::test]
async fn test_default_options() {
    let options = CdpConnectionOptions::new().command_timeout(Duration::from_secs(2));
    assert_eq!(options.command_timeout, Duration::from_secs(2));
}
