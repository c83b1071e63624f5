//
// Copyright 2026 Hans W. Uhlig. All Rights Reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//


//! Integration tests for the WebSocket transport.
//!
//! These tests verify:
//! - Calls and streams in both directions over a real socket
//! - Credential passing on the upgrade request
//! - Teardown when either side goes away
//! - Handshake and post-open failures

#![cfg(feature = "websocket")]

use caprpc::capability::{CapabilityError, Registry};
use caprpc::peer::{PeerConfig, PeerError};
use caprpc::transport::TransportError;
use caprpc::transport::websocket::{
    AcceptedConnection, ConnectConfig, RemotePeer, WebSocketConfig, WebSocketListener, connect,
};
use futures_util::{Stream, StreamExt, stream};
use serde_json::{Value, json};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::time::timeout;

const BLOB_CHUNK: usize = 256 * 1024;

async fn hang(_input: Value) -> Result<Value, CapabilityError> {
    futures_util::future::pending().await
}

fn blob(input: Value) -> impl Stream<Item = Result<Value, CapabilityError>> {
    let count = input.as_u64().unwrap_or(0);
    let chunk = Value::String("x".repeat(BLOB_CHUNK));
    stream::iter((0..count).map(move |_| Ok(chunk.clone())))
}

/// Calls the remote `blob` stream and counts the chunks received.
async fn drain_blob(remote: RemotePeer, count: u64) -> usize {
    remote
        .call("blob", json!(count))
        .await
        .unwrap()
        .into_stream()
        .unwrap()
        .map(|chunk| {
            assert_eq!(chunk.unwrap().as_str().map(str::len), Some(BLOB_CHUNK));
        })
        .count()
        .await
}

fn server_registry() -> Arc<Registry> {
    Arc::new(
        Registry::builder()
            .with_function("echo", |input: Value| async move {
                Ok::<_, CapabilityError>(input)
            })
            .with_stream("count", |input: Value| {
                let n = input.as_u64().unwrap_or(0);
                stream::iter((1..=n).map(|i| Ok::<_, CapabilityError>(json!(i))))
            })
            .with_stream("blob", blob)
            .build()
            .expect("server registry"),
    )
}

fn client_registry() -> Arc<Registry> {
    Arc::new(
        Registry::builder()
            .with_function("whoami", |_input: Value| async move {
                Ok::<_, CapabilityError>(json!("client"))
            })
            .with_function("hang", hang)
            .with_stream("blob", blob)
            .build()
            .expect("client registry"),
    )
}

/// Starts a listener and forwards every accepted connection to the test.
async fn start_server() -> (String, mpsc::UnboundedReceiver<AcceptedConnection>) {
    let listener = WebSocketListener::bind("127.0.0.1:0", WebSocketConfig::default())
        .await
        .expect("Failed to bind WebSocket listener");
    let addr = listener.local_addr().expect("Failed to get listener address");

    let (tx, rx) = mpsc::unbounded_channel();
    tokio::spawn(async move {
        while let Ok(accepted) = listener.accept(server_registry(), PeerConfig::default()).await {
            if tx.send(accepted).is_err() {
                break;
            }
        }
    });

    (format!("ws://{}/rpc", addr), rx)
}

async fn connect_client(url: &str, credential: Option<&str>) -> RemotePeer {
    timeout(
        Duration::from_secs(5),
        connect(url, credential, client_registry(), ConnectConfig::default()),
    )
    .await
    .expect("connect timed out")
    .expect("Failed to connect")
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_websocket_call_and_stream() {
    let (url, mut accepted) = start_server().await;
    let client = connect_client(&url, None).await;
    let _server = accepted.recv().await.unwrap();

    let output = client.call("echo", json!({"n": 1})).await.unwrap();
    assert_eq!(output.into_value(), Some(json!({"n": 1})));

    let values: Vec<Value> = client
        .call("count", json!(3))
        .await
        .unwrap()
        .into_stream()
        .unwrap()
        .map(|value| value.unwrap())
        .collect()
        .await;
    assert_eq!(values, vec![json!(1), json!(2), json!(3)]);

    let err = client.call("constructor", Value::Null).await.unwrap_err();
    assert_eq!(err.to_string(), "unknown capability");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_websocket_streams_both_ways_at_once() {
    let (url, mut accepted) = start_server().await;
    let client = connect_client(&url, None).await;
    let server = accepted.recv().await.unwrap();

    // Far more than the socket buffers hold in either direction.
    let received = timeout(Duration::from_secs(30), async {
        tokio::join!(
            drain_blob(client.clone(), 64),
            drain_blob(server.remote().clone(), 64)
        )
    })
    .await
    .expect("concurrent streams stalled");
    assert_eq!(received, (64, 64));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_websocket_server_calls_client() {
    let (url, mut accepted) = start_server().await;
    let _client = connect_client(&url, None).await;
    let server = accepted.recv().await.unwrap();

    let output = server.remote().call("whoami", Value::Null).await.unwrap();
    assert_eq!(output.into_value(), Some(json!("client")));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_websocket_credential_is_captured() {
    let (url, mut accepted) = start_server().await;
    let _client = connect_client(&url, Some("s3cret value&more")).await;
    let server = accepted.recv().await.unwrap();

    assert_eq!(server.credential(), Some("s3cret value&more"));
    assert!(server.peer_addr().ip().is_loopback());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_websocket_custom_credential_param() {
    let listener = WebSocketListener::bind(
        "127.0.0.1:0",
        WebSocketConfig::default().with_credential_param("key"),
    )
    .await
    .unwrap();
    let url = format!("ws://{}/", listener.local_addr().unwrap());

    let config = ConnectConfig::default()
        .with_websocket(WebSocketConfig::default().with_credential_param("key"));
    let client = tokio::spawn(async move {
        connect(&url, Some("abc"), Arc::new(Registry::empty()), config).await
    });

    let server = listener
        .accept(Arc::new(Registry::empty()), PeerConfig::default())
        .await
        .unwrap();
    let _client = client.await.unwrap().unwrap();
    assert_eq!(server.credential(), Some("abc"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_websocket_close_destroys_remote_calls() {
    let (url, mut accepted) = start_server().await;
    let client = connect_client(&url, None).await;
    let server = accepted.recv().await.unwrap().into_remote();

    let caller = server.clone();
    let call = tokio::spawn(async move { caller.call("hang", Value::Null).await });
    while server.peer().pending_count() == 0 {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    client.close();
    timeout(Duration::from_secs(5), client.closed())
        .await
        .expect("client socket closed");

    let err = timeout(Duration::from_secs(5), call)
        .await
        .expect("server call settled")
        .unwrap()
        .unwrap_err();
    assert!(matches!(&err, PeerError::Destroyed(reason) if reason == "connection closed"));

    timeout(Duration::from_secs(5), server.closed())
        .await
        .expect("server socket closed");
    assert!(server.is_closed());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_websocket_local_close_reason() {
    let (url, mut accepted) = start_server().await;
    let client = connect_client(&url, None).await;
    let server = accepted.recv().await.unwrap();

    let caller = server.remote().clone();
    let call = tokio::spawn(async move { caller.call("hang", Value::Null).await });
    while server.remote().peer().pending_count() == 0 {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    server.remote().close();
    let err = call.await.unwrap().unwrap_err();
    assert_eq!(err.to_string(), "closed");

    timeout(Duration::from_secs(5), client.closed())
        .await
        .expect("client saw the close");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_websocket_handshake_refused() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("ws://{}/rpc", listener.local_addr().unwrap());

    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut request = vec![0u8; 4096];
        let _ = socket.read(&mut request).await;
        socket
            .write_all(b"HTTP/1.1 401 Unauthorized\r\nContent-Length: 0\r\n\r\n")
            .await
            .unwrap();
    });

    let err = connect(
        &url,
        Some("wrong"),
        Arc::new(Registry::empty()),
        ConnectConfig::default(),
    )
    .await
    .unwrap_err();
    assert!(
        matches!(&err, TransportError::WebSocketHandshakeFailed { reason } if reason.contains("401")),
        "unexpected error: {err}"
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_websocket_failure_after_open_reports_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("ws://{}/rpc", listener.local_addr().unwrap());

    // Accept the upgrade, then drop the socket without a closing handshake.
    let (drop_tx, drop_rx) = tokio::sync::oneshot::channel::<()>();
    tokio::spawn(async move {
        let (socket, _) = listener.accept().await.unwrap();
        let websocket = tokio_tungstenite::accept_async(socket).await.unwrap();
        let _ = drop_rx.await;
        drop(websocket);
    });

    let reported = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&reported);
    let config = ConnectConfig::default().with_on_error(move |err: &TransportError| {
        if matches!(err, TransportError::ConnectionLost { .. }) {
            counter.fetch_add(1, Ordering::SeqCst);
        }
    });
    let client = connect(&url, None, Arc::new(Registry::empty()), config)
        .await
        .unwrap();

    let caller = client.clone();
    let call = tokio::spawn(async move { caller.call("anything", Value::Null).await });
    while client.peer().pending_count() == 0 {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    drop_tx.send(()).unwrap();

    let err = timeout(Duration::from_secs(5), call)
        .await
        .expect("call settled")
        .unwrap()
        .unwrap_err();
    assert_eq!(err.to_string(), "connection closed");
    timeout(Duration::from_secs(5), client.closed()).await.unwrap();
    assert_eq!(reported.load(Ordering::SeqCst), 1);
}
