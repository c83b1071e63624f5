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


//! Integration tests for the stateless HTTP + SSE variant.

#![cfg(feature = "http")]

use caprpc::capability::{CapabilityDescriptor, CapabilityError, Registry};
use caprpc::http::{self, HttpClient};
use caprpc::peer::PeerError;
use caprpc::transport::TransportError;
use futures_util::{StreamExt, stream};
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::time::timeout;

async fn fail(_input: Value) -> Result<Value, CapabilityError> {
    Err(CapabilityError::new("boom"))
}

fn registry() -> Arc<Registry> {
    Arc::new(
        Registry::builder()
            .with_capability(
                CapabilityDescriptor::new("echo")
                    .with_description("Returns its input")
                    .with_input(json!({"type": "any"}))
                    .with_output(json!({"type": "any"})),
                caprpc::capability::FnCapability::new(|input: Value| async move {
                    Ok::<_, CapabilityError>(input)
                }),
            )
            .with_function("fail", fail)
            .with_stream("count", |input: Value| {
                let n = input.as_u64().unwrap_or(0);
                stream::iter((1..=n).map(|i| Ok::<_, CapabilityError>(json!(i))))
            })
            .with_stream("breaks", |_input: Value| {
                stream::iter(vec![
                    Ok(json!("ok")),
                    Err(CapabilityError::new("mid-stream")),
                ])
            })
            .build()
            .expect("registry"),
    )
}

async fn serve() -> HttpClient {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, http::router(registry())).await });
    HttpClient::new(format!("http://{}/", addr)).with_credential("token-123")
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_http_directory() {
    let client = serve().await;

    let directory = client.directory().await.unwrap();
    let names: Vec<&str> = directory.iter().map(|entry| entry.name.as_str()).collect();
    assert_eq!(names, vec!["breaks", "count", "echo", "fail"]);

    let echo = directory.iter().find(|entry| entry.name == "echo").unwrap();
    assert_eq!(echo.description, "Returns its input");
    assert_eq!(echo.input, json!({"type": "any"}));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_http_value_call() {
    let client = serve().await;

    let output = client.call("echo", json!({"a": [1, 2]})).await.unwrap();
    assert_eq!(output.into_value(), Some(json!({"a": [1, 2]})));

    let output = client.call("echo", Value::Null).await.unwrap();
    assert_eq!(output.into_value(), Some(Value::Null));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_http_errors() {
    let client = serve().await;

    let err = client.call("hasOwnProperty", Value::Null).await.unwrap_err();
    assert!(matches!(&err, PeerError::Remote(message) if message == "unknown capability"));

    let err = client.call("fail", Value::Null).await.unwrap_err();
    assert_eq!(err.to_string(), "boom");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_http_stream() {
    let client = serve().await;

    let output = client.call("count", json!(3)).await.unwrap();
    let values: Vec<Value> = timeout(
        Duration::from_secs(5),
        output
            .into_stream()
            .unwrap()
            .map(|value| value.unwrap())
            .collect(),
    )
    .await
    .unwrap();
    assert_eq!(values, vec![json!(1), json!(2), json!(3)]);

    let output = client.call("count", json!(0)).await.unwrap();
    assert_eq!(output.into_value(), Some(Value::Null));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_http_stream_failure() {
    let client = serve().await;

    let mut values = client
        .call("breaks", Value::Null)
        .await
        .unwrap()
        .into_stream()
        .unwrap();
    assert_eq!(values.next().await.unwrap().unwrap(), json!("ok"));
    let err = values.next().await.unwrap().unwrap_err();
    assert!(err.is_remote());
    assert_eq!(err.to_string(), "mid-stream");
    assert!(values.next().await.is_none());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_http_unreachable_server() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = HttpClient::new(format!("http://{}", addr))
        .call("echo", Value::Null)
        .await
        .unwrap_err();
    assert!(matches!(err, PeerError::Transport(TransportError::Http(_))));
}
