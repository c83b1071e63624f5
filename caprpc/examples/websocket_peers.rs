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


//! WebSocket Peers Example
//!
//! Runs a listener and a client in one process. Each side exposes
//! capabilities and calls the other's over the same socket.
//!
//! # Running
//!
//! ```bash
//! RUST_LOG=caprpc=debug cargo run --example websocket_peers
//! ```

use caprpc::CapRpcError;
use caprpc::capability::{CapabilityDescriptor, CapabilityError, FnCapability, Registry};
use caprpc::peer::PeerConfig;
use caprpc::transport::websocket::{ConnectConfig, WebSocketConfig, WebSocketListener, connect};
use futures_util::{StreamExt, stream};
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

async fn greet(input: Value) -> Result<Value, CapabilityError> {
    let name = input
        .get("name")
        .and_then(Value::as_str)
        .ok_or_else(|| CapabilityError::new("missing name"))?;
    Ok(json!(format!("hello, {name}")))
}

fn server_registry() -> Result<Registry, CapRpcError> {
    Ok(Registry::builder()
        .with_capability(
            CapabilityDescriptor::new("greet")
                .with_description("Greets the caller by name")
                .with_input(json!({"name": "string"}))
                .with_output(json!("string")),
            FnCapability::new(greet),
        )
        .with_stream("countdown", |input: Value| {
            let from = input.as_u64().unwrap_or(3);
            stream::iter((0..=from).rev())
                .then(|n| async move {
                    tokio::time::sleep(Duration::from_millis(200)).await;
                    Ok::<_, CapabilityError>(json!(n))
                })
                .boxed()
        })
        .build()?)
}

fn client_registry() -> Result<Registry, CapRpcError> {
    Ok(Registry::builder()
        .with_function("whoami", |_input: Value| async move {
            Ok::<_, CapabilityError>(json!({"agent": "websocket_peers example"}))
        })
        .build()?)
}

#[tokio::main]
async fn main() -> Result<(), CapRpcError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("=== WebSocket Peers Example ===\n");

    let listener = WebSocketListener::bind("127.0.0.1:0", WebSocketConfig::default()).await?;
    let url = format!("ws://{}/rpc", listener.local_addr()?);
    let registry = Arc::new(server_registry()?);

    let server = tokio::spawn(async move {
        let accepted = listener.accept(registry, PeerConfig::new().with_name("server")).await?;
        println!("server: accepted {} with credential {:?}", accepted.peer_addr(), accepted.credential());

        // The server calls back into the client over the same socket.
        let who = accepted.remote().call("whoami", Value::Null).await?;
        println!("server: client says {:?}", who.into_value());

        accepted.remote().closed().await;
        println!("server: connection closed");
        Ok::<_, CapRpcError>(())
    });

    let config = ConnectConfig::default()
        .with_peer(PeerConfig::new().with_name("client"))
        .with_on_error(|err| eprintln!("client: connection failed: {err}"));
    let client = connect(&url, Some("demo-token"), Arc::new(client_registry()?), config).await?;

    let greeting = client.call("greet", json!({"name": "world"})).await?;
    println!("client: greet -> {:?}", greeting.into_value());

    match client.call("greet", json!({})).await {
        Ok(output) => println!("client: unexpected {:?}", output.into_value()),
        Err(err) => println!("client: greet failed as expected: {err}"),
    }

    if let Some(mut values) = client.call("countdown", json!(3)).await?.into_stream() {
        while let Some(value) = values.next().await {
            println!("client: countdown {}", value?);
        }
    }

    client.close();
    if let Ok(outcome) = server.await {
        outcome?;
    }

    println!("\n=== Example Complete ===");
    Ok(())
}
