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


//! HTTP Stream Example
//!
//! Serves a registry over the stateless HTTP variant and calls it with the
//! bundled client, including a streamed answer delivered as server-sent
//! events.
//!
//! # Running
//!
//! ```bash
//! cargo run --example http_stream
//! ```
//!
//! While it runs, the server can also be called with curl:
//!
//! ```bash
//! curl -N -X POST -d 5 http://127.0.0.1:<port>/ticks
//! ```

use caprpc::capability::{CapabilityError, Registry};
use caprpc::http::{self, HttpClient};
use futures_util::{StreamExt, stream};
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

async fn add(input: Value) -> Result<Value, CapabilityError> {
    let terms: Vec<i64> = serde_json::from_value(input)?;
    Ok(json!(terms.iter().sum::<i64>()))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("=== HTTP Stream Example ===\n");

    let registry = Registry::builder()
        .with_function("add", add)
        .with_stream("ticks", |input: Value| {
            let count = input.as_u64().unwrap_or(3);
            stream::iter(1..=count)
                .then(|tick| async move {
                    tokio::time::sleep(Duration::from_millis(250)).await;
                    Ok::<_, CapabilityError>(json!({ "tick": tick }))
                })
                .boxed()
        })
        .build()?;

    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    println!("Serving on http://{}", addr);
    tokio::spawn(async move { axum::serve(listener, http::router(Arc::new(registry))).await });

    let client = HttpClient::new(format!("http://{}", addr));

    for entry in client.directory().await? {
        println!("capability: {}", entry.name);
    }

    let sum = client.call("add", json!([1, 2, 3, 4])).await?;
    println!("add -> {:?}", sum.into_value());

    match client.call("add", json!("not a list")).await {
        Ok(output) => println!("add -> unexpected {:?}", output.into_value()),
        Err(err) => println!("add failed as expected: {err}"),
    }

    if let Some(mut ticks) = client.call("ticks", json!(4)).await?.into_stream() {
        while let Some(tick) = ticks.next().await {
            println!("tick -> {}", tick?);
        }
    }

    println!("\n=== Example Complete ===");
    Ok(())
}
