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


//! In-memory transport for tests and in-process peers.
//!
//! [`pair`] connects two peers through unbounded channels. Each direction is
//! drained by a forwarding task that hands frames to the other peer's
//! `receive`, so frames arrive in the order they were sent, exactly as they
//! would over a socket. The forwarders hold only weak references: once both
//! connections are dropped the tasks end on their own.

use super::{Connection, accept};
use crate::capability::Registry;
use crate::peer::{PeerConfig, WeakPeer};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::trace;

/// Creates two connected peers.
///
/// The first serves `registry_a` and the second `registry_b`; both use
/// `config`. Must be called from within a Tokio runtime.
///
/// # Example
///
/// ```rust
/// use caprpc::capability::{CapabilityError, Registry};
/// use caprpc::peer::PeerConfig;
/// use caprpc::transport::memory;
/// use serde_json::{Value, json};
/// use std::sync::Arc;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let server = Registry::builder()
///     .with_function("echo", |input: Value| async move { Ok::<_, CapabilityError>(input) })
///     .build()?;
///
/// let (client, _server) = memory::pair(
///     Arc::new(Registry::empty()),
///     Arc::new(server),
///     PeerConfig::default(),
/// );
/// let answer = client.call("echo", json!("hi")).await?;
/// assert_eq!(answer.into_value(), Some(json!("hi")));
/// # Ok(())
/// # }
/// ```
pub fn pair(
    registry_a: Arc<Registry>,
    registry_b: Arc<Registry>,
    config: PeerConfig,
) -> (Connection, Connection) {
    let (a_tx, a_rx) = mpsc::unbounded_channel::<String>();
    let (b_tx, b_rx) = mpsc::unbounded_channel::<String>();

    let a = accept(registry_a, a_tx, config.clone());
    let b = accept(registry_b, b_tx, config);

    tokio::spawn(forward(a_rx, b.peer().downgrade()));
    tokio::spawn(forward(b_rx, a.peer().downgrade()));

    (a, b)
}

async fn forward(mut frames: mpsc::UnboundedReceiver<String>, target: WeakPeer) {
    while let Some(frame) = frames.recv().await {
        let Some(peer) = target.upgrade() else {
            break;
        };
        trace!(peer = %peer.name(), bytes = frame.len(), "delivering frame");
        peer.receive(&frame);
    }
}
