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


//! Binding a peer to a connection the caller already owns.

use super::FrameSink;
use crate::capability::Registry;
use crate::peer::{CallOutput, Peer, PeerConfig, PeerError};
use serde_json::Value;
use std::sync::Arc;

/// Reason given to outstanding calls when a connection is closed locally.
pub const CLOSED_REASON: &str = "closed";

/// Wraps a connection that has already been established, such as a socket
/// accepted by an HTTP framework's upgrade handler.
///
/// Every outbound frame goes to `sink`. The caller feeds each inbound text
/// frame to [`Connection::receive`] and calls [`Connection::close`] when the
/// socket goes away.
///
/// # Example
///
/// ```rust
/// use caprpc::capability::{CapabilityError, Registry};
/// use caprpc::peer::PeerConfig;
/// use caprpc::transport::accept;
/// use serde_json::Value;
/// use std::sync::Arc;
/// use tokio::sync::mpsc;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let registry = Registry::builder()
///     .with_function("echo", |input: Value| async move { Ok::<_, CapabilityError>(input) })
///     .build()?;
///
/// let (outbound, _socket_writer) = mpsc::unbounded_channel::<String>();
/// let connection = accept(Arc::new(registry), outbound, PeerConfig::default());
/// // for each text frame read from the socket:
/// //     connection.receive(&text);
/// connection.close();
/// # Ok(())
/// # }
/// ```
pub fn accept(registry: Arc<Registry>, sink: impl FrameSink, config: PeerConfig) -> Connection {
    Connection {
        peer: Peer::new(registry, sink, config),
    }
}

/// A peer bound to an externally owned connection. Returned by [`accept`].
#[derive(Debug, Clone)]
pub struct Connection {
    peer: Peer,
}

impl Connection {
    /// Calls a capability on the remote side. See [`Peer::call`].
    ///
    /// # Errors
    ///
    /// Returns the same errors as [`Peer::call`].
    pub async fn call(&self, capability: &str, input: Value) -> Result<CallOutput, PeerError> {
        self.peer.call(capability, input).await
    }

    /// Handles one inbound text frame. See [`Peer::receive`].
    pub fn receive(&self, raw: &str) {
        self.peer.receive(raw);
    }

    /// Fails every outstanding call and stream with reason `"closed"`.
    ///
    /// The underlying socket is not touched.
    pub fn close(&self) {
        self.peer.destroy(Some(CLOSED_REASON));
    }

    /// Returns the peer behind this connection.
    #[must_use]
    pub fn peer(&self) -> &Peer {
        &self.peer
    }
}
