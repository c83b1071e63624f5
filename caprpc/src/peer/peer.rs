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


//! The peer engine.

use super::state::CallTable;
use super::{CorrelationIdGenerator, DEFAULT_DESTROY_REASON, PeerConfig, PeerError};
use crate::capability::Registry;
use crate::dispatch::Dispatcher;
use crate::protocol::Message;
use crate::sequence::Sequence;
use crate::transport::{FrameSink, TransportError};
use futures_util::StreamExt;
use parking_lot::Mutex;
use serde_json::Value;
use std::fmt;
use std::sync::{Arc, Weak};
use tracing::{debug, trace, warn};

/// Successful outcome of [`Peer::call`].
#[derive(Debug)]
pub enum CallOutput {
    /// The capability answered with a single value (`null` when the result
    /// carried no output).
    Value(Value),
    /// The capability answered with a sequence of values.
    Stream(Sequence<Value>),
}

impl CallOutput {
    /// Returns the value, or `None` for a stream.
    #[must_use]
    pub fn into_value(self) -> Option<Value> {
        match self {
            Self::Value(value) => Some(value),
            Self::Stream(_) => None,
        }
    }

    /// Returns the stream, or `None` for a single value.
    #[must_use]
    pub fn into_stream(self) -> Option<Sequence<Value>> {
        match self {
            Self::Value(_) => None,
            Self::Stream(stream) => Some(stream),
        }
    }

    /// Returns `true` if the call resolved to a stream.
    #[must_use]
    pub const fn is_stream(&self) -> bool {
        matches!(self, Self::Stream(_))
    }
}

/// One side of a capability-RPC connection.
///
/// A `Peer` exposes the capabilities of its [`Registry`] to the remote side
/// and calls the remote's capabilities. It does not own the connection:
/// outbound frames go to the [`FrameSink`] given at construction, and the
/// transport feeds inbound frames to [`receive`](Self::receive).
///
/// `Peer` is a cheap handle; clones share the same call tables.
///
/// # Example
///
/// ```rust,no_run
/// use caprpc::capability::Registry;
/// use caprpc::peer::{Peer, PeerConfig};
/// use serde_json::json;
/// use std::sync::Arc;
/// use tokio::sync::mpsc;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let (outbound, mut wire) = mpsc::unbounded_channel::<String>();
/// let peer = Peer::new(Arc::new(Registry::empty()), outbound, PeerConfig::default());
///
/// // Hand outbound frames to the connection and feed inbound ones back.
/// tokio::spawn(async move {
///     while let Some(frame) = wire.recv().await {
///         println!("send {frame}");
///     }
/// });
///
/// let answer = peer.call("echo", json!("hi")).await?;
/// println!("{:?}", answer.into_value());
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Peer {
    inner: Arc<Inner>,
}

/// A non-owning handle to a [`Peer`].
///
/// Lets forwarding tasks deliver frames without keeping the peer alive.
#[derive(Debug, Clone)]
pub(crate) struct WeakPeer {
    inner: Weak<Inner>,
}

impl WeakPeer {
    pub(crate) fn upgrade(&self) -> Option<Peer> {
        self.inner.upgrade().map(|inner| Peer { inner })
    }
}

struct Inner {
    name: String,
    config: PeerConfig,
    dispatcher: Dispatcher,
    sink: Arc<dyn FrameSink>,
    ids: CorrelationIdGenerator,
    calls: Mutex<CallTable>,
}

/// Removes a call's pending entry when its future finishes or is dropped.
struct PendingGuard<'a> {
    calls: &'a Mutex<CallTable>,
    id: &'a str,
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        self.calls.lock().forget(self.id);
    }
}

impl Peer {
    /// Creates a peer serving `registry` and sending frames to `sink`.
    pub fn new(registry: Arc<Registry>, sink: impl FrameSink, config: PeerConfig) -> Self {
        let name = config.name.clone().unwrap_or_else(|| "peer".to_string());
        Self {
            inner: Arc::new(Inner {
                name,
                config,
                dispatcher: Dispatcher::new(registry),
                sink: Arc::new(sink),
                ids: CorrelationIdGenerator::new(),
                calls: Mutex::new(CallTable::default()),
            }),
        }
    }

    /// Returns the label used in logs.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Returns the peer configuration.
    #[must_use]
    pub fn config(&self) -> &PeerConfig {
        &self.inner.config
    }

    /// Returns the capabilities this peer serves.
    #[must_use]
    pub fn registry(&self) -> &Arc<Registry> {
        self.inner.dispatcher.registry()
    }

    /// Calls a capability on the remote side.
    ///
    /// Resolves with the remote's value, or with a stream as soon as the
    /// first streamed value arrives. The configured call timeout covers the
    /// wait for that first answer. Dropping the returned future forgets the
    /// call locally; a late answer is then ignored.
    ///
    /// # Errors
    ///
    /// - [`PeerError::Remote`] if the remote reported a failure
    /// - [`PeerError::Timeout`] if nothing arrived in time
    /// - [`PeerError::Destroyed`] if the peer was destroyed meanwhile
    /// - [`PeerError::Transport`] if the call frame could not be sent, or
    ///   the call was dropped without an answer
    pub async fn call(&self, capability: &str, input: Value) -> Result<CallOutput, PeerError> {
        let id = self.inner.ids.next();
        let frame = Message::Call {
            id: id.clone(),
            capability: capability.to_string(),
            input,
        }
        .encode()?;

        let answer = self
            .inner
            .calls
            .lock()
            .register(id.clone(), capability.to_string());
        let _guard = PendingGuard {
            calls: &self.inner.calls,
            id: &id,
        };

        trace!(peer = %self.inner.name, %id, capability, "sending call");
        self.inner.sink.send_frame(frame)?;

        let timeout = self.inner.config.call_timeout;
        match tokio::time::timeout(timeout, answer).await {
            Ok(Ok(outcome)) => outcome,
            // Reply sender dropped without an answer.
            Ok(Err(_)) => Err(PeerError::Transport(TransportError::Closed)),
            Err(_) => {
                self.inner.calls.lock().forget(&id);
                debug!(peer = %self.inner.name, %id, capability, ?timeout, "call timed out");
                Err(PeerError::Timeout {
                    capability: capability.to_string(),
                    timeout,
                })
            }
        }
    }

    /// Handles one inbound frame.
    ///
    /// Never fails: frames that do not decode, and answers for calls that are
    /// no longer outstanding, are dropped without touching any state.
    /// Inbound calls are dispatched on a spawned task that sends each answer
    /// frame as soon as it is produced, so this must run inside a Tokio
    /// runtime for calls to be served.
    pub fn receive(&self, raw: &str) {
        let Ok(message) = Message::decode(raw) else {
            return;
        };

        match message {
            Message::Call {
                id,
                capability,
                input,
            } => self.serve(id, &capability, input),
            Message::Yield { id, output } => {
                self.inner.calls.lock().on_yield(&id, output);
            }
            Message::Result { id, output, error } => {
                let mut calls = self.inner.calls.lock();
                if let Some(capability) = calls.capability_of(&id) {
                    trace!(peer = %self.inner.name, %id, capability, failed = error.is_some(), "call settled");
                }
                calls.on_result(&id, output, error);
            }
        }
    }

    /// Fails every outstanding call and stream.
    ///
    /// Pending calls reject and active streams end with
    /// [`PeerError::Destroyed`] carrying `reason`, or `"peer destroyed"` when
    /// no reason is given. Safe to call repeatedly. The transport is left
    /// alone; closing it is the adapter's job.
    pub fn destroy(&self, reason: Option<&str>) {
        let reason = reason.unwrap_or(DEFAULT_DESTROY_REASON);
        let (calls, streams) = self.inner.calls.lock().destroy(reason);
        debug!(peer = %self.inner.name, reason, calls, streams, "peer destroyed");
    }

    /// Returns the number of calls waiting for their first answer.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.inner.calls.lock().pending_len()
    }

    /// Returns the number of calls currently streaming values.
    #[must_use]
    pub fn stream_count(&self) -> usize {
        self.inner.calls.lock().stream_len()
    }

    pub(crate) fn downgrade(&self) -> WeakPeer {
        WeakPeer {
            inner: Arc::downgrade(&self.inner),
        }
    }

    fn serve(&self, id: String, capability: &str, input: Value) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!(peer = %self.inner.name, %id, capability, "no runtime to serve inbound call");
            return;
        };

        trace!(peer = %self.inner.name, %id, capability, "serving call");
        let mut frames = self.inner.dispatcher.dispatch(id, capability, input);
        let sink = Arc::clone(&self.inner.sink);
        let name = self.inner.name.clone();

        runtime.spawn(async move {
            while let Some(frame) = frames.next().await {
                let encoded = match frame.encode() {
                    Ok(encoded) => encoded,
                    Err(err) => {
                        warn!(peer = %name, id = frame.id(), error = %err, "failed to encode frame");
                        break;
                    }
                };
                if let Err(err) = sink.send_frame(encoded) {
                    debug!(peer = %name, id = frame.id(), error = %err, "transport gone, abandoning call");
                    break;
                }
            }
        });
    }
}

impl fmt::Debug for Peer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Peer")
            .field("name", &self.inner.name)
            .field("config", &self.inner.config)
            .field("registry", self.registry())
            .finish_non_exhaustive()
    }
}
