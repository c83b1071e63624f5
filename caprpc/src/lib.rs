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


#![allow(clippy::module_inception)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

//! # caprpc - Capability RPC over a single duplex connection
//!
//! caprpc connects two endpoints over one ordered channel. Each side exposes
//! a set of named asynchronous *capabilities* and can call the other side's:
//!
//! - **Bi-directional**: both peers serve and call over the same connection
//! - **Streaming results**: a capability may answer with a sequence of values
//! - **Correlation**: many calls can be in flight at once, in any order
//! - **Timeouts and teardown**: calls fail cleanly when time runs out or the
//!   connection goes away
//! - **Pluggable transports**: WebSocket, in-memory, or any connection the
//!   application already owns, plus a stateless HTTP + SSE variant
//!
//! ## Architecture
//!
//! - **[`capability`]**: the [`Capability`](capability::Capability) trait
//!   and the immutable [`Registry`](capability::Registry)
//! - **[`protocol`]**: the three wire messages and their JSON encoding
//! - **[`dispatch`]**: runs one inbound call and yields its answer frames
//! - **[`peer`]**: the engine correlating outbound calls with their answers
//! - **[`sequence`]**: the stream type streamed results arrive on
//! - **[`transport`]**: adapters moving frames between peers
//! - **[`http`]**: the stateless variant (requires the `http` feature)
//!
//! ## Quick Start
//!
//! ```rust
//! use caprpc::capability::{CapabilityError, Registry};
//! use caprpc::peer::PeerConfig;
//! use caprpc::transport::memory;
//! use futures_util::{StreamExt, stream};
//! use serde_json::{Value, json};
//! use std::sync::Arc;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), caprpc::CapRpcError> {
//! let server = Registry::builder()
//!     .with_function("echo", |input: Value| async move { Ok::<_, CapabilityError>(input) })
//!     .with_stream("count", |input: Value| {
//!         let n = input.as_u64().unwrap_or(0);
//!         stream::iter((1..=n).map(|i| Ok::<_, CapabilityError>(json!(i))))
//!     })
//!     .build()?;
//!
//! let (client, _server) = memory::pair(
//!     Arc::new(Registry::empty()),
//!     Arc::new(server),
//!     PeerConfig::default(),
//! );
//!
//! let echoed = client.call("echo", json!("hello")).await?;
//! assert_eq!(echoed.into_value(), Some(json!("hello")));
//!
//! let mut counted = Vec::new();
//! if let Some(mut values) = client.call("count", json!(3)).await?.into_stream() {
//!     while let Some(value) = values.next().await {
//!         counted.push(value?);
//!     }
//! }
//! assert_eq!(counted, vec![json!(1), json!(2), json!(3)]);
//! # Ok(())
//! # }
//! ```
//!
//! ## Feature Flags
//!
//! - `websocket` (default): WebSocket client and listener
//! - `http` (default): `axum` router and `reqwest` client for the stateless
//!   variant

pub mod capability;
pub mod dispatch;
pub mod error;
#[cfg(feature = "http")]
pub mod http;
pub mod peer;
pub mod protocol;
pub mod sequence;
pub mod transport;

pub use capability::{Capability, CapabilityError, Registry, RegistryBuilder};
pub use error::CapRpcError;
pub use peer::{CallOutput, Peer, PeerConfig, PeerError};
pub use protocol::Message;
pub use transport::{Connection, TransportError};
