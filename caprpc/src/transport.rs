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


//! Transport adapters.
//!
//! A [`Peer`](crate::peer::Peer) only knows how to turn frames into calls and
//! back. The adapters in this module connect it to something that moves
//! frames:
//!
//! - [`accept`]: bind a peer to a connection the caller already owns, given
//!   a [`FrameSink`] for outbound frames
//! - [`websocket`]: dial or listen for WebSocket connections (requires the
//!   `websocket` feature)
//! - [`memory`]: two peers wired together in-process
//!
//! # Frames
//!
//! Every frame is one JSON text message. Transports must deliver frames in
//! the order they were sent; nothing else is assumed about the channel.
//!
//! # Error Handling
//!
//! Adapter operations return [`TransportError`]:
//!
//! ```rust,no_run
//! # #[cfg(feature = "websocket")]
//! # async fn example() {
//! use caprpc::capability::Registry;
//! use caprpc::transport::TransportError;
//! use caprpc::transport::websocket::{ConnectConfig, connect};
//! use std::sync::Arc;
//!
//! match connect("ws://localhost:1", None, Arc::new(Registry::empty()), ConnectConfig::default()).await {
//!     Ok(_remote) => println!("Connected"),
//!     Err(TransportError::WebSocketHandshakeFailed { reason }) => eprintln!("Refused: {}", reason),
//!     Err(e) => eprintln!("Other error: {}", e),
//! }
//! # }
//! ```

mod accept;
mod error;
pub mod memory;
mod sink;
#[cfg(feature = "websocket")]
pub mod websocket;

pub use self::accept::{CLOSED_REASON, Connection, accept};
pub use self::error::TransportError;
pub use self::sink::{FnSink, FrameSink, sink_fn};
