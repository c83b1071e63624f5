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


//! The bidirectional peer engine.
//!
//! A [`Peer`] is one end of a capability-RPC connection. It serves the local
//! [`Registry`](crate::capability::Registry) to the remote side, calls the
//! remote's capabilities, and correlates answers back to the waiting caller:
//!
//! ```text
//! caller ── call() ──► pending ── Call frame ──────────────► remote
//!                        │                                     │
//!                        │◄── Yield (first) ── promote ────────┤
//!                        │        streams ◄── Yield ───────────┤
//!                        └──────────────── ◄── Result ─────────┘
//! ```
//!
//! The peer never touches the connection directly. Outbound frames go
//! through a [`FrameSink`](crate::transport::FrameSink); inbound frames are
//! handed to [`Peer::receive`] by whichever transport owns the socket.

mod config;
mod correlation;
mod error;
#[allow(clippy::module_inception)]
mod peer;
mod state;

pub use config::{DEFAULT_CALL_TIMEOUT, PeerConfig};
pub use correlation::CorrelationIdGenerator;
pub use error::{DEFAULT_DESTROY_REASON, PeerError};
pub use peer::{CallOutput, Peer};
pub(crate) use peer::WeakPeer;
