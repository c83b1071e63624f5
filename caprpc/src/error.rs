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


//! Crate-level error type.
//!
//! Each layer has its own error type:
//!
//! - [`TransportError`]: the connection failed
//! - [`PeerError`]: a call failed
//! - [`RegistryError`]: a registry could not be built
//!
//! [`CapRpcError`] unifies them for applications that want a single error
//! type across setup and calls:
//!
//! ```rust
//! use caprpc::CapRpcError;
//! use caprpc::capability::{CapabilityError, Registry};
//! use serde_json::Value;
//!
//! fn registry() -> Result<Registry, CapRpcError> {
//!     Ok(Registry::builder()
//!         .with_function("echo", |input: Value| async move { Ok::<_, CapabilityError>(input) })
//!         .build()?)
//! }
//! # registry().unwrap();
//! ```

use crate::capability::RegistryError;
use crate::peer::PeerError;
use crate::transport::TransportError;
use std::error::Error as StdError;
use std::fmt;

/// Any error produced by this crate.
#[derive(Debug)]
pub enum CapRpcError {
    /// Opening, accepting or using a connection failed.
    Transport(TransportError),

    /// A call failed.
    Peer(PeerError),

    /// A registry could not be built.
    Registry(RegistryError),
}

impl CapRpcError {
    /// Returns `true` if the error came from the transport layer, directly or
    /// through a failed call.
    #[must_use]
    pub const fn is_transport_error(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Peer(PeerError::Transport(_)))
    }

    /// Returns `true` if the remote side reported the failure.
    #[must_use]
    pub const fn is_remote_error(&self) -> bool {
        matches!(self, Self::Peer(PeerError::Remote(_)))
    }

    /// Returns `true` if retrying may succeed.
    ///
    /// Transport errors defer to [`TransportError::is_recoverable`]; timeouts
    /// are recoverable; everything else is not.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Transport(e) | Self::Peer(PeerError::Transport(e)) => e.is_recoverable(),
            Self::Peer(PeerError::Timeout { .. }) => true,
            Self::Peer(_) | Self::Registry(_) => false,
        }
    }
}

impl fmt::Display for CapRpcError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport(e) => write!(f, "transport error: {}", e),
            Self::Peer(e) => write!(f, "call failed: {}", e),
            Self::Registry(e) => write!(f, "registry error: {}", e),
        }
    }
}

impl StdError for CapRpcError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Self::Transport(e) => Some(e),
            Self::Peer(e) => Some(e),
            Self::Registry(e) => Some(e),
        }
    }
}

impl From<TransportError> for CapRpcError {
    fn from(error: TransportError) -> Self {
        Self::Transport(error)
    }
}

impl From<PeerError> for CapRpcError {
    fn from(error: PeerError) -> Self {
        Self::Peer(error)
    }
}

impl From<RegistryError> for CapRpcError {
    fn from(error: RegistryError) -> Self {
        Self::Registry(error)
    }
}
