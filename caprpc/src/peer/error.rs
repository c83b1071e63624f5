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


//! Errors surfaced to callers of a peer.
//!
//! These sit one layer above [`TransportError`]: a call fails because the
//! remote reported an error, because the local timeout elapsed, because the
//! peer was destroyed, or because the frame could not be encoded or sent.
//! The variants carry enough text for callers to tell these apart.

use crate::transport::TransportError;
use std::time::Duration;
use thiserror::Error;

/// Default reason used by [`Peer::destroy`](super::Peer::destroy).
pub const DEFAULT_DESTROY_REASON: &str = "peer destroyed";

/// Errors returned by [`Peer::call`](super::Peer::call) and raised by result
/// streams.
#[derive(Debug, Error)]
pub enum PeerError {
    /// The remote side answered with an error.
    ///
    /// Displays exactly the remote message, e.g. `unknown capability`.
    #[error("{0}")]
    Remote(String),

    /// No answer arrived before the configured call timeout.
    #[error("call to capability '{capability}' timed out after {timeout:?}")]
    Timeout {
        /// The capability that was called.
        capability: String,
        /// The timeout that elapsed.
        timeout: Duration,
    },

    /// The peer was destroyed while the call or stream was outstanding.
    ///
    /// Displays exactly the destroy reason.
    #[error("{0}")]
    Destroyed(String),

    /// The frame could not be handed to the transport.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// A frame or payload could not be encoded or decoded.
    #[error("codec error: {0}")]
    Codec(#[from] serde_json::Error),
}

impl PeerError {
    /// Returns `true` if the error originated on the remote side.
    #[must_use]
    pub const fn is_remote(&self) -> bool {
        matches!(self, Self::Remote(_))
    }

    /// Returns `true` if the call timed out locally.
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// Returns `true` if the peer was destroyed.
    #[must_use]
    pub const fn is_destroyed(&self) -> bool {
        matches!(self, Self::Destroyed(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_and_destroyed_display_verbatim() {
        assert_eq!(
            PeerError::Remote("unknown capability".to_string()).to_string(),
            "unknown capability"
        );
        assert_eq!(
            PeerError::Destroyed(DEFAULT_DESTROY_REASON.to_string()).to_string(),
            "peer destroyed"
        );
    }

    #[test]
    fn test_timeout_names_capability() {
        let err = PeerError::Timeout {
            capability: "slow".to_string(),
            timeout: Duration::from_millis(50),
        };
        let message = err.to_string();
        assert!(message.contains("slow"));
        assert!(message.contains("timed out"));
        assert!(err.is_timeout());
        assert!(!err.is_remote());
        assert!(!err.is_destroyed());
    }

    #[test]
    fn test_transport_conversion() {
        let err: PeerError = TransportError::Closed.into();
        assert!(matches!(err, PeerError::Transport(TransportError::Closed)));
    }
}
