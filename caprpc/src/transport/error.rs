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


//! Transport layer error types.
//!
//! Transport errors are the lowest layer of the error hierarchy: they describe
//! failures of the connection a peer talks over, never of the calls made on
//! it. [`PeerError`](crate::peer::PeerError) wraps them when a call cannot be
//! handed to the transport.
//!
//! Once a WebSocket connection is open, its transport errors are not returned
//! to any caller. They are reported to
//! [`ConnectConfig::on_error`](crate::transport::websocket::ConnectConfig)
//! and the peer is destroyed with reason `"connection closed"`.

use std::io;
use thiserror::Error;

/// Errors that can occur in the transport layer.
///
/// # Examples
///
/// ```rust
/// use caprpc::transport::TransportError;
/// use std::io;
///
/// let error = TransportError::ConnectionFailed {
///     address: "127.0.0.1:8080".to_string(),
///     source: io::Error::new(io::ErrorKind::ConnectionRefused, "connection refused"),
/// };
///
/// if error.is_recoverable() {
///     println!("Can retry connection");
/// }
/// ```
#[derive(Debug, Error)]
pub enum TransportError {
    /// Failed to establish a connection to the remote endpoint.
    #[error("failed to connect to {address}: {source}")]
    ConnectionFailed {
        /// The address that failed to connect
        address: String,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },

    /// Connection was lost during operation.
    #[error("connection lost: {reason}")]
    ConnectionLost {
        /// Description of why the connection was lost
        reason: String,
    },

    /// The outbound side of the connection is gone; frames can no longer be
    /// sent.
    #[error("transport is closed")]
    Closed,

    /// Failed to bind to the specified address.
    #[error("failed to bind to {address}: {source}")]
    BindFailed {
        /// The address that failed to bind
        address: String,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },

    /// The address or URL could not be used.
    #[error("invalid address {address}: {reason}")]
    InvalidAddress {
        /// The offending address
        address: String,
        /// Why it was rejected
        reason: String,
    },

    /// An unexpected I/O error occurred.
    #[error("I/O error: {source}")]
    Io {
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },

    /// WebSocket-specific error occurred.
    #[cfg(feature = "websocket")]
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// The server refused the WebSocket upgrade.
    #[cfg(feature = "websocket")]
    #[error("WebSocket handshake failed: {reason}")]
    WebSocketHandshakeFailed {
        /// Description of why the handshake failed
        reason: String,
    },

    /// An HTTP request failed before a response could be read.
    #[cfg(feature = "http")]
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The HTTP server answered with a status the client cannot interpret.
    #[cfg(feature = "http")]
    #[error("unexpected HTTP status {status}")]
    UnexpectedStatus {
        /// The status code received
        status: u16,
    },
}

impl TransportError {
    /// Returns `true` if retrying the operation on a new connection may
    /// succeed.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use caprpc::transport::TransportError;
    ///
    /// assert!(!TransportError::Closed.is_recoverable());
    /// ```
    pub fn is_recoverable(&self) -> bool {
        match self {
            TransportError::ConnectionFailed { .. } | TransportError::ConnectionLost { .. } => true,

            TransportError::Io { source } => matches!(
                source.kind(),
                io::ErrorKind::Interrupted | io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut
            ),

            #[cfg(feature = "websocket")]
            TransportError::WebSocket(e) => {
                use tokio_tungstenite::tungstenite::Error as WsError;
                matches!(
                    e,
                    WsError::Io(_) | WsError::ConnectionClosed | WsError::AlreadyClosed
                )
            }

            #[cfg(feature = "websocket")]
            TransportError::WebSocketHandshakeFailed { .. } => false,

            #[cfg(feature = "http")]
            TransportError::Http(e) => e.is_connect() || e.is_timeout(),

            #[cfg(feature = "http")]
            TransportError::UnexpectedStatus { status } => *status >= 500,

            TransportError::Closed
            | TransportError::BindFailed { .. }
            | TransportError::InvalidAddress { .. } => false,
        }
    }
}

impl From<io::Error> for TransportError {
    fn from(error: io::Error) -> Self {
        TransportError::Io { source: error }
    }
}
