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


//! WebSocket transport.
//!
//! Each connection carries one JSON frame per text message. A background
//! task owns the socket: it writes the frames the peer emits and hands every
//! inbound text message (or binary message holding valid UTF-8) to the
//! peer's `receive`. When the socket closes or fails the peer is destroyed
//! with reason `"connection closed"`.
//!
//! # Examples
//!
//! ## Client Connection
//!
//! ```rust,no_run
//! use caprpc::capability::Registry;
//! use caprpc::transport::websocket::{ConnectConfig, connect};
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let remote = connect(
//!     "ws://localhost:8080/rpc",
//!     Some("secret"),
//!     Arc::new(Registry::empty()),
//!     ConnectConfig::default(),
//! )
//! .await?;
//!
//! let answer = remote.call("echo", json!("hello")).await?;
//! remote.close();
//! # Ok(())
//! # }
//! ```
//!
//! ## Server Listener
//!
//! ```rust,no_run
//! use caprpc::capability::Registry;
//! use caprpc::peer::PeerConfig;
//! use caprpc::transport::websocket::{WebSocketConfig, WebSocketListener};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let registry = Arc::new(Registry::empty());
//! let listener = WebSocketListener::bind("127.0.0.1:8080", WebSocketConfig::default()).await?;
//!
//! loop {
//!     let accepted = listener.accept(Arc::clone(&registry), PeerConfig::default()).await?;
//!     println!("peer {} presented {:?}", accepted.peer_addr(), accepted.credential());
//!     tokio::spawn(async move {
//!         accepted.remote().closed().await;
//!     });
//! }
//! # }
//! ```

use super::{Connection, TransportError, accept};
use crate::capability::Registry;
use crate::peer::{CallOutput, Peer, PeerConfig, PeerError};
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpListener;
use tokio::sync::{mpsc, watch};
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::protocol::WebSocketConfig as ProtocolConfig;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tokio_tungstenite::{WebSocketStream, accept_hdr_async_with_config, connect_async_with_config};
use tracing::{debug, trace, warn};

/// Reason given to outstanding calls when the socket goes away.
pub const CONNECTION_CLOSED_REASON: &str = "connection closed";

/// Query parameter carrying the credential when none is configured.
pub const DEFAULT_CREDENTIAL_PARAM: &str = "token";

/// Callback receiving transport failures that occur after a connection opened.
pub type ErrorHandler = Arc<dyn Fn(&TransportError) + Send + Sync>;

/// Configuration for WebSocket connections.
#[derive(Debug, Clone)]
pub struct WebSocketConfig {
    /// Maximum size of a single WebSocket frame (default: 16 MB)
    pub max_frame_size: usize,

    /// Maximum size of a complete message (default: 64 MB)
    pub max_message_size: usize,

    /// Accept unmasked frames (server-side only, default: false)
    ///
    /// RFC 6455 requires clients to mask frames. This is for testing.
    pub accept_unmasked_frames: bool,

    /// Name of the URL query parameter that carries the credential
    /// (default: `token`)
    pub credential_param: String,
}

impl Default for WebSocketConfig {
    fn default() -> Self {
        Self {
            max_frame_size: 16 * 1024 * 1024,   // 16 MB
            max_message_size: 64 * 1024 * 1024, // 64 MB
            accept_unmasked_frames: false,
            credential_param: DEFAULT_CREDENTIAL_PARAM.to_string(),
        }
    }
}

impl WebSocketConfig {
    /// Sets the query parameter that carries the credential.
    #[must_use]
    pub fn with_credential_param(mut self, param: impl Into<String>) -> Self {
        self.credential_param = param.into();
        self
    }

    fn protocol(&self) -> ProtocolConfig {
        let mut config = ProtocolConfig::default();
        config.max_frame_size = Some(self.max_frame_size);
        config.max_message_size = Some(self.max_message_size);
        config.accept_unmasked_frames = self.accept_unmasked_frames;
        config
    }
}

/// Options for [`connect`].
#[derive(Clone, Default)]
pub struct ConnectConfig {
    /// Configuration of the local peer.
    pub peer: PeerConfig,
    /// WebSocket limits and the credential parameter name.
    pub websocket: WebSocketConfig,
    /// Receives transport failures after the connection opened.
    pub on_error: Option<ErrorHandler>,
}

impl ConnectConfig {
    /// Sets the peer configuration.
    #[must_use]
    pub fn with_peer(mut self, peer: PeerConfig) -> Self {
        self.peer = peer;
        self
    }

    /// Sets the WebSocket configuration.
    #[must_use]
    pub fn with_websocket(mut self, websocket: WebSocketConfig) -> Self {
        self.websocket = websocket;
        self
    }

    /// Registers a callback for failures after the connection opened.
    #[must_use]
    pub fn with_on_error<F>(mut self, on_error: F) -> Self
    where
        F: Fn(&TransportError) + Send + Sync + 'static,
    {
        self.on_error = Some(Arc::new(on_error));
        self
    }
}

impl fmt::Debug for ConnectConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectConfig")
            .field("peer", &self.peer)
            .field("websocket", &self.websocket)
            .field("on_error", &self.on_error.is_some())
            .finish()
    }
}

/// Opens a WebSocket to `url` and runs a peer serving `registry` over it.
///
/// When `credential` is given it is URL-encoded and appended to the URL as
/// the query parameter named by
/// [`WebSocketConfig::credential_param`]. Resolves once the handshake has
/// completed.
///
/// # Errors
///
/// Returns [`TransportError::ConnectionFailed`] if the server cannot be
/// reached, [`TransportError::WebSocketHandshakeFailed`] if it refused the
/// upgrade, or another [`TransportError`] if the connection could not be
/// opened.
pub async fn connect(
    url: &str,
    credential: Option<&str>,
    registry: Arc<Registry>,
    config: ConnectConfig,
) -> Result<RemotePeer, TransportError> {
    let target = with_credential(url, &config.websocket.credential_param, credential);
    let (stream, _response) =
        connect_async_with_config(target.as_str(), Some(config.websocket.protocol()), false)
            .await
            .map_err(|err| match err {
                WsError::Http(response) => TransportError::WebSocketHandshakeFailed {
                    reason: format!("server answered {}", response.status()),
                },
                WsError::Url(err) => TransportError::InvalidAddress {
                    address: url.to_string(),
                    reason: err.to_string(),
                },
                WsError::Io(source) => TransportError::ConnectionFailed {
                    address: url.to_string(),
                    source,
                },
                other => TransportError::WebSocket(other),
            })?;

    debug!(url, "websocket connected");
    Ok(start(stream, registry, config.peer, config.on_error))
}

/// A peer running over a WebSocket.
///
/// Clones share the same connection. The socket is closed by
/// [`close`](Self::close) or when the last clone is dropped.
#[derive(Debug, Clone)]
pub struct RemotePeer {
    connection: Connection,
    shutdown: Arc<watch::Sender<bool>>,
    done: watch::Receiver<bool>,
}

impl RemotePeer {
    /// Calls a capability on the remote side. See [`Peer::call`].
    ///
    /// # Errors
    ///
    /// Returns the same errors as [`Peer::call`].
    pub async fn call(&self, capability: &str, input: Value) -> Result<CallOutput, PeerError> {
        self.connection.call(capability, input).await
    }

    /// Fails outstanding calls with reason `"closed"` and closes the socket.
    pub fn close(&self) {
        self.connection.close();
        self.shutdown.send_replace(true);
    }

    /// Waits until the socket has closed, for whatever reason.
    pub async fn closed(&self) {
        let mut done = self.done.clone();
        let _ = done.wait_for(|closed| *closed).await;
    }

    /// Returns `true` once the socket has closed.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        *self.done.borrow()
    }

    /// Returns the peer behind this connection.
    #[must_use]
    pub fn peer(&self) -> &Peer {
        self.connection.peer()
    }
}

/// WebSocket listener for accepting incoming peers.
pub struct WebSocketListener {
    listener: TcpListener,
    config: WebSocketConfig,
}

impl WebSocketListener {
    /// Bind to a local address and listen for WebSocket connections.
    ///
    /// # Errors
    ///
    /// Returns an error if binding fails (e.g., address already in use).
    pub async fn bind(
        addr: impl Into<String>,
        config: WebSocketConfig,
    ) -> Result<Self, TransportError> {
        let addr_str = addr.into();
        let listener =
            TcpListener::bind(&addr_str)
                .await
                .map_err(|e| TransportError::BindFailed {
                    address: addr_str,
                    source: e,
                })?;

        Ok(Self { listener, config })
    }

    /// Accepts the next connection and starts a peer serving `registry` on
    /// it.
    ///
    /// The credential query parameter, if the client sent one, is captured
    /// for the caller. It is not checked here.
    ///
    /// # Errors
    ///
    /// Returns an error if accepting the TCP connection or the WebSocket
    /// handshake fails. Neither affects later calls to `accept`.
    pub async fn accept(
        &self,
        registry: Arc<Registry>,
        config: PeerConfig,
    ) -> Result<AcceptedConnection, TransportError> {
        let (stream, peer_addr) = self
            .listener
            .accept()
            .await
            .map_err(|e| TransportError::Io { source: e })?;

        let mut credential = None;
        let param = self.config.credential_param.as_str();
        let websocket = accept_hdr_async_with_config(
            stream,
            |request: &Request, response: Response| -> Result<Response, ErrorResponse> {
                credential = query_param(request.uri().query(), param);
                Ok(response)
            },
            Some(self.config.protocol()),
        )
        .await?;

        debug!(%peer_addr, "websocket accepted");
        Ok(AcceptedConnection {
            remote: start(websocket, registry, config, None),
            credential,
            peer_addr,
        })
    }

    /// Returns the local address this listener is bound to.
    #[allow(clippy::result_large_err)]
    pub fn local_addr(&self) -> Result<SocketAddr, TransportError> {
        self.listener
            .local_addr()
            .map_err(|e| TransportError::Io { source: e })
    }
}

impl fmt::Debug for WebSocketListener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebSocketListener")
            .field("local_addr", &self.listener.local_addr().ok())
            .field("config", &self.config)
            .finish()
    }
}

/// A connection accepted by [`WebSocketListener::accept`].
#[derive(Debug)]
pub struct AcceptedConnection {
    remote: RemotePeer,
    credential: Option<String>,
    peer_addr: SocketAddr,
}

impl AcceptedConnection {
    /// Returns the peer running on the connection.
    #[must_use]
    pub fn remote(&self) -> &RemotePeer {
        &self.remote
    }

    /// Returns the credential the client presented, URL-decoded.
    #[must_use]
    pub fn credential(&self) -> Option<&str> {
        self.credential.as_deref()
    }

    /// Returns the client's socket address.
    #[must_use]
    pub fn peer_addr(&self) -> SocketAddr {
        self.peer_addr
    }

    /// Consumes the connection, keeping only the peer.
    #[must_use]
    pub fn into_remote(self) -> RemotePeer {
        self.remote
    }
}

fn start<S>(
    websocket: WebSocketStream<S>,
    registry: Arc<Registry>,
    config: PeerConfig,
    on_error: Option<ErrorHandler>,
) -> RemotePeer
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
    let connection = accept(registry, outbound_tx, config);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let (done_tx, done_rx) = watch::channel(false);

    let peer = connection.peer().clone();
    let (writer, reader) = websocket.split();

    // Reading never waits on writing, so both sides can stream at once.
    let mut send_task = tokio::spawn(send_task(
        writer,
        peer.name().to_string(),
        outbound_rx,
        shutdown_rx,
    ));
    let mut recv_task = tokio::spawn(receive_task(reader, peer.clone()));

    tokio::spawn(async move {
        let joined = tokio::select! {
            joined = &mut send_task => {
                recv_task.abort();
                joined
            }
            joined = &mut recv_task => {
                send_task.abort();
                joined
            }
        };
        match joined {
            Ok(Ok(())) => {}
            Ok(Err(err)) => {
                warn!(peer = %peer.name(), error = %err, "websocket connection failed");
                if let Some(on_error) = &on_error {
                    on_error(&err);
                }
            }
            Err(err) => warn!(peer = %peer.name(), error = %err, "websocket task failed"),
        }
        peer.destroy(Some(CONNECTION_CLOSED_REASON));
        done_tx.send_replace(true);
    });

    RemotePeer {
        connection,
        shutdown: Arc::new(shutdown_tx),
        done: done_rx,
    }
}

/// Writes outbound frames to the socket until shutdown or the peer's sink
/// goes away.
async fn send_task<S>(
    mut writer: SplitSink<WebSocketStream<S>, Message>,
    name: String,
    mut outbound: mpsc::UnboundedReceiver<String>,
    mut shutdown: watch::Receiver<bool>,
) -> Result<(), TransportError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    loop {
        tokio::select! {
            _ = shutdown.changed() => {
                debug!(peer = %name, "closing websocket");
                let _ = writer.close().await;
                return Ok(());
            }
            frame = outbound.recv() => match frame {
                Some(frame) => {
                    trace!(peer = %name, bytes = frame.len(), "sending frame");
                    writer
                        .send(Message::Text(frame))
                        .await
                        .map_err(connection_lost)?;
                }
                None => {
                    let _ = writer.close().await;
                    return Ok(());
                }
            },
        }
    }
}

/// Feeds inbound frames to the peer until the remote side closes.
async fn receive_task<S>(
    mut reader: SplitStream<WebSocketStream<S>>,
    peer: Peer,
) -> Result<(), TransportError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    while let Some(message) = reader.next().await {
        match message {
            Ok(Message::Text(text)) => {
                trace!(peer = %peer.name(), bytes = text.len(), "received frame");
                peer.receive(&text);
            }
            Ok(Message::Binary(data)) => match std::str::from_utf8(&data) {
                Ok(text) => peer.receive(text),
                Err(_) => trace!(peer = %peer.name(), bytes = data.len(), "ignoring non-UTF-8 binary frame"),
            },
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(WsError::ConnectionClosed) => break,
            Err(err) => return Err(connection_lost(err)),
        }
    }
    debug!(peer = %peer.name(), "websocket closed by remote");
    Ok(())
}

fn connection_lost(err: WsError) -> TransportError {
    TransportError::ConnectionLost {
        reason: err.to_string(),
    }
}

fn with_credential(url: &str, param: &str, credential: Option<&str>) -> String {
    match credential {
        Some(credential) => {
            let separator = if url.contains('?') { '&' } else { '?' };
            format!(
                "{url}{separator}{param}={}",
                urlencoding::encode(credential)
            )
        }
        None => url.to_string(),
    }
}

fn query_param(query: Option<&str>, name: &str) -> Option<String> {
    query?
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(key, _)| *key == name)
        .and_then(|(_, value)| urlencoding::decode(value).ok())
        .map(|value| value.into_owned())
}
