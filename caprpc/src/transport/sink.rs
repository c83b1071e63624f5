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


//! The outbound half of a transport as seen by a peer.

use super::TransportError;
use std::fmt;
use tokio::sync::mpsc;

/// Accepts encoded frames for delivery to the remote side.
///
/// A peer calls [`send_frame`](Self::send_frame) from whichever task
/// produced the frame, so implementations must not block. Frames handed to
/// one sink must reach the remote in the order they were sent.
///
/// The common implementation is an unbounded channel drained by the task
/// that owns the socket:
///
/// ```rust
/// use caprpc::transport::FrameSink;
/// use tokio::sync::mpsc;
///
/// let (tx, mut rx) = mpsc::unbounded_channel::<String>();
/// tx.send_frame("{}".to_string()).unwrap();
/// assert_eq!(rx.try_recv().unwrap(), "{}");
/// ```
pub trait FrameSink: Send + Sync + 'static {
    /// Queues one frame for sending.
    ///
    /// # Errors
    ///
    /// Returns a [`TransportError`] if the connection can no longer accept
    /// frames.
    fn send_frame(&self, frame: String) -> Result<(), TransportError>;
}

impl FrameSink for mpsc::UnboundedSender<String> {
    fn send_frame(&self, frame: String) -> Result<(), TransportError> {
        self.send(frame).map_err(|_| TransportError::Closed)
    }
}

/// A [`FrameSink`] backed by a closure. Built with [`sink_fn`].
pub struct FnSink<F> {
    send: F,
}

/// Wraps a closure as a [`FrameSink`].
///
/// ```rust
/// use caprpc::transport::{FrameSink, sink_fn};
///
/// let sink = sink_fn(|frame| {
///     println!("{frame}");
///     Ok(())
/// });
/// sink.send_frame("{}".to_string()).unwrap();
/// ```
pub fn sink_fn<F>(send: F) -> FnSink<F>
where
    F: Fn(String) -> Result<(), TransportError> + Send + Sync + 'static,
{
    FnSink { send }
}

impl<F> FrameSink for FnSink<F>
where
    F: Fn(String) -> Result<(), TransportError> + Send + Sync + 'static,
{
    fn send_frame(&self, frame: String) -> Result<(), TransportError> {
        (self.send)(frame)
    }
}

impl<F> fmt::Debug for FnSink<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnSink").finish_non_exhaustive()
    }
}
