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


//! Single-consumer sequences used to reconstruct streamed results.
//!
//! A [`SequenceSender`] is the producer half kept by whoever receives frames
//! (the peer engine, the HTTP client), and [`Sequence`] is the consumer half
//! handed to the caller. Values are delivered in push order. A sequence ends
//! either cleanly ([`SequenceSender::close`], or dropping the sender) or with
//! exactly one error ([`SequenceSender::error`]) surfaced after every value
//! that was already queued.
//!
//! # Example
//!
//! ```rust
//! use caprpc::sequence;
//! use futures_util::StreamExt;
//!
//! # async fn example() {
//! let (sender, mut values) = sequence::channel::<u32>();
//! sender.push(1);
//! sender.push(2);
//! sender.close();
//!
//! assert_eq!(values.next().await.unwrap().unwrap(), 1);
//! assert_eq!(values.next().await.unwrap().unwrap(), 2);
//! assert!(values.next().await.is_none());
//! # }
//! ```

use crate::peer::PeerError;
use futures_util::Stream;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::mpsc;

#[derive(Debug)]
enum Event<T> {
    Value(T),
    Error(PeerError),
}

/// Creates a connected sender/sequence pair backed by an unbounded queue.
#[must_use]
pub fn channel<T>() -> (SequenceSender<T>, Sequence<T>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (
        SequenceSender { tx },
        Sequence {
            rx,
            finished: false,
        },
    )
}

/// Producer half of a sequence.
///
/// `close` and `error` consume the sender, so nothing can be pushed after the
/// sequence has been terminated.
#[derive(Debug)]
pub struct SequenceSender<T> {
    tx: mpsc::UnboundedSender<Event<T>>,
}

impl<T> SequenceSender<T> {
    /// Queues a value.
    ///
    /// Returns `false` if the consumer has already been dropped; the value is
    /// discarded in that case.
    pub fn push(&self, value: T) -> bool {
        self.tx.send(Event::Value(value)).is_ok()
    }

    /// Ends the sequence cleanly once the buffered values are drained.
    pub fn close(self) {
        drop(self);
    }

    /// Ends the sequence with `err`, surfaced after the buffered values.
    pub fn error(self, err: PeerError) {
        let _ = self.tx.send(Event::Error(err));
    }

    /// Returns `true` if the consuming [`Sequence`] has been dropped.
    #[must_use]
    pub fn is_abandoned(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Consumer half of a sequence.
///
/// Yields `Ok(value)` for each pushed value and, if the producer failed, one
/// final `Err`. Polling after the end keeps returning `None`.
#[derive(Debug)]
pub struct Sequence<T> {
    rx: mpsc::UnboundedReceiver<Event<T>>,
    finished: bool,
}

impl<T> Stream for Sequence<T> {
    type Item = Result<T, PeerError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        if self.finished {
            return Poll::Ready(None);
        }

        match self.rx.poll_recv(cx) {
            Poll::Ready(Some(Event::Value(value))) => Poll::Ready(Some(Ok(value))),
            Poll::Ready(Some(Event::Error(err))) => {
                self.finished = true;
                self.rx.close();
                Poll::Ready(Some(Err(err)))
            }
            Poll::Ready(None) => {
                self.finished = true;
                Poll::Ready(None)
            }
            Poll::Pending => Poll::Pending,
        }
    }
}
