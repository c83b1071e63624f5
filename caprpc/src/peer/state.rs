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


//! Per-connection bookkeeping of outbound calls.
//!
//! A call id lives in exactly one of two tables: `pending` until the remote
//! starts answering, then `streams` if the answer turned out to be a
//! sequence. Every method here runs under the peer's state lock and never
//! blocks.

use super::{CallOutput, PeerError};
use crate::sequence::{self, SequenceSender};
use serde_json::Value;
use std::collections::HashMap;
use tokio::sync::oneshot;

pub(crate) type Reply = oneshot::Sender<Result<CallOutput, PeerError>>;

#[derive(Debug)]
struct PendingCall {
    capability: String,
    reply: Reply,
}

/// Pending calls and active streams of one peer.
#[derive(Debug, Default)]
pub(crate) struct CallTable {
    pending: HashMap<String, PendingCall>,
    streams: HashMap<String, SequenceSender<Value>>,
}

impl CallTable {
    /// Registers a pending call and returns the receiver its answer goes to.
    pub(crate) fn register(
        &mut self,
        id: String,
        capability: String,
    ) -> oneshot::Receiver<Result<CallOutput, PeerError>> {
        let (reply, rx) = oneshot::channel();
        self.pending.insert(id, PendingCall { capability, reply });
        rx
    }

    /// Drops a pending call without answering it.
    ///
    /// Returns `true` if the id was still pending.
    pub(crate) fn forget(&mut self, id: &str) -> bool {
        self.pending.remove(id).is_some()
    }

    /// Applies a `yield` frame.
    ///
    /// The first yield for a pending call promotes it to a stream and
    /// resolves the call with the stream; later yields are appended. Returns
    /// `false` if the id is unknown.
    pub(crate) fn on_yield(&mut self, id: &str, output: Value) -> bool {
        if let Some(call) = self.pending.remove(id) {
            let (sender, stream) = sequence::channel();
            sender.push(output);
            if call.reply.send(Ok(CallOutput::Stream(stream))).is_ok() {
                self.streams.insert(id.to_string(), sender);
            }
            return true;
        }

        match self.streams.get(id) {
            Some(sender) => {
                if !sender.push(output) {
                    self.streams.remove(id);
                }
                true
            }
            None => false,
        }
    }

    /// Applies a `result` frame.
    ///
    /// Terminates the stream for `id` if there is one, otherwise settles the
    /// pending call. Returns `false` if the id is unknown.
    pub(crate) fn on_result(
        &mut self,
        id: &str,
        output: Option<Value>,
        error: Option<String>,
    ) -> bool {
        if let Some(sender) = self.streams.remove(id) {
            match error {
                Some(message) => sender.error(PeerError::Remote(message)),
                None => sender.close(),
            }
            return true;
        }

        if let Some(call) = self.pending.remove(id) {
            let answer = match error {
                Some(message) => Err(PeerError::Remote(message)),
                None => Ok(CallOutput::Value(output.unwrap_or(Value::Null))),
            };
            let _ = call.reply.send(answer);
            return true;
        }

        false
    }

    /// Fails every pending call and stream with `reason` and empties both
    /// tables. Returns the number of calls and streams that were failed.
    pub(crate) fn destroy(&mut self, reason: &str) -> (usize, usize) {
        let calls = self.pending.len();
        let streams = self.streams.len();

        for (_, call) in self.pending.drain() {
            let _ = call.reply.send(Err(PeerError::Destroyed(reason.to_string())));
        }
        for (_, sender) in self.streams.drain() {
            sender.error(PeerError::Destroyed(reason.to_string()));
        }

        (calls, streams)
    }

    /// Returns the capability name of a pending call.
    pub(crate) fn capability_of(&self, id: &str) -> Option<&str> {
        self.pending.get(id).map(|call| call.capability.as_str())
    }

    pub(crate) fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub(crate) fn stream_len(&self) -> usize {
        self.streams.len()
    }
}
