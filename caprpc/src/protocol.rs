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


//! Wire frames exchanged between peers.
//!
//! Every frame is one JSON object with a `type` discriminant:
//!
//! ```text
//! {"type":"call","id":"7","capability":"echo","input":{"text":"hi"}}
//! {"type":"yield","id":"7","output":1}
//! {"type":"result","id":"7","output":{"text":"hi"}}
//! {"type":"result","id":"7","error":"unknown capability"}
//! ```
//!
//! Decoding is strict about the discriminant and the `id`/`capability`
//! fields; `input` and `output` default to `null` when absent.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Error text sent when a call names a capability that is not registered.
pub const UNKNOWN_CAPABILITY: &str = "unknown capability";

/// A single protocol frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Message {
    /// Invocation request.
    Call {
        /// Correlation id minted by the caller.
        id: String,
        /// Name of the capability to invoke.
        capability: String,
        /// Capability input.
        #[serde(default)]
        input: Value,
    },

    /// One streamed value of a call whose capability produced a sequence.
    Yield {
        /// Correlation id of the originating call.
        id: String,
        /// The streamed value.
        #[serde(default)]
        output: Value,
    },

    /// Terminal frame of a call.
    ///
    /// `error` and `output` are mutually exclusive; neither being present
    /// means the call succeeded without a payload.
    Result {
        /// Correlation id of the originating call.
        id: String,
        /// Successful output, if any.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        output: Option<Value>,
        /// Failure message, if the call failed.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
}

impl Message {
    /// Builds a successful terminal frame.
    pub fn success(id: impl Into<String>, output: Option<Value>) -> Self {
        Self::Result {
            id: id.into(),
            output,
            error: None,
        }
    }

    /// Builds a failed terminal frame.
    pub fn failure(id: impl Into<String>, error: impl Into<String>) -> Self {
        Self::Result {
            id: id.into(),
            output: None,
            error: Some(error.into()),
        }
    }

    /// Returns the correlation id carried by this frame.
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::Call { id, .. } | Self::Yield { id, .. } | Self::Result { id, .. } => id,
        }
    }

    /// Returns `true` for the terminal `result` frame.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Result { .. })
    }

    /// Encodes the frame as compact JSON text.
    ///
    /// # Errors
    ///
    /// Fails only if a payload contains a value `serde_json` cannot
    /// represent.
    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Decodes a frame from JSON text.
    ///
    /// # Errors
    ///
    /// Returns an error for text that is not JSON, lacks the `type`
    /// discriminant or a required field, or carries an unknown `type`.
    pub fn decode(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }
}
