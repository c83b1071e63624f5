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


//! Error types for capabilities and registries.

use std::fmt;
use thiserror::Error;

/// Failure reported by a capability.
///
/// Only the message crosses the wire; it becomes the `error` field of the
/// call's `result` frame.
///
/// # Examples
///
/// ```rust
/// use caprpc::capability::CapabilityError;
///
/// let err = CapabilityError::new("disk full");
/// assert_eq!(err.message(), "disk full");
///
/// let err: CapabilityError = "bad input".into();
/// assert_eq!(err.to_string(), "bad input");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapabilityError {
    message: String,
}

impl CapabilityError {
    /// Creates an error with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Creates an error from any displayable error value.
    pub fn from_error(error: impl fmt::Display) -> Self {
        Self::new(error.to_string())
    }

    /// Returns the message sent to the caller.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for CapabilityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for CapabilityError {}

impl From<String> for CapabilityError {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

impl From<&str> for CapabilityError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

impl From<serde_json::Error> for CapabilityError {
    fn from(error: serde_json::Error) -> Self {
        Self::from_error(error)
    }
}

/// Errors raised while assembling a [`Registry`](super::Registry).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// The same capability name was registered twice.
    #[error("capability '{name}' is registered more than once")]
    Duplicate {
        /// The repeated name.
        name: String,
    },

    /// A capability was registered with an empty name.
    #[error("capability names must not be empty")]
    EmptyName,
}
