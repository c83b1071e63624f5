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


//! Configuration for peers.

use std::time::Duration;

/// Default time a call waits for its first `yield` or its `result`.
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(30);

/// Configuration for a [`Peer`](super::Peer).
///
/// # Examples
///
/// ```rust
/// use caprpc::peer::PeerConfig;
/// use std::time::Duration;
///
/// let config = PeerConfig::new()
///     .with_call_timeout(Duration::from_secs(5))
///     .with_name("worker-7");
/// assert_eq!(config.call_timeout, Duration::from_secs(5));
/// assert_eq!(config.name.as_deref(), Some("worker-7"));
/// ```
#[derive(Debug, Clone)]
pub struct PeerConfig {
    /// How long an outbound call waits for the remote to start answering.
    ///
    /// The timer stops at the first `yield` (the call then resolves to a
    /// stream) or at the `result`. Streams themselves are not timed.
    ///
    /// Default: 30 seconds
    pub call_timeout: Duration,

    /// Label used in log output.
    ///
    /// Default: None
    pub name: Option<String>,
}

impl Default for PeerConfig {
    fn default() -> Self {
        Self {
            call_timeout: DEFAULT_CALL_TIMEOUT,
            name: None,
        }
    }
}

impl PeerConfig {
    /// Creates a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the per-call timeout.
    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }

    /// Sets the log label.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}
