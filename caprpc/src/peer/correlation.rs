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


//! Correlation id generation for outbound calls.
//!
//! Ids only need to be unique among the calls one peer has in flight, so a
//! per-peer counter rendered as a decimal string is enough.

use std::sync::atomic::{AtomicU64, Ordering};

/// Generates correlation ids for outbound calls.
///
/// Ids start at `"1"` and increase monotonically. The generator is lock-free
/// and can be shared between tasks.
///
/// # Example
///
/// ```rust
/// use caprpc::peer::CorrelationIdGenerator;
///
/// let generator = CorrelationIdGenerator::new();
/// assert_eq!(generator.next(), "1");
/// assert_eq!(generator.next(), "2");
/// ```
#[derive(Debug)]
pub struct CorrelationIdGenerator {
    next_id: AtomicU64,
}

impl CorrelationIdGenerator {
    /// Creates a generator whose first id is `"1"`.
    #[must_use]
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
        }
    }

    /// Returns the next id.
    #[must_use]
    pub fn next(&self) -> String {
        self.next_id.fetch_add(1, Ordering::Relaxed).to_string()
    }
}

impl Default for CorrelationIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}
