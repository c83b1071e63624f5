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


//! Capabilities: named asynchronous operations a peer exposes.
//!
//! A capability takes one JSON input and produces either a single JSON value
//! or a stream of values. Implement [`Capability`] directly for stateful
//! handlers, or register plain closures through
//! [`RegistryBuilder::with_function`] and [`RegistryBuilder::with_stream`].
//!
//! # Example
//!
//! ```rust
//! use caprpc::capability::{CapabilityError, Registry};
//! use futures_util::stream;
//! use serde_json::{Value, json};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let registry = Registry::builder()
//!     .with_function("echo", |input: Value| async move { Ok::<_, CapabilityError>(input) })
//!     .with_stream("count", |input: Value| {
//!         let upto = input.as_u64().unwrap_or(3);
//!         stream::iter((1..=upto).map(|n| Ok::<_, CapabilityError>(json!(n))))
//!     })
//!     .build()?;
//!
//! assert!(registry.contains("echo"));
//! assert!(!registry.contains("toString"));
//! # Ok(())
//! # }
//! ```

mod error;
mod registry;

pub use self::error::{CapabilityError, RegistryError};
pub use self::registry::{CapabilityDescriptor, Registry, RegistryBuilder};

use async_trait::async_trait;
use futures_util::stream::BoxStream;
use futures_util::{Stream, StreamExt};
use serde_json::Value;
use std::fmt;
use std::future::Future;

/// Stream of values produced by a streaming capability.
pub type OutputStream = BoxStream<'static, Result<Value, CapabilityError>>;

/// What a capability produced.
pub enum Output {
    /// A single value, answered with one `result` frame.
    Value(Value),
    /// A sequence, answered with one `yield` frame per item and a closing
    /// `result` frame.
    Stream(OutputStream),
}

impl Output {
    /// Wraps any sendable stream of values.
    pub fn stream<S>(stream: S) -> Self
    where
        S: Stream<Item = Result<Value, CapabilityError>> + Send + 'static,
    {
        Self::Stream(stream.boxed())
    }
}

impl From<Value> for Output {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

impl fmt::Debug for Output {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(value) => f.debug_tuple("Value").field(value).finish(),
            Self::Stream(_) => f.write_str("Stream(..)"),
        }
    }
}

/// A named operation exposed to the remote side.
#[async_trait]
pub trait Capability: Send + Sync + 'static {
    /// Runs the capability against `input`.
    ///
    /// # Errors
    ///
    /// The error message is reported to the caller as the call's failure.
    async fn invoke(&self, input: Value) -> Result<Output, CapabilityError>;
}

/// Adapts an async closure returning one value into a [`Capability`].
pub struct FnCapability<F>(F);

impl<F> FnCapability<F> {
    /// Wraps `f`.
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

#[async_trait]
impl<F, Fut> Capability for FnCapability<F>
where
    F: Fn(Value) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Value, CapabilityError>> + Send + 'static,
{
    async fn invoke(&self, input: Value) -> Result<Output, CapabilityError> {
        (self.0)(input).await.map(Output::Value)
    }
}

/// Adapts a closure returning a stream into a streaming [`Capability`].
pub struct StreamCapability<F>(F);

impl<F> StreamCapability<F> {
    /// Wraps `f`.
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

#[async_trait]
impl<F, S> Capability for StreamCapability<F>
where
    F: Fn(Value) -> S + Send + Sync + 'static,
    S: Stream<Item = Result<Value, CapabilityError>> + Send + 'static,
{
    async fn invoke(&self, input: Value) -> Result<Output, CapabilityError> {
        Ok(Output::stream((self.0)(input)))
    }
}
