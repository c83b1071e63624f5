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


//! Turning one inbound call into its outbound frames.
//!
//! The [`Dispatcher`] looks the capability up, runs it, and lazily produces
//! the frames that answer the call: zero or more `yield` frames followed by
//! exactly one `result` frame. It keeps no state between calls and knows
//! nothing about transports; the caller decides where the frames go.

use crate::capability::{Capability, Output, OutputStream, Registry};
use crate::protocol::{Message, UNKNOWN_CAPABILITY};
use futures_util::stream::{self, BoxStream};
use futures_util::{FutureExt, StreamExt};
use serde_json::Value;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::warn;

/// Message reported when a capability panics with a non-string payload.
const PANIC_MESSAGE: &str = "capability panicked";

/// Runs inbound calls against a registry.
///
/// # Example
///
/// ```rust
/// use caprpc::capability::{CapabilityError, Registry};
/// use caprpc::dispatch::Dispatcher;
/// use caprpc::protocol::Message;
/// use futures_util::StreamExt;
/// use serde_json::{Value, json};
/// use std::sync::Arc;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let registry = Registry::builder()
///     .with_function("echo", |input: Value| async move { Ok::<_, CapabilityError>(input) })
///     .build()?;
/// let dispatcher = Dispatcher::new(Arc::new(registry));
///
/// let frames: Vec<Message> = dispatcher
///     .dispatch("1".to_string(), "echo", json!("hi"))
///     .collect()
///     .await;
/// assert_eq!(frames, vec![Message::success("1", Some(json!("hi")))]);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Dispatcher {
    registry: Arc<Registry>,
}

enum State {
    Invoke {
        id: String,
        capability: String,
        handler: Option<Arc<dyn Capability>>,
        input: Value,
    },
    Streaming {
        id: String,
        items: OutputStream,
    },
    Done,
}

impl Dispatcher {
    /// Creates a dispatcher over `registry`.
    #[must_use]
    pub fn new(registry: Arc<Registry>) -> Self {
        Self { registry }
    }

    /// Returns the registry calls are dispatched against.
    #[must_use]
    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// Produces the frames answering a call.
    ///
    /// Nothing runs until the returned stream is polled. Each frame is
    /// produced as soon as it exists, so a consumer forwarding frames as they
    /// arrive delivers stream items while the capability is still running.
    pub fn dispatch(
        &self,
        id: String,
        capability: &str,
        input: Value,
    ) -> BoxStream<'static, Message> {
        let state = State::Invoke {
            id,
            capability: capability.to_string(),
            handler: self.registry.get(capability),
            input,
        };

        stream::unfold(state, |state| async move {
            match state {
                State::Invoke {
                    id, handler: None, ..
                } => Some((Message::failure(id, UNKNOWN_CAPABILITY), State::Done)),
                State::Invoke {
                    id,
                    capability,
                    handler: Some(handler),
                    input,
                } => {
                    let outcome = AssertUnwindSafe(handler.invoke(input)).catch_unwind().await;
                    match outcome {
                        Ok(Ok(Output::Value(value))) => {
                            Some((Message::success(id, Some(value)), State::Done))
                        }
                        Ok(Ok(Output::Stream(items))) => Some(next_item(id, items).await),
                        Ok(Err(err)) => Some((Message::failure(id, err.message()), State::Done)),
                        Err(payload) => {
                            let message = panic_message(payload.as_ref());
                            warn!(%capability, %message, "capability panicked");
                            Some((Message::failure(id, message), State::Done))
                        }
                    }
                }
                State::Streaming { id, items } => Some(next_item(id, items).await),
                State::Done => None,
            }
        })
        .boxed()
    }
}

async fn next_item(id: String, mut items: OutputStream) -> (Message, State) {
    let next = AssertUnwindSafe(items.next()).catch_unwind().await;
    match next {
        Ok(Some(Ok(output))) => (
            Message::Yield {
                id: id.clone(),
                output,
            },
            State::Streaming { id, items },
        ),
        Ok(Some(Err(err))) => (Message::failure(id, err.message()), State::Done),
        Ok(None) => (Message::success(id, None), State::Done),
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            warn!(%message, "capability stream panicked");
            (Message::failure(id, message), State::Done)
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        PANIC_MESSAGE.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::{CapabilityError, Output};
    use async_trait::async_trait;
    use futures_util::stream;
    use serde_json::json;

    struct FailsImmediately;

    #[async_trait]
    impl Capability for FailsImmediately {
        async fn invoke(&self, _input: Value) -> Result<Output, CapabilityError> {
            Err(CapabilityError::new("refused"))
        }
    }

    struct Panics;

    #[async_trait]
    impl Capability for Panics {
        async fn invoke(&self, _input: Value) -> Result<Output, CapabilityError> {
            panic!("kaboom");
        }
    }

    struct PanicsWithNumber;

    #[async_trait]
    impl Capability for PanicsWithNumber {
        async fn invoke(&self, _input: Value) -> Result<Output, CapabilityError> {
            std::panic::panic_any(7_u32);
        }
    }

    async fn echo(input: Value) -> Result<Value, CapabilityError> {
        Ok(input)
    }

    fn dispatcher() -> Dispatcher {
        let registry = Registry::builder()
            .with_function("echo", echo)
            .with_stream("count", |_input: Value| {
                stream::iter([1, 2, 3].map(|n| Ok::<_, CapabilityError>(json!(n))))
            })
            .with_stream("empty", |_input: Value| {
                stream::empty::<Result<Value, CapabilityError>>()
            })
            .with_stream("breaks", |_input: Value| {
                stream::iter(vec![
                    Ok(json!("ok")),
                    Err(CapabilityError::new("mid-stream")),
                    Ok(json!("never")),
                ])
            })
            .with_capability(
                crate::capability::CapabilityDescriptor::new("refuses"),
                FailsImmediately,
            )
            .with_capability(crate::capability::CapabilityDescriptor::new("panics"), Panics)
            .with_capability(
                crate::capability::CapabilityDescriptor::new("panics_number"),
                PanicsWithNumber,
            )
            .build()
            .unwrap();
        Dispatcher::new(Arc::new(registry))
    }

    async fn frames(capability: &str, input: Value) -> Vec<Message> {
        dispatcher()
            .dispatch("c1".to_string(), capability, input)
            .collect()
            .await
    }

    #[tokio::test]
    async fn test_plain_value() {
        assert_eq!(
            frames("echo", json!({"a": 1})).await,
            vec![Message::success("c1", Some(json!({"a": 1})))]
        );
    }

    #[tokio::test]
    async fn test_unknown_capability() {
        for name in ["missing", "constructor", "__proto__", "toString"] {
            assert_eq!(
                frames(name, Value::Null).await,
                vec![Message::failure("c1", UNKNOWN_CAPABILITY)]
            );
        }
    }

    #[tokio::test]
    async fn test_stream_yields_then_result() {
        let yield_of = |n: i32| Message::Yield {
            id: "c1".to_string(),
            output: json!(n),
        };
        assert_eq!(
            frames("count", Value::Null).await,
            vec![
                yield_of(1),
                yield_of(2),
                yield_of(3),
                Message::success("c1", None)
            ]
        );
    }

    #[tokio::test]
    async fn test_empty_stream_is_bare_result() {
        assert_eq!(
            frames("empty", Value::Null).await,
            vec![Message::success("c1", None)]
        );
    }

    #[tokio::test]
    async fn test_stream_failure_stops_after_last_yield() {
        assert_eq!(
            frames("breaks", Value::Null).await,
            vec![
                Message::Yield {
                    id: "c1".to_string(),
                    output: json!("ok"),
                },
                Message::failure("c1", "mid-stream"),
            ]
        );
    }

    #[tokio::test]
    async fn test_invocation_failure() {
        assert_eq!(
            frames("refuses", Value::Null).await,
            vec![Message::failure("c1", "refused")]
        );
    }

    #[tokio::test]
    async fn test_panic_is_stringified() {
        assert_eq!(
            frames("panics", Value::Null).await,
            vec![Message::failure("c1", "kaboom")]
        );
        assert_eq!(
            frames("panics_number", Value::Null).await,
            vec![Message::failure("c1", PANIC_MESSAGE)]
        );
    }
}
