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


//! Stateless HTTP server.

use super::ErrorBody;
use crate::capability::{CapabilityDescriptor, Registry};
use crate::dispatch::Dispatcher;
use crate::peer::CorrelationIdGenerator;
use crate::protocol::{Message, UNKNOWN_CAPABILITY};
use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{
        IntoResponse, Response,
        sse::{Event, Sse},
    },
    routing::{get, post},
};
use bytes::Bytes;
use futures_util::stream::{self, BoxStream};
use futures_util::{Stream, StreamExt};
use serde_json::Value;
use std::future;
use std::sync::Arc;
use tracing::{debug, trace};

#[derive(Debug, Clone)]
struct ServerState {
    dispatcher: Dispatcher,
    ids: Arc<CorrelationIdGenerator>,
}

/// Builds a router exposing `registry` over plain HTTP.
///
/// - `GET /` answers with the capability directory.
/// - `POST /{capability}` invokes a capability with the JSON request body
///   (an empty body is `null`).
///
/// A capability that returns a value answers `200` with the value as JSON.
/// A failure answers `{"error": message}` with `404` for an unknown
/// capability and `500` otherwise. A streaming capability answers with a
/// `text/event-stream`: one `data:` event per value, and an `error` event
/// whose data is the JSON-encoded message if the stream fails. A stream
/// that ends without producing anything answers `204`.
///
/// # Example
///
/// ```rust,no_run
/// use caprpc::capability::Registry;
/// use caprpc::http;
/// use std::sync::Arc;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let app = http::router(Arc::new(Registry::empty()));
/// let listener = tokio::net::TcpListener::bind("127.0.0.1:8080").await?;
/// axum::serve(listener, app).await?;
/// # Ok(())
/// # }
/// ```
pub fn router(registry: Arc<Registry>) -> Router {
    Router::new()
        .route("/", get(directory))
        .route("/:capability", post(invoke))
        .with_state(ServerState {
            dispatcher: Dispatcher::new(registry),
            ids: Arc::new(CorrelationIdGenerator::new()),
        })
}

/// GET /
async fn directory(State(state): State<ServerState>) -> Json<Vec<CapabilityDescriptor>> {
    Json(state.dispatcher.registry().directory())
}

/// POST /:capability
async fn invoke(
    State(state): State<ServerState>,
    Path(capability): Path<String>,
    body: Bytes,
) -> Response {
    let input = if body.iter().all(u8::is_ascii_whitespace) {
        Value::Null
    } else {
        match serde_json::from_slice(&body) {
            Ok(input) => input,
            Err(err) => {
                debug!(%capability, error = %err, "rejecting malformed request body");
                return failure(StatusCode::BAD_REQUEST, format!("invalid JSON body: {err}"));
            }
        }
    };

    let id = state.ids.next();
    trace!(%id, %capability, "http call");
    let mut frames = state.dispatcher.dispatch(id, &capability, input);

    match frames.next().await {
        Some(first @ Message::Yield { .. }) => events(first, frames).into_response(),
        Some(Message::Result {
            error: Some(error), ..
        }) => {
            let status = if error == UNKNOWN_CAPABILITY {
                StatusCode::NOT_FOUND
            } else {
                StatusCode::INTERNAL_SERVER_ERROR
            };
            failure(status, error)
        }
        Some(Message::Result {
            output: Some(output),
            ..
        }) => Json(output).into_response(),
        Some(Message::Result { .. }) | Some(Message::Call { .. }) | None => {
            StatusCode::NO_CONTENT.into_response()
        }
    }
}

fn failure(status: StatusCode, error: String) -> Response {
    (status, Json(ErrorBody { error })).into_response()
}

fn events(
    first: Message,
    rest: BoxStream<'static, Message>,
) -> Sse<impl Stream<Item = Result<Event, axum::Error>>> {
    let frames = stream::once(future::ready(first)).chain(rest);

    Sse::new(frames.filter_map(|frame| {
        future::ready(match frame {
            Message::Yield { output, .. } => Some(Event::default().json_data(output)),
            Message::Result {
                error: Some(error), ..
            } => Some(Event::default().event("error").json_data(error)),
            Message::Result { .. } | Message::Call { .. } => None,
        })
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::CapabilityError;
    use serde_json::json;

    async fn double(input: Value) -> Result<Value, CapabilityError> {
        let n = input
            .as_i64()
            .ok_or_else(|| CapabilityError::new("expected a number"))?;
        Ok(json!(n * 2))
    }

    async fn serve() -> String {
        let registry = Registry::builder()
            .with_function("double", double)
            .with_stream("nothing", |_input: Value| {
                stream::empty::<Result<Value, CapabilityError>>()
            })
            .build()
            .unwrap();
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, router(Arc::new(registry))).await });
        format!("http://{addr}")
    }

    async fn post(path: &str, body: &'static str) -> (StatusCode, Bytes) {
        let base = serve().await;
        let response = reqwest::Client::new()
            .post(format!("{base}{path}"))
            .body(body)
            .send()
            .await
            .unwrap();
        let status = StatusCode::from_u16(response.status().as_u16()).unwrap();
        (status, response.bytes().await.unwrap())
    }

    #[tokio::test]
    async fn test_value_is_json() {
        let (status, body) = post("/double", "21").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(serde_json::from_slice::<Value>(&body).unwrap(), json!(42));
    }

    #[tokio::test]
    async fn test_unknown_is_not_found() {
        let (status, body) = post("/constructor", "").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(
            serde_json::from_slice::<Value>(&body).unwrap(),
            json!({"error": "unknown capability"})
        );
    }

    #[tokio::test]
    async fn test_failure_is_server_error() {
        let (status, body) = post("/double", "").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            serde_json::from_slice::<Value>(&body).unwrap(),
            json!({"error": "expected a number"})
        );
    }

    #[tokio::test]
    async fn test_malformed_body_is_bad_request() {
        let (status, _) = post("/double", "{not json").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_empty_stream_is_no_content() {
        let (status, body) = post("/nothing", "").await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert!(body.is_empty());
    }
}
