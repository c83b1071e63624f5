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


//! Client for the stateless HTTP variant.

use super::ErrorBody;
use super::sse::SseDecoder;
use crate::capability::CapabilityDescriptor;
use crate::peer::{CallOutput, PeerError};
use crate::sequence::{self, Sequence};
use crate::transport::TransportError;
use futures_util::StreamExt;
use reqwest::header::CONTENT_TYPE;
use reqwest::{RequestBuilder, Response, StatusCode};
use serde_json::Value;
use tracing::{debug, trace};

/// Calls capabilities served by [`router`](super::router).
///
/// # Example
///
/// ```rust,no_run
/// use caprpc::http::HttpClient;
/// use futures_util::StreamExt;
/// use serde_json::json;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = HttpClient::new("http://localhost:8080").with_credential("secret");
///
/// for entry in client.directory().await? {
///     println!("{}: {}", entry.name, entry.description);
/// }
///
/// if let Some(mut values) = client.call("count", json!(3)).await?.into_stream() {
///     while let Some(value) = values.next().await {
///         println!("{}", value?);
///     }
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct HttpClient {
    base_url: String,
    client: reqwest::Client,
    credential: Option<String>,
}

impl HttpClient {
    /// Creates a client for the server at `base_url`.
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            base_url,
            client: reqwest::Client::new(),
            credential: None,
        }
    }

    /// Sends `credential` as a bearer token with every request.
    #[must_use]
    pub fn with_credential(mut self, credential: impl Into<String>) -> Self {
        self.credential = Some(credential.into());
        self
    }

    /// Uses a preconfigured `reqwest` client, e.g. one with timeouts set.
    #[must_use]
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    /// Fetches the server's capability directory.
    ///
    /// # Errors
    ///
    /// Returns [`PeerError::Transport`] if the request fails or the server
    /// does not answer `200`.
    pub async fn directory(&self) -> Result<Vec<CapabilityDescriptor>, PeerError> {
        let response = self
            .authorize(self.client.get(format!("{}/", self.base_url)))
            .send()
            .await
            .map_err(TransportError::from)?;

        if response.status() != StatusCode::OK {
            return Err(unexpected(response.status()));
        }
        Ok(response.json().await.map_err(TransportError::from)?)
    }

    /// Calls `capability` with `input`.
    ///
    /// A streaming answer resolves to [`CallOutput::Stream`] as soon as the
    /// response headers arrive; values are decoded as the events come in.
    ///
    /// # Errors
    ///
    /// - [`PeerError::Remote`] if the server reported a failure
    /// - [`PeerError::Transport`] if the request failed or the response could
    ///   not be interpreted
    /// - [`PeerError::Codec`] if a value was not valid JSON
    pub async fn call(&self, capability: &str, input: Value) -> Result<CallOutput, PeerError> {
        let url = format!("{}/{}", self.base_url, urlencoding::encode(capability));
        trace!(%url, "http call");

        let response = self
            .authorize(self.client.post(url).json(&input))
            .send()
            .await
            .map_err(TransportError::from)?;

        let status = response.status();
        if status == StatusCode::NO_CONTENT {
            return Ok(CallOutput::Value(Value::Null));
        }
        if status.is_success() && is_event_stream(&response) {
            return Ok(CallOutput::Stream(read_events(response)));
        }

        let body = response.bytes().await.map_err(TransportError::from)?;
        if status.is_success() {
            if body.is_empty() {
                return Ok(CallOutput::Value(Value::Null));
            }
            return Ok(CallOutput::Value(serde_json::from_slice(&body)?));
        }

        match serde_json::from_slice::<ErrorBody>(&body) {
            Ok(ErrorBody { error }) => Err(PeerError::Remote(error)),
            Err(_) => Err(unexpected(status)),
        }
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.credential {
            Some(credential) => request.bearer_auth(credential),
            None => request,
        }
    }
}

fn unexpected(status: StatusCode) -> PeerError {
    TransportError::UnexpectedStatus {
        status: status.as_u16(),
    }
    .into()
}

fn is_event_stream(response: &Response) -> bool {
    response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with("text/event-stream"))
}

fn read_events(response: Response) -> Sequence<Value> {
    let (values, sequence) = sequence::channel();

    tokio::spawn(async move {
        let mut body = response.bytes_stream();
        let mut decoder = SseDecoder::default();

        while let Some(chunk) = body.next().await {
            let chunk = match chunk {
                Ok(chunk) => chunk,
                Err(err) => {
                    debug!(error = %err, "event stream interrupted");
                    values.error(TransportError::from(err).into());
                    return;
                }
            };

            for event in decoder.feed(&chunk) {
                if event.name.as_deref() == Some("error") {
                    let message = serde_json::from_str::<String>(&event.data).unwrap_or(event.data);
                    values.error(PeerError::Remote(message));
                    return;
                }
                match serde_json::from_str(&event.data) {
                    Ok(value) => {
                        if !values.push(value) {
                            return;
                        }
                    }
                    Err(err) => {
                        values.error(err.into());
                        return;
                    }
                }
            }
        }
        values.close();
    });

    sequence
}
