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


//! Stateless HTTP variant.
//!
//! For callers that cannot hold a socket open, every call is one request:
//!
//! ```text
//! GET  /              -> 200 [{"name": ..., "description": ..., "input": ..., "output": ...}]
//! POST /{capability}  -> 200 <value>
//!                        204 (no value)
//!                        200 text/event-stream  data: <value> ... [event: error]
//!                        404 {"error": "unknown capability"}
//!                        500 {"error": <message>}
//!                        400 {"error": <message>}  (body is not JSON)
//! ```
//!
//! Calls go one way only: the server cannot call back into the client.
//! [`router`] builds the `axum` side and [`HttpClient`] the `reqwest` side.

mod client;
mod server;
mod sse;

pub use client::HttpClient;
pub use server::router;

use serde::{Deserialize, Serialize};

/// Body of a failed call.
#[derive(Debug, Serialize, Deserialize)]
struct ErrorBody {
    error: String,
}
