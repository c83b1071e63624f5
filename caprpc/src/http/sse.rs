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


//! Incremental decoder for `text/event-stream` bodies.

/// One dispatched server-sent event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SseEvent {
    /// Value of the `event:` field, if any.
    pub(crate) name: Option<String>,
    /// The `data:` lines joined with `\n`.
    pub(crate) data: String,
}

/// Turns body chunks into events.
///
/// Lines may end in `\r\n`, `\n` or a lone `\r`. Chunks may split lines or
/// UTF-8 sequences anywhere; incomplete lines are kept until the rest
/// arrives. An event still being assembled when the body ends is discarded.
#[derive(Debug, Default)]
pub(crate) struct SseDecoder {
    pending: Vec<u8>,
    /// The last line ended in `\r`; a `\n` right after it belongs to it.
    after_cr: bool,
    name: Option<String>,
    data: Vec<String>,
}

impl SseDecoder {
    /// Consumes a chunk and returns every event it completed.
    pub(crate) fn feed(&mut self, chunk: &[u8]) -> Vec<SseEvent> {
        self.pending.extend_from_slice(chunk);

        let mut events = Vec::new();
        loop {
            if self.after_cr && !self.pending.is_empty() {
                self.after_cr = false;
                if self.pending[0] == b'\n' {
                    self.pending.remove(0);
                }
            }
            let Some(end) = self
                .pending
                .iter()
                .position(|&b| b == b'\n' || b == b'\r')
            else {
                break;
            };
            let line: Vec<u8> = self.pending.drain(..=end).collect();
            self.after_cr = line[end] == b'\r';
            if let Some(event) = self.line(&String::from_utf8_lossy(&line[..end])) {
                events.push(event);
            }
        }
        events
    }

    fn line(&mut self, line: &str) -> Option<SseEvent> {
        if line.is_empty() {
            let name = self.name.take();
            if self.data.is_empty() {
                return None;
            }
            let data = std::mem::take(&mut self.data).join("\n");
            return Some(SseEvent { name, data });
        }
        if line.starts_with(':') {
            return None;
        }

        let (field, value) = line.split_once(':').unwrap_or((line, ""));
        let value = value.strip_prefix(' ').unwrap_or(value);
        match field {
            "event" => self.name = Some(value.to_string()),
            "data" => self.data.push(value.to_string()),
            _ => {}
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decodes_data_events() {
        let mut decoder = SseDecoder::default();
        let events = decoder.feed(b"data: 1\n\ndata: 2\n\n");
        assert_eq!(
            events,
            vec![
                SseEvent {
                    name: None,
                    data: "1".to_string()
                },
                SseEvent {
                    name: None,
                    data: "2".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_named_event_and_crlf() {
        let mut decoder = SseDecoder::default();
        let events = decoder.feed(b"event: error\r\ndata: \"mid-stream\"\r\n\r\n");
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].name.as_deref(), Some("error"));
        assert_eq!(events[0].data, "\"mid-stream\"");
    }

    #[test]
    fn test_lone_carriage_returns() {
        let mut decoder = SseDecoder::default();
        let events = decoder.feed(b"data: 1\r\rdata: 2\r");
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].data, "1");

        // A CRLF split across chunks is still one line ending.
        assert!(decoder.feed(b"\n").is_empty());
        let events = decoder.feed(b"\r\ndata: 3\n\n");
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].data, "2");
        assert_eq!(events[1].data, "3");
    }

    #[test]
    fn test_split_chunks() {
        let mut decoder = SseDecoder::default();
        assert!(decoder.feed(b"da").is_empty());
        assert!(decoder.feed(b"ta: {\"a\"").is_empty());
        assert!(decoder.feed(b":1}\n").is_empty());
        let events = decoder.feed(b"\n");
        assert_eq!(events[0].data, "{\"a\":1}");
    }

    #[test]
    fn test_comments_and_multiline_data() {
        let mut decoder = SseDecoder::default();
        let events = decoder.feed(b": keep-alive\n\ndata: a\ndata: b\nid: 4\n\n");
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].data, "a\nb");
    }
}
