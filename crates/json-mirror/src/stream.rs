//! Decoding of server-sent event records from a streaming key/value
//! service.
//!
//! Each record carries an `event:` name and a `data:` payload. `put`
//! replaces the content at a path, `patch` merges into it:
//!
//! ```text
//! event: put
//! data: {"path": "/users", "data": {"alice": {"age": 31}}}
//!
//! event: patch
//! data: {"path": "/users/alice", "data": {"admin": true}}
//! ```

use std::io::{BufRead, Lines};

use serde::Deserialize;
use serde_json::Value;

use crate::error::TreeError;

#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    Put { path: String, data: Value },
    Patch { path: String, data: Value },
    KeepAlive,
    Cancel,
    AuthRevoked,
}

#[derive(Deserialize)]
struct Payload {
    path: String,
    data: Value,
}

impl StreamEvent {
    pub fn decode(event: &str, data: &str) -> Result<Self, TreeError> {
        match event.trim() {
            "put" => {
                let Payload { path, data } = serde_json::from_str(data)?;
                Ok(StreamEvent::Put { path, data })
            }
            "patch" => {
                let Payload { path, data } = serde_json::from_str(data)?;
                Ok(StreamEvent::Patch { path, data })
            }
            "keep-alive" => Ok(StreamEvent::KeepAlive),
            "cancel" => Ok(StreamEvent::Cancel),
            "auth_revoked" => Ok(StreamEvent::AuthRevoked),
            other => Err(TreeError::InvalidEvent(format!("unknown event {other:?}"))),
        }
    }

    /// Whether this event clears the target path before merging.
    pub fn replace(&self) -> bool {
        matches!(self, StreamEvent::Put { .. })
    }

    /// `cancel` and `auth_revoked` end the stream.
    pub fn is_terminal(&self) -> bool {
        matches!(self, StreamEvent::Cancel | StreamEvent::AuthRevoked)
    }
}

/// One `event:`/`data:` block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SseRecord {
    pub event: String,
    pub data: String,
}

impl SseRecord {
    pub fn decode(&self) -> Result<StreamEvent, TreeError> {
        StreamEvent::decode(&self.event, &self.data)
    }
}

/// Groups lines into records; a blank line ends a record, `:` lines are
/// comments and multiple `data:` lines are joined with `\n`.
pub struct SseRecordReader<R> {
    lines: Lines<R>,
}

impl<R: BufRead> SseRecordReader<R> {
    pub fn new(input: R) -> Self {
        Self {
            lines: input.lines(),
        }
    }
}

impl<R: BufRead> Iterator for SseRecordReader<R> {
    type Item = Result<SseRecord, TreeError>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut record = SseRecord::default();
        let mut has_data = false;
        let mut seen_field = false;
        loop {
            let line = match self.lines.next() {
                Some(Ok(line)) => line,
                Some(Err(err)) => return Some(Err(err.into())),
                None if seen_field => return Some(Ok(record)),
                None => return None,
            };
            if line.is_empty() {
                if seen_field {
                    return Some(Ok(record));
                }
                continue;
            }
            if line.starts_with(':') {
                continue;
            }
            let (field, value) = match line.split_once(':') {
                Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
                None => (line.as_str(), ""),
            };
            seen_field = true;
            match field {
                "event" => record.event = value.to_string(),
                "data" => {
                    if has_data {
                        record.data.push('\n');
                    }
                    record.data.push_str(value);
                    has_data = true;
                }
                _ => log::debug!("ignoring stream field {field:?}"),
            }
        }
    }
}
