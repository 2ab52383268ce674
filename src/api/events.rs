//! Firebase streaming protocol
//!
//! The realtime database streams a tree as server-sent events: `put` replaces
//! the node at `path`, `patch` merges children into it. `LiveTree` keeps a
//! local copy of the subscribed node in sync with those events.

use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::debug;

use super::FirebaseError;

// =============================================================================
// Server-Sent Event Framing
// =============================================================================

/// One dispatched server-sent event
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SseFrame {
    pub event: String,
    pub data: String,
}

/// Incremental `text/event-stream` parser. Chunks may split lines (and UTF-8
/// sequences) anywhere; only complete lines are interpreted.
#[derive(Debug, Default)]
pub struct EventParser {
    buffer: Vec<u8>,
    event: String,
    data: Vec<String>,
}

impl EventParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk, returning every frame it completed
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<SseFrame> {
        self.buffer.extend_from_slice(chunk);

        let mut frames = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&line);
            let line = line.trim_end_matches(['\n', '\r']);
            if let Some(frame) = self.line(line) {
                frames.push(frame);
            }
        }
        frames
    }

    fn line(&mut self, line: &str) -> Option<SseFrame> {
        if line.is_empty() {
            if self.event.is_empty() && self.data.is_empty() {
                return None;
            }
            let frame = SseFrame {
                event: std::mem::take(&mut self.event),
                data: std::mem::take(&mut self.data).join("\n"),
            };
            return Some(frame);
        }
        if line.starts_with(':') {
            return None;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };
        match field {
            "event" => self.event = value.to_string(),
            "data" => self.data.push(value.to_string()),
            _ => {}
        }
        None
    }
}

// =============================================================================
// Tree Events
// =============================================================================

/// Payload of `put`/`patch` events
#[derive(Debug, Deserialize)]
struct PathData {
    path: String,
    data: Value,
}

/// Decoded realtime database event
#[derive(Debug, Clone, PartialEq)]
pub enum TreeEvent {
    Put { path: String, data: Value },
    Patch { path: String, data: Value },
    KeepAlive,
    Cancel(String),
    AuthRevoked,
}

impl TreeEvent {
    /// Decode a frame; unknown event types yield `None`
    pub fn from_frame(frame: &SseFrame) -> Result<Option<Self>, FirebaseError> {
        let event = match frame.event.as_str() {
            "put" | "patch" => {
                let body: PathData = serde_json::from_str(&frame.data).map_err(|e| {
                    FirebaseError::InvalidResponse(format!("bad {} payload: {}", frame.event, e))
                })?;
                if frame.event == "put" {
                    TreeEvent::Put {
                        path: body.path,
                        data: body.data,
                    }
                } else {
                    TreeEvent::Patch {
                        path: body.path,
                        data: body.data,
                    }
                }
            }
            "keep-alive" => TreeEvent::KeepAlive,
            "cancel" => TreeEvent::Cancel(
                serde_json::from_str::<String>(&frame.data).unwrap_or_else(|_| frame.data.clone()),
            ),
            "auth_revoked" => TreeEvent::AuthRevoked,
            other => {
                debug!(event = other, "ignoring unknown stream event");
                return Ok(None);
            }
        };
        Ok(Some(event))
    }
}

// =============================================================================
// Local Tree Copy
// =============================================================================

/// Local copy of a subscribed node
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LiveTree {
    root: Value,
}

impl LiveTree {
    pub fn new(root: Value) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Value {
        &self.root
    }

    /// Apply an event; returns whether the tree may have changed
    pub fn apply(&mut self, event: &TreeEvent) -> bool {
        match event {
            TreeEvent::Put { path, data } => {
                set_at(&mut self.root, &segments(path), data.clone());
                true
            }
            TreeEvent::Patch { path, data } => {
                let Some(children) = data.as_object() else {
                    return false;
                };
                let base = segments(path);
                for (key, value) in children {
                    let mut full = base.clone();
                    full.extend(segments(key));
                    set_at(&mut self.root, &full, value.clone());
                }
                !children.is_empty()
            }
            _ => false,
        }
    }
}

fn segments(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

/// Write `data` at `path` below `node`. `null` deletes, and parents left
/// empty by a delete are removed as well.
fn set_at(node: &mut Value, path: &[&str], data: Value) {
    let Some((head, rest)) = path.split_first() else {
        *node = data;
        return;
    };

    if data.is_null() && !node.is_object() && !node.is_array() {
        return;
    }
    if let Value::Array(list) = node {
        let map: Map<String, Value> = std::mem::take(list)
            .into_iter()
            .enumerate()
            .filter(|(_, v)| !v.is_null())
            .map(|(i, v)| (i.to_string(), v))
            .collect();
        *node = Value::Object(map);
    }
    if !node.is_object() {
        *node = Value::Object(Map::new());
    }

    if let Value::Object(map) = node {
        let prune = {
            let child = map.entry(head.to_string()).or_insert(Value::Null);
            set_at(child, rest, data);
            is_empty(child)
        };
        if prune {
            map.remove(*head);
        }
    }
}

fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

// =============================================================================
// Tests
// =============================================================================
