// Event Sink
// Pushes preference and permission notifications out to the UI host

use std::sync::Mutex;
use serde::Serialize;
use serde_json::Value;

pub const EVENT_PREFERENCE_CHANGED: &str = "preferences://changed";
pub const EVENT_PERMISSION_DENIED: &str = "permission://denied";

pub trait EventSink: Send + Sync {
    fn emit(&self, event: &str, payload: Value);
}

pub struct NoopEventSink;

impl EventSink for NoopEventSink {
    fn emit(&self, _event: &str, _payload: Value) {}
}

/// Sink that keeps every emitted event in memory, for hosts that poll
#[derive(Default)]
pub struct BufferedEventSink {
    events: Mutex<Vec<(String, Value)>>,
}

impl BufferedEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take all buffered events, oldest first
    pub fn drain(&self) -> Vec<(String, Value)> {
        match self.events.lock() {
            Ok(mut events) => std::mem::take(&mut *events),
            Err(_) => Vec::new(),
        }
    }
}

impl EventSink for BufferedEventSink {
    fn emit(&self, event: &str, payload: Value) {
        if let Ok(mut events) = self.events.lock() {
            events.push((event.to_string(), payload));
        }
    }
}

pub fn emit_event<T: Serialize>(sink: &dyn EventSink, event: &str, payload: &T) {
    if let Ok(value) = serde_json::to_value(payload) {
        sink.emit(event, value);
    }
}

/// Payload of `preferences://changed`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreferenceChanged<'a> {
    pub key: &'a str,
    pub value: &'a Value,
}
