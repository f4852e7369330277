use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::random::Payload;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Identify,
    Track,
}

/// One synthetic event. Fields are fixed at construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    #[serde(rename = "type")]
    kind: EventKind,
    timestamp: String,
    data: Payload,
}

impl Event {
    pub fn new(kind: EventKind, timestamp: String, data: Payload) -> Self {
        Self {
            kind,
            timestamp,
            data,
        }
    }

    pub fn kind(&self) -> EventKind {
        self.kind
    }

    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    pub fn data(&self) -> &Payload {
        &self.data
    }

    /// `data.id` of an identify event.
    pub fn user_id(&self) -> Option<&str> {
        self.data.get("id").and_then(Value::as_str)
    }

    /// `data.event_name` of a track event.
    pub fn event_name(&self) -> Option<&str> {
        self.data.get("event_name").and_then(Value::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn serializes_kind_as_type() {
        let mut data = Payload::new();
        data.insert("event_name".into(), json!("Cart Viewed"));
        let event = Event::new(EventKind::Track, "2024-05-01T10:00:00.000Z".into(), data);

        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], "track");
        assert_eq!(value["data"]["event_name"], "Cart Viewed");
        assert_eq!(event.event_name(), Some("Cart Viewed"));
        assert_eq!(event.user_id(), None);
    }
}
