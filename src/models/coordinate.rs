use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Body of an ingest request.
///
/// `lat` and `lng` are kept as raw JSON values and passed through to the
/// store unchanged. Only presence is checked; `null` counts as absent.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CoordinateInput {
    #[serde(default)]
    pub lat: Option<Value>,
    #[serde(default)]
    pub lng: Option<Value>,
}

impl CoordinateInput {
    /// Parse a request body according to its `Content-Type`.
    ///
    /// Only JSON media types are decoded; any other (or missing) type leaves
    /// the body opaque, so it carries no fields.
    pub fn from_request(content_type: Option<&str>, body: &[u8]) -> Self {
        if content_type.is_some_and(is_json_media_type) {
            Self::from_body(body)
        } else {
            Self::default()
        }
    }

    /// Parse a raw request body.
    ///
    /// Anything that is not a JSON object (empty body, malformed JSON, arrays,
    /// strings) carries no fields and yields an empty input.
    pub fn from_body(body: &[u8]) -> Self {
        // Derived struct impls also accept JSON arrays positionally; only objects count
        serde_json::from_slice::<Value>(body)
            .ok()
            .filter(Value::is_object)
            .and_then(|value| serde_json::from_value(value).ok())
            .unwrap_or_default()
    }

    /// Stamp the coordinate with the current time, if both fields are present.
    pub fn into_record(self) -> Option<CoordinateRecord> {
        match (self.lat, self.lng) {
            (Some(lat), Some(lng)) => Some(CoordinateRecord::new(lat, lng)),
            _ => None,
        }
    }
}

fn is_json_media_type(content_type: &str) -> bool {
    let essence = content_type.split(';').next().unwrap_or_default().trim();
    essence.eq_ignore_ascii_case("application/json")
        || essence.eq_ignore_ascii_case("application/ld+json")
}

/// A coordinate as persisted under the collection path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoordinateRecord {
    pub lat: Value,
    pub lng: Value,
    pub timestamp: i64, // Unix epoch milliseconds
}

impl CoordinateRecord {
    pub fn new(lat: Value, lng: Value) -> Self {
        Self {
            lat,
            lng,
            timestamp: Utc::now().timestamp_millis(),
        }
    }
}
