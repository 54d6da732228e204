//! Usage event types for the AgenticBilling usage tool.
//!
//! A [`UsageEvent`] is a CloudEvents v1.0 envelope around a [`UsageData`]
//! payload. The field declaration order here matches the wire layout the
//! AgenticBilling consumer expects, and serde emits struct fields in
//! declaration order, so serialization must never go through an unordered
//! intermediate such as `serde_json::Value`.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// CloudEvents specification version emitted in every envelope.
pub const SPEC_VERSION: &str = "1.0";

/// CloudEvents `type` attribute for usage events.
pub const EVENT_TYPE: &str = "ai.agenticbilling.usage.v1";

/// Content type of the `data` payload.
pub const CONTENT_TYPE: &str = "application/json";

/// A CloudEvents v1.0 envelope carrying one usage payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageEvent {
    /// Unique event ID, generated at construction.
    pub id: String,

    /// CloudEvents spec version, always [`SPEC_VERSION`].
    pub specversion: String,

    /// Event type, always [`EVENT_TYPE`].
    #[serde(rename = "type")]
    pub event_type: String,

    /// Event source, derived from the provider name (`"<provider>/usage"`).
    pub source: String,

    /// Envelope timestamp (UTC).
    pub time: DateTime<Utc>,

    /// Payload content type, always [`CONTENT_TYPE`].
    pub datacontenttype: String,

    /// The billable payload.
    pub data: UsageData,
}

/// The billable payload of a usage event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageData {
    /// Unique usage record ID.
    pub id: String,

    /// Service that produced the usage (e.g. `"compute"`, `"ai.chat"`).
    pub service: String,

    /// Operation within the service (e.g. `"vm.runtime"`).
    pub operation: String,

    /// Identifier of the billed resource.
    pub resource_id: String,

    /// Start of the usage window (UTC). Must not be after `usage_end`.
    pub usage_start: DateTime<Utc>,

    /// End of the usage window (UTC).
    pub usage_end: DateTime<Utc>,

    /// Measurements taken during the window. At least one is required.
    pub meters: Vec<Meter>,

    /// Pricing dimensions. Omitted from the wire format when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<BTreeMap<String, String>>,

    /// Free-form tags. Omitted from the wire format when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<BTreeMap<String, String>>,

    /// Tenant being billed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<String>,

    /// User being billed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,

    /// Project the usage belongs to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
}

/// One quantifiable measurement within a usage event.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Meter {
    /// Meter identifier (e.g. `"chat.input_tokens"`).
    pub meter_id: String,

    /// Measured quantity. Sign is not restricted; credits and refunds
    /// are reported as negative quantities.
    pub quantity: f64,

    /// Unit of measurement (e.g. `"tokens"`, `"GB"`).
    pub unit: String,
}

impl UsageEvent {
    /// Wrap a payload in a fresh CloudEvents envelope.
    ///
    /// The envelope `time` is set to now; `id` is taken from the caller so
    /// that ID generation stays an injected capability.
    #[must_use]
    pub fn new(id: String, source: String, data: UsageData) -> Self {
        Self {
            id,
            specversion: SPEC_VERSION.to_string(),
            event_type: EVENT_TYPE.to_string(),
            source,
            time: Utc::now(),
            datacontenttype: CONTENT_TYPE.to_string(),
            data,
        }
    }

    /// Serialize the envelope as pretty-printed JSON in the wire field order.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails, which only happens when the
    /// payload contains a non-finite meter quantity.
    pub fn envelope_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl Meter {
    /// Construct a meter.
    #[must_use]
    pub fn new(meter_id: impl Into<String>, quantity: f64, unit: impl Into<String>) -> Self {
        Self {
            meter_id: meter_id.into(),
            quantity,
            unit: unit.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_event() -> UsageEvent {
        UsageEvent {
            id: "01TESTENVELOPE".to_string(),
            specversion: SPEC_VERSION.to_string(),
            event_type: EVENT_TYPE.to_string(),
            source: "AgenticBilling.AI/usage".to_string(),
            time: Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap(),
            datacontenttype: CONTENT_TYPE.to_string(),
            data: UsageData {
                id: "usage-01TESTDATA".to_string(),
                service: "ai.chat".to_string(),
                operation: "chat.completion".to_string(),
                resource_id: "/ai/models/gpt-4".to_string(),
                usage_start: Utc.with_ymd_and_hms(2025, 6, 1, 11, 59, 50).unwrap(),
                usage_end: Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap(),
                meters: vec![Meter::new("chat.input_tokens", 1500.0, "tokens")],
                dimensions: Some(
                    [("model".to_string(), "gpt-4".to_string())]
                        .into_iter()
                        .collect(),
                ),
                tags: None,
                tenant_id: Some("org/acme".to_string()),
                user_id: None,
                project_id: None,
            },
        }
    }

    #[test]
    fn envelope_field_order_matches_wire_layout() {
        let json = sample_event().envelope_json().unwrap();
        let positions: Vec<usize> = [
            "\"id\"",
            "\"specversion\"",
            "\"type\"",
            "\"source\"",
            "\"time\"",
            "\"datacontenttype\"",
            "\"data\"",
        ]
        .iter()
        .map(|field| json.find(field).unwrap())
        .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]), "{json}");
    }

    #[test]
    fn payload_field_order_matches_wire_layout() {
        let json = sample_event().envelope_json().unwrap();
        let service = json.find("\"service\"").unwrap();
        let operation = json.find("\"operation\"").unwrap();
        let resource = json.find("\"resourceId\"").unwrap();
        let start = json.find("\"usageStart\"").unwrap();
        let meters = json.find("\"meters\"").unwrap();
        let dimensions = json.find("\"dimensions\"").unwrap();
        let tenant = json.find("\"tenantId\"").unwrap();
        assert!(service < operation && operation < resource);
        assert!(resource < start && start < meters);
        assert!(meters < dimensions && dimensions < tenant);
    }

    #[test]
    fn unset_optional_fields_are_omitted() {
        let json = sample_event().envelope_json().unwrap();
        assert!(!json.contains("\"tags\""));
        assert!(!json.contains("\"userId\""));
        assert!(!json.contains("\"projectId\""));
        assert!(!json.contains("null"));
    }

    #[test]
    fn envelope_serialization_is_deterministic_and_reparses() {
        let event = sample_event();
        let first = event.envelope_json().unwrap();
        let second = event.envelope_json().unwrap();
        assert_eq!(first, second);

        let reparsed: UsageEvent = serde_json::from_str(&first).unwrap();
        assert_eq!(reparsed, event);
    }

    #[test]
    fn timestamps_serialize_with_utc_designator() {
        let json = sample_event().envelope_json().unwrap();
        assert!(json.contains("\"2025-06-01T12:00:00Z\""));
        assert!(!json.contains("+00:00"));
    }
}
