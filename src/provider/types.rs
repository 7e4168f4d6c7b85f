//! Wire types of the mailing-list provider API.
//! Only the fields this service reads are modelled, everything else is ignored.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Attribute holding the experiment variant a subscriber signed up through.
pub const VARIANT_FIELD: &str = "ad_variant";

/// A single page of the group subscriber listing.
#[derive(Debug, Deserialize)]
pub struct SubscriberPage {
    #[serde(default)]
    pub data: Vec<Subscriber>,
    #[serde(default)]
    pub meta: Option<PageMeta>,
}

#[derive(Debug, Deserialize)]
pub struct PageMeta {
    #[serde(default)]
    pub next_cursor: Option<String>,
}

impl SubscriberPage {
    /// The continuation cursor, blank cursors end the listing as well.
    pub fn next_cursor(&self) -> Option<&str> {
        self.meta
            .as_ref()
            .and_then(|meta| meta.next_cursor.as_deref())
            .filter(|cursor| !cursor.is_empty())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Subscriber {
    #[serde(default)]
    pub fields: Option<HashMap<String, Value>>,
    #[serde(default)]
    pub opened_count: Option<u64>,
    #[serde(default)]
    pub clicked_count: Option<u64>,
    #[serde(default)]
    pub sent_count: Option<u64>,
}

impl Subscriber {
    /// The variant label, `None` when the attribute is missing, null or empty.
    pub fn variant(&self) -> Option<&str> {
        self.fields
            .as_ref()
            .and_then(|fields| fields.get(VARIANT_FIELD))
            .and_then(Value::as_str)
            .filter(|variant| !variant.is_empty())
    }
    pub fn has_opened(&self) -> bool {
        self.opened_count.unwrap_or(0) > 0
    }
    pub fn has_clicked(&self) -> bool {
        self.clicked_count.unwrap_or(0) > 0
    }
    pub fn was_sent(&self) -> bool {
        self.sent_count.unwrap_or(0) > 0
    }
}

/// Automation metadata, every field is optional on the wire.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Automation {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub enabled: Option<bool>,
    #[serde(default)]
    pub broken: Option<bool>,
    #[serde(default)]
    pub emails_count: Option<u64>,
    #[serde(default)]
    pub stats: Option<Map<String, Value>>,
}

impl Automation {
    /// Reads the automation out of a raw provider payload,
    /// unwrapping the `data` envelope when there is one.
    pub fn from_payload(payload: Value) -> serde_json::Result<Self> {
        serde_json::from_value(unwrap_envelope(payload))
    }

    /// A numeric counter from the nested stats object, zero when missing.
    pub fn stat(&self, key: &str) -> u64 {
        self.stats
            .as_ref()
            .and_then(|stats| stats.get(key))
            .and_then(Value::as_u64)
            .unwrap_or(0)
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled == Some(true)
    }
    pub fn is_broken(&self) -> bool {
        self.broken == Some(true)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Group {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub active_count: Option<u64>,
}

impl Group {
    pub fn from_payload(payload: Value) -> serde_json::Result<Self> {
        serde_json::from_value(unwrap_envelope(payload))
    }
}

/// Request body for creating a subscriber.
#[derive(Debug, Serialize)]
pub struct NewSubscriber<'a> {
    pub email: &'a str,
    pub groups: [&'a str; 1],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<HashMap<&'static str, &'a str>>,
}

impl<'a> NewSubscriber<'a> {
    pub fn new(email: &'a str, group_id: &'a str, variant: Option<&'a str>) -> Self {
        NewSubscriber {
            email,
            groups: [group_id],
            fields: variant.map(|variant| HashMap::from([(VARIANT_FIELD, variant)])),
        }
    }
}

/// Error body returned by the provider on rejected requests.
#[derive(Debug, Default, Deserialize)]
pub struct ProviderMessage {
    #[serde(default)]
    pub message: Option<String>,
}

/// Returns the value under `data` if the payload carries a non-null one, else the payload itself.
pub fn unwrap_envelope(mut payload: Value) -> Value {
    match payload.get_mut("data").map(Value::take) {
        Some(data) if !data.is_null() => data,
        _ => payload,
    }
}
