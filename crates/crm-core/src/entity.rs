//! The record shape contract shared by every collection.
//!
//! An [`Entity`] names its remote collection, the fields it reads back, and
//! how a typed draft turns into the writable payload for create and update.
//! [`RecordAdapter`](crate::adapter::RecordAdapter) is generic over it.

use chrono::{DateTime, SecondsFormat, Utc};
use crm_api_types::Payload;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::types::RecordId;

pub trait Entity: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Typed input for create and update. `None` fields mean "not provided".
    type Draft: Send + Sync;

    /// Remote collection (table) name.
    const COLLECTION: &'static str;
    /// Singular label used in notifications, e.g. "Contact".
    const LABEL: &'static str;
    /// Plural, lower-case label, e.g. "contacts".
    const PLURAL: &'static str;
    /// Fields requested on every read.
    const FIELDS: &'static [&'static str];
    /// Sort key for listings (always descending).
    const ORDER_FIELD: &'static str = "CreatedOn";

    fn id(&self) -> RecordId;

    /// Writable fields for a new record, defaults applied.
    fn create_payload(draft: &Self::Draft, now: DateTime<Utc>) -> Payload;

    /// Writable fields for an update. The adapter adds `Id`.
    fn update_payload(draft: &Self::Draft, now: DateTime<Utc>) -> Payload;
}

/// Timestamps go over the wire as RFC 3339 with millisecond precision.
pub fn wire_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Builds an outgoing record body.
///
/// `set_opt` is the update primitive: a `None` leaves the field out entirely,
/// while `Some(0)`, `Some("")` or `Some(false)` are written as given.
#[derive(Debug, Default, Clone)]
pub struct PayloadBuilder {
    fields: Payload,
}

impl PayloadBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.fields.insert(key.to_string(), value.into());
        self
    }

    pub fn set_opt<V: Into<Value>>(self, key: &str, value: Option<V>) -> Self {
        match value {
            Some(value) => self.set(key, value),
            None => self,
        }
    }

    pub fn set_or<V: Into<Value>>(self, key: &str, value: Option<V>, default: V) -> Self {
        self.set(key, value.unwrap_or(default))
    }

    /// A reference column on create: the id, or an explicit `null`.
    pub fn set_ref(self, key: &str, id: Option<RecordId>) -> Self {
        let value = id.map(Value::from).unwrap_or(Value::Null);
        self.set(key, value)
    }

    pub fn set_timestamp(self, key: &str, at: DateTime<Utc>) -> Self {
        self.set(key, wire_timestamp(at))
    }

    pub fn build(self) -> Payload {
        self.fields
    }
}

/// Non-empty strings, for fields where the forms treat "" as "not given".
pub(crate) fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.trim().is_empty())
}
