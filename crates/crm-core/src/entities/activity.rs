use chrono::{DateTime, Utc};
use crm_api_types::Payload;
use serde::{Deserialize, Serialize};

use crate::entity::{non_empty, Entity, PayloadBuilder};
use crate::lenient;
use crate::types::{RecordId, RecordRef};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    #[serde(rename = "Id")]
    pub id: RecordId,
    #[serde(rename = "Name", default, deserialize_with = "lenient::text")]
    pub name: String,
    #[serde(rename = "Tags", default, deserialize_with = "lenient::text")]
    pub tags: String,
    #[serde(rename = "Owner", default, deserialize_with = "lenient::record_ref")]
    pub owner: Option<RecordRef>,
    #[serde(default, deserialize_with = "lenient::record_ref")]
    pub contact_id: Option<RecordRef>,
    #[serde(default, deserialize_with = "lenient::record_ref")]
    pub deal_id: Option<RecordRef>,
    #[serde(rename = "type", default, deserialize_with = "lenient::text")]
    pub kind: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub description: String,
    #[serde(default, deserialize_with = "lenient::timestamp")]
    pub timestamp: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ActivityDraft {
    #[serde(rename = "Name")]
    pub name: Option<String>,
    #[serde(rename = "Tags")]
    pub tags: Option<String>,
    #[serde(rename = "Owner")]
    pub owner: Option<RecordId>,
    pub contact_id: Option<RecordId>,
    pub deal_id: Option<RecordId>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub description: Option<String>,
    pub timestamp: Option<DateTime<Utc>>,
}

impl ActivityDraft {
    fn derived_name(&self) -> Option<&str> {
        non_empty(&self.name).or_else(|| non_empty(&self.kind))
    }
}

impl Entity for Activity {
    type Draft = ActivityDraft;

    const COLLECTION: &'static str = "app_Activity";
    const LABEL: &'static str = "Activity";
    const PLURAL: &'static str = "activities";
    const FIELDS: &'static [&'static str] = &[
        "Name",
        "Tags",
        "Owner",
        "contactId",
        "dealId",
        "type",
        "description",
        "timestamp",
    ];
    const ORDER_FIELD: &'static str = "timestamp";

    fn id(&self) -> RecordId {
        self.id
    }

    fn create_payload(draft: &ActivityDraft, now: DateTime<Utc>) -> Payload {
        PayloadBuilder::new()
            .set("Name", draft.derived_name().unwrap_or("Activity"))
            .set_or("Tags", draft.tags.clone(), String::new())
            .set_opt("Owner", draft.owner)
            .set_ref("contactId", draft.contact_id)
            .set_ref("dealId", draft.deal_id)
            .set_or("type", draft.kind.clone(), String::new())
            .set_or("description", draft.description.clone(), String::new())
            .set_timestamp("timestamp", draft.timestamp.unwrap_or(now))
            .build()
    }

    fn update_payload(draft: &ActivityDraft, _now: DateTime<Utc>) -> Payload {
        let builder = PayloadBuilder::new()
            .set_opt("Name", draft.derived_name())
            .set_opt("Tags", draft.tags.clone())
            .set_opt("Owner", draft.owner)
            .set_opt("contactId", draft.contact_id)
            .set_opt("dealId", draft.deal_id)
            .set_opt("type", draft.kind.clone())
            .set_opt("description", draft.description.clone());
        let builder = match draft.timestamp {
            Some(at) => builder.set_timestamp("timestamp", at),
            None => builder,
        };
        builder.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn create_names_activity_after_its_type() {
        let now = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        let draft = ActivityDraft {
            kind: Some("Call".into()),
            contact_id: Some(RecordId::new(8)),
            ..ActivityDraft::default()
        };
        let payload = Activity::create_payload(&draft, now);
        assert_eq!(payload["Name"], json!("Call"));
        assert_eq!(payload["contactId"], json!(8));
        assert_eq!(payload["dealId"], serde_json::Value::Null);
        assert_eq!(payload["timestamp"], json!("2024-01-02T03:04:05.000Z"));
    }

    #[test]
    fn create_without_name_or_type_is_generic() {
        let payload = Activity::create_payload(&ActivityDraft::default(), Utc::now());
        assert_eq!(payload["Name"], json!("Activity"));
        assert_eq!(payload["type"], json!(""));
    }

    #[test]
    fn update_leaves_timestamp_alone_unless_given() {
        let draft = ActivityDraft {
            description: Some("Follow-up sent".into()),
            ..ActivityDraft::default()
        };
        let payload = Activity::update_payload(&draft, Utc::now());
        assert!(!payload.contains_key("timestamp"));
        assert_eq!(payload["description"], json!("Follow-up sent"));
    }
}
