use chrono::{DateTime, Utc};
use crm_api_types::Payload;
use serde::{Deserialize, Serialize};

use crate::entity::{non_empty, Entity, PayloadBuilder};
use crate::lenient;
use crate::types::{LifecycleStage, RecordId, RecordRef};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    #[serde(rename = "Id")]
    pub id: RecordId,
    #[serde(rename = "Name", default, deserialize_with = "lenient::text")]
    pub name: String,
    #[serde(rename = "Tags", default, deserialize_with = "lenient::text")]
    pub tags: String,
    #[serde(rename = "Owner", default, deserialize_with = "lenient::record_ref")]
    pub owner: Option<RecordRef>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub first_name: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub last_name: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub email: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub phone: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub lifecycle_stage: String,
    #[serde(default, deserialize_with = "lenient::timestamp")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient::timestamp")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub notes: String,
    #[serde(default, deserialize_with = "lenient::record_ref")]
    pub company_id: Option<RecordRef>,
}

impl Contact {
    pub fn full_name(&self) -> String {
        join_name(&self.first_name, &self.last_name)
    }

    pub fn stage(&self) -> Option<LifecycleStage> {
        self.lifecycle_stage.parse().ok()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ContactDraft {
    #[serde(rename = "Name")]
    pub name: Option<String>,
    #[serde(rename = "Tags")]
    pub tags: Option<String>,
    #[serde(rename = "Owner")]
    pub owner: Option<RecordId>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub lifecycle_stage: Option<String>,
    pub notes: Option<String>,
    pub company_id: Option<RecordId>,
}

impl ContactDraft {
    /// Explicit name, else the first and last name that were given.
    fn derived_name(&self) -> Option<String> {
        if let Some(name) = non_empty(&self.name) {
            return Some(name.to_string());
        }
        if self.first_name.is_none() && self.last_name.is_none() {
            return None;
        }
        Some(join_name(
            self.first_name.as_deref().unwrap_or_default(),
            self.last_name.as_deref().unwrap_or_default(),
        ))
    }
}

fn join_name(first: &str, last: &str) -> String {
    [first.trim(), last.trim()]
        .into_iter()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

impl Entity for Contact {
    type Draft = ContactDraft;

    const COLLECTION: &'static str = "app_contact";
    const LABEL: &'static str = "Contact";
    const PLURAL: &'static str = "contacts";
    const FIELDS: &'static [&'static str] = &[
        "Name",
        "Tags",
        "Owner",
        "firstName",
        "lastName",
        "email",
        "phone",
        "lifecycleStage",
        "createdAt",
        "updatedAt",
        "notes",
        "companyId",
    ];

    fn id(&self) -> RecordId {
        self.id
    }

    fn create_payload(draft: &ContactDraft, now: DateTime<Utc>) -> Payload {
        let stage = non_empty(&draft.lifecycle_stage)
            .unwrap_or(LifecycleStage::default().as_str())
            .to_string();
        PayloadBuilder::new()
            .set("Name", draft.derived_name().unwrap_or_default())
            .set_or("Tags", draft.tags.clone(), String::new())
            .set_opt("Owner", draft.owner)
            .set_opt("firstName", draft.first_name.clone())
            .set_opt("lastName", draft.last_name.clone())
            .set_opt("email", draft.email.clone())
            .set_or("phone", draft.phone.clone(), String::new())
            .set("lifecycleStage", stage)
            .set_timestamp("createdAt", now)
            .set_timestamp("updatedAt", now)
            .set_or("notes", draft.notes.clone(), String::new())
            .set_ref("companyId", draft.company_id)
            .build()
    }

    fn update_payload(draft: &ContactDraft, now: DateTime<Utc>) -> Payload {
        PayloadBuilder::new()
            .set_opt("Name", draft.derived_name())
            .set_opt("Tags", draft.tags.clone())
            .set_opt("Owner", draft.owner)
            .set_opt("firstName", draft.first_name.clone())
            .set_opt("lastName", draft.last_name.clone())
            .set_opt("email", draft.email.clone())
            .set_opt("phone", draft.phone.clone())
            .set_opt("lifecycleStage", draft.lifecycle_stage.clone())
            .set_timestamp("updatedAt", now)
            .set_opt("notes", draft.notes.clone())
            .set_opt("companyId", draft.company_id)
            .build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn create_applies_defaults() {
        let draft = ContactDraft {
            first_name: Some("Ada".into()),
            last_name: Some("Lovelace".into()),
            email: Some("ada@example.com".into()),
            ..ContactDraft::default()
        };
        let payload = Contact::create_payload(&draft, Utc::now());

        assert_eq!(payload["Name"], json!("Ada Lovelace"));
        assert_eq!(payload["lifecycleStage"], json!("Lead"));
        assert_eq!(payload["Tags"], json!(""));
        assert_eq!(payload["phone"], json!(""));
        assert_eq!(payload["companyId"], serde_json::Value::Null);
        assert!(payload.contains_key("createdAt"));
        assert!(!payload.contains_key("Owner"));
        assert!(!payload.contains_key("Id"));
    }

    #[test]
    fn empty_lifecycle_stage_falls_back_to_lead() {
        let draft = ContactDraft {
            name: Some("Grace".into()),
            lifecycle_stage: Some(String::new()),
            ..ContactDraft::default()
        };
        let payload = Contact::create_payload(&draft, Utc::now());
        assert_eq!(payload["Name"], json!("Grace"));
        assert_eq!(payload["lifecycleStage"], json!("Lead"));
    }

    #[test]
    fn update_only_sends_provided_fields() {
        let draft = ContactDraft {
            phone: Some(String::new()),
            ..ContactDraft::default()
        };
        let payload = Contact::update_payload(&draft, Utc::now());
        let mut keys: Vec<_> = payload.keys().cloned().collect();
        keys.sort();
        assert_eq!(keys, vec!["phone", "updatedAt"]);
        assert_eq!(payload["phone"], json!(""));
    }

    #[test]
    fn decodes_lookup_company_and_null_text() {
        let contact: Contact = serde_json::from_value(json!({
            "Id": 3,
            "Name": "Ada Lovelace",
            "firstName": "Ada",
            "lastName": "Lovelace",
            "phone": null,
            "companyId": { "Id": 9, "Name": "Analytical Engines" }
        }))
        .unwrap();
        assert_eq!(contact.id, RecordId::new(3));
        assert_eq!(contact.phone, "");
        assert_eq!(contact.full_name(), "Ada Lovelace");
        assert_eq!(contact.company_id.unwrap().name(), Some("Analytical Engines"));
    }
}
