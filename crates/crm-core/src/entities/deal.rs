use chrono::{DateTime, NaiveDate, Utc};
use crm_api_types::Payload;
use serde::{Deserialize, Serialize};

use crate::entity::{non_empty, Entity, PayloadBuilder};
use crate::lenient;
use crate::types::{DealStage, RecordId, RecordRef};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deal {
    #[serde(rename = "Id")]
    pub id: RecordId,
    #[serde(rename = "Name", default, deserialize_with = "lenient::text")]
    pub name: String,
    #[serde(rename = "Tags", default, deserialize_with = "lenient::text")]
    pub tags: String,
    #[serde(rename = "Owner", default, deserialize_with = "lenient::record_ref")]
    pub owner: Option<RecordRef>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub value: f64,
    #[serde(default, deserialize_with = "lenient::whole_number")]
    pub probability: i64,
    #[serde(default, deserialize_with = "lenient::text")]
    pub stage: String,
    #[serde(default, deserialize_with = "lenient::date")]
    pub expected_close_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "lenient::timestamp")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient::timestamp")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub description: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub notes: String,
    #[serde(default, deserialize_with = "lenient::record_ref")]
    pub contact_id: Option<RecordRef>,
    #[serde(default, deserialize_with = "lenient::record_ref")]
    pub company_id: Option<RecordRef>,
}

impl Deal {
    pub fn pipeline_stage(&self) -> Option<DealStage> {
        self.stage.parse().ok()
    }

    /// Deal value scaled by its win probability (percent).
    pub fn weighted_value(&self) -> f64 {
        self.value * (self.probability.clamp(0, 100) as f64) / 100.0
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DealDraft {
    #[serde(rename = "Name")]
    pub name: Option<String>,
    #[serde(rename = "Tags")]
    pub tags: Option<String>,
    #[serde(rename = "Owner")]
    pub owner: Option<RecordId>,
    pub value: Option<f64>,
    pub probability: Option<i64>,
    pub stage: Option<String>,
    pub expected_close_date: Option<NaiveDate>,
    pub description: Option<String>,
    pub notes: Option<String>,
    pub contact_id: Option<RecordId>,
    pub company_id: Option<RecordId>,
}

impl Entity for Deal {
    type Draft = DealDraft;

    const COLLECTION: &'static str = "deal";
    const LABEL: &'static str = "Deal";
    const PLURAL: &'static str = "deals";
    const FIELDS: &'static [&'static str] = &[
        "Name",
        "Tags",
        "Owner",
        "value",
        "probability",
        "stage",
        "expectedCloseDate",
        "createdAt",
        "updatedAt",
        "description",
        "notes",
        "contactId",
        "companyId",
    ];

    fn id(&self) -> RecordId {
        self.id
    }

    fn create_payload(draft: &DealDraft, now: DateTime<Utc>) -> Payload {
        let stage = non_empty(&draft.stage)
            .unwrap_or(DealStage::default().as_str())
            .to_string();
        PayloadBuilder::new()
            .set_opt("Name", non_empty(&draft.name))
            .set_or("Tags", draft.tags.clone(), String::new())
            .set_opt("Owner", draft.owner)
            .set_or("value", draft.value, 0.0)
            .set_or("probability", draft.probability, 0)
            .set("stage", stage)
            .set_opt("expectedCloseDate", draft.expected_close_date.map(|d| d.to_string()))
            .set_timestamp("createdAt", now)
            .set_timestamp("updatedAt", now)
            .set_or("description", draft.description.clone(), String::new())
            .set_or("notes", draft.notes.clone(), String::new())
            .set_ref("contactId", draft.contact_id)
            .set_ref("companyId", draft.company_id)
            .build()
    }

    fn update_payload(draft: &DealDraft, now: DateTime<Utc>) -> Payload {
        PayloadBuilder::new()
            .set_opt("Name", non_empty(&draft.name))
            .set_opt("Tags", draft.tags.clone())
            .set_opt("Owner", draft.owner)
            .set_opt("value", draft.value)
            .set_opt("probability", draft.probability)
            .set_opt("stage", draft.stage.clone())
            .set_opt("expectedCloseDate", draft.expected_close_date.map(|d| d.to_string()))
            .set_timestamp("updatedAt", now)
            .set_opt("description", draft.description.clone())
            .set_opt("notes", draft.notes.clone())
            .set_opt("contactId", draft.contact_id)
            .set_opt("companyId", draft.company_id)
            .build()
    }
}
