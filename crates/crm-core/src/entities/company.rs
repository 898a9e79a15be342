use chrono::{DateTime, Utc};
use crm_api_types::Payload;
use serde::{Deserialize, Serialize};

use crate::entity::{non_empty, Entity, PayloadBuilder};
use crate::lenient;
use crate::types::{RecordId, RecordRef};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Company {
    #[serde(rename = "Id")]
    pub id: RecordId,
    #[serde(rename = "Name", default, deserialize_with = "lenient::text")]
    pub name: String,
    #[serde(rename = "Tags", default, deserialize_with = "lenient::text")]
    pub tags: String,
    #[serde(rename = "Owner", default, deserialize_with = "lenient::record_ref")]
    pub owner: Option<RecordRef>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub industry: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub website: String,
    #[serde(default, deserialize_with = "lenient::whole_number")]
    pub employee_count: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CompanyDraft {
    #[serde(rename = "Name")]
    pub name: Option<String>,
    #[serde(rename = "Tags")]
    pub tags: Option<String>,
    #[serde(rename = "Owner")]
    pub owner: Option<RecordId>,
    pub industry: Option<String>,
    pub website: Option<String>,
    pub employee_count: Option<i64>,
}

impl Entity for Company {
    type Draft = CompanyDraft;

    const COLLECTION: &'static str = "company";
    const LABEL: &'static str = "Company";
    const PLURAL: &'static str = "companies";
    const FIELDS: &'static [&'static str] =
        &["Name", "Tags", "Owner", "industry", "website", "employeeCount"];

    fn id(&self) -> RecordId {
        self.id
    }

    fn create_payload(draft: &CompanyDraft, _now: DateTime<Utc>) -> Payload {
        PayloadBuilder::new()
            .set_opt("Name", non_empty(&draft.name))
            .set_or("Tags", draft.tags.clone(), String::new())
            .set_opt("Owner", draft.owner)
            .set_or("industry", draft.industry.clone(), String::new())
            .set_or("website", draft.website.clone(), String::new())
            .set_or("employeeCount", draft.employee_count, 0)
            .build()
    }

    fn update_payload(draft: &CompanyDraft, _now: DateTime<Utc>) -> Payload {
        PayloadBuilder::new()
            .set_opt("Name", non_empty(&draft.name))
            .set_opt("Tags", draft.tags.clone())
            .set_opt("Owner", draft.owner)
            .set_opt("industry", draft.industry.clone())
            .set_opt("website", draft.website.clone())
            .set_opt("employeeCount", draft.employee_count)
            .build()
    }
}
