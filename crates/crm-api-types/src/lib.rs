//! Wire types for the remote collection API.
//!
//! The request and response shapes are owned by the hosting platform, so the
//! JSON field names here (`FieldName`, `orderBy`, `RecordIds`, ...) are kept
//! exactly as the platform spells them. Every crate that talks to a record
//! collection goes through these types.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A writable record body: field name to JSON value.
pub type Payload = Map<String, Value>;

// ── Query side ──

/// `{ "field": { "Name": "email" } }`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSelection {
    pub field: FieldName,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldName {
    #[serde(rename = "Name")]
    pub name: String,
}

impl FieldSelection {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            field: FieldName { name: name.into() },
        }
    }
}

/// Filter operators understood by the collection API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operator {
    EqualTo,
    NotEqualTo,
    Contains,
    DoesNotContain,
    StartsWith,
    GreaterThan,
    GreaterThanOrEqualTo,
    LessThan,
    LessThanOrEqualTo,
    HasValue,
    DoesNotHaveValue,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WhereClause {
    #[serde(rename = "FieldName")]
    pub field_name: String,
    #[serde(rename = "Operator")]
    pub operator: Operator,
    #[serde(rename = "Values", default)]
    pub values: Vec<Value>,
    #[serde(rename = "Include", default = "default_include")]
    pub include: bool,
}

fn default_include() -> bool {
    true
}

impl WhereClause {
    /// `field == value`, the only shape the CRM pages issue themselves.
    pub fn equal_to(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            field_name: field.into(),
            operator: Operator::EqualTo,
            values: vec![value.into()],
            include: true,
        }
    }

    pub fn new(field: impl Into<String>, operator: Operator, values: Vec<Value>) -> Self {
        Self {
            field_name: field.into(),
            operator,
            values,
            include: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortType {
    #[serde(rename = "ASC")]
    Asc,
    #[serde(rename = "DESC")]
    Desc,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderBy {
    #[serde(rename = "fieldName")]
    pub field_name: String,
    pub sorttype: SortType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PagingInfo {
    pub limit: u32,
    pub offset: u32,
}

/// Body of `fetchRecords` / `getRecordById`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FetchParams {
    #[serde(default)]
    pub fields: Vec<FieldSelection>,
    #[serde(rename = "where", default, skip_serializing_if = "Vec::is_empty")]
    pub where_clauses: Vec<WhereClause>,
    #[serde(rename = "orderBy", default, skip_serializing_if = "Vec::is_empty")]
    pub order_by: Vec<OrderBy>,
    #[serde(rename = "pagingInfo", default, skip_serializing_if = "Option::is_none")]
    pub paging_info: Option<PagingInfo>,
}

impl FetchParams {
    /// Start a query selecting the given fields.
    pub fn select(fields: &[&str]) -> Self {
        Self {
            fields: fields.iter().map(|f| FieldSelection::new(*f)).collect(),
            ..Self::default()
        }
    }

    pub fn filter(mut self, clause: WhereClause) -> Self {
        self.where_clauses.push(clause);
        self
    }

    pub fn order_by(mut self, field: impl Into<String>, sorttype: SortType) -> Self {
        self.order_by.push(OrderBy {
            field_name: field.into(),
            sorttype,
        });
        self
    }

    pub fn paging(mut self, limit: u32, offset: u32) -> Self {
        self.paging_info = Some(PagingInfo { limit, offset });
        self
    }

    /// Names of the selected fields, in request order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.field.name.as_str())
    }
}

// ── Write side ──

/// Body of `createRecord` / `updateRecord`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WriteParams {
    pub records: Vec<Payload>,
}

impl WriteParams {
    pub fn single(record: Payload) -> Self {
        Self {
            records: vec![record],
        }
    }
}

/// Body of `deleteRecord`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DeleteParams {
    #[serde(rename = "RecordIds")]
    pub record_ids: Vec<i64>,
}

// ── Responses ──

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    #[serde(rename = "fieldLabel", default)]
    pub field_label: String,
    #[serde(default)]
    pub message: String,
}

/// One entry of a batch write result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordResult {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<FieldError>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl RecordResult {
    pub fn ok(data: Value) -> Self {
        Self {
            success: true,
            data: Some(data),
            errors: Vec::new(),
            message: None,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            errors: Vec::new(),
            message: Some(message.into()),
        }
    }

    pub fn with_error(mut self, field_label: impl Into<String>, message: impl Into<String>) -> Self {
        self.errors.push(FieldError {
            field_label: field_label.into(),
            message: message.into(),
        });
        self
    }
}

/// The platform's response envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse<T = Value> {
    pub success: bool,
    #[serde(default = "Option::default", skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub results: Option<Vec<RecordResult>>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            results: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message.into()),
            results: None,
        }
    }

    /// A successful envelope carrying per-record results.
    pub fn batch(results: Vec<RecordResult>) -> Self {
        Self {
            success: true,
            data: None,
            message: None,
            results: Some(results),
        }
    }

    /// Server message, or a generic one when the platform omitted it.
    pub fn message_or_default(&self) -> &str {
        self.message.as_deref().unwrap_or("Request failed")
    }
}
