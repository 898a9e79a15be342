//! In-process [`RecordStore`] for tests and local runs.
//!
//! It speaks the same envelope as the hosted platform: ids are assigned on
//! create, `CreatedOn`/`ModifiedOn` system fields are maintained, batch
//! writes report per-record results, and `where`/`orderBy`/`pagingInfo` are
//! honoured. Failure switches let callers exercise every error tier.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;
use crm_api_types::{
    ApiResponse, DeleteParams, FetchParams, Operator, Payload, RecordResult, SortType,
    WhereClause, WriteParams,
};
use serde_json::Value;

use crate::entity::wire_timestamp;
use crate::store::{RecordStore, StoreError};
use crate::types::RecordId;

/// One call as received, for assertions on outgoing requests.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreCall {
    Fetch { collection: String, params: FetchParams },
    Get { collection: String, id: RecordId },
    Create { collection: String, params: WriteParams },
    Update { collection: String, params: WriteParams },
    Delete { collection: String, params: DeleteParams },
}

#[derive(Debug, Default)]
struct MemoryState {
    tables: HashMap<String, BTreeMap<i64, Payload>>,
    last_id: i64,
    outage: Option<String>,
    transport_down: bool,
    locked: HashSet<i64>,
    required: HashMap<String, Vec<(String, String)>>,
    calls: Vec<StoreCall>,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record directly, bypassing validation. Returns its new id.
    pub fn seed(&self, collection: &str, fields: Payload) -> RecordId {
        let mut state = self.lock();
        insert(&mut state, collection, fields)
    }

    /// Every call answers `success: false` with `message` until cleared.
    pub fn set_outage(&self, message: Option<&str>) {
        self.lock().outage = message.map(str::to_string);
    }

    /// Every call fails before producing an envelope.
    pub fn set_transport_failure(&self, down: bool) {
        self.lock().transport_down = down;
    }

    /// Updates and deletes of this record fail inside the batch.
    pub fn lock_record(&self, id: RecordId) {
        self.lock().locked.insert(id.get());
    }

    /// Creates in `collection` fail per record when `field` is missing/empty.
    pub fn require_field(&self, collection: &str, field: &str, label: &str) {
        self.lock()
            .required
            .entry(collection.to_string())
            .or_default()
            .push((field.to_string(), label.to_string()));
    }

    pub fn calls(&self) -> Vec<StoreCall> {
        self.lock().calls.clone()
    }

    /// Record bodies sent through create/update, oldest first.
    pub fn written_records(&self) -> Vec<Payload> {
        self.lock()
            .calls
            .iter()
            .filter_map(|call| match call {
                StoreCall::Create { params, .. } | StoreCall::Update { params, .. } => {
                    Some(params.records.clone())
                }
                _ => None,
            })
            .flatten()
            .collect()
    }

    pub fn record(&self, collection: &str, id: RecordId) -> Option<Payload> {
        self.lock()
            .tables
            .get(collection)
            .and_then(|table| table.get(&id.get()))
            .cloned()
    }

    pub fn count(&self, collection: &str) -> usize {
        self.lock().tables.get(collection).map_or(0, BTreeMap::len)
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Records the call and applies the failure switches.
    fn begin<T>(&self, call: StoreCall) -> Result<Option<ApiResponse<T>>, StoreError> {
        let mut state = self.lock();
        state.calls.push(call);
        if state.transport_down {
            return Err(StoreError::Transport("connection refused".into()));
        }
        Ok(state.outage.clone().map(ApiResponse::failure))
    }
}

fn insert(state: &mut MemoryState, collection: &str, mut fields: Payload) -> RecordId {
    state.last_id += 1;
    let id = state.last_id;
    let now = wire_timestamp(Utc::now());
    fields.insert("Id".into(), Value::from(id));
    fields.insert("CreatedOn".into(), Value::from(now.clone()));
    fields.insert("ModifiedOn".into(), Value::from(now));
    state
        .tables
        .entry(collection.to_string())
        .or_default()
        .insert(id, fields);
    RecordId::new(id)
}

fn project(record: &Payload, params: &FetchParams) -> Value {
    if params.fields.is_empty() {
        return Value::Object(record.clone());
    }
    let mut out = Payload::new();
    if let Some(id) = record.get("Id") {
        out.insert("Id".into(), id.clone());
    }
    for name in params.field_names() {
        if let Some(value) = record.get(name) {
            out.insert(name.to_string(), value.clone());
        }
    }
    Value::Object(out)
}

/// Lookup objects compare by their `Id`.
fn scalar(value: Option<&Value>) -> Option<&Value> {
    match value {
        Some(Value::Object(map)) => map.get("Id"),
        Some(Value::Null) | None => None,
        other => other,
    }
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn loosely_equal(actual: Option<&Value>, expected: &Value) -> bool {
    match (actual, expected) {
        (None, Value::Null) => true,
        (None, _) => false,
        (Some(a), b) => match (as_number(a), as_number(b)) {
            (Some(x), Some(y)) if a.is_number() || b.is_number() => x == y,
            _ => a == b,
        },
    }
}

fn compare(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(x), Some(y)) => match (as_number(x), as_number(y)) {
            (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
            _ => Ordering::Equal,
        },
    }
}

fn text(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.to_lowercase(),
        Some(other) => other.to_string().to_lowercase(),
        None => String::new(),
    }
}

fn matches(record: &Payload, clause: &WhereClause) -> bool {
    let actual = scalar(record.get(&clause.field_name));
    let first = clause.values.first();
    let hit = match clause.operator {
        Operator::EqualTo => clause.values.iter().any(|v| loosely_equal(actual, v)),
        Operator::NotEqualTo => !clause.values.iter().any(|v| loosely_equal(actual, v)),
        Operator::Contains => clause
            .values
            .iter()
            .any(|v| text(actual).contains(&text(Some(v)))),
        Operator::DoesNotContain => !clause
            .values
            .iter()
            .any(|v| text(actual).contains(&text(Some(v)))),
        Operator::StartsWith => clause
            .values
            .iter()
            .any(|v| text(actual).starts_with(&text(Some(v)))),
        Operator::GreaterThan => first.is_some_and(|v| compare(actual, Some(v)).is_gt()),
        Operator::GreaterThanOrEqualTo => first.is_some_and(|v| compare(actual, Some(v)).is_ge()),
        Operator::LessThan => {
            first.is_some_and(|v| actual.is_some() && compare(actual, Some(v)).is_lt())
        }
        Operator::LessThanOrEqualTo => {
            first.is_some_and(|v| actual.is_some() && compare(actual, Some(v)).is_le())
        }
        Operator::HasValue => actual.is_some_and(|v| v.as_str() != Some("")),
        Operator::DoesNotHaveValue => !actual.is_some_and(|v| v.as_str() != Some("")),
    };
    hit == clause.include
}

fn missing(record: &Payload, field: &str) -> bool {
    match record.get(field) {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.trim().is_empty(),
        _ => false,
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn fetch_records(
        &self,
        collection: &str,
        params: &FetchParams,
    ) -> Result<ApiResponse<Vec<Value>>, StoreError> {
        if let Some(failure) = self.begin(StoreCall::Fetch {
            collection: collection.to_string(),
            params: params.clone(),
        })? {
            return Ok(failure);
        }

        let state = self.lock();
        let mut rows: Vec<&Payload> = state
            .tables
            .get(collection)
            .map(|table| table.values().collect())
            .unwrap_or_default();
        rows.retain(|row| params.where_clauses.iter().all(|c| matches(row, c)));

        for order in params.order_by.iter().rev() {
            rows.sort_by(|a, b| {
                let ord = compare(
                    scalar(a.get(&order.field_name)),
                    scalar(b.get(&order.field_name)),
                )
                .then_with(|| compare(a.get("Id"), b.get("Id")));
                match order.sorttype {
                    SortType::Asc => ord,
                    SortType::Desc => ord.reverse(),
                }
            });
        }

        let (offset, limit) = params
            .paging_info
            .map(|p| (p.offset as usize, p.limit as usize))
            .unwrap_or((0, usize::MAX));
        let data = rows
            .into_iter()
            .skip(offset)
            .take(limit)
            .map(|row| project(row, params))
            .collect();
        Ok(ApiResponse::ok(data))
    }

    async fn get_record_by_id(
        &self,
        collection: &str,
        id: RecordId,
        params: &FetchParams,
    ) -> Result<ApiResponse<Value>, StoreError> {
        if let Some(failure) = self.begin(StoreCall::Get {
            collection: collection.to_string(),
            id,
        })? {
            return Ok(failure);
        }

        let state = self.lock();
        match state.tables.get(collection).and_then(|t| t.get(&id.get())) {
            Some(row) => Ok(ApiResponse::ok(project(row, params))),
            None => Ok(ApiResponse::failure(format!("Record with Id {id} not found"))),
        }
    }

    async fn create_record(
        &self,
        collection: &str,
        params: &WriteParams,
    ) -> Result<ApiResponse, StoreError> {
        if let Some(failure) = self.begin(StoreCall::Create {
            collection: collection.to_string(),
            params: params.clone(),
        })? {
            return Ok(failure);
        }

        let mut state = self.lock();
        let required = state.required.get(collection).cloned().unwrap_or_default();
        let mut results = Vec::with_capacity(params.records.len());
        for record in &params.records {
            let absent: Vec<&(String, String)> = required
                .iter()
                .filter(|(field, _)| missing(record, field))
                .collect();
            if !absent.is_empty() {
                let mut result = RecordResult::failed("Validation failed");
                for (_, label) in absent {
                    result = result.with_error(label.clone(), "is required");
                }
                results.push(result);
                continue;
            }
            let mut fields = record.clone();
            fields.remove("Id");
            let id = insert(&mut state, collection, fields);
            let stored = state.tables[collection][&id.get()].clone();
            results.push(RecordResult::ok(Value::Object(stored)));
        }
        Ok(ApiResponse::batch(results))
    }

    async fn update_record(
        &self,
        collection: &str,
        params: &WriteParams,
    ) -> Result<ApiResponse, StoreError> {
        if let Some(failure) = self.begin(StoreCall::Update {
            collection: collection.to_string(),
            params: params.clone(),
        })? {
            return Ok(failure);
        }

        let mut state = self.lock();
        let mut results = Vec::with_capacity(params.records.len());
        for record in &params.records {
            let Some(id) = record.get("Id").and_then(Value::as_i64) else {
                results.push(RecordResult::failed("Id is required for updates"));
                continue;
            };
            if state.locked.contains(&id) {
                results.push(RecordResult::failed(format!("Record {id} is locked")));
                continue;
            }
            let Some(row) = state
                .tables
                .get_mut(collection)
                .and_then(|table| table.get_mut(&id))
            else {
                results.push(RecordResult::failed(format!("Record {id} not found")));
                continue;
            };
            for (key, value) in record {
                if key != "Id" {
                    row.insert(key.clone(), value.clone());
                }
            }
            row.insert("ModifiedOn".into(), Value::from(wire_timestamp(Utc::now())));
            results.push(RecordResult::ok(Value::Object(row.clone())));
        }
        Ok(ApiResponse::batch(results))
    }

    async fn delete_record(
        &self,
        collection: &str,
        params: &DeleteParams,
    ) -> Result<ApiResponse, StoreError> {
        if let Some(failure) = self.begin(StoreCall::Delete {
            collection: collection.to_string(),
            params: params.clone(),
        })? {
            return Ok(failure);
        }

        let mut state = self.lock();
        let mut results = Vec::with_capacity(params.record_ids.len());
        for &id in &params.record_ids {
            if state.locked.contains(&id) {
                results.push(RecordResult::failed(format!("Record {id} is locked")));
                continue;
            }
            let removed = state
                .tables
                .get_mut(collection)
                .and_then(|table| table.remove(&id));
            results.push(match removed {
                Some(_) => RecordResult {
                    success: true,
                    data: None,
                    errors: Vec::new(),
                    message: None,
                },
                None => RecordResult::failed(format!("Record {id} not found")),
            });
        }
        Ok(ApiResponse::batch(results))
    }
}
