//! Generic record adapter.
//!
//! One [`RecordAdapter`] per entity type translates typed drafts and ids into
//! collection API calls and turns every envelope back into a plain value.
//! No operation here returns `Result`: failures are logged, surfaced through
//! the [`Notifier`], and collapse to an empty sentinel (`Vec::new()`, `None`,
//! `false`).

mod activities;
mod contacts;
mod deals;

use std::marker::PhantomData;
use std::sync::Arc;

use chrono::Utc;
use crm_api_types::{
    ApiResponse, DeleteParams, FetchParams, Payload, RecordResult, SortType, WhereClause, WriteParams,
};
use serde_json::Value;

use crate::config::RecordsConfig;
use crate::entities::{Activity, Company, Contact, Deal};
use crate::entity::Entity;
use crate::notify::Notifier;
use crate::store::{RecordStore, StoreError};
use crate::types::RecordId;

pub type ContactAdapter = RecordAdapter<Contact>;
pub type CompanyAdapter = RecordAdapter<Company>;
pub type DealAdapter = RecordAdapter<Deal>;
pub type ActivityAdapter = RecordAdapter<Activity>;

pub const DEFAULT_PAGE_SIZE: u32 = 100;

/// Which write is being reported; drives log text and success toasts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WriteKind {
    Create,
    Update,
    Delete,
}

impl WriteKind {
    fn verb(self) -> &'static str {
        match self {
            WriteKind::Create => "create",
            WriteKind::Update => "update",
            WriteKind::Delete => "delete",
        }
    }

    fn past_tense(self) -> &'static str {
        match self {
            WriteKind::Create => "created",
            WriteKind::Update => "updated",
            WriteKind::Delete => "deleted",
        }
    }
}

pub struct RecordAdapter<E: Entity> {
    store: Arc<dyn RecordStore>,
    notifier: Arc<dyn Notifier>,
    page_size: u32,
    _entity: PhantomData<fn() -> E>,
}

impl<E: Entity> Clone for RecordAdapter<E> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            notifier: Arc::clone(&self.notifier),
            page_size: self.page_size,
            _entity: PhantomData,
        }
    }
}

impl<E: Entity> RecordAdapter<E> {
    pub fn new(store: Arc<dyn RecordStore>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            store,
            notifier,
            page_size: DEFAULT_PAGE_SIZE,
            _entity: PhantomData,
        }
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn collection(&self) -> &'static str {
        E::COLLECTION
    }

    /// First page of records, newest first, optionally filtered.
    pub async fn list(&self, filter: Option<WhereClause>) -> Vec<E> {
        let mut params = Self::listing().paging(self.page_size, 0);
        if let Some(clause) = filter {
            params = params.filter(clause);
        }
        self.fetch(&params, true).await
    }

    /// Unpaged filtered query. Failures are logged but not shown to the user.
    pub async fn find_where(&self, filter: WhereClause) -> Vec<E> {
        let params = Self::listing().filter(filter);
        self.fetch(&params, false).await
    }

    pub async fn get_by_id(&self, id: RecordId) -> Option<E> {
        let params = FetchParams::select(E::FIELDS);
        match self.store.get_record_by_id(E::COLLECTION, id, &params).await {
            Ok(resp) if resp.success => resp.data.and_then(|raw| decode::<E>(raw)),
            Ok(resp) => {
                self.report_failure(&resp, true);
                None
            }
            Err(e) => {
                tracing::error!(collection = E::COLLECTION, %id, error = %e, "get failed");
                None
            }
        }
    }

    pub async fn create(&self, draft: &E::Draft) -> Option<E> {
        let payload = E::create_payload(draft, Utc::now());
        let resp = self
            .store
            .create_record(E::COLLECTION, &WriteParams::single(payload))
            .await;
        let saved = self.settle_batch(resp, WriteKind::Create);
        self.announce_single(WriteKind::Create, saved.len());
        saved.into_iter().next()
    }

    pub async fn update(&self, id: RecordId, draft: &E::Draft) -> Option<E> {
        let saved = self.write_updates(&[(id, E::update_payload(draft, Utc::now()))]).await;
        self.announce_single(WriteKind::Update, saved.len());
        saved.into_iter().next()
    }

    pub async fn delete(&self, id: RecordId) -> bool {
        let deleted = self.delete_many(&[id]).await;
        self.announce_single(WriteKind::Delete, deleted);
        deleted > 0
    }

    fn listing() -> FetchParams {
        FetchParams::select(E::FIELDS).order_by(E::ORDER_FIELD, SortType::Desc)
    }

    async fn fetch(&self, params: &FetchParams, notify: bool) -> Vec<E> {
        match self.store.fetch_records(E::COLLECTION, params).await {
            Ok(resp) if resp.success => {
                let records: Vec<E> = resp
                    .data
                    .unwrap_or_default()
                    .into_iter()
                    .filter_map(decode::<E>)
                    .collect();
                tracing::debug!(collection = E::COLLECTION, count = records.len(), "fetched");
                records
            }
            Ok(resp) => {
                self.report_failure(&resp, notify);
                Vec::new()
            }
            Err(e) => {
                tracing::error!(collection = E::COLLECTION, error = %e, "fetch failed");
                Vec::new()
            }
        }
    }

    /// Sends `(id, fields)` pairs as one update batch. Returns the records
    /// that were saved; no success toast is raised here.
    pub(crate) async fn write_updates(&self, updates: &[(RecordId, Payload)]) -> Vec<E> {
        let records = updates
            .iter()
            .map(|(id, fields)| {
                let mut record = fields.clone();
                record.insert("Id".into(), Value::from(*id));
                record
            })
            .collect();
        let resp = self
            .store
            .update_record(E::COLLECTION, &WriteParams { records })
            .await;
        self.settle_batch(resp, WriteKind::Update)
    }

    /// Deletes by id in one batch. Returns how many deletions succeeded; no
    /// success toast is raised here.
    pub(crate) async fn delete_many(&self, ids: &[RecordId]) -> usize {
        let params = DeleteParams {
            record_ids: ids.iter().map(|id| id.get()).collect(),
        };
        let resp = self.store.delete_record(E::COLLECTION, &params).await;
        match resp {
            Ok(resp) if resp.success => {
                let results = resp.results.unwrap_or_default();
                self.report_rejections(&results, WriteKind::Delete);
                results.iter().filter(|r| r.success).count()
            }
            Ok(resp) => {
                self.report_failure(&resp, true);
                0
            }
            Err(e) => {
                tracing::error!(collection = E::COLLECTION, error = %e, "delete failed");
                0
            }
        }
    }

    /// Unwraps a create/update envelope into the saved records, reporting
    /// envelope-level and per-record failures along the way.
    fn settle_batch(
        &self,
        resp: Result<ApiResponse, StoreError>,
        kind: WriteKind,
    ) -> Vec<E> {
        match resp {
            Ok(resp) if resp.success => {
                let results = resp.results.unwrap_or_default();
                self.report_rejections(&results, kind);
                results
                    .into_iter()
                    .filter(|r| r.success)
                    .filter_map(|r| r.data)
                    .filter_map(decode::<E>)
                    .collect()
            }
            Ok(resp) => {
                self.report_failure(&resp, true);
                Vec::new()
            }
            Err(e) => {
                tracing::error!(collection = E::COLLECTION, error = %e, "{} failed", kind.verb());
                Vec::new()
            }
        }
    }

    fn report_failure<T>(&self, resp: &ApiResponse<T>, notify: bool) {
        let message = resp.message_or_default();
        tracing::error!(collection = E::COLLECTION, reason = message, "request rejected");
        if notify {
            self.notifier.error(message);
        }
    }

    fn report_rejections(&self, results: &[RecordResult], kind: WriteKind) {
        let failed: Vec<&RecordResult> = results.iter().filter(|r| !r.success).collect();
        if failed.is_empty() {
            return;
        }
        tracing::error!(
            collection = E::COLLECTION,
            count = failed.len(),
            "{} records not {}",
            E::PLURAL,
            kind.past_tense()
        );
        for record in failed {
            for error in &record.errors {
                self.notifier
                    .error(&format!("{}: {}", error.field_label, error.message));
            }
            if let Some(message) = record.message.as_deref() {
                self.notifier.error(message);
            }
        }
    }

    fn announce_single(&self, kind: WriteKind, succeeded: usize) {
        if succeeded > 0 {
            self.notifier
                .success(&format!("{} {} successfully", E::LABEL, kind.past_tense()));
        }
    }

    fn announce_many(&self, kind: WriteKind, succeeded: usize) {
        if succeeded > 0 {
            self.notifier.success(&format!(
                "{succeeded} {} {} successfully",
                E::PLURAL,
                kind.past_tense()
            ));
        }
    }
}

fn decode<E: Entity>(raw: Value) -> Option<E> {
    match serde_json::from_value(raw) {
        Ok(record) => Some(record),
        Err(e) => {
            tracing::warn!(collection = E::COLLECTION, error = %e, "skipping undecodable record");
            None
        }
    }
}

/// Every entity adapter over one store and one notifier.
#[derive(Clone)]
pub struct Adapters {
    pub contacts: ContactAdapter,
    pub companies: CompanyAdapter,
    pub deals: DealAdapter,
    pub activities: ActivityAdapter,
}

impl Adapters {
    pub fn new(
        store: Arc<dyn RecordStore>,
        notifier: Arc<dyn Notifier>,
        records: &RecordsConfig,
    ) -> Self {
        let page = records.page_size;
        Self {
            contacts: RecordAdapter::new(store.clone(), notifier.clone()).with_page_size(page),
            companies: RecordAdapter::new(store.clone(), notifier.clone()).with_page_size(page),
            deals: RecordAdapter::new(store.clone(), notifier.clone()).with_page_size(page),
            activities: RecordAdapter::new(store, notifier).with_page_size(page),
        }
    }
}
