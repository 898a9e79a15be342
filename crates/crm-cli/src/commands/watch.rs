//! A store wrapper that remembers the last call that failed.
//!
//! The adapters answer a failed read with an empty list and only toast some
//! failures, so a command cannot tell "nothing there" from "nothing came
//! back" on its own.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use crm_api_types::{ApiResponse, DeleteParams, FetchParams, WriteParams};
use crm_core::store::{RecordStore, StoreError};
use crm_core::types::RecordId;
use serde_json::Value;

pub struct WatchedStore {
    inner: Arc<dyn RecordStore>,
    last_failure: Mutex<Option<String>>,
}

impl WatchedStore {
    pub fn new(inner: Arc<dyn RecordStore>) -> Self {
        Self {
            inner,
            last_failure: Mutex::new(None),
        }
    }

    /// Why the most recent failing call failed, if any call did.
    pub fn last_failure(&self) -> Option<String> {
        self.slot().clone()
    }

    fn observe<T>(
        &self,
        collection: &str,
        result: Result<ApiResponse<T>, StoreError>,
    ) -> Result<ApiResponse<T>, StoreError> {
        let reason = match &result {
            Err(e) => Some(e.to_string()),
            Ok(response) if !response.success => Some(
                response
                    .message
                    .clone()
                    .unwrap_or_else(|| "request rejected".to_string()),
            ),
            Ok(_) => None,
        };
        if let Some(reason) = reason {
            tracing::debug!(collection, reason = %reason, "store call failed");
            *self.slot() = Some(reason);
        }
        result
    }

    fn slot(&self) -> std::sync::MutexGuard<'_, Option<String>> {
        self.last_failure
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl RecordStore for WatchedStore {
    async fn fetch_records(
        &self,
        collection: &str,
        params: &FetchParams,
    ) -> Result<ApiResponse<Vec<Value>>, StoreError> {
        let result = self.inner.fetch_records(collection, params).await;
        self.observe(collection, result)
    }

    async fn get_record_by_id(
        &self,
        collection: &str,
        id: RecordId,
        params: &FetchParams,
    ) -> Result<ApiResponse<Value>, StoreError> {
        let result = self.inner.get_record_by_id(collection, id, params).await;
        self.observe(collection, result)
    }

    async fn create_record(
        &self,
        collection: &str,
        params: &WriteParams,
    ) -> Result<ApiResponse, StoreError> {
        let result = self.inner.create_record(collection, params).await;
        self.observe(collection, result)
    }

    async fn update_record(
        &self,
        collection: &str,
        params: &WriteParams,
    ) -> Result<ApiResponse, StoreError> {
        let result = self.inner.update_record(collection, params).await;
        self.observe(collection, result)
    }

    async fn delete_record(
        &self,
        collection: &str,
        params: &DeleteParams,
    ) -> Result<ApiResponse, StoreError> {
        let result = self.inner.delete_record(collection, params).await;
        self.observe(collection, result)
    }
}
