use async_trait::async_trait;
use crm_api_types::{ApiResponse, DeleteParams, FetchParams, WriteParams};
use serde_json::Value;

use crate::types::RecordId;

/// Failures below the response envelope: the call never produced one.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("unexpected HTTP status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed response: {0}")]
    Decode(String),
}

/// The remote collection API.
///
/// Implementations translate these calls to the hosting platform and hand
/// back its envelope untouched. A `success: false` envelope is an `Ok`;
/// `Err` is reserved for calls that did not complete.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn fetch_records(
        &self,
        collection: &str,
        params: &FetchParams,
    ) -> Result<ApiResponse<Vec<Value>>, StoreError>;

    async fn get_record_by_id(
        &self,
        collection: &str,
        id: RecordId,
        params: &FetchParams,
    ) -> Result<ApiResponse<Value>, StoreError>;

    async fn create_record(
        &self,
        collection: &str,
        params: &WriteParams,
    ) -> Result<ApiResponse, StoreError>;

    async fn update_record(
        &self,
        collection: &str,
        params: &WriteParams,
    ) -> Result<ApiResponse, StoreError>;

    async fn delete_record(
        &self,
        collection: &str,
        params: &DeleteParams,
    ) -> Result<ApiResponse, StoreError>;
}
