//! Record service gRPC implementation.

use kubeprac_proto::record::v1::{
    record_service_server::RecordService, CreateRequest, CreateResponse, ReadRequest,
    ReadResponse,
};
use std::sync::Arc;
use tonic::{Request, Response, Status};
use tracing::instrument::WithSubscriber;
use tracing::{error, info, Dispatch};

use crate::cache::Cache;
use crate::error::Result;
use crate::store::{Record, RecordStore};

/// Cache key read on every `Read` call. Nothing in this service writes it.
pub const CACHE_KEY: &str = "example_key";

/// Message returned by a successful `Create`.
pub const CREATE_CONFIRMATION: &str = "Record saved successfully";

/// Record service implementation.
///
/// Holds shared handles only; concurrent calls never contend on handler
/// state.
#[derive(Clone)]
pub struct RecordServiceImpl {
    cache: Arc<dyn Cache>,
    store: Arc<dyn RecordStore>,
    /// Request log sink; every handler future runs with it as subscriber.
    log: Dispatch,
}

impl RecordServiceImpl {
    /// Create a new record service.
    #[must_use]
    pub fn new(cache: Arc<dyn Cache>, store: Arc<dyn RecordStore>, log: Dispatch) -> Self {
        Self { cache, store, log }
    }

    /// Combine the cached value with the record's field.
    ///
    /// A missing cache key is not an error; the cached part is left empty.
    ///
    /// # Errors
    ///
    /// Returns the cache error for any cache failure other than a missing
    /// key, and the store error if the record cannot be fetched.
    pub async fn read_record(&self, id: i64) -> Result<String> {
        let cached = match self.cache.get(CACHE_KEY).await {
            Ok(Some(value)) => value,
            Ok(None) => {
                info!(event = "cache_key_absent", key = CACHE_KEY, "Cache key not found");
                String::new()
            }
            Err(e) => {
                error!(event = "cache_error", key = CACHE_KEY, error = %e, "Cache lookup failed");
                return Err(e);
            }
        };

        let record = self.store.find_by_id(id).await.map_err(|e| {
            error!(event = "store_error", id, error = %e, "Record lookup failed");
            e
        })?;

        info!(event = "read_success", id, field = %record.field, "Read record success");

        Ok(format_message(&cached, &record.field))
    }

    /// Insert a new record holding `field`.
    ///
    /// Identical inputs create distinct records.
    ///
    /// # Errors
    ///
    /// Returns the store error unchanged, including constraint violations
    /// for an empty `field`.
    pub async fn create_record(&self, field: &str) -> Result<Record> {
        let record = self.store.insert(field).await.map_err(|e| {
            error!(event = "create_error", field, error = %e, "Create record failed");
            e
        })?;

        info!(event = "create_success", id = record.id, field, "Create record success");

        Ok(record)
    }
}

fn format_message(cached: &str, field: &str) -> String {
    format!("Value: {cached}, DB: {field}")
}

#[tonic::async_trait]
impl RecordService for RecordServiceImpl {
    async fn read(&self, request: Request<ReadRequest>) -> Result<Response<ReadResponse>, Status> {
        let id = request.into_inner().id;

        let message = self
            .read_record(id)
            .with_subscriber(self.log.clone())
            .await?;

        Ok(Response::new(ReadResponse { message }))
    }

    async fn create(
        &self,
        request: Request<CreateRequest>,
    ) -> Result<Response<CreateResponse>, Status> {
        let field = request.into_inner().field;

        let record = self
            .create_record(&field)
            .with_subscriber(self.log.clone())
            .await?;

        Ok(Response::new(CreateResponse {
            message: CREATE_CONFIRMATION.to_string(),
            id: record.id,
        }))
    }
}
