//! gRPC service implementations for record-service.

mod record;

pub use record::{RecordServiceImpl, CACHE_KEY, CREATE_CONFIRMATION};
