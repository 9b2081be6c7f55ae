//! Record service for kubeprac.
//!
//! Exposes `Read` and `Create` over gRPC. `Read` combines a fixed Redis key
//! with a PostgreSQL row; `Create` inserts a row.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cache;
pub mod config;
pub mod error;
pub mod logging;
pub mod server;
pub mod services;
pub mod store;

pub use cache::{Cache, RedisCache};
pub use config::{LogConfig, PostgresConfig, RecordServiceConfig, RedisConfig, ServiceConfig};
pub use error::{Error, Result};
pub use services::RecordServiceImpl;
pub use store::{PgRecordStore, Record, RecordStore};
