//! Kubeprac Protocol Buffer definitions.
//!
//! This crate provides the gRPC service definition and message types for the
//! record service.
//!
//! # Services
//!
//! - [`record`] - Read a record combined with a cached value, create records
//!
//! All types are generated from `proto/record.proto` by `tonic-build`,
//! including both the client and the server halves.

/// Record service protocol definitions.
pub mod record {
    /// Version 1 of the record service API.
    #[allow(missing_docs)]
    pub mod v1 {
        tonic::include_proto!("kubeprac.record.v1");
    }
}
