//! # flightserve
//!
//! Arrow Flight server that exposes a single Parquet dataset stored in
//! object storage (S3 or local filesystem) as a discoverable, streamable
//! flight.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                       Flight Client                             │
//! └─────────────────────────────────────────────────────────────────┘
//!                               │
//!                               ▼ Arrow Flight (gRPC)
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    FlightServeService                           │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  ListFlights(criteria) → the one bound dataset (rows unknown)   │
//! │  GetFlightInfo(desc)   → schema + row count from the footer     │
//! │  DoGet(ticket)         → RecordBatch stream, batch_size rows    │
//! └─────────────────────────────────────────────────────────────────┘
//!                               │
//!                               ▼ object_store + parquet
//!                    s3://bucket/key  or  file:///path
//! ```
//!
//! The server binds exactly one dataset URI at construction. Every call
//! opens its own handle to the remote object; nothing is cached between
//! calls, so metadata is always fresh at the cost of one footer read per
//! call. Batches are produced lazily during `DoGet` — one batch is read
//! from storage per poll, so the consuming channel's flow control is the
//! backpressure mechanism.

pub mod config;
pub mod flight;
pub mod storage;

#[cfg(test)]
pub(crate) mod test_util;

// === Re-exports for convenience ===

pub use crate::config::{Compression, ServerConfig};
pub use crate::flight::{serve, FlightServeService};
pub use crate::storage::{BatchStream, DatasetLocation, DatasetMetadata, StorageCredentials};

// === Error types ===

/// Crate-level error type.
///
/// Configuration variants (`InvalidUri`, `MissingCredentials`,
/// `InvalidConfig`) are fatal at startup. Storage and format variants are
/// internal causes only: at the protocol boundary they are logged and
/// collapsed into a generic `unavailable` status, never forwarded to the
/// client verbatim.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("invalid dataset URI: {0}")]
    InvalidUri(String),

    #[error("missing credentials: {0}")]
    MissingCredentials(&'static str),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("object store error: {0}")]
    ObjectStore(#[from] object_store::Error),

    #[error("parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("arrow error: {0}")]
    Arrow(#[from] arrow_schema::ArrowError),

    #[error("transport error: {0}")]
    Transport(#[from] tonic::transport::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

// === Constants ===

/// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Rows per streamed RecordBatch unless configured otherwise
pub const DEFAULT_BATCH_SIZE: usize = 10_000;

/// Default bind port (matches the conventional Flight port)
pub const DEFAULT_PORT: u16 = 8815;
