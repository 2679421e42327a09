//! Server configuration.
//!
//! All knobs are consumed once at construction and never re-read: bind
//! host/port, the single dataset URI, the storage credential pair, rows
//! per streamed batch, and the wire compression codec. Invalid or missing
//! values are fatal — the server refuses to start rather than serving a
//! dataset it cannot open.

use std::env;
use std::str::FromStr;

use arrow_ipc::writer::IpcWriteOptions;
use arrow_ipc::CompressionType;

use crate::storage::{DatasetLocation, StorageCredentials};
use crate::{Error, Result, DEFAULT_BATCH_SIZE, DEFAULT_PORT};

/// Compression applied to Arrow IPC message bodies on the wire.
///
/// This shrinks bytes in the gRPC framing layer only; batches handed to
/// the reader and to the client are uncompressed `RecordBatch`es.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Compression {
    #[default]
    None,
    Lz4,
    Zstd,
}

impl Compression {
    pub fn ipc_write_options(self) -> Result<IpcWriteOptions> {
        let codec = match self {
            Compression::None => None,
            Compression::Lz4 => Some(CompressionType::LZ4_FRAME),
            Compression::Zstd => Some(CompressionType::ZSTD),
        };
        Ok(IpcWriteOptions::default().try_with_compression(codec)?)
    }
}

impl FromStr for Compression {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "none" | "" => Ok(Compression::None),
            "lz4" => Ok(Compression::Lz4),
            "zstd" => Ok(Compression::Zstd),
            other => Err(Error::InvalidConfig(format!(
                "unknown compression codec: {other} (expected none, lz4, or zstd)"
            ))),
        }
    }
}

/// Immutable server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub dataset_uri: String,
    pub credentials: StorageCredentials,
    pub batch_size: usize,
    pub compression: Compression,
}

impl ServerConfig {
    /// Read configuration from the environment:
    ///
    /// - `FLIGHTSERVE_HOST` (default `0.0.0.0`)
    /// - `FLIGHTSERVE_PORT` (default 8815)
    /// - `FLIGHTSERVE_DATASET_URI` (required)
    /// - `AWS_ACCESS_KEY_ID` / `AWS_SECRET_ACCESS_KEY` (required for s3://)
    /// - `FLIGHTSERVE_BATCH_SIZE` (default 10000)
    /// - `FLIGHTSERVE_COMPRESSION` (`none` | `lz4` | `zstd`)
    pub fn from_env() -> Result<Self> {
        let host = env::var("FLIGHTSERVE_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = match env::var("FLIGHTSERVE_PORT") {
            Ok(raw) => raw
                .parse::<u16>()
                .map_err(|_| Error::InvalidConfig(format!("invalid port: {raw}")))?,
            Err(_) => DEFAULT_PORT,
        };
        let dataset_uri = env::var("FLIGHTSERVE_DATASET_URI")
            .map_err(|_| Error::InvalidConfig("FLIGHTSERVE_DATASET_URI is not set".into()))?;
        let credentials = StorageCredentials {
            access_key_id: env::var("AWS_ACCESS_KEY_ID").ok(),
            secret_access_key: env::var("AWS_SECRET_ACCESS_KEY").ok(),
        };
        let batch_size = match env::var("FLIGHTSERVE_BATCH_SIZE") {
            Ok(raw) => raw
                .parse::<usize>()
                .map_err(|_| Error::InvalidConfig(format!("invalid batch size: {raw}")))?,
            Err(_) => DEFAULT_BATCH_SIZE,
        };
        let compression = match env::var("FLIGHTSERVE_COMPRESSION") {
            Ok(raw) => raw.parse()?,
            Err(_) => Compression::None,
        };

        let config = Self {
            host,
            port,
            dataset_uri,
            credentials,
            batch_size,
            compression,
        };
        config.validate()?;
        Ok(config)
    }

    /// Check the URI parses, credentials suffice, and the batch size is
    /// usable. Called by `from_env` and again by the service constructor
    /// so hand-built configs get the same treatment.
    pub fn validate(&self) -> Result<()> {
        let location = DatasetLocation::parse(&self.dataset_uri)?;
        location.check_credentials(&self.credentials)?;
        if self.batch_size == 0 {
            return Err(Error::InvalidConfig("batch size must be at least 1".into()));
        }
        Ok(())
    }

    /// The location advertised in flight endpoints. Clients are always
    /// told to fetch from the same node that answered the metadata call.
    pub fn advertised_location(&self) -> String {
        format!("grpc://{}:{}", self.host, self.port)
    }
}
