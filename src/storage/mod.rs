//! Dataset location and object-store access.
//!
//! A [`DatasetLocation`] is the one immutable storage reference a server
//! instance is bound to. It is parsed once from a URI (`s3://bucket/key`
//! or `file:///path/to/file.parquet`) and carried by value into every
//! call; nothing here holds connections or caches handles — each caller
//! builds its own [`ObjectStore`] so concurrent calls stay independent.

mod probe;
mod stream;

pub use probe::{probe, DatasetMetadata};
pub use stream::BatchStream;

use std::path::PathBuf;
use std::sync::Arc;

use object_store::aws::AmazonS3Builder;
use object_store::local::LocalFileSystem;
use object_store::path::Path as ObjectPath;
use object_store::ObjectStore;

use crate::{Error, Result};

/// Optional access key pair for `s3://` locations.
///
/// `file://` locations ignore credentials entirely. For `s3://` both
/// halves must be present; this is checked at startup, not per call.
#[derive(Debug, Clone, Default)]
pub struct StorageCredentials {
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
}

/// Parsed, immutable reference to the backing object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetLocation {
    uri: String,
    kind: LocationKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum LocationKind {
    S3 { bucket: String, key: String },
    Local { path: PathBuf },
}

impl DatasetLocation {
    /// Parse a dataset URI. Supported schemes: `s3://bucket/key` and
    /// `file:///absolute/path`.
    pub fn parse(uri: &str) -> Result<Self> {
        if let Some(rest) = uri.strip_prefix("s3://") {
            let (bucket, key) = rest
                .split_once('/')
                .ok_or_else(|| Error::InvalidUri(format!("missing object key: {uri}")))?;
            if bucket.is_empty() || key.is_empty() {
                return Err(Error::InvalidUri(format!("missing bucket or key: {uri}")));
            }
            Ok(Self {
                uri: uri.to_string(),
                kind: LocationKind::S3 {
                    bucket: bucket.to_string(),
                    key: key.to_string(),
                },
            })
        } else if let Some(rest) = uri.strip_prefix("file://") {
            if rest.is_empty() || !rest.starts_with('/') {
                return Err(Error::InvalidUri(format!("file URI must be absolute: {uri}")));
            }
            Ok(Self {
                uri: uri.to_string(),
                kind: LocationKind::Local {
                    path: PathBuf::from(rest),
                },
            })
        } else {
            Err(Error::InvalidUri(format!("unsupported scheme: {uri}")))
        }
    }

    /// The original URI. This is exactly what goes into a Ticket, so a
    /// client can hand it back to `DoGet` with no server-side state.
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// The key component used as the flight descriptor path.
    pub fn key(&self) -> &str {
        match &self.kind {
            LocationKind::S3 { key, .. } => key,
            LocationKind::Local { path } => path.to_str().unwrap_or(&self.uri),
        }
    }

    /// Validate that the credentials suffice for this location.
    pub fn check_credentials(&self, credentials: &StorageCredentials) -> Result<()> {
        if let LocationKind::S3 { .. } = self.kind {
            if credentials.access_key_id.is_none() {
                return Err(Error::MissingCredentials("access key id"));
            }
            if credentials.secret_access_key.is_none() {
                return Err(Error::MissingCredentials("secret access key"));
            }
        }
        Ok(())
    }

    /// Build a fresh object store handle for this location.
    ///
    /// Called once per RPC; there is deliberately no pooling or reuse, so
    /// every call re-authenticates and sees the object as it currently is.
    pub fn object_store(
        &self,
        credentials: &StorageCredentials,
    ) -> Result<(Arc<dyn ObjectStore>, ObjectPath)> {
        match &self.kind {
            LocationKind::S3 { bucket, key } => {
                // Region/endpoint come from the ambient AWS_* environment.
                let mut builder = AmazonS3Builder::from_env().with_bucket_name(bucket.clone());
                if let Some(id) = &credentials.access_key_id {
                    builder = builder.with_access_key_id(id.clone());
                }
                if let Some(secret) = &credentials.secret_access_key {
                    builder = builder.with_secret_access_key(secret.clone());
                }
                let store = builder.build()?;
                Ok((Arc::new(store), ObjectPath::from(key.as_str())))
            }
            LocationKind::Local { path } => {
                let object_path = ObjectPath::from_absolute_path(path)
                    .map_err(|e| Error::InvalidUri(e.to_string()))?;
                Ok((Arc::new(LocalFileSystem::new()), object_path))
            }
        }
    }
}
