//! Lazy, single-pass batch stream over the remote Parquet file.
//!
//! Each `DoGet` call opens its own [`BatchStream`]; a stream instance is
//! never restarted or shared. Batches come out in on-disk row-group order
//! at `batch_size` rows apiece (the final batch may be short). Only one
//! batch is read per poll, so the transport's flow control directly
//! throttles storage reads, and dropping the stream — exhaustion, error,
//! or client disconnect — releases the underlying reader.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use arrow_array::RecordBatch;
use arrow_schema::SchemaRef;
use futures::stream::BoxStream;
use futures::{Stream, StreamExt};
use object_store::path::Path as ObjectPath;
use object_store::ObjectStore;
use parquet::arrow::async_reader::ParquetObjectReader;
use parquet::arrow::ParquetRecordBatchStreamBuilder;

use super::{DatasetLocation, StorageCredentials};
use crate::{Error, Result};

/// A finite stream of `RecordBatch`es sharing one schema.
pub struct BatchStream {
    schema: SchemaRef,
    inner: BoxStream<'static, parquet::errors::Result<RecordBatch>>,
}

impl BatchStream {
    /// Open the object for sequential reads. Fails up front if the object
    /// cannot be opened or its footer is malformed; failures after this
    /// point surface as stream items.
    pub async fn open(
        location: &DatasetLocation,
        credentials: &StorageCredentials,
        batch_size: usize,
    ) -> Result<Self> {
        let (store, path) = location.object_store(credentials)?;
        Self::open_with_store(store, path, batch_size).await
    }

    /// Open against an explicit store handle. Tests use this to observe
    /// the reads a stream issues through an instrumented store.
    pub(crate) async fn open_with_store(
        store: Arc<dyn ObjectStore>,
        path: ObjectPath,
        batch_size: usize,
    ) -> Result<Self> {
        let head = store.head(&path).await?;
        let reader = ParquetObjectReader::new(store, path).with_file_size(head.size);

        let builder = ParquetRecordBatchStreamBuilder::new(reader).await?;
        let schema = builder.schema().clone();
        let inner = builder.with_batch_size(batch_size).build()?.boxed();

        Ok(Self { schema, inner })
    }

    /// Schema shared by every batch this stream will yield.
    pub fn schema(&self) -> SchemaRef {
        self.schema.clone()
    }
}

impl Stream for BatchStream {
    type Item = Result<RecordBatch>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner
            .poll_next_unpin(cx)
            .map(|item| item.map(|r| r.map_err(Error::from)))
    }
}
