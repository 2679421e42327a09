//! Test-only helpers for writing scratch Parquet datasets.

use std::fmt;
use std::fs::File;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use arrow_array::{Int64Array, RecordBatch, StringArray};
use arrow_schema::{DataType, Field, Schema};
use async_trait::async_trait;
use futures::stream::BoxStream;
use object_store::local::LocalFileSystem;
use object_store::path::Path as ObjectPath;
use object_store::{
    GetOptions, GetResult, ListResult, MultipartUpload, ObjectMeta, ObjectStore,
    PutMultipartOpts, PutOptions, PutPayload, PutResult,
};
use parquet::arrow::ArrowWriter;
use parquet::file::properties::WriterProperties;
use tempfile::TempDir;

use crate::storage::DatasetLocation;

/// Write a two-column dataset (`id: Int64`, `label: Utf8`) with `rows`
/// rows to a temp directory and return a `file://` location for it.
/// Row `i` has `id == i`, so ordering checks are trivial.
pub(crate) fn write_dataset(rows: usize) -> (TempDir, DatasetLocation) {
    write_dataset_opts(rows, None)
}

/// Like [`write_dataset`], with an explicit row-group cap so a file can
/// span several row groups and exercise sequential row-group fetches.
pub(crate) fn write_dataset_opts(
    rows: usize,
    max_row_group_size: Option<usize>,
) -> (TempDir, DatasetLocation) {
    let dir = tempfile::tempdir().expect("create temp dir");
    let path = dir.path().join("dataset.parquet");

    let schema = Arc::new(Schema::new(vec![
        Field::new("id", DataType::Int64, false),
        Field::new("label", DataType::Utf8, true),
    ]));

    let props = max_row_group_size
        .map(|n| WriterProperties::builder().set_max_row_group_size(n).build());
    let file = File::create(&path).expect("create parquet file");
    let mut writer =
        ArrowWriter::try_new(file, schema.clone(), props).expect("create writer");

    if rows > 0 {
        let ids = Int64Array::from_iter_values(0..rows as i64);
        let labels = StringArray::from_iter_values((0..rows).map(|i| format!("row-{i}")));
        let batch = RecordBatch::try_new(schema, vec![Arc::new(ids), Arc::new(labels)])
            .expect("build batch");
        writer.write(&batch).expect("write batch");
    }
    writer.close().expect("close writer");

    let location = DatasetLocation::parse(&format!("file://{}", path.display()))
        .expect("parse file URI");
    (dir, location)
}

/// `ObjectStore` wrapper over [`LocalFileSystem`] that counts data reads.
///
/// Every read funnels through `get_opts` (the `get`/`get_range`/
/// `get_ranges` defaults delegate to it), so the counter observes each
/// ranged storage read the Parquet reader issues. `head` is deliberately
/// not counted — it is an existence/size check, not a data read.
#[derive(Debug)]
pub(crate) struct CountingStore {
    inner: LocalFileSystem,
    reads: Arc<AtomicUsize>,
}

impl CountingStore {
    pub(crate) fn wrap_local() -> (Arc<dyn ObjectStore>, Arc<AtomicUsize>) {
        let reads = Arc::new(AtomicUsize::new(0));
        let store = Arc::new(Self {
            inner: LocalFileSystem::new(),
            reads: reads.clone(),
        });
        (store, reads)
    }
}

impl fmt::Display for CountingStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CountingStore({})", self.inner)
    }
}

#[async_trait]
impl ObjectStore for CountingStore {
    async fn put_opts(
        &self,
        location: &ObjectPath,
        payload: PutPayload,
        opts: PutOptions,
    ) -> object_store::Result<PutResult> {
        self.inner.put_opts(location, payload, opts).await
    }

    async fn put_multipart_opts(
        &self,
        location: &ObjectPath,
        opts: PutMultipartOpts,
    ) -> object_store::Result<Box<dyn MultipartUpload>> {
        self.inner.put_multipart_opts(location, opts).await
    }

    async fn get_opts(
        &self,
        location: &ObjectPath,
        options: GetOptions,
    ) -> object_store::Result<GetResult> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.inner.get_opts(location, options).await
    }

    async fn head(&self, location: &ObjectPath) -> object_store::Result<ObjectMeta> {
        self.inner.head(location).await
    }

    async fn delete(&self, location: &ObjectPath) -> object_store::Result<()> {
        self.inner.delete(location).await
    }

    fn list(
        &self,
        prefix: Option<&ObjectPath>,
    ) -> BoxStream<'static, object_store::Result<ObjectMeta>> {
        self.inner.list(prefix)
    }

    async fn list_with_delimiter(
        &self,
        prefix: Option<&ObjectPath>,
    ) -> object_store::Result<ListResult> {
        self.inner.list_with_delimiter(prefix).await
    }

    async fn copy(&self, from: &ObjectPath, to: &ObjectPath) -> object_store::Result<()> {
        self.inner.copy(from, to).await
    }

    async fn copy_if_not_exists(
        &self,
        from: &ObjectPath,
        to: &ObjectPath,
    ) -> object_store::Result<()> {
        self.inner.copy_if_not_exists(from, to).await
    }
}
