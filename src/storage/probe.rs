//! Footer-only metadata probe.
//!
//! Reads the Parquet footer of the remote object to resolve schema and
//! total row count without scanning any row data. Discovery and metadata
//! calls both go through here, so a `GetFlightInfo` answer and a later
//! `DoGet` stream agree on schema as long as the object is immutable.

use arrow_schema::SchemaRef;
use parquet::arrow::arrow_reader::{ArrowReaderMetadata, ArrowReaderOptions};
use parquet::arrow::async_reader::ParquetObjectReader;

use super::{DatasetLocation, StorageCredentials};
use crate::Result;

/// Schema and row count resolved from the file footer.
#[derive(Debug, Clone)]
pub struct DatasetMetadata {
    pub schema: SchemaRef,
    pub num_rows: i64,
}

/// Open the remote object and read its footer. One HEAD request for
/// existence and size, then ranged reads covering only the footer.
pub async fn probe(
    location: &DatasetLocation,
    credentials: &StorageCredentials,
) -> Result<DatasetMetadata> {
    let (store, path) = location.object_store(credentials)?;
    let head = store.head(&path).await?;
    let mut reader = ParquetObjectReader::new(store, path).with_file_size(head.size);
    let metadata = ArrowReaderMetadata::load_async(&mut reader, ArrowReaderOptions::new()).await?;
    let num_rows = metadata.metadata().file_metadata().num_rows();
    Ok(DatasetMetadata {
        schema: metadata.schema().clone(),
        num_rows,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::write_dataset;
    use crate::Error;
    use arrow_schema::DataType;

    #[tokio::test]
    async fn probe_reads_schema_and_row_count() {
        let (_dir, location) = write_dataset(1_234);
        let meta = probe(&location, &StorageCredentials::default())
            .await
            .unwrap();

        assert_eq!(meta.num_rows, 1_234);
        let fields = meta.schema.fields();
        assert_eq!(fields.len(), 2);
        assert_eq!(fields[0].name(), "id");
        assert_eq!(fields[0].data_type(), &DataType::Int64);
        assert_eq!(fields[1].name(), "label");
        assert_eq!(fields[1].data_type(), &DataType::Utf8);
    }

    #[tokio::test]
    async fn probe_reports_zero_rows_for_empty_dataset() {
        let (_dir, location) = write_dataset(0);
        let meta = probe(&location, &StorageCredentials::default())
            .await
            .unwrap();
        assert_eq!(meta.num_rows, 0);
    }

    #[tokio::test]
    async fn probe_fails_when_object_is_missing() {
        let dir = tempfile::tempdir().unwrap();
        let uri = format!("file://{}/does-not-exist.parquet", dir.path().display());
        let location = DatasetLocation::parse(&uri).unwrap();

        let err = probe(&location, &StorageCredentials::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::ObjectStore(_)));
    }

    #[tokio::test]
    async fn probe_fails_on_non_parquet_object() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("garbage.parquet");
        std::fs::write(&path, b"this is not a parquet file").unwrap();
        let location = DatasetLocation::parse(&format!("file://{}", path.display())).unwrap();

        let err = probe(&location, &StorageCredentials::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Parquet(_)));
    }
}
