//! Overwrite-mode Parquet output.

use crate::error::Result;
use crate::storage::StorageLocation;
use datafusion::arrow::array::UInt64Array;
use datafusion::arrow::datatypes::DataType;
use datafusion::arrow::record_batch::RecordBatch;
use datafusion::config::TableParquetOptions;
use datafusion::dataframe::DataFrameWriteOptions;
use datafusion::prelude::{cast, coalesce, ident, lit, DataFrame, SessionContext};
use futures::TryStreamExt;
use object_store::path::Path as ObjectPath;
use object_store::ObjectStore;
use std::io::ErrorKind;
use tracing::{debug, info};

const PARQUET_COMPRESSION: &str = "snappy";

pub const NULL_PARTITION_VALUE: &str = "__HIVE_DEFAULT_PARTITION__";

/// Write `df` as Parquet files under `<output_root>/<table>/`, replacing
/// whatever the directory held before.
///
/// With a non-empty `partition_by` the files are laid out in Hive-style
/// `column=value` subdirectories and the partition columns are dropped from
/// the files themselves. Returns the number of rows written.
pub async fn write_table(
    ctx: &SessionContext,
    df: DataFrame,
    output_root: &StorageLocation,
    table: &str,
    partition_by: &[&str],
) -> Result<u64> {
    let location = output_root.join_dir(table)?;

    info!("Writing {} data into {}", table, output_root);
    clear_location(ctx, &location).await?;

    let df = partition_values_as_strings(df, partition_by)?;
    let options = DataFrameWriteOptions::new()
        .with_partition_by(partition_by.iter().map(|c| c.to_string()).collect());
    let result = df
        .write_parquet(location.as_str(), options, Some(parquet_options()))
        .await?;

    let rows = written_row_count(&result);
    info!("Writing complete! {} rows written to {}", rows, location);
    Ok(rows)
}

/// Partition values end up in directory names, so they are written as text.
/// Nulls get the Hive default partition name instead of an empty value.
fn partition_values_as_strings(df: DataFrame, partition_by: &[&str]) -> Result<DataFrame> {
    partition_by.iter().try_fold(df, |df, column| {
        let value = coalesce(vec![
            cast(ident(*column), DataType::Utf8),
            lit(NULL_PARTITION_VALUE),
        ]);
        Ok(df.with_column(column, value)?)
    })
}

fn parquet_options() -> TableParquetOptions {
    let mut options = TableParquetOptions::default();
    options.global.compression = Some(PARQUET_COMPRESSION.to_string());
    options
}

/// Remove every object below `location`. Missing locations are fine.
pub async fn clear_location(ctx: &SessionContext, location: &StorageLocation) -> Result<()> {
    if let Some(path) = location.local_path() {
        return match tokio::fs::remove_dir_all(&path).await {
            Ok(()) => {
                debug!("Removed previous output at {}", path.display());
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        };
    }

    let store = ctx.runtime_env().object_store(location.object_store_url()?)?;
    let prefix =
        ObjectPath::from_url_path(location.url().path()).map_err(object_store::Error::from)?;
    let stale: Vec<ObjectPath> = store
        .list(Some(&prefix))
        .map_ok(|meta| meta.location)
        .try_collect()
        .await?;
    for path in &stale {
        store.delete(path).await?;
    }
    debug!("Removed {} previous objects under {}", stale.len(), location);
    Ok(())
}

/// Sum of the `count` column the engine returns from a write.
fn written_row_count(batches: &[RecordBatch]) -> u64 {
    batches
        .iter()
        .filter_map(|batch| batch.column_by_name("count"))
        .filter_map(|column| column.as_any().downcast_ref::<UInt64Array>())
        .flat_map(|counts| counts.iter().flatten())
        .sum()
}
