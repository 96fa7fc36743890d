//! Test data lake lifecycle management
//!
//! Each test gets an isolated input root filled with fixture JSON and an
//! empty output root, both under one temporary directory.

use super::fixtures::{create_log_data, create_song_data};
use data_lake_etl::config::StorageSettings;
use data_lake_etl::pipeline::{SONGPLAYS_PARTITION_BY, SONGS_PARTITION_BY, TIME_PARTITION_BY};
use data_lake_etl::session::session_config;
use data_lake_etl::{create_session, run_pipeline, RunSummary};
use datafusion::arrow::array::RecordBatch;
use datafusion::arrow::compute::concat_batches;
use datafusion::arrow::datatypes::DataType;
use datafusion::arrow::util::display::array_value_to_string;
use datafusion::prelude::{ParquetReadOptions, SessionContext};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;
use walkdir::WalkDir;

/// Input and output roots for one pipeline run.
///
/// When dropped, the temporary directory and everything written to it is
/// removed.
pub struct TestLake {
    /// Directory holding `song-data/` and `log_data/`
    pub input_dir: PathBuf,

    /// Directory the tables are written under
    pub output_dir: PathBuf,

    pub storage: StorageSettings,

    // Private fields - keep resources alive until drop
    _temp_dir: TempDir,
}

impl TestLake {
    /// Creates a lake with the full fixture dataset as input.
    ///
    /// # Panics
    ///
    /// Panics if the temporary directory or the fixture files cannot be
    /// created.
    pub fn create() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let input_dir = temp_dir.path().join("input");
        let output_dir = temp_dir.path().join("output");

        create_song_data(&input_dir).expect("Failed to create song data");
        create_log_data(&input_dir).expect("Failed to create log data");

        let storage = StorageSettings::parse(
            input_dir.to_str().expect("Non UTF-8 temp path"),
            output_dir.to_str().expect("Non UTF-8 temp path"),
        )
        .expect("Failed to build storage settings");

        Self {
            input_dir,
            output_dir,
            storage,
            _temp_dir: temp_dir,
        }
    }

    /// Runs the whole pipeline in a fresh session.
    pub async fn run(&self) -> RunSummary {
        let ctx = create_session(&self.storage).expect("Failed to create session");
        run_pipeline(&ctx, &self.storage)
            .await
            .expect("Pipeline run failed")
    }

    pub fn table_dir(&self, table: &str) -> PathBuf {
        self.output_dir.join(table)
    }

    /// Parquet files of `table`, relative to the table directory, sorted.
    pub fn data_files(&self, table: &str) -> Vec<String> {
        let table_dir = self.table_dir(table);
        let mut files: Vec<String> = WalkDir::new(&table_dir)
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file())
            .filter(|entry| entry.path().extension().is_some_and(|ext| ext == "parquet"))
            .map(|entry| relative(&table_dir, entry.path()))
            .collect();
        files.sort();
        files
    }

    /// Directories of `table` that directly hold Parquet files, sorted and
    /// deduplicated.
    pub fn partition_dirs(&self, table: &str) -> Vec<String> {
        let mut dirs: Vec<String> = self
            .data_files(table)
            .iter()
            .filter_map(|file| Path::new(file).parent())
            .map(|dir| dir.to_string_lossy().into_owned())
            .collect();
        dirs.sort();
        dirs.dedup();
        dirs
    }

    /// Reads `table` back with the partition columns it is written with.
    pub async fn read_partitioned_table(&self, table: &str) -> RecordBatch {
        let partition_cols: &[&str] = match table {
            "songs" => SONGS_PARTITION_BY,
            "time" => TIME_PARTITION_BY,
            "songplays" => SONGPLAYS_PARTITION_BY,
            _ => &[],
        };
        self.read_table(table, partition_cols).await
    }

    /// Reads `table` back into a single batch. Partition values are returned
    /// as string columns appended after the file columns.
    pub async fn read_table(&self, table: &str, partition_cols: &[&str]) -> RecordBatch {
        let ctx = SessionContext::new_with_config(session_config());
        let options = ParquetReadOptions::default().table_partition_cols(
            partition_cols
                .iter()
                .map(|c| (c.to_string(), DataType::Utf8))
                .collect(),
        );
        let table_url = format!("{}/", self.table_dir(table).display());
        let df = ctx
            .read_parquet(table_url, options)
            .await
            .expect("Failed to read table");
        let schema = Arc::new(df.schema().as_arrow().clone());
        let batches = df.collect().await.expect("Failed to collect table");
        concat_batches(&schema, &batches).expect("Failed to concat batches")
    }
}

fn relative(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .to_string_lossy()
        .into_owned()
}

/// Every value of `column` rendered as a string, nulls as empty strings.
pub fn column_strings(batch: &RecordBatch, column: &str) -> Vec<String> {
    let array = batch
        .column_by_name(column)
        .unwrap_or_else(|| panic!("Missing column {}", column));
    (0..batch.num_rows())
        .map(|row| array_value_to_string(array, row).expect("Unprintable value"))
        .collect()
}

/// Every row of `batch` rendered as one `|`-joined string, sorted.
pub fn sorted_rows(batch: &RecordBatch) -> Vec<String> {
    let columns: Vec<Vec<String>> = batch
        .schema()
        .fields()
        .iter()
        .map(|field| column_strings(batch, field.name()))
        .collect();
    let mut rows: Vec<String> = (0..batch.num_rows())
        .map(|row| {
            columns
                .iter()
                .map(|values| values[row].as_str())
                .collect::<Vec<_>>()
                .join("|")
        })
        .collect();
    rows.sort();
    rows
}
