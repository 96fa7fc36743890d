use crate::error::Result;
use crate::storage::StorageLocation;
use datafusion::arrow::datatypes::SchemaRef;
use datafusion::datasource::file_format::json::JsonFormat;
use datafusion::datasource::listing::{ListingOptions, ListingTable, ListingTableConfig};
use datafusion::prelude::{DataFrame, SessionContext};
use std::sync::Arc;
use tracing::debug;

const JSON_EXTENSION: &str = ".json";

/// Bulk-load every newline-delimited JSON file under `root` matching
/// `pattern` into a single DataFrame with the given schema.
///
/// Files are not read until the DataFrame is executed, so each table
/// derived from it scans the source again.
pub fn load_json(
    ctx: &SessionContext,
    root: &StorageLocation,
    pattern: &str,
    schema: SchemaRef,
) -> Result<DataFrame> {
    let table_url = root.listing_url(pattern)?;
    debug!("Listing {} under {}", pattern, table_url);

    let options =
        ListingOptions::new(Arc::new(JsonFormat::default())).with_file_extension(JSON_EXTENSION);
    let config = ListingTableConfig::new(table_url)
        .with_listing_options(options)
        .with_schema(schema);
    let table = ListingTable::try_new(config)?;

    Ok(ctx.read_table(Arc::new(table))?)
}
