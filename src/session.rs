//! Query-engine session bootstrap.
//!
//! Credentials must already be exported to the environment (see
//! [`crate::config::Credentials::export_to_env`]) before a session is
//! created: the S3 stores are built from the environment.

use crate::config::StorageSettings;
use crate::error::{EtlError, Result};
use crate::storage::StorageLocation;
use datafusion::prelude::{SessionConfig, SessionContext};
use object_store::aws::AmazonS3Builder;
use object_store::ObjectStore;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, info};
use url::Url;

/// Session settings shared by every run.
///
/// Input files sit several directories below the glob prefix, so listings
/// must descend into subdirectories.
pub fn session_config() -> SessionConfig {
    SessionConfig::new().set_bool(
        "datafusion.execution.listing_table_ignore_subdirectory",
        false,
    )
}

/// Create the session used by both pipelines, with an object store
/// registered for every bucket referenced by the input and output roots.
pub fn create_session(storage: &StorageSettings) -> Result<SessionContext> {
    let ctx = SessionContext::new_with_config(session_config());
    register_object_stores(&ctx, [&storage.input_root, &storage.output_root])?;
    Ok(ctx)
}

pub fn register_object_stores<'a>(
    ctx: &SessionContext,
    locations: impl IntoIterator<Item = &'a StorageLocation>,
) -> Result<()> {
    let mut seen = BTreeSet::new();
    for location in locations {
        if location.is_local() {
            debug!("Using local filesystem for {}", location);
            continue;
        }
        let store_url = location.object_store_url()?;
        if !seen.insert(store_url.as_str().to_string()) {
            continue;
        }
        let store = build_object_store(location)?;
        ctx.register_object_store(AsRef::<Url>::as_ref(&store_url), store);
        info!("Registered object store for {}", store_url.as_str());
    }
    Ok(())
}

fn build_object_store(location: &StorageLocation) -> Result<Arc<dyn ObjectStore>> {
    match location.scheme() {
        "s3" | "s3a" => {
            let bucket = location
                .bucket()
                .ok_or_else(|| EtlError::InvalidLocation(location.to_string()))?;
            let store = AmazonS3Builder::from_env()
                .with_bucket_name(bucket)
                .build()?;
            Ok(Arc::new(store))
        }
        other => Err(EtlError::UnsupportedScheme(other.to_string())),
    }
}
