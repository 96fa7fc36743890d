//! Storage locations for the input and output roots.
//!
//! A root is either an object-store URL (`s3://`, `s3a://`) or a local
//! directory. Both are normalized to a directory URL so that table paths and
//! input patterns can be joined onto them uniformly.

use crate::error::{EtlError, Result};
use datafusion::datasource::listing::ListingTableUrl;
use datafusion::execution::object_store::ObjectStoreUrl;
use std::fmt;
use std::path::{Path, PathBuf};
use url::Url;

const GLOB_CHARS: &[char] = &['*', '?', '['];

/// A directory-like location in object storage or on the local filesystem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageLocation {
    url: Url,
}

impl StorageLocation {
    /// Parse a root given either as a URL or as a local filesystem path.
    pub fn parse(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(EtlError::InvalidLocation(
                "location must not be empty".to_string(),
            ));
        }
        let url = match Url::parse(trimmed) {
            Ok(url) if url.scheme().len() > 1 => url,
            _ => local_dir_url(Path::new(trimmed))?,
        };
        Self::from_url(url)
    }

    fn from_url(mut url: Url) -> Result<Self> {
        if url.scheme() != "file" && url.host_str().map_or(true, str::is_empty) {
            return Err(EtlError::InvalidLocation(format!(
                "{} has no bucket or host",
                url
            )));
        }
        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }
        Ok(Self { url })
    }

    pub fn as_str(&self) -> &str {
        self.url.as_str()
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn scheme(&self) -> &str {
        self.url.scheme()
    }

    /// Bucket name for object-store locations.
    pub fn bucket(&self) -> Option<&str> {
        self.url.host_str()
    }

    pub fn is_local(&self) -> bool {
        self.url.scheme() == "file"
    }

    /// Filesystem path of a local location.
    pub fn local_path(&self) -> Option<PathBuf> {
        if !self.is_local() {
            return None;
        }
        self.url.to_file_path().ok()
    }

    /// Location of a child directory, e.g. the output directory of one table.
    pub fn join_dir(&self, name: &str) -> Result<Self> {
        let name = name.trim_matches('/');
        if name.is_empty() {
            return Err(EtlError::InvalidLocation(format!(
                "empty child directory under {}",
                self
            )));
        }
        let url = self
            .url
            .join(&format!("{}/", name))
            .map_err(|e| EtlError::InvalidLocation(format!("{}: {}", name, e)))?;
        Self::from_url(url)
    }

    /// URL identifying the object store that serves this location.
    pub fn object_store_url(&self) -> Result<ObjectStoreUrl> {
        let base = match self.url.scheme() {
            "file" => "file:///".to_string(),
            scheme => format!("{}://{}", scheme, self.bucket().unwrap_or_default()),
        };
        Ok(ObjectStoreUrl::parse(base)?)
    }

    /// Listing URL for a relative pattern such as `song-data/*/*/*/*.json`.
    ///
    /// Only the literal leading directories are kept. Everything below that
    /// prefix is listed recursively and filtered by file extension.
    pub fn listing_url(&self, pattern: &str) -> Result<ListingTableUrl> {
        let prefix = literal_prefix(pattern);
        let base = if prefix.is_empty() {
            self.url.clone()
        } else {
            self.url
                .join(&prefix)
                .map_err(|e| EtlError::InvalidLocation(format!("{}: {}", pattern, e)))?
        };
        Ok(ListingTableUrl::parse(base.as_str())?)
    }
}

impl fmt::Display for StorageLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.url.as_str())
    }
}

fn local_dir_url(path: &Path) -> Result<Url> {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()?.join(path)
    };
    Url::from_directory_path(&absolute).map_err(|_| {
        EtlError::InvalidLocation(format!("{} is not a valid directory", absolute.display()))
    })
}

/// Directories of `a/b/*/c.json` before the first glob segment: `a/b/`.
fn literal_prefix(pattern: &str) -> String {
    let pattern = pattern.trim_start_matches('/');
    let segments: Vec<&str> = pattern.split('/').collect();
    match segments.iter().position(|s| s.contains(GLOB_CHARS)) {
        None => pattern.to_string(),
        Some(0) => String::new(),
        Some(i) => format!("{}/", segments[..i].join("/")),
    }
}
