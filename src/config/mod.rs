mod file_config;

pub use file_config::{AwsConfig, FileConfig, StorageConfig};

use crate::storage::StorageLocation;
use anyhow::{bail, Context, Result};
use std::fmt;

pub const DEFAULT_CONFIG_FILE: &str = "dl.toml";
pub const DEFAULT_INPUT_ROOT: &str = "s3a://udacity-dend/";
pub const DEFAULT_OUTPUT_ROOT: &str = "s3a://data-lake-project/";

const ACCESS_KEY_ID_VAR: &str = "AWS_ACCESS_KEY_ID";
const SECRET_ACCESS_KEY_VAR: &str = "AWS_SECRET_ACCESS_KEY";
const REGION_VAR: &str = "AWS_REGION";

/// CLI arguments that take part in config resolution.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub input_root: Option<String>,
    pub output_root: Option<String>,
}

/// Object-storage credentials read from the config file.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub region: Option<String>,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field("region", &self.region)
            .finish()
    }
}

impl Credentials {
    /// Exports the credentials as process environment variables, where the
    /// object-store builders pick them up.
    pub fn export_to_env(&self) {
        std::env::set_var(ACCESS_KEY_ID_VAR, &self.access_key_id);
        std::env::set_var(SECRET_ACCESS_KEY_VAR, &self.secret_access_key);
        if let Some(region) = &self.region {
            std::env::set_var(REGION_VAR, region);
        }
    }
}

/// Source and destination roots of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageSettings {
    pub input_root: StorageLocation,
    pub output_root: StorageLocation,
}

impl StorageSettings {
    pub fn parse(input_root: &str, output_root: &str) -> Result<Self> {
        let input_root = StorageLocation::parse(input_root)
            .with_context(|| format!("Invalid input root: {}", input_root))?;
        let output_root = StorageLocation::parse(output_root)
            .with_context(|| format!("Invalid output root: {}", output_root))?;
        Ok(Self {
            input_root,
            output_root,
        })
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub credentials: Credentials,
    pub storage: StorageSettings,
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and the TOML file.
    /// TOML values override CLI values where present; roots fall back to the
    /// fixed defaults.
    pub fn resolve(cli: &CliConfig, file: FileConfig) -> Result<Self> {
        let section = file.aws.unwrap_or_default();

        let access_key_id = required_key(
            file.aws_access_key_id.or(section.aws_access_key_id),
            ACCESS_KEY_ID_VAR,
        )?;
        let secret_access_key = required_key(
            file.aws_secret_access_key.or(section.aws_secret_access_key),
            SECRET_ACCESS_KEY_VAR,
        )?;
        let region = file
            .aws_region
            .or(section.aws_region)
            .filter(|r| !r.trim().is_empty());

        let storage_file = file.storage.unwrap_or_default();
        let input_root = storage_file
            .input_root
            .or_else(|| cli.input_root.clone())
            .unwrap_or_else(|| DEFAULT_INPUT_ROOT.to_string());
        let output_root = storage_file
            .output_root
            .or_else(|| cli.output_root.clone())
            .unwrap_or_else(|| DEFAULT_OUTPUT_ROOT.to_string());

        Ok(Self {
            credentials: Credentials {
                access_key_id,
                secret_access_key,
                region,
            },
            storage: StorageSettings::parse(&input_root, &output_root)?,
        })
    }
}

fn required_key(value: Option<String>, key: &str) -> Result<String> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        Some(_) => bail!("{} must not be empty", key),
        None => bail!("{} must be specified in the config file", key),
    }
}
