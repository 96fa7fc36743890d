use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

/// Contents of the TOML credentials/config file.
///
/// The AWS keys may sit at the top level or inside an `[AWS]` table.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct FileConfig {
    #[serde(rename = "AWS_ACCESS_KEY_ID")]
    pub aws_access_key_id: Option<String>,
    #[serde(rename = "AWS_SECRET_ACCESS_KEY")]
    pub aws_secret_access_key: Option<String>,
    #[serde(rename = "AWS_REGION")]
    pub aws_region: Option<String>,

    #[serde(rename = "AWS")]
    pub aws: Option<AwsConfig>,
    pub storage: Option<StorageConfig>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct AwsConfig {
    #[serde(rename = "AWS_ACCESS_KEY_ID")]
    pub aws_access_key_id: Option<String>,
    #[serde(rename = "AWS_SECRET_ACCESS_KEY")]
    pub aws_secret_access_key: Option<String>,
    #[serde(rename = "AWS_REGION")]
    pub aws_region: Option<String>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct StorageConfig {
    pub input_root: Option<String>,
    pub output_root: Option<String>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        Self::parse(&content).with_context(|| format!("Failed to parse config file: {:?}", path))
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }
}
