use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use data_lake_etl::config::{self, AppConfig, CliConfig, FileConfig};
use data_lake_etl::{create_session, run_pipeline};

fn parse_path(s: &str) -> Result<PathBuf, String> {
    let path_buf = PathBuf::from(s);
    if path_buf.is_absolute() {
        return Ok(path_buf);
    }
    let cwd = std::env::current_dir().map_err(|e| format!("Failed to get current dir: {}", e))?;
    Ok(cwd.join(path_buf))
}

#[derive(Parser, Debug)]
#[command(name = "data-lake-etl")]
#[command(about = "Build the songplays star schema from raw song and event-log JSON")]
struct CliArgs {
    /// Path to the TOML file holding the AWS credentials. Values in the file
    /// override CLI arguments.
    #[clap(long, value_parser = parse_path, default_value = config::DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    /// Root holding `song-data/` and `log_data/` (URL or local directory).
    #[clap(long)]
    pub input_root: Option<String>,

    /// Root the star-schema tables are written under (URL or local directory).
    #[clap(long)]
    pub output_root: Option<String>,
}

impl From<&CliArgs> for CliConfig {
    fn from(args: &CliArgs) -> Self {
        CliConfig {
            input_root: args.input_root.clone(),
            output_root: args.output_root.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()?;

    info!("Loading configuration from {:?}", cli_args.config);
    let file_config = FileConfig::load(&cli_args.config)?;
    let app_config = AppConfig::resolve(&(&cli_args).into(), file_config)?;

    info!("Configuration loaded:");
    info!("  input_root: {}", app_config.storage.input_root);
    info!("  output_root: {}", app_config.storage.output_root);

    app_config.credentials.export_to_env();
    let ctx = create_session(&app_config.storage).context("Failed to create session")?;

    let summary = run_pipeline(&ctx, &app_config.storage)
        .await
        .context("Pipeline run failed")?;

    info!("Run Summary");
    info!("===========");
    for (table, rows) in summary.tables() {
        info!("{}: {} rows", table, rows);
    }

    Ok(())
}
