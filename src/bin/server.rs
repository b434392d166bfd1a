//! HomePantry add-on server
//!
//! Serves the HomePantry web app and its JSON API behind Home Assistant
//! Ingress.
//!
//! # Configuration
//!
//! Environment variables (override the config file):
//! - `HOMEPANTRY_CONFIG`: Path to config file (default: /data/homepantry.yaml)
//! - `HOMEPANTRY_PORT`: Port to listen on (default: 8099)
//! - `HOMEPANTRY_DATA_FILE`: JSON data file (default: /data/app_data.json)
//! - `HOMEPANTRY_UPLOAD_DIR`: Image directory (default: /data/images)
//! - `HOMEPANTRY_WWW_DIR`: Frontend directory (default: www)
//! - `HOMEPANTRY_INGRESS_ENTRY`: Fixed ingress base path (default: discovered)
//!
//! Set by the Home Assistant Supervisor:
//! - `SUPERVISOR_INGRESS_ENTRY`, `SUPERVISOR_TOKEN`
//!
//! # Config File Format
//!
//! ```yaml
//! port: 8099
//! data_file: /data/app_data.json
//! upload_dir: /data/images
//! www_dir: /app/www
//! ```

use clap::Parser;
use homepantry::config::Config;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "homepantry-server")]
#[command(version)]
#[command(about = "HomePantry Home Assistant add-on server", long_about = None)]
struct Args {
    /// Path to config file
    #[arg(long, short)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "homepantry=info,homepantry_server=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    // Load configuration
    let config = match Config::load(args.config) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("{}", e);
            std::process::exit(1);
        }
    };

    match &config.config_file {
        Some(path) => tracing::info!("Config file: {}", path.display()),
        None => tracing::info!("No config file, using defaults and environment"),
    }
    tracing::info!("Data file: {}", config.data_file.display());
    tracing::info!("Upload directory: {}", config.upload_dir.display());
    tracing::info!("Frontend directory: {}", config.www_dir.display());

    if let Err(e) = homepantry::server::serve(&config).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
