use chrono::Utc;
use clap::Args;
use std::path::PathBuf;

use homepantry::backup;
use homepantry::config::Config;

#[derive(Args)]
pub struct ExportCommand {
    /// Output file (default: homepantry-backup-<timestamp>.zip in the current directory)
    #[arg(long, short)]
    pub output: Option<PathBuf>,
}

impl ExportCommand {
    pub fn run(&self, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
        let output = self
            .output
            .clone()
            .unwrap_or_else(|| PathBuf::from(backup::archive_file_name(Utc::now())));

        backup::export_to(&config.data_file, &config.upload_dir, &output)?;

        println!("Backup written to {}", output.display());
        Ok(())
    }
}
