use clap::{Args, Subcommand, ValueEnum};

use homepantry::config::Config;

#[derive(Clone, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Args)]
pub struct ConfigCommand {
    #[command(subcommand)]
    pub command: ConfigSubcommand,
}

#[derive(Subcommand)]
pub enum ConfigSubcommand {
    /// Show current configuration values
    Show {
        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },
}

impl ConfigCommand {
    pub fn run(&self, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            ConfigSubcommand::Show { format } => {
                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(config)?);
                    }
                    OutputFormat::Text => print!("{}", render_text(config)),
                }
                Ok(())
            }
        }
    }
}

fn render_text(config: &Config) -> String {
    let mut out = String::new();
    out.push_str("Configuration\n");
    out.push_str("=============\n\n");

    match &config.config_file {
        Some(path) => out.push_str(&format!("Config file: {}\n\n", path.display())),
        None => out.push_str(&format!(
            "Config file: {} (not found)\n\n",
            Config::default_config_path().display()
        )),
    }

    out.push_str(&format!("port: {}\n", config.port));
    out.push_str(&format!("data_file: {}\n", config.data_file.display()));
    out.push_str(&format!("upload_dir: {}\n", config.upload_dir.display()));
    out.push_str(&format!("www_dir: {}\n", config.www_dir.display()));
    out.push_str(&format!(
        "ingress_entry: {}\n",
        config.ingress_entry.as_deref().unwrap_or("(discovered at startup)")
    ));
    out.push_str(&format!("supervisor_url: {}\n", config.supervisor_url));
    out.push_str(&format!("max_upload_bytes: {}\n", config.max_upload_bytes));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_text_lists_values() {
        let config = Config {
            ingress_entry: Some("/api/hassio_ingress/abc".to_string()),
            ..Config::default()
        };

        let text = render_text(&config);

        assert!(text.contains("port: 8099"));
        assert!(text.contains("data_file: /data/app_data.json"));
        assert!(text.contains("ingress_entry: /api/hassio_ingress/abc"));
        assert!(text.contains("(not found)"));
    }

    #[test]
    fn test_render_text_without_ingress_entry() {
        let text = render_text(&Config::default());
        assert!(text.contains("ingress_entry: (discovered at startup)"));
    }
}
