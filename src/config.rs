use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default location of the optional config file inside the add-on container.
const DEFAULT_CONFIG_PATH: &str = "/data/homepantry.yaml";

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Port to listen on
    pub port: u16,
    /// JSON document holding all collections
    pub data_file: PathBuf,
    /// Directory for uploaded images
    pub upload_dir: PathBuf,
    /// Directory with the web frontend (index.html and assets)
    pub www_dir: PathBuf,
    /// Ingress base path; when unset it is discovered at startup
    pub ingress_entry: Option<String>,
    /// Base URL of the Home Assistant Supervisor API
    pub supervisor_url: String,
    /// Maximum accepted image upload size in bytes
    pub max_upload_bytes: usize,
    /// Config file the values were read from, if any
    #[serde(skip_deserializing)]
    pub config_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8099,
            data_file: PathBuf::from("/data/app_data.json"),
            upload_dir: PathBuf::from("/data/images"),
            www_dir: PathBuf::from("www"),
            ingress_entry: None,
            supervisor_url: "http://supervisor".to_string(),
            max_upload_bytes: 16 * 1024 * 1024,
            config_file: None,
        }
    }
}

impl Config {
    /// Load configuration with priority: env vars > config file > defaults
    pub fn load(config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        // Start with defaults
        let mut config = Self::default();

        // Try to load from config file
        let path = config_path.unwrap_or_else(Self::default_config_path);
        if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .map_err(|e| ConfigError::ReadError(path.clone(), e))?;
            config = serde_yaml::from_str(&contents)
                .map_err(|e| ConfigError::ParseError(path.clone(), e))?;
            config.config_file = Some(path);
        }

        config.apply_overrides(|name| std::env::var(name).ok())?;

        Ok(config)
    }

    /// Apply `HOMEPANTRY_*` overrides from the given variable lookup.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(port) = lookup("HOMEPANTRY_PORT") {
            self.port = port
                .parse()
                .map_err(|_| ConfigError::InvalidEnv("HOMEPANTRY_PORT", port))?;
        }
        if let Some(data_file) = lookup("HOMEPANTRY_DATA_FILE") {
            self.data_file = PathBuf::from(data_file);
        }
        if let Some(upload_dir) = lookup("HOMEPANTRY_UPLOAD_DIR") {
            self.upload_dir = PathBuf::from(upload_dir);
        }
        if let Some(www_dir) = lookup("HOMEPANTRY_WWW_DIR") {
            self.www_dir = PathBuf::from(www_dir);
        }
        if let Some(entry) = lookup("HOMEPANTRY_INGRESS_ENTRY") {
            self.ingress_entry = Some(entry);
        }
        if let Some(url) = lookup("HOMEPANTRY_SUPERVISOR_URL") {
            self.supervisor_url = url;
        }
        if let Some(max) = lookup("HOMEPANTRY_MAX_UPLOAD_BYTES") {
            self.max_upload_bytes = max
                .parse()
                .map_err(|_| ConfigError::InvalidEnv("HOMEPANTRY_MAX_UPLOAD_BYTES", max))?;
        }
        Ok(())
    }

    /// Config file path: `HOMEPANTRY_CONFIG`, or /data/homepantry.yaml
    pub fn default_config_path() -> PathBuf {
        std::env::var("HOMEPANTRY_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH))
    }
}

#[derive(Debug)]
pub enum ConfigError {
    ReadError(PathBuf, std::io::Error),
    ParseError(PathBuf, serde_yaml::Error),
    InvalidEnv(&'static str, String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::ReadError(path, e) => {
                write!(f, "Failed to read config file '{}': {}", path.display(), e)
            }
            ConfigError::ParseError(path, e) => {
                write!(
                    f,
                    "Failed to parse config file '{}': {}",
                    path.display(),
                    e
                )
            }
            ConfigError::InvalidEnv(name, value) => {
                write!(f, "Invalid value '{}' for {}", value, name)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::tempdir;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.port, 8099);
        assert_eq!(config.data_file, PathBuf::from("/data/app_data.json"));
        assert!(config.ingress_entry.is_none());
    }

    #[test]
    fn test_load_no_file_uses_defaults() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("nonexistent.yaml");

        let config = Config::load(Some(config_path)).unwrap();
        assert_eq!(config.supervisor_url, "http://supervisor");
        assert!(config.config_file.is_none());
    }

    #[test]
    fn test_load_from_file() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config.yaml");

        let mut file = std::fs::File::create(&config_path).unwrap();
        writeln!(file, "data_file: /custom/data.json").unwrap();
        writeln!(file, "ingress_entry: /api/hassio_ingress/abc").unwrap();

        let config = Config::load(Some(config_path.clone())).unwrap();
        assert_eq!(config.data_file, PathBuf::from("/custom/data.json"));
        assert_eq!(
            config.ingress_entry.as_deref(),
            Some("/api/hassio_ingress/abc")
        );
        // Unset fields keep their defaults
        assert_eq!(config.upload_dir, PathBuf::from("/data/images"));
        assert_eq!(config.config_file, Some(config_path));
    }

    #[test]
    fn test_env_overrides_file_values() {
        let mut config = Config {
            port: 9000,
            ..Config::default()
        };

        config
            .apply_overrides(lookup_from(&[
                ("HOMEPANTRY_PORT", "8123"),
                ("HOMEPANTRY_UPLOAD_DIR", "/tmp/img"),
                ("HOMEPANTRY_MAX_UPLOAD_BYTES", "1024"),
            ]))
            .unwrap();

        assert_eq!(config.port, 8123);
        assert_eq!(config.upload_dir, PathBuf::from("/tmp/img"));
        assert_eq!(config.max_upload_bytes, 1024);
        assert_eq!(config.www_dir, PathBuf::from("www"));
    }

    #[test]
    fn test_invalid_env_value() {
        let mut config = Config::default();

        let err = config
            .apply_overrides(lookup_from(&[("HOMEPANTRY_PORT", "eighty")]))
            .unwrap_err();

        assert!(err.to_string().contains("HOMEPANTRY_PORT"));
        assert_eq!(config.port, 8099);
    }

    #[test]
    fn test_invalid_yaml_error() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config.yaml");

        let mut file = std::fs::File::create(&config_path).unwrap();
        writeln!(file, "invalid: yaml: content: [").unwrap();

        let result = Config::load(Some(config_path));
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }
}
