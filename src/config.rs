use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::collections::HashSet;

/// Command-line length budget for a single exiftool invocation.
pub const DEFAULT_CHAR_LIMIT: usize = 50_000;

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct AppConfig {
    pub exiftool_path: Option<String>,
    pub char_limit: usize,
    pub num_workers: usize,
    pub allowed_extensions: HashSet<String>,
    pub log_level: String,
    pub column_map_path: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        let allowed_extensions = [
            "jpg", "jpeg", "png", "tif", "tiff", "heic", "heif", "webp", "dng", "cr2", "nef",
            "arw", "mov", "mp4",
        ]
        .iter()
        .map(|ext| ext.to_string())
        .collect();

        Self {
            exiftool_path: None,
            char_limit: DEFAULT_CHAR_LIMIT,
            num_workers: 4,
            allowed_extensions,
            log_level: "warn".to_string(),
            column_map_path: None,
        }
    }
}

impl AppConfig {
    pub fn new() -> Result<Self, ConfigError> {
        let env = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(File::with_name("config/local").required(false))
            .add_source(Environment::with_prefix("PHOTO_TOOLS").try_parsing(true))
            .build()?;

        let mut config: AppConfig = s.try_deserialize()?;
        config.allowed_extensions = config
            .allowed_extensions
            .into_iter()
            .map(|ext| ext.trim_start_matches('.').to_lowercase())
            .collect();
        Ok(config)
    }
}
