// Linkshelf Settings Engine
// Loads process configuration from a JSON file, applies environment overrides,
// and resolves the database location.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::types::errors::ConfigError;
use crate::types::settings::AppConfig;

/// Environment variable naming the config file.
pub const CONFIG_ENV: &str = "LINKSHELF_CONFIG";
/// Environment variable naming the directory that holds the database.
pub const DATA_DIR_ENV: &str = "LINKSHELF_DATA_DIR";

const APP_DIR: &str = "linkshelf";
const DATABASE_FILE: &str = "linkshelf.db";

/// Trait defining the settings engine interface.
pub trait SettingsEngineTrait {
    fn load(&mut self) -> Result<AppConfig, ConfigError>;
    fn get_config(&self) -> &AppConfig;
    fn get_config_path(&self) -> &Path;
    /// Database file to open: `LINKSHELF_DATA_DIR`, then `database_path`, then the platform data dir.
    fn database_path(&self) -> PathBuf;
}

/// Settings engine reading a JSON config file.
pub struct SettingsEngine {
    config_path: PathBuf,
    config: AppConfig,
}

impl SettingsEngine {
    /// Creates a new SettingsEngine.
    ///
    /// If `path_override` is `Some`, uses that path. Otherwise uses `LINKSHELF_CONFIG`
    /// when set, falling back to `<config dir>/linkshelf/config.json`.
    pub fn new(path_override: Option<PathBuf>) -> Self {
        let config_path = path_override
            .or_else(|| env::var_os(CONFIG_ENV).map(PathBuf::from))
            .unwrap_or_else(|| {
                dirs::config_dir()
                    .unwrap_or_else(|| PathBuf::from("."))
                    .join(APP_DIR)
                    .join("config.json")
            });

        Self {
            config_path,
            config: AppConfig::default(),
        }
    }

    /// Creates an engine around an already-built config, without touching disk.
    pub fn from_config(config: AppConfig) -> Self {
        Self {
            config_path: PathBuf::new(),
            config,
        }
    }

    fn validate(config: &AppConfig) -> Result<(), ConfigError> {
        for (name, value) in [
            ("sign_in_path", &config.sign_in_path),
            ("home_path", &config.home_path),
            ("redirect_origin", &config.redirect_origin),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::InvalidValue(format!("{} must not be empty", name)));
            }
        }
        if let Some(path) = &config.database_path {
            if path.trim().is_empty() {
                return Err(ConfigError::InvalidValue(
                    "database_path must not be empty when set".to_string(),
                ));
            }
        }
        Ok(())
    }
}

impl SettingsEngineTrait for SettingsEngine {
    /// Loads the config file.
    ///
    /// A missing file yields defaults; a malformed one is a parse error.
    fn load(&mut self) -> Result<AppConfig, ConfigError> {
        if !self.config_path.exists() {
            self.config = AppConfig::default();
            return Ok(self.config.clone());
        }

        let content = fs::read_to_string(&self.config_path)
            .map_err(|e| ConfigError::Io(format!("Failed to read config file: {}", e)))?;

        let config: AppConfig = serde_json::from_str(&content)
            .map_err(|e| ConfigError::Parse(format!("Failed to parse config file: {}", e)))?;

        Self::validate(&config)?;
        self.config = config;
        Ok(self.config.clone())
    }

    fn get_config(&self) -> &AppConfig {
        &self.config
    }

    fn get_config_path(&self) -> &Path {
        &self.config_path
    }

    fn database_path(&self) -> PathBuf {
        if let Some(dir) = env::var_os(DATA_DIR_ENV) {
            return PathBuf::from(dir).join(DATABASE_FILE);
        }
        if let Some(path) = &self.config.database_path {
            return PathBuf::from(path);
        }
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR)
            .join(DATABASE_FILE)
    }
}
