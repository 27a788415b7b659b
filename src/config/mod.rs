use crate::models::AppConfig;
use anyhow::{Context, Result, anyhow};
use camino::{Utf8Path, Utf8PathBuf};
use std::fs;

/// Name of the settings file inside the settings directory
pub const SETTINGS_FILE_NAME: &str = "octoarcade.yaml";

/// Default prefix for environment overrides (`OCTOARCADE_LOADER__CHUNK_SIZE=25`)
pub const DEFAULT_ENV_PREFIX: &str = "OCTOARCADE";

/// Configuration manager for the loader's YAML settings file.
///
/// Settings are layered, later sources winning:
/// 1. Built-in defaults ([`AppConfig::default`])
/// 2. `octoarcade.yaml` in the settings directory (optional)
/// 3. Environment variables `<PREFIX>_<SECTION>__<KEY>`
#[derive(Debug, Clone)]
pub struct ConfigManager {
    config_dir: Utf8PathBuf,
    settings_path: Utf8PathBuf,
    env_prefix: String,
}

impl ConfigManager {
    /// Create a new ConfigManager with the specified settings directory.
    ///
    /// # Arguments
    /// * `config_dir` - Directory holding `octoarcade.yaml`; created if missing
    pub fn new<P: AsRef<Utf8Path>>(config_dir: P) -> Result<Self> {
        let config_dir = config_dir.as_ref().to_path_buf();

        if !config_dir.exists() {
            fs::create_dir_all(&config_dir)
                .with_context(|| format!("Failed to create config directory: {}", config_dir))?;
        }

        Ok(Self {
            settings_path: config_dir.join(SETTINGS_FILE_NAME),
            env_prefix: DEFAULT_ENV_PREFIX.to_string(),
            config_dir,
        })
    }

    /// Use a different environment variable prefix
    pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    /// Load and validate the layered settings.
    ///
    /// # Returns
    /// The merged AppConfig, or defaults if neither the file nor any
    /// environment override is present
    pub fn load_config(&self) -> Result<AppConfig> {
        if !self.settings_path.exists() {
            tracing::warn!(
                "Settings file not found at {}, using defaults",
                self.settings_path
            );
        }

        let layered = config::Config::builder()
            .add_source(
                config::File::from(self.settings_path.as_std_path())
                    .format(config::FileFormat::Yaml)
                    .required(false),
            )
            .add_source(
                config::Environment::with_prefix(&self.env_prefix)
                    .prefix_separator("_")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("loader.allowed_extensions")
                    .try_parsing(true),
            )
            .build()
            .with_context(|| format!("Failed to read settings: {}", self.settings_path))?;

        let config: AppConfig = layered
            .try_deserialize()
            .with_context(|| format!("Failed to parse settings: {}", self.settings_path))?;

        config
            .loader
            .validate()
            .map_err(|reason| anyhow!("Invalid loader settings: {}", reason))?;

        tracing::info!(
            "Loaded settings: max_file_size={}, max_games={}, chunk_size={}, yield_delay={}ms",
            config.loader.max_file_size,
            config.loader.max_games,
            config.loader.chunk_size,
            config.loader.yield_delay_ms
        );
        Ok(config)
    }

    /// Save the settings file.
    ///
    /// # Arguments
    /// * `config` - The AppConfig to save
    pub fn save_config(&self, config: &AppConfig) -> Result<()> {
        let yaml_string =
            serde_yaml_ng::to_string(config).context("Failed to serialize settings to YAML")?;

        fs::write(&self.settings_path, yaml_string)
            .with_context(|| format!("Failed to write settings: {}", self.settings_path))?;

        tracing::info!("Saved settings to {}", self.settings_path);
        Ok(())
    }

    /// Get the settings directory path.
    pub fn config_dir(&self) -> &Utf8Path {
        &self.config_dir
    }

    /// Get the settings file path.
    pub fn settings_path(&self) -> &Utf8Path {
        &self.settings_path
    }
}
