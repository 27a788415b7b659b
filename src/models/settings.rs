use serde::{Deserialize, Serialize};

/// Default maximum source size: 10 MiB
pub const DEFAULT_MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// Default maximum number of games in one document
pub const DEFAULT_MAX_GAMES: usize = 1000;

/// Default number of games per window
pub const DEFAULT_CHUNK_SIZE: usize = 10;

/// Default pause between windows, in milliseconds
pub const DEFAULT_YIELD_DELAY_MS: u64 = 10;

/// Byte count expressed in MiB
pub fn bytes_to_mib(bytes: u64) -> f64 {
    bytes as f64 / (1024.0 * 1024.0)
}

/// Top-level settings file (`octoarcade.yaml`)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub loader: LoaderSettings,
    pub logging: LoggingSettings,
}

/// Limits and pacing for the configuration loader.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderSettings {
    /// Largest accepted source, in bytes
    pub max_file_size: u64,

    /// Largest accepted `games` list
    pub max_games: usize,

    /// Games normalized and reported per window
    pub chunk_size: usize,

    /// Pause after each window; also the cancellation checkpoint
    pub yield_delay_ms: u64,

    /// Recognized source extensions, without the dot
    pub allowed_extensions: Vec<String>,
}

impl Default for LoaderSettings {
    fn default() -> Self {
        Self {
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            max_games: DEFAULT_MAX_GAMES,
            chunk_size: DEFAULT_CHUNK_SIZE,
            yield_delay_ms: DEFAULT_YIELD_DELAY_MS,
            allowed_extensions: vec!["json".to_string()],
        }
    }
}

impl LoaderSettings {
    /// Check that the limits describe a usable loader.
    ///
    /// # Returns
    /// `Err` with a human-readable reason for the first invalid field
    pub fn validate(&self) -> Result<(), String> {
        if self.chunk_size == 0 {
            return Err("chunk_size must be at least 1".to_string());
        }
        if self.max_games == 0 {
            return Err("max_games must be at least 1".to_string());
        }
        if self.max_file_size == 0 {
            return Err("max_file_size must be at least 1 byte".to_string());
        }
        if self.allowed_extensions.is_empty() {
            return Err("allowed_extensions must name at least one extension".to_string());
        }
        Ok(())
    }

    /// Whether `extension` (without the dot) is a recognized configuration extension
    pub fn accepts_extension(&self, extension: &str) -> bool {
        self.allowed_extensions
            .iter()
            .any(|allowed| allowed.trim_start_matches('.').eq_ignore_ascii_case(extension))
    }

    /// Maximum source size in MiB, for messages
    pub fn max_file_size_mib(&self) -> f64 {
        bytes_to_mib(self.max_file_size)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub log_dir: String,
    pub log_prefix: String,
    pub debug_mode: bool,
    pub console_output: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            log_dir: "logs".to_string(),
            log_prefix: "octoarcade".to_string(),
            debug_mode: false,
            console_output: true,
        }
    }
}
