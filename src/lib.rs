// OctoArcade - chunked configuration loader for arcade cabinet game collections
//
// This is the library crate containing the loading pipeline and its data structures.
// The binary crate (main.rs) provides the command line entry point.

pub mod config;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod services;
pub mod state;

// Re-export commonly used types for convenience
pub use config::ConfigManager;
pub use metrics::{UsageSnapshot, UsageTracker};
pub use models::{AppConfig, LoadResult, LoaderSettings, NormalizedGame};
pub use services::{ConfigSource, ConfigurationLoader, FileSource, LoadError, MemorySource};
pub use state::{LoadPhase, StateChange, StateManager};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
