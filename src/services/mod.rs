//! Services module - the configuration loading pipeline.
//!
//! The services are framework-agnostic: they take a [`ConfigSource`] and plain
//! callbacks, and know nothing about how progress or games are displayed.
//!
//! # Components
//!
//! - [`ConfigurationLoader`]: validates a source, parses it and normalizes the
//!   `games` list window by window, reporting progress and each window's games
//!   as it goes. Owns the session state machine
//!   (idle → validating → processing → completed/cancelled/failed).
//! - [`normalize_game`]: pure per-entry normalization and defaulting.
//! - [`ConfigSource`]: anything with a name, a size and text content
//!   ([`FileSource`], [`MemorySource`]).
//! - [`export_configuration`]: turns a [`LoadResult`](crate::models::LoadResult)
//!   into its downloadable form.
//!
//! # Usage Example
//!
//! ```ignore
//! use octoarcade::services::{ConfigurationLoader, FileSource};
//!
//! let loader = ConfigurationLoader::new(settings.loader);
//! let source = FileSource::open("test-configs/large_config.json")?;
//! loader.validate_source(&source)?;
//!
//! let result = loader
//!     .load(&source, |pct, msg| println!("{pct:.0}% {msg}"), |games, _, _| show(games))
//!     .await?;
//! ```

pub mod export;
pub mod loader;
pub mod normalize;
pub mod source;

pub use export::{ExportedConfiguration, export_configuration, write_export};
pub use loader::{ConfigurationLoader, LoadError, LoaderStatus};
pub use normalize::normalize_game;
pub use source::{ConfigSource, FileSource, MemorySource};
