//! Data models for the OctoArcade configuration loader.
//!
//! - [`RawGame`]: borrowed view over one untyped entry of a document's `games` list
//! - [`NormalizedGame`]: a validated, defaulted game with payload fields reduced to presence flags
//! - [`LoadResult`]: the aggregate returned by a completed load
//! - [`AppConfig`] / [`LoaderSettings`] / [`LoggingSettings`]: settings loaded by
//!   [`ConfigManager`](crate::config::ConfigManager)

pub mod game;
pub mod result;
pub mod settings;

pub use game::{NormalizedGame, RawGame, ReleaseYear};
pub use result::{LoadResult, RESULT_KEYS};
pub use settings::{AppConfig, LoaderSettings, LoggingSettings};
