use crate::metrics::{UsageSnapshot, UsageTracker};
use crate::models::settings::bytes_to_mib;
use crate::models::{LoadResult, LoaderSettings, NormalizedGame, RESULT_KEYS};
use crate::services::normalize::normalize_game;
use crate::services::source::ConfigSource;
use crate::state::{LoadPhase, SessionGuard, StateManager};
use chrono::Utc;
use indexmap::IndexMap;
use serde_json::Value;
use std::collections::HashSet;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::watch;

/// Errors that end a load session
///
/// Every variant is terminal for the session; nothing is retried internally.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Configuration loading already in progress")]
    Busy,

    #[error("{name}: file must be a JSON configuration file")]
    WrongType { name: String },

    #[error("File too large ({size} bytes). Maximum size is {}MB", bytes_to_mib(*max))]
    TooLarge { size: u64, max: u64 },

    #[error("Invalid JSON configuration file: {0}")]
    MalformedDocument(#[source] serde_json::Error),

    #[error("{0}")]
    InvalidSchema(String),

    #[error("Game at index {index} missing required '{field}' field")]
    MissingField { index: usize, field: &'static str },

    #[error("Loading cancelled by user")]
    Cancelled,

    #[error("Failed to read file: {0}")]
    ReadFailure(#[source] std::io::Error),
}

impl LoadError {
    /// Stable name of the variant, for logs and exit codes
    pub fn kind(&self) -> &'static str {
        match self {
            LoadError::Busy => "busy",
            LoadError::WrongType { .. } => "wrong_type",
            LoadError::TooLarge { .. } => "too_large",
            LoadError::MalformedDocument(_) => "malformed_document",
            LoadError::InvalidSchema(_) => "invalid_schema",
            LoadError::MissingField { .. } => "missing_field",
            LoadError::Cancelled => "cancelled",
            LoadError::ReadFailure(_) => "read_failure",
        }
    }

    /// Phase a session ends in when it fails with this error
    fn terminal_phase(&self) -> LoadPhase {
        match self {
            LoadError::Cancelled => LoadPhase::Cancelled,
            _ => LoadPhase::Failed,
        }
    }
}

/// Result of [`ConfigurationLoader::status`]
#[derive(Debug, Clone, PartialEq)]
pub struct LoaderStatus {
    pub is_loading: bool,
    pub phase: LoadPhase,
    pub memory_stats: UsageSnapshot,
}

/// Chunked configuration loader
///
/// Reads a game collection document, validates its shape, then normalizes the
/// `games` list in fixed-size windows. After each window it reports progress,
/// hands the window's games to the caller, pauses briefly and records a usage
/// checkpoint. Cancellation is cooperative and only honored at the start of a
/// window.
///
/// One loader runs one session at a time; a concurrent [`load`](Self::load)
/// fails with [`LoadError::Busy`]. The loader is reusable once a session ends.
///
/// # Example
/// ```ignore
/// let loader = ConfigurationLoader::new(LoaderSettings::default());
/// let source = FileSource::open("configs/large_config.json")?;
///
/// let result = loader
///     .load(
///         &source,
///         |percent, message| println!("{:>5.1}% {}", percent, message),
///         |games, processed, total| println!("{} new games ({}/{})", games.len(), processed, total),
///     )
///     .await?;
/// ```
pub struct ConfigurationLoader {
    settings: LoaderSettings,
    state: StateManager,
}

impl ConfigurationLoader {
    /// Create a loader with the platform memory probe
    pub fn new(settings: LoaderSettings) -> Self {
        Self::with_tracker(settings, UsageTracker::new())
    }

    /// Create a loader around a specific usage tracker
    pub fn with_tracker(settings: LoaderSettings, tracker: UsageTracker) -> Self {
        Self {
            settings,
            state: StateManager::with_tracker(tracker),
        }
    }

    pub fn settings(&self) -> &LoaderSettings {
        &self.settings
    }

    /// Session state, for subscribing to [`StateChange`](crate::state::StateChange) events
    pub fn state(&self) -> &StateManager {
        &self.state
    }

    /// Check a source's size and extension without reading it.
    ///
    /// # Errors
    /// - [`LoadError::TooLarge`] if the source exceeds `max_file_size`
    /// - [`LoadError::WrongType`] if its extension is not recognized
    pub fn validate_source<S: ConfigSource>(&self, source: &S) -> Result<(), LoadError> {
        if source.size() > self.settings.max_file_size {
            return Err(LoadError::TooLarge {
                size: source.size(),
                max: self.settings.max_file_size,
            });
        }

        let recognized = source
            .extension()
            .is_some_and(|ext| self.settings.accepts_extension(ext));
        if !recognized {
            return Err(LoadError::WrongType {
                name: source.name().to_string(),
            });
        }

        Ok(())
    }

    /// Check the top-level shape of a parsed document.
    ///
    /// # Returns
    /// The number of games in the document
    ///
    /// # Errors
    /// [`LoadError::InvalidSchema`] if the document is not an object, has no
    /// `games` array, or the array is empty or longer than `max_games`
    pub fn validate_document(&self, document: &Value) -> Result<usize, LoadError> {
        let object = document.as_object().ok_or_else(|| {
            LoadError::InvalidSchema("Configuration must be a valid JSON object".to_string())
        })?;

        let games = object
            .get("games")
            .and_then(Value::as_array)
            .ok_or_else(|| {
                LoadError::InvalidSchema("Configuration must contain a \"games\" array".to_string())
            })?;

        if games.is_empty() {
            return Err(LoadError::InvalidSchema(
                "Configuration must contain at least one game".to_string(),
            ));
        }

        if games.len() > self.settings.max_games {
            return Err(LoadError::InvalidSchema(format!(
                "Configuration contains too many games (maximum {})",
                self.settings.max_games
            )));
        }

        Ok(games.len())
    }

    /// Load a configuration, delivering normalized games window by window.
    ///
    /// `on_progress(percent, message)` is called once with 0% before the first
    /// window and once after every window. `on_chunk(games, processed, total)`
    /// receives only the games normalized in that window, in input order.
    ///
    /// Windows already delivered stay delivered if the session later fails or
    /// is cancelled.
    pub async fn load<S, P, C>(
        &self,
        source: &S,
        mut on_progress: P,
        mut on_chunk: C,
    ) -> Result<LoadResult, LoadError>
    where
        S: ConfigSource,
        P: FnMut(f64, &str),
        C: FnMut(&[NormalizedGame], usize, usize),
    {
        let session = self.state.begin_session(source.name())?;
        tracing::info!("Loading configuration from {} ({} bytes)", source.name(), source.size());

        let outcome = self
            .run_session(source, &session, &mut on_progress, &mut on_chunk)
            .await;

        match &outcome {
            Ok(result) => {
                tracing::info!("Loaded {} games from {}", result.total_games, source.name());
                self.state.log_usage_summary();
                session.finish(LoadPhase::Completed);
            }
            Err(LoadError::Cancelled) => {
                tracing::warn!("Loading of {} cancelled", source.name());
                session.finish(LoadPhase::Cancelled);
            }
            Err(e) => {
                tracing::error!("Failed to load {}: {} ({})", source.name(), e, e.kind());
                session.finish(e.terminal_phase());
            }
        }

        outcome
    }

    async fn run_session<S, P, C>(
        &self,
        source: &S,
        session: &SessionGuard<'_>,
        on_progress: &mut P,
        on_chunk: &mut C,
    ) -> Result<LoadResult, LoadError>
    where
        S: ConfigSource,
        P: FnMut(f64, &str),
        C: FnMut(&[NormalizedGame], usize, usize),
    {
        self.validate_source(source)?;

        // The whole text is held once; max_file_size is the bound on raw input.
        // The source may have grown since it was described, so the read itself
        // is capped and measured again.
        let max = self.settings.max_file_size;
        let text = source.read_text(max).await.map_err(LoadError::ReadFailure)?;
        if text.len() as u64 > max {
            return Err(LoadError::TooLarge {
                size: text.len() as u64,
                max,
            });
        }
        let document: Value = serde_json::from_str(&text).map_err(LoadError::MalformedDocument)?;
        drop(text);

        let total = self.validate_document(&document)?;
        let (metadata, games) = split_document(document);

        session.start_processing();
        on_progress(0.0, &format!("Validating {} games...", total));

        let chunk_size = self.settings.chunk_size.max(1);
        let mut cancel_rx = self.state.cancel_signal();
        let mut normalized: Vec<NormalizedGame> = Vec::with_capacity(total);
        let mut seen_ids: HashSet<String> = HashSet::with_capacity(total);
        let mut raw_games = games.into_iter();
        let mut processed = 0;

        while processed < total {
            if self.state.cancel_requested() {
                return Err(LoadError::Cancelled);
            }

            // Each window's raw entries are dropped once normalized
            let window: Vec<Value> = raw_games.by_ref().take(chunk_size).collect();
            let window_start = processed;
            let loaded_at = Utc::now().timestamp_millis();

            for (offset, entry) in window.iter().enumerate() {
                let index = window_start + offset;
                let mut game = normalize_game(entry, index, loaded_at)?;
                game.id = unique_id(game.id, index, &mut seen_ids);
                normalized.push(game);
                self.state.track("game_processed");
            }

            processed += window.len();
            drop(window);

            let percent = processed as f64 * 100.0 / total as f64;
            on_progress(percent, &format!("Loaded {}/{} games...", processed, total));
            on_chunk(&normalized[window_start..processed], processed, total);
            self.state.record_progress(processed, total);

            tracing::debug!(
                "Window {}..{} delivered ({}/{})",
                window_start,
                processed,
                processed,
                total
            );

            self.pause(&mut cancel_rx).await;
            self.state.checkpoint();
        }

        Ok(LoadResult {
            metadata,
            total_games: normalized.len(),
            games: normalized,
            loaded_at: Utc::now(),
            memory_stats: self.state.usage(),
        })
    }

    /// Inter-window pause. Returns early if cancellation is requested meanwhile.
    async fn pause(&self, cancel_rx: &mut watch::Receiver<bool>) {
        if self.settings.yield_delay_ms == 0 {
            tokio::task::yield_now().await;
            return;
        }

        let delay = Duration::from_millis(self.settings.yield_delay_ms);
        tokio::select! {
            _ = tokio::time::sleep(delay) => {}
            _ = cancel_rx.wait_for(|cancelled| *cancelled) => {}
        }
    }

    /// Request cancellation of the in-flight session.
    ///
    /// Idempotent. Takes effect at the next window boundary; the window being
    /// normalized when this is called is still delivered. Does nothing when no
    /// session is in flight.
    pub fn cancel(&self) {
        if self.state.request_cancel() {
            tracing::info!("Cancellation requested - loading will stop after the current window");
        } else {
            tracing::debug!("Cancellation requested with no load in progress");
        }
    }

    /// Whether a session is in flight, the current phase and the tracker statistics
    pub fn status(&self) -> LoaderStatus {
        let phase = self.state.phase();
        LoaderStatus {
            is_loading: phase.is_active(),
            phase,
            memory_stats: self.state.usage(),
        }
    }
}

impl Default for ConfigurationLoader {
    fn default() -> Self {
        Self::new(LoaderSettings::default())
    }
}

/// Split a validated document into passthrough metadata and the raw games list
fn split_document(document: Value) -> (IndexMap<String, Value>, Vec<Value>) {
    let Value::Object(mut object) = document else {
        return (IndexMap::new(), Vec::new());
    };

    let games = match object.shift_remove("games") {
        Some(Value::Array(games)) => games,
        _ => Vec::new(),
    };

    let metadata = object
        .into_iter()
        .filter(|(key, _)| !RESULT_KEYS.contains(&key.as_str()))
        .collect();

    (metadata, games)
}

/// Make `id` unique among the ids already issued in this session
fn unique_id(id: String, index: usize, seen: &mut HashSet<String>) -> String {
    if seen.insert(id.clone()) {
        return id;
    }

    let mut candidate = format!("{}#{}", id, index);
    while !seen.insert(candidate.clone()) {
        candidate = format!("{}#{}", candidate, index);
    }

    tracing::warn!(
        "Duplicate game id '{}' at index {} - using '{}'",
        id,
        index,
        candidate
    );
    candidate
}
