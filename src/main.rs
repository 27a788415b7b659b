//! OctoArcade - load an arcade cabinet configuration from the command line
//!
//! # Overview
//!
//! This binary drives the [`ConfigurationLoader`] over a JSON game collection:
//! - Settings from `<settings-dir>/octoarcade.yaml` plus `OCTOARCADE_*` overrides
//! - Logging to `logs/octoarcade.<date>` and stderr
//! - Progress and each delivered window printed to stdout
//! - Ctrl-C requests cancellation; the load stops at the next window boundary
//! - `--export` writes the normalized collection as JSON
//!
//! Exit code is 0 on success, 1 on any load or setup failure.

use anyhow::{Context, Result};
use camino::Utf8PathBuf;
use clap::Parser;
use octoarcade::services::{export_configuration, write_export};
use octoarcade::{APP_NAME, ConfigManager, ConfigSource, ConfigurationLoader, FileSource, VERSION};
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "octoarcade", version, about = "Load and validate an arcade cabinet configuration")]
struct Cli {
    /// Configuration file to load (.json)
    config: Utf8PathBuf,

    /// Directory holding octoarcade.yaml
    #[arg(long, default_value = ".")]
    settings_dir: Utf8PathBuf,

    /// Write the normalized configuration to this file
    #[arg(long)]
    export: Option<Utf8PathBuf>,

    /// Debug-level logging
    #[arg(long)]
    debug: bool,

    /// Only validate size and type; do not load
    #[arg(long)]
    check_only: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_manager = ConfigManager::new(&cli.settings_dir)?;
    let mut app_config = config_manager.load_config()?;
    if cli.debug {
        app_config.logging.debug_mode = true;
    }

    let _log_guard = octoarcade::logging::setup_logging(&app_config.logging)?;
    tracing::info!("Starting {} v{}", APP_NAME, VERSION);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .worker_threads(2)
        .thread_name("octoarcade-worker")
        .build()?;

    let loader = Arc::new(ConfigurationLoader::new(app_config.loader));
    let source = FileSource::open(&cli.config)
        .with_context(|| format!("Failed to open configuration: {}", cli.config))?;

    if cli.check_only {
        loader
            .validate_source(&source)
            .with_context(|| format!("{} failed validation", source.name()))?;
        let settings = loader.settings();
        println!(
            "{} ({} bytes): OK (limit {:.1}MB, up to {} games)",
            source.name(),
            source.size(),
            settings.max_file_size_mib(),
            settings.max_games
        );
        return Ok(());
    }

    // Ctrl-C only flags the session; the loader stops at its next window
    let cancel_loader = loader.clone();
    runtime.spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received - cancelling load");
            cancel_loader.cancel();
        }
    });

    let outcome = runtime.block_on(loader.load(
        &source,
        |percent, message| println!("[{:>5.1}%] {}", percent, message),
        |games, processed, total| {
            let names: Vec<&str> = games.iter().map(|g| g.name.as_str()).collect();
            println!("  +{} ({}/{}): {}", games.len(), processed, total, names.join(", "));
        },
    ));

    let result = match outcome {
        Ok(result) => result,
        Err(e) => {
            runtime.shutdown_timeout(std::time::Duration::from_secs(1));
            return Err(e).context("Error loading configuration");
        }
    };

    println!(
        "Successfully loaded {} games from {}",
        result.total_games,
        result.name().unwrap_or(source.name())
    );
    let stats = &result.memory_stats;
    println!(
        "Memory: start {}, current {}, peak {} | operations {}, checkpoints {}",
        stats.start_memory, stats.current_memory, stats.peak_memory, stats.operations, stats.checkpoints
    );

    if let Some(path) = &cli.export {
        write_export(path, &export_configuration(&result))?;
        println!("Exported to {}", path);
    }

    runtime.shutdown_timeout(std::time::Duration::from_secs(1));
    tracing::info!("Shutdown complete");
    Ok(())
}
