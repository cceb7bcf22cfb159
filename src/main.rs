//! roomtrace - movement/conversation data synchronization engine
//!
//! Ingests CSV recordings of movement, conversation, and code intervals,
//! runs the synchronization pipeline, and reports or exports the result.

use roomtrace::app::cli::{Cli, Commands, ConfigAction, SchemaKind};
use roomtrace::app::config::Config;
use roomtrace::sync::engine::{SnapshotFile, SyncEngine};
use roomtrace::table::loader;
use roomtrace::table::validate;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    // Parse CLI arguments first so we can use --verbose to set log level
    let cli = Cli::parse_args();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    let config = if let Some(path) = &cli.config {
        Config::load(path)?
    } else {
        Config::load_default()?
    };

    match cli.command {
        Commands::Sync {
            movement,
            conversation,
            codes,
            output,
            stop_threshold,
        } => {
            run_sync(
                &movement,
                conversation.as_deref(),
                &codes,
                output.as_deref(),
                stop_threshold,
                &config,
            )?;
        }
        Commands::Inspect { snapshot } => {
            run_inspect(&snapshot)?;
        }
        Commands::Validate { file, kind } => {
            run_validate(&file, kind)?;
        }
        Commands::Config { action } => {
            run_config(action, &config)?;
        }
    }

    Ok(())
}

fn run_sync(
    movement: &[PathBuf],
    conversation: Option<&Path>,
    codes: &[PathBuf],
    output: Option<&Path>,
    stop_threshold: Option<f64>,
    config: &Config,
) -> anyhow::Result<()> {
    let mut engine = SyncEngine::with_config(config);

    // Rejections are local: report and keep going with the other files.
    for path in movement {
        match loader::load_csv(path).and_then(|t| engine.load_movement(&t)) {
            Ok(()) => {}
            Err(e) => warn!("skipping movement file {}: {}", path.display(), e),
        }
    }

    if let Some(path) = conversation {
        match loader::load_csv(path).and_then(|t| engine.load_conversation(&t)) {
            Ok(()) => {}
            Err(e) => warn!("skipping conversation file {}: {}", path.display(), e),
        }
    }

    for path in codes {
        match loader::load_csv(path).and_then(|t| engine.load_code_table(&t)) {
            Ok(()) => {}
            Err(e) => warn!("skipping code file {}: {}", path.display(), e),
        }
    }

    if let Some(threshold) = stop_threshold {
        engine.set_stop_threshold(threshold);
    }

    info!(
        trails = engine.trails().len(),
        speakers = engine.speakers().len(),
        code_tables = engine.code_tables().len(),
        total_time = engine.total_time(),
        "synchronization complete"
    );
    for trail in engine.trails() {
        let stops = trail.movement.iter().filter(|p| p.is_stopped).count();
        info!(
            name = %trail.name,
            samples = trail.movement.len(),
            turns = trail.conversation.len(),
            stopped_samples = stops,
            "trail"
        );
    }

    if let Some(path) = output {
        let snapshot = engine.snapshot();
        let json = if config.export.pretty {
            serde_json::to_string_pretty(&snapshot)?
        } else {
            serde_json::to_string(&snapshot)?
        };
        std::fs::write(path, json)?;
        info!("snapshot written to {}", path.display());
    }

    Ok(())
}

fn run_inspect(path: &Path) -> anyhow::Result<()> {
    let content = std::fs::read_to_string(path)?;
    let snapshot: SnapshotFile = serde_json::from_str(&content)?;

    println!(
        "{} (format {}, generated {})",
        path.display(),
        snapshot.format_version,
        snapshot.generated_at.to_rfc3339()
    );
    println!("total time: {:.1}", snapshot.total_time);

    println!("trails: {}", snapshot.trails.len());
    for trail in &snapshot.trails {
        let stops = trail.movement.iter().filter(|p| p.is_stopped).count();
        println!(
            "  {}: {} samples, {} turns, {} stopped samples",
            trail.name,
            trail.movement.len(),
            trail.conversation.len(),
            stops
        );
    }

    println!("speakers: {}", snapshot.speakers.len());
    for speaker in &snapshot.speakers {
        println!("  {} ({})", speaker.name, speaker.color);
    }

    println!("code tables: {}", snapshot.code_tables.len());
    for table in &snapshot.code_tables {
        println!("  {}: {} intervals", table.name, table.intervals().len());
    }

    Ok(())
}

fn run_validate(file: &Path, kind: SchemaKind) -> anyhow::Result<()> {
    let table = loader::load_csv(file)?;
    let result = match kind {
        SchemaKind::Movement => validate::check_table(
            &table,
            &validate::MOVEMENT_COLUMNS,
            validate::is_movement_row,
            "movement",
        ),
        SchemaKind::Conversation => validate::check_table(
            &table,
            &validate::CONVERSATION_COLUMNS,
            validate::is_conversation_row,
            "conversation",
        ),
        SchemaKind::Code => validate::check_table(
            &table,
            &validate::CODE_COLUMNS,
            validate::is_code_row,
            "code",
        ),
    };

    match result {
        Ok(()) => {
            println!("{}: OK ({} rows)", file.display(), table.rows.len());
            Ok(())
        }
        Err(e) => {
            println!("{}: REJECTED - {}", file.display(), e);
            std::process::exit(1);
        }
    }
}

fn run_config(action: ConfigAction, config: &Config) -> anyhow::Result<()> {
    match action {
        ConfigAction::Show => {
            println!("{}", config.to_toml()?);
        }
        ConfigAction::Init { force } => {
            let path = Config::default_path();
            if path.exists() && !force {
                warn!(
                    "config already exists at {} (use --force to overwrite)",
                    path.display()
                );
            } else {
                Config::default().save(&path)?;
                info!("config written to {}", path.display());
            }
        }
        ConfigAction::Path => {
            println!("{}", Config::default_path().display());
        }
    }
    Ok(())
}
