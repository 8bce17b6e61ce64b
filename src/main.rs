use anyhow::Context;
use booking_core::adapters::{HttpTableDirectory, InMemoryTableDirectory, JsonFileBookingStore};
use booking_core::config::cli::Command;
use booking_core::domain::ports::{BookingStore, TableDirectory};
use booking_core::utils::{logger, validation::Validate};
use booking_core::{
    BookingEngine, BookingError, BookingId, CliConfig, EngineConfig, Table, TomlConfig, VenueId,
};
use clap::Parser;
use serde::Serialize;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncReadExt;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    let toml = match &cli.config {
        Some(path) => Some(
            TomlConfig::from_file(path)
                .with_context(|| format!("failed to load config file '{}'", path.display()))?,
        ),
        None => None,
    };

    // Logging
    let level = toml.as_ref().and_then(|t| t.log_level());
    if cli.json_logs || toml.as_ref().is_some_and(|t| t.json_logs()) {
        logger::init_json_logger(level);
    } else {
        logger::init_cli_logger(cli.verbose, level);
    }

    let mut config = match &toml {
        Some(toml) => toml.engine_config(),
        None => EngineConfig::from_env().context("failed to read configuration from environment")?,
    };
    if let Some(ms) = cli.timeout_ms {
        config.call_timeout = Duration::from_millis(ms);
    }

    if let Err(e) = config.validate() {
        tracing::error!("Configuration validation failed: {}", e);
        eprintln!("❌ {}", e);
        std::process::exit(1);
    }
    tracing::debug!("Engine config: {:?}", config);

    let directory = table_directory(&config, &cli.data_dir).await?;
    let store: Arc<dyn BookingStore> =
        Arc::new(JsonFileBookingStore::new(cli.data_dir.join("bookings.json")));
    let engine = BookingEngine::from_config(&config, directory, store);

    if let Err(e) = run(&engine, cli.command).await? {
        tracing::error!(code = e.code(), "{}", e);
        eprintln!("❌ {}", e);
        eprintln!("💡 {}", e.recovery_suggestion());
        std::process::exit(exit_code(&e));
    }

    Ok(())
}

/// The remote table API when configured, otherwise `tables.json` in the data directory.
async fn table_directory(
    config: &EngineConfig,
    data_dir: &Path,
) -> anyhow::Result<Arc<dyn TableDirectory>> {
    if let Some(root) = &config.table_api_root {
        tracing::info!("Using table API at {}", root);
        return Ok(Arc::new(HttpTableDirectory::new(root.clone())));
    }

    let path = data_dir.join("tables.json");
    let raw = tokio::fs::read(&path)
        .await
        .with_context(|| format!("failed to read '{}'", path.display()))?;
    let venues: HashMap<VenueId, Vec<Table>> = serde_json::from_slice(&raw)
        .with_context(|| format!("'{}' is not a venue-to-tables map", path.display()))?;

    tracing::info!("Loaded tables for {} venue(s) from {}", venues.len(), path.display());
    Ok(Arc::new(InMemoryTableDirectory::from_venues(venues)))
}

/// Outer error: the CLI itself failed. Inner error: the engine said no.
async fn run(
    engine: &BookingEngine,
    command: Command,
) -> anyhow::Result<Result<(), BookingError>> {
    let options = engine.default_options();

    let outcome = match command {
        Command::Match(args) => match args.to_enquiry() {
            Ok(enquiry) => match engine.match_slot(&enquiry, &options).await {
                Ok(proposal) => print_json(&proposal),
                Err(e) => return Ok(Err(e)),
            },
            Err(rule) => return Ok(Err(rule.into())),
        },
        Command::Book(args) => {
            let enquiry = match args.to_enquiry() {
                Ok(enquiry) => enquiry,
                Err(rule) => return Ok(Err(rule.into())),
            };
            let booking = async {
                let proposal = engine.match_slot(&enquiry, &options).await?;
                engine.commit_booking(proposal, &options).await
            }
            .await;
            match booking {
                Ok(booking) => print_json(&booking),
                Err(e) => return Ok(Err(e)),
            }
        }
        Command::Commit { proposal } => {
            let raw = read_proposal(&proposal).await?;
            match engine.commit_booking_json(&raw, &options).await {
                Ok(booking) => print_json(&booking),
                Err(e) => return Ok(Err(e)),
            }
        }
        Command::Cancel { id } => match engine.cancel_booking(BookingId(id), &options).await {
            Ok(()) => {
                println!("✅ Booking {} cancelled", id);
                Ok(())
            }
            Err(e) => return Ok(Err(e)),
        },
        Command::List { venue, date } => {
            match engine.bookings_on_date(&VenueId::new(venue), date, &options).await {
                Ok(bookings) => print_json(&bookings),
                Err(e) => return Ok(Err(e)),
            }
        }
    };

    outcome.map(Ok)
}

async fn read_proposal(source: &str) -> anyhow::Result<String> {
    let raw = if source == "-" {
        let mut buf = String::new();
        tokio::io::stdin()
            .read_to_string(&mut buf)
            .await
            .context("failed to read proposal from stdin")?;
        buf
    } else {
        tokio::fs::read_to_string(source)
            .await
            .with_context(|| format!("failed to read proposal '{}'", source))?
    };

    Ok(raw)
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn exit_code(error: &BookingError) -> i32 {
    match error {
        BookingError::InvalidRequest(_) => 2,
        BookingError::NoAvailableSlots { .. } => 3,
        BookingError::Conflict { .. } => 4,
        BookingError::NotFound { .. } => 5,
        BookingError::Unavailable { .. } => 6,
    }
}
