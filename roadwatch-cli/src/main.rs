//! roadwatch - log and review wildlife and roadkill sightings
//!
//! Thin front end over the sighting repository. The run mode picks the
//! backend once at startup: the local REST service in development, the
//! managed document store in production.

use std::path::PathBuf;

use anyhow::Result;
use chrono::Local;
use clap::{Parser, Subcommand};
use roadwatch_common::{
    classify, map, BackendConfig, GeoFix, RunMode, SightingDraft, SightingRecord,
    SightingRepository,
};
use tracing::debug;

/// Command-line arguments for roadwatch
#[derive(Parser, Debug)]
#[command(name = "roadwatch")]
#[command(about = "Log and review wildlife and roadkill sightings")]
#[command(version)]
struct Cli {
    /// Run mode (development uses the local service, production the document store)
    #[arg(long, global = true)]
    mode: Option<RunMode>,

    /// Config file (default: platform config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Base URL of the local service, overrides detection
    #[arg(long, global = true)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Classify a description and save it as a sighting
    Log {
        /// What was seen, e.g. "dead deer on the shoulder"
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,

        #[arg(long, allow_negative_numbers = true, requires = "lon")]
        lat: Option<f64>,

        #[arg(long, allow_negative_numbers = true, requires = "lat")]
        lon: Option<f64>,

        #[arg(long)]
        address: Option<String>,

        #[arg(long)]
        notes: Option<String>,

        /// Save without a location fix
        #[arg(long, conflicts_with_all = ["lat", "lon"])]
        no_fix: bool,
    },

    /// List sightings, newest first
    List {
        /// Print records as JSON
        #[arg(long)]
        json: bool,
    },

    /// Delete a sighting by id
    Delete { id: String },

    /// Summarize sightings with a location fix
    Map {
        /// Print a GeoJSON FeatureCollection
        #[arg(long)]
        geojson: bool,
    },

    /// Show how a description would be classified, without saving
    Classify {
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    if let Command::Classify { text } = &cli.command {
        let classification = classify(&text.join(" "));
        println!(
            "{} {}",
            classification.status.label(),
            classification.cleaned_animal
        );
        return Ok(());
    }

    let mut config = BackendConfig::resolve(cli.mode, cli.config.as_deref())?;
    if let Some(url) = cli.api_url {
        config.local.api_url = Some(url);
    }
    debug!(?config, "Resolved backend configuration");

    let repo = SightingRepository::from_config(&config)?;

    match cli.command {
        Command::Log {
            text,
            lat,
            lon,
            address,
            notes,
            no_fix,
        } => {
            let mut draft = SightingDraft::from_transcript(&text.join(" "));
            if no_fix {
                draft = draft.at_unknown_location();
            } else if let (Some(latitude), Some(longitude)) = (lat, lon) {
                draft = draft.at(GeoFix {
                    latitude,
                    longitude,
                    address,
                });
            }
            if let Some(notes) = notes {
                draft = draft.notes(notes);
            }

            let sighting = draft.build()?;
            let status = sighting.status;
            let animal = sighting.animal.clone();
            let id = repo.add(sighting).await?;
            println!("{} {} {}", id, status.label(), animal);
        }
        Command::List { json } => {
            let records = repo.list().await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&records)?);
            } else if records.is_empty() {
                println!("No sightings yet");
            } else {
                for record in &records {
                    println!("{}", history_line(record));
                }
            }
        }
        Command::Delete { id } => {
            repo.remove(&id).await?;
            println!("Deleted {}", id);
        }
        Command::Map { geojson } => {
            let records = repo.list().await?;
            if geojson {
                println!("{}", serde_json::to_string_pretty(&map::to_geojson(&records))?);
            } else {
                let center = map::center(&records);
                println!(
                    "{} of {} sightings mappable, centre {:.4}, {:.4}",
                    map::mappable(&records).len(),
                    records.len(),
                    center.latitude,
                    center.longitude
                );
            }
        }
        Command::Classify { .. } => {}
    }

    Ok(())
}

/// One history card: badge, animal, when, where, notes
fn history_line(record: &SightingRecord) -> String {
    let mut line = format!(
        "[{}] {}  {}  {}",
        record.status.label(),
        record.animal,
        record.timestamp.with_timezone(&Local).format("%Y-%m-%d %H:%M"),
        record.location_label()
    );
    if let Some(notes) = &record.notes {
        line.push_str(&format!("  ({})", notes));
    }
    line.push_str(&format!("  id={}", record.id));
    line
}
