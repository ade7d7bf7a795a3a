//! Command-line interface for stashvoice.
//!
//! Provides commands for adding items from voice memos, labeling existing
//! items, listing known locations, and showing the resolved configuration.

use std::path::{Path, PathBuf};

use anyhow::Result;
use chrono::{DateTime, Local};
use clap::{Parser, Subcommand};

use crate::adapters::{GeminiStructurer, HomeboxClient, InventoryClient};
use crate::config::{self, Credentials, ResolvedConfig};
use crate::core::intake::write_csv;
use crate::core::{flatten, EditSession, Intake, IntakeReport, Labeler, RecordCodec, SystemEditor};
use crate::ingest::{check_audio_path, WhisperTranscriber};

/// stashvoice - voice memos to home-inventory entries
#[derive(Parser, Debug)]
#[command(name = "stashvoice")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Transcribe voice memos, review the result, and add the items
    Add {
        /// Audio files to process
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Write an importable CSV here instead of adding to the inventory
        #[arg(long)]
        csv: Option<PathBuf>,
    },

    /// Propose labels for inventory items and apply them after review
    Label {
        /// Include items that already have labels
        #[arg(long)]
        all: bool,
    },

    /// List every known location path with its id
    Locations,

    /// Show resolved configuration (debug)
    Config,
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(self) -> Result<()> {
        let config = config::load_config()?;

        match self.command {
            Commands::Add { files, csv } => add_memos(&config, files, csv).await,
            Commands::Label { all } => label_items(&config, all).await,
            Commands::Locations => list_locations().await,
            Commands::Config => show_config(&config),
        }
    }
}

/// Review session configured from the resolved settings
fn review_session(config: &ResolvedConfig) -> EditSession {
    EditSession::new(
        config.review.scratch_path.clone(),
        RecordCodec::new(config.review.key_order.clone()),
        SystemEditor::new(config.review.editor.clone()),
    )
}

/// Default CSV output for an audio file: `<stem>-<timestamp>.csv` in the
/// current directory
fn default_csv_path(audio_path: &Path, now: DateTime<Local>) -> PathBuf {
    let stem = audio_path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "inventory".to_string());
    PathBuf::from(format!("{}-{}.csv", stem, now.format("%Y%m%d-%H%M%S")))
}

/// Process each audio file through the intake pipeline
async fn add_memos(config: &ResolvedConfig, files: Vec<PathBuf>, csv: Option<PathBuf>) -> Result<()> {
    if csv.is_some() && files.len() > 1 {
        anyhow::bail!("--csv takes a single audio file; omit it to name each CSV after its memo");
    }

    let credentials = Credentials::from_env()?;
    let api_key = config::gemini_api_key()?;

    let inventory = HomeboxClient::login(&credentials).await?;
    let structurer = GeminiStructurer::new(
        api_key,
        config.llm.clone(),
        config.intake.generate_description,
    );
    let transcriber = WhisperTranscriber::new(config.voice.clone());
    let session = review_session(config);
    let intake = Intake::new(&inventory, &structurer, &transcriber, &session);

    let to_csv = csv.is_some() || config.intake.output_csv;

    for file in files {
        if let Err(e) = check_audio_path(&file) {
            eprintln!("Error: {}", e);
            continue;
        }

        println!("Processing file: {}", file.display());
        let prepared = intake.prepare(&file).await?;

        if to_csv {
            let out = csv.clone().unwrap_or_else(|| default_csv_path(&file, Local::now()));
            write_csv(&out, &prepared.groups)?;
            println!("Generated file {}", out.display());
        } else {
            let report = intake.push(prepared).await?;
            print_intake_report(&report);
        }
    }

    Ok(())
}

fn print_intake_report(report: &IntakeReport) {
    println!();
    if !report.resolve.is_clean() {
        println!(
            "Dropped {} group(s) with unknown locations ({} item(s)):",
            report.resolve.dropped_groups(),
            report.resolve.dropped_records()
        );
        for dropped in &report.resolve.dropped {
            let names: Vec<String> = dropped.records.iter().map(|r| r.label()).collect();
            println!("  <{}> {}", dropped.path, names.join(", "));
        }
    }

    if report.failed.is_empty() {
        println!("Successfully added {} item(s)!", report.added);
    } else {
        println!("Added {} item(s). Failed to add these items:", report.added);
        for (location, records) in &report.failed {
            let names: Vec<String> = records.iter().map(|r| r.label()).collect();
            println!("  {}: {}", location, names.join(", "));
        }
    }
}

/// Run the labeling pipeline
async fn label_items(config: &ResolvedConfig, all: bool) -> Result<()> {
    let credentials = Credentials::from_env()?;
    let api_key = config::gemini_api_key()?;

    let inventory = HomeboxClient::login(&credentials).await?;
    let structurer = GeminiStructurer::new(api_key, config.llm.clone(), false);
    let session = review_session(config);

    let labeler = Labeler::new(
        &inventory,
        &structurer,
        &session,
        all || config.labeling.relabel_labeled,
    );
    let report = labeler.run().await?;

    println!();
    println!("Items considered: {}", report.candidates);
    println!("Items updated:    {}", report.updated);
    if !report.failed.is_empty() {
        println!("Could not update: {}", report.failed.join(", "));
    }
    if !report.unknown_labels.is_empty() {
        println!("Unknown labels:   {}", report.unknown_labels.join(", "));
    }
    if !report.unknown_items.is_empty() {
        println!("Unknown item ids: {}", report.unknown_items.join(", "));
    }

    Ok(())
}

/// Print flattened location paths
async fn list_locations() -> Result<()> {
    let credentials = Credentials::from_env()?;
    let inventory = HomeboxClient::login(&credentials).await?;
    let index = flatten(&inventory.location_tree().await?);

    if index.is_empty() {
        println!("No locations found");
        return Ok(());
    }

    println!("{:<50} {}", "PATH", "ID");
    println!("{}", "-".repeat(88));
    for entry in index.iter() {
        println!("{:<50} {}", entry.path, entry.id);
    }

    Ok(())
}

fn show_config(cfg: &ResolvedConfig) -> Result<()> {
    let present = |key: &str| {
        if std::env::var(key).map(|v| !v.is_empty()).unwrap_or(false) {
            "set"
        } else {
            "missing"
        }
    };

    println!("stashvoice configuration");
    println!("========================");
    println!();
    println!(
        "Config file: {}",
        cfg.config_file
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(none - using defaults)".to_string())
    );
    println!();
    println!("Paths:");
    println!("  Home:         {}", cfg.home.display());
    println!("  Scratch file: {}", cfg.review.scratch_path.display());
    println!();
    println!("Review:");
    println!(
        "  Editor:    {}",
        cfg.review.editor.as_deref().unwrap_or("(platform default)")
    );
    println!("  Key order: {}", cfg.review.key_order.keys().join(", "));
    println!();
    println!("Intake:");
    println!("  Generate descriptions: {}", cfg.intake.generate_description);
    println!("  Output CSV:            {}", cfg.intake.output_csv);
    println!();
    println!("Labeling:");
    println!("  Relabel labeled items: {}", cfg.labeling.relabel_labeled);
    println!();
    println!("Voice:");
    println!("  Whisper:  {}", cfg.voice.whisper_path);
    println!("  Model:    {}", cfg.voice.model);
    println!("  Language: {}", cfg.voice.language);
    println!();
    println!("LLM:");
    println!("  Model:    {}", cfg.llm.model);
    println!("  Endpoint: {}", cfg.llm.endpoint);
    println!();
    println!("Credentials:");
    println!("  HOMEBOX_URL:      {}", present("HOMEBOX_URL"));
    println!("  HOMEBOX_USERNAME: {}", present("HOMEBOX_USERNAME"));
    println!("  HOMEBOX_PASSWORD: {}", present("HOMEBOX_PASSWORD"));
    println!("  GEMINI_API_KEY:   {}", present("GEMINI_API_KEY"));

    Ok(())
}
