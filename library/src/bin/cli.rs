use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::info;
use serde_json::Value;

use annotation_engine::config::{self, EngineConfig};
use annotation_engine::{DocumentAdapter, EditorSession};

/// Annotation document tools
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Engine config file (defaults to the user config directory)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Load a document and write it back in canonical form
    Normalize {
        input: PathBuf,
        /// Write here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print the subtitle cues of a document
    Cues {
        input: PathBuf,
        /// Render as WebVTT
        #[arg(long, conflicts_with = "srt")]
        vtt: bool,
        /// Render as SRT
        #[arg(long)]
        srt: bool,
    },

    /// Append an SRT transcript to a document's dialogue track
    IngestSrt {
        document: PathBuf,
        srt: PathBuf,
        /// Write here instead of overwriting the document
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn load_engine_config(path: Option<&Path>) -> Result<EngineConfig> {
    match path {
        Some(path) => EngineConfig::load_from(path)
            .with_context(|| format!("failed to load config {}", path.display())),
        None => Ok(config::load_config()),
    }
}

fn read_document(path: &Path) -> Result<Value> {
    let text = fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("{} is not valid JSON", path.display()))
}

fn write_output(output: Option<&Path>, doc: &Value) -> Result<()> {
    let text = serde_json::to_string_pretty(doc)?;
    match output {
        Some(path) => {
            fs::write(path, text).with_context(|| format!("failed to write {}", path.display()))?;
            info!("Wrote {}", path.display());
        }
        None => println!("{}", text),
    }
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let engine_config = load_engine_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Normalize { input, output } => {
            let doc = read_document(&input)?;
            let loaded = DocumentAdapter::inbound(&doc, &engine_config)?;
            info!(
                "Loaded {} ({} entries)",
                loaded.meta.media_id().unwrap_or("document without media_id"),
                loaded.timeline.entry_count()
            );
            for entry in loaded.timeline.degenerate_entries() {
                log::warn!("Entry {} is shorter than the minimum duration", entry.id);
            }
            let out = DocumentAdapter::outbound(&loaded.timeline, &loaded.meta);
            write_output(output.as_deref(), &out)?;
        }
        Commands::Cues { input, vtt, srt } => {
            let doc = read_document(&input)?;
            let session = EditorSession::from_document(engine_config, &doc)?;
            let snapshot = session.cue_snapshot();
            if vtt {
                print!("{}", snapshot.to_webvtt());
            } else if srt {
                print!("{}", snapshot.to_srt());
            } else {
                print!("{}", snapshot);
            }
        }
        Commands::IngestSrt { document, srt, output } => {
            let doc = read_document(&document)?;
            let transcript =
                fs::read_to_string(&srt).with_context(|| format!("failed to read {}", srt.display()))?;
            let mut session = EditorSession::from_document(engine_config, &doc)?;
            let count = session.ingest_srt(&transcript);
            info!("Appended {} dialogue lines", count);
            let target = output.unwrap_or(document);
            write_output(Some(target.as_path()), &session.save_document())?;
        }
    }
    Ok(())
}
