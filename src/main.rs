use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use fakebook::{import_audio, ServiceConfig};
use fakebook_core::{
    assemble_grid, import_song, transpose_for_instrument, transpose_song_to_key, BeatPayload,
    ChordPayload, Song, SongImport,
};
use tracing_subscriber::EnvFilter;

/// Build fake book chord charts from audio analysis
#[derive(Parser, Debug)]
#[command(name = "fakebook")]
#[command(version)]
struct Cli {
    /// Debug logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build a chart from saved service responses
    Import {
        /// Chord recognition response (JSON)
        #[arg(long)]
        chords: PathBuf,

        /// Beat detection response (JSON)
        #[arg(long)]
        beats: PathBuf,

        /// Source audio filename the title is taken from
        #[arg(long)]
        name: Option<String>,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Send an audio file to the analysis service and chart the result
    Analyze {
        audio: PathBuf,

        /// YAML service config
        #[arg(long, env = "FAKEBOOK_CONFIG")]
        config: Option<PathBuf>,

        #[command(flatten)]
        output: OutputArgs,
    },
}

#[derive(Args, Debug)]
struct OutputArgs {
    #[arg(long, value_enum, default_value_t = Format::Text)]
    format: Format,

    /// Transpose the chart to this key (e.g. "Eb", "F#m")
    #[arg(long)]
    transpose: Option<String>,

    /// Rewrite for a transposing instrument: Bb, Eb or F
    #[arg(long)]
    instrument: Option<String>,

    /// Measures per row in text output
    #[arg(long, default_value_t = 4)]
    per_row: usize,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum Format {
    Json,
    Yaml,
    Text,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let (import, output) = match cli.command {
        Command::Import {
            chords,
            beats,
            name,
            output,
        } => {
            let source_name = name.unwrap_or_else(|| file_name(&chords));
            (import_from_files(&chords, &beats, &source_name)?, output)
        }
        Command::Analyze {
            audio,
            config,
            output,
        } => {
            let config = ServiceConfig::load(config.as_deref())?;
            tracing::info!(audio = %audio.display(), service = %config.base_url, "Analyzing audio");
            let import = import_audio(&config, &audio)
                .await
                .with_context(|| format!("Failed to analyze '{}'", audio.display()))?;
            (import, output)
        }
    };

    let SongImport { song, warnings } = import;
    for warning in &warnings {
        eprintln!("warning: {}", warning);
    }

    let song = apply_transposition(song, &output)?;
    print!("{}", render(&song, &output)?);
    Ok(())
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn import_from_files(chords: &Path, beats: &Path, source_name: &str) -> Result<SongImport> {
    let chords_json = fs::read_to_string(chords)
        .with_context(|| format!("Error reading file '{}'", chords.display()))?;
    let beats_json = fs::read_to_string(beats)
        .with_context(|| format!("Error reading file '{}'", beats.display()))?;

    let chords = ChordPayload::from_json(&chords_json)?;
    let beats = BeatPayload::from_json(&beats_json)?;
    Ok(import_song(&chords, &beats, source_name)?)
}

fn apply_transposition(song: Song, output: &OutputArgs) -> Result<Song> {
    let song = match &output.transpose {
        Some(key) => match transpose_song_to_key(&song, key) {
            Some(song) => song,
            None => bail!("Cannot transpose from '{}' to '{}'", song.key, key),
        },
        None => song,
    };
    match &output.instrument {
        Some(instrument) => transpose_for_instrument(&song, instrument)
            .with_context(|| format!("Unknown instrument key: {}", instrument)),
        None => Ok(song),
    }
}

fn render(song: &Song, output: &OutputArgs) -> Result<String> {
    Ok(match output.format {
        Format::Json => serde_json::to_string_pretty(song)? + "\n",
        Format::Yaml => serde_yaml::to_string(song)?,
        Format::Text => render_text(song, output.per_row),
    })
}

fn render_text(song: &Song, per_row: usize) -> String {
    let mut out = format!(
        "{}\n{}  |  Key: {}  |  {} bpm  |  {}\n\n",
        song.title, song.artist, song.key, song.tempo, song.time_signature
    );
    for section in &song.sections {
        out.push_str(&format!("[{}]\n", section.label));
        out.push_str(&assemble_grid(&section.measures, per_row).to_text());
    }
    out
}
