//! Command-line interface.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use podhunter_settings::BackendPreference;

/// Find, download and transcribe podcast audio.
#[derive(Parser, Debug)]
#[command(name = "podhunter", version, about = "Find, download and transcribe podcast audio")]
pub struct Cli {
    /// Settings file (defaults to `~/.podhunter/settings.json`).
    #[arg(long, global = true)]
    pub settings: Option<PathBuf>,

    /// Log filter, e.g. `debug` or `podhunter_fetch=trace` (overrides settings).
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Find the audio stream URL on an episode page.
    Scan {
        /// Episode page URL.
        url: String,
    },

    /// Download an audio file.
    Download {
        /// Audio URL.
        url: String,
        /// Directory to write into.
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,
        /// File name (`.mp3` is appended when missing).
        #[arg(long)]
        name: Option<String>,
    },

    /// Transcribe audio at a URL.
    Transcribe {
        /// Audio URL.
        url: String,
        #[command(flatten)]
        options: TranscribeOptions,
    },

    /// Transcribe a local audio file.
    TranscribeFile {
        /// Audio file.
        path: PathBuf,
        #[command(flatten)]
        options: TranscribeOptions,
    },

    /// List the models available to the configured API key.
    Models,

    /// Install the local transcription script.
    SetupLocal {
        /// Replace an existing script.
        #[arg(long)]
        force: bool,
    },
}

/// Options shared by the transcription commands.
#[derive(Args, Debug, Clone, Default)]
pub struct TranscribeOptions {
    /// Backend: auto, remote or local (overrides settings).
    #[arg(long)]
    pub backend: Option<BackendPreference>,

    /// Whisper model size for the local engine (overrides settings).
    #[arg(long)]
    pub model_size: Option<String>,

    /// Write the transcript to this file instead of stdout.
    #[arg(long, short)]
    pub output: Option<PathBuf>,
}
