//! # podhunter
//!
//! Finds the audio stream on a podcast episode page, downloads it and
//! transcribes it on the remote inference service or a local engine.

#![deny(unsafe_code)]

mod cli;
mod error;
mod pipeline;
mod setup;

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use podhunter_core::UserFacing;
use podhunter_settings::{PodhunterSettings, load_settings, load_settings_from_path, resolve_path};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::cli::{Cli, Command, TranscribeOptions};
use crate::error::PipelineError;
use crate::pipeline::Pipeline;
use crate::setup::Install;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            let pipeline_error = e.downcast_ref::<PipelineError>();
            if let Some(hint) = pipeline_error.and_then(|pe| pe.hint()) {
                eprintln!("hint: {hint}");
            }
            ExitCode::from(pipeline_error.map_or(1, PipelineError::exit_code))
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    // Settings come first so the configured log level applies from the start.
    let settings = match cli.settings {
        Some(ref path) => load_settings_from_path(path),
        None => load_settings(),
    }
    .map_err(PipelineError::from)?;

    let level = cli.log_level.as_deref().unwrap_or(&settings.logging.level);
    podhunter_core::logging::init_subscriber(level, settings.logging.json);

    match cli.command {
        Command::SetupLocal { force } => setup_local(&settings, force)?,
        Command::Scan { url } => {
            let pipeline = start_pipeline(settings)?;
            let found = pipeline.scan(&url).await?;
            info!(strategy = ?found.strategy, "stream url found");
            println!("{}", found.url);
        }
        Command::Download { url, out_dir, name } => {
            let pipeline = start_pipeline(settings)?;
            let path = pipeline.download(&url, &out_dir, name.as_deref()).await?;
            println!("{}", path.display());
        }
        Command::Transcribe { url, options } => {
            let pipeline = start_pipeline(settings)?;
            let result = pipeline
                .transcribe_url(&url, options.backend, options.model_size.as_deref())
                .await?;
            info!(backend = %result.backend, job_id = %result.job_id, "transcript ready");
            emit_transcript(&result.text, &options)?;
        }
        Command::TranscribeFile { path, options } => {
            let audio = tokio::fs::read(&path)
                .await
                .with_context(|| format!("failed to read audio file: {}", path.display()))?;
            let pipeline = start_pipeline(settings)?;
            let result = pipeline
                .transcribe_bytes(&audio, options.backend, options.model_size.as_deref())
                .await?;
            info!(backend = %result.backend, job_id = %result.job_id, "transcript ready");
            emit_transcript(&result.text, &options)?;
        }
        Command::Models => {
            let pipeline = start_pipeline(settings)?;
            let available = pipeline.available_models().await?;
            for model in &available {
                let marker = if pipeline.candidates().contains(model) { "*" } else { " " };
                println!("{marker} {model}");
            }
            for missing in pipeline.candidates().iter().filter(|c| !available.contains(c)) {
                warn!(model = %missing, "candidate model not available to this key");
            }
        }
    }

    Ok(())
}

/// Build the pipeline with Ctrl-C wired to its cancel token.
fn start_pipeline(settings: PodhunterSettings) -> Result<Pipeline, PipelineError> {
    let cancel = CancellationToken::new();
    let _ctrl_c = tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("interrupted, cancelling");
                cancel.cancel();
            }
        }
    });
    Pipeline::new(settings, &cancel)
}

fn emit_transcript(text: &str, options: &TranscribeOptions) -> Result<()> {
    match options.output {
        Some(ref path) => {
            std::fs::write(path, text)
                .with_context(|| format!("failed to write transcript: {}", path.display()))?;
            println!("{}", path.display());
        }
        None => println!("{text}"),
    }
    Ok(())
}

fn setup_local(settings: &PodhunterSettings, force: bool) -> Result<()> {
    let script = resolve_path(&settings.transcription.script_path);
    match setup::install_engine_script(&script, force)? {
        Install::Written => println!("installed {}", script.display()),
        Install::Kept => println!("{} already exists (use --force to replace it)", script.display()),
    }
    let runtime_dir = resolve_path(&settings.transcription.runtime_dir);
    println!("\nTo finish, create the runtime:\n{}", setup::next_steps(&runtime_dir));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn setup_local_needs_no_pipeline() {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = PodhunterSettings::default();
        let script = dir.path().join("engine/transcribe.py");
        settings.transcription.script_path = script.display().to_string();
        settings.transcription.runtime_dir = dir.path().join("runtime").display().to_string();

        setup_local(&settings, false).unwrap();
        assert!(script.exists());
    }

    #[tokio::test]
    async fn start_pipeline_builds_offline() {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = PodhunterSettings::default();
        settings.gemini.api_key = None;
        settings.transcription.script_path = dir.path().join("missing.py").display().to_string();

        let pipeline = start_pipeline(settings).unwrap();
        assert!(!pipeline.candidates().is_empty());
    }
}
