//! Local inference bridge.
//!
//! Runs `interpreter script <audio path> <model size>` against a temporary
//! copy of the audio. The engine prints one JSON object on stdout, either
//! `{"text": ...}` or `{"error": ...}`, and logs progress on stderr. The
//! temporary file is removed on every path out of [`LocalBridge::transcribe`].

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use base64::Engine as _;
use metrics::{counter, histogram};
use podhunter_core::text::preview;
use podhunter_settings::TranscriptionSettings;
use serde::Deserialize;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::Command;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::capability::BridgePaths;
use crate::dispatcher::Transcriber;
use crate::errors::TranscriptionError;

/// Lines of stderr kept for error reports.
const TRACE_TAIL_LINES: usize = 20;

/// Runs the external transcription engine.
pub struct LocalBridge {
    paths: Result<BridgePaths, String>,
    timeout: Duration,
    cancel: Option<CancellationToken>,
    temp_dir: Option<PathBuf>,
}

impl LocalBridge {
    /// Bridge over resolved paths.
    pub fn new(paths: BridgePaths, timeout: Duration) -> Self {
        Self {
            paths: Ok(paths),
            timeout,
            cancel: None,
            temp_dir: None,
        }
    }

    /// Bridge resolved from settings; unavailable when resolution fails.
    pub fn from_settings(settings: &TranscriptionSettings) -> Self {
        Self {
            paths: BridgePaths::resolve(settings),
            timeout: Duration::from_millis(settings.timeout_ms),
            cancel: None,
            temp_dir: None,
        }
    }

    /// Bridge that always reports `reason` as unavailable.
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self {
            paths: Err(reason.into()),
            timeout: Duration::ZERO,
            cancel: None,
            temp_dir: None,
        }
    }

    /// Kill the engine when `token` is cancelled.
    #[must_use]
    pub fn with_cancel_token(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Stage audio in `dir` instead of the system temp directory.
    #[must_use]
    pub fn with_temp_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.temp_dir = Some(dir.into());
        self
    }

    /// Whether the engine can be run.
    pub fn is_available(&self) -> bool {
        self.paths.is_ok()
    }

    /// Transcribe base64 audio with the local engine.
    #[instrument(skip_all, fields(model_size = model_size))]
    pub async fn transcribe(
        &self,
        audio_base64: &str,
        model_size: &str,
    ) -> Result<String, TranscriptionError> {
        let paths = self
            .paths
            .as_ref()
            .map_err(|reason| TranscriptionError::LocalBridgeUnavailable {
                reason: reason.clone(),
            })?;

        let audio = base64::engine::general_purpose::STANDARD
            .decode(audio_base64.trim())
            .map_err(|e| TranscriptionError::InvalidPayload(e.to_string()))?;

        let mut builder = tempfile::Builder::new();
        let _ = builder.prefix("podhunter-audio-").suffix(".mp3");
        let temp = match self.temp_dir {
            Some(ref dir) => builder.tempfile_in(dir)?,
            None => builder.tempfile()?,
        };
        tokio::fs::write(temp.path(), &audio).await?;
        debug!(path = %temp.path().display(), bytes = audio.len(), "audio staged");

        let start = Instant::now();
        let outcome = self.run_engine(paths, temp.path(), model_size).await;
        histogram!("local_transcription_duration_seconds").record(start.elapsed().as_secs_f64());

        if let Err(e) = temp.close() {
            warn!(error = %e, "failed to remove temporary audio file");
        }

        let outcome_label = if outcome.is_ok() { "success" } else { "failure" };
        counter!("local_transcriptions_total", "outcome" => outcome_label).increment(1);
        outcome
    }

    async fn run_engine(
        &self,
        paths: &BridgePaths,
        audio_path: &Path,
        model_size: &str,
    ) -> Result<String, TranscriptionError> {
        let mut cmd = Command::new(&paths.interpreter);
        let _ = cmd
            .arg(&paths.script)
            .arg(audio_path)
            .arg(model_size)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(search_path) = search_path_with(&paths.ffmpeg) {
            let _ = cmd.env("PATH", search_path);
        }

        debug!(
            interpreter = %paths.interpreter.display(),
            script = %paths.script.display(),
            "spawning transcription engine"
        );
        let mut child = cmd
            .spawn()
            .map_err(|e| TranscriptionError::LocalInferenceFailed {
                exit_code: None,
                trace: format!("failed to start {}: {e}", paths.interpreter.display()),
            })?;

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();

        let exit = {
            let read_stdout = async move {
                let mut buf = String::new();
                if let Some(mut out) = stdout {
                    let _ = out.read_to_string(&mut buf).await?;
                }
                Ok::<_, std::io::Error>(buf)
            };
            let read_stderr = async move {
                let mut kept = VecDeque::with_capacity(TRACE_TAIL_LINES);
                if let Some(err) = stderr {
                    let mut lines = BufReader::new(err).lines();
                    while let Some(line) = lines.next_line().await? {
                        debug!(target: "podhunter::engine", "{line}");
                        if kept.len() == TRACE_TAIL_LINES {
                            let _ = kept.pop_front();
                        }
                        kept.push_back(line);
                    }
                }
                Ok::<_, std::io::Error>(Vec::from(kept).join("\n"))
            };
            let run = async { tokio::join!(read_stdout, read_stderr, child.wait()) };

            tokio::select! {
                (out, err, status) = run => EngineExit::Finished { out, err, status },
                () = tokio::time::sleep(self.timeout) => EngineExit::TimedOut,
                () = cancelled(self.cancel.as_ref()) => EngineExit::Cancelled,
            }
        };

        let (stdout, stderr, status) = match exit {
            EngineExit::Finished { out, err, status } => (out?, err?, status?),
            EngineExit::TimedOut => {
                let _ = child.kill().await;
                warn!(timeout = ?self.timeout, "transcription engine timed out");
                return Err(TranscriptionError::LocalInferenceFailed {
                    exit_code: None,
                    trace: "transcription engine timed out".into(),
                });
            }
            EngineExit::Cancelled => {
                let _ = child.kill().await;
                info!("transcription engine cancelled");
                return Err(TranscriptionError::LocalInferenceFailed {
                    exit_code: None,
                    trace: "transcription cancelled".into(),
                });
            }
        };

        interpret_exit(status, &stdout, &stderr)
    }
}

#[async_trait]
impl Transcriber for LocalBridge {
    async fn transcribe(
        &self,
        audio_base64: &str,
        model_size: &str,
    ) -> Result<String, TranscriptionError> {
        LocalBridge::transcribe(self, audio_base64, model_size).await
    }
}

enum EngineExit {
    Finished {
        out: std::io::Result<String>,
        err: std::io::Result<String>,
        status: std::io::Result<ExitStatus>,
    },
    TimedOut,
    Cancelled,
}

async fn cancelled(token: Option<&CancellationToken>) {
    match token {
        Some(token) => token.cancelled().await,
        None => std::future::pending().await,
    }
}

/// `PATH` with the directory of `ffmpeg` in front, when it has one.
fn search_path_with(ffmpeg: &Path) -> Option<std::ffi::OsString> {
    let dir = ffmpeg.parent().filter(|d| !d.as_os_str().is_empty())?;
    let current = std::env::var_os("PATH").unwrap_or_default();
    let dirs = std::iter::once(dir.to_path_buf()).chain(std::env::split_paths(&current));
    std::env::join_paths(dirs).ok()
}

/// Engine reply on stdout.
#[derive(Debug, Deserialize)]
struct EngineReply {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, PartialEq, Eq)]
enum EngineOutput {
    Text(String),
    Error(String),
}

/// Parse the last non-empty stdout line as the engine reply.
fn parse_engine_output(stdout: &str) -> Option<EngineOutput> {
    let line = stdout.lines().rev().find(|l| !l.trim().is_empty())?;
    let reply: EngineReply = serde_json::from_str(line.trim()).ok()?;
    match (reply.error, reply.text) {
        (Some(error), _) => Some(EngineOutput::Error(error)),
        (None, Some(text)) => Some(EngineOutput::Text(text)),
        (None, None) => None,
    }
}

fn interpret_exit(
    status: ExitStatus,
    stdout: &str,
    stderr: &str,
) -> Result<String, TranscriptionError> {
    let parsed = parse_engine_output(stdout);

    if !status.success() {
        let trace = match parsed {
            Some(EngineOutput::Error(message)) => message,
            _ if !stderr.trim().is_empty() => stderr.trim().to_string(),
            _ => preview(stdout.trim(), 500),
        };
        warn!(exit_code = status.code(), %trace, "transcription engine failed");
        return Err(TranscriptionError::LocalInferenceFailed {
            exit_code: status.code(),
            trace,
        });
    }

    match parsed {
        Some(EngineOutput::Text(text)) => Ok(text),
        Some(EngineOutput::Error(message)) => Err(TranscriptionError::LocalInferenceFailed {
            exit_code: status.code(),
            trace: message,
        }),
        None => Err(TranscriptionError::LocalBridgeOutputMalformed {
            raw: preview(stdout.trim(), 500),
        }),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
