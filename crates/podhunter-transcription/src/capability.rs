//! Host capability detection and backend selection.

use std::fmt;
use std::path::{Path, PathBuf};

use podhunter_settings::{BackendPreference, TranscriptionSettings, resolve_path};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Transcription backend a job runs on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Remote inference service.
    Remote,
    /// Local subprocess engine.
    Local,
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Remote => "remote",
            Self::Local => "local",
        })
    }
}

/// Everything the local engine needs on disk.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BridgePaths {
    /// Interpreter running the script.
    pub interpreter: PathBuf,
    /// Transcription script.
    pub script: PathBuf,
    /// Media codec binary; its directory is put first on the child's `PATH`.
    pub ffmpeg: PathBuf,
}

impl BridgePaths {
    /// Resolve the local engine from settings. `Err` carries what is missing.
    pub fn resolve(settings: &TranscriptionSettings) -> Result<Self, String> {
        let script = resolve_path(&settings.script_path);
        if !script.is_file() {
            return Err(format!(
                "transcription script not found at {}",
                script.display()
            ));
        }

        let runtime_dir = resolve_path(&settings.runtime_dir);
        let interpreter = resolve_interpreter(&runtime_dir, &settings.interpreter)
            .ok_or_else(|| format!("interpreter '{}' not found", settings.interpreter))?;

        let ffmpeg = resolve_ffmpeg(&resolve_path(&settings.resources_dir));

        Ok(Self {
            interpreter,
            script,
            ffmpeg,
        })
    }
}

/// Dedicated runtime interpreter if installed, else `configured`.
///
/// A bare name is looked up on `PATH`; anything with a directory part must
/// exist as given.
pub fn resolve_interpreter(runtime_dir: &Path, configured: &str) -> Option<PathBuf> {
    let dedicated = venv_python(runtime_dir);
    if dedicated.is_file() {
        return Some(dedicated);
    }
    let configured_path = Path::new(configured);
    if configured_path.is_absolute() || configured_path.components().count() > 1 {
        return configured_path
            .is_file()
            .then(|| configured_path.to_path_buf());
    }
    find_in_path(configured)
}

/// Bundled `ffmpeg` under `resources_dir/bin`, else the one on `PATH`, else
/// the bare name.
pub fn resolve_ffmpeg(resources_dir: &Path) -> PathBuf {
    let bundled = resources_dir.join("bin").join(executable_name("ffmpeg"));
    if bundled.is_file() {
        return bundled;
    }
    find_in_path("ffmpeg").unwrap_or_else(|| PathBuf::from(executable_name("ffmpeg")))
}

/// First `name` found in the directories of `PATH`.
pub fn find_in_path(name: &str) -> Option<PathBuf> {
    let paths = std::env::var_os("PATH")?;
    let file = executable_name(name);
    std::env::split_paths(&paths)
        .map(|dir| dir.join(&file))
        .find(|candidate| candidate.is_file())
}

fn venv_python(runtime_dir: &Path) -> PathBuf {
    let venv = runtime_dir.join("venv");
    if cfg!(windows) {
        venv.join("Scripts").join("python.exe")
    } else {
        venv.join("bin").join("python3")
    }
}

fn executable_name(name: &str) -> String {
    if cfg!(windows) && !name.to_lowercase().ends_with(".exe") {
        format!("{name}.exe")
    } else {
        name.to_string()
    }
}

/// What this host can run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HostCapability {
    /// The local engine is installed.
    pub local_bridge: bool,
}

impl HostCapability {
    /// Probe the host once.
    pub fn detect(settings: &TranscriptionSettings) -> Self {
        match BridgePaths::resolve(settings) {
            Ok(paths) => {
                debug!(
                    interpreter = %paths.interpreter.display(),
                    script = %paths.script.display(),
                    ffmpeg = %paths.ffmpeg.display(),
                    "local transcription available"
                );
                Self { local_bridge: true }
            }
            Err(reason) => {
                debug!(%reason, "local transcription unavailable");
                Self {
                    local_bridge: false,
                }
            }
        }
    }
}

/// Pick the backend for a job.
///
/// `Auto` routes hosts with the local engine to it and everything else to
/// the remote service. Explicit preferences are returned as is; running an
/// explicit `Local` on a host without the engine fails later with
/// `LocalBridgeUnavailable`.
pub fn select_backend(capability: HostCapability, preference: BackendPreference) -> Backend {
    match preference {
        BackendPreference::Remote => Backend::Remote,
        BackendPreference::Local => Backend::Local,
        BackendPreference::Auto if capability.local_bridge => Backend::Local,
        BackendPreference::Auto => Backend::Remote,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(path: &Path) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, b"").unwrap();
    }

    fn settings_in(dir: &Path) -> TranscriptionSettings {
        TranscriptionSettings {
            script_path: dir.join("runtime/transcribe.py").display().to_string(),
            runtime_dir: dir.join("runtime").display().to_string(),
            resources_dir: dir.join("resources").display().to_string(),
            interpreter: dir.join("no/such/python").display().to_string(),
            ..TranscriptionSettings::default()
        }
    }

    #[test]
    fn auto_follows_capability() {
        let local = HostCapability { local_bridge: true };
        let remote_only = HostCapability {
            local_bridge: false,
        };
        assert_eq!(select_backend(local, BackendPreference::Auto), Backend::Local);
        assert_eq!(
            select_backend(remote_only, BackendPreference::Auto),
            Backend::Remote
        );
    }

    #[test]
    fn explicit_preference_wins() {
        let local = HostCapability { local_bridge: true };
        let remote_only = HostCapability {
            local_bridge: false,
        };
        assert_eq!(select_backend(local, BackendPreference::Remote), Backend::Remote);
        assert_eq!(
            select_backend(remote_only, BackendPreference::Local),
            Backend::Local
        );
    }

    #[test]
    fn missing_script_means_no_local_bridge() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings_in(dir.path());
        let reason = BridgePaths::resolve(&settings).unwrap_err();
        assert!(reason.contains("script not found"));
        assert!(!HostCapability::detect(&settings).local_bridge);
    }

    #[test]
    fn missing_interpreter_means_no_local_bridge() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings_in(dir.path());
        touch(&dir.path().join("runtime/transcribe.py"));
        let reason = BridgePaths::resolve(&settings).unwrap_err();
        assert!(reason.contains("interpreter"));
    }

    #[cfg(unix)]
    #[test]
    fn dedicated_runtime_and_bundled_ffmpeg_preferred() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings_in(dir.path());
        touch(&dir.path().join("runtime/transcribe.py"));
        touch(&dir.path().join("runtime/venv/bin/python3"));
        touch(&dir.path().join("resources/bin/ffmpeg"));

        let paths = BridgePaths::resolve(&settings).unwrap();
        assert_eq!(paths.interpreter, dir.path().join("runtime/venv/bin/python3"));
        assert_eq!(paths.ffmpeg, dir.path().join("resources/bin/ffmpeg"));
        assert!(HostCapability::detect(&settings).local_bridge);
    }

    #[test]
    fn configured_interpreter_path_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        let python = dir.path().join("bin/python");
        assert_eq!(
            resolve_interpreter(dir.path(), &python.display().to_string()),
            None
        );
        touch(&python);
        assert_eq!(
            resolve_interpreter(dir.path(), &python.display().to_string()),
            Some(python)
        );
    }

    #[test]
    fn unknown_binary_not_on_path() {
        assert_eq!(find_in_path("podhunter-no-such-binary-7f3a"), None);
    }
}
