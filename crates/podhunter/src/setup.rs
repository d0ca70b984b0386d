//! `setup-local`: installs the bundled transcription script.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

/// Engine script shipped with the binary.
pub const ENGINE_SCRIPT: &str = include_str!("../assets/transcribe.py");

/// Outcome of [`install_engine_script`].
#[derive(Debug, PartialEq, Eq)]
pub enum Install {
    /// The script was written.
    Written,
    /// A script already exists and was left alone.
    Kept,
}

/// Write the engine script to `dest`, creating parent directories.
pub fn install_engine_script(dest: &Path, force: bool) -> Result<Install> {
    if dest.exists() && !force {
        return Ok(Install::Kept);
    }
    if let Some(parent) = dest.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory: {}", parent.display()))?;
    }
    std::fs::write(dest, ENGINE_SCRIPT)
        .with_context(|| format!("failed to write engine script: {}", dest.display()))?;
    info!(path = %dest.display(), "engine script installed");
    Ok(Install::Written)
}

/// Shell commands that finish the install.
pub fn next_steps(runtime_dir: &Path) -> String {
    let venv = runtime_dir.join("venv");
    let pip = if cfg!(windows) {
        venv.join("Scripts").join("pip")
    } else {
        venv.join("bin").join("pip")
    };
    format!(
        "python3 -m venv {}\n{} install faster-whisper",
        venv.display(),
        pip.display()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_script_and_parents() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("runtime/transcribe.py");

        assert_eq!(install_engine_script(&dest, false).unwrap(), Install::Written);
        let written = std::fs::read_to_string(&dest).unwrap();
        assert!(written.contains("faster_whisper"));
    }

    #[test]
    fn keeps_existing_script_unless_forced() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("transcribe.py");
        std::fs::write(&dest, "# custom").unwrap();

        assert_eq!(install_engine_script(&dest, false).unwrap(), Install::Kept);
        assert_eq!(std::fs::read_to_string(&dest).unwrap(), "# custom");

        assert_eq!(install_engine_script(&dest, true).unwrap(), Install::Written);
        assert_eq!(std::fs::read_to_string(&dest).unwrap(), ENGINE_SCRIPT);
    }

    #[cfg(unix)]
    #[test]
    fn next_steps_use_runtime_venv() {
        let steps = next_steps(Path::new("/home/u/.podhunter/runtime"));
        assert!(steps.contains("python3 -m venv /home/u/.podhunter/runtime/venv"));
        assert!(steps.contains("/home/u/.podhunter/runtime/venv/bin/pip install faster-whisper"));
    }
}
