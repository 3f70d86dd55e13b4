//! Audio file playback through an external player command.
//!
//! Player processes are killed when the playing future is dropped, so an
//! interrupt stops speech immediately.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::{Context, Result, bail};
use tokio::process::Command;
use tracing::debug;

/// External audio player, e.g. `afplay` or `ffplay -nodisp -autoexit`.
#[derive(Debug, Clone)]
pub struct Player {
    program: String,
    args: Vec<String>,
}

impl Player {
    /// Parse a whitespace-separated player command line.
    pub fn from_command(command: &str) -> Result<Self> {
        let mut parts = command.split_whitespace().map(str::to_string);
        let program = parts.next().context("audio player command is empty")?;
        Ok(Self { program, args: parts.collect() })
    }

    /// Play an audio file to completion.
    pub async fn play(&self, path: &Path) -> Result<()> {
        debug!("Playing {} with {}", path.display(), self.program);

        let status = Command::new(&self.program)
            .args(&self.args)
            .arg(path)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .status()
            .await
            .with_context(|| format!("failed to run audio player '{}'", self.program))?;

        if !status.success() {
            bail!("audio player '{}' exited with {}", self.program, status);
        }
        Ok(())
    }
}

/// Temporary audio file, removed on drop.
pub struct TempAudio {
    path: PathBuf,
}

impl TempAudio {
    pub fn new(extension: &str) -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        let n = COUNTER.fetch_add(1, Ordering::Relaxed);
        let path = std::env::temp_dir().join(format!("listener-{}-{}.{}", std::process::id(), n, extension));
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TempAudio {
    fn drop(&mut self) {
        // The file may never have been written if synthesis failed
        let _ = std::fs::remove_file(&self.path);
    }
}
