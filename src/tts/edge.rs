//! Edge TTS via the `edge-tts` command-line tool.

use std::process::Stdio;

use anyhow::{Context, Result, bail};
use tokio::process::Command;
use tracing::{debug, info};

use super::player::{Player, TempAudio};
use super::text::chunk_sentences;
use crate::config::{EDGE_VOICE, TtsEngineKind};
use crate::error::TtsError;

/// Maximum characters synthesized per `edge-tts` invocation.
const MAX_CHUNK_CHARS: usize = 400;

/// Free Edge TTS with the fixed Korean voice. Needs no credentials.
pub struct EdgeTts {
    program: String,
    voice: &'static str,
    player: Player,
}

impl EdgeTts {
    pub fn new(player: Player) -> Self {
        info!("Using Edge TTS voice {}", EDGE_VOICE);
        Self { program: "edge-tts".to_string(), voice: EDGE_VOICE, player }
    }

    pub async fn speak(&self, text: &str) -> Result<(), TtsError> {
        for chunk in chunk_sentences(text, MAX_CHUNK_CHARS) {
            self.speak_chunk(&chunk).await.map_err(|e| TtsError::engine(TtsEngineKind::Edge, e))?;
        }
        Ok(())
    }

    async fn speak_chunk(&self, text: &str) -> Result<()> {
        let audio = TempAudio::new("mp3");
        self.synthesize(text, &audio).await?;
        self.player.play(audio.path()).await
    }

    async fn synthesize(&self, text: &str, audio: &TempAudio) -> Result<()> {
        debug!("Synthesizing with {}: \"{}\"", self.program, text);

        let output = Command::new(&self.program)
            .arg("--voice")
            .arg(self.voice)
            .arg("--text")
            .arg(text)
            .arg("--write-media")
            .arg(audio.path())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .with_context(|| format!("failed to run {} (install with `pip install edge-tts`)", self.program))?;

        if !output.status.success() {
            bail!("{} exited with {}: {}", self.program, output.status, String::from_utf8_lossy(&output.stderr).trim());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_binary_is_engine_error() {
        let mut edge = EdgeTts::new(Player::from_command("true").unwrap());
        edge.program = "listener-test-no-such-edge-tts".to_string();

        match edge.speak("안녕하세요.").await {
            Err(TtsError::Engine { engine, .. }) => assert_eq!(engine, TtsEngineKind::Edge),
            other => panic!("expected engine error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_blank_text_is_noop() {
        let mut edge = EdgeTts::new(Player::from_command("true").unwrap());
        edge.program = "listener-test-no-such-edge-tts".to_string();
        assert!(edge.speak("  ").await.is_ok());
    }
}
