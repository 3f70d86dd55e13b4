//! TTS engine selection and the uniform speak contract.

use anyhow::Result;
use serde::Deserialize;
use tracing::info;

use super::edge::EdgeTts;
use super::player::Player;
use super::typecast::TypecastTts;
use crate::config::{Settings, TtsEngineKind};
use crate::error::TtsError;

/// Anything that can speak a line of text.
pub trait Speaker {
    async fn speak(&self, text: &str) -> Result<(), TtsError>;
}

/// A Typecast voice as returned by the voice list API.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct VoiceDescriptor {
    #[serde(alias = "id")]
    pub voice_id: String,
    #[serde(alias = "name")]
    pub voice_name: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub emotions: Vec<String>,
}

/// The configured TTS engine.
///
/// Only the Typecast variant can list voices; check [`TtsEngine::kind`] first or
/// handle `TtsError::NotSupported`.
pub enum TtsEngine {
    Edge(EdgeTts),
    Typecast(TypecastTts),
}

impl TtsEngine {
    /// Build the engine selected by `settings`.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be created.
    pub fn from_settings(settings: &Settings, player: Player) -> Result<Self> {
        Ok(match settings.tts_engine {
            TtsEngineKind::Edge => TtsEngine::Edge(EdgeTts::new(player)),
            TtsEngineKind::Typecast => TtsEngine::Typecast(TypecastTts::new(settings, player)?),
        })
    }

    pub fn kind(&self) -> TtsEngineKind {
        match self {
            TtsEngine::Edge(_) => TtsEngineKind::Edge,
            TtsEngine::Typecast(_) => TtsEngineKind::Typecast,
        }
    }

    /// Speak `text`. Errors are returned to the caller and never retried here.
    pub async fn speak(&self, text: &str) -> Result<(), TtsError> {
        if text.trim().is_empty() {
            return Ok(());
        }
        info!("🔊 {}", text);
        match self {
            TtsEngine::Edge(edge) => edge.speak(text).await,
            TtsEngine::Typecast(typecast) => typecast.speak(text).await,
        }
    }

    pub async fn list_voices(&self) -> Result<Vec<VoiceDescriptor>, TtsError> {
        match self {
            TtsEngine::Edge(_) => Err(TtsError::NotSupported { engine: TtsEngineKind::Edge, operation: "voice listing" }),
            TtsEngine::Typecast(typecast) => typecast.list_voices().await,
        }
    }
}

impl Speaker for TtsEngine {
    async fn speak(&self, text: &str) -> Result<(), TtsError> {
        TtsEngine::speak(self, text).await
    }
}

/// Print a voice table for `--list-voices`.
pub fn print_voices(voices: &[VoiceDescriptor]) {
    println!("═══════════════════════════════════════════════════════════════════");
    println!("  Typecast - {} Voices", voices.len());
    println!("═══════════════════════════════════════════════════════════════════");
    println!("{:<28} {:<20} {:<10} EMOTIONS", "VOICE ID", "NAME", "MODEL");
    println!("{}", "─".repeat(70));

    for voice in voices {
        println!("{:<28} {:<20} {:<10} {}", voice.voice_id, voice.voice_name, voice.model.as_deref().unwrap_or("-"), voice.emotions.join(","));
    }

    println!();
    println!("Usage:");
    println!("  listener --tts typecast --typecast-voice <VOICE ID>");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_edge_cannot_list_voices() {
        let engine = TtsEngine::from_settings(&Settings::edge(), Player::from_command("true").unwrap()).unwrap();
        assert_eq!(engine.kind(), TtsEngineKind::Edge);
        assert!(matches!(engine.list_voices().await, Err(TtsError::NotSupported { engine: TtsEngineKind::Edge, .. })));
    }

    #[tokio::test]
    async fn test_settings_select_engine() {
        let mut settings = Settings::edge();
        settings.tts_engine = TtsEngineKind::Typecast;
        let engine = TtsEngine::from_settings(&settings, Player::from_command("true").unwrap()).unwrap();
        assert_eq!(engine.kind(), TtsEngineKind::Typecast);
        // No credentials: fails before any network call
        assert!(matches!(engine.speak("테스트").await, Err(TtsError::MissingCredential { .. })));
    }

    #[test]
    fn test_voice_descriptor_parsing() {
        let voices: Vec<VoiceDescriptor> = serde_json::from_str(
            r#"[{"voice_id": "tc_1", "voice_name": "Olivia", "model": "ssfm-v21", "emotions": ["normal", "happy"]},
                {"id": "tc_2", "name": "Minji"}]"#,
        )
        .unwrap();
        assert_eq!(voices[0].voice_id, "tc_1");
        assert_eq!(voices[0].emotions, vec!["normal", "happy"]);
        assert_eq!(voices[1].voice_name, "Minji");
        assert!(voices[1].model.is_none());
    }
}
