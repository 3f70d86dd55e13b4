//! Typecast TTS over its HTTPS API.

use std::time::Duration;

use anyhow::{Context, Result, bail};
use serde::Serialize;
use tracing::{debug, info};

use super::engine::VoiceDescriptor;
use super::player::{Player, TempAudio};
use super::text::chunk_sentences;
use crate::config::{Field, Settings, TtsEngineKind, TypecastModel};
use crate::error::TtsError;

const TYPECAST_API_URL: &str = "https://api.typecast.ai/v1";

/// Typecast request limit is generous; keep chunks short for faster first audio.
const MAX_CHUNK_CHARS: usize = 300;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Serialize)]
struct SpeechRequest<'a> {
    voice_id: &'a str,
    text: &'a str,
    model: &'a str,
    language: &'a str,
    output: OutputOptions,
}

#[derive(Serialize)]
struct OutputOptions {
    audio_format: &'static str,
}

/// API-keyed Typecast TTS.
pub struct TypecastTts {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    voice_id: Option<String>,
    model: TypecastModel,
    player: Player,
}

impl TypecastTts {
    /// Create the engine. Missing credentials are reported when used, not here.
    pub fn new(settings: &Settings, player: Player) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build().context("Failed to create HTTP client")?;

        info!("Using Typecast TTS model {}", settings.typecast_model);

        Ok(Self {
            client,
            base_url: TYPECAST_API_URL.to_string(),
            api_key: settings.typecast_api_key.clone(),
            voice_id: settings.typecast_voice_id.clone(),
            model: settings.typecast_model,
            player,
        })
    }

    fn api_key(&self) -> Result<&str, TtsError> {
        self.api_key.as_deref().ok_or(TtsError::MissingCredential { engine: TtsEngineKind::Typecast, field: Field::TypecastApiKey })
    }

    fn voice_id(&self) -> Result<&str, TtsError> {
        self.voice_id.as_deref().ok_or(TtsError::MissingCredential { engine: TtsEngineKind::Typecast, field: Field::TypecastVoiceId })
    }

    /// Synthesize and play `text`. Fails fast without credentials.
    pub async fn speak(&self, text: &str) -> Result<(), TtsError> {
        let api_key = self.api_key()?;
        let voice_id = self.voice_id()?;

        for chunk in chunk_sentences(text, MAX_CHUNK_CHARS) {
            self.speak_chunk(api_key, voice_id, &chunk).await.map_err(|e| TtsError::engine(TtsEngineKind::Typecast, e))?;
        }
        Ok(())
    }

    async fn speak_chunk(&self, api_key: &str, voice_id: &str, text: &str) -> Result<()> {
        debug!("Synthesizing with Typecast ({} chars)", text.chars().count());

        let request = SpeechRequest {
            voice_id,
            text,
            model: self.model.as_str(),
            language: "kor",
            output: OutputOptions { audio_format: "wav" },
        };

        let response = self
            .client
            .post(format!("{}/text-to-speech", self.base_url))
            .header("X-API-KEY", api_key)
            .json(&request)
            .send()
            .await
            .context("Typecast request failed")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            bail!("Typecast error {}: {}", status, body);
        }

        let audio_bytes = response.bytes().await.context("Failed to read Typecast audio")?;
        let audio = TempAudio::new("wav");
        tokio::fs::write(audio.path(), &audio_bytes).await.context("Failed to write Typecast audio")?;

        self.player.play(audio.path()).await
    }

    /// Voices available for the configured model.
    pub async fn list_voices(&self) -> Result<Vec<VoiceDescriptor>, TtsError> {
        let api_key = self.api_key()?;
        self.fetch_voices(api_key).await.map_err(|e| TtsError::engine(TtsEngineKind::Typecast, e))
    }

    async fn fetch_voices(&self, api_key: &str) -> Result<Vec<VoiceDescriptor>> {
        let url = format!("{}/voices?model={}", self.base_url, urlencoding::encode(self.model.as_str()));

        let response = self.client.get(url).header("X-API-KEY", api_key).send().await.context("Typecast voice list request failed")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            bail!("Typecast error {}: {}", status, body);
        }

        response.json::<Vec<VoiceDescriptor>>().await.context("Unexpected Typecast voice list")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn typecast(api_key: Option<&str>, voice_id: Option<&str>) -> TypecastTts {
        let mut settings = Settings::edge();
        settings.tts_engine = TtsEngineKind::Typecast;
        settings.typecast_api_key = api_key.map(str::to_string);
        settings.typecast_voice_id = voice_id.map(str::to_string);

        let mut engine = TypecastTts::new(&settings, Player::from_command("true").unwrap()).unwrap();
        // Any accidental request fails locally instead of reaching the network
        engine.base_url = "http://127.0.0.1:9".to_string();
        engine
    }

    #[tokio::test]
    async fn test_speak_without_api_key_fails_fast() {
        let engine = typecast(None, Some("voice"));
        match engine.speak("안녕하세요").await {
            Err(TtsError::MissingCredential { engine, field }) => {
                assert_eq!(engine, TtsEngineKind::Typecast);
                assert_eq!(field, Field::TypecastApiKey);
            }
            other => panic!("expected MissingCredential, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_speak_without_voice_fails_fast() {
        let engine = typecast(Some("key"), None);
        assert!(matches!(engine.speak("안녕하세요").await, Err(TtsError::MissingCredential { field: Field::TypecastVoiceId, .. })));
    }

    #[tokio::test]
    async fn test_list_voices_needs_only_api_key() {
        let engine = typecast(None, None);
        assert!(matches!(engine.list_voices().await, Err(TtsError::MissingCredential { field: Field::TypecastApiKey, .. })));

        // With a key the request is attempted (and fails against the closed port)
        let engine = typecast(Some("key"), None);
        assert!(matches!(engine.list_voices().await, Err(TtsError::Engine { .. })));
    }

    #[test]
    fn test_request_body_shape() {
        let request = SpeechRequest { voice_id: "v", text: "안녕", model: "ssfm-v21", language: "kor", output: OutputOptions { audio_format: "wav" } };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["voice_id"], "v");
        assert_eq!(json["model"], "ssfm-v21");
        assert_eq!(json["output"]["audio_format"], "wav");
    }
}
