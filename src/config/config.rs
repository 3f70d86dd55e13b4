//! Command line arguments and settings bootstrap.

use std::io::IsTerminal;
use std::path::PathBuf;

use clap::Parser;
use tracing::info;

use super::file::ConfigFile;
use super::prompt::resolve_with_prompt;
use super::settings::{Field, Layer, RunMode, Settings};
use crate::error::ConfigError;

/// Default audio player command for synthesized speech.
#[cfg(target_os = "macos")]
const DEFAULT_PLAYER: &str = "afplay";
#[cfg(not(target_os = "macos"))]
const DEFAULT_PLAYER: &str = "ffplay -nodisp -autoexit -loglevel quiet";

/// Listener command line.
///
/// The TTS flags are plain strings so invalid values are reported by the
/// settings resolver together with their source.
#[derive(Parser, Debug, Clone)]
#[command(name = "listener")]
#[command(author, version, about = "A Korean voice command assistant", long_about = None)]
pub struct AppConfig {
    /// TTS engine: edge or typecast
    #[arg(long = "tts", value_name = "ENGINE")]
    pub tts: Option<String>,

    /// Typecast voice id
    #[arg(long, value_name = "ID")]
    pub typecast_voice: Option<String>,

    /// Typecast model: ssfm-v21 or ssfm-v30
    #[arg(long, value_name = "MODEL")]
    pub typecast_model: Option<String>,

    /// List available Typecast voices and exit
    #[arg(long)]
    pub list_voices: bool,

    /// Config file path (default: ~/.listener.json)
    #[arg(long, env = "LISTENER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Shell command whose stdout emits recognition events (default: read stdin)
    #[arg(long, env = "RECOGNIZER_CMD")]
    pub recognizer_cmd: Option<String>,

    /// Command used to play synthesized audio files
    #[arg(long, env = "AUDIO_PLAYER", default_value = DEFAULT_PLAYER)]
    pub player: String,

    /// Enable verbose logging
    #[arg(long, short = 'v')]
    pub verbose: bool,
}

impl AppConfig {
    /// Parse configuration from command line arguments.
    pub fn from_args() -> Self {
        Self::parse()
    }

    /// The command line as a resolution layer.
    pub fn cli_layer(&self) -> Layer {
        Layer {
            tts_engine: self.tts.clone(),
            typecast_api_key: None,
            typecast_voice_id: self.typecast_voice.clone(),
            typecast_model: self.typecast_model.clone(),
            gemini_api_key: None,
        }
    }

    pub fn run_mode(&self) -> RunMode {
        if self.list_voices { RunMode::ListVoices } else { RunMode::Listen }
    }

    pub fn config_path(&self) -> Result<PathBuf, ConfigError> {
        match &self.config {
            Some(path) => Ok(path.clone()),
            None => ConfigFile::default_path(),
        }
    }

    /// Resolve the session settings from all sources, prompting on the terminal
    /// for missing Typecast credentials.
    pub fn resolve_settings(&self) -> Result<Settings, ConfigError> {
        let path = self.config_path()?;
        let env = Layer::from_env(|key| std::env::var(key).ok());

        // Optional prompts only on a real terminal
        let stdin = std::io::stdin();
        let interactive = stdin.is_terminal();
        let mut input = stdin.lock();
        let mut output = std::io::stdout();
        resolve_with_prompt(&self.cli_layer(), &env, &path, self.run_mode(), interactive, &mut input, &mut output)
    }

    /// Log the current configuration.
    pub fn log_config(&self) {
        info!("Configuration:");
        if let Ok(path) = self.config_path() {
            info!("  Config file: {}", path.display());
        }
        match &self.recognizer_cmd {
            Some(cmd) => info!("  Recognizer: {}", cmd),
            None => info!("  Recognizer: stdin"),
        }
        info!("  Audio player: {}", self.player);
        if let Some(ref tts) = self.tts {
            info!("  --tts: {}", tts);
        }
        for field in [Field::TtsEngine, Field::TypecastModel] {
            if let Ok(value) = std::env::var(field.env_var()) {
                info!("  {}: {}", field.env_var(), value);
            }
        }
    }
}
