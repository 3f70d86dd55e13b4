//! Listener - a Korean voice command assistant.
//!
//! Listens to transcripts from an external speech recognizer, matches a small
//! set of fixed Korean phrases (wake phrase, news, time, date, weather,
//! shutdown) and answers through Edge or Typecast text-to-speech.

mod actions;
mod command;
mod config;
mod error;
mod llm;
mod session;
mod stt;
mod tts;

#[cfg(test)]
mod testing;

use anyhow::{Context, Result};
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::LocalTime;

use actions::{Dispatcher, GoogleNews, OpenMeteo};
use config::{AppConfig, RunMode, Settings};
use llm::GeminiClient;
use session::{ListeningSession, SessionEnd};
use stt::LineRecognizer;
use tts::{Player, TtsEngine};

/// Wait for shutdown signal (Ctrl+C or SIGTERM) and cancel the session.
async fn wait_for_shutdown(cancel: CancellationToken) {
    tokio::select! {
        _ = signal::ctrl_c() => {
            info!("🛑 Received Ctrl+C, shutting down...");
        }
        _ = async {
            #[cfg(unix)]
            {
                match signal::unix::signal(signal::unix::SignalKind::terminate()) {
                    Ok(mut sigterm) => {
                        sigterm.recv().await;
                    }
                    Err(e) => {
                        warn!("Failed to register SIGTERM handler: {}", e);
                        std::future::pending::<()>().await;
                    }
                }
            }
            #[cfg(not(unix))]
            {
                std::future::pending::<()>().await;
            }
        } => {
            info!("🛑 Received SIGTERM, shutting down...");
        }
    }

    cancel.cancel();
}

/// Print the Typecast voice list.
///
/// # Returns
/// Process exit code
async fn list_voices(engine: &TtsEngine) -> i32 {
    match engine.list_voices().await {
        Ok(voices) => {
            tts::print_voices(&voices);
            0
        }
        Err(e) => {
            error!("❌ Cannot list voices: {}", e);
            1
        }
    }
}

/// Build the collaborators and run one listening session.
///
/// # Arguments
/// * `config` - Command line configuration
/// * `settings` - Resolved settings
/// * `engine` - TTS engine used for every answer
async fn run_session(config: &AppConfig, settings: &Settings, engine: TtsEngine) -> Result<SessionEnd> {
    let llm = match settings.gemini_api_key.as_deref() {
        Some(key) => Some(GeminiClient::new(key)?),
        None => None,
    };
    let dispatcher = Dispatcher::new(engine, GoogleNews::new(llm)?, OpenMeteo::new()?);

    let recognizer = match config.recognizer_cmd.as_deref() {
        Some(command) => LineRecognizer::spawn_command(command)?,
        None => LineRecognizer::stdin(),
    };

    let cancel = CancellationToken::new();
    tokio::spawn(wait_for_shutdown(cancel.clone()));

    let mut session = ListeningSession::new(recognizer, dispatcher, cancel);
    Ok(session.run().await)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let config = AppConfig::from_args();

    // Respect RUST_LOG env var, fallback to verbose flag, default to info
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if config.verbose { "debug" } else { "info" }));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_timer(LocalTime::new(time::macros::format_description!("[hour]:[minute]:[second]")))
        .init();

    info!("🎤 Listener v{}", env!("CARGO_PKG_VERSION"));

    let settings = match config.resolve_settings() {
        Ok(settings) => settings,
        Err(e) => {
            error!("❌ Configuration error: {}", e);
            if let Some(fields) = e.missing_fields() {
                let vars: Vec<_> = fields.iter().map(|f| f.env_var()).collect();
                error!("Set {} or run from a terminal to enter them.", vars.join(", "));
            }
            std::process::exit(1);
        }
    };

    config.log_config();
    settings.log_config();

    let player = Player::from_command(&config.player).context("Invalid audio player command")?;
    let engine = TtsEngine::from_settings(&settings, player)?;
    info!("🔊 TTS engine: {}", engine.kind());

    if config.run_mode() == RunMode::ListVoices {
        std::process::exit(list_voices(&engine).await);
    }

    match run_session(&config, &settings, engine).await? {
        SessionEnd::Shutdown => info!("👋 Shutdown requested"),
        SessionEnd::InputClosed => info!("Recognizer input ended"),
        SessionEnd::Interrupted => info!("Interrupted"),
    }

    info!("✅ Listener stopped");

    // The stdin reader thread may still be blocked on a read
    std::process::exit(0);
}
