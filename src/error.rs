//! Error types for the listener.
//!
//! Only [`ConfigError`] is fatal. Everything raised while the session is
//! listening is logged and absorbed by the session loop.

use std::path::PathBuf;

use thiserror::Error;

use crate::config::{Field, Source, TtsEngineKind};

/// Errors raised while resolving settings, before the session starts.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A field holds a value outside its allowed set
    #[error("invalid {field} value '{value}' from {origin} (expected one of: {expected})")]
    InvalidValue { field: Field, value: String, origin: Source, expected: &'static str },

    /// Typecast was selected but credentials are not resolvable from any source
    #[error("missing Typecast credentials: {}", join_fields(.0))]
    MissingCredential(Vec<Field>),

    /// Interactive credential entry was declined or produced no value
    #[error("no value entered for {0}")]
    CredentialDeclined(Field),

    /// Home directory could not be determined for the default config path
    #[error("cannot determine home directory for the config file")]
    NoHomeDir,

    #[error("failed to read config file {path}: {cause}")]
    Read { path: PathBuf, cause: std::io::Error },

    #[error("failed to parse config file {path}: {cause}")]
    Parse { path: PathBuf, cause: serde_json::Error },

    #[error("failed to write config file {path}: {cause}")]
    Write { path: PathBuf, cause: std::io::Error },

    /// Terminal I/O failed during interactive entry
    #[error("prompt failed: {0}")]
    Prompt(#[from] std::io::Error),
}

impl ConfigError {
    /// Fields the interactive prompt has to collect, if this is a recoverable credential gap.
    pub fn missing_fields(&self) -> Option<&[Field]> {
        match self {
            ConfigError::MissingCredential(fields) => Some(fields),
            _ => None,
        }
    }
}

fn join_fields(fields: &[Field]) -> String {
    fields.iter().map(|f| f.env_var()).collect::<Vec<_>>().join(", ")
}

/// Errors from a TTS engine. Reported per call, never retried by the engine.
#[derive(Debug, Error)]
pub enum TtsError {
    #[error("{engine} TTS does not support {operation}")]
    NotSupported { engine: TtsEngineKind, operation: &'static str },

    #[error("{engine} TTS requires {}", .field.env_var())]
    MissingCredential { engine: TtsEngineKind, field: Field },

    #[error("{engine} TTS failed: {cause:#}")]
    Engine {
        engine: TtsEngineKind,
        #[source]
        cause: anyhow::Error,
    },
}

impl TtsError {
    pub fn engine(engine: TtsEngineKind, cause: anyhow::Error) -> Self {
        TtsError::Engine { engine, cause }
    }
}

/// Errors reported by the recognizer. Treated like an elapsed window.
#[derive(Debug, Error)]
pub enum RecognitionError {
    #[error("recognizer I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed recognizer event: {0}")]
    Protocol(String),

    /// Error reported by the external recognizer itself
    #[error("recognizer reported: {0}")]
    Reported(String),
}

/// Errors from the news, weather and LLM collaborators.
#[derive(Debug, Error)]
pub enum ActionError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected response: {0}")]
    Parse(String),

    #[error("no news items in feed")]
    NoNews,

    #[error("LLM error: {0}")]
    Llm(String),
}
