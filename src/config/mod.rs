//! Configuration module for the listener.
//!
//! Provides CLI argument parsing, the persisted config file, and settings
//! resolution across command line, environment, file and defaults.

#[allow(clippy::module_inception)]
mod config;
mod file;
mod prompt;
mod settings;

pub use config::AppConfig;
pub use settings::{EDGE_VOICE, Field, RunMode, Settings, Source, TtsEngineKind, TypecastModel};
