//! Persisted JSON config file (`~/.listener.json`).
//!
//! All fields are optional; the file is a partial overlay under the command line
//! and the environment. Keys this program does not know about are kept on write.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::settings::{Field, Layer};
use crate::error::ConfigError;

/// File name of the config file inside the home directory.
pub const CONFIG_FILE_NAME: &str = ".listener.json";

/// On-disk schema of the config file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gemini_api_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tts_engine: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub typecast_api_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub typecast_voice_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub typecast_model: Option<String>,

    /// Unknown keys, preserved verbatim
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl ConfigFile {
    /// Default location: `~/.listener.json`.
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        dirs::home_dir().map(|home| home.join(CONFIG_FILE_NAME)).ok_or(ConfigError::NoHomeDir)
    }

    /// Load the file. A missing or empty file is an empty overlay.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No config file at {}", path.display());
                return Ok(Self::default());
            }
            Err(cause) => return Err(ConfigError::Read { path: path.to_path_buf(), cause }),
        };

        if contents.trim().is_empty() {
            return Ok(Self::default());
        }

        serde_json::from_str(&contents).map_err(|cause| ConfigError::Parse { path: path.to_path_buf(), cause })
    }

    /// Write the file, readable only by the owner on Unix.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let write_err = |cause| ConfigError::Write { path: path.to_path_buf(), cause };

        let json = serde_json::to_string_pretty(self).map_err(|cause| ConfigError::Parse { path: path.to_path_buf(), cause })?;

        let mut options = fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }
        let mut out = options.open(path).map_err(write_err)?;

        // `mode` only applies to new files; tighten an existing one before writing secrets
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            out.set_permissions(fs::Permissions::from_mode(0o600)).map_err(write_err)?;
        }

        out.write_all((json + "\n").as_bytes()).map_err(write_err)?;
        Ok(())
    }

    /// View of the file as a resolution layer.
    pub fn layer(&self) -> Layer {
        Layer {
            tts_engine: self.tts_engine.clone(),
            typecast_api_key: self.typecast_api_key.clone(),
            typecast_voice_id: self.typecast_voice_id.clone(),
            typecast_model: self.typecast_model.clone(),
            gemini_api_key: self.gemini_api_key.clone(),
        }
    }

    pub fn set(&mut self, field: Field, value: String) {
        let slot = match field {
            Field::TtsEngine => &mut self.tts_engine,
            Field::TypecastApiKey => &mut self.typecast_api_key,
            Field::TypecastVoiceId => &mut self.typecast_voice_id,
            Field::TypecastModel => &mut self.typecast_model,
            Field::GeminiApiKey => &mut self.gemini_api_key,
        };
        *slot = Some(value);
    }
}

#[cfg(test)]
pub(crate) fn scratch_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("listener-test-{}-{}.json", std::process::id(), name))
}
