//! Settings resolution: command line > environment > config file > default.

use std::fmt;

use tracing::info;

use crate::error::ConfigError;

/// Fixed Edge TTS voice.
pub const EDGE_VOICE: &str = "ko-KR-SunHiNeural";

/// TTS backend selected for the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TtsEngineKind {
    /// Free Edge TTS, no credentials required
    #[default]
    Edge,
    /// Typecast API, requires an API key and a voice id
    Typecast,
}

impl TtsEngineKind {
    const EXPECTED: &'static str = "edge, typecast";

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "edge" => Some(TtsEngineKind::Edge),
            "typecast" => Some(TtsEngineKind::Typecast),
            _ => None,
        }
    }
}

impl fmt::Display for TtsEngineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TtsEngineKind::Edge => write!(f, "edge"),
            TtsEngineKind::Typecast => write!(f, "typecast"),
        }
    }
}

/// Typecast synthesis model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TypecastModel {
    #[default]
    SsfmV21,
    SsfmV30,
}

impl TypecastModel {
    const EXPECTED: &'static str = "ssfm-v21, ssfm-v30";

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "ssfm-v21" => Some(TypecastModel::SsfmV21),
            "ssfm-v30" => Some(TypecastModel::SsfmV30),
            _ => None,
        }
    }

    /// Model identifier as used by the Typecast API.
    pub fn as_str(&self) -> &'static str {
        match self {
            TypecastModel::SsfmV21 => "ssfm-v21",
            TypecastModel::SsfmV30 => "ssfm-v30",
        }
    }
}

impl fmt::Display for TypecastModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a resolved value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Cli,
    Env,
    File,
    Default,
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Cli => write!(f, "command line"),
            Source::Env => write!(f, "environment"),
            Source::File => write!(f, "config file"),
            Source::Default => write!(f, "default"),
        }
    }
}

/// A single resolvable setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    TtsEngine,
    TypecastApiKey,
    TypecastVoiceId,
    TypecastModel,
    GeminiApiKey,
}

impl Field {
    pub const ALL: [Field; 5] = [Field::TtsEngine, Field::TypecastApiKey, Field::TypecastVoiceId, Field::TypecastModel, Field::GeminiApiKey];

    /// Environment variable holding this field.
    pub fn env_var(self) -> &'static str {
        match self {
            Field::TtsEngine => "TTS_ENGINE",
            Field::TypecastApiKey => "TYPECAST_API_KEY",
            Field::TypecastVoiceId => "TYPECAST_VOICE_ID",
            Field::TypecastModel => "TYPECAST_MODEL",
            Field::GeminiApiKey => "GEMINI_API_KEY",
        }
    }

    /// Key of this field in the persisted config file.
    pub fn file_key(self) -> &'static str {
        match self {
            Field::TtsEngine => "tts_engine",
            Field::TypecastApiKey => "typecast_api_key",
            Field::TypecastVoiceId => "typecast_voice_id",
            Field::TypecastModel => "typecast_model",
            Field::GeminiApiKey => "gemini_api_key",
        }
    }

    /// Human label used by the interactive prompt.
    pub fn label(self) -> &'static str {
        match self {
            Field::TtsEngine => "TTS engine",
            Field::TypecastApiKey => "Typecast API Key",
            Field::TypecastVoiceId => "Typecast Voice ID",
            Field::TypecastModel => "Typecast model",
            Field::GeminiApiKey => "Gemini API Key",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.file_key())
    }
}

/// Raw, unvalidated values from one source. Blank values count as unset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Layer {
    pub tts_engine: Option<String>,
    pub typecast_api_key: Option<String>,
    pub typecast_voice_id: Option<String>,
    pub typecast_model: Option<String>,
    pub gemini_api_key: Option<String>,
}

impl Layer {
    /// Build a layer from environment variables via `lookup`.
    pub fn from_env<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut layer = Layer::default();
        for field in Field::ALL {
            if let Some(value) = lookup(field.env_var()) {
                layer.set(field, value);
            }
        }
        layer
    }

    pub fn get(&self, field: Field) -> Option<&str> {
        let value = match field {
            Field::TtsEngine => &self.tts_engine,
            Field::TypecastApiKey => &self.typecast_api_key,
            Field::TypecastVoiceId => &self.typecast_voice_id,
            Field::TypecastModel => &self.typecast_model,
            Field::GeminiApiKey => &self.gemini_api_key,
        };
        value.as_deref().map(str::trim).filter(|v| !v.is_empty())
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

/// What the resolved settings will be used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Full listening session
    Listen,
    /// `--list-voices`: only the Typecast API key is needed
    ListVoices,
}

/// The three non-default sources, in precedence order.
#[derive(Debug, Clone, Default)]
pub struct Sources {
    pub cli: Layer,
    pub env: Layer,
    pub file: Layer,
}

impl Sources {
    /// Highest-precedence value for `field`, with its source.
    pub fn lookup(&self, field: Field) -> Option<(&str, Source)> {
        self.cli
            .get(field)
            .map(|v| (v, Source::Cli))
            .or_else(|| self.env.get(field).map(|v| (v, Source::Env)))
            .or_else(|| self.file.get(field).map(|v| (v, Source::File)))
    }

    /// Resolve every field independently.
    ///
    /// # Errors
    /// - `InvalidValue` if the engine or model is not a known value; names the source.
    /// - `MissingCredential` if Typecast is selected and a required credential is absent
    ///   from every source. Callers may recover by prompting (see `resolve_with_prompt`).
    pub fn resolve(&self, mode: RunMode) -> Result<Settings, ConfigError> {
        let mut origins = Vec::with_capacity(Field::ALL.len());

        let tts_engine = match self.lookup(Field::TtsEngine) {
            Some((value, origin)) => {
                origins.push((Field::TtsEngine, origin));
                TtsEngineKind::parse(value).ok_or_else(|| ConfigError::InvalidValue {
                    field: Field::TtsEngine,
                    value: value.to_string(),
                    origin,
                    expected: TtsEngineKind::EXPECTED,
                })?
            }
            None => {
                origins.push((Field::TtsEngine, Source::Default));
                TtsEngineKind::default()
            }
        };

        let typecast_model = match self.lookup(Field::TypecastModel) {
            Some((value, origin)) => {
                origins.push((Field::TypecastModel, origin));
                TypecastModel::parse(value).ok_or_else(|| ConfigError::InvalidValue {
                    field: Field::TypecastModel,
                    value: value.to_string(),
                    origin,
                    expected: TypecastModel::EXPECTED,
                })?
            }
            None => {
                origins.push((Field::TypecastModel, Source::Default));
                TypecastModel::default()
            }
        };

        let mut optional = |field: Field| match self.lookup(field) {
            Some((value, origin)) => {
                origins.push((field, origin));
                Some(value.to_string())
            }
            None => {
                origins.push((field, Source::Default));
                None
            }
        };
        let typecast_api_key = optional(Field::TypecastApiKey);
        let typecast_voice_id = optional(Field::TypecastVoiceId);
        let gemini_api_key = optional(Field::GeminiApiKey);

        let settings = Settings { tts_engine, typecast_api_key, typecast_voice_id, typecast_model, gemini_api_key, origins };

        let missing = settings.missing_credentials(mode);
        if !missing.is_empty() {
            return Err(ConfigError::MissingCredential(missing));
        }

        Ok(settings)
    }
}

/// Resolved, read-only settings for one process run.
#[derive(Clone, PartialEq, Eq)]
pub struct Settings {
    pub tts_engine: TtsEngineKind,
    pub typecast_api_key: Option<String>,
    pub typecast_voice_id: Option<String>,
    pub typecast_model: TypecastModel,
    pub gemini_api_key: Option<String>,
    origins: Vec<(Field, Source)>,
}

impl Settings {
    /// Edge settings with nothing else configured.
    #[cfg(test)]
    pub fn edge() -> Self {
        Settings {
            tts_engine: TtsEngineKind::Edge,
            typecast_api_key: None,
            typecast_voice_id: None,
            typecast_model: TypecastModel::default(),
            gemini_api_key: None,
            origins: Vec::new(),
        }
    }

    /// Source the value of `field` was taken from.
    pub fn origin(&self, field: Field) -> Source {
        self.origins.iter().find(|(f, _)| *f == field).map(|(_, s)| *s).unwrap_or(Source::Default)
    }

    /// Credentials the selected engine needs for `mode` but does not have.
    pub fn missing_credentials(&self, mode: RunMode) -> Vec<Field> {
        if self.tts_engine != TtsEngineKind::Typecast {
            return Vec::new();
        }
        let required: &[Field] = match mode {
            RunMode::Listen => &[Field::TypecastApiKey, Field::TypecastVoiceId],
            RunMode::ListVoices => &[Field::TypecastApiKey],
        };
        required
            .iter()
            .copied()
            .filter(|field| match field {
                Field::TypecastApiKey => self.typecast_api_key.is_none(),
                Field::TypecastVoiceId => self.typecast_voice_id.is_none(),
                _ => false,
            })
            .collect()
    }

    /// Log the resolved settings. Secrets are only reported as set/unset.
    pub fn log_config(&self) {
        info!("Settings:");
        info!("  TTS engine: {} ({})", self.tts_engine, self.origin(Field::TtsEngine));
        match self.tts_engine {
            TtsEngineKind::Edge => info!("  Edge voice: {}", EDGE_VOICE),
            TtsEngineKind::Typecast => {
                info!("  Typecast model: {} ({})", self.typecast_model, self.origin(Field::TypecastModel));
                info!("  Typecast voice: {}", self.typecast_voice_id.as_deref().unwrap_or("<unset>"));
                info!("  Typecast API key: {}", redact(&self.typecast_api_key, self.origin(Field::TypecastApiKey)));
            }
        }
        info!("  Gemini API key: {}", redact(&self.gemini_api_key, self.origin(Field::GeminiApiKey)));
    }
}

fn redact(value: &Option<String>, origin: Source) -> String {
    match value {
        Some(_) => format!("set ({})", origin),
        None => "unset".to_string(),
    }
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("tts_engine", &self.tts_engine)
            .field("typecast_api_key", &self.typecast_api_key.as_ref().map(|_| "<redacted>"))
            .field("typecast_voice_id", &self.typecast_voice_id)
            .field("typecast_model", &self.typecast_model)
            .field("gemini_api_key", &self.gemini_api_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}
