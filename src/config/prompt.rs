//! Interactive credential entry and the resolve-prompt-retry path.

use std::io::{BufRead, Write};
use std::path::Path;

use tracing::{info, warn};

use super::file::ConfigFile;
use super::settings::{Field, Layer, RunMode, Settings, Sources};
use crate::error::ConfigError;

/// Page where a Gemini API key can be issued.
const GEMINI_KEY_PAGE: &str = "https://aistudio.google.com/apikey";

/// Ask for each missing credential in turn.
///
/// # Errors
/// `CredentialDeclined` on an empty answer or end of input.
pub fn prompt_credentials<R: BufRead, W: Write>(fields: &[Field], input: &mut R, output: &mut W) -> Result<Vec<(Field, String)>, ConfigError> {
    writeln!(output, "  Typecast 자격 증명이 설정되지 않았습니다.")?;

    let mut entries = Vec::with_capacity(fields.len());
    for &field in fields {
        match read_answer(field, input, output)? {
            Some(value) => entries.push((field, value)),
            None => return Err(ConfigError::CredentialDeclined(field)),
        }
    }
    Ok(entries)
}

/// Offer the optional Gemini key. `None` means continue without summaries.
pub fn prompt_gemini_key<R: BufRead, W: Write>(input: &mut R, output: &mut W) -> Result<Option<String>, ConfigError> {
    writeln!(output, "  GEMINI_API_KEY가 설정되지 않았습니다.")?;
    writeln!(output, "  API 키 발급 페이지: {}", GEMINI_KEY_PAGE)?;
    let answer = read_answer(Field::GeminiApiKey, input, output)?;
    if answer.is_none() {
        writeln!(output, "  API 키가 입력되지 않았습니다. 뉴스 요약 없이 제목만 읽겠습니다.")?;
    }
    Ok(answer)
}

fn read_answer<R: BufRead, W: Write>(field: Field, input: &mut R, output: &mut W) -> Result<Option<String>, ConfigError> {
    write!(output, "  {}를 입력하세요: ", field.label())?;
    output.flush()?;

    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    let value = line.trim();
    Ok((!value.is_empty()).then(|| value.to_string()))
}

/// Resolve settings, recovering once from missing Typecast credentials.
///
/// On `MissingCredential` the user is prompted, the answers are written to the
/// config file at `path`, the file is reloaded and resolution is retried exactly
/// once. When `interactive` is set and no Gemini key exists anywhere, the key is
/// offered first (listening mode only). Without a terminal nothing is prompted:
/// stdin may be carrying transcripts, so missing credentials stay fatal.
///
/// # Errors
/// Any `ConfigError` from resolution, the file, or a declined prompt.
pub fn resolve_with_prompt<R: BufRead, W: Write>(
    cli: &Layer,
    env: &Layer,
    path: &Path,
    mode: RunMode,
    interactive: bool,
    input: &mut R,
    output: &mut W,
) -> Result<Settings, ConfigError> {
    let mut file = ConfigFile::load(path)?;
    let mut sources = Sources { cli: cli.clone(), env: env.clone(), file: file.layer() };

    if interactive
        && mode == RunMode::Listen
        && sources.lookup(Field::GeminiApiKey).is_none()
        && let Some(key) = prompt_gemini_key(input, output)?
    {
        file.set(Field::GeminiApiKey, key);
        file.save(path)?;
        info!("💾 Gemini API key saved to {}", path.display());
        sources.file = ConfigFile::load(path)?.layer();
    }

    let fields = match sources.resolve(mode) {
        Err(ConfigError::MissingCredential(fields)) if interactive => fields,
        resolved => return resolved,
    };

    warn!("Typecast selected but {} not configured", fields.iter().map(|f| f.env_var()).collect::<Vec<_>>().join(", "));
    for (field, value) in prompt_credentials(&fields, input, output)? {
        file.set(field, value);
    }
    file.save(path)?;
    info!("💾 Typecast credentials saved to {}", path.display());

    sources.file = ConfigFile::load(path)?.layer();
    sources.resolve(mode)
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::io::Cursor;

    use super::super::file::scratch_path;
    use super::super::settings::TtsEngineKind;
    use super::*;

    fn typecast_cli() -> Layer {
        Layer { tts_engine: Some("typecast".to_string()), ..Default::default() }
    }

    // A Gemini key in the environment keeps the optional Gemini prompt out of the way
    fn gemini_env() -> Layer {
        Layer { gemini_api_key: Some("gemini".to_string()), ..Default::default() }
    }

    #[test]
    fn test_prompt_persists_and_retries_once() {
        let path = scratch_path("prompt-ok");
        let _ = fs::remove_file(&path);
        let mut input = Cursor::new("api-key\nvoice-1\n");
        let mut output = Vec::new();

        let settings = resolve_with_prompt(&typecast_cli(), &gemini_env(), &path, RunMode::Listen, true, &mut input, &mut output).unwrap();

        assert_eq!(settings.tts_engine, TtsEngineKind::Typecast);
        assert_eq!(settings.typecast_api_key.as_deref(), Some("api-key"));
        assert_eq!(settings.typecast_voice_id.as_deref(), Some("voice-1"));

        let saved = ConfigFile::load(&path).unwrap();
        assert_eq!(saved.typecast_api_key.as_deref(), Some("api-key"));
        assert_eq!(saved.typecast_voice_id.as_deref(), Some("voice-1"));
        // Only entered values are persisted
        assert!(saved.tts_engine.is_none());
        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_declined_prompt_is_fatal_and_writes_nothing() {
        let path = scratch_path("prompt-declined");
        let _ = fs::remove_file(&path);
        let mut input = Cursor::new("api-key\n\n");
        let mut output = Vec::new();

        let err = resolve_with_prompt(&typecast_cli(), &gemini_env(), &path, RunMode::Listen, true, &mut input, &mut output).unwrap_err();

        assert!(matches!(err, ConfigError::CredentialDeclined(Field::TypecastVoiceId)));
        assert!(!path.exists());
    }

    #[test]
    fn test_piped_stdin_is_never_read_as_credentials() {
        let path = scratch_path("prompt-piped");
        let _ = fs::remove_file(&path);
        let mut input = Cursor::new("여보게\n지금 몇 시야\n");
        let mut output = Vec::new();

        let err = resolve_with_prompt(&typecast_cli(), &Layer::default(), &path, RunMode::Listen, false, &mut input, &mut output).unwrap_err();

        assert_eq!(err.missing_fields(), Some(&[Field::TypecastApiKey, Field::TypecastVoiceId][..]));
        assert!(output.is_empty());
        assert_eq!(input.position(), 0);
        assert!(!path.exists());
    }

    #[test]
    fn test_closed_stdin_declines() {
        let mut input = Cursor::new("");
        let mut output = Vec::new();
        let err = prompt_credentials(&[Field::TypecastApiKey], &mut input, &mut output).unwrap_err();
        assert!(matches!(err, ConfigError::CredentialDeclined(Field::TypecastApiKey)));
    }

    #[test]
    fn test_edge_never_prompts_or_writes() {
        let path = scratch_path("prompt-edge");
        let _ = fs::remove_file(&path);
        let mut input = Cursor::new("");
        let mut output = Vec::new();

        let settings = resolve_with_prompt(&Layer::default(), &Layer::default(), &path, RunMode::Listen, false, &mut input, &mut output).unwrap();

        assert_eq!(settings.tts_engine, TtsEngineKind::Edge);
        assert!(output.is_empty());
        assert!(!path.exists());
    }

    #[test]
    fn test_gemini_key_offered_when_interactive() {
        let path = scratch_path("prompt-gemini");
        let _ = fs::remove_file(&path);
        let mut input = Cursor::new("gemini-key\n");
        let mut output = Vec::new();

        let settings = resolve_with_prompt(&Layer::default(), &Layer::default(), &path, RunMode::Listen, true, &mut input, &mut output).unwrap();

        assert_eq!(settings.gemini_api_key.as_deref(), Some("gemini-key"));
        assert_eq!(ConfigFile::load(&path).unwrap().gemini_api_key.as_deref(), Some("gemini-key"));
        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_gemini_key_skipped_on_empty_answer() {
        let path = scratch_path("prompt-gemini-skip");
        let _ = fs::remove_file(&path);
        let mut input = Cursor::new("\n");
        let mut output = Vec::new();

        let settings = resolve_with_prompt(&Layer::default(), &Layer::default(), &path, RunMode::Listen, true, &mut input, &mut output).unwrap();

        assert!(settings.gemini_api_key.is_none());
        assert!(!path.exists());
    }
}
