//! Maps a final transcript to a [`Command`] using a fixed, ordered phrase table.

use std::fmt;

/// Command recognized from a final transcript.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Wake phrase: extend the listening window
    ExtendListening,
    /// Read the news summary, then the weather
    NewsAndWeather,
    Time,
    Date,
    WeatherOnly,
    Shutdown,
    /// No trigger matched; ignored silently
    Unrecognized,
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Command::ExtendListening => "extend-listening",
            Command::NewsAndWeather => "news-and-weather",
            Command::Time => "time",
            Command::Date => "date",
            Command::WeatherOnly => "weather",
            Command::Shutdown => "shutdown",
            Command::Unrecognized => "unrecognized",
        };
        f.write_str(name)
    }
}

/// Trigger phrases in priority order. The first row with a contained phrase wins.
/// Variants cover common recognizer spacing and spelling.
const TRIGGERS: &[(&[&str], Command)] = &[
    (&["여보게", "여보께", "여보 게"], Command::ExtendListening),
    (&["오늘 뉴스", "오늘의 뉴스"], Command::NewsAndWeather),
    (&["몇 시야", "몇시야", "몇 시 야", "몇시 야"], Command::Time),
    (&["몇일이야", "몇 일이야", "며칠이야", "며 칠이야"], Command::Date),
    (&["오늘 날씨", "몇 도야", "날씨"], Command::WeatherOnly),
];

/// Request endings that end the session when nothing more specific matched.
const TERMINATION_SUFFIXES: &[&str] = &["줘", "줘요", "주세요"];

/// Match a transcript against the command table.
///
/// Case-insensitive substring containment, evaluated top-down; the termination
/// suffix is checked last so it never shadows a specific command.
pub fn match_command(transcript: &str) -> Command {
    let text = transcript.to_lowercase();

    for (phrases, command) in TRIGGERS {
        if phrases.iter().any(|phrase| text.contains(phrase)) {
            return *command;
        }
    }

    let tail = text.trim_end_matches(|c: char| c.is_whitespace() || matches!(c, '.' | '!' | '?' | ','));
    if !tail.is_empty() && TERMINATION_SUFFIXES.iter().any(|suffix| tail.ends_with(suffix)) {
        return Command::Shutdown;
    }

    Command::Unrecognized
}
