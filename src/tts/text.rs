//! Text preparation for synthesis.

/// Split text into sentences on `.`, `!`, `?` and newlines.
///
/// Punctuation only ends a sentence when followed by whitespace or the end of
/// the text, so `18.5도` stays whole.
pub fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut current = String::new();
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        current.push(c);

        let at_boundary = chars.peek().is_none_or(|next| next.is_whitespace());
        if c == '\n' || (matches!(c, '.' | '!' | '?') && at_boundary) {
            let trimmed = current.trim().to_string();
            if !trimmed.is_empty() {
                sentences.push(trimmed);
            }
            current.clear();
        }
    }

    let trimmed = current.trim().to_string();
    if !trimmed.is_empty() {
        sentences.push(trimmed);
    }

    sentences
}

/// Group sentences into chunks of at most `max_chars` characters.
///
/// Each chunk is synthesized and played before the next one is requested, so
/// playback starts before a long news summary is fully synthesized. A single
/// sentence longer than the limit becomes its own chunk.
pub fn chunk_sentences(text: &str, max_chars: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();

    for sentence in split_sentences(text) {
        let extra = sentence.chars().count() + usize::from(!current.is_empty());
        if !current.is_empty() && current.chars().count() + extra > max_chars {
            chunks.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(&sentence);
    }

    if !current.is_empty() {
        chunks.push(current);
    }

    chunks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::{Reading, WeatherReport};

    #[test]
    fn test_split_sentences_korean() {
        let sentences = split_sentences("지금은 오후 3시입니다. 날씨는 맑음! 내일은?\n끝");
        assert_eq!(sentences, vec!["지금은 오후 3시입니다.", "날씨는 맑음!", "내일은?", "끝"]);
    }

    #[test]
    fn test_decimal_point_is_not_a_boundary() {
        let sentences = split_sentences("기온은 18.5도입니다. 버전 2.0!다음");
        assert_eq!(sentences, vec!["기온은 18.5도입니다.", "버전 2.0!다음"]);
    }

    #[test]
    fn test_weather_report_survives_chunking() {
        let report = WeatherReport {
            current: Reading { temperature: 18.5, condition: "맑음" },
            later: Reading { temperature: 14.2, condition: "흐림" },
        };
        let spoken = report.describe("네. 서울의 현재 날씨는");
        assert_eq!(chunk_sentences(&spoken, 400), vec![spoken.clone()]);
        assert!(spoken.contains("18.5도") && spoken.contains("14.2도"));
    }

    #[test]
    fn test_chunk_sentences_groups_up_to_limit() {
        let chunks = chunk_sentences("가나다. 라마바. 사아자.", 9);
        assert_eq!(chunks, vec!["가나다. 라마바.", "사아자."]);
    }

    #[test]
    fn test_chunk_sentences_keeps_long_sentence_whole() {
        let chunks = chunk_sentences("아주 긴 문장입니다. 짧음.", 5);
        assert_eq!(chunks, vec!["아주 긴 문장입니다.", "짧음."]);
    }

    #[test]
    fn test_chunk_sentences_blank() {
        assert!(chunk_sentences("   \n ", 100).is_empty());
    }
}
