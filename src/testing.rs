//! Test doubles shared by the unit tests.

use std::collections::VecDeque;
use std::sync::Arc;

use anyhow::anyhow;
use parking_lot::Mutex;
use tokio::time::{Duration, Instant};

use crate::actions::{NewsItem, NewsSource, Reading, WeatherReport, WeatherSource};
use crate::config::TtsEngineKind;
use crate::error::{ActionError, TtsError};
use crate::stt::{EventSource, RecognitionEvent};
use crate::tts::Speaker;

#[derive(Default)]
struct SpeakLog {
    spoken: Vec<String>,
    attempts: usize,
}

/// Speaker that records what it was asked to say. Clones share the log.
#[derive(Clone, Default)]
pub struct RecordingSpeaker {
    log: Arc<Mutex<SpeakLog>>,
    fail: bool,
}

impl RecordingSpeaker {
    /// Speaker whose every call fails.
    pub fn failing() -> Self {
        Self { fail: true, ..Self::default() }
    }

    /// Successfully spoken lines.
    pub fn spoken(&self) -> Vec<String> {
        self.log.lock().spoken.clone()
    }

    pub fn attempts(&self) -> usize {
        self.log.lock().attempts
    }
}

impl Speaker for RecordingSpeaker {
    async fn speak(&self, text: &str) -> Result<(), TtsError> {
        let mut log = self.log.lock();
        log.attempts += 1;
        if self.fail {
            return Err(TtsError::engine(TtsEngineKind::Edge, anyhow!("player exited with status 1")));
        }
        log.spoken.push(text.to_string());
        Ok(())
    }
}

pub fn sample_report() -> WeatherReport {
    WeatherReport {
        current: Reading { temperature: 18.5, condition: "맑음" },
        later: Reading { temperature: 14.0, condition: "흐림" },
    }
}

pub struct FakeNews(Option<String>);

impl FakeNews {
    pub fn ok(summary: &str) -> Self {
        Self(Some(summary.to_string()))
    }

    pub fn failing() -> Self {
        Self(None)
    }
}

impl NewsSource for FakeNews {
    async fn headlines(&self) -> Result<Vec<NewsItem>, ActionError> {
        match &self.0 {
            Some(_) => Ok(vec![NewsItem { title: "헤드라인".to_string(), link: "https://news.example/1".to_string() }]),
            None => Err(ActionError::NoNews),
        }
    }

    async fn briefing(&self, _items: Vec<NewsItem>) -> String {
        self.0.clone().unwrap_or_default()
    }
}

pub struct FakeWeather(bool);

impl FakeWeather {
    pub fn ok() -> Self {
        Self(true)
    }

    pub fn failing() -> Self {
        Self(false)
    }
}

impl WeatherSource for FakeWeather {
    async fn current_weather(&self) -> Result<WeatherReport, ActionError> {
        if self.0 { Ok(sample_report()) } else { Err(ActionError::Parse("offline".to_string())) }
    }
}

/// Recognizer replaying events at fixed offsets from its creation.
///
/// Create it inside a paused-clock test. Once the script runs out it either
/// closes the stream or stays silent forever.
pub struct ScriptedRecognizer {
    start: Instant,
    script: VecDeque<(Duration, RecognitionEvent)>,
    close_at_end: bool,
}

impl ScriptedRecognizer {
    pub fn new() -> Self {
        Self { start: Instant::now(), script: VecDeque::new(), close_at_end: false }
    }

    pub fn event(mut self, at: Duration, event: RecognitionEvent) -> Self {
        self.script.push_back((at, event));
        self
    }

    /// Final transcript `text` at `at_secs` seconds.
    pub fn say(self, at_secs: u64, text: &str) -> Self {
        self.event(Duration::from_secs(at_secs), RecognitionEvent::Final(text.to_string()))
    }

    pub fn then_close(mut self) -> Self {
        self.close_at_end = true;
        self
    }
}

impl EventSource for ScriptedRecognizer {
    async fn next_event(&mut self) -> Option<RecognitionEvent> {
        let Some(&(at, _)) = self.script.front() else {
            if self.close_at_end {
                return None;
            }
            return std::future::pending().await;
        };

        // Pop only after the wait so a dropped call loses nothing
        tokio::time::sleep_until(self.start + at).await;
        self.script.pop_front().map(|(_, event)| event)
    }

    fn discard_pending(&mut self) -> usize {
        let now = Instant::now();
        let mut discarded = 0;
        while self.script.front().is_some_and(|(at, _)| self.start + *at <= now) {
            self.script.pop_front();
            discarded += 1;
        }
        discarded
    }
}
