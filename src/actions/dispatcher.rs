//! Turns recognized commands into spoken responses.

use chrono::NaiveDateTime;
use tracing::{error, info, warn};

use super::clock::{date_sentence, local_now, time_sentence};
use super::news::NewsItem;
use super::weather::WeatherReport;
use crate::command::Command;
use crate::error::ActionError;
use crate::tts::Speaker;

const NEWS_LOOKUP_NOTICE: &str = "뉴스를 살펴보고 있습니다.";
const NEWS_WEATHER_INTRO: &str = "날씨입니다. 서울의 현재 날씨는";
const WEATHER_INTRO: &str = "네. 서울의 현재 날씨는";
const NEWS_OUTRO: &str = "뉴스를 마칩니다.";
const WEATHER_UNAVAILABLE: &str = "날씨 정보를 가져올 수 없습니다.";
const NEWS_UNAVAILABLE: &str = "뉴스를 가져오지 못했습니다.";
const BRIEFING_UNAVAILABLE: &str = "뉴스와 날씨 정보를 가져오지 못했습니다.";
const SHUTDOWN_NOTICE: &str = "프로그램을 종료합니다.";

/// What the session does after a command was handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Terminate,
}

/// Provider of the spoken news briefing.
///
/// Headlines come first so the listener hears a notice before the slower
/// article fetch and summary.
pub trait NewsSource {
    /// Current headlines. Fails when the feed is unreachable or empty.
    async fn headlines(&self) -> Result<Vec<NewsItem>, ActionError>;

    /// Spoken briefing for `items`, falling back to the headlines themselves.
    async fn briefing(&self, items: Vec<NewsItem>) -> String;
}

/// Provider of the current Seoul weather.
pub trait WeatherSource {
    async fn current_weather(&self) -> Result<WeatherReport, ActionError>;
}

/// Handles one command at a time. Never fails: problems are spoken or logged.
pub trait Dispatch {
    async fn dispatch(&self, command: Command) -> Flow;
}

/// Default dispatcher backed by a speaker and the news and weather sources.
pub struct Dispatcher<S, N, W> {
    speaker: S,
    news: N,
    weather: W,
    clock: fn() -> NaiveDateTime,
}

impl<S, N, W> Dispatcher<S, N, W>
where
    S: Speaker,
    N: NewsSource,
    W: WeatherSource,
{
    pub fn new(speaker: S, news: N, weather: W) -> Self {
        Self { speaker, news, weather, clock: local_now }
    }

    #[cfg(test)]
    pub fn with_clock(mut self, clock: fn() -> NaiveDateTime) -> Self {
        self.clock = clock;
        self
    }

    async fn say(&self, text: &str) {
        if let Err(e) = self.speaker.speak(text).await {
            error!("❌ TTS error: {}", e);
        }
    }

    /// News followed by the weather, spoken as one utterance.
    async fn news_and_weather(&self) -> String {
        info!("📰 Fetching news...");
        let news = match self.news.headlines().await {
            Ok(items) => {
                self.say(NEWS_LOOKUP_NOTICE).await;
                Ok(self.news.briefing(items).await)
            }
            Err(e) => {
                warn!("News unavailable: {}", e);
                Err(e)
            }
        };

        info!("🌤️  Fetching weather...");
        let weather = self.weather.current_weather().await;
        if let Err(e) = &weather {
            warn!("Weather unavailable: {}", e);
        }

        match (news, weather) {
            (Ok(news), Ok(report)) => format!("{} {} {}", news, report.describe(NEWS_WEATHER_INTRO), NEWS_OUTRO),
            (Ok(news), Err(_)) => format!("{} {} {}", news, WEATHER_UNAVAILABLE, NEWS_OUTRO),
            (Err(_), Ok(report)) => format!("{} {}", NEWS_UNAVAILABLE, report.describe(NEWS_WEATHER_INTRO)),
            (Err(_), Err(_)) => BRIEFING_UNAVAILABLE.to_string(),
        }
    }

    async fn weather_only(&self) -> String {
        match self.weather.current_weather().await {
            Ok(report) => report.describe(WEATHER_INTRO),
            Err(e) => {
                warn!("Weather unavailable: {}", e);
                WEATHER_UNAVAILABLE.to_string()
            }
        }
    }
}

impl<S, N, W> Dispatch for Dispatcher<S, N, W>
where
    S: Speaker,
    N: NewsSource,
    W: WeatherSource,
{
    async fn dispatch(&self, command: Command) -> Flow {
        let text = match command {
            Command::ExtendListening | Command::Unrecognized => return Flow::Continue,
            Command::NewsAndWeather => self.news_and_weather().await,
            Command::Time => time_sentence(&(self.clock)()),
            Command::Date => date_sentence(&(self.clock)()),
            Command::WeatherOnly => self.weather_only().await,
            Command::Shutdown => {
                self.say(SHUTDOWN_NOTICE).await;
                return Flow::Terminate;
            }
        };

        self.say(&text).await;
        Flow::Continue
    }
}
