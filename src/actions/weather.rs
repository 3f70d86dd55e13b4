//! Seoul weather from Open-Meteo.

use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::debug;

use super::dispatcher::WeatherSource;
use crate::error::ActionError;

const SEOUL_LATITUDE: f64 = 37.5665;
const SEOUL_LONGITUDE: f64 = 126.9780;

/// Hours ahead for the forecast reading.
const FORECAST_OFFSET_HOURS: usize = 6;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Temperature and condition at one point in time.
#[derive(Debug, Clone, PartialEq)]
pub struct Reading {
    pub temperature: f64,
    pub condition: &'static str,
}

/// Current weather and the reading six hours later.
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherReport {
    pub current: Reading,
    pub later: Reading,
}

impl WeatherReport {
    /// Spoken form, starting with `intro` (e.g. `네. 서울의 현재 날씨는`).
    pub fn describe(&self, intro: &str) -> String {
        format!(
            "{} {}이고, 기온은 {}도입니다. {}시간 뒤 날씨는 {}이고, 기온은 {}도로 예상됩니다.",
            intro,
            self.current.condition,
            spoken_temperature(self.current.temperature),
            FORECAST_OFFSET_HOURS,
            self.later.condition,
            spoken_temperature(self.later.temperature),
        )
    }
}

/// Negative temperatures are read as `영하 N`.
pub fn spoken_temperature(celsius: f64) -> String {
    // `+ 0.0` turns -0.0 into 0
    if celsius < 0.0 { format!("영하 {}", -celsius) } else { format!("{}", celsius + 0.0) }
}

/// Korean description of a WMO weather code.
pub fn describe_weather_code(code: i64) -> &'static str {
    match code {
        0 => "맑음",
        1 => "대체로 맑음",
        2 => "부분적으로 흐림",
        3 => "흐림",
        45 => "안개",
        48 => "서리 안개",
        51 => "이슬비",
        53 => "약한 이슬비",
        55 => "강한 이슬비",
        56 => "진눈깨비 이슬비",
        57 => "강한 진눈깨비 이슬비",
        61 => "약한 비",
        63 => "보통 비",
        65 => "강한 비",
        66 => "진눈깨비 비",
        67 => "강한 진눈깨비 비",
        71 => "약한 눈",
        73 => "보통 눈",
        75 => "강한 눈",
        77 => "싸락눈",
        80 => "약한 소나기",
        81 => "보통 소나기",
        82 => "강한 소나기",
        85 => "약한 눈 소나기",
        86 => "강한 눈 소나기",
        95 => "뇌우",
        96 => "약한 우박 뇌우",
        99 => "강한 우박 뇌우",
        _ => "알 수 없음",
    }
}

#[derive(Deserialize)]
struct ForecastResponse {
    current: CurrentBlock,
    hourly: HourlyBlock,
}

#[derive(Deserialize)]
struct CurrentBlock {
    temperature_2m: f64,
    weather_code: i64,
}

#[derive(Deserialize)]
struct HourlyBlock {
    temperature_2m: Vec<Option<f64>>,
    weather_code: Vec<Option<i64>>,
}

impl ForecastResponse {
    fn into_report(self) -> Result<WeatherReport, ActionError> {
        let later_temperature = self.hourly.temperature_2m.get(FORECAST_OFFSET_HOURS).copied().flatten();
        let later_code = self.hourly.weather_code.get(FORECAST_OFFSET_HOURS).copied().flatten();

        let (Some(temperature), Some(code)) = (later_temperature, later_code) else {
            return Err(ActionError::Parse(format!("no forecast {} hours ahead", FORECAST_OFFSET_HOURS)));
        };

        Ok(WeatherReport {
            current: Reading { temperature: self.current.temperature_2m, condition: describe_weather_code(self.current.weather_code) },
            later: Reading { temperature, condition: describe_weather_code(code) },
        })
    }
}

/// Open-Meteo forecast client for Seoul.
pub struct OpenMeteo {
    client: reqwest::Client,
    url: String,
}

impl OpenMeteo {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent("Mozilla/5.0")
            .build()
            .context("Failed to create weather client")?;

        let url = format!(
            "https://api.open-meteo.com/v1/forecast?latitude={}&longitude={}\
             &current=temperature_2m,weather_code&hourly=temperature_2m,weather_code\
             &forecast_hours={}&timezone={}",
            SEOUL_LATITUDE,
            SEOUL_LONGITUDE,
            FORECAST_OFFSET_HOURS + 1,
            urlencoding::encode("Asia/Seoul"),
        );

        Ok(Self { client, url })
    }
}

impl WeatherSource for OpenMeteo {
    async fn current_weather(&self) -> Result<WeatherReport, ActionError> {
        debug!("Fetching weather: {}", self.url);
        let response = self.client.get(&self.url).send().await?.error_for_status()?;
        let forecast: ForecastResponse = response.json().await?;
        forecast.into_report()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_report() {
        let report = WeatherReport {
            current: Reading { temperature: 12.5, condition: "맑음" },
            later: Reading { temperature: -3.0, condition: "약한 눈" },
        };
        assert_eq!(
            report.describe("네. 서울의 현재 날씨는"),
            "네. 서울의 현재 날씨는 맑음이고, 기온은 12.5도입니다. 6시간 뒤 날씨는 약한 눈이고, 기온은 영하 3도로 예상됩니다."
        );
    }

    #[test]
    fn test_weather_codes() {
        assert_eq!(describe_weather_code(0), "맑음");
        assert_eq!(describe_weather_code(95), "뇌우");
        assert_eq!(describe_weather_code(42), "알 수 없음");
    }

    #[test]
    fn test_parse_forecast() {
        let json = r#"{
            "current": {"time": "2026-10-16T15:00", "temperature_2m": 18.2, "weather_code": 3},
            "hourly": {
                "temperature_2m": [18.2, 18.0, 17.5, 17.0, 16.1, 15.4, 14.9],
                "weather_code": [3, 3, 2, 2, 1, 0, 61]
            }
        }"#;
        let forecast: ForecastResponse = serde_json::from_str(json).unwrap();
        let report = forecast.into_report().unwrap();
        assert_eq!(report.current, Reading { temperature: 18.2, condition: "흐림" });
        assert_eq!(report.later, Reading { temperature: 14.9, condition: "약한 비" });
    }

    #[test]
    fn test_short_forecast_is_error() {
        let json = r#"{"current": {"temperature_2m": 1.0, "weather_code": 0}, "hourly": {"temperature_2m": [1.0], "weather_code": [0]}}"#;
        let forecast: ForecastResponse = serde_json::from_str(json).unwrap();
        assert!(matches!(forecast.into_report(), Err(ActionError::Parse(_))));
    }
}
