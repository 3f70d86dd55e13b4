//! Gemini client for one-shot text generation.

use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::ActionError;

const GEMINI_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const GEMINI_MODEL: &str = "gemini-2.5-flash";

/// Summaries of five articles can take a while.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

/// Gemini `generateContent` client.
pub struct GeminiClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl GeminiClient {
    /// Create a new Gemini client.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(api_key: &str) -> Result<Self> {
        info!("Using Gemini model {} for news summaries", GEMINI_MODEL);

        let client = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build().context("Failed to create Gemini client")?;

        Ok(Self { client, base_url: GEMINI_API_URL.to_string(), api_key: api_key.to_string(), model: GEMINI_MODEL.to_string() })
    }

    /// Send a single prompt and return the text of the first candidate.
    ///
    /// # Errors
    /// Returns an error if the request fails or the response has no text.
    pub async fn generate(&self, prompt: &str) -> Result<String, ActionError> {
        debug!("Gemini prompt: {} chars", prompt.chars().count());

        let url = format!("{}/models/{}:generateContent?key={}", self.base_url, self.model, urlencoding::encode(&self.api_key));
        let request = GenerateRequest { contents: vec![Content { parts: vec![Part { text: prompt }] }] };

        let response = self.client.post(url).json(&request).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ActionError::Llm(format!("Gemini error {}: {}", status, body)));
        }

        let body: GenerateResponse = response.json().await?;
        first_text(body).ok_or_else(|| ActionError::Llm("Gemini returned no text".to_string()))
    }
}

fn first_text(response: GenerateResponse) -> Option<String> {
    response
        .candidates
        .into_iter()
        .filter_map(|c| c.content)
        .flat_map(|c| c.parts)
        .filter_map(|p| p.text)
        .map(|t| t.trim().to_string())
        .find(|t| !t.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_text() {
        let response: GenerateResponse = serde_json::from_str(r#"{"candidates":[{"content":{"parts":[{"text":"  [기사 1] 요약  "}]}}]}"#).unwrap();
        assert_eq!(first_text(response).as_deref(), Some("[기사 1] 요약"));
    }

    #[test]
    fn test_blocked_response_has_no_text() {
        let response: GenerateResponse = serde_json::from_str(r#"{"candidates":[{"finishReason":"SAFETY"}]}"#).unwrap();
        assert!(first_text(response).is_none());

        let empty: GenerateResponse = serde_json::from_str("{}").unwrap();
        assert!(first_text(empty).is_none());
    }

    #[test]
    fn test_request_shape() {
        let request = GenerateRequest { contents: vec![Content { parts: vec![Part { text: "hi" }] }] };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["contents"][0]["parts"][0]["text"], "hi");
    }
}
