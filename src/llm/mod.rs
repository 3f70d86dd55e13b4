//! LLM client module.
//!
//! Uses Gemini over its REST API to summarize news articles for speech.

mod client;

pub use client::GeminiClient;
