use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use steamscope_config::SummarizerConfig;
use tracing::{debug, warn};
use crate::error::SourceError;

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: String,
}

/// Minimal client for the Gemini `generateContent` REST call.
#[derive(Clone)]
pub struct GeminiClient {
    client: Arc<Client>,
    endpoint: String,
    model: String,
    api_key: String,
}

impl GeminiClient {
    pub fn new(client: Client, config: &SummarizerConfig, api_key: String) -> Self {
        Self {
            client: Arc::new(client),
            endpoint: config.endpoint.clone(),
            model: config.model.clone(),
            api_key,
        }
    }

    fn generate_url(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.endpoint.trim_end_matches('/'),
            self.model
        )
    }

    /// Send a single-turn prompt and return the concatenated text of the
    /// first candidate.
    pub async fn generate(&self, prompt: &str) -> Result<String, SourceError> {
        let body = GenerateRequest {
            contents: vec![Content { parts: vec![Part { text: prompt }] }],
        };
        debug!("Calling Gemini model {} ({} prompt chars)", self.model, prompt.len());

        let response = self
            .client
            .post(self.generate_url())
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::OK {
            warn!("Gemini request failed with status {}", status);
            return Err(SourceError::Status(status.as_u16()));
        }

        let bytes = response.bytes().await?;
        extract_text(&bytes)
    }
}

fn extract_text(body: &[u8]) -> Result<String, SourceError> {
    let parsed: GenerateResponse = serde_json::from_slice(body)?;
    let text = parsed
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|c| c.parts.into_iter().map(|p| p.text).collect::<Vec<_>>().join(""))
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Err(SourceError::new("Gemini returned no text"));
    }
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_text_joins_parts() {
        let body = br#"{"candidates": [{"content": {"parts": [{"text": "Common Challenges"}, {"text": " & Criticisms:"}]}}]}"#;
        assert_eq!(extract_text(body).unwrap(), "Common Challenges & Criticisms:");
    }

    #[test]
    fn test_extract_text_without_candidates() {
        assert!(extract_text(br#"{"candidates": []}"#).is_err());
        assert!(extract_text(b"not json").is_err());
    }

    #[test]
    fn test_generate_url() {
        let client = GeminiClient::new(Client::new(), &SummarizerConfig::default(), "k".to_string());
        assert_eq!(
            client.generate_url(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-1.5-flash:generateContent"
        );
    }
}
