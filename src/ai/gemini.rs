//! Gemini REST client
//!
//! Calls the `generateContent` endpoint of the Generative Language API.
//! Safety-blocked candidates are reported as `ModelOutput::SafetyFiltered`
//! so the chain can substitute the placeholder message.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use super::{ModelError, ModelOutput, Task, TextModel};

const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    system_instruction: Content<'a>,
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
    #[serde(default)]
    content: Option<CandidateContent>,
    #[serde(rename = "finishReason", default)]
    finish_reason: Option<String>,
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

/// One Gemini model behind the `TextModel` seam.
pub struct GeminiModel {
    client: Client,
    api_key: String,
    model: String,
}

impl GeminiModel {
    pub fn new(api_key: &str, model: &str) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(concat!("tubebrief/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(GeminiModel {
            client,
            api_key: api_key.to_string(),
            model: model.to_string(),
        })
    }

    fn interpret(response: GenerateResponse) -> Result<ModelOutput, ModelError> {
        let candidate = response
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| ModelError::Parse("response carried no candidates".to_string()))?;

        if candidate.finish_reason.as_deref() == Some("SAFETY") {
            return Ok(ModelOutput::SafetyFiltered);
        }

        let text = candidate
            .content
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .map(|part| part.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        if text.is_empty() {
            return Err(ModelError::Parse(
                "candidate carried no text parts".to_string(),
            ));
        }

        Ok(ModelOutput::Text(text))
    }
}

#[async_trait]
impl TextModel for GeminiModel {
    fn name(&self) -> &str {
        &self.model
    }

    async fn generate(&self, task: Task, text: &str) -> Result<ModelOutput, ModelError> {
        let prompt = task.prompt(text);
        let body = GenerateRequest {
            system_instruction: Content {
                parts: vec![Part {
                    text: task.system_instruction(),
                }],
            },
            contents: vec![Content {
                parts: vec![Part { text: &prompt }],
            }],
        };

        let url = format!("{}/{}:generateContent", API_BASE, self.model);
        debug!(model = %self.model, task = ?task, "Gemini API request");

        let response = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ModelError::Rejected {
                status: status.as_u16(),
                message: message.chars().take(500).collect(),
            });
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| ModelError::Parse(e.to_string()))?;

        Self::interpret(parsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(body: &str) -> GenerateResponse {
        serde_json::from_str(body).unwrap()
    }

    #[test]
    fn interprets_text_candidate() {
        let response = parse(
            r###"{"candidates": [{"content": {"parts": [{"text": "## Resumo\n"}, {"text": "corpo"}]}, "finishReason": "STOP"}]}"###,
        );
        assert_eq!(
            GeminiModel::interpret(response).unwrap(),
            ModelOutput::Text("## Resumo\ncorpo".to_string())
        );
    }

    #[test]
    fn safety_finish_reason_is_filtered_not_failed() {
        let response = parse(r#"{"candidates": [{"finishReason": "SAFETY"}]}"#);
        assert_eq!(
            GeminiModel::interpret(response).unwrap(),
            ModelOutput::SafetyFiltered
        );
    }

    #[test]
    fn empty_candidates_is_a_parse_error() {
        let response = parse(r#"{"candidates": []}"#);
        assert!(matches!(
            GeminiModel::interpret(response),
            Err(ModelError::Parse(_))
        ));
    }

    #[test]
    fn candidate_without_text_is_a_parse_error() {
        let response = parse(r#"{"candidates": [{"content": {"parts": []}}]}"#);
        assert!(matches!(
            GeminiModel::interpret(response),
            Err(ModelError::Parse(_))
        ));
    }
}
