//! # Gemini Inference Client
//!
//! This module provides the [`InferenceService`] trait and its production
//! implementation [`GeminiClient`], which sends a grading prompt together with
//! the submission document to Google's Gemini API and returns the raw analysis
//! text.
//!
//! ## Overview
//!
//! - [`InferenceService`] is the seam the orchestrator talks to; tests swap in
//!   a mock implementation.
//! - [`GeminiClient`] builds a two-part request (prompt text + inline document
//!   data) and decodes the first candidate's text.
//! - Generation is pinned to deterministic settings so the same submission
//!   yields the same analysis.
//!
//! ## Environment
//!
//! - Requires the `GEMINI_API_KEY` environment variable to be set for
//!   authenticating with the Gemini API. The model name is taken from
//!   `GEMINI_MODEL`.

use crate::error::GraderError;
use crate::types::Submission;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use util::config;

/// A service that turns a grading prompt and a submission into analysis text.
#[async_trait]
pub trait InferenceService: Send + Sync {
    /// Sends `prompt` and the submission document to the model and returns the
    /// raw response text.
    async fn generate(&self, prompt: &str, submission: &Submission)
    -> Result<String, GraderError>;
}

/// Request body for the Gemini API.
#[derive(Serialize)]
struct GeminiRequest {
    /// The content to send to the LLM.
    contents: Vec<Content>,
    /// Generation configuration for the LLM.
    generation_config: GenerationConfig,
}

/// Content wrapper for the Gemini API request.
#[derive(Serialize)]
struct Content {
    /// The parts of the message (prompt text and inline document data).
    parts: Vec<Part>,
}

/// A single part of the content: either a text prompt or an inline document.
#[derive(Serialize)]
struct Part {
    /// The text content to send to the LLM.
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    /// An inline base64-encoded document.
    #[serde(skip_serializing_if = "Option::is_none")]
    inline_data: Option<InlineData>,
}

/// A base64-encoded document attached to the request.
#[derive(Serialize)]
struct InlineData {
    /// The MIME type of the document (e.g. `application/pdf`).
    mime_type: String,
    /// The base64-encoded document bytes.
    data: String,
}

/// Configuration pinning the LLM to deterministic output.
#[derive(Serialize)]
struct GenerationConfig {
    temperature: f64,
    top_p: f64,
    top_k: u32,
    max_output_tokens: u32,
    candidate_count: u32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            temperature: 0.0,
            top_p: 1.0,
            top_k: 1,
            max_output_tokens: 4096,
            candidate_count: 1,
        }
    }
}

/// Response from the Gemini API.
#[derive(Deserialize)]
struct GeminiResponse {
    /// List of candidate completions from the LLM.
    #[serde(default)]
    candidates: Vec<Candidate>,
}

/// A single candidate response from the Gemini API.
#[derive(Deserialize)]
struct Candidate {
    /// The content of the candidate response.
    content: ContentResponse,
}

/// Content of a candidate response.
#[derive(Deserialize)]
struct ContentResponse {
    /// The parts of the response.
    #[serde(default)]
    parts: Vec<PartResponse>,
}

/// A single part of the response content.
#[derive(Deserialize)]
struct PartResponse {
    /// The generated text from the LLM.
    #[serde(default)]
    text: String,
}

/// Production [`InferenceService`] backed by the Gemini REST API.
pub struct GeminiClient {
    client: reqwest::Client,
    model: String,
}

impl GeminiClient {
    /// Creates a client using the model name from [`config::gemini_model`].
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
            model: config::gemini_model(),
        }
    }
}

impl Default for GeminiClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl InferenceService for GeminiClient {
    async fn generate(
        &self,
        prompt: &str,
        submission: &Submission,
    ) -> Result<String, GraderError> {
        dotenvy::dotenv().ok();

        let api_key = config::gemini_api_key();

        let request_body = GeminiRequest {
            contents: vec![Content {
                parts: vec![
                    Part {
                        text: Some(prompt.to_string()),
                        inline_data: None,
                    },
                    Part {
                        text: None,
                        inline_data: Some(InlineData {
                            mime_type: submission.mime_type.clone(),
                            data: submission.content.clone(),
                        }),
                    },
                ],
            }],
            generation_config: GenerationConfig::default(),
        };

        let response = self
            .client
            .post(format!(
                "https://generativelanguage.googleapis.com/v1beta/models/{}:generateContent?key={}",
                self.model, api_key
            ))
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();
        let response_text = response.text().await?;

        if !status.is_success() {
            return Err(GraderError::Service {
                status: status.as_u16(),
                message: response_text,
            });
        }

        let response = serde_json::from_str::<GeminiResponse>(&response_text).map_err(|e| {
            GraderError::InvalidResponse(format!(
                "error decoding response body: {}. Full response: {}",
                e, response_text
            ))
        })?;

        let text = response
            .candidates
            .first()
            .and_then(|candidate| candidate.content.parts.first())
            .map(|part| part.text.clone())
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(GraderError::EmptyResponse);
        }

        Ok(text)
    }
}
