//! Coaching text generation.
//!
//! `GeminiCoach` talks to the Gemini `generateContent` REST endpoint and walks
//! a model fallback list. Any transport or HTTP failure is reported as
//! `ServiceUnavailable`.

use std::fmt::Write as _;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crease_models::DeliveryAnalysis;

use crate::error::{ServiceError, ServiceResult};

pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_GEMINI_MODELS: &[&str] = &["gemini-2.5-flash", "gemini-2.5-flash-lite", "gemini-2.5-pro"];
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Opaque text completion.
#[async_trait]
pub trait CoachingTextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> ServiceResult<String>;
}

#[derive(Debug, Serialize)]
struct GeminiRequest {
    contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct Part {
    text: String,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    temperature: f32,
    #[serde(rename = "maxOutputTokens")]
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: ResponseContent,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: String,
}

/// Gemini API client for coaching answers.
pub struct GeminiCoach {
    api_key: String,
    base_url: String,
    models: Vec<String>,
    client: Client,
}

impl GeminiCoach {
    pub fn new(api_key: impl Into<String>) -> ServiceResult<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ServiceError::internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            api_key: api_key.into(),
            base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
            models: DEFAULT_GEMINI_MODELS.iter().map(|m| m.to_string()).collect(),
            client,
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_models<I, S>(mut self, models: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.models = models.into_iter().map(Into::into).collect();
        self
    }

    async fn call_gemini_api(&self, model: &str, prompt: &str) -> ServiceResult<String> {
        let url = format!("{}/models/{}:generateContent?key={}", self.base_url, model, self.api_key);

        let request = GeminiRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
            generation_config: GenerationConfig {
                temperature: 0.4,
                max_output_tokens: 1024,
            },
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| ServiceError::unavailable(format!("Gemini API request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(ServiceError::unavailable(format!(
                "Gemini API returned {}: {}",
                status, error_text
            )));
        }

        let gemini_response: GeminiResponse = response
            .json()
            .await
            .map_err(|e| ServiceError::unavailable(format!("Failed to parse Gemini response: {}", e)))?;

        let text = gemini_response
            .candidates
            .first()
            .and_then(|c| c.content.parts.first())
            .map(|p| p.text.trim())
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ServiceError::unavailable("No content in Gemini response"))?;

        Ok(text.to_string())
    }
}

#[async_trait]
impl CoachingTextGenerator for GeminiCoach {
    async fn generate(&self, prompt: &str) -> ServiceResult<String> {
        let mut last_error = None;

        for model in &self.models {
            info!("Attempting Gemini API with model: {}", model);
            match self.call_gemini_api(model, prompt).await {
                Ok(text) => {
                    info!("Coaching text generated by {}", model);
                    return Ok(text);
                }
                Err(e) => {
                    warn!("Failed with model {}: {}", model, e);
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| ServiceError::unavailable("No Gemini models configured")))
    }
}

/// Render the coaching prompt for one delivery and a user question.
pub fn build_coaching_prompt(analysis: &DeliveryAnalysis, question: &str) -> String {
    let mut prompt = String::from(
        "You are an experienced cricket coach. Answer the player's question about \
         the delivery below in plain language, in at most five sentences.\n\nDELIVERY:\n",
    );

    // writes to a String cannot fail
    let _ = writeln!(prompt, "- status: {:?}", analysis.status);
    match analysis.speed_kmph {
        Some(kmph) => {
            let _ = writeln!(prompt, "- speed: {:.1} km/h", kmph);
        }
        None => prompt.push_str("- speed: unknown\n"),
    }
    let _ = writeln!(
        prompt,
        "- swing: {}",
        analysis.swing.map(|s| s.as_str()).unwrap_or("unknown")
    );
    let _ = writeln!(
        prompt,
        "- spin: {}",
        analysis.spin.map(|s| s.as_str()).unwrap_or("unknown")
    );
    if let Some(bounce) = &analysis.pitch_map {
        let _ = writeln!(prompt, "- pitched at: x {:.2}, y {:.2} of frame", bounce.x, bounce.y);
    }
    if let (Some(zone), Some(timing)) = (analysis.wagon_zone, analysis.shot_timing) {
        let _ = writeln!(
            prompt,
            "- shot: towards {}, timing {:.0}/100, power {:.0}/100",
            zone.as_str(),
            timing.timing_score,
            timing.power_score
        );
    }
    if let Some(drs) = &analysis.drs {
        let _ = writeln!(prompt, "- DRS: {} ({})", drs.decision, drs.reason);
    }

    prompt.push_str("\nQUESTION:\n");
    prompt.push_str(question.trim());
    prompt.push('\n');
    prompt
}
