use crate::character::ProfileAttributes;
use crate::config::Config;
use crate::error::EnrichmentError;
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::env;
use std::fmt::Debug;

/// Stage 1: one outbound request for the whole batch of display names,
/// returning one attempted profile per name. No retries.
#[async_trait]
pub trait ProfileGenerator: Send + Sync + Debug {
    async fn generate_profiles(
        &self,
        display_names: &[String],
    ) -> Result<Vec<ProfileAttributes>, EnrichmentError>;
}

pub fn create_profile_generator(config: &Config) -> Result<Box<dyn ProfileGenerator>> {
    match config.text.provider.as_str() {
        "gemini" => {
            let cfg = config
                .text
                .gemini
                .as_ref()
                .context("Gemini text config missing")?;
            Ok(Box::new(GeminiProfileClient::new(
                cfg.api_key.clone(),
                &cfg.model,
            )))
        }
        "gateway" => {
            let cfg = config
                .text
                .gateway
                .as_ref()
                .context("Gateway text config missing")?;
            Ok(Box::new(GatewayProfileClient::new(&cfg.base_url)))
        }
        _ => Err(anyhow::anyhow!(
            "Unknown text provider: {}",
            config.text.provider
        )),
    }
}

/// Parse the payload the generation service returned. Anything that is not a
/// JSON array of complete profiles is a text-stage failure, never a silent
/// partial result.
fn parse_profiles(payload: &str) -> Result<Vec<ProfileAttributes>, EnrichmentError> {
    let clean = strip_code_blocks(payload);
    serde_json::from_str(&clean).map_err(|e| {
        EnrichmentError::TextEnrichment(format!("unexpected profile payload: {}. Body: {}", e, clean))
    })
}

fn strip_code_blocks(s: &str) -> String {
    let s = s.trim();
    if s.starts_with("```json") {
        s.trim_start_matches("```json")
            .trim_end_matches("```")
            .trim()
            .to_string()
    } else if s.starts_with("```") {
        s.trim_start_matches("```")
            .trim_end_matches("```")
            .trim()
            .to_string()
    } else {
        s.to_string()
    }
}

fn ensure_batch(display_names: &[String]) -> Result<(), EnrichmentError> {
    if display_names.is_empty() {
        return Err(EnrichmentError::TextEnrichment(
            "no display names to enrich".to_string(),
        ));
    }
    Ok(())
}

// --- Gemini ---

#[derive(Debug)]
pub struct GeminiProfileClient {
    api_key: Option<String>,
    model: String,
    client: reqwest::Client,
}

impl GeminiProfileClient {
    pub fn new(api_key: Option<String>, model: &str) -> Self {
        Self {
            api_key,
            model: model.to_string(),
            client: reqwest::Client::new(),
        }
    }

    // Credential is resolved when a request is made, not at startup.
    fn resolve_api_key(&self) -> Result<String, EnrichmentError> {
        self.api_key
            .clone()
            .or_else(|| env::var("GEMINI_API_KEY").ok())
            .ok_or_else(|| {
                EnrichmentError::Configuration(
                    "set text.gemini.api_key or GEMINI_API_KEY".to_string(),
                )
            })
    }

    fn build_prompt(display_names: &[String]) -> String {
        format!(
            "Generate an epic character profile for each of the following individuals, \
            who are being 'awakened' as Hunters.\n\
            For each name, create:\n\
            1. A grandiose \"title\" fitting for a powerful hunter (e.g., \"The Shadow Monarch\", \
            \"Monarch of Iron Body\", \"Sovereign of Plagues\").\n\
            2. A short, impactful \"description\" (one sentence) that hints at their unique abilities.\n\
            3. A character \"class\" from the provided list.\n\
            4. A Hunter \"rank\" from the provided list. Distribute the ranks, ensuring at least one S-Rank.\n\
            5. A short, epic \"quote\" of 2-5 words that the character might say \
            (e.g., \"None can escape my gaze.\").\n\n\
            The profiles should sound powerful, unique, and directly inspired by a dark, \
            high-fantasy world. Ensure the output is a valid JSON array.\n\n\
            Names: {}",
            display_names.join(", ")
        )
    }

    fn response_schema() -> serde_json::Value {
        json!({
            "type": "ARRAY",
            "items": {
                "type": "OBJECT",
                "properties": {
                    "name": {
                        "type": "STRING",
                        "description": "The full name of the person, including their alias if provided."
                    },
                    "title": { "type": "STRING" },
                    "description": { "type": "STRING" },
                    "class": {
                        "type": "STRING",
                        "enum": ["MONARCH", "ASSASSIN", "MAGE", "HEALER", "TANK", "RANGER", "FIGHTER", "SUMMONER"]
                    },
                    "rank": {
                        "type": "STRING",
                        "enum": ["S-Rank", "A-Rank", "B-Rank", "C-Rank"]
                    },
                    "quote": { "type": "STRING" }
                },
                "required": ["name", "title", "description", "class", "rank", "quote"]
            }
        })
    }
}

#[derive(Serialize)]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(rename = "systemInstruction")]
    system_instruction: GeminiSystemInstruction,
    #[serde(rename = "generationConfig")]
    generation_config: GeminiGenerationConfig,
}

#[derive(Serialize)]
struct GeminiContent {
    role: String,
    parts: Vec<GeminiPart>,
}

#[derive(Serialize)]
struct GeminiSystemInstruction {
    parts: Vec<GeminiPart>,
}

#[derive(Serialize)]
struct GeminiPart {
    text: String,
}

#[derive(Serialize)]
struct GeminiGenerationConfig {
    #[serde(rename = "responseMimeType")]
    response_mime_type: String,
    #[serde(rename = "responseSchema")]
    response_schema: serde_json::Value,
}

#[derive(Deserialize)]
struct GeminiResponse {
    candidates: Option<Vec<GeminiCandidate>>,
    error: Option<GeminiError>,
}

#[derive(Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiContentResponse>,
    #[serde(rename = "finishReason")]
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct GeminiContentResponse {
    #[serde(default)]
    parts: Vec<GeminiPartResponse>,
}

#[derive(Deserialize)]
struct GeminiPartResponse {
    text: String,
}

#[derive(Deserialize, Debug)]
struct GeminiError {
    message: String,
}

fn extract_candidate_text(response_text: &str) -> Result<String, EnrichmentError> {
    let result: GeminiResponse = serde_json::from_str(response_text).map_err(|e| {
        EnrichmentError::TextEnrichment(format!(
            "failed to parse Gemini response: {}. Body: {}",
            e, response_text
        ))
    })?;

    if let Some(err) = result.error {
        return Err(EnrichmentError::TextEnrichment(format!(
            "Gemini API returned error: {}",
            err.message
        )));
    }

    if let Some(candidates) = result.candidates {
        if let Some(first) = candidates.first() {
            if let Some(content) = &first.content {
                if let Some(part) = content.parts.first() {
                    return Ok(part.text.clone());
                }
            }

            let reason = first.finish_reason.as_deref().unwrap_or("UNKNOWN");
            return Err(EnrichmentError::TextEnrichment(format!(
                "Gemini response empty. Finish reason: {}",
                reason
            )));
        }
    }

    Err(EnrichmentError::TextEnrichment(format!(
        "Gemini response format unexpected or empty. Body: {}",
        response_text
    )))
}

#[async_trait]
impl ProfileGenerator for GeminiProfileClient {
    async fn generate_profiles(
        &self,
        display_names: &[String],
    ) -> Result<Vec<ProfileAttributes>, EnrichmentError> {
        ensure_batch(display_names)?;
        let api_key = self.resolve_api_key()?;

        let url = format!(
            "https://generativelanguage.googleapis.com/v1beta/models/{}:generateContent?key={}",
            self.model, api_key
        );

        let request_body = GeminiRequest {
            contents: vec![GeminiContent {
                role: "user".to_string(),
                parts: vec![GeminiPart {
                    text: Self::build_prompt(display_names),
                }],
            }],
            system_instruction: GeminiSystemInstruction {
                parts: vec![GeminiPart {
                    text: "You are the 'System' awakening a guild of Hunters. \
                           Respond with valid JSON only."
                        .to_string(),
                }],
            },
            generation_config: GeminiGenerationConfig {
                response_mime_type: "application/json".to_string(),
                response_schema: Self::response_schema(),
            },
        };

        let resp = self
            .client
            .post(&url)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| EnrichmentError::TextEnrichment(e.to_string()))?;

        if !resp.status().is_success() {
            let error_text = resp
                .text()
                .await
                .map_err(|e| EnrichmentError::TextEnrichment(e.to_string()))?;
            return Err(EnrichmentError::TextEnrichment(format!(
                "Gemini API error: {}",
                error_text
            )));
        }

        let response_text = resp
            .text()
            .await
            .map_err(|e| EnrichmentError::TextEnrichment(e.to_string()))?;
        let payload = extract_candidate_text(&response_text)?;
        parse_profiles(&payload)
    }
}

// --- Gateway ---

/// Speaks the deployed proxy's wire contract: POST `{ names }` to
/// `generateCharacterInfo`, error bodies carry `{ message }`.
#[derive(Debug)]
pub struct GatewayProfileClient {
    base_url: String,
    client: reqwest::Client,
}

impl GatewayProfileClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }
}

#[derive(Serialize)]
struct GatewayInfoRequest {
    names: Vec<String>,
}

#[derive(Deserialize)]
struct GatewayErrorBody {
    message: Option<String>,
}

pub(crate) fn gateway_error_message(body: &str, status: reqwest::StatusCode) -> String {
    match serde_json::from_str::<GatewayErrorBody>(body) {
        Ok(GatewayErrorBody {
            message: Some(message),
        }) => message,
        _ => format!("gateway returned {}: {}", status, body),
    }
}

#[async_trait]
impl ProfileGenerator for GatewayProfileClient {
    async fn generate_profiles(
        &self,
        display_names: &[String],
    ) -> Result<Vec<ProfileAttributes>, EnrichmentError> {
        ensure_batch(display_names)?;

        let url = format!("{}/generateCharacterInfo", self.base_url);
        let request_body = GatewayInfoRequest {
            names: display_names.to_vec(),
        };

        let resp = self
            .client
            .post(&url)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| EnrichmentError::TextEnrichment(e.to_string()))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| EnrichmentError::TextEnrichment(e.to_string()))?;

        if !status.is_success() {
            return Err(EnrichmentError::TextEnrichment(gateway_error_message(
                &body, status,
            )));
        }

        parse_profiles(&body)
    }
}
