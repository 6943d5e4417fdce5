use crate::character::EnrichedCharacter;
use crate::config::Config;
use crate::error::EnrichmentError;
use crate::textgen::gateway_error_message;
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt::Debug;

/// Stage 2: one outbound request per character, returning raw base64 JPEG
/// bytes (3:4 portrait). No retries; the orchestrator's join decides what a
/// single failure means for the batch.
#[async_trait]
pub trait PortraitGenerator: Send + Sync + Debug {
    async fn generate_portrait(
        &self,
        character: &EnrichedCharacter,
    ) -> Result<String, EnrichmentError>;
}

pub fn create_portrait_generator(config: &Config) -> Result<Box<dyn PortraitGenerator>> {
    match config.image.provider.as_str() {
        "gemini" => {
            let cfg = config
                .image
                .gemini
                .as_ref()
                .context("Gemini image config missing")?;
            Ok(Box::new(GeminiPortraitClient::new(
                cfg.api_key.clone(),
                &cfg.model,
            )))
        }
        "gateway" => {
            let cfg = config
                .image
                .gateway
                .as_ref()
                .context("Gateway image config missing")?;
            Ok(Box::new(GatewayPortraitClient::new(&cfg.base_url)))
        }
        _ => Err(anyhow::anyhow!(
            "Unknown image provider: {}",
            config.image.provider
        )),
    }
}

/// Portrait prompt for one character. Works with or without a matched
/// profile: class and title fall back to a generic hunter.
pub fn build_portrait_prompt(character: &EnrichedCharacter) -> String {
    let class = character
        .class
        .map(|c| c.to_string())
        .unwrap_or_else(|| "Fighter".to_string());
    let title = character.title.as_deref().unwrap_or("Hunter");
    let description = character.description.as_deref().unwrap_or("");

    format!(
        "Anime character portrait, dark fantasy style. A powerful {} {} titled \"{}\". {}. \
         Epic, manhwa art style, detailed, vibrant mana glow.",
        character.gender, class, title, description
    )
}

// --- Gemini (Imagen) ---

#[derive(Debug)]
pub struct GeminiPortraitClient {
    api_key: Option<String>,
    model: String,
    client: reqwest::Client,
}

impl GeminiPortraitClient {
    pub fn new(api_key: Option<String>, model: &str) -> Self {
        Self {
            api_key,
            model: model.to_string(),
            client: reqwest::Client::new(),
        }
    }

    fn resolve_api_key(&self) -> Result<String, EnrichmentError> {
        self.api_key
            .clone()
            .or_else(|| env::var("GEMINI_API_KEY").ok())
            .ok_or_else(|| {
                EnrichmentError::Configuration(
                    "set image.gemini.api_key or GEMINI_API_KEY".to_string(),
                )
            })
    }
}

#[derive(Serialize)]
struct ImagenRequest {
    instances: Vec<ImagenInstance>,
    parameters: ImagenParameters,
}

#[derive(Serialize)]
struct ImagenInstance {
    prompt: String,
}

#[derive(Serialize)]
struct ImagenParameters {
    #[serde(rename = "sampleCount")]
    sample_count: u32,
    #[serde(rename = "outputMimeType")]
    output_mime_type: String,
    #[serde(rename = "aspectRatio")]
    aspect_ratio: String,
}

#[derive(Deserialize)]
struct ImagenResponse {
    #[serde(default)]
    predictions: Vec<ImagenPrediction>,
}

#[derive(Deserialize)]
struct ImagenPrediction {
    #[serde(rename = "bytesBase64Encoded")]
    bytes_base64_encoded: String,
}

fn extract_image_bytes(response_text: &str, name: &str) -> Result<String, EnrichmentError> {
    let result: ImagenResponse = serde_json::from_str(response_text).map_err(|e| {
        EnrichmentError::image(
            name,
            format!("failed to parse Imagen response: {}. Body: {}", e, response_text),
        )
    })?;

    match result.predictions.into_iter().next() {
        Some(prediction) => Ok(prediction.bytes_base64_encoded),
        None => Err(EnrichmentError::image(
            name,
            format!("Imagen returned no predictions. Body: {}", response_text),
        )),
    }
}

#[async_trait]
impl PortraitGenerator for GeminiPortraitClient {
    async fn generate_portrait(
        &self,
        character: &EnrichedCharacter,
    ) -> Result<String, EnrichmentError> {
        let api_key = self.resolve_api_key()?;

        let url = format!(
            "https://generativelanguage.googleapis.com/v1beta/models/{}:predict?key={}",
            self.model, api_key
        );

        let request_body = ImagenRequest {
            instances: vec![ImagenInstance {
                prompt: build_portrait_prompt(character),
            }],
            parameters: ImagenParameters {
                sample_count: 1,
                output_mime_type: "image/jpeg".to_string(),
                aspect_ratio: "3:4".to_string(),
            },
        };

        let resp = self
            .client
            .post(&url)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| EnrichmentError::image(&character.name, e.to_string()))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| EnrichmentError::image(&character.name, e.to_string()))?;

        if !status.is_success() {
            return Err(EnrichmentError::image(
                &character.name,
                format!("Imagen API error: {}", body),
            ));
        }

        extract_image_bytes(&body, &character.name)
    }
}

// --- Gateway ---

/// POSTs the character record itself to `generateCharacterImage` and reads
/// back `{ image }`, the proxy contract.
#[derive(Debug)]
pub struct GatewayPortraitClient {
    base_url: String,
    client: reqwest::Client,
}

impl GatewayPortraitClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }
}

#[derive(Deserialize)]
struct GatewayImageResponse {
    image: String,
}

#[async_trait]
impl PortraitGenerator for GatewayPortraitClient {
    async fn generate_portrait(
        &self,
        character: &EnrichedCharacter,
    ) -> Result<String, EnrichmentError> {
        let url = format!("{}/generateCharacterImage", self.base_url);

        let resp = self
            .client
            .post(&url)
            .json(character)
            .send()
            .await
            .map_err(|e| EnrichmentError::image(&character.name, e.to_string()))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| EnrichmentError::image(&character.name, e.to_string()))?;

        if !status.is_success() {
            return Err(EnrichmentError::image(
                &character.name,
                gateway_error_message(&body, status),
            ));
        }

        let parsed: GatewayImageResponse = serde_json::from_str(&body).map_err(|e| {
            EnrichmentError::image(
                &character.name,
                format!("unexpected image payload: {}. Body: {}", e, body),
            )
        })?;
        Ok(parsed.image)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::character::{merge_profiles, CharacterClass, ProfileAttributes, Rank};
    use crate::roster::ROSTER;

    fn enriched(subject_index: usize, profile: Option<ProfileAttributes>) -> EnrichedCharacter {
        let profiles: Vec<ProfileAttributes> = profile.into_iter().collect();
        merge_profiles(&ROSTER[subject_index..subject_index + 1], &profiles)
            .into_iter()
            .next()
            .unwrap()
    }

    #[test]
    fn test_prompt_defaults_for_unmatched_subject() {
        let character = enriched(1, None);
        let prompt = build_portrait_prompt(&character);
        assert!(prompt.contains("A powerful male Fighter titled \"Hunter\""));
        assert!(prompt.contains("manhwa art style"));
    }

    #[test]
    fn test_prompt_uses_profile_and_gender_attribute() {
        let profile = ProfileAttributes {
            name: "Anjali Singh Indoliya, Blade of Dusk".to_string(),
            title: "Sovereign of Plagues".to_string(),
            description: "Her touch withers armies.".to_string(),
            class: CharacterClass::Assassin,
            rank: Rank::S,
            quote: "Fade.".to_string(),
        };
        let character = enriched(5, Some(profile));

        let prompt = build_portrait_prompt(&character);
        assert!(prompt.contains("A powerful female Assassin titled \"Sovereign of Plagues\""));
        assert!(prompt.contains("Her touch withers armies."));
    }

    #[test]
    fn test_extract_image_bytes_success() {
        let json = r#"{
            "predictions": [
                { "bytesBase64Encoded": "aGVsbG8=", "mimeType": "image/jpeg" }
            ]
        }"#;
        assert_eq!(extract_image_bytes(json, "x").unwrap(), "aGVsbG8=");
    }

    #[test]
    fn test_extract_image_bytes_empty_predictions() {
        let err = extract_image_bytes(r#"{ "predictions": [] }"#, "Kush Singh Indoliya").unwrap_err();
        match err {
            EnrichmentError::ImageEnrichment { name, .. } => {
                assert_eq!(name, "Kush Singh Indoliya");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_gateway_image_response_parse() {
        let parsed: GatewayImageResponse =
            serde_json::from_str(r#"{ "image": "base64data" }"#).unwrap();
        assert_eq!(parsed.image, "base64data");
    }
}
