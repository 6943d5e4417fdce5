use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    #[serde(default = "default_output")]
    pub output_folder: String,

    #[serde(default)]
    pub text: TextConfig,

    #[serde(default)]
    pub image: ImageConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TextConfig {
    /// "gemini" (direct upstream) or "gateway" (deployed proxy endpoints).
    #[serde(default = "default_provider")]
    pub provider: String,
    pub gemini: Option<GeminiTextConfig>,
    pub gateway: Option<GatewayConfig>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ImageConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    pub gemini: Option<GeminiImageConfig>,
    pub gateway: Option<GatewayConfig>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct GeminiTextConfig {
    /// Falls back to the GEMINI_API_KEY environment variable when absent.
    pub api_key: Option<String>,
    #[serde(default = "default_text_model")]
    pub model: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct GeminiImageConfig {
    pub api_key: Option<String>,
    #[serde(default = "default_image_model")]
    pub model: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct GatewayConfig {
    pub base_url: String,
}

impl Default for TextConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            gemini: None,
            gateway: None,
        }
    }
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            gemini: None,
            gateway: None,
        }
    }
}

fn default_output() -> String {
    "gallery".to_string()
}
fn default_provider() -> String {
    "gemini".to_string()
}
fn default_text_model() -> String {
    "gemini-2.5-flash".to_string()
}
fn default_image_model() -> String {
    "imagen-4.0-generate-001".to_string()
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Path::new("config.yml");
        if !path.exists() {
            anyhow::bail!("config.yml not found. Please create one.");
        }

        let content = fs::read_to_string(path).context("Failed to read config.yml")?;
        let config: Config =
            serde_yaml_ng::from_str(&content).context("Failed to parse config.yml")?;
        Ok(config)
    }

    pub fn ensure_directories(&self) -> Result<()> {
        fs::create_dir_all(&self.output_folder)?;
        Ok(())
    }
}
