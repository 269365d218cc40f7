use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;
use tracing::{debug, info};

use crate::config::OllamaConfig;
use crate::error::{Result, RelayError};
use crate::registry::LanguageRegistry;
use super::Translator;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateRequest {
    pub model: String,
    pub prompt: String,
    pub stream: bool,
    pub format: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateResponse {
    pub response: String,
    pub done: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslationResult {
    pub text: String,
}

/// Translator backed by an ollama model
pub struct OllamaTranslator {
    client: Client,
    config: OllamaConfig,
}

impl OllamaTranslator {
    pub fn new(config: OllamaConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { client, config })
    }

    /// Build translation prompt, asking for a JSON answer
    fn build_translation_prompt(&self, text: &str, source_language: &str, target_language: &str) -> String {
        let registry = LanguageRegistry::builtin();
        let source_name = registry.display_name(source_language);
        let target_name = registry.display_name(target_language);

        format!(
            "You are a professional translator.\n\
             \n\
             CRITICAL: You must translate the text from {} to {} ONLY. Do not translate to any other language.\n\
             The target language is: {} (language code: {})\n\
             \n\
             Return ONLY the translation in JSON format as {{\"text\":\"your {} translation here\"}}.\n\
             Do not include any explanations, alternatives, or text in other languages.\n\
             \n\
             [Text to translate]\n\
             {}\n",
            source_name, target_name, target_name, target_language, target_name, text
        )
    }

    /// Strip ``` fences some models wrap around JSON
    fn remove_markdown_code_blocks(&self, text: &str) -> String {
        let text = text.trim();

        if let Some(inner) = text.strip_prefix("```json").and_then(|t| t.strip_suffix("```")) {
            return inner.trim().to_string();
        }
        if let Some(inner) = text.strip_prefix("```").and_then(|t| t.strip_suffix("```")) {
            return inner.trim().to_string();
        }

        text.to_string()
    }

    /// Recover the translation from an answer that ignored the JSON format.
    ///
    /// Models sometimes echo the prompt's section label or quote the text.
    /// Line breaks inside the translation are kept.
    fn clean_translation_response(&self, response: &str) -> String {
        let text = response.trim();
        let text = text
            .strip_prefix("[Translation]")
            .or_else(|| text.strip_prefix("Translation:"))
            .unwrap_or(text)
            .trim();

        text.strip_prefix('"')
            .and_then(|t| t.strip_suffix('"'))
            .unwrap_or(text)
            .to_string()
    }
}

#[async_trait]
impl Translator for OllamaTranslator {
    async fn translate(
        &self,
        text: &str,
        source_language: &str,
        target_language: &str,
    ) -> Result<String> {
        let request = GenerateRequest {
            model: self.config.model.clone(),
            prompt: self.build_translation_prompt(text, source_language, target_language),
            stream: false,
            format: "json".to_string(),
        };

        let url = format!("{}/api/generate", self.config.endpoint.trim_end_matches('/'));
        debug!("Sending translation request to: {}", url);

        let response = self.client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| RelayError::Translation(format!("HTTP request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(RelayError::Translation(format!(
                "Ollama API error {}: {}", status, error_text
            )));
        }

        let generated: GenerateResponse = response.json().await
            .map_err(|e| RelayError::Translation(format!("Failed to parse response: {}", e)))?;

        let raw_response = self.remove_markdown_code_blocks(&generated.response);
        debug!("Raw Ollama response: {}", raw_response);

        if raw_response.is_empty() {
            return Err(RelayError::Translation("Empty translation received".to_string()));
        }

        if let Ok(result) = serde_json::from_str::<TranslationResult>(&raw_response) {
            return Ok(result.text.trim().to_string());
        }

        Ok(self.clean_translation_response(&raw_response))
    }

    /// Check if Ollama is available and the model is loaded
    async fn check_availability(&self) -> Result<()> {
        let url = format!("{}/api/show", self.config.endpoint.trim_end_matches('/'));

        let response = self.client
            .post(&url)
            .json(&json!({ "name": self.config.model }))
            .send()
            .await
            .map_err(|e| RelayError::Translation(format!("Failed to connect to Ollama: {}", e)))?;

        if response.status().is_success() {
            info!("Ollama model '{}' is available", self.config.model);
            Ok(())
        } else {
            Err(RelayError::Translation(format!(
                "Ollama model '{}' not found. Please pull the model first: ollama pull {}",
                self.config.model, self.config.model
            )))
        }
    }
}
