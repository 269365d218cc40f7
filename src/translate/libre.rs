use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, info};

use crate::config::LibreTranslateConfig;
use crate::detect::{RemoteDetection, RemoteDetector};
use crate::error::{Result, RelayError};
use super::Translator;

#[derive(Debug, Deserialize)]
struct DetectCandidate {
    language: Option<String>,
    confidence: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TranslateResponse {
    translated_text: String,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: String,
}

/// Client for a LibreTranslate instance (`/detect`, `/translate`, `/languages`)
pub struct LibreTranslateClient {
    client: Client,
    config: LibreTranslateConfig,
}

impl LibreTranslateClient {
    pub fn new(config: LibreTranslateConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { client, config })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.config.endpoint.trim_end_matches('/'), path)
    }

    fn with_api_key(&self, mut body: Value) -> Value {
        if let Some(api_key) = &self.config.api_key {
            body["api_key"] = Value::String(api_key.clone());
        }
        body
    }

    async fn post(&self, path: &str, body: Value) -> Result<reqwest::Response> {
        let url = self.url(path);
        debug!("Sending LibreTranslate request to: {}", url);

        let response = self
            .client
            .post(&url)
            .json(&self.with_api_key(body))
            .send()
            .await
            .map_err(|e| RelayError::Translation(format!("HTTP request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorResponse>(&error_text)
                .map(|e| e.error)
                .unwrap_or(error_text);
            return Err(RelayError::Translation(format!(
                "LibreTranslate API error {}: {}",
                status, message
            )));
        }

        Ok(response)
    }
}

/// LibreTranslate spells a few codes differently from the registry
fn service_code(code: &str) -> &str {
    match code {
        "zh-cn" => "zh",
        "zh-tw" => "zt",
        other => other,
    }
}

#[async_trait]
impl RemoteDetector for LibreTranslateClient {
    async fn detect(&self, text: &str) -> Result<RemoteDetection> {
        let response = self
            .post("detect", json!({ "q": text }))
            .await
            .map_err(|e| RelayError::Detection(e.to_string()))?;

        let candidates: Vec<DetectCandidate> = response
            .json()
            .await
            .map_err(|e| RelayError::Detection(format!("Failed to parse detect response: {}", e)))?;

        // Sorted best first; confidence is a percentage (0-100)
        let detection = candidates
            .into_iter()
            .next()
            .map(|best| RemoteDetection {
                language: best.language,
                confidence: best.confidence.map(|c| c / 100.0),
            })
            .unwrap_or_default();

        Ok(detection)
    }
}

#[async_trait]
impl Translator for LibreTranslateClient {
    async fn translate(
        &self,
        text: &str,
        source_language: &str,
        target_language: &str,
    ) -> Result<String> {
        let body = json!({
            "q": text,
            "source": service_code(source_language),
            "target": service_code(target_language),
            "format": "text",
        });

        let response = self.post("translate", body).await?;
        let translation: TranslateResponse = response
            .json()
            .await
            .map_err(|e| RelayError::Translation(format!("Failed to parse response: {}", e)))?;

        let text = translation.translated_text.trim().to_string();
        if text.is_empty() {
            return Err(RelayError::Translation("Empty translation received".to_string()));
        }
        Ok(text)
    }

    async fn check_availability(&self) -> Result<()> {
        let url = self.url("languages");
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| RelayError::Translation(format!("Failed to connect to LibreTranslate: {}", e)))?;

        if response.status().is_success() {
            info!("LibreTranslate is available at {}", self.config.endpoint);
            Ok(())
        } else {
            Err(RelayError::Translation(format!(
                "LibreTranslate at {} answered {}",
                self.config.endpoint,
                response.status()
            )))
        }
    }
}
