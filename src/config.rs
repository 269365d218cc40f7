use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use crate::detect::DetectionStrategy;
use crate::error::{Result, RelayError};
use crate::registry::{LanguageRegistry, DEFAULT_CODE};
use crate::translate::MAX_TARGETS;

// Default values for optional keys
fn default_max_targets() -> usize {
    MAX_TARGETS
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_words_per_minute() -> u32 {
    160
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub detection: DetectionConfig,
    pub translate: TranslateConfig,
    pub libretranslate: LibreTranslateConfig,
    pub ollama: OllamaConfig,
    pub speech: SpeechConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionConfig {
    /// Strategy used when none is given on the command line
    pub strategy: DetectionStrategy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslateConfig {
    /// Backend used for translation
    pub provider: TranslationProvider,
    /// Maximum number of target languages processed per request (1 to 3)
    #[serde(default = "default_max_targets")]
    pub max_targets: usize,
    /// Target display names used when none are given on the command line
    pub default_targets: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TranslationProvider {
    /// LibreTranslate HTTP API (also serves the Auto detection strategy)
    LibreTranslate,
    /// Local LLM via ollama
    Ollama,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LibreTranslateConfig {
    /// LibreTranslate endpoint URL
    pub endpoint: String,
    /// API key, if the instance requires one
    pub api_key: Option<String>,
    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaConfig {
    /// Ollama endpoint URL
    pub endpoint: String,
    /// LLM model to use for translation
    pub model: String,
    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeechConfig {
    /// Path to the espeak-ng binary
    pub binary_path: String,
    /// Speaking rate
    #[serde(default = "default_words_per_minute")]
    pub words_per_minute: u32,
    /// Language code to espeak-ng voice, for codes espeak-ng names differently
    #[serde(default)]
    pub voice_map: BTreeMap<String, String>,
}

impl Default for Config {
    fn default() -> Self {
        let registry = LanguageRegistry::builtin();

        Self {
            detection: DetectionConfig {
                strategy: DetectionStrategy::Fast,
            },
            translate: TranslateConfig {
                provider: TranslationProvider::LibreTranslate,
                max_targets: default_max_targets(),
                default_targets: vec![registry.display_name(DEFAULT_CODE)],
            },
            libretranslate: LibreTranslateConfig {
                endpoint: "http://localhost:5000".to_string(),
                api_key: None,
                timeout_secs: default_timeout_secs(),
            },
            ollama: OllamaConfig {
                endpoint: "http://localhost:11434".to_string(),
                model: "llama3.2:3b".to_string(),
                timeout_secs: 300,
            },
            speech: SpeechConfig {
                binary_path: "espeak-ng".to_string(),
                words_per_minute: default_words_per_minute(),
                voice_map: BTreeMap::from([
                    ("zh-cn".to_string(), "cmn".to_string()),
                    ("zh-tw".to_string(), "cmn".to_string()),
                ]),
            },
        }
    }
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| RelayError::Config(format!("Failed to read config file: {}", e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| RelayError::Config(format!("Failed to parse config file: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| RelayError::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| RelayError::Config(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if !(1..=MAX_TARGETS).contains(&self.translate.max_targets) {
            return Err(RelayError::Config(format!(
                "translate.max_targets must be between 1 and {}, got {}",
                MAX_TARGETS, self.translate.max_targets
            )));
        }
        Ok(())
    }
}
