// Translation backends and the multi-target fan-out
//
// This module provides translation implementations through a factory pattern:
// - LibreTranslate: HTTP translation API, also used for remote detection
// - Ollama: LLM translation with a JSON-format prompt
//
// The fan-out drives one backend across several target languages and keeps
// each target's failure to itself.

pub mod fanout;
pub mod libre;
pub mod ollama;

use async_trait::async_trait;
use std::sync::Arc;

pub use fanout::*;
use crate::config::{Config, TranslationProvider};
use crate::error::Result;

/// Main trait for translation operations
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Translator: Send + Sync {
    /// Translate `text` between two registry language codes
    async fn translate(
        &self,
        text: &str,
        source_language: &str,
        target_language: &str,
    ) -> Result<String>;

    /// Check that the backend is reachable
    async fn check_availability(&self) -> Result<()> {
        Ok(())
    }
}

/// Factory for creating translator instances
pub struct TranslatorFactory;

impl TranslatorFactory {
    /// Create a translator based on the configured provider.
    ///
    /// The LibreTranslate client is shared with the Auto detection strategy.
    pub fn create_translator(
        config: &Config,
        libre: Arc<libre::LibreTranslateClient>,
    ) -> Result<Arc<dyn Translator>> {
        match config.translate.provider {
            TranslationProvider::LibreTranslate => Ok(libre),
            TranslationProvider::Ollama => {
                Ok(Arc::new(ollama::OllamaTranslator::new(config.ollama.clone())?))
            }
        }
    }
}
