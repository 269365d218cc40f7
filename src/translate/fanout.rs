use serde::Serialize;
use std::fmt;
use tracing::{info, warn};

use crate::error::TargetError;
use crate::registry::LanguageRegistry;
use super::Translator;

/// Result of translating into one target language
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TranslationOutcome {
    Success {
        target_name: String,
        target_code: String,
        text: String,
    },
    Failure {
        target_name: String,
        /// `None` when the name could not be resolved to a code
        target_code: Option<String>,
        error: TargetError,
    },
}

impl TranslationOutcome {
    pub fn target_name(&self) -> &str {
        match self {
            Self::Success { target_name, .. } | Self::Failure { target_name, .. } => target_name,
        }
    }

    pub fn target_code(&self) -> Option<&str> {
        match self {
            Self::Success { target_code, .. } => Some(target_code),
            Self::Failure { target_code, .. } => target_code.as_deref(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

/// Targets beyond the per-request limit that were not processed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Truncation {
    pub requested: usize,
    pub kept: usize,
    pub dropped: Vec<String>,
}

impl fmt::Display for Truncation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Only the first {} of {} target languages are translated (skipped: {})",
            self.kept,
            self.requested,
            self.dropped.join(", ")
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FanOut {
    pub outcomes: Vec<TranslationOutcome>,
    pub truncation: Option<Truncation>,
}

/// Hard ceiling on target languages per request, whatever the configuration says
pub const MAX_TARGETS: usize = 3;

/// Keep the first `max_targets` names, never more than `MAX_TARGETS`
pub fn truncate_targets(targets: &[String], max_targets: usize) -> (&[String], Option<Truncation>) {
    let max_targets = max_targets.clamp(1, MAX_TARGETS);
    if targets.len() <= max_targets {
        return (targets, None);
    }

    let (kept, dropped) = targets.split_at(max_targets);
    let truncation = Truncation {
        requested: targets.len(),
        kept: kept.len(),
        dropped: dropped.to_vec(),
    };
    (kept, Some(truncation))
}

/// Translate `text` into every target, one after another.
///
/// Outcomes follow the order of the (truncated) target list. A failing
/// target never stops the ones after it.
pub async fn translate_all(
    translator: &dyn Translator,
    registry: &LanguageRegistry,
    text: &str,
    source_code: &str,
    targets: &[String],
    max_targets: usize,
) -> FanOut {
    let (targets, truncation) = truncate_targets(targets, max_targets);
    if let Some(truncation) = &truncation {
        warn!("{}", truncation);
    }

    let total = targets.len();
    let mut outcomes = Vec::with_capacity(total);

    for (idx, target_name) in targets.iter().enumerate() {
        info!("┌─ Translating {}/{}: {} ────────", idx + 1, total, target_name);

        let target_code = match registry.resolve(target_name) {
            Ok(code) => code,
            Err(error) => {
                warn!("│ Failed: {}", error);
                warn!("└─────────────────────────────────────");
                outcomes.push(TranslationOutcome::Failure {
                    target_name: target_name.clone(),
                    target_code: None,
                    error,
                });
                continue;
            }
        };

        match translator.translate(text, source_code, target_code).await {
            Ok(translation) => {
                info!("│ {} -> {}: {}", source_code, target_code, translation);
                info!("└─────────────────────────────────────");
                outcomes.push(TranslationOutcome::Success {
                    target_name: target_name.clone(),
                    target_code: target_code.to_string(),
                    text: translation,
                });
            }
            Err(e) => {
                warn!("│ Failed: {}", e);
                warn!("└─────────────────────────────────────");
                outcomes.push(TranslationOutcome::Failure {
                    target_name: target_name.clone(),
                    target_code: Some(target_code.to_string()),
                    error: TargetError::Translation(e.to_string()),
                });
            }
        }
    }

    FanOut { outcomes, truncation }
}
