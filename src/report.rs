use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt::Write;
use std::path::Path;
use tracing::{info, warn};
use uuid::Uuid;

use crate::detect::{Confidence, DetectionStrategy};
use crate::registry::LanguageRegistry;
use crate::speech::SynthesisOutcome;
use crate::translate::{TranslationOutcome, Truncation};

/// Detected source language, ready for display
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetectedLanguage {
    pub code: String,
    /// Registry name, or the raw code for unregistered languages
    pub name: String,
    pub score: Confidence,
    pub strategy: DetectionStrategy,
}

#[derive(Debug, Serialize)]
pub struct TargetReport {
    pub translation: TranslationOutcome,
    pub speech: Option<SynthesisOutcome>,
}

/// Everything produced by one request
#[derive(Debug, Serialize)]
pub struct Report {
    pub request_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub detection: DetectedLanguage,
    pub truncation: Option<Truncation>,
    pub targets: Vec<TargetReport>,
}

impl Report {
    /// Move generated audio out of temp storage into `dir`, named
    /// `<request-id>_<code>.<format>`.
    ///
    /// Audio that cannot be kept turns into a synthesis failure for its
    /// target; the rest of the report is untouched.
    pub fn keep_audio(&mut self, dir: &Path) {
        let has_audio = self
            .targets
            .iter()
            .any(|t| matches!(t.speech, Some(SynthesisOutcome::Audio { .. })));
        if !has_audio {
            return;
        }

        let dir_error = std::fs::create_dir_all(dir)
            .err()
            .map(|e| format!("Could not create {}: {}", dir.display(), e));
        let request_id = self.request_id;

        for target in self.targets.iter_mut() {
            target.speech = match target.speech.take() {
                Some(SynthesisOutcome::Audio { target_code, artifact }) => {
                    let destination =
                        dir.join(format!("{}_{}.{}", request_id, target_code, artifact.format()));
                    let kept = match &dir_error {
                        Some(error) => Err(error.clone()),
                        None => artifact
                            .persist(&destination)
                            .map_err(|e| format!("Could not save {}: {}", destination.display(), e)),
                    };

                    match kept {
                        Ok(artifact) => {
                            info!("Saved audio for '{}' to {}", target_code, destination.display());
                            Some(SynthesisOutcome::Audio { target_code, artifact })
                        }
                        Err(error) => {
                            warn!("{}", error);
                            Some(SynthesisOutcome::Failure { target_code, error })
                        }
                    }
                }
                other => other,
            };
        }
    }
}

pub fn render_detection(detection: &DetectedLanguage) -> String {
    let label = match detection.strategy {
        DetectionStrategy::Robust => "score",
        DetectionStrategy::Fast | DetectionStrategy::Auto => "confidence",
    };
    format!(
        "Detected Language\n  {} ({}) - {}: {}\n",
        detection.name, detection.code, label, detection.score
    )
}

/// Plain-text rendering for the terminal
pub fn render_text(report: &Report) -> String {
    let registry = LanguageRegistry::builtin();
    let mut out = String::new();

    if let Some(truncation) = &report.truncation {
        let _ = writeln!(out, "Warning: {}\n", truncation);
    }

    out.push_str(&render_detection(&report.detection));

    for target in &report.targets {
        let _ = writeln!(out);
        match &target.translation {
            TranslationOutcome::Success { target_code, text, .. } => {
                let _ = writeln!(out, "Translation to {}", registry.display_name(target_code));
                for line in text.lines() {
                    let _ = writeln!(out, "  {}", line);
                }
            }
            TranslationOutcome::Failure { target_name, error, .. } => {
                let _ = writeln!(out, "Translation to {}", target_name);
                let _ = writeln!(out, "  Error: {}", error);
            }
        }

        match &target.speech {
            Some(SynthesisOutcome::Audio { artifact, .. }) => {
                let _ = writeln!(
                    out,
                    "  Audio: {} ({} bytes, {})",
                    artifact.path().display(),
                    artifact.size_bytes(),
                    artifact.format()
                );
            }
            Some(SynthesisOutcome::Unsupported { target_code }) => {
                let _ = writeln!(
                    out,
                    "  Note: speech is not available for {}",
                    registry.display_name(target_code)
                );
            }
            Some(SynthesisOutcome::Failure { error, .. }) => {
                let _ = writeln!(out, "  Note: speech synthesis failed: {}", error);
            }
            None => {}
        }
    }

    out
}
