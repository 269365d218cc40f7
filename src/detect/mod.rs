// Language identification
//
// Three interchangeable strategies produce differently shaped raw results:
// - Fast: ranked (code, probability) candidates from lingua
// - Robust: a single (code, score) pair from whatlang, score of uncertain type
// - Auto: a remote service answer whose code and confidence may be missing
//
// LanguageIdentifier picks the strategy and normalizes every shape into one
// DetectionResult.

pub mod fast;
pub mod robust;

use async_trait::async_trait;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::error::{DetectionError, InputError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DetectionStrategy {
    /// Fast: statistical classifier returning ranked candidates
    Fast,
    /// Robust: alternative classifier returning a single scored guess
    Robust,
    /// Auto: remote detection service
    Auto,
}

impl fmt::Display for DetectionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fast => write!(f, "fast"),
            Self::Robust => write!(f, "robust"),
            Self::Auto => write!(f, "auto"),
        }
    }
}

/// Detection confidence.
///
/// `Unknown` means the backend returned a score that could not be read as a
/// number, which is different from a real score of zero.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Confidence {
    Known(f64),
    Unknown,
}

impl Confidence {
    /// Clamp to [0, 1]; non-finite values become `Unknown`
    pub fn known(value: f64) -> Self {
        if value.is_finite() {
            Self::Known(value.clamp(0.0, 1.0))
        } else {
            Self::Unknown
        }
    }

    pub fn value(&self) -> Option<f64> {
        match self {
            Self::Known(v) => Some(*v),
            Self::Unknown => None,
        }
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Known(v) => write!(f, "{:.2}", v),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

impl Serialize for Confidence {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Self::Known(v) => serializer.serialize_f64(*v),
            Self::Unknown => serializer.serialize_str("unknown"),
        }
    }
}

/// Score as reported by a single-pair classifier
#[derive(Debug, Clone, PartialEq)]
pub enum RawScore {
    Float(f64),
    Integer(i64),
    Text(String),
}

impl RawScore {
    pub fn coerce(&self) -> Confidence {
        match self {
            Self::Float(v) => Confidence::known(*v),
            Self::Integer(v) => Confidence::known(*v as f64),
            Self::Text(s) => match s.trim().parse::<f64>() {
                Ok(v) => Confidence::known(v),
                Err(_) => {
                    warn!("Classifier score '{}' is not numeric", s);
                    Confidence::Unknown
                }
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RankedCandidate {
    pub code: String,
    pub probability: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RemoteDetection {
    pub language: Option<String>,
    pub confidence: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetectionResult {
    pub code: String,
    pub score: Confidence,
    pub strategy: DetectionStrategy,
}

/// Classifier returning candidates ordered best first
#[cfg_attr(test, mockall::automock)]
pub trait RankedClassifier: Send + Sync {
    fn rank(&self, text: &str) -> Result<Vec<RankedCandidate>>;
}

/// Classifier returning one guess
#[cfg_attr(test, mockall::automock)]
pub trait ScoredClassifier: Send + Sync {
    fn classify(&self, text: &str) -> Result<(String, RawScore)>;
}

/// Remote detection service
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RemoteDetector: Send + Sync {
    async fn detect(&self, text: &str) -> Result<RemoteDetection>;
}

/// Text that is non-empty after trimming
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputText(String);

impl InputText {
    pub fn new<S: Into<String>>(raw: S) -> std::result::Result<Self, InputError> {
        let raw = raw.into();
        if raw.trim().is_empty() {
            return Err(InputError::Empty);
        }
        Ok(Self(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Normalize a backend language code to the registry's spelling
pub fn normalize_code(raw: &str) -> String {
    let code = raw.trim().to_lowercase().replace('_', "-");
    match code.as_str() {
        "zh" | "zh-hans" | "zh-cn" | "cmn" => "zh-cn".to_string(),
        "zh-hant" | "zh-tw" | "zt" => "zh-tw".to_string(),
        _ => code,
    }
}

pub struct LanguageIdentifier {
    fast: Arc<dyn RankedClassifier>,
    robust: Arc<dyn ScoredClassifier>,
    remote: Arc<dyn RemoteDetector>,
}

impl LanguageIdentifier {
    pub fn new(
        fast: Arc<dyn RankedClassifier>,
        robust: Arc<dyn ScoredClassifier>,
        remote: Arc<dyn RemoteDetector>,
    ) -> Self {
        Self { fast, robust, remote }
    }

    /// Identify the language of `text` with the chosen strategy
    pub async fn detect(
        &self,
        text: &InputText,
        strategy: DetectionStrategy,
    ) -> std::result::Result<DetectionResult, DetectionError> {
        info!("Detecting source language ({} strategy)", strategy);

        let (raw_code, score) = match strategy {
            DetectionStrategy::Fast => {
                let candidates = self.fast.rank(text.as_str())?;
                debug!("Ranked candidates: {:?}", candidates);
                let top = candidates.into_iter().next().ok_or_else(|| {
                    DetectionError::Backend("classifier returned no candidates".to_string())
                })?;
                (top.code, Confidence::known(top.probability.unwrap_or(0.0)))
            }
            DetectionStrategy::Robust => {
                let (code, raw_score) = self.robust.classify(text.as_str())?;
                debug!("Classifier guess: {} ({:?})", code, raw_score);
                (code, raw_score.coerce())
            }
            DetectionStrategy::Auto => {
                let detection = self.remote.detect(text.as_str()).await?;
                debug!("Remote detection: {:?}", detection);
                let code = detection
                    .language
                    .filter(|code| !code.trim().is_empty())
                    .ok_or(DetectionError::Undetermined)?;
                (code, Confidence::known(detection.confidence.unwrap_or(0.0)))
            }
        };

        let code = normalize_code(&raw_code);
        info!("Detected '{}' with confidence {}", code, score);

        Ok(DetectionResult {
            code,
            score,
            strategy,
        })
    }
}

/// Factory for the local classifiers
pub struct DetectorFactory;

impl DetectorFactory {
    /// Build an identifier with lingua (fast), whatlang (robust) and the given remote service
    pub fn create_identifier(remote: Arc<dyn RemoteDetector>) -> LanguageIdentifier {
        LanguageIdentifier::new(
            Arc::new(fast::LinguaClassifier::new()),
            Arc::new(robust::WhatlangClassifier::new()),
            remote,
        )
    }
}
