use lingua::{LanguageDetector, LanguageDetectorBuilder};

use crate::error::Result;
use super::{RankedCandidate, RankedClassifier};

/// Ranked statistical classifier backed by lingua.
///
/// Source text may be in any language lingua knows, not just the ones offered
/// as translation targets.
pub struct LinguaClassifier {
    detector: LanguageDetector,
}

impl LinguaClassifier {
    pub fn new() -> Self {
        let detector = LanguageDetectorBuilder::from_all_spoken_languages().build();
        Self { detector }
    }
}

impl Default for LinguaClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl RankedClassifier for LinguaClassifier {
    fn rank(&self, text: &str) -> Result<Vec<RankedCandidate>> {
        // Already sorted by descending confidence
        let values = self.detector.compute_language_confidence_values(text);

        Ok(values
            .into_iter()
            .map(|(language, confidence)| RankedCandidate {
                code: language.iso_code_639_1().to_string(),
                probability: Some(confidence),
            })
            .collect())
    }
}
