use chrono::Utc;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::config::Config;
use crate::detect::{DetectionStrategy, DetectorFactory, InputText, LanguageIdentifier};
use crate::document::{acquire_text, TextSource};
use crate::error::{RequestError, Result};
use crate::registry::LanguageRegistry;
use crate::report::{DetectedLanguage, Report, TargetReport};
use crate::speech::{synthesize_if_requested, SpeechSynthesizer, SynthesisOutcome, SynthesizerFactory};
use crate::translate::libre::LibreTranslateClient;
use crate::translate::{translate_all, Translator, TranslatorFactory};

/// One user action: text plus the options chosen for it
#[derive(Debug, Clone)]
pub struct TranslationRequest {
    pub source: TextSource,
    pub strategy: DetectionStrategy,
    /// Target display names, in the order chosen
    pub targets: Vec<String>,
    pub synthesize: bool,
}

pub struct Workflow {
    config: Config,
    registry: &'static LanguageRegistry,
    identifier: LanguageIdentifier,
    translator: Arc<dyn Translator>,
    synthesizer: Box<dyn SpeechSynthesizer>,
}

impl Workflow {
    pub fn new(config: Config) -> Result<Self> {
        let libre = Arc::new(LibreTranslateClient::new(config.libretranslate.clone())?);

        let identifier = DetectorFactory::create_identifier(libre.clone());
        let translator = TranslatorFactory::create_translator(&config, libre)?;
        let synthesizer = SynthesizerFactory::create_synthesizer(config.speech.clone());

        Ok(Self::with_backends(config, identifier, translator, synthesizer))
    }

    pub fn with_backends(
        config: Config,
        identifier: LanguageIdentifier,
        translator: Arc<dyn Translator>,
        synthesizer: Box<dyn SpeechSynthesizer>,
    ) -> Self {
        Self {
            config,
            registry: LanguageRegistry::builtin(),
            identifier,
            translator,
            synthesizer,
        }
    }

    /// Check that the translation backend answers
    pub async fn check_translator(&self) -> Result<()> {
        self.translator.check_availability().await
    }

    /// Acquire text and identify its language
    pub async fn detect(
        &self,
        source: &TextSource,
        strategy: DetectionStrategy,
    ) -> std::result::Result<DetectedLanguage, RequestError> {
        let text = InputText::new(acquire_text(source).await)?;
        self.detect_text(&text, strategy).await
    }

    async fn detect_text(
        &self,
        text: &InputText,
        strategy: DetectionStrategy,
    ) -> std::result::Result<DetectedLanguage, RequestError> {
        let result = self.identifier.detect(text, strategy).await?;

        Ok(DetectedLanguage {
            name: self.registry.display_name(&result.code),
            code: result.code,
            score: result.score,
            strategy: result.strategy,
        })
    }

    /// Detect once, translate into every target, then synthesize speech if asked
    pub async fn run(&self, request: &TranslationRequest) -> std::result::Result<Report, RequestError> {
        let request_id = Uuid::new_v4();
        let span = info_span!("request", id = %request_id);

        async move {
            // Step 1: Acquire text
            let text = InputText::new(acquire_text(&request.source).await)?;

            // Step 2: Detect source language
            let detection = self.detect_text(&text, request.strategy).await?;
            info!("Source language: {} ({})", detection.name, detection.code);

            // Step 3: Translate into each target language
            let fan_out = translate_all(
                self.translator.as_ref(),
                self.registry,
                text.as_str(),
                &detection.code,
                &request.targets,
                self.config.translate.max_targets,
            )
            .await;

            // Step 4: Speech, with the supported set queried once
            let supported = if request.synthesize {
                self.synthesizer
                    .supported_languages()
                    .await
                    .map_err(|e| {
                        warn!("Could not list speech languages: {}", e);
                        e.to_string()
                    })
            } else {
                Ok(HashSet::new())
            };

            let mut targets = Vec::with_capacity(fan_out.outcomes.len());
            for translation in fan_out.outcomes {
                let speech = match &supported {
                    Ok(codes) => {
                        synthesize_if_requested(
                            &translation,
                            request.synthesize,
                            codes,
                            self.synthesizer.as_ref(),
                        )
                        .await
                    }
                    Err(message) if translation.is_success() => {
                        translation.target_code().map(|code| SynthesisOutcome::Failure {
                            target_code: code.to_string(),
                            error: message.clone(),
                        })
                    }
                    Err(_) => None,
                };
                targets.push(TargetReport { translation, speech });
            }

            let succeeded = targets.iter().filter(|t| t.translation.is_success()).count();
            info!("Completed {}/{} translations", succeeded, targets.len());

            Ok::<_, RequestError>(Report {
                request_id,
                generated_at: Utc::now(),
                detection,
                truncation: fan_out.truncation,
                targets,
            })
        }
        .instrument(span)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::fast::LinguaClassifier;
    use crate::detect::{
        Confidence, MockRankedClassifier, MockRemoteDetector, MockScoredClassifier, RankedCandidate,
        RemoteDetection,
    };
    use crate::error::{DetectionError, InputError, RelayError, TargetError};
    use crate::speech::{AudioArtifact, MockSpeechSynthesizer};
    use crate::translate::{MockTranslator, TranslationOutcome};

    fn ranked(code: &'static str) -> MockRankedClassifier {
        let mut fast = MockRankedClassifier::new();
        fast.expect_rank().returning(move |_| {
            Ok(vec![RankedCandidate {
                code: code.to_string(),
                probability: Some(0.9),
            }])
        });
        fast
    }

    fn workflow(
        fast: Arc<dyn crate::detect::RankedClassifier>,
        remote: MockRemoteDetector,
        translator: MockTranslator,
        synthesizer: MockSpeechSynthesizer,
    ) -> Workflow {
        let identifier = LanguageIdentifier::new(fast, Arc::new(MockScoredClassifier::new()), Arc::new(remote));
        Workflow::with_backends(Config::default(), identifier, Arc::new(translator), Box::new(synthesizer))
    }

    fn request(text: &str, strategy: DetectionStrategy, targets: &[&str], synthesize: bool) -> TranslationRequest {
        TranslationRequest {
            source: TextSource::Direct(text.to_string()),
            strategy,
            targets: targets.iter().map(|t| t.to_string()).collect(),
            synthesize,
        }
    }

    #[tokio::test]
    async fn test_blank_text_stops_before_detection() {
        let mut remote = MockRemoteDetector::new();
        remote.expect_detect().never();
        let mut translator = MockTranslator::new();
        translator.expect_translate().never();

        let wf = workflow(Arc::new(MockRankedClassifier::new()), remote, translator, MockSpeechSynthesizer::new());
        let err = wf
            .run(&request("  \n ", DetectionStrategy::Auto, &["English"], false))
            .await
            .unwrap_err();

        assert!(matches!(err, RequestError::Input(InputError::Empty)));
    }

    #[tokio::test]
    async fn test_french_text_translated_to_english() {
        let mut translator = MockTranslator::new();
        translator
            .expect_translate()
            .withf(|_, source, target| source == "fr" && target == "en")
            .times(1)
            .returning(|_, _, _| Ok("Hello everyone!".into()));

        let wf = workflow(
            Arc::new(LinguaClassifier::new()),
            MockRemoteDetector::new(),
            translator,
            MockSpeechSynthesizer::new(),
        );
        let report = wf
            .run(&request("Bonjour tout le monde!", DetectionStrategy::Fast, &["English"], false))
            .await
            .unwrap();

        assert_eq!(report.detection.code, "fr");
        assert_eq!(report.detection.name, "French");
        assert!(report.detection.score.value().unwrap() > 0.0);
        assert!(report.truncation.is_none());
        assert_eq!(report.targets.len(), 1);
        match &report.targets[0].translation {
            TranslationOutcome::Success { target_code, text, .. } => {
                assert_eq!(target_code, "en");
                assert!(text.to_lowercase().contains("hello"));
            }
            other => panic!("expected success, got {:?}", other),
        }
        assert!(report.targets[0].speech.is_none());
    }

    #[tokio::test]
    async fn test_four_targets_keep_first_three() {
        let mut translator = MockTranslator::new();
        translator
            .expect_translate()
            .times(3)
            .returning(|_, _, target| Ok(format!("<{}>", target)));

        let wf = workflow(Arc::new(ranked("en")), MockRemoteDetector::new(), translator, MockSpeechSynthesizer::new());
        let report = wf
            .run(&request(
                "Good morning",
                DetectionStrategy::Fast,
                &["French", "Spanish", "German", "Italian"],
                false,
            ))
            .await
            .unwrap();

        let codes: Vec<_> = report
            .targets
            .iter()
            .map(|t| t.translation.target_code().unwrap().to_string())
            .collect();
        assert_eq!(codes, ["fr", "es", "de"]);

        let truncation = report.truncation.unwrap();
        assert_eq!(truncation.requested, 4);
        assert_eq!(truncation.dropped, ["Italian"]);
    }

    #[tokio::test]
    async fn test_configured_limit_cannot_exceed_three() {
        let mut translator = MockTranslator::new();
        translator
            .expect_translate()
            .times(3)
            .returning(|_, _, target| Ok(format!("<{}>", target)));

        let mut config = Config::default();
        config.translate.max_targets = 5;
        let identifier = LanguageIdentifier::new(
            Arc::new(ranked("en")),
            Arc::new(MockScoredClassifier::new()),
            Arc::new(MockRemoteDetector::new()),
        );
        let wf = Workflow::with_backends(
            config,
            identifier,
            Arc::new(translator),
            Box::new(MockSpeechSynthesizer::new()),
        );

        let report = wf
            .run(&request(
                "Good morning",
                DetectionStrategy::Fast,
                &["French", "Spanish", "German", "Italian", "Hindi"],
                false,
            ))
            .await
            .unwrap();

        assert_eq!(report.targets.len(), 3);
        let truncation = report.truncation.unwrap();
        assert_eq!(truncation.requested, 5);
        assert_eq!(truncation.dropped, ["Italian", "Hindi"]);
    }

    #[tokio::test]
    async fn test_failing_target_does_not_affect_others() {
        let mut translator = MockTranslator::new();
        translator
            .expect_translate()
            .withf(|_, _, target| target == "ja")
            .returning(|_, _, _| Err(RelayError::Translation("model unavailable".into())));
        translator
            .expect_translate()
            .withf(|_, _, target| target == "ko")
            .returning(|_, _, _| Ok("안녕하세요".into()));

        let wf = workflow(Arc::new(ranked("en")), MockRemoteDetector::new(), translator, MockSpeechSynthesizer::new());
        let report = wf
            .run(&request("Hello", DetectionStrategy::Fast, &["Japanese", "Korean"], false))
            .await
            .unwrap();

        assert!(matches!(
            &report.targets[0].translation,
            TranslationOutcome::Failure { error: TargetError::Translation(_), .. }
        ));
        assert!(report.targets[1].translation.is_success());
    }

    #[tokio::test]
    async fn test_speech_gated_by_supported_set() {
        let mut translator = MockTranslator::new();
        translator
            .expect_translate()
            .returning(|_, _, target| Ok(format!("text in {}", target)));

        let mut synthesizer = MockSpeechSynthesizer::new();
        synthesizer
            .expect_supported_languages()
            .times(1)
            .returning(|| Ok(["es".to_string()].into_iter().collect()));
        synthesizer
            .expect_synthesize()
            .withf(|_, language| language == "es")
            .times(1)
            .returning(|_, _| AudioArtifact::from_bytes(b"RIFF", "wav"));

        let wf = workflow(Arc::new(ranked("en")), MockRemoteDetector::new(), translator, synthesizer);
        let report = wf
            .run(&request("Hello", DetectionStrategy::Fast, &["Spanish", "Urdu"], true))
            .await
            .unwrap();

        assert!(matches!(report.targets[0].speech, Some(SynthesisOutcome::Audio { .. })));
        assert!(matches!(
            report.targets[1].speech,
            Some(SynthesisOutcome::Unsupported { ref target_code }) if target_code == "ur"
        ));
    }

    #[tokio::test]
    async fn test_supported_set_failure_marks_each_success() {
        let mut translator = MockTranslator::new();
        translator
            .expect_translate()
            .withf(|_, _, target| target == "de")
            .returning(|_, _, _| Ok("Hallo".into()));
        translator
            .expect_translate()
            .withf(|_, _, target| target == "it")
            .returning(|_, _, _| Err(RelayError::Translation("timeout".into())));

        let mut synthesizer = MockSpeechSynthesizer::new();
        synthesizer
            .expect_supported_languages()
            .returning(|| Err(RelayError::Synthesis("espeak-ng not found".into())));
        synthesizer.expect_synthesize().never();

        let wf = workflow(Arc::new(ranked("en")), MockRemoteDetector::new(), translator, synthesizer);
        let report = wf
            .run(&request("Hello", DetectionStrategy::Fast, &["German", "Italian"], true))
            .await
            .unwrap();

        match &report.targets[0].speech {
            Some(SynthesisOutcome::Failure { target_code, error }) => {
                assert_eq!(target_code, "de");
                assert!(error.contains("espeak-ng not found"));
            }
            other => panic!("expected failure notice, got {:?}", other),
        }
        assert!(report.targets[1].speech.is_none());
    }

    #[tokio::test]
    async fn test_undetermined_language_stops_request() {
        let mut remote = MockRemoteDetector::new();
        remote.expect_detect().returning(|_| Ok(RemoteDetection::default()));
        let mut translator = MockTranslator::new();
        translator.expect_translate().never();

        let wf = workflow(Arc::new(MockRankedClassifier::new()), remote, translator, MockSpeechSynthesizer::new());
        let err = wf
            .run(&request("zzzz", DetectionStrategy::Auto, &["English"], false))
            .await
            .unwrap_err();

        assert!(matches!(err, RequestError::Detection(DetectionError::Undetermined)));
    }

    #[tokio::test]
    async fn test_detect_reports_unregistered_code_raw() {
        let mut remote = MockRemoteDetector::new();
        remote.expect_detect().returning(|_| {
            Ok(RemoteDetection {
                language: Some("sw".into()),
                confidence: Some(0.42),
            })
        });

        let wf = workflow(
            Arc::new(MockRankedClassifier::new()),
            remote,
            MockTranslator::new(),
            MockSpeechSynthesizer::new(),
        );
        let detection = wf
            .detect(&TextSource::Direct("Habari yako".into()), DetectionStrategy::Auto)
            .await
            .unwrap();

        assert_eq!(detection.code, "sw");
        assert_eq!(detection.name, "sw");
        assert_eq!(detection.score, Confidence::Known(0.42));
    }
}
