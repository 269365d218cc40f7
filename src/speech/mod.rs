// Speech synthesis for translated text
//
// - Commands: espeak-ng command line builder
// - Espeak: SpeechSynthesizer backed by espeak-ng
//
// Synthesis is optional and best effort: an unsupported language or a
// failing backend turns into a notice for that one target.

pub mod commands;
pub mod espeak;

use async_trait::async_trait;
use serde::{Serialize, Serializer};
use serde::ser::SerializeStruct;
use std::collections::HashSet;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::{Builder, TempPath};
use tracing::{info, warn};

pub use commands::*;
use crate::config::SpeechConfig;
use crate::error::{Result, RelayError};
use crate::translate::TranslationOutcome;

#[derive(Debug)]
enum Location {
    Temporary(TempPath),
    Kept(PathBuf),
}

impl Location {
    fn path(&self) -> &Path {
        match self {
            Self::Temporary(path) => path,
            Self::Kept(path) => path,
        }
    }
}

/// Generated audio, usually held in a temporary file.
///
/// The file is complete and closed once an artifact exists. A temporary
/// file is removed when the artifact is dropped unless it was persisted.
#[derive(Debug)]
pub struct AudioArtifact {
    location: Location,
    format: String,
    size_bytes: u64,
}

impl AudioArtifact {
    /// Wrap a temp file that a backend has finished writing
    pub fn from_temp_path(path: TempPath, format: &str) -> Result<Self> {
        let size_bytes = std::fs::metadata(&path)?.len();
        if size_bytes == 0 {
            return Err(RelayError::Synthesis(format!("{} is empty", path.display())));
        }

        Ok(Self {
            location: Location::Temporary(path),
            format: format.to_string(),
            size_bytes,
        })
    }

    /// Write audio bytes to a new temp file
    pub fn from_bytes(bytes: &[u8], format: &str) -> Result<Self> {
        let mut file = Builder::new()
            .prefix("langrelay-")
            .suffix(&format!(".{}", format))
            .tempfile()?;
        file.write_all(bytes)?;
        file.flush()?;

        Self::from_temp_path(file.into_temp_path(), format)
    }

    pub fn path(&self) -> &Path {
        self.location.path()
    }

    pub fn format(&self) -> &str {
        &self.format
    }

    pub fn size_bytes(&self) -> u64 {
        self.size_bytes
    }

    pub fn is_temporary(&self) -> bool {
        matches!(self.location, Location::Temporary(_))
    }

    pub fn read(&self) -> Result<Vec<u8>> {
        Ok(std::fs::read(self.path())?)
    }

    /// Keep the audio at `destination`
    pub fn persist<P: AsRef<Path>>(self, destination: P) -> Result<Self> {
        let destination = destination.as_ref().to_path_buf();

        match self.location {
            Location::Temporary(path) => {
                if let Err(e) = path.persist(&destination) {
                    // rename fails across filesystems
                    std::fs::copy(&e.path, &destination)?;
                }
            }
            Location::Kept(path) => {
                std::fs::copy(&path, &destination)?;
            }
        }

        Ok(Self {
            location: Location::Kept(destination),
            format: self.format,
            size_bytes: self.size_bytes,
        })
    }
}

impl Serialize for AudioArtifact {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("AudioArtifact", 3)?;
        state.serialize_field("path", &self.path().display().to_string())?;
        state.serialize_field("format", &self.format)?;
        state.serialize_field("size_bytes", &self.size_bytes)?;
        state.end()
    }
}

/// Result of synthesizing one translation
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SynthesisOutcome {
    Audio {
        target_code: String,
        artifact: AudioArtifact,
    },
    Unsupported {
        target_code: String,
    },
    Failure {
        target_code: String,
        error: String,
    },
}

impl SynthesisOutcome {
    pub fn target_code(&self) -> &str {
        match self {
            Self::Audio { target_code, .. }
            | Self::Unsupported { target_code }
            | Self::Failure { target_code, .. } => target_code,
        }
    }
}

/// Main trait for speech synthesis
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Language codes the backend can speak
    async fn supported_languages(&self) -> Result<HashSet<String>>;

    /// Speak `text` in `language` into an audio artifact
    async fn synthesize(&self, text: &str, language: &str) -> Result<AudioArtifact>;
}

/// Factory for creating synthesizer instances
pub struct SynthesizerFactory;

impl SynthesizerFactory {
    /// Create the default synthesizer (espeak-ng)
    pub fn create_synthesizer(config: SpeechConfig) -> Box<dyn SpeechSynthesizer> {
        Box::new(espeak::EspeakSynthesizer::new(config))
    }
}

/// Synthesize a translation when asked to.
///
/// Returns `None` when synthesis was not requested or the translation
/// failed. Never returns an error: problems become `Unsupported` or
/// `Failure` for this target only.
pub async fn synthesize_if_requested(
    outcome: &TranslationOutcome,
    requested: bool,
    supported_codes: &HashSet<String>,
    synthesizer: &dyn SpeechSynthesizer,
) -> Option<SynthesisOutcome> {
    if !requested {
        return None;
    }

    let TranslationOutcome::Success { target_code, text, .. } = outcome else {
        return None;
    };

    if !supported_codes.contains(target_code) {
        info!("Speech is not available for '{}'", target_code);
        return Some(SynthesisOutcome::Unsupported {
            target_code: target_code.clone(),
        });
    }

    match synthesizer.synthesize(text, target_code).await {
        Ok(artifact) => {
            info!("Generated {} bytes of {} audio for '{}'", artifact.size_bytes(), artifact.format(), target_code);
            Some(SynthesisOutcome::Audio {
                target_code: target_code.clone(),
                artifact,
            })
        }
        Err(e) => {
            warn!("Speech synthesis failed for '{}': {}", target_code, e);
            Some(SynthesisOutcome::Failure {
                target_code: target_code.clone(),
                error: e.to_string(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TargetError;

    fn success(code: &str, text: &str) -> TranslationOutcome {
        TranslationOutcome::Success {
            target_name: code.to_string(),
            target_code: code.to_string(),
            text: text.to_string(),
        }
    }

    fn supported(codes: &[&str]) -> HashSet<String> {
        codes.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn test_not_requested_produces_nothing() {
        let synthesizer = MockSpeechSynthesizer::new();
        let outcome = tokio_test::block_on(synthesize_if_requested(
            &success("en", "Hello"),
            false,
            &supported(&["en"]),
            &synthesizer,
        ));
        assert!(outcome.is_none());
    }

    #[test]
    fn test_failed_translation_is_skipped() {
        let synthesizer = MockSpeechSynthesizer::new();
        let failed = TranslationOutcome::Failure {
            target_name: "Hindi".into(),
            target_code: Some("hi".into()),
            error: TargetError::Translation("timeout".into()),
        };

        let outcome = tokio_test::block_on(synthesize_if_requested(
            &failed,
            true,
            &supported(&["hi"]),
            &synthesizer,
        ));
        assert!(outcome.is_none());
    }

    #[tokio::test]
    async fn test_unsupported_code_is_unsupported_not_failure() {
        let mut synthesizer = MockSpeechSynthesizer::new();
        synthesizer.expect_synthesize().never();

        let outcome =
            synthesize_if_requested(&success("ur", "سلام"), true, &supported(&["en"]), &synthesizer).await;
        assert!(matches!(
            outcome,
            Some(SynthesisOutcome::Unsupported { ref target_code }) if target_code == "ur"
        ));
    }

    #[tokio::test]
    async fn test_audio_artifact_is_readable() {
        let mut synthesizer = MockSpeechSynthesizer::new();
        synthesizer
            .expect_synthesize()
            .withf(|text, language| text == "Hola" && language == "es")
            .returning(|_, _| AudioArtifact::from_bytes(b"RIFF....WAVE", "wav"));

        let outcome =
            synthesize_if_requested(&success("es", "Hola"), true, &supported(&["es"]), &synthesizer).await;

        match outcome {
            Some(SynthesisOutcome::Audio { target_code, artifact }) => {
                assert_eq!(target_code, "es");
                assert_eq!(artifact.read().unwrap(), b"RIFF....WAVE");
                assert_eq!(artifact.size_bytes(), 12);
                assert!(artifact.path().exists());
            }
            other => panic!("expected audio, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_backend_error_becomes_failure() {
        let mut synthesizer = MockSpeechSynthesizer::new();
        synthesizer
            .expect_synthesize()
            .returning(|_, _| Err(RelayError::Synthesis("voice crashed".into())));

        let outcome =
            synthesize_if_requested(&success("fr", "Salut"), true, &supported(&["fr"]), &synthesizer).await;

        match outcome {
            Some(SynthesisOutcome::Failure { target_code, error }) => {
                assert_eq!(target_code, "fr");
                assert!(error.contains("voice crashed"));
            }
            other => panic!("expected failure, got {:?}", other),
        }
    }

    #[test]
    fn test_artifact_removed_on_drop_and_kept_when_persisted() {
        let artifact = AudioArtifact::from_bytes(b"abc", "wav").unwrap();
        let temp = artifact.path().to_path_buf();
        drop(artifact);
        assert!(!temp.exists());

        let dir = tempfile::TempDir::new().unwrap();
        let artifact = AudioArtifact::from_bytes(b"abc", "wav").unwrap();
        let temp = artifact.path().to_path_buf();
        let kept = artifact.persist(dir.path().join("kept.wav")).unwrap();

        assert!(!kept.is_temporary());
        assert_eq!(kept.path(), dir.path().join("kept.wav"));
        assert_eq!(kept.read().unwrap(), b"abc");
        drop(kept);
        assert!(dir.path().join("kept.wav").exists());
        assert!(!temp.exists());
    }

    #[test]
    fn test_empty_audio_is_rejected() {
        assert!(AudioArtifact::from_bytes(b"", "wav").is_err());
    }
}
