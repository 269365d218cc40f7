use async_trait::async_trait;
use std::collections::HashSet;
use std::io::Write;
use tempfile::Builder;
use tracing::{debug, info};

use crate::config::SpeechConfig;
use crate::error::{Result, RelayError};
use crate::registry::LanguageRegistry;
use super::{AudioArtifact, SpeechCommandBuilder, SpeechSynthesizer};

/// Speech synthesis through the espeak-ng command
pub struct EspeakSynthesizer {
    config: SpeechConfig,
    command_builder: SpeechCommandBuilder,
}

impl EspeakSynthesizer {
    pub fn new(config: SpeechConfig) -> Self {
        let command_builder = SpeechCommandBuilder::new(&config.binary_path);

        Self {
            config,
            command_builder,
        }
    }

    /// espeak-ng voice for a registry code
    fn voice_for(&self, code: &str) -> String {
        self.config
            .voice_map
            .get(code)
            .cloned()
            .unwrap_or_else(|| code.to_string())
    }
}

#[async_trait]
impl SpeechSynthesizer for EspeakSynthesizer {
    async fn supported_languages(&self) -> Result<HashSet<String>> {
        let listing = self.command_builder.list_voices().execute().await?;
        let mut supported = parse_voice_list(&listing);

        // Registry codes that reach an installed voice through the voice map
        for (code, _) in LanguageRegistry::builtin().entries() {
            if supported.contains(&self.voice_for(code)) {
                supported.insert(code.to_string());
            }
        }

        debug!("espeak-ng supports {} languages", supported.len());
        Ok(supported)
    }

    async fn synthesize(&self, text: &str, language: &str) -> Result<AudioArtifact> {
        let voice = self.voice_for(language);
        info!("Synthesizing {} characters with voice '{}'", text.chars().count(), voice);

        let mut text_file = Builder::new().prefix("langrelay-").suffix(".txt").tempfile()?;
        text_file.write_all(text.as_bytes())?;
        text_file.flush()?;

        // Closed before espeak-ng writes to it; removed on drop
        let wav_path = Builder::new()
            .prefix("langrelay-")
            .suffix(".wav")
            .tempfile()?
            .into_temp_path();

        self.command_builder
            .synthesize(text_file.path(), &voice, self.config.words_per_minute, &wav_path)
            .execute()
            .await?;

        AudioArtifact::from_temp_path(wav_path, "wav")
            .map_err(|e| RelayError::Synthesis(format!("espeak-ng produced no audio: {}", e)))
    }
}

/// Language codes from `espeak-ng --voices`, including the "Other Languages" column
pub fn parse_voice_list(listing: &str) -> HashSet<String> {
    let mut languages = HashSet::new();

    for line in listing.lines().skip_while(|l| l.trim_start().starts_with("Pty")) {
        // Pty, Language, Age/Gender, VoiceName, File, Other Languages...
        let columns: Vec<&str> = line.split_whitespace().collect();
        let Some(language) = columns.get(1) else {
            continue;
        };
        languages.insert(language.to_lowercase());

        let other = columns.iter().skip(5).copied().collect::<Vec<_>>().join(" ");
        for alias in other.split('(').skip(1) {
            if let Some(language) = alias.split_whitespace().next() {
                languages.insert(language.trim_end_matches(')').to_lowercase());
            }
        }
    }

    languages
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    const VOICES: &str = "\
Pty Language       Age/Gender VoiceName          File                 Other Languages
 5  af              --/M      Afrikaans          gmw/af
 5  cmn             --/M      Chinese_(Mandarin) sit/cmn              (zh-cmn 5)(zh 5)
 2  en-gb           --/M      English_(Great_Britain) gmw/en          (en 2)
 5  fr-fr           --/M      French_(France)    roa/fr               (fr 5)
";

    #[test]
    fn test_parse_voice_list() {
        let languages = parse_voice_list(VOICES);

        for expected in ["af", "cmn", "zh", "zh-cmn", "en-gb", "en", "fr-fr", "fr"] {
            assert!(languages.contains(expected), "missing {}", expected);
        }
        assert!(!languages.contains("pty"));
        assert!(!languages.contains("language"));
    }

    #[test]
    fn test_voice_map_overrides_code() {
        let synthesizer = EspeakSynthesizer::new(SpeechConfig {
            binary_path: "espeak-ng".to_string(),
            words_per_minute: 160,
            voice_map: BTreeMap::from([("zh-cn".to_string(), "cmn".to_string())]),
        });

        assert_eq!(synthesizer.voice_for("zh-cn"), "cmn");
        assert_eq!(synthesizer.voice_for("fr"), "fr");
    }
}
