use std::path::Path;
use tokio::process::Command;
use tracing::debug;

use crate::error::{Result, RelayError};

/// Speech synthesizer command line
#[derive(Debug, Clone)]
pub struct SpeechCommand {
    pub binary_path: String,
    pub args: Vec<String>,
    pub description: String,
}

impl SpeechCommand {
    pub fn new<S1: Into<String>, S2: Into<String>>(binary_path: S1, description: S2) -> Self {
        Self {
            binary_path: binary_path.into(),
            args: Vec::new(),
            description: description.into(),
        }
    }

    pub fn arg<S: Into<String>>(mut self, arg: S) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Select voice
    pub fn voice<S: Into<String>>(self, voice: S) -> Self {
        self.arg("-v").arg(voice)
    }

    /// Speaking rate in words per minute
    pub fn speed(self, words_per_minute: u32) -> Self {
        self.arg("-s").arg(words_per_minute.to_string())
    }

    /// Read the text to speak from a file
    pub fn text_file<P: AsRef<Path>>(self, path: P) -> Self {
        self.arg("-f").arg(path.as_ref().to_string_lossy().to_string())
    }

    /// Write WAV output to a file instead of the speakers
    pub fn wav_output<P: AsRef<Path>>(self, path: P) -> Self {
        self.arg("-w").arg(path.as_ref().to_string_lossy().to_string())
    }

    /// Execute the command and return its stdout
    pub async fn execute(&self) -> Result<String> {
        debug!("Executing speech command: {} {:?}", self.binary_path, self.args);
        debug!("Description: {}", self.description);

        let output = Command::new(&self.binary_path)
            .args(&self.args)
            .output()
            .await
            .map_err(|e| RelayError::Synthesis(format!("Failed to execute {}: {}", self.binary_path, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(RelayError::Synthesis(format!(
                "{} failed: {}",
                self.description,
                stderr.trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// Builds espeak-ng command lines
#[derive(Debug, Clone)]
pub struct SpeechCommandBuilder {
    binary_path: String,
}

impl SpeechCommandBuilder {
    pub fn new<S: Into<String>>(binary_path: S) -> Self {
        Self {
            binary_path: binary_path.into(),
        }
    }

    /// List installed voices
    pub fn list_voices(&self) -> SpeechCommand {
        SpeechCommand::new(&self.binary_path, "List voices").arg("--voices")
    }

    /// Speak the contents of `text_path` into a WAV file
    pub fn synthesize<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        text_path: P,
        voice: &str,
        words_per_minute: u32,
        output_path: Q,
    ) -> SpeechCommand {
        SpeechCommand::new(&self.binary_path, format!("Synthesize speech ({})", voice))
            .voice(voice)
            .speed(words_per_minute)
            .wav_output(output_path)
            .text_file(text_path)
    }
}
