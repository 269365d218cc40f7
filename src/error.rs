use thiserror::Error;

#[derive(Error, Debug)]
pub enum RelayError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Language detection error: {0}")]
    Detection(String),

    #[error("Translation error: {0}")]
    Translation(String),

    #[error("Speech synthesis error: {0}")]
    Synthesis(String),

    #[error("Document extraction error: {0}")]
    Document(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
}

pub type Result<T> = std::result::Result<T, RelayError>;

/// The submitted text cannot be processed at all.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InputError {
    #[error("Please enter some text.")]
    Empty,
}

/// Detection failed; nothing downstream of it runs.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DetectionError {
    #[error("Could not determine source language")]
    Undetermined,

    #[error("Language detection failed: {0}")]
    Backend(String),
}

impl From<RelayError> for DetectionError {
    fn from(err: RelayError) -> Self {
        DetectionError::Backend(err.to_string())
    }
}

/// Failure scoped to a single target language.
#[derive(Error, Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(tag = "kind", content = "message", rename_all = "snake_case")]
pub enum TargetError {
    #[error("Unknown target language: {0}")]
    Resolution(String),

    #[error("Translation error: {0}")]
    Translation(String),
}

/// Errors that abort a whole request.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RequestError {
    #[error(transparent)]
    Input(#[from] InputError),

    #[error(transparent)]
    Detection(#[from] DetectionError),
}
