//! Langrelay - Language detection, translation and speech
//!
//! Detects the language of a text (typed or extracted from a document),
//! translates it into up to three target languages with LibreTranslate or
//! ollama, and optionally speaks each translation with espeak-ng.

pub mod cli;
pub mod config;
pub mod detect;
pub mod document;
pub mod error;
pub mod registry;
pub mod report;
pub mod speech;
pub mod translate;
pub mod workflow;
