use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;

use crate::document::TextSource;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Where the text comes from
#[derive(ClapArgs, Debug, Clone)]
pub struct InputArgs {
    /// Text to process
    #[arg(long, conflicts_with = "file", required_unless_present = "file")]
    pub text: Option<String>,

    /// Document to extract text from (.txt, .pdf, .docx)
    #[arg(short, long)]
    pub file: Option<PathBuf>,

    /// MIME type of the document, overriding its extension
    #[arg(long, requires = "file")]
    pub mime: Option<String>,
}

impl InputArgs {
    pub fn into_source(self) -> TextSource {
        match (self.text, self.file) {
            (_, Some(path)) => TextSource::Document {
                path,
                mime: self.mime,
            },
            (text, None) => TextSource::Direct(text.unwrap_or_default()),
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Detect the language of a text and translate it
    Translate {
        #[command(flatten)]
        input: InputArgs,

        /// Detection method: fast, robust or auto
        #[arg(short, long)]
        strategy: Option<String>,

        /// Target languages by name (comma-separated, at most three are used)
        #[arg(short, long)]
        targets: Option<String>,

        /// Also synthesize speech for each translation
        #[arg(long)]
        speak: bool,

        /// Directory to keep generated audio files in
        #[arg(long, requires = "speak")]
        audio_dir: Option<PathBuf>,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Detect the language of a text
    Detect {
        #[command(flatten)]
        input: InputArgs,

        /// Detection method: fast, robust or auto
        #[arg(short, long)]
        strategy: Option<String>,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the languages that can be selected as targets
    Languages,

    /// Write the default configuration to a file
    InitConfig {
        /// Output file
        #[arg(short, long, default_value = "config.toml")]
        output: PathBuf,
    },
}
