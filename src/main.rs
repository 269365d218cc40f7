//! Langrelay - Language detection, translation and speech
//!
//! Entry point for the command line: detects the language of a text,
//! translates it into the chosen target languages and optionally speaks
//! each translation.

use anyhow::Result;
use clap::Parser;
use std::path::{Path, PathBuf};
use tracing::{info, warn, Level};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use tracing_appender::{non_blocking, rolling};

use langrelay::cli::{Args, Commands};
use langrelay::config::Config;
use langrelay::detect::DetectionStrategy;
use langrelay::error::{RelayError, RequestError};
use langrelay::registry::LanguageRegistry;
use langrelay::report::{render_detection, render_text};
use langrelay::workflow::{TranslationRequest, Workflow};

const DEFAULT_AUDIO_DIR: &str = ".langrelay/audio";

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Setup logging to both console and file
    setup_logging(args.verbose)?;

    // Load configuration
    let config = match &args.config {
        Some(config_path) => Config::from_file(config_path)?,
        None => {
            if Path::new("config.toml").exists() {
                info!("Found config.toml in current directory, loading...");
                Config::from_file("config.toml")?
            } else {
                Config::default()
            }
        }
    };

    match args.command {
        Commands::Translate { input, strategy, targets, speak, audio_dir, json } => {
            let strategy = match strategy {
                Some(s) => parse_detection_strategy(&s)?,
                None => config.detection.strategy,
            };

            let targets = match targets {
                Some(list) => parse_target_list(&list),
                None => config.translate.default_targets.clone(),
            };

            let workflow = Workflow::new(config)?;
            if let Err(e) = workflow.check_translator().await {
                warn!("Translation service is not reachable: {}", e);
            }

            let request = TranslationRequest {
                source: input.into_source(),
                strategy,
                targets,
                synthesize: speak,
            };

            let mut report = match workflow.run(&request).await {
                Ok(report) => report,
                Err(e) => exit_with(e),
            };

            if speak {
                let dir = audio_dir.unwrap_or_else(|| PathBuf::from(DEFAULT_AUDIO_DIR));
                report.keep_audio(&dir);
            }

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print!("{}", render_text(&report));
            }
        }
        Commands::Detect { input, strategy, json } => {
            let strategy = match strategy {
                Some(s) => parse_detection_strategy(&s)?,
                None => config.detection.strategy,
            };

            let workflow = Workflow::new(config)?;
            let detection = match workflow.detect(&input.into_source(), strategy).await {
                Ok(detection) => detection,
                Err(e) => exit_with(e),
            };

            if json {
                println!("{}", serde_json::to_string_pretty(&detection)?);
            } else {
                print!("{}", render_detection(&detection));
            }
        }
        Commands::Languages => {
            println!("{:<20} {:<8}", "Language", "Code");
            println!("{}", "-".repeat(28));
            for (code, name) in LanguageRegistry::builtin().entries() {
                println!("{:<20} {:<8}", name, code);
            }
        }
        Commands::InitConfig { output } => {
            config.save_to_file(&output)?;
            println!("Configuration written to {}", output.display());
        }
    }

    Ok(())
}

/// Setup logging to both console and file
fn setup_logging(verbose: bool) -> Result<()> {
    let log_dir = std::env::current_dir()?.join(".langrelay").join("log");
    std::fs::create_dir_all(&log_dir)?;

    // Set up file appender with daily rotation
    let file_appender = rolling::daily(&log_dir, "langrelay.log");
    let (non_blocking_file, _guard) = non_blocking(file_appender);
    // Keep the guard alive for the duration of the program
    std::mem::forget(_guard);

    let log_level = if verbose { Level::DEBUG } else { Level::INFO };

    // Console output goes to stderr so stdout stays clean for reports
    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_file(verbose)
        .with_line_number(verbose);

    let file_layer = fmt::layer()
        .with_writer(non_blocking_file)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .with_ansi(false);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(log_level.into()))
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    info!("Logging initialized - console: {}, file: {}",
          log_level, log_dir.join("langrelay.log").display());

    Ok(())
}

/// Parse detection strategy from string
fn parse_detection_strategy(strategy: &str) -> Result<DetectionStrategy> {
    match strategy.to_lowercase().as_str() {
        "fast" => Ok(DetectionStrategy::Fast),
        "robust" => Ok(DetectionStrategy::Robust),
        "auto" => Ok(DetectionStrategy::Auto),
        _ => Err(RelayError::Config(format!(
            "Invalid detection strategy '{}'. Valid strategies: fast, robust, auto",
            strategy
        )).into()),
    }
}

fn parse_target_list(list: &str) -> Vec<String> {
    list.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Report a request-level error and stop
fn exit_with(error: RequestError) -> ! {
    match error {
        RequestError::Input(e) => {
            eprintln!("Warning: {}", e);
            std::process::exit(2);
        }
        RequestError::Detection(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}
