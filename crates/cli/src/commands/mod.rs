//! Subcommand implementations and the setup they share.

pub mod chat;
pub mod config_cmd;
pub mod demo;
pub mod doctor;
pub mod guess_animal;
pub mod guess_song;

use chatloop_config::{API_KEY_VARS, AppConfig};
use chatloop_core::provider::Provider;
use chatloop_memory::{LlmSummarizer, SummaryBufferMemory};
use std::io::IsTerminal;
use std::sync::Arc;
use tokio::io::{BufReader, Stdin};

/// Load the configuration and build the provider.
///
/// Without an API key this prints setup guidance and fails before any
/// provider exists, so the process exits with status 1.
pub fn connect() -> Result<(AppConfig, Arc<dyn Provider>), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    if !config.has_api_key() {
        eprintln!();
        eprintln!("  ERROR: No API key configured!");
        eprintln!();
        eprintln!("  Set one of these environment variables:");
        for var in API_KEY_VARS {
            eprintln!("    export {var}='sk-...'");
        }
        eprintln!();
        eprintln!("  Or add `api_key = \"sk-...\"` to your config file:");
        eprintln!("    {}", AppConfig::config_dir().join("config.toml").display());
        eprintln!();
        return Err("No API key found. See above for setup instructions.".into());
    }

    let provider = chatloop_providers::build_from_config(&config)?;
    tracing::debug!(base_url = %provider.base_url(), model = %config.default_model, "Provider ready");
    let provider: Arc<dyn Provider> = Arc::new(provider);
    Ok((config, provider))
}

/// The rolling summary buffer, summarizing with the configured summary model.
pub fn summary_memory(config: &AppConfig, provider: Arc<dyn Provider>) -> SummaryBufferMemory {
    let summarizer = LlmSummarizer::new(
        provider,
        &config.memory.summary_model,
        config.memory.summary_temperature,
    );
    SummaryBufferMemory::new(Arc::new(summarizer), config.memory.max_token_limit)
}

pub fn stdin_reader() -> BufReader<Stdin> {
    BufReader::new(tokio::io::stdin())
}

/// Piped input is echoed so stdout reads as a transcript.
pub fn echo_input() -> bool {
    !std::io::stdin().is_terminal()
}
