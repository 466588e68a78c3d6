//! Chat-completion providers for chatloop.
//!
//! All providers implement the `chatloop_core::Provider` trait.

pub mod openai_compat;

pub use openai_compat::OpenAiCompatProvider;

use chatloop_config::AppConfig;
use chatloop_core::error::ProviderError;

/// Build the provider described by the configuration.
///
/// Fails with `NotConfigured` when no API key is available.
pub fn build_from_config(config: &AppConfig) -> Result<OpenAiCompatProvider, ProviderError> {
    let api_key = config
        .api_key
        .as_deref()
        .ok_or_else(|| ProviderError::NotConfigured("no API key".into()))?;
    OpenAiCompatProvider::new("openai", &config.base_url, api_key)
}
