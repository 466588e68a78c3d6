//! `chatloop config`: configuration file management.

use chatloop_config::AppConfig;
use std::path::PathBuf;

fn config_path() -> PathBuf {
    AppConfig::config_dir().join("config.toml")
}

pub fn show() -> Result<(), Box<dyn std::error::Error>> {
    let mut config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    let key_status = if config.has_api_key() { "set" } else { "not set" };
    config.api_key = None;

    println!("# {}", config_path().display());
    println!("# api_key: {key_status}");
    println!("{}", toml::to_string_pretty(&config)?);
    Ok(())
}

pub fn path() {
    println!("{}", config_path().display());
}

pub fn init() -> Result<(), Box<dyn std::error::Error>> {
    let path = config_path();
    if path.exists() {
        println!("Config already exists at {}", path.display());
        return Ok(());
    }

    std::fs::create_dir_all(AppConfig::config_dir())?;
    std::fs::write(&path, AppConfig::default_toml())?;
    println!("Wrote default config to {}", path.display());
    Ok(())
}
