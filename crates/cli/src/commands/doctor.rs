//! `chatloop doctor`: check configuration and provider reachability.

use chatloop_config::AppConfig;
use chatloop_core::provider::Provider;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    println!("🩺 chatloop doctor");
    println!("==================\n");

    let mut issues = 0;

    let config_path = AppConfig::config_dir().join("config.toml");
    if config_path.exists() {
        println!("  ✅ Config file found at {}", config_path.display());
    } else {
        println!("  ℹ️  No config file, using defaults (`chatloop config init` writes one)");
    }

    let config = match AppConfig::load() {
        Ok(config) => {
            println!("  ✅ Config valid");
            config
        }
        Err(e) => {
            println!("  ❌ Config invalid: {e}");
            println!("\n  ⚠️  1 issue(s) found. See above for details.");
            return Ok(());
        }
    };

    match chatloop_providers::build_from_config(&config) {
        Ok(provider) => {
            println!("  ✅ API key configured");
            match provider.health_check().await {
                Ok(true) => {
                    println!("  ✅ Provider reachable at {}", provider.base_url());
                    let models = provider.list_models().await.unwrap_or_default();
                    for model in [&config.default_model, &config.memory.summary_model] {
                        if models.is_empty() || models.contains(model) {
                            println!("  ✅ Model {model}");
                        } else {
                            println!("  ⚠️  Model {model} not offered by the provider");
                            issues += 1;
                        }
                    }
                }
                Ok(false) | Err(_) => {
                    println!("  ❌ Provider not reachable at {}", provider.base_url());
                    issues += 1;
                }
            }
        }
        Err(_) => {
            println!("  ⚠️  No API key configured (set CHATLOOP_API_KEY or OPENAI_API_KEY)");
            issues += 1;
        }
    }

    println!();
    if issues == 0 {
        println!("  🎉 All checks passed!");
    } else {
        println!("  ⚠️  {issues} issue(s) found. See above for details.");
    }

    Ok(())
}
