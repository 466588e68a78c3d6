//! `chatloop demo`: the one-shot library demos.

use chatloop_agent::{Demo, DemoRunner};
use chatloop_core::session::SessionRegistry;

pub async fn run(name: Option<Demo>) -> Result<(), Box<dyn std::error::Error>> {
    let (config, provider) = super::connect()?;

    let runner = DemoRunner::new(provider, &config.default_model);
    let mut registry = SessionRegistry::new();
    let mut out = std::io::stdout();

    match name {
        Some(demo) => runner.run(demo, &mut registry, &mut out).await?,
        None => runner.run_all(&mut registry, &mut out).await?,
    }
    Ok(())
}
