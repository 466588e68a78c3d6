//! `chatloop chat`: free-form chat with a running summary.

use chatloop_agent::{ChatLoop, SummaryDisplay};
use chatloop_core::prompt::{ChatPrompt, PromptTemplate};
use chatloop_core::session::SessionRegistry;

const SYSTEM_PROMPT: &str = "The following is a friendly conversation between a human and an AI. \
The AI is talkative and provides lots of specific details from its context. If the AI does \
not know the answer to a question, it truthfully says it does not know.";

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let (config, provider) = super::connect()?;

    let memory = super::summary_memory(&config, provider.clone());
    let prompt = ChatPrompt::new()
        .system(SYSTEM_PROMPT)
        .history()
        .human(PromptTemplate::new("{input}")?);

    let mut chat = ChatLoop::new(
        provider,
        &config.default_model,
        config.default_temperature,
        prompt,
        Box::new(memory),
    )
    .with_max_tokens(config.default_max_tokens)
    .with_session("chat")
    .with_summary_display(SummaryDisplay::Block)
    .with_echo(super::echo_input());

    println!("🤖  Chat – type 'exit' to quit");

    let mut registry = SessionRegistry::new();
    chat.run(&mut registry, &mut super::stdin_reader(), &mut std::io::stdout())
        .await?;
    Ok(())
}
