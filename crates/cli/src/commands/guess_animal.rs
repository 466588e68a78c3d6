//! `chatloop guess-animal`: the bot asks yes/no questions until it guesses.

use chatloop_agent::{ChatLoop, StopCondition, SummaryDisplay};
use chatloop_core::prompt::{ChatPrompt, PromptTemplate};
use chatloop_core::session::SessionRegistry;

const SYSTEM_PROMPT: &str = "You are an animal-guessing bot. Ask yes/no questions to identify \
the animal the user has in mind. When you're sure, propose an answer.";

const TEMPERATURE: f32 = 0.3;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let (config, provider) = super::connect()?;

    let memory = super::summary_memory(&config, provider.clone());
    let prompt = ChatPrompt::new()
        .system(SYSTEM_PROMPT)
        .history()
        .human(PromptTemplate::new("{input}")?)
        .assistant("Ask your next question.");

    let mut chat = ChatLoop::new(
        provider,
        &config.default_model,
        TEMPERATURE,
        prompt,
        Box::new(memory),
    )
    .with_max_tokens(config.default_max_tokens)
    .with_session("game")
    .with_stop_condition(StopCondition::new("yes", "Yay! 🎉"))
    .with_summary_display(SummaryDisplay::Inline)
    .with_lowercase_turns(true)
    .with_echo(super::echo_input());

    println!("Think of an animal. I'll try to guess it!");

    let mut registry = SessionRegistry::new();
    chat.run(&mut registry, &mut super::stdin_reader(), &mut std::io::stdout())
        .await?;
    Ok(())
}
