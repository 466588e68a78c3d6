//! `chatloop guess-song`: the bot names songs from lyric fragments.

use chatloop_agent::ChatLoop;
use chatloop_core::error::PromptError;
use chatloop_core::memory::ConversationMemory;
use chatloop_core::prompt::{ChatPrompt, PromptTemplate};
use chatloop_core::provider::Provider;
use chatloop_core::session::SessionRegistry;
use chatloop_memory::{BufferMemory, NoopMemory};
use std::io::Write;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

const DEFAULT_TEMPERATURE: f32 = 0.05;

const STATELESS_PROMPT: &str = "You are a music expert. Given a short fragment of song lyrics \
or a description, guess the song title and artist in one concise line.";

const STATEFUL_PROMPT: &str = "You are a music expert playing a guessing game with the user. \
Use what we already discussed to improve future guesses.";

/// `--temp`, falling back to the default when absent or not positive.
pub fn initial_temperature(arg: Option<f32>) -> f32 {
    match arg {
        Some(t) if t > 0.0 => t.min(2.0),
        _ => DEFAULT_TEMPERATURE,
    }
}

/// `Some(true)` for "on", `Some(false)` for "off", case-insensitive.
pub fn parse_memory_choice(answer: &str) -> Option<bool> {
    match answer.trim().to_lowercase().as_str() {
        "on" => Some(true),
        "off" => Some(false),
        _ => None,
    }
}

/// Ask once whether memory should be on. Anything unrecognised means on.
async fn ask_memory<R, W>(input: &mut R, out: &mut W, echo: bool) -> std::io::Result<bool>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    write!(out, "Enable memory? (on/off) > ")?;
    out.flush()?;

    let mut answer = String::new();
    let read = input.read_line(&mut answer).await?;
    if echo || read == 0 {
        writeln!(out, "{}", answer.trim_end())?;
    }

    match parse_memory_choice(&answer) {
        Some(on) => Ok(on),
        None => {
            writeln!(out, "default to on.")?;
            Ok(true)
        }
    }
}

fn build_chat(
    provider: Arc<dyn Provider>,
    model: &str,
    temperature: f32,
    memory_on: bool,
) -> Result<ChatLoop, PromptError> {
    let human = PromptTemplate::new("{fragment}")?;
    let (prompt, memory): (ChatPrompt, Box<dyn ConversationMemory>) = if memory_on {
        (
            ChatPrompt::new().system(STATEFUL_PROMPT).history().human(human),
            Box::new(BufferMemory),
        )
    } else {
        (
            ChatPrompt::new().system(STATELESS_PROMPT).human(human),
            Box::new(NoopMemory),
        )
    };

    Ok(ChatLoop::new(provider, model, temperature, prompt, memory)
        .with_input_key("fragment")
        .with_session("game")
        .with_temp_command(true)
        .with_farewell("Bye."))
}

pub async fn run(temp: Option<f32>, memory: Option<bool>) -> Result<(), Box<dyn std::error::Error>> {
    let (config, provider) = super::connect()?;
    let temperature = initial_temperature(temp);
    let echo = super::echo_input();

    let mut input = super::stdin_reader();
    let mut out = std::io::stdout();

    let memory_on = match memory {
        Some(on) => on,
        None => ask_memory(&mut input, &mut out, echo).await?,
    };
    tracing::info!(memory_on, temperature, "Starting song game");

    let mut chat = build_chat(provider, &config.default_model, temperature, memory_on)?
        .with_max_tokens(config.default_max_tokens)
        .with_echo(echo);

    println!("🎵  Guess the Song  –  type 'exit' to quit.");
    println!("Commands:  temp <value>\n");

    let mut registry = SessionRegistry::new();
    chat.run(&mut registry, &mut input, &mut out).await?;
    Ok(())
}
