//! chatloop CLI: the main entry point.
//!
//! Commands:
//! - `chat`         : free-form chat with a running summary
//! - `guess-animal` : the bot asks yes/no questions until it guesses
//! - `guess-song`   : the bot names songs from lyric fragments
//! - `demo`         : one-shot library demos
//! - `config`       : show or create the configuration file
//! - `doctor`       : check configuration and provider reachability

use chatloop_agent::Demo;
use clap::{Parser, Subcommand, ValueEnum};

mod commands;

#[derive(Parser)]
#[command(
    name = "chatloop",
    about = "chatloop: terminal chat games over an OpenAI-compatible API",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging (written to stderr)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Chat freely; older turns are folded into a running summary
    Chat,

    /// Think of an animal and let the bot guess it
    GuessAnimal,

    /// Give lyric fragments and let the bot guess the song
    GuessSong {
        /// Initial model temperature (non-positive values use 0.05)
        #[arg(long, allow_negative_numbers = true)]
        temp: Option<f32>,

        /// Remember earlier fragments (asked interactively when omitted)
        #[arg(long, value_enum)]
        memory: Option<MemorySwitch>,
    },

    /// Run a library demo, or all of them when no name is given
    Demo {
        /// simple, template, chain, agent or memory (or 1-5)
        name: Option<Demo>,
    },

    /// Check configuration, API key and provider reachability
    Doctor,

    /// Configuration file management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum MemorySwitch {
    On,
    Off,
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration (API key redacted)
    Show,
    /// Print the config file path
    Path,
    /// Write a default config file if none exists
    Init,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // stdout carries the transcript; logs go to stderr
    let filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    match cli.command {
        Commands::Chat => commands::chat::run().await?,
        Commands::GuessAnimal => commands::guess_animal::run().await?,
        Commands::GuessSong { temp, memory } => {
            commands::guess_song::run(temp, memory.map(|m| m == MemorySwitch::On)).await?
        }
        Commands::Demo { name } => commands::demo::run(name).await?,
        Commands::Doctor => commands::doctor::run().await?,
        Commands::Config { action } => match action {
            ConfigAction::Show => commands::config_cmd::show()?,
            ConfigAction::Path => commands::config_cmd::path(),
            ConfigAction::Init => commands::config_cmd::init()?,
        },
    }

    Ok(())
}
