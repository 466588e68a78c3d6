//! The interactive conversation loop.
//!
//! One line in, one reply out. Each user line is rendered through the chat
//! prompt together with the memory context of the loop's session, sent to the
//! provider, printed, and recorded. The loop ends on `exit`/`quit`, end of
//! input, Ctrl-C, or when the configured stop condition matches a reply.
//! Nothing is printed after `exit`/`quit` unless a farewell is configured.

use chatloop_core::memory::ConversationMemory;
use chatloop_core::prompt::ChatPrompt;
use chatloop_core::provider::{Provider, ProviderRequest};
use chatloop_core::session::{Session, SessionId, SessionRegistry};
use std::collections::HashMap;
use std::io::Write;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{debug, info};

/// Width of the rule printed under the running summary.
const RULE_WIDTH: usize = 40;

/// Why [`ChatLoop::run`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopExit {
    /// The user typed `exit` or `quit`
    Quit,
    /// Input closed (Ctrl-D or end of a piped script)
    EndOfInput,
    /// Ctrl-C while waiting for input
    Interrupted,
    /// A reply matched the stop condition
    Stopped,
}

/// How the running summary is shown on each exchange.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SummaryDisplay {
    /// Not shown
    #[default]
    Hidden,
    /// A `[Summary so far]` block after the reply, closed by a rule
    Block,
    /// One `Summary>` line before the reply
    Inline,
}

/// Ends the loop when a reply contains `needle` (literal, case-sensitive).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StopCondition {
    pub needle: String,
    /// Printed once the condition fires
    pub message: String,
}

impl StopCondition {
    pub fn new(needle: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            needle: needle.into(),
            message: message.into(),
        }
    }

    pub fn matches(&self, reply: &str) -> bool {
        reply.contains(&self.needle)
    }
}

/// What one input line asks for.
#[derive(Debug, Clone, PartialEq)]
enum Command<'a> {
    Skip,
    Exit,
    /// `temp <value>`; `None` when the value is missing or out of range
    Temperature(Option<f32>),
    Say(&'a str),
}

fn parse_line(line: &str, temp_command: bool) -> Command<'_> {
    let text = line.trim();
    if text.is_empty() {
        return Command::Skip;
    }

    let lower = text.to_lowercase();
    if lower == "exit" || lower == "quit" {
        return Command::Exit;
    }
    if temp_command && lower.starts_with("temp ") {
        return Command::Temperature(parse_temperature(&lower["temp ".len()..]));
    }
    Command::Say(text)
}

/// Parse the first word of a `temp` argument as a temperature in `0.0..=2.0`.
pub fn parse_temperature(arg: &str) -> Option<f32> {
    let value: f32 = arg.split_whitespace().next()?.parse().ok()?;
    (0.0..=2.0).contains(&value).then_some(value)
}

/// A configured conversation loop.
pub struct ChatLoop {
    provider: Arc<dyn Provider>,
    model: String,
    temperature: f32,
    max_tokens: Option<u32>,
    prompt: ChatPrompt,
    /// Template variable the user's line is bound to
    input_key: String,
    memory: Box<dyn ConversationMemory>,
    session_id: SessionId,
    temp_command: bool,
    summary_display: SummaryDisplay,
    stop: Option<StopCondition>,
    farewell: Option<String>,
    lowercase_turns: bool,
    echo: bool,
}

impl ChatLoop {
    pub fn new(
        provider: Arc<dyn Provider>,
        model: impl Into<String>,
        temperature: f32,
        prompt: ChatPrompt,
        memory: Box<dyn ConversationMemory>,
    ) -> Self {
        Self {
            provider,
            model: model.into(),
            temperature,
            max_tokens: None,
            prompt,
            input_key: "input".into(),
            memory,
            session_id: SessionId::from("game"),
            temp_command: false,
            summary_display: SummaryDisplay::Hidden,
            stop: None,
            farewell: None,
            lowercase_turns: false,
            echo: false,
        }
    }

    pub fn with_max_tokens(mut self, max: Option<u32>) -> Self {
        self.max_tokens = max;
        self
    }

    pub fn with_input_key(mut self, key: impl Into<String>) -> Self {
        self.input_key = key.into();
        self
    }

    pub fn with_session(mut self, id: impl Into<SessionId>) -> Self {
        self.session_id = id.into();
        self
    }

    /// Accept `temp <value>` lines.
    pub fn with_temp_command(mut self, enabled: bool) -> Self {
        self.temp_command = enabled;
        self
    }

    /// Show the running summary on every exchange.
    pub fn with_summary_display(mut self, display: SummaryDisplay) -> Self {
        self.summary_display = display;
        self
    }

    pub fn with_stop_condition(mut self, stop: StopCondition) -> Self {
        self.stop = Some(stop);
        self
    }

    /// Line printed when the user leaves. End of input and Ctrl-C print it
    /// after a newline.
    pub fn with_farewell(mut self, farewell: impl Into<String>) -> Self {
        self.farewell = Some(farewell.into());
        self
    }

    /// Record the user's side of each exchange lowercased. The request still
    /// carries the line as typed.
    pub fn with_lowercase_turns(mut self, enabled: bool) -> Self {
        self.lowercase_turns = enabled;
        self
    }

    /// Repeat each input line after the prompt. Used when stdin is not a
    /// terminal so the output reads as a transcript.
    pub fn with_echo(mut self, enabled: bool) -> Self {
        self.echo = enabled;
        self
    }

    pub fn temperature(&self) -> f32 {
        self.temperature
    }

    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    pub fn memory(&self) -> &dyn ConversationMemory {
        self.memory.as_ref()
    }

    /// Generate a reply to `text` in `session` and record the exchange.
    pub async fn respond(&self, session: &mut Session, text: &str) -> chatloop_core::Result<String> {
        let history = self.memory.context(session).to_messages();
        let vars = HashMap::from([(self.input_key.clone(), text.to_string())]);
        let messages = self.prompt.render(&history, &vars)?;

        let mut request = ProviderRequest::new(&self.model, messages, self.temperature);
        request.max_tokens = self.max_tokens;

        debug!(
            session_id = %session.id(),
            messages = request.messages.len(),
            temperature = self.temperature,
            "Requesting reply"
        );
        let response = self.provider.complete(request).await?;
        let reply = response.message.content;

        if self.lowercase_turns {
            self.memory.record(session, &text.to_lowercase(), &reply).await?;
        } else {
            self.memory.record(session, text, &reply).await?;
        }
        Ok(reply)
    }

    /// Drive the loop until the user leaves or the stop condition fires.
    ///
    /// Generation and summarization failures end the loop with an error.
    pub async fn run<R, W>(
        &mut self,
        registry: &mut SessionRegistry,
        input: &mut R,
        output: &mut W,
    ) -> chatloop_core::Result<LoopExit>
    where
        R: AsyncBufRead + Unpin,
        W: Write,
    {
        info!(
            session_id = %self.session_id,
            memory = self.memory.name(),
            model = %self.model,
            "Starting conversation loop"
        );

        let mut line = String::new();
        loop {
            write!(output, "You > ")?;
            output.flush()?;

            line.clear();
            let read = tokio::select! {
                read = input.read_line(&mut line) => Some(read?),
                _ = tokio::signal::ctrl_c() => None,
            };

            let exit = match read {
                None => Some(LoopExit::Interrupted),
                Some(0) => Some(LoopExit::EndOfInput),
                Some(_) => None,
            };
            if let Some(exit) = exit {
                writeln!(output)?;
                if let Some(farewell) = &self.farewell {
                    writeln!(output, "{farewell}")?;
                }
                return Ok(exit);
            }

            if self.echo {
                writeln!(output, "{}", line.trim_end_matches(['\r', '\n']))?;
            }

            let text = match parse_line(&line, self.temp_command) {
                Command::Skip => continue,
                Command::Exit => {
                    if let Some(farewell) = &self.farewell {
                        writeln!(output, "{farewell}")?;
                    }
                    return Ok(LoopExit::Quit);
                }
                Command::Temperature(Some(value)) => {
                    self.temperature = value;
                    writeln!(output, "[Temperature set to {value:?}]")?;
                    continue;
                }
                Command::Temperature(None) => {
                    writeln!(output, "Usage: temp 0.3")?;
                    continue;
                }
                Command::Say(text) => text.to_string(),
            };

            let session = registry.get_or_create(&self.session_id);
            let reply = self.respond(session, &text).await?;

            if self.summary_display == SummaryDisplay::Inline {
                writeln!(output, "Summary>  {}", session.summary().unwrap_or_default())?;
            }
            writeln!(output, "Bot > {reply}")?;
            if self.summary_display == SummaryDisplay::Block {
                writeln!(output, "\n[Summary so far]")?;
                writeln!(
                    output,
                    "{}",
                    session.summary().unwrap_or("(nothing summarised yet)")
                )?;
                writeln!(output, "{}", "-".repeat(RULE_WIDTH))?;
            }

            if let Some(stop) = &self.stop
                && stop.matches(&reply)
            {
                writeln!(output, "{}", stop.message)?;
                return Ok(LoopExit::Stopped);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{SequentialMockProvider, make_text_response};
    use chatloop_core::error::ProviderError;
    use chatloop_core::memory::Summarizer;
    use chatloop_core::message::{Message, Role};
    use chatloop_core::prompt::PromptTemplate;
    use chatloop_memory::{BufferMemory, NoopMemory, SummaryBufferMemory};

    fn human_prompt() -> ChatPrompt {
        ChatPrompt::new()
            .system("You are a test bot.")
            .history()
            .human(PromptTemplate::new("{input}").unwrap())
    }

    fn chat_loop(provider: Arc<SequentialMockProvider>, memory: Box<dyn ConversationMemory>) -> ChatLoop {
        ChatLoop::new(provider, "mock-model", 0.7, human_prompt(), memory).with_echo(true)
    }

    async fn drive(chat: &mut ChatLoop, registry: &mut SessionRegistry, script: &str) -> (LoopExit, String) {
        let mut input = script.as_bytes();
        let mut output = Vec::new();
        let exit = chat.run(registry, &mut input, &mut output).await.unwrap();
        (exit, String::from_utf8(output).unwrap())
    }

    #[test]
    fn parses_exit_case_insensitively() {
        assert_eq!(parse_line("exit\n", false), Command::Exit);
        assert_eq!(parse_line("  QUIT ", false), Command::Exit);
        assert_eq!(parse_line("Exit", false), Command::Exit);
        assert_eq!(parse_line("exit now", false), Command::Say("exit now"));
        assert_eq!(parse_line("quitting", false), Command::Say("quitting"));
        assert_eq!(parse_line("   \n", false), Command::Skip);
    }

    #[test]
    fn parses_temperature_command() {
        assert_eq!(parse_line("temp 0.3", true), Command::Temperature(Some(0.3)));
        assert_eq!(parse_line("TEMP 1.5 please", true), Command::Temperature(Some(1.5)));
        assert_eq!(parse_line("temp hot", true), Command::Temperature(None));
        assert_eq!(parse_line("temp 3", true), Command::Temperature(None));
        assert_eq!(parse_line("temp -0.1", true), Command::Temperature(None));
        // disabled, or no argument: an ordinary message
        assert_eq!(parse_line("temp 0.3", false), Command::Say("temp 0.3"));
        assert_eq!(parse_line("temp", true), Command::Say("temp"));
    }

    #[test]
    fn stop_condition_is_literal_and_case_sensitive() {
        let stop = StopCondition::new("yes", "Yay!");
        assert!(stop.matches("Oh yes, it's a cat!"));
        assert!(stop.matches("eyes"));
        assert!(!stop.matches("Yes! A dog."));
        assert!(!stop.matches("Is it a bird?"));
    }

    #[tokio::test]
    async fn exit_makes_no_generation_call() {
        let provider = Arc::new(SequentialMockProvider::texts(&[]));
        let mut chat = chat_loop(provider.clone(), Box::new(NoopMemory));
        let mut registry = SessionRegistry::new();

        let (exit, out) = drive(&mut chat, &mut registry, "EXIT\nhello\n").await;

        assert_eq!(exit, LoopExit::Quit);
        assert_eq!(out, "You > EXIT\n");
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn exit_prints_nothing_further_by_default() {
        let provider = Arc::new(SequentialMockProvider::texts(&[]));
        let mut chat = ChatLoop::new(provider, "m", 0.7, human_prompt(), Box::new(NoopMemory));
        let mut registry = SessionRegistry::new();

        let (exit, out) = drive(&mut chat, &mut registry, "exit\n").await;

        assert_eq!(exit, LoopExit::Quit);
        assert_eq!(out, "You > ");
    }

    #[tokio::test]
    async fn farewell_is_printed_on_quit_and_end_of_input() {
        let provider = Arc::new(SequentialMockProvider::texts(&[]));
        let mut chat = chat_loop(provider, Box::new(NoopMemory)).with_farewell("Bye.");
        let mut registry = SessionRegistry::new();

        let (_, out) = drive(&mut chat, &mut registry, "quit\n").await;
        assert_eq!(out, "You > quit\nBye.\n");

        let (exit, out) = drive(&mut chat, &mut registry, "").await;
        assert_eq!(exit, LoopExit::EndOfInput);
        assert_eq!(out, "You > \nBye.\n");
    }

    #[tokio::test]
    async fn scripted_transcript() {
        let provider = Arc::new(SequentialMockProvider::texts(&["Hi there!", "Blue."]));
        let mut chat = chat_loop(provider.clone(), Box::new(NoopMemory));
        let mut registry = SessionRegistry::new();

        let (exit, out) = drive(
            &mut chat,
            &mut registry,
            "hello\n\nwhat colour is the sky?\nquit\n",
        )
        .await;

        assert_eq!(exit, LoopExit::Quit);
        assert_eq!(
            out,
            "You > hello\nBot > Hi there!\n\
             You > \n\
             You > what colour is the sky?\nBot > Blue.\n\
             You > quit\n"
        );
        assert_eq!(provider.call_count(), 2);
    }

    #[tokio::test]
    async fn end_of_input_ends_the_line() {
        let provider = Arc::new(SequentialMockProvider::texts(&["ok"]));
        let mut chat = chat_loop(provider, Box::new(NoopMemory));
        let mut registry = SessionRegistry::new();

        let (exit, out) = drive(&mut chat, &mut registry, "hi").await;

        assert_eq!(exit, LoopExit::EndOfInput);
        assert_eq!(out, "You > hi\nBot > ok\nYou > \n");
    }

    #[tokio::test]
    async fn stateless_memory_sends_only_the_current_line() {
        let provider = Arc::new(SequentialMockProvider::texts(&["a", "b"]));
        let mut chat = chat_loop(provider.clone(), Box::new(NoopMemory));
        let mut registry = SessionRegistry::new();

        drive(&mut chat, &mut registry, "one\ntwo\n").await;

        let second = &provider.requests()[1];
        assert_eq!(second.messages.len(), 2);
        assert_eq!(second.messages[0].role, Role::System);
        assert_eq!(second.messages[1].content, "two");
    }

    #[tokio::test]
    async fn buffer_memory_sends_history_in_order() {
        let provider = Arc::new(SequentialMockProvider::texts(&["a", "b"]));
        let mut chat = chat_loop(provider.clone(), Box::new(BufferMemory));
        let mut registry = SessionRegistry::new();

        drive(&mut chat, &mut registry, "one\ntwo\n").await;

        let contents: Vec<_> = provider.requests()[1]
            .messages
            .iter()
            .map(|m| m.content.clone())
            .collect();
        assert_eq!(contents, vec!["You are a test bot.", "one", "a", "two"]);

        let session = registry.get(chat.session_id()).unwrap();
        assert_eq!(session.turns().len(), 4);
    }

    #[tokio::test]
    async fn temp_command_changes_temperature() {
        let provider = Arc::new(SequentialMockProvider::texts(&["guess"]));
        let mut chat = chat_loop(provider.clone(), Box::new(NoopMemory)).with_temp_command(true);
        let mut registry = SessionRegistry::new();

        let (_, out) = drive(&mut chat, &mut registry, "temp 1\ntemp warm\nla la la\n").await;

        assert!(out.contains("[Temperature set to 1.0]\n"));
        assert!(out.contains("Usage: temp 0.3\n"));
        assert_eq!(chat.temperature(), 1.0);
        assert_eq!(provider.requests()[0].temperature, 1.0);
    }

    #[tokio::test]
    async fn malformed_temp_keeps_previous_value() {
        let provider = Arc::new(SequentialMockProvider::texts(&[]));
        let mut chat = chat_loop(provider, Box::new(NoopMemory)).with_temp_command(true);
        let mut registry = SessionRegistry::new();

        drive(&mut chat, &mut registry, "temp 9\n").await;

        assert_eq!(chat.temperature(), 0.7);
    }

    #[tokio::test]
    async fn stop_condition_ends_the_loop() {
        let provider = Arc::new(SequentialMockProvider::texts(&[
            "Does it live in water?",
            "Then yes, it must be a dolphin!",
        ]));
        let mut chat = chat_loop(provider.clone(), Box::new(NoopMemory))
            .with_stop_condition(StopCondition::new("yes", "Yay! 🎉"));
        let mut registry = SessionRegistry::new();

        let (exit, out) = drive(&mut chat, &mut registry, "ready\nit swims\nstill here\n").await;

        assert_eq!(exit, LoopExit::Stopped);
        assert!(out.ends_with("Bot > Then yes, it must be a dolphin!\nYay! 🎉\n"));
        assert_eq!(provider.call_count(), 2);
    }

    #[tokio::test]
    async fn shows_placeholder_before_any_summary() {
        let provider = Arc::new(SequentialMockProvider::texts(&["hello"]));
        let mut chat = chat_loop(provider, Box::new(BufferMemory)).with_summary_display(SummaryDisplay::Block);
        let mut registry = SessionRegistry::new();

        let (_, out) = drive(&mut chat, &mut registry, "hi\n").await;

        let expected = format!(
            "Bot > hello\n\n[Summary so far]\n(nothing summarised yet)\n{}\n",
            "-".repeat(40)
        );
        assert!(out.contains(&expected));
    }

    struct FixedSummarizer;

    #[async_trait::async_trait]
    impl Summarizer for FixedSummarizer {
        async fn summarize(
            &self,
            _existing: Option<&str>,
            _turns: &[Message],
            _budget: usize,
        ) -> Result<String, ProviderError> {
            Ok("The user greeted the bot.".into())
        }
    }

    #[tokio::test]
    async fn summary_is_displayed_and_sent_first() {
        // 25 + 4 tokens: together with "hello" it overflows the limit of 30
        let long = "x".repeat(100);
        let provider = Arc::new(SequentialMockProvider::texts(&[&long, "fine"]));
        let memory = SummaryBufferMemory::new(Arc::new(FixedSummarizer), 30);
        let mut chat = chat_loop(provider.clone(), Box::new(memory)).with_summary_display(SummaryDisplay::Block);
        let mut registry = SessionRegistry::new();

        let (_, out) = drive(&mut chat, &mut registry, "hello\nhow are you\n").await;

        assert!(out.contains("[Summary so far]\nThe user greeted the bot.\n"));

        let second = &provider.requests()[1];
        assert_eq!(second.messages[1].role, Role::System);
        assert_eq!(second.messages[1].content, "The user greeted the bot.");
        assert_eq!(second.messages.last().unwrap().content, "how are you");
    }

    #[tokio::test]
    async fn inline_summary_precedes_each_reply() {
        let long = "x".repeat(100);
        let provider = Arc::new(SequentialMockProvider::texts(&[&long, "fine"]));
        let memory = SummaryBufferMemory::new(Arc::new(FixedSummarizer), 30);
        let mut chat =
            chat_loop(provider, Box::new(memory)).with_summary_display(SummaryDisplay::Inline);
        let mut registry = SessionRegistry::new();

        let (_, out) = drive(&mut chat, &mut registry, "hello\nhow are you\n").await;

        assert_eq!(
            out,
            format!(
                "You > hello\nSummary>  The user greeted the bot.\nBot > {long}\n\
                 You > how are you\nSummary>  The user greeted the bot.\nBot > fine\n\
                 You > \n"
            )
        );
        assert!(!out.contains("[Summary so far]"));
    }

    #[tokio::test]
    async fn inline_summary_is_blank_before_any_summary() {
        let provider = Arc::new(SequentialMockProvider::texts(&["Does it fly?"]));
        let mut chat = chat_loop(provider, Box::new(BufferMemory))
            .with_summary_display(SummaryDisplay::Inline);
        let mut registry = SessionRegistry::new();

        let (_, out) = drive(&mut chat, &mut registry, "ready\n").await;

        assert!(out.starts_with("You > ready\nSummary>  \nBot > Does it fly?\n"));
    }

    #[tokio::test]
    async fn lowercase_turns_are_recorded_but_sent_as_typed() {
        let provider = Arc::new(SequentialMockProvider::texts(&["Is it a mammal?", "A cat?"]));
        let mut chat = chat_loop(provider.clone(), Box::new(BufferMemory)).with_lowercase_turns(true);
        let mut registry = SessionRegistry::new();

        drive(&mut chat, &mut registry, "It Has FUR\nYes\n").await;

        let first = &provider.requests()[0];
        assert_eq!(first.messages.last().unwrap().content, "It Has FUR");
        let second = &provider.requests()[1];
        assert_eq!(second.messages[1].content, "it has fur");
        assert_eq!(second.messages.last().unwrap().content, "Yes");

        let session = registry.get(chat.session_id()).unwrap();
        assert_eq!(session.turns()[0].content, "it has fur");
        assert_eq!(session.turns()[2].content, "yes");
    }

    #[tokio::test]
    async fn provider_failure_propagates() {
        let provider = Arc::new(SequentialMockProvider::new(vec![
            Ok(make_text_response("first")),
            Err(ProviderError::Network("connection refused".into())),
        ]));
        let mut chat = chat_loop(provider, Box::new(NoopMemory));
        let mut registry = SessionRegistry::new();

        let mut input = "one\ntwo\nthree\n".as_bytes();
        let mut output = Vec::new();
        let err = chat.run(&mut registry, &mut input, &mut output).await.unwrap_err();

        assert!(matches!(err, chatloop_core::Error::Provider(ProviderError::Network(_))));
    }

    #[tokio::test]
    async fn custom_input_key_and_trailing_instruction() {
        let provider = Arc::new(SequentialMockProvider::texts(&["Is it a mammal?"]));
        let prompt = ChatPrompt::new()
            .system("Guess.")
            .history()
            .human(PromptTemplate::new("{fragment}").unwrap())
            .assistant("Ask your next question.");
        let mut chat = ChatLoop::new(provider.clone(), "m", 0.3, prompt, Box::new(NoopMemory))
            .with_input_key("fragment");
        let mut registry = SessionRegistry::new();

        let (_, out) = drive(&mut chat, &mut registry, "ready\n").await;

        // no echo configured
        assert!(out.starts_with("You > Bot > Is it a mammal?\n"));
        let messages = &provider.requests()[0].messages;
        assert_eq!(messages[1].content, "ready");
        assert_eq!(messages[2].role, Role::Assistant);
    }
}
