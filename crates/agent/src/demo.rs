//! The one-shot library demos behind `chatloop demo`.

use chatloop_core::message::Message;
use chatloop_core::prompt::{ChatPrompt, PromptTemplate};
use chatloop_core::provider::{Provider, ProviderRequest};
use chatloop_core::session::SessionRegistry;
use chatloop_memory::BufferMemory;
use std::collections::HashMap;
use std::fmt;
use std::io::Write;
use std::str::FromStr;
use std::sync::Arc;
use tracing::info;

use crate::chain::{LlmChain, SequentialChain};
use crate::chat::ChatLoop;
use crate::tool_agent::ToolAgent;
use crate::usage::UsageTracker;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Demo {
    Simple,
    Template,
    Chain,
    Agent,
    Memory,
}

impl Demo {
    pub const ALL: [Demo; 5] = [
        Demo::Simple,
        Demo::Template,
        Demo::Chain,
        Demo::Agent,
        Demo::Memory,
    ];

    pub fn number(self) -> usize {
        match self {
            Demo::Simple => 1,
            Demo::Template => 2,
            Demo::Chain => 3,
            Demo::Agent => 4,
            Demo::Memory => 5,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Demo::Simple => "Simple LLM Call",
            Demo::Template => "Using a Prompt Template",
            Demo::Chain => "Using a Chain",
            Demo::Agent => "Using an Agent with Tools",
            Demo::Memory => "Using Memory for Conversation",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Demo::Simple => "simple",
            Demo::Template => "template",
            Demo::Chain => "chain",
            Demo::Agent => "agent",
            Demo::Memory => "memory",
        }
    }
}

impl fmt::Display for Demo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Demo {
    type Err = String;

    /// Accepts the demo name or its number.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_lowercase();
        Demo::ALL
            .into_iter()
            .find(|d| d.name() == s || d.number().to_string() == s)
            .ok_or_else(|| {
                let names: Vec<_> = Demo::ALL.iter().map(|d| d.name()).collect();
                format!("unknown demo '{s}' (expected one of: {})", names.join(", "))
            })
    }
}

/// Runs demos against one provider and model.
pub struct DemoRunner {
    provider: Arc<dyn Provider>,
    model: String,
}

impl DemoRunner {
    pub fn new(provider: Arc<dyn Provider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
        }
    }

    /// Run every demo in order, a blank line between them.
    pub async fn run_all<W: Write>(
        &self,
        registry: &mut SessionRegistry,
        out: &mut W,
    ) -> chatloop_core::Result<()> {
        for (i, demo) in Demo::ALL.into_iter().enumerate() {
            if i > 0 {
                writeln!(out)?;
            }
            self.run(demo, registry, out).await?;
        }
        Ok(())
    }

    pub async fn run<W: Write>(
        &self,
        demo: Demo,
        registry: &mut SessionRegistry,
        out: &mut W,
    ) -> chatloop_core::Result<()> {
        info!(demo = %demo, "Running demo");
        writeln!(out, "=== Example {}: {} ===", demo.number(), demo.title())?;
        match demo {
            Demo::Simple => self.simple_call(out).await,
            Demo::Template => self.prompt_template(out).await,
            Demo::Chain => self.chain(out).await,
            Demo::Agent => self.agent_with_tools(out).await,
            Demo::Memory => self.memory(registry, out).await,
        }
    }

    async fn simple_call<W: Write>(&self, out: &mut W) -> chatloop_core::Result<()> {
        let request = ProviderRequest::new(
            &self.model,
            vec![Message::user("Explain quantum computing in one sentence.")],
            0.0,
        );
        let response = self.provider.complete(request).await?;
        writeln!(out, "LLM Response: {}", response.message.content.trim())?;
        Ok(())
    }

    async fn prompt_template<W: Write>(&self, out: &mut W) -> chatloop_core::Result<()> {
        let template = PromptTemplate::new("Write a {adjective} poem about {subject}.")?;
        let vars = HashMap::from([
            ("adjective".to_string(), "funny".to_string()),
            ("subject".to_string(), "programming".to_string()),
        ]);

        let chain = LlmChain::new(
            self.provider.clone(),
            &self.model,
            0.7,
            ChatPrompt::new().human(template.clone()),
        );
        let response = chain.run(&vars).await?;

        writeln!(out, "Generated Prompt: {}", template.format(&vars)?)?;
        writeln!(out, "LLM Response: {response}")?;
        Ok(())
    }

    async fn chain<W: Write>(&self, out: &mut W) -> chatloop_core::Result<()> {
        let names = LlmChain::new(
            self.provider.clone(),
            &self.model,
            0.7,
            ChatPrompt::new().human(PromptTemplate::new(
                "Generate 3 names for a {animal} character in a children's book.",
            )?),
        )
        .with_output_key("names");
        let story = LlmChain::new(
            self.provider.clone(),
            &self.model,
            0.7,
            ChatPrompt::new().human(PromptTemplate::new(
                "Select the best name from these options and create a short story \
                 about this character: {names}",
            )?),
        )
        .with_output_key("story");

        let pipeline = SequentialChain::new(vec![names, story], &["animal"])?;
        let result = pipeline
            .run(HashMap::from([("animal".to_string(), "dolphin".to_string())]))
            .await?;
        writeln!(out, "Chain Result: {result}")?;
        Ok(())
    }

    async fn agent_with_tools<W: Write>(&self, out: &mut W) -> chatloop_core::Result<()> {
        let usage = Arc::new(UsageTracker::new());
        let agent = ToolAgent::new(
            self.provider.clone(),
            &self.model,
            0.0,
            Arc::new(chatloop_tools::default_registry()),
        )
        .with_usage(usage.clone());

        let answer = agent.run("What is 25.5 + 10.8?").await?;
        writeln!(out, "Agent Response: {answer}")?;
        writeln!(out, "Total Tokens: {}", usage.total_tokens())?;
        Ok(())
    }

    async fn memory<W: Write>(
        &self,
        registry: &mut SessionRegistry,
        out: &mut W,
    ) -> chatloop_core::Result<()> {
        let prompt = ChatPrompt::new()
            .system("You are a helpful assistant.")
            .history()
            .human(PromptTemplate::new("{input}")?);
        let chat = ChatLoop::new(
            self.provider.clone(),
            &self.model,
            0.7,
            prompt,
            Box::new(BufferMemory),
        )
        .with_session("foo");

        let session = registry.get_or_create(chat.session_id());
        for question in [
            "Hi, my name is Bob. What's your name?",
            "What did I just tell you my name was?",
            "Tell me about yourself.",
        ] {
            let reply = chat.respond(session, question).await?;
            writeln!(out, "AI: {reply}")?;
        }
        Ok(())
    }
}
