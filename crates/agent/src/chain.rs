//! Prompt chains: a prompt bound to a model, and a pipeline of them.

use chatloop_core::error::PromptError;
use chatloop_core::prompt::{ChatPrompt, PromptPart};
use chatloop_core::provider::{Provider, ProviderRequest};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

use crate::usage::UsageTracker;

/// One templated call to the model.
pub struct LlmChain {
    provider: Arc<dyn Provider>,
    model: String,
    temperature: f32,
    prompt: ChatPrompt,
    output_key: String,
    usage: Option<Arc<UsageTracker>>,
}

impl LlmChain {
    pub fn new(
        provider: Arc<dyn Provider>,
        model: impl Into<String>,
        temperature: f32,
        prompt: ChatPrompt,
    ) -> Self {
        Self {
            provider,
            model: model.into(),
            temperature,
            prompt,
            output_key: "text".into(),
            usage: None,
        }
    }

    /// Name the variable this chain's output is stored under in a
    /// [`SequentialChain`].
    pub fn with_output_key(mut self, key: impl Into<String>) -> Self {
        self.output_key = key.into();
        self
    }

    pub fn with_usage(mut self, usage: Arc<UsageTracker>) -> Self {
        self.usage = Some(usage);
        self
    }

    pub fn output_key(&self) -> &str {
        &self.output_key
    }

    /// Variables the human templates need, in order of first appearance.
    pub fn input_variables(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for part in self.prompt.parts() {
            if let PromptPart::Human(template) = part {
                for name in template.variables() {
                    if !names.contains(&name) {
                        names.push(name);
                    }
                }
            }
        }
        names
    }

    pub async fn run(&self, vars: &HashMap<String, String>) -> chatloop_core::Result<String> {
        let messages = self.prompt.render(&[], vars)?;
        let request = ProviderRequest::new(&self.model, messages, self.temperature);

        debug!(model = %self.model, output_key = %self.output_key, "Running chain");
        let response = self.provider.complete(request).await?;
        if let Some(usage) = &self.usage {
            usage.record(response.usage.as_ref());
        }
        Ok(response.message.content.trim().to_string())
    }
}

/// Chains run in order; each output is added to the variables under the
/// chain's output key, so later chains can reference it.
pub struct SequentialChain {
    chains: Vec<LlmChain>,
}

impl SequentialChain {
    /// Build the pipeline, checking that every chain's inputs are provided by
    /// `input_keys` or by an earlier chain's output.
    pub fn new(chains: Vec<LlmChain>, input_keys: &[&str]) -> Result<Self, PromptError> {
        let mut known: Vec<String> = input_keys.iter().map(|k| k.to_string()).collect();
        for chain in &chains {
            if let Some(missing) = chain
                .input_variables()
                .into_iter()
                .find(|name| !known.iter().any(|k| k.as_str() == *name))
            {
                return Err(PromptError::MissingVariable(missing.to_string()));
            }
            known.push(chain.output_key.clone());
        }
        Ok(Self { chains })
    }

    pub fn len(&self) -> usize {
        self.chains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chains.is_empty()
    }

    /// Run every chain and return the last output.
    pub async fn run(&self, inputs: HashMap<String, String>) -> chatloop_core::Result<String> {
        let mut vars = inputs;
        let mut last = String::new();
        for (step, chain) in self.chains.iter().enumerate() {
            debug!(step, "Sequential chain step");
            last = chain.run(&vars).await?;
            vars.insert(chain.output_key.clone(), last.clone());
        }
        Ok(last)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::SequentialMockProvider;
    use chatloop_core::prompt::PromptTemplate;

    fn human(template: &str) -> ChatPrompt {
        ChatPrompt::new().human(PromptTemplate::new(template).unwrap())
    }

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[tokio::test]
    async fn llm_chain_formats_and_calls() {
        let provider = Arc::new(SequentialMockProvider::texts(&["  Roses are red.  "]));
        let usage = Arc::new(UsageTracker::new());
        let chain = LlmChain::new(
            provider.clone(),
            "m",
            0.7,
            human("Write a {adjective} poem about {subject}."),
        )
        .with_usage(usage.clone());

        let out = chain
            .run(&vars(&[("adjective", "funny"), ("subject", "programming")]))
            .await
            .unwrap();

        assert_eq!(out, "Roses are red.");
        assert_eq!(
            provider.requests()[0].messages[0].content,
            "Write a funny poem about programming."
        );
        assert_eq!(usage.total_tokens(), 15);
    }

    #[tokio::test]
    async fn llm_chain_missing_variable() {
        let provider = Arc::new(SequentialMockProvider::texts(&[]));
        let chain = LlmChain::new(provider.clone(), "m", 0.0, human("About {topic}"));

        let err = chain.run(&HashMap::new()).await.unwrap_err();

        assert!(matches!(
            err,
            chatloop_core::Error::Prompt(PromptError::MissingVariable(ref v)) if v == "topic"
        ));
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn sequential_chain_feeds_outputs_forward() {
        let provider = Arc::new(SequentialMockProvider::texts(&[
            "Finn, Splash, Coral",
            "Splash the dolphin saved the reef.",
        ]));
        let names = LlmChain::new(
            provider.clone(),
            "m",
            0.7,
            human("Generate 3 names for a {animal} character in a children's book."),
        )
        .with_output_key("names");
        let story = LlmChain::new(
            provider.clone(),
            "m",
            0.7,
            human("Select the best name from these options and create a short story about this character: {names}"),
        );

        let pipeline = SequentialChain::new(vec![names, story], &["animal"]).unwrap();
        let out = pipeline.run(vars(&[("animal", "dolphin")])).await.unwrap();

        assert_eq!(out, "Splash the dolphin saved the reef.");
        let requests = provider.requests();
        assert!(requests[0].messages[0].content.contains("a dolphin character"));
        assert!(requests[1].messages[0].content.ends_with("character: Finn, Splash, Coral"));
    }

    #[test]
    fn sequential_chain_rejects_unbound_inputs() {
        let provider = Arc::new(SequentialMockProvider::texts(&[]));
        let story = LlmChain::new(provider, "m", 0.7, human("Story about {names}"));

        let err = SequentialChain::new(vec![story], &["animal"]).err().unwrap();

        assert_eq!(err, PromptError::MissingVariable("names".into()));
    }

    #[test]
    fn input_variables_are_deduplicated() {
        let provider = Arc::new(SequentialMockProvider::texts(&[]));
        let prompt = ChatPrompt::new()
            .system("Be brief.")
            .human(PromptTemplate::new("{a} and {b}").unwrap())
            .human(PromptTemplate::new("{b} then {c}").unwrap());
        let chain = LlmChain::new(provider, "m", 0.0, prompt);

        assert_eq!(chain.input_variables(), vec!["a", "b", "c"]);
    }
}
