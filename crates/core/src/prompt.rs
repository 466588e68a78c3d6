//! Prompt templates.
//!
//! [`PromptTemplate`] substitutes `{name}` placeholders; `{{` and `}}` stand
//! for literal braces. [`ChatPrompt`] lays out a request: fixed role
//! messages, the memory placeholder, and the templated human turn.

use std::collections::HashMap;

use crate::error::PromptError;
use crate::message::Message;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Variable(String),
}

/// A `{name}` string template, parsed once at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    source: String,
    segments: Vec<Segment>,
}

impl PromptTemplate {
    pub fn new(template: impl Into<String>) -> Result<Self, PromptError> {
        let source = template.into();
        let segments = parse(&source)?;
        Ok(Self { source, segments })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Placeholder names in order of first appearance.
    pub fn variables(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for segment in &self.segments {
            if let Segment::Variable(name) = segment {
                if !names.contains(&name.as_str()) {
                    names.push(name.as_str());
                }
            }
        }
        names
    }

    /// Substitute every placeholder. Extra entries in `vars` are ignored.
    pub fn format(&self, vars: &HashMap<String, String>) -> Result<String, PromptError> {
        let mut out = String::with_capacity(self.source.len());
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Variable(name) => {
                    let value = vars
                        .get(name)
                        .ok_or_else(|| PromptError::MissingVariable(name.clone()))?;
                    out.push_str(value);
                }
            }
        }
        Ok(out)
    }
}

fn parse(source: &str) -> Result<Vec<Segment>, PromptError> {
    let mut segments = Vec::new();
    let mut literal = String::new();
    let mut chars = source.char_indices().peekable();

    while let Some((pos, c)) = chars.next() {
        match c {
            '{' if matches!(chars.peek(), Some((_, '{'))) => {
                chars.next();
                literal.push('{');
            }
            '}' if matches!(chars.peek(), Some((_, '}'))) => {
                chars.next();
                literal.push('}');
            }
            '{' => {
                let mut name = String::new();
                let mut closed = false;
                for (_, n) in chars.by_ref() {
                    if n == '}' {
                        closed = true;
                        break;
                    }
                    name.push(n);
                }
                if !closed {
                    return Err(PromptError::UnclosedBrace(pos));
                }
                if !literal.is_empty() {
                    segments.push(Segment::Literal(std::mem::take(&mut literal)));
                }
                segments.push(Segment::Variable(name.trim().to_string()));
            }
            other => literal.push(other),
        }
    }

    if !literal.is_empty() {
        segments.push(Segment::Literal(literal));
    }
    Ok(segments)
}

/// One slot in a [`ChatPrompt`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptPart {
    System(String),
    /// Where the memory context (summary + raw turns) goes
    History,
    Human(PromptTemplate),
    Assistant(String),
}

/// An ordered chat prompt.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChatPrompt {
    parts: Vec<PromptPart>,
}

impl ChatPrompt {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn system(mut self, text: impl Into<String>) -> Self {
        self.parts.push(PromptPart::System(text.into()));
        self
    }

    pub fn history(mut self) -> Self {
        self.parts.push(PromptPart::History);
        self
    }

    pub fn human(mut self, template: PromptTemplate) -> Self {
        self.parts.push(PromptPart::Human(template));
        self
    }

    pub fn assistant(mut self, text: impl Into<String>) -> Self {
        self.parts.push(PromptPart::Assistant(text.into()));
        self
    }

    pub fn parts(&self) -> &[PromptPart] {
        &self.parts
    }

    /// Produce the request messages. `history` is spliced in at the
    /// [`PromptPart::History`] slot and dropped if the prompt has none.
    pub fn render(
        &self,
        history: &[Message],
        vars: &HashMap<String, String>,
    ) -> Result<Vec<Message>, PromptError> {
        let mut messages = Vec::with_capacity(self.parts.len() + history.len());
        for part in &self.parts {
            match part {
                PromptPart::System(text) => messages.push(Message::system(text.clone())),
                PromptPart::History => messages.extend(history.iter().cloned()),
                PromptPart::Human(template) => messages.push(Message::user(template.format(vars)?)),
                PromptPart::Assistant(text) => messages.push(Message::assistant(text.clone())),
            }
        }
        Ok(messages)
    }
}
