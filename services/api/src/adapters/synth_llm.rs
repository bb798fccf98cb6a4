//! services/api/src/adapters/synth_llm.rs
//!
//! This module contains the adapters for delegated answer synthesis.
//! They implement the `AnswerSynthesizer` port from the `core` crate.

const SYSTEM_INSTRUCTIONS: &str = r#"You are the assistant inside a team knowledge workspace.

You receive a list of the documents in the workspace (title, format, owner, last update) and a question from a team member.

Your role:
- Answer the question in a few sentences, in a calm and professional tone.
- When your answer relies on a document, mention its title EXACTLY as it is written in the list, wrapped in double quotes.
- Do not invent documents that are not in the list.
- Do not use markdown headings, bullet lists or links. Plain prose only."#;

const USER_INPUT_TEMPLATE: &str = r#"WORKSPACE DOCUMENTS:
---
{context}
---

QUESTION:
{question}"#;

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::chat::{
        ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;
use regex::Regex;
use tracing::{debug, warn};
use workspace_query_core::{AnswerSynthesizer, PortError, PortResult};

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `AnswerSynthesizer` using an OpenAI-compatible LLM.
#[derive(Clone)]
pub struct OpenAiSynthesizerAdapter {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiSynthesizerAdapter {
    /// Creates a new `OpenAiSynthesizerAdapter`.
    pub fn new(client: Client<OpenAIConfig>, model: String) -> Self {
        Self { client, model }
    }
}

/// Strips markdown link citations and formatting lines the model sometimes adds anyway.
pub fn clean_answer(text: &str) -> PortResult<String> {
    // Markdown citations like ([site.com](https://site.com)) or [site](https://site.com)
    let citation_regex = Regex::new(r"\(?\[[^\]]*\]\([^)]*\)\)?")
        .map_err(|e| PortError::Unexpected(e.to_string()))?;
    let without_citations = citation_regex.replace_all(text, "");

    let lines: Vec<&str> = without_citations
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .collect();

    Ok(lines.join(" ").trim().to_string())
}

//=========================================================================================
// `AnswerSynthesizer` Trait Implementation
//=========================================================================================

#[async_trait]
impl AnswerSynthesizer for OpenAiSynthesizerAdapter {
    /// Answers a question about the workspace, given a flattened document list as context.
    async fn synthesize(&self, query: &str, context: &str) -> PortResult<String> {
        debug!("Delegating synthesis to model {}", self.model);

        let user_input = USER_INPUT_TEMPLATE
            .replace("{context}", context)
            .replace("{question}", query);

        let messages = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(SYSTEM_INSTRUCTIONS)
                .build()
                .map_err(|e| PortError::Unexpected(e.to_string()))?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(user_input)
                .build()
                .map_err(|e| PortError::Unexpected(e.to_string()))?
                .into(),
        ];

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .n(1)
            .build()
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        // Network, auth and quota failures all mean the synthesizer is unavailable.
        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e: OpenAIError| PortError::Unavailable(e.to_string()))?;

        let content = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| {
                PortError::Unexpected("Synthesis LLM response contained no text content.".to_string())
            })?;

        clean_answer(&content)
    }
}

//=========================================================================================
// Fallback When No Credential Is Configured
//=========================================================================================

/// Stands in for the delegated synthesizer when it cannot be constructed.
///
/// Every call fails with `PortError::Unavailable`, so `ask` reports the problem
/// to the caller instead of the service refusing to start.
#[derive(Clone, Debug)]
pub struct UnavailableSynthesizer {
    reason: String,
}

impl UnavailableSynthesizer {
    pub fn new(reason: impl Into<String>) -> Self {
        let reason = reason.into();
        warn!("Answer synthesizer disabled: {}", reason);
        Self { reason }
    }
}

#[async_trait]
impl AnswerSynthesizer for UnavailableSynthesizer {
    async fn synthesize(&self, _query: &str, _context: &str) -> PortResult<String> {
        Err(PortError::Unavailable(self.reason.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn markdown_citations_and_headings_are_removed() {
        let raw = "## Answer\nThe plan lives in \"Product Roadmap 2024\" ([docs.example](https://docs.example/roadmap)).\n\nAsk Alex Rivera for details.";
        let cleaned = clean_answer(raw).unwrap();
        assert_eq!(
            cleaned,
            "The plan lives in \"Product Roadmap 2024\" . Ask Alex Rivera for details."
        );
    }

    #[test]
    fn plain_prose_is_untouched() {
        let raw = "According to \"Schema Definition\", the tables are normalized.";
        assert_eq!(clean_answer(raw).unwrap(), raw);
    }

    #[tokio::test]
    async fn unavailable_synthesizer_always_fails() {
        let synthesizer = UnavailableSynthesizer::new("OPENAI_API_KEY is not set");
        let err = synthesizer.synthesize("q", "ctx").await.unwrap_err();
        assert!(matches!(err, PortError::Unavailable(reason) if reason.contains("OPENAI_API_KEY")));
    }
}
