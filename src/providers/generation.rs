//! Answer generation over a chat-completions style endpoint.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::AnswerGenerator;
use crate::auth::ScopedToken;
use crate::config::GenerationConfig;
use crate::types::PipelineError;

const SYSTEM_PROMPT: &str = "You answer questions about financial filings using only the \
provided context. If the context does not contain the answer, say so.";

/// Chat-completions client honoring the configured model and sampling limits.
#[derive(Debug, Clone)]
pub struct ChatCompletionGenerator {
    client: Client,
    endpoint: String,
    token: String,
    config: GenerationConfig,
}

impl ChatCompletionGenerator {
    pub fn new(
        client: Client,
        base_url: impl Into<String>,
        token: &ScopedToken,
        config: GenerationConfig,
    ) -> Self {
        let base_url = base_url.into();
        Self {
            client,
            endpoint: format!("{}/chat/completions", base_url.trim_end_matches('/')),
            token: token.token.clone(),
            config,
        }
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: AssistantMessage,
}

#[derive(Deserialize)]
struct AssistantMessage {
    content: String,
}

#[async_trait]
impl AnswerGenerator for ChatCompletionGenerator {
    async fn generate(&self, question: &str, context: &str) -> Result<String, PipelineError> {
        let prompt = format!("Context:\n{context}\n\nQuestion: {question}");
        let body = ChatRequest {
            model: &self.config.model,
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: &prompt,
                },
            ],
        };

        let mut request = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.token)
            .json(&body);
        if let Some(timeout) = self.config.timeout {
            request = request.timeout(timeout);
        }

        let response = request
            .send()
            .await
            .map_err(|err| PipelineError::Generation(format!("generation request failed: {err}")))?;
        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(PipelineError::Generation(format!(
                "generation service returned {status}: {text}"
            )));
        }

        let parsed: ChatResponse = response.json().await.map_err(|err| {
            PipelineError::Generation(format!("malformed generation response: {err}"))
        })?;
        parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| PipelineError::Generation("response contained no choices".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    fn token() -> ScopedToken {
        ScopedToken {
            token: "t-abc".to_string(),
            expires_in: 3600,
        }
    }

    #[tokio::test]
    async fn returns_first_choice_content() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/chat/completions")
                    .header("authorization", "Bearer t-abc")
                    .json_body_partial(r#"{"model": "gemini-1.5-pro", "temperature": 0.0}"#);
                then.status(200).json_body(serde_json::json!({
                    "choices": [
                        { "message": { "content": "Supply constraints." } }
                    ]
                }));
            })
            .await;

        let generator = ChatCompletionGenerator::new(
            Client::new(),
            server.base_url(),
            &token(),
            GenerationConfig::default(),
        );
        let answer = generator
            .generate("What challenges?", "Section 1A: supply constraints.")
            .await
            .unwrap();
        assert_eq!(answer, "Supply constraints.");
    }

    #[tokio::test]
    async fn empty_choices_is_a_generation_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/chat/completions");
                then.status(200)
                    .json_body(serde_json::json!({ "choices": [] }));
            })
            .await;

        let generator = ChatCompletionGenerator::new(
            Client::new(),
            server.base_url(),
            &token(),
            GenerationConfig::default(),
        );
        let err = generator.generate("q", "ctx").await.unwrap_err();
        assert!(matches!(err, PipelineError::Generation(_)));
    }
}
