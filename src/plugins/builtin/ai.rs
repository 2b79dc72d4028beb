//! AI chat command backed by an OpenAI-compatible chat completions API

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use crate::application::errors::{CommandError, PluginError};
use crate::application::format::truncate;
use crate::application::messaging::Context;
use crate::plugins::CommandHandler;

const DEFAULT_API_URL: &str = "https://api.groq.com/openai/v1/chat/completions";
const DEFAULT_MODEL: &str = "llama-3.1-8b-instant";
const MAX_REPLY_CHARS: usize = 4000;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Endpoint and credentials for the AI command
#[derive(Debug, Clone)]
pub struct AiSettings {
    pub api_url: String,
    pub api_key: String,
    pub model: String,
}

impl AiSettings {
    /// `AI_API_KEY` (required), `AI_API_URL` and `AI_MODEL` (optional)
    pub fn from_env() -> Option<Self> {
        let api_key = std::env::var("AI_API_KEY").ok().filter(|k| !k.trim().is_empty())?;
        Some(Self {
            api_url: std::env::var("AI_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string()),
            api_key,
            model: std::env::var("AI_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string()),
        })
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    stream: bool,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

/// `ai <prompt>`
pub struct AiChat {
    client: Client,
    settings: Option<AiSettings>,
}

impl AiChat {
    pub fn new(settings: Option<AiSettings>) -> Result<Self, PluginError> {
        Self::with_timeout(settings, REQUEST_TIMEOUT)
    }

    /// Requests that take longer than `timeout` fail the command
    pub fn with_timeout(settings: Option<AiSettings>, timeout: Duration) -> Result<Self, PluginError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PluginError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client, settings })
    }

    async fn complete(&self, settings: &AiSettings, prompt: &str) -> Result<Option<String>, CommandError> {
        let request = ChatRequest {
            model: &settings.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: "You are a helpful WhatsApp assistant. Keep answers short.",
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            stream: false,
        };

        let response = self
            .client
            .post(&settings.api_url)
            .bearer_auth(&settings.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| CommandError::ExecutionFailed(format!("AI request failed: {}", e)))?;

        if response.status() == StatusCode::TOO_MANY_REQUESTS {
            return Ok(None);
        }

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(CommandError::ExecutionFailed(format!(
                "AI API error: status {}, body: {}",
                status,
                truncate(&body, 200)
            )));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| CommandError::ExecutionFailed(format!("AI response parse error: {}", e)))?;

        Ok(parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|c| !c.trim().is_empty()))
    }
}

#[async_trait]
impl CommandHandler for AiChat {
    fn id(&self) -> &str {
        "ai-chat"
    }

    async fn run(&self, ctx: Context) -> Result<(), CommandError> {
        if ctx.text.chars().count() < 2 {
            return ctx
                .reply(format!("🧠 *Usage:* {} <your question>", ctx.invocation()))
                .await;
        }

        let Some(settings) = &self.settings else {
            return ctx
                .reply("⚠️ AI is not configured. Set AI_API_KEY and restart the bot.")
                .await;
        };

        match self.complete(settings, &ctx.text).await? {
            Some(answer) => {
                ctx.reply(format!("🤖 *AI Reply:*\n\n{}", truncate(answer.trim(), MAX_REPLY_CHARS)))
                    .await
            }
            None => ctx.reply("⚠️ No response from the AI right now. Try again later.").await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{InboundMessage, Jid};
    use crate::plugins::builtin::tests::Bot;
    use crate::test_support::{FakeConnection, ALICE};

    #[tokio::test]
    async fn test_unconfigured_ai_answers_politely() {
        let bot = Bot::new(FakeConnection::new()).await;

        let outcome = bot
            .send(InboundMessage::from_text(Jid::new(ALICE), Jid::new(ALICE), ".gpt what is rust?"))
            .await;
        assert!(outcome.is_executed());
        assert!(bot.last_text().contains("not configured"));
    }

    #[tokio::test]
    async fn test_ai_usage_without_prompt() {
        let bot = Bot::new(FakeConnection::new()).await;
        bot.owner_says(".ai").await;
        assert!(bot.last_text().contains("Usage"));
    }

    #[tokio::test]
    async fn test_stalled_api_times_out() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        // accept and never answer
        let server = tokio::spawn(async move {
            let (_socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(30)).await;
        });

        let settings = AiSettings {
            api_url: format!("http://{}/v1/chat/completions", addr),
            api_key: "test-key".to_string(),
            model: DEFAULT_MODEL.to_string(),
        };
        let chat = AiChat::with_timeout(Some(settings.clone()), Duration::from_millis(200)).unwrap();

        let result = tokio::time::timeout(Duration::from_secs(10), chat.complete(&settings, "hello"))
            .await
            .expect("request was not bounded by the client timeout");
        assert!(matches!(result, Err(CommandError::ExecutionFailed(_))));

        server.abort();
    }
}
