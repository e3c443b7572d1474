//! Chat-completion transport for article generation.
//!
//! The generation client talks to the language model through the
//! [`AskAsync`] trait so the HTTP transport can be swapped for a stub in
//! tests. [`OpenAiClient`] is the production implementation: one
//! `POST {base}/chat/completions` per request against any OpenAI-compatible
//! endpoint, with JSON-object output requested.
//!
//! Requests are issued exactly once. There is no retry or backoff; callers
//! decide what a failure means.

use std::time::{Duration, Instant};

use futures::future::{BoxFuture, FutureExt};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};
use url::Url;

use crate::config::OpenAiSettings;
use crate::error::{Error, Result};
use crate::utils::truncate_for_log;

/// One chat-completion request: a system role text plus a user prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatRequest {
    pub system: String,
    pub prompt: String,
}

/// Trait for async LLM interaction.
///
/// Implementors send a [`ChatRequest`] and resolve to the raw completion
/// text. The future is boxed so implementations can sit behind `dyn`.
pub trait AskAsync: Send + Sync {
    fn ask<'a>(&'a self, request: &'a ChatRequest) -> BoxFuture<'a, Result<String>>;
}

#[derive(Debug, Serialize)]
struct CompletionBody<'a> {
    model: &'a str,
    messages: [Message<'a>; 2],
    response_format: ResponseFormat,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

/// OpenAI-compatible chat-completion client.
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    http: reqwest::Client,
    endpoint: Url,
    api_key: Option<String>,
    model: String,
}

impl OpenAiClient {
    /// Build a client from settings.
    ///
    /// # Errors
    ///
    /// Fails if the base URL does not parse or the HTTP client cannot be
    /// constructed.
    pub fn new(settings: &OpenAiSettings) -> Result<Self> {
        let mut base = settings.base_url.clone();
        if !base.ends_with('/') {
            base.push('/');
        }
        let endpoint = Url::parse(&base)?.join("chat/completions")?;

        let mut builder = reqwest::Client::builder();
        if let Some(secs) = settings.request_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }

        Ok(Self {
            http: builder.build()?,
            endpoint,
            api_key: settings.api_key.clone(),
            model: settings.model.clone(),
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    #[instrument(level = "info", skip_all, fields(model = %self.model))]
    async fn complete(&self, request: &ChatRequest) -> Result<String> {
        let t0 = Instant::now();
        let body = CompletionBody {
            model: &self.model,
            messages: [
                Message {
                    role: "system",
                    content: &request.system,
                },
                Message {
                    role: "user",
                    content: &request.prompt,
                },
            ],
            response_format: ResponseFormat {
                kind: "json_object",
            },
        };

        let mut req = self.http.post(self.endpoint.clone()).json(&body);
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }

        let resp = req.send().await?;
        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            warn!(
                status = status.as_u16(),
                elapsed_ms = t0.elapsed().as_millis() as u64,
                body = %truncate_for_log(&text, 300),
                "Completion request rejected"
            );
            return Err(Error::Upstream {
                status: status.as_u16(),
                body: text,
            });
        }

        let parsed: CompletionResponse = resp.json().await?;
        debug!(
            elapsed_ms = t0.elapsed().as_millis() as u64,
            choices = parsed.choices.len(),
            "Completion received"
        );

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or(Error::EmptyCompletion)
    }
}

impl AskAsync for OpenAiClient {
    fn ask<'a>(&'a self, request: &'a ChatRequest) -> BoxFuture<'a, Result<String>> {
        self.complete(request).boxed()
    }
}
