//! Thin client for the local Ollama runtime.
//!
//! Endpoints used:
//! - `POST {endpoint}/api/chat` : non-streaming chat completion (`stream=false`)
//! - `POST {endpoint}/api/embed` : batched embeddings (`input: [..]`)
//!
//! # Examples
//!
//! ```no_run
//! use ai_llm_service::{ChatTurn, LlmModelConfig, LlmProvider};
//! use ai_llm_service::services::ollama_service::OllamaService;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let cfg = LlmModelConfig {
//!     provider: LlmProvider::Ollama,
//!     model: "llama3.1:8b".into(),
//!     endpoint: "http://localhost:11434".into(),
//!     api_key: None,
//!     max_tokens: Some(256),
//!     temperature: Some(0.2),
//!     top_p: None,
//!     timeout_secs: Some(120),
//! };
//!
//! let svc = OllamaService::new(cfg)?;
//! let text = svc.chat(Some("Answer briefly."), &[ChatTurn::user("What is RAG?")]).await?;
//! println!("{text}");
//! # Ok(()) }
//! ```

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument};

use crate::{
    chat::{ChatTurn, WireMessage, wire_messages},
    config::{llm_model_config::LlmModelConfig, llm_provider::LlmProvider},
    error_handler::{
        AiLlmError, HttpError, Provider, ProviderError, ProviderErrorKind, Result, make_snippet,
    },
};

/// Ollama client bound to one model config.
#[derive(Debug)]
pub struct OllamaService {
    client: reqwest::Client,
    cfg: LlmModelConfig,
    timeout: Duration,
    url_chat: String,
    url_embed: String,
}

impl OllamaService {
    /// Creates a new [`OllamaService`] from the given config.
    ///
    /// # Errors
    /// - `InvalidProvider` if `cfg.provider` is not Ollama
    /// - `InvalidEndpoint` if `cfg.endpoint` is not http(s)
    /// - [`AiLlmError::HttpTransport`] if the HTTP client cannot be built
    pub fn new(cfg: LlmModelConfig) -> Result<Self> {
        if cfg.provider != LlmProvider::Ollama {
            return Err(err(ProviderErrorKind::InvalidProvider));
        }

        let endpoint = cfg.endpoint.trim();
        if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
            return Err(err(ProviderErrorKind::InvalidEndpoint(cfg.endpoint.clone())));
        }

        let timeout = cfg.request_timeout();
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()?;

        let base = endpoint.trim_end_matches('/');
        let url_chat = format!("{base}/api/chat");
        let url_embed = format!("{base}/api/embed");

        info!(
            model = %cfg.model,
            endpoint = %cfg.endpoint,
            timeout_secs = timeout.as_secs(),
            "OllamaService initialized"
        );

        Ok(Self {
            client,
            cfg,
            timeout,
            url_chat,
            url_embed,
        })
    }

    /// Non-streaming chat completion via `/api/chat`.
    ///
    /// Options mapped from config: `temperature`, `top_p`, `num_predict` (← `max_tokens`).
    #[instrument(skip_all, fields(model = %self.cfg.model, turns = turns.len()))]
    pub async fn chat(&self, system: Option<&str>, turns: &[ChatTurn]) -> Result<String> {
        let started = Instant::now();
        let body = ChatRequest {
            model: &self.cfg.model,
            messages: wire_messages(system, turns),
            stream: false,
            options: ChatOptions {
                temperature: self.cfg.temperature,
                top_p: self.cfg.top_p,
                num_predict: self.cfg.max_tokens,
            },
        };

        debug!("POST {}", self.url_chat);
        let resp = self
            .client
            .post(&self.url_chat)
            .json(&body)
            .send()
            .await
            .map_err(|e| AiLlmError::from_transport(e, self.timeout))?;

        let resp = self.ensure_success(resp, &self.url_chat, started).await?;

        let out: ChatResponse = resp.json().await.map_err(|e| {
            err(ProviderErrorKind::Decode(format!(
                "{e}; expected `{{ message: {{ content }} }}` with stream=false"
            )))
        })?;

        info!(
            latency_ms = started.elapsed().as_millis() as u64,
            answer_len = out.message.content.len(),
            "ollama chat completed"
        );
        Ok(out.message.content)
    }

    /// Embeds a batch of texts with one `/api/embed` call.
    ///
    /// The returned vectors are aligned with `inputs`.
    #[instrument(skip_all, fields(model = %self.cfg.model, batch = inputs.len()))]
    pub async fn embed_batch(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>> {
        if inputs.is_empty() {
            return Ok(Vec::new());
        }
        let started = Instant::now();
        let body = EmbedRequest {
            model: &self.cfg.model,
            input: inputs,
        };

        debug!("POST {}", self.url_embed);
        let resp = self
            .client
            .post(&self.url_embed)
            .json(&body)
            .send()
            .await
            .map_err(|e| AiLlmError::from_transport(e, self.timeout))?;

        let resp = self.ensure_success(resp, &self.url_embed, started).await?;

        let out: EmbedResponse = resp.json().await.map_err(|e| {
            err(ProviderErrorKind::Decode(format!(
                "{e}; expected `{{ embeddings: number[][] }}`"
            )))
        })?;

        if out.embeddings.len() != inputs.len() {
            return Err(err(ProviderErrorKind::EmbeddingCountMismatch {
                got: out.embeddings.len(),
                want: inputs.len(),
            }));
        }

        debug!(
            latency_ms = started.elapsed().as_millis() as u64,
            "ollama embed completed"
        );
        Ok(out.embeddings)
    }

    async fn ensure_success(
        &self,
        resp: reqwest::Response,
        url: &str,
        started: Instant,
    ) -> Result<reqwest::Response> {
        if resp.status().is_success() {
            return Ok(resp);
        }
        let status = resp.status();
        let text = resp.text().await.unwrap_or_default();
        let snippet = make_snippet(&text);
        error!(
            %url,
            %status,
            %snippet,
            latency_ms = started.elapsed().as_millis() as u64,
            "ollama returned non-success status"
        );
        Err(err(ProviderErrorKind::HttpStatus(HttpError {
            status,
            url: url.to_string(),
            snippet,
        })))
    }
}

#[inline]
fn err(kind: ProviderErrorKind) -> AiLlmError {
    ProviderError::new(Provider::Ollama, kind).into()
}

/* ==========================
HTTP payloads
========================== */

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
    stream: bool,
    options: ChatOptions,
}

#[derive(Debug, Default, Serialize)]
struct ChatOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    #[serde(default)]
    content: String,
}

#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg(provider: LlmProvider, endpoint: &str) -> LlmModelConfig {
        LlmModelConfig {
            provider,
            model: "llama3.1:8b".into(),
            endpoint: endpoint.into(),
            api_key: None,
            max_tokens: Some(64),
            temperature: Some(0.2),
            top_p: None,
            timeout_secs: Some(5),
        }
    }

    #[test]
    fn rejects_foreign_provider() {
        let e = OllamaService::new(cfg(LlmProvider::OpenAI, "http://localhost:11434")).unwrap_err();
        assert!(e.to_string().contains("different provider"));
    }

    #[test]
    fn rejects_bad_endpoint() {
        assert!(OllamaService::new(cfg(LlmProvider::Ollama, "localhost:11434")).is_err());
    }

    #[test]
    fn chat_request_shape() {
        let c = cfg(LlmProvider::Ollama, "http://localhost:11434");
        let turns = [ChatTurn::user("hi")];
        let body = ChatRequest {
            model: &c.model,
            messages: wire_messages(Some("sys"), &turns),
            stream: false,
            options: ChatOptions {
                temperature: c.temperature,
                top_p: None,
                num_predict: c.max_tokens,
            },
        };
        let v = serde_json::to_value(&body).unwrap();
        assert_eq!(v["stream"], false);
        assert_eq!(v["messages"][0]["role"], "system");
        assert_eq!(v["messages"][1]["content"], "hi");
        assert_eq!(v["options"]["num_predict"], 64);
        assert!(v["options"].get("top_p").is_none());
    }

    #[tokio::test]
    async fn empty_batch_makes_no_call() {
        // Port 9 (discard) would fail if a request were sent.
        let svc = OllamaService::new(cfg(LlmProvider::Ollama, "http://127.0.0.1:9")).unwrap();
        let out = svc.embed_batch(&[]).await.unwrap();
        assert!(out.is_empty());
    }
}
