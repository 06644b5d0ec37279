//! Health probes for the configured LLM backends.
//!
//! - Ollama: `GET {endpoint}/api/tags`, model looked up in `models[].name`
//! - OpenAI: `GET {endpoint}/v1/models` (Bearer auth), model looked up in `data[].id`
//!
//! [`HealthService::check`] never fails; any error becomes `ok=false` so the
//! result can be returned as-is from a `/health` route.

use std::time::{Duration, Instant};

use reqwest::header;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::llm_model_config::LlmModelConfig;
use crate::config::llm_provider::LlmProvider;
use crate::error_handler::{AiLlmError, HealthError, HttpError, Result, make_snippet};

/// A serializable health snapshot for a single provider/config.
#[derive(Debug, Clone, Serialize)]
pub struct HealthStatus {
    pub provider: String,
    pub endpoint: String,
    pub model: String,
    pub ok: bool,
    pub latency_ms: u64,
    pub message: String,
}

impl HealthStatus {
    fn new(cfg: &LlmModelConfig, ok: bool, latency_ms: u64, message: impl Into<String>) -> Self {
        Self {
            provider: format!("{:?}", cfg.provider),
            endpoint: cfg.endpoint.clone(),
            model: cfg.model.clone(),
            ok,
            latency_ms,
            message: message.into(),
        }
    }
}

/// Reuses a single HTTP client across probes.
pub struct HealthService {
    client: reqwest::Client,
    timeout: Duration,
}

impl HealthService {
    /// Builds the probe client with the given timeout (seconds, default 10).
    pub fn new(timeout_secs: Option<u64>) -> Result<Self> {
        let timeout = Duration::from_secs(timeout_secs.unwrap_or(10));
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client, timeout })
    }

    /// Probes one config. Never returns an error.
    pub async fn check(&self, cfg: &LlmModelConfig) -> HealthStatus {
        let started = Instant::now();
        let status = match self.probe(cfg).await {
            Ok(models) => {
                let latency = started.elapsed().as_millis() as u64;
                match models {
                    Some(list) if list.iter().any(|m| m == &cfg.model) => {
                        HealthStatus::new(cfg, true, latency, "backend is healthy; model is available")
                    }
                    Some(_) => HealthStatus::new(cfg, false, latency, "backend is up, but model not found"),
                    None => HealthStatus::new(cfg, true, latency, "backend is reachable; model list not decodable"),
                }
            }
            Err(e) => HealthStatus::new(cfg, false, started.elapsed().as_millis() as u64, e.to_string()),
        };

        if status.ok {
            info!(
                provider = %status.provider,
                model = %status.model,
                latency_ms = status.latency_ms,
                "health probe completed"
            );
        } else {
            warn!(
                provider = %status.provider,
                model = %status.model,
                latency_ms = status.latency_ms,
                message = %status.message,
                "health probe failed"
            );
        }
        status
    }

    /// Probes configs sequentially.
    pub async fn check_many(&self, configs: &[LlmModelConfig]) -> Vec<HealthStatus> {
        debug!(count = configs.len(), "running health probes");
        let mut out = Vec::with_capacity(configs.len());
        for cfg in configs {
            out.push(self.check(cfg).await);
        }
        out
    }

    /// Fetches the model listing. `Ok(None)` means reachable but undecodable.
    async fn probe(&self, cfg: &LlmModelConfig) -> Result<Option<Vec<String>>> {
        let base = cfg.endpoint.trim().trim_end_matches('/');
        let (url, auth) = match cfg.provider {
            LlmProvider::Ollama => (format!("{base}/api/tags"), None),
            LlmProvider::OpenAI => {
                let key = cfg
                    .api_key
                    .as_deref()
                    .ok_or_else(|| HealthError::Decode("missing OpenAI API key".into()))?;
                let value = header::HeaderValue::from_str(&format!("Bearer {key}"))
                    .map_err(|e| HealthError::Decode(format!("invalid API key header: {e}")))?;
                (format!("{base}/v1/models"), Some(value))
            }
        };

        debug!(provider = ?cfg.provider, "GET {}", url);
        let mut req = self.client.get(&url);
        if let Some(v) = auth {
            req = req.header(header::AUTHORIZATION, v);
        }
        let resp = req
            .send()
            .await
            .map_err(|e| AiLlmError::from_transport(e, self.timeout))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let snippet = make_snippet(&resp.text().await.unwrap_or_default());
            return Err(HealthError::HttpStatus(HttpError { status, url, snippet }).into());
        }

        let body = resp.text().await?;
        Ok(model_names(cfg.provider, &body))
    }
}

#[derive(Deserialize)]
struct OllamaTags {
    models: Vec<OllamaTag>,
}

#[derive(Deserialize)]
struct OllamaTag {
    name: String,
}

#[derive(Deserialize)]
struct OpenAiModels {
    data: Vec<OpenAiModel>,
}

#[derive(Deserialize)]
struct OpenAiModel {
    id: String,
}

fn model_names(provider: LlmProvider, body: &str) -> Option<Vec<String>> {
    match provider {
        LlmProvider::Ollama => serde_json::from_str::<OllamaTags>(body)
            .ok()
            .map(|t| t.models.into_iter().map(|m| m.name).collect()),
        LlmProvider::OpenAI => serde_json::from_str::<OpenAiModels>(body)
            .ok()
            .map(|m| m.data.into_iter().map(|m| m.id).collect()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_ollama_tags() {
        let names = model_names(
            LlmProvider::Ollama,
            r#"{"models":[{"name":"llama3.1:8b"},{"name":"nomic-embed-text"}]}"#,
        )
        .unwrap();
        assert_eq!(names, vec!["llama3.1:8b", "nomic-embed-text"]);
    }

    #[test]
    fn parses_openai_models() {
        let names = model_names(LlmProvider::OpenAI, r#"{"data":[{"id":"gpt-4o-mini"}]}"#).unwrap();
        assert_eq!(names, vec!["gpt-4o-mini"]);
        assert!(model_names(LlmProvider::OpenAI, "not json").is_none());
    }

    #[tokio::test]
    async fn unreachable_backend_is_reported_not_raised() {
        let svc = HealthService::new(Some(1)).unwrap();
        let cfg = LlmModelConfig {
            provider: LlmProvider::Ollama,
            model: "m".into(),
            endpoint: "http://127.0.0.1:9".into(),
            api_key: None,
            max_tokens: None,
            temperature: None,
            top_p: None,
            timeout_secs: None,
        };
        let status = svc.check(&cfg).await;
        assert!(!status.ok);
        assert_eq!(status.provider, "Ollama");
    }
}
