use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use crate::{Generation, TextGenerator};

/// Client for an Ollama-compatible `/api/generate` endpoint. Temperature is
/// pinned to zero so identical prompts produce identical answers.
#[derive(Debug, Clone)]
pub struct OllamaGenerator {
    client: reqwest::Client,
    base_url: String,
    model: String,
}

impl OllamaGenerator {
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
        }
    }

    pub fn model_id(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl TextGenerator for OllamaGenerator {
    async fn generate(&self, prompt: &str) -> Result<Generation> {
        let url = format!("{}/api/generate", self.base_url);
        let payload = ApiRequest {
            model: self.model.clone(),
            prompt: prompt.to_string(),
            stream: false,
            options: ApiOptions { temperature: 0.0 },
        };

        let resp = match self.client.post(url).json(&payload).send().await {
            Ok(r) => r,
            Err(e) if e.is_connect() => {
                return Err(anyhow!("ollama generate error (connect): {e}"));
            }
            Err(e) => return Err(e.into()),
        };

        let status = resp.status();
        if status != StatusCode::OK {
            let body = resp.text().await.unwrap_or_default();
            return Err(anyhow!("ollama generate error ({status}): {body}"));
        }

        let body: ApiResponse = resp.json().await?;
        tracing::debug!(
            model = %body.model,
            input_tokens = ?body.prompt_eval_count,
            output_tokens = ?body.eval_count,
            "generation complete"
        );

        Ok(Generation {
            content: body.response,
            model: body.model,
            input_tokens: body.prompt_eval_count,
            output_tokens: body.eval_count,
            time_to_read: body.prompt_eval_duration,
            time_to_generate: body.eval_duration,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
struct ApiRequest {
    model: String,
    prompt: String,
    stream: bool,
    options: ApiOptions,
}

#[derive(Debug, Clone, Serialize)]
struct ApiOptions {
    temperature: f32,
}

#[derive(Debug, Clone, Deserialize)]
struct ApiResponse {
    model: String,
    response: String,
    #[serde(default)]
    prompt_eval_count: Option<u32>,
    #[serde(default)]
    prompt_eval_duration: Option<u64>,
    #[serde(default)]
    eval_count: Option<u32>,
    #[serde(default)]
    eval_duration: Option<u64>,
}
