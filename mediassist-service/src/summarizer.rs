use anyhow::anyhow;
use async_trait::async_trait;
use mediassist_core::{AssistError, Summarizer, SummaryOptions};
use reqwest::Client;
use rig::{agent::Agent, client::CompletionClient, completion::Prompt, providers::openrouter};
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::info;

use crate::config::{SummarizerBackend, SummarizerConfig};

const SUMMARY_PREAMBLE: &str = "You are a medical report summarizer. \
Rewrite the report excerpt you are given as one short abstractive paragraph in plain English, \
keeping the findings, measurements and recommendations it states. \
Do not add facts, diagnoses or advice that are not in the excerpt. \
Reply with the summary only.";

/// Build the configured backend. Called once at startup; the result is shared by every request.
pub fn build_summarizer(config: &SummarizerConfig) -> anyhow::Result<Arc<dyn Summarizer>> {
    let options = SummaryOptions::default();
    let summarizer: Arc<dyn Summarizer> = match config.backend {
        SummarizerBackend::HuggingFace => Arc::new(HuggingFaceSummarizer::new(
            &config.inference_url,
            &config.model,
            config.api_key.clone(),
            options,
        )),
        SummarizerBackend::OpenRouter => {
            let api_key = config
                .api_key
                .as_deref()
                .ok_or_else(|| anyhow!("OPENROUTER_API_KEY not set"))?;
            Arc::new(OpenRouterSummarizer::new(api_key, &config.model, options))
        }
    };

    info!(
        backend = summarizer.name(),
        model = %config.model,
        "Summarizer initialized"
    );
    Ok(summarizer)
}

#[derive(Debug, Deserialize)]
struct SummaryOutput {
    summary_text: String,
}

/// Hosted inference for encoder-decoder summarization models such as `facebook/bart-large-cnn`.
pub struct HuggingFaceSummarizer {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
    options: SummaryOptions,
}

impl HuggingFaceSummarizer {
    pub fn new(
        inference_url: &str,
        model: &str,
        api_key: Option<String>,
        options: SummaryOptions,
    ) -> Self {
        Self {
            client: Client::new(),
            endpoint: format!("{}/{}", inference_url.trim_end_matches('/'), model),
            api_key,
            options,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn request_payload(&self, text: &str) -> Value {
        json!({
            "inputs": text,
            "parameters": {
                "min_length": self.options.min_length,
                "max_length": self.options.max_length,
                "do_sample": self.options.do_sample
            },
            "options": {
                "wait_for_model": true
            }
        })
    }

    async fn request_summary(&self, text: &str) -> anyhow::Result<String> {
        let mut request = self
            .client
            .post(&self.endpoint)
            .header("Content-Type", "application/json")
            .json(&self.request_payload(text));

        if let Some(api_key) = &self.api_key {
            request = request.header("Authorization", format!("Bearer {}", api_key));
        }

        let response = request.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("Inference request failed: {} {}", status, body));
        }

        let outputs: Vec<SummaryOutput> = response.json().await?;
        outputs
            .into_iter()
            .next()
            .map(|output| output.summary_text)
            .ok_or_else(|| anyhow!("Inference response contained no summary"))
    }
}

#[async_trait]
impl Summarizer for HuggingFaceSummarizer {
    fn name(&self) -> &str {
        "huggingface"
    }

    async fn summarize(&self, text: &str) -> mediassist_core::Result<String> {
        self.request_summary(text)
            .await
            .map_err(|e| AssistError::Summarization(e.to_string()))
    }
}

/// Chat model behind OpenRouter, prompted to behave like a summarizer.
///
/// Only the upper bound of [`SummaryOptions`] applies here, as `max_tokens`. A chat completion
/// has no minimum length, so `min_length` is not enforced and short replies pass through.
pub struct OpenRouterSummarizer {
    agent: Agent<openrouter::CompletionModel>,
}

impl OpenRouterSummarizer {
    pub fn new(api_key: &str, model: &str, options: SummaryOptions) -> Self {
        let client = openrouter::Client::new(api_key);
        let agent = client
            .agent(model)
            .preamble(SUMMARY_PREAMBLE)
            .temperature(0.0)
            .max_tokens(options.max_length as u64)
            .build();
        Self { agent }
    }
}

#[async_trait]
impl Summarizer for OpenRouterSummarizer {
    fn name(&self) -> &str {
        "openrouter"
    }

    async fn summarize(&self, text: &str) -> mediassist_core::Result<String> {
        let response = self
            .agent
            .prompt(text.to_string())
            .await
            .map_err(|e| AssistError::Summarization(e.to_string()))?;
        Ok(response.trim().to_string())
    }
}
