// External dependencies
use anyhow::{Context, Result};
use async_trait::async_trait;
use log::{debug, info, warn};
use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

// Internal dependencies
use crate::ai::completion::CompletionService;
use crate::ai::types::CompletionRequest;
use crate::config::Settings;

// ============================================================================
// Chat Completion API Structures
// ============================================================================

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChoiceMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ModelEntry {
    id: String,
}

#[derive(Debug, Deserialize)]
struct ModelsResponse {
    data: Vec<ModelEntry>,
}

pub struct OpenAiClient {
    client: Client,
    base_url: Url,
    api_key: Option<String>,
}

// ============================================================================
// Client Implementation
// ============================================================================

impl OpenAiClient {
    /// Creates a new client for the service configured in `settings`.
    ///
    /// The key is not checked here; a missing or wrong key surfaces as an
    /// error from the first request.
    pub fn new(settings: &Settings, api_key: Option<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.api.timeout_secs))
            .build()
            .context("Failed to create HTTP client")?;

        let base_url = Self::parse_base_url(&settings.api.base_url)?;

        Ok(Self {
            client,
            base_url,
            api_key,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    // Endpoints are joined relative to the base, so it must end in '/'.
    fn parse_base_url(raw: &str) -> Result<Url> {
        let mut normalized = raw.trim().to_string();
        if !normalized.ends_with('/') {
            normalized.push('/');
        }
        Url::parse(&normalized).with_context(|| format!("Invalid API base URL: {raw}"))
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.api_key {
            Some(key) => builder.bearer_auth(key),
            None => builder,
        }
    }

    // ========================================================================
    // Connection and Model Management
    // ========================================================================

    /// Verifies the service is reachable and accepts the credential
    pub async fn verify_connection(&self) -> Result<()> {
        debug!("Verifying completion service connection");

        self.list_models().await?;

        info!("Completion service connection verified");
        Ok(())
    }

    /// Lists the model identifiers the service offers
    pub async fn list_models(&self) -> Result<Vec<String>> {
        debug!("Listing available models");

        let url = self
            .base_url
            .join("models")
            .context("Failed to build models URL")?;

        let response = self
            .authorized(self.client.get(url))
            .send()
            .await
            .context("Failed to connect to completion service")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow::anyhow!("Failed to list models: {status}: {body}"));
        }

        let models_response: ModelsResponse = response
            .json()
            .await
            .context("Failed to parse models response")?;

        let model_ids: Vec<String> = models_response.data.into_iter().map(|m| m.id).collect();

        debug!("Found {} models", model_ids.len());
        Ok(model_ids)
    }
}

// ============================================================================
// Text Generation
// ============================================================================

#[async_trait]
impl CompletionService for OpenAiClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        let url = self
            .base_url
            .join("chat/completions")
            .context("Failed to build chat completions URL")?;

        if self.api_key.is_none() {
            warn!("No API key configured, sending unauthenticated request");
        }

        let body = ChatCompletionRequest {
            model: &request.model,
            messages: vec![ChatMessage {
                role: "user",
                content: &request.prompt,
            }],
            temperature: request.temperature,
        };

        debug!(
            "Sending chat completion request, model: {}, prompt length: {}",
            request.model,
            request.prompt.len()
        );

        let response = self
            .authorized(self.client.post(url))
            .json(&body)
            .send()
            .await
            .context("Failed to send chat completion request")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow::anyhow!(
                "Chat completion request failed: {status}: {body}"
            ));
        }

        let completion: ChatCompletionResponse = response
            .json()
            .await
            .context("Failed to parse chat completion response")?;

        let choice = completion
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| anyhow::anyhow!("Chat completion response contained no choices"))?;

        if let Some(reason) = choice.finish_reason.as_deref() {
            if reason != "stop" {
                warn!("Completion finished early: {reason}");
            }
        }

        let content = choice
            .message
            .content
            .ok_or_else(|| anyhow::anyhow!("Chat completion choice had no message content"))?;

        debug!("Generated response length: {}", content.len());
        Ok(content)
    }
}
