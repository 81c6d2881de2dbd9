//! OpenAI-backed embedding and completion provider.
//!
//! This module is only available when the `openai` feature is enabled.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::completion::{CompletionProvider, ModelTier};
use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};

const OPENAI_EMBEDDINGS_URL: &str = "https://api.openai.com/v1/embeddings";
const OPENAI_CHAT_URL: &str = "https://api.openai.com/v1/chat/completions";

const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";
const DEFAULT_DIMENSIONS: usize = 1536;
const DEFAULT_FAST_MODEL: &str = "gpt-3.5-turbo";
const DEFAULT_SLOW_MODEL: &str = "gpt-4";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

const PROVIDER: &str = "OpenAI";

/// Both provider seams over the OpenAI HTTP API.
///
/// Prompts are sent as a single user message to `/v1/chat/completions`; the
/// [`ModelTier`] picks between the fast and slow model names.
///
/// # Example
///
/// ```rust,ignore
/// use std::sync::Arc;
/// use timeline_rag::openai::OpenAIProvider;
///
/// let provider = Arc::new(OpenAIProvider::from_env()?);
/// let session = ChatSession::builder()
///     .embedding_provider(provider.clone())
///     .completion_provider(provider)
///     .record(record)
///     .build()?;
/// ```
pub struct OpenAIProvider {
    client: reqwest::Client,
    api_key: String,
    embedding_model: String,
    dimensions: usize,
    request_dimensions: Option<usize>,
    fast_model: String,
    slow_model: String,
    temperature: f32,
}

impl OpenAIProvider {
    /// Create a provider with the given API key and the default models.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if the key is empty or the HTTP client
    /// cannot be constructed.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(RagError::ConfigError("OpenAI API key must not be empty".into()));
        }

        Ok(Self {
            client: build_client(DEFAULT_TIMEOUT)?,
            api_key,
            embedding_model: DEFAULT_EMBEDDING_MODEL.into(),
            dimensions: DEFAULT_DIMENSIONS,
            request_dimensions: None,
            fast_model: DEFAULT_FAST_MODEL.into(),
            slow_model: DEFAULT_SLOW_MODEL.into(),
            temperature: 0.0,
        })
    }

    /// Create a provider using the `OPENAI_API_KEY` environment variable.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY").map_err(|_| {
            RagError::ConfigError("OPENAI_API_KEY environment variable not set".into())
        })?;
        Self::new(api_key)
    }

    /// Set the chat model names for the fast and slow tiers.
    pub fn with_models(mut self, fast: impl Into<String>, slow: impl Into<String>) -> Self {
        self.fast_model = fast.into();
        self.slow_model = slow.into();
        self
    }

    /// Set the embedding model name (e.g. `text-embedding-3-large`).
    pub fn with_embedding_model(mut self, model: impl Into<String>) -> Self {
        self.embedding_model = model.into();
        self
    }

    /// Request truncated embeddings of `dims` dimensions.
    pub fn with_dimensions(mut self, dims: usize) -> Self {
        self.dimensions = dims;
        self.request_dimensions = Some(dims);
        self
    }

    /// Sampling temperature for completions. Defaults to `0.0`.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Per-request timeout. Requests exceeding it fail with [`RagError::Timeout`].
    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self> {
        self.client = build_client(timeout)?;
        Ok(self)
    }

    fn model_for(&self, tier: ModelTier) -> &str {
        match tier {
            ModelTier::Fast => &self.fast_model,
            ModelTier::Slow => &self.slow_model,
        }
    }

    async fn post<B: Serialize + ?Sized>(
        &self,
        url: &str,
        body: &B,
        operation: &str,
        to_error: impl Fn(String) -> RagError,
    ) -> Result<reqwest::Response> {
        let response =
            self.client.post(url).bearer_auth(&self.api_key).json(body).send().await.map_err(|e| {
                error!(provider = PROVIDER, operation, error = %e, "request failed");
                if e.is_timeout() {
                    RagError::Timeout { provider: PROVIDER.into(), operation: operation.into() }
                } else {
                    to_error(format!("request failed: {e}"))
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let detail = serde_json::from_str::<ErrorResponse>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);

            error!(provider = PROVIDER, operation, %status, "API error");
            return Err(to_error(format!("API returned {status}: {detail}")));
        }

        Ok(response)
    }
}

fn build_client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| RagError::ConfigError(format!("failed to build HTTP client: {e}")))
}

impl std::fmt::Debug for OpenAIProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAIProvider")
            .field("embedding_model", &self.embedding_model)
            .field("fast_model", &self.fast_model)
            .field("slow_model", &self.slow_model)
            .finish_non_exhaustive()
    }
}

// ── request/response types ─────────────────────────────────────────

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: Vec<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    dimensions: Option<usize>,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
    temperature: f32,
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
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

// ── provider implementations ───────────────────────────────────────

#[async_trait]
impl EmbeddingProvider for OpenAIProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let results = self.embed_batch(&[text]).await?;
        results.into_iter().next().ok_or_else(|| RagError::EmbeddingError {
            provider: PROVIDER.into(),
            message: "API returned empty response".into(),
        })
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        debug!(
            provider = PROVIDER,
            batch_size = texts.len(),
            model = %self.embedding_model,
            "embedding batch"
        );

        let body = EmbeddingRequest {
            model: &self.embedding_model,
            input: texts.to_vec(),
            dimensions: self.request_dimensions,
        };
        let embedding_error =
            |message| RagError::EmbeddingError { provider: PROVIDER.into(), message };

        let response = self.post(OPENAI_EMBEDDINGS_URL, &body, "embed", embedding_error).await?;
        let parsed: EmbeddingResponse = response.json().await.map_err(|e| {
            error!(provider = PROVIDER, error = %e, "failed to parse embedding response");
            embedding_error(format!("failed to parse response: {e}"))
        })?;

        Ok(parsed.data.into_iter().map(|d| d.embedding).collect())
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn name(&self) -> &str {
        PROVIDER
    }
}

#[async_trait]
impl CompletionProvider for OpenAIProvider {
    async fn complete(&self, prompt: &str, tier: ModelTier) -> Result<String> {
        let model = self.model_for(tier);
        debug!(provider = PROVIDER, %tier, model, prompt_len = prompt.len(), "completion request");

        let body = ChatRequest {
            model,
            messages: [ChatMessage { role: "user", content: prompt }],
            temperature: self.temperature,
        };
        let completion_error =
            |message| RagError::CompletionError { provider: PROVIDER.into(), tier, message };

        let response = self.post(OPENAI_CHAT_URL, &body, "complete", completion_error).await?;
        let parsed: ChatResponse = response.json().await.map_err(|e| {
            error!(provider = PROVIDER, error = %e, "failed to parse chat response");
            completion_error(format!("failed to parse response: {e}"))
        })?;

        parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content.unwrap_or_default())
            .ok_or_else(|| completion_error("API returned no choices".into()))
    }

    fn name(&self) -> &str {
        PROVIDER
    }
}
