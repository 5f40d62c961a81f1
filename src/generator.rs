use std::time::Instant;

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::stream::BoxStream;
use futures_util::StreamExt;

use crate::config::{AppConfig, ResolvedUpstream};
use crate::error::AdapterError;
use crate::observability::token_counter::{estimate_messages_tokens, log_generation_usage};
use crate::protocol::openai_chat::encoder::{encode_chat_request, encode_messages};
use crate::protocol::openai_chat::response_decoder::{decode_chat_response, decode_stream_chunk};
use crate::protocol::openai_chat::{ChatRequest, ChatResponse};
use crate::protocol::unified::{
    CountTokensRequest, CountTokensResponse, EmbedContentRequest, EmbedContentResponse,
    GenerateContentRequest, GenerateContentResponse,
};
use crate::stream::decode_chunk_stream;
use crate::transport::{chat_completions_url, HttpTransport};

/// Lazily decoded partial responses of a streaming generation.
pub type ResponseStream = BoxStream<'static, Result<GenerateContentResponse, AdapterError>>;

/// The capability set exposed to callers of the unified schema.
///
/// `user_prompt_id` is an opaque caller token; implementations may log it but
/// must not interpret it.
#[async_trait]
pub trait ContentGenerator: Send + Sync {
    /// Generate a complete response.
    async fn generate_content(
        &self,
        request: &GenerateContentRequest,
        user_prompt_id: &str,
    ) -> Result<GenerateContentResponse, AdapterError>;

    /// Generate a response as a sequence of partial responses.
    async fn generate_content_stream(
        &self,
        request: &GenerateContentRequest,
        user_prompt_id: &str,
    ) -> Result<ResponseStream, AdapterError>;

    /// Estimate the prompt size of a request.
    async fn count_tokens(
        &self,
        request: &CountTokensRequest,
    ) -> Result<CountTokensResponse, AdapterError>;

    /// Compute embeddings for the request contents.
    async fn embed_content(
        &self,
        request: &EmbedContentRequest,
    ) -> Result<EmbedContentResponse, AdapterError>;
}

/// [`ContentGenerator`] backed by an Ollama server's OpenAI-compatible
/// chat-completion endpoint.
#[derive(Debug, Clone)]
pub struct OllamaContentGenerator {
    upstream: ResolvedUpstream,
    chat_url: String,
    transport: HttpTransport,
}

impl OllamaContentGenerator {
    /// Build a generator from application config, resolving the base URL and
    /// default model against the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError::Connection`] when the HTTP client cannot be built.
    pub fn new(config: &AppConfig) -> Result<Self, AdapterError> {
        let transport = HttpTransport::new(&config.upstream)?;
        Ok(Self::with_transport(config.upstream.resolve(), transport))
    }

    #[must_use]
    pub fn with_transport(upstream: ResolvedUpstream, transport: HttpTransport) -> Self {
        let chat_url = chat_completions_url(&upstream.base_url);
        Self {
            upstream,
            chat_url,
            transport,
        }
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.upstream.base_url
    }

    #[must_use]
    pub fn default_model(&self) -> &str {
        &self.upstream.model
    }

    /// Send a wire request and fail on any non-success status.
    async fn send(&self, wire: &ChatRequest) -> Result<reqwest::Response, AdapterError> {
        let body = serde_json::to_vec(wire).map_err(|err| AdapterError::Encode(err.to_string()))?;
        let response = self.transport.post_json(&self.chat_url, Bytes::from(body)).await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(
                status = status.as_u16(),
                model = %wire.model,
                stream = wire.stream,
                "chat completion request rejected"
            );
            return Err(AdapterError::Transport {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }
}

#[async_trait]
impl ContentGenerator for OllamaContentGenerator {
    async fn generate_content(
        &self,
        request: &GenerateContentRequest,
        user_prompt_id: &str,
    ) -> Result<GenerateContentResponse, AdapterError> {
        let start = Instant::now();
        let wire = encode_chat_request(request, &self.upstream.model, false)?;
        tracing::debug!(
            model = %wire.model,
            messages = wire.messages.len(),
            tools = wire.tools.as_ref().map_or(0, Vec::len),
            user_prompt_id,
            "sending chat completion request"
        );

        let response = self.send(&wire).await?;
        let body = response.bytes().await?;
        let parsed: ChatResponse =
            serde_json::from_slice(&body).map_err(|err| AdapterError::Decode(err.to_string()))?;
        let unified = decode_chat_response(&parsed)?;

        log_generation_usage(&wire.model, unified.usage_metadata.as_ref(), start.elapsed());
        Ok(unified)
    }

    async fn generate_content_stream(
        &self,
        request: &GenerateContentRequest,
        user_prompt_id: &str,
    ) -> Result<ResponseStream, AdapterError> {
        let wire = encode_chat_request(request, &self.upstream.model, true)?;
        tracing::debug!(
            model = %wire.model,
            messages = wire.messages.len(),
            stream = true,
            user_prompt_id,
            "sending streaming chat completion request"
        );

        let response = self.send(&wire).await?;
        if response.content_length() == Some(0) {
            return Err(AdapterError::MissingBody);
        }

        let stream = decode_chunk_stream(response.bytes_stream()).filter_map(|item| {
            futures_util::future::ready(match item {
                Ok(chunk) => decode_stream_chunk(&chunk).map(Ok),
                Err(err) => Some(Err(err)),
            })
        });
        Ok(stream.boxed())
    }

    async fn count_tokens(
        &self,
        request: &CountTokensRequest,
    ) -> Result<CountTokensResponse, AdapterError> {
        let messages = encode_messages(&request.contents)?;
        Ok(CountTokensResponse {
            total_tokens: estimate_messages_tokens(&messages),
        })
    }

    async fn embed_content(
        &self,
        _request: &EmbedContentRequest,
    ) -> Result<EmbedContentResponse, AdapterError> {
        Err(AdapterError::UnsupportedOperation {
            operation: "embedContent",
        })
    }
}
