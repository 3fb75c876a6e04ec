//! The analysis backend capability and its HTTP implementation.
//!
//! The core never performs document analysis itself - it consumes an
//! [`AnalysisBackend`]: given a file and a prompt identifier, the backend
//! returns an opaque result payload or fails with an [`AnalysisError`].
//!
//! [`HttpBackend`] implements the capability against OpenAI-compatible
//! chat-completions endpoints, one provider configuration per
//! [`AnalysisMode`]. Local engines (Ollama, vLLM, LM Studio) expose the
//! same API shape, so `Local` mode goes through the same code path with a
//! loopback endpoint and no credential.

use std::time::Duration;

use camino::Utf8Path;
use ds_core::{AiConfig, AnalysisMode, ProviderConfig};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, warn};

use crate::error::AnalysisError;

/// Availability report of the analysis capability.
///
/// Consumed by presentation to gate mode selection.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct BackendStatus {
    /// Whether the backend is usable at all.
    pub available: bool,

    /// Modes with a usable provider configuration.
    pub configured_modes: Vec<AnalysisMode>,
}

/// The external document-analysis capability.
///
/// Implementations must be cheap to share across tasks; the dispatcher
/// holds one instance for its whole lifetime and awaits one call at a
/// time.
pub trait AnalysisBackend: Send + Sync {
    /// Analyzes one file with the given prompt, returning an opaque result
    /// payload.
    fn analyze(
        &self,
        file_path: &Utf8Path,
        prompt_id: &str,
        mode: AnalysisMode,
    ) -> impl std::future::Future<Output = Result<serde_json::Value, AnalysisError>> + Send;

    /// Reports provider availability for UI gating.
    fn status(&self) -> BackendStatus;
}

/// Shape of an OpenAI-compatible chat-completions response, reduced to the
/// fields we read.
#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: String,
}

/// [`AnalysisBackend`] over OpenAI-compatible HTTP endpoints.
///
/// One provider configuration per mode; the request body carries the
/// provider's model and generation parameters, the prompt identifier as
/// the system message, and the document reference as the user message.
///
/// # Examples
///
/// ```
/// use ds_queue::HttpBackend;
/// use ds_core::AiConfig;
///
/// let backend = HttpBackend::new(AiConfig::default(), 30)?;
/// // Without credentials only the local mode is usable.
/// let status = ds_queue::AnalysisBackend::status(&backend);
/// assert!(status.available);
/// # Ok::<(), ds_queue::AnalysisError>(())
/// ```
#[derive(Debug)]
pub struct HttpBackend {
    /// Per-provider configuration.
    config: AiConfig,

    /// Shared HTTP client with the transport-level timeout applied.
    client: reqwest::Client,
}

impl HttpBackend {
    /// Creates a backend over the given provider configuration.
    ///
    /// `timeout_secs` bounds each HTTP round-trip at the transport level;
    /// the dispatcher applies its own overall deadline on top.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::Transport`] if the HTTP client cannot be
    /// constructed.
    pub fn new(config: AiConfig, timeout_secs: u64) -> Result<Self, AnalysisError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;
        Ok(Self { config, client })
    }

    /// Resolves the provider for a mode, refusing unusable configurations.
    fn provider_for(&self, mode: AnalysisMode) -> Result<&ProviderConfig, AnalysisError> {
        let provider = self
            .config
            .provider(mode)
            .ok_or_else(|| AnalysisError::unconfigured(mode.label().to_ascii_lowercase()))?;

        if provider.endpoint.is_empty() || provider.model.is_empty() {
            return Err(AnalysisError::unconfigured(
                mode.label().to_ascii_lowercase(),
            ));
        }
        if mode.requires_credentials() && provider.api_key.is_none() {
            return Err(AnalysisError::unconfigured(
                mode.label().to_ascii_lowercase(),
            ));
        }
        Ok(provider)
    }

    /// Performs one chat-completions call.
    async fn call_provider(
        &self,
        provider: &ProviderConfig,
        file_path: &Utf8Path,
        prompt_id: &str,
    ) -> Result<serde_json::Value, AnalysisError> {
        let url = format!("{}/chat/completions", provider.endpoint);
        let body = json!({
            "model": provider.model,
            "temperature": provider.temperature,
            "max_tokens": provider.max_tokens,
            "messages": [
                {"role": "system", "content": format!("apply analysis strategy '{prompt_id}'")},
                {"role": "user", "content": format!("document: {file_path}")},
            ],
        });

        let mut request = self.client.post(&url).json(&body);
        if let Some(key) = provider.api_key.as_deref() {
            request = request.header("Authorization", format!("Bearer {key}"));
        }

        debug!(url = %url, model = %provider.model, "Dispatching analysis request");
        let response = request.send().await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(AnalysisError::provider(format!("{status}: {text}")));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| AnalysisError::InvalidResponse(e.to_string()))?;

        let content = parsed
            .choices
            .first()
            .map(|c| c.message.content.as_str())
            .ok_or_else(|| AnalysisError::InvalidResponse("no choices in response".to_owned()))?;

        Ok(json!({
            "summary": content,
            "model": provider.model,
            "prompt_id": prompt_id,
        }))
    }
}

impl AnalysisBackend for HttpBackend {
    async fn analyze(
        &self,
        file_path: &Utf8Path,
        prompt_id: &str,
        mode: AnalysisMode,
    ) -> Result<serde_json::Value, AnalysisError> {
        let provider = self.provider_for(mode)?;
        let result = self.call_provider(provider, file_path, prompt_id).await;
        if let Err(error) = &result {
            warn!(file = %file_path, mode = mode.label(), error = %error, "Analysis call failed");
        }
        result
    }

    fn status(&self) -> BackendStatus {
        BackendStatus {
            available: true,
            configured_modes: self.config.configured_modes(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend() -> HttpBackend {
        HttpBackend::new(AiConfig::default(), 5).expect("client build failed")
    }

    #[test]
    fn test_provider_for_local_needs_no_key() {
        let backend = backend();
        assert!(backend.provider_for(AnalysisMode::Local).is_ok());
    }

    #[test]
    fn test_provider_for_cloud_without_key_is_unconfigured() {
        let backend = backend();
        let err = backend.provider_for(AnalysisMode::OpenAi).unwrap_err();
        assert!(matches!(err, AnalysisError::Unconfigured { .. }));
    }

    #[test]
    fn test_provider_for_cloud_with_key() {
        let mut config = AiConfig::default();
        config.claude.api_key = Some("sk-ant-0123456789abcdef".to_owned());
        let backend = HttpBackend::new(config, 5).expect("client build failed");
        assert!(backend.provider_for(AnalysisMode::Claude).is_ok());
    }

    #[test]
    fn test_provider_for_empty_endpoint_is_unconfigured() {
        let mut config = AiConfig::default();
        config.local.endpoint = String::new();
        let backend = HttpBackend::new(config, 5).expect("client build failed");
        assert!(matches!(
            backend.provider_for(AnalysisMode::Local),
            Err(AnalysisError::Unconfigured { .. })
        ));
    }

    #[test]
    fn test_status_reflects_configuration() {
        let mut config = AiConfig::default();
        config.openai.api_key = Some("sk-0123456789abcdef".to_owned());
        let backend = HttpBackend::new(config, 5).expect("client build failed");

        let status = backend.status();
        assert!(status.available);
        assert!(status.configured_modes.contains(&AnalysisMode::Local));
        assert!(status.configured_modes.contains(&AnalysisMode::OpenAi));
        assert!(!status.configured_modes.contains(&AnalysisMode::Mistral));
    }

    #[test]
    fn test_chat_response_parsing() {
        let raw = r#"{"choices": [{"message": {"role": "assistant", "content": "a summary"}}]}"#;
        let parsed: ChatResponse = serde_json::from_str(raw).expect("parse failed");
        assert_eq!(parsed.choices[0].message.content, "a summary");
    }
}
