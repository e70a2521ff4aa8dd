//! Generation provider abstraction.
//!
//! A `GenerationClient` sends one product image plus an instruction payload
//! to an external image-generation service and returns the generated image.
//! The bundled backend targets the Gemini `generateContent` API with inline
//! data; other backends can slot in behind the same trait.
//!
//! Retry policy lives in [`RetryingClient`], a wrapper that re-issues only
//! rate-limited requests with exponential backoff through an injectable
//! [`Sleeper`], so tests observe the schedule without real waiting.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::ProviderConfig;
use crate::error::GenerationError;
use crate::image::EncodedImage;

const HTTP_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const HTTP_REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// One external generation call: image + prompt in, generated image out.
#[async_trait]
pub trait GenerationClient: Send + Sync {
    async fn generate(
        &self,
        image: &EncodedImage,
        prompt: &str,
    ) -> Result<EncodedImage, GenerationError>;

    /// Model identifier used in logs.
    fn model_name(&self) -> &str;
}

/// Suspension point used by the retry wrapper and the batch queue.
///
/// Production code sleeps on the tokio timer; tests substitute a recorder.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Tokio-timer backed sleeper.
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Backoff schedule for rate-limited requests.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Base delay multiplied by 2^attempt.
    pub base_delay_ms: u64,
    /// Total attempts, including the first one.
    pub max_attempts: usize,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            base_delay_ms: 4000,
            max_attempts: 5,
        }
    }
}

impl RetryPolicy {
    /// Delay before retry `attempt` (1-based): base × 2^attempt.
    pub fn delay_for(&self, attempt: usize) -> Duration {
        let factor = 1u64 << attempt.min(16);
        Duration::from_millis(self.base_delay_ms.saturating_mul(factor))
    }
}

/// Retry wrapper over any [`GenerationClient`].
///
/// Rate-limited attempts back off exponentially up to the attempt cap; the
/// last error surfaces once the cap is exhausted. Everything else
/// (no-image, transport, configuration) propagates after a single attempt.
pub struct RetryingClient<C> {
    inner: C,
    policy: RetryPolicy,
    sleeper: Arc<dyn Sleeper>,
}

impl<C: GenerationClient> RetryingClient<C> {
    pub fn new(inner: C, policy: RetryPolicy) -> Self {
        Self::with_sleeper(inner, policy, Arc::new(TokioSleeper))
    }

    pub fn with_sleeper(inner: C, policy: RetryPolicy, sleeper: Arc<dyn Sleeper>) -> Self {
        Self {
            inner,
            policy,
            sleeper,
        }
    }
}

#[async_trait]
impl<C: GenerationClient> GenerationClient for RetryingClient<C> {
    async fn generate(
        &self,
        image: &EncodedImage,
        prompt: &str,
    ) -> Result<EncodedImage, GenerationError> {
        let mut attempt = 0usize;
        loop {
            match self.inner.generate(image, prompt).await {
                Ok(result) => return Ok(result),
                Err(err) if err.is_retryable() && attempt + 1 < self.policy.max_attempts => {
                    attempt += 1;
                    let delay = self.policy.delay_for(attempt);
                    warn!(
                        attempt,
                        max_attempts = self.policy.max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "Rate limited, backing off before retry"
                    );
                    self.sleeper.sleep(delay).await;
                }
                Err(err) => return Err(err),
            }
        }
    }

    fn model_name(&self) -> &str {
        self.inner.model_name()
    }
}

// Gemini generateContent request/response structures
#[derive(Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfigBody,
}

#[derive(Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Serialize)]
struct Part {
    #[serde(rename = "inlineData", skip_serializing_if = "Option::is_none")]
    inline_data: Option<InlineData>,
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Serialize)]
struct InlineData {
    #[serde(rename = "mimeType")]
    mime_type: String,
    data: String,
}

#[derive(Serialize)]
struct GenerationConfigBody {
    #[serde(rename = "imageConfig")]
    image_config: ImageConfigBody,
}

#[derive(Serialize)]
struct ImageConfigBody {
    #[serde(rename = "aspectRatio")]
    aspect_ratio: String,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<ResponseContent>,
}

#[derive(Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    #[serde(rename = "inlineData")]
    inline_data: Option<ResponseInlineData>,
}

#[derive(Deserialize)]
struct ResponseInlineData {
    #[serde(rename = "mimeType")]
    mime_type: Option<String>,
    data: Option<String>,
}

fn map_http_error(error: reqwest::Error) -> GenerationError {
    if error.status() == Some(StatusCode::TOO_MANY_REQUESTS) {
        GenerationError::RateLimited(error.to_string())
    } else if error.is_timeout() {
        GenerationError::Transport(format!("Request timeout: {error}"))
    } else if error.is_connect() {
        GenerationError::Transport(format!("Connection error: {error}"))
    } else {
        GenerationError::Transport(format!("HTTP error: {error}"))
    }
}

/// Rate limiting arrives as HTTP 429 or as a quota complaint in the body.
fn classify_status(status: StatusCode, body: &str) -> GenerationError {
    if status == StatusCode::TOO_MANY_REQUESTS || body.contains("quota") {
        return GenerationError::RateLimited(format!("status {status}: {body}"));
    }
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            GenerationError::Configuration(format!("credential rejected: {body}"))
        }
        _ => GenerationError::Transport(format!("request failed with status {status}: {body}")),
    }
}

/// Gemini image-generation backend.
pub struct GeminiClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    aspect_ratio: String,
}

impl GeminiClient {
    pub fn new(config: &ProviderConfig) -> Result<Self, GenerationError> {
        let client = Client::builder()
            .connect_timeout(HTTP_CONNECT_TIMEOUT)
            .timeout(HTTP_REQUEST_TIMEOUT)
            .build()
            .map_err(|e| {
                GenerationError::Configuration(format!("Failed to create HTTP client: {e}"))
            })?;

        Ok(Self {
            client,
            api_key: config.api_key.clone().unwrap_or_default(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            aspect_ratio: config.aspect_ratio.clone(),
        })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        )
    }

    fn extract_image(response: GenerateContentResponse) -> Result<EncodedImage, GenerationError> {
        for candidate in response.candidates {
            let Some(content) = candidate.content else {
                continue;
            };
            for part in content.parts {
                if let Some(inline) = part.inline_data {
                    if let Some(data) = inline.data {
                        return Ok(EncodedImage::from_provider_payload(
                            data,
                            inline.mime_type.as_deref(),
                        ));
                    }
                }
            }
        }
        Err(GenerationError::NoImageReturned(
            "response contained no inline image payload".to_string(),
        ))
    }
}

#[async_trait]
impl GenerationClient for GeminiClient {
    async fn generate(
        &self,
        image: &EncodedImage,
        prompt: &str,
    ) -> Result<EncodedImage, GenerationError> {
        if self.api_key.is_empty() {
            return Err(GenerationError::Configuration(
                "API key missing".to_string(),
            ));
        }

        let request = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![
                    Part {
                        inline_data: Some(InlineData {
                            mime_type: image.mime_type().to_string(),
                            data: image.base64_data().to_string(),
                        }),
                        text: None,
                    },
                    Part {
                        inline_data: None,
                        text: Some(prompt.to_string()),
                    },
                ],
            }],
            generation_config: GenerationConfigBody {
                image_config: ImageConfigBody {
                    aspect_ratio: self.aspect_ratio.clone(),
                },
            },
        };

        debug!(model = %self.model, mime_type = %image.mime_type(), "Sending generation request");

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(map_http_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(classify_status(status, &body));
        }

        let parsed: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| GenerationError::Transport(format!("Failed to parse response: {e}")))?;

        Self::extract_image(parsed)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Scripted client and recording sleeper shared by provider and queue tests.

    use super::*;
    use parking_lot::Mutex;

    /// Plays back a fixed script of outcomes, one per call.
    pub struct ScriptedClient {
        script: Mutex<Vec<Result<EncodedImage, GenerationError>>>,
        pub calls: Mutex<Vec<String>>,
    }

    impl ScriptedClient {
        pub fn new(script: Vec<Result<EncodedImage, GenerationError>>) -> Self {
            Self {
                script: Mutex::new(script),
                calls: Mutex::new(Vec::new()),
            }
        }

        pub fn image(tag: &str) -> EncodedImage {
            EncodedImage::from_provider_payload(
                base64::Engine::encode(&base64::engine::general_purpose::STANDARD, tag),
                Some("image/png"),
            )
        }

        pub fn call_count(&self) -> usize {
            self.calls.lock().len()
        }
    }

    #[async_trait]
    impl GenerationClient for ScriptedClient {
        async fn generate(
            &self,
            _image: &EncodedImage,
            prompt: &str,
        ) -> Result<EncodedImage, GenerationError> {
            self.calls.lock().push(prompt.to_string());
            let mut script = self.script.lock();
            if script.is_empty() {
                Ok(Self::image("default"))
            } else {
                script.remove(0)
            }
        }

        fn model_name(&self) -> &str {
            "scripted"
        }
    }

    /// Records requested delays instead of waiting.
    #[derive(Default)]
    pub struct RecordingSleeper {
        pub delays: Mutex<Vec<Duration>>,
    }

    #[async_trait]
    impl Sleeper for RecordingSleeper {
        async fn sleep(&self, duration: Duration) {
            self.delays.lock().push(duration);
        }
    }

    pub fn delays_ms(sleeper: &RecordingSleeper) -> Vec<u64> {
        sleeper
            .delays
            .lock()
            .iter()
            .map(|d| d.as_millis() as u64)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::testing::{delays_ms, RecordingSleeper, ScriptedClient};
    use super::*;
    use crate::config::ProviderConfig;

    fn rate_limited() -> GenerationError {
        GenerationError::RateLimited("429".to_string())
    }

    fn input_image() -> EncodedImage {
        ScriptedClient::image("input")
    }

    #[tokio::test]
    async fn retries_rate_limits_with_doubling_backoff() {
        let script = vec![
            Err(rate_limited()),
            Err(rate_limited()),
            Err(rate_limited()),
            Ok(ScriptedClient::image("ok")),
        ];
        let sleeper = Arc::new(RecordingSleeper::default());
        let client = RetryingClient::with_sleeper(
            ScriptedClient::new(script),
            RetryPolicy::default(),
            sleeper.clone(),
        );

        let result = client.generate(&input_image(), "prompt").await;
        assert!(result.is_ok());
        assert_eq!(delays_ms(&sleeper), vec![8000, 16000, 32000]);
    }

    #[tokio::test]
    async fn exhausted_retries_surface_last_rate_limit_error() {
        let script = (0..5).map(|_| Err(rate_limited())).collect();
        let sleeper = Arc::new(RecordingSleeper::default());
        let inner = ScriptedClient::new(script);
        let client = RetryingClient::with_sleeper(inner, RetryPolicy::default(), sleeper.clone());

        let err = client.generate(&input_image(), "prompt").await.unwrap_err();
        assert!(matches!(err, GenerationError::RateLimited(_)));
        // 5 total attempts means 4 backoff delays
        assert_eq!(delays_ms(&sleeper), vec![8000, 16000, 32000, 64000]);
    }

    #[tokio::test]
    async fn non_retryable_errors_short_circuit() {
        for err in [
            GenerationError::NoImageReturned("empty".to_string()),
            GenerationError::Configuration("no key".to_string()),
            GenerationError::Transport("reset".to_string()),
        ] {
            let sleeper = Arc::new(RecordingSleeper::default());
            let inner = ScriptedClient::new(vec![Err(err.clone())]);
            let client =
                RetryingClient::with_sleeper(inner, RetryPolicy::default(), sleeper.clone());

            let out = client.generate(&input_image(), "prompt").await.unwrap_err();
            assert_eq!(out.kind(), err.kind());
            assert!(
                delays_ms(&sleeper).is_empty(),
                "no backoff for {}",
                err.kind()
            );
        }
    }

    #[tokio::test]
    async fn first_attempt_success_skips_backoff() {
        let sleeper = Arc::new(RecordingSleeper::default());
        let inner = ScriptedClient::new(vec![Ok(ScriptedClient::image("ok"))]);
        let client = RetryingClient::with_sleeper(inner, RetryPolicy::default(), sleeper.clone());

        client.generate(&input_image(), "prompt").await.unwrap();
        assert!(delays_ms(&sleeper).is_empty());
    }

    #[tokio::test]
    async fn missing_api_key_is_a_configuration_error() {
        let config = ProviderConfig {
            api_key: None,
            ..ProviderConfig::default()
        };
        let client = GeminiClient::new(&config).unwrap();
        let err = client.generate(&input_image(), "prompt").await.unwrap_err();
        assert!(matches!(err, GenerationError::Configuration(_)));
    }

    #[test]
    fn quota_message_counts_as_rate_limit() {
        let err = classify_status(StatusCode::BAD_REQUEST, "You have exceeded your quota.");
        assert!(matches!(err, GenerationError::RateLimited(_)));
    }

    #[test]
    fn auth_failures_map_to_configuration() {
        let err = classify_status(StatusCode::UNAUTHORIZED, "invalid key");
        assert!(matches!(err, GenerationError::Configuration(_)));
    }

    #[test]
    fn response_without_image_part_is_no_image_returned() {
        let parsed: GenerateContentResponse =
            serde_json::from_str(r#"{"candidates":[{"content":{"parts":[{"text":"sorry"}]}}]}"#)
                .unwrap();
        let err = GeminiClient::extract_image(parsed).unwrap_err();
        assert!(matches!(err, GenerationError::NoImageReturned(_)));
    }

    #[test]
    fn first_inline_image_part_wins() {
        let parsed: GenerateContentResponse = serde_json::from_str(
            r#"{"candidates":[{"content":{"parts":[
                {"text":"here you go"},
                {"inlineData":{"mimeType":"image/png","data":"QUJD"}},
                {"inlineData":{"mimeType":"image/png","data":"REVG"}}
            ]}}]}"#,
        )
        .unwrap();
        let image = GeminiClient::extract_image(parsed).unwrap();
        assert_eq!(image.base64_data(), "QUJD");
        assert_eq!(image.mime_type(), "image/png");
    }
}
