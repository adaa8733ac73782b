//! Generic HTTP plumbing shared by the REST-based adapters.
//!
//! Adapters describe *what* to send through [`TTSRequestBuilder`]; [`HttpTransport`]
//! sends it and maps transport faults and HTTP statuses onto [`ProviderError`].

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use bytes::Bytes;
use reqwest::{Client, StatusCode};
use tracing::{debug, warn};

use super::base::{ProviderError, ProviderKind, ProviderResult, TTSConfig, VoiceConfig};

/// Maximum number of body characters carried into error messages.
const ERROR_BODY_PREVIEW: usize = 200;

/// Body markers meaning the account ran out of allowance rather than being throttled.
const QUOTA_MARKERS: &[&str] = &[
    "resource_exhausted",
    "insufficient_quota",
    "quota_exceeded",
    "exceeded your current quota",
];

/// Body markers meaning the credential itself was rejected.
const AUTH_MARKERS: &[&str] = &["api_key_invalid", "api key not valid", "invalid_api_key"];

/// Builds the provider-specific HTTP request for one synthesis call.
pub trait TTSRequestBuilder: Send + Sync {
    fn build_http_request(
        &self,
        client: &Client,
        text: &str,
        voice: &VoiceConfig,
    ) -> ProviderResult<reqwest::RequestBuilder>;

    fn get_config(&self) -> &TTSConfig;
}

/// Pooled HTTP client plus status classification for one provider.
pub struct HttpTransport {
    kind: ProviderKind,
    client: Client,
    request_counter: AtomicU64,
}

impl HttpTransport {
    pub fn new(kind: ProviderKind) -> ProviderResult<Self> {
        let client = Client::builder()
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(4)
            .build()
            .map_err(|e| ProviderError::ConfigError(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            kind,
            client,
            request_counter: AtomicU64::new(0),
        })
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Send the request built by `builder` and return the non-empty response body.
    pub async fn execute<B: TTSRequestBuilder + ?Sized>(
        &self,
        builder: &B,
        text: &str,
        voice: &VoiceConfig,
    ) -> ProviderResult<Bytes> {
        builder.get_config().require_api_key(self.kind)?;
        let request = builder.build_http_request(&self.client, text, voice)?;

        let request_id = self.request_counter.fetch_add(1, Ordering::Relaxed) + 1;
        debug!(
            provider = %self.kind,
            request_id,
            text_len = text.len(),
            "Sending synthesis request"
        );

        let response = request.send().await.map_err(|e| {
            warn!(provider = %self.kind, request_id, error = %e, "Synthesis request failed");
            classify_transport_error(&e)
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(
                provider = %self.kind,
                request_id,
                status = %status,
                body = %preview(&body),
                "Provider returned error status"
            );
            return Err(classify_status(status, &body));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| ProviderError::Transient(format!("failed to read response body: {e}")))?;

        if bytes.is_empty() {
            return Err(ProviderError::NoAudioReturned);
        }

        debug!(provider = %self.kind, request_id, bytes = bytes.len(), "Received audio payload");
        Ok(bytes)
    }
}

/// Map a non-success HTTP status (plus body hints) onto the error taxonomy.
pub fn classify_status(status: StatusCode, body: &str) -> ProviderError {
    let lowered = body.to_lowercase();
    let message = format!("{status}: {}", preview(body));

    let quota = QUOTA_MARKERS.iter().any(|m| lowered.contains(m));
    let auth = AUTH_MARKERS.iter().any(|m| lowered.contains(m));

    match status.as_u16() {
        401 | 402 | 403 | 429 if quota => ProviderError::QuotaExhausted(message),
        429 => ProviderError::RateLimited(message),
        401 | 403 => ProviderError::Unauthorized(message),
        400 if auth => ProviderError::Unauthorized(message),
        402 => ProviderError::QuotaExhausted(message),
        408 => ProviderError::Transient(message),
        400..=499 => ProviderError::Unsupported(message),
        _ => ProviderError::Transient(message),
    }
}

fn classify_transport_error(error: &reqwest::Error) -> ProviderError {
    if error.is_timeout() {
        ProviderError::Transient(format!("request timed out: {error}"))
    } else if error.is_builder() {
        ProviderError::ConfigError(format!("invalid request: {error}"))
    } else {
        ProviderError::Transient(format!("request failed: {error}"))
    }
}

fn preview(body: &str) -> String {
    if body.chars().count() > ERROR_BODY_PREVIEW {
        let head: String = body.chars().take(ERROR_BODY_PREVIEW).collect();
        format!("{head}...")
    } else {
        body.to_string()
    }
}
