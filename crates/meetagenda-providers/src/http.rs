//! Shared HTTP plumbing for the vendor clients.
//!
//! [`ApiTransport`] sends one logical request, maps non-success statuses to
//! [`ProviderError`] codes, and retries only transient failures (5xx and
//! transport errors) with exponential backoff. 4xx answers, 429 included,
//! are returned on the first attempt.

use std::time::Duration;

use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{ProviderError, ProviderResult};

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Longest vendor body kept in an error message.
const MAX_ERROR_BODY: usize = 200;

/// Bounded retry with exponential backoff.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, the first one included. `1` disables retries.
    pub max_attempts: u32,
    /// Delay before the second attempt.
    pub initial_backoff: Duration,
    /// Upper bound for any single delay.
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(5),
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Delay to wait after the given failed attempt (1-based).
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.initial_backoff
            .saturating_mul(factor)
            .min(self.max_backoff)
    }
}

/// HTTP settings shared by all clients.
#[derive(Debug, Clone)]
pub struct HttpSettings {
    /// Per-request timeout.
    pub timeout: Duration,
    /// `User-Agent` header value.
    pub user_agent: String,
    /// Retry policy for transient failures.
    pub retry: RetryPolicy,
    /// Ignore `HTTP(S)_PROXY` from the environment.
    pub no_proxy: bool,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            user_agent: format!("meetagenda/{}", env!("CARGO_PKG_VERSION")),
            retry: RetryPolicy::default(),
            no_proxy: false,
        }
    }
}

impl HttpSettings {
    /// Builder method to set the timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Builder method to set the retry policy.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Builder method to bypass environment proxies.
    pub fn with_no_proxy(mut self, no_proxy: bool) -> Self {
        self.no_proxy = no_proxy;
        self
    }
}

/// A reqwest client bound to one vendor.
#[derive(Debug, Clone)]
pub(crate) struct ApiTransport {
    client: Client,
    provider: &'static str,
    retry: RetryPolicy,
}

impl ApiTransport {
    pub(crate) fn new(provider: &'static str, settings: &HttpSettings) -> ProviderResult<Self> {
        let mut builder = Client::builder()
            .timeout(settings.timeout)
            .user_agent(settings.user_agent.as_str());
        if settings.no_proxy {
            builder = builder.no_proxy();
        }
        let client = builder.build().map_err(|e| {
            ProviderError::internal(format!("failed to create HTTP client: {}", e))
                .with_provider(provider)
                .with_source(e)
        })?;

        Ok(Self {
            client,
            provider,
            retry: settings.retry.clone(),
        })
    }

    pub(crate) fn provider(&self) -> &'static str {
        self.provider
    }

    /// Sends the request built by `build` and decodes a JSON response.
    ///
    /// `build` is called again for each retry attempt.
    pub(crate) async fn send_json<T, F>(&self, what: &str, build: F) -> ProviderResult<T>
    where
        T: DeserializeOwned,
        F: Fn(&Client) -> RequestBuilder,
    {
        let max_attempts = self.retry.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match self.execute_once(what, build(&self.client)).await {
                Err(err) if err.is_retryable() && attempt < max_attempts => {
                    let delay = self.retry.backoff_for(attempt);
                    warn!(
                        provider = self.provider,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        "{} failed: {}; retrying",
                        what,
                        err
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                result => return result.map_err(|e| e.with_provider(self.provider)),
            }
        }
    }

    async fn execute_once<T: DeserializeOwned>(
        &self,
        what: &str,
        builder: RequestBuilder,
    ) -> ProviderResult<T> {
        let request = builder.build().map_err(|e| {
            ProviderError::internal(format!("failed to build {} request: {}", what, e))
                .with_source(e)
        })?;
        debug!(
            provider = self.provider,
            method = %request.method(),
            url = %request.url(),
            "{}",
            what
        );

        let response = self.client.execute(request).await.map_err(|e| {
            let message = if e.is_timeout() {
                format!("{}: request timeout", what)
            } else if e.is_connect() {
                format!("{}: connection failed: {}", what, e)
            } else {
                format!("{}: request failed: {}", what, e)
            };
            ProviderError::network(message).with_source(e)
        })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            ProviderError::network(format!("{}: failed to read response: {}", what, e))
                .with_source(e)
        })?;

        if !status.is_success() {
            return Err(status_error(status, &body));
        }

        serde_json::from_str(&body).map_err(|e| {
            ProviderError::invalid_response(format!("{}: failed to parse response: {}", what, e))
                .with_source(e)
        })
    }
}

/// Builds the error for a non-success response.
pub(crate) fn status_error(status: StatusCode, body: &str) -> ProviderError {
    ProviderError::from_status(status, vendor_message(body))
}

/// Extracts the human-readable message from a vendor error body.
///
/// Google nests it under `error.message`, Notion puts it at `message`.
/// Anything else is returned raw, cut to 200 characters.
pub(crate) fn vendor_message(body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<Value>(body) {
        let message = value
            .pointer("/error/message")
            .or_else(|| value.get("message"))
            .and_then(Value::as_str);
        if let Some(message) = message {
            return message.to_string();
        }
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        return "empty response body".to_string();
    }
    if trimmed.chars().count() > MAX_ERROR_BODY {
        let cut: String = trimmed.chars().take(MAX_ERROR_BODY).collect();
        format!("{}...", cut)
    } else {
        trimmed.to_string()
    }
}
