//! Error types for vendor API operations.
//!
//! Every failure is surfaced to the caller as a [`ProviderError`]. Errors
//! that come from a vendor response carry the code derived from the HTTP
//! status (401 → `Unauthorized`, 403 → `Forbidden`, 400 → `BadRequest`,
//! 404 → `NotFound`); errors raised before any request carry
//! `MissingCredential` or `InvalidInput`.

use std::fmt;

use meetagenda_core::ValidationError;
use reqwest::StatusCode;
use thiserror::Error;

/// The category of a provider error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderErrorCode {
    /// No configured variable holds a credential for the capability.
    MissingCredential,
    /// A value was rejected locally; no request was made.
    InvalidInput,
    /// HTTP 401: the token is expired or invalid.
    Unauthorized,
    /// HTTP 403: scope missing or resource not shared with the integration.
    Forbidden,
    /// HTTP 400 (and other unclassified 4xx): malformed payload.
    BadRequest,
    /// HTTP 404: wrong database, page or calendar identifier.
    NotFound,
    /// HTTP 429.
    RateLimited,
    /// HTTP 5xx.
    ServerError,
    /// Connection failed, timed out, or the transport broke.
    NetworkError,
    /// The vendor answered with something we could not parse.
    InvalidResponse,
    /// Failure inside the client itself.
    Internal,
}

impl ProviderErrorCode {
    /// Returns true if the request may be retried with bounded backoff.
    ///
    /// Client errors, including 429, are never retried.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::NetworkError | Self::ServerError)
    }

    /// Returns a stable snake_case name for this error code.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MissingCredential => "missing_credential",
            Self::InvalidInput => "invalid_input",
            Self::Unauthorized => "unauthorized",
            Self::Forbidden => "forbidden",
            Self::BadRequest => "bad_request",
            Self::NotFound => "not_found",
            Self::RateLimited => "rate_limited",
            Self::ServerError => "server_error",
            Self::NetworkError => "network_error",
            Self::InvalidResponse => "invalid_response",
            Self::Internal => "internal_error",
        }
    }

    /// Maps a non-success HTTP status to an error code.
    pub fn from_status(status: StatusCode) -> Self {
        match status {
            StatusCode::UNAUTHORIZED => Self::Unauthorized,
            StatusCode::FORBIDDEN => Self::Forbidden,
            StatusCode::NOT_FOUND => Self::NotFound,
            StatusCode::TOO_MANY_REQUESTS => Self::RateLimited,
            s if s.is_server_error() => Self::ServerError,
            _ => Self::BadRequest,
        }
    }
}

impl fmt::Display for ProviderErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An error that occurred while talking to a vendor API.
#[derive(Debug, Error)]
pub struct ProviderError {
    code: ProviderErrorCode,
    message: String,
    /// The service that generated this error (e.g. "gmail", "notion").
    provider: Option<String>,
    /// HTTP status, when the error came from a vendor response.
    status: Option<u16>,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl ProviderError {
    /// Creates a new provider error with the given code and message.
    pub fn new(code: ProviderErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            provider: None,
            status: None,
            source: None,
        }
    }

    /// Creates an error from a non-success vendor response.
    pub fn from_status(status: StatusCode, message: impl Into<String>) -> Self {
        let mut err = Self::new(ProviderErrorCode::from_status(status), message);
        err.status = Some(status.as_u16());
        err
    }

    /// Creates a missing credential error.
    pub fn missing_credential(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::MissingCredential, message)
    }

    /// Creates a local validation error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::InvalidInput, message)
    }

    /// Creates an unauthorized error.
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::Unauthorized, message)
    }

    /// Creates a forbidden error.
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::Forbidden, message)
    }

    /// Creates a bad request error.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::BadRequest, message)
    }

    /// Creates a not found error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::NotFound, message)
    }

    /// Creates a network error.
    pub fn network(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::NetworkError, message)
    }

    /// Creates a server error.
    pub fn server(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::ServerError, message)
    }

    /// Creates an invalid response error.
    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::InvalidResponse, message)
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::Internal, message)
    }

    /// Sets the provider name for this error.
    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }

    /// Sets the source error for this error.
    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        self.source = Some(Box::new(source));
        self
    }

    /// Returns the error code.
    pub fn code(&self) -> ProviderErrorCode {
        self.code
    }

    /// Returns the error message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the provider name, if set.
    pub fn provider(&self) -> Option<&str> {
        self.provider.as_deref()
    }

    /// Returns the HTTP status, if the error came from a vendor response.
    pub fn status(&self) -> Option<u16> {
        self.status
    }

    /// Returns true if this error is transient and may be retried.
    pub fn is_retryable(&self) -> bool {
        self.code.is_retryable()
    }
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(ref provider) = self.provider {
            write!(f, "[{}] ", provider)?;
        }
        write!(f, "{}", self.code)?;
        if let Some(status) = self.status {
            write!(f, " (HTTP {})", status)?;
        }
        write!(f, ": {}", self.message)
    }
}

impl From<ValidationError> for ProviderError {
    fn from(err: ValidationError) -> Self {
        Self::invalid_input(err.to_string()).with_source(err)
    }
}

/// A specialized Result type for provider operations.
pub type ProviderResult<T> = Result<T, ProviderError>;
