//! Client error types.

use std::fmt;

use meetagenda_providers::{ProviderError, ProviderErrorCode};

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors surfaced by the CLI.
#[derive(Debug)]
pub enum ClientError {
    /// Configuration error.
    Config(String),
    /// Vendor or local validation error from a provider.
    Provider(ProviderError),
    /// Bad command-line value.
    InvalidArgument(String),
    /// IO error.
    Io(std::io::Error),
    /// JSON output could not be produced.
    Serialization(serde_json::Error),
}

impl ClientError {
    /// Suggests how to fix the error, when there is something to suggest.
    pub fn hint(&self) -> Option<String> {
        let Self::Provider(err) = self else {
            return None;
        };
        let provider = err.provider().unwrap_or("the vendor");
        match err.code() {
            ProviderErrorCode::MissingCredential => Some(
                "export the variable or add it to .env or [credentials] in config.toml".to_string(),
            ),
            ProviderErrorCode::Unauthorized => Some(format!(
                "the {} token was rejected; obtain a new one, tokens are not refreshed automatically",
                provider
            )),
            ProviderErrorCode::Forbidden => Some(match err.provider() {
                Some("gmail") => "the token lacks the gmail.send scope".to_string(),
                Some("calendar") => {
                    "the token lacks the calendar scope or write access to this calendar"
                        .to_string()
                }
                Some("notion") => {
                    "share the database with the integration (Connections in the page menu)"
                        .to_string()
                }
                _ => format!("the {} token is not allowed to do this", provider),
            }),
            ProviderErrorCode::NotFound => Some(match err.provider() {
                Some("notion") => {
                    "check NOTION_DATABASE_ID and that the database is shared with the integration"
                        .to_string()
                }
                _ => "check the id and the configured endpoint".to_string(),
            }),
            _ => None,
        }
    }

    /// Returns the provider error code, if any.
    pub fn provider_code(&self) -> Option<ProviderErrorCode> {
        match self {
            Self::Provider(err) => Some(err.code()),
            _ => None,
        }
    }
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "configuration error: {}", msg),
            Self::Provider(err) => write!(f, "{}", err),
            Self::InvalidArgument(msg) => write!(f, "invalid argument: {}", msg),
            Self::Io(err) => write!(f, "IO error: {}", err),
            Self::Serialization(err) => write!(f, "serialization error: {}", err),
        }
    }
}

impl std::error::Error for ClientError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Provider(err) => Some(err),
            Self::Io(err) => Some(err),
            Self::Serialization(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ClientError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<ProviderError> for ClientError {
    fn from(err: ProviderError) -> Self {
        Self::Provider(err)
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err)
    }
}

impl From<meetagenda_core::ValidationError> for ClientError {
    fn from(err: meetagenda_core::ValidationError) -> Self {
        Self::Provider(err.into())
    }
}
