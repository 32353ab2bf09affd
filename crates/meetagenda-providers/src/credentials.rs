//! Bearer credentials and where they come from.
//!
//! A [`ConfigSource`] answers "what is the value of variable X". The
//! [`TokenLoader`] walks the candidate variables of a [`Capability`] in order
//! and returns the first non-empty value as a [`Credential`]. Clients never
//! see the source; they are handed a [`CredentialProvider`] instead.
//!
//! Nothing here validates token shape or talks to the network. An expired or
//! malformed token is only detected when the vendor answers 401.

use std::collections::HashMap;
use std::fmt;

use crate::BoxFuture;
use crate::error::{ProviderError, ProviderResult};

/// A read-only lookup of named configuration values.
pub trait ConfigSource: Send + Sync {
    /// Returns the raw value for `name`, if set.
    fn get(&self, name: &str) -> Option<String>;
}

/// The process environment.
///
/// The CLI loads the project `.env` into the environment before anything
/// reads from this source.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvSource;

impl ConfigSource for EnvSource {
    fn get(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

impl ConfigSource for HashMap<String, String> {
    fn get(&self, name: &str) -> Option<String> {
        HashMap::get(self, name).cloned()
    }
}

/// An ordered stack of sources. The first layer holding a non-empty value
/// for a name wins.
#[derive(Default)]
pub struct LayeredSource {
    layers: Vec<Box<dyn ConfigSource>>,
}

impl LayeredSource {
    /// Creates an empty stack.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to append a lower-priority layer.
    pub fn with_layer(mut self, layer: impl ConfigSource + 'static) -> Self {
        self.layers.push(Box::new(layer));
        self
    }

    /// Returns the number of layers.
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    /// Returns true if no layer was added.
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }
}

impl ConfigSource for LayeredSource {
    fn get(&self, name: &str) -> Option<String> {
        self.layers
            .iter()
            .find_map(|layer| non_empty(layer.get(name)))
    }
}

impl fmt::Debug for LayeredSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LayeredSource")
            .field("layers", &self.layers.len())
            .finish()
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// A vendor capability that needs its own bearer credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// Sending mail through Gmail.
    Gmail,
    /// Creating Google Calendar events.
    Calendar,
    /// Reading and writing the Notion database.
    Notion,
    /// Web search through Serper.
    Search,
}

impl Capability {
    /// All capabilities.
    pub const ALL: [Capability; 4] = [Self::Gmail, Self::Calendar, Self::Notion, Self::Search];

    /// Variables consulted for this capability, in priority order.
    pub fn candidates(&self) -> &'static [&'static str] {
        match self {
            Self::Gmail => &["GMAIL_ACCESS_TOKEN"],
            Self::Calendar => &["GOOGLE_CALENDAR_ACCESS_TOKEN", "GMAIL_ACCESS_TOKEN"],
            Self::Notion => &["NOTION_API_KEY"],
            Self::Search => &["SERPER_API_KEY"],
        }
    }

    /// Returns a short lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gmail => "gmail",
            Self::Calendar => "calendar",
            Self::Notion => "notion",
            Self::Search => "search",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An opaque bearer secret plus the variable it was read from.
///
/// `Debug` and `Display` only show the first four characters.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    variable: String,
    secret: String,
}

impl Credential {
    /// Wraps a secret read from `variable`.
    pub fn new(variable: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            variable: variable.into(),
            secret: secret.into(),
        }
    }

    /// Returns the raw secret. Only for building the `Authorization` header.
    pub fn secret(&self) -> &str {
        &self.secret
    }

    /// Returns the name of the variable that held the secret.
    pub fn variable(&self) -> &str {
        &self.variable
    }

    /// Returns a printable form: first four characters then `***`.
    pub fn masked(&self) -> String {
        let prefix: String = self.secret.chars().take(4).collect();
        if self.secret.chars().count() <= 4 {
            "***".to_string()
        } else {
            format!("{}***", prefix)
        }
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("variable", &self.variable)
            .field("secret", &self.masked())
            .finish()
    }
}

impl fmt::Display for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.masked(), self.variable)
    }
}

/// Resolves credentials and plain settings from a [`ConfigSource`].
#[derive(Debug, Clone, Copy, Default)]
pub struct TokenLoader;

impl TokenLoader {
    /// Loads the bearer credential for `capability`.
    ///
    /// Candidates are tried in order; blank values count as unset.
    ///
    /// # Errors
    ///
    /// Returns `MissingCredential` naming every candidate when none is set.
    pub fn load(source: &dyn ConfigSource, capability: Capability) -> ProviderResult<Credential> {
        for name in capability.candidates() {
            if let Some(value) = non_empty(source.get(name)) {
                tracing::debug!(capability = %capability, variable = *name, "credential loaded");
                return Ok(Credential::new(*name, value));
            }
        }

        let names = capability.candidates();
        let hint = if names.len() == 1 {
            format!("set {}", names[0])
        } else {
            format!("set one of {}", names.join(", "))
        };
        Err(
            ProviderError::missing_credential(format!("no {} credential: {}", capability, hint))
                .with_provider(capability.as_str()),
        )
    }

    /// Returns the first non-empty value among `names`, for non-secret
    /// settings such as `NOTION_DATABASE_ID`.
    pub fn lookup(source: &dyn ConfigSource, names: &[&str]) -> Option<String> {
        names.iter().find_map(|name| non_empty(source.get(name)))
    }
}

/// Supplies the bearer credential for each request.
pub trait CredentialProvider: Send + Sync {
    /// Short human-readable description, safe to log.
    fn describe(&self) -> &str;

    /// Returns the credential to put in the `Authorization` header.
    fn bearer(&self) -> BoxFuture<'_, ProviderResult<Credential>>;
}

/// A credential loaded once and never refreshed.
#[derive(Debug, Clone)]
pub struct StaticToken {
    credential: Credential,
    description: String,
}

impl StaticToken {
    /// Wraps an already loaded credential.
    pub fn new(credential: Credential) -> Self {
        let description = format!("static token from {}", credential.variable());
        Self {
            credential,
            description,
        }
    }

    /// Loads the credential for `capability` and wraps it.
    pub fn load(source: &dyn ConfigSource, capability: Capability) -> ProviderResult<Self> {
        TokenLoader::load(source, capability).map(Self::new)
    }
}

impl CredentialProvider for StaticToken {
    fn describe(&self) -> &str {
        &self.description
    }

    fn bearer(&self) -> BoxFuture<'_, ProviderResult<Credential>> {
        let credential = self.credential.clone();
        Box::pin(async move { Ok(credential) })
    }
}
