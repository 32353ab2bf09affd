//! Credential-scoped clients for the vendor APIs used by meetagenda.
//!
//! - [`credentials`] - [`TokenLoader`] and the [`CredentialProvider`] seam
//! - [`gmail`] - [`GmailClient`], sends meeting invitations
//! - [`calendar`] - [`GoogleCalendarClient`], creates events
//! - [`notion`] - [`NotionClient`], reads and writes the meetings database
//! - [`search`] - [`ResourceSearch`] and the Serper implementation
//! - [`error`] - [`ProviderError`] and its status-derived codes
//!
//! # Architecture
//!
//! ```text
//!  config source ──► TokenLoader ──► Credential ──► StaticToken
//!                                                        │
//!                                                        ▼
//!               ┌────────────┬────────────────┬──────────────┐
//!               │ GmailClient│ CalendarClient │ NotionClient │
//!               └─────┬──────┴───────┬────────┴──────┬───────┘
//!                     └───── ApiTransport (bearer, retry, status mapping)
//! ```
//!
//! Every client holds its own credential provider; there is no shared
//! global token state.
//!
//! # Example
//!
//! ```ignore
//! use meetagenda_providers::{Capability, EnvSource, GmailClient, HttpSettings, StaticToken, TokenLoader};
//!
//! let credential = TokenLoader::load(&EnvSource, Capability::Gmail)?;
//! let gmail = GmailClient::new(StaticToken::new(credential), &HttpSettings::default())?;
//! ```

use std::future::Future;
use std::pin::Pin;

pub mod calendar;
pub mod credentials;
pub mod error;
pub mod gmail;
mod http;
pub mod notion;
pub mod search;

#[cfg(test)]
pub(crate) mod test_server;

/// A boxed future for trait methods that must stay object safe.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub use calendar::{CreatedEvent, GoogleCalendarClient, SendUpdates};
pub use credentials::{
    Capability, ConfigSource, Credential, CredentialProvider, EnvSource, LayeredSource,
    StaticToken, TokenLoader,
};
pub use error::{ProviderError, ProviderErrorCode, ProviderResult};
pub use gmail::{DeliveryResult, GmailClient, MeetingEmailRequest};
pub use http::{DEFAULT_TIMEOUT, HttpSettings, RetryPolicy};
pub use notion::{
    AgendaBlock, AgendaTopic, CreatedPage, DateCondition, MeetingFilter, NotionClient,
    PropertyNames, TextCondition, agenda_blocks,
};
pub use search::{ResourceSearch, SerperClient};
