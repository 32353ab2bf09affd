//! Local validation errors.
//!
//! These are raised before any request leaves the process. Vendor-side
//! failures are modelled separately in `meetagenda-providers`.

use thiserror::Error;

/// A value was rejected by local validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field was empty or absent.
    #[error("missing required field `{0}`")]
    MissingField(&'static str),

    /// The email subject was empty.
    #[error("email subject must not be empty")]
    EmptySubject,

    /// No recipients were supplied.
    #[error("at least one recipient is required")]
    NoRecipients,

    /// An address did not look like an email address.
    #[error("invalid email address `{0}`")]
    InvalidEmail(String),

    /// A status outside Scheduled, Ongoing, Completed, Cancelled.
    #[error("invalid meeting status `{0}` (expected Scheduled, Ongoing, Completed or Cancelled)")]
    InvalidStatus(String),

    /// A Notion database id that is not 32 hex characters.
    #[error("invalid Notion database id `{0}` (expected 32 hexadecimal characters without separators)")]
    InvalidDatabaseId(String),

    /// A date that could not be parsed.
    #[error("invalid date `{0}` (expected YYYY-MM-DD)")]
    InvalidDate(String),
}
