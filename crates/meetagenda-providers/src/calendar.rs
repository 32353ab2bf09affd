//! Google Calendar event creation.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use meetagenda_core::CalendarEvent;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::credentials::CredentialProvider;
use crate::error::{ProviderError, ProviderResult};
use crate::http::{ApiTransport, HttpSettings};

/// Base URL for Google Calendar API v3.
pub const CALENDAR_API_BASE: &str = "https://www.googleapis.com/calendar/v3";

/// Calendar used when none is configured.
pub const DEFAULT_CALENDAR_ID: &str = "primary";

/// Who Google notifies about the new event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SendUpdates {
    /// Every attendee gets an invitation.
    #[default]
    All,
    /// Only attendees outside the organizer's domain.
    ExternalOnly,
    /// Nobody.
    None,
}

impl SendUpdates {
    /// Returns the value of the `sendUpdates` query parameter.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::ExternalOnly => "externalOnly",
            Self::None => "none",
        }
    }
}

impl fmt::Display for SendUpdates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SendUpdates {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(Self::All),
            "externalonly" | "external-only" | "external_only" => Ok(Self::ExternalOnly),
            "none" => Ok(Self::None),
            other => Err(format!(
                "invalid sendUpdates value '{}', expected all, externalOnly or none",
                other
            )),
        }
    }
}

/// The event as created by Google.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedEvent {
    /// Event id.
    pub id: String,
    /// Link to the event in the Calendar web UI.
    #[serde(default)]
    pub html_link: String,
}

/// Google Calendar API client.
pub struct GoogleCalendarClient {
    transport: ApiTransport,
    credentials: Arc<dyn CredentialProvider>,
    base_url: String,
    send_updates: SendUpdates,
}

impl GoogleCalendarClient {
    /// Creates a client that authenticates with `credentials`.
    pub fn new(
        credentials: impl CredentialProvider + 'static,
        settings: &HttpSettings,
    ) -> ProviderResult<Self> {
        Ok(Self {
            transport: ApiTransport::new("calendar", settings)?,
            credentials: Arc::new(credentials),
            base_url: CALENDAR_API_BASE.to_string(),
            send_updates: SendUpdates::default(),
        })
    }

    /// Builder method to point the client at another endpoint.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Builder method to choose who is notified.
    pub fn with_send_updates(mut self, send_updates: SendUpdates) -> Self {
        self.send_updates = send_updates;
        self
    }

    /// Creates `event` in `calendar_id`.
    ///
    /// Only required-field presence is checked locally; timestamp and
    /// timezone format errors come back from Google as `BadRequest`.
    pub async fn create_event(
        &self,
        calendar_id: &str,
        event: &CalendarEvent,
    ) -> ProviderResult<CreatedEvent> {
        let calendar_id = calendar_id.trim();
        if calendar_id.is_empty() {
            return Err(ProviderError::invalid_input("calendar id is empty").with_provider("calendar"));
        }
        event
            .validate()
            .map_err(|e| ProviderError::from(e).with_provider("calendar"))?;

        let token = self.credentials.bearer().await?;
        let url = format!(
            "{}/calendars/{}/events",
            self.base_url,
            urlencoding::encode(calendar_id)
        );
        debug!(
            calendar_id,
            attendees = event.attendees.len(),
            send_updates = %self.send_updates,
            "creating calendar event"
        );

        let created: CreatedEvent = self
            .transport
            .send_json("create event", |http| {
                http.post(&url)
                    .bearer_auth(token.secret())
                    .query(&[("sendUpdates", self.send_updates.as_str())])
                    .json(event)
            })
            .await?;

        info!(event_id = %created.id, "calendar event created");
        Ok(created)
    }
}
