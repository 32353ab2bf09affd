//! Calendar events as sent to the Google Calendar API.
//!
//! The serialized form of [`CalendarEvent`] is the request body of
//! `events.insert`: `summary`, `start`/`end` with `dateTime` and `timeZone`,
//! `attendees` as `{ "email": ... }` objects, and the optional `location` and
//! `description`.
//!
//! Timestamps are kept as strings. Their format is checked by the vendor,
//! not here; only presence of the required fields is validated locally.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::meeting::dedup_preserving_order;

/// A start or end time with its IANA timezone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventTime {
    /// ISO-8601 timestamp, e.g. `2024-12-10T10:00:00`.
    pub date_time: String,
    /// IANA timezone name, e.g. `Asia/Hong_Kong`.
    pub time_zone: String,
}

impl EventTime {
    /// Creates a new event time.
    pub fn new(date_time: impl Into<String>, time_zone: impl Into<String>) -> Self {
        Self {
            date_time: date_time.into(),
            time_zone: time_zone.into(),
        }
    }
}

/// An invited attendee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventAttendee {
    /// Attendee email address.
    pub email: String,
}

/// A calendar event to create.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarEvent {
    /// Event title.
    pub summary: String,
    /// Start time.
    pub start: EventTime,
    /// End time.
    pub end: EventTime,
    /// Free text description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Invited attendees.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attendees: Vec<EventAttendee>,
    /// Free text location.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

impl CalendarEvent {
    /// Creates an event whose start and end share the same timezone.
    pub fn new(
        summary: impl Into<String>,
        start: impl Into<String>,
        end: impl Into<String>,
        time_zone: impl Into<String>,
    ) -> Self {
        let time_zone = time_zone.into();
        Self {
            summary: summary.into(),
            start: EventTime::new(start, time_zone.clone()),
            end: EventTime::new(end, time_zone),
            description: None,
            attendees: Vec::new(),
            location: None,
        }
    }

    /// Builder method to set attendees. Duplicates and blanks are dropped.
    pub fn with_attendees<I, S>(mut self, emails: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.attendees = dedup_preserving_order(emails.into_iter().map(Into::into))
            .into_iter()
            .map(|email| EventAttendee { email })
            .collect();
        self
    }

    /// Builder method to set the location.
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// Builder method to set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Checks that summary, start and end are present.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.summary.trim().is_empty() {
            return Err(ValidationError::MissingField("summary"));
        }
        if self.start.date_time.trim().is_empty() {
            return Err(ValidationError::MissingField("start"));
        }
        if self.end.date_time.trim().is_empty() {
            return Err(ValidationError::MissingField("end"));
        }
        Ok(())
    }
}
