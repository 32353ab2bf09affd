//! Meeting records as stored in the Notion meetings database.
//!
//! A [`MeetingRecord`] mirrors one row of a database with six properties:
//! Title, Date, Status, Attendees, Discussion Topics and Action Items.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Lifecycle state of a meeting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MeetingStatus {
    /// Planned, not started yet.
    Scheduled,
    /// Currently taking place.
    Ongoing,
    /// Took place.
    Completed,
    /// Will not take place.
    Cancelled,
}

impl MeetingStatus {
    /// All accepted values, in the order they are usually shown.
    pub const ALL: [MeetingStatus; 4] = [
        Self::Scheduled,
        Self::Ongoing,
        Self::Completed,
        Self::Cancelled,
    ];

    /// Returns the canonical spelling used as the Notion select option name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Scheduled => "Scheduled",
            Self::Ongoing => "Ongoing",
            Self::Completed => "Completed",
            Self::Cancelled => "Cancelled",
        }
    }
}

impl fmt::Display for MeetingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MeetingStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Self::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| ValidationError::InvalidStatus(s.to_string()))
    }
}

/// Identifier of a Notion database: 32 hexadecimal characters, no dashes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct DatabaseId(String);

impl DatabaseId {
    /// Length of a valid identifier.
    pub const LEN: usize = 32;

    /// Parses and validates a database identifier.
    pub fn parse(value: &str) -> Result<Self, ValidationError> {
        let trimmed = value.trim();
        if trimmed.len() != Self::LEN || !trimmed.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(ValidationError::InvalidDatabaseId(value.to_string()));
        }
        Ok(Self(trimmed.to_ascii_lowercase()))
    }

    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DatabaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for DatabaseId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// One row of the meetings database.
///
/// Fields left as `None` (or an empty attendee list) are not sent on update,
/// so a partially filled record can be used to patch an existing page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeetingRecord {
    /// Notion page id, present for rows read back or to be updated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_id: Option<String>,
    /// Notion page URL, present for rows read back.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Meeting title.
    pub title: String,
    /// Meeting date.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    /// Meeting status.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<MeetingStatus>,
    /// Attendee names, deduplicated in first-seen order.
    #[serde(default)]
    pub attendees: Vec<String>,
    /// Free text discussion topics.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discussion_topics: Option<String>,
    /// Free text action items.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_items: Option<String>,
}

impl MeetingRecord {
    /// Creates a record with only a title set.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    /// Builder method to target an existing page.
    pub fn with_page_id(mut self, page_id: impl Into<String>) -> Self {
        self.page_id = Some(page_id.into());
        self
    }

    /// Builder method to set the date.
    pub fn with_date(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    /// Builder method to set the status.
    pub fn with_status(mut self, status: MeetingStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Builder method to set attendees. Duplicates and blanks are dropped.
    pub fn with_attendees<I, S>(mut self, attendees: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.attendees = dedup_preserving_order(attendees.into_iter().map(Into::into));
        self
    }

    /// Builder method to set discussion topics.
    pub fn with_discussion_topics(mut self, topics: impl Into<String>) -> Self {
        self.discussion_topics = Some(topics.into());
        self
    }

    /// Builder method to set action items.
    pub fn with_action_items(mut self, items: impl Into<String>) -> Self {
        self.action_items = Some(items.into());
        self
    }

    /// Checks the fields required to create a new row.
    pub fn validate_for_create(&self) -> Result<(), ValidationError> {
        if self.title.trim().is_empty() {
            return Err(ValidationError::MissingField("title"));
        }
        Ok(())
    }
}

/// Parses a `YYYY-MM-DD` date, also accepting a full timestamp by looking at
/// its date part only.
pub fn parse_date(value: &str) -> Result<NaiveDate, ValidationError> {
    let trimmed = value.trim();
    let date_part = trimmed.get(..10).unwrap_or(trimmed);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
        .map_err(|_| ValidationError::InvalidDate(value.to_string()))
}

/// Removes blank and duplicate entries, keeping the first occurrence.
pub(crate) fn dedup_preserving_order<I>(items: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut out: Vec<String> = Vec::new();
    for item in items {
        let item = item.trim().to_string();
        if !item.is_empty() && !out.contains(&item) {
            out.push(item);
        }
    }
    out
}
