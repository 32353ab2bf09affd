//! Database query filters.
//!
//! A [`MeetingFilter`] holds at most one condition per property. Set
//! conditions are combined with `and`.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use meetagenda_core::MeetingStatus;
use serde_json::{Value, json};

use super::properties::PropertyNames;

/// Comparison applied to the Date property.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateCondition {
    /// Same day.
    Equals,
    /// Strictly earlier.
    Before,
    /// Strictly later.
    After,
    /// Same day or earlier.
    OnOrBefore,
    /// Same day or later.
    OnOrAfter,
}

impl DateCondition {
    /// Returns the Notion filter operator.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Equals => "equals",
            Self::Before => "before",
            Self::After => "after",
            Self::OnOrBefore => "on_or_before",
            Self::OnOrAfter => "on_or_after",
        }
    }
}

impl fmt::Display for DateCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DateCondition {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "equals" | "eq" => Ok(Self::Equals),
            "before" => Ok(Self::Before),
            "after" => Ok(Self::After),
            "on_or_before" => Ok(Self::OnOrBefore),
            "on_or_after" => Ok(Self::OnOrAfter),
            _ => Err(format!(
                "invalid date condition '{}', expected equals, before, after, on_or_before or on_or_after",
                s
            )),
        }
    }
}

/// Comparison applied to a text property.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextCondition {
    /// Substring match.
    Contains,
    /// No substring match.
    DoesNotContain,
    /// Exact match.
    Equals,
}

impl TextCondition {
    /// Returns the Notion filter operator.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Contains => "contains",
            Self::DoesNotContain => "does_not_contain",
            Self::Equals => "equals",
        }
    }
}

impl fmt::Display for TextCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TextCondition {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "contains" => Ok(Self::Contains),
            "does_not_contain" | "not_contains" => Ok(Self::DoesNotContain),
            "equals" | "eq" => Ok(Self::Equals),
            _ => Err(format!(
                "invalid text condition '{}', expected contains, does_not_contain or equals",
                s
            )),
        }
    }
}

/// Conditions for a database query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MeetingFilter {
    /// Status equals.
    pub status: Option<MeetingStatus>,
    /// Date comparison.
    pub date: Option<(DateCondition, NaiveDate)>,
    /// Discussion topics comparison.
    pub discussion_topics: Option<(TextCondition, String)>,
    /// Title contains.
    pub title_contains: Option<String>,
    /// Attendees contain.
    pub attendee: Option<String>,
}

impl MeetingFilter {
    /// Creates an empty filter that matches every row.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to match a status.
    pub fn with_status(mut self, status: MeetingStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Builder method to compare the date.
    pub fn with_date(mut self, condition: DateCondition, date: NaiveDate) -> Self {
        self.date = Some((condition, date));
        self
    }

    /// Builder method to compare discussion topics.
    pub fn with_discussion_topics(
        mut self,
        condition: TextCondition,
        value: impl Into<String>,
    ) -> Self {
        self.discussion_topics = Some((condition, value.into()));
        self
    }

    /// Builder method to match part of the title.
    pub fn with_title_contains(mut self, value: impl Into<String>) -> Self {
        self.title_contains = Some(value.into());
        self
    }

    /// Builder method to match an attendee.
    pub fn with_attendee(mut self, name: impl Into<String>) -> Self {
        self.attendee = Some(name.into());
        self
    }

    /// Returns true if no condition is set.
    pub fn is_empty(&self) -> bool {
        self.status.is_none()
            && self.date.is_none()
            && self.discussion_topics.is_none()
            && self.title_contains.is_none()
            && self.attendee.is_none()
    }

    /// Builds the `filter` object of a query request, `None` when empty.
    pub(crate) fn to_notion(&self, names: &PropertyNames) -> Option<Value> {
        let mut conditions = Vec::new();

        if let Some(status) = self.status {
            conditions.push(json!({
                "property": names.status,
                "select": {"equals": status.as_str()}
            }));
        }
        if let Some((condition, date)) = self.date {
            conditions.push(json!({
                "property": names.date,
                "date": {condition.as_str(): date.format("%Y-%m-%d").to_string()}
            }));
        }
        if let Some((condition, value)) = &self.discussion_topics {
            conditions.push(json!({
                "property": names.discussion_topics,
                "rich_text": {condition.as_str(): value}
            }));
        }
        if let Some(value) = &self.title_contains {
            conditions.push(json!({
                "property": names.title,
                "title": {"contains": value}
            }));
        }
        if let Some(name) = &self.attendee {
            conditions.push(json!({
                "property": names.attendees,
                "multi_select": {"contains": name}
            }));
        }

        match conditions.len() {
            0 => None,
            1 => conditions.pop(),
            _ => Some(json!({ "and": conditions })),
        }
    }
}
