//! Mapping between [`MeetingRecord`] and Notion page properties.

use chrono::NaiveDate;
use meetagenda_core::{MeetingRecord, MeetingStatus, parse_date};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use tracing::warn;

use crate::error::{ProviderError, ProviderResult};

/// Notion rejects text objects longer than this.
pub const MAX_TEXT_CHUNK: usize = 2000;

/// Notion rejects rich text arrays with more elements than this.
pub const MAX_TEXT_ITEMS: usize = 100;

/// Names of the six database properties.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PropertyNames {
    /// Title property.
    pub title: String,
    /// Date property.
    pub date: String,
    /// Status property (select or status type).
    pub status: String,
    /// Attendees property (multi-select).
    pub attendees: String,
    /// Discussion topics property (rich text).
    pub discussion_topics: String,
    /// Action items property (rich text).
    pub action_items: String,
}

impl Default for PropertyNames {
    fn default() -> Self {
        Self {
            title: "Title".to_string(),
            date: "Date".to_string(),
            status: "Status".to_string(),
            attendees: "Attendees".to_string(),
            discussion_topics: "Discussion Topics".to_string(),
            action_items: "Action Items".to_string(),
        }
    }
}

/// Splits `text` into rich text objects of at most [`MAX_TEXT_CHUNK`]
/// characters each.
pub(crate) fn rich_text(text: &str) -> Value {
    let chars: Vec<char> = text.chars().collect();
    let chunks: Vec<Value> = chars
        .chunks(MAX_TEXT_CHUNK)
        .map(|chunk| {
            let content: String = chunk.iter().collect();
            json!({"type": "text", "text": {"content": content}})
        })
        .collect();
    Value::Array(chunks)
}

/// Rejects `text` when it needs more than [`MAX_TEXT_ITEMS`] chunks.
pub(crate) fn check_text(field: &str, text: &str) -> ProviderResult<()> {
    let len = text.chars().count();
    if len > MAX_TEXT_CHUNK * MAX_TEXT_ITEMS {
        return Err(ProviderError::invalid_input(format!(
            "{} is {} characters long, at most {} can be stored",
            field,
            len,
            MAX_TEXT_CHUNK * MAX_TEXT_ITEMS
        ))
        .with_provider("notion"));
    }
    Ok(())
}

/// Checks every text field of `record` against the rich text limits.
pub(crate) fn check_record_text(record: &MeetingRecord, names: &PropertyNames) -> ProviderResult<()> {
    check_text(&names.title, &record.title)?;
    if let Some(topics) = &record.discussion_topics {
        check_text(&names.discussion_topics, topics)?;
    }
    if let Some(items) = &record.action_items {
        check_text(&names.action_items, items)?;
    }
    Ok(())
}

/// Serializes the fields of `record` that are set.
///
/// A blank title, no date, no status, no attendees or no text leave the
/// corresponding property out, so the same map serves create and update.
pub(crate) fn record_properties(record: &MeetingRecord, names: &PropertyNames) -> Map<String, Value> {
    let mut props = Map::new();

    let title = record.title.trim();
    if !title.is_empty() {
        props.insert(names.title.clone(), json!({"title": rich_text(title)}));
    }
    if let Some(date) = record.date {
        props.insert(
            names.date.clone(),
            json!({"date": {"start": date.format("%Y-%m-%d").to_string()}}),
        );
    }
    if let Some(status) = record.status {
        props.insert(
            names.status.clone(),
            json!({"select": {"name": status.as_str()}}),
        );
    }
    if !record.attendees.is_empty() {
        let options: Vec<Value> = record
            .attendees
            .iter()
            .map(|name| json!({"name": name}))
            .collect();
        props.insert(names.attendees.clone(), json!({"multi_select": options}));
    }
    if let Some(topics) = &record.discussion_topics {
        props.insert(
            names.discussion_topics.clone(),
            json!({"rich_text": rich_text(topics)}),
        );
    }
    if let Some(items) = &record.action_items {
        props.insert(
            names.action_items.clone(),
            json!({"rich_text": rich_text(items)}),
        );
    }

    props
}

/// Reads a page object into a record.
///
/// Returns `None` for pages whose title is blank. Unknown status values are
/// logged and left unset.
pub(crate) fn parse_page(page: &Value, names: &PropertyNames) -> Option<MeetingRecord> {
    let props = page.get("properties")?.as_object()?;

    let title_prop = props.get(&names.title).or_else(|| {
        props
            .values()
            .find(|p| p.get("type").and_then(Value::as_str) == Some("title"))
    })?;
    let title = plain_text(title_prop.get("title")?);
    let title = title.trim();
    if title.is_empty() {
        return None;
    }

    let mut record = MeetingRecord::new(title);
    record.page_id = page.get("id").and_then(Value::as_str).map(String::from);
    record.url = page.get("url").and_then(Value::as_str).map(String::from);
    record.date = props.get(&names.date).and_then(read_date);
    record.status = props
        .get(&names.status)
        .and_then(|p| read_status(p, record.page_id.as_deref()));
    record.attendees = props.get(&names.attendees).map(read_names).unwrap_or_default();
    record.discussion_topics = props.get(&names.discussion_topics).and_then(read_text);
    record.action_items = props.get(&names.action_items).and_then(read_text);

    Some(record)
}

/// Concatenates the text of a rich text or title array.
fn plain_text(array: &Value) -> String {
    array
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|item| {
                    item.get("plain_text")
                        .or_else(|| item.pointer("/text/content"))
                        .and_then(Value::as_str)
                })
                .collect()
        })
        .unwrap_or_default()
}

fn read_date(prop: &Value) -> Option<NaiveDate> {
    let start = prop.pointer("/date/start")?.as_str()?;
    parse_date(start).ok()
}

fn read_status(prop: &Value, page_id: Option<&str>) -> Option<MeetingStatus> {
    let name = prop
        .pointer("/select/name")
        .or_else(|| prop.pointer("/status/name"))?
        .as_str()?;
    match name.parse() {
        Ok(status) => Some(status),
        Err(_) => {
            warn!(page_id, status = name, "ignoring unknown meeting status");
            None
        }
    }
}

fn read_names(prop: &Value) -> Vec<String> {
    let names: Vec<String> = if let Some(options) = prop.get("multi_select").and_then(Value::as_array) {
        options
            .iter()
            .filter_map(|o| o.get("name").and_then(Value::as_str))
            .map(String::from)
            .collect()
    } else if let Some(people) = prop.get("people").and_then(Value::as_array) {
        people
            .iter()
            .filter_map(|p| p.get("name").and_then(Value::as_str))
            .map(String::from)
            .collect()
    } else if let Some(text) = prop.get("rich_text") {
        plain_text(text).split(',').map(String::from).collect()
    } else {
        Vec::new()
    };
    MeetingRecord::default().with_attendees(names).attendees
}

fn read_text(prop: &Value) -> Option<String> {
    let text = plain_text(prop.get("rich_text")?);
    if text.trim().is_empty() { None } else { Some(text) }
}
