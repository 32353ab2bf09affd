//! Page content blocks for agenda pages.

use serde_json::{Value, json};

use super::properties::rich_text;

/// Notion accepts at most this many children in one request.
pub const MAX_CHILDREN: usize = 100;

/// One block of page content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AgendaBlock {
    /// Section heading.
    Heading2(String),
    /// Sub-heading.
    Heading3(String),
    /// Plain paragraph.
    Paragraph(String),
    /// Bullet point.
    Bullet(String),
}

impl AgendaBlock {
    fn kind(&self) -> &'static str {
        match self {
            Self::Heading2(_) => "heading_2",
            Self::Heading3(_) => "heading_3",
            Self::Paragraph(_) => "paragraph",
            Self::Bullet(_) => "bulleted_list_item",
        }
    }

    pub(crate) fn text(&self) -> &str {
        match self {
            Self::Heading2(t) | Self::Heading3(t) | Self::Paragraph(t) | Self::Bullet(t) => t,
        }
    }

    /// Returns the Notion block object.
    pub fn to_notion(&self) -> Value {
        let kind = self.kind();
        json!({
            "object": "block",
            "type": kind,
            kind: {"rich_text": rich_text(self.text())}
        })
    }
}

/// An agenda item: a short title and optional details.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgendaTopic {
    /// Heading text.
    pub title: String,
    /// Paragraph under the heading.
    pub details: Option<String>,
}

impl AgendaTopic {
    /// Creates a topic.
    pub fn new(title: impl Into<String>, details: Option<String>) -> Self {
        Self {
            title: title.into(),
            details,
        }
    }

    /// Parses `Title: details` or `Title - details`. Without a separator the
    /// whole text is the title.
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        let split = text.split_once(": ").or_else(|| text.split_once(" - "));
        Some(match split {
            Some((title, details)) if !title.trim().is_empty() => {
                let details = details.trim();
                Self::new(
                    title.trim(),
                    (!details.is_empty()).then(|| details.to_string()),
                )
            }
            _ => Self::new(text, None),
        })
    }
}

/// Builds the standard agenda layout.
///
/// A "Meeting Agenda" heading, one numbered sub-heading per topic with its
/// details as a paragraph, then a numbered "Action Items & Next Steps"
/// sub-heading with one bullet per item.
pub fn agenda_blocks(topics: &[AgendaTopic], action_items: &[String]) -> Vec<AgendaBlock> {
    let mut blocks = vec![AgendaBlock::Heading2("Meeting Agenda".to_string())];

    for (i, topic) in topics.iter().enumerate() {
        blocks.push(AgendaBlock::Heading3(format!("{}. {}", i + 1, topic.title)));
        if let Some(details) = &topic.details {
            blocks.push(AgendaBlock::Paragraph(details.clone()));
        }
    }

    let items: Vec<&str> = action_items
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .collect();
    if !items.is_empty() {
        blocks.push(AgendaBlock::Heading3(format!(
            "{}. Action Items & Next Steps",
            topics.len() + 1
        )));
        blocks.extend(items.into_iter().map(|s| AgendaBlock::Bullet(s.to_string())));
    }

    blocks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_shape() {
        assert_eq!(
            AgendaBlock::Heading3("1. Architecture".to_string()).to_notion(),
            json!({
                "object": "block",
                "type": "heading_3",
                "heading_3": {"rich_text": [{"type": "text", "text": {"content": "1. Architecture"}}]}
            })
        );
        assert_eq!(
            AgendaBlock::Bullet("Ship".to_string()).to_notion()["type"],
            "bulleted_list_item"
        );
    }

    #[test]
    fn topic_parsing() {
        assert_eq!(
            AgendaTopic::parse("System Architecture: review components"),
            Some(AgendaTopic::new(
                "System Architecture",
                Some("review components".to_string())
            ))
        );
        assert_eq!(
            AgendaTopic::parse("Training progress - metrics and blockers"),
            Some(AgendaTopic::new(
                "Training progress",
                Some("metrics and blockers".to_string())
            ))
        );
        assert_eq!(
            AgendaTopic::parse("Open floor"),
            Some(AgendaTopic::new("Open floor", None))
        );
        assert_eq!(AgendaTopic::parse("   "), None);
    }

    #[test]
    fn agenda_layout_numbers_action_items_after_topics() {
        let topics = vec![
            AgendaTopic::new("Architecture", Some("Review the design".to_string())),
            AgendaTopic::new("Training", None),
        ];
        let blocks = agenda_blocks(&topics, &["Follow up".to_string(), " ".to_string()]);
        assert_eq!(
            blocks,
            vec![
                AgendaBlock::Heading2("Meeting Agenda".to_string()),
                AgendaBlock::Heading3("1. Architecture".to_string()),
                AgendaBlock::Paragraph("Review the design".to_string()),
                AgendaBlock::Heading3("2. Training".to_string()),
                AgendaBlock::Heading3("3. Action Items & Next Steps".to_string()),
                AgendaBlock::Bullet("Follow up".to_string()),
            ]
        );
    }

    #[test]
    fn no_action_items_no_section() {
        let blocks = agenda_blocks(&[AgendaTopic::new("Only topic", None)], &[]);
        assert_eq!(blocks.len(), 2);
    }
}
