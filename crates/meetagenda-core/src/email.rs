//! Meeting invitation emails.
//!
//! [`MeetingEmail`] holds the pieces of an invitation (subject, recipients,
//! optional intro text, links to the calendar event and the Notion agenda,
//! and a list of background resources) and renders them into a plain-text
//! RFC 2822 message ready to be base64url encoded for the Gmail API.

use std::sync::LazyLock;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::meeting::dedup_preserving_order;

/// Loose shape check for recipient addresses.
static EMAIL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+'\-]+@[A-Za-z0-9\-]+(\.[A-Za-z0-9\-]+)*\.[A-Za-z]{2,}$")
        .expect("Invalid email regex")
});

/// Returns true if `address` looks like an email address.
pub fn is_valid_email(address: &str) -> bool {
    EMAIL_REGEX.is_match(address)
}

/// A background link listed in the "Resources" section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    /// Page title.
    pub title: String,
    /// Short excerpt, may be empty.
    pub snippet: String,
    /// Page URL.
    pub url: String,
}

impl Resource {
    /// Creates a new resource.
    pub fn new(
        title: impl Into<String>,
        snippet: impl Into<String>,
        url: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            snippet: snippet.into(),
            url: url.into(),
        }
    }
}

/// A meeting invitation email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeetingEmail {
    subject: String,
    recipients: Vec<String>,
    message: Option<String>,
    calendar_link: Option<String>,
    notion_link: Option<String>,
    resources: Vec<Resource>,
}

impl MeetingEmail {
    /// Creates an email after validating subject and recipients.
    ///
    /// CR and LF in the subject are replaced with spaces so the subject can
    /// not inject headers. Recipients are deduplicated in first-seen order.
    pub fn new<I, S>(subject: &str, recipients: I) -> Result<Self, ValidationError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let subject = subject.replace(['\r', '\n'], " ").trim().to_string();
        if subject.is_empty() {
            return Err(ValidationError::EmptySubject);
        }

        let recipients = dedup_preserving_order(recipients.into_iter().map(Into::into));
        if recipients.is_empty() {
            return Err(ValidationError::NoRecipients);
        }
        if let Some(bad) = recipients.iter().find(|r| !is_valid_email(r)) {
            return Err(ValidationError::InvalidEmail(bad.clone()));
        }

        Ok(Self {
            subject,
            recipients,
            message: None,
            calendar_link: None,
            notion_link: None,
            resources: Vec::new(),
        })
    }

    /// Builder method to replace the default greeting with custom text.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        let message = message.into();
        if !message.trim().is_empty() {
            self.message = Some(message);
        }
        self
    }

    /// Builder method to link the calendar event.
    pub fn with_calendar_link(mut self, link: impl Into<String>) -> Self {
        self.calendar_link = Some(link.into());
        self
    }

    /// Builder method to link the Notion agenda page.
    pub fn with_notion_link(mut self, link: impl Into<String>) -> Self {
        self.notion_link = Some(link.into());
        self
    }

    /// Builder method to attach resources.
    pub fn with_resources(mut self, resources: Vec<Resource>) -> Self {
        self.resources = resources;
        self
    }

    /// Returns the sanitized subject.
    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// Returns the recipients.
    pub fn recipients(&self) -> &[String] {
        &self.recipients
    }

    /// Returns the attached resources.
    pub fn resources(&self) -> &[Resource] {
        &self.resources
    }

    /// Renders the plain-text body.
    pub fn body(&self) -> String {
        let mut sections = Vec::new();

        sections.push(match &self.message {
            Some(message) => message.trim_end().to_string(),
            None => format!("Hello,\n\nYou are invited to: {}", self.subject),
        });

        let mut links = Vec::new();
        if let Some(link) = &self.calendar_link {
            links.push(format!("Calendar event: {}", link));
        }
        if let Some(link) = &self.notion_link {
            links.push(format!("Notion agenda: {}", link));
        }
        if !links.is_empty() {
            sections.push(links.join("\n"));
        }

        if !self.resources.is_empty() {
            let mut lines = vec!["Resources:".to_string()];
            for (i, resource) in self.resources.iter().enumerate() {
                lines.push(format!("{}. {}", i + 1, resource.title));
                if !resource.snippet.trim().is_empty() {
                    lines.push(format!("   {}", resource.snippet.trim()));
                }
                lines.push(format!("   {}", resource.url));
            }
            sections.push(lines.join("\n"));
        }

        let mut body = sections.join("\n\n");
        body.push('\n');
        body
    }

    /// Renders the full RFC 2822 message with CRLF line endings.
    pub fn to_rfc2822(&self, from: Option<&str>) -> String {
        let mut headers = vec![format!("To: {}", self.recipients.join(", "))];
        if let Some(from) = from {
            headers.push(format!("From: {}", from.replace(['\r', '\n'], "")));
        }
        headers.push(format!("Subject: {}", encode_header(&self.subject)));
        headers.push("MIME-Version: 1.0".to_string());
        headers.push("Content-Type: text/plain; charset=\"UTF-8\"".to_string());
        headers.push("Content-Transfer-Encoding: 8bit".to_string());

        let body = self.body().replace("\r\n", "\n").replace('\n', "\r\n");
        format!("{}\r\n\r\n{}", headers.join("\r\n"), body)
    }
}

/// Encodes a header value with RFC 2047 when it is not plain ASCII.
fn encode_header(value: &str) -> String {
    if value.is_ascii() {
        value.to_string()
    } else {
        format!("=?UTF-8?B?{}?=", STANDARD.encode(value.as_bytes()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> MeetingEmail {
        MeetingEmail::new("Weekly sync", ["a@example.com", "b@example.com"]).unwrap()
    }

    #[test]
    fn rejects_empty_subject_and_recipients() {
        assert_eq!(
            MeetingEmail::new("  ", ["a@example.com"]).unwrap_err(),
            ValidationError::EmptySubject
        );
        assert_eq!(
            MeetingEmail::new("Sync", Vec::<String>::new()).unwrap_err(),
            ValidationError::NoRecipients
        );
        assert_eq!(
            MeetingEmail::new("Sync", ["not-an-address"]).unwrap_err(),
            ValidationError::InvalidEmail("not-an-address".to_string())
        );
    }

    #[test]
    fn recipients_are_deduplicated() {
        let email =
            MeetingEmail::new("Sync", ["a@example.com", "b@example.com", "a@example.com"]).unwrap();
        assert_eq!(email.recipients(), ["a@example.com", "b@example.com"]);
    }

    #[test]
    fn subject_newlines_are_flattened() {
        let email = MeetingEmail::new("Sync\r\nBcc: evil@example.com", ["a@example.com"]).unwrap();
        assert_eq!(email.subject(), "Sync  Bcc: evil@example.com");
    }

    #[test]
    fn body_with_links_and_resources() {
        let email = sample()
            .with_calendar_link("https://calendar.google.com/event?eid=abc")
            .with_notion_link("https://www.notion.so/page")
            .with_resources(vec![
                Resource::new(
                    "The Rust Book",
                    "The Rust Programming Language",
                    "https://doc.rust-lang.org/book/",
                ),
                Resource::new("Crates", "", "https://crates.io/"),
            ]);

        insta::assert_snapshot!(email.body().trim_end(), @r"
        Hello,

        You are invited to: Weekly sync

        Calendar event: https://calendar.google.com/event?eid=abc
        Notion agenda: https://www.notion.so/page

        Resources:
        1. The Rust Book
           The Rust Programming Language
           https://doc.rust-lang.org/book/
        2. Crates
           https://crates.io/
        ");
    }

    #[test]
    fn custom_message_replaces_greeting() {
        let body = sample().with_message("Hi team, agenda below.\n").body();
        assert_eq!(body, "Hi team, agenda below.\n");
    }

    #[test]
    fn rfc2822_has_headers_and_crlf() {
        let raw = sample()
            .with_calendar_link("https://cal/link")
            .to_rfc2822(Some("me@example.com"));

        assert!(raw.starts_with("To: a@example.com, b@example.com\r\nFrom: me@example.com\r\n"));
        assert!(raw.contains("Subject: Weekly sync\r\n"));
        assert!(raw.contains("\r\n\r\nHello,\r\n\r\nYou are invited to: Weekly sync"));
        assert!(raw.contains("Calendar event: https://cal/link\r\n"));
        assert!(!raw.replace("\r\n", "").contains('\n'));
    }

    #[test]
    fn non_ascii_subject_is_encoded() {
        let email = MeetingEmail::new("Réunion", ["a@example.com"]).unwrap();
        let raw = email.to_rfc2822(None);
        assert!(raw.contains("Subject: =?UTF-8?B?UsOpdW5pb24=?=\r\n"));
    }

    #[test]
    fn address_check() {
        assert!(is_valid_email("first.last+tag@sub.example.co"));
        assert!(!is_valid_email("a@b"));
        assert!(!is_valid_email("a b@example.com"));
    }
}
