//! Gmail sender for meeting invitations.
//!
//! Messages are plain-text RFC 2822, base64url encoded without padding, and
//! posted as `{"raw": ...}` to `users/me/messages/send`.

use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use meetagenda_core::{MeetingEmail, Resource};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info, warn};

use crate::credentials::CredentialProvider;
use crate::error::ProviderResult;
use crate::http::{ApiTransport, HttpSettings};
use crate::search::{DEFAULT_NUM_RESULTS, ResourceSearch};

/// Base URL for Gmail API v1.
pub const GMAIL_API_BASE: &str = "https://gmail.googleapis.com/gmail/v1";

/// What Gmail returns for a sent message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryResult {
    /// Gmail message id.
    #[serde(rename = "id")]
    pub message_id: String,
    /// Gmail thread id.
    #[serde(default)]
    pub thread_id: String,
}

/// Everything needed to compose and send one invitation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MeetingEmailRequest {
    /// Subject line.
    pub subject: String,
    /// Recipient addresses.
    pub attendees: Vec<String>,
    /// Replaces the default greeting.
    pub message: Option<String>,
    /// Link to the calendar event.
    pub calendar_link: Option<String>,
    /// Link to the Notion agenda page.
    pub notion_link: Option<String>,
    /// Resources gathered beforehand, listed first.
    pub resources: Vec<Resource>,
    /// Query for more entries of the "Resources" section.
    pub search_query: Option<String>,
    /// Number of resources to include.
    pub num_resources: usize,
    /// `From` header, Gmail fills it in when absent.
    pub from: Option<String>,
}

impl MeetingEmailRequest {
    /// Creates a request with a subject and recipients.
    pub fn new<I, S>(subject: impl Into<String>, attendees: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            subject: subject.into(),
            attendees: attendees.into_iter().map(Into::into).collect(),
            num_resources: DEFAULT_NUM_RESULTS,
            ..Default::default()
        }
    }

    /// Builder method to set the intro message.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Builder method to set the calendar link.
    pub fn with_calendar_link(mut self, link: impl Into<String>) -> Self {
        self.calendar_link = Some(link.into());
        self
    }

    /// Builder method to set the Notion link.
    pub fn with_notion_link(mut self, link: impl Into<String>) -> Self {
        self.notion_link = Some(link.into());
        self
    }

    /// Builder method to attach resources that were already fetched.
    pub fn with_resources(mut self, resources: Vec<Resource>) -> Self {
        self.resources = resources;
        self
    }

    /// Builder method to set the resources query and count.
    pub fn with_search(mut self, query: impl Into<String>, num: usize) -> Self {
        self.search_query = Some(query.into());
        self.num_resources = num;
        self
    }

    /// Builder method to set the `From` header.
    pub fn with_from(mut self, from: impl Into<String>) -> Self {
        self.from = Some(from.into());
        self
    }

    /// Composes the email, fetching resources when a query and a search
    /// client are given.
    ///
    /// Search failures are logged and the email is composed without the
    /// resources section. Validation errors are returned before any search.
    pub async fn compose(&self, search: Option<&dyn ResourceSearch>) -> ProviderResult<MeetingEmail> {
        let mut email = MeetingEmail::new(&self.subject, self.attendees.iter().cloned())?;
        if let Some(message) = &self.message {
            email = email.with_message(message.as_str());
        }
        if let Some(link) = &self.calendar_link {
            email = email.with_calendar_link(link.as_str());
        }
        if let Some(link) = &self.notion_link {
            email = email.with_notion_link(link.as_str());
        }

        let mut resources = self.resources.clone();
        let query = self
            .search_query
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty());
        match (query, search) {
            (Some(query), Some(search)) => match search.search(query, self.num_resources).await {
                Ok(found) => resources.extend(found),
                Err(err) => warn!("resource search failed, sending without its results: {}", err),
            },
            (Some(_), None) => {
                warn!("no search client configured, sending without search results");
            }
            (None, _) => {}
        }

        Ok(email.with_resources(resources))
    }
}

/// Gmail API client.
pub struct GmailClient {
    transport: ApiTransport,
    credentials: Arc<dyn CredentialProvider>,
    base_url: String,
}

impl GmailClient {
    /// Creates a client that authenticates with `credentials`.
    pub fn new(
        credentials: impl CredentialProvider + 'static,
        settings: &HttpSettings,
    ) -> ProviderResult<Self> {
        Ok(Self {
            transport: ApiTransport::new("gmail", settings)?,
            credentials: Arc::new(credentials),
            base_url: GMAIL_API_BASE.to_string(),
        })
    }

    /// Builder method to point the client at another endpoint.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Composes and sends a meeting invitation.
    pub async fn send_meeting_email(
        &self,
        request: &MeetingEmailRequest,
        search: Option<&dyn ResourceSearch>,
    ) -> ProviderResult<DeliveryResult> {
        let email = request.compose(search).await?;
        self.send(&email, request.from.as_deref()).await
    }

    /// Sends an already composed email.
    pub async fn send(
        &self,
        email: &MeetingEmail,
        from: Option<&str>,
    ) -> ProviderResult<DeliveryResult> {
        let token = self.credentials.bearer().await?;
        let url = format!("{}/users/me/messages/send", self.base_url);
        let body = json!({ "raw": encode_raw(email, from) });
        debug!(
            recipients = email.recipients().len(),
            resources = email.resources().len(),
            credential = self.credentials.describe(),
            "sending meeting email"
        );

        let result: DeliveryResult = self
            .transport
            .send_json("send message", |http| {
                http.post(&url).bearer_auth(token.secret()).json(&body)
            })
            .await?;

        info!(
            provider = self.transport.provider(),
            message_id = %result.message_id,
            "meeting email sent"
        );
        Ok(result)
    }
}

/// Renders `email` and encodes it as Gmail's `raw` field expects.
pub fn encode_raw(email: &MeetingEmail, from: Option<&str>) -> String {
    URL_SAFE_NO_PAD.encode(email.to_rfc2822(from).as_bytes())
}
