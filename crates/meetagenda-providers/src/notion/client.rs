//! Notion API client for the meetings database.

use std::sync::Arc;

use meetagenda_core::{DatabaseId, MeetingRecord};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{debug, info};

use super::blocks::{AgendaBlock, MAX_CHILDREN};
use super::filter::MeetingFilter;
use super::properties::{
    PropertyNames, check_record_text, check_text, parse_page, record_properties,
};
use crate::credentials::CredentialProvider;
use crate::error::{ProviderError, ProviderResult};
use crate::http::{ApiTransport, HttpSettings};

/// Base URL for the Notion API.
pub const NOTION_API_BASE: &str = "https://api.notion.com/v1";

/// Value of the `Notion-Version` header.
pub const NOTION_VERSION: &str = "2022-06-28";

/// Largest page size accepted by the query endpoint.
pub const MAX_PAGE_SIZE: usize = 100;

/// A page as returned by create and update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedPage {
    /// Page id.
    pub id: String,
    /// Page URL.
    #[serde(default)]
    pub url: String,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    results: Vec<Value>,
    #[serde(default)]
    has_more: bool,
    #[serde(default)]
    next_cursor: Option<String>,
}

/// Notion API client.
pub struct NotionClient {
    transport: ApiTransport,
    credentials: Arc<dyn CredentialProvider>,
    base_url: String,
    properties: PropertyNames,
}

impl NotionClient {
    /// Creates a client that authenticates with `credentials`.
    pub fn new(
        credentials: impl CredentialProvider + 'static,
        settings: &HttpSettings,
    ) -> ProviderResult<Self> {
        Ok(Self {
            transport: ApiTransport::new("notion", settings)?,
            credentials: Arc::new(credentials),
            base_url: NOTION_API_BASE.to_string(),
            properties: PropertyNames::default(),
        })
    }

    /// Builder method to point the client at another endpoint.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Builder method to use custom property names.
    pub fn with_property_names(mut self, properties: PropertyNames) -> Self {
        self.properties = properties;
        self
    }

    /// Returns the property names in use.
    pub fn property_names(&self) -> &PropertyNames {
        &self.properties
    }

    /// Queries the database, following pagination until the vendor reports
    /// no more rows or `max_results` records were collected.
    ///
    /// Pages with a blank title are skipped and do not count.
    pub async fn query_database(
        &self,
        database_id: &DatabaseId,
        filter: Option<&MeetingFilter>,
        max_results: Option<usize>,
    ) -> ProviderResult<Vec<MeetingRecord>> {
        let limit = max_results.unwrap_or(usize::MAX);
        let mut records = Vec::new();
        if limit == 0 {
            return Ok(records);
        }

        let token = self.credentials.bearer().await?;
        let url = format!("{}/databases/{}/query", self.base_url, database_id);
        let filter = filter.and_then(|f| f.to_notion(&self.properties));
        let mut cursor: Option<String> = None;
        let mut skipped = 0usize;

        loop {
            let mut body = json!({ "page_size": (limit - records.len()).min(MAX_PAGE_SIZE) });
            if let Some(filter) = &filter {
                body["filter"] = filter.clone();
            }
            if let Some(cursor) = &cursor {
                body["start_cursor"] = json!(cursor);
            }

            let response: QueryResponse = self
                .transport
                .send_json("query database", |http| {
                    http.post(&url)
                        .bearer_auth(token.secret())
                        .header("Notion-Version", NOTION_VERSION)
                        .json(&body)
                })
                .await?;
            debug!(
                results = response.results.len(),
                has_more = response.has_more,
                "fetched database page"
            );

            for page in &response.results {
                match parse_page(page, &self.properties) {
                    Some(record) => records.push(record),
                    None => skipped += 1,
                }
                if records.len() >= limit {
                    break;
                }
            }

            if records.len() >= limit || !response.has_more {
                break;
            }
            match response.next_cursor {
                Some(next) => cursor = Some(next),
                None => break,
            }
        }

        debug!(
            database_id = %database_id,
            records = records.len(),
            skipped,
            "database query complete"
        );
        Ok(records)
    }

    /// Creates a page in the database with optional content blocks.
    pub async fn create_record(
        &self,
        database_id: &DatabaseId,
        record: &MeetingRecord,
        children: &[AgendaBlock],
    ) -> ProviderResult<CreatedPage> {
        record
            .validate_for_create()
            .map_err(|e| ProviderError::from(e).with_provider("notion"))?;
        if children.len() > MAX_CHILDREN {
            return Err(ProviderError::invalid_input(format!(
                "{} content blocks given, at most {} can be sent at once",
                children.len(),
                MAX_CHILDREN
            ))
            .with_provider("notion"));
        }
        check_record_text(record, &self.properties)?;
        for block in children {
            check_text("content block", block.text())?;
        }

        let token = self.credentials.bearer().await?;
        let url = format!("{}/pages", self.base_url);
        let mut body = json!({
            "parent": {"database_id": database_id.as_str()},
            "properties": record_properties(record, &self.properties),
        });
        if !children.is_empty() {
            body["children"] = Value::Array(children.iter().map(AgendaBlock::to_notion).collect());
        }

        let page: CreatedPage = self
            .transport
            .send_json("create page", |http| {
                http.post(&url)
                    .bearer_auth(token.secret())
                    .header("Notion-Version", NOTION_VERSION)
                    .json(&body)
            })
            .await?;

        info!(page_id = %page.id, "notion page created");
        Ok(page)
    }

    /// Updates the properties of an existing page. Only set fields are sent.
    pub async fn update_record(
        &self,
        page_id: &str,
        record: &MeetingRecord,
    ) -> ProviderResult<CreatedPage> {
        let page_id = page_id.trim();
        if page_id.is_empty() {
            return Err(ProviderError::invalid_input("page id is empty").with_provider("notion"));
        }
        let properties = record_properties(record, &self.properties);
        if properties.is_empty() {
            return Err(
                ProviderError::invalid_input("no fields to update").with_provider("notion"),
            );
        }
        check_record_text(record, &self.properties)?;

        let token = self.credentials.bearer().await?;
        let url = format!("{}/pages/{}", self.base_url, urlencoding::encode(page_id));
        let body = json!({ "properties": properties });

        let page: CreatedPage = self
            .transport
            .send_json("update page", |http| {
                http.patch(&url)
                    .bearer_auth(token.secret())
                    .header("Notion-Version", NOTION_VERSION)
                    .json(&body)
            })
            .await?;

        info!(page_id = %page.id, "notion page updated");
        Ok(page)
    }

    /// Updates the record's page when it carries a page id, creates a new
    /// page otherwise. Returns the page id.
    pub async fn create_or_update_record(
        &self,
        database_id: &DatabaseId,
        record: &MeetingRecord,
    ) -> ProviderResult<String> {
        let page = match record.page_id.as_deref() {
            Some(page_id) => self.update_record(page_id, record).await?,
            None => self.create_record(database_id, record, &[]).await?,
        };
        Ok(page.id)
    }
}
