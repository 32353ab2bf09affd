//! Web search used to build the "Resources" section of invitations.

use meetagenda_core::Resource;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

use crate::BoxFuture;
use crate::credentials::CredentialProvider;
use crate::error::{ProviderError, ProviderResult};
use crate::http::{ApiTransport, HttpSettings};

/// Default Serper endpoint.
pub const SERPER_API_BASE: &str = "https://google.serper.dev";

/// Number of results requested when the caller does not say.
pub const DEFAULT_NUM_RESULTS: usize = 5;

/// Something that can turn a query into a list of resources.
pub trait ResourceSearch: Send + Sync {
    /// Returns at most `num` results for `query`.
    fn search<'a>(&'a self, query: &'a str, num: usize)
    -> BoxFuture<'a, ProviderResult<Vec<Resource>>>;
}

/// Google search through the Serper API.
pub struct SerperClient {
    transport: ApiTransport,
    credentials: Arc<dyn CredentialProvider>,
    base_url: String,
}

impl SerperClient {
    /// Creates a client authenticated with the given `SERPER_API_KEY`
    /// provider.
    pub fn new(
        credentials: impl CredentialProvider + 'static,
        settings: &HttpSettings,
    ) -> ProviderResult<Self> {
        Ok(Self {
            transport: ApiTransport::new("search", settings)?,
            credentials: Arc::new(credentials),
            base_url: SERPER_API_BASE.to_string(),
        })
    }

    /// Builder method to point the client at another endpoint.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    async fn run(&self, query: &str, num: usize) -> ProviderResult<Vec<Resource>> {
        let query = query.trim();
        if query.is_empty() {
            return Err(ProviderError::invalid_input("search query is empty").with_provider("search"));
        }
        if num == 0 {
            return Err(
                ProviderError::invalid_input("number of results must be at least 1")
                    .with_provider("search"),
            );
        }

        let key = self.credentials.bearer().await?;
        let url = format!("{}/search", self.base_url);
        let payload = SearchRequest { q: query, num };

        let response: SearchResponse = self
            .transport
            .send_json("web search", |http| {
                http.post(&url)
                    .header("X-API-KEY", key.secret())
                    .json(&payload)
            })
            .await?;

        let resources: Vec<Resource> = response
            .organic
            .into_iter()
            .take(num)
            .map(|item| Resource::new(item.title, item.snippet, item.link))
            .collect();
        debug!(query, results = resources.len(), "search completed");
        Ok(resources)
    }
}

impl ResourceSearch for SerperClient {
    fn search<'a>(
        &'a self,
        query: &'a str,
        num: usize,
    ) -> BoxFuture<'a, ProviderResult<Vec<Resource>>> {
        Box::pin(self.run(query, num))
    }
}

#[derive(Debug, Serialize)]
struct SearchRequest<'a> {
    q: &'a str,
    num: usize,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    organic: Vec<OrganicResult>,
}

#[derive(Debug, Deserialize)]
struct OrganicResult {
    #[serde(default)]
    title: String,
    #[serde(default)]
    snippet: String,
    #[serde(default)]
    link: String,
}
