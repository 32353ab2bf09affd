//! Builds vendor clients from configuration and credentials.

use std::collections::HashMap;

use meetagenda_core::DatabaseId;
use meetagenda_providers::{
    Capability, ConfigSource, EnvSource, GmailClient, GoogleCalendarClient, HttpSettings,
    LayeredSource, NotionClient, SerperClient, StaticToken, TokenLoader,
};
use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};

/// Variable holding the default Notion database.
pub const NOTION_DATABASE_ID_VAR: &str = "NOTION_DATABASE_ID";

/// Configuration plus the credential lookup chain.
pub struct AppContext {
    config: ClientConfig,
    source: LayeredSource,
    settings: HttpSettings,
}

impl AppContext {
    /// Looks up credentials in the environment first, then in
    /// `[credentials]`.
    pub fn new(config: ClientConfig) -> ClientResult<Self> {
        let fallback: HashMap<String, String> =
            config.credential_source().map_err(ClientError::Config)?;
        let source = LayeredSource::new()
            .with_layer(EnvSource)
            .with_layer(fallback);
        Ok(Self::with_source(config, source))
    }

    /// Uses an explicit lookup chain.
    pub fn with_source(config: ClientConfig, source: LayeredSource) -> Self {
        let settings = config.http_settings();
        Self {
            config,
            source,
            settings,
        }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Returns the credential lookup chain.
    pub fn source(&self) -> &dyn ConfigSource {
        &self.source
    }

    fn token(&self, capability: Capability) -> ClientResult<StaticToken> {
        Ok(StaticToken::load(&self.source, capability)?)
    }

    /// Gmail client, fails with `MissingCredential` before any request.
    pub fn gmail(&self) -> ClientResult<GmailClient> {
        let mut client = GmailClient::new(self.token(Capability::Gmail)?, &self.settings)?;
        if let Some(ref base) = self.config.endpoints.gmail {
            client = client.with_base_url(base);
        }
        Ok(client)
    }

    /// Calendar client, falling back to the Gmail token.
    pub fn calendar(&self) -> ClientResult<GoogleCalendarClient> {
        let mut client =
            GoogleCalendarClient::new(self.token(Capability::Calendar)?, &self.settings)?
                .with_send_updates(self.config.calendar.send_updates);
        if let Some(ref base) = self.config.endpoints.calendar {
            client = client.with_base_url(base);
        }
        Ok(client)
    }

    /// Notion client with the configured property names.
    pub fn notion(&self) -> ClientResult<NotionClient> {
        let mut client = NotionClient::new(self.token(Capability::Notion)?, &self.settings)?
            .with_property_names(self.config.notion.properties.clone());
        if let Some(ref base) = self.config.endpoints.notion {
            client = client.with_base_url(base);
        }
        Ok(client)
    }

    /// Serper search client.
    pub fn serper(&self) -> ClientResult<SerperClient> {
        let mut client = SerperClient::new(self.token(Capability::Search)?, &self.settings)?;
        if let Some(ref base) = self.config.endpoints.search {
            client = client.with_base_url(base);
        }
        Ok(client)
    }

    /// Search client for the optional resources section.
    ///
    /// Returns `None` when search is disabled or not configured; callers
    /// then send without resources.
    pub fn search(&self) -> Option<SerperClient> {
        if !self.config.search.enabled {
            debug!("search disabled in configuration");
            return None;
        }
        match self.serper() {
            Ok(client) => Some(client),
            Err(e) => {
                warn!(error = %e, "resources section skipped");
                None
            }
        }
    }

    /// Resolves the Notion database: `explicit`, then `NOTION_DATABASE_ID`,
    /// then `notion.database_id`.
    pub fn database_id(&self, explicit: Option<&str>) -> ClientResult<DatabaseId> {
        let raw = explicit
            .map(str::to_string)
            .or_else(|| TokenLoader::lookup(&self.source, &[NOTION_DATABASE_ID_VAR]))
            .or_else(|| self.config.notion.database_id.clone())
            .ok_or_else(|| {
                ClientError::Config(format!(
                    "no Notion database: pass --database-id, set {} or notion.database_id",
                    NOTION_DATABASE_ID_VAR
                ))
            })?;
        Ok(DatabaseId::parse(&raw)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use meetagenda_providers::ProviderErrorCode;

    const DB: &str = "2bee7c813e1c818c9307cc30152eaeac";

    fn context(pairs: &[(&str, &str)]) -> AppContext {
        context_with(ClientConfig::default(), pairs)
    }

    fn context_with(config: ClientConfig, pairs: &[(&str, &str)]) -> AppContext {
        let values: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppContext::with_source(config, LayeredSource::new().with_layer(values))
    }

    #[test]
    fn missing_gmail_token_fails_locally() {
        let err = context(&[]).gmail().err().unwrap();
        assert_eq!(err.provider_code(), Some(ProviderErrorCode::MissingCredential));
        assert!(err.to_string().contains("GMAIL_ACCESS_TOKEN"));
    }

    #[test]
    fn calendar_uses_gmail_token_as_fallback() {
        assert!(context(&[("GMAIL_ACCESS_TOKEN", "ya29.x")]).calendar().is_ok());
        assert!(context(&[]).calendar().is_err());
    }

    #[test]
    fn search_is_optional() {
        assert!(context(&[]).search().is_none());
        assert!(context(&[("SERPER_API_KEY", "k")]).search().is_some());

        let mut config = ClientConfig::default();
        config.search.enabled = false;
        assert!(context_with(config, &[("SERPER_API_KEY", "k")]).search().is_none());
    }

    #[test]
    fn database_id_precedence() {
        let mut config = ClientConfig::default();
        config.notion.database_id = Some("0".repeat(32));

        let ctx = context_with(config.clone(), &[("NOTION_DATABASE_ID", DB)]);
        assert_eq!(ctx.database_id(None).unwrap().as_str(), DB);
        let explicit = "a".repeat(32);
        assert_eq!(
            ctx.database_id(Some(explicit.as_str())).unwrap().as_str(),
            explicit
        );

        let ctx = context_with(config, &[]);
        assert_eq!(ctx.database_id(None).unwrap().as_str(), "0".repeat(32));
    }

    #[test]
    fn database_id_is_validated() {
        let ctx = context(&[]);
        assert!(matches!(ctx.database_id(None), Err(ClientError::Config(_))));

        let err = ctx.database_id(Some("not-a-database")).unwrap_err();
        assert_eq!(err.provider_code(), Some(ProviderErrorCode::InvalidInput));
    }
}
