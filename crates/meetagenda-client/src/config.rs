//! Client configuration.
//!
//! All settings live in a single `config.toml` file at
//! `~/.config/meetagenda/config.toml` by default. Every section is optional.
//!
//! Values in `[credentials]` support secret references:
//! - `pass::path/in/store` is resolved via `pass show`
//! - `env::VAR_NAME` is resolved from the environment
//! - plain text is used as-is
//!
//! The process environment (including a project `.env`) always wins over
//! `[credentials]`.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::time::Duration;

use meetagenda_core::{DatabaseId, TracingConfig, TracingOutputFormat};
use meetagenda_providers::{
    Capability, HttpSettings, PropertyNames, RetryPolicy, SendUpdates,
    calendar::DEFAULT_CALENDAR_ID, search::DEFAULT_NUM_RESULTS,
};
use serde::{Deserialize, Serialize};

/// Variables that may appear in `[credentials]`.
pub const KNOWN_VARIABLES: [&str; 5] = [
    "GMAIL_ACCESS_TOKEN",
    "GOOGLE_CALENDAR_ACCESS_TOKEN",
    "NOTION_API_KEY",
    "NOTION_DATABASE_ID",
    "SERPER_API_KEY",
];

/// Configuration for the meetagenda client.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// HTTP settings.
    pub http: HttpConfig,

    /// Endpoint overrides.
    pub endpoints: EndpointSettings,

    /// Google Calendar settings.
    pub calendar: CalendarSettings,

    /// Notion settings.
    pub notion: NotionSettings,

    /// Web search settings.
    pub search: SearchSettings,

    /// Fallback values for the credential variables.
    pub credentials: BTreeMap<String, String>,
}

/// HTTP timeout and retry settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,

    /// Attempts per request, 1 disables retries.
    pub max_attempts: u32,

    /// Delay before the first retry, in milliseconds.
    pub initial_backoff_ms: u64,

    /// Upper bound for a retry delay, in milliseconds.
    pub max_backoff_ms: u64,

    /// Custom `User-Agent`.
    pub user_agent: Option<String>,

    /// Ignore proxy settings from the environment.
    pub no_proxy: bool,
}

impl Default for HttpConfig {
    fn default() -> Self {
        let retry = RetryPolicy::default();
        Self {
            timeout_secs: 30,
            max_attempts: retry.max_attempts,
            initial_backoff_ms: retry.initial_backoff.as_millis() as u64,
            max_backoff_ms: retry.max_backoff.as_millis() as u64,
            user_agent: None,
            no_proxy: false,
        }
    }
}

/// Base URL overrides, mostly for proxies and tests.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointSettings {
    /// Gmail API base URL.
    pub gmail: Option<String>,
    /// Google Calendar API base URL.
    pub calendar: Option<String>,
    /// Notion API base URL.
    pub notion: Option<String>,
    /// Serper API base URL.
    pub search: Option<String>,
}

/// Google Calendar settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CalendarSettings {
    /// Calendar to create events in.
    pub calendar_id: String,

    /// IANA timezone used when none is given on the command line.
    pub time_zone: String,

    /// Who Google notifies about new events.
    pub send_updates: SendUpdates,

    /// Meeting length when only a start time is given.
    pub default_duration_minutes: u32,
}

impl Default for CalendarSettings {
    fn default() -> Self {
        Self {
            calendar_id: DEFAULT_CALENDAR_ID.to_string(),
            time_zone: "UTC".to_string(),
            send_updates: SendUpdates::default(),
            default_duration_minutes: 60,
        }
    }
}

/// Notion settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotionSettings {
    /// Meetings database, `NOTION_DATABASE_ID` wins when set.
    pub database_id: Option<String>,

    /// Rows returned by `notion query` when `--max-results` is not given.
    pub max_results: usize,

    /// Database property names.
    pub properties: PropertyNames,
}

impl Default for NotionSettings {
    fn default() -> Self {
        Self {
            database_id: None,
            max_results: 10,
            properties: PropertyNames::default(),
        }
    }
}

/// Web search settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    /// Set to false to never call the search API.
    pub enabled: bool,

    /// Results included in the resources section.
    pub num_results: usize,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            num_results: DEFAULT_NUM_RESULTS,
        }
    }
}

impl ClientConfig {
    /// Loads configuration from the default path, defaults if it is absent.
    pub fn load() -> Result<Self, String> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Loads configuration from a specific path.
    pub fn load_from(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("failed to read {}: {}", path.display(), e))?;
        toml::from_str(&content).map_err(|e| format!("failed to parse {}: {}", path.display(), e))
    }

    /// Returns the default configuration file path.
    pub fn default_path() -> PathBuf {
        Self::default_config_dir().join("config.toml")
    }

    /// Returns the default configuration directory.
    pub fn default_config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("meetagenda")
    }

    /// Builds the HTTP settings shared by every client.
    pub fn http_settings(&self) -> HttpSettings {
        let mut settings = HttpSettings::default()
            .with_timeout(Duration::from_secs(self.http.timeout_secs))
            .with_retry(RetryPolicy {
                max_attempts: self.http.max_attempts.max(1),
                initial_backoff: Duration::from_millis(self.http.initial_backoff_ms),
                max_backoff: Duration::from_millis(self.http.max_backoff_ms),
            })
            .with_no_proxy(self.http.no_proxy);
        if let Some(ref agent) = self.http.user_agent {
            settings.user_agent = agent.clone();
        }
        settings
    }

    /// Resolves `[credentials]`, expanding secret references.
    pub fn credential_source(&self) -> Result<HashMap<String, String>, String> {
        self.credentials
            .iter()
            .map(|(name, raw)| {
                crate::secret::resolve(raw)
                    .map(|value| (name.clone(), value))
                    .map_err(|e| format!("failed to resolve credentials.{}: {}", name, e))
            })
            .collect()
    }

    /// Checks the settings without contacting any vendor.
    pub fn validate(&self) -> Result<(), String> {
        if self.http.timeout_secs == 0 {
            return Err("http.timeout_secs must be greater than 0".to_string());
        }
        if self.http.max_attempts == 0 {
            return Err("http.max_attempts must be at least 1".to_string());
        }

        let endpoints = [
            ("gmail", &self.endpoints.gmail),
            ("calendar", &self.endpoints.calendar),
            ("notion", &self.endpoints.notion),
            ("search", &self.endpoints.search),
        ];
        for (name, endpoint) in endpoints {
            if let Some(endpoint) = endpoint {
                let parsed = url::Url::parse(endpoint)
                    .map_err(|e| format!("endpoints.{} is not a valid URL: {}", name, e))?;
                if !matches!(parsed.scheme(), "http" | "https") {
                    return Err(format!("endpoints.{} must use http or https", name));
                }
            }
        }

        if self.calendar.calendar_id.trim().is_empty() {
            return Err("calendar.calendar_id must not be empty".to_string());
        }
        if self.calendar.time_zone.trim().is_empty() {
            return Err("calendar.time_zone must not be empty".to_string());
        }
        if self.calendar.default_duration_minutes == 0 {
            return Err("calendar.default_duration_minutes must be greater than 0".to_string());
        }

        if let Some(ref id) = self.notion.database_id {
            DatabaseId::parse(id).map_err(|e| format!("notion.database_id: {}", e))?;
        }

        for name in self.credentials.keys() {
            if !KNOWN_VARIABLES.contains(&name.as_str()) {
                return Err(format!(
                    "unknown credentials.{} (expected one of {})",
                    name,
                    KNOWN_VARIABLES.join(", ")
                ));
            }
        }

        Ok(())
    }

    /// Returns a copy with plain-text credential values masked.
    ///
    /// Secret references are kept since they do not contain the secret.
    pub fn redacted(&self) -> Self {
        let mut config = self.clone();
        for value in config.credentials.values_mut() {
            if !crate::secret::is_reference(value) {
                *value = "***".to_string();
            }
        }
        config
    }
}

/// Capabilities whose credential can be found in `[credentials]` or the
/// environment, for `config validate`.
pub fn configured_capabilities(source: &dyn meetagenda_providers::ConfigSource) -> Vec<Capability> {
    Capability::ALL
        .into_iter()
        .filter(|c| meetagenda_providers::TokenLoader::load(source, *c).is_ok())
        .collect()
}

/// Loads a `.env` file into the process environment.
///
/// Without an explicit path the current directory and its parents are
/// searched and a missing file is not an error. Variables already set in
/// the environment are never overwritten.
pub fn load_env_file(explicit: Option<&Path>) -> Result<Option<PathBuf>, String> {
    match explicit {
        Some(path) => dotenvy::from_path(path)
            .map(|()| Some(path.to_path_buf()))
            .map_err(|e| format!("failed to load {}: {}", path.display(), e)),
        None => match dotenvy::dotenv() {
            Ok(path) => Ok(Some(path)),
            Err(e) if e.not_found() => Ok(None),
            Err(e) => Err(format!("failed to load .env: {}", e)),
        },
    }
}

/// Loads the `.env` file, then builds the logging setup for the flags.
///
/// Must run before tracing is initialized so that `RUST_LOG` from the file
/// takes effect. Returns the path of the loaded file, if any.
pub fn logging_setup(
    env_file: Option<&Path>,
    debug: bool,
    json: bool,
) -> Result<(TracingConfig, Option<PathBuf>), String> {
    let loaded = load_env_file(env_file)?;

    let mut config = if debug {
        TracingConfig::cli_debug()
    } else {
        TracingConfig::cli()
    };
    if json {
        config = config.with_format(TracingOutputFormat::Json);
    }
    if let Ok(filter) = std::env::var("RUST_LOG")
        && !filter.trim().is_empty()
    {
        config = config.with_env_filter(filter.trim());
    }
    Ok((config, loaded))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_file_gives_defaults() {
        let config: ClientConfig = toml::from_str("").unwrap();
        assert_eq!(config.http.timeout_secs, 30);
        assert_eq!(config.http.max_attempts, 3);
        assert_eq!(config.calendar.calendar_id, "primary");
        assert_eq!(config.calendar.send_updates, SendUpdates::All);
        assert_eq!(config.notion.max_results, 10);
        assert_eq!(config.notion.properties.title, "Title");
        assert_eq!(config.search.num_results, 5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn parses_all_sections() {
        let toml_content = r#"
[http]
timeout_secs = 10
max_attempts = 1

[endpoints]
notion = "http://127.0.0.1:8080/v1"

[calendar]
calendar_id = "team@group.calendar.google.com"
time_zone = "Asia/Hong_Kong"
send_updates = "externalOnly"

[notion]
database_id = "2bee7c813e1c818c9307cc30152eaeac"
max_results = 25

[notion.properties]
title = "Name"
date = "Meeting Date"

[search]
enabled = false

[credentials]
NOTION_API_KEY = "env::MY_NOTION_KEY"
"#;
        let config: ClientConfig = toml::from_str(toml_content).unwrap();
        assert_eq!(config.http.timeout_secs, 10);
        assert_eq!(config.calendar.time_zone, "Asia/Hong_Kong");
        assert_eq!(config.calendar.send_updates, SendUpdates::ExternalOnly);
        assert_eq!(config.notion.max_results, 25);
        assert_eq!(config.notion.properties.title, "Name");
        assert_eq!(config.notion.properties.status, "Status");
        assert!(!config.search.enabled);
        assert!(config.validate().is_ok());

        let settings = config.http_settings();
        assert_eq!(settings.timeout, Duration::from_secs(10));
        assert_eq!(settings.retry.max_attempts, 1);
    }

    #[test]
    fn validate_rejects_bad_values() {
        let mut config = ClientConfig::default();
        config.notion.database_id = Some("2bee7c81-3e1c-818c-9307-cc30152eaeac".to_string());
        assert!(config.validate().unwrap_err().contains("notion.database_id"));

        let mut config = ClientConfig::default();
        config.endpoints.gmail = Some("ftp://example.com".to_string());
        assert!(config.validate().is_err());

        let mut config = ClientConfig::default();
        config
            .credentials
            .insert("GITHUB_TOKEN".to_string(), "x".to_string());
        assert!(config.validate().unwrap_err().contains("GITHUB_TOKEN"));
    }

    #[test]
    fn credential_source_resolves_references() {
        unsafe {
            std::env::set_var("_MEETAGENDA_TEST_NOTION_KEY", "secret_from_env");
        }
        let mut config = ClientConfig::default();
        config.credentials.insert(
            "NOTION_API_KEY".to_string(),
            "env::_MEETAGENDA_TEST_NOTION_KEY".to_string(),
        );
        config
            .credentials
            .insert("SERPER_API_KEY".to_string(), "plain-key".to_string());

        let source = config.credential_source().unwrap();
        assert_eq!(source["NOTION_API_KEY"], "secret_from_env");
        assert_eq!(source["SERPER_API_KEY"], "plain-key");

        let redacted = config.redacted();
        assert_eq!(
            redacted.credentials["NOTION_API_KEY"],
            "env::_MEETAGENDA_TEST_NOTION_KEY"
        );
        assert_eq!(redacted.credentials["SERPER_API_KEY"], "***");
        unsafe {
            std::env::remove_var("_MEETAGENDA_TEST_NOTION_KEY");
        }
    }

    #[test]
    fn credential_source_reports_unresolvable_reference() {
        let mut config = ClientConfig::default();
        config.credentials.insert(
            "GMAIL_ACCESS_TOKEN".to_string(),
            "env::_MEETAGENDA_TEST_UNSET_12345".to_string(),
        );
        let err = config.credential_source().unwrap_err();
        assert!(err.contains("credentials.GMAIL_ACCESS_TOKEN"));
    }

    #[test]
    fn load_from_reports_parse_errors() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[http]\ntimeout_secs = \"soon\"").unwrap();
        let err = ClientConfig::load_from(file.path()).unwrap_err();
        assert!(err.contains("failed to parse"));
    }

    #[test]
    fn env_file_does_not_override_existing_variables() {
        unsafe {
            std::env::set_var("_MEETAGENDA_TEST_KEEP", "from-env");
        }
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "_MEETAGENDA_TEST_KEEP=from-file\n_MEETAGENDA_TEST_NEW=loaded"
        )
        .unwrap();

        let loaded = load_env_file(Some(file.path())).unwrap();
        assert_eq!(loaded.as_deref(), Some(file.path()));
        assert_eq!(std::env::var("_MEETAGENDA_TEST_KEEP").unwrap(), "from-env");
        assert_eq!(std::env::var("_MEETAGENDA_TEST_NEW").unwrap(), "loaded");

        unsafe {
            std::env::remove_var("_MEETAGENDA_TEST_KEEP");
            std::env::remove_var("_MEETAGENDA_TEST_NEW");
        }
    }

    #[test]
    fn log_filter_from_env_file_reaches_tracing_setup() {
        let previous = std::env::var_os("RUST_LOG");
        unsafe {
            std::env::remove_var("RUST_LOG");
        }
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "RUST_LOG=meetagenda_providers=trace").unwrap();

        let (tracing, loaded) = logging_setup(Some(file.path()), false, true).unwrap();
        assert_eq!(loaded.as_deref(), Some(file.path()));
        assert_eq!(
            tracing.env_filter.as_deref(),
            Some("meetagenda_providers=trace")
        );
        assert_eq!(tracing.output_format, TracingOutputFormat::Json);

        unsafe {
            match previous {
                Some(value) => std::env::set_var("RUST_LOG", value),
                None => std::env::remove_var("RUST_LOG"),
            }
        }
    }

    #[test]
    fn missing_explicit_env_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_env_file(Some(&dir.path().join("absent.env"))).is_err());
    }

    #[test]
    fn configured_capabilities_follow_fallbacks() {
        let source: HashMap<String, String> =
            [("GMAIL_ACCESS_TOKEN".to_string(), "tok".to_string())].into();
        assert_eq!(
            configured_capabilities(&source),
            vec![Capability::Gmail, Capability::Calendar]
        );
    }
}
