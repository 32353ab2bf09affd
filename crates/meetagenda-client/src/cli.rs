//! Command-line interface definition.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use meetagenda_providers::{DateCondition, SendUpdates, TextCondition};

/// meetagenda - schedule a meeting, write its agenda, send the invitation
#[derive(Debug, Parser)]
#[command(name = "meetagenda")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, short, global = true, env = "MEETAGENDA_CONFIG")]
    pub config: Option<PathBuf>,

    /// Load variables from this file instead of searching for `.env`
    #[arg(long, global = true)]
    pub env_file: Option<PathBuf>,

    /// Enable debug output
    #[arg(long, short = 'v', global = true)]
    pub debug: bool,

    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Send a meeting invitation email through Gmail
    #[command(alias = "meeting_email")]
    MeetingEmail(MeetingEmailArgs),

    /// Search, create the calendar event, the Notion agenda, then send the email
    #[command(alias = "meeting_agent")]
    MeetingAgent(MeetingAgentArgs),

    /// Google Calendar operations
    Calendar {
        #[command(subcommand)]
        action: CalendarAction,
    },

    /// Notion meetings database operations
    Notion {
        #[command(subcommand)]
        action: NotionAction,
    },

    /// Search the web for meeting resources
    Search(SearchArgs),

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Email content shared by `meeting-email` and `meeting-agent`.
#[derive(Debug, Clone, Args)]
pub struct EmailArgs {
    /// Meeting subject
    #[arg(long, short)]
    pub subject: String,

    /// Attendee email addresses (comma separated or repeated)
    #[arg(long, short, required = true, value_delimiter = ',', num_args = 1..)]
    pub attendees: Vec<String>,

    /// Introductory message placed before the links
    #[arg(long, short)]
    pub message: Option<String>,

    /// Query whose results are listed as resources
    #[arg(long)]
    pub search_query: Option<String>,

    /// Number of resources to include
    #[arg(long)]
    pub num_resources: Option<usize>,

    /// `From` header, Gmail uses the authenticated account when absent
    #[arg(long)]
    pub from: Option<String>,

    /// Append the run to this file as one JSON line
    #[arg(long)]
    pub trajectory_out: Option<PathBuf>,
}

/// Arguments of `meeting-email`.
#[derive(Debug, Clone, Args)]
pub struct MeetingEmailArgs {
    #[command(flatten)]
    pub email: EmailArgs,

    /// Calendar event link
    #[arg(long)]
    pub calendar_link: Option<String>,

    /// Notion page link
    #[arg(long)]
    pub notion_link: Option<String>,

    /// Print the composed message instead of sending it
    #[arg(long)]
    pub dry_run: bool,
}

/// Event timing shared by `meeting-agent` and `calendar create`.
#[derive(Debug, Clone, Args)]
pub struct EventTimeArgs {
    /// Start, e.g. 2025-03-10T10:00:00
    #[arg(long)]
    pub start: String,

    /// End, defaults to start plus --duration-minutes
    #[arg(long)]
    pub end: Option<String>,

    /// Length when --end is not given
    #[arg(long, conflicts_with = "end")]
    pub duration_minutes: Option<u32>,

    /// IANA timezone, e.g. Asia/Hong_Kong
    #[arg(long, visible_alias = "tz")]
    pub timezone: Option<String>,

    /// Event location
    #[arg(long)]
    pub location: Option<String>,

    /// Event description
    #[arg(long)]
    pub description: Option<String>,

    /// Calendar to create the event in
    #[arg(long)]
    pub calendar_id: Option<String>,
}

/// Arguments of `meeting-agent`.
#[derive(Debug, Clone, Args)]
pub struct MeetingAgentArgs {
    #[command(flatten)]
    pub email: EmailArgs,

    #[command(flatten)]
    pub time: EventTimeArgs,

    /// Agenda topic, `Title: details` (can be repeated)
    #[arg(long = "topic", action = clap::ArgAction::Append)]
    pub topics: Vec<String>,

    /// Action item (can be repeated)
    #[arg(long = "action-item", action = clap::ArgAction::Append)]
    pub action_items: Vec<String>,

    /// Notion database, overrides NOTION_DATABASE_ID
    #[arg(long)]
    pub database_id: Option<String>,

    /// Do not create the calendar event
    #[arg(long)]
    pub skip_calendar: bool,

    /// Do not create the Notion agenda page
    #[arg(long)]
    pub skip_notion: bool,

    /// Do not send the email
    #[arg(long)]
    pub skip_email: bool,
}

/// Calendar subcommands.
#[derive(Debug, Subcommand)]
pub enum CalendarAction {
    /// Create an event
    Create(CalendarCreateArgs),
}

/// Arguments of `calendar create`.
#[derive(Debug, Clone, Args)]
pub struct CalendarCreateArgs {
    /// Event title
    #[arg(long)]
    pub summary: String,

    #[command(flatten)]
    pub time: EventTimeArgs,

    /// Attendee email addresses (comma separated or repeated)
    #[arg(long, short, value_delimiter = ',')]
    pub attendees: Vec<String>,

    /// Who Google notifies: all, externalOnly or none
    #[arg(long)]
    pub send_updates: Option<SendUpdates>,

    /// Print the created event as JSON
    #[arg(long)]
    pub json: bool,
}

/// Notion subcommands.
#[derive(Debug, Subcommand)]
pub enum NotionAction {
    /// Query the meetings database
    Query(NotionQueryArgs),
    /// Create a meeting page
    Create(NotionCreateArgs),
    /// Update a meeting page
    Update(NotionUpdateArgs),
}

/// Arguments of `notion query`.
#[derive(Debug, Clone, Args)]
pub struct NotionQueryArgs {
    /// Notion database, overrides NOTION_DATABASE_ID
    #[arg(long)]
    pub database_id: Option<String>,

    /// Only meetings with this status
    #[arg(long)]
    pub status: Option<String>,

    /// Date to compare against (YYYY-MM-DD)
    #[arg(long)]
    pub date: Option<String>,

    /// Date comparison
    #[arg(long, default_value = "equals")]
    pub date_condition: DateCondition,

    /// Text to look for in discussion topics
    #[arg(long)]
    pub topics: Option<String>,

    /// Discussion topics comparison
    #[arg(long, default_value = "contains")]
    pub topics_condition: TextCondition,

    /// Only titles containing this text
    #[arg(long)]
    pub title_contains: Option<String>,

    /// Only meetings with this attendee
    #[arg(long)]
    pub attendee: Option<String>,

    /// Maximum number of meetings returned
    #[arg(long)]
    pub max_results: Option<usize>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Meeting fields for `notion create` and `notion update`.
#[derive(Debug, Clone, Args)]
pub struct RecordArgs {
    /// Meeting date (YYYY-MM-DD)
    #[arg(long)]
    pub date: Option<String>,

    /// Scheduled, Ongoing, Completed or Cancelled
    #[arg(long)]
    pub status: Option<String>,

    /// Attendee names (comma separated or repeated)
    #[arg(long, short, value_delimiter = ',')]
    pub attendees: Vec<String>,

    /// Discussion topics text
    #[arg(long)]
    pub topics: Option<String>,

    /// Action items text
    #[arg(long)]
    pub action_items: Option<String>,
}

/// Arguments of `notion create`.
#[derive(Debug, Clone, Args)]
pub struct NotionCreateArgs {
    /// Notion database, overrides NOTION_DATABASE_ID
    #[arg(long)]
    pub database_id: Option<String>,

    /// Meeting title
    #[arg(long)]
    pub title: String,

    #[command(flatten)]
    pub record: RecordArgs,

    /// Agenda topic for the page body, `Title: details` (can be repeated)
    #[arg(long = "agenda-topic", action = clap::ArgAction::Append)]
    pub agenda_topics: Vec<String>,
}

/// Arguments of `notion update`.
#[derive(Debug, Clone, Args)]
pub struct NotionUpdateArgs {
    /// Page to update
    #[arg(long)]
    pub page_id: String,

    /// New title
    #[arg(long)]
    pub title: Option<String>,

    #[command(flatten)]
    pub record: RecordArgs,
}

/// Arguments of `search`.
#[derive(Debug, Clone, Args)]
pub struct SearchArgs {
    /// Search query
    pub query: String,

    /// Number of results
    #[arg(long, short)]
    pub num: Option<usize>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Configuration actions.
#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Print the effective configuration, plain secrets masked
    Dump,
    /// Validate the configuration and report available credentials
    Validate,
    /// Show the configuration file path
    Path,
}
