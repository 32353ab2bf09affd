//! meetagenda CLI entry point.

use std::process::ExitCode;

use clap::Parser;
use meetagenda_core::init_tracing;
use tracing::debug;

use meetagenda_client::cli::{CalendarAction, Cli, Command, ConfigAction, NotionAction};
use meetagenda_client::commands;
use meetagenda_client::config::{ClientConfig, logging_setup};
use meetagenda_client::context::AppContext;
use meetagenda_client::error::{ClientError, ClientResult};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Existing environment variables win over .env entries.
    let (tracing_config, env_path) =
        match logging_setup(cli.env_file.as_deref(), cli.debug, cli.log_json) {
            Ok(setup) => setup,
            Err(e) => {
                eprintln!("error: {}", e);
                return ExitCode::FAILURE;
            }
        };
    if let Err(e) = init_tracing(tracing_config) {
        eprintln!("warning: {}", e);
    }
    if let Some(path) = env_path {
        debug!(path = %path.display(), "loaded environment file");
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            if let Some(hint) = e.hint() {
                eprintln!("hint: {}", hint);
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> ClientResult<()> {
    let config_path = cli.config.clone().unwrap_or_else(ClientConfig::default_path);
    let config = match cli.config {
        Some(ref path) => ClientConfig::load_from(path).map_err(ClientError::Config)?,
        None => ClientConfig::load().map_err(ClientError::Config)?,
    };

    if let Command::Config { action } = cli.command {
        return match action {
            ConfigAction::Dump => commands::config::dump(&config, &config_path),
            ConfigAction::Validate => commands::config::validate(&config),
            ConfigAction::Path => commands::config::path(&config_path),
        };
    }

    config.validate().map_err(ClientError::Config)?;
    let ctx = AppContext::new(config)?;

    match cli.command {
        Command::MeetingEmail(args) => commands::email::run(&ctx, args).await,
        Command::MeetingAgent(args) => commands::agent::run(&ctx, args).await,
        Command::Calendar { action } => match action {
            CalendarAction::Create(args) => commands::calendar::create(&ctx, args).await,
        },
        Command::Notion { action } => match action {
            NotionAction::Query(args) => commands::notion::query(&ctx, args).await,
            NotionAction::Create(args) => commands::notion::create(&ctx, args).await,
            NotionAction::Update(args) => commands::notion::update(&ctx, args).await,
        },
        Command::Search(args) => commands::search::run(&ctx, args).await,
        // Handled before the context is built.
        Command::Config { .. } => Ok(()),
    }
}
