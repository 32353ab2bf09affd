//! `meeting-agent`: search, calendar event, Notion agenda, email.
//!
//! Steps run in that order and each one is recorded in the trajectory.
//! Search is best-effort; any other failing step stops the run, is
//! recorded with its error, and is returned once the trajectory is
//! written. Subject and recipients are checked before the first step
//! when an email is going to be sent.

use meetagenda_core::{MeetingEmail, MeetingRecord, MeetingStatus, Resource, parse_date};
use meetagenda_providers::{
    AgendaTopic, CreatedEvent, CreatedPage, DeliveryResult, ResourceSearch, agenda_blocks,
};
use serde::Serialize;
use serde_json::{Value, json};
use tracing::{info, warn};

use crate::cli::MeetingAgentArgs;
use crate::commands::calendar::{build_event, calendar_id};
use crate::commands::email::{SEND_EMAIL_TOOL, base_request, request_summary};
use crate::commands::notion::split_lines;
use crate::context::AppContext;
use crate::error::{ClientError, ClientResult};
use crate::trajectory::Trajectory;

/// Tool name recorded for the resources search.
pub const SEARCH_TOOL: &str = "search";
/// Tool name recorded for the calendar event.
pub const CALENDAR_TOOL: &str = "create_calendar_event";
/// Tool name recorded for the Notion page.
pub const NOTION_TOOL: &str = "create_notion_page";

/// What a run produced.
#[derive(Debug, Clone, Default)]
pub struct AgentOutcome {
    pub resources: Vec<Resource>,
    pub event: Option<CreatedEvent>,
    pub page: Option<CreatedPage>,
    pub delivery: Option<DeliveryResult>,
}

impl AgentOutcome {
    /// One-paragraph summary used as the final answer.
    pub fn summary(&self, subject: &str) -> String {
        let mut parts = Vec::new();
        if let Some(ref event) = self.event {
            parts.push(format!("calendar event {} created", event.id));
        }
        if let Some(ref page) = self.page {
            parts.push(format!("Notion agenda {} created", page.id));
        }
        if let Some(ref delivery) = self.delivery {
            parts.push(format!("invitation sent (message id {})", delivery.message_id));
        }
        if !self.resources.is_empty() {
            parts.push(format!("{} resources found", self.resources.len()));
        }
        if parts.is_empty() {
            format!("'{}': nothing to do", subject)
        } else {
            format!("'{}': {}", subject, parts.join(", "))
        }
    }
}

/// Describes the request for step 0.
pub fn describe_request(args: &MeetingAgentArgs) -> String {
    let mut text = format!(
        "schedule '{}' at {} with {}",
        args.email.subject,
        args.time.start,
        args.email.attendees.join(", ")
    );
    if !args.topics.is_empty() {
        text.push_str(&format!("; topics: {}", args.topics.join("; ")));
    }
    text
}

fn record_step<T: Serialize>(
    trajectory: &mut Trajectory,
    tool: &str,
    tool_args: Value,
    result: ClientResult<T>,
) -> ClientResult<T> {
    match result {
        Ok(value) => {
            trajectory.record_tool(
                tool,
                tool_args,
                serde_json::to_value(&value).map_err(|e| e.to_string()),
            );
            Ok(value)
        }
        Err(e) => {
            trajectory.record_tool(tool, tool_args, Err(e.to_string()));
            Err(e)
        }
    }
}

async fn gather_resources(
    ctx: &AppContext,
    query: &str,
    num: usize,
    trajectory: &mut Trajectory,
) -> Vec<Resource> {
    let tool_args = json!({ "query": query, "num": num });
    let result = match ctx.search() {
        Some(client) => client.search(query, num).await.map_err(ClientError::from),
        None => Err(ClientError::Config(
            "search is disabled or SERPER_API_KEY is not set".to_string(),
        )),
    };
    match record_step(trajectory, SEARCH_TOOL, tool_args, result) {
        Ok(resources) => resources,
        Err(e) => {
            warn!(error = %e, "continuing without resources");
            Vec::new()
        }
    }
}

/// Builds the Notion row for the meeting.
pub fn meeting_record(args: &MeetingAgentArgs) -> MeetingRecord {
    let mut record = MeetingRecord::new(args.email.subject.as_str())
        .with_status(MeetingStatus::Scheduled)
        .with_attendees(args.email.attendees.iter().map(|a| a.trim().to_string()));
    if let Ok(date) = parse_date(&args.time.start) {
        record = record.with_date(date);
    }
    if !args.topics.is_empty() {
        record = record.with_discussion_topics(args.topics.join("\n"));
    }
    if !args.action_items.is_empty() {
        record = record.with_action_items(args.action_items.join("\n"));
    }
    record
}

async fn execute(
    ctx: &AppContext,
    args: &MeetingAgentArgs,
    trajectory: &mut Trajectory,
) -> ClientResult<AgentOutcome> {
    if !args.skip_email {
        MeetingEmail::new(
            &args.email.subject,
            args.email.attendees.iter().map(|a| a.trim().to_string()),
        )?;
    }

    let mut outcome = AgentOutcome::default();
    let num = args
        .email
        .num_resources
        .unwrap_or(ctx.config().search.num_results);

    if let Some(query) = args.email.search_query.as_deref().map(str::trim)
        && !query.is_empty()
    {
        outcome.resources = gather_resources(ctx, query, num, trajectory).await;
    }

    if !args.skip_calendar {
        let event = match build_event(
            &args.email.subject,
            &args.time,
            &args.email.attendees,
            ctx.config(),
        ) {
            Ok(event) => event,
            Err(e) => {
                let tool_args = json!({
                    "summary": args.email.subject,
                    "start": args.time.start,
                    "end": args.time.end,
                    "timezone": args.time.timezone,
                });
                trajectory.record_tool(CALENDAR_TOOL, tool_args, Err(e.to_string()));
                return Err(e);
            }
        };
        let calendar = calendar_id(&args.time, ctx.config());
        let tool_args = json!({ "calendar_id": calendar, "event": event });
        let result: ClientResult<CreatedEvent> = async {
            Ok(ctx.calendar()?.create_event(calendar, &event).await?)
        }
        .await;
        outcome.event = Some(record_step(trajectory, CALENDAR_TOOL, tool_args, result)?);
    }

    if !args.skip_notion {
        let record = meeting_record(args);
        let topics: Vec<AgendaTopic> = args
            .topics
            .iter()
            .filter_map(|t| AgendaTopic::parse(t))
            .collect();
        let items = args
            .action_items
            .iter()
            .flat_map(|i| split_lines(Some(i)))
            .collect::<Vec<_>>();
        let blocks = agenda_blocks(&topics, &items);
        let tool_args = json!({ "record": record, "blocks": blocks.len() });
        let result: ClientResult<CreatedPage> = async {
            let database_id = ctx.database_id(args.database_id.as_deref())?;
            Ok(ctx
                .notion()?
                .create_record(&database_id, &record, &blocks)
                .await?)
        }
        .await;
        outcome.page = Some(record_step(trajectory, NOTION_TOOL, tool_args, result)?);
    }

    if !args.skip_email {
        let mut request = base_request(&args.email, ctx.config())
            .with_resources(outcome.resources.clone());
        if let Some(ref event) = outcome.event
            && !event.html_link.is_empty()
        {
            request = request.with_calendar_link(event.html_link.as_str());
        }
        if let Some(ref page) = outcome.page
            && !page.url.is_empty()
        {
            request = request.with_notion_link(page.url.as_str());
        }
        let tool_args = request_summary(&request);
        let result: ClientResult<DeliveryResult> = async {
            Ok(ctx.gmail()?.send_meeting_email(&request, None).await?)
        }
        .await;
        outcome.delivery = Some(record_step(trajectory, SEND_EMAIL_TOOL, tool_args, result)?);
    }

    Ok(outcome)
}

/// Runs the pipeline and returns what it produced along with the
/// trajectory, which is complete whether or not a step failed.
pub async fn run_pipeline(
    ctx: &AppContext,
    args: &MeetingAgentArgs,
) -> (Trajectory, ClientResult<AgentOutcome>) {
    let mut trajectory = Trajectory::new(describe_request(args));
    let result = execute(ctx, args, &mut trajectory).await;
    match &result {
        Ok(outcome) => trajectory.finish(outcome.summary(&args.email.subject)),
        Err(e) => trajectory.fail(e.to_string()),
    }
    (trajectory, result)
}

/// `meeting-agent` entry point.
pub async fn run(ctx: &AppContext, args: MeetingAgentArgs) -> ClientResult<()> {
    let (trajectory, result) = run_pipeline(ctx, &args).await;

    if let Some(ref path) = args.email.trajectory_out {
        trajectory.append_to(path)?;
        info!(path = %path.display(), steps = trajectory.total_steps, "trajectory written");
    }

    let outcome = result?;
    if let Some(ref event) = outcome.event {
        println!("Calendar event: {}", display_link(&event.html_link, &event.id));
    }
    if let Some(ref page) = outcome.page {
        println!("Notion agenda:  {}", display_link(&page.url, &page.id));
    }
    if let Some(ref delivery) = outcome.delivery {
        println!("Email sent:     {}", delivery.message_id);
    }
    if let Some(ref answer) = trajectory.final_answer {
        println!("{}", answer);
    }
    Ok(())
}

fn display_link<'a>(link: &'a str, id: &'a str) -> &'a str {
    if link.is_empty() { id } else { link }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{EmailArgs, EventTimeArgs};
    use crate::commands::email::SEND_EMAIL_TOOL;
    use crate::config::ClientConfig;
    use crate::test_server::StubApi;
    use crate::trajectory::{ACTION_ERROR, ACTION_FINAL_ANSWER, ACTION_TOOL_CALL};
    use base64::Engine;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use meetagenda_providers::{LayeredSource, ProviderErrorCode};
    use std::collections::HashMap;

    const DATABASE: &str = "2bee7c813e1c818c9307cc30152eaeac";

    fn context(pairs: &[(&str, &str)]) -> AppContext {
        let values: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppContext::with_source(
            ClientConfig::default(),
            LayeredSource::new().with_layer(values),
        )
    }

    struct Apis {
        calendar: StubApi,
        notion: StubApi,
        gmail: StubApi,
    }

    async fn apis() -> Apis {
        Apis {
            calendar: StubApi::replying(json!({
                "id": "evt1",
                "htmlLink": "https://calendar.google.com/event?eid=evt1"
            }))
            .await,
            notion: StubApi::replying(json!({
                "id": "page1",
                "url": "https://www.notion.so/page1"
            }))
            .await,
            gmail: StubApi::replying(json!({"id": "msg1", "threadId": "thr1"})).await,
        }
    }

    fn stubbed_context(apis: &Apis) -> AppContext {
        let mut config = ClientConfig::default();
        config.http.no_proxy = true;
        config.http.max_attempts = 1;
        config.endpoints.calendar = Some(apis.calendar.base_url());
        config.endpoints.notion = Some(apis.notion.base_url());
        config.endpoints.gmail = Some(apis.gmail.base_url());
        let values: HashMap<String, String> = [
            ("GMAIL_ACCESS_TOKEN", "ya29.agent"),
            ("NOTION_API_KEY", "secret_agent"),
            ("NOTION_DATABASE_ID", DATABASE),
        ]
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        AppContext::with_source(config, LayeredSource::new().with_layer(values))
    }

    fn args() -> MeetingAgentArgs {
        MeetingAgentArgs {
            email: EmailArgs {
                subject: "Quarterly Planning".to_string(),
                attendees: vec!["a@example.com".to_string(), "b@example.com".to_string()],
                message: None,
                search_query: None,
                num_resources: None,
                from: None,
                trajectory_out: None,
            },
            time: EventTimeArgs {
                start: "2025-03-10T10:00:00".to_string(),
                end: None,
                duration_minutes: None,
                timezone: Some("Asia/Hong_Kong".to_string()),
                location: None,
                description: None,
                calendar_id: None,
            },
            topics: vec!["Budget: Q2 numbers".to_string(), "Hiring".to_string()],
            action_items: vec!["Share slides".to_string()],
            database_id: None,
            skip_calendar: false,
            skip_notion: false,
            skip_email: false,
        }
    }

    #[tokio::test]
    async fn missing_calendar_token_stops_the_run() {
        let ctx = context(&[]);
        let (trajectory, result) = run_pipeline(&ctx, &args()).await;

        let err = result.unwrap_err();
        assert_eq!(err.provider_code(), Some(ProviderErrorCode::MissingCredential));
        assert_eq!(trajectory.steps.len(), 3);
        assert_eq!(trajectory.steps[1].action, ACTION_TOOL_CALL);
        assert_eq!(trajectory.steps[1].tool_name.as_deref(), Some(CALENDAR_TOOL));
        assert!(
            trajectory.steps[1].tool_result.as_ref().unwrap()["error"]
                .as_str()
                .unwrap()
                .contains("GOOGLE_CALENDAR_ACCESS_TOKEN")
        );
        assert_eq!(trajectory.steps[2].action, ACTION_ERROR);
        assert_eq!(trajectory.total_steps, 2);
    }

    #[tokio::test]
    async fn links_from_calendar_and_notion_reach_the_email() {
        let apis = apis().await;
        let ctx = stubbed_context(&apis);

        let (trajectory, result) = run_pipeline(&ctx, &args()).await;
        let outcome = result.unwrap();
        assert_eq!(outcome.event.unwrap().id, "evt1");
        assert_eq!(outcome.page.unwrap().id, "page1");
        assert_eq!(outcome.delivery.unwrap().message_id, "msg1");

        let events = apis.calendar.requests();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].method, "POST");
        assert!(events[0].path.starts_with("/calendars/primary/events"));
        assert_eq!(events[0].body["summary"], "Quarterly Planning");

        let pages = apis.notion.requests();
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].path, "/pages");
        assert_eq!(pages[0].body["parent"]["database_id"], DATABASE);

        let sent = apis.gmail.requests();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].path, "/users/me/messages/send");
        let raw = sent[0].body["raw"].as_str().unwrap();
        let message = String::from_utf8(URL_SAFE_NO_PAD.decode(raw).unwrap()).unwrap();
        assert!(message.contains("To: a@example.com, b@example.com"));
        assert!(message.contains("Calendar event: https://calendar.google.com/event?eid=evt1"));
        assert!(message.contains("Notion agenda: https://www.notion.so/page1"));

        let tools: Vec<_> = trajectory
            .steps
            .iter()
            .filter_map(|s| s.tool_name.as_deref())
            .collect();
        assert_eq!(tools, vec![CALENDAR_TOOL, NOTION_TOOL, SEND_EMAIL_TOOL]);
        assert_eq!(trajectory.steps.last().unwrap().action, ACTION_FINAL_ANSWER);
        assert!(trajectory.is_complete());
    }

    #[tokio::test]
    async fn invalid_attendee_stops_before_any_request() {
        let apis = apis().await;
        let ctx = stubbed_context(&apis);
        let mut args = args();
        args.email.attendees = vec!["a@example.com".to_string(), "bob".to_string()];

        let (trajectory, result) = run_pipeline(&ctx, &args).await;
        let err = result.unwrap_err();
        assert_eq!(err.provider_code(), Some(ProviderErrorCode::InvalidInput));
        assert!(err.to_string().contains("bob"));
        assert!(apis.calendar.requests().is_empty());
        assert!(apis.notion.requests().is_empty());
        assert!(apis.gmail.requests().is_empty());
        assert_eq!(trajectory.steps.len(), 2);
        assert_eq!(trajectory.steps[1].action, ACTION_ERROR);
    }

    #[tokio::test]
    async fn unparseable_start_is_recorded_on_the_calendar_step() {
        let apis = apis().await;
        let ctx = stubbed_context(&apis);
        let mut args = args();
        args.time.start = "tomorrow at ten".to_string();

        let (trajectory, result) = run_pipeline(&ctx, &args).await;
        assert!(matches!(result, Err(ClientError::InvalidArgument(_))));
        assert!(apis.calendar.requests().is_empty());
        assert_eq!(trajectory.steps.len(), 3);
        assert_eq!(trajectory.steps[1].tool_name.as_deref(), Some(CALENDAR_TOOL));
        assert_eq!(trajectory.steps[1].tool_args.as_ref().unwrap()["start"], "tomorrow at ten");
        assert!(
            trajectory.steps[1].tool_result.as_ref().unwrap()["error"]
                .as_str()
                .unwrap()
                .contains("--end")
        );
        assert_eq!(trajectory.steps[2].action, ACTION_ERROR);
    }

    #[tokio::test]
    async fn search_failure_is_recorded_but_not_fatal() {
        let ctx = context(&[]);
        let mut args = args();
        args.email.search_query = Some("okr planning".to_string());
        args.skip_calendar = true;
        args.skip_notion = true;
        args.skip_email = true;

        let (trajectory, result) = run_pipeline(&ctx, &args).await;
        let outcome = result.unwrap();
        assert!(outcome.resources.is_empty());
        assert_eq!(trajectory.steps[1].tool_name.as_deref(), Some(SEARCH_TOOL));
        assert!(trajectory.steps[1].tool_result.as_ref().unwrap()["error"].is_string());
        assert!(trajectory.is_complete());
        assert_eq!(
            trajectory.final_answer.as_deref(),
            Some("'Quarterly Planning': nothing to do")
        );
    }

    #[tokio::test]
    async fn missing_database_id_is_recorded_on_the_notion_step() {
        let ctx = context(&[("NOTION_API_KEY", "secret_x")]);
        let mut args = args();
        args.skip_calendar = true;

        let (trajectory, result) = run_pipeline(&ctx, &args).await;
        assert!(matches!(result, Err(ClientError::Config(_))));
        assert_eq!(trajectory.steps[1].tool_name.as_deref(), Some(NOTION_TOOL));
    }

    #[tokio::test]
    async fn trajectory_is_written_when_the_run_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("agent.jsonl");
        let ctx = context(&[]);
        let mut args = args();
        args.email.trajectory_out = Some(path.clone());

        assert!(run(&ctx, args).await.is_err());

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 1);
        let trajectory: Trajectory = serde_json::from_str(content.trim()).unwrap();
        assert_eq!(trajectory.steps[0].step_number, 0);
        assert!(trajectory.user_query.contains("Quarterly Planning"));
    }

    #[test]
    fn meeting_record_from_arguments() {
        let record = meeting_record(&args());
        assert_eq!(record.title, "Quarterly Planning");
        assert_eq!(record.status, Some(MeetingStatus::Scheduled));
        assert_eq!(record.date.unwrap().to_string(), "2025-03-10");
        assert_eq!(record.attendees, vec!["a@example.com", "b@example.com"]);
        assert_eq!(
            record.discussion_topics.as_deref(),
            Some("Budget: Q2 numbers\nHiring")
        );
    }

    #[test]
    fn summary_lists_created_items() {
        let outcome = AgentOutcome {
            event: Some(CreatedEvent {
                id: "evt1".to_string(),
                html_link: String::new(),
            }),
            delivery: Some(DeliveryResult {
                message_id: "msg1".to_string(),
                thread_id: "thr1".to_string(),
            }),
            ..Default::default()
        };
        assert_eq!(
            outcome.summary("Sync"),
            "'Sync': calendar event evt1 created, invitation sent (message id msg1)"
        );
    }
}
