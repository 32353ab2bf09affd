//! `meeting-email`.

use meetagenda_providers::{DeliveryResult, MeetingEmailRequest, ResourceSearch};
use serde_json::{Value, json};
use tracing::info;

use crate::cli::{EmailArgs, MeetingEmailArgs};
use crate::config::ClientConfig;
use crate::context::AppContext;
use crate::error::ClientResult;
use crate::trajectory::Trajectory;

/// Tool name recorded in trajectories.
pub const SEND_EMAIL_TOOL: &str = "send_email";

/// Builds the request shared by `meeting-email` and `meeting-agent`.
pub fn base_request(args: &EmailArgs, config: &ClientConfig) -> MeetingEmailRequest {
    let mut request = MeetingEmailRequest::new(
        args.subject.as_str(),
        args.attendees.iter().map(|a| a.trim().to_string()),
    );
    request.num_resources = args.num_resources.unwrap_or(config.search.num_results);
    if let Some(ref message) = args.message {
        request = request.with_message(message.as_str());
    }
    if let Some(ref from) = args.from {
        request = request.with_from(from.as_str());
    }
    request
}

/// Trajectory arguments for a send, without the message body.
pub fn request_summary(request: &MeetingEmailRequest) -> Value {
    json!({
        "subject": request.subject,
        "attendees": request.attendees,
        "calendar_link": request.calendar_link,
        "notion_link": request.notion_link,
        "search_query": request.search_query,
        "resources": request.resources.len(),
    })
}

fn request_for(args: &MeetingEmailArgs, config: &ClientConfig) -> MeetingEmailRequest {
    let mut request = base_request(&args.email, config);
    if let Some(ref link) = args.calendar_link {
        request = request.with_calendar_link(link.as_str());
    }
    if let Some(ref link) = args.notion_link {
        request = request.with_notion_link(link.as_str());
    }
    if let Some(ref query) = args.email.search_query {
        let num = request.num_resources;
        request = request.with_search(query.as_str(), num);
    }
    request
}

/// Composes the message without sending it. Needs no Gmail credential.
pub async fn preview(ctx: &AppContext, args: &MeetingEmailArgs) -> ClientResult<String> {
    let request = request_for(args, ctx.config());
    let search = match request.search_query {
        Some(_) => ctx.search(),
        None => None,
    };
    let email = request
        .compose(search.as_ref().map(|s| s as &dyn ResourceSearch))
        .await?;
    Ok(email.to_rfc2822(request.from.as_deref()))
}

async fn deliver(ctx: &AppContext, request: &MeetingEmailRequest) -> ClientResult<DeliveryResult> {
    let client = ctx.gmail()?;
    let search = match request.search_query {
        Some(_) => ctx.search(),
        None => None,
    };
    Ok(client
        .send_meeting_email(request, search.as_ref().map(|s| s as &dyn ResourceSearch))
        .await?)
}

/// Sends the invitation, or prints it with `--dry-run`.
pub async fn run(ctx: &AppContext, args: MeetingEmailArgs) -> ClientResult<()> {
    if args.dry_run {
        print!("{}", preview(ctx, &args).await?.replace("\r\n", "\n"));
        return Ok(());
    }

    let request = request_for(&args, ctx.config());
    let result = deliver(ctx, &request).await;

    if let Some(ref path) = args.email.trajectory_out {
        let mut trajectory = Trajectory::new(format!(
            "send meeting email '{}' to {}",
            request.subject,
            request.attendees.join(", ")
        ));
        match &result {
            Ok(delivery) => {
                trajectory.record_tool(
                    SEND_EMAIL_TOOL,
                    request_summary(&request),
                    serde_json::to_value(delivery).map_err(|e| e.to_string()),
                );
                trajectory.finish(format!("email sent, message id {}", delivery.message_id));
            }
            Err(e) => {
                trajectory.record_tool(SEND_EMAIL_TOOL, request_summary(&request), Err(e.to_string()));
                trajectory.fail(e.to_string());
            }
        }
        trajectory.append_to(path)?;
        info!(path = %path.display(), "trajectory written");
    }

    let delivery = result?;
    println!(
        "Email sent to {} (message id {})",
        request.attendees.join(", "),
        delivery.message_id
    );
    Ok(())
}
