//! `calendar create`.

use chrono::{DateTime, Duration, NaiveDateTime};
use meetagenda_core::CalendarEvent;

use crate::cli::{CalendarCreateArgs, EventTimeArgs};
use crate::config::ClientConfig;
use crate::context::AppContext;
use crate::error::{ClientError, ClientResult};

const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"];

/// Returns `end` when given, otherwise `start` plus `duration_minutes`.
///
/// The start keeps its style: an RFC 3339 start gives an RFC 3339 end with
/// the same offset, a local start gives a local end.
pub fn resolve_end(start: &str, end: Option<&str>, duration_minutes: u32) -> ClientResult<String> {
    if let Some(end) = end {
        return Ok(end.to_string());
    }
    let duration = Duration::minutes(i64::from(duration_minutes));
    let start = start.trim();

    if let Ok(start) = DateTime::parse_from_rfc3339(start) {
        return Ok((start + duration).to_rfc3339());
    }
    for format in NAIVE_FORMATS {
        if let Ok(start) = NaiveDateTime::parse_from_str(start, format) {
            return Ok((start + duration).format(NAIVE_FORMATS[0]).to_string());
        }
    }
    Err(ClientError::InvalidArgument(format!(
        "cannot compute the end from start '{}', pass --end",
        start
    )))
}

/// Builds the event from the command-line timing and the configured
/// defaults.
pub fn build_event(
    summary: &str,
    time: &EventTimeArgs,
    attendees: &[String],
    config: &ClientConfig,
) -> ClientResult<CalendarEvent> {
    let duration = time
        .duration_minutes
        .unwrap_or(config.calendar.default_duration_minutes);
    let end = resolve_end(&time.start, time.end.as_deref(), duration)?;
    let time_zone = time
        .timezone
        .as_deref()
        .unwrap_or(&config.calendar.time_zone);

    let mut event = CalendarEvent::new(summary, time.start.trim(), end, time_zone)
        .with_attendees(attendees.iter().map(|a| a.trim().to_string()));
    if let Some(ref location) = time.location {
        event = event.with_location(location.as_str());
    }
    if let Some(ref description) = time.description {
        event = event.with_description(description.as_str());
    }
    Ok(event)
}

/// Returns the calendar from the command line or the configuration.
pub fn calendar_id<'a>(time: &'a EventTimeArgs, config: &'a ClientConfig) -> &'a str {
    time.calendar_id
        .as_deref()
        .unwrap_or(&config.calendar.calendar_id)
}

/// Creates one event and prints its link.
pub async fn create(ctx: &AppContext, args: CalendarCreateArgs) -> ClientResult<()> {
    let event = build_event(&args.summary, &args.time, &args.attendees, ctx.config())?;
    let mut client = ctx.calendar()?;
    if let Some(send_updates) = args.send_updates {
        client = client.with_send_updates(send_updates);
    }

    let created = client
        .create_event(calendar_id(&args.time, ctx.config()), &event)
        .await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&created)?);
    } else {
        println!("Event created: {}", created.id);
        if !created.html_link.is_empty() {
            println!("{}", created.html_link);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn time(start: &str) -> EventTimeArgs {
        EventTimeArgs {
            start: start.to_string(),
            end: None,
            duration_minutes: None,
            timezone: None,
            location: None,
            description: None,
            calendar_id: None,
        }
    }

    #[test]
    fn explicit_end_is_kept_verbatim() {
        assert_eq!(
            resolve_end("whenever", Some("2025-03-10T11:00:00"), 60).unwrap(),
            "2025-03-10T11:00:00"
        );
    }

    #[test]
    fn end_from_local_start() {
        assert_eq!(
            resolve_end("2025-03-10T10:00:00", None, 45).unwrap(),
            "2025-03-10T10:45:00"
        );
        assert_eq!(
            resolve_end("2025-03-10T23:30", None, 60).unwrap(),
            "2025-03-11T00:30:00"
        );
    }

    #[test]
    fn end_from_rfc3339_start_keeps_offset() {
        assert_eq!(
            resolve_end("2025-03-10T10:00:00+08:00", None, 30).unwrap(),
            "2025-03-10T10:30:00+08:00"
        );
    }

    #[test]
    fn unparseable_start_needs_explicit_end() {
        let err = resolve_end("tomorrow at ten", None, 30).unwrap_err();
        assert!(matches!(err, ClientError::InvalidArgument(_)));
    }

    #[test]
    fn build_event_applies_config_defaults() {
        let mut config = ClientConfig::default();
        config.calendar.time_zone = "Asia/Hong_Kong".to_string();
        config.calendar.default_duration_minutes = 30;

        let mut args = time("2025-03-10T10:00:00");
        args.location = Some("Room 4".to_string());
        let attendees = vec![
            "a@example.com".to_string(),
            " b@example.com".to_string(),
            "a@example.com".to_string(),
        ];

        let event = build_event("Sync", &args, &attendees, &config).unwrap();
        assert_eq!(event.end.date_time, "2025-03-10T10:30:00");
        assert_eq!(event.start.time_zone, "Asia/Hong_Kong");
        assert_eq!(event.end.time_zone, "Asia/Hong_Kong");
        assert_eq!(event.attendees.len(), 2);
        assert_eq!(event.location.as_deref(), Some("Room 4"));
        assert_eq!(calendar_id(&args, &config), "primary");
    }

    #[test]
    fn command_line_timezone_wins() {
        let mut args = time("2025-03-10T10:00:00");
        args.timezone = Some("Europe/Paris".to_string());
        args.calendar_id = Some("team@group.calendar.google.com".to_string());
        let config = ClientConfig::default();

        let event = build_event("Sync", &args, &[], &config).unwrap();
        assert_eq!(event.start.time_zone, "Europe/Paris");
        assert_eq!(calendar_id(&args, &config), "team@group.calendar.google.com");
    }
}
