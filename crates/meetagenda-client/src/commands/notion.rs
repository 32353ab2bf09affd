//! `notion query|create|update`.

use meetagenda_core::{MeetingRecord, MeetingStatus, parse_date};
use meetagenda_providers::{AgendaTopic, MeetingFilter, agenda_blocks};

use crate::cli::{NotionCreateArgs, NotionQueryArgs, NotionUpdateArgs, RecordArgs};
use crate::context::AppContext;
use crate::error::ClientResult;

/// Builds the query filter, `None` when no condition was given.
pub fn build_filter(args: &NotionQueryArgs) -> ClientResult<Option<MeetingFilter>> {
    let mut filter = MeetingFilter::new();
    if let Some(ref status) = args.status {
        filter = filter.with_status(status.parse::<MeetingStatus>()?);
    }
    if let Some(ref date) = args.date {
        filter = filter.with_date(args.date_condition, parse_date(date)?);
    }
    if let Some(ref topics) = args.topics {
        filter = filter.with_discussion_topics(args.topics_condition, topics.as_str());
    }
    if let Some(ref title) = args.title_contains {
        filter = filter.with_title_contains(title.as_str());
    }
    if let Some(ref attendee) = args.attendee {
        filter = filter.with_attendee(attendee.as_str());
    }
    Ok((!filter.is_empty()).then_some(filter))
}

/// Applies the optional fields to `record`. Status is parsed here so an
/// unknown value is rejected before any request.
pub fn apply_fields(mut record: MeetingRecord, args: &RecordArgs) -> ClientResult<MeetingRecord> {
    if let Some(ref date) = args.date {
        record = record.with_date(parse_date(date)?);
    }
    if let Some(ref status) = args.status {
        record = record.with_status(status.parse()?);
    }
    if !args.attendees.is_empty() {
        record = record.with_attendees(args.attendees.iter().map(|a| a.trim().to_string()));
    }
    if let Some(ref topics) = args.topics {
        record = record.with_discussion_topics(topics.as_str());
    }
    if let Some(ref items) = args.action_items {
        record = record.with_action_items(items.as_str());
    }
    Ok(record)
}

/// Renders records for the terminal.
pub fn render(records: &[MeetingRecord]) -> String {
    if records.is_empty() {
        return "No meetings found.\n".to_string();
    }
    let mut out = String::new();
    for record in records {
        let date = record
            .date
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "----------".to_string());
        let status = record.status.map(|s| s.as_str()).unwrap_or("-");
        out.push_str(&format!("{}  {}  [{}]\n", date, record.title, status));
        if !record.attendees.is_empty() {
            out.push_str(&format!("    attendees: {}\n", record.attendees.join(", ")));
        }
        if let Some(ref topics) = record.discussion_topics {
            out.push_str(&format!("    topics: {}\n", topics.replace('\n', " / ")));
        }
        if let Some(ref items) = record.action_items {
            out.push_str(&format!("    action items: {}\n", items.replace('\n', " / ")));
        }
        if let Some(ref url) = record.url {
            out.push_str(&format!("    {}\n", url));
        }
    }
    out
}

/// Lists meetings.
pub async fn query(ctx: &AppContext, args: NotionQueryArgs) -> ClientResult<()> {
    let database_id = ctx.database_id(args.database_id.as_deref())?;
    let filter = build_filter(&args)?;
    let max_results = args.max_results.unwrap_or(ctx.config().notion.max_results);

    let records = ctx
        .notion()?
        .query_database(&database_id, filter.as_ref(), Some(max_results))
        .await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&records)?);
    } else {
        print!("{}", render(&records));
    }
    Ok(())
}

/// Creates a meeting page, with an agenda body when topics are given.
pub async fn create(ctx: &AppContext, args: NotionCreateArgs) -> ClientResult<()> {
    let database_id = ctx.database_id(args.database_id.as_deref())?;
    let record = apply_fields(MeetingRecord::new(args.title.as_str()), &args.record)?;

    let topics: Vec<AgendaTopic> = args
        .agenda_topics
        .iter()
        .filter_map(|t| AgendaTopic::parse(t))
        .collect();
    let blocks = if topics.is_empty() {
        Vec::new()
    } else {
        let items = split_lines(args.record.action_items.as_deref());
        agenda_blocks(&topics, &items)
    };

    let page = ctx
        .notion()?
        .create_record(&database_id, &record, &blocks)
        .await?;
    println!("Page created: {}", page.id);
    if !page.url.is_empty() {
        println!("{}", page.url);
    }
    Ok(())
}

/// Updates the given fields of a meeting page.
pub async fn update(ctx: &AppContext, args: NotionUpdateArgs) -> ClientResult<()> {
    let mut record = MeetingRecord::default();
    if let Some(ref title) = args.title {
        record.title = title.clone();
    }
    let record = apply_fields(record, &args.record)?;

    let page = ctx.notion()?.update_record(&args.page_id, &record).await?;
    println!("Page updated: {}", page.id);
    Ok(())
}

/// Splits multi-line text into trimmed, non-empty lines.
pub fn split_lines(text: Option<&str>) -> Vec<String> {
    text.map(|t| {
        t.lines()
            .map(|line| line.trim().trim_start_matches(['-', '*']).trim())
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect()
    })
    .unwrap_or_default()
}
