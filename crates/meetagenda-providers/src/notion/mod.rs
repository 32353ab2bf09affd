//! Notion database client.
//!
//! Rows of the meetings database map to [`meetagenda_core::MeetingRecord`].
//! Property names are configurable through [`PropertyNames`]; the property
//! types are fixed (title, date, select, multi-select, rich text).

mod blocks;
mod client;
mod filter;
mod properties;

pub use blocks::{AgendaBlock, AgendaTopic, MAX_CHILDREN, agenda_blocks};
pub use client::{CreatedPage, MAX_PAGE_SIZE, NOTION_API_BASE, NOTION_VERSION, NotionClient};
pub use filter::{DateCondition, MeetingFilter, TextCondition};
pub use properties::{MAX_TEXT_CHUNK, PropertyNames};
