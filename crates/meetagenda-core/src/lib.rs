//! Core types: meeting records, calendar events, email composition, tracing
//!
//! Nothing in this crate performs I/O. The vendor clients live in
//! `meetagenda-providers`; this crate holds the values they send and receive
//! and the local validation rules applied before any request is made.

pub mod email;
pub mod error;
pub mod event;
pub mod meeting;
pub mod tracing;

pub use email::{MeetingEmail, Resource};
pub use error::ValidationError;
pub use event::{CalendarEvent, EventAttendee, EventTime};
pub use meeting::{DatabaseId, MeetingRecord, MeetingStatus, parse_date};
pub use tracing::{TracingConfig, TracingError, TracingOutputFormat, init_tracing};
