use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle of an event. Created as `Draft`, published when invitations
/// should go out, completed once the doors close.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventStatus {
    Draft,
    Published,
    Completed,
}

impl EventStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            EventStatus::Draft => "DRAFT",
            EventStatus::Published => "PUBLISHED",
            EventStatus::Completed => "COMPLETED",
        }
    }

    pub fn parse(raw: &str) -> Option<EventStatus> {
        match raw {
            "DRAFT" => Some(EventStatus::Draft),
            "PUBLISHED" => Some(EventStatus::Published),
            "COMPLETED" => Some(EventStatus::Completed),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: i64,
    pub name: String,
    pub location: String,
    pub description: Option<String>,
    pub event_date: DateTime<Utc>,
    pub status: EventStatus,
    pub created_by: i64,
    /// User ids allowed to check attendees in at the door.
    pub staff_ids: Vec<i64>,
    pub diploma_template_path: Option<String>,
    pub diploma_enabled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
