use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attendee {
    pub id: i64,
    pub event_id: i64,
    pub email: String,
    pub name: String,
    /// National id number, optional column in uploaded lists.
    pub rut: Option<String>,
    pub checked_in: bool,
    pub check_in_time: Option<DateTime<Utc>>,
    pub checked_in_by_id: Option<i64>,
    pub checked_in_by_email: Option<String>,
    pub ticket_sent: bool,
    pub diploma_sent: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Outcome of a check-in request. `AlreadyCheckedIn` is returned on repeat
/// scans of the same badge; the stored record is left untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckInStatus {
    CheckedIn,
    AlreadyCheckedIn,
}

impl CheckInStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            CheckInStatus::CheckedIn => "checked_in",
            CheckInStatus::AlreadyCheckedIn => "already_checked_in",
        }
    }
}
