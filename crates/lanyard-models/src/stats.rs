use serde::{Deserialize, Serialize};

/// Per-event attendance counters, recomputed from the attendee table on
/// every request.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EventStats {
    pub total: i64,
    pub checked_in: i64,
    pub percentage: f64,
}

impl EventStats {
    pub fn new(total: i64, checked_in: i64) -> EventStats {
        let percentage = if total > 0 {
            (checked_in as f64 / total as f64) * 100.0
        } else {
            0.0
        };
        EventStats {
            total,
            checked_in,
            percentage,
        }
    }
}

/// One leaderboard row: how many attendees a staff member scanned in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaffScanCount {
    pub staff_email: String,
    pub scans: i64,
}

/// Aggregate result of a sequential dispatch loop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchOutcome {
    pub sent: i64,
    pub failed: i64,
    pub total: i64,
}
