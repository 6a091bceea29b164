use lanyard_db::attendees::{BatchReport, NewAttendee};
use lanyard_db::DbPool;

use crate::error::CoreError;
use crate::WORKER_ID;

/// Result of one attendee-list upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestSummary {
    pub accepted: usize,
    pub commits: usize,
    pub message: String,
}

/// Parse an uploaded CSV into attendee records.
///
/// Headers are matched case-insensitively. A row is accepted only when it
/// carries a non-empty `email` and `name`; `rut` is optional. Rows that
/// fail to parse or miss a required field are dropped silently — per-row
/// error reporting is an explicit non-goal.
pub fn parse_attendee_list(bytes: &[u8]) -> Vec<NewAttendee> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(bytes);

    let headers = match reader.headers() {
        Ok(headers) => headers.clone(),
        Err(_) => return Vec::new(),
    };
    let column = |wanted: &str| {
        headers
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case(wanted))
    };
    let (email_col, name_col) = match (column("email"), column("name")) {
        (Some(e), Some(n)) => (e, n),
        _ => return Vec::new(),
    };
    let rut_col = column("rut");

    let mut accepted = Vec::new();
    for record in reader.records().flatten() {
        let field = |idx: usize| record.get(idx).map(str::trim).unwrap_or_default();
        let email = field(email_col);
        let name = field(name_col);
        if email.is_empty() || name.is_empty() {
            continue;
        }
        let rut = rut_col
            .map(|idx| field(idx))
            .filter(|value| !value.is_empty())
            .map(str::to_string);
        accepted.push(NewAttendee {
            email: email.to_string(),
            name: name.to_string(),
            rut,
        });
    }
    accepted
}

/// Parse a CSV upload and persist the accepted rows through the batched
/// writer. The whole stream is consumed before anything is written.
pub async fn ingest_attendees(
    pool: &DbPool,
    event_id: i64,
    bytes: &[u8],
) -> Result<IngestSummary, CoreError> {
    lanyard_db::events::get_event(pool, event_id)
        .await?
        .ok_or(CoreError::NotFound)?;

    let records = parse_attendee_list(bytes);
    let report: BatchReport =
        lanyard_db::attendees::insert_batched(pool, event_id, &records, || {
            lanyard_util::snowflake::generate(WORKER_ID)
        })
        .await?;

    tracing::info!(
        event_id,
        accepted = report.rows,
        commits = report.commits,
        "attendee list ingested"
    );
    Ok(IngestSummary {
        accepted: report.rows,
        commits: report.commits,
        message: format!("{} attendees imported", report.rows),
    })
}
