use std::path::Path;

use lanyard_db::events::EventRow;
use lanyard_db::DbPool;
use lanyard_models::DispatchOutcome;

use crate::error::CoreError;
use crate::mailer::{MailAttachment, Mailer, OutboundEmail};
use crate::{diploma, qr};

fn invitation_email(
    event: &EventRow,
    to: &str,
    name: &str,
    png: Vec<u8>,
    public_url: Option<&str>,
) -> OutboundEmail {
    let mut body = format!(
        "Hola {name},\n\nYou are invited to {} at {}.\n\
         Present the attached QR code at the entrance.\n",
        event.name, event.location
    );
    body.push_str(&format!("Date: {}\n", event.event_date.to_rfc3339()));
    if let Some(url) = public_url {
        body.push_str(&format!("Event details: {url}/events/{}\n", event.id));
    }
    OutboundEmail {
        to: to.to_string(),
        subject: format!("Your invitation to {}", event.name),
        body,
        attachment: Some(MailAttachment {
            filename: "ticket.png".into(),
            content_type: "image/png".into(),
            bytes: png,
        }),
    }
}

/// Email a QR ticket to every attendee that has not received one yet.
///
/// The loop is deliberately sequential so the relay sees a predictable
/// rate. A failed recipient is logged and skipped, never retried. Ticket
/// flags for the successful sends are persisted afterwards in bounded
/// commit groups.
pub async fn send_invitations(
    pool: &DbPool,
    mailer: &dyn Mailer,
    event: &EventRow,
    public_url: Option<&str>,
) -> Result<DispatchOutcome, CoreError> {
    let pending = lanyard_db::attendees::pending_tickets(pool, event.id).await?;
    let mut outcome = DispatchOutcome {
        total: pending.len() as i64,
        ..DispatchOutcome::default()
    };
    let mut delivered: Vec<i64> = Vec::new();

    for attendee in &pending {
        let png = match qr::ticket_png(attendee.id) {
            Ok(png) => png,
            Err(e) => {
                tracing::warn!(attendee = attendee.id, error = %e, "ticket render failed, skipping");
                outcome.failed += 1;
                continue;
            }
        };
        let email = invitation_email(event, &attendee.email, &attendee.name, png, public_url);
        match mailer.send(email).await {
            Ok(()) => {
                delivered.push(attendee.id);
                outcome.sent += 1;
            }
            Err(e) => {
                tracing::warn!(attendee = attendee.id, error = %e, "invitation send failed, skipping");
                outcome.failed += 1;
            }
        }
    }

    lanyard_db::attendees::mark_tickets_sent(pool, &delivered).await?;
    tracing::info!(
        event = event.id,
        sent = outcome.sent,
        failed = outcome.failed,
        total = outcome.total,
        "invitation dispatch finished"
    );
    Ok(outcome)
}

/// Read the event's stored diploma template from disk.
pub async fn load_template(storage_path: &str, event: &EventRow) -> Result<Vec<u8>, CoreError> {
    let relative = event
        .diploma_template_path
        .as_deref()
        .ok_or(CoreError::NotFound)?;
    let path = Path::new(storage_path).join(relative);
    match tokio::fs::read(&path).await {
        Ok(bytes) => Ok(bytes),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(CoreError::NotFound),
        Err(e) => Err(e.into()),
    }
}

/// Email a personalised diploma to every attendee who checked in and has
/// not received one. Unlike invitations, the sent flag is persisted one
/// attendee at a time, immediately after each successful delivery.
pub async fn send_diplomas(
    pool: &DbPool,
    mailer: &dyn Mailer,
    event: &EventRow,
    storage_path: &str,
) -> Result<DispatchOutcome, CoreError> {
    let template = load_template(storage_path, event).await?;
    let eligible = lanyard_db::attendees::pending_diplomas(pool, event.id).await?;
    let mut outcome = DispatchOutcome {
        total: eligible.len() as i64,
        ..DispatchOutcome::default()
    };

    for attendee in &eligible {
        let pdf = match diploma::render_diploma(&template, &attendee.name) {
            Ok(pdf) => pdf,
            Err(e) => {
                tracing::warn!(attendee = attendee.id, error = %e, "diploma render failed, skipping");
                outcome.failed += 1;
                continue;
            }
        };
        let email = OutboundEmail {
            to: attendee.email.clone(),
            subject: format!("Your diploma from {}", event.name),
            body: format!(
                "Hola {},\n\nThank you for attending {}. Your diploma is attached.\n",
                attendee.name, event.name
            ),
            attachment: Some(MailAttachment {
                filename: "diploma.pdf".into(),
                content_type: "application/pdf".into(),
                bytes: pdf,
            }),
        };
        match mailer.send(email).await {
            Ok(()) => {
                lanyard_db::attendees::mark_diploma_sent(pool, attendee.id).await?;
                outcome.sent += 1;
            }
            Err(e) => {
                tracing::warn!(attendee = attendee.id, error = %e, "diploma send failed, skipping");
                outcome.failed += 1;
            }
        }
    }

    tracing::info!(
        event = event.id,
        sent = outcome.sent,
        failed = outcome.failed,
        total = outcome.total,
        "diploma dispatch finished"
    );
    Ok(outcome)
}
