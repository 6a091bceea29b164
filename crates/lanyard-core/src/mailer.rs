use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::{Attachment, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MailError {
    #[error("invalid message: {0}")]
    InvalidMessage(String),
    #[error("delivery failed: {0}")]
    Delivery(String),
}

/// One attachment: a QR ticket PNG or a diploma PDF.
#[derive(Debug, Clone)]
pub struct MailAttachment {
    pub filename: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct OutboundEmail {
    pub to: String,
    pub subject: String,
    pub body: String,
    pub attachment: Option<MailAttachment>,
}

/// Outbound delivery seam. The dispatch loops only see this trait, so
/// tests swap in a recording double and the dev config swaps in a logger.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: OutboundEmail) -> Result<(), MailError>;
}

/// Production mailer over an async SMTP relay.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: String,
}

impl SmtpMailer {
    pub fn new(
        server: &str,
        port: u16,
        username: &str,
        password: &str,
        from: &str,
    ) -> Result<SmtpMailer, MailError> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(server)
            .map_err(|e| MailError::Delivery(e.to_string()))?
            .port(port)
            .credentials(Credentials::new(username.to_string(), password.to_string()))
            .build();
        Ok(SmtpMailer {
            transport,
            from: from.to_string(),
        })
    }

    fn build_message(&self, email: &OutboundEmail) -> Result<Message, MailError> {
        let builder = Message::builder()
            .from(
                self.from
                    .parse()
                    .map_err(|_| MailError::InvalidMessage("bad from address".into()))?,
            )
            .to(email
                .to
                .parse()
                .map_err(|_| MailError::InvalidMessage("bad recipient address".into()))?)
            .subject(&email.subject);

        let message = match &email.attachment {
            Some(attachment) => {
                let content_type = ContentType::parse(&attachment.content_type)
                    .map_err(|_| MailError::InvalidMessage("bad attachment type".into()))?;
                builder
                    .multipart(
                        MultiPart::mixed()
                            .singlepart(SinglePart::plain(email.body.clone()))
                            .singlepart(
                                Attachment::new(attachment.filename.clone())
                                    .body(attachment.bytes.clone(), content_type),
                            ),
                    )
                    .map_err(|e| MailError::InvalidMessage(e.to_string()))?
            }
            None => builder
                .singlepart(SinglePart::plain(email.body.clone()))
                .map_err(|e| MailError::InvalidMessage(e.to_string()))?,
        };
        Ok(message)
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, email: OutboundEmail) -> Result<(), MailError> {
        let message = self.build_message(&email)?;
        self.transport
            .send(message)
            .await
            .map_err(|e| MailError::Delivery(e.to_string()))?;
        Ok(())
    }
}

/// Dev-mode mailer: logs instead of delivering. Default when no SMTP
/// relay is configured.
pub struct ConsoleMailer;

#[async_trait]
impl Mailer for ConsoleMailer {
    async fn send(&self, email: OutboundEmail) -> Result<(), MailError> {
        tracing::info!(
            to = %email.to,
            subject = %email.subject,
            attachment = email.attachment.as_ref().map(|a| a.filename.as_str()),
            "mail (console transport, not delivered)"
        );
        Ok(())
    }
}

/// Test double: records every message and can be primed to fail for
/// specific recipients.
#[derive(Default)]
pub struct RecordingMailer {
    sent: std::sync::Mutex<Vec<OutboundEmail>>,
    fail_for: std::sync::Mutex<std::collections::HashSet<String>>,
}

impl RecordingMailer {
    pub fn new() -> RecordingMailer {
        RecordingMailer::default()
    }

    /// Every send to this recipient will fail with a delivery error.
    pub fn fail_for(&self, recipient: &str) {
        self.fail_for
            .lock()
            .expect("mailer lock")
            .insert(recipient.to_string());
    }

    pub fn sent(&self) -> Vec<OutboundEmail> {
        self.sent.lock().expect("mailer lock").clone()
    }

    pub fn sent_to(&self) -> Vec<String> {
        self.sent()
            .into_iter()
            .map(|email| email.to)
            .collect()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, email: OutboundEmail) -> Result<(), MailError> {
        if self
            .fail_for
            .lock()
            .expect("mailer lock")
            .contains(&email.to)
        {
            return Err(MailError::Delivery(format!("simulated failure for {}", email.to)));
        }
        self.sent.lock().expect("mailer lock").push(email);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn recording_mailer_records_and_fails_on_demand() {
        let mailer = RecordingMailer::new();
        mailer.fail_for("bad@example.com");

        let ok = mailer
            .send(OutboundEmail {
                to: "good@example.com".into(),
                subject: "hi".into(),
                body: "body".into(),
                attachment: None,
            })
            .await;
        assert!(ok.is_ok());

        let err = mailer
            .send(OutboundEmail {
                to: "bad@example.com".into(),
                subject: "hi".into(),
                body: "body".into(),
                attachment: None,
            })
            .await;
        assert!(matches!(err, Err(MailError::Delivery(_))));
        assert_eq!(mailer.sent_to(), vec!["good@example.com".to_string()]);
    }

    #[test]
    fn smtp_message_builds_with_attachment() {
        let mailer = SmtpMailer::new("localhost", 2525, "u", "p", "events@example.com").unwrap();
        let message = mailer.build_message(&OutboundEmail {
            to: "ana@example.com".into(),
            subject: "Your ticket".into(),
            body: "See you there".into(),
            attachment: Some(MailAttachment {
                filename: "ticket.png".into(),
                content_type: "image/png".into(),
                bytes: vec![0x89, b'P', b'N', b'G'],
            }),
        });
        assert!(message.is_ok());
    }

    #[test]
    fn bad_recipient_is_an_invalid_message() {
        let mailer = SmtpMailer::new("localhost", 2525, "u", "p", "events@example.com").unwrap();
        let result = mailer.build_message(&OutboundEmail {
            to: "not-an-address".into(),
            subject: "x".into(),
            body: "x".into(),
            attachment: None,
        });
        assert!(matches!(result, Err(MailError::InvalidMessage(_))));
    }
}
