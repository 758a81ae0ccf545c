//! Delivery of queued messages over SMTP.

use crate::error::{NotifyError, Result};
use crate::output::{read_outbox, OutboxMessage};
use crate::providers::Mailer;
use async_trait::async_trait;
use colored::Colorize;
use lettre::message::{header::ContentType, Mailbox};
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::path::Path;

/// Plain SMTP relay, e.g. the local MTA.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpMailer {
    /// Relay through `server`, given as "host" or "host:port" (default port 25).
    pub fn new(server: &str) -> Result<SmtpMailer> {
        let (host, port) = match server.rsplit_once(':') {
            Some((host, port)) => {
                let port = port
                    .parse::<u16>()
                    .map_err(|_| NotifyError::parse(server, "bad SMTP port"))?;
                (host, Some(port))
            }
            None => (server, None),
        };
        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(host);
        if let Some(port) = port {
            builder = builder.port(port);
        }
        log::debug!("SMTP relay {host} port {port:?}");
        Ok(SmtpMailer {
            transport: builder.build(),
        })
    }
}

fn mailbox(address: &str) -> Result<Mailbox> {
    address
        .parse::<Mailbox>()
        .map_err(|e| NotifyError::Mail(format!("bad address '{address}': {e}")))
}

/// Build the MIME message for `message`.
pub fn to_email(message: &OutboxMessage) -> Result<Message> {
    let mut builder = Message::builder()
        .from(mailbox(&message.from)?)
        .subject(message.subject.clone())
        .header(ContentType::TEXT_PLAIN);
    for to in &message.to {
        builder = builder.to(mailbox(to)?);
    }
    builder
        .body(message.body.clone())
        .map_err(|e| NotifyError::Mail(format!("cannot build message '{}': {e}", message.subject)))
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, message: &OutboxMessage) -> Result<()> {
        let email = to_email(message)?;
        self.transport
            .send(email)
            .await
            .map_err(|e| NotifyError::Mail(format!("SMTP send to {:?} failed: {e}", message.to)))?;
        Ok(())
    }
}

/// Counts reported after a SEND.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SendReport {
    pub sent: usize,
    pub skipped: usize,
}

/// Send every message queued in `outbox`.
///
/// With `test_recipients`, only the first message is sent, addressed to
/// the test recipients instead of its own.
pub async fn send_all<M>(mailer: &M, outbox: &Path, test_recipients: &[String]) -> Result<SendReport>
where
    M: Mailer + ?Sized,
{
    let messages = read_outbox(outbox)?;
    log::info!(
        "Found {} message(s) in outbox {}",
        messages.len(),
        outbox.display()
    );
    let mut report = SendReport::default();

    if !test_recipients.is_empty() {
        if let Some((path, message)) = messages.into_iter().next() {
            let test = OutboxMessage {
                to: test_recipients.to_vec(),
                ..message
            };
            log::warn!(
                "{} sending {} to [{}] only",
                "TEST".on_red(),
                path.display(),
                test.to.join(", ")
            );
            mailer.send(&test).await?;
            report.sent = 1;
        }
        return Ok(report);
    }

    for (path, message) in messages {
        if message.to.is_empty() {
            log::warn!("No recipient in {}, skipping", path.display());
            report.skipped += 1;
            continue;
        }
        log::info!(
            "Sending {} to {} recipient(s)",
            path.display(),
            message.to.len()
        );
        mailer.send(&message).await?;
        report.sent += 1;
    }
    log::info!("Sent {} message(s), skipped {}", report.sent, report.skipped);
    Ok(report)
}
