//! SMTP mail transport built on lettre.

use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use filedock_core::config::mailer::MailerConfig;
use filedock_core::error::{AppError, ErrorKind};
use filedock_core::result::AppResult;

/// Sends HTML mail through a configured SMTP relay.
pub struct SmtpMailer {
    /// The underlying async SMTP transport.
    transport: AsyncSmtpTransport<Tokio1Executor>,
    /// Sender mailbox used for every outgoing message.
    from: Mailbox,
}

impl std::fmt::Debug for SmtpMailer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpMailer").field("from", &self.from).finish()
    }
}

impl SmtpMailer {
    /// Create a new mailer from configuration.
    pub fn new(config: &MailerConfig) -> AppResult<Self> {
        let from: Mailbox = format!("{} <{}>", config.from_name, config.from_email)
            .parse()
            .map_err(|e| {
                AppError::with_source(
                    ErrorKind::Configuration,
                    format!("Invalid sender address: {}", config.from_email),
                    e,
                )
            })?;

        let credentials = Credentials::new(config.username.clone(), config.password.clone());

        let transport = AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.smtp_host)
            .port(config.smtp_port)
            .credentials(credentials)
            .build();

        Ok(Self { transport, from })
    }

    /// Send an HTML message to a single recipient.
    pub async fn send(&self, to: &str, subject: &str, html_body: &str) -> AppResult<()> {
        let recipient: Mailbox = to.parse().map_err(|e| {
            AppError::with_source(
                ErrorKind::Validation,
                format!("Invalid recipient address: {to}"),
                e,
            )
        })?;

        let message = Message::builder()
            .from(self.from.clone())
            .to(recipient)
            .subject(subject)
            .header(ContentType::TEXT_HTML)
            .body(html_body.to_string())
            .map_err(|e| {
                AppError::with_source(ErrorKind::Internal, "Failed to build mail message", e)
            })?;

        self.transport.send(message).await.map_err(|e| {
            AppError::with_source(ErrorKind::ExternalService, "SMTP delivery failed", e)
        })?;

        tracing::info!(to, subject, "Sent email");
        Ok(())
    }
}
