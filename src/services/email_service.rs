// ============================================================================
// EMAIL SERVICE - Invoice notification dispatch over SMTP
// ============================================================================

use anyhow::Result;
use async_trait::async_trait;
use lettre::{
    message::header::ContentType, transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use tracing::info;

use crate::config::SmtpConfig;

/// Fully composed message handed to the transport. The caller owns the
/// template; the notifier only delivers.
#[derive(Debug, Clone)]
pub struct OutgoingEmail {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub html_body: String,
}

/// Delivery collaborator. Injected into the invoice service so tests can
/// substitute a recording fake.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, email: OutgoingEmail) -> Result<()>;
}

pub struct SmtpNotifier {
    smtp_server: String,
    smtp_username: String,
    smtp_password: String,
}

impl SmtpNotifier {
    pub fn new(config: &SmtpConfig) -> Self {
        Self {
            smtp_server: config.server.clone(),
            smtp_username: config.username.clone(),
            smtp_password: config.password.clone(),
        }
    }
}

#[async_trait]
impl Notifier for SmtpNotifier {
    async fn send(&self, email: OutgoingEmail) -> Result<()> {
        let message = Message::builder()
            .from(email.from.parse()?)
            .to(email.to.parse()?)
            .subject(&email.subject)
            .header(ContentType::TEXT_HTML)
            .body(email.html_body)?;

        let creds = Credentials::new(self.smtp_username.clone(), self.smtp_password.clone());

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::relay(&self.smtp_server)?
            .credentials(creds)
            .build();

        mailer.send(message).await?;

        info!("✅ Email delivered to: {}", email.to);
        Ok(())
    }
}
