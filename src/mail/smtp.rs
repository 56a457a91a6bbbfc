use std::time::Duration;

use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::{authentication::Credentials, PoolConfig},
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use tracing::{error, info};

use super::{MailError, Mailer};
use crate::config::{MailConfig, SmtpConfig};

/// SMTP mailer over a pooled TLS relay connection. Built once at start-up and
/// shared through `AppState`.
#[derive(Clone)]
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new(smtp: &SmtpConfig, mail: &MailConfig) -> Result<Self, MailError> {
        let from: Mailbox = mail
            .from
            .parse()
            .map_err(|e: lettre::address::AddressError| MailError::Address(e.to_string()))?;

        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&smtp.host)
            .map_err(|e| MailError::Transport(e.to_string()))?
            .credentials(Credentials::new(
                smtp.username.clone(),
                smtp.password.clone(),
            ))
            .port(smtp.port)
            .pool_config(PoolConfig::new().max_size(5))
            .timeout(Some(Duration::from_secs(mail.timeout_secs)))
            .build();

        info!(host = %smtp.host, port = smtp.port, "smtp mailer configured");
        Ok(Self { transport, from })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, to: &str, subject: &str, html: &str) -> Result<(), MailError> {
        let to: Mailbox = to
            .parse()
            .map_err(|e: lettre::address::AddressError| MailError::Address(e.to_string()))?;

        let message = Message::builder()
            .from(self.from.clone())
            .to(to.clone())
            .subject(subject)
            .header(ContentType::TEXT_HTML)
            .body(html.to_string())
            .map_err(|e| MailError::Message(e.to_string()))?;

        self.transport.send(message).await.map_err(|e| {
            error!(error = %e, to = %to, "smtp send failed");
            MailError::Transport(e.to_string())
        })?;
        info!(to = %to, subject, "email sent");
        Ok(())
    }
}
