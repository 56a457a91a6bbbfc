//! Outbound email.
//!
//! Services get a [`Mailer`] from `AppState` and deliver one of the
//! [`Notification`] kinds through [`deliver`], which applies the configured
//! timeout. A [`MailError`] is always a delivery problem and is kept apart
//! from storage errors so each flow can pick its own rollback policy.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, warn};

mod logging;
mod smtp;
pub mod templates;

pub use logging::LogMailer;
pub use smtp::SmtpMailer;
pub use templates::Notification;

#[derive(Debug, Error)]
pub enum MailError {
    #[error("invalid address: {0}")]
    Address(String),

    #[error("could not build message: {0}")]
    Message(String),

    #[error("transport failure: {0}")]
    Transport(String),

    #[error("mail delivery timed out after {0:?}")]
    Timeout(Duration),
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, to: &str, subject: &str, html: &str) -> Result<(), MailError>;
}

/// Renders `notification` and sends it to `to`, giving up after `timeout`.
pub async fn deliver(
    mailer: &dyn Mailer,
    timeout: Duration,
    to: &str,
    notification: &Notification<'_>,
) -> Result<(), MailError> {
    let rendered = notification.render();
    debug!(to, kind = notification.kind_name(), "sending notification");
    match tokio::time::timeout(timeout, mailer.send(to, &rendered.subject, &rendered.html)).await
    {
        Ok(result) => result,
        Err(_) => {
            warn!(to, kind = notification.kind_name(), "mail delivery timed out");
            Err(MailError::Timeout(timeout))
        }
    }
}
