use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use tracing::warn;

use super::{MailError, Mailer};

/// Development mailer installed when no SMTP host is configured. Messages are
/// written to the log instead of being delivered.
#[derive(Debug, Default, Clone)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, to: &str, subject: &str, html: &str) -> Result<(), MailError> {
        let link = extract_link(html).unwrap_or("<none>");
        warn!(to, subject, link, "SMTP not configured; email logged instead of sent");
        Ok(())
    }
}

lazy_static! {
    static ref HREF_RE: Regex = Regex::new(r#"href="([^"]+)""#).unwrap();
}

/// First `href` target in the rendered body.
fn extract_link(html: &str) -> Option<&str> {
    HREF_RE
        .captures(html)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}
