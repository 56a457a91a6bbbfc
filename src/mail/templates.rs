/// What a message is for. The two token kinds stay distinct even though they
/// share one template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    VerifyAccount,
    ConfirmEmailChange,
    PasswordReset,
}

#[derive(Debug, Clone)]
pub struct Notification<'a> {
    pub kind: NotificationKind,
    pub username: &'a str,
    pub client_url: &'a str,
    pub token: &'a str,
    /// Only set for [`NotificationKind::ConfirmEmailChange`].
    pub new_email: Option<&'a str>,
}

#[derive(Debug, Clone)]
pub struct RenderedMail {
    pub subject: String,
    pub html: String,
}

impl<'a> Notification<'a> {
    pub fn verify_account(username: &'a str, client_url: &'a str, token: &'a str) -> Self {
        Self {
            kind: NotificationKind::VerifyAccount,
            username,
            client_url,
            token,
            new_email: None,
        }
    }

    pub fn confirm_email_change(
        username: &'a str,
        client_url: &'a str,
        token: &'a str,
        new_email: &'a str,
    ) -> Self {
        Self {
            kind: NotificationKind::ConfirmEmailChange,
            username,
            client_url,
            token,
            new_email: Some(new_email),
        }
    }

    pub fn password_reset(username: &'a str, client_url: &'a str, token: &'a str) -> Self {
        Self {
            kind: NotificationKind::PasswordReset,
            username,
            client_url,
            token,
            new_email: None,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self.kind {
            NotificationKind::VerifyAccount => "verify_account",
            NotificationKind::ConfirmEmailChange => "confirm_email_change",
            NotificationKind::PasswordReset => "password_reset",
        }
    }

    pub fn link(&self) -> String {
        let base = self.client_url.trim_end_matches('/');
        match self.kind {
            NotificationKind::PasswordReset => format!("{base}/reset-password/{}", self.token),
            _ => format!("{base}/verify-email/{}", self.token),
        }
    }

    pub fn render(&self) -> RenderedMail {
        let link = self.link();
        let (subject, heading, main_text, button, lifetime) = match self.kind {
            NotificationKind::VerifyAccount => (
                "Verify Your CineConnect Email",
                "Email Verification",
                "Thanks for creating an account with CineConnect. To complete your \
                 registration, please verify your email address by clicking the button below:"
                    .to_string(),
                "Verify Email Address",
                "24 hours",
            ),
            NotificationKind::ConfirmEmailChange => (
                "Verify Your New CineConnect Email",
                "Email Change Verification",
                format!(
                    "You've requested to change your email address to {}. Please verify this \
                     new email address by clicking the button below:",
                    escape_html(self.new_email.unwrap_or_default())
                ),
                "Verify New Email",
                "24 hours",
            ),
            NotificationKind::PasswordReset => (
                "Reset Your CineConnect Password",
                "Password Reset Request",
                "We received a request to reset your password. Please click the button below \
                 to set a new password. If you didn't request this, you can safely ignore this \
                 email."
                    .to_string(),
                "Reset Password",
                "1 hour",
            ),
        };

        let html = format!(
            r#"<div style="font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto; padding: 20px;">
  <h1 style="color: #e50914; text-align: center;">CineConnect</h1>
  <h2>{heading}</h2>
  <p>Hi {username},</p>
  <p>{main_text}</p>
  <p style="text-align: center; margin: 30px 0;">
    <a href="{link}" style="background-color: #e50914; color: white; padding: 12px 30px; text-decoration: none;">{button}</a>
  </p>
  <p>Or copy and paste this link into your browser:</p>
  <p style="word-break: break-all;">{link}</p>
  <p>This link will expire in {lifetime}.</p>
  <p>If you did not request this, please ignore this email.</p>
</div>"#,
            username = escape_html(self.username),
        );

        RenderedMail {
            subject: subject.to_string(),
            html,
        }
    }
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
