// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Outgoing email.
//!
//! With `SMTP_HOST` configured, mail goes out through a STARTTLS relay.
//! Otherwise it is written to the log, or kept in memory for tests.

use crate::config::SmtpConfig;
use crate::error::AppError;
use crate::models::Language;
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use std::sync::{Mutex, PoisonError};

#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("SMTP transport error: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),

    #[error("Email address parse error: {0}")]
    Address(#[from] lettre::address::AddressError),

    #[error("Email build error: {0}")]
    Build(#[from] lettre::error::Error),
}

impl From<MailError> for AppError {
    fn from(err: MailError) -> Self {
        AppError::Internal(anyhow::Error::new(err))
    }
}

/// A plain-text message ready to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingEmail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

pub enum Mailer {
    Smtp {
        transport: AsyncSmtpTransport<Tokio1Executor>,
        from: Mailbox,
    },
    /// Keeps every message; read back with [`Mailer::outbox`].
    Memory(Mutex<Vec<OutgoingEmail>>),
    /// Drops messages after logging them.
    Log,
}

impl Mailer {
    /// SMTP when configured, logging otherwise.
    pub fn from_config(config: Option<&SmtpConfig>) -> Result<Self, MailError> {
        let Some(config) = config else {
            return Ok(Mailer::Log);
        };
        let from: Mailbox = config.from.parse()?;

        let mut builder =
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)?.port(config.port);
        if let (Some(user), Some(pass)) = (&config.username, &config.password) {
            builder = builder.credentials(Credentials::new(user.clone(), pass.clone()));
        }

        tracing::info!(host = %config.host, port = config.port, "SMTP mail delivery enabled");
        Ok(Mailer::Smtp {
            transport: builder.build(),
            from,
        })
    }

    pub fn memory() -> Self {
        Mailer::Memory(Mutex::new(Vec::new()))
    }

    pub async fn send(&self, email: OutgoingEmail) -> Result<(), MailError> {
        match self {
            Mailer::Smtp { transport, from } => {
                let message = Message::builder()
                    .from(from.clone())
                    .to(email.to.parse()?)
                    .subject(email.subject.as_str())
                    .header(ContentType::TEXT_PLAIN)
                    .body(email.body)?;
                transport.send(message).await?;
                tracing::info!(to = %email.to, subject = %email.subject, "Email sent");
            }
            Mailer::Memory(outbox) => {
                outbox
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .push(email);
            }
            Mailer::Log => {
                tracing::debug!(
                    to = %email.to,
                    subject = %email.subject,
                    body = %email.body,
                    "Mail delivery not configured; email logged only"
                );
            }
        }
        Ok(())
    }

    /// Messages kept by the in-memory mailer, oldest first.
    pub fn outbox(&self) -> Vec<OutgoingEmail> {
        match self {
            Mailer::Memory(outbox) => outbox
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clone(),
            _ => Vec::new(),
        }
    }
}

/// Password reset message pointing at the frontend reset page.
pub fn password_reset_email(
    to: &str,
    first_name: &str,
    frontend_url: &str,
    token: &str,
    ttl_minutes: i64,
    lang: Language,
) -> OutgoingEmail {
    let link = format!(
        "{}/reset-password?token={}",
        frontend_url.trim_end_matches('/'),
        token
    );
    let (subject, body) = match lang {
        Language::Vi => (
            "VanLang Budget - Đặt lại mật khẩu".to_string(),
            format!(
                "Xin chào {first_name},\n\n\
                 Bạn vừa yêu cầu đặt lại mật khẩu. Mở liên kết sau để đặt mật khẩu mới:\n\
                 {link}\n\n\
                 Liên kết có hiệu lực trong {ttl_minutes} phút. \
                 Nếu bạn không yêu cầu, hãy bỏ qua email này."
            ),
        ),
        Language::En => (
            "VanLang Budget - Password reset".to_string(),
            format!(
                "Hello {first_name},\n\n\
                 You asked to reset your password. Open this link to choose a new one:\n\
                 {link}\n\n\
                 The link is valid for {ttl_minutes} minutes. \
                 If you did not ask for this, ignore this email."
            ),
        ),
    };
    OutgoingEmail {
        to: to.to_string(),
        subject,
        body,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unconfigured_mailer_logs() {
        assert!(matches!(Mailer::from_config(None), Ok(Mailer::Log)));
    }

    #[test]
    fn test_bad_from_address_rejected() {
        let config = SmtpConfig {
            host: "smtp.example.com".to_string(),
            port: 587,
            username: None,
            password: None,
            from: "not-an-address".to_string(),
        };
        assert!(matches!(
            Mailer::from_config(Some(&config)),
            Err(MailError::Address(_))
        ));
    }

    #[tokio::test]
    async fn test_memory_outbox_keeps_messages() {
        let mailer = Mailer::memory();
        let email = password_reset_email(
            "an@example.com",
            "An",
            "https://budget.example.com/",
            "abc123",
            10,
            Language::En,
        );
        assert!(email.body.contains("https://budget.example.com/reset-password?token=abc123"));

        mailer.send(email.clone()).await.unwrap();
        assert_eq!(mailer.outbox(), vec![email]);
        assert!(Mailer::Log.outbox().is_empty());
    }

    #[test]
    fn test_reset_email_follows_language() {
        let vi = password_reset_email("a@b.vn", "An", "http://x", "t", 10, Language::Vi);
        assert!(vi.subject.contains("Đặt lại mật khẩu"));
        assert!(vi.body.contains("10 phút"));
    }
}
