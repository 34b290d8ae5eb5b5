// SPDX-FileCopyrightText: 2026 Brieflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SMTP notifications over lettre's async transport.

use async_trait::async_trait;
use brieflow_config::model::EmailConfig;
use brieflow_core::{BrieflowError, EmailNotifier};
use lettre::message::{Mailbox, header::ContentType};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use secrecy::{ExposeSecret, SecretString};
use tracing::debug;

pub struct SmtpEmailNotifier {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpEmailNotifier {
    /// Returns `Ok(None)` when `email.smtp_host` is unset.
    pub fn from_config(
        config: &EmailConfig,
        password: Option<&SecretString>,
    ) -> Result<Option<Self>, BrieflowError> {
        let Some(host) = config.smtp_host.as_deref() else {
            return Ok(None);
        };
        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)
            .map_err(|e| BrieflowError::Config(format!("invalid smtp host `{host}`: {e}")))?
            .port(config.smtp_port);
        if let (Some(user), Some(password)) = (config.username.as_deref(), password) {
            builder = builder.credentials(Credentials::new(
                user.to_string(),
                password.expose_secret().to_string(),
            ));
        }
        Ok(Some(Self {
            transport: builder.build(),
            from: parse_mailbox(&config.from)?,
        }))
    }
}

fn parse_mailbox(address: &str) -> Result<Mailbox, BrieflowError> {
    address
        .parse()
        .map_err(|e| BrieflowError::Validation(format!("invalid email address `{address}`: {e}")))
}

pub(crate) fn build_message(
    from: &Mailbox,
    to: &str,
    subject: &str,
    body: &str,
) -> Result<Message, BrieflowError> {
    Message::builder()
        .from(from.clone())
        .to(parse_mailbox(to)?)
        .subject(subject)
        .header(ContentType::TEXT_PLAIN)
        .body(body.to_string())
        .map_err(|e| BrieflowError::Validation(format!("cannot build email: {e}")))
}

#[async_trait]
impl EmailNotifier for SmtpEmailNotifier {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), BrieflowError> {
        let message = build_message(&self.from, to, subject, body)?;
        self.transport
            .send(message)
            .await
            .map_err(|e| BrieflowError::Provider {
                message: format!("smtp delivery failed: {e}"),
                source: Some(Box::new(e)),
            })?;
        debug!(to, "notification email sent");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_host_disables_email() {
        let config = EmailConfig::default();
        assert!(SmtpEmailNotifier::from_config(&config, None).unwrap().is_none());
    }

    #[test]
    fn message_carries_subject_and_recipient() {
        let from = parse_mailbox("Brieflow <noreply@brieflow.local>").unwrap();
        let message = build_message(&from, "ops@example.com", "Brief ready", "see link").unwrap();
        let raw = String::from_utf8(message.formatted()).unwrap();
        assert!(raw.contains("Subject: Brief ready"));
        assert!(raw.contains("To: ops@example.com"));
        assert!(raw.contains("see link"));
    }

    #[test]
    fn bad_recipient_is_a_validation_error() {
        let from = parse_mailbox("noreply@brieflow.local").unwrap();
        let err = build_message(&from, "not-an-address", "s", "b").unwrap_err();
        assert!(matches!(err, BrieflowError::Validation(_)));
    }
}
