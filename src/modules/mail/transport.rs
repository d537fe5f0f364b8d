use async_trait::async_trait;
use lettre::{
    message::{Mailbox, MultiPart},
    transport::smtp::{authentication::Credentials, PoolConfig},
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use thiserror::Error;

use super::message::OutgoingMail;
use crate::core::config::MailConfig;

#[derive(Debug, Error)]
pub enum MailError {
    #[error("Invalid address '{0}'")]
    InvalidAddress(String),

    #[error("Failed to build email: {0}")]
    Build(String),

    #[error("Failed to deliver email: {0}")]
    Delivery(String),

    #[error("Template error: {0}")]
    Template(String),
}

/// Delivery backend for rendered mail
#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn deliver(&self, mail: &OutgoingMail) -> Result<(), MailError>;
}

/// SMTP delivery through lettre
pub struct SmtpTransport {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpTransport {
    pub fn new(config: &MailConfig, host: &str) -> Result<Self, MailError> {
        // Port 465 style implicit TLS when MAIL_USE_SSL is set, STARTTLS otherwise
        let builder = if config.use_ssl {
            AsyncSmtpTransport::<Tokio1Executor>::relay(host)
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)
        }
        .map_err(|e| MailError::Delivery(format!("Failed to configure SMTP relay: {}", e)))?
        .port(config.port)
        .pool_config(PoolConfig::default());

        let builder = match (&config.username, &config.password) {
            (Some(user), Some(pass)) => {
                builder.credentials(Credentials::new(user.clone(), pass.clone()))
            }
            _ => builder,
        };

        Ok(Self {
            mailer: builder.build(),
        })
    }
}

fn mailbox(address: &str) -> Result<Mailbox, MailError> {
    address
        .parse()
        .map_err(|_| MailError::InvalidAddress(address.to_string()))
}

#[async_trait]
impl MailTransport for SmtpTransport {
    async fn deliver(&self, mail: &OutgoingMail) -> Result<(), MailError> {
        let mut builder = Message::builder()
            .from(mailbox(&mail.from)?)
            .subject(mail.subject.clone());

        for recipient in &mail.to {
            builder = builder.to(mailbox(recipient)?);
        }

        let message = builder
            .multipart(MultiPart::alternative_plain_html(
                mail.text_body.clone(),
                mail.html_body.clone(),
            ))
            .map_err(|e| MailError::Build(e.to_string()))?;

        self.mailer
            .send(message)
            .await
            .map_err(|e| MailError::Delivery(e.to_string()))?;

        Ok(())
    }
}

/// Development transport: logs mail instead of sending it
pub struct LogTransport;

#[async_trait]
impl MailTransport for LogTransport {
    async fn deliver(&self, mail: &OutgoingMail) -> Result<(), MailError> {
        tracing::info!(
            to = ?mail.to,
            subject = %mail.subject,
            "Mail server not configured, logging email instead:\n{}",
            mail.text_body
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(use_ssl: bool) -> MailConfig {
        MailConfig {
            server: Some("smtp.example.com".to_string()),
            port: 587,
            username: Some("mailer".to_string()),
            password: Some("hunter2".to_string()),
            use_ssl,
            default_sender: "Ripoti Taka <noreply@example.com>".to_string(),
            subject_prefix: "[Ripoti Taka]".to_string(),
        }
    }

    #[tokio::test]
    async fn test_pooled_smtp_transport_builds_without_connecting() {
        assert!(SmtpTransport::new(&config(false), "smtp.example.com").is_ok());
        assert!(SmtpTransport::new(&config(true), "smtp.example.com").is_ok());
    }

    #[test]
    fn test_mailbox_parsing() {
        assert!(mailbox("Ripoti Taka <noreply@example.com>").is_ok());
        assert!(matches!(
            mailbox("not an address"),
            Err(MailError::InvalidAddress(_))
        ));
    }
}
