use std::sync::Arc;

use serde_json::Value;
use tokio::sync::mpsc;

use super::message::{EmailMessage, EmailTemplate, OutgoingMail};
use super::renderer::TemplateRenderer;
use super::transport::{MailError, MailTransport};

/// Submits emails to the background worker.
///
/// `send_email` returns as soon as the message is queued; delivery happens on
/// the [`MailWorker`] task and its outcome is only logged.
#[derive(Clone)]
pub struct Mailer {
    sender: mpsc::UnboundedSender<EmailMessage>,
}

impl Mailer {
    /// Create the queue; the returned worker must be spawned to drain it
    pub fn new(
        renderer: TemplateRenderer,
        transport: Arc<dyn MailTransport>,
        from: String,
        subject_prefix: String,
    ) -> (Self, MailWorker) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let worker = MailWorker {
            receiver,
            renderer,
            transport,
            from,
            subject_prefix,
        };
        (Self { sender }, worker)
    }

    pub fn send_email(
        &self,
        recipients: Vec<String>,
        subject: &str,
        template: EmailTemplate,
        context: Value,
    ) {
        let message = EmailMessage {
            recipients,
            subject: subject.to_string(),
            template,
            context,
        };

        if let Err(e) = self.sender.send(message) {
            tracing::error!(
                "Mail queue closed, dropping '{}' email: {:?}",
                e.0.template.name(),
                e.0.recipients
            );
        }
    }
}

/// Drains the mail queue, rendering and delivering one message at a time
pub struct MailWorker {
    receiver: mpsc::UnboundedReceiver<EmailMessage>,
    renderer: TemplateRenderer,
    transport: Arc<dyn MailTransport>,
    from: String,
    subject_prefix: String,
}

impl MailWorker {
    /// Run until every `Mailer` handle has been dropped
    pub async fn run(mut self) {
        tracing::info!("Starting mail worker");

        while let Some(message) = self.receiver.recv().await {
            let template = message.template.name();
            match self.process(message).await {
                Ok(()) => tracing::info!("Delivered '{}' email", template),
                Err(e) => tracing::error!("Failed to deliver '{}' email: {}", template, e),
            }
        }

        tracing::info!("Mail worker stopped");
    }

    async fn process(&self, message: EmailMessage) -> Result<(), MailError> {
        let mail = self.render(message)?;
        self.transport.deliver(&mail).await
    }

    fn render(&self, message: EmailMessage) -> Result<OutgoingMail, MailError> {
        let (text_body, html_body) = self
            .renderer
            .render(message.template, &message.context)
            .map_err(|e| MailError::Template(e.to_string()))?;

        Ok(OutgoingMail {
            from: self.from.clone(),
            to: message.recipients,
            subject: format!("{} {}", self.subject_prefix, message.subject)
                .trim()
                .to_string(),
            text_body,
            html_body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use tokio::sync::Mutex;

    #[derive(Default)]
    struct RecordingTransport {
        sent: Mutex<Vec<OutgoingMail>>,
    }

    #[async_trait]
    impl MailTransport for RecordingTransport {
        async fn deliver(&self, mail: &OutgoingMail) -> Result<(), MailError> {
            self.sent.lock().await.push(mail.clone());
            Ok(())
        }
    }

    struct FailingTransport;

    #[async_trait]
    impl MailTransport for FailingTransport {
        async fn deliver(&self, _mail: &OutgoingMail) -> Result<(), MailError> {
            Err(MailError::Delivery("connection refused".to_string()))
        }
    }

    fn context() -> Value {
        json!({
            "name": "alice",
            "organization": "Ripoti Taka",
            "link": "http://localhost/confirm/abc",
            "expires_in_minutes": 60,
        })
    }

    #[tokio::test]
    async fn test_send_email_is_delivered_by_worker() {
        let transport = Arc::new(RecordingTransport::default());
        let (mailer, worker) = Mailer::new(
            TemplateRenderer::new().unwrap(),
            transport.clone(),
            "Ripoti Taka <no-reply@example.com>".to_string(),
            "[Ripoti Taka]".to_string(),
        );

        mailer.send_email(
            vec!["alice@example.com".to_string()],
            "Confirm Your Account",
            EmailTemplate::Confirm,
            context(),
        );
        drop(mailer);
        worker.run().await;

        let sent = transport.sent.lock().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, vec!["alice@example.com".to_string()]);
        assert_eq!(sent[0].subject, "[Ripoti Taka] Confirm Your Account");
        assert!(sent[0].text_body.contains("http://localhost/confirm/abc"));
    }

    #[tokio::test]
    async fn test_delivery_failure_does_not_stop_worker() {
        let (mailer, worker) = Mailer::new(
            TemplateRenderer::new().unwrap(),
            Arc::new(FailingTransport),
            "no-reply@example.com".to_string(),
            String::new(),
        );

        mailer.send_email(vec!["a@x.com".to_string()], "One", EmailTemplate::Confirm, context());
        mailer.send_email(
            vec!["b@x.com".to_string()],
            "Two",
            EmailTemplate::ResetPassword,
            context(),
        );
        drop(mailer);

        // Returns once the queue is drained despite both deliveries failing
        worker.run().await;
    }
}
