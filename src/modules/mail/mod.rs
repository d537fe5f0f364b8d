//! Outbound email.
//!
//! Request handlers call [`Mailer::send_email`], which only enqueues. A
//! [`MailWorker`] spawned at startup renders the templates and hands the
//! result to a [`MailTransport`] (SMTP, or a logging transport when no mail
//! server is configured).

mod mailer;
mod message;
mod renderer;
mod transport;

pub use mailer::{MailWorker, Mailer};
pub use message::EmailTemplate;
pub use renderer::TemplateRenderer;
pub use transport::{LogTransport, MailTransport, SmtpTransport};
