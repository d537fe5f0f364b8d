use serde_json::Value;

/// Email bodies available to the mail worker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmailTemplate {
    Confirm,
    ResetPassword,
    ChangeEmail,
}

impl EmailTemplate {
    pub const ALL: [EmailTemplate; 3] = [
        EmailTemplate::Confirm,
        EmailTemplate::ResetPassword,
        EmailTemplate::ChangeEmail,
    ];

    pub fn name(self) -> &'static str {
        match self {
            EmailTemplate::Confirm => "confirm",
            EmailTemplate::ResetPassword => "reset_password",
            EmailTemplate::ChangeEmail => "change_email",
        }
    }

    pub(super) fn sources(self) -> (&'static str, &'static str) {
        match self {
            EmailTemplate::Confirm => (
                include_str!("../../../templates/email/confirm.txt.jinja"),
                include_str!("../../../templates/email/confirm.html.jinja"),
            ),
            EmailTemplate::ResetPassword => (
                include_str!("../../../templates/email/reset_password.txt.jinja"),
                include_str!("../../../templates/email/reset_password.html.jinja"),
            ),
            EmailTemplate::ChangeEmail => (
                include_str!("../../../templates/email/change_email.txt.jinja"),
                include_str!("../../../templates/email/change_email.html.jinja"),
            ),
        }
    }
}

/// A queued email: recipients, subject, template and its variables
#[derive(Debug, Clone)]
pub struct EmailMessage {
    pub recipients: Vec<String>,
    pub subject: String,
    pub template: EmailTemplate,
    pub context: Value,
}

/// A rendered email ready for a transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMail {
    pub from: String,
    pub to: Vec<String>,
    pub subject: String,
    pub text_body: String,
    pub html_body: String,
}
