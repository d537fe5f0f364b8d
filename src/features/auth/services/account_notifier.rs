use std::sync::Arc;

use serde_json::json;

use crate::core::error::Result;
use crate::features::auth::principal::PrincipalKind;
use crate::features::auth::tokens::{TokenPurpose, TokenSigner};
use crate::modules::mail::{EmailTemplate, Mailer};

/// Sends account e-mails carrying signed links
pub struct AccountNotifier {
    mailer: Mailer,
    tokens: Arc<TokenSigner>,
    public_base_url: String,
    organization: String,
}

impl AccountNotifier {
    pub fn new(
        mailer: Mailer,
        tokens: Arc<TokenSigner>,
        public_base_url: &str,
        organization: &str,
    ) -> Self {
        Self {
            mailer,
            tokens,
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
            organization: organization.to_string(),
        }
    }

    pub fn send_confirmation(&self, kind: PrincipalKind, email: &str, name: &str) -> Result<()> {
        let token = self.tokens.generate(email, kind, TokenPurpose::Confirmation)?;
        self.send(
            email,
            "Confirm Your Account",
            EmailTemplate::Confirm,
            name,
            self.link(kind, "confirm", &token),
        );
        Ok(())
    }

    pub fn send_password_reset(&self, kind: PrincipalKind, email: &str, name: &str) -> Result<()> {
        let token = self.tokens.generate(email, kind, TokenPurpose::PasswordReset)?;
        self.send(
            email,
            "Reset Your Password",
            EmailTemplate::ResetPassword,
            name,
            self.link(kind, "password-reset", &token),
        );
        Ok(())
    }

    /// Confirmation mail for an address that just replaced the old one
    pub fn send_email_change(&self, kind: PrincipalKind, email: &str, name: &str) -> Result<()> {
        let token = self.tokens.generate(email, kind, TokenPurpose::Confirmation)?;
        self.send(
            email,
            "Confirm Your New Email Address",
            EmailTemplate::ChangeEmail,
            name,
            self.link(kind, "confirm", &token),
        );
        Ok(())
    }

    fn link(&self, kind: PrincipalKind, action: &str, token: &str) -> String {
        format!(
            "{}/api/auth/{}/{}/{}",
            self.public_base_url,
            kind.as_str(),
            action,
            token
        )
    }

    fn send(&self, email: &str, subject: &str, template: EmailTemplate, name: &str, link: String) {
        self.mailer.send_email(
            vec![email.to_string()],
            subject,
            template,
            json!({
                "name": name,
                "organization": self.organization,
                "link": link,
                "expires_in_minutes": self.tokens.expiration_secs() / 60,
            }),
        );
    }
}
