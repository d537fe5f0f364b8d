//! Signed, time-limited tokens for email confirmation and password reset.

use chrono::Utc;
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};

use crate::core::error::{AppError, Result};
use crate::features::auth::principal::PrincipalKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenPurpose {
    Confirmation,
    PasswordReset,
}

#[derive(Debug, Serialize, Deserialize)]
struct TokenClaims {
    /// Email address of the principal
    sub: String,
    kind: PrincipalKind,
    purpose: TokenPurpose,
    iat: i64,
    exp: i64,
}

/// Outcome of checking a token. Never an error: every failure is a variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenVerification {
    /// Carries the embedded email address
    Valid(String),
    Expired,
    Malformed,
}

pub struct TokenSigner {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    expiration_secs: i64,
}

impl TokenSigner {
    pub fn new(secret: &str, expiration_secs: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            expiration_secs,
        }
    }

    pub fn expiration_secs(&self) -> i64 {
        self.expiration_secs
    }

    pub fn generate(&self, email: &str, kind: PrincipalKind, purpose: TokenPurpose) -> Result<String> {
        self.generate_at(email, kind, purpose, Utc::now().timestamp())
    }

    /// Sign a token as if issued at `issued_at` (unix seconds)
    pub fn generate_at(
        &self,
        email: &str,
        kind: PrincipalKind,
        purpose: TokenPurpose,
        issued_at: i64,
    ) -> Result<String> {
        let claims = TokenClaims {
            sub: email.to_lowercase(),
            kind,
            purpose,
            iat: issued_at,
            exp: issued_at + self.expiration_secs,
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AppError::Internal(format!("Failed to sign token: {}", e)))
    }

    /// Check signature, expiry, purpose and principal kind
    pub fn verify(&self, token: &str, kind: PrincipalKind, purpose: TokenPurpose) -> TokenVerification {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        let claims = match decode::<TokenClaims>(token, &self.decoding_key, &validation) {
            Ok(data) => data.claims,
            Err(e) if matches!(e.kind(), ErrorKind::ExpiredSignature) => {
                tracing::debug!("Rejected expired {:?} token", purpose);
                return TokenVerification::Expired;
            }
            Err(e) => {
                tracing::debug!("Rejected malformed {:?} token: {}", purpose, e);
                return TokenVerification::Malformed;
            }
        };

        if claims.purpose != purpose || claims.kind != kind {
            tracing::debug!(
                "Token purpose/kind mismatch: got {:?}/{}, wanted {:?}/{}",
                claims.purpose,
                claims.kind,
                purpose,
                kind
            );
            return TokenVerification::Malformed;
        }

        TokenVerification::Valid(claims.sub)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fake::faker::internet::en::SafeEmail;
    use fake::Fake;

    const SECRET: &str = "test-secret-key-with-at-least-32-bytes!";

    fn signer() -> TokenSigner {
        TokenSigner::new(SECRET, 3600)
    }

    #[test]
    fn test_valid_token_returns_email() {
        let email: String = SafeEmail().fake();
        let token = signer()
            .generate(&email, PrincipalKind::User, TokenPurpose::Confirmation)
            .unwrap();

        assert_eq!(
            signer().verify(&token, PrincipalKind::User, TokenPurpose::Confirmation),
            TokenVerification::Valid(email.to_lowercase())
        );
    }

    #[test]
    fn test_expired_token() {
        let issued = Utc::now().timestamp() - 7200;
        let token = signer()
            .generate_at("a@x.com", PrincipalKind::User, TokenPurpose::PasswordReset, issued)
            .unwrap();

        assert_eq!(
            signer().verify(&token, PrincipalKind::User, TokenPurpose::PasswordReset),
            TokenVerification::Expired
        );
    }

    #[test]
    fn test_tampered_token_is_malformed() {
        let token = signer()
            .generate("a@x.com", PrincipalKind::User, TokenPurpose::Confirmation)
            .unwrap();
        let mut tampered = token.clone();
        tampered.push('x');

        assert_eq!(
            signer().verify(&tampered, PrincipalKind::User, TokenPurpose::Confirmation),
            TokenVerification::Malformed
        );
        assert_eq!(
            signer().verify("garbage", PrincipalKind::User, TokenPurpose::Confirmation),
            TokenVerification::Malformed
        );
    }

    #[test]
    fn test_wrong_secret_is_malformed() {
        let token = TokenSigner::new("another-secret-key-with-32-bytes-or-more", 3600)
            .generate("a@x.com", PrincipalKind::User, TokenPurpose::Confirmation)
            .unwrap();

        assert_eq!(
            signer().verify(&token, PrincipalKind::User, TokenPurpose::Confirmation),
            TokenVerification::Malformed
        );
    }

    #[test]
    fn test_purpose_and_kind_are_bound() {
        let token = signer()
            .generate("a@x.com", PrincipalKind::User, TokenPurpose::Confirmation)
            .unwrap();

        assert_eq!(
            signer().verify(&token, PrincipalKind::User, TokenPurpose::PasswordReset),
            TokenVerification::Malformed
        );
        assert_eq!(
            signer().verify(&token, PrincipalKind::Handler, TokenPurpose::Confirmation),
            TokenVerification::Malformed
        );
    }
}
