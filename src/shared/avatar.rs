use sha2::{Digest, Sha256};

const GRAVATAR_BASE_URL: &str = "https://secure.gravatar.com/avatar";

/// Gravatar hash of an email address (SHA-256 of the trimmed, lower-cased address)
pub fn avatar_hash(email: &str) -> String {
    hex::encode(Sha256::digest(email.trim().to_lowercase().as_bytes()))
}

/// Gravatar image URL for a stored hash
pub fn gravatar_url(hash: &str, size: u32, default: &str, rating: &str) -> String {
    format!(
        "{}/{}?s={}&d={}&r={}",
        GRAVATAR_BASE_URL,
        hash,
        size,
        urlencoding::encode(default),
        urlencoding::encode(rating)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_ignores_case_and_whitespace() {
        assert_eq!(avatar_hash(" Alice@Example.com "), avatar_hash("alice@example.com"));
        assert_eq!(avatar_hash("alice@example.com").len(), 64);
    }

    #[test]
    fn test_gravatar_url() {
        let url = gravatar_url("abc", 100, "identicon", "g");
        assert_eq!(
            url,
            "https://secure.gravatar.com/avatar/abc?s=100&d=identicon&r=g"
        );
    }
}
