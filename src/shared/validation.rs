use lazy_static::lazy_static;
use regex::Regex;
use validator::ValidationError;

lazy_static! {
    /// Regex for validating username fields
    /// Must start with a letter or underscore and contain only alphanumeric characters and underscores
    /// - Valid: "john_doe", "user123", "_admin", "JohnDoe"
    /// - Invalid: "123user", "-user", "user-name", "user name"
    pub static ref USERNAME_REGEX: Regex = Regex::new(r"^[a-zA-Z_][a-zA-Z0-9_]*$").unwrap();

    /// Regex for phone numbers: digits with an optional leading "+"
    /// - Valid: "0712345678", "+254712345678"
    /// - Invalid: "07-12-34", "phone", "+"
    pub static ref PHONE_REGEX: Regex = Regex::new(r"^\+?[0-9]{9,15}$").unwrap();
}

/// Rejects values that are empty once surrounding whitespace is removed
pub fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut error = ValidationError::new("blank");
        error.message = Some("This field is required.".into());
        return Err(error);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_username_regex() {
        assert!(USERNAME_REGEX.is_match("john_doe"));
        assert!(USERNAME_REGEX.is_match("_admin"));
        assert!(!USERNAME_REGEX.is_match("123user"));
        assert!(!USERNAME_REGEX.is_match("user name"));
        assert!(!USERNAME_REGEX.is_match(""));
    }

    #[test]
    fn test_phone_regex() {
        assert!(PHONE_REGEX.is_match("0712345678"));
        assert!(PHONE_REGEX.is_match("+254712345678"));
        assert!(!PHONE_REGEX.is_match("07-12-34"));
        assert!(!PHONE_REGEX.is_match("+"));
        assert!(!PHONE_REGEX.is_match("phone"));
    }

    #[test]
    fn test_not_blank() {
        assert!(not_blank("text").is_ok());
        assert!(not_blank("   ").is_err());
    }
}
