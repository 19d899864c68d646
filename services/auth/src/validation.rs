//! Account input rules shared by signup and login

use regex::Regex;
use std::sync::OnceLock;

use crate::models::SignupRequest;

const NAME_MAX_CHARS: usize = 100;
/// RFC 5321 path limit
const EMAIL_MAX_LEN: usize = 254;
const PASSWORD_MIN_CHARS: usize = 6;
const PASSWORD_MAX_LEN: usize = 128;

/// Check every signup field, reporting the first problem
pub fn validate_signup(request: &SignupRequest) -> Result<(), String> {
    validate_email(request.email.trim())?;
    validate_password(&request.password)?;
    validate_name(&request.name)
}

pub fn validate_name(name: &str) -> Result<(), String> {
    let name = name.trim();

    if name.is_empty() {
        return Err("Name is required".to_string());
    }

    if name.chars().count() > NAME_MAX_CHARS {
        return Err(format!(
            "Name must be at most {} characters long",
            NAME_MAX_CHARS
        ));
    }

    Ok(())
}

/// Shape check only; deliverability is never verified
pub fn validate_email(email: &str) -> Result<(), String> {
    if email.is_empty() {
        return Err("Email is required".to_string());
    }

    if email.len() > EMAIL_MAX_LEN {
        return Err(format!(
            "Email must be at most {} characters long",
            EMAIL_MAX_LEN
        ));
    }

    static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = EMAIL_REGEX.get_or_init(|| {
        Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
            .expect("Failed to compile email regex")
    });

    if !regex.is_match(email) {
        return Err("Invalid email format".to_string());
    }

    Ok(())
}

pub fn validate_password(password: &str) -> Result<(), String> {
    if password.is_empty() {
        return Err("Password is required".to_string());
    }

    if password.chars().count() < PASSWORD_MIN_CHARS {
        return Err(format!(
            "Password must be at least {} characters long",
            PASSWORD_MIN_CHARS
        ));
    }

    if password.len() > PASSWORD_MAX_LEN {
        return Err(format!(
            "Password must be at most {} bytes long",
            PASSWORD_MAX_LEN
        ));
    }

    Ok(())
}

/// Lowercase and trim an email so lookups are case-insensitive
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_email() {
        assert!(validate_email("rider@example.com").is_ok());
        assert!(validate_email("first.last+rides@mail.example.org").is_ok());
    }

    #[test]
    fn test_invalid_email() {
        assert_eq!(validate_email(""), Err("Email is required".to_string()));
        assert!(validate_email("no-at-sign").is_err());
        assert!(validate_email("user@nodot").is_err());
        assert!(validate_email(&format!("{}@example.com", "a".repeat(250))).is_err());
    }

    #[test]
    fn test_password_length_rules() {
        assert!(validate_password("abc123").is_ok());
        assert_eq!(
            validate_password("abc12"),
            Err("Password must be at least 6 characters long".to_string())
        );
        assert!(validate_password("").is_err());
        assert!(validate_password(&"x".repeat(129)).is_err());
    }

    #[test]
    fn test_name_rules() {
        assert!(validate_name("Dana").is_ok());
        assert!(validate_name("   ").is_err());
        assert!(validate_name(&"n".repeat(101)).is_err());
    }

    #[test]
    fn test_signup_reports_first_problem() {
        let request = SignupRequest {
            email: "not-an-email".to_string(),
            password: "1".to_string(),
            name: String::new(),
        };
        assert_eq!(
            validate_signup(&request),
            Err("Invalid email format".to_string())
        );

        let request = SignupRequest {
            email: " rider@example.com ".to_string(),
            password: "secret123".to_string(),
            name: "Rider".to_string(),
        };
        assert!(validate_signup(&request).is_ok());
    }

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  Rider@Example.COM "), "rider@example.com");
    }
}
