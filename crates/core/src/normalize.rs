//! Email and phone normalization.
//!
//! Accounts are keyed by normalized email and E.164 phone strings, and the
//! SMS channel only accepts E.164 input, so every user-supplied contact
//! endpoint passes through here exactly once, at the write path.

use std::sync::OnceLock;

use regex::Regex;

use crate::error::CoreError;

/// E.164: a `+`, a non-zero leading digit, at most 15 digits total. The
/// lower bound of 7 rejects obviously-truncated input.
fn e164_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\+[1-9]\d{6,14}$").unwrap())
}

/// NANP national number: area code and exchange must not start with 0 or 1.
fn nanp_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[2-9]\d{2}[2-9]\d{6}$").unwrap())
}

/// Normalize an email address: trim whitespace and lowercase the domain
/// part. The local part is preserved as given.
pub fn normalize_email(email: &str) -> String {
    let email = email.trim();
    match email.rsplit_once('@') {
        Some((local, domain)) => format!("{local}@{}", domain.to_lowercase()),
        None => email.to_string(),
    }
}

/// Return the canonical E.164 form of a phone number.
///
/// A number without a leading `+` is assumed to be a US national number.
/// If that reading does not validate, a `+`-prefixed reading is tried
/// before giving up — some foreign numbers look like malformed US ones
/// until the international prefix is added.
pub fn normalize_phone(raw: &str) -> Result<String, CoreError> {
    let digits: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '+')
        .collect();

    if digits.is_empty() {
        return Err(CoreError::Validation("Phone number too short".into()));
    }

    if let Some(rest) = digits.strip_prefix('+') {
        // Strip any stray '+' characters a paste may have left mid-string.
        let rest: String = rest.chars().filter(char::is_ascii_digit).collect();
        return validate_e164(&format!("+{rest}"));
    }

    // Assume US.
    let national = digits.strip_prefix('1').unwrap_or(&digits);
    if nanp_re().is_match(national) {
        return Ok(format!("+1{national}"));
    }

    // Retry with an international prefix.
    validate_e164(&format!("+{digits}"))
}

fn validate_e164(candidate: &str) -> Result<String, CoreError> {
    if e164_re().is_match(candidate) {
        Ok(candidate.to_string())
    } else {
        Err(CoreError::Validation(
            "Does not seem to be a valid phone number".into(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_lowercases_domain_only() {
        assert_eq!(normalize_email("Jane.Doe@EXAMPLE.Com"), "Jane.Doe@example.com");
        assert_eq!(normalize_email("  a@B.co  "), "a@b.co");
        assert_eq!(normalize_email("not-an-email"), "not-an-email");
    }

    #[test]
    fn us_number_without_prefix() {
        assert_eq!(normalize_phone("310-555-0199").unwrap(), "+13105550199");
        assert_eq!(normalize_phone("(310) 555 0199").unwrap(), "+13105550199");
        assert_eq!(normalize_phone("1 310 555 0199").unwrap(), "+13105550199");
    }

    #[test]
    fn already_e164_passes_through() {
        assert_eq!(normalize_phone("+447911123456").unwrap(), "+447911123456");
    }

    #[test]
    fn foreign_number_retried_with_plus() {
        // Looks like an 11-digit US dial string but isn't valid NANP;
        // adding '+' yields a valid Polish number.
        assert_eq!(normalize_phone("48794987216").unwrap(), "+48794987216");
    }

    #[test]
    fn garbage_rejected() {
        assert!(normalize_phone("").is_err());
        assert!(normalize_phone("123").is_err());
        assert!(normalize_phone("+0123456").is_err());
    }
}
