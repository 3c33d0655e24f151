// src/services/normalize.rs
//
// Canonical identifiers for lookups and storage keys. Normalization never
// fails; malformed input yields a best-guess string that downstream lookups
// simply will not match.

/// Canonicalize a phone number to an E.164-like string.
///
/// Inputs already carrying a `+` pass through unchanged. Otherwise all
/// non-digits are stripped: a bare 10-digit national number gets the default
/// country code, an 11-digit number starting with the trunk digit is
/// re-prefixed, and anything else is naively prefixed with `+`. This is a
/// single-country heuristic.
pub fn normalize_phone(raw: &str, country_code: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.starts_with('+') {
        return trimmed.to_string();
    }

    let digits: String = trimmed.chars().filter(|c| c.is_ascii_digit()).collect();
    let trunk = country_code.trim_start_matches('+');

    if digits.len() == 10 {
        format!("{}{}", country_code, digits)
    } else if digits.len() == 11 && digits.starts_with(trunk) {
        format!("{}{}", country_code, &digits[trunk.len()..])
    } else {
        format!("+{}", digits)
    }
}

/// Usernames are compared case-insensitively by construction.
pub fn normalize_username(raw: &str) -> String {
    raw.trim().to_lowercase()
}

pub fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ten_digit_number_gets_country_code() {
        assert_eq!(normalize_phone("5551234567", "+1"), "+15551234567");
        assert_eq!(normalize_phone("(555) 123-4567", "+1"), "+15551234567");
    }

    #[test]
    fn eleven_digit_number_with_trunk_is_reprefixed() {
        assert_eq!(normalize_phone("15551234567", "+1"), "+15551234567");
        assert_eq!(normalize_phone("1-555-123-4567", "+1"), "+15551234567");
    }

    #[test]
    fn plus_prefixed_number_passes_through() {
        assert_eq!(normalize_phone("+447911123456", "+1"), "+447911123456");
    }

    #[test]
    fn anything_else_is_naively_prefixed() {
        assert_eq!(normalize_phone("12345", "+1"), "+12345");
        assert_eq!(normalize_phone("", "+1"), "+");
    }

    #[test]
    fn usernames_and_emails_are_lowercased() {
        assert_eq!(normalize_username("  JDoe "), "jdoe");
        assert_eq!(normalize_email("A@Example.COM"), "a@example.com");
    }
}
