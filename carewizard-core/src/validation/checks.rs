//! Format predicates used by rule checks.

use chrono::{NaiveDate, NaiveTime};

const MIN_PASSWORD_LEN: usize = 8;

const MIN_IDENTIFIER_LEN: usize = 5;
const MAX_IDENTIFIER_LEN: usize = 20;

const LOCAL_PHONE_DIGITS: usize = 10;
const MAX_COUNTRY_CODE_DIGITS: usize = 3;

pub fn is_email(value: &str) -> bool {
    let value = value.trim();
    if value.chars().any(char::is_whitespace) {
        return false;
    }

    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }

    let labels: Vec<&str> = domain.split('.').collect();
    labels.len() >= 2 && labels.iter().all(|label| !label.is_empty())
}

/// Ten local digits, optionally preceded by `+` and a country code.
/// Spaces, dashes and parentheses are ignored.
pub fn is_phone(value: &str) -> bool {
    let compact: String = value
        .trim()
        .chars()
        .filter(|c| !matches!(c, ' ' | '-' | '(' | ')'))
        .collect();

    match compact.strip_prefix('+') {
        Some(rest) => {
            rest.chars().all(|c| c.is_ascii_digit())
                && (LOCAL_PHONE_DIGITS + 1..=LOCAL_PHONE_DIGITS + MAX_COUNTRY_CODE_DIGITS)
                    .contains(&rest.len())
        }
        None => compact.len() == LOCAL_PHONE_DIGITS && compact.chars().all(|c| c.is_ascii_digit()),
    }
}

pub fn is_digits(value: &str, min: usize, max: usize) -> bool {
    let value = value.trim();
    (min..=max).contains(&value.len()) && value.chars().all(|c| c.is_ascii_digit())
}

/// Registration/license style identifiers: alphanumeric plus `-` and `/`.
pub fn is_identifier(value: &str) -> bool {
    let value = value.trim();
    (MIN_IDENTIFIER_LEN..=MAX_IDENTIFIER_LEN).contains(&value.len())
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '/')
}

pub fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").ok()
}

pub fn parse_time(value: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(value.trim(), "%H:%M").ok()
}

pub fn is_strong_password(value: &str) -> bool {
    value.chars().count() >= MIN_PASSWORD_LEN
        && value.chars().any(|c| c.is_uppercase())
        && value.chars().any(|c| c.is_lowercase())
        && value.chars().any(|c| c.is_ascii_digit())
        && value.chars().any(|c| !c.is_alphanumeric() && !c.is_whitespace())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email() {
        assert!(is_email("asha@example.com"));
        assert!(is_email(" Asha.Rao@clinic.co.in "));
        assert!(!is_email("asha@example"));
        assert!(!is_email("@example.com"));
        assert!(!is_email("asha@@example.com"));
        assert!(!is_email("asha rao@example.com"));
        assert!(!is_email("asha@example..com"));
    }

    #[test]
    fn test_phone() {
        assert!(is_phone("9876543210"));
        assert!(is_phone("98765-43210"));
        assert!(is_phone("+91 98765 43210"));
        assert!(!is_phone("987654321"));
        assert!(!is_phone("+9876543210"));
        assert!(!is_phone("98765432ab"));
    }

    #[test]
    fn test_identifier() {
        assert!(is_identifier("MH-12345"));
        assert!(is_identifier("kmc/2019/778"));
        assert!(!is_identifier("A1"));
        assert!(!is_identifier("LIC 12345"));
    }

    #[test]
    fn test_dates_and_times() {
        assert!(parse_date("1990-01-01").is_some());
        assert!(parse_date("1990-13-01").is_none());
        assert!(parse_date("01/01/1990").is_none());
        assert!(parse_time("09:30").is_some());
        assert!(parse_time("25:00").is_none());
    }

    #[test]
    fn test_password_strength() {
        assert!(is_strong_password("Str0ng!pw"));
        assert!(!is_strong_password("Sh0rt!"));
        assert!(!is_strong_password("nouppercase1!"));
        assert!(!is_strong_password("NoDigits!!"));
        assert!(!is_strong_password("NoSymbol123"));
    }
}
