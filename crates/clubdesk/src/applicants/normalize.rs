//! Shared text heuristics.
//!
//! Every caller that strips diacritics, normalizes a phone number, or
//! computes an age goes through this module so the edge cases stay in one
//! place.

use chrono::{Datelike, NaiveDate};

/// Strips Czech diacritics and lowercases the result.
pub fn remove_diacritics(text: &str) -> String {
    text.chars()
        .flat_map(char::to_lowercase)
        .map(|c| match c {
            'á' | 'ä' => 'a',
            'č' => 'c',
            'ď' => 'd',
            'é' | 'ě' | 'ë' => 'e',
            'í' => 'i',
            'ň' => 'n',
            'ó' | 'ö' => 'o',
            'ř' => 'r',
            'š' => 's',
            'ť' => 't',
            'ú' | 'ů' | 'ü' => 'u',
            'ý' => 'y',
            'ž' => 'z',
            other => other,
        })
        .collect()
}

/// Removes spaces and hyphens, keeping a leading `+` and digits.
pub fn clean_phone(phone: &str) -> String {
    phone
        .trim()
        .chars()
        .filter(|c| !matches!(c, ' ' | '-'))
        .collect()
}

pub fn is_valid_email(email: &str) -> bool {
    let trimmed = email.trim();
    let Some((local, domain)) = trimmed.split_once('@') else {
        return false;
    };
    !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
}

/// A phone is valid when, after cleaning, it is an optional `+` followed by
/// at least nine digits.
pub fn is_valid_phone(phone: &str) -> bool {
    let cleaned = clean_phone(phone);
    let digits = cleaned.strip_prefix('+').unwrap_or(&cleaned);
    digits.len() >= 9 && digits.chars().all(|c| c.is_ascii_digit())
}

/// Parses the locale birth-date format (DD.MM.YYYY, slash separator
/// tolerated).
pub fn parse_birth_date(dob: &str) -> Option<NaiveDate> {
    let cleaned = dob.trim().replace('/', ".");
    NaiveDate::parse_from_str(&cleaned, "%d.%m.%Y").ok()
}

/// Age in completed years as of `today`, or None when the date is
/// unparseable.
pub fn calculate_age(dob: &str, today: NaiveDate) -> Option<i32> {
    let born = parse_birth_date(dob)?;
    let mut age = today.year() - born.year();
    if (today.month(), today.day()) < (born.month(), born.day()) {
        age -= 1;
    }
    Some(age)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remove_diacritics_handles_czech_names() {
        assert_eq!(remove_diacritics("Štěpánka"), "stepanka");
        assert_eq!(remove_diacritics("Malečková"), "maleckova");
        assert_eq!(remove_diacritics("plain"), "plain");
    }

    #[test]
    fn clean_phone_strips_spaces_and_hyphens() {
        assert_eq!(clean_phone("+420 777 603-960"), "+420777603960");
        assert_eq!(clean_phone("  123 456 789 "), "123456789");
    }

    #[test]
    fn phone_validity_requires_nine_digits() {
        assert!(is_valid_phone("+420777603960"));
        assert!(is_valid_phone("777 603 960"));
        assert!(!is_valid_phone("12345"));
        assert!(!is_valid_phone("telefonní číslo"));
    }

    #[test]
    fn email_validity_is_structural_only() {
        assert!(is_valid_email("jan@x.cz"));
        assert!(!is_valid_email("jan.x.cz"));
        assert!(!is_valid_email("@x.cz"));
        assert!(!is_valid_email("jan@xcz"));
    }

    #[test]
    fn age_counts_completed_years() {
        let today = NaiveDate::from_ymd_opt(2026, 8, 24).expect("valid date");
        assert_eq!(calculate_age("14/05/2000", today), Some(26));
        assert_eq!(calculate_age("25.12.2000", today), Some(25));
        assert_eq!(calculate_age("not-a-date", today), None);
    }
}
