//! Free-text application message parser.
//!
//! Application mails are form dumps: one `label: value` line per question,
//! labels phrased as questions in Czech, and the assigned membership number
//! on a line of its own near the bottom.

use chrono::{DateTime, Utc};

use crate::applicants::domain::RawApplicantPayload;
use crate::applicants::normalize::clean_phone;
use crate::applicants::parser::gender::guess_gender;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    FirstName,
    LastName,
    Email,
    Phone,
    Dob,
    City,
    School,
    Interests,
    Character,
    Frequency,
    Source,
    SourceDetail,
    Message,
    Color,
    NewsletterOptOut,
}

#[derive(Debug, Clone, Copy)]
enum Match {
    Prefix(&'static str),
    Exact(&'static str),
}

/// Question labels in the order they appear on the form. Prefix matching
/// tolerates trailing question marks and wording drift after the stem.
const LABELS: &[(Match, Field)] = &[
    (Match::Prefix("Jak se jmenuješ"), Field::FirstName),
    (Match::Prefix("Jaké je tvé příjmení"), Field::LastName),
    (Match::Prefix("Kam ti můžeme poslat e-mail"), Field::Email),
    (Match::Prefix("Na jaké číslo ti můžeme zavolat"), Field::Phone),
    (Match::Prefix("Kdy ses narodil"), Field::Dob),
    (Match::Prefix("Odkud pocházíš"), Field::City),
    (Match::Prefix("Kam chodíš do školy"), Field::School),
    (Match::Prefix("Co tě nejvíc zajímá"), Field::Interests),
    (Match::Prefix("Jsi"), Field::Character),
    (Match::Prefix("Jak často"), Field::Frequency),
    (Match::Prefix("Odkud ses o nás dozvěděl"), Field::Source),
    (Match::Exact("Odkud?"), Field::SourceDetail),
    (Match::Exact("Jinde?"), Field::SourceDetail),
    (Match::Prefix("Chceš nám něco říct"), Field::Message),
    (Match::Prefix("Zelená nebo růžová"), Field::Color),
    (
        Match::Prefix("Nesouhlas se zasíláním novinek"),
        Field::NewsletterOptOut,
    ),
];

fn classify(label: &str) -> Option<Field> {
    let label = label.trim();
    for (matcher, field) in LABELS {
        let hit = match matcher {
            Match::Prefix(stem) => label.starts_with(stem),
            Match::Exact(text) => label == *text,
        };
        if hit {
            return Some(*field);
        }
    }
    None
}

/// The membership number is the last line consisting solely of digits.
fn find_membership_id(body: &str) -> Option<String> {
    body.lines()
        .rev()
        .map(str::trim)
        .find(|line| !line.is_empty() && line.chars().all(|c| c.is_ascii_digit()))
        .map(str::to_string)
}

/// Parses one application message body into a payload.
///
/// First match wins per field so a student mentioning a question label in
/// their free-form message cannot overwrite an earlier answer.
pub fn parse_message(body: &str, received_at: Option<DateTime<Utc>>) -> RawApplicantPayload {
    let mut payload = RawApplicantPayload {
        received_at,
        newsletter_consent: true,
        ..RawApplicantPayload::default()
    };

    for line in body.lines() {
        let Some((label, value)) = line.split_once(':') else {
            continue;
        };
        let Some(field) = classify(label) else {
            continue;
        };
        let value = value.trim().to_string();

        let slot = match field {
            Field::FirstName => &mut payload.first_name,
            Field::LastName => &mut payload.last_name,
            Field::Email => &mut payload.email,
            Field::Phone => &mut payload.phone,
            Field::Dob => &mut payload.dob,
            Field::City => &mut payload.city,
            Field::School => &mut payload.school,
            Field::Interests => &mut payload.interests,
            Field::Character => &mut payload.character,
            Field::Frequency => &mut payload.frequency,
            Field::Source => &mut payload.source,
            Field::SourceDetail => &mut payload.source_detail,
            Field::Message => &mut payload.message,
            Field::Color => &mut payload.color,
            Field::NewsletterOptOut => {
                // Any non-empty opt-out answer withdraws consent.
                if payload.newsletter_consent && !value.is_empty() {
                    payload.newsletter_consent = false;
                }
                continue;
            }
        };
        if slot.is_empty() {
            *slot = value;
        }
    }

    payload.phone = clean_phone(&payload.phone);
    payload.membership_id = find_membership_id(body);
    payload.guessed_gender = guess_gender(&payload.first_name, &payload.last_name);
    payload
}
