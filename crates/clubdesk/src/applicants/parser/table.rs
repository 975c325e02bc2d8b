//! CSV application parser.
//!
//! Exports from the form backend and hand-edited spreadsheets both land
//! here, so header names are matched against synonym lists and a UTF-8 BOM
//! on the first header is tolerated.

use std::collections::HashMap;

use crate::applicants::domain::RawApplicantPayload;
use crate::applicants::normalize::clean_phone;
use crate::applicants::parser::gender::guess_gender;

#[derive(Debug, thiserror::Error)]
pub enum CsvParseError {
    #[error("CSV is malformed: {0}")]
    Malformed(#[from] csv::Error),
}

/// Ordered alias lists; the first present header wins.
const FIRST_NAME: &[&str] = &["jmeno", "first_name"];
const LAST_NAME: &[&str] = &["prijmeni", "last_name"];
const EMAIL: &[&str] = &["email"];
const PHONE: &[&str] = &["telefon", "phone"];
const DOB: &[&str] = &["datum_narozeni", "dob"];
const MEMBERSHIP_ID: &[&str] = &["id", "cislo_karty", "membership_id", "clenske_cislo"];
const CITY: &[&str] = &["bydliste", "city"];
const SCHOOL: &[&str] = &["skola", "school"];
const INTERESTS: &[&str] = &["oblast_kultury", "interests"];
const CHARACTER: &[&str] = &["povaha", "character"];
const FREQUENCY: &[&str] = &["intenzita_vyuzivani", "frequency"];
const SOURCE: &[&str] = &["zdroje", "source"];
const SOURCE_DETAIL: &[&str] = &["kde", "jinde", "source_detail"];
const MESSAGE: &[&str] = &["volne_sdeleni", "message"];
const COLOR: &[&str] = &["barvy", "color"];
const NEWSLETTER_OPT_OUT: &[&str] = &["nesouhlas_se_zasilanim_novinek", "nesouhlas"];

fn pick(row: &HashMap<String, String>, aliases: &[&str]) -> String {
    for alias in aliases {
        if let Some(value) = row.get(*alias) {
            let trimmed = value.trim();
            if !trimmed.is_empty() {
                return trimmed.to_string();
            }
        }
    }
    String::new()
}

fn payload_from_row(row: &HashMap<String, String>) -> RawApplicantPayload {
    let first_name = pick(row, FIRST_NAME);
    let last_name = pick(row, LAST_NAME);
    let membership_id = {
        let value = pick(row, MEMBERSHIP_ID);
        if value.is_empty() {
            None
        } else {
            Some(value)
        }
    };

    // Consent stands unless the opt-out column carries an answer.
    let newsletter_consent = pick(row, NEWSLETTER_OPT_OUT).is_empty();
    let guessed_gender = guess_gender(&first_name, &last_name);

    RawApplicantPayload {
        membership_id,
        phone: clean_phone(&pick(row, PHONE)),
        email: pick(row, EMAIL),
        dob: pick(row, DOB),
        city: pick(row, CITY),
        school: pick(row, SCHOOL),
        interests: pick(row, INTERESTS),
        character: pick(row, CHARACTER),
        frequency: pick(row, FREQUENCY),
        source: pick(row, SOURCE),
        source_detail: pick(row, SOURCE_DETAIL),
        message: pick(row, MESSAGE),
        color: pick(row, COLOR),
        newsletter_consent,
        guessed_gender,
        first_name,
        last_name,
        received_at: None,
    }
}

/// Parses a whole CSV document into payloads, one per data row.
///
/// Headers are lowercased before alias matching. Rows are not validated
/// here; the resolver and orchestrator decide what each row means.
pub fn parse_csv(content: &str) -> Result<Vec<RawApplicantPayload>, CsvParseError> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);

    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(content.as_bytes());

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_lowercase())
        .collect();

    let mut payloads = Vec::new();
    for result in reader.records() {
        let record = result?;
        let row: HashMap<String, String> = headers
            .iter()
            .cloned()
            .zip(record.iter().map(|v| v.to_string()))
            .collect();
        if row.values().all(|v| v.trim().is_empty()) {
            continue;
        }
        payloads.push(payload_from_row(&row));
    }
    Ok(payloads)
}
