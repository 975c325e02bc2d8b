//! Projection of applicant records into the mailing-list subscriber shape.

use serde_json::{json, Value};

use crate::applicants::domain::ApplicantRecord;
use crate::applicants::normalize::parse_birth_date;

/// The subset of a record the mailing list knows about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriberProfile {
    pub name: String,
    pub surname: String,
    pub email: String,
    pub phone: String,
    pub city: String,
    /// ISO date when the stored value parses, verbatim otherwise.
    pub birthday: String,
    pub membership_id: String,
    pub tags: Vec<String>,
    pub newsletter_consent: bool,
}

impl SubscriberProfile {
    pub fn from_record(record: &ApplicantRecord) -> Self {
        Self {
            name: record.first_name.trim().to_string(),
            surname: record.last_name.trim().to_string(),
            email: record.email.trim().to_string(),
            phone: record.phone.trim().to_string(),
            city: record.city.trim().to_string(),
            birthday: format_birthday(&record.dob),
            membership_id: record.membership_id.trim().to_string(),
            tags: build_tags(record),
            newsletter_consent: record.newsletter_consent,
        }
    }

    /// The `lists/{id}/subscribe` request body.
    ///
    /// `include_status` is true only when the subscriber does not exist yet;
    /// updates omit the status field so a manual unsubscribe on the list
    /// side survives a re-push.
    pub fn subscribe_payload(&self, include_status: bool) -> Value {
        let mut subscriber_data = json!({
            "name": self.name,
            "surname": self.surname,
            "email": self.email,
            "phone": self.phone,
            "city": self.city,
            "birthday": self.birthday,
            "custom_fields": { "MEMBERSHIP_ID": self.membership_id },
        });
        if include_status {
            let status = if self.newsletter_consent {
                "subscribed"
            } else {
                "unsubscribed"
            };
            subscriber_data["status"] = Value::String(status.to_string());
        }

        json!({
            "subscriber_data": subscriber_data,
            "tags": self.tags,
            "update_existing": true,
            "resubscribe": false,
        })
    }
}

fn format_birthday(dob: &str) -> String {
    match parse_birth_date(dob) {
        Some(date) => date.format("%Y-%m-%d").to_string(),
        None => dob.trim().to_string(),
    }
}

/// Tags are the character answer, each comma-separated interest, and the
/// school with commas flattened to spaces.
fn build_tags(record: &ApplicantRecord) -> Vec<String> {
    let mut tags = Vec::new();

    let character = record.character.trim();
    if !character.is_empty() {
        tags.push(character.to_string());
    }

    for interest in record.interests.split(',') {
        let interest = interest.trim();
        if !interest.is_empty() {
            tags.push(interest.to_string());
        }
    }

    let school = record.school.trim();
    if !school.is_empty() {
        tags.push(school.replace(',', " ").split_whitespace().collect::<Vec<_>>().join(" "));
    }

    tags
}
