use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::normalize::{clean_phone, is_valid_email, is_valid_phone};

/// Integer store key for applicant records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ApplicantId(pub u64);

impl std::fmt::Display for ApplicantId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Workflow status tracked for every application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    New,
    Processing,
    Resolved,
    Archived,
}

impl ApplicationStatus {
    pub const fn label(self) -> &'static str {
        match self {
            ApplicationStatus::New => "new",
            ApplicationStatus::Processing => "processing",
            ApplicationStatus::Resolved => "resolved",
            ApplicationStatus::Archived => "archived",
        }
    }
}

/// Best-effort gender guess derived from naming conventions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Female,
    Male,
    Unknown,
}

/// Which channel a batch of payloads arrived through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IngestSource {
    Mailbox,
    CsvUpload,
}

impl IngestSource {
    pub const fn label(self) -> &'static str {
        match self {
            IngestSource::Mailbox => "mailbox",
            IngestSource::CsvUpload => "CSV upload",
        }
    }
}

/// The persisted, store-owned shape of an applicant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicantRecord {
    pub id: ApplicantId,
    pub membership_id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub dob: String,
    pub city: String,
    pub school: String,
    pub interests: String,
    pub character: String,
    pub frequency: String,
    pub source: String,
    pub source_detail: String,
    pub message: String,
    pub color: String,
    pub note: String,
    pub guessed_gender: Gender,
    pub status: ApplicationStatus,
    pub newsletter_consent: bool,
    pub deleted: bool,
    pub created_at: DateTime<Utc>,
    pub application_received_at: Option<DateTime<Utc>>,
    pub parent_email_warning_dismissed: bool,
    pub duplicate_warning_dismissed: bool,
    pub phone_warning_dismissed: bool,
    pub exported_to_list: bool,
    pub exported_at: Option<DateTime<Utc>>,
}

/// A record draft the store turns into an [`ApplicantRecord`] by assigning
/// an id and creation timestamp.
#[derive(Debug, Clone, Default)]
pub struct NewApplicant {
    pub membership_id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub dob: String,
    pub city: String,
    pub school: String,
    pub interests: String,
    pub character: String,
    pub frequency: String,
    pub source: String,
    pub source_detail: String,
    pub message: String,
    pub color: String,
    pub guessed_gender: Option<Gender>,
    pub newsletter_consent: bool,
    pub application_received_at: Option<DateTime<Utc>>,
}

/// Transient parser output; consumed exactly once by the resolver and
/// orchestrator, never persisted verbatim.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawApplicantPayload {
    pub membership_id: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub dob: String,
    pub city: String,
    pub school: String,
    pub interests: String,
    pub character: String,
    pub frequency: String,
    pub source: String,
    pub source_detail: String,
    pub message: String,
    pub color: String,
    pub newsletter_consent: bool,
    pub guessed_gender: Gender,
    /// Timestamp of the inbound unit (message date); None for tabular rows.
    pub received_at: Option<DateTime<Utc>>,
}

impl Default for Gender {
    fn default() -> Self {
        Gender::Unknown
    }
}

/// How an incoming payload relates to the existing store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchDecision {
    Create,
    Restore { existing: ApplicantId },
    SkipDuplicate { existing: ApplicantId },
    Reject { reason: String },
}

/// Immutable entry in the append-only audit ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditLogEntry {
    pub applicant_id: ApplicantId,
    pub action: String,
    pub actor: String,
    pub timestamp: DateTime<Utc>,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
}

impl AuditLogEntry {
    pub fn new(applicant_id: ApplicantId, action: impl Into<String>, actor: &str) -> Self {
        Self {
            applicant_id,
            action: action.into(),
            actor: actor.to_string(),
            timestamp: Utc::now(),
            old_value: None,
            new_value: None,
        }
    }

    pub fn with_change(mut self, old_value: String, new_value: String) -> Self {
        self.old_value = Some(old_value);
        self.new_value = Some(new_value);
        self
    }
}

/// Closed enumeration of updatable fields.
///
/// Replaces the string-keyed dynamic field update of earlier revisions:
/// unknown fields are unrepresentable and every variant is validated in one
/// dispatch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "field", content = "value", rename_all = "snake_case")]
pub enum ApplicantUpdate {
    FirstName(String),
    LastName(String),
    Email(String),
    Phone(String),
    Dob(String),
    City(String),
    School(String),
    Interests(String),
    Character(String),
    Frequency(String),
    Source(String),
    SourceDetail(String),
    Message(String),
    Color(String),
    Note(String),
    Status(ApplicationStatus),
    NewsletterConsent(bool),
    GuessedGender(Gender),
    DismissParentEmailWarning,
    DismissDuplicateWarning,
    DismissPhoneWarning,
}

/// Old/new snapshot of one applied update, for the audit ledger.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldChange {
    pub field: &'static str,
    pub old_value: String,
    pub new_value: String,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum UpdateError {
    #[error("invalid email format")]
    InvalidEmail,
    #[error("invalid phone format (at least nine digits)")]
    InvalidPhone,
}

impl ApplicantUpdate {
    pub const fn field_name(&self) -> &'static str {
        match self {
            ApplicantUpdate::FirstName(_) => "first_name",
            ApplicantUpdate::LastName(_) => "last_name",
            ApplicantUpdate::Email(_) => "email",
            ApplicantUpdate::Phone(_) => "phone",
            ApplicantUpdate::Dob(_) => "dob",
            ApplicantUpdate::City(_) => "city",
            ApplicantUpdate::School(_) => "school",
            ApplicantUpdate::Interests(_) => "interests",
            ApplicantUpdate::Character(_) => "character",
            ApplicantUpdate::Frequency(_) => "frequency",
            ApplicantUpdate::Source(_) => "source",
            ApplicantUpdate::SourceDetail(_) => "source_detail",
            ApplicantUpdate::Message(_) => "message",
            ApplicantUpdate::Color(_) => "color",
            ApplicantUpdate::Note(_) => "note",
            ApplicantUpdate::Status(_) => "status",
            ApplicantUpdate::NewsletterConsent(_) => "newsletter_consent",
            ApplicantUpdate::GuessedGender(_) => "guessed_gender",
            ApplicantUpdate::DismissParentEmailWarning => "parent_email_warning_dismissed",
            ApplicantUpdate::DismissDuplicateWarning => "duplicate_warning_dismissed",
            ApplicantUpdate::DismissPhoneWarning => "phone_warning_dismissed",
        }
    }

    /// Applies the update to `record`, validating and normalizing where the
    /// field demands it.
    pub fn apply_to(self, record: &mut ApplicantRecord) -> Result<FieldChange, UpdateError> {
        let field = self.field_name();

        fn swap(slot: &mut String, value: String) -> (String, String) {
            let old = std::mem::replace(slot, value.trim().to_string());
            (old, slot.clone())
        }

        let (old_value, new_value) = match self {
            ApplicantUpdate::FirstName(v) => swap(&mut record.first_name, v),
            ApplicantUpdate::LastName(v) => swap(&mut record.last_name, v),
            ApplicantUpdate::Email(v) => {
                if !is_valid_email(&v) {
                    return Err(UpdateError::InvalidEmail);
                }
                swap(&mut record.email, v)
            }
            ApplicantUpdate::Phone(v) => {
                let normalized = clean_phone(&v);
                if !is_valid_phone(&normalized) {
                    return Err(UpdateError::InvalidPhone);
                }
                swap(&mut record.phone, normalized)
            }
            ApplicantUpdate::Dob(v) => swap(&mut record.dob, v),
            ApplicantUpdate::City(v) => swap(&mut record.city, v),
            ApplicantUpdate::School(v) => swap(&mut record.school, v),
            ApplicantUpdate::Interests(v) => swap(&mut record.interests, v),
            ApplicantUpdate::Character(v) => swap(&mut record.character, v),
            ApplicantUpdate::Frequency(v) => swap(&mut record.frequency, v),
            ApplicantUpdate::Source(v) => swap(&mut record.source, v),
            ApplicantUpdate::SourceDetail(v) => swap(&mut record.source_detail, v),
            ApplicantUpdate::Message(v) => swap(&mut record.message, v),
            ApplicantUpdate::Color(v) => swap(&mut record.color, v),
            ApplicantUpdate::Note(v) => swap(&mut record.note, v),
            ApplicantUpdate::Status(status) => {
                let old = record.status.label().to_string();
                record.status = status;
                (old, status.label().to_string())
            }
            ApplicantUpdate::NewsletterConsent(value) => {
                let old = record.newsletter_consent.to_string();
                record.newsletter_consent = value;
                (old, value.to_string())
            }
            ApplicantUpdate::GuessedGender(gender) => {
                let old = format!("{:?}", record.guessed_gender);
                record.guessed_gender = gender;
                (old, format!("{gender:?}"))
            }
            ApplicantUpdate::DismissParentEmailWarning => {
                let old = record.parent_email_warning_dismissed.to_string();
                record.parent_email_warning_dismissed = true;
                (old, "true".to_string())
            }
            ApplicantUpdate::DismissDuplicateWarning => {
                let old = record.duplicate_warning_dismissed.to_string();
                record.duplicate_warning_dismissed = true;
                (old, "true".to_string())
            }
            ApplicantUpdate::DismissPhoneWarning => {
                let old = record.phone_warning_dismissed.to_string();
                record.phone_warning_dismissed = true;
                (old, "true".to_string())
            }
        };

        Ok(FieldChange {
            field,
            old_value,
            new_value,
        })
    }
}
