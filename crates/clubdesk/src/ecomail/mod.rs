//! Synchronization with the Ecomail mailing list.
//!
//! The engine never mirrors the list wholesale; it answers two questions
//! for one applicant at a time: "how does this record differ from the
//! list?" and "push this record to the list".

pub mod client;
pub mod diff;
pub mod projection;

use serde_json::Value;

pub use client::EcomailClient;
pub use diff::{FieldDiff, SyncDiff};
pub use projection::SubscriberProfile;

use crate::applicants::domain::ApplicantRecord;

#[derive(Debug, thiserror::Error)]
pub enum EcomailError {
    #[error("mailing list request failed: {0}")]
    Http(#[source] reqwest::Error),
    #[error("mailing list API returned {status}: {body}")]
    Api { status: u16, body: String },
}

/// Remote subscriber directory, blocking. The HTTP client implements this;
/// tests substitute a canned map.
pub trait SubscriberDirectory: Send + Sync {
    fn lookup(&self, email: &str) -> Result<Option<Value>, EcomailError>;
    fn upsert(&self, list_id: &str, payload: &Value) -> Result<Value, EcomailError>;
}

pub struct SyncEngine<D: SubscriberDirectory> {
    directory: D,
}

impl<D: SubscriberDirectory> SyncEngine<D> {
    pub fn new(directory: D) -> Self {
        Self { directory }
    }

    /// Compares a record against the list without writing anything.
    pub fn check(&self, record: &ApplicantRecord) -> Result<SyncDiff, EcomailError> {
        let profile = SubscriberProfile::from_record(record);
        let remote = self.directory.lookup(&profile.email)?;
        Ok(diff::diff_profile(&profile, remote.as_ref()))
    }

    /// Pushes a record to the given list.
    ///
    /// Consent is written only when the subscriber is new; an existing
    /// subscriber keeps whatever status the list holds.
    pub fn push(&self, record: &ApplicantRecord, list_id: &str) -> Result<Value, EcomailError> {
        let profile = SubscriberProfile::from_record(record);
        let exists = self.directory.lookup(&profile.email)?.is_some();
        let payload = profile.subscribe_payload(!exists);
        self.directory.upsert(list_id, &payload)
    }
}
