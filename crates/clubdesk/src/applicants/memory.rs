//! In-memory store backing both the test target and local development.
//!
//! One instance exists per [`StoreTarget`](crate::config::StoreTarget); the
//! caller decides which instance an operation touches.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::Utc;

use super::domain::{
    ApplicantId, ApplicantRecord, ApplicantUpdate, ApplicationStatus, AuditLogEntry, FieldChange,
    Gender, NewApplicant,
};
use super::repository::{ApplicantStore, AuditLedger, RepositoryError};

#[derive(Default)]
pub struct InMemoryStore {
    records: Mutex<HashMap<ApplicantId, ApplicantRecord>>,
    audit: Mutex<Vec<AuditLogEntry>>,
    sequence: AtomicU64,
}

fn poisoned<T>(_: PoisonError<MutexGuard<'_, T>>) -> RepositoryError {
    RepositoryError::Unavailable("store mutex poisoned".to_string())
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_id(&self) -> ApplicantId {
        ApplicantId(self.sequence.fetch_add(1, Ordering::SeqCst) + 1)
    }
}

impl ApplicantStore for InMemoryStore {
    fn insert(&self, draft: NewApplicant) -> Result<ApplicantRecord, RepositoryError> {
        let mut guard = self.records.lock().map_err(poisoned)?;

        // Identity uniqueness holds across deleted records too; restores go
        // through `restore`, not a second insert.
        let duplicate = guard.values().any(|r| {
            r.email == draft.email
                && r.first_name == draft.first_name
                && r.last_name == draft.last_name
        });
        if duplicate {
            return Err(RepositoryError::Conflict);
        }

        let record = ApplicantRecord {
            id: self.next_id(),
            membership_id: draft.membership_id,
            first_name: draft.first_name,
            last_name: draft.last_name,
            email: draft.email,
            phone: draft.phone,
            dob: draft.dob,
            city: draft.city,
            school: draft.school,
            interests: draft.interests,
            character: draft.character,
            frequency: draft.frequency,
            source: draft.source,
            source_detail: draft.source_detail,
            message: draft.message,
            color: draft.color,
            note: String::new(),
            guessed_gender: draft.guessed_gender.unwrap_or(Gender::Unknown),
            status: ApplicationStatus::New,
            newsletter_consent: draft.newsletter_consent,
            deleted: false,
            created_at: Utc::now(),
            application_received_at: draft.application_received_at,
            parent_email_warning_dismissed: false,
            duplicate_warning_dismissed: false,
            phone_warning_dismissed: false,
            exported_to_list: false,
            exported_at: None,
        };
        guard.insert(record.id, record.clone());
        Ok(record)
    }

    fn fetch(&self, id: ApplicantId) -> Result<Option<ApplicantRecord>, RepositoryError> {
        let guard = self.records.lock().map_err(poisoned)?;
        Ok(guard.get(&id).cloned())
    }

    fn apply_update(
        &self,
        id: ApplicantId,
        update: ApplicantUpdate,
    ) -> Result<FieldChange, RepositoryError> {
        let mut guard = self.records.lock().map_err(poisoned)?;
        let record = guard.get_mut(&id).ok_or(RepositoryError::NotFound)?;
        Ok(update.apply_to(record)?)
    }

    fn soft_delete(&self, id: ApplicantId) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().map_err(poisoned)?;
        let record = guard.get_mut(&id).ok_or(RepositoryError::NotFound)?;
        record.deleted = true;
        Ok(())
    }

    fn restore(&self, id: ApplicantId) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().map_err(poisoned)?;
        let record = guard.get_mut(&id).ok_or(RepositoryError::NotFound)?;
        record.deleted = false;
        Ok(())
    }

    fn find_by_membership_id(
        &self,
        membership_id: &str,
    ) -> Result<Option<ApplicantRecord>, RepositoryError> {
        let guard = self.records.lock().map_err(poisoned)?;
        let mut matches: Vec<&ApplicantRecord> = guard
            .values()
            .filter(|r| r.membership_id == membership_id)
            .collect();
        matches.sort_by_key(|r| r.id);
        Ok(matches.first().map(|r| (*r).clone()))
    }

    fn find_by_identity(
        &self,
        email: &str,
        first_name: &str,
        last_name: &str,
    ) -> Result<Option<ApplicantRecord>, RepositoryError> {
        let guard = self.records.lock().map_err(poisoned)?;
        let mut matches: Vec<&ApplicantRecord> = guard
            .values()
            .filter(|r| r.email == email && r.first_name == first_name && r.last_name == last_name)
            .collect();
        matches.sort_by_key(|r| r.id);
        Ok(matches.first().map(|r| (*r).clone()))
    }

    fn active_records(&self) -> Result<Vec<ApplicantRecord>, RepositoryError> {
        let guard = self.records.lock().map_err(poisoned)?;
        let mut records: Vec<ApplicantRecord> =
            guard.values().filter(|r| !r.deleted).cloned().collect();
        records.sort_by_key(|r| r.id);
        Ok(records)
    }

    fn mark_exported(&self, id: ApplicantId) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().map_err(poisoned)?;
        let record = guard.get_mut(&id).ok_or(RepositoryError::NotFound)?;
        record.exported_to_list = true;
        record.exported_at = Some(Utc::now());
        Ok(())
    }
}

impl AuditLedger for InMemoryStore {
    fn append(&self, entry: AuditLogEntry) -> Result<(), RepositoryError> {
        let mut guard = self.audit.lock().map_err(poisoned)?;
        guard.push(entry);
        Ok(())
    }

    fn entries_for(&self, id: ApplicantId) -> Result<Vec<AuditLogEntry>, RepositoryError> {
        let guard = self.audit.lock().map_err(poisoned)?;
        Ok(guard
            .iter()
            .filter(|e| e.applicant_id == id)
            .cloned()
            .collect())
    }
}
