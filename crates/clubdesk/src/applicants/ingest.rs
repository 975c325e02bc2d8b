//! Ingestion orchestrator.
//!
//! Runs a batch of parsed payloads against the store, one decision per
//! payload, writing the outcome to the audit ledger. A failing payload
//! never aborts the batch.

use tracing::{info, warn};

use super::domain::{AuditLogEntry, IngestSource, MatchDecision, NewApplicant, RawApplicantPayload};
use super::repository::{ApplicantStore, AuditLedger, RepositoryError};
use super::resolver::resolve;

/// Counters for one ingestion run.
#[derive(Debug, Default, Clone, PartialEq, Eq, serde::Serialize)]
pub struct IngestSummary {
    pub imported: usize,
    pub duplicates: usize,
    pub errors: Vec<String>,
}

pub struct IngestionPipeline<'a, S: ApplicantStore + AuditLedger> {
    store: &'a S,
    actor: &'a str,
}

impl<'a, S: ApplicantStore + AuditLedger> IngestionPipeline<'a, S> {
    pub fn new(store: &'a S, actor: &'a str) -> Self {
        Self { store, actor }
    }

    /// Ingests a whole batch; errors are collected per payload.
    pub fn run(&self, payloads: Vec<RawApplicantPayload>, source: IngestSource) -> IngestSummary {
        let mut summary = IngestSummary::default();
        for payload in payloads {
            match self.ingest_one(&payload, source) {
                Ok(Outcome::Imported) => summary.imported += 1,
                Ok(Outcome::Duplicate) => summary.duplicates += 1,
                Err(reason) => {
                    warn!(%reason, "payload skipped");
                    summary.errors.push(reason);
                }
            }
        }
        info!(
            source = source.label(),
            imported = summary.imported,
            duplicates = summary.duplicates,
            errors = summary.errors.len(),
            "ingestion finished"
        );
        summary
    }

    fn ingest_one(
        &self,
        payload: &RawApplicantPayload,
        source: IngestSource,
    ) -> Result<Outcome, String> {
        let decision = resolve(payload, self.store).map_err(|e| e.to_string())?;
        match decision {
            MatchDecision::Create => {
                let record = self
                    .store
                    .insert(draft_from(payload))
                    .map_err(|e| e.to_string())?;
                self.audit(AuditLogEntry::new(
                    record.id,
                    format!("Created via {}", source.label()),
                    self.actor,
                ))?;
                Ok(Outcome::Imported)
            }
            MatchDecision::Restore { existing } => {
                self.store.restore(existing).map_err(|e| e.to_string())?;
                self.audit(AuditLogEntry::new(
                    existing,
                    format!("Restored via {}", source.label()),
                    self.actor,
                ))?;
                Ok(Outcome::Imported)
            }
            MatchDecision::SkipDuplicate { existing } => {
                self.audit(AuditLogEntry::new(
                    existing,
                    format!("Duplicate import attempt via {}", source.label()),
                    self.actor,
                ))?;
                Ok(Outcome::Duplicate)
            }
            MatchDecision::Reject { reason } => Err(reason),
        }
    }

    fn audit(&self, entry: AuditLogEntry) -> Result<(), String> {
        AuditLedger::append(self.store, entry).map_err(|e: RepositoryError| e.to_string())
    }
}

enum Outcome {
    Imported,
    Duplicate,
}

fn draft_from(payload: &RawApplicantPayload) -> NewApplicant {
    NewApplicant {
        membership_id: payload.membership_id.clone().unwrap_or_default(),
        first_name: payload.first_name.clone(),
        last_name: payload.last_name.clone(),
        email: payload.email.clone(),
        phone: payload.phone.clone(),
        dob: payload.dob.clone(),
        city: payload.city.clone(),
        school: payload.school.clone(),
        interests: payload.interests.clone(),
        character: payload.character.clone(),
        frequency: payload.frequency.clone(),
        source: payload.source.clone(),
        source_detail: payload.source_detail.clone(),
        message: payload.message.clone(),
        color: payload.color.clone(),
        guessed_gender: Some(payload.guessed_gender),
        newsletter_consent: payload.newsletter_consent,
        application_received_at: payload.received_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::applicants::domain::ApplicantId;
    use crate::applicants::memory::InMemoryStore;

    fn payload(membership_id: &str, email: &str) -> RawApplicantPayload {
        RawApplicantPayload {
            membership_id: Some(membership_id.to_string()),
            first_name: "Jan".to_string(),
            last_name: "Novák".to_string(),
            email: email.to_string(),
            newsletter_consent: true,
            ..RawApplicantPayload::default()
        }
    }

    #[test]
    fn creates_new_records_and_audits() {
        let store = InMemoryStore::new();
        let pipeline = IngestionPipeline::new(&store, "operator");
        let summary = pipeline.run(vec![payload("1", "jan@x.cz")], IngestSource::Mailbox);
        assert_eq!(summary.imported, 1);
        assert_eq!(summary.duplicates, 0);
        let entries = AuditLedger::entries_for(&store, ApplicantId(1)).expect("entries");
        assert_eq!(entries[0].action, "Created via mailbox");
    }

    #[test]
    fn re_import_is_idempotent() {
        let store = InMemoryStore::new();
        let pipeline = IngestionPipeline::new(&store, "operator");
        pipeline.run(vec![payload("1", "jan@x.cz")], IngestSource::CsvUpload);
        let summary = pipeline.run(vec![payload("1", "jan@x.cz")], IngestSource::CsvUpload);
        assert_eq!(summary.imported, 0);
        assert_eq!(summary.duplicates, 1);
        assert_eq!(store.active_records().expect("list").len(), 1);
        let entries = AuditLedger::entries_for(&store, ApplicantId(1)).expect("entries");
        assert_eq!(entries.last().expect("entry").action, "Duplicate import attempt via CSV upload");
    }

    #[test]
    fn deleted_records_are_restored_not_recreated() {
        let store = InMemoryStore::new();
        let pipeline = IngestionPipeline::new(&store, "operator");
        pipeline.run(vec![payload("1", "jan@x.cz")], IngestSource::CsvUpload);
        store.soft_delete(ApplicantId(1)).expect("delete");
        let summary = pipeline.run(vec![payload("1", "jan@x.cz")], IngestSource::CsvUpload);
        assert_eq!(summary.imported, 1);
        let record = store
            .fetch(ApplicantId(1))
            .expect("fetch")
            .expect("exists");
        assert!(!record.deleted);
        let entries = AuditLedger::entries_for(&store, ApplicantId(1)).expect("entries");
        assert_eq!(entries.last().expect("entry").action, "Restored via CSV upload");
    }

    #[test]
    fn missing_membership_id_lands_in_errors() {
        let store = InMemoryStore::new();
        let pipeline = IngestionPipeline::new(&store, "operator");
        let mut bad = payload("1", "jan@x.cz");
        bad.membership_id = None;
        let summary = pipeline.run(vec![bad], IngestSource::Mailbox);
        assert_eq!(summary.imported, 0);
        assert_eq!(summary.errors.len(), 1);
        assert!(summary.errors[0].contains("missing membership id"));
        assert!(store.active_records().expect("list").is_empty());
    }

    #[test]
    fn one_bad_payload_does_not_abort_the_batch() {
        let store = InMemoryStore::new();
        let pipeline = IngestionPipeline::new(&store, "operator");
        let mut bad = payload("2", "eva@x.cz");
        bad.membership_id = None;
        let summary = pipeline.run(
            vec![payload("1", "jan@x.cz"), bad, payload("3", "petr@x.cz")],
            IngestSource::CsvUpload,
        );
        assert_eq!(summary.imported, 2);
        assert_eq!(summary.errors.len(), 1);
    }
}
