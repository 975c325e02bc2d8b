//! Applicant intake: parsing, identity resolution, storage, and the
//! contact checks operators see on the detail view.

pub mod checker;
pub mod domain;
pub mod ingest;
pub mod memory;
pub mod normalize;
pub mod parser;
pub mod repository;
pub mod resolver;

#[cfg(test)]
mod tests;

pub use domain::{
    ApplicantId, ApplicantRecord, ApplicantUpdate, ApplicationStatus, AuditLogEntry, FieldChange,
    Gender, IngestSource, MatchDecision, NewApplicant, RawApplicantPayload,
};
pub use ingest::{IngestSummary, IngestionPipeline};
pub use memory::InMemoryStore;
pub use repository::{ApplicantStore, AuditLedger, RepositoryError};
