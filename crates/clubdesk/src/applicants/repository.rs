use super::domain::{
    ApplicantId, ApplicantRecord, ApplicantUpdate, AuditLogEntry, FieldChange, NewApplicant,
    UpdateError,
};

/// Storage abstraction so the ingestion pipeline and the service layer can
/// be exercised against an in-memory store.
pub trait ApplicantStore: Send + Sync {
    fn insert(&self, draft: NewApplicant) -> Result<ApplicantRecord, RepositoryError>;
    fn fetch(&self, id: ApplicantId) -> Result<Option<ApplicantRecord>, RepositoryError>;
    fn apply_update(
        &self,
        id: ApplicantId,
        update: ApplicantUpdate,
    ) -> Result<FieldChange, RepositoryError>;
    fn soft_delete(&self, id: ApplicantId) -> Result<(), RepositoryError>;
    /// Clears the deleted flag; every other field keeps its pre-deletion
    /// value.
    fn restore(&self, id: ApplicantId) -> Result<(), RepositoryError>;
    /// Looks up by membership number, deleted records included.
    fn find_by_membership_id(
        &self,
        membership_id: &str,
    ) -> Result<Option<ApplicantRecord>, RepositoryError>;
    /// Looks up by the (email, first name, last name) identity triple,
    /// deleted records included.
    fn find_by_identity(
        &self,
        email: &str,
        first_name: &str,
        last_name: &str,
    ) -> Result<Option<ApplicantRecord>, RepositoryError>;
    fn active_records(&self) -> Result<Vec<ApplicantRecord>, RepositoryError>;
    fn mark_exported(&self, id: ApplicantId) -> Result<(), RepositoryError>;
}

/// Append-only history of operator-visible mutations.
pub trait AuditLedger: Send + Sync {
    fn append(&self, entry: AuditLogEntry) -> Result<(), RepositoryError>;
    fn entries_for(&self, id: ApplicantId) -> Result<Vec<AuditLogEntry>, RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
    #[error("invalid value: {0}")]
    Invalid(String),
}

impl From<UpdateError> for RepositoryError {
    fn from(err: UpdateError) -> Self {
        RepositoryError::Invalid(err.to_string())
    }
}
