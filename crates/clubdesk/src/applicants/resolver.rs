//! Identity resolution for inbound payloads.
//!
//! Membership number is the primary key into the store; the
//! (email, first name, last name) triple is the fallback for rows that lost
//! their number somewhere between the form and the export.

use tracing::debug;

use super::domain::{MatchDecision, RawApplicantPayload};
use super::repository::{ApplicantStore, RepositoryError};

/// Decides what an incoming payload means relative to the current store.
pub fn resolve(
    payload: &RawApplicantPayload,
    store: &dyn ApplicantStore,
) -> Result<MatchDecision, RepositoryError> {
    let Some(membership_id) = payload
        .membership_id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
    else {
        let who = if payload.email.trim().is_empty() {
            format!("{} {}", payload.first_name, payload.last_name)
        } else {
            payload.email.trim().to_string()
        };
        return Ok(MatchDecision::Reject {
            reason: format!("missing membership id for {who}"),
        });
    };

    if let Some(existing) = store.find_by_membership_id(membership_id)? {
        debug!(membership_id, existing = %existing.id, deleted = existing.deleted, "membership id match");
        return Ok(if existing.deleted {
            MatchDecision::Restore { existing: existing.id }
        } else {
            MatchDecision::SkipDuplicate { existing: existing.id }
        });
    }

    if let Some(existing) =
        store.find_by_identity(&payload.email, &payload.first_name, &payload.last_name)?
    {
        debug!(existing = %existing.id, deleted = existing.deleted, "identity triple match");
        return Ok(if existing.deleted {
            MatchDecision::Restore { existing: existing.id }
        } else {
            MatchDecision::SkipDuplicate { existing: existing.id }
        });
    }

    Ok(MatchDecision::Create)
}
