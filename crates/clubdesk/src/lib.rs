//! Core engine for club membership application intake.
//!
//! Applications arrive as free-text form mails or CSV exports, get parsed
//! into a common payload, resolved against the record store, and can be
//! pushed to the Ecomail mailing list one applicant at a time.

pub mod applicants;
pub mod config;
pub mod ecomail;
pub mod error;
pub mod mailbox;
pub mod telemetry;
