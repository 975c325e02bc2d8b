use crate::infra::{run_blocking, AppState, OPERATOR};
use axum::extract::Path;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use chrono::Local;
use clubdesk::applicants::checker::{check_duplicate_contact, is_suspect_parent_email, ContactDuplicates};
use clubdesk::applicants::normalize::{calculate_age, is_valid_phone};
use clubdesk::applicants::parser::{parse_csv, parse_message};
use clubdesk::applicants::repository::RepositoryError;
use clubdesk::applicants::{
    ApplicantId, ApplicantRecord, ApplicantStore, ApplicantUpdate, AuditLedger, AuditLogEntry,
    IngestSource, IngestSummary, IngestionPipeline, RawApplicantPayload,
};
use clubdesk::config::StoreTarget;
use clubdesk::error::AppError;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;

pub(crate) fn router() -> Router {
    Router::new()
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
        .route("/api/v1/import/preview", post(import_preview_endpoint))
        .route("/api/v1/import/confirm", post(import_confirm_endpoint))
        .route("/api/v1/fetch/preview", post(fetch_preview_endpoint))
        .route("/api/v1/fetch/confirm", post(fetch_confirm_endpoint))
        .route("/api/v1/applicants", get(list_applicants_endpoint))
        .route("/api/v1/applicants/:id", get(applicant_detail_endpoint))
        .route("/api/v1/applicants/:id/update", post(update_applicant_endpoint))
        .route("/api/v1/applicants/:id/delete", post(delete_applicant_endpoint))
        .route("/api/v1/applicants/:id/audit", get(audit_trail_endpoint))
        .route("/api/v1/applicants/:id/sync", get(sync_check_endpoint))
        .route("/api/v1/applicants/:id/sync/push", post(sync_push_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

#[derive(Debug, Deserialize)]
pub(crate) struct ImportRequest {
    pub(crate) csv: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct PreviewResponse {
    pub(crate) count: usize,
    pub(crate) applications: Vec<RawApplicantPayload>,
}

/// Parses the uploaded CSV without touching the store.
pub(crate) async fn import_preview_endpoint(
    Json(request): Json<ImportRequest>,
) -> Result<Json<PreviewResponse>, AppError> {
    let applications = parse_csv(&request.csv)?;
    Ok(Json(PreviewResponse {
        count: applications.len(),
        applications,
    }))
}

pub(crate) async fn import_confirm_endpoint(
    Extension(state): Extension<AppState>,
    Json(request): Json<ImportRequest>,
) -> Result<Json<IngestSummary>, AppError> {
    let payloads = parse_csv(&request.csv)?;
    let summary =
        IngestionPipeline::new(state.store.as_ref(), OPERATOR).run(payloads, IngestSource::CsvUpload);
    Ok(Json(summary))
}

/// Reads unread application mail with PEEK; repeatable.
pub(crate) async fn fetch_preview_endpoint(
    Extension(state): Extension<AppState>,
) -> Result<Json<PreviewResponse>, AppError> {
    let mailbox = state.mailbox.clone();
    let messages = run_blocking(move || mailbox.fetch_unread(false)).await??;
    let applications: Vec<RawApplicantPayload> = messages
        .iter()
        .map(|m| parse_message(&m.body, m.received_at))
        .collect();
    Ok(Json(PreviewResponse {
        count: applications.len(),
        applications,
    }))
}

/// Fetches and ingests unread application mail.
///
/// Messages are marked read only when the production store is the target,
/// so rehearsal runs against the test store leave the inbox intact.
pub(crate) async fn fetch_confirm_endpoint(
    Extension(state): Extension<AppState>,
) -> Result<Json<IngestSummary>, AppError> {
    let mark_as_read = state.config.target == StoreTarget::Production;
    let mailbox = state.mailbox.clone();
    let messages = run_blocking(move || mailbox.fetch_unread(mark_as_read)).await??;
    let payloads: Vec<RawApplicantPayload> = messages
        .iter()
        .map(|m| parse_message(&m.body, m.received_at))
        .collect();
    let summary =
        IngestionPipeline::new(state.store.as_ref(), OPERATOR).run(payloads, IngestSource::Mailbox);
    Ok(Json(summary))
}

pub(crate) async fn list_applicants_endpoint(
    Extension(state): Extension<AppState>,
) -> Result<Json<Vec<ApplicantRecord>>, AppError> {
    Ok(Json(state.store.active_records()?))
}

/// Alerts recomputed on every view; a dismissed flag suppresses its alert
/// until the underlying data changes again.
#[derive(Debug, Serialize)]
pub(crate) struct AlertFlags {
    pub(crate) suspect_parent_email: bool,
    pub(crate) invalid_phone: bool,
    pub(crate) duplicate_contacts: ContactDuplicates,
}

#[derive(Debug, Serialize)]
pub(crate) struct ApplicantDetail {
    #[serde(flatten)]
    pub(crate) record: ApplicantRecord,
    pub(crate) age: Option<i32>,
    pub(crate) alerts: AlertFlags,
}

pub(crate) async fn applicant_detail_endpoint(
    Extension(state): Extension<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<ApplicantDetail>, AppError> {
    let record = fetch_record(&state, ApplicantId(id))?;

    let duplicate_contacts = if record.duplicate_warning_dismissed {
        ContactDuplicates::default()
    } else {
        check_duplicate_contact(state.store.as_ref(), &record.email, &record.phone, record.id)?
    };

    let alerts = AlertFlags {
        suspect_parent_email: !record.parent_email_warning_dismissed
            && is_suspect_parent_email(&record),
        invalid_phone: !record.phone_warning_dismissed && !is_valid_phone(&record.phone),
        duplicate_contacts,
    };
    let age = calculate_age(&record.dob, Local::now().date_naive());

    Ok(Json(ApplicantDetail {
        record,
        age,
        alerts,
    }))
}

pub(crate) async fn update_applicant_endpoint(
    Extension(state): Extension<AppState>,
    Path(id): Path<u64>,
    Json(update): Json<ApplicantUpdate>,
) -> Result<Json<serde_json::Value>, AppError> {
    let id = ApplicantId(id);
    let change = state.store.apply_update(id, update)?;
    state.store.append(
        AuditLogEntry::new(id, format!("Updated {}", change.field), OPERATOR)
            .with_change(change.old_value, change.new_value),
    )?;
    Ok(Json(json!({ "success": true, "field": change.field })))
}

pub(crate) async fn delete_applicant_endpoint(
    Extension(state): Extension<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<serde_json::Value>, AppError> {
    let id = ApplicantId(id);
    state.store.soft_delete(id)?;
    state
        .store
        .append(AuditLogEntry::new(id, "Deleted", OPERATOR))?;
    Ok(Json(json!({ "success": true })))
}

pub(crate) async fn audit_trail_endpoint(
    Extension(state): Extension<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<Vec<AuditLogEntry>>, AppError> {
    Ok(Json(state.store.entries_for(ApplicantId(id))?))
}

/// Compares the record against the mailing list without writing anything.
/// List-side failures come back as a payload, not an error status, so the
/// operator sees what went wrong next to the record.
pub(crate) async fn sync_check_endpoint(
    Extension(state): Extension<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<serde_json::Value>, AppError> {
    let record = fetch_record(&state, ApplicantId(id))?;
    let sync = state.sync.clone();
    let outcome = run_blocking(move || sync.check(&record)).await?;

    Ok(Json(match outcome {
        Ok(diff) => json!({ "success": true, "diff": diff }),
        Err(err) => json!({ "success": false, "error": err.to_string() }),
    }))
}

pub(crate) async fn sync_push_endpoint(
    Extension(state): Extension<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<serde_json::Value>, AppError> {
    let id = ApplicantId(id);
    let record = fetch_record(&state, id)?;
    let list_id = state.config.ecomail.list_id(state.config.target).to_string();

    let sync = state.sync.clone();
    let push_list = list_id.clone();
    let outcome = run_blocking(move || sync.push(&record, &push_list)).await?;

    match outcome {
        Ok(_) => {
            state.store.mark_exported(id)?;
            state.store.append(AuditLogEntry::new(
                id,
                format!("Exported to mailing list {list_id}"),
                OPERATOR,
            ))?;
            info!(%id, list_id, "applicant pushed to mailing list");
            Ok(Json(json!({ "success": true, "list_id": list_id })))
        }
        Err(err) => Ok(Json(json!({ "success": false, "error": err.to_string() }))),
    }
}

fn fetch_record(state: &AppState, id: ApplicantId) -> Result<ApplicantRecord, AppError> {
    state
        .store
        .fetch(id)?
        .ok_or(AppError::Repository(RepositoryError::NotFound))
}
