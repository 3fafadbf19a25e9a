//! Certificates API
//!
//! Authenticated certificate download plus the public verification endpoint
//! targeted by the QR code on the certificate itself.

use axum::{
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;

use crate::api::middleware::Authenticated;
use crate::error::PlatformError;
use crate::service::{CertificateService, VerificationProjection};

/// Certificates service state
#[derive(Clone)]
pub struct CertificatesState {
    pub certificate_service: Arc<CertificateService>,
}

/// Verification response DTO
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VerificationResponse {
    pub valid: bool,
    pub participant_name: String,
    pub participant_email: String,
    pub event_title: String,
    pub event_date: String,
    pub issued_at: String,
    pub certificate_id: String,
}

impl From<VerificationProjection> for VerificationResponse {
    fn from(v: VerificationProjection) -> Self {
        Self {
            valid: true,
            participant_name: v.participant_name,
            participant_email: v.participant_email,
            event_title: v.event_title,
            event_date: v.event_date.to_rfc3339(),
            issued_at: v.issued_at.to_rfc3339(),
            certificate_id: v.certificate_id,
        }
    }
}

/// Download the caller's certificate, generating it on first request
#[utoipa::path(
    get,
    path = "/{registrationId}",
    tag = "certificates",
    params(
        ("registrationId" = String, Path, description = "Registration ID")
    ),
    responses(
        (status = 200, description = "Certificate PDF"),
        (status = 400, description = "Attendance or template preconditions unmet"),
        (status = 403, description = "Not the owner, or certificates not enabled"),
        (status = 404, description = "Registration not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn download_certificate(
    State(state): State<CertificatesState>,
    auth: Authenticated,
    Path(registration_id): Path<String>,
) -> Result<Response, PlatformError> {
    let issued = state
        .certificate_service
        .ensure_certificate(&registration_id, &auth.0)
        .await?;

    // The ledger write committed before this read, so a client disconnect
    // mid-stream leaves valid state behind.
    let bytes = tokio::fs::read(&issued.artifact_path).await?;

    let headers = [
        (header::CONTENT_TYPE, "application/pdf".to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("inline; filename=\"{}\"", issued.file_name()),
        ),
    ];

    Ok((headers, bytes).into_response())
}

/// Publicly verify an issued certificate (QR-scan target)
#[utoipa::path(
    get,
    path = "/verify/{registrationId}",
    tag = "certificates",
    params(
        ("registrationId" = String, Path, description = "Registration ID")
    ),
    responses(
        (status = 200, description = "Certificate is valid", body = VerificationResponse),
        (status = 404, description = "Certificate not found or not issued")
    )
)]
pub async fn verify_certificate(
    State(state): State<CertificatesState>,
    Path(registration_id): Path<String>,
) -> Result<Json<VerificationResponse>, PlatformError> {
    let projection = state.certificate_service.verify(&registration_id).await?;
    Ok(Json(projection.into()))
}

/// Create certificates router
pub fn certificates_router(state: CertificatesState) -> Router {
    Router::new()
        .route("/verify/:registrationId", get(verify_certificate))
        .route("/:registrationId", get(download_certificate))
        .with_state(state)
}
