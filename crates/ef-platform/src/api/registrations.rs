//! Registrations API
//!
//! Sign-up, roster, and attendance endpoints. Attendance is the admin
//! action that makes a registration certificate-eligible; re-marking an
//! already-attended registration is rejected, and a fresh transition
//! invalidates any previously issued certificate.

use axum::{
    extract::{Path, State},
    routing::{get, post, put},
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;

use crate::api::middleware::Authenticated;
use crate::domain::Registration;
use crate::error::PlatformError;
use crate::repository::{EventRepository, RegistrationRepository};
use crate::service::checks;

/// Registration response DTO
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationResponse {
    pub id: String,
    pub user: String,
    pub event: String,
    pub status: String,
    pub certificate_generated: bool,
    pub certificate_path: Option<String>,
    pub certificate_issued_at: Option<String>,
    pub created_at: String,
}

impl From<Registration> for RegistrationResponse {
    fn from(r: Registration) -> Self {
        Self {
            id: r.id,
            user: r.user,
            event: r.event,
            status: r.status.as_str().to_string(),
            certificate_generated: r.certificate_generated,
            certificate_path: r.certificate_path,
            certificate_issued_at: r.certificate_issued_at.map(|t| t.to_rfc3339()),
            created_at: r.created_at.to_rfc3339(),
        }
    }
}

/// Registration creation response
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisteredResponse {
    pub message: String,
    pub registration: RegistrationResponse,
}

/// Registrations service state
#[derive(Clone)]
pub struct RegistrationsState {
    pub registration_repo: Arc<RegistrationRepository>,
    pub event_repo: Arc<EventRepository>,
}

/// Register the caller for an event
#[utoipa::path(
    post,
    path = "/{eventId}",
    tag = "registrations",
    params(("eventId" = String, Path, description = "Event ID")),
    responses(
        (status = 200, description = "Registered", body = RegisteredResponse),
        (status = 400, description = "Event full or already registered"),
        (status = 404, description = "Event not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn register_for_event(
    State(state): State<RegistrationsState>,
    auth: Authenticated,
    Path(event_id): Path<String>,
) -> Result<Json<RegisteredResponse>, PlatformError> {
    let event = state
        .event_repo
        .find_by_id(&event_id)
        .await?
        .ok_or_else(|| PlatformError::not_found("Event", &event_id))?;

    let count = state.registration_repo.count_by_event(&event_id).await?;
    if count >= event.capacity as u64 {
        return Err(PlatformError::invalid_state("Event is full"));
    }

    let registration = Registration::new(&auth.0.user_id, &event_id);

    // The unique (user, event) index decides races; the error maps to a
    // plain client error rather than a conflict.
    state
        .registration_repo
        .insert(&registration)
        .await
        .map_err(|err| match err {
            PlatformError::Duplicate { .. } => PlatformError::invalid_state("Already registered"),
            other => other,
        })?;

    Ok(Json(RegisteredResponse {
        message: "Registered successfully".to_string(),
        registration: registration.into(),
    }))
}

/// List the caller's registrations
#[utoipa::path(
    get,
    path = "/me",
    tag = "registrations",
    responses(
        (status = 200, description = "Caller's registrations", body = Vec<RegistrationResponse>)
    ),
    security(("bearer_auth" = []))
)]
pub async fn my_registrations(
    State(state): State<RegistrationsState>,
    auth: Authenticated,
) -> Result<Json<Vec<RegistrationResponse>>, PlatformError> {
    let registrations = state.registration_repo.find_by_user(&auth.0.user_id).await?;
    Ok(Json(registrations.into_iter().map(Into::into).collect()))
}

/// Event roster, oldest registrations first
#[utoipa::path(
    get,
    path = "/event/{eventId}",
    tag = "registrations",
    params(("eventId" = String, Path, description = "Event ID")),
    responses(
        (status = 200, description = "Registrations for the event", body = Vec<RegistrationResponse>),
        (status = 403, description = "Staff access required")
    ),
    security(("bearer_auth" = []))
)]
pub async fn registrations_by_event(
    State(state): State<RegistrationsState>,
    auth: Authenticated,
    Path(event_id): Path<String>,
) -> Result<Json<Vec<RegistrationResponse>>, PlatformError> {
    checks::require_staff(&auth.0)?;

    let registrations = state.registration_repo.find_by_event(&event_id).await?;
    Ok(Json(registrations.into_iter().map(Into::into).collect()))
}

/// Mark a registration as attended
#[utoipa::path(
    put,
    path = "/{registrationId}/attendance",
    tag = "registrations",
    params(("registrationId" = String, Path, description = "Registration ID")),
    responses(
        (status = 200, description = "Attendance marked", body = RegistrationResponse),
        (status = 400, description = "Already marked attended"),
        (status = 403, description = "Staff access required"),
        (status = 404, description = "Registration not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn mark_attendance(
    State(state): State<RegistrationsState>,
    auth: Authenticated,
    Path(registration_id): Path<String>,
) -> Result<Json<RegistrationResponse>, PlatformError> {
    checks::require_staff(&auth.0)?;

    let registration = state
        .registration_repo
        .find_by_id(&registration_id)
        .await?
        .ok_or_else(|| PlatformError::not_found("Registration", &registration_id))?;

    if registration.has_attended() {
        return Err(PlatformError::invalid_state("Already marked attended"));
    }

    // This also resets the issuance ledger, so a re-run of attendance after
    // repair or reconfiguration forces regeneration on next download.
    let updated = state
        .registration_repo
        .mark_attended(&registration_id)
        .await?
        .ok_or_else(|| PlatformError::not_found("Registration", &registration_id))?;

    Ok(Json(updated.into()))
}

/// Create registrations router
pub fn registrations_router(state: RegistrationsState) -> Router {
    Router::new()
        .route("/me", get(my_registrations))
        .route("/event/:eventId", get(registrations_by_event))
        .route("/:eventId", post(register_for_event))
        .route("/:registrationId/attendance", put(mark_attendance))
        .with_state(state)
}
