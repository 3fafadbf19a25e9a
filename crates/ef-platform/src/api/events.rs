//! Events API
//!
//! REST endpoints for event management, including the certificate settings
//! (enable toggle and template upload) that gate the issuance pipeline.

use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    routing::{get, post, put},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

use crate::api::common::{CreatedResponse, SuccessResponse};
use crate::api::middleware::Authenticated;
use crate::config::CertificateConfig;
use crate::domain::{Event, EventCategory, EventStatus};
use crate::error::PlatformError;
use crate::repository::{EventRepository, RegistrationRepository};
use crate::service::checks;

/// Uploaded templates are capped at 5 MB.
const MAX_TEMPLATE_BYTES: usize = 5 * 1024 * 1024;

/// Create event request
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateEventRequest {
    pub title: String,
    pub description: String,
    pub date: DateTime<Utc>,
    pub time: String,
    pub venue: String,
    pub capacity: u32,
    /// Category name, e.g. "Workshop"; defaults to "Other"
    #[serde(default)]
    pub category: Option<String>,
    /// "Draft" or "Published"; defaults to "Published"
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub banner: Option<String>,
}

/// Update event request
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEventRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub date: Option<DateTime<Utc>>,
    pub time: Option<String>,
    pub venue: Option<String>,
    pub capacity: Option<u32>,
    pub category: Option<String>,
    pub status: Option<String>,
    pub banner: Option<String>,
}

/// Certificate toggle request
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ToggleCertificateRequest {
    pub enabled: bool,
}

/// Event response DTO
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EventResponse {
    pub id: String,
    pub title: String,
    pub description: String,
    pub date: String,
    pub time: String,
    pub venue: String,
    pub capacity: u32,
    pub category: String,
    pub status: String,
    pub certificate_enabled: bool,
    pub certificate_template: Option<String>,
    pub banner: String,
    pub created_by: String,
    pub created_at: String,
}

impl From<Event> for EventResponse {
    fn from(e: Event) -> Self {
        Self {
            id: e.id,
            title: e.title,
            description: e.description,
            date: e.date.to_rfc3339(),
            time: e.time,
            venue: e.venue,
            capacity: e.capacity,
            category: e.category.as_str().to_string(),
            status: e.status.as_str().to_string(),
            certificate_enabled: e.certificate_enabled,
            certificate_template: e.certificate_template,
            banner: e.banner,
            created_by: e.created_by,
            created_at: e.created_at.to_rfc3339(),
        }
    }
}

/// Event with registration count (admin listing)
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EventWithCountResponse {
    #[serde(flatten)]
    pub event: EventResponse,
    pub registration_count: u64,
}

/// Template upload response
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TemplateUploadResponse {
    pub message: String,
    pub certificate_template: String,
}

/// Events service state
#[derive(Clone)]
pub struct EventsState {
    pub event_repo: Arc<EventRepository>,
    pub registration_repo: Arc<RegistrationRepository>,
    pub config: CertificateConfig,
}

fn parse_category(s: &str) -> Result<EventCategory, PlatformError> {
    EventCategory::parse(s).ok_or_else(|| PlatformError::validation(format!("Invalid category: {s}")))
}

fn parse_status(s: &str) -> Result<EventStatus, PlatformError> {
    EventStatus::parse(s).ok_or_else(|| PlatformError::validation(format!("Invalid status: {s}")))
}

/// Create a new event
#[utoipa::path(
    post,
    path = "",
    tag = "events",
    request_body = CreateEventRequest,
    responses(
        (status = 200, description = "Event created", body = CreatedResponse),
        (status = 400, description = "Validation error"),
        (status = 403, description = "Staff access required")
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_event(
    State(state): State<EventsState>,
    auth: Authenticated,
    Json(req): Json<CreateEventRequest>,
) -> Result<Json<CreatedResponse>, PlatformError> {
    checks::require_staff(&auth.0)?;

    if req.title.trim().is_empty() || req.description.trim().is_empty() || req.venue.trim().is_empty() {
        return Err(PlatformError::validation("All required fields must be filled"));
    }
    if req.capacity < 1 {
        return Err(PlatformError::validation("Capacity must be at least 1"));
    }

    let category = match req.category.as_deref() {
        Some(s) => parse_category(s)?,
        None => EventCategory::default(),
    };
    let status = match req.status.as_deref() {
        Some(s) => parse_status(s)?,
        None => EventStatus::default(),
    };

    // Certificate settings always start disabled; enabling is a separate,
    // admin-only action.
    let mut event = Event::new(
        req.title,
        req.description,
        req.date,
        req.time,
        req.venue,
        req.capacity,
        &auth.0.user_id,
    )
    .with_category(category)
    .with_status(status);

    if let Some(banner) = req.banner {
        event = event.with_banner(banner);
    }

    let id = event.id.clone();
    state.event_repo.insert(&event).await?;

    Ok(Json(CreatedResponse::new(id)))
}

/// List published events
#[utoipa::path(
    get,
    path = "",
    tag = "events",
    responses(
        (status = 200, description = "Published events", body = Vec<EventResponse>)
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_events(
    State(state): State<EventsState>,
    _auth: Authenticated,
) -> Result<Json<Vec<EventResponse>>, PlatformError> {
    let events = state.event_repo.find_published().await?;
    Ok(Json(events.into_iter().map(Into::into).collect()))
}

/// List all events with registration counts
#[utoipa::path(
    get,
    path = "/admin/with-count",
    tag = "events",
    responses(
        (status = 200, description = "Events with counts", body = Vec<EventWithCountResponse>),
        (status = 403, description = "Staff access required")
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_events_with_count(
    State(state): State<EventsState>,
    auth: Authenticated,
) -> Result<Json<Vec<EventWithCountResponse>>, PlatformError> {
    checks::require_staff(&auth.0)?;

    let events = state.event_repo.find_all().await?;
    let mut out = Vec::with_capacity(events.len());
    for event in events {
        let registration_count = state.registration_repo.count_by_event(&event.id).await?;
        out.push(EventWithCountResponse {
            event: event.into(),
            registration_count,
        });
    }

    Ok(Json(out))
}

/// Get event by ID
#[utoipa::path(
    get,
    path = "/{id}",
    tag = "events",
    params(("id" = String, Path, description = "Event ID")),
    responses(
        (status = 200, description = "Event found", body = EventResponse),
        (status = 404, description = "Event not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_event(
    State(state): State<EventsState>,
    _auth: Authenticated,
    Path(id): Path<String>,
) -> Result<Json<EventResponse>, PlatformError> {
    let event = state
        .event_repo
        .find_by_id(&id)
        .await?
        .ok_or_else(|| PlatformError::not_found("Event", &id))?;
    Ok(Json(event.into()))
}

/// Update event
#[utoipa::path(
    put,
    path = "/{id}",
    tag = "events",
    params(("id" = String, Path, description = "Event ID")),
    request_body = UpdateEventRequest,
    responses(
        (status = 200, description = "Event updated", body = EventResponse),
        (status = 403, description = "Not owner or admin"),
        (status = 404, description = "Event not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_event(
    State(state): State<EventsState>,
    auth: Authenticated,
    Path(id): Path<String>,
    Json(req): Json<UpdateEventRequest>,
) -> Result<Json<EventResponse>, PlatformError> {
    checks::require_staff(&auth.0)?;

    let mut event = state
        .event_repo
        .find_by_id(&id)
        .await?
        .ok_or_else(|| PlatformError::not_found("Event", &id))?;

    checks::require_admin_or_owner(&auth.0, &event.created_by)?;

    if let Some(title) = req.title {
        event.title = title;
    }
    if let Some(description) = req.description {
        event.description = description;
    }
    if let Some(date) = req.date {
        event.date = date;
    }
    if let Some(time) = req.time {
        event.time = time;
    }
    if let Some(venue) = req.venue {
        event.venue = venue;
    }
    if let Some(capacity) = req.capacity {
        if capacity < 1 {
            return Err(PlatformError::validation("Capacity must be at least 1"));
        }
        event.capacity = capacity;
    }
    if let Some(category) = req.category.as_deref() {
        event.category = parse_category(category)?;
    }
    if let Some(status) = req.status.as_deref() {
        event.status = parse_status(status)?;
    }
    if let Some(banner) = req.banner {
        event.banner = banner;
    }

    event.updated_at = Utc::now();
    state.event_repo.update(&event).await?;

    Ok(Json(event.into()))
}

/// Delete event
#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "events",
    params(("id" = String, Path, description = "Event ID")),
    responses(
        (status = 200, description = "Event deleted", body = SuccessResponse),
        (status = 404, description = "Event not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_event(
    State(state): State<EventsState>,
    auth: Authenticated,
    Path(id): Path<String>,
) -> Result<Json<SuccessResponse>, PlatformError> {
    checks::require_staff(&auth.0)?;

    let event = state
        .event_repo
        .find_by_id(&id)
        .await?
        .ok_or_else(|| PlatformError::not_found("Event", &id))?;

    checks::require_admin_or_owner(&auth.0, &event.created_by)?;

    state.event_repo.delete(&id).await?;
    Ok(Json(SuccessResponse::with_message("Event deleted successfully")))
}

/// Enable or disable certificates for an event
#[utoipa::path(
    put,
    path = "/{id}/certificate",
    tag = "events",
    params(("id" = String, Path, description = "Event ID")),
    request_body = ToggleCertificateRequest,
    responses(
        (status = 200, description = "Certificate setting updated", body = SuccessResponse),
        (status = 403, description = "Admin access required"),
        (status = 404, description = "Event not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn toggle_certificate(
    State(state): State<EventsState>,
    auth: Authenticated,
    Path(id): Path<String>,
    Json(req): Json<ToggleCertificateRequest>,
) -> Result<Json<SuccessResponse>, PlatformError> {
    checks::require_admin(&auth.0)?;

    let updated = state.event_repo.set_certificate_enabled(&id, req.enabled).await?;
    if !updated {
        return Err(PlatformError::not_found("Event", &id));
    }

    let verb = if req.enabled { "enabled" } else { "disabled" };
    Ok(Json(SuccessResponse::with_message(format!(
        "Certificate {verb} successfully"
    ))))
}

/// Upload a certificate template image for an event
#[utoipa::path(
    put,
    path = "/{id}/certificate-template",
    tag = "events",
    params(("id" = String, Path, description = "Event ID")),
    responses(
        (status = 200, description = "Template stored", body = TemplateUploadResponse),
        (status = 400, description = "Missing file or disallowed type"),
        (status = 403, description = "Not owner or admin"),
        (status = 404, description = "Event not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn upload_certificate_template(
    State(state): State<EventsState>,
    auth: Authenticated,
    Path(id): Path<String>,
    mut multipart: Multipart,
) -> Result<Json<TemplateUploadResponse>, PlatformError> {
    checks::require_staff(&auth.0)?;

    let event = state
        .event_repo
        .find_by_id(&id)
        .await?
        .ok_or_else(|| PlatformError::not_found("Event", &id))?;

    checks::require_admin_or_owner(&auth.0, &event.created_by)?;

    let mut stored: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| PlatformError::validation(format!("Invalid multipart body: {err}")))?
    {
        if field.name() != Some("certificate") {
            continue;
        }

        // The generator re-validates by extension later; this is the
        // upload-time MIME restriction.
        let extension = match field.content_type() {
            Some("image/png") => "png",
            Some("image/jpeg") => "jpg",
            _ => {
                return Err(PlatformError::validation(
                    "Only PNG or JPG images are allowed as certificate templates",
                ))
            }
        };

        let data = field
            .bytes()
            .await
            .map_err(|err| PlatformError::validation(format!("Upload failed: {err}")))?;
        if data.is_empty() {
            return Err(PlatformError::validation("Certificate template file is required"));
        }
        if data.len() > MAX_TEMPLATE_BYTES {
            return Err(PlatformError::validation("Certificate template exceeds 5MB limit"));
        }

        let file_name = format!(
            "certificate-{}-{}.{extension}",
            Utc::now().timestamp_millis(),
            rand::random::<u32>()
        );
        let dir = state.config.template_upload_dir();
        tokio::fs::create_dir_all(dir).await?;
        let path = dir.join(file_name);
        tokio::fs::write(&path, &data).await?;

        stored = Some(path.to_string_lossy().into_owned());
        break;
    }

    let template_path = stored
        .ok_or_else(|| PlatformError::validation("Certificate template file is required"))?;

    state.event_repo.set_certificate_template(&id, &template_path).await?;

    Ok(Json(TemplateUploadResponse {
        message: "Certificate template uploaded successfully".to_string(),
        certificate_template: template_path,
    }))
}

/// Create events router
pub fn events_router(state: EventsState) -> Router {
    Router::new()
        .route("/", post(create_event).get(list_events))
        .route("/admin/with-count", get(list_events_with_count))
        .route("/:id", get(get_event).put(update_event).delete(delete_event))
        .route("/:id/certificate", put(toggle_certificate))
        .route(
            "/:id/certificate-template",
            put(upload_certificate_template).layer(DefaultBodyLimit::max(MAX_TEMPLATE_BYTES + 64 * 1024)),
        )
        .with_state(state)
}
