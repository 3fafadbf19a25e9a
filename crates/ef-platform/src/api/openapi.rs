//! OpenAPI Document

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::api::{certificates, common, events, registrations, users};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "EventForge API",
        description = "Event management with certificate issuance and public verification"
    ),
    paths(
        events::create_event,
        events::list_events,
        events::list_events_with_count,
        events::get_event,
        events::update_event,
        events::delete_event,
        events::toggle_certificate,
        events::upload_certificate_template,
        registrations::register_for_event,
        registrations::my_registrations,
        registrations::registrations_by_event,
        registrations::mark_attendance,
        certificates::download_certificate,
        certificates::verify_certificate,
        users::list_users,
        users::update_user_role,
    ),
    components(schemas(
        common::ApiError,
        common::SuccessResponse,
        common::CreatedResponse,
        events::CreateEventRequest,
        events::UpdateEventRequest,
        events::ToggleCertificateRequest,
        events::EventResponse,
        events::EventWithCountResponse,
        events::TemplateUploadResponse,
        registrations::RegistrationResponse,
        registrations::RegisteredResponse,
        certificates::VerificationResponse,
        users::UpdateRoleRequest,
        users::UserResponse,
    )),
    tags(
        (name = "events", description = "Event management"),
        (name = "registrations", description = "Event registration and attendance"),
        (name = "certificates", description = "Certificate download and verification"),
        (name = "users", description = "User administration"),
    )
)]
pub struct ApiDoc;
