//! API Layer
//!
//! REST API endpoints for the platform.

pub mod certificates;
pub mod common;
pub mod events;
pub mod middleware;
pub mod openapi;
pub mod registrations;
pub mod users;

pub use common::*;
pub use middleware::{AppState, Authenticated};
pub use openapi::ApiDoc;

pub use certificates::{certificates_router, CertificatesState};
pub use events::{events_router, EventsState};
pub use registrations::{registrations_router, RegistrationsState};
pub use users::{users_router, UsersState};
