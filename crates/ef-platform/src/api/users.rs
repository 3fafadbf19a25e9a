//! Users Admin API
//!
//! User listing and role administration. Account creation and credentials
//! belong to the external auth service.

use axum::{
    extract::{Path, State},
    routing::{get, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

use crate::api::middleware::Authenticated;
use crate::domain::{Role, User};
use crate::error::PlatformError;
use crate::repository::UserRepository;
use crate::service::checks;

/// Update role request
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRoleRequest {
    /// One of "user", "manager", "admin"
    pub role: String,
}

/// User response DTO
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: String,
    pub created_at: String,
}

impl From<User> for UserResponse {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            name: u.name,
            email: u.email,
            role: u.role.as_str().to_string(),
            created_at: u.created_at.to_rfc3339(),
        }
    }
}

/// Users service state
#[derive(Clone)]
pub struct UsersState {
    pub user_repo: Arc<UserRepository>,
}

/// List all users
#[utoipa::path(
    get,
    path = "",
    tag = "users",
    responses(
        (status = 200, description = "All users", body = Vec<UserResponse>),
        (status = 403, description = "Admin access required")
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_users(
    State(state): State<UsersState>,
    auth: Authenticated,
) -> Result<Json<Vec<UserResponse>>, PlatformError> {
    checks::require_admin(&auth.0)?;

    let users = state.user_repo.find_all().await?;
    Ok(Json(users.into_iter().map(Into::into).collect()))
}

/// Update a user's role
#[utoipa::path(
    put,
    path = "/{id}/role",
    tag = "users",
    params(("id" = String, Path, description = "User ID")),
    request_body = UpdateRoleRequest,
    responses(
        (status = 200, description = "Role updated", body = UserResponse),
        (status = 400, description = "Invalid role"),
        (status = 403, description = "Admin access required"),
        (status = 404, description = "User not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_user_role(
    State(state): State<UsersState>,
    auth: Authenticated,
    Path(id): Path<String>,
    Json(req): Json<UpdateRoleRequest>,
) -> Result<Json<UserResponse>, PlatformError> {
    checks::require_admin(&auth.0)?;

    let role = Role::parse(&req.role)
        .ok_or_else(|| PlatformError::validation(format!("Invalid role: {}", req.role)))?;

    let mut user = state
        .user_repo
        .find_by_id(&id)
        .await?
        .ok_or_else(|| PlatformError::not_found("User", &id))?;

    state.user_repo.update_role(&id, role).await?;
    user.role = role;

    Ok(Json(user.into()))
}

/// Create users router
pub fn users_router(state: UsersState) -> Router {
    Router::new()
        .route("/", get(list_users))
        .route("/:id/role", put(update_user_role))
        .with_state(state)
}
