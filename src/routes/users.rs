use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    Extension,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::user::{Role, User};
use crate::error::AppError;
use crate::middleware::auth::AuthUser;
use crate::store::SharedStore;

#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateUserRequest {
    username: String,
    email: String,
    password: String,
    role: Role,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct UserResponse {
    #[schema(value_type = String)]
    id: Uuid,
    username: String,
    email: String,
    role: Role,
    created_at: DateTime<Utc>,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        UserResponse {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            role: user.role,
            created_at: user.created_at,
        }
    }
}

#[utoipa::path(
    post,
    path = "/users",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User created successfully", body = UserResponse),
        (status = 409, description = "Username already exists"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "User Management"
)]
pub async fn create_user(
    State(store): State<SharedStore>,
    Extension(_auth_user): Extension<AuthUser>,
    Json(payload): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserResponse>), AppError> {
    println!("Users | POST /users | user={}", payload.username);

    let mut users = store.users.write().await;
    if users.iter().any(|u| u.username == payload.username) {
        return Err(AppError::Conflict("Username already exists".to_string()));
    }

    let user = User::new(payload.username, payload.email, &payload.password, payload.role)
        .map_err(|e| AppError::InternalServerError(format!("Password hash error: {}", e)))?;

    let response = UserResponse::from(&user);
    users.push(user);

    Ok((StatusCode::CREATED, Json(response)))
}

#[utoipa::path(
    get,
    path = "/users",
    responses(
        (status = 200, description = "List of all users", body = [UserResponse]),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "User Management"
)]
pub async fn list_users(
    State(store): State<SharedStore>,
    Extension(_auth_user): Extension<AuthUser>,
) -> Json<Vec<UserResponse>> {
    let users = store.users.read().await;
    Json(users.iter().map(UserResponse::from).collect())
}

#[utoipa::path(
    delete,
    path = "/users/{id}",
    params(
        ("id" = String, Path, description = "User ID to delete")
    ),
    responses(
        (status = 200, description = "User deleted successfully"),
        (status = 400, description = "Cannot delete yourself"),
        (status = 404, description = "User not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "User Management"
)]
pub async fn delete_user(
    State(store): State<SharedStore>,
    Extension(auth_user): Extension<AuthUser>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    println!("Users | DELETE /users/{}", user_id);

    let mut users = store.users.write().await;
    let user = users
        .iter()
        .find(|u| u.id == user_id)
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    // Prevent su from deleting themselves
    if user.username == auth_user.username {
        return Err(AppError::BadRequest("Cannot delete yourself".to_string()));
    }

    users.retain(|u| u.id != user_id);
    drop(users);

    // Their sessions go with them
    store
        .refresh_tokens
        .write()
        .await
        .retain(|t| t.user_id != user_id);

    Ok(Json(serde_json::json!({
        "message": "User deleted successfully"
    })))
}
