use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
    Extension,
};
use base64::{engine::general_purpose, Engine as _};
use chrono::{DateTime, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use rand::Rng;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::config::get_config;
use crate::entities::refresh_token::RefreshToken;
use crate::entities::user::{Role, User};
use crate::middleware::auth::{AuthUser, Claims};
use crate::store::SharedStore;

const ACCESS_TOKEN_TTL_SECS: usize = 900; // 15 minutes
const REFRESH_TOKEN_TTL_DAYS: i64 = 1;

#[derive(Deserialize, utoipa::ToSchema)]
pub struct LoginRequest {
    username: String,
    password: String,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct LoginResponse {
    access_token: String,
    refresh_token: String,
    expires_in: usize,
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct RefreshRequest {
    refresh_token: String,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct RefreshResponse {
    access_token: String,
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct LogoutRequest {
    refresh_token: String,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct LogoutResponse {
    message: String,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    error: String,
}

pub(crate) fn issue_access_token(user: &User) -> Result<String, jsonwebtoken::errors::Error> {
    let expiration = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_secs() as usize
        + ACCESS_TOKEN_TTL_SECS;

    let claims = Claims {
        sub: user.username.clone(),
        email: user.email.clone(),
        exp: expiration,
        role: user.role,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(get_config().jwt_secret.as_ref()),
    )
}

fn generate_refresh_token() -> String {
    let mut random_bytes = [0u8; 32];
    rand::thread_rng().fill(&mut random_bytes);
    general_purpose::STANDARD.encode(random_bytes)
}

pub(crate) fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 401, description = "Invalid credentials")
    ),
    tag = "Authentication"
)]
pub async fn login(
    State(store): State<SharedStore>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, StatusCode> {
    println!("Auth | POST /auth/login | user={}", payload.username);

    let users = store.users.read().await;
    let user = users
        .iter()
        .find(|u| u.username == payload.username)
        .ok_or(StatusCode::UNAUTHORIZED)?;

    if !user.verify_password(&payload.password) {
        println!("Auth | POST /auth/login | user={} | res=401", payload.username);
        return Err(StatusCode::UNAUTHORIZED);
    }

    let access_token = issue_access_token(user).map_err(|e| {
        eprintln!("Token encode error: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    let refresh_token_str = generate_refresh_token();
    let refresh_token = RefreshToken {
        id: Uuid::new_v4(),
        user_id: user.id,
        token_hash: hash_token(&refresh_token_str),
        expires_at: Utc::now() + chrono::Duration::days(REFRESH_TOKEN_TTL_DAYS),
        created_at: Utc::now(),
        revoked: false,
    };
    drop(users);
    store.refresh_tokens.write().await.push(refresh_token);

    Ok(Json(LoginResponse {
        access_token,
        refresh_token: refresh_token_str,
        expires_in: ACCESS_TOKEN_TTL_SECS,
    }))
}

#[utoipa::path(
    post,
    path = "/auth/refresh",
    request_body = RefreshRequest,
    responses(
        (status = 200, description = "Token refreshed successfully", body = RefreshResponse),
        (status = 401, description = "Invalid or expired refresh token", body = ErrorResponse)
    ),
    tag = "Authentication"
)]
pub async fn refresh(
    State(store): State<SharedStore>,
    Json(payload): Json<RefreshRequest>,
) -> Result<Json<RefreshResponse>, (StatusCode, Json<ErrorResponse>)> {
    let token_hash = hash_token(&payload.refresh_token);

    let tokens = store.refresh_tokens.read().await;
    let token = tokens
        .iter()
        .find(|t| t.token_hash == token_hash)
        .ok_or_else(|| {
            (
                StatusCode::UNAUTHORIZED,
                Json(ErrorResponse {
                    error: "Invalid refresh token. Please re-login.".to_string(),
                }),
            )
        })?;

    if token.revoked {
        return Err((
            StatusCode::UNAUTHORIZED,
            Json(ErrorResponse {
                error: "User logged out. Please re-login.".to_string(),
            }),
        ));
    }

    if token.expires_at < Utc::now() {
        return Err((
            StatusCode::UNAUTHORIZED,
            Json(ErrorResponse {
                error: "Refresh token expired. Please re-login.".to_string(),
            }),
        ));
    }

    let user_id = token.user_id;
    drop(tokens);

    let users = store.users.read().await;
    let user = users.iter().find(|u| u.id == user_id).ok_or_else(|| {
        (
            StatusCode::UNAUTHORIZED,
            Json(ErrorResponse {
                error: "User not found. Please re-login.".to_string(),
            }),
        )
    })?;

    let access_token = issue_access_token(user).map_err(|e| {
        eprintln!("Token encode error: {}", e);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: "Failed to generate token".to_string(),
            }),
        )
    })?;

    Ok(Json(RefreshResponse { access_token }))
}

#[utoipa::path(
    post,
    path = "/auth/logout",
    request_body = LogoutRequest,
    responses(
        (status = 200, description = "Logged out successfully", body = LogoutResponse),
        (status = 404, description = "Refresh token not found")
    ),
    tag = "Authentication"
)]
pub async fn logout(
    State(store): State<SharedStore>,
    Json(payload): Json<LogoutRequest>,
) -> Result<Json<LogoutResponse>, StatusCode> {
    let token_hash = hash_token(&payload.refresh_token);

    let mut tokens = store.refresh_tokens.write().await;
    let token = tokens
        .iter_mut()
        .find(|t| t.token_hash == token_hash)
        .ok_or(StatusCode::NOT_FOUND)?;

    token.revoked = true;
    println!("Auth | POST /auth/logout | token revoked");

    Ok(Json(LogoutResponse {
        message: "Logged out successfully".to_string(),
    }))
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct UserProfile {
    #[schema(value_type = String)]
    id: Uuid,
    username: String,
    email: String,
    role: Role,
    created_at: DateTime<Utc>,
}

#[utoipa::path(
    get,
    path = "/auth/me",
    responses(
        (status = 200, description = "User profile retrieved successfully", body = UserProfile),
        (status = 401, description = "Unauthorized - Invalid or missing token")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Authentication"
)]
pub async fn me(
    State(store): State<SharedStore>,
    Extension(auth_user): Extension<AuthUser>,
) -> Result<Json<UserProfile>, StatusCode> {
    let users = store.users.read().await;
    let user = users
        .iter()
        .find(|u| u.username == auth_user.username)
        .ok_or(StatusCode::UNAUTHORIZED)?;

    Ok(Json(UserProfile {
        id: user.id,
        username: user.username.clone(),
        email: user.email.clone(),
        role: user.role,
        created_at: user.created_at,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{header, HeaderMap, HeaderValue};

    use crate::middleware::auth::user_from_headers;

    #[test]
    fn refresh_token_hash_is_stable_hex() {
        let token = generate_refresh_token();
        let hash = hash_token(&token);
        assert_eq!(hash, hash_token(&token));
        assert_eq!(hash.len(), 64);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn access_token_roundtrips_through_bearer_header() {
        let user = User::new(
            "carol".to_string(),
            "carol@example.com".to_string(),
            "pw",
            Role::User,
        )
        .unwrap();
        let token = issue_access_token(&user).unwrap();

        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", token)).unwrap(),
        );

        let auth_user = user_from_headers(&headers).unwrap();
        assert_eq!(auth_user.username, "carol");
        assert_eq!(auth_user.email, "carol@example.com");
        assert_eq!(auth_user.role, Role::User);
    }

    #[test]
    fn garbage_bearer_token_is_rejected() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_static("Bearer not-a-jwt"),
        );
        assert!(user_from_headers(&headers).is_none());
    }
}
