use axum::{
    extract::Request,
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use crate::config::get_config;
use crate::entities::user::Role;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthUser {
    pub username: String,
    pub email: String,
    pub role: Role,
}

#[derive(Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub email: String,
    pub exp: usize,
    pub role: Role,
}

/// Decode a Bearer token from the given headers. Used by the middleware and
/// by handlers on public routes that only need an identity conditionally
/// (private share-link resolution).
pub fn user_from_headers(headers: &HeaderMap) -> Option<AuthUser> {
    let auth_header = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = auth_header.strip_prefix("Bearer ")?;

    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(get_config().jwt_secret.as_ref()),
        &Validation::default(),
    )
    .ok()?;

    Some(AuthUser {
        username: token_data.claims.sub,
        email: token_data.claims.email,
        role: token_data.claims.role,
    })
}

pub async fn auth_middleware(mut req: Request, next: Next) -> Result<Response, StatusCode> {
    let auth_user = user_from_headers(req.headers()).ok_or(StatusCode::UNAUTHORIZED)?;

    // Make the identity available to handlers downstream
    req.extensions_mut().insert(auth_user);

    Ok(next.run(req).await)
}
