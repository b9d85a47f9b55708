pub mod auth;
pub mod home;
pub mod shares;
pub mod upload;
pub mod users;
pub mod videos;

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{delete, get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::middleware::auth::auth_middleware;
use crate::middleware::role::require_su;
use crate::store::SharedStore;

// Define the OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        // General endpoints
        home::root,
        // Authentication endpoints
        auth::login,
        auth::refresh,
        auth::logout,
        auth::me,
        // User management endpoints
        users::create_user,
        users::list_users,
        users::delete_user,
        // Video catalog
        videos::list_videos,
        videos::get_video,
        // Upload
        upload::upload_video,
        upload::upload_progress,
        upload::cancel_upload,
        // Share links
        shares::create_share_link,
        shares::list_share_links,
        shares::delete_share_link,
        shares::resolve_shared,
    ),
    components(
        schemas(
            // Home schemas
            home::RootResponse,
            // Auth schemas
            auth::LoginRequest,
            auth::LoginResponse,
            auth::RefreshRequest,
            auth::RefreshResponse,
            auth::LogoutRequest,
            auth::LogoutResponse,
            auth::ErrorResponse,
            auth::UserProfile,
            // User schemas
            users::CreateUserRequest,
            users::UserResponse,
            crate::entities::user::Role,
            // Video schemas
            crate::entities::video::Video,
            crate::entities::video::VideoStatus,
            upload::UploadProgressResponse,
            // Share schemas
            crate::entities::share_link::ShareVisibility,
            crate::entities::share_link::ShareExpiry,
            shares::CreateShareLinkRequest,
            shares::ShareLinkResponse,
            shares::SharedVideoResponse,
        )
    ),
    tags(
        (name = "General", description = "General API information"),
        (name = "Authentication", description = "Authentication endpoints for login, token refresh, and logout"),
        (name = "User Management", description = "User management endpoints (superuser access required)"),
        (name = "Videos", description = "Video catalog browsing, search and filtering"),
        (name = "Upload", description = "Simulated video upload with progress tracking"),
        (name = "Share Links", description = "Expiring, access-controlled share links for videos")
    ),
    info(
        title = "VideoShareKit API",
        version = "0.1.0",
        description = "A Rust/Axum service for video hosting and sharing with expiring, whitelisted share links",
    ),
    modifiers(&SecurityAddon)
)]
struct ApiDoc;

// Add security scheme for JWT Bearer tokens
struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.as_mut().unwrap();
        components.add_security_scheme(
            "bearer_auth",
            utoipa::openapi::security::SecurityScheme::Http(
                utoipa::openapi::security::Http::new(
                    utoipa::openapi::security::HttpAuthScheme::Bearer
                )
            ),
        );
    }
}

pub fn create_routes(store: SharedStore) -> Router {
    // Swagger UI (stateless)
    let swagger_router: Router = SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDoc::openapi())
        .into();

    // Protected routes that require auth
    let protected_routes = Router::new()
        .route("/auth/me", get(auth::me))
        .route("/videos", get(videos::list_videos))
        .route("/videos/{id}", get(videos::get_video))
        .route(
            "/videos/{id}/shares",
            post(shares::create_share_link).get(shares::list_share_links),
        )
        .route("/shares/{id}", delete(shares::delete_share_link))
        // The simulated transfer accepts files up to the 500 MiB ceiling, so
        // the framework body limit has to sit above it for our own size check
        // to be the one that answers
        .route(
            "/upload/video",
            post(upload::upload_video).layer(DefaultBodyLimit::max(1024 * 1024 * 1024)),
        )
        .route("/upload/{id}/progress", get(upload::upload_progress))
        .route("/upload/{id}", delete(upload::cancel_upload))
        .layer(middleware::from_fn(auth_middleware));

    // Su-only routes
    let su_routes = Router::new()
        .route("/users", post(users::create_user))
        .route("/users", get(users::list_users))
        .route("/users/{id}", delete(users::delete_user))
        .layer(middleware::from_fn(require_su))
        .layer(middleware::from_fn(auth_middleware));

    // Public routes (no auth required) and merge all together
    let app_routes = Router::new()
        .route("/", get(home::root))
        .route("/auth/login", post(auth::login))
        .route("/auth/refresh", post(auth::refresh))
        .route("/auth/logout", post(auth::logout))
        .route("/shared/{slug}", get(shares::resolve_shared))
        .merge(protected_routes)
        .merge(su_routes)
        .with_state(store);

    // Merge Swagger UI (which has no state) with the rest
    Router::new()
        .merge(swagger_router)
        .merge(app_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
}
