use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::get_config;
use crate::entities::share_link::{ShareExpiry, ShareLink, ShareVisibility};
use crate::entities::video::Video;
use crate::error::AppError;
use crate::middleware::auth::user_from_headers;
use crate::services::notifier::ShareNotification;
use crate::store::SharedStore;

const SLUG_SUFFIX_LEN: usize = 6;
const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateShareLinkRequest {
    pub visibility: ShareVisibility,
    pub expiry: ShareExpiry,
    pub whitelisted_emails: Option<Vec<String>>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct ShareLinkResponse {
    pub id: String,
    pub video_id: String,
    pub slug: String,
    /// Copy-to-clipboard payload: `<origin>/shared/<slug>`.
    pub url: String,
    pub visibility: ShareVisibility,
    pub expiry: ShareExpiry,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub last_viewed_at: Option<DateTime<Utc>>,
    pub whitelisted_emails: Option<Vec<String>>,
    pub is_expired: bool,
}

impl ShareLinkResponse {
    fn from_link(link: &ShareLink, now: DateTime<Utc>) -> Self {
        Self {
            id: link.id.clone(),
            video_id: link.video_id.clone(),
            slug: link.slug.clone(),
            url: share_url(&link.slug),
            visibility: link.visibility,
            expiry: link.expiry,
            expires_at: link.expires_at,
            created_at: link.created_at,
            last_viewed_at: link.last_viewed_at,
            whitelisted_emails: link.whitelisted_emails.clone(),
            is_expired: link.expired_at(now),
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct SharedVideoResponse {
    pub video: Video,
    pub visibility: ShareVisibility,
    pub expires_at: Option<DateTime<Utc>>,
}

fn share_url(slug: &str) -> String {
    let mut url = get_config().public_origin.clone();
    url.set_path(&format!("/shared/{}", slug));
    url.to_string()
}

/// Lowercase the title and collapse whitespace runs into single hyphens.
fn slugify(title: &str) -> String {
    title
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
}

fn random_slug_suffix() -> String {
    let mut rng = rand::thread_rng();
    (0..SLUG_SUFFIX_LEN)
        .map(|_| BASE36[rng.gen_range(0..BASE36.len())] as char)
        .collect()
}

/// Basic `local@domain.tld` shape check: no whitespace, a single `@` with a
/// non-empty local part, and a dot strictly inside the domain.
fn is_valid_email(addr: &str) -> bool {
    if addr.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = addr.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    domain
        .char_indices()
        .any(|(i, c)| c == '.' && i > 0 && i < domain.len() - 1)
}

/// Validate and de-duplicate a private link's whitelist, one entry at a time.
fn validate_whitelist(emails: &[String]) -> Result<Vec<String>, AppError> {
    let mut accepted: Vec<String> = Vec::with_capacity(emails.len());
    for email in emails {
        if !is_valid_email(email) {
            return Err(AppError::BadRequest(format!("Invalid email: {}", email)));
        }
        if !accepted.contains(email) {
            accepted.push(email.clone());
        }
    }
    Ok(accepted)
}

#[utoipa::path(
    post,
    path = "/videos/{id}/shares",
    params(
        ("id" = String, Path, description = "Video ID")
    ),
    request_body = CreateShareLinkRequest,
    responses(
        (status = 201, description = "Share link created", body = ShareLinkResponse),
        (status = 400, description = "Invalid whitelist email"),
        (status = 404, description = "Video not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Share Links"
)]
pub async fn create_share_link(
    State(store): State<SharedStore>,
    Path(video_id): Path<String>,
    Json(payload): Json<CreateShareLinkRequest>,
) -> Result<(StatusCode, Json<ShareLinkResponse>), AppError> {
    let videos = store.videos.read().await;
    let video = videos
        .iter()
        .find(|v| v.id == video_id)
        .ok_or_else(|| AppError::NotFound("Video not found".to_string()))?;
    let title = video.title.clone();
    drop(videos);

    // Whitelist only exists for private links, whatever the caller sent
    let whitelisted_emails = match payload.visibility {
        ShareVisibility::Private => {
            let emails = payload.whitelisted_emails.unwrap_or_default();
            Some(validate_whitelist(&emails)?)
        }
        ShareVisibility::Public => None,
    };

    let now = Utc::now();
    let link = ShareLink {
        id: format!("share-{}", now.timestamp_millis()),
        video_id: video_id.clone(),
        slug: format!("{}-{}", slugify(&title), random_slug_suffix()),
        visibility: payload.visibility,
        expiry: payload.expiry,
        expires_at: payload.expiry.duration().map(|offset| now + offset),
        created_at: now,
        last_viewed_at: None,
        whitelisted_emails,
        is_expired: false,
    };

    let response = ShareLinkResponse::from_link(&link, now);

    let mut shares = store.shares.write().await;
    shares
        .entry(video_id.clone())
        .or_default()
        .insert(0, link.clone());
    drop(shares);

    // One notification per private creation with a non-empty whitelist;
    // delivery belongs to the external collaborator behind the dispatcher
    if link.visibility == ShareVisibility::Private {
        if let Some(recipients) = &link.whitelisted_emails {
            if !recipients.is_empty() {
                store.notifier.dispatch(ShareNotification {
                    video_id: video_id.clone(),
                    slug: link.slug.clone(),
                    recipient_count: recipients.len(),
                });
            }
        }
    }

    println!(
        "Shares | POST /videos/{}/shares | slug={} | res=201",
        video_id, link.slug
    );
    Ok((StatusCode::CREATED, Json(response)))
}

#[utoipa::path(
    get,
    path = "/videos/{id}/shares",
    params(
        ("id" = String, Path, description = "Video ID")
    ),
    responses(
        (status = 200, description = "Share links for the video, newest first", body = [ShareLinkResponse]),
        (status = 404, description = "Video not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Share Links"
)]
pub async fn list_share_links(
    State(store): State<SharedStore>,
    Path(video_id): Path<String>,
) -> Result<Json<Vec<ShareLinkResponse>>, AppError> {
    let videos = store.videos.read().await;
    if !videos.iter().any(|v| v.id == video_id) {
        return Err(AppError::NotFound("Video not found".to_string()));
    }
    drop(videos);

    let now = Utc::now();
    let shares = store.shares.read().await;
    let links = shares
        .get(&video_id)
        .map(|links| {
            links
                .iter()
                .map(|link| ShareLinkResponse::from_link(link, now))
                .collect()
        })
        .unwrap_or_default();

    Ok(Json(links))
}

#[utoipa::path(
    delete,
    path = "/shares/{id}",
    params(
        ("id" = String, Path, description = "Share link ID")
    ),
    responses(
        (status = 200, description = "Share link removed (no-op when the ID is unknown)")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Share Links"
)]
pub async fn delete_share_link(
    State(store): State<SharedStore>,
    Path(link_id): Path<String>,
) -> Json<serde_json::Value> {
    let mut shares = store.shares.write().await;
    for links in shares.values_mut() {
        links.retain(|link| link.id != link_id);
    }
    drop(shares);

    println!("Shares | DELETE /shares/{} | res=200", link_id);
    Json(serde_json::json!({
        "message": "Share link deleted",
        "id": link_id
    }))
}

#[utoipa::path(
    get,
    path = "/shared/{slug}",
    params(
        ("slug" = String, Path, description = "Public share slug")
    ),
    responses(
        (status = 200, description = "Video behind the share link", body = SharedVideoResponse),
        (status = 401, description = "Private link requires authentication"),
        (status = 403, description = "Email not on the whitelist"),
        (status = 404, description = "Unknown or expired share link")
    ),
    tag = "Share Links"
)]
pub async fn resolve_shared(
    State(store): State<SharedStore>,
    headers: HeaderMap,
    Path(slug): Path<String>,
) -> Result<Json<SharedVideoResponse>, AppError> {
    let now = Utc::now();

    let mut shares = store.shares.write().await;
    let link = shares
        .values_mut()
        .flat_map(|links| links.iter_mut())
        .find(|link| link.slug == slug)
        .ok_or_else(|| AppError::NotFound("Share link not found".to_string()))?;

    if link.expired_at(now) {
        return Err(AppError::NotFound("Share link has expired".to_string()));
    }

    if let Some(whitelist) = &link.whitelisted_emails {
        let user = user_from_headers(&headers).ok_or_else(|| {
            AppError::Unauthorized("Authentication required for private links".to_string())
        })?;
        if !whitelist.iter().any(|email| email == &user.email) {
            return Err(AppError::Forbidden(
                "Email is not on the whitelist for this link".to_string(),
            ));
        }
    }

    link.last_viewed_at = Some(now);
    let video_id = link.video_id.clone();
    let visibility = link.visibility;
    let expires_at = link.expires_at;
    drop(shares);

    let videos = store.videos.read().await;
    let video = videos
        .iter()
        .find(|v| v.id == video_id)
        .ok_or_else(|| AppError::NotFound("Video not found".to_string()))?
        .clone();

    println!("Shares | GET /shared/{} | video={} | res=200", slug, video_id);
    Ok(Json(SharedVideoResponse {
        video,
        visibility,
        expires_at,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{header, HeaderValue};
    use chrono::Duration;

    use crate::entities::user::{Role, User};
    use crate::routes::auth::issue_access_token;
    use crate::services::notifier::ShareNotifier;
    use crate::store::{SharedStore, Store};

    async fn seeded_store() -> SharedStore {
        let (notifier, _rx) = ShareNotifier::new();
        Store::seed(notifier).await
    }

    fn public_request(expiry: ShareExpiry) -> CreateShareLinkRequest {
        CreateShareLinkRequest {
            visibility: ShareVisibility::Public,
            expiry,
            whitelisted_emails: None,
        }
    }

    #[test]
    fn slugify_lowercases_and_hyphenates() {
        assert_eq!(slugify("My Trip"), "my-trip");
        assert_eq!(slugify("Product   Walkthrough"), "product-walkthrough");
        assert_eq!(slugify("one\ttwo three"), "one-two-three");
        assert_eq!(slugify("already-slugged"), "already-slugged");
    }

    #[test]
    fn slug_suffix_is_six_base36_chars() {
        for _ in 0..50 {
            let suffix = random_slug_suffix();
            assert_eq!(suffix.len(), 6);
            assert!(suffix
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));
        }
    }

    #[test]
    fn email_shape_check() {
        assert!(is_valid_email("user@example.com"));
        assert!(is_valid_email("first.last@sub.example.co"));
        assert!(!is_valid_email("not-an-email"));
        assert!(!is_valid_email("user@nodot"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("user@.com"));
        assert!(!is_valid_email("user@example."));
        assert!(!is_valid_email("user name@example.com"));
        assert!(!is_valid_email("user@ex@ample.com"));
    }

    #[test]
    fn whitelist_rejects_bad_entries_and_drops_duplicates() {
        let err = validate_whitelist(&["ok@example.com".to_string(), "nope".to_string()]);
        assert!(matches!(err, Err(AppError::BadRequest(msg)) if msg == "Invalid email: nope"));

        let accepted = validate_whitelist(&[
            "a@example.com".to_string(),
            "b@example.com".to_string(),
            "a@example.com".to_string(),
        ])
        .unwrap();
        assert_eq!(accepted, vec!["a@example.com", "b@example.com"]);
    }

    #[tokio::test]
    async fn expiry_table_is_applied_at_creation() {
        let store = seeded_store().await;

        let (_, Json(link)) = create_share_link(
            State(store.clone()),
            Path("video-2".to_string()),
            Json(public_request(ShareExpiry::SevenDays)),
        )
        .await
        .unwrap();

        assert_eq!(link.expires_at.unwrap() - link.created_at, Duration::days(7));
        assert!(!link.is_expired);
        assert!(link.last_viewed_at.is_none());
        assert!(link.slug.starts_with("team-standup-recording-"));
        let suffix = link.slug.rsplit('-').next().unwrap();
        assert_eq!(suffix.len(), 6);

        let (_, Json(forever)) = create_share_link(
            State(store),
            Path("video-2".to_string()),
            Json(public_request(ShareExpiry::Forever)),
        )
        .await
        .unwrap();
        assert!(forever.expires_at.is_none());
    }

    #[tokio::test]
    async fn public_links_never_carry_a_whitelist() {
        let store = seeded_store().await;

        let (_, Json(link)) = create_share_link(
            State(store),
            Path("video-2".to_string()),
            Json(CreateShareLinkRequest {
                visibility: ShareVisibility::Public,
                expiry: ShareExpiry::OneDay,
                whitelisted_emails: Some(vec!["someone@example.com".to_string()]),
            }),
        )
        .await
        .unwrap();

        assert!(link.whitelisted_emails.is_none());
    }

    #[tokio::test]
    async fn invalid_whitelist_email_leaves_collection_unchanged() {
        let store = seeded_store().await;
        let before = store
            .shares
            .read()
            .await
            .get("video-2")
            .map_or(0, Vec::len);

        let result = create_share_link(
            State(store.clone()),
            Path("video-2".to_string()),
            Json(CreateShareLinkRequest {
                visibility: ShareVisibility::Private,
                expiry: ShareExpiry::OneHour,
                whitelisted_emails: Some(vec!["not-an-email".to_string()]),
            }),
        )
        .await;

        assert!(matches!(result, Err(AppError::BadRequest(_))));
        let after = store
            .shares
            .read()
            .await
            .get("video-2")
            .map_or(0, Vec::len);
        assert_eq!(before, after);
    }

    #[tokio::test]
    async fn creations_prepend_newest_first() {
        let store = seeded_store().await;

        let (_, Json(first)) = create_share_link(
            State(store.clone()),
            Path("video-4".to_string()),
            Json(public_request(ShareExpiry::OneHour)),
        )
        .await
        .unwrap();
        let (_, Json(second)) = create_share_link(
            State(store.clone()),
            Path("video-4".to_string()),
            Json(public_request(ShareExpiry::OneDay)),
        )
        .await
        .unwrap();

        let Json(links) = list_share_links(State(store), Path("video-4".to_string()))
            .await
            .unwrap();
        assert_eq!(links[0].slug, second.slug);
        assert_eq!(links[1].slug, first.slug);
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let store = seeded_store().await;
        let before = store.shares.read().await.get("video-1").unwrap().len();

        delete_share_link(State(store.clone()), Path("share-does-not-exist".to_string())).await;
        assert_eq!(
            store.shares.read().await.get("video-1").unwrap().len(),
            before
        );

        delete_share_link(State(store.clone()), Path("share-1".to_string())).await;
        let remaining = store.shares.read().await.get("video-1").unwrap().clone();
        assert_eq!(remaining.len(), before - 1);
        assert!(remaining.iter().all(|l| l.id != "share-1"));
    }

    #[tokio::test]
    async fn private_creation_dispatches_one_notification() {
        let (notifier, mut rx) = ShareNotifier::new();
        let store = Store::seed(notifier).await;

        create_share_link(
            State(store),
            Path("video-1".to_string()),
            Json(CreateShareLinkRequest {
                visibility: ShareVisibility::Private,
                expiry: ShareExpiry::ThirtyDays,
                whitelisted_emails: Some(vec![
                    "a@example.com".to_string(),
                    "b@example.com".to_string(),
                ]),
            }),
        )
        .await
        .unwrap();

        let event = rx.recv().await.unwrap();
        assert_eq!(event.recipient_count, 2);
        assert_eq!(event.video_id, "video-1");
        assert!(rx.try_recv().is_err(), "exactly one event per creation");
    }

    #[tokio::test]
    async fn resolving_a_public_slug_stamps_last_viewed() {
        let store = seeded_store().await;

        let Json(shared) = resolve_shared(
            State(store.clone()),
            HeaderMap::new(),
            Path("product-walkthrough-k3x91m".to_string()),
        )
        .await
        .unwrap();
        assert_eq!(shared.video.id, "video-1");

        let shares = store.shares.read().await;
        let link = shares["video-1"]
            .iter()
            .find(|l| l.slug == "product-walkthrough-k3x91m")
            .unwrap();
        assert!(link.last_viewed_at.is_some());
    }

    #[tokio::test]
    async fn expired_links_resolve_to_not_found() {
        let store = seeded_store().await;
        {
            let mut shares = store.shares.write().await;
            let link = shares
                .get_mut("video-1")
                .unwrap()
                .iter_mut()
                .find(|l| l.slug == "product-walkthrough-k3x91m")
                .unwrap();
            link.expires_at = Some(Utc::now() - Duration::minutes(1));
        }

        let result = resolve_shared(
            State(store),
            HeaderMap::new(),
            Path("product-walkthrough-k3x91m".to_string()),
        )
        .await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn private_links_enforce_the_whitelist() {
        let store = seeded_store().await;

        // Anonymous
        let anonymous = resolve_shared(
            State(store.clone()),
            HeaderMap::new(),
            Path("product-walkthrough-p7q24z".to_string()),
        )
        .await;
        assert!(matches!(anonymous, Err(AppError::Unauthorized(_))));

        // Authenticated but not whitelisted
        let outsider = User::new(
            "mallory".to_string(),
            "mallory@example.com".to_string(),
            "pw",
            Role::User,
        )
        .unwrap();
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", issue_access_token(&outsider).unwrap()))
                .unwrap(),
        );
        let denied = resolve_shared(
            State(store.clone()),
            headers,
            Path("product-walkthrough-p7q24z".to_string()),
        )
        .await;
        assert!(matches!(denied, Err(AppError::Forbidden(_))));

        // Whitelisted
        let reviewer = User::new(
            "reviewer".to_string(),
            "reviewer@example.com".to_string(),
            "pw",
            Role::User,
        )
        .unwrap();
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", issue_access_token(&reviewer).unwrap()))
                .unwrap(),
        );
        let allowed = resolve_shared(
            State(store),
            headers,
            Path("product-walkthrough-p7q24z".to_string()),
        )
        .await;
        assert!(allowed.is_ok());
    }
}
