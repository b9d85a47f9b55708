use std::collections::HashMap;
use std::sync::Arc;

use chrono::{Duration, Utc};
use tokio::sync::RwLock;
use tokio::task::JoinHandle;

use crate::config::get_config;
use crate::entities::refresh_token::RefreshToken;
use crate::entities::share_link::{ShareExpiry, ShareLink, ShareVisibility};
use crate::entities::user::{Role, User};
use crate::entities::video::{Video, VideoStatus};
use crate::services::notifier::ShareNotifier;

/// Shared handle passed to every handler as router state.
pub type SharedStore = Arc<Store>;

/// All application state. Collections live in memory for the lifetime of the
/// process and are seeded once at startup; there is no persistence layer.
pub struct Store {
    pub users: RwLock<Vec<User>>,
    pub refresh_tokens: RwLock<Vec<RefreshToken>>,
    pub videos: RwLock<Vec<Video>>,
    /// Share links keyed by owning video id, newest first within each entry.
    pub shares: RwLock<HashMap<String, Vec<ShareLink>>>,
    /// Ticker tasks for in-flight uploads; cancelling drops the handle.
    pub uploads: RwLock<HashMap<String, JoinHandle<()>>>,
    pub notifier: ShareNotifier,
}

impl Store {
    pub fn new(notifier: ShareNotifier) -> SharedStore {
        Arc::new(Self {
            users: RwLock::new(Vec::new()),
            refresh_tokens: RwLock::new(Vec::new()),
            videos: RwLock::new(Vec::new()),
            shares: RwLock::new(HashMap::new()),
            uploads: RwLock::new(HashMap::new()),
            notifier,
        })
    }

    /// Build the store and seed it with the initial admin account plus a set
    /// of sample videos and share links so the catalog renders immediately.
    pub async fn seed(notifier: ShareNotifier) -> SharedStore {
        let store = Self::new(notifier);
        let config = get_config();

        let admin = User::new(
            config.admin_username.clone(),
            format!("{}@localhost", config.admin_username),
            &config.admin_password,
            Role::Su,
        )
        .expect("failed to hash admin password");
        store.users.write().await.push(admin);

        let now = Utc::now();
        let videos = vec![
            Video {
                id: "video-1".to_string(),
                title: "Product Walkthrough".to_string(),
                description: "Full tour of the new editor features".to_string(),
                url: Some("/media/video-1.mp4".to_string()),
                thumbnail_url: Some("/media/thumbs/video-1.jpg".to_string()),
                created_at: now - Duration::days(12),
                updated_at: now - Duration::days(12),
                status: VideoStatus::Ready,
                progress: None,
                duration: Some(754),
                file_size: 268_435_456,
                format: Some("mp4".to_string()),
            },
            Video {
                id: "video-2".to_string(),
                title: "Team Standup Recording".to_string(),
                description: "Weekly sync, March planning".to_string(),
                url: Some("/media/video-2.webm".to_string()),
                thumbnail_url: None,
                created_at: now - Duration::days(5),
                updated_at: now - Duration::days(5),
                status: VideoStatus::Ready,
                progress: None,
                duration: Some(1821),
                file_size: 412_090_368,
                format: Some("webm".to_string()),
            },
            Video {
                id: "video-3".to_string(),
                title: "Launch Teaser".to_string(),
                description: "30 second cut for social".to_string(),
                url: Some("/media/video-3.mp4".to_string()),
                thumbnail_url: Some("/media/thumbs/video-3.jpg".to_string()),
                created_at: now - Duration::days(2),
                updated_at: now - Duration::days(1),
                status: VideoStatus::Processing,
                progress: None,
                duration: None,
                file_size: 52_428_800,
                format: Some("mp4".to_string()),
            },
            Video {
                id: "video-4".to_string(),
                title: "Conference Talk".to_string(),
                description: "Recorded session from the spring meetup".to_string(),
                url: Some("/media/video-4.mp4".to_string()),
                thumbnail_url: Some("/media/thumbs/video-4.jpg".to_string()),
                created_at: now - Duration::hours(8),
                updated_at: now - Duration::hours(8),
                status: VideoStatus::Ready,
                progress: None,
                duration: Some(2645),
                file_size: 487_587_840,
                format: Some("mp4".to_string()),
            },
        ];
        *store.videos.write().await = videos;

        let seeded_shares = vec![
            ShareLink {
                id: "share-1".to_string(),
                video_id: "video-1".to_string(),
                slug: "product-walkthrough-k3x91m".to_string(),
                visibility: ShareVisibility::Public,
                expiry: ShareExpiry::Forever,
                expires_at: None,
                created_at: now - Duration::days(10),
                last_viewed_at: Some(now - Duration::days(1)),
                whitelisted_emails: None,
                is_expired: false,
            },
            ShareLink {
                id: "share-2".to_string(),
                video_id: "video-1".to_string(),
                slug: "product-walkthrough-p7q24z".to_string(),
                visibility: ShareVisibility::Private,
                expiry: ShareExpiry::SevenDays,
                expires_at: Some(now - Duration::days(3) + Duration::days(7)),
                created_at: now - Duration::days(3),
                last_viewed_at: None,
                whitelisted_emails: Some(vec![
                    "reviewer@example.com".to_string(),
                    "qa@example.com".to_string(),
                ]),
                is_expired: false,
            },
        ];
        let mut shares = store.shares.write().await;
        for link in seeded_shares {
            // Prepend so each video's collection stays newest first
            shares
                .entry(link.video_id.clone())
                .or_default()
                .insert(0, link);
        }
        drop(shares);

        store
    }
}
