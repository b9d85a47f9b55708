use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum VideoStatus {
    Uploading,
    Processing,
    Ready,
    Error,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize, utoipa::ToSchema)]
pub struct Video {
    pub id: String,
    pub title: String,
    pub description: String,
    /// None until the transfer finishes; points at the local media path after.
    pub url: Option<String>,
    pub thumbnail_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub status: VideoStatus,
    /// Only meaningful while status is `uploading`.
    pub progress: Option<u8>,
    /// Seconds; only meaningful once status is `ready`.
    pub duration: Option<u32>,
    pub file_size: u64,
    pub format: Option<String>,
}
