use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ShareVisibility {
    Public,
    Private,
}

/// Symbolic expiry policy, resolved to an absolute timestamp at creation time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize, utoipa::ToSchema)]
pub enum ShareExpiry {
    #[serde(rename = "1h")]
    OneHour,
    #[serde(rename = "12h")]
    TwelveHours,
    #[serde(rename = "1d")]
    OneDay,
    #[serde(rename = "7d")]
    SevenDays,
    #[serde(rename = "30d")]
    ThirtyDays,
    #[serde(rename = "forever")]
    Forever,
}

impl ShareExpiry {
    /// Offset added to the creation timestamp. None means the link never expires.
    pub fn duration(&self) -> Option<Duration> {
        match self {
            ShareExpiry::OneHour => Some(Duration::hours(1)),
            ShareExpiry::TwelveHours => Some(Duration::hours(12)),
            ShareExpiry::OneDay => Some(Duration::days(1)),
            ShareExpiry::SevenDays => Some(Duration::days(7)),
            ShareExpiry::ThirtyDays => Some(Duration::days(30)),
            ShareExpiry::Forever => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize, utoipa::ToSchema)]
pub struct ShareLink {
    pub id: String,
    pub video_id: String,
    /// Public-facing identity; unguessable by construction.
    pub slug: String,
    pub visibility: ShareVisibility,
    pub expiry: ShareExpiry,
    /// None iff expiry is `forever`.
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub last_viewed_at: Option<DateTime<Utc>>,
    /// Non-null iff visibility is `private`.
    pub whitelisted_emails: Option<Vec<String>>,
    pub is_expired: bool,
}

impl ShareLink {
    /// Expiry as of `now`. The stored flag is fixed at creation, so readers
    /// derive the current state from `expires_at` instead of trusting it.
    pub fn expired_at(&self, now: DateTime<Utc>) -> bool {
        self.is_expired || self.expires_at.is_some_and(|t| t < now)
    }
}
