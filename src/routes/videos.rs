use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;

use crate::entities::video::{Video, VideoStatus};
use crate::error::AppError;
use crate::pagination::PaginatedResponse;
use crate::store::SharedStore;

#[derive(Deserialize, utoipa::IntoParams)]
pub struct ListVideosQuery {
    /// Case-insensitive substring match on title and description.
    pub search: Option<String>,
    pub status: Option<VideoStatus>,
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

fn matches_search(video: &Video, needle: &str) -> bool {
    video.title.to_lowercase().contains(needle) || video.description.to_lowercase().contains(needle)
}

#[utoipa::path(
    get,
    path = "/videos",
    params(
        ListVideosQuery
    ),
    responses(
        (status = 200, description = "Paginated list of videos", body = PaginatedResponse<Video>),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Videos"
)]
pub async fn list_videos(
    State(store): State<SharedStore>,
    Query(query): Query<ListVideosQuery>,
) -> Json<PaginatedResponse<Video>> {
    let page = query.page.unwrap_or(1);
    let limit = query.limit.unwrap_or(10);
    let needle = query.search.as_deref().map(str::to_lowercase);

    let videos = store.videos.read().await;
    let mut filtered: Vec<Video> = videos
        .iter()
        .filter(|v| query.status.is_none_or(|s| v.status == s))
        .filter(|v| needle.as_deref().is_none_or(|n| matches_search(v, n)))
        .cloned()
        .collect();
    drop(videos);

    filtered.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    Json(PaginatedResponse::paginate(filtered, page, limit))
}

#[utoipa::path(
    get,
    path = "/videos/{id}",
    params(
        ("id" = String, Path, description = "Video ID")
    ),
    responses(
        (status = 200, description = "Video details", body = Video),
        (status = 404, description = "Video not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Videos"
)]
pub async fn get_video(
    State(store): State<SharedStore>,
    Path(id): Path<String>,
) -> Result<Json<Video>, AppError> {
    let videos = store.videos.read().await;
    let video = videos
        .iter()
        .find(|v| v.id == id)
        .ok_or_else(|| AppError::NotFound("Video not found".to_string()))?;

    Ok(Json(video.clone()))
}
