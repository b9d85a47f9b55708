use axum::{
    extract::{Multipart, Path, State},
    response::Json,
};
use chrono::Utc;
use serde::Serialize;

use crate::entities::video::{Video, VideoStatus};
use crate::error::AppError;
use crate::services::uploader;
use crate::store::SharedStore;

/// 500 MiB ceiling on simulated uploads.
pub const MAX_UPLOAD_BYTES: u64 = 524_288_000;

#[derive(Serialize, utoipa::ToSchema)]
pub struct UploadProgressResponse {
    pub id: String,
    pub progress: u8,
    pub status: VideoStatus,
}

// Helper to get file extension
fn get_extension(filename: &str) -> String {
    std::path::Path::new(filename)
        .extension()
        .and_then(std::ffi::OsStr::to_str)
        .unwrap_or("bin")
        .to_string()
}

// Helper to derive the title: filename with its extension stripped
fn title_from_filename(filename: &str) -> String {
    std::path::Path::new(filename)
        .file_stem()
        .and_then(std::ffi::OsStr::to_str)
        .unwrap_or(filename)
        .to_string()
}

pub(crate) fn validate_upload(content_type: &str, size: u64) -> Result<(), AppError> {
    if !content_type.starts_with("video/") {
        return Err(AppError::BadRequest("File is not a video".to_string()));
    }
    if size > MAX_UPLOAD_BYTES {
        return Err(AppError::BadRequest("Maximum file size is 500MB".to_string()));
    }
    Ok(())
}

#[utoipa::path(
    post,
    path = "/upload/video",
    tag = "Upload",
    request_body(content = Vec<u8>, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Upload accepted, simulated transfer started", body = Video),
        (status = 400, description = "Not a video file, or file too large"),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn upload_video(
    State(store): State<SharedStore>,
    mut multipart: Multipart,
) -> Result<Json<Video>, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| AppError::BadRequest("Invalid multipart data".to_string()))?
    {
        if field.name() == Some("file") {
            let filename = field.file_name().unwrap_or("unknown").to_string();
            let content_type = field
                .content_type()
                .unwrap_or("application/octet-stream")
                .to_string();
            let data = field
                .bytes()
                .await
                .map_err(|_| AppError::InternalServerError("Failed to read file bytes".to_string()))?;
            let size = data.len() as u64;

            // Reject before any record exists, so failures leave no state behind
            if let Err(e) = validate_upload(&content_type, size) {
                println!(
                    "Upload | POST /upload/video | file={} | res=400",
                    filename
                );
                return Err(e);
            }

            let now = Utc::now();
            let video = Video {
                id: format!("video-{}", now.timestamp_millis()),
                title: title_from_filename(&filename),
                description: "Newly uploaded video".to_string(),
                url: None,
                thumbnail_url: None,
                created_at: now,
                updated_at: now,
                status: VideoStatus::Uploading,
                progress: Some(0),
                duration: None,
                file_size: size,
                format: Some(get_extension(&filename)),
            };

            let video_id = video.id.clone();
            store.videos.write().await.push(video.clone());

            let handle = uploader::spawn_transfer(store.clone(), video_id.clone());
            store.uploads.write().await.insert(video_id.clone(), handle);

            println!(
                "Upload | POST /upload/video | file={} | video={} | res=200",
                filename, video_id
            );
            return Ok(Json(video));
        }
    }

    println!("Upload | POST /upload/video | res=400 | No file field found");
    Err(AppError::BadRequest("No file field found".to_string()))
}

#[utoipa::path(
    get,
    path = "/upload/{id}/progress",
    tag = "Upload",
    params(
        ("id" = String, Path, description = "Video ID")
    ),
    responses(
        (status = 200, description = "Current transfer progress", body = UploadProgressResponse),
        (status = 404, description = "Video not found")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn upload_progress(
    State(store): State<SharedStore>,
    Path(id): Path<String>,
) -> Result<Json<UploadProgressResponse>, AppError> {
    let videos = store.videos.read().await;
    let video = videos
        .iter()
        .find(|v| v.id == id)
        .ok_or_else(|| AppError::NotFound("Video not found".to_string()))?;

    Ok(Json(UploadProgressResponse {
        id: video.id.clone(),
        progress: video.progress.unwrap_or(0),
        status: video.status,
    }))
}

#[utoipa::path(
    delete,
    path = "/upload/{id}",
    tag = "Upload",
    params(
        ("id" = String, Path, description = "Video ID")
    ),
    responses(
        (status = 200, description = "Upload cancelled (no-op when nothing is in flight)")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn cancel_upload(
    State(store): State<SharedStore>,
    Path(id): Path<String>,
) -> Json<serde_json::Value> {
    // Stopping the ticker is the only cleanup obligation
    if let Some(handle) = store.uploads.write().await.remove(&id) {
        handle.abort();
    }

    // Nothing persists until completion: discard the in-flight record
    store
        .videos
        .write()
        .await
        .retain(|v| !(v.id == id && v.status == VideoStatus::Uploading));

    println!("Upload | DELETE /upload/{} | cancelled", id);
    Json(serde_json::json!({
        "message": "Upload cancelled",
        "id": id
    }))
}
