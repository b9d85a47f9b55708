use std::time::Duration;

use chrono::Utc;
use rand::Rng;
use tokio::task::JoinHandle;
use tokio::time::{interval, sleep};

use crate::entities::video::VideoStatus;
use crate::store::SharedStore;

/// Cadence of simulated progress updates.
const TICK_INTERVAL: Duration = Duration::from_millis(300);
/// Pause between hitting 100% and materializing the finished record.
const COMPLETION_DELAY: Duration = Duration::from_millis(500);

/// Spawn the progress ticker for a freshly accepted upload. One ticker per
/// upload; the caller tracks the handle so cancellation can abort it.
pub fn spawn_transfer(store: SharedStore, video_id: String) -> JoinHandle<()> {
    tokio::spawn(run_transfer(store, video_id))
}

async fn run_transfer(store: SharedStore, video_id: String) {
    let mut ticker = interval(TICK_INTERVAL);
    // interval fires immediately; consume that so the first advance lands
    // one full tick after the upload is accepted
    ticker.tick().await;

    loop {
        ticker.tick().await;
        match advance_progress(&store, &video_id).await {
            // Record gone, the upload was cancelled out from under us
            None => return,
            Some(progress) if progress >= 100 => break,
            Some(_) => {}
        }
    }

    sleep(COMPLETION_DELAY).await;
    finalize(&store, &video_id).await;
    store.uploads.write().await.remove(&video_id);
}

/// Advance by a random increment in [1,10], clamped at 100. Returns the new
/// progress, or None when the record no longer exists.
async fn advance_progress(store: &SharedStore, video_id: &str) -> Option<u8> {
    let mut videos = store.videos.write().await;
    let video = videos.iter_mut().find(|v| v.id == video_id)?;

    let increment = rand::thread_rng().gen_range(1..=10u8);
    let progress = (video.progress.unwrap_or(0) + increment).min(100);
    video.progress = Some(progress);
    video.updated_at = Utc::now();
    Some(progress)
}

/// The transfer is done: attach the local media URL and flip the record to
/// `processing`. Nothing in the service transitions it further to `ready`.
async fn finalize(store: &SharedStore, video_id: &str) {
    let mut videos = store.videos.write().await;
    let Some(video) = videos.iter_mut().find(|v| v.id == video_id) else {
        return;
    };

    let ext = video.format.clone().unwrap_or_else(|| "bin".to_string());
    video.url = Some(format!("/media/{}.{}", video.id, ext));
    video.status = VideoStatus::Processing;
    video.progress = Some(100);
    video.updated_at = Utc::now();

    println!(
        "Upload | simulation complete | video={} | title={}",
        video.id, video.title
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::video::Video;
    use crate::services::notifier::ShareNotifier;
    use crate::store::Store;

    fn uploading_video(id: &str) -> Video {
        Video {
            id: id.to_string(),
            title: "clip".to_string(),
            description: "Newly uploaded video".to_string(),
            url: None,
            thumbnail_url: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            status: VideoStatus::Uploading,
            progress: Some(0),
            duration: None,
            file_size: 1024,
            format: Some("mp4".to_string()),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn transfer_reaches_completion() {
        let (notifier, _rx) = ShareNotifier::new();
        let store = Store::new(notifier);
        store.videos.write().await.push(uploading_video("video-t1"));

        spawn_transfer(store.clone(), "video-t1".to_string())
            .await
            .unwrap();

        let videos = store.videos.read().await;
        let video = videos.iter().find(|v| v.id == "video-t1").unwrap();
        assert_eq!(video.status, VideoStatus::Processing);
        assert_eq!(video.progress, Some(100));
        assert_eq!(video.url.as_deref(), Some("/media/video-t1.mp4"));
    }

    #[tokio::test(start_paused = true)]
    async fn progress_is_monotonic_and_bounded() {
        let (notifier, _rx) = ShareNotifier::new();
        let store = Store::new(notifier);
        store.videos.write().await.push(uploading_video("video-t2"));

        let mut last = 0u8;
        let mut ticks = 0u32;
        while last < 100 {
            let progress = advance_progress(&store, "video-t2").await.unwrap();
            assert!(progress > last, "progress must strictly increase below 100");
            assert!(progress - last <= 10, "increment is at most 10");
            assert!(progress <= 100);
            last = progress;
            ticks += 1;
        }
        assert!(ticks <= 100, "worst case is one hundred +1 ticks");
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_transfer_stops_quietly() {
        let (notifier, _rx) = ShareNotifier::new();
        let store = Store::new(notifier);
        store.videos.write().await.push(uploading_video("video-t3"));

        let handle = spawn_transfer(store.clone(), "video-t3".to_string());
        // Discarding the record mid-flight makes the next tick bail out
        store.videos.write().await.retain(|v| v.id != "video-t3");
        handle.await.unwrap();

        assert!(store.videos.read().await.is_empty());
    }
}
