use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

/// Fired once per private share-link creation with a non-empty whitelist.
/// Actual delivery belongs to an external notification collaborator; this
/// service only dispatches the event.
#[derive(Clone, Debug, PartialEq)]
pub struct ShareNotification {
    pub video_id: String,
    pub slug: String,
    pub recipient_count: usize,
}

#[derive(Clone)]
pub struct ShareNotifier {
    tx: UnboundedSender<ShareNotification>,
}

impl ShareNotifier {
    pub fn new() -> (Self, UnboundedReceiver<ShareNotification>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    pub fn dispatch(&self, notification: ShareNotification) {
        if self.tx.send(notification).is_err() {
            eprintln!("Notify | dispatcher not running, event dropped");
        }
    }
}

/// Drains dispatched events. Stands in for the delivery collaborator; logs
/// each event the way the rest of the service logs request outcomes.
pub async fn run_dispatcher(mut rx: UnboundedReceiver<ShareNotification>) {
    while let Some(event) = rx.recv().await {
        println!(
            "Notify | share={} | video={} | recipients={}",
            event.slug, event.video_id, event.recipient_count
        );
    }
}
