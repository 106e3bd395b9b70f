//! Background worker persisting click events.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_retry::Retry;
use tokio_retry::strategy::{ExponentialBackoff, jitter};
use tracing::{debug, info, warn};

use crate::domain::click_event::ClickEvent;
use crate::domain::repositories::LinkRepository;

/// Write attempts per click, including the first.
const MAX_ATTEMPTS: usize = 3;

/// Drains `rx` and records each click, retrying transient failures with
/// jittered exponential backoff. Clicks that still fail are dropped.
///
/// Returns when every sender has been dropped.
pub async fn run_click_worker(
    mut rx: mpsc::Receiver<ClickEvent>,
    repository: Arc<dyn LinkRepository>,
) {
    while let Some(event) = rx.recv().await {
        let click = event.into_new_click();
        let code = click.code.clone();

        let strategy = ExponentialBackoff::from_millis(10)
            .map(jitter)
            .take(MAX_ATTEMPTS - 1);

        let result = Retry::start(strategy, || {
            let repository = repository.clone();
            let click = click.clone();
            async move { repository.record_click(click).await }
        })
        .await;

        match result {
            Ok(()) => debug!(code = %code, "Click recorded"),
            Err(e) => warn!(code = %code, error = %e, "Dropping click after retries"),
        }
    }

    info!("Click worker stopped");
}
