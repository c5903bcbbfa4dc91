use std::time::Duration;
use tracing::{info, warn};

use verdant_api::AppState;

/// Background task that prunes abandoned upload parts.
///
/// Parts of a transfer that never completed stay on disk so the sender can
/// fill gaps; after `retention` without activity they are removed.
pub async fn run_cleanup_loop(state: AppState, retention: Duration, interval_secs: u64) {
    let mut interval = tokio::time::interval(Duration::from_secs(interval_secs));

    loop {
        interval.tick().await;

        match state.uploads.prune_stale(retention).await {
            Ok(count) => {
                if count > 0 {
                    info!("Cleanup: pruned {} stale upload parts", count);
                }
            }
            Err(e) => {
                warn!("Cleanup error: {}", e);
            }
        }
    }
}

