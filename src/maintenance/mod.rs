use anyhow::Result;
use tokio::time::{Duration as TokioDuration, sleep};
use tracing::{error, info};

use crate::web::AppState;

const CLEANUP_INTERVAL_MINUTES: u64 = 15;

pub fn spawn(state: AppState) {
    tokio::spawn(async move {
        let interval = TokioDuration::from_secs(CLEANUP_INTERVAL_MINUTES * 60);
        loop {
            if let Err(err) = run_cleanup_cycle(&state).await {
                error!(?err, "cleanup cycle failed");
            }
            sleep(interval).await;
        }
    });
}

async fn run_cleanup_cycle(state: &AppState) -> Result<()> {
    let images_removed = match state
        .images()
        .evict_older_than(state.config().image_cache_ttl)
        .await
    {
        Ok(removed) => removed,
        Err(err) => {
            error!(?err, "failed to evict cached images");
            0
        }
    };

    let sessions_removed = state.sessions().purge_expired().await?;

    if images_removed > 0 || sessions_removed > 0 {
        info!(images_removed, sessions_removed, "cleanup completed");
    }

    Ok(())
}
