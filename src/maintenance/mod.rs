use tokio::time::{Duration, sleep};
use tracing::info;

use crate::session::SessionRegistry;

const SWEEP_INTERVAL_MINUTES: u64 = 15;

pub fn spawn(sessions: SessionRegistry) {
    tokio::spawn(async move {
        let interval = Duration::from_secs(SWEEP_INTERVAL_MINUTES * 60);
        loop {
            run_sweep_cycle(&sessions).await;
            sleep(interval).await;
        }
    });
}

async fn run_sweep_cycle(sessions: &SessionRegistry) -> usize {
    let purged = sessions.purge_expired().await;
    if purged > 0 {
        let remaining = sessions.len().await;
        info!(purged, remaining, "expired sessions removed");
    }
    purged
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn sweep_drops_only_expired_sessions() {
        let expired = SessionRegistry::new(chrono::Duration::seconds(-1));
        expired.open(None).await;
        expired.open(None).await;
        assert_eq!(run_sweep_cycle(&expired).await, 2);
        assert_eq!(expired.len().await, 0);

        let live = SessionRegistry::new(chrono::Duration::days(1));
        live.open(None).await;
        assert_eq!(run_sweep_cycle(&live).await, 0);
        assert_eq!(live.len().await, 1);
    }
}
