//! Background purge of idle sessions.

use std::sync::Arc;
use std::time::Duration;

use metrics::{counter, gauge};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::store::SessionStore;

/// Sweep `store` every `interval` until `cancel` fires.
///
/// The first sweep happens one interval after spawning.
pub fn spawn_sweeper(
    store: Arc<SessionStore>,
    interval: Duration,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + interval, interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                () = cancel.cancelled() => {
                    debug!("session sweeper stopped");
                    break;
                }
                _ = ticker.tick() => {
                    let removed = store.sweep_expired();
                    #[allow(clippy::cast_precision_loss)]
                    gauge!("sessions_active").set(store.len() as f64);
                    if removed > 0 {
                        counter!("sessions_swept_total").increment(removed as u64);
                        info!(removed, remaining = store.len(), "expired sessions swept");
                    }
                }
            }
        }
    })
}
