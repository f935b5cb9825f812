//! # Orphan Sweeper
//!
//! Background task that expires idle sessions and deletes cart rows whose
//! session is gone, so abandoned carts stop holding stock.
//!
//! ```text
//! every sweep_interval:
//!   sessions.purge_expired()
//!   carts.stored_session_ids() − sessions.live_session_ids() → delete_carts
//!   prune idle lock entries
//! ```

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info};

use crate::service::CartService;

/// Spawns the sweep loop. The first sweep runs immediately.
///
/// Errors are logged and the loop keeps going; abort the handle to stop it.
pub fn spawn_sweeper(service: Arc<CartService>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(interval_secs = interval.as_secs(), "Orphan sweeper started");

        loop {
            ticker.tick().await;

            match service.sweep_orphans().await {
                Ok(report) if report.purged_sessions > 0 || report.deleted_carts > 0 => {
                    info!(
                        purged_sessions = report.purged_sessions,
                        deleted_carts = report.deleted_carts,
                        pruned_locks = report.pruned_locks,
                        "Swept orphaned carts"
                    );
                }
                Ok(_) => debug!("Sweep found nothing to remove"),
                Err(e) => error!(error = %e, "Orphan sweep failed"),
            }
        }
    })
}
