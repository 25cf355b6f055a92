use std::sync::Arc;

use tokio::sync::watch;
use tokio::time::{interval, MissedTickBehavior};

use crate::core::state::AppState;
use crate::services::sync::{self, SnapshotSource};

/// Background refresh loop. Returns once `shutdown` flips to `true`.
pub(crate) async fn run_refresh_loop(
    state: AppState,
    source: Arc<dyn SnapshotSource>,
    mut shutdown: watch::Receiver<bool>,
) {
    let period = state.settings().sync().interval();
    let mut tick = interval(period);
    tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

    tracing::info!(
        source = %source.describe(),
        interval_seconds = period.as_secs(),
        "Registry refresh loop started"
    );

    loop {
        if *shutdown.borrow() {
            break;
        }

        tokio::select! {
            _ = shutdown.changed() => break,
            _ = tick.tick() => {
                if let Err(err) = sync::refresh_registry(&state, source.as_ref()).await {
                    tracing::error!(error = %format!("{err:#}"), "Registry refresh failed");
                }
            }
        }
    }

    tracing::info!("Registry refresh loop stopped");
}
