use super::{AdminSessionStore, StateTokenStore};
use crate::metrics::update_token_gauges;
use std::time::Duration;
use tokio::{sync::watch, task::JoinHandle, time::MissedTickBehavior};
use tracing::{debug, info};

/// Periodically drop expired state tokens and admin sessions until the
/// shutdown channel fires.
pub fn spawn_token_sweeper(
    states: StateTokenStore,
    admin_sessions: AdminSessionStore,
    interval: Duration,
    mut shutdown_rx: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately.
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    sweep_once(&states, &admin_sessions);
                }
                _ = shutdown_rx.changed() => {
                    info!("Token sweeper stopping");
                    break;
                }
            }
        }
    })
}

/// One sweep pass; returns `(states_removed, sessions_removed)`.
pub fn sweep_once(states: &StateTokenStore, admin_sessions: &AdminSessionStore) -> (usize, usize) {
    let expired_states = states.purge_expired();
    let expired_sessions = admin_sessions.purge_expired();
    if expired_states > 0 || expired_sessions > 0 {
        debug!(expired_states, expired_sessions, "Purged expired tokens");
    }
    update_token_gauges(states.len(), admin_sessions.len());
    (expired_states, expired_sessions)
}
