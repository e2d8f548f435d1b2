use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, MissedTickBehavior};
use tracing::{debug, error, info};

use crate::db::TokenRepository;
use crate::error::Result;
use crate::metrics;

/// Background job that deletes expired access-token rows.
///
/// Expired tokens are already rejected at request time; the sweep only keeps
/// `access_tokens` from growing without bound.
#[derive(Clone)]
pub struct TokenCleanupJob {
    tokens: Arc<dyn TokenRepository>,
    interval: Duration,
}

impl TokenCleanupJob {
    pub fn new(tokens: Arc<dyn TokenRepository>, interval: Duration) -> Self {
        Self { tokens, interval }
    }

    /// Run until a shutdown message arrives or the sender is dropped.
    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        let start = tokio::time::Instant::now() + self.interval;
        let mut ticker = interval_at(start, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(
            "Token cleanup job started (interval: {}s)",
            self.interval.as_secs()
        );

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    // Errors are logged and retried on the next tick.
                    let _ = self.sweep_once().await;
                }
                _ = shutdown.recv() => {
                    info!("Token cleanup job stopping");
                    break;
                }
            }
        }
    }

    pub fn spawn(self, shutdown: broadcast::Receiver<()>) -> JoinHandle<()> {
        tokio::spawn(self.run(shutdown))
    }

    /// One sweep; returns how many rows were removed.
    pub async fn sweep_once(&self) -> Result<u64> {
        let started = Instant::now();

        match self.tokens.delete_expired(Utc::now()).await {
            Ok(removed) => {
                metrics::record_token_sweep("success", removed);
                if removed > 0 {
                    info!(
                        removed,
                        duration_ms = started.elapsed().as_millis() as u64,
                        "Expired access tokens removed"
                    );
                } else {
                    debug!("No expired access tokens");
                }
                Ok(removed)
            }
            Err(e) => {
                metrics::record_token_sweep("error", 0);
                error!(error = %e, "Token cleanup failed");
                Err(e)
            }
        }
    }
}
