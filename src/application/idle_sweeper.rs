//! IdleSweeper - Background service evicting inactive sessions.
//!
//! ## Configuration
//!
//! | Setting | Default | Description |
//! |---------|---------|-------------|
//! | `interval` | 3600s | How often the registry is swept |
//! | `inactive_timeout` | 24h | Inactivity after which a session is evicted |
//!
//! ## Graceful Shutdown
//!
//! The service listens on a watch channel and stops at the next signal.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, info};

use super::engine::ConversationEngine;
use crate::domain::foundation::Timestamp;

/// Configuration for the IdleSweeper service.
#[derive(Debug, Clone)]
pub struct IdleSweeperConfig {
    /// How often to sweep.
    pub interval: Duration,

    /// Sessions idle for longer than this are evicted.
    pub inactive_timeout: Duration,
}

impl Default for IdleSweeperConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(3600),
            inactive_timeout: Duration::from_secs(24 * 3600),
        }
    }
}

impl IdleSweeperConfig {
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_inactive_timeout(mut self, timeout: Duration) -> Self {
        self.inactive_timeout = timeout;
        self
    }
}

/// Periodically evicts idle sessions from the engine.
pub struct IdleSweeper {
    engine: Arc<ConversationEngine>,
    config: IdleSweeperConfig,
}

impl IdleSweeper {
    pub fn new(engine: Arc<ConversationEngine>, config: IdleSweeperConfig) -> Self {
        Self { engine, config }
    }

    /// Run the sweep loop until shutdown signal is received.
    ///
    /// # Arguments
    ///
    /// * `shutdown` - Watch channel that signals when to stop
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        let mut interval = time::interval(self.config.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately.
        interval.tick().await;

        info!(
            interval_secs = self.config.interval.as_secs(),
            inactive_secs = self.config.inactive_timeout.as_secs(),
            "Idle sweeper started"
        );

        loop {
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        debug!("Idle sweeper stopping");
                        return;
                    }
                }

                _ = interval.tick() => {
                    self.sweep_once().await;
                }
            }
        }
    }

    /// Runs exactly one sweep and returns the number of evicted sessions.
    pub async fn sweep_once(&self) -> usize {
        self.engine
            .evict_idle(Timestamp::now(), self.config.inactive_timeout)
            .await
            .len()
    }
}
