//! Engine counters.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Message counters shared by the engine and its drain tasks.
#[derive(Debug)]
pub struct EngineStats {
    received: AtomicU64,
    sent: AtomicU64,
    failed: AtomicU64,
    started: Instant,
}

/// Point-in-time view of the counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatsReport {
    pub received: u64,
    pub sent: u64,
    pub failed: u64,
    pub active_sessions: usize,
    #[serde(rename = "uptime_secs", serialize_with = "as_secs")]
    pub uptime: Duration,
}

fn as_secs<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u64(d.as_secs())
}

impl EngineStats {
    pub fn new() -> Self {
        Self {
            received: AtomicU64::new(0),
            sent: AtomicU64::new(0),
            failed: AtomicU64::new(0),
            started: Instant::now(),
        }
    }

    pub fn record_received(&self) {
        self.received.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_sent(&self) {
        self.sent.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failed(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn report(&self, active_sessions: usize) -> StatsReport {
        StatsReport {
            received: self.received.load(Ordering::Relaxed),
            sent: self.sent.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            active_sessions,
            uptime: self.started.elapsed(),
        }
    }
}

impl Default for EngineStats {
    fn default() -> Self {
        Self::new()
    }
}
