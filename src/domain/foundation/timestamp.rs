//! UTC points in time used for session activity and media history.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A UTC instant. Serialized as RFC 3339.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Out-of-range input maps to the Unix epoch.
    pub fn from_unix_secs(secs: u64) -> Self {
        let secs = i64::try_from(secs).unwrap_or(i64::MAX);
        Self(Utc.timestamp_opt(secs, 0).single().unwrap_or_default())
    }

    pub fn as_unix_secs(&self) -> u64 {
        u64::try_from(self.0.timestamp()).unwrap_or(0)
    }

    pub fn minus_secs(&self, secs: u64) -> Self {
        Self(self.0 - chrono::Duration::seconds(i64::try_from(secs).unwrap_or(i64::MAX)))
    }

    /// Time elapsed from `self` until `now`; `None` if `self` lies after `now`.
    pub fn elapsed_until(&self, now: &Timestamp) -> Option<Duration> {
        now.0.signed_duration_since(self.0).to_std().ok()
    }

    /// True when strictly more than `threshold` separates `self` from `now`.
    pub fn is_older_than(&self, threshold: Duration, now: &Timestamp) -> bool {
        self.elapsed_until(now)
            .map_or(false, |elapsed| elapsed > threshold)
    }
}

impl Default for Timestamp {
    fn default() -> Self {
        Self::now()
    }
}
