use std::time::Duration;
use chrono::{DateTime, Utc};

pub const DEFAULT_THRESHOLD_DAYS: i64 = 180;
pub const DEFAULT_CHECK_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KeyAge {
    pub age_days: f64,
    pub exceeds_threshold: bool,
}

/// Advisory check on how long the current signing key has been in service.
/// It only logs; issuance never waits on it.
#[derive(Debug, Clone)]
pub struct KeyAgeMonitor {
    key_pair_id: String,
    created_at: DateTime<Utc>,
    threshold_days: i64,
}

impl KeyAgeMonitor {
    pub fn new(key_pair_id: impl Into<String>, created_at: DateTime<Utc>, threshold_days: i64) -> Self {
        Self {
            key_pair_id: key_pair_id.into(),
            created_at,
            threshold_days,
        }
    }

    pub fn check(&self, now: DateTime<Utc>) -> KeyAge {
        let age_days = (now - self.created_at).num_seconds() as f64 / 86_400.0;
        KeyAge {
            age_days,
            exceeds_threshold: age_days > self.threshold_days as f64,
        }
    }

    /// Runs one check and logs the result.
    pub fn report(&self, now: DateTime<Utc>) -> KeyAge {
        let age = self.check(now);
        if age.exceeds_threshold {
            tracing::warn!(
                key_pair_id = %self.key_pair_id,
                age_days = age.age_days,
                threshold_days = self.threshold_days,
                "Signing key is older than the rotation threshold"
            );
        } else {
            tracing::info!(
                key_pair_id = %self.key_pair_id,
                age_days = age.age_days,
                "Signing key age check passed"
            );
        }
        age
    }

    /// Checks on a fixed interval until the task is dropped. The first check runs
    /// immediately.
    pub async fn run(self, interval: Duration) {
        self.run_with(interval, |_| {}).await
    }

    /// Like [`run`](Self::run), handing every result to `on_report`.
    pub async fn run_with(self, interval: Duration, mut on_report: impl FnMut(KeyAge) + Send + 'static) {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            on_report(self.report(Utc::now()));
        }
    }
}
