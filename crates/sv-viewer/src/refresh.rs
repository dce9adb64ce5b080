//! When the viewer swaps in a fresh token.

use chrono::{DateTime, Duration, Utc};

/// Floor on the refresh period so a misconfigured margin cannot make the
/// viewer hammer the issuance endpoint.
const MIN_PERIOD_SECS: i64 = 5;

/// Refresh timing for one token lifetime.
///
/// The viewer refreshes `margin` before expiry. When the margin is not
/// smaller than the lifetime, it refreshes at the half-life instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshSchedule {
    issued_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
    margin: Duration,
}

impl RefreshSchedule {
    pub fn new(issued_at: DateTime<Utc>, expires_at: DateTime<Utc>, margin_secs: u64) -> Self {
        Self {
            issued_at,
            expires_at,
            margin: Duration::seconds(margin_secs as i64),
        }
    }

    pub fn lifetime(&self) -> Duration {
        self.expires_at - self.issued_at
    }

    /// Seconds after issuance at which the refresh fires. Because tokens have
    /// a fixed TTL this is also the period between later refreshes.
    pub fn period_secs(&self) -> u64 {
        let life = self.lifetime().num_seconds();
        let margin = self.margin.num_seconds();
        let period = if margin > 0 && margin < life {
            life - margin
        } else {
            life / 2
        };
        period.max(MIN_PERIOD_SECS) as u64
    }

    pub fn refresh_at(&self) -> DateTime<Utc> {
        self.issued_at + Duration::seconds(self.period_secs() as i64)
    }
}
