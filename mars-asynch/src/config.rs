use std::time::Duration;

use anyhow::{bail, Context, Result};
use mars_core::MarsConfigSnapshot;

/// Longest time-to-live a job is held for; larger values are clamped.
pub const MAX_TIME_TO_LIVE: Duration = Duration::from_secs(30 * 365 * 24 * 60 * 60);

/// Configuration for the job client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AsynchConfig {
    /// Endpoint jobs are POSTed to
    pub job_endpoint: String,
    /// Endpoint polled for status messages
    pub status_endpoint: String,
    /// Poll interval while nothing is pending
    pub slow_poll: Duration,
    /// Poll interval while jobs are pending or activity is expected
    pub fast_poll: Duration,
    /// Time-to-live of a job submitted without an explicit one
    pub default_time_to_live: Duration,
    /// Poll cycles kept fast after `expect()`
    pub expect_lookahead: u32,
}

impl Default for AsynchConfig {
    fn default() -> Self {
        Self {
            job_endpoint: "process/initiateJob".to_string(),
            status_endpoint: "process/checkStatus".to_string(),
            slow_poll: Duration::from_millis(9000),
            fast_poll: Duration::from_millis(3000),
            default_time_to_live: Duration::from_secs(600),
            expect_lookahead: 5,
        }
    }
}

impl AsynchConfig {
    pub fn with_endpoints(
        mut self,
        job_endpoint: impl Into<String>,
        status_endpoint: impl Into<String>,
    ) -> Self {
        self.job_endpoint = job_endpoint.into();
        self.status_endpoint = status_endpoint.into();
        self
    }

    pub fn with_poll_intervals(mut self, slow_poll: Duration, fast_poll: Duration) -> Self {
        self.slow_poll = slow_poll;
        self.fast_poll = fast_poll;
        self
    }

    pub fn with_time_to_live(mut self, default_time_to_live: Duration) -> Self {
        self.default_time_to_live = default_time_to_live;
        self
    }

    /// Read `asynch.*` keys out of a config snapshot.
    ///
    /// Missing keys keep their defaults.
    pub fn from_snapshot(snapshot: &MarsConfigSnapshot) -> Result<Self> {
        let mut config = Self::default();

        if let Some(endpoint) = snapshot.get_string("asynch.job_endpoint") {
            config.job_endpoint = endpoint;
        }
        if let Some(endpoint) = snapshot.get_string("asynch.status_endpoint") {
            config.status_endpoint = endpoint;
        }
        if let Some(ms) = parse_u64(snapshot, "asynch.slow_poll_ms")? {
            config.slow_poll = Duration::from_millis(ms);
        }
        if let Some(ms) = parse_u64(snapshot, "asynch.fast_poll_ms")? {
            config.fast_poll = Duration::from_millis(ms);
        }
        if let Some(secs) = parse_u64(snapshot, "asynch.time_to_live_secs")? {
            let time_to_live = Duration::from_secs(secs);
            if time_to_live > MAX_TIME_TO_LIVE {
                bail!(
                    "asynch.time_to_live_secs out of range: {secs} (max {})",
                    MAX_TIME_TO_LIVE.as_secs()
                );
            }
            config.default_time_to_live = time_to_live;
        }
        if let Some(cycles) = parse_u64(snapshot, "asynch.expect_lookahead")? {
            config.expect_lookahead = u32::try_from(cycles)
                .with_context(|| format!("asynch.expect_lookahead out of range: {cycles}"))?;
        }

        Ok(config)
    }
}

fn parse_u64(snapshot: &MarsConfigSnapshot, key: &str) -> Result<Option<u64>> {
    snapshot
        .get(key)
        .map(|raw| {
            raw.trim()
                .parse::<u64>()
                .with_context(|| format!("invalid value for {key}: {raw:?}"))
        })
        .transpose()
}
