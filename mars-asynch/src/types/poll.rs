use serde::{Deserialize, Serialize};
use std::fmt;

/// Poll cadence of the status loop
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PollRate {
    #[default]
    Slow,
    Fast,
}

impl fmt::Display for PollRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Slow => f.write_str("slow"),
            Self::Fast => f.write_str("fast"),
        }
    }
}

/// Point-in-time view of the poller's bookkeeping
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PollState {
    pub rate: PollRate,
    /// Jobs still waiting for a status message.
    pub pending_count: usize,
    /// Poll cycles left from the last `expect()`.
    pub expect_count: u32,
}

impl PollState {
    /// Whether the poller has anything to wait for.
    pub fn is_busy(&self) -> bool {
        self.pending_count > 0 || self.expect_count > 0
    }
}
