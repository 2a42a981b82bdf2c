use std::time::Duration;

/// Per-submission switches
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubmitOptions {
    /// Send the payload form-encoded instead of as JSON.
    pub url_encoded: bool,
    /// Resolve with the submission response body instead of waiting for a
    /// status message.
    pub no_wait: bool,
    /// How long to wait for a status message. `None` uses the client default.
    pub time_to_live: Option<Duration>,
}

impl SubmitOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn url_encoded(mut self, url_encoded: bool) -> Self {
        self.url_encoded = url_encoded;
        self
    }

    pub fn no_wait(mut self, no_wait: bool) -> Self {
        self.no_wait = no_wait;
        self
    }

    pub fn time_to_live(mut self, time_to_live: Duration) -> Self {
        self.time_to_live = Some(time_to_live);
        self
    }

    /// Shorthand for [`time_to_live`](Self::time_to_live) in whole seconds.
    pub fn time_to_live_secs(self, seconds: u64) -> Self {
        self.time_to_live(Duration::from_secs(seconds))
    }
}
