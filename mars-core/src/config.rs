//! # Configuration
//!
//! A minimal string key/value store. Crates layered on top (the job client,
//! the demo binary) read typed settings out of a [`MarsConfigSnapshot`].
//!
//! ```rust
//! use mars_core::MarsConfig;
//!
//! let mut config = MarsConfig::new();
//! config.set("asynch.slow_poll_ms", "9000");
//!
//! let snapshot = config.snapshot();
//! assert_eq!(snapshot.get_u64("asynch.slow_poll_ms"), Some(9000));
//! ```
//!
//! ## Environment overrides
//!
//! [`MarsConfig::load_env`] copies every variable starting with a prefix,
//! lower-casing the rest of the name and mapping `__` to `.`:
//!
//! ```bash
//! export MARS__ASYNCH__FAST_POLL_MS=1500   # -> asynch.fast_poll_ms
//! ```

use std::collections::HashMap;

#[derive(Debug, Default, Clone)]
pub struct MarsConfig {
    values: HashMap<String, String>,
}

impl MarsConfig {
    /// Create an empty config store.
    pub fn new() -> Self {
        Self {
            values: HashMap::new(),
        }
    }

    /// Set a configuration key to a string value.
    pub fn set<K, V>(&mut self, key: K, value: V)
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.values.insert(key.into(), value.into());
    }

    /// Get a configuration value by key.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(|s| s.as_str())
    }

    /// Check whether a key is present.
    pub fn has(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Merge `(name, value)` pairs whose name starts with `prefix`.
    ///
    /// Returns how many keys were set.
    pub fn load_vars<I>(&mut self, prefix: &str, vars: I) -> usize
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut loaded = 0;
        for (key, value) in vars {
            if let Some(stripped) = key.strip_prefix(prefix) {
                let normalized = stripped.to_lowercase().replace("__", ".");
                self.values.insert(normalized, value);
                loaded += 1;
            }
        }
        loaded
    }

    /// Merge process environment variables starting with `prefix`.
    pub fn load_env(&mut self, prefix: &str) -> usize {
        self.load_vars(prefix, std::env::vars())
    }

    pub fn snapshot(&self) -> MarsConfigSnapshot {
        MarsConfigSnapshot::new(self.values.clone())
    }
}

#[derive(Debug, Clone, Default)]
pub struct MarsConfigSnapshot {
    map: HashMap<String, String>,
}

impl MarsConfigSnapshot {
    pub(crate) fn new(map: HashMap<String, String>) -> Self {
        Self { map }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.map.get(key).map(|s| s.as_str())
    }

    pub fn get_string(&self, key: &str) -> Option<String> {
        self.map.get(key).cloned()
    }

    pub fn get_u64(&self, key: &str) -> Option<u64> {
        self.get(key).and_then(|v| v.trim().parse::<u64>().ok())
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(|v| v.trim().parse::<bool>().ok())
    }
}
