//! Client configuration.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::{SyncError, SyncResult};

/// How often the board is polled when nothing else triggers a sync.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(180);

/// Upper bound on a single request, enforced by the transport.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Configuration for a board client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Action endpoint of the server, e.g. `http://127.0.0.1:3000/`.
    pub base_url: String,
    /// Where the local cache, cursor and author name are kept.
    pub state_path: PathBuf,
    pub poll_interval: Duration,
    pub request_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:3000/".into(),
            state_path: "noticeboard-state.json".into(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

impl ClientConfig {
    /// Read `NOTICEBOARD_*` variables, falling back to defaults.
    pub fn from_env() -> SyncResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> SyncResult<Self> {
        let defaults = Self::default();

        let secs = |key: &str, fallback: Duration| -> SyncResult<Duration> {
            match lookup(key) {
                None => Ok(fallback),
                Some(v) => match v.trim().parse::<u64>() {
                    Ok(n) if n > 0 => Ok(Duration::from_secs(n)),
                    _ => Err(SyncError::Config(format!(
                        "{} must be a positive integer, got '{}'",
                        key, v
                    ))),
                },
            }
        };

        Ok(Self {
            base_url: lookup("NOTICEBOARD_URL").unwrap_or(defaults.base_url),
            state_path: lookup("NOTICEBOARD_STATE_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.state_path),
            poll_interval: secs("NOTICEBOARD_POLL_SECS", defaults.poll_interval)?,
            request_timeout: secs("NOTICEBOARD_TIMEOUT_SECS", defaults.request_timeout)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_nothing_set() {
        let config = ClientConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.poll_interval, Duration::from_secs(180));
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(config.base_url, "http://127.0.0.1:3000/");
    }

    #[test]
    fn overrides_are_applied() {
        let config = ClientConfig::from_lookup(lookup_from(&[
            ("NOTICEBOARD_URL", "http://board.local/"),
            ("NOTICEBOARD_POLL_SECS", "15"),
            ("NOTICEBOARD_STATE_PATH", "/tmp/state.json"),
        ]))
        .unwrap();
        assert_eq!(config.base_url, "http://board.local/");
        assert_eq!(config.poll_interval, Duration::from_secs(15));
        assert_eq!(config.state_path, PathBuf::from("/tmp/state.json"));
    }

    #[test]
    fn zero_or_garbage_interval_is_rejected() {
        for bad in ["0", "soon"] {
            let err = ClientConfig::from_lookup(lookup_from(&[("NOTICEBOARD_POLL_SECS", bad)]))
                .unwrap_err();
            assert!(matches!(err, SyncError::Config(_)));
        }
    }
}
