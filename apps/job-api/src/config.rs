use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;

/// Job API configuration, loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Interface the HTTP server binds to.
    pub host: IpAddr,
    /// Port the HTTP server binds to.
    pub port: u16,
    /// How often each connection re-checks the jobs it is watching.
    pub poll_interval: Duration,
    /// Upper bound for a simulated job's run time.
    pub job_max_duration: Duration,
    /// Completed jobs older than this are dropped. `None` keeps them forever.
    pub job_retention: Option<Duration>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 8080,
            poll_interval: Duration::from_millis(100),
            job_max_duration: Duration::from_secs(6),
            job_retention: None,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Every variable is optional; missing or unparsable values fall back to
    /// the defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let parsed = |name: &str| lookup(name).and_then(|v| v.trim().parse::<u64>().ok());

        Self {
            host: lookup("HOST")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.host),
            port: lookup("PORT")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.port),
            poll_interval: parsed("POLL_INTERVAL_MS")
                .filter(|ms| *ms > 0)
                .map(Duration::from_millis)
                .unwrap_or(defaults.poll_interval),
            job_max_duration: parsed("JOB_MAX_DURATION_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.job_max_duration),
            job_retention: parsed("JOB_RETENTION_SECS")
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config_from(vars: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn empty_environment_uses_defaults() {
        let config = config_from(&[]);
        assert_eq!(config.host, IpAddr::V4(Ipv4Addr::LOCALHOST));
        assert_eq!(config.port, 8080);
        assert_eq!(config.poll_interval, Duration::from_millis(100));
        assert_eq!(config.job_max_duration, Duration::from_secs(6));
        assert!(config.job_retention.is_none());
    }

    #[test]
    fn reads_all_variables() {
        let config = config_from(&[
            ("HOST", "0.0.0.0"),
            ("PORT", "9000"),
            ("POLL_INTERVAL_MS", "250"),
            ("JOB_MAX_DURATION_MS", "1500"),
            ("JOB_RETENTION_SECS", "3600"),
        ]);
        assert_eq!(config.host, IpAddr::V4(Ipv4Addr::UNSPECIFIED));
        assert_eq!(config.port, 9000);
        assert_eq!(config.poll_interval, Duration::from_millis(250));
        assert_eq!(config.job_max_duration, Duration::from_millis(1500));
        assert_eq!(config.job_retention, Some(Duration::from_secs(3600)));
    }

    #[test]
    fn invalid_values_fall_back() {
        let config = config_from(&[
            ("PORT", "not-a-port"),
            ("POLL_INTERVAL_MS", "0"),
            ("JOB_RETENTION_SECS", "0"),
        ]);
        assert_eq!(config.port, 8080);
        assert_eq!(config.poll_interval, Duration::from_millis(100));
        assert!(config.job_retention.is_none());
    }
}
