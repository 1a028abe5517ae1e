//! Application configuration loaded from environment variables.

use std::env;
use std::net::IpAddr;
use std::path::PathBuf;

use floodgate_core::AdmissionConfig;

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub admission: AdmissionConfig,
    /// Expose `POST /api/admission/simulate`.
    pub simulation_enabled: bool,
    /// Global cap on simulation calls per second.
    pub simulation_per_second: u32,
    /// Append-only fallback for decision records.
    pub metrics_log_path: PathBuf,
    /// Capacity of the in-memory metrics sink when Redis is not configured.
    pub metrics_buffer_size: usize,
    /// Peers whose `Forwarded`/`X-Forwarded-For` headers name the client.
    /// Every other peer is keyed on its socket address.
    pub trusted_proxies: Vec<IpAddr>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            admission: AdmissionConfig::default(),
            simulation_enabled: false,
            simulation_per_second: 10,
            metrics_log_path: PathBuf::from("logs/admission-metrics.jsonl"),
            metrics_buffer_size: 10_000,
            trusted_proxies: Vec::new(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        Self {
            host: lookup("HOST").unwrap_or(defaults.host),
            port: lookup("PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),
            admission: AdmissionConfig::from_lookup(&lookup),
            simulation_enabled: lookup("SIMULATION_ENABLED")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(defaults.simulation_enabled),
            simulation_per_second: lookup("SIMULATION_MAX_PER_SECOND")
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.simulation_per_second),
            metrics_log_path: lookup("METRICS_LOG_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.metrics_log_path),
            metrics_buffer_size: lookup("METRICS_BUFFER_SIZE")
                .and_then(|s| s.parse().ok())
                .filter(|n| *n > 0)
                .unwrap_or(defaults.metrics_buffer_size),
            trusted_proxies: lookup("TRUSTED_PROXIES")
                .map(|list| parse_proxies(&list))
                .unwrap_or(defaults.trusted_proxies),
        }
    }
}

/// Comma-separated IP list; entries that do not parse are skipped with a warning.
fn parse_proxies(list: &str) -> Vec<IpAddr> {
    list.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .filter_map(|entry| match entry.parse() {
            Ok(ip) => Some(ip),
            Err(_) => {
                tracing::warn!(entry, "Ignoring unparseable TRUSTED_PROXIES entry");
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = AppConfig::from_lookup(lookup(&[]));

        assert_eq!(config.port, 8080);
        assert!(!config.simulation_enabled);
        assert_eq!(config.simulation_per_second, 10);
        assert_eq!(config.admission.max_requests, 100);
        assert!(config.trusted_proxies.is_empty());
    }

    #[test]
    fn test_reads_overrides() {
        let config = AppConfig::from_lookup(lookup(&[
            ("PORT", "9000"),
            ("SIMULATION_ENABLED", "true"),
            ("METRICS_BUFFER_SIZE", "0"),
            ("RATE_LIMIT_MAX_REQUESTS", "5"),
        ]));

        assert_eq!(config.port, 9000);
        assert!(config.simulation_enabled);
        assert_eq!(config.metrics_buffer_size, 10_000);
        assert_eq!(config.admission.max_requests, 5);
    }

    #[test]
    fn test_trusted_proxies_skip_garbage() {
        let config = AppConfig::from_lookup(lookup(&[(
            "TRUSTED_PROXIES",
            "10.0.0.1, not-an-ip,,::1",
        )]));

        let expected: Vec<IpAddr> = vec!["10.0.0.1".parse().unwrap(), "::1".parse().unwrap()];
        assert_eq!(config.trusted_proxies, expected);
    }
}
