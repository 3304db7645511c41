//! Server configuration
//!
//! Defaults mirror the historical deployment: stream on 4999, datagram on
//! 5000, remote invocation on 1099. An optional JSON file (TRIKV_CONFIG)
//! provides overrides, and individual TRIKV_* environment variables win
//! over both.

use serde::Deserialize;
use std::time::Duration;
use tracing::warn;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Stream (TCP) listener bind address
    pub stream_addr: String,

    /// Datagram (UDP) listener bind address
    pub datagram_addr: String,

    /// Remote invocation service bind address
    pub remote_addr: String,

    /// Upper bound on concurrently running worker tasks per listener
    pub max_workers: usize,

    /// How long shutdown waits for in-flight work before giving up
    pub drain_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            stream_addr: "127.0.0.1:4999".to_string(),
            datagram_addr: "127.0.0.1:5000".to_string(),
            remote_addr: "127.0.0.1:1099".to_string(),
            max_workers: num_cpus::get().max(1) * 16,
            drain_timeout_secs: 60,
        }
    }
}

impl ServerConfig {
    /// Build the effective configuration: file overrides, then environment
    pub fn load() -> Self {
        let mut config = match std::env::var("TRIKV_CONFIG") {
            Ok(path) => match Self::from_file(&path) {
                Ok(config) => config,
                Err(e) => {
                    warn!("Ignoring config file {}: {:#}", path, e);
                    ServerConfig::default()
                }
            },
            Err(_) => ServerConfig::default(),
        };
        config.apply_env();
        config
    }

    /// Parse a JSON config file; absent fields keep their defaults
    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    fn apply_env(&mut self) {
        if let Ok(addr) = std::env::var("TRIKV_STREAM_ADDR") {
            self.stream_addr = addr;
        }
        if let Ok(addr) = std::env::var("TRIKV_DATAGRAM_ADDR") {
            self.datagram_addr = addr;
        }
        if let Ok(addr) = std::env::var("TRIKV_REMOTE_ADDR") {
            self.remote_addr = addr;
        }
        if let Ok(value) = std::env::var("TRIKV_MAX_WORKERS") {
            match value.parse() {
                Ok(n) if n > 0 => self.max_workers = n,
                _ => warn!("Ignoring invalid TRIKV_MAX_WORKERS: {}", value),
            }
        }
        if let Ok(value) = std::env::var("TRIKV_DRAIN_TIMEOUT_SECS") {
            match value.parse() {
                Ok(n) => self.drain_timeout_secs = n,
                Err(_) => warn!("Ignoring invalid TRIKV_DRAIN_TIMEOUT_SECS: {}", value),
            }
        }
    }

    pub fn drain_timeout(&self) -> Duration {
        Duration::from_secs(self.drain_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_ports() {
        let config = ServerConfig::default();

        assert_eq!(config.stream_addr, "127.0.0.1:4999");
        assert_eq!(config.datagram_addr, "127.0.0.1:5000");
        assert_eq!(config.remote_addr, "127.0.0.1:1099");
        assert!(config.max_workers > 0);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config: ServerConfig =
            serde_json::from_str(r#"{"stream_addr": "0.0.0.0:9000"}"#).unwrap();

        assert_eq!(config.stream_addr, "0.0.0.0:9000");
        assert_eq!(config.datagram_addr, "127.0.0.1:5000");
        assert_eq!(config.drain_timeout_secs, 60);
    }
}
