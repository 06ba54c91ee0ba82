//! Server configuration from environment variables

use std::net::SocketAddr;

use anyhow::Context;

use crate::types::TICK_MS;

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 7878;
pub const DEFAULT_SEED: u32 = 1;
pub const DEFAULT_MAX_LINE_BYTES: usize = 4096;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    /// 0 binds an ephemeral port
    pub port: u16,
    /// Fixed step each connection's driver runs at
    pub tick_ms: u32,
    /// Connection `n` (1-based) plays with seed `seed + n`
    pub seed: u32,
    pub max_line_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            tick_ms: TICK_MS,
            seed: DEFAULT_SEED,
            max_line_bytes: DEFAULT_MAX_LINE_BYTES,
        }
    }
}

impl ServerConfig {
    /// Read `ARCADE_BLOCKS_*` variables, falling back to defaults for missing or
    /// unparsable values
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let host = lookup("ARCADE_BLOCKS_HOST")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or(defaults.host);
        let port = lookup("ARCADE_BLOCKS_PORT")
            .and_then(|s| s.trim().parse().ok())
            .unwrap_or(defaults.port);
        let tick_ms = lookup("ARCADE_BLOCKS_TICK_MS")
            .and_then(|s| s.trim().parse().ok())
            .filter(|&ms: &u32| ms > 0)
            .unwrap_or(defaults.tick_ms);
        let seed = lookup("ARCADE_BLOCKS_SEED")
            .and_then(|s| s.trim().parse().ok())
            .unwrap_or(defaults.seed);
        let max_line_bytes = lookup("ARCADE_BLOCKS_MAX_LINE")
            .and_then(|s| s.trim().parse().ok())
            .filter(|&n: &usize| n > 0)
            .unwrap_or(defaults.max_line_bytes);

        Self {
            host,
            port,
            tick_ms,
            seed,
            max_line_bytes,
        }
    }

    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("invalid bind address {}:{}", self.host, self.port))
    }

    /// Seed for the `client_id`-th connection
    pub fn seed_for(&self, client_id: u32) -> u32 {
        self.seed.wrapping_add(client_id)
    }
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
    fn test_defaults() {
        let config = ServerConfig::from_lookup(lookup(&[]));
        assert_eq!(config, ServerConfig::default());
        assert_eq!(config.port, 7878);
        assert_eq!(config.tick_ms, 16);
        assert_eq!(
            config.socket_addr().unwrap(),
            "127.0.0.1:7878".parse().unwrap()
        );
    }

    #[test]
    fn test_overrides() {
        let config = ServerConfig::from_lookup(lookup(&[
            ("ARCADE_BLOCKS_HOST", "0.0.0.0"),
            ("ARCADE_BLOCKS_PORT", "0"),
            ("ARCADE_BLOCKS_TICK_MS", "33"),
            ("ARCADE_BLOCKS_SEED", "99"),
            ("ARCADE_BLOCKS_MAX_LINE", "512"),
        ]));
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 0);
        assert_eq!(config.tick_ms, 33);
        assert_eq!(config.seed, 99);
        assert_eq!(config.max_line_bytes, 512);
        assert_eq!(config.seed_for(3), 102);
    }

    #[test]
    fn test_bad_values_fall_back() {
        let config = ServerConfig::from_lookup(lookup(&[
            ("ARCADE_BLOCKS_PORT", "seventy"),
            ("ARCADE_BLOCKS_TICK_MS", "0"),
            ("ARCADE_BLOCKS_HOST", "  "),
        ]));
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.tick_ms, TICK_MS);
        assert_eq!(config.host, DEFAULT_HOST);
    }

    #[test]
    fn test_invalid_host_is_an_error() {
        let config = ServerConfig {
            host: "not a host".to_string(),
            ..ServerConfig::default()
        };
        assert!(config.socket_addr().is_err());
    }

    #[test]
    fn test_seed_wraps() {
        let config = ServerConfig {
            seed: u32::MAX,
            ..ServerConfig::default()
        };
        assert_eq!(config.seed_for(1), 0);
    }
}
