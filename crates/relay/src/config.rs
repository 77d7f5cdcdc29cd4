// Relay server configuration.
//
// Centralizes environment variable parsing with defaults for local
// development.

use std::net::SocketAddr;

/// Core relay server configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Listen address (host:port).
    pub listen_addr: SocketAddr,
    /// Log filter directive (e.g. `info`, `lobby_relay=debug`).
    pub log_filter: String,
}

impl RelayConfig {
    /// Parse configuration from environment variables.
    ///
    /// | Variable | Default |
    /// |---|---|
    /// | `LOBBY_RELAY_HOST` | `0.0.0.0` |
    /// | `LOBBY_RELAY_PORT` (then `PORT`) | `4000` |
    /// | `LOBBY_RELAY_LOG_FILTER` | `info` |
    pub fn from_env() -> Self {
        Self::from_env_fn(|key| std::env::var(key))
    }

    /// Testable constructor that accepts an environment lookup function.
    fn from_env_fn<F>(env: F) -> Self
    where
        F: Fn(&str) -> Result<String, std::env::VarError>,
    {
        let host = env("LOBBY_RELAY_HOST").unwrap_or_else(|_| "0.0.0.0".into());
        // Hosted deployments commonly inject the bare PORT variable.
        let port: u16 = env("LOBBY_RELAY_PORT")
            .or_else(|_| env("PORT"))
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(4000);
        let listen_addr = format!("{host}:{port}")
            .parse()
            .unwrap_or_else(|_| SocketAddr::from(([0, 0, 0, 0], port)));

        let log_filter = env("LOBBY_RELAY_LOG_FILTER").unwrap_or_else(|_| "info".into());

        Self { listen_addr, log_filter }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_from_map(
        map: HashMap<&'static str, &'static str>,
    ) -> impl Fn(&str) -> Result<String, std::env::VarError> {
        move |key: &str| {
            map.get(key)
                .map(|v| v.to_string())
                .ok_or(std::env::VarError::NotPresent)
        }
    }

    #[test]
    fn defaults_when_no_env_vars() {
        let cfg = RelayConfig::from_env_fn(env_from_map(HashMap::new()));
        assert_eq!(cfg.listen_addr.port(), 4000);
        assert_eq!(cfg.listen_addr.ip().to_string(), "0.0.0.0");
        assert_eq!(cfg.log_filter, "info");
    }

    #[test]
    fn custom_port() {
        let mut m = HashMap::new();
        m.insert("LOBBY_RELAY_PORT", "9090");
        let cfg = RelayConfig::from_env_fn(env_from_map(m));
        assert_eq!(cfg.listen_addr.port(), 9090);
    }

    #[test]
    fn bare_port_variable_is_honored() {
        let mut m = HashMap::new();
        m.insert("PORT", "8123");
        let cfg = RelayConfig::from_env_fn(env_from_map(m));
        assert_eq!(cfg.listen_addr.port(), 8123);
    }

    #[test]
    fn prefixed_port_wins_over_bare_port() {
        let mut m = HashMap::new();
        m.insert("LOBBY_RELAY_PORT", "9090");
        m.insert("PORT", "8123");
        let cfg = RelayConfig::from_env_fn(env_from_map(m));
        assert_eq!(cfg.listen_addr.port(), 9090);
    }

    #[test]
    fn custom_host_and_port() {
        let mut m = HashMap::new();
        m.insert("LOBBY_RELAY_HOST", "127.0.0.1");
        m.insert("LOBBY_RELAY_PORT", "3000");
        let cfg = RelayConfig::from_env_fn(env_from_map(m));
        assert_eq!(cfg.listen_addr.to_string(), "127.0.0.1:3000");
    }

    #[test]
    fn invalid_port_uses_default() {
        let mut m = HashMap::new();
        m.insert("LOBBY_RELAY_PORT", "not_a_number");
        let cfg = RelayConfig::from_env_fn(env_from_map(m));
        assert_eq!(cfg.listen_addr.port(), 4000);
    }

    #[test]
    fn log_filter_override() {
        let mut m = HashMap::new();
        m.insert("LOBBY_RELAY_LOG_FILTER", "debug,tower=warn");
        let cfg = RelayConfig::from_env_fn(env_from_map(m));
        assert_eq!(cfg.log_filter, "debug,tower=warn");
    }
}
