//! Configuration types for the chat server.
//!
//! `ChatConfig` represents the `config.toml` in the data directory. Every
//! field has a default so an empty or partial file is valid.

use serde::{Deserialize, Serialize};

/// Top-level configuration for the chat server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Interface the HTTP server binds to.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port the HTTP server binds to.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Messages buffered per session before the session is dropped as too slow.
    #[serde(default = "default_outbound_capacity")]
    pub outbound_capacity: usize,

    /// Seconds without an inbound frame before a session is considered dead.
    /// `0` disables the check.
    #[serde(default)]
    pub idle_timeout_secs: u64,

    /// History page size when the client does not ask for one.
    #[serde(default = "default_history_page_size")]
    pub history_page_size: i64,

    /// Upper bound on a requested history page size.
    #[serde(default = "default_max_page_size")]
    pub max_page_size: i64,

    /// Pending history writes buffered before new ones are dropped.
    #[serde(default = "default_recorder_capacity")]
    pub recorder_capacity: usize,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_outbound_capacity() -> usize {
    256
}

fn default_history_page_size() -> i64 {
    50
}

fn default_max_page_size() -> i64 {
    500
}

fn default_recorder_capacity() -> usize {
    1024
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            outbound_capacity: default_outbound_capacity(),
            idle_timeout_secs: 0,
            history_page_size: default_history_page_size(),
            max_page_size: default_max_page_size(),
            recorder_capacity: default_recorder_capacity(),
        }
    }
}

impl ChatConfig {
    /// Idle timeout as a `Duration`, or `None` when disabled.
    pub fn idle_timeout(&self) -> Option<std::time::Duration> {
        (self.idle_timeout_secs > 0).then(|| std::time::Duration::from_secs(self.idle_timeout_secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_config_default_values() {
        let config = ChatConfig::default();
        assert_eq!(config.port, 8080);
        assert_eq!(config.outbound_capacity, 256);
        assert_eq!(config.idle_timeout_secs, 0);
        assert!(config.idle_timeout().is_none());
    }

    #[test]
    fn test_chat_config_deserialize_with_defaults() {
        let config: ChatConfig = toml::from_str("").unwrap();
        assert_eq!(config, ChatConfig::default());
    }

    #[test]
    fn test_chat_config_deserialize_with_values() {
        let toml_str = r#"
host = "0.0.0.0"
port = 9000
outbound_capacity = 16
idle_timeout_secs = 90
"#;
        let config: ChatConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 9000);
        assert_eq!(config.outbound_capacity, 16);
        assert_eq!(config.idle_timeout(), Some(std::time::Duration::from_secs(90)));
        assert_eq!(config.history_page_size, 50);
    }
}
