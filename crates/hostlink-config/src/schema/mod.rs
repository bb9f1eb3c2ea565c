//! Configuration schema definitions.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub connection: ConnectionConfig,

    #[serde(default)]
    pub dispatch: DispatchConfig,

    #[serde(default)]
    pub shutdown: ShutdownConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8090
}

/// Per-connection read settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// Initial capacity of the per-connection read buffer.
    #[serde(default = "default_read_buffer_size")]
    pub read_buffer_size: usize,

    /// Largest upgrade request accepted before the handshake is rejected.
    #[serde(default = "default_max_handshake_bytes")]
    pub max_handshake_bytes: usize,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            read_buffer_size: default_read_buffer_size(),
            max_handshake_bytes: default_max_handshake_bytes(),
        }
    }
}

fn default_read_buffer_size() -> usize {
    8192
}

fn default_max_handshake_bytes() -> usize {
    8192
}

/// Dispatch queue configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// Maximum number of queued requests awaiting the owning context.
    #[serde(default = "default_max_pending")]
    pub max_pending: usize,

    /// Tick cadence of the bundled owning-context driver, in milliseconds.
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            max_pending: default_max_pending(),
            tick_interval_ms: default_tick_interval_ms(),
        }
    }
}

impl DispatchConfig {
    /// Tick interval as a Duration.
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}

fn default_max_pending() -> usize {
    10000
}

fn default_tick_interval_ms() -> u64 {
    16
}

/// Shutdown configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShutdownConfig {
    /// How long `stop` waits for reader tasks before aborting them.
    #[serde(default = "default_join_timeout_ms")]
    pub join_timeout_ms: u64,
}

impl Default for ShutdownConfig {
    fn default() -> Self {
        Self {
            join_timeout_ms: default_join_timeout_ms(),
        }
    }
}

impl ShutdownConfig {
    /// Join timeout as a Duration.
    pub fn join_timeout(&self) -> Duration {
        Duration::from_millis(self.join_timeout_ms)
    }
}

fn default_join_timeout_ms() -> u64 {
    1000
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Directory for daily-rotated log files. Console only when unset.
    #[serde(default)]
    pub directory: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            directory: None,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

#[cfg(test)]
#[path = "schema_tests.rs"]
mod tests;
