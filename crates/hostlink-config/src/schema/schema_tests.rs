use super::*;

#[test]
fn test_config_default() {
    let config = Config::default();
    assert_eq!(config.server.host, "127.0.0.1");
    assert_eq!(config.server.port, 8090);
    assert_eq!(config.dispatch.max_pending, 10000);
    assert_eq!(config.shutdown.join_timeout_ms, 1000);
}

#[test]
fn test_connection_config_default() {
    let connection = ConnectionConfig::default();
    assert_eq!(connection.read_buffer_size, 8192);
    assert_eq!(connection.max_handshake_bytes, 8192);
}

#[test]
fn test_dispatch_tick_interval() {
    let dispatch = DispatchConfig {
        max_pending: 10,
        tick_interval_ms: 250,
    };
    assert_eq!(dispatch.tick_interval(), Duration::from_millis(250));
}

#[test]
fn test_shutdown_join_timeout() {
    let shutdown = ShutdownConfig::default();
    assert_eq!(shutdown.join_timeout(), Duration::from_secs(1));
}

#[test]
fn test_logging_config_default() {
    let logging = LoggingConfig::default();
    assert_eq!(logging.level, "info");
    assert!(logging.directory.is_none());
}

#[test]
fn test_partial_section_uses_field_defaults() {
    let config: Config = toml::from_str("[dispatch]\nmax_pending = 5\n").unwrap();
    assert_eq!(config.dispatch.max_pending, 5);
    assert_eq!(config.dispatch.tick_interval_ms, 16);
    assert_eq!(config.server.port, 8090);
}

#[test]
fn test_config_serialization_roundtrip_preserves_values() {
    let mut config = Config::default();
    config.server.port = 9100;
    config.logging.directory = Some("/var/log/hostlink".to_string());

    let text = toml::to_string(&config).unwrap();
    let parsed: Config = toml::from_str(&text).unwrap();
    assert_eq!(parsed.server.port, 9100);
    assert_eq!(parsed.logging.directory.as_deref(), Some("/var/log/hostlink"));
}
