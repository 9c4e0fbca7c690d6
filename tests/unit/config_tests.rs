// Configuration module unit tests

use point_gateway::config::*;
use point_gateway::logging::LogFormat;
use std::io::Write;
use std::time::Duration;
use tempfile::NamedTempFile;

#[test]
fn test_can_deserialize_full_yaml_config() {
    let yaml = r#"
server:
  address: "127.0.0.1"
  port: 9000
  public_host: "points.example.com"
  advertise_url: "http://10.0.0.8:9000"
  keepalive_interval_secs: 15
store:
  redis_url: "redis://cache:6379"
  pool_key: "handlers"
  affinity_key: "sessions"
  routing_key_prefix: "frontend:"
  sentinel: "point-serve"
  connection_timeout_ms: 1000
  operation_timeout_ms: 500
cache:
  pool_ttl_ms: 2000
  pool_capacity: 4
  affinity_ttl_ms: 250
  affinity_capacity: 64
  cache_unknown_sessions: false
backend:
  request_timeout_ms: 10000
  read_timeout_ms: 60000
streaming:
  bind_address: "0.0.0.0"
  advertise_host: "gateway-1.internal"
  chunk_size: 16384
  accept_timeout_ms: 5000
  max_pending_bytes: 65536
logging:
  format: pretty
"#;
    let config = Config::from_yaml_with_env(yaml).expect("Failed to parse YAML");
    config.validate().expect("config should be valid");

    assert_eq!(config.server.port, 9000);
    assert_eq!(config.server.advertise_url(), "http://10.0.0.8:9000");
    assert_eq!(config.server.keepalive_interval(), Some(Duration::from_secs(15)));
    assert_eq!(config.store.pool_key, "handlers");
    assert_eq!(
        config.store.routing_key(&config.server.public_host),
        "frontend:points.example.com"
    );
    assert_eq!(config.cache.affinity_ttl(), Duration::from_millis(250));
    assert!(!config.cache.cache_unknown_sessions);
    assert_eq!(config.backend.read_timeout(), Some(Duration::from_secs(60)));
    assert_eq!(
        config.streaming.advertise_host.as_deref(),
        Some("gateway-1.internal")
    );
    assert_eq!(
        config.streaming.options().accept_timeout,
        Duration::from_secs(5)
    );
    assert_eq!(config.streaming.options().max_pending_bytes, 65536);
    assert_eq!(config.logging.format, LogFormat::Pretty);
}

#[test]
fn test_defaults_match_documented_values() {
    let config = Config::default();

    assert_eq!(config.server.port, 8080);
    assert_eq!(config.server.public_host, "localhost");
    assert_eq!(config.server.advertise_url(), "http://127.0.0.1:8080");
    assert_eq!(config.store.pool_key, "rh");
    assert_eq!(config.store.affinity_key, "affinity");
    assert_eq!(config.store.sentinel, "point-serve");
    assert_eq!(config.cache.pool_ttl(), Duration::from_secs(5));
    assert_eq!(config.cache.affinity_ttl(), Duration::from_secs(1));
    assert_eq!(config.cache.affinity_capacity, 1000);
    assert!(config.cache.cache_unknown_sessions);
    assert_eq!(config.backend.read_timeout(), None);
    assert_eq!(config.logging.format, LogFormat::Json);
}

#[test]
fn test_config_from_file_with_env_substitution() {
    std::env::set_var("POINT_GATEWAY_UNIT_PUBLIC_HOST", "edge.example.com");
    let mut temp_file = NamedTempFile::new().unwrap();
    temp_file
        .write_all(b"server:\n  public_host: \"${POINT_GATEWAY_UNIT_PUBLIC_HOST}\"\n")
        .unwrap();
    temp_file.flush().unwrap();

    let config = Config::from_file(temp_file.path()).unwrap();
    assert_eq!(config.server.public_host, "edge.example.com");
}

#[test]
fn test_invalid_yaml_is_parse_error() {
    let err = Config::from_yaml_with_env("server: [not, a, map]").unwrap_err();
    assert!(matches!(err, ConfigError::Parse(_)));
}

#[test]
fn test_validation_failures() {
    let cases = [
        "server:\n  port: 0\n",
        "store:\n  pool_key: \"\"\n",
        "cache:\n  pool_ttl_ms: 0\n",
        "cache:\n  affinity_capacity: 0\n",
        "backend:\n  request_timeout_ms: 0\n",
        "streaming:\n  bind_address: \"not-an-ip\"\n",
        "streaming:\n  chunk_size: 0\n",
        "streaming:\n  accept_timeout_ms: 0\n",
    ];
    for yaml in cases {
        let config = Config::from_yaml_with_env(yaml).unwrap();
        assert!(
            matches!(config.validate(), Err(ConfigError::Invalid(_))),
            "expected validation error for {:?}",
            yaml
        );
    }
}

#[test]
fn test_overrides_apply_only_when_set() {
    let mut config = Config::default();
    config.apply_overrides(&Overrides {
        port: None,
        public_host: None,
        redis_url: Some("redis://other:6379".to_string()),
    });

    assert_eq!(config.server.port, 8080);
    assert_eq!(config.store.redis_url, "redis://other:6379");
}
