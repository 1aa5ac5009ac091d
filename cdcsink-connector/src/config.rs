//! Sink configuration.
//!
//! The connector framework passes an option map at connect time. The daemon
//! builds the same map from `CDCSINK_*` environment variables.

use cdcsink_log::Endpoint;
use serde_json::{Map, Value};
use std::env;
use std::fmt;

use crate::error::{SinkError, SinkResult};

/// Default stream name; partitions are `{stream_name}:{table}`
pub const DEFAULT_STREAM_NAME: &str = "gluesync_events";

/// Default key prefix (reserved, not used for routing)
pub const DEFAULT_KEY_PREFIX: &str = "gluesync:";

/// Default advisory batch size
pub const DEFAULT_BATCH_SIZE: usize = 100;

/// Prefix of environment variables read by [`SinkConfig::from_env`]
pub const ENV_PREFIX: &str = "CDCSINK_";

/// Framework-supplied connect options.
pub type ConnectorOptions = Map<String, Value>;

// =============================================================================
// Configuration
// =============================================================================

/// Sink configuration.
#[derive(Clone, PartialEq, Eq)]
pub struct SinkConfig {
    /// Log backend host
    pub host: String,
    /// Log backend port
    pub port: u16,
    /// Backend password
    pub password: Option<String>,
    /// Stream name used as partition prefix
    pub stream_name: String,
    /// Key prefix (carried, currently unused by delivery)
    pub key_prefix: String,
    /// Advisory batch size; not enforced as a cap
    pub batch_size: usize,
    /// Connect over TLS
    pub ssl_enabled: bool,
}

impl SinkConfig {
    /// Configuration with defaults for everything but the endpoint.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            password: None,
            stream_name: DEFAULT_STREAM_NAME.to_string(),
            key_prefix: DEFAULT_KEY_PREFIX.to_string(),
            batch_size: DEFAULT_BATCH_SIZE,
            ssl_enabled: false,
        }
    }

    /// Create test configuration.
    pub fn test() -> Self {
        Self::new("127.0.0.1", 6379).with_stream_name("test_events")
    }

    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    pub fn with_stream_name(mut self, stream_name: impl Into<String>) -> Self {
        self.stream_name = stream_name.into();
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Parse framework options.
    ///
    /// Each option is accepted under its plain name or the `redis_`-prefixed
    /// alias used by existing connector deployments (`ssl_enabled` ↔ `redis_ssl`).
    /// `host` and `port` are required.
    pub fn from_options(options: &ConnectorOptions) -> SinkResult<Self> {
        let host = match lookup(options, &["host", "redis_host"]) {
            Some(Value::String(host)) => host.clone(),
            Some(other) => {
                return Err(SinkError::Configuration(format!("Invalid host: {}", other)))
            },
            None => return Err(missing("host")),
        };

        let port = match lookup(options, &["port", "redis_port"]) {
            Some(value) => parse_port(value)?,
            None => return Err(missing("port")),
        };

        let mut config = Self::new(host, port);

        if let Some(value) = lookup(options, &["password", "redis_password"]) {
            config.password = match value {
                Value::Null => None,
                Value::String(password) => Some(password.clone()),
                _ => return Err(SinkError::Configuration("Invalid password".to_string())),
            };
        }

        if let Some(value) = lookup(options, &["stream_name", "redis_stream_name"]) {
            config.stream_name = parse_string("stream_name", value)?;
        }

        if let Some(value) = lookup(options, &["key_prefix", "redis_key_prefix"]) {
            config.key_prefix = parse_string("key_prefix", value)?;
        }

        if let Some(value) = lookup(options, &["batch_size", "redis_batch_size"]) {
            config.batch_size = parse_batch_size(value)?;
        }

        if let Some(value) = lookup(options, &["ssl_enabled", "redis_ssl"]) {
            config.ssl_enabled = parse_bool("ssl_enabled", value)?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from environment variables.
    ///
    /// Reads `CDCSINK_HOST`, `CDCSINK_PORT`, `CDCSINK_PASSWORD`,
    /// `CDCSINK_STREAM_NAME`, `CDCSINK_KEY_PREFIX`, `CDCSINK_BATCH_SIZE` and
    /// `CDCSINK_SSL_ENABLED`.
    pub fn from_env() -> SinkResult<Self> {
        // Load .env file if present (ignore errors)
        let _ = dotenvy::dotenv();

        Self::from_vars(env::vars())
    }

    /// Build from `(name, value)` pairs, keeping only `CDCSINK_*` names.
    pub fn from_vars<I>(vars: I) -> SinkResult<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let options: ConnectorOptions = vars
            .into_iter()
            .filter_map(|(key, value)| {
                key.strip_prefix(ENV_PREFIX)
                    .map(|name| (name.to_lowercase(), Value::String(value)))
            })
            .collect();

        Self::from_options(&options)
    }

    /// Check the values are usable.
    pub fn validate(&self) -> SinkResult<()> {
        if self.host.trim().is_empty() {
            return Err(SinkError::Configuration("host must not be empty".to_string()));
        }
        if self.port == 0 {
            return Err(SinkError::Configuration("port must not be 0".to_string()));
        }
        if self.stream_name.is_empty() {
            return Err(SinkError::Configuration("stream_name must not be empty".to_string()));
        }
        Ok(())
    }

    /// Backend connection parameters
    pub fn endpoint(&self) -> Endpoint {
        Endpoint {
            host: self.host.clone(),
            port: self.port,
            password: self.password.clone(),
            tls: self.ssl_enabled,
        }
    }
}

impl fmt::Debug for SinkConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SinkConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("stream_name", &self.stream_name)
            .field("key_prefix", &self.key_prefix)
            .field("batch_size", &self.batch_size)
            .field("ssl_enabled", &self.ssl_enabled)
            .finish()
    }
}

// =============================================================================
// Option parsing
// =============================================================================

fn lookup<'a>(options: &'a ConnectorOptions, names: &[&str]) -> Option<&'a Value> {
    names.iter().find_map(|name| options.get(*name))
}

fn missing(key: &str) -> SinkError {
    SinkError::Configuration(format!("Missing required config key: {}", key))
}

fn parse_port(value: &Value) -> SinkResult<u16> {
    let port = match value {
        Value::Number(n) => n.as_u64().and_then(|p| u16::try_from(p).ok()),
        Value::String(s) => s.trim().parse::<u16>().ok(),
        _ => None,
    };

    match port {
        Some(port) if port != 0 => Ok(port),
        _ => Err(SinkError::Configuration(format!("Invalid port: {}", value))),
    }
}

fn parse_string(key: &str, value: &Value) -> SinkResult<String> {
    value
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| SinkError::Configuration(format!("Invalid {}: {}", key, value)))
}

fn parse_batch_size(value: &Value) -> SinkResult<usize> {
    let size = match value {
        Value::Number(n) => n.as_u64().and_then(|n| usize::try_from(n).ok()),
        Value::String(s) => s.trim().parse::<usize>().ok(),
        _ => None,
    };

    match size {
        Some(size) if size > 0 => Ok(size),
        _ => Err(SinkError::Configuration(format!("Invalid batch_size: {}", value))),
    }
}

fn parse_bool(key: &str, value: &Value) -> SinkResult<bool> {
    match value {
        Value::Bool(b) => Ok(*b),
        Value::String(s) => match s.trim().to_lowercase().as_str() {
            "true" | "1" | "yes" => Ok(true),
            "false" | "0" | "no" => Ok(false),
            _ => Err(SinkError::Configuration(format!("Invalid {}: {}", key, s))),
        },
        _ => Err(SinkError::Configuration(format!("Invalid {}: {}", key, value))),
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn options(value: Value) -> ConnectorOptions {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_defaults() {
        let config =
            SinkConfig::from_options(&options(json!({"host": "x", "port": 1234}))).unwrap();

        assert_eq!(config.host, "x");
        assert_eq!(config.port, 1234);
        assert_eq!(config.password, None);
        assert_eq!(config.stream_name, "gluesync_events");
        assert_eq!(config.key_prefix, "gluesync:");
        assert_eq!(config.batch_size, 100);
        assert!(!config.ssl_enabled);
    }

    #[test]
    fn test_missing_host_or_port() {
        let err = SinkConfig::from_options(&options(json!({"port": 1234}))).unwrap_err();
        assert!(matches!(err, SinkError::Configuration(ref m) if m.contains("host")));

        let err = SinkConfig::from_options(&options(json!({"host": "x"}))).unwrap_err();
        assert!(matches!(err, SinkError::Configuration(ref m) if m.contains("port")));

        let err = SinkConfig::from_options(&ConnectorOptions::new()).unwrap_err();
        assert!(matches!(err, SinkError::Configuration(_)));
    }

    #[test]
    fn test_redis_prefixed_aliases() {
        let config = SinkConfig::from_options(&options(json!({
            "redis_host": "cache.internal",
            "redis_port": "6380",
            "redis_password": "s3cret",
            "redis_stream_name": "cdc",
            "redis_key_prefix": "cdc:",
            "redis_batch_size": 500,
            "redis_ssl": true
        })))
        .unwrap();

        assert_eq!(config.host, "cache.internal");
        assert_eq!(config.port, 6380);
        assert_eq!(config.password.as_deref(), Some("s3cret"));
        assert_eq!(config.stream_name, "cdc");
        assert_eq!(config.key_prefix, "cdc:");
        assert_eq!(config.batch_size, 500);
        assert!(config.ssl_enabled);
    }

    #[test]
    fn test_invalid_values() {
        for bad in [
            json!({"host": "x", "port": 0}),
            json!({"host": "x", "port": 70000}),
            json!({"host": "x", "port": "abc"}),
            json!({"host": 5, "port": 1}),
            json!({"host": "", "port": 1}),
            json!({"host": "x", "port": 1, "batch_size": 0}),
            json!({"host": "x", "port": 1, "ssl_enabled": "maybe"}),
            json!({"host": "x", "port": 1, "stream_name": ""}),
        ] {
            let result = SinkConfig::from_options(&options(bad.clone()));
            assert!(
                matches!(result, Err(SinkError::Configuration(_))),
                "expected configuration error for {}",
                bad
            );
        }
    }

    #[test]
    fn test_from_vars() {
        let vars = vec![
            ("CDCSINK_HOST".to_string(), "localhost".to_string()),
            ("CDCSINK_PORT".to_string(), "6379".to_string()),
            ("CDCSINK_BATCH_SIZE".to_string(), "25".to_string()),
            ("CDCSINK_SSL_ENABLED".to_string(), "true".to_string()),
            ("PATH".to_string(), "/usr/bin".to_string()),
        ];

        let config = SinkConfig::from_vars(vars).unwrap();
        assert_eq!(config.host, "localhost");
        assert_eq!(config.batch_size, 25);
        assert!(config.ssl_enabled);
    }

    #[test]
    fn test_debug_redacts_password() {
        let config = SinkConfig::test().with_password("hunter2");
        let debug = format!("{:?}", config);

        assert!(!debug.contains("hunter2"));
        assert_eq!(config.endpoint().password.as_deref(), Some("hunter2"));
    }
}
