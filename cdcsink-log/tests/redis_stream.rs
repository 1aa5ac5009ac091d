//! Integration tests for the Redis Streams backend.
//!
//! These tests start a Redis container and are ignored by default:
//!
//! ```bash
//! cargo test -p cdcsink-log --features redis --test redis_stream -- --ignored
//! ```

#![cfg(feature = "redis")]

use cdcsink_log::{Endpoint, LogBackend, LogEntry, LogError, LogSession, RedisLog};
use testcontainers_modules::redis::{Redis, REDIS_PORT};
use testcontainers_modules::testcontainers::runners::AsyncRunner;

#[tokio::test]
#[ignore = "requires docker (see file header)"]
async fn test_xadd_single_and_group() -> anyhow::Result<()> {
    let node = Redis::default().start().await?;
    let host = node.get_host().await?.to_string();
    let port = node.get_host_port_ipv4(REDIS_PORT).await?;

    let mut session = RedisLog::new().open(&Endpoint::new(host, port)).await?;

    let id = session
        .append(&LogEntry::new("it:orders", "event", r#"{"operation":"INSERT"}"#))
        .await?;
    assert!(id.as_str().contains('-'));

    let results = session
        .append_group(&[
            LogEntry::new("it:orders", "event", "1"),
            LogEntry::new("it:users", "event", "2"),
        ])
        .await?;
    assert_eq!(results.len(), 2);
    assert!(results.iter().all(Result::is_ok));

    session.close().await?;
    session.close().await?;
    assert!(matches!(session.ping().await, Err(LogError::Closed)));

    Ok(())
}

#[tokio::test]
#[ignore = "slow: the connection manager retries before giving up"]
async fn test_unreachable_server_is_connection_error() {
    // Nothing listens on port 1
    let result = RedisLog::new().open(&Endpoint::new("127.0.0.1", 1)).await;
    assert!(matches!(result, Err(LogError::Connection(_))));
}
