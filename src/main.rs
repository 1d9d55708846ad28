//! Small demo binary driving the cache through a basic LRU + LRU-2
//! workload with structured logging, at a scope appropriate for a
//! library demo (no config file, no HTTP server, no workers).

use std::time::Duration;

use tracing::info;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

use shardcache::{Cache, CacheConfig};

fn configure_logger() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().pretty())
        .init();
}

fn main() -> anyhow::Result<()> {
    configure_logger();

    tokio::runtime::Runtime::new()?.block_on(async_main())
}

async fn async_main() -> anyhow::Result<()> {
    let cache: Cache<String> = Cache::new(
        CacheConfig::new(16, 1024)
            .with_expiration(Duration::from_secs(30))
            .with_lru2(512),
    )?;

    cache.inspect(Box::new(|event| {
        info!(
            component = "demo",
            action = ?event.action,
            status = ?event.status,
            key = %event.key,
            "cache event"
        );
    }));

    cache.put_int64("requests".to_string(), 1);
    cache.put_bytes("payload".to_string(), vec![1, 2, 3, 4]);

    // Touch "requests" a second time so it promotes into L1.
    let _ = cache.get_int64(&"requests".to_string());

    let stats = cache.stats();
    info!(component = "demo", total_len = stats.total_len, "cache stats snapshot");

    Ok(())
}
