mod cli;

use crate::cli::{CounterBackendArg, StorageBackendArg, StrategyArg, CLI};
use anyhow::Context;
use clap::Parser;
use snip_core::{MappingStore, Shortener};
use snip_gateway::{telemetry, App, AppState};
use snip_generator::{AtomicCounter, CounterGenerator, CounterSettings, Generator, RandomGenerator};
use snip_shortener::{ShortenerService, ShortenerSettings};
use snip_storage::{InMemoryStore, MySqlStore, RedisCounter};
use std::sync::Arc;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = CLI::parse();
    telemetry::init(config.log_format)?;
    config.validate()?;

    info!(
        listen_addr = %config.listen_addr,
        base_url = %config.base_url,
        strategy = %config.strategy,
        storage_backend = %config.storage,
        counter_backend = %config.counter,
        "starting snip"
    );

    let generator = build_generator(&config).await?;
    let settings = ShortenerSettings::builder()
        .base_url(config.base_url.clone())
        .max_retries(config.max_retries)
        .build();

    let shortener = match config.storage {
        StorageBackendArg::InMemory => {
            build_shortener(Arc::new(InMemoryStore::new()), generator, settings)
        }
        StorageBackendArg::Mysql => {
            let mysql_dsn = config
                .mysql_dsn
                .as_deref()
                .context("mysql dsn is required when storage backend is mysql")?;
            let store = MySqlStore::connect(mysql_dsn).await?;
            store.ensure_schema().await?;
            build_shortener(Arc::new(store), generator, settings)
        }
    };

    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    info!(listen_addr = %listener.local_addr()?, "listening");

    axum::serve(listener, App::router(AppState::new(shortener)))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("shut down");
    Ok(())
}

async fn build_generator(config: &CLI) -> anyhow::Result<Arc<dyn Generator>> {
    if config.strategy == StrategyArg::Random {
        return Ok(Arc::new(RandomGenerator::new(config.code_length)));
    }

    let settings = CounterSettings::builder()
        .salt(config.salt.clone())
        .min_length(config.min_code_length)
        .build();

    match config.counter {
        CounterBackendArg::InMemory => Ok(Arc::new(CounterGenerator::new(
            AtomicCounter::new(),
            settings,
        ))),
        CounterBackendArg::Redis => {
            let redis_url = config
                .redis_url
                .as_deref()
                .context("redis url is required when counter backend is redis")?;
            let counter = RedisCounter::connect(redis_url, config.redis_counter_key.clone()).await?;
            info!(key = counter.key(), "using redis counter");
            Ok(Arc::new(CounterGenerator::new(counter, settings)))
        }
    }
}

fn build_shortener<S: MappingStore>(
    store: Arc<S>,
    generator: Arc<dyn Generator>,
    settings: ShortenerSettings,
) -> Arc<dyn Shortener> {
    Arc::new(ShortenerService::new(store, generator, settings))
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    info!("received ctrl-c, shutting down");
}
