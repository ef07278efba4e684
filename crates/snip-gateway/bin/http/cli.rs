use anyhow::bail;
use clap::builder::TypedValueParser;
use clap::{Parser, ValueEnum};
use snip_gateway::telemetry::LogFormat;
use std::fmt::{Display, Formatter};
use std::net::SocketAddr;

pub const LISTEN_ADDR_ENV: &str = "SNIP_LISTEN_ADDR";
pub const BASE_URL_ENV: &str = "SNIP_BASE_URL";
pub const STRATEGY_ENV: &str = "SNIP_STRATEGY";
pub const CODE_LENGTH_ENV: &str = "SNIP_CODE_LENGTH";
pub const MAX_RETRIES_ENV: &str = "SNIP_MAX_RETRIES";
pub const SALT_ENV: &str = "SNIP_SALT";
pub const MIN_CODE_LENGTH_ENV: &str = "SNIP_MIN_CODE_LENGTH";
pub const STORAGE_BACKEND_ENV: &str = "SNIP_STORAGE_BACKEND";
pub const MYSQL_DSN_ENV: &str = "SNIP_MYSQL_DSN";
pub const COUNTER_BACKEND_ENV: &str = "SNIP_COUNTER_BACKEND";
pub const REDIS_URL_ENV: &str = "SNIP_REDIS_URL";
pub const REDIS_COUNTER_KEY_ENV: &str = "SNIP_REDIS_COUNTER_KEY";
pub const LOG_FORMAT_ENV: &str = "SNIP_LOG_FORMAT";

pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:8080";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StrategyArg {
    #[value(name = "random")]
    Random,
    #[value(name = "counter")]
    Counter,
}

impl Display for StrategyArg {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            StrategyArg::Random => write!(f, "random"),
            StrategyArg::Counter => write!(f, "counter"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StorageBackendArg {
    #[value(name = "in-memory")]
    InMemory,
    #[value(name = "mysql")]
    Mysql,
}

impl Display for StorageBackendArg {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageBackendArg::InMemory => write!(f, "in-memory"),
            StorageBackendArg::Mysql => write!(f, "mysql"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CounterBackendArg {
    #[value(name = "in-memory")]
    InMemory,
    #[value(name = "redis")]
    Redis,
}

impl Display for CounterBackendArg {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            CounterBackendArg::InMemory => write!(f, "in-memory"),
            CounterBackendArg::Redis => write!(f, "redis"),
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "snip")]
pub struct CLI {
    #[arg(long, env = LISTEN_ADDR_ENV, default_value = DEFAULT_LISTEN_ADDR)]
    pub listen_addr: SocketAddr,

    /// Prefix of the short URLs handed back to clients.
    #[arg(long, env = BASE_URL_ENV, default_value = snip_shortener::DEFAULT_BASE_URL)]
    pub base_url: String,

    #[arg(long, env = STRATEGY_ENV, value_enum, default_value_t = StrategyArg::Random)]
    pub strategy: StrategyArg,

    /// Length of random codes.
    #[arg(
        long,
        env = CODE_LENGTH_ENV,
        default_value_t = snip_generator::random::DEFAULT_CODE_LENGTH,
        value_parser = clap::value_parser!(u8).range(3..=32).map(usize::from),
    )]
    pub code_length: usize,

    #[arg(
        long,
        env = MAX_RETRIES_ENV,
        default_value_t = snip_shortener::DEFAULT_MAX_RETRIES,
        value_parser = clap::value_parser!(u32).range(1..),
    )]
    pub max_retries: u32,

    #[arg(long, env = SALT_ENV, default_value = snip_generator::counter::DEFAULT_SALT)]
    pub salt: String,

    /// Minimum length of counter codes.
    #[arg(
        long,
        env = MIN_CODE_LENGTH_ENV,
        default_value_t = snip_generator::counter::DEFAULT_MIN_CODE_LENGTH,
        value_parser = clap::value_parser!(u8).range(3..=32).map(usize::from),
    )]
    pub min_code_length: usize,

    #[arg(
        long,
        env = STORAGE_BACKEND_ENV,
        value_enum,
        default_value_t = StorageBackendArg::InMemory
    )]
    pub storage: StorageBackendArg,

    #[arg(long, env = MYSQL_DSN_ENV, required_if_eq("storage", "mysql"))]
    pub mysql_dsn: Option<String>,

    #[arg(
        long,
        env = COUNTER_BACKEND_ENV,
        value_enum,
        default_value_t = CounterBackendArg::InMemory
    )]
    pub counter: CounterBackendArg,

    #[arg(long, env = REDIS_URL_ENV, required_if_eq("counter", "redis"))]
    pub redis_url: Option<String>,

    /// Key the Redis counter increments.
    #[arg(
        long,
        env = REDIS_COUNTER_KEY_ENV,
        default_value = snip_storage::redis::DEFAULT_COUNTER_KEY
    )]
    pub redis_counter_key: String,

    #[arg(long, env = LOG_FORMAT_ENV, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

impl CLI {
    /// Rejects combinations clap cannot express on its own.
    ///
    /// An in-memory counter restarts at 1, so pairing it with durable storage
    /// would re-issue codes that are already stored.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.strategy == StrategyArg::Counter
            && self.counter == CounterBackendArg::InMemory
            && self.storage == StorageBackendArg::Mysql
        {
            bail!("the counter strategy with mysql storage needs --counter redis");
        }
        Ok(())
    }
}
