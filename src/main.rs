use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ouroboros_cache::{
    CacheConfig, ExpiringFetchCache, HttpFetcher, InstrumentedCache, MemoryBackend, ReplayLog,
    SharedBackend, StoredValue, TrackedOperation,
};

#[derive(Parser)]
#[command(name = "ouroboros-cache")]
#[command(about = "Instrumented key-value cache with call replay", long_about = None)]
struct Cli {
    /// Redis URL (omit to use a process-local in-memory backend)
    #[arg(long, env = "REDIS_URL")]
    redis_url: Option<String>,

    /// TTL of fetched content in seconds
    #[arg(long)]
    fetch_ttl: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Store values and print their generated keys
    Store {
        /// Values to store (parsed as integer, then float, else text)
        #[arg(required = true)]
        values: Vec<String>,
    },

    /// Look up a stored value
    Get {
        /// Key returned by `store`
        key: String,

        /// How to decode the stored value
        #[arg(long = "as", value_enum, default_value_t = Decode::Text)]
        decode: Decode,
    },

    /// Print the recorded call history of an operation
    Replay {
        #[arg(default_value = "store")]
        operation: String,
    },

    /// Print the call counter of an operation
    Count {
        #[arg(default_value = "store")]
        operation: String,
    },

    /// Fetch a URL through the expiring cache
    Fetch {
        url: String,

        /// Number of consecutive fetches
        #[arg(short = 'n', long, default_value = "1")]
        times: u32,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Decode {
    Text,
    Int,
    Float,
    Bytes,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "ouroboros_cache=info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let mut config = CacheConfig::from_env()?;
    if let Some(secs) = cli.fetch_ttl {
        config.fetch_ttl = Duration::from_secs(secs);
    }

    let backend = open_backend(cli.redis_url.as_deref()).await?;

    match cli.command {
        Commands::Store { ref values } => {
            let cache = InstrumentedCache::new(backend, config).await?;
            for raw in values {
                let key = cache.store(parse_value(raw)).await?;
                println!("{}", key);
            }
        }

        Commands::Get { ref key, decode } => {
            let cache = InstrumentedCache::new(backend, config).await?;
            let rendered = match decode {
                Decode::Text => cache.get_str(key).await?.map(|v| format!("{:?}", v)),
                Decode::Int => cache.get_int(key).await?.map(|v| v.to_string()),
                Decode::Float => cache.get_float(key).await?.map(|v| v.to_string()),
                Decode::Bytes => cache.get(key).await?.map(|v| format!("{:?}", v)),
            };
            println!("{}", rendered.unwrap_or_else(|| "None".to_string()));
        }

        Commands::Replay { ref operation } => {
            let replay = ReplayLog::new(backend).replay(operation.as_str()).await?;
            println!("{}", replay);
        }

        Commands::Count { ref operation } => {
            let count = TrackedOperation::new(backend, operation.as_str())
                .counter()
                .await?;
            println!("{}", count);
        }

        Commands::Fetch { ref url, times } => {
            let cache = ExpiringFetchCache::new(Arc::new(HttpFetcher::new()?), backend, config)?;
            for _ in 0..times {
                let body = cache.fetch(url).await?;
                println!("{} bytes", body.len());
            }
            println!("{} accessed {} times", url, cache.access_count(url).await?);
            println!("{}", cache.stats().await);
        }
    }

    Ok(())
}

async fn open_backend(redis_url: Option<&str>) -> Result<SharedBackend> {
    match redis_url {
        #[cfg(feature = "redis")]
        Some(url) => {
            use ouroboros_cache::{RedisBackend, RedisConfig};
            let backend = RedisBackend::connect(RedisConfig::new(url)).await?;
            Ok(Arc::new(backend))
        }
        #[cfg(not(feature = "redis"))]
        Some(_) => anyhow::bail!("--redis-url requires the `redis` feature"),
        None => {
            info!("No redis URL given, using in-memory backend");
            Ok(Arc::new(MemoryBackend::new()))
        }
    }
}

fn parse_value(raw: &str) -> StoredValue {
    if let Ok(i) = raw.parse::<i64>() {
        StoredValue::Integer(i)
    } else if let Ok(f) = raw.parse::<f64>() {
        StoredValue::Float(f)
    } else {
        StoredValue::Text(raw.to_string())
    }
}
