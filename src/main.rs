//! Mini Cache - command-line front end
//!
//! Runs one cache operation against a file-backed snapshot, so successive
//! invocations share state through the blob store.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde_json::{json, Value};
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mini_cache::{Cache, CacheConfig, FileStore, Key, PersistTarget};

#[derive(Debug, Parser)]
#[command(name = "mini_cache", version, about = "File-backed TTL + LRU key-value cache")]
struct Cli {
    /// Directory holding snapshot files
    #[arg(long, env = "CACHE_DIR", default_value = ".mini_cache")]
    dir: PathBuf,

    /// Snapshot name (defaults to CACHE_PERSIST, then "lru-cache")
    #[arg(long)]
    name: Option<String>,

    /// Capacity ceiling (overrides CACHE_MAX_SIZE)
    #[arg(long)]
    max_size: Option<usize>,

    /// Default TTL in milliseconds, 0 = never expire (overrides CACHE_DEFAULT_TTL_MS)
    #[arg(long)]
    default_ttl_ms: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Store a value (parsed as JSON, or taken as a plain string)
    Set {
        key: String,
        value: String,
        /// Entry TTL in milliseconds, 0 = never expire
        #[arg(long)]
        ttl_ms: Option<u64>,
    },
    /// Print a value; exits with status 1 when the key is absent
    Get { key: String },
    /// Print whether a live value exists
    Has { key: String },
    /// Remove a value
    Del { key: String },
    /// Remove every value
    Clear,
    /// Print the number of live values
    Size,
    /// Print keys from most to least recently used
    Keys,
}

fn main() -> anyhow::Result<ExitCode> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mini_cache=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = build_config(&cli)?;
    debug!(?config, dir = %cli.dir.display(), "Configuration loaded");

    let store = FileStore::new(&cli.dir);
    let mut cache: Cache<Key, Value> =
        Cache::with_store(config, store).context("failed to open cache")?;

    let output = run(&mut cache, cli.command);
    if let Some(output) = &output {
        println!("{output}");
    }

    let stats = cache.stats();
    if stats.persist_failures > 0 {
        anyhow::bail!(
            "{} snapshot operation(s) failed; see log output",
            stats.persist_failures
        );
    }
    Ok(if output.is_some() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// Environment config with command-line overrides. Persistence is always on.
fn build_config(cli: &Cli) -> anyhow::Result<CacheConfig> {
    let mut config = CacheConfig::from_env().context("invalid cache environment")?;

    if let Some(max_size) = cli.max_size {
        config = config.with_max_size(max_size);
    }
    if let Some(ms) = cli.default_ttl_ms {
        config.default_ttl = (ms > 0).then(|| Duration::from_millis(ms));
    }
    config.persist = match (&cli.name, config.persist) {
        (Some(name), _) => PersistTarget::Named(name.clone()),
        (None, PersistTarget::Off) => PersistTarget::Default,
        (None, target) => target,
    };

    config.validate()?;
    Ok(config)
}

/// Executes one command. Returns None only for a `get` miss, so a stored
/// JSON `null` stays distinguishable from an absent key.
fn run(cache: &mut Cache<Key, Value>, command: Command) -> Option<Value> {
    let output = match command {
        Command::Set { key, value, ttl_ms } => {
            let value = serde_json::from_str(&value).unwrap_or(Value::String(value));
            let key = Key::infer(&key);
            cache.set(key.clone(), value, ttl_ms.map(Duration::from_millis));
            json!({ "set": key.to_string(), "expires_at": expires_at(cache, &key) })
        }
        Command::Get { key } => {
            let key = Key::infer(&key);
            return cache.get(&key).cloned();
        }
        Command::Has { key } => Value::Bool(cache.has(&Key::infer(&key))),
        Command::Del { key } => json!({ "deleted": cache.delete(&Key::infer(&key)) }),
        Command::Clear => {
            cache.clear();
            json!({ "cleared": true })
        }
        Command::Size => json!(cache.size()),
        Command::Keys => {
            cache.purge_expired();
            Value::Array(cache.keys().map(|key| json!(key.to_string())).collect())
        }
    };
    Some(output)
}

/// RFC 3339 expiry of a live entry, or null when it never expires.
fn expires_at(cache: &Cache<Key, Value>, key: &Key) -> Value {
    cache
        .ttl_remaining(key)
        .flatten()
        .and_then(|remaining| chrono::Duration::from_std(remaining).ok())
        .map(|remaining| json!((chrono::Utc::now() + remaining).to_rfc3339()))
        .unwrap_or(Value::Null)
}
