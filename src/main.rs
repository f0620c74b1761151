//! TTL Cache demo
//!
//! Memoizes a counting `square` function and walks through a hit, a miss
//! after expiry, and a keyword-distinct call.

use std::convert::Infallible;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ttl_cache::{memoize, spawn_sweep_task, ArgValue, CallArgs, MemoConfig, SweepConfig};

/// TTL used when `TTL_CACHE_TTL_MS` is not set.
const DEMO_TTL: Duration = Duration::from_secs(2);

/// Main entry point for the demo.
///
/// # Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Memoize `square` and start the background sweep
/// 4. Call it twice within the TTL, then again after the TTL has elapsed
/// 5. Print cache info as JSON
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ttl_cache=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut config = MemoConfig::from_env();
    if std::env::var_os("TTL_CACHE_TTL_MS").is_none() {
        config = config.with_ttl(DEMO_TTL);
    }
    let sweep = SweepConfig::from_env();
    info!(
        "Configuration loaded: ttl={:?}, max_entries={:?}, single_flight={}, sweep_interval={:?}",
        config.ttl, config.max_entries, config.single_flight, sweep.interval
    );

    let ttl = config.ttl;
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let square = memoize("square", config, move |args: &CallArgs| {
        counter.fetch_add(1, Ordering::SeqCst);
        match args.positional().first() {
            Some(ArgValue::Int(x)) => Ok::<_, Infallible>(x * x),
            _ => Ok(0),
        }
    })?;

    let sweep_handle = spawn_sweep_task(square.store(), sweep.interval);

    let three = CallArgs::new().arg(3);
    let first = square.call(&three)?;
    info!("square(3) = {}, calls = {}", first, calls.load(Ordering::SeqCst));

    let second = square.call(&three)?;
    info!("square(3) = {}, calls = {} (cached)", second, calls.load(Ordering::SeqCst));

    let flagged = square.call(&CallArgs::new().arg(3).kwarg("extra_kw", true))?;
    info!(
        "square(3, extra_kw=true) = {}, calls = {} (distinct key)",
        flagged,
        calls.load(Ordering::SeqCst)
    );

    tokio::time::sleep(ttl + ttl / 20).await;

    let third = square.call(&three)?;
    info!("square(3) = {}, calls = {} (expired)", third, calls.load(Ordering::SeqCst));

    println!("{}", serde_json::to_string_pretty(&square.cache_info())?);

    sweep_handle.abort();
    info!("Demo complete");
    Ok(())
}
