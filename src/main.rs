//! Command-line driver for the rate resolution engine.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

use fx_engine::config::{load_config, EngineConfig};
use fx_engine::{CurrencyCode, FileStore, KvStore, RateService, Shutdown};

#[derive(Parser)]
#[command(name = "fx-engine")]
#[command(about = "Resilient currency exchange rate resolver", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file; defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve the rate table for a base currency
    Resolve {
        /// Base currency code (e.g. USD)
        base: String,
        /// Bypass the fresh-cache fast path
        #[arg(long)]
        force: bool,
    },
    /// Convert an amount between two currencies
    Convert {
        amount: f64,
        /// Source currency code
        from: String,
        /// Target currency code
        to: String,
    },
    /// Show resolution metrics for this invocation
    Metrics,
    /// Show cache statistics
    CacheStats,
    /// Remove all cached rate tables
    ClearCache,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => EngineConfig::default(),
    };
    fx_engine::observability::logging::init(&config.observability.log_level);

    tracing::info!("fx-engine v0.1.0 starting");

    let store_path = config.store.path.clone().unwrap_or_else(|| "fx-cache.json".to_string());
    let store: Arc<dyn KvStore> = Arc::new(FileStore::open(&store_path));

    let shutdown = Shutdown::new();

    match cli.command {
        Commands::Resolve { base, force } => {
            let base: CurrencyCode = base.parse()?;
            let service = RateService::new(&config, store, base, &shutdown);
            let result = service.resolve(base, force).await;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Commands::Convert { amount, from, to } => {
            let from: CurrencyCode = from.parse()?;
            let to: CurrencyCode = to.parse()?;
            let service = RateService::new(&config, store, from, &shutdown);
            let resolution = service.resolve(from, false).await;
            if let Some(warning) = &resolution.warning {
                tracing::warn!(warning = %warning, "resolution degraded");
            }
            let conversion = service.convert(amount, from, to);
            println!(
                "{amount} {from} = {:.4} {to}  (rate {:.6}, source: {})",
                conversion.converted, conversion.effective_rate, resolution.provenance
            );
        }
        Commands::Metrics => {
            let base: CurrencyCode = "USD".parse()?;
            let service = RateService::new(&config, store, base, &shutdown);
            service.resolve(base, false).await;
            println!("{}", serde_json::to_string_pretty(&service.metrics())?);
        }
        Commands::CacheStats => {
            let base: CurrencyCode = "USD".parse()?;
            let service = RateService::new(&config, store, base, &shutdown);
            println!("{}", serde_json::to_string_pretty(&service.cache_stats())?);
        }
        Commands::ClearCache => {
            let base: CurrencyCode = "USD".parse()?;
            let service = RateService::new(&config, store, base, &shutdown);
            service.clear_cache();
            tracing::info!("cache cleared");
        }
    }

    shutdown.trigger();
    Ok(())
}
