//! deal-scout binary entrypoint.
//! Loads configuration, opens the result store, builds the platform adapters
//! and runs search cycles on a fixed interval until Ctrl-C.
//!
//! `--once` runs a single cycle and exits.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use deal_scout::config::ShopperConfig;
use deal_scout::error::StartupError;
use deal_scout::input::JsonItemFile;
use deal_scout::scheduler::run_scheduler;
use deal_scout::{AdapterRegistry, FetchSettings, FilterPolicy, SearchCycle, SqliteStore};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// `RUST_LOG` wins over `[general] log_level`; `LOG_FORMAT=json` switches to
/// JSON lines.
fn init_tracing(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let json = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer().compact()).init();
    }
}

async fn build(cfg: &ShopperConfig) -> Result<SearchCycle, StartupError> {
    let db_path = PathBuf::from(cfg.general("database_file", "data/shopping_results.db"));
    let store = SqliteStore::open(&db_path).await?;

    let settings = FetchSettings::from_config(cfg);
    let policy = FilterPolicy {
        min_title_relevance: cfg.min_title_relevance(),
    };
    let registry = AdapterRegistry::load(&cfg.enabled_platforms(), &settings, policy)?;
    tracing::info!(platforms = ?registry.platforms(), "adapters ready");

    let items = JsonItemFile::new(cfg.general("input_file", "data/input.json"));
    Ok(SearchCycle::new(Box::new(items), registry, Arc::new(store)).with_output(cfg.output_file()))
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // Load .env if present; no-op otherwise.
    let _ = dotenvy::dotenv();
    let once = std::env::args().skip(1).any(|a| a == "--once");

    let cfg = match ShopperConfig::load_default() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("deal-scout: {:#}", anyhow::Error::from(e));
            return ExitCode::FAILURE;
        }
    };
    init_tracing(&cfg.general("log_level", "info").to_ascii_lowercase());

    let cycle = match build(&cfg).await {
        Ok(c) => c,
        Err(e) => {
            tracing::error!(error = ?e, "startup failed");
            eprintln!("deal-scout: {:#}", anyhow::Error::from(e));
            return ExitCode::FAILURE;
        }
    };

    let cancel = CancellationToken::new();
    if once {
        cycle.run_search_cycle(&cancel).await;
        return ExitCode::SUCCESS;
    }

    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("interrupt received, stopping after the current item");
            on_signal.cancel();
        }
    });

    run_scheduler(&cycle, cfg.schedule_interval(), cancel).await;
    ExitCode::SUCCESS
}
