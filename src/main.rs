//! CalClik service: binary entrypoint.
//! Boots the Axum HTTP server, wiring config, the entity strategy, routes and metrics.

use shuttle_axum::ShuttleAxum;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use calclik::{api, config::AppConfig, metrics::Metrics};

/// Compact tracing logs; `RUST_LOG` overrides the default filter.
fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("calclik=info,warn"));

    // The runtime may already have installed a subscriber; keep that one.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .try_init();
}

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();

    init_tracing();

    let cfg = AppConfig::load()?;
    info!(
        granularity = ?cfg.segmenter.granularity,
        provider = ?cfg.entities.provider,
        location_cap = cfg.extractor.max_location_chars,
        "config loaded"
    );

    let state = api::AppState::from_config(&cfg);
    info!(strategy = state.strategy.name(), "entity strategy ready");

    let mut router = api::router(state);
    match Metrics::init() {
        Ok(m) => router = router.merge(m.router()),
        Err(e) => warn!(error = ?e, "metrics disabled"),
    }

    Ok(router.into())
}
