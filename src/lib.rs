//! Relays email signups to a mailing-list provider and serves dashboard statistics
//! about the resulting subscribers and the provider-side automation.

pub mod app;
pub mod config;
mod error;
pub mod pipeline;
pub mod provider;
pub mod stats;
pub mod utils;
pub mod web;

pub use app::{App, AppState};
pub use error::{Error, Result};
pub use provider::ProviderClient;
pub use web::serve;

use tracing_subscriber::{fmt::format::FmtSpan, EnvFilter};

/// Compact console logging for development, `RUST_LOG` overrides the `debug` default.
pub fn init_dbg_tracing() {
    tracing_subscriber::fmt()
        .without_time()
        .with_span_events(FmtSpan::CLOSE)
        .with_target(false)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "debug".into()))
        .compact()
        .init();
}

/// Plain logging for deployments, `RUST_LOG` overrides the `info` default.
pub fn init_production_tracing() {
    tracing_subscriber::fmt()
        .with_ansi(false)
        .with_target(false)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();
}
