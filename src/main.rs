//! Levelcheck · Adaptive Assessment Backend
//!
//! - Axum HTTP + WebSocket API
//! - Built-in seed catalogs, optional TOML catalog bank
//! - Optional lead webhook + speech-to-text integration (via environment)
//!
//! Important env variables:
//!   PORT          : u16 (default 3000)
//!   CATALOG_CONFIG_PATH  : path to TOML config (extra catalogs + webhook url)
//!   LEAD_WEBHOOK_URL  : where unlocked lead records are posted (best-effort)
//!   STT_API_KEY    : enables server-side transcription if present
//!   STT_BASE_URL / STT_MODEL : transcription endpoint overrides
//!   LOG_LEVEL    : tracing filter, e.g. "debug" or full directives
//!   LOG_FORMAT      : "pretty" (default) or "json"

mod telemetry;
mod util;
mod error;
mod catalog;
mod scoring;
mod session;
mod gate;
mod stt;
mod config;
mod seeds;
mod state;
mod protocol;
mod routes;

use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tracing::{info, instrument};

use crate::routes::build_router;
use crate::state::AppState;

#[instrument(level = "info", skip_all)]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  telemetry::init_tracing();

  // Build shared application state. A broken catalog aborts startup here,
  // before anything is served.
  let state = Arc::new(AppState::new()?);

  // Build the HTTP router with routes, CORS and tracing layers.
  let app = build_router(state.clone());

  // Read port from env or default to 3000.
  let addr: SocketAddr = std::env::var("PORT")
    .ok()
    .and_then(|p| p.parse::<u16>().ok())
    .map(|port| SocketAddr::from(([0, 0, 0, 0], port)))
    .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], 3000)));

  let listener = TcpListener::bind(addr).await?;
  info!(target: "levelcheck_backend", %addr, "HTTP server listening");
  axum::serve(listener, app).await?;
  Ok(())
}
