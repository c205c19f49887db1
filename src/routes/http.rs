//! HTTP endpoint handlers. These are thin wrappers around state and the STT
//! client; the stateful assessment flow itself runs over the WebSocket.

use std::sync::Arc;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use tracing::{info, instrument};

use crate::protocol::*;
use crate::state::AppState;

#[instrument(level = "info")]
pub async fn http_health() -> impl IntoResponse { Json(HealthOut { ok: true }) }

#[instrument(level = "info", skip(state))]
pub async fn http_list_catalogs(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  let mut out: Vec<CatalogSummary> = state.catalogs().map(|c| to_summary(c)).collect();
  out.sort_by(|a, b| a.id.cmp(&b.id));
  info!(target: "assessment", count = out.len(), "HTTP catalog list served");
  Json(out)
}

/// Stateless helper: transcribe client-captured audio. Session state is never
/// involved, so a failure here costs the user nothing but a retry.
#[instrument(level = "info", skip(state, body), fields(audio_len = body.audio_base64.len(), mime = %body.mime))]
pub async fn http_post_transcribe(
  State(state): State<Arc<AppState>>,
  Json(body): Json<TranscribeIn>,
) -> impl IntoResponse {
  let Some(stt) = &state.stt else {
    return (
      StatusCode::SERVICE_UNAVAILABLE,
      Json(serde_json::json!({ "error": "speech-to-text is not configured" })),
    )
      .into_response();
  };
  match stt.transcribe(&body.audio_base64, &body.mime).await {
    Ok(text) => Json(TranscribeOut { text }).into_response(),
    Err(e) => (
      StatusCode::BAD_GATEWAY,
      Json(serde_json::json!({ "error": e.to_string() })),
    )
      .into_response(),
  }
}
