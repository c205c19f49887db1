//! Speech transcript acquisition via an OpenAI-compatible transcription API.
//!
//! The engine only ever sees the resulting transcript string, never audio.
//! Failures are recoverable: the session stays on the same prompt and the user
//! may retry as often as they like.
//!
//! NOTE: We never log the API key and we keep payload truncations short.

use std::time::Duration;

use base64::Engine as _;
use reqwest::header::{AUTHORIZATION, USER_AGENT};
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument};

use crate::error::EngineError;
use crate::util::trunc_for_log;

/// Why an acquisition attempt produced no usable transcript.
/// `permission_denied` originates in the client UI (microphone access) and is
/// carried through the same protocol surface.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AcquisitionReason {
  PermissionDenied,
  NoSpeechDetected,
  Timeout,
  Other,
}

#[derive(Clone)]
pub struct SttClient {
  client: reqwest::Client,
  api_key: String,
  base_url: String,
  model: String,
}

impl SttClient {
  /// Construct the client if we find STT_API_KEY; otherwise return None and
  /// the speech flow simply reports acquisition as unavailable.
  pub fn from_env() -> Option<Self> {
    let api_key = std::env::var("STT_API_KEY").ok()?;
    let base_url =
      std::env::var("STT_BASE_URL").unwrap_or_else(|_| "https://api.openai.com/v1".into());
    let model = std::env::var("STT_MODEL").unwrap_or_else(|_| "whisper-1".into());

    // The caller-imposed wall-clock bound on acquisition.
    let client = reqwest::Client::builder()
      .timeout(Duration::from_secs(30))
      .build()
      .ok()?;

    Some(Self { client, api_key, base_url, model })
  }

  pub fn base_url(&self) -> &str {
    &self.base_url
  }

  pub fn model(&self) -> &str {
    &self.model
  }

  /// Upload base64 audio and return the transcript text.
  #[instrument(level = "info", skip(self, audio_base64), fields(model = %self.model, audio_len = audio_base64.len(), %mime))]
  pub async fn transcribe(&self, audio_base64: &str, mime: &str) -> Result<String, EngineError> {
    let bytes = base64::engine::general_purpose::STANDARD
      .decode(audio_base64)
      .map_err(|e| acquisition(AcquisitionReason::Other, format!("Bad audio payload: {}", e)))?;

    let ext = match mime {
      "audio/wav" | "audio/x-wav" => "wav",
      "audio/mpeg" | "audio/mp3" => "mp3",
      "audio/ogg" => "ogg",
      _ => "webm",
    };
    let part = reqwest::multipart::Part::bytes(bytes)
      .file_name(format!("speech.{ext}"))
      .mime_str(mime)
      .map_err(|e| acquisition(AcquisitionReason::Other, format!("Bad mime type: {}", e)))?;
    let form = reqwest::multipart::Form::new()
      .text("model", self.model.clone())
      .part("file", part);

    let url = format!("{}/audio/transcriptions", self.base_url);
    let res = self
      .client
      .post(&url)
      .header(USER_AGENT, "levelcheck-backend/0.1")
      .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
      .multipart(form)
      .send()
      .await
      .map_err(|e| {
        let reason = if e.is_timeout() { AcquisitionReason::Timeout } else { AcquisitionReason::Other };
        error!(target: "assessment", error = %e, "Transcription request failed");
        acquisition(reason, e.to_string())
      })?;

    if !res.status().is_success() {
      let status = res.status();
      let body = res.text().await.unwrap_or_default();
      let msg = extract_api_error(&body).unwrap_or(body);
      error!(target: "assessment", %status, error = %trunc_for_log(&msg, 200), "Transcription HTTP error");
      return Err(acquisition(AcquisitionReason::Other, format!("STT HTTP {}: {}", status, msg)));
    }

    let body: TranscriptionResponse = res
      .json()
      .await
      .map_err(|e| acquisition(AcquisitionReason::Other, format!("Bad STT response: {}", e)))?;

    let text = body.text.trim().to_string();
    if text.is_empty() {
      return Err(acquisition(
        AcquisitionReason::NoSpeechDetected,
        "Transcript came back empty".into(),
      ));
    }
    info!(target: "assessment", transcript_len = text.len(), "Transcript acquired");
    Ok(text)
  }
}

fn acquisition(reason: AcquisitionReason, message: String) -> EngineError {
  EngineError::AcquisitionFailed { reason, message }
}

#[derive(Deserialize)]
struct TranscriptionResponse {
  text: String,
}

/// Try to extract a clean error message from an API error body.
fn extract_api_error(body: &str) -> Option<String> {
  #[derive(Deserialize)]
  struct EWrap {
    error: EObj,
  }
  #[derive(Deserialize)]
  struct EObj {
    message: String,
  }
  match serde_json::from_str::<EWrap>(body) {
    Ok(w) => Some(w.error.message),
    Err(_) => None,
  }
}
