//! WebSocket upgrade + message loop. Each client message is parsed as JSON and
//! forwarded to the session controller. We reply with a single JSON message
//! per request.
//!
//! The connection task is the sole owner of the `Session`: it is created by
//! `start_assessment`, replaced wholesale on a retake, and abandoned when the
//! socket closes. No session state outlives its connection.

use std::sync::Arc;
use axum::{
  extract::{
    ws::{Message, WebSocket},
    State, WebSocketUpgrade,
  },
  response::IntoResponse,
};
use tracing::{info, error, instrument, warn};

use crate::error::EngineError;
use crate::gate::{unlock_result, ContactRecord};
use crate::protocol::{to_out, ClientWsMessage, ServerWsMessage};
use crate::scoring::Response;
use crate::session::{Session, Stage};
use crate::state::AppState;

#[instrument(level = "info", skip(state))]
pub async fn ws_upgrade(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> impl IntoResponse {
  info!(target: "levelcheck_backend", "WebSocket upgrade requested");
  ws.on_upgrade(move |socket| handle_ws(socket, state))
}

#[instrument(level = "info", skip(socket, state))]
async fn handle_ws(mut socket: WebSocket, state: Arc<AppState>) {
  info!(target: "levelcheck_backend", "WebSocket connected");
  let mut session: Option<Session> = None;

  while let Some(Ok(msg)) = socket.recv().await {
    match msg {
      Message::Text(txt) => {
        // Parse, dispatch, serialize response.
        let reply_msg = match serde_json::from_str::<ClientWsMessage>(&txt) {
          Ok(incoming) => handle_client_ws(incoming, &state, &mut session).await,
          Err(e) => ServerWsMessage::Error { message: format!("Invalid JSON: {}", e) },
        };

        let out = serde_json::to_string(&reply_msg).unwrap_or_else(|e| {
          serde_json::json!({ "type": "error", "message": format!("Serialization error: {}", e) }).to_string()
        });

        if let Err(e) = socket.send(Message::Text(out)).await {
          error!(target: "levelcheck_backend", error = %e, "WS send error");
          break;
        }
      }
      Message::Ping(payload) => { let _ = socket.send(Message::Pong(payload)).await; }
      Message::Close(_) => break,
      _ => {}
    }
  }

  // Connection gone: whatever attempt was in flight is discarded.
  if let Some(s) = session.take() {
    s.abandon();
  }
  info!(target: "levelcheck_backend", "WebSocket disconnected");
}

#[instrument(level = "info", skip(state, session))]
async fn handle_client_ws(
  msg: ClientWsMessage,
  state: &AppState,
  session: &mut Option<Session>,
) -> ServerWsMessage {
  match msg {
    ClientWsMessage::Ping => ServerWsMessage::Pong,

    ClientWsMessage::StartAssessment { catalog_id } => {
      let catalog = match state.catalog(&catalog_id) {
        Ok(c) => c,
        Err(e) => return error_reply(e),
      };
      // A retake is a brand-new session; the old attempt is discarded, never mutated.
      if let Some(old) = session.take() {
        old.abandon();
      }
      let mut fresh = Session::new(catalog);
      if let Err(e) = fresh.start() {
        return error_reply(e);
      }
      info!(target: "assessment", %catalog_id, session = %fresh.session_id, "WS assessment started");
      let reply = prompt_reply(&fresh);
      *session = Some(fresh);
      reply
    }

    ClientWsMessage::SubmitChoice { prompt_id, selected_index } => {
      submit(session, &prompt_id, Response::Choice { selected_index })
    }

    ClientWsMessage::SubmitTranscript { prompt_id, transcript } => {
      submit(session, &prompt_id, Response::Speech { transcript })
    }

    ClientWsMessage::TranscribeAudio { audio_base64, mime } => {
      let Some(stt) = &state.stt else {
        return ServerWsMessage::AcquisitionError {
          reason: crate::stt::AcquisitionReason::Other,
          message: "Speech-to-text is not configured on this server.".into(),
        };
      };
      // The session is untouched either way; the user retries freely.
      match stt.transcribe(&audio_base64, &mime).await {
        Ok(text) => ServerWsMessage::Transcript { text },
        Err(e) => error_reply(e),
      }
    }

    ClientWsMessage::AcquisitionFailure { reason } => {
      warn!(target: "assessment", ?reason, "Client reported capture failure");
      ServerWsMessage::AcquisitionError {
        reason,
        message: "Audio capture failed. The current prompt is unchanged; please try again.".into(),
      }
    }

    ClientWsMessage::Advance => {
      let Some(s) = session.as_mut() else { return no_session() };
      match s.advance() {
        Ok(Stage::AwaitingContact) => {
          info!(target: "assessment", session = %s.session_id, "WS all prompts answered; contact required");
          ServerWsMessage::ContactRequired { stage: Stage::AwaitingContact }
        }
        Ok(_) => prompt_reply(s),
        Err(e) => error_reply(e),
      }
    }

    ClientWsMessage::Revisit { index } => {
      let Some(s) = session.as_mut() else { return no_session() };
      match s.revisit(index) {
        Ok(()) => prompt_reply(s),
        Err(e) => error_reply(e),
      }
    }

    ClientWsMessage::SubmitContact { name, email, phone } => {
      let Some(s) = session.as_mut() else { return no_session() };
      let contact = ContactRecord { name, email, phone };
      match unlock_result(s, &contact, state.notifier.as_ref()) {
        Ok(result) => ServerWsMessage::Result {
          level: result.level,
          raw_score: result.raw_score,
          section_breakdown: result.section_breakdown,
        },
        Err(e) => error_reply(e),
      }
    }

    ClientWsMessage::Abandon => {
      match session.take() {
        Some(s) => {
          s.abandon();
          ServerWsMessage::Abandoned
        }
        None => no_session(),
      }
    }
  }
}

/// Build the standard "here is your current prompt" reply.
fn prompt_reply(session: &Session) -> ServerWsMessage {
  match session.current_prompt() {
    Ok(prompt) => ServerWsMessage::Prompt {
      prompt: to_out(prompt),
      index: session.current_index(),
      total: session.catalog().prompt_count(),
      progress: session.progress_fraction(),
    },
    Err(e) => error_reply(e),
  }
}

fn submit(session: &mut Option<Session>, prompt_id: &str, response: Response) -> ServerWsMessage {
  let Some(s) = session.as_mut() else { return no_session() };
  match s.submit_response(prompt_id, response) {
    Ok(()) => ServerWsMessage::Recorded {
      prompt_id: prompt_id.to_string(),
      progress: s.progress_fraction(),
    },
    Err(e) => error_reply(e),
  }
}

fn no_session() -> ServerWsMessage {
  ServerWsMessage::Error { message: "No active session. Send start_assessment first.".into() }
}

/// Map engine errors onto the wire: recoverable conditions get their own
/// message types so the UI can render them inline; everything else is a plain
/// error (a caller bug, not something the user can fix).
fn error_reply(e: EngineError) -> ServerWsMessage {
  if !e.is_recoverable() {
    warn!(target: "assessment", error = %e, "Rejected client request");
  }
  match e {
    EngineError::ContactInvalid { fields } => {
      let message = format!("Please provide: {}", fields.join(", "));
      ServerWsMessage::ContactError { fields, message }
    }
    EngineError::AcquisitionFailed { reason, message } => {
      ServerWsMessage::AcquisitionError { reason, message }
    }
    other => ServerWsMessage::Error { message: other.to_string() },
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn full_flow_over_the_message_layer() {
    let state = AppState::new().unwrap();
    let mut session: Option<Session> = None;

    // Start the short business catalog (6 prompts, revision allowed).
    let reply = handle_client_ws(
      ClientWsMessage::StartAssessment { catalog_id: "business-writing".into() },
      &state,
      &mut session,
    )
    .await;
    let ServerWsMessage::Prompt { prompt, index, total, .. } = reply else {
      panic!("expected first prompt, got {:?}", reply)
    };
    assert_eq!(index, 0);
    assert_eq!(total, 6);
    let mut current_id = prompt.id;

    // Answer everything with option 0; the last advance demands contact.
    for step in 0..6 {
      let reply = handle_client_ws(
        ClientWsMessage::SubmitChoice { prompt_id: current_id.clone(), selected_index: 0 },
        &state,
        &mut session,
      )
      .await;
      assert!(matches!(reply, ServerWsMessage::Recorded { .. }), "step {step}: {reply:?}");

      let reply = handle_client_ws(ClientWsMessage::Advance, &state, &mut session).await;
      match reply {
        ServerWsMessage::Prompt { prompt, .. } => current_id = prompt.id,
        ServerWsMessage::ContactRequired { .. } => assert_eq!(step, 5),
        other => panic!("step {step}: unexpected {other:?}"),
      }
    }

    // Contact without email or phone is rejected inline; state keeps waiting.
    let reply = handle_client_ws(
      ClientWsMessage::SubmitContact { name: "Ada".into(), email: String::new(), phone: String::new() },
      &state,
      &mut session,
    )
    .await;
    assert!(matches!(reply, ServerWsMessage::ContactError { .. }));

    // Valid contact unlocks the result.
    let reply = handle_client_ws(
      ClientWsMessage::SubmitContact { name: "Ada".into(), email: "ada@example.com".into(), phone: String::new() },
      &state,
      &mut session,
    )
    .await;
    let ServerWsMessage::Result { raw_score, .. } = reply else {
      panic!("expected result, got {:?}", reply)
    };
    // bw02 and bw05 have correct_index 0, the other four do not.
    assert_eq!(raw_score, 33);
  }

  #[tokio::test]
  async fn out_of_order_submission_is_surfaced_as_an_error() {
    let state = AppState::new().unwrap();
    let mut session: Option<Session> = None;

    handle_client_ws(
      ClientWsMessage::StartAssessment { catalog_id: "general-placement".into() },
      &state,
      &mut session,
    )
    .await;

    let reply = handle_client_ws(
      ClientWsMessage::SubmitChoice { prompt_id: "gp05".into(), selected_index: 0 },
      &state,
      &mut session,
    )
    .await;
    let ServerWsMessage::Error { message } = reply else {
      panic!("expected error, got {:?}", reply)
    };
    assert!(message.contains("gp05"));
  }

  #[tokio::test]
  async fn abandon_then_restart_yields_a_fresh_session() {
    let state = AppState::new().unwrap();
    let mut session: Option<Session> = None;

    handle_client_ws(
      ClientWsMessage::StartAssessment { catalog_id: "general-placement".into() },
      &state,
      &mut session,
    )
    .await;
    handle_client_ws(
      ClientWsMessage::SubmitChoice { prompt_id: "gp01".into(), selected_index: 1 },
      &state,
      &mut session,
    )
    .await;

    let reply = handle_client_ws(ClientWsMessage::Abandon, &state, &mut session).await;
    assert!(matches!(reply, ServerWsMessage::Abandoned));
    assert!(session.is_none());

    let reply = handle_client_ws(
      ClientWsMessage::StartAssessment { catalog_id: "general-placement".into() },
      &state,
      &mut session,
    )
    .await;
    let ServerWsMessage::Prompt { index, progress, .. } = reply else {
      panic!("expected prompt, got {:?}", reply)
    };
    assert_eq!(index, 0);
    assert_eq!(progress, 0.0);
  }
}
