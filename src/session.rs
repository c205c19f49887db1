//! Session controller: the state machine driving one user through one
//! assessment attempt.
//!
//! `not_started -> in_progress -> awaiting_contact -> completed`, strictly in
//! that direction. A retake is a brand-new `Session`; a completed one never
//! cycles back, so historical responses are never ambiguous.
//!
//! A session is ephemeral and owned by the interaction that created it (here:
//! the WebSocket connection task). Nothing is persisted server-side.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::catalog::{Catalog, Prompt};
use crate::error::EngineError;
use crate::scoring::{score_responses, AssessmentResult, Response};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
  #[default]
  NotStarted,
  InProgress,
  AwaitingContact,
  Completed,
}

pub struct Session {
  pub session_id: Uuid,
  catalog: Arc<Catalog>,
  stage: Stage,
  current: usize,
  /// Insertion order follows prompt order; the flow is strictly sequential.
  responses: Vec<(String, Response)>,
  result: Option<AssessmentResult>,
}

impl Session {
  /// A fresh, not-yet-started attempt against an already-validated catalog.
  pub fn new(catalog: Arc<Catalog>) -> Self {
    Self {
      session_id: Uuid::new_v4(),
      catalog,
      stage: Stage::NotStarted,
      current: 0,
      responses: Vec::new(),
      result: None,
    }
  }

  pub fn stage(&self) -> Stage {
    self.stage
  }

  pub fn catalog(&self) -> &Catalog {
    &self.catalog
  }

  /// Fraction of prompts answered so far, in [0, 1].
  pub fn progress_fraction(&self) -> f32 {
    self.responses.len() as f32 / self.catalog.prompt_count() as f32
  }

  pub fn current_index(&self) -> usize {
    self.current
  }

  /// The prompt the user is expected to answer next.
  pub fn current_prompt(&self) -> Result<&Prompt, EngineError> {
    if self.stage != Stage::InProgress {
      return Err(EngineError::StageMismatch { op: "current_prompt", stage: self.stage });
    }
    // current is always a valid index while in progress.
    Ok(&self.catalog.prompts[self.current])
  }

  /// `not_started -> in_progress`; resets the cursor and clears responses.
  #[instrument(level = "info", skip(self), fields(session = %self.session_id, catalog = %self.catalog.id))]
  pub fn start(&mut self) -> Result<(), EngineError> {
    if self.stage != Stage::NotStarted {
      return Err(EngineError::StageMismatch { op: "start", stage: self.stage });
    }
    self.current = 0;
    self.responses.clear();
    self.stage = Stage::InProgress;
    info!(target: "assessment", prompts = self.catalog.prompt_count(), "Session started");
    Ok(())
  }

  /// Record (or overwrite) the response for the current prompt only.
  /// Submitting for any other prompt is a caller bug, not a retry case.
  #[instrument(level = "debug", skip(self, response), fields(session = %self.session_id, %prompt_id))]
  pub fn submit_response(&mut self, prompt_id: &str, response: Response) -> Result<(), EngineError> {
    if self.stage != Stage::InProgress {
      return Err(EngineError::StageMismatch { op: "submit_response", stage: self.stage });
    }
    let expected = self.catalog.prompts[self.current].id.clone();
    if prompt_id != expected {
      return Err(EngineError::OutOfOrderSubmission {
        expected,
        got: prompt_id.to_string(),
      });
    }

    if let Some(slot) = self.responses.iter_mut().find(|(id, _)| id.as_str() == prompt_id) {
      slot.1 = response;
    } else {
      self.responses.push((prompt_id.to_string(), response));
    }
    Ok(())
  }

  /// Move to the next prompt, or score the attempt when the current prompt is
  /// the last one (`in_progress -> awaiting_contact`). Requires a recorded
  /// response for the current prompt.
  #[instrument(level = "info", skip(self), fields(session = %self.session_id, index = self.current))]
  pub fn advance(&mut self) -> Result<Stage, EngineError> {
    if self.stage != Stage::InProgress {
      return Err(EngineError::StageMismatch { op: "advance", stage: self.stage });
    }
    let current_id = &self.catalog.prompts[self.current].id;
    if !self.responses.iter().any(|(id, _)| id == current_id) {
      return Err(EngineError::PromptUnanswered(current_id.clone()));
    }

    if self.current + 1 < self.catalog.prompt_count() {
      self.current += 1;
      return Ok(self.stage);
    }

    let result = score_responses(&self.catalog, &self.responses)?;
    info!(
      target: "assessment",
      raw_score = result.raw_score,
      level = %result.level,
      "Session scored; result withheld until contact capture"
    );
    self.result = Some(result);
    self.stage = Stage::AwaitingContact;
    Ok(self.stage)
  }

  /// Move the cursor back to an already-answered prompt so it can be revised.
  /// Only honored for catalogs configured with `allow_revision`.
  #[instrument(level = "info", skip(self), fields(session = %self.session_id, %index))]
  pub fn revisit(&mut self, index: usize) -> Result<(), EngineError> {
    if self.stage != Stage::InProgress {
      return Err(EngineError::StageMismatch { op: "revisit", stage: self.stage });
    }
    if !self.catalog.allow_revision {
      return Err(EngineError::RevisionNotAllowed(self.catalog.id.clone()));
    }
    if index > self.current {
      let expected = self.catalog.prompts[self.current].id.clone();
      let got = self
        .catalog
        .prompt(index)
        .map(|p| p.id.clone())
        .unwrap_or_else(|| format!("#{index}"));
      return Err(EngineError::OutOfOrderSubmission { expected, got });
    }
    self.current = index;
    Ok(())
  }

  /// The gated result: visible only once the contact step has completed.
  #[allow(dead_code)]
  pub fn result(&self) -> Option<&AssessmentResult> {
    if self.stage == Stage::Completed {
      self.result.as_ref()
    } else {
      None
    }
  }

  /// `awaiting_contact -> completed`. Called by the gate after the contact
  /// record validated; not part of the presentation surface.
  pub(crate) fn complete(&mut self) -> Result<AssessmentResult, EngineError> {
    // result is always Some once awaiting_contact has been reached.
    match (self.stage, self.result.clone()) {
      (Stage::AwaitingContact, Some(result)) => {
        self.stage = Stage::Completed;
        Ok(result)
      }
      _ => Err(EngineError::StageMismatch { op: "complete", stage: self.stage }),
    }
  }

  /// Discard the attempt. Terminal; the caller starts over with a new Session.
  /// No compensating cleanup is needed since nothing was persisted.
  #[instrument(level = "info", skip(self), fields(session = %self.session_id))]
  pub fn abandon(self) {
    if self.stage == Stage::Completed {
      warn!(target: "assessment", "Abandon called on a completed session; nothing to discard");
      return;
    }
    info!(
      target: "assessment",
      stage = ?self.stage,
      answered = self.responses.len(),
      "Session abandoned"
    );
  }
}
