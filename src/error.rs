//! Typed error taxonomy for the assessment engine.
//!
//! Split the way the flows treat them:
//!   - fatal at load time: `CatalogInvalid` (a broken catalog must never reach a session)
//!   - caller-contract bugs: `StageMismatch`, `OutOfOrderSubmission`, `PromptUnanswered`,
//!     `RevisionNotAllowed`, `ScoreOutOfRange`
//!   - expected & recoverable: `AcquisitionFailed` (retry the prompt), `ContactInvalid`
//!     (correct the form)
//!
//! Outbound notification failures are NOT part of this taxonomy: they are logged and
//! swallowed inside the notifier (see `gate.rs`).

use thiserror::Error;

use crate::session::Stage;
use crate::stt::AcquisitionReason;

#[derive(Debug, Error)]
pub enum EngineError {
  #[error("catalog '{catalog}' is invalid at prompt '{prompt}': {reason}")]
  CatalogInvalid { catalog: String, prompt: String, reason: String },

  #[error("unknown catalog '{0}'")]
  UnknownCatalog(String),

  #[error("'{op}' is not valid while the session is {stage:?}")]
  StageMismatch { op: &'static str, stage: Stage },

  #[error("submission targets prompt '{got}' but the current prompt is '{expected}'")]
  OutOfOrderSubmission { expected: String, got: String },

  #[error("current prompt '{0}' has no recorded response")]
  PromptUnanswered(String),

  #[error("catalog '{0}' does not allow revisiting earlier prompts")]
  RevisionNotAllowed(String),

  #[error("score {0} is outside the bucketing range 0..=100")]
  ScoreOutOfRange(i64),

  #[error("contact record rejected, invalid field(s): {}", fields.join(", "))]
  ContactInvalid { fields: Vec<String> },

  #[error("speech acquisition failed ({reason:?}): {message}")]
  AcquisitionFailed { reason: AcquisitionReason, message: String },
}

impl EngineError {
  /// True for conditions the user can resolve themselves (retry / fix input).
  /// Everything else indicates a caller bug or broken content.
  pub fn is_recoverable(&self) -> bool {
    matches!(
      self,
      EngineError::AcquisitionFailed { .. } | EngineError::ContactInvalid { .. }
    )
  }
}
