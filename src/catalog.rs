//! Assessment catalogs: prompt definitions, the six-level proficiency scale,
//! and load-time validation.
//!
//! A catalog is immutable once loaded; sessions only ever hold an `Arc` to it,
//! so scoring is always reproducible from the same catalog + responses.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// What kind of prompt is presented to the user?
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PromptKind {
  /// Pick one of the listed options (answer = `correct_index`).
  MultipleChoice,
  /// Complete the sentence by picking the missing piece from `options`.
  FillBlank,
  /// Read `reference_text` aloud; the transcript is scored against `keywords`.
  KeywordSpeech,
}

/// Six-level ordered proficiency scale (CEFR labels).
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "UPPERCASE")]
pub enum Level {
  A1,
  A2,
  B1,
  B2,
  C1,
  C2,
}

impl fmt::Display for Level {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let s = match self {
      Level::A1 => "A1",
      Level::A2 => "A2",
      Level::B1 => "B1",
      Level::B2 => "B2",
      Level::C1 => "C1",
      Level::C2 => "C2",
    };
    f.write_str(s)
  }
}

/// One assessable unit. The kind decides which optional fields apply,
/// enforced once by `Catalog::validate` rather than per session.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Prompt {
  pub id: String,
  pub kind: PromptKind,
  pub difficulty: Level,
  /// Free-form classification (grammar, vocabulary, listening, ...).
  /// Only feeds the result breakdown, never the scoring itself.
  #[serde(default)]
  pub category: Option<String>,
  /// The question or cue shown to the user.
  #[serde(default)]
  pub text: String,

  // multiple_choice / fill_blank
  #[serde(default)]
  pub options: Vec<String>,
  #[serde(default)]
  pub correct_index: Option<usize>,

  // keyword_speech
  #[serde(default)]
  pub reference_text: String,
  #[serde(default)]
  pub keywords: Vec<String>,
}

impl Prompt {
  pub fn is_choice(&self) -> bool {
    matches!(self.kind, PromptKind::MultipleChoice | PromptKind::FillBlank)
  }
}

/// Ordered, immutable prompt set served to sessions under one id.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Catalog {
  pub id: String,
  pub title: String,
  /// Label forwarded in the lead record (e.g. "placement", "speaking").
  pub assessment_kind: String,
  /// Whether a session may move its cursor back to an answered prompt
  /// before scoring. Off by default: the flow is strictly forward.
  #[serde(default)]
  pub allow_revision: bool,
  pub prompts: Vec<Prompt>,
}

impl Catalog {
  pub fn prompt_count(&self) -> usize {
    self.prompts.len()
  }

  pub fn prompt(&self, index: usize) -> Option<&Prompt> {
    self.prompts.get(index)
  }

  /// Validate the catalog once, before it is ever served to a session.
  /// Any violation is fatal and names the offending prompt id.
  pub fn validate(&self) -> Result<(), EngineError> {
    let invalid = |prompt: &str, reason: String| EngineError::CatalogInvalid {
      catalog: self.id.clone(),
      prompt: prompt.to_string(),
      reason,
    };

    if self.prompts.is_empty() {
      return Err(invalid("-", "catalog has no prompts".into()));
    }

    let mut seen = HashSet::new();
    for p in &self.prompts {
      if p.id.trim().is_empty() {
        return Err(invalid(&p.id, "prompt id is empty".into()));
      }
      if !seen.insert(p.id.as_str()) {
        return Err(invalid(&p.id, "duplicate prompt id".into()));
      }

      match p.kind {
        PromptKind::MultipleChoice | PromptKind::FillBlank => {
          if p.options.len() < 2 {
            return Err(invalid(&p.id, format!("needs 2+ options, has {}", p.options.len())));
          }
          match p.correct_index {
            None => return Err(invalid(&p.id, "missing correct_index".into())),
            Some(i) if i >= p.options.len() => {
              return Err(invalid(
                &p.id,
                format!("correct_index {} out of range for {} options", i, p.options.len()),
              ));
            }
            Some(_) => {}
          }
        }
        PromptKind::KeywordSpeech => {
          if p.reference_text.trim().is_empty() {
            return Err(invalid(&p.id, "missing reference_text".into()));
          }
          if p.keywords.is_empty() || p.keywords.iter().any(|k| k.trim().is_empty()) {
            return Err(invalid(&p.id, "keywords must be present and non-empty".into()));
          }
        }
      }
    }
    Ok(())
  }
}
