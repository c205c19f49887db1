//! Result gate: contact capture, lead-record emission, and result release.
//!
//! The computed result stays opaque to the caller until a `ContactRecord`
//! passes validation. On success we dispatch one lead record to the
//! notification collaborator fire-and-forget: delivery failure is logged and
//! never blocks unlocking the result, because "you will see your result" must
//! not depend on a third party being up.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument};

use crate::error::EngineError;
use crate::scoring::{AssessmentResult, SectionTally};
use crate::session::Session;

/// Name plus at least one reachable contact method.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ContactRecord {
  pub name: String,
  #[serde(default)]
  pub email: String,
  #[serde(default)]
  pub phone: String,
}

impl ContactRecord {
  /// Name must be non-empty and at least one of email/phone must be present.
  /// The error names every failing field so the form can highlight them.
  pub fn validate(&self) -> Result<(), EngineError> {
    let mut fields = Vec::new();
    if self.name.trim().is_empty() {
      fields.push("name".to_string());
    }
    if self.email.trim().is_empty() && self.phone.trim().is_empty() {
      fields.push("email".to_string());
      fields.push("phone".to_string());
    }
    if fields.is_empty() {
      Ok(())
    } else {
      Err(EngineError::ContactInvalid { fields })
    }
  }
}

/// Flat record handed to the notification collaborator.
#[derive(Clone, Debug, Serialize)]
pub struct LeadRecord {
  pub name: String,
  pub email: String,
  pub phone: String,
  pub level: String,
  pub raw_score: u8,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub section_breakdown: Option<BTreeMap<String, SectionTally>>,
  pub assessment_kind: String,
}

/// Notification collaborator. Implementations accept the record and return
/// immediately; delivery happens (and may fail) out of band.
pub trait Notifier: Send + Sync {
  fn dispatch(&self, record: LeadRecord);
}

/// Posts lead records as JSON to a configured webhook, from a spawned task so
/// the session path never waits on the network.
pub struct WebhookNotifier {
  client: reqwest::Client,
  url: String,
}

impl WebhookNotifier {
  pub fn new(url: String) -> Option<Self> {
    let client = reqwest::Client::builder()
      .timeout(Duration::from_secs(10))
      .build()
      .ok()?;
    Some(Self { client, url })
  }

  /// Construct from LEAD_WEBHOOK_URL if set; otherwise return None.
  pub fn from_env() -> Option<Self> {
    let url = std::env::var("LEAD_WEBHOOK_URL").ok()?;
    Self::new(url)
  }
}

impl Notifier for WebhookNotifier {
  fn dispatch(&self, record: LeadRecord) {
    let client = self.client.clone();
    let url = self.url.clone();
    tokio::spawn(async move {
      match client.post(&url).json(&record).send().await {
        Ok(res) if res.status().is_success() => {
          info!(target: "lead", level = %record.level, "Lead record delivered");
        }
        Ok(res) => {
          error!(target: "lead", status = %res.status(), "Lead webhook rejected record; result already released");
        }
        Err(e) => {
          error!(target: "lead", error = %e, "Lead webhook unreachable; result already released");
        }
      }
    });
  }
}

/// Fallback when no webhook is configured: the record only reaches the logs.
pub struct LogOnlyNotifier;

impl Notifier for LogOnlyNotifier {
  fn dispatch(&self, record: LeadRecord) {
    info!(
      target: "lead",
      name = %record.name,
      level = %record.level,
      raw_score = record.raw_score,
      kind = %record.assessment_kind,
      "No webhook configured; lead record logged only"
    );
  }
}

/// Open the gate: validate the contact record, emit the lead record, move the
/// session to `completed`, and hand the result back for display.
///
/// A rejected contact record leaves the session untouched.
#[instrument(level = "info", skip_all, fields(session = %session.session_id))]
pub fn unlock_result(
  session: &mut Session,
  contact: &ContactRecord,
  notifier: &dyn Notifier,
) -> Result<AssessmentResult, EngineError> {
  contact.validate()?;
  let result = session.complete()?;

  let breakdown = if result.section_breakdown.is_empty() {
    None
  } else {
    Some(result.section_breakdown.clone())
  };
  notifier.dispatch(LeadRecord {
    name: contact.name.trim().to_string(),
    email: contact.email.trim().to_string(),
    phone: contact.phone.trim().to_string(),
    level: result.level.to_string(),
    raw_score: result.raw_score,
    section_breakdown: breakdown,
    assessment_kind: session.catalog().assessment_kind.clone(),
  });
  info!(target: "lead", level = %result.level, "Contact captured; result released");
  Ok(result)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::catalog::{Catalog, Level, Prompt, PromptKind};
  use crate::scoring::Response;
  use crate::session::Stage;
  use std::sync::{Arc, Mutex};

  struct RecordingNotifier {
    records: Mutex<Vec<LeadRecord>>,
  }

  impl RecordingNotifier {
    fn new() -> Self {
      Self { records: Mutex::new(Vec::new()) }
    }
  }

  impl Notifier for RecordingNotifier {
    fn dispatch(&self, record: LeadRecord) {
      self.records.lock().unwrap().push(record);
    }
  }

  fn scored_session() -> Session {
    let prompts = vec![Prompt {
      id: "p0".into(),
      kind: PromptKind::MultipleChoice,
      difficulty: Level::A2,
      category: Some("grammar".into()),
      text: "Pick.".into(),
      options: vec!["a".into(), "b".into()],
      correct_index: Some(0),
      reference_text: String::new(),
      keywords: vec![],
    }];
    let catalog = Arc::new(Catalog {
      id: "quiz".into(),
      title: "Quiz".into(),
      assessment_kind: "placement".into(),
      allow_revision: false,
      prompts,
    });
    let mut s = Session::new(catalog);
    s.start().unwrap();
    s.submit_response("p0", Response::Choice { selected_index: 0 }).unwrap();
    s.advance().unwrap();
    assert_eq!(s.stage(), Stage::AwaitingContact);
    s
  }

  fn contact(name: &str, email: &str, phone: &str) -> ContactRecord {
    ContactRecord { name: name.into(), email: email.into(), phone: phone.into() }
  }

  #[test]
  fn name_without_any_contact_method_is_rejected() {
    let mut s = scored_session();
    let notifier = RecordingNotifier::new();
    let err = unlock_result(&mut s, &contact("Ada", "", ""), &notifier).unwrap_err();
    match err {
      EngineError::ContactInvalid { fields } => {
        assert_eq!(fields, vec!["email".to_string(), "phone".to_string()]);
      }
      other => panic!("expected ContactInvalid, got {:?}", other),
    }
    // State unchanged, nothing emitted, result still withheld.
    assert_eq!(s.stage(), Stage::AwaitingContact);
    assert!(s.result().is_none());
    assert!(notifier.records.lock().unwrap().is_empty());
  }

  #[test]
  fn empty_name_is_named_in_the_error() {
    let err = contact("  ", "ada@example.com", "").validate().unwrap_err();
    match err {
      EngineError::ContactInvalid { fields } => assert_eq!(fields, vec!["name".to_string()]),
      other => panic!("expected ContactInvalid, got {:?}", other),
    }
  }

  #[test]
  fn name_plus_email_unlocks_and_emits_one_record() {
    let mut s = scored_session();
    let notifier = RecordingNotifier::new();
    let result = unlock_result(&mut s, &contact("Ada", "ada@example.com", ""), &notifier).unwrap();
    assert_eq!(result.raw_score, 100);
    assert_eq!(s.stage(), Stage::Completed);
    assert!(s.result().is_some());

    let records = notifier.records.lock().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].name, "Ada");
    assert_eq!(records[0].level, "C2");
    assert_eq!(records[0].raw_score, 100);
    assert_eq!(records[0].assessment_kind, "placement");
    assert!(records[0].section_breakdown.is_some());
  }

  #[test]
  fn phone_alone_satisfies_the_contact_invariant() {
    assert!(contact("Ada", "", "+1 555 0100").validate().is_ok());
  }

  #[test]
  fn unlocking_twice_is_a_stage_mismatch() {
    let mut s = scored_session();
    let notifier = RecordingNotifier::new();
    unlock_result(&mut s, &contact("Ada", "ada@example.com", ""), &notifier).unwrap();
    let err = unlock_result(&mut s, &contact("Ada", "ada@example.com", ""), &notifier).unwrap_err();
    assert!(matches!(err, EngineError::StageMismatch { .. }));
    assert_eq!(notifier.records.lock().unwrap().len(), 1);
  }
}
